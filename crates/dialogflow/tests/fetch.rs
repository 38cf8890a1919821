//! End-to-end behaviour of `Dialogflow::fetch` against a stub sessions service.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use dialogflow::{
    Credential, DetectIntentRequest, DetectIntentResponse, Dialogflow, DialogflowConfig,
    DialogflowError, DialogflowOptions, KeyInput, QueryResult, ServiceError, SessionsClient,
    SessionsClientFactory,
};
use serde_json::json;

// ---------------------------------------------------------------------------
// Stub collaborator
// ---------------------------------------------------------------------------

#[derive(Clone, Copy)]
enum Reply {
    Fulfill(&'static str),
    Fail(u16),
    Hang,
}

#[derive(Default)]
struct Calls {
    opened: AtomicUsize,
    closed: AtomicUsize,
    requests: Mutex<Vec<DetectIntentRequest>>,
}

impl Calls {
    fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    fn requests(&self) -> Vec<DetectIntentRequest> {
        self.requests.lock().unwrap().clone()
    }
}

struct StubSessions {
    calls: Arc<Calls>,
    reply: Mutex<Reply>,
}

impl StubSessions {
    fn new(reply: Reply) -> (Arc<Self>, Arc<Calls>) {
        let calls = Arc::new(Calls::default());
        let stub = Arc::new(Self {
            calls: calls.clone(),
            reply: Mutex::new(reply),
        });
        (stub, calls)
    }

    fn reply_with(&self, reply: Reply) {
        *self.reply.lock().unwrap() = reply;
    }
}

#[async_trait]
impl SessionsClientFactory for StubSessions {
    async fn open(&self, _credential: &Credential) -> Result<Box<dyn SessionsClient>, ServiceError> {
        self.calls.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(StubClient {
            calls: self.calls.clone(),
            reply: *self.reply.lock().unwrap(),
            open: true,
        }))
    }
}

struct StubClient {
    calls: Arc<Calls>,
    reply: Reply,
    open: bool,
}

#[async_trait]
impl SessionsClient for StubClient {
    async fn detect_intent(
        &mut self,
        request: &DetectIntentRequest,
    ) -> Result<DetectIntentResponse, ServiceError> {
        self.calls.requests.lock().unwrap().push(request.clone());
        match self.reply {
            Reply::Fulfill(text) => Ok(DetectIntentResponse {
                response_id: "r-1".into(),
                query_result: serde_json::from_value(json!({
                    "queryText": request.query_input.text.text,
                    "fulfillmentText": text,
                    "fulfillmentMessages": [{ "text": { "text": [text] } }],
                    "parameters": { "city": "Taipei" }
                }))
                .unwrap(),
                webhook_status: None,
            }),
            Reply::Fail(code) => Err(ServiceError::Status {
                code,
                status: Some("PERMISSION_DENIED".into()),
                message: "caller does not have permission".into(),
            }),
            Reply::Hang => std::future::pending().await,
        }
    }

    fn close(&mut self) {
        if std::mem::replace(&mut self.open, false) {
            self.calls.closed.fetch_add(1, Ordering::SeqCst);
        }
    }
}

fn valid_key() -> KeyInput {
    json!({
        "type": "service_account",
        "project_id": "demo",
        "client_email": "bot@demo.iam.gserviceaccount.com"
    })
    .into()
}

fn configured(sessions: Arc<StubSessions>) -> Dialogflow {
    Dialogflow::with_options(
        sessions,
        DialogflowOptions {
            key: Some(valid_key()),
            project_name: Some("demo".into()),
            language_code: Some("en".into()),
            ..DialogflowOptions::default()
        },
    )
    .unwrap()
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fetch_returns_fulfillment_text() {
    let (sessions, calls) = StubSessions::new(Reply::Fulfill("hi there"));
    let mut dialogflow = configured(sessions);

    let reply = dialogflow.fetch(Some("hello")).await.unwrap();

    assert_eq!(reply, "hi there");
    assert_eq!(dialogflow.fulfillment_text(), Some("hi there"));
    assert_eq!(dialogflow.fulfillment_messages().unwrap().len(), 1);
    assert_eq!(dialogflow.parameters(), Some(json!({ "city": "Taipei" })));
    assert_eq!(
        dialogflow.to_json().unwrap().get("queryText"),
        Some(&json!("hello"))
    );
    assert_eq!((calls.opened(), calls.closed()), (1, 1));

    let request = &calls.requests()[0];
    assert_eq!(request.query_input.text.text, "hello");
    assert_eq!(request.query_input.text.language_code, "en");
    assert!(request.session.as_str().starts_with("projects/demo/agent/sessions/"));
    assert!(request.query_params.is_none());
}

#[tokio::test]
async fn missing_key_fails_without_opening_a_client() {
    let (sessions, calls) = StubSessions::new(Reply::Fulfill("hi there"));
    let mut dialogflow = Dialogflow::with_options(
        sessions,
        DialogflowOptions {
            project_name: Some("demo".into()),
            language_code: Some("en".into()),
            ..DialogflowOptions::default()
        },
    )
    .unwrap();

    let err = dialogflow.fetch(Some("hello")).await.unwrap_err();

    assert!(matches!(err, DialogflowError::CredentialNotFound));
    assert_eq!(calls.opened(), 0);
}

#[tokio::test]
async fn empty_key_counts_as_missing() {
    let (sessions, _calls) = StubSessions::new(Reply::Fulfill("hi there"));
    let mut dialogflow = configured(sessions);
    dialogflow.set_key(json!({})).unwrap();

    let err = dialogflow.fetch(Some("hello")).await.unwrap_err();
    assert!(matches!(err, DialogflowError::CredentialNotFound));
}

#[test]
fn accessors_are_empty_before_any_fetch() {
    let (sessions, _calls) = StubSessions::new(Reply::Fulfill("hi there"));
    let dialogflow = configured(sessions);

    assert_eq!(dialogflow.parameters(), None);
    assert_eq!(dialogflow.to_json(), None);
    assert_eq!(dialogflow.fulfillment_text(), None);
    assert!(dialogflow.fulfillment_messages().is_none());
    assert!(dialogflow.query_result().is_none());
}

#[tokio::test]
async fn missing_parameters_are_reported_in_check_order() {
    let cases: [(Option<&str>, Option<&str>, Option<&str>, &str); 5] = [
        (None, None, None, "project_name"),
        (Some(""), Some("en"), Some("hi"), "project_name"),
        (Some("demo"), None, None, "language_code"),
        (Some("demo"), Some("en"), None, "text"),
        (Some("demo"), Some("en"), Some(""), "text"),
    ];

    for (project, language, text, expected) in cases {
        let (sessions, calls) = StubSessions::new(Reply::Fulfill("hi there"));
        let mut dialogflow = Dialogflow::new(sessions);
        dialogflow.set_key(valid_key()).unwrap();
        if let Some(project) = project {
            dialogflow.set_project_name(project);
        }
        if let Some(language) = language {
            dialogflow.set_language_code(language);
        }

        let err = dialogflow.fetch(text).await.unwrap_err();

        match err {
            DialogflowError::ParameterIsEmpty { param } => assert_eq!(param, expected),
            other => panic!("expected ParameterIsEmpty({expected}), got {other:?}"),
        }
        assert_eq!(calls.opened(), 0);
    }
}

#[tokio::test]
async fn configured_text_is_used_when_fetch_has_none() {
    let (sessions, calls) = StubSessions::new(Reply::Fulfill("ok"));
    let mut dialogflow = configured(sessions);
    dialogflow.set_text("from setter");

    dialogflow.fetch(None).await.unwrap();
    dialogflow.fetch(Some("from argument")).await.unwrap();

    let texts: Vec<_> = calls
        .requests()
        .into_iter()
        .map(|r| r.query_input.text.text)
        .collect();
    assert_eq!(texts, ["from setter", "from argument"]);
}

#[tokio::test]
async fn failure_closes_the_client_and_keeps_the_previous_result() {
    let (sessions, calls) = StubSessions::new(Reply::Fulfill("first"));
    let mut dialogflow = configured(sessions.clone());
    dialogflow.fetch(Some("hello")).await.unwrap();

    sessions.reply_with(Reply::Fail(403));
    let err = dialogflow.fetch(Some("again")).await.unwrap_err();

    match err {
        DialogflowError::RemoteServiceFailure(ServiceError::Status { code, .. }) => {
            assert_eq!(code, 403)
        }
        other => panic!("expected RemoteServiceFailure, got {other:?}"),
    }
    assert_eq!((calls.opened(), calls.closed()), (2, 2));
    assert_eq!(dialogflow.fulfillment_text(), Some("first"));
}

#[tokio::test]
async fn abandoned_call_still_closes_the_client() {
    let (sessions, calls) = StubSessions::new(Reply::Hang);
    let mut dialogflow = configured(sessions);

    let outcome =
        tokio::time::timeout(Duration::from_millis(20), dialogflow.fetch(Some("hello"))).await;

    assert!(outcome.is_err());
    assert_eq!((calls.opened(), calls.closed()), (1, 1));
}

#[tokio::test]
async fn optional_args_are_sent_as_string_payload() {
    let (sessions, calls) = StubSessions::new(Reply::Fulfill("ok"));
    let mut dialogflow = configured(sessions);
    dialogflow.set_optional_args([("user_id", 42)]);

    dialogflow.fetch(Some("hello")).await.unwrap();

    let body = serde_json::to_value(&calls.requests()[0]).unwrap();
    assert_eq!(body["queryParams"], json!({ "payload": { "user_id": "42" } }));
}

#[tokio::test]
async fn session_ids_are_fresh_unless_pinned() {
    let (sessions, calls) = StubSessions::new(Reply::Fulfill("ok"));
    let mut dialogflow = configured(sessions);

    dialogflow.fetch(Some("one")).await.unwrap();
    dialogflow.fetch(Some("two")).await.unwrap();
    dialogflow.set_session_id("conversation-7");
    dialogflow.fetch(Some("three")).await.unwrap();
    dialogflow.fetch(Some("four")).await.unwrap();

    let sessions: Vec<_> = calls
        .requests()
        .into_iter()
        .map(|r| r.session.as_str().to_owned())
        .collect();
    assert_ne!(sessions[0], sessions[1]);
    assert_eq!(sessions[2], "projects/demo/agent/sessions/conversation-7");
    assert_eq!(sessions[2], sessions[3]);
}

#[tokio::test]
async fn setters_chain_through_the_instance() {
    let (sessions, _calls) = StubSessions::new(Reply::Fulfill("chained"));
    let mut dialogflow = Dialogflow::new(sessions);

    dialogflow
        .set_key(valid_key())
        .unwrap()
        .set_project_name("demo")
        .set_language_code("en")
        .set_text("hello");
    dialogflow.fetch(None).await.unwrap();

    let result: Option<&QueryResult> = dialogflow.instance().query_result();
    assert_eq!(result.unwrap().fulfillment_text, "chained");
}

#[test]
fn config_without_language_uses_lower_case_default() {
    let (sessions, calls) = StubSessions::new(Reply::Fulfill("ok"));
    let config = DialogflowConfig {
        key: Some(r#"{"type":"service_account"}"#.into()),
        project_name: Some("demo".into()),
        language_code: None,
    };

    let mut dialogflow = Dialogflow::from_config(sessions, config).unwrap();
    tokio::runtime::Runtime::new()
        .unwrap()
        .block_on(dialogflow.fetch(Some("hello")))
        .unwrap();

    assert_eq!(calls.requests()[0].query_input.text.language_code, "zh-tw");
}

#[test]
fn invalid_key_in_options_fails_construction() {
    let (sessions, _calls) = StubSessions::new(Reply::Fulfill("ok"));
    let err = Dialogflow::with_options(
        sessions,
        DialogflowOptions {
            key: Some("definitely not a key".into()),
            ..DialogflowOptions::default()
        },
    )
    .unwrap_err();

    assert!(matches!(err, DialogflowError::InvalidCredentialType));
}
