//! The [`Dialogflow`] adapter: chained option setters, one `fetch` per query,
//! and read accessors over the last result.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{field, instrument, Span};

use crate::config::{DialogflowConfig, CONFIG_DEFAULT_LANGUAGE_CODE};
use crate::credential::{Credential, KeyInput, KeyResolver};
use crate::request::{query_input, query_parameters, DetectIntentRequest};
use crate::response::{Message, QueryResult};
use crate::session::{OpenClient, SessionsClientFactory};
use crate::{DialogflowError, LanguageCode, ProjectName, SessionId, SessionName};

/// Construction-time overrides for [`Dialogflow::with_options`].
///
/// Every field is optional; unset fields can be supplied later through the
/// setters.
#[derive(Debug, Clone, Default)]
pub struct DialogflowOptions {
    /// Credential in any shape [`KeyResolver`] understands.
    pub key: Option<KeyInput>,
    /// Google Cloud project that owns the agent.
    pub project_name: Option<String>,
    /// Language of queries.
    pub language_code: Option<String>,
    /// Conversation token; a fresh one is generated per call when unset.
    pub session_id: Option<String>,
    /// Query text used when `fetch` is called without one.
    pub text: Option<String>,
    /// Extra string arguments sent as the query payload.
    pub optional_args: BTreeMap<String, String>,
}

/// Intent-detection adapter.
///
/// ```ignore
/// let mut dialogflow = Dialogflow::new(sessions);
/// dialogflow
///     .set_key("storage/dialogflow.json")?
///     .set_project_name("demo")
///     .set_language_code("en");
/// let reply = dialogflow.fetch(Some("hello")).await?;
/// ```
pub struct Dialogflow {
    sessions: Arc<dyn SessionsClientFactory>,
    key_resolver: KeyResolver,
    key: Option<Credential>,
    project_name: Option<String>,
    language_code: Option<String>,
    session_id: Option<String>,
    text: Option<String>,
    optional_args: BTreeMap<String, String>,
    query_result: Option<QueryResult>,
}

impl Dialogflow {
    /// Creates an adapter with no options set and the default key resolver.
    pub fn new(sessions: Arc<dyn SessionsClientFactory>) -> Self {
        Self {
            sessions,
            key_resolver: KeyResolver::default(),
            key: None,
            project_name: None,
            language_code: None,
            session_id: None,
            text: None,
            optional_args: BTreeMap::new(),
            query_result: None,
        }
    }

    /// Creates an adapter from construction-time overrides.
    ///
    /// Fails only if `options.key` cannot be resolved.
    pub fn with_options(
        sessions: Arc<dyn SessionsClientFactory>,
        options: DialogflowOptions,
    ) -> Result<Self, DialogflowError> {
        Self::with_resolver(sessions, KeyResolver::default(), options)
    }

    /// Like [`Self::with_options`], resolving path credentials through
    /// `key_resolver`.
    pub fn with_resolver(
        sessions: Arc<dyn SessionsClientFactory>,
        key_resolver: KeyResolver,
        options: DialogflowOptions,
    ) -> Result<Self, DialogflowError> {
        let mut dialogflow = Self::new(sessions);
        dialogflow.key_resolver = key_resolver;
        if let Some(key) = options.key {
            dialogflow.set_key(key)?;
        }
        dialogflow.project_name = options.project_name;
        dialogflow.language_code = options.language_code;
        dialogflow.session_id = options.session_id;
        dialogflow.text = options.text;
        dialogflow.optional_args = options.optional_args;
        Ok(dialogflow)
    }

    /// Creates an adapter from hosting settings.
    ///
    /// A config without a language code gets `"zh-tw"`.
    pub fn from_config(
        sessions: Arc<dyn SessionsClientFactory>,
        config: DialogflowConfig,
    ) -> Result<Self, DialogflowError> {
        Self::with_options(
            sessions,
            DialogflowOptions {
                key: config.key.map(KeyInput::Text),
                project_name: config.project_name,
                language_code: Some(
                    config
                        .language_code
                        .unwrap_or_else(|| CONFIG_DEFAULT_LANGUAGE_CODE.to_owned()),
                ),
                ..DialogflowOptions::default()
            },
        )
    }

    // -----------------------------------------------------------------------
    // Setters
    // -----------------------------------------------------------------------

    /// Sets the credential.
    ///
    /// # Errors
    ///
    /// [`DialogflowError::InvalidCredentialType`] if `key` matches no known
    /// shape, [`DialogflowError::CredentialUnreadable`] if it names a file
    /// that cannot be read.
    pub fn set_key(&mut self, key: impl Into<KeyInput>) -> Result<&mut Self, DialogflowError> {
        self.key = self.key_resolver.resolve(key.into())?;
        Ok(self)
    }

    pub fn set_project_name(&mut self, project_name: impl Into<String>) -> &mut Self {
        self.project_name = Some(project_name.into());
        self
    }

    pub fn set_language_code(&mut self, language_code: impl Into<String>) -> &mut Self {
        self.language_code = Some(language_code.into());
        self
    }

    /// Pins the conversation token so consecutive calls share context.
    pub fn set_session_id(&mut self, session_id: impl Into<String>) -> &mut Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn set_text(&mut self, text: impl Into<String>) -> &mut Self {
        self.text = Some(text.into());
        self
    }

    /// Replaces the optional arguments. Values are sent as strings whatever
    /// their original type.
    pub fn set_optional_args<I, K, V>(&mut self, optional_args: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToString,
    {
        self.optional_args = optional_args
            .into_iter()
            .map(|(key, value)| (key.into(), value.to_string()))
            .collect();
        self
    }

    // -----------------------------------------------------------------------
    // Call
    // -----------------------------------------------------------------------

    /// Sends `text` (or the configured text) to the agent and returns the
    /// fulfillment text.
    ///
    /// A client is opened for this call only and is closed before the method
    /// returns, whether the call succeeded or not. The previous result is kept
    /// if the call fails.
    ///
    /// # Errors
    ///
    /// - [`DialogflowError::ParameterIsEmpty`] for a missing project name,
    ///   language code or text, checked in that order, before any I/O.
    /// - [`DialogflowError::CredentialNotFound`] if no credential is set.
    /// - [`DialogflowError::RemoteServiceFailure`] for anything the service
    ///   or its transport reports.
    #[instrument(
        name = "dialogflow.fetch",
        skip_all,
        fields(project = field::Empty, language = field::Empty, session = field::Empty)
    )]
    pub async fn fetch(&mut self, text: Option<&str>) -> Result<String, DialogflowError> {
        let request = self.prepare(text)?;
        let credential = self
            .key
            .as_ref()
            .filter(|key| !key.is_empty())
            .ok_or(DialogflowError::CredentialNotFound)?;

        Span::current().record("session", request.session.as_str());

        let mut client = OpenClient::open(self.sessions.as_ref(), credential).await?;
        let outcome = client.detect_intent(&request).await;
        drop(client);

        let result = outcome?.query_result;
        let fulfillment_text = result.fulfillment_text.clone();
        self.query_result = Some(result);
        Ok(fulfillment_text)
    }

    /// Validates the options and builds the request for one call.
    fn prepare(&self, text: Option<&str>) -> Result<DetectIntentRequest, DialogflowError> {
        let project = self
            .project_name
            .as_deref()
            .and_then(|name| ProjectName::new(name))
            .ok_or(DialogflowError::ParameterIsEmpty {
                param: "project_name",
            })?;
        let language = self
            .language_code
            .as_deref()
            .and_then(|code| LanguageCode::new(code))
            .ok_or(DialogflowError::ParameterIsEmpty {
                param: "language_code",
            })?;
        let text = text
            .or(self.text.as_deref())
            .filter(|t| !t.is_empty())
            .ok_or(DialogflowError::ParameterIsEmpty { param: "text" })?;

        let span = Span::current();
        span.record("project", project.as_str());
        span.record("language", language.as_str());

        let session_id = self
            .session_id
            .as_deref()
            .and_then(|id| SessionId::new(id))
            .unwrap_or_else(SessionId::new_random);

        Ok(DetectIntentRequest {
            session: SessionName::new(&project, &session_id),
            query_input: query_input(text, &language),
            query_params: query_parameters(&self.optional_args),
        })
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// Fulfillment text of the last successful call.
    pub fn fulfillment_text(&self) -> Option<&str> {
        self.query_result
            .as_ref()
            .map(|result| result.fulfillment_text.as_str())
    }

    /// Fulfillment messages of the last successful call.
    pub fn fulfillment_messages(&self) -> Option<&[Message]> {
        self.query_result
            .as_ref()
            .map(|result| result.fulfillment_messages.as_slice())
    }

    /// The full result of the last successful call.
    pub fn query_result(&self) -> Option<&QueryResult> {
        self.query_result.as_ref()
    }

    /// The `parameters` field of the last result's JSON form.
    ///
    /// `None` before the first successful call, or when the agent extracted no
    /// parameters.
    pub fn parameters(&self) -> Option<Value> {
        self.to_json()?.remove("parameters")
    }

    /// The last result as a JSON object.
    pub fn to_json(&self) -> Option<Map<String, Value>> {
        self.query_result.as_ref().map(QueryResult::to_json)
    }

    /// Returns the adapter itself, for chaining after `fetch`.
    pub fn instance(&mut self) -> &mut Self {
        self
    }
}

impl std::fmt::Debug for Dialogflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dialogflow")
            .field("has_key", &self.key.is_some())
            .field("project_name", &self.project_name)
            .field("language_code", &self.language_code)
            .field("session_id", &self.session_id)
            .field("text", &self.text)
            .field("optional_args", &self.optional_args)
            .field("query_result", &self.query_result)
            .finish_non_exhaustive()
    }
}
