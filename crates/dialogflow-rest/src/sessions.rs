//! `sessions.detectIntent` over the v2 REST API.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dialogflow::{
    Credential, DetectIntentRequest, DetectIntentResponse, ServiceError, SessionName,
    SessionsClient, SessionsClientFactory,
};
use serde::Deserialize;
use tracing::debug;

use crate::auth::TokenSource;

/// Production endpoint of the Dialogflow ES API.
pub const DEFAULT_ENDPOINT: &str = "https://dialogflow.googleapis.com";

/// Opens [`RestSessionsClient`]s.
#[derive(Clone)]
pub struct RestSessionsClientFactory {
    endpoint: String,
    timeout: Option<Duration>,
    token_source: Arc<dyn TokenSource>,
}

impl RestSessionsClientFactory {
    /// Creates a factory for the production endpoint with no request timeout.
    pub fn new(token_source: Arc<dyn TokenSource>) -> Self {
        Self::builder(token_source).build()
    }

    /// Returns a builder for configuring the factory.
    pub fn builder(token_source: Arc<dyn TokenSource>) -> RestSessionsClientFactoryBuilder {
        RestSessionsClientFactoryBuilder {
            endpoint: DEFAULT_ENDPOINT.to_owned(),
            timeout: None,
            token_source,
        }
    }

    /// Returns the API endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl std::fmt::Debug for RestSessionsClientFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestSessionsClientFactory")
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Builder for [`RestSessionsClientFactory`].
pub struct RestSessionsClientFactoryBuilder {
    endpoint: String,
    timeout: Option<Duration>,
    token_source: Arc<dyn TokenSource>,
}

impl RestSessionsClientFactoryBuilder {
    /// Overrides the API endpoint (regional endpoints, test servers).
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_owned();
        self
    }

    /// Sets a per-request timeout on opened clients.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> RestSessionsClientFactory {
        RestSessionsClientFactory {
            endpoint: self.endpoint,
            timeout: self.timeout,
            token_source: self.token_source,
        }
    }
}

#[async_trait]
impl SessionsClientFactory for RestSessionsClientFactory {
    async fn open(&self, credential: &Credential) -> Result<Box<dyn SessionsClient>, ServiceError> {
        let token = self.token_source.access_token(credential).await?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(ServiceError::transport)?;

        Ok(Box::new(RestSessionsClient {
            http: Some(http),
            endpoint: self.endpoint.clone(),
            token,
        }))
    }
}

// ---------------------------------------------------------------------------

/// One authenticated connection to the sessions API.
pub struct RestSessionsClient {
    http: Option<reqwest::Client>,
    endpoint: String,
    token: String,
}

#[async_trait]
impl SessionsClient for RestSessionsClient {
    async fn detect_intent(
        &mut self,
        request: &DetectIntentRequest,
    ) -> Result<DetectIntentResponse, ServiceError> {
        let http = self
            .http
            .as_ref()
            .ok_or_else(|| ServiceError::transport("sessions client is closed"))?;

        let url = detect_intent_url(&self.endpoint, &request.session);
        let response = http
            .post(&url)
            .bearer_auth(&self.token)
            .json(request)
            .send()
            .await
            .map_err(ServiceError::transport)?;

        let status = response.status();
        debug!(status = status.as_u16(), "detectIntent answered");
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status.as_u16(), &body));
        }

        let body = response
            .bytes()
            .await
            .map_err(ServiceError::transport)?;
        serde_json::from_slice(&body).map_err(|e| ServiceError::MalformedResponse(e.to_string()))
    }

    fn close(&mut self) {
        self.http = None;
    }
}

fn detect_intent_url(endpoint: &str, session: &SessionName) -> String {
    format!("{endpoint}/v2/{session}:detectIntent")
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<u16>,
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

/// Maps a non-success response to [`ServiceError::Status`], preferring the
/// Google error envelope and falling back to the raw body.
fn status_error(http_status: u16, body: &str) -> ServiceError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(ErrorEnvelope { error }) => ServiceError::Status {
            code: error.code.unwrap_or(http_status),
            status: error.status,
            message: error.message,
        },
        Err(_) => ServiceError::Status {
            code: http_status,
            status: None,
            message: body.trim().to_owned(),
        },
    }
}
