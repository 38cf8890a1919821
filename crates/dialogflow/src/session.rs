//! Port traits for the remote sessions service and the per-call client guard.
//!
//! ## Lifecycle
//!
//! Every `fetch` opens a fresh client through [`SessionsClientFactory::open`],
//! issues exactly one [`SessionsClient::detect_intent`], and closes the client.
//! [`OpenClient`] owns the client for that window and closes it on drop, so the
//! close happens on the success path, the error path, and when the enclosing
//! future is dropped mid-call.

use async_trait::async_trait;
use tracing::debug;

use crate::credential::Credential;
use crate::errors::ServiceError;
use crate::request::DetectIntentRequest;
use crate::response::DetectIntentResponse;

/// Opens short-lived clients for the sessions service.
#[async_trait]
pub trait SessionsClientFactory: Send + Sync {
    /// Opens a client authenticated with `credential`.
    async fn open(&self, credential: &Credential) -> Result<Box<dyn SessionsClient>, ServiceError>;
}

/// A connected sessions-service client.
#[async_trait]
pub trait SessionsClient: Send {
    /// Sends one query to `request.session`.
    async fn detect_intent(
        &mut self,
        request: &DetectIntentRequest,
    ) -> Result<DetectIntentResponse, ServiceError>;

    /// Releases the client. Calling it more than once must be a no-op.
    fn close(&mut self);
}

// ---------------------------------------------------------------------------

/// Scope guard around an open [`SessionsClient`].
pub(crate) struct OpenClient {
    inner: Box<dyn SessionsClient>,
}

impl OpenClient {
    pub(crate) async fn open(
        factory: &dyn SessionsClientFactory,
        credential: &Credential,
    ) -> Result<Self, ServiceError> {
        let inner = factory.open(credential).await?;
        debug!("sessions client opened");
        Ok(Self { inner })
    }

    pub(crate) async fn detect_intent(
        &mut self,
        request: &DetectIntentRequest,
    ) -> Result<DetectIntentResponse, ServiceError> {
        self.inner.detect_intent(request).await
    }
}

impl Drop for OpenClient {
    fn drop(&mut self) {
        self.inner.close();
        debug!("sessions client closed");
    }
}
