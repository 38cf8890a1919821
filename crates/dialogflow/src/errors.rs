//! Error types for the Dialogflow adapter.
//!
//! [`DialogflowError`] is what callers of [`crate::Dialogflow`] see. Local
//! validation and credential problems are raised before any network activity;
//! everything the remote layer reports is wrapped, unmodified, in
//! [`DialogflowError::RemoteServiceFailure`].
//!
//! [`ServiceError`] is produced by implementations of the
//! [`crate::SessionsClient`] port. The adapter never retries.

use std::path::PathBuf;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Remote-layer errors
// ---------------------------------------------------------------------------

/// Failures reported by a [`crate::SessionsClient`] implementation.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The request never produced an HTTP response (connect, TLS, timeout,
    /// or a client that has already been closed).
    #[error("transport failure: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The service answered with a non-success status.
    #[error("Dialogflow returned {code}{}: {message}", .status.as_deref().map(|s| format!(" {s}")).unwrap_or_default())]
    Status {
        /// HTTP status code (or the `error.code` field of the error envelope).
        code: u16,
        /// Canonical status name from the error envelope, e.g. `"PERMISSION_DENIED"`.
        status: Option<String>,
        /// Human-readable message from the service.
        message: String,
    },

    /// A success response whose body could not be decoded.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// No bearer token could be obtained for the supplied credential.
    #[error("authentication failed: {0}")]
    Authentication(String),
}

impl ServiceError {
    /// Wraps any transport-level error.
    pub fn transport(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Transport(err.into())
    }
}

// ---------------------------------------------------------------------------
// Adapter errors
// ---------------------------------------------------------------------------

/// Errors returned by [`crate::Dialogflow`] and its credential setter.
#[derive(Debug, Error)]
pub enum DialogflowError {
    /// A required option was missing or empty when `fetch` was called.
    ///
    /// Checked in the order `project_name`, `language_code`, `text`.
    #[error("Invalid parameter. `{param}` is empty.")]
    ParameterIsEmpty {
        /// Name of the first missing option.
        param: &'static str,
    },

    /// No credential was set, or it resolved to an empty mapping.
    #[error("Credential not found")]
    CredentialNotFound,

    /// The credential matched none of the recognised input shapes.
    #[error("Invalid `Key` type")]
    InvalidCredentialType,

    /// A credential path exists but could not be read.
    #[error("Credential at {} could not be read", .path.display())]
    CredentialUnreadable {
        /// The path that was found but not read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The remote service (or its transport) failed the call.
    #[error("Failed to Dialogflow Service: {0}")]
    RemoteServiceFailure(#[from] ServiceError),
}
