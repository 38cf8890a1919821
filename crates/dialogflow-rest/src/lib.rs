//! Dialogflow v2 REST transport.
//!
//! Implements the [`dialogflow::SessionsClientFactory`] port over HTTPS:
//! each opened client carries a bearer token and posts
//! `{endpoint}/v2/{session}:detectIntent`.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** HTTP transport, token acquisition, and error-envelope
//! parsing all live here. The [`dialogflow`] crate sees only
//! [`dialogflow::SessionsClientFactory`] and [`dialogflow::ServiceError`].
//!
//! No retries and no default timeout are applied; a timeout is only set when
//! the caller asks for one through [`RestSessionsClientFactoryBuilder::timeout`].

pub mod auth;
pub mod sessions;

#[cfg(test)]
mod testing;

pub use auth::{
    CredentialTokenSource, StaticTokenSource, TokenSource, DEFAULT_TOKEN_URI, DIALOGFLOW_SCOPES,
};
pub use sessions::{
    RestSessionsClient, RestSessionsClientFactory, RestSessionsClientFactoryBuilder,
    DEFAULT_ENDPOINT,
};
