//! Dialogflow intent-detection adapter.
//!
//! This crate accumulates call options through chained setters, normalises
//! the credential, translates the options into a `sessions.detectIntent`
//! request, runs that request through a short-lived client, and exposes the
//! reply.
//!
//! ## Architectural Layer
//!
//! **Adapter logic + port definitions.** This crate performs no network I/O.
//! The remote service is reached through the [`SessionsClientFactory`] /
//! [`SessionsClient`] ports; `dialogflow-rest` supplies the HTTP implementation.
//! Credential files are read through [`ResourceReader`].
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`client`] | The [`Dialogflow`] adapter and its construction options |
//! | [`credential`] | [`KeyInput`] shapes and the [`KeyResolver`] |
//! | [`storage`] | Storage-root and filesystem [`ResourceReader`]s |
//! | [`request`] | Request wire types and option translation |
//! | [`response`] | Response wire types |
//! | [`session`] | Sessions-service port traits |
//! | [`identifiers`] | Newtype identifiers (`ProjectName`, `SessionId`, ...) |
//! | [`config`] | Hosting-environment settings |
//! | [`errors`] | [`DialogflowError`], [`ServiceError`] |

pub mod client;
pub mod config;
pub mod credential;
pub mod errors;
pub mod identifiers;
pub mod request;
pub mod response;
pub mod session;
pub mod storage;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use client::{Dialogflow, DialogflowOptions};
pub use config::DialogflowConfig;
pub use credential::{Credential, KeyInput, KeyResolver};
pub use errors::{DialogflowError, ServiceError};
pub use identifiers::{LanguageCode, ProjectName, SessionId, SessionName};
pub use request::{DetectIntentRequest, Payload, QueryInput, QueryParameters, StructValue, TextInput};
pub use response::{Context, DetectIntentResponse, Intent, Message, MessageText, QueryResult};
pub use session::{SessionsClient, SessionsClientFactory};
pub use storage::{DiskStorage, LocalFileSystem, ResourceReader};
