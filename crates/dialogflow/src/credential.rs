//! Credential normalisation.
//!
//! A Dialogflow credential is a JSON key file (service account, authorised
//! user, ...). Callers may hand it over as an already-decoded mapping, as any
//! serialisable value, as a path into application storage, as a filesystem
//! path, or as the raw JSON text. [`KeyResolver::resolve`] turns every one of
//! those into a [`Credential`].

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::storage::{DiskStorage, LocalFileSystem, ResourceReader};
use crate::DialogflowError;

/// A decoded credential: the key file's top-level JSON object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Credential(Map<String, Value>);

impl Credential {
    /// Wraps an already-decoded mapping.
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Returns `true` if the credential has no fields.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Looks up a string field such as `"type"` or `"client_email"`.
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Returns the underlying mapping.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consumes the credential, returning the underlying mapping.
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

// ---------------------------------------------------------------------------

/// The shapes a credential may be supplied in.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyInput {
    /// An already-decoded mapping; used as-is.
    Map(Map<String, Value>),
    /// A structured value; must be a JSON object.
    Object(Value),
    /// A storage path, a filesystem path, or raw JSON text (tried in that order).
    Text(String),
}

impl KeyInput {
    /// Captures any serialisable value as [`KeyInput::Object`].
    pub fn from_serializable<T: Serialize>(value: &T) -> Result<Self, DialogflowError> {
        serde_json::to_value(value)
            .map(Self::Object)
            .map_err(|_| DialogflowError::InvalidCredentialType)
    }
}

impl From<Map<String, Value>> for KeyInput {
    fn from(map: Map<String, Value>) -> Self {
        Self::Map(map)
    }
}

impl From<Value> for KeyInput {
    fn from(value: Value) -> Self {
        Self::Object(value)
    }
}

impl From<String> for KeyInput {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for KeyInput {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<&Path> for KeyInput {
    fn from(path: &Path) -> Self {
        Self::Text(path.to_string_lossy().into_owned())
    }
}

// ---------------------------------------------------------------------------

/// Resolves [`KeyInput`]s into [`Credential`]s using a storage reader and a
/// filesystem reader.
#[derive(Clone)]
pub struct KeyResolver {
    storage: Arc<dyn ResourceReader>,
    filesystem: Arc<dyn ResourceReader>,
}

impl KeyResolver {
    /// Creates a resolver over the given readers.
    pub fn new(storage: Arc<dyn ResourceReader>, filesystem: Arc<dyn ResourceReader>) -> Self {
        Self {
            storage,
            filesystem,
        }
    }

    /// Normalises `input` into a credential.
    ///
    /// Returns `Ok(None)` when an existing path holds something other than a
    /// JSON object; the adapter then reports [`DialogflowError::CredentialNotFound`]
    /// at call time.
    pub fn resolve(&self, input: KeyInput) -> Result<Option<Credential>, DialogflowError> {
        match input {
            KeyInput::Map(map) => Ok(Some(Credential(map))),
            KeyInput::Object(Value::Object(map)) => Ok(Some(Credential(map))),
            KeyInput::Object(_) => Err(DialogflowError::InvalidCredentialType),
            KeyInput::Text(text) => self.resolve_text(&text),
        }
    }

    fn resolve_text(&self, text: &str) -> Result<Option<Credential>, DialogflowError> {
        for (origin, reader) in [("storage", &self.storage), ("filesystem", &self.filesystem)] {
            if let Some(path) = reader.locate(text) {
                debug!(origin, path = %path.display(), "loading credential from file");
                let bytes = reader
                    .read(&path)
                    .map_err(|source| DialogflowError::CredentialUnreadable {
                        path: path.clone(),
                        source,
                    })?;
                return Ok(decode_object(&bytes));
            }
        }

        decode_object(text.as_bytes())
            .map(Some)
            .ok_or(DialogflowError::InvalidCredentialType)
    }
}

impl Default for KeyResolver {
    fn default() -> Self {
        Self::new(Arc::new(DiskStorage::default()), Arc::new(LocalFileSystem))
    }
}

impl std::fmt::Debug for KeyResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyResolver").finish_non_exhaustive()
    }
}

fn decode_object(bytes: &[u8]) -> Option<Credential> {
    match serde_json::from_slice(bytes) {
        Ok(Value::Object(map)) => Some(Credential(map)),
        _ => None,
    }
}
