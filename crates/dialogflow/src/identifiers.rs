//! Newtype identifiers for the values that scope a Dialogflow call.
//!
//! A project name, a session token and the fully-qualified session resource
//! name are all strings on the wire; the newtypes keep them from being swapped
//! when a session name is composed.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

string_id! {
    /// The Google Cloud project that owns the Dialogflow agent.
    ProjectName
}

string_id! {
    /// A BCP-47 language tag sent with every text query (e.g. `"en"`, `"zh-TW"`).
    LanguageCode
}

string_id! {
    /// Caller-visible token naming one conversation.
    ///
    /// Reusing a token across calls lets the service carry context between
    /// turns; a fresh token starts a new conversation.
    SessionId
}

impl SessionId {
    /// Generates a fresh random session token.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }
}

// ---------------------------------------------------------------------------

/// Fully-qualified session resource name:
/// `projects/{project}/agent/sessions/{session}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionName(String);

impl SessionName {
    /// Composes the resource name for `session` in `project`.
    pub fn new(project: &ProjectName, session: &SessionId) -> Self {
        Self(format!("projects/{project}/agent/sessions/{session}"))
    }

    /// Returns the resource name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_values_are_rejected() {
        assert!(ProjectName::new("").is_none());
        assert!(SessionId::new(String::new()).is_none());
        assert_eq!(LanguageCode::new("en").unwrap().as_str(), "en");
    }

    #[test]
    fn session_name_follows_resource_layout() {
        let project = ProjectName::new("demo").unwrap();
        let session = SessionId::new("abc").unwrap();
        assert_eq!(
            SessionName::new(&project, &session).as_str(),
            "projects/demo/agent/sessions/abc"
        );
    }

    #[test]
    fn random_session_ids_are_unique() {
        let a = SessionId::new_random();
        let b = SessionId::new_random();
        assert_ne!(a, b);
        assert!(!a.as_str().is_empty());
    }
}
