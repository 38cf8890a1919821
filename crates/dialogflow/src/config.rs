//! Hosting-environment settings.
//!
//! Three settings feed the adapter: the credential (raw JSON or a path), the
//! project name and the default language code. [`DialogflowConfig::from_env`]
//! reads them from `DIALOGFLOW_KEY`, `DIALOGFLOW_PROJECT_NAME` and
//! `DIALOGFLOW_LANGUAGE_CODE`.
//!
//! The two defaults differ in case and are kept that way: the environment
//! loader falls back to [`ENV_DEFAULT_LANGUAGE_CODE`] (`"zh-TW"`), while
//! [`crate::Dialogflow::from_config`] falls back to
//! [`CONFIG_DEFAULT_LANGUAGE_CODE`] (`"zh-tw"`) when a config carries no
//! language at all.

use serde::{Deserialize, Serialize};

/// Environment variable holding the credential (JSON text or a path).
pub const KEY_ENV: &str = "DIALOGFLOW_KEY";
/// Environment variable holding the project name.
pub const PROJECT_NAME_ENV: &str = "DIALOGFLOW_PROJECT_NAME";
/// Environment variable holding the language code.
pub const LANGUAGE_CODE_ENV: &str = "DIALOGFLOW_LANGUAGE_CODE";

/// Language used by [`DialogflowConfig::from_env`] when the variable is unset.
pub const ENV_DEFAULT_LANGUAGE_CODE: &str = "zh-TW";
/// Language used by [`crate::Dialogflow::from_config`] when the config has none.
pub const CONFIG_DEFAULT_LANGUAGE_CODE: &str = "zh-tw";

/// Settings injected when the adapter is constructed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogflowConfig {
    /// Credential as raw JSON text or a storage/filesystem path.
    #[serde(default)]
    pub key: Option<String>,
    /// Google Cloud project that owns the agent.
    #[serde(default)]
    pub project_name: Option<String>,
    /// Default language of queries.
    #[serde(default)]
    pub language_code: Option<String>,
}

impl DialogflowConfig {
    /// Loads the settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads the settings through `lookup`, which maps a variable name to
    /// its value.
    ///
    /// Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());
        Self {
            key: get(KEY_ENV),
            project_name: get(PROJECT_NAME_ENV),
            language_code: Some(
                get(LANGUAGE_CODE_ENV).unwrap_or_else(|| ENV_DEFAULT_LANGUAGE_CODE.to_owned()),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn unset_language_falls_back_to_upper_case_region() {
        let config = DialogflowConfig::from_lookup(|_| None);
        assert_eq!(config.key, None);
        assert_eq!(config.project_name, None);
        assert_eq!(config.language_code.as_deref(), Some("zh-TW"));
    }

    #[test]
    fn variables_are_read_by_name() {
        let vars = HashMap::from([
            (KEY_ENV, "{\"type\":\"service_account\"}"),
            (PROJECT_NAME_ENV, "demo"),
            (LANGUAGE_CODE_ENV, "en"),
        ]);
        let config = DialogflowConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(config.key.as_deref(), Some("{\"type\":\"service_account\"}"));
        assert_eq!(config.project_name.as_deref(), Some("demo"));
        assert_eq!(config.language_code.as_deref(), Some("en"));
    }

    #[test]
    fn empty_variables_count_as_unset() {
        let config = DialogflowConfig::from_lookup(|_| Some(String::new()));
        assert_eq!(config.project_name, None);
        assert_eq!(config.language_code.as_deref(), Some("zh-TW"));
    }
}
