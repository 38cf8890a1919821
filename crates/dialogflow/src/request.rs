//! Request-side wire types for `sessions.detectIntent` and the translation
//! from adapter options into them.
//!
//! Field names follow the v2 JSON mapping (camelCase). A protobuf `Struct`
//! serialises as a plain JSON object and a string `Value` as a plain JSON
//! string, which is exactly what [`Payload`] and [`StructValue`] produce.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{LanguageCode, SessionName};

/// One text query in one language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextInput {
    /// The natural-language text to be processed.
    pub text: String,
    /// Language of `text`.
    pub language_code: String,
}

/// What is being queried; only text input is supported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryInput {
    /// The text query.
    pub text: TextInput,
}

/// A field value inside a [`Payload`].
///
/// Only the string kind is produced: every optional argument is sent as a
/// string regardless of its original type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StructValue {
    /// A string value.
    StringValue(String),
}

/// A structured payload (protobuf `Struct`) of string-valued fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload {
    /// Payload fields by name.
    pub fields: BTreeMap<String, StructValue>,
}

/// Extra parameters attached to a query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryParameters {
    /// Passed through to the agent's fulfillment webhook as-is.
    pub payload: Payload,
}

/// A complete `detectIntent` call: the session it targets plus the JSON body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectIntentRequest {
    /// Target session; carried in the URL, not the body.
    #[serde(skip)]
    pub session: SessionName,
    /// The query.
    pub query_input: QueryInput,
    /// Absent, not empty, when there are no optional arguments.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_params: Option<QueryParameters>,
}

/// Builds the query envelope for `text` in `language`.
pub fn query_input(text: &str, language: &LanguageCode) -> QueryInput {
    QueryInput {
        text: TextInput {
            text: text.to_owned(),
            language_code: language.as_str().to_owned(),
        },
    }
}

/// Wraps optional arguments as a string-valued payload.
///
/// Returns `None` for an empty mapping so the request carries no
/// `queryParams` at all.
pub fn query_parameters(optional_args: &BTreeMap<String, String>) -> Option<QueryParameters> {
    if optional_args.is_empty() {
        return None;
    }

    let fields = optional_args
        .iter()
        .map(|(key, value)| (key.clone(), StructValue::StringValue(value.clone())))
        .collect();

    Some(QueryParameters {
        payload: Payload { fields },
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{ProjectName, SessionId};

    fn session() -> SessionName {
        SessionName::new(
            &ProjectName::new("demo").unwrap(),
            &SessionId::new("s1").unwrap(),
        )
    }

    #[test]
    fn empty_arguments_omit_query_params() {
        let request = DetectIntentRequest {
            session: session(),
            query_input: query_input("hello", &LanguageCode::new("en").unwrap()),
            query_params: query_parameters(&BTreeMap::new()),
        };

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({ "queryInput": { "text": { "text": "hello", "languageCode": "en" } } })
        );
    }

    #[test]
    fn arguments_become_string_payload_fields() {
        let args = BTreeMap::from([
            ("user".to_owned(), "42".to_owned()),
            ("vip".to_owned(), "true".to_owned()),
        ]);
        let request = DetectIntentRequest {
            session: session(),
            query_input: query_input("hello", &LanguageCode::new("zh-TW").unwrap()),
            query_params: query_parameters(&args),
        };

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "queryInput": { "text": { "text": "hello", "languageCode": "zh-TW" } },
                "queryParams": { "payload": { "user": "42", "vip": "true" } }
            })
        );
    }
}
