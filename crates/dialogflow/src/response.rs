//! Response-side wire types for `sessions.detectIntent`.
//!
//! [`QueryResult`] keeps the object it was decoded from, so
//! [`QueryResult::to_json`] returns exactly what the service sent. The typed
//! fields are a read-only view over that object.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The body of a successful `detectIntent` call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectIntentResponse {
    /// Unique identifier of this response.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub response_id: String,
    /// The outcome of intent matching.
    #[serde(default)]
    pub query_result: QueryResult,
    /// Status of the fulfillment webhook call, if one was made.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_status: Option<Value>,
}

/// The outcome of one conversational query.
///
/// Serialises back to the wire object it was decoded from, unknown fields and
/// number representations included.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct QueryResult {
    /// The text that was matched.
    pub query_text: String,
    /// Language of the query.
    pub language_code: String,
    /// Action name of the matched intent.
    pub action: String,
    /// Parameters extracted from the query.
    pub parameters: Option<Map<String, Value>>,
    /// Whether every required parameter has a value.
    pub all_required_params_present: bool,
    /// Text to be pronounced or displayed to the user.
    pub fulfillment_text: String,
    /// Rich messages to present to the user.
    pub fulfillment_messages: Vec<Message>,
    /// Contexts active after this turn.
    pub output_contexts: Vec<Context>,
    /// The matched intent.
    pub intent: Option<Intent>,
    /// Matching confidence in `[0.0, 1.0]`.
    pub intent_detection_confidence: Option<f64>,
    raw: Map<String, Value>,
}

/// Typed fields of a query result, decoded from the raw object.
#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct QueryResultView {
    query_text: String,
    language_code: String,
    action: String,
    parameters: Option<Map<String, Value>>,
    all_required_params_present: bool,
    fulfillment_text: String,
    fulfillment_messages: Vec<Message>,
    output_contexts: Vec<Context>,
    intent: Option<Intent>,
    intent_detection_confidence: Option<f64>,
}

impl TryFrom<Map<String, Value>> for QueryResult {
    type Error = serde_json::Error;

    fn try_from(raw: Map<String, Value>) -> Result<Self, Self::Error> {
        let view: QueryResultView = serde_json::from_value(Value::Object(raw.clone()))?;
        Ok(Self {
            query_text: view.query_text,
            language_code: view.language_code,
            action: view.action,
            parameters: view.parameters,
            all_required_params_present: view.all_required_params_present,
            fulfillment_text: view.fulfillment_text,
            fulfillment_messages: view.fulfillment_messages,
            output_contexts: view.output_contexts,
            intent: view.intent,
            intent_detection_confidence: view.intent_detection_confidence,
            raw,
        })
    }
}

impl From<QueryResult> for Map<String, Value> {
    fn from(result: QueryResult) -> Self {
        result.raw
    }
}

impl QueryResult {
    /// The result as the service sent it.
    pub fn to_json(&self) -> Map<String, Value> {
        self.raw.clone()
    }
}

/// One rich fulfillment message.
///
/// Messages are a `oneof` on the wire; the text variant is typed, the others
/// (`payload`, `card`, `quickReplies`, ...) are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Target platform, e.g. `"FACEBOOK"`; absent for the default platform.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    /// Text responses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<MessageText>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Variants of a text response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageText {
    #[serde(default)]
    pub text: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A context returned by the agent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Context {
    /// Resource name, `projects/../agent/sessions/../contexts/{name}`.
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lifespan_count: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Map<String, Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The intent a query matched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Intent {
    /// Resource name of the intent.
    #[serde(default)]
    pub name: String,
    /// Human-readable intent name.
    #[serde(default)]
    pub display_name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
