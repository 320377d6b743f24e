use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants;

/// Uniform envelope returned by every service operation.
///
/// `success = true` also covers "not found" and "no content" outcomes; domain
/// absence is signaled through `message_http` and sentinel payloads, never
/// through the flag. Callers pattern-match on the literal strings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationResult {
    pub success: bool,
    pub message_http: String,
    pub data: Option<Value>,
}

impl OperationResult {
    pub fn new(success: bool, message_http: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            success,
            message_http: message_http.into(),
            data,
        }
    }

    pub fn ok(data: Option<Value>) -> Self {
        Self::new(true, constants::MSJ_200, data)
    }

    pub fn no_content(data: Option<Value>) -> Self {
        Self::new(true, constants::MSJ_204, data)
    }

    /// Success result carrying the missing-conversation sentinel.
    pub fn conversation_not_found() -> Self {
        Self::no_content(Some(Value::String(constants::CONV_NO_EXIST.into())))
    }

    /// Success result carrying the missing-messages sentinel.
    pub fn messages_not_found() -> Self {
        Self::no_content(Some(Value::String(constants::MSJ_NO_EXIST.into())))
    }

    /// Success result for a message id that is not in the stored list.
    pub fn message_not_found_for_update() -> Self {
        Self::no_content(Some(Value::String(constants::MSJ_NO_EXIST_UPDATE.into())))
    }

    pub fn failure(message_http: impl Into<String>) -> Self {
        Self::new(false, message_http, None)
    }
}
