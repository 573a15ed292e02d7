//! Tool call request/result types.
//!
//! A `ToolCallRequest` is what the model proposed; a `ToolCallResult` is the
//! uniform outcome the executor hands back. Exactly one of `result` / `error`
//! is populated, mirrored by the `status` discriminator so the model (and
//! the caller explaining partial failures) can branch without inspecting
//! payloads.

use serde::{Deserialize, Serialize};

/// A model-proposed invocation of a named action. Arguments are carried as
/// the raw JSON string the model produced — unvalidated until the executor
/// parses them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Unique call ID (matches the model's tool_call id)
    pub id: String,

    /// Name of the tool to execute
    pub name: String,

    /// Arguments as a JSON string
    pub arguments: String,
}

/// Outcome status of one tool call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolStatus {
    Success,
    Error,
}

/// The result of executing one tool call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallResult {
    /// The tool that was (or was asked to be) executed
    pub tool: String,

    /// Whether the call succeeded
    pub status: ToolStatus,

    /// Opaque success payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,

    /// Human-readable failure message, safe to show the user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolCallResult {
    pub fn success(tool: impl Into<String>, result: serde_json::Value) -> Self {
        Self {
            tool: tool.into(),
            status: ToolStatus::Success,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            status: ToolStatus::Error,
            result: None,
            error: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ToolStatus::Success
    }

    /// Render this result as the content of a tool message for the model's
    /// second pass: the raw payload on success, `{"error": ...}` on failure.
    pub fn to_model_content(&self) -> String {
        match (&self.result, &self.error) {
            (Some(value), _) => value.to_string(),
            (None, Some(message)) => {
                serde_json::json!({ "error": message }).to_string()
            }
            (None, None) => "{}".into(),
        }
    }
}
