//! Chat message and tool-call records.
//!
//! These are the persisted shapes: the storage backend receives them inside
//! the project document verbatim, so field names serialize in camelCase to
//! stay compatible with documents written by earlier clients.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Lifecycle of a tool call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolCallStatus {
    /// The backend is still running the tool.
    Executing,
    /// A `tool_result` arrived for this call.
    Done,
}

/// A discrete server-side tool invocation surfaced to the client.
///
/// Status transitions executing→done exactly once, keyed by `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCall {
    /// Opaque identifier, unique within a session.
    pub id: String,
    /// Tool name.
    pub name: String,
    /// Argument payload (tool-specific, unordered).
    #[serde(default)]
    pub arguments: Map<String, Value>,
    /// Current lifecycle state.
    pub status: ToolCallStatus,
    /// Result payload, present once the call is done.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Image URL derived from the result, when the tool produced one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl ToolCall {
    /// Create an executing tool call as announced by a `tool_call` event.
    pub fn executing(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: Map<String, Value>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
            status: ToolCallStatus::Executing,
            result: None,
            image_url: None,
        }
    }

    /// Whether the call has completed.
    pub fn is_done(&self) -> bool {
        self.status == ToolCallStatus::Done
    }
}

/// One entry of a project's conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Author role.
    pub role: Role,
    /// Primary text content.
    #[serde(default)]
    pub content: String,
    /// Text emitted by the assistant after its tool calls resolved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_tool_content: Option<String>,
    /// Tool calls attached to this message, in arrival order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    /// URLs of user-attached images (user role only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_urls: Option<Vec<String>>,
}

impl Message {
    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            post_tool_content: None,
            tool_calls: None,
            image_urls: None,
        }
    }

    /// Create a user message carrying attached image URLs.
    pub fn user_with_images(content: impl Into<String>, image_urls: Vec<String>) -> Self {
        Self {
            image_urls: if image_urls.is_empty() {
                None
            } else {
                Some(image_urls)
            },
            ..Self::user(content)
        }
    }

    /// Create an assistant message with the given text.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            post_tool_content: None,
            tool_calls: None,
            image_urls: None,
        }
    }

    /// Create an assistant message hosting a single tool call.
    pub fn with_tool_call(tool_call: ToolCall) -> Self {
        Self {
            role: Role::Assistant,
            content: String::new(),
            post_tool_content: None,
            tool_calls: Some(vec![tool_call]),
            image_urls: None,
        }
    }

    /// Whether any tool call is attached.
    pub fn has_tool_calls(&self) -> bool {
        self.tool_calls.as_ref().is_some_and(|calls| !calls.is_empty())
    }

    /// Find an attached tool call by id.
    pub fn tool_call_mut(&mut self, id: &str) -> Option<&mut ToolCall> {
        self.tool_calls
            .as_mut()
            .and_then(|calls| calls.iter_mut().find(|c| c.id == id))
    }

    /// The message text as sent in request history: primary content joined
    /// with any post-tool-call text.
    pub fn full_content(&self) -> String {
        match self.post_tool_content.as_deref() {
            Some(tail) if !tail.is_empty() => {
                if self.content.is_empty() {
                    tail.to_string()
                } else {
                    format!("{}\n{tail}", self.content)
                }
            }
            _ => self.content.clone(),
        }
    }
}
