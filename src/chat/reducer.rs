//! Event-stream reducer: folds chat stream events into the message list.
//!
//! The reducer is the ordering-sensitive core of the client. It consumes
//! [`StreamEvent`]s strictly in arrival order and mutates an ordered list of
//! [`Message`]s in place, producing [`SideEffect`]s for the caller to run
//! (canvas image insertion). It never fails: protocol violations degrade to
//! logged no-ops, keeping partial progress intact.
//!
//! Folding rules:
//!
//! - `delta` appends to the last message only when it is an assistant
//!   message with no tool calls; otherwise a new assistant message starts.
//!   A tool-call-bearing message never receives further free text.
//! - `tool_call` always opens a new assistant message hosting exactly one
//!   call, yielding a narration/action interleaving of one message per
//!   action.
//! - `tool_result` completes the matching call by id; a result for an
//!   unknown or already-completed id is dropped.
//! - `error` overwrites the trailing assistant message (or appends one).

use serde_json::Value;

use super::event::StreamEvent;
use super::message::{Message, Role, ToolCall, ToolCallStatus};

/// A cross-component action requested by the reducer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SideEffect {
    /// A tool produced an image; insert it into the canvas document and
    /// force a save.
    InsertImage {
        /// URL of the produced image.
        url: String,
    },
}

/// Apply one event to the message list.
///
/// Returns a side effect when the event triggers one. Never panics and
/// never fails; out-of-protocol events are logged and ignored.
pub fn apply_event(messages: &mut Vec<Message>, event: &StreamEvent) -> Option<SideEffect> {
    match event {
        StreamEvent::Delta { content } => {
            apply_delta(messages, content);
            None
        }
        StreamEvent::ToolCall {
            id,
            name,
            arguments,
        } => {
            messages.push(Message::with_tool_call(ToolCall::executing(
                id.clone(),
                name.clone(),
                arguments.clone(),
            )));
            None
        }
        StreamEvent::ToolCallChunk { .. } => {
            // Arguments are only read at tool_call/tool_result time.
            None
        }
        StreamEvent::ToolResult {
            tool_call_id,
            content,
        } => apply_tool_result(messages, tool_call_id, content),
        StreamEvent::Error { error } => {
            apply_error(messages, error);
            None
        }
    }
}

fn apply_delta(messages: &mut Vec<Message>, content: &str) {
    match messages.last_mut() {
        Some(last) if last.role == Role::Assistant && !last.has_tool_calls() => {
            last.content.push_str(content);
        }
        _ => messages.push(Message::assistant(content)),
    }
}

fn apply_tool_result(
    messages: &mut [Message],
    tool_call_id: &str,
    content: &Value,
) -> Option<SideEffect> {
    let call = match messages.iter_mut().find_map(|m| m.tool_call_mut(tool_call_id)) {
        Some(call) => call,
        None => {
            tracing::debug!(tool_call_id, "dropping result for unknown tool call");
            return None;
        }
    };
    if call.status == ToolCallStatus::Done {
        tracing::debug!(tool_call_id, "dropping duplicate tool result");
        return None;
    }
    call.status = ToolCallStatus::Done;

    let result = parse_result(content);
    if let Some(prompt) = result.get("prompt") {
        if call.arguments.is_empty() {
            call.arguments.insert("prompt".into(), prompt.clone());
        }
    }
    let effect = result
        .get("image_url")
        .and_then(Value::as_str)
        .map(|url| {
            call.image_url = Some(url.to_string());
            SideEffect::InsertImage {
                url: url.to_string(),
            }
        });
    call.result = Some(result);
    effect
}

fn apply_error(messages: &mut Vec<Message>, error: &str) {
    let text = format!("Error: {error}");
    match messages.last_mut() {
        Some(last) if last.role == Role::Assistant => last.content = text,
        _ => messages.push(Message::assistant(text)),
    }
}

/// Interpret a tool-result payload.
///
/// The backend usually delivers a JSON document encoded as a string; an
/// already-structured object is accepted as-is, and anything unparseable is
/// preserved verbatim so no information is lost.
fn parse_result(content: &Value) -> Value {
    match content {
        Value::String(raw) => match serde_json::from_str::<Value>(raw) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::debug!(error = %e, "tool result is not JSON, keeping raw string");
                content.clone()
            }
        },
        other => other.clone(),
    }
}

/// Apply a sequence of events, collecting the side effects in order.
///
/// Convenience over [`apply_event`] for callers holding a decoded batch.
pub fn apply_all(messages: &mut Vec<Message>, events: &[StreamEvent]) -> Vec<SideEffect> {
    events
        .iter()
        .filter_map(|event| apply_event(messages, event))
        .collect()
}
