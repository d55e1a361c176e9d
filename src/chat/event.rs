//! Typed wire events for the streaming chat endpoint.
//!
//! Each `data:` payload carries a JSON object with a `type` discriminator.
//! [`StreamEvent`] is the decoded form; [`decode_payload`] maps one payload
//! string to an event, treating the `[DONE]` sentinel and malformed JSON
//! leniently (a bad line is logged and skipped, never fatal).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::sse;

/// One decoded event from the chat stream.
///
/// Mirrors the backend's wire format: `{"type": "...", ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// A fragment of assistant text.
    Delta {
        /// The text fragment.
        content: String,
    },

    /// The assistant invoked a tool.
    ToolCall {
        /// Opaque identifier, unique within the session.
        id: String,
        /// Tool name (e.g. `generate_image`).
        name: String,
        /// Tool-specific argument payload.
        #[serde(default)]
        arguments: Map<String, Value>,
    },

    /// A fragment of streamed tool-call arguments.
    ///
    /// Reserved for incremental argument streaming; the baseline reducer
    /// ignores it (arguments are read at `tool_call`/`tool_result` time).
    ToolCallChunk {
        /// Position of the tool call within the assistant turn.
        #[serde(default)]
        index: u32,
        /// Identifier of the tool call this fragment belongs to.
        #[serde(default)]
        id: Option<String>,
        /// Raw argument fragment.
        #[serde(default)]
        args: Option<String>,
    },

    /// A tool finished executing.
    ToolResult {
        /// Identifier of the completed tool call.
        tool_call_id: String,
        /// Result payload; usually a JSON document encoded as a string.
        #[serde(default)]
        content: Value,
    },

    /// The backend reported a failure.
    Error {
        /// Human-readable description.
        #[serde(default)]
        error: String,
    },
}

/// Decode one `data:` payload into an event.
///
/// Returns `None` for the `[DONE]` sentinel and for payloads that are not
/// valid events; the latter are logged at `warn` level and skipped so a
/// single corrupt line never interrupts the stream.
pub fn decode_payload(payload: &str) -> Option<StreamEvent> {
    if sse::is_done(payload) {
        return None;
    }
    match serde_json::from_str::<StreamEvent>(payload) {
        Ok(event) => Some(event),
        Err(e) => {
            tracing::warn!(error = %e, payload = %truncate(payload, 120), "skipping undecodable stream line");
            None
        }
    }
}

/// Clip a payload for log output.
fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // ── decode_payload ────────────────────────────────────────

    #[test]
    fn decode_delta() {
        let event = decode_payload(r#"{"type":"delta","content":"Hi"}"#);
        assert_eq!(
            event,
            Some(StreamEvent::Delta {
                content: "Hi".into()
            })
        );
    }

    #[test]
    fn decode_tool_call() {
        let event = decode_payload(
            r#"{"type":"tool_call","id":"t1","name":"generate_image","arguments":{"prompt":"a cat"}}"#,
        );
        match event {
            Some(StreamEvent::ToolCall {
                id,
                name,
                arguments,
            }) => {
                assert_eq!(id, "t1");
                assert_eq!(name, "generate_image");
                assert_eq!(arguments.get("prompt"), Some(&json!("a cat")));
            }
            other => unreachable!("expected ToolCall, got {other:?}"),
        }
    }

    #[test]
    fn decode_tool_call_without_arguments() {
        let event = decode_payload(r#"{"type":"tool_call","id":"t1","name":"generate_image"}"#);
        match event {
            Some(StreamEvent::ToolCall { arguments, .. }) => assert!(arguments.is_empty()),
            other => unreachable!("expected ToolCall, got {other:?}"),
        }
    }

    #[test]
    fn decode_tool_call_chunk() {
        let event =
            decode_payload(r#"{"type":"tool_call_chunk","index":0,"id":"t1","args":"{\"pro"}"#);
        match event {
            Some(StreamEvent::ToolCallChunk { index, id, args }) => {
                assert_eq!(index, 0);
                assert_eq!(id.as_deref(), Some("t1"));
                assert_eq!(args.as_deref(), Some("{\"pro"));
            }
            other => unreachable!("expected ToolCallChunk, got {other:?}"),
        }
    }

    #[test]
    fn decode_tool_result_with_string_content() {
        let event = decode_payload(
            r#"{"type":"tool_result","tool_call_id":"t1","content":"{\"image_url\":\"http://x/img.png\"}"}"#,
        );
        match event {
            Some(StreamEvent::ToolResult {
                tool_call_id,
                content,
            }) => {
                assert_eq!(tool_call_id, "t1");
                assert!(content.is_string());
            }
            other => unreachable!("expected ToolResult, got {other:?}"),
        }
    }

    #[test]
    fn decode_tool_result_with_object_content() {
        let event = decode_payload(
            r#"{"type":"tool_result","tool_call_id":"t1","content":{"image_url":"http://x/a.png"}}"#,
        );
        match event {
            Some(StreamEvent::ToolResult { content, .. }) => assert!(content.is_object()),
            other => unreachable!("expected ToolResult, got {other:?}"),
        }
    }

    #[test]
    fn decode_error_event() {
        let event = decode_payload(r#"{"type":"error","error":"model unavailable"}"#);
        assert_eq!(
            event,
            Some(StreamEvent::Error {
                error: "model unavailable".into()
            })
        );
    }

    #[test]
    fn decode_done_sentinel_is_none() {
        assert!(decode_payload("[DONE]").is_none());
    }

    #[test]
    fn decode_malformed_json_is_none() {
        assert!(decode_payload("{not json").is_none());
    }

    #[test]
    fn decode_unknown_type_is_none() {
        assert!(decode_payload(r#"{"type":"messages","messages":[]}"#).is_none());
    }

    // ── serde shape ───────────────────────────────────────────

    #[test]
    fn delta_round_trip() {
        let event = StreamEvent::Delta {
            content: "hello".into(),
        };
        let text = match serde_json::to_string(&event) {
            Ok(t) => t,
            Err(e) => unreachable!("serialize: {e}"),
        };
        assert!(text.contains(r#""type":"delta""#));
        assert_eq!(decode_payload(&text), Some(event));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("abcdef", 3), "abc");
        assert_eq!(truncate("ab", 3), "ab");
        assert_eq!(truncate("\u{e9}\u{e9}\u{e9}", 2), "\u{e9}\u{e9}");
    }
}
