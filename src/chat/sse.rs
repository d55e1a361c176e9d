//! Incremental decoder for `data:`-framed event streams.
//!
//! The chat endpoint responds with newline-delimited `data: <payload>`
//! records (standard SSE text framing). [`DataLineDecoder`] converts a byte
//! stream into complete payload strings: it decodes UTF-8 chunks, splits on
//! newlines, buffers a trailing partial line across chunks, tolerates CRLF,
//! and ignores everything that is not a `data:` line.
//!
//! # Examples
//!
//! ```
//! use mural::chat::sse::DataLineDecoder;
//!
//! let mut decoder = DataLineDecoder::new();
//! assert!(decoder.push(b"data: {\"type\":\"del").is_empty());
//! let payloads = decoder.push(b"ta\",\"content\":\"hi\"}\n");
//! assert_eq!(payloads.len(), 1);
//! ```

/// Sentinel payload marking the logical end of a stream.
pub const DONE_SENTINEL: &str = "[DONE]";

/// Incrementally split a byte stream into `data:` payload strings.
///
/// Feed chunks via [`DataLineDecoder::push`] and collect emitted payloads;
/// call [`DataLineDecoder::finish`] when the stream ends to flush a trailing
/// unterminated line.
#[derive(Debug, Default)]
pub struct DataLineDecoder {
    line_buffer: String,
}

impl DataLineDecoder {
    /// Create a new decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a chunk of bytes, returning the payloads of any complete
    /// `data:` lines it closed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let text = String::from_utf8_lossy(chunk);
        let mut payloads = Vec::new();

        for ch in text.chars() {
            if ch == '\n' {
                let line = std::mem::take(&mut self.line_buffer);
                if let Some(payload) = data_payload(&line) {
                    payloads.push(payload.to_string());
                }
            } else {
                self.line_buffer.push(ch);
            }
        }

        payloads
    }

    /// Flush the trailing buffered line, if it is a `data:` line.
    ///
    /// Call this when the underlying stream ends; a final record without a
    /// terminating newline is still delivered.
    pub fn finish(&mut self) -> Option<String> {
        if self.line_buffer.is_empty() {
            return None;
        }
        let line = std::mem::take(&mut self.line_buffer);
        data_payload(&line).map(String::from)
    }

    /// Whether a partial line is currently buffered.
    pub fn has_partial(&self) -> bool {
        !self.line_buffer.is_empty()
    }
}

/// Extract the payload of a `data:` line, or `None` for any other line.
///
/// A single leading space after the colon is stripped per SSE convention,
/// as is a trailing `\r` from CRLF framing.
fn data_payload(line: &str) -> Option<&str> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    let value = line.strip_prefix("data:")?;
    Some(value.strip_prefix(' ').unwrap_or(value))
}

/// Whether a payload is the `[DONE]` end-of-stream marker.
pub fn is_done(payload: &str) -> bool {
    payload.trim() == DONE_SENTINEL
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── data_payload ──────────────────────────────────────────

    #[test]
    fn payload_basic() {
        assert_eq!(data_payload("data: hello"), Some("hello"));
    }

    #[test]
    fn payload_no_space_after_colon() {
        assert_eq!(data_payload("data:hello"), Some("hello"));
    }

    #[test]
    fn payload_preserves_inner_colons() {
        assert_eq!(
            data_payload("data: {\"url\":\"http://x\"}"),
            Some("{\"url\":\"http://x\"}")
        );
    }

    #[test]
    fn payload_strips_carriage_return() {
        assert_eq!(data_payload("data: hello\r"), Some("hello"));
    }

    #[test]
    fn payload_ignores_other_fields() {
        assert!(data_payload("event: message").is_none());
        assert!(data_payload(": comment").is_none());
        assert!(data_payload("").is_none());
    }

    // ── is_done ───────────────────────────────────────────────

    #[test]
    fn done_sentinel_detected() {
        assert!(is_done("[DONE]"));
        assert!(is_done(" [DONE] "));
        assert!(!is_done("{\"type\":\"delta\"}"));
    }

    // ── DataLineDecoder ───────────────────────────────────────

    #[test]
    fn single_chunk_single_line() {
        let mut decoder = DataLineDecoder::new();
        let payloads = decoder.push(b"data: one\n");
        assert_eq!(payloads, vec!["one"]);
    }

    #[test]
    fn partial_line_buffered_across_chunks() {
        let mut decoder = DataLineDecoder::new();
        assert!(decoder.push(b"data: hel").is_empty());
        assert!(decoder.has_partial());
        let payloads = decoder.push(b"lo\n");
        assert_eq!(payloads, vec!["hello"]);
        assert!(!decoder.has_partial());
    }

    #[test]
    fn multiple_lines_in_one_chunk() {
        let mut decoder = DataLineDecoder::new();
        let payloads = decoder.push(b"data: a\ndata: b\n\ndata: c\n");
        assert_eq!(payloads, vec!["a", "b", "c"]);
    }

    #[test]
    fn crlf_framing() {
        let mut decoder = DataLineDecoder::new();
        let payloads = decoder.push(b"data: a\r\ndata: b\r\n");
        assert_eq!(payloads, vec!["a", "b"]);
    }

    #[test]
    fn non_data_lines_skipped() {
        let mut decoder = DataLineDecoder::new();
        let payloads = decoder.push(b"event: x\ndata: keep\nretry: 500\n");
        assert_eq!(payloads, vec!["keep"]);
    }

    #[test]
    fn finish_flushes_unterminated_line() {
        let mut decoder = DataLineDecoder::new();
        assert!(decoder.push(b"data: tail").is_empty());
        assert_eq!(decoder.finish(), Some("tail".to_string()));
        assert_eq!(decoder.finish(), None);
    }

    #[test]
    fn finish_on_empty_buffer() {
        let mut decoder = DataLineDecoder::new();
        assert_eq!(decoder.finish(), None);
    }

    #[test]
    fn finish_drops_non_data_tail() {
        let mut decoder = DataLineDecoder::new();
        assert!(decoder.push(b": half a comment").is_empty());
        assert_eq!(decoder.finish(), None);
    }

    #[test]
    fn done_sentinel_passes_through_as_payload() {
        let mut decoder = DataLineDecoder::new();
        let payloads = decoder.push(b"data: [DONE]\n");
        assert_eq!(payloads, vec!["[DONE]"]);
        assert!(is_done(&payloads[0]));
    }

    #[test]
    fn split_multibyte_boundary_is_lossy_not_fatal() {
        // A chunk boundary inside a UTF-8 sequence degrades that character
        // but never panics or desynchronizes the line framing.
        let mut decoder = DataLineDecoder::new();
        let text = "data: caf\u{e9}\n".as_bytes();
        let (a, b) = text.split_at(text.len() - 2);
        let mut payloads = decoder.push(a);
        payloads.extend(decoder.push(b));
        assert_eq!(payloads.len(), 1);
        assert!(payloads[0].starts_with("caf"));
    }
}
