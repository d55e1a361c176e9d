//! Error types for the mural crate.
//!
//! Each error variant carries a stable error code (SCREAMING_SNAKE_CASE)
//! that is included in the Display output and accessible via [`MuralError::code()`].
//! Codes are part of the public API contract and will not change.

/// Stable error codes for programmatic error handling.
///
/// These codes never change and form part of the public API contract.
/// Use these for distinguishing errors rather than parsing Display output.
pub mod error_codes {
    /// Invalid or missing configuration.
    pub const CONFIG_INVALID: &str = "CONFIG_INVALID";

    /// An HTTP request failed to send or returned a non-success status.
    pub const REQUEST_FAILED: &str = "REQUEST_FAILED";

    /// The event stream failed mid-read.
    pub const STREAM_FAILED: &str = "STREAM_FAILED";

    /// Project storage (list/upsert/delete) failed.
    pub const STORAGE_FAILED: &str = "STORAGE_FAILED";

    /// Image fetch, decode, or upload failed.
    pub const IMAGE_FAILED: &str = "IMAGE_FAILED";

    /// A chat turn was requested while one is already in flight.
    pub const SESSION_BUSY: &str = "SESSION_BUSY";

    /// Session state error not covered by other variants.
    pub const SESSION_ERROR: &str = "SESSION_ERROR";

    /// Local key-value state read or write failed.
    pub const KV_FAILED: &str = "KV_FAILED";
}

/// Errors produced by the mural crate.
///
/// Each variant includes a stable error code accessible via [`MuralError::code()`].
/// The Display impl formats as `[CODE] message`.
#[derive(Debug, thiserror::Error)]
pub enum MuralError {
    /// Invalid or missing configuration.
    #[error("[{}] {}", error_codes::CONFIG_INVALID, .0)]
    ConfigError(String),

    /// An HTTP request failed to send or returned a non-success status.
    #[error("[{}] {}", error_codes::REQUEST_FAILED, .0)]
    RequestError(String),

    /// The event stream failed mid-read.
    #[error("[{}] {}", error_codes::STREAM_FAILED, .0)]
    StreamError(String),

    /// Project storage (list/upsert/delete) failed.
    #[error("[{}] {}", error_codes::STORAGE_FAILED, .0)]
    StorageError(String),

    /// Image fetch, decode, or upload failed.
    #[error("[{}] {}", error_codes::IMAGE_FAILED, .0)]
    ImageError(String),

    /// A chat turn was requested while one is already in flight.
    #[error("[{}] {}", error_codes::SESSION_BUSY, .0)]
    Busy(String),

    /// Session state error not covered by other variants.
    #[error("[{}] {}", error_codes::SESSION_ERROR, .0)]
    SessionError(String),

    /// Local key-value state read or write failed.
    #[error("[{}] {}", error_codes::KV_FAILED, .0)]
    KvError(String),
}

impl MuralError {
    /// Returns the stable error code for this error.
    ///
    /// Codes are SCREAMING_SNAKE_CASE strings that remain stable across releases.
    /// Use these for programmatic error handling rather than parsing Display output.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError(_) => error_codes::CONFIG_INVALID,
            Self::RequestError(_) => error_codes::REQUEST_FAILED,
            Self::StreamError(_) => error_codes::STREAM_FAILED,
            Self::StorageError(_) => error_codes::STORAGE_FAILED,
            Self::ImageError(_) => error_codes::IMAGE_FAILED,
            Self::Busy(_) => error_codes::SESSION_BUSY,
            Self::SessionError(_) => error_codes::SESSION_ERROR,
            Self::KvError(_) => error_codes::KV_FAILED,
        }
    }

    /// Returns the inner message without the code prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::ConfigError(m)
            | Self::RequestError(m)
            | Self::StreamError(m)
            | Self::StorageError(m)
            | Self::ImageError(m)
            | Self::Busy(m)
            | Self::SessionError(m)
            | Self::KvError(m) => m,
        }
    }

    /// Returns true if this error represents a transient failure that can be retried.
    ///
    /// Retryable: request and stream failures (network hiccups, 5xx) and
    /// storage writes. Non-retryable: configuration, image decode, busy
    /// rejections, session and KV state errors.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RequestError(_) | Self::StreamError(_) | Self::StorageError(_) => true,
            Self::ConfigError(_)
            | Self::ImageError(_)
            | Self::Busy(_)
            | Self::SessionError(_)
            | Self::KvError(_) => false,
        }
    }
}

/// Convenience alias for mural results.
pub type Result<T> = std::result::Result<T, MuralError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_code() {
        let err = MuralError::ConfigError("missing base_url".into());
        assert_eq!(err.code(), "CONFIG_INVALID");
    }

    #[test]
    fn request_error_code() {
        let err = MuralError::RequestError("connection refused".into());
        assert_eq!(err.code(), "REQUEST_FAILED");
    }

    #[test]
    fn stream_error_code() {
        let err = MuralError::StreamError("unexpected EOF".into());
        assert_eq!(err.code(), "STREAM_FAILED");
    }

    #[test]
    fn storage_error_code() {
        let err = MuralError::StorageError("upsert returned 500".into());
        assert_eq!(err.code(), "STORAGE_FAILED");
    }

    #[test]
    fn image_error_code() {
        let err = MuralError::ImageError("not an image".into());
        assert_eq!(err.code(), "IMAGE_FAILED");
    }

    #[test]
    fn busy_error_code() {
        let err = MuralError::Busy("turn already in flight".into());
        assert_eq!(err.code(), "SESSION_BUSY");
    }

    #[test]
    fn kv_error_code() {
        let err = MuralError::KvError("state file unwritable".into());
        assert_eq!(err.code(), "KV_FAILED");
    }

    #[test]
    fn display_includes_code_prefix() {
        let err = MuralError::ConfigError("missing base_url".into());
        let display = format!("{err}");
        assert!(display.starts_with("[CONFIG_INVALID]"));
        assert!(display.contains("missing base_url"));
    }

    #[test]
    fn message_returns_inner_text() {
        let err = MuralError::RequestError("bad gateway".into());
        assert_eq!(err.message(), "bad gateway");
    }

    #[test]
    fn all_codes_are_screaming_snake_case() {
        let errors: Vec<MuralError> = vec![
            MuralError::ConfigError("x".into()),
            MuralError::RequestError("x".into()),
            MuralError::StreamError("x".into()),
            MuralError::StorageError("x".into()),
            MuralError::ImageError("x".into()),
            MuralError::Busy("x".into()),
            MuralError::SessionError("x".into()),
            MuralError::KvError("x".into()),
        ];
        for err in &errors {
            let code = err.code();
            assert!(
                code.chars().all(|c| c.is_ascii_uppercase() || c == '_'),
                "code {code:?} is not SCREAMING_SNAKE_CASE"
            );
        }
    }

    #[test]
    fn is_retryable_request_and_stream() {
        assert!(MuralError::RequestError("x".into()).is_retryable());
        assert!(MuralError::StreamError("x".into()).is_retryable());
        assert!(MuralError::StorageError("x".into()).is_retryable());
    }

    #[test]
    fn is_not_retryable_config_busy_image() {
        assert!(!MuralError::ConfigError("x".into()).is_retryable());
        assert!(!MuralError::Busy("x".into()).is_retryable());
        assert!(!MuralError::ImageError("x".into()).is_retryable());
        assert!(!MuralError::SessionError("x".into()).is_retryable());
        assert!(!MuralError::KvError("x".into()).is_retryable());
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MuralError>();
    }
}
