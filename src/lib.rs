//! Mural: chat-driven image generation client engine.
//!
//! This crate is the client-side core of a chat + canvas application: a
//! remote agent streams tool-call events over SSE while the user talks to
//! it, and generated images land on a shared visual canvas.
//!
//! # Architecture
//!
//! The engine is built from independent pieces connected at explicit seams:
//! - **Chat**: decodes the `data:`-framed event stream and folds typed
//!   events into an ordered message list via the reducer; the session
//!   controller drives a turn end to end.
//! - **Canvas**: the persisted document model (elements + files + opaque
//!   view state), grid packing for inserted images, and a capability trait
//!   over the external visual editor.
//! - **Persist**: the save coalescer (debounce / periodic / visibility
//!   flush) and the debounced message-list saver.
//! - **Project**: the storage document, registry with active-selection
//!   fallback, and legacy-format migration.
//! - **Storage**: HTTP clients for the backend endpoints and the injected
//!   key-value store for client-local state.

pub mod canvas;
pub mod chat;
pub mod config;
pub mod error;
pub mod persist;
pub mod project;
pub mod storage;
pub mod theme;

pub use chat::{ChatBackend, ChatSession, Message, StreamEvent};
pub use config::MuralConfig;
pub use error::{MuralError, Result};
pub use theme::Theme;
