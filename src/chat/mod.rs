//! Chat: wire decoding, the event-stream reducer, and the session
//! controller.

pub mod client;
pub mod event;
pub mod message;
pub mod reducer;
pub mod session;
pub mod sse;

pub use client::{ChatBackend, ChatRequest, EventStream};
pub use event::StreamEvent;
pub use message::{Message, Role, ToolCall, ToolCallStatus};
pub use reducer::{apply_event, SideEffect};
pub use session::ChatSession;
