//! Persistence scheduling: save coalescing for the canvas document and
//! debounced saves for the message list.

pub mod coalescer;
pub mod messages;

pub use coalescer::{SaveCoalescer, SnapshotSink};
pub use messages::{MessageSaver, MessageSink};
