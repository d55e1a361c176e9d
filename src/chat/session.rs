//! Chat session controller.
//!
//! Orchestrates one project's conversation: composes the outgoing request,
//! drives the event stream through the reducer, and runs the reducer's side
//! effects (canvas image insertion followed by a forced save). Transport
//! failures never escape as errors; they are folded into the last assistant
//! message so the conversation stays visible and recoverable.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use futures_util::StreamExt;

use crate::canvas::host::CanvasHost;
use crate::canvas::insert::{insert_image, ImageFetcher};
use crate::config::LayoutConfig;
use crate::error::{MuralError, Result};
use crate::persist::coalescer::SaveCoalescer;
use crate::persist::messages::MessageSaver;
use crate::storage::kv::{take_pending_prompt, KvStore};

use super::client::{ChatBackend, ChatRequest};
use super::event::StreamEvent;
use super::message::Message;
use super::reducer::{apply_event, SideEffect};

/// Controller for one active project's conversation.
///
/// Methods take `&self`: the session is meant to be shared with UI glue
/// behind an `Arc`. One chat turn may be in flight at a time; a second
/// `send_message` while busy is rejected, not queued.
pub struct ChatSession {
    project_id: String,
    backend: ChatBackend,
    canvas: Arc<dyn CanvasHost>,
    fetcher: Arc<dyn ImageFetcher>,
    layout: LayoutConfig,
    messages: Mutex<Vec<Message>>,
    busy: AtomicBool,
    saver: Option<MessageSaver>,
    coalescer: Option<Arc<SaveCoalescer>>,
}

impl ChatSession {
    /// Create a session for a project.
    pub fn new(
        project_id: impl Into<String>,
        backend: ChatBackend,
        canvas: Arc<dyn CanvasHost>,
        fetcher: Arc<dyn ImageFetcher>,
        layout: LayoutConfig,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            backend,
            canvas,
            fetcher,
            layout,
            messages: Mutex::new(Vec::new()),
            busy: AtomicBool::new(false),
            saver: None,
            coalescer: None,
        }
    }

    /// Attach the debounced message-list saver.
    pub fn with_saver(mut self, saver: MessageSaver) -> Self {
        self.saver = Some(saver);
        self
    }

    /// Attach the canvas save coalescer, used for forced saves after image
    /// insertion.
    pub fn with_coalescer(mut self, coalescer: Arc<SaveCoalescer>) -> Self {
        self.coalescer = Some(coalescer);
        self
    }

    /// The project this session belongs to.
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Snapshot of the conversation.
    pub fn messages(&self) -> Vec<Message> {
        self.messages.lock().map(|m| m.clone()).unwrap_or_default()
    }

    /// Replace the conversation (project load / switch).
    pub fn set_messages(&self, messages: Vec<Message>) {
        if let Ok(mut current) = self.messages.lock() {
            *current = messages;
        }
    }

    /// Whether a chat turn is currently in flight.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Send a user message and fold the streamed response into the
    /// conversation.
    ///
    /// Returns `Busy` when a turn is already in flight. Empty input is a
    /// no-op. All other failures degrade to an error line in the
    /// conversation and still return `Ok`.
    pub async fn send_message(&self, text: &str, image_urls: Vec<String>) -> Result<()> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(());
        }
        if self.busy.swap(true, Ordering::SeqCst) {
            return Err(MuralError::Busy("a chat turn is already in flight".into()));
        }
        self.run_turn(text, image_urls).await;
        self.busy.store(false, Ordering::SeqCst);
        Ok(())
    }

    /// Consume a staged first prompt for this project, if any, and send it.
    ///
    /// The staging entry is cleared before sending, so the prompt fires at
    /// most once even if the turn itself fails.
    pub async fn send_pending_prompt(&self, kv: &dyn KvStore) -> Result<bool> {
        let pending = match take_pending_prompt(kv, &self.project_id).await? {
            Some(pending) => pending,
            None => return Ok(false),
        };
        self.send_message(&pending.prompt, pending.image_urls).await?;
        Ok(true)
    }

    async fn run_turn(&self, text: &str, image_urls: Vec<String>) {
        let history = self.messages();
        let request = ChatRequest::new(text)
            .with_history(&history)
            .with_session_id(self.project_id.clone());

        self.push_message(Message::user_with_images(text, image_urls));

        let mut stream = match self.backend.send(&request).await {
            Ok(stream) => stream,
            Err(e) => {
                tracing::warn!(error = %e, "chat request failed");
                self.apply(&StreamEvent::Error {
                    error: e.message().to_string(),
                });
                return;
            }
        };

        while let Some(event) = stream.next().await {
            if let Some(effect) = self.apply(&event) {
                self.run_effect(effect).await;
            }
        }
        tracing::debug!(project = %self.project_id, "chat turn complete");
    }

    /// Apply one event inside a short lock, then notify the saver.
    fn apply(&self, event: &StreamEvent) -> Option<SideEffect> {
        let (effect, snapshot) = match self.messages.lock() {
            Ok(mut messages) => (apply_event(&mut messages, event), messages.clone()),
            Err(_) => return None,
        };
        self.notify_saver(snapshot);
        effect
    }

    fn push_message(&self, message: Message) {
        let snapshot = match self.messages.lock() {
            Ok(mut messages) => {
                messages.push(message);
                messages.clone()
            }
            Err(_) => return,
        };
        self.notify_saver(snapshot);
    }

    fn notify_saver(&self, messages: Vec<Message>) {
        if let Some(saver) = &self.saver {
            saver.notify(messages);
        }
    }

    async fn run_effect(&self, effect: SideEffect) {
        match effect {
            SideEffect::InsertImage { url } => {
                insert_image(self.canvas.as_ref(), self.fetcher.as_ref(), &url, &self.layout)
                    .await;
                // Image insertion is significant and rare: save immediately.
                if let Some(coalescer) = &self.coalescer {
                    coalescer.flush_now();
                }
            }
        }
    }
}

impl std::fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSession")
            .field("project_id", &self.project_id)
            .field("busy", &self.is_busy())
            .finish()
    }
}
