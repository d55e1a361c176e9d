//! Debounced persistence for the chat message list.
//!
//! The message list changes in rapid small steps while a response streams;
//! persisting each step would hammer the storage endpoint. Changes re-arm a
//! longer debounce than the canvas one, and a structural-equality gate
//! suppresses the write entirely when the list matches what was last saved.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use crate::chat::message::Message;
use crate::error::Result;

/// Receives message lists for persistence.
#[async_trait]
pub trait MessageSink: Send + Sync {
    /// Persist one message list.
    async fn persist(&self, messages: Vec<Message>) -> Result<()>;
}

/// Handle to the debounced message-list save task.
pub struct MessageSaver {
    tx: mpsc::UnboundedSender<Vec<Message>>,
    cancel: CancellationToken,
    task: std::sync::Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl MessageSaver {
    /// Spawn the save task, flushing through `sink` after `debounce` of
    /// quiet.
    pub fn spawn(sink: Arc<dyn MessageSink>, debounce: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run(sink, rx, debounce, cancel.clone()));
        Self {
            tx,
            cancel,
            task: std::sync::Mutex::new(Some(task)),
        }
    }

    /// Report the current message list; re-arms the debounce.
    pub fn notify(&self, messages: Vec<Message>) {
        let _ = self.tx.send(messages);
    }

    /// Stop the task, flushing any pending unsaved list first.
    ///
    /// Safe to call through a shared handle; later calls are no-ops.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        let task = self.task.lock().ok().and_then(|mut t| t.take());
        if let Some(task) = task {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "message save task ended abnormally");
            }
        }
    }
}

impl Drop for MessageSaver {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run(
    sink: Arc<dyn MessageSink>,
    mut rx: mpsc::UnboundedReceiver<Vec<Message>>,
    debounce: Duration,
    cancel: CancellationToken,
) {
    let mut pending: Option<Vec<Message>> = None;
    let mut deadline: Option<Instant> = None;
    let mut last_saved: Option<Vec<Message>> = None;

    loop {
        let debounce_timer = async {
            match deadline {
                Some(d) => tokio::time::sleep_until(d).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            update = rx.recv() => {
                match update {
                    Some(messages) => {
                        pending = Some(messages);
                        deadline = Some(Instant::now() + debounce);
                    }
                    None => break,
                }
            }
            _ = debounce_timer => {
                deadline = None;
                flush(&sink, &mut pending, &mut last_saved).await;
            }
            _ = cancel.cancelled() => {
                flush(&sink, &mut pending, &mut last_saved).await;
                break;
            }
        }
    }
}

async fn flush(
    sink: &Arc<dyn MessageSink>,
    pending: &mut Option<Vec<Message>>,
    last_saved: &mut Option<Vec<Message>>,
) {
    let messages = match pending.take() {
        Some(messages) => messages,
        None => return,
    };
    if last_saved.as_ref() == Some(&messages) {
        tracing::debug!("message list unchanged, skipping save");
        return;
    }
    match sink.persist(messages.clone()).await {
        Ok(()) => *last_saved = Some(messages),
        Err(e) => {
            // Re-queue so the next notify retries the same content.
            tracing::warn!(error = %e, "message save failed");
            *pending = Some(messages);
        }
    }
}
