//! Canvas save coalescing.
//!
//! Minimizes write amplification to backend storage while bounding data
//! loss in time. Three triggers, in order of precedence at any instant:
//!
//! 1. **Change debounce**: every canvas mutation re-arms a short timer;
//!    only the last mutation of a burst is persisted, carrying the
//!    cumulative state.
//! 2. **Periodic safety flush**: a recurring timer saves when at least the
//!    configured gap has passed since the last successful save, whether or
//!    not a debounce is pending.
//! 3. **Visibility-loss flush**: when the host reports the page hidden or
//!    unloading, a final gated flush runs and supersedes any pending
//!    debounce.
//!
//! Snapshots are captured from the [`CanvasHost`] at the moment of flush,
//! not at the moment the trigger fired, so a flush always reflects the most
//! recent state. A pending debounce is cancelled before any superseding
//! flush fires, so a stale smaller snapshot can never overwrite a newer one.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use crate::canvas::document::CanvasDocument;
use crate::canvas::host::CanvasHost;
use crate::config::SaveConfig;
use crate::error::Result;

/// Receives sanitized canvas snapshots for persistence.
#[async_trait]
pub trait SnapshotSink: Send + Sync {
    /// Persist one snapshot. Errors are logged by the coalescer; the save
    /// is retried by the next trigger.
    async fn persist(&self, snapshot: CanvasDocument) -> Result<()>;
}

/// Why a flush is being attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlushReason {
    Debounce,
    Periodic,
    Hidden,
    Forced,
    Shutdown,
}

impl FlushReason {
    /// Whether this flush only runs when the minimum save gap has elapsed.
    fn gated(self) -> bool {
        matches!(self, Self::Periodic | Self::Hidden | Self::Shutdown)
    }
}

#[derive(Debug)]
enum Signal {
    FlushNow,
    Hidden,
}

/// Handle to the coalescing save task for one canvas document.
///
/// The task subscribes to the host's change notification; ordinary canvas
/// mutations need no explicit call. Dropping the handle cancels the task
/// after a final gated flush.
pub struct SaveCoalescer {
    tx: mpsc::UnboundedSender<Signal>,
    cancel: CancellationToken,
    task: std::sync::Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl SaveCoalescer {
    /// Spawn the save task for `host`, persisting through `sink`.
    pub fn spawn(
        host: Arc<dyn CanvasHost>,
        sink: Arc<dyn SnapshotSink>,
        config: SaveConfig,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let worker = Worker {
            host,
            sink,
            config,
            rx,
            cancel: cancel.clone(),
        };
        let task = tokio::spawn(worker.run());
        Self {
            tx,
            cancel,
            task: std::sync::Mutex::new(Some(task)),
        }
    }

    /// Force an immediate flush, bypassing the save-gap guard.
    ///
    /// Used after significant low-frequency events such as image insertion.
    pub fn flush_now(&self) {
        let _ = self.tx.send(Signal::FlushNow);
    }

    /// Report that the page became hidden or is about to unload.
    pub fn page_hidden(&self) {
        let _ = self.tx.send(Signal::Hidden);
    }

    /// Stop the task, running one final gated flush first.
    ///
    /// Safe to call through a shared handle; later calls are no-ops.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        let task = self.task.lock().ok().and_then(|mut t| t.take());
        if let Some(task) = task {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "save task ended abnormally");
            }
        }
    }
}

impl Drop for SaveCoalescer {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

struct Worker {
    host: Arc<dyn CanvasHost>,
    sink: Arc<dyn SnapshotSink>,
    config: SaveConfig,
    rx: mpsc::UnboundedReceiver<Signal>,
    cancel: CancellationToken,
}

impl Worker {
    async fn run(mut self) {
        let mut changes = self.host.changes();
        let mut debounce_deadline: Option<Instant> = None;
        let mut last_save = Instant::now();
        let mut ticker = tokio::time::interval(self.config.safety_interval());
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        ticker.reset();

        loop {
            let debounce = async {
                match debounce_deadline {
                    Some(deadline) => tokio::time::sleep_until(deadline).await,
                    None => std::future::pending().await,
                }
            };

            tokio::select! {
                changed = changes.changed() => {
                    if changed.is_err() {
                        // Host dropped; nothing left to observe.
                        break;
                    }
                    debounce_deadline = Some(Instant::now() + self.config.canvas_debounce());
                }
                _ = debounce => {
                    debounce_deadline = None;
                    self.flush(FlushReason::Debounce, &mut last_save).await;
                }
                _ = ticker.tick() => {
                    if self.gap_elapsed(last_save) {
                        debounce_deadline = None;
                        self.flush(FlushReason::Periodic, &mut last_save).await;
                    }
                }
                signal = self.rx.recv() => {
                    match signal {
                        Some(Signal::FlushNow) => {
                            debounce_deadline = None;
                            self.flush(FlushReason::Forced, &mut last_save).await;
                        }
                        Some(Signal::Hidden) => {
                            if self.gap_elapsed(last_save) {
                                debounce_deadline = None;
                                self.flush(FlushReason::Hidden, &mut last_save).await;
                            }
                        }
                        None => break,
                    }
                }
                _ = self.cancel.cancelled() => {
                    if self.gap_elapsed(last_save) {
                        self.flush(FlushReason::Shutdown, &mut last_save).await;
                    }
                    break;
                }
            }
        }
    }

    fn gap_elapsed(&self, last_save: Instant) -> bool {
        last_save.elapsed() >= self.config.min_save_gap()
    }

    async fn flush(&self, reason: FlushReason, last_save: &mut Instant) {
        debug_assert!(!reason.gated() || last_save.elapsed() >= self.config.min_save_gap());
        let snapshot = self.host.snapshot();
        match self.sink.persist(snapshot).await {
            Ok(()) => {
                *last_save = Instant::now();
                tracing::debug!(?reason, "canvas saved");
            }
            Err(e) => {
                // Keep last_save so the next trigger retries promptly.
                tracing::warn!(?reason, error = %e, "canvas save failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::element::Element;
    use crate::canvas::host::MemoryCanvas;
    use std::sync::Mutex;

    /// Sink recording every snapshot it receives.
    #[derive(Default)]
    struct RecordingSink {
        saves: Mutex<Vec<CanvasDocument>>,
    }

    impl RecordingSink {
        fn count(&self) -> usize {
            self.saves.lock().map(|s| s.len()).unwrap_or(0)
        }

        fn last(&self) -> Option<CanvasDocument> {
            self.saves.lock().ok().and_then(|s| s.last().cloned())
        }
    }

    #[async_trait]
    impl SnapshotSink for RecordingSink {
        async fn persist(&self, snapshot: CanvasDocument) -> Result<()> {
            if let Ok(mut saves) = self.saves.lock() {
                saves.push(snapshot);
            }
            Ok(())
        }
    }

    fn image(id: &str) -> Element {
        Element::image(id, format!("f-{id}"), 0.0, 0.0, 10.0, 10.0)
    }

    async fn settle() {
        // Let the spawned worker observe pending notifications.
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn burst_of_changes_coalesces_to_one_save() {
        let canvas = Arc::new(MemoryCanvas::new());
        let sink = Arc::new(RecordingSink::default());
        let coalescer = SaveCoalescer::spawn(canvas.clone(), sink.clone(), SaveConfig::default());

        for i in 0..5 {
            let mut elements = canvas.elements();
            elements.push(image(&format!("e{i}")));
            canvas.update_scene(elements);
            settle().await;
            tokio::time::advance(Duration::from_millis(100)).await;
        }
        settle().await;
        tokio::time::advance(Duration::from_millis(600)).await;
        settle().await;

        assert_eq!(sink.count(), 1);
        let saved = match sink.last() {
            Some(s) => s,
            None => unreachable!("one save recorded"),
        };
        // The single write carries the cumulative state of the burst.
        assert_eq!(saved.elements.len(), 5);

        coalescer.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn quiet_canvas_saves_on_safety_interval() {
        let canvas = Arc::new(MemoryCanvas::new());
        let sink = Arc::new(RecordingSink::default());
        let coalescer = SaveCoalescer::spawn(canvas.clone(), sink.clone(), SaveConfig::default());

        settle().await;
        tokio::time::advance(Duration::from_secs(31)).await;
        settle().await;
        assert_eq!(sink.count(), 1);

        coalescer.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn debounce_saves_reset_the_safety_gap() {
        let config = SaveConfig::default();
        let canvas = Arc::new(MemoryCanvas::new());
        let sink = Arc::new(RecordingSink::default());
        let coalescer = SaveCoalescer::spawn(canvas.clone(), sink.clone(), config);

        // A change at t=20s saves via debounce at ~t=20.5s.
        settle().await;
        tokio::time::advance(Duration::from_secs(20)).await;
        canvas.update_scene(vec![image("e1")]);
        settle().await;
        tokio::time::advance(Duration::from_millis(600)).await;
        settle().await;
        assert_eq!(sink.count(), 1);

        // The t=30s periodic tick finds the gap too fresh and skips.
        tokio::time::advance(Duration::from_secs(10)).await;
        settle().await;
        assert_eq!(sink.count(), 1);

        coalescer.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn flush_now_bypasses_gap_and_cancels_debounce() {
        let canvas = Arc::new(MemoryCanvas::new());
        let sink = Arc::new(RecordingSink::default());
        let coalescer = SaveCoalescer::spawn(canvas.clone(), sink.clone(), SaveConfig::default());

        canvas.update_scene(vec![image("e1")]);
        settle().await;
        coalescer.flush_now();
        settle().await;
        assert_eq!(sink.count(), 1);

        // The pending debounce was cancelled: nothing further fires.
        tokio::time::advance(Duration::from_secs(1)).await;
        settle().await;
        assert_eq!(sink.count(), 1);

        coalescer.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn page_hidden_flushes_only_after_gap() {
        let canvas = Arc::new(MemoryCanvas::new());
        let sink = Arc::new(RecordingSink::default());
        let coalescer = SaveCoalescer::spawn(canvas.clone(), sink.clone(), SaveConfig::default());

        settle().await;
        coalescer.page_hidden();
        settle().await;
        assert_eq!(sink.count(), 0, "fresh gap suppresses the hidden flush");

        tokio::time::advance(Duration::from_secs(31)).await;
        settle().await;
        // The safety tick at 30s already saved; hide right after is gated.
        let after_tick = sink.count();
        coalescer.page_hidden();
        settle().await;
        assert_eq!(sink.count(), after_tick);

        coalescer.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn snapshot_captured_at_flush_time() {
        let canvas = Arc::new(MemoryCanvas::new());
        let sink = Arc::new(RecordingSink::default());
        let coalescer = SaveCoalescer::spawn(canvas.clone(), sink.clone(), SaveConfig::default());

        canvas.update_scene(vec![image("e1")]);
        settle().await;
        tokio::time::advance(Duration::from_millis(400)).await;
        // Mutate again inside the debounce window; the flush must carry it.
        canvas.update_scene(vec![image("e1"), image("e2")]);
        settle().await;
        tokio::time::advance(Duration::from_millis(600)).await;
        settle().await;

        let saved = match sink.last() {
            Some(s) => s,
            None => unreachable!("save recorded"),
        };
        assert_eq!(saved.elements.len(), 2);

        coalescer.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_runs_final_gated_flush() {
        let canvas = Arc::new(MemoryCanvas::new());
        let sink = Arc::new(RecordingSink::default());
        let coalescer = SaveCoalescer::spawn(canvas.clone(), sink.clone(), SaveConfig::default());

        settle().await;
        tokio::time::advance(Duration::from_secs(29)).await;
        coalescer.shutdown().await;
        // Gap not yet elapsed at shutdown: no write.
        assert_eq!(sink.count(), 0);
    }
}
