//! Multi-producer, single-consumer progress bus.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use super::command::{CommandSender, Envelope, ProgressCommand, TaskId};
use super::context::ProgressContext;
use super::task::{ProgressFrame, TaskRegistry};
use crate::cancel::CancellationToken;
use crate::ports::{ProgressEvent, ProgressSink};

/// Commands applied back to back before the loop checks for a render tick.
const MAX_BURST: usize = 1024;

/// Tuning knobs for the consumer loop.
#[derive(Debug, Clone)]
pub struct BusConfig {
    /// Minimum time between two rendered frames.
    pub render_interval: Duration,
    /// How many completed tasks are kept for display.
    pub keep_completed: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            render_interval: Duration::from_millis(100),
            keep_completed: 16,
        }
    }
}

/// Errors from bus lifecycle calls.
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    /// `start` was called on a bus whose loop is already running or finished.
    #[error("progress bus already started")]
    AlreadyStarted,
    /// The consumer loop is gone; the request could not be answered.
    #[error("progress bus is not running")]
    NotRunning,
}

/// Command bus between progress producers and a single rendering sink.
///
/// Producers call [`create_context`](Self::create_context) and report through
/// the returned [`ProgressContext`]; that only enqueues commands. One consumer
/// loop, started with [`start`](Self::start), applies them to the task
/// registry and renders frames into the sink. The registry is never shared,
/// so it needs no lock.
pub struct ProgressBus {
    sender: CommandSender,
    receiver: Mutex<Option<mpsc::UnboundedReceiver<Envelope>>>,
    next_id: AtomicU64,
    active: Arc<AtomicUsize>,
    sink: Arc<dyn ProgressSink>,
    config: BusConfig,
    stop: CancellationToken,
    consumer: Mutex<Option<JoinHandle<()>>>,
}

impl ProgressBus {
    /// Creates a bus rendering into `sink`. Nothing runs until `start`.
    #[must_use]
    pub fn new(sink: Arc<dyn ProgressSink>, config: BusConfig) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            sender: CommandSender::new(tx),
            receiver: Mutex::new(Some(rx)),
            next_id: AtomicU64::new(1),
            active: Arc::new(AtomicUsize::new(0)),
            sink,
            config,
            stop: CancellationToken::new(),
            consumer: Mutex::new(None),
        }
    }

    /// Spawns the consumer loop on the current tokio runtime.
    ///
    /// The loop runs until `cancel` fires, [`shutdown`](Self::shutdown) is
    /// called, or the bus is dropped. Commands enqueued before `start` are
    /// applied as soon as the loop runs.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::AlreadyStarted`] on a second call.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn start(&self, cancel: &CancellationToken) -> Result<(), BusError> {
        let rx = self
            .receiver
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(BusError::AlreadyStarted)?;

        let consumer = Consumer {
            registry: TaskRegistry::new(self.config.keep_completed),
            sink: Arc::clone(&self.sink),
            active: Arc::clone(&self.active),
        };
        let handle = tokio::spawn(consumer.run(
            rx,
            self.config.render_interval,
            self.stop.clone(),
            cancel.clone(),
        ));
        *self.consumer.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
        debug!("progress bus started");
        Ok(())
    }

    /// Registers a new task and returns the handle used to report on it.
    ///
    /// Commands sent before [`start`](Self::start) are buffered and applied
    /// once the loop runs. Nothing drains a bus that is never started, so its
    /// queue keeps every command until the bus is dropped.
    pub fn create_context(&self, description: impl Into<String>, total: u64) -> ProgressContext {
        let id = TaskId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.sender.send(ProgressCommand::CreateTask {
            id,
            description: description.into(),
            total,
        });
        ProgressContext::new(id, self.sender.clone())
    }

    /// Number of tasks not yet completed, as last applied by the consumer.
    ///
    /// Commands still sitting in the queue are not reflected; call
    /// [`drain`](Self::drain) first for an exact figure.
    #[must_use]
    pub fn active_task_count(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }

    /// Waits until every command enqueued before this call has been applied.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::NotRunning`] if the consumer loop was never
    /// started or has stopped.
    pub async fn drain(&self) -> Result<(), BusError> {
        let (tx, rx) = oneshot::channel();
        if !self.is_started() || !self.sender.request(Envelope::Drain(tx)) {
            return Err(BusError::NotRunning);
        }
        rx.await.map_err(|_| BusError::NotRunning)
    }

    /// Returns the registry state after every earlier command was applied.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::NotRunning`] if the consumer loop was never
    /// started or has stopped.
    pub async fn snapshot(&self) -> Result<ProgressFrame, BusError> {
        let (tx, rx) = oneshot::channel();
        if !self.is_started() || !self.sender.request(Envelope::Snapshot(tx)) {
            return Err(BusError::NotRunning);
        }
        rx.await.map_err(|_| BusError::NotRunning)
    }

    fn is_started(&self) -> bool {
        self.receiver
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    /// Stops the consumer loop after applying everything already queued and
    /// rendering a final frame. Waits for the loop to exit.
    pub async fn shutdown(&self) {
        self.stop.cancel();
        let handle = self
            .consumer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!("progress bus consumer ended abnormally: {e}");
            }
        }
    }
}

impl Drop for ProgressBus {
    fn drop(&mut self) {
        self.stop.cancel();
    }
}

impl std::fmt::Debug for ProgressBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressBus")
            .field("active", &self.active_task_count())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// State owned by the consumer loop.
struct Consumer {
    registry: TaskRegistry,
    sink: Arc<dyn ProgressSink>,
    active: Arc<AtomicUsize>,
}

impl Consumer {
    async fn run(
        mut self,
        mut rx: mpsc::UnboundedReceiver<Envelope>,
        render_interval: Duration,
        stop: CancellationToken,
        cancel: CancellationToken,
    ) {
        let mut ticker = tokio::time::interval(render_interval.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut dirty = false;

        loop {
            tokio::select! {
                biased;
                () = stop.cancelled() => break,
                () = cancel.cancelled() => break,
                // Polled before `recv`; a due frame renders even while commands keep arriving.
                _ = ticker.tick(), if dirty => {
                    self.render(ProgressEvent::Frame(self.registry.frame()));
                    dirty = false;
                }
                envelope = rx.recv() => {
                    let Some(envelope) = envelope else { break };
                    dirty |= self.handle(envelope);
                    for _ in 1..MAX_BURST {
                        let Ok(envelope) = rx.try_recv() else { break };
                        dirty |= self.handle(envelope);
                    }
                }
            }
        }

        rx.close();
        while let Ok(envelope) = rx.try_recv() {
            self.handle(envelope);
        }
        self.render(ProgressEvent::Frame(self.registry.frame()));
        self.render(ProgressEvent::Closed);
        debug!("progress bus stopped");
    }

    fn handle(&mut self, envelope: Envelope) -> bool {
        match envelope {
            Envelope::Command(command) => {
                let changed = self.registry.apply(command);
                self.active
                    .store(self.registry.active_len(), Ordering::Release);
                changed
            }
            Envelope::Drain(reply) => {
                let _ = reply.send(());
                false
            }
            Envelope::Snapshot(reply) => {
                let _ = reply.send(self.registry.frame());
                false
            }
        }
    }

    fn render(&self, event: ProgressEvent) {
        let sink = &self.sink;
        if catch_unwind(AssertUnwindSafe(|| sink.on_event(event))).is_err() {
            warn!("progress sink panicked while rendering; frame dropped");
        }
    }
}
