//! Bounded-concurrency scan driver.
//!
//! One work item per (input, analyzer) pair. A semaphore caps the number of
//! analyzer invocations in flight; results are streamed in the order they
//! finish, not the order they were scheduled.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};
use std::time::Instant;

use futures::{FutureExt, Stream, StreamExt};
use tokio::sync::{mpsc, OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, info, info_span, warn, Instrument};

use super::{ResultAggregator, ScanError};
use crate::cancel::{Cancelled, CancellationToken};
use crate::domain::{AnalysisResult, Analyzer, OrchestrationResult, ScanInput};
use crate::progress::{ProgressBus, ProgressContext, ProgressInfo};

type StreamItem = Result<AnalysisResult, ScanError>;

/// Run-level progress, reported after every completed work item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchProgress {
    /// Work items finished so far.
    pub completed: usize,
    /// Work items in the run.
    pub total: usize,
    /// Label of the item that just finished.
    pub current_item: String,
}

impl From<&BatchProgress> for ProgressInfo {
    fn from(batch: &BatchProgress) -> Self {
        Self::new(
            batch.completed as u64,
            format!("{}/{} {}", batch.completed, batch.total, batch.current_item),
        )
    }
}

/// Schedules analyzers over inputs.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    bus: Arc<ProgressBus>,
}

impl Orchestrator {
    /// Creates an orchestrator reporting into `bus`.
    #[must_use]
    pub const fn new(bus: Arc<ProgressBus>) -> Self {
        Self { bus }
    }

    /// Progress bus used by runs.
    #[must_use]
    pub fn bus(&self) -> &Arc<ProgressBus> {
        &self.bus
    }

    /// Starts a run over every (input, analyzer) pair.
    ///
    /// The returned stream yields each result as soon as its analyzer
    /// finishes. A failing or panicking analyzer produces a failed result and
    /// the run goes on. When `cancel` fires, no further work is started,
    /// results of work already running are still delivered, and the stream
    /// ends with a single `Err(ScanError::Cancelled)`. Work that returns an
    /// error once the run is cancelled counts as aborted and yields no result.
    ///
    /// The orchestrator's bus must be started, otherwise progress commands
    /// pile up in its queue until the bus is dropped.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::InvalidConcurrency`] if `concurrency_limit` is 0.
    pub fn run(
        &self,
        inputs: Vec<ScanInput>,
        analyzers: Vec<Arc<dyn Analyzer>>,
        concurrency_limit: usize,
        cancel: &CancellationToken,
    ) -> Result<ScanStream, ScanError> {
        if concurrency_limit == 0 {
            return Err(ScanError::InvalidConcurrency(concurrency_limit));
        }

        let total = inputs.len() * analyzers.len();
        let token = cancel.child_token();
        let aggregator = Arc::new(Mutex::new(ResultAggregator::new()));
        let (tx, rx) = mpsc::unbounded_channel();

        let shared = Arc::new(RunShared {
            aggregator: Arc::clone(&aggregator),
            results: tx,
            progress: self
                .bus
                .create_context(format!("scan ({total} items)"), total as u64),
            total,
        });

        info!(
            "Starting scan: {} input(s) x {} analyzer(s), concurrency {}",
            inputs.len(),
            analyzers.len(),
            concurrency_limit
        );

        let plan = RunPlan {
            inputs: inputs.into_iter().map(Arc::new).collect(),
            analyzers,
            concurrency_limit,
        };
        let span = info_span!("scan", items = total);
        tokio::spawn(drive(plan, shared, Arc::clone(&self.bus), token.clone()).instrument(span));

        Ok(ScanStream {
            rx,
            aggregator,
            token,
        })
    }
}

/// Results of a run, in completion order.
///
/// Dropping the stream cancels the run. The caller's token is not affected.
#[derive(Debug)]
pub struct ScanStream {
    rx: mpsc::UnboundedReceiver<StreamItem>,
    aggregator: Arc<Mutex<ResultAggregator>>,
    token: CancellationToken,
}

impl ScanStream {
    /// Cancels this run only.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Aggregate of everything recorded so far.
    ///
    /// May be ahead of what the stream has yielded yet.
    #[must_use]
    pub fn summary(&self) -> OrchestrationResult {
        self.aggregator
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .snapshot()
    }

    /// Drives the stream to its end and returns the aggregate.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Interrupted`] carrying the partial aggregate if the
    /// run was cancelled.
    pub async fn collect_result(mut self) -> Result<OrchestrationResult, ScanError> {
        let mut cancelled = false;
        while let Some(item) = self.next().await {
            if let Err(ScanError::Cancelled) = item {
                cancelled = true;
            }
        }
        let result = std::mem::take(
            &mut *self
                .aggregator
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        )
        .into_result();

        if cancelled {
            Err(ScanError::Interrupted {
                partial: Box::new(result),
            })
        } else {
            Ok(result)
        }
    }
}

impl Stream for ScanStream {
    type Item = StreamItem;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().rx.poll_recv(cx)
    }
}

impl Drop for ScanStream {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

struct RunPlan {
    inputs: Vec<Arc<ScanInput>>,
    analyzers: Vec<Arc<dyn Analyzer>>,
    concurrency_limit: usize,
}

/// State every worker of a run writes to. The stream ends once the last
/// clone is dropped.
struct RunShared {
    aggregator: Arc<Mutex<ResultAggregator>>,
    results: mpsc::UnboundedSender<StreamItem>,
    progress: ProgressContext,
    total: usize,
}

impl RunShared {
    /// Aggregation, batch progress and delivery happen under one lock so the
    /// stream, the aggregate and the reported counts agree on ordering.
    fn record(&self, result: AnalysisResult) {
        let mut aggregator = self
            .aggregator
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        aggregator.add(result.clone());

        let batch = BatchProgress {
            completed: aggregator.total(),
            total: self.total,
            current_item: format!("{} on {}", result.analyzer(), result.input_key()),
        };
        self.progress.report(&batch);

        if self.results.send(Ok(result)).is_err() {
            debug!("scan stream dropped; result kept in aggregate only");
        }
    }
}

async fn drive(
    plan: RunPlan,
    shared: Arc<RunShared>,
    bus: Arc<ProgressBus>,
    token: CancellationToken,
) {
    let started = Instant::now();
    let semaphore = Arc::new(Semaphore::new(plan.concurrency_limit));
    let mut workers = JoinSet::new();
    let mut scheduled = 0usize;

    'schedule: for input in &plan.inputs {
        for analyzer in &plan.analyzers {
            let permit = tokio::select! {
                biased;
                () = token.cancelled() => break 'schedule,
                permit = Arc::clone(&semaphore).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break 'schedule,
                },
            };
            if token.is_cancelled() {
                break 'schedule;
            }

            workers.spawn(run_item(
                Arc::clone(input),
                Arc::clone(analyzer),
                token.clone(),
                Arc::clone(&shared),
                Arc::clone(&bus),
                permit,
            ));
            scheduled += 1;

            while let Some(joined) = workers.try_join_next() {
                log_join(joined);
            }
        }
    }

    while let Some(joined) = workers.join_next().await {
        log_join(joined);
    }

    let skipped = shared.total - scheduled;
    if token.is_cancelled() {
        warn!(
            "Scan cancelled after {:.1}s: {} item(s) never started",
            started.elapsed().as_secs_f64(),
            skipped
        );
        if shared.results.send(Err(ScanError::Cancelled)).is_err() {
            debug!("scan stream dropped before cancellation was reported");
        }
    } else {
        let summary = shared
            .aggregator
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .snapshot();
        info!(
            "Scan finished in {:.1}s: {} result(s), {} failed, {} with findings",
            started.elapsed().as_secs_f64(),
            summary.total(),
            summary.failed(),
            summary.with_findings()
        );
    }
    shared.progress.complete();
}

async fn run_item(
    input: Arc<ScanInput>,
    analyzer: Arc<dyn Analyzer>,
    token: CancellationToken,
    shared: Arc<RunShared>,
    bus: Arc<ProgressBus>,
    permit: OwnedSemaphorePermit,
) {
    let label = format!("{} on {}", analyzer.name(), input.key());
    let progress = bus.create_context(label.clone(), 1);
    progress.update(0, "running");

    let started = Instant::now();
    let outcome = AssertUnwindSafe(analyzer.analyze(&input, &token))
        .catch_unwind()
        .await;
    let elapsed = started.elapsed();
    drop(permit);

    let result = match outcome {
        Ok(Ok(outcome)) => {
            debug!("{label}: ok, findings={}", outcome.has_findings);
            AnalysisResult::succeeded(
                input.key(),
                analyzer.name(),
                outcome.has_findings,
                outcome.fragment,
                elapsed,
            )
        }
        Ok(Err(e)) if e.is::<Cancelled>() || token.is_cancelled() => {
            // Aborted, not failed: the stream reports cancellation once.
            debug!("{label}: aborted: {e:#}");
            progress.update(0, "cancelled");
            progress.complete();
            return;
        }
        Ok(Err(e)) => {
            debug!("{label}: failed: {e:#}");
            AnalysisResult::failed(input.key(), analyzer.name(), format!("{e:#}"), elapsed)
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            warn!("{label}: {message}");
            AnalysisResult::failed(input.key(), analyzer.name(), message, elapsed)
        }
    };

    progress.update(1, if result.success() { "done" } else { "failed" });
    progress.complete();
    shared.record(result);
}

fn log_join(joined: Result<(), tokio::task::JoinError>) {
    if let Err(e) = joined {
        warn!("scan worker ended abnormally: {e}");
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .map_or_else(
            || "analyzer panicked".to_string(),
            |m| format!("analyzer panicked: {m}"),
        )
}
