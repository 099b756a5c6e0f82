//! Bounded-concurrency fetch engine.
//!
//! The engine fans a worklist out over a fixed number of worker slots and
//! fans the outcomes back in as they complete.
//!
//! # Concurrency Model
//!
//! - Each item runs in its own Tokio task inside a [`JoinSet`]
//! - A semaphore permit is acquired, in worklist order, before spawning
//! - Permits are released when the task finishes (RAII), so at most
//!   `worker_count` backend calls run at any instant
//! - Outcomes are drained while the dispatcher waits for a free slot
//!
//! # Interrupts
//!
//! When the shared interrupt flag is set, no further items are dispatched.
//! In-flight items get a grace period to finish; anything still running
//! after that is aborted and reported as failed with detail `interrupted`.
//!
//! # Example
//!
//! ```no_run
//! use std::path::PathBuf;
//! use std::sync::Arc;
//! use std::sync::atomic::AtomicBool;
//! use playlist_dl_core::backend::{MergeFormat, YtDlpBackend};
//! use playlist_dl_core::fetch::{FetchEngine, FetchSettings, FetchWorker};
//! use playlist_dl_core::ledger::CompletionLedger;
//! use playlist_dl_core::quality::QualityPolicy;
//! use playlist_dl_core::worklist::WorkItem;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let dir = PathBuf::from("./downloads/Mix");
//! let worker = FetchWorker::new(
//!     Arc::new(YtDlpBackend::new("yt-dlp")),
//!     Arc::new(CompletionLedger::open(&dir)),
//!     FetchSettings {
//!         output_dir: dir,
//!         policy: QualityPolicy::capped(1080),
//!         fragment_concurrency: 4,
//!         retries: 10,
//!         merge_format: MergeFormat::Mp4,
//!     },
//! );
//! let engine = FetchEngine::new(4)?;
//! let worklist = vec![WorkItem::new(1, "https://youtu.be/dQw4w9WgXcQ")];
//! let report = engine
//!     .run(worklist, Arc::new(worker), Arc::new(AtomicBool::new(false)), |o| println!("{o}"))
//!     .await?;
//! println!("ok: {}, failed: {}", report.success_count(), report.failure_count());
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::{Id, JoinError, JoinSet};
use tracing::{debug, info, instrument, warn};

use super::report::RunReport;
use super::worker::{FetchOutcome, FetchWorker};
use crate::worklist::WorkItem;

/// Minimum allowed worker count.
pub const MIN_WORKERS: usize = 1;

/// Maximum allowed worker count.
pub const MAX_WORKERS: usize = 64;

/// Lower bound for the default worker count.
const DEFAULT_WORKERS_FLOOR: usize = 4;

/// How long in-flight items may run after an interrupt before being aborted.
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Interval at which the interrupt flag is polled while waiting.
const INTERRUPT_POLL: Duration = Duration::from_millis(50);

/// Default worker count: `max(4, available parallelism)`, capped at [`MAX_WORKERS`].
#[must_use]
pub fn default_worker_count() -> usize {
    std::thread::available_parallelism()
        .map_or(DEFAULT_WORKERS_FLOOR, std::num::NonZeroUsize::get)
        .max(DEFAULT_WORKERS_FLOOR)
        .min(MAX_WORKERS)
}

/// Error type for fetch engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Invalid worker count provided.
    #[error("invalid worker count {value}: must be between {MIN_WORKERS} and {MAX_WORKERS}")]
    InvalidWorkerCount {
        /// The invalid value that was provided.
        value: usize,
    },

    /// Semaphore was closed unexpectedly.
    #[error("semaphore closed unexpectedly")]
    SemaphoreClosed,
}

/// Lifecycle of a single [`FetchEngine::run`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Nothing submitted yet.
    Idle,
    /// Submitting items to worker slots.
    Dispatching,
    /// All submissions done; waiting for in-flight items.
    Draining,
    /// Every submitted item has an outcome.
    Done,
}

/// Fixed-size worker pool for fetch invocations.
#[derive(Debug)]
pub struct FetchEngine {
    semaphore: Arc<Semaphore>,
    worker_count: usize,
    shutdown_grace: Duration,
}

impl FetchEngine {
    /// Creates an engine with `worker_count` slots.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidWorkerCount`] if the value is outside
    /// the valid range (1-64).
    #[instrument(level = "debug")]
    pub fn new(worker_count: usize) -> Result<Self, EngineError> {
        if !(MIN_WORKERS..=MAX_WORKERS).contains(&worker_count) {
            return Err(EngineError::InvalidWorkerCount {
                value: worker_count,
            });
        }

        Ok(Self {
            semaphore: Arc::new(Semaphore::new(worker_count)),
            worker_count,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
        })
    }

    /// Overrides the post-interrupt grace period.
    #[must_use]
    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    /// Returns the configured worker count.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Runs every item of `worklist` through `worker`.
    ///
    /// `on_outcome` is called once per outcome, in completion order.
    ///
    /// Individual fetch failures never cause this method to error; they are
    /// counted in the returned [`RunReport`], whose failures are sorted by index.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::SemaphoreClosed`] if the semaphore is closed.
    #[instrument(skip_all, fields(items = worklist.len(), workers = self.worker_count))]
    pub async fn run<F>(
        &self,
        worklist: Vec<WorkItem>,
        worker: Arc<FetchWorker>,
        interrupted: Arc<AtomicBool>,
        mut on_outcome: F,
    ) -> Result<RunReport, EngineError>
    where
        F: FnMut(&FetchOutcome),
    {
        let mut report = RunReport::new(worklist.len());
        let mut in_flight: JoinSet<FetchOutcome> = JoinSet::new();
        let mut dispatched: HashMap<Id, WorkItem> = HashMap::new();
        let mut state = RunState::Idle;
        debug!(?state, "engine ready");

        state = RunState::Dispatching;
        debug!(?state, "dispatching work items");

        let mut pending = worklist.into_iter();
        while let Some(item) = pending.next() {
            if interrupted.load(Ordering::SeqCst) {
                report.mark_interrupted(1 + pending.len());
                break;
            }

            // Race the permit against the interrupt flag, settling finished
            // items while every slot is busy.
            let permit = loop {
                tokio::select! {
                    biased;
                    () = wait_for_interrupt(&interrupted) => break None,
                    Some(joined) = in_flight.join_next_with_id() => {
                        if let Some(outcome) = settle(joined, &mut dispatched) {
                            on_outcome(&outcome);
                            report.record(&outcome);
                        }
                    }
                    result = Arc::clone(&self.semaphore).acquire_owned() => {
                        break Some(result.map_err(|_| EngineError::SemaphoreClosed)?);
                    }
                }
            };
            let Some(permit) = permit else {
                report.mark_interrupted(1 + pending.len());
                break;
            };

            debug!(index = item.index, reference = %item.reference, "dispatching item");
            let task_worker = Arc::clone(&worker);
            let task_item = item.clone();
            let handle = in_flight.spawn(async move {
                // Permit is dropped when this block exits (RAII)
                let _permit = permit;
                task_worker.fetch(&task_item).await
            });
            dispatched.insert(handle.id(), item);
        }

        state = RunState::Draining;
        debug!(?state, in_flight = in_flight.len(), "waiting for in-flight items");

        let mut deadline: Option<tokio::time::Instant> = None;
        let mut aborted = false;
        loop {
            if deadline.is_none() && interrupted.load(Ordering::SeqCst) {
                if !report.was_interrupted() {
                    report.mark_interrupted(0);
                }
                deadline = Some(tokio::time::Instant::now() + self.shutdown_grace);
                info!(
                    in_flight = in_flight.len(),
                    grace_ms = self.shutdown_grace.as_millis(),
                    "interrupted; waiting for in-flight items"
                );
            }

            let joined = if aborted {
                in_flight.join_next_with_id().await
            } else if let Some(deadline) = deadline {
                if let Ok(joined) =
                    tokio::time::timeout_at(deadline, in_flight.join_next_with_id()).await
                {
                    joined
                } else {
                    warn!(
                        in_flight = in_flight.len(),
                        "grace period elapsed; aborting in-flight items"
                    );
                    in_flight.abort_all();
                    aborted = true;
                    continue;
                }
            } else {
                tokio::select! {
                    biased;
                    joined = in_flight.join_next_with_id() => joined,
                    () = wait_for_interrupt(&interrupted) => continue,
                }
            };

            let Some(joined) = joined else {
                break;
            };
            if let Some(outcome) = settle(joined, &mut dispatched) {
                on_outcome(&outcome);
                report.record(&outcome);
            }
        }

        state = RunState::Done;
        let report = report.finalize();
        info!(
            ?state,
            succeeded = report.success_count(),
            already_satisfied = report.already_satisfied_count(),
            failed = report.failure_count(),
            not_dispatched = report.not_dispatched(),
            "run complete"
        );
        Ok(report)
    }
}

/// Resolves once the interrupt flag is set.
async fn wait_for_interrupt(interrupted: &AtomicBool) {
    while !interrupted.load(Ordering::SeqCst) {
        tokio::time::sleep(INTERRUPT_POLL).await;
    }
}

/// Maps a joined task back to its outcome, converting panics and aborts into failures.
fn settle(
    joined: Result<(Id, FetchOutcome), JoinError>,
    dispatched: &mut HashMap<Id, WorkItem>,
) -> Option<FetchOutcome> {
    match joined {
        Ok((id, outcome)) => {
            dispatched.remove(&id);
            Some(outcome)
        }
        Err(error) => {
            let Some(item) = dispatched.remove(&error.id()) else {
                warn!(error = %error, "joined unknown fetch task");
                return None;
            };
            let detail = if error.is_cancelled() {
                "interrupted"
            } else {
                warn!(index = item.index, error = %error, "fetch task panicked");
                "worker task panicked"
            };
            Some(FetchOutcome::failed(&item, detail))
        }
    }
}
