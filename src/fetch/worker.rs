//! Single-item fetch with ledger short-circuit.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::backend::{FetchBackend, FetchRequest, MergeFormat};
use crate::ledger::CompletionLedger;
use crate::quality::QualityPolicy;
use crate::worklist::WorkItem;

/// Default parallel fragment transfers per item.
pub const DEFAULT_FRAGMENT_CONCURRENCY: u32 = 4;

/// Default retry budget for whole-item and fragment retries.
pub const DEFAULT_RETRIES: u32 = 10;

/// Title length budget (bytes) in output file names.
const TITLE_BYTES: usize = 200;

/// Final state of one work item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeStatus {
    /// The backend produced the file during this run.
    Fetched,
    /// The ledger already held the item's key; the backend was not called.
    AlreadySatisfied,
    /// The fetch failed; see the outcome detail.
    Failed,
}

/// Result of fetching one work item. Produced exactly once per dispatched item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    /// Index of the work item.
    pub index: usize,
    /// Reference of the work item.
    pub reference: String,
    /// Final state.
    pub status: OutcomeStatus,
    /// `ok`, `already satisfied`, or the failure cause.
    pub detail: String,
}

impl FetchOutcome {
    /// Successful fetch.
    #[must_use]
    pub fn fetched(item: &WorkItem) -> Self {
        Self::new(item, OutcomeStatus::Fetched, "ok")
    }

    /// Skipped because the ledger already records the item.
    #[must_use]
    pub fn already_satisfied(item: &WorkItem) -> Self {
        Self::new(item, OutcomeStatus::AlreadySatisfied, "already satisfied")
    }

    /// Failed fetch with a cause.
    #[must_use]
    pub fn failed(item: &WorkItem, detail: impl Into<String>) -> Self {
        Self::new(item, OutcomeStatus::Failed, detail)
    }

    fn new(item: &WorkItem, status: OutcomeStatus, detail: impl Into<String>) -> Self {
        Self {
            index: item.index,
            reference: item.reference.clone(),
            status,
            detail: detail.into(),
        }
    }

    /// True for fetched and already-satisfied items.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status != OutcomeStatus::Failed
    }
}

impl fmt::Display for FetchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            OutcomeStatus::Fetched => write!(f, "[{:03}] done", self.index),
            OutcomeStatus::AlreadySatisfied => write!(f, "[{:03}] already satisfied", self.index),
            OutcomeStatus::Failed => write!(f, "[{:03}] failed: {}", self.index, self.detail),
        }
    }
}

/// Per-run fetch parameters shared by every item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchSettings {
    /// Collection directory; every item lands here.
    pub output_dir: PathBuf,
    /// Format selector.
    pub policy: QualityPolicy,
    /// Parallel fragment transfers per item.
    pub fragment_concurrency: u32,
    /// Retry budget per item.
    pub retries: u32,
    /// Preferred merge container.
    pub merge_format: MergeFormat,
}

/// Builds the output template for item `index` inside `dir`.
///
/// `007 - %(title).200B.%(ext)s`: the zero-padded index keeps names unique
/// and ordered no matter which item finishes first.
#[must_use]
pub fn output_template(dir: &Path, index: usize) -> String {
    dir.join(format!("{index:03} - %(title).{TITLE_BYTES}B.%(ext)s"))
        .display()
        .to_string()
}

/// Executes single-item fetches against a backend.
///
/// Failures never escape as errors: every call returns a [`FetchOutcome`].
#[derive(Clone)]
pub struct FetchWorker {
    backend: Arc<dyn FetchBackend>,
    ledger: Arc<CompletionLedger>,
    settings: FetchSettings,
}

impl fmt::Debug for FetchWorker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchWorker")
            .field("backend", &self.backend.name())
            .field("ledger", &self.ledger.path())
            .field("settings", &self.settings)
            .finish()
    }
}

impl FetchWorker {
    /// Creates a worker. All items of a collection must share the same ledger.
    #[must_use]
    pub fn new(
        backend: Arc<dyn FetchBackend>,
        ledger: Arc<CompletionLedger>,
        settings: FetchSettings,
    ) -> Self {
        Self {
            backend,
            ledger,
            settings,
        }
    }

    /// Returns the shared settings.
    #[must_use]
    pub fn settings(&self) -> &FetchSettings {
        &self.settings
    }

    /// Fetches one item.
    #[instrument(skip(self, item), fields(index = item.index, reference = %item.reference))]
    pub async fn fetch(&self, item: &WorkItem) -> FetchOutcome {
        let key = item
            .completion_key
            .clone()
            .or_else(|| self.backend.completion_key(&item.reference));

        if let Some(key) = key.clone() {
            let ledger = Arc::clone(&self.ledger);
            let lookup = tokio::task::spawn_blocking(move || ledger.has(&key)).await;
            match lookup {
                Ok(Ok(true)) => {
                    debug!("ledger already records item; skipping backend");
                    return FetchOutcome::already_satisfied(item);
                }
                Ok(Ok(false)) => {}
                Ok(Err(e)) => warn!(error = %e, "ledger lookup failed; deferring to backend"),
                Err(e) => warn!(error = %e, "ledger lookup task failed; deferring to backend"),
            }
        }

        let request = FetchRequest {
            reference: item.reference.clone(),
            policy: self.settings.policy.clone(),
            output_template: output_template(&self.settings.output_dir, item.index),
            ledger_path: self.ledger.path().to_path_buf(),
            retries: self.settings.retries,
            fragment_concurrency: self.settings.fragment_concurrency,
            merge_format: self.settings.merge_format,
        };

        match self.backend.fetch(&request).await {
            Ok(()) => {
                if let Some(key) = key {
                    self.record_completion(key).await;
                }
                info!(backend = self.backend.name(), "fetch completed");
                FetchOutcome::fetched(item)
            }
            Err(e) => {
                warn!(backend = self.backend.name(), error = %e, "fetch failed");
                FetchOutcome::failed(item, e.to_string())
            }
        }
    }

    async fn record_completion(&self, key: String) {
        let ledger = Arc::clone(&self.ledger);
        let task_key = key.clone();
        match tokio::task::spawn_blocking(move || ledger.record(&task_key)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => warn!(key = %key, error = %e, "failed to record completion"),
            Err(e) => warn!(key = %key, error = %e, "completion record task failed"),
        }
    }
}
