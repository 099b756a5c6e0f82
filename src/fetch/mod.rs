//! Fetch execution: the per-item worker and the bounded engine that drives it.
//!
//! - [`FetchWorker`] - fetches one [`WorkItem`](crate::worklist::WorkItem), returning an outcome value
//! - [`FetchEngine`] - fixed-size pool dispatching the worker over a worklist
//! - [`RunReport`] - aggregate of all outcomes

mod engine;
mod report;
mod worker;

pub use engine::{
    DEFAULT_SHUTDOWN_GRACE, EngineError, FetchEngine, MAX_WORKERS, MIN_WORKERS, RunState,
    default_worker_count,
};
pub use report::{FailedItem, RunReport};
pub use worker::{
    DEFAULT_FRAGMENT_CONCURRENCY, DEFAULT_RETRIES, FetchOutcome, FetchSettings, FetchWorker,
    OutcomeStatus, output_template,
};
