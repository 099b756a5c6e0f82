//! Playlist Downloader Core Library
//!
//! This library provides the fetch-orchestration engine behind the
//! `playlist-dl` tool: it turns one URL (a single video or a whole
//! playlist) into an ordered worklist, fetches every item through an
//! external backend with bounded concurrency, skips items already recorded
//! in the completion ledger, and aggregates a per-item report.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`quality`] - Quality token to format-selector resolution
//! - [`ledger`] - Append-only completion ledger (`_archive.txt`)
//! - [`worklist`] - Item resolution and folder-name sanitization
//! - [`backend`] - Probe/fetch capability traits and the yt-dlp backend
//! - [`fetch`] - Per-item worker and bounded-concurrency engine

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod backend;
pub mod fetch;
pub mod ledger;
pub mod quality;
pub mod worklist;

// Re-export commonly used types
pub use backend::{
    BackendError, FetchBackend, FetchRequest, MergeFormat, MetadataProbe, ProbeResult,
    YtDlpBackend,
};
pub use fetch::{
    DEFAULT_FRAGMENT_CONCURRENCY, DEFAULT_RETRIES, EngineError, FailedItem, FetchEngine,
    FetchOutcome, FetchSettings, FetchWorker, OutcomeStatus, RunReport, default_worker_count,
};
pub use ledger::{CompletionLedger, LEDGER_FILE_NAME, LedgerError};
pub use quality::{QualityPolicy, QualityResolution, resolve_quality};
pub use worklist::{ItemResolver, ResolveError, ResolveMode, ResolvedWorklist, WorkItem};
