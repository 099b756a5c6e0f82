//! Capability interfaces for the external media backend.
//!
//! The orchestration core never touches media bytes itself. It talks to two
//! narrow capabilities:
//!
//! - [`MetadataProbe`] - shallow metadata lookup used to build the worklist
//! - [`FetchBackend`] - "given an item reference and a format policy, produce a file or fail"
//!
//! [`YtDlpBackend`] implements both by invoking the `yt-dlp` binary.

mod error;
pub mod tools;
mod ytdlp;

pub use error::BackendError;
pub use tools::{ffmpeg_available, locate_ytdlp};
pub use ytdlp::{
    YtDlpBackend, archive_key, build_fetch_args, parse_probe_output, youtube_archive_key,
};

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use async_trait::async_trait;

use crate::quality::QualityPolicy;

/// Preferred container for merged video+audio output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergeFormat {
    /// MP4, falling back to MKV when the selected streams cannot be muxed into MP4.
    #[default]
    Mp4,
    /// MKV only.
    Mkv,
}

impl MergeFormat {
    /// Selector passed to the backend's merge option (`/` separates fallbacks).
    #[must_use]
    pub fn selector(self) -> &'static str {
        match self {
            Self::Mp4 => "mp4/mkv",
            Self::Mkv => "mkv",
        }
    }

    /// Stable label for display and configuration.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Mkv => "mkv",
        }
    }
}

impl fmt::Display for MergeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MergeFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "mp4" => Ok(Self::Mp4),
            "mkv" => Ok(Self::Mkv),
            other => Err(format!("unsupported merge format '{other}' (expected mp4 or mkv)")),
        }
    }
}

/// A single fetchable unit reported by the probe.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProbedItem {
    /// Display title, if the backend reported one.
    pub title: Option<String>,
    /// Canonical page URL for the item.
    pub webpage_url: Option<String>,
    /// Distinct video heights on offer, highest first.
    pub available_heights: Vec<u32>,
    /// Ledger key the backend will record for this item, when known.
    pub completion_key: Option<String>,
}

/// One entry of a collection listing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProbedEntry {
    /// Direct reference for the entry.
    pub url: Option<String>,
    /// Backend identifier, used to rebuild a reference when `url` is absent.
    pub id: Option<String>,
    /// Entry title, if listed.
    pub title: Option<String>,
    /// Ledger key the backend will record for this entry, when known.
    pub completion_key: Option<String>,
}

/// An enumerable group of entries (playlist, channel, mix).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProbedCollection {
    /// Collection title.
    pub title: Option<String>,
    /// Entries in listing order.
    pub entries: Vec<ProbedEntry>,
}

/// Outcome of a shallow probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeResult {
    /// The reference points at one fetchable unit.
    Single(ProbedItem),
    /// The reference points at a collection.
    Collection(ProbedCollection),
}

/// Shallow metadata lookup that never transfers media.
#[async_trait]
pub trait MetadataProbe: Send + Sync {
    /// Probes `reference` and reports whether it is a single item or a collection.
    async fn probe(&self, reference: &str) -> Result<ProbeResult, BackendError>;
}

/// Everything the backend needs to fetch one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Item locator.
    pub reference: String,
    /// Format selector, passed verbatim.
    pub policy: QualityPolicy,
    /// Output path template (backend placeholders allowed).
    pub output_template: String,
    /// Completion ledger shared by every item in the collection.
    pub ledger_path: PathBuf,
    /// Retry budget for both whole-item and fragment retries.
    pub retries: u32,
    /// Parallel fragment transfers within this item.
    pub fragment_concurrency: u32,
    /// Preferred merge container.
    pub merge_format: MergeFormat,
}

/// Fetches one item to disk.
#[async_trait]
pub trait FetchBackend: Send + Sync {
    /// Name of the backend (for logging).
    fn name(&self) -> &'static str;

    /// Ledger key for `reference`, when it can be computed without network access.
    ///
    /// Consulted only when the probe did not report a key for the item.
    /// Returning `None` leaves skip detection entirely to the backend.
    fn completion_key(&self, reference: &str) -> Option<String>;

    /// Produces the file described by `request` or fails with a cause.
    async fn fetch(&self, request: &FetchRequest) -> Result<(), BackendError>;
}
