//! Item resolution: turning one input reference into an ordered worklist.
//!
//! The resolver probes the reference once (no media transfer) and decides
//! whether it names a single item or a collection. Collections expand into
//! one [`WorkItem`] per entry with a usable reference, numbered `1..=N` in
//! listing order. Any probe failure aborts resolution; a partial worklist is
//! never returned.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use playlist_dl_core::backend::YtDlpBackend;
//! use playlist_dl_core::worklist::ItemResolver;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let resolver = ItemResolver::new(Arc::new(YtDlpBackend::new("yt-dlp")));
//! let resolved = resolver
//!     .resolve("https://www.youtube.com/playlist?list=PL123")
//!     .await?;
//! println!("{}: {} items", resolved.collection_name, resolved.items.len());
//! # Ok(())
//! # }
//! ```

mod error;
mod sanitize;

pub use error::ResolveError;
pub use sanitize::sanitize_name;

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::backend::{MetadataProbe, ProbeResult, ProbedCollection, ProbedEntry, ProbedItem};

/// Folder name used when a collection has no usable title.
pub const COLLECTION_FALLBACK_NAME: &str = "playlist";

/// Folder name used when a single item has no usable title.
pub const SINGLE_FALLBACK_NAME: &str = "single_video";

/// One unit of fetch work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    /// 1-based position in the worklist; stable identity for naming and reporting.
    pub index: usize,
    /// Item locator.
    pub reference: String,
    /// Ledger key reported by the probe. Takes precedence over one derived
    /// from the reference.
    pub completion_key: Option<String>,
}

impl WorkItem {
    /// Creates a work item.
    pub fn new(index: usize, reference: impl Into<String>) -> Self {
        Self {
            index,
            reference: reference.into(),
            completion_key: None,
        }
    }

    /// Sets the probe-reported ledger key.
    #[must_use]
    pub fn with_completion_key(mut self, key: Option<String>) -> Self {
        self.completion_key = key;
        self
    }
}

/// Whether the input named one item or a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveMode {
    /// A single fetchable unit.
    Single,
    /// A playlist, channel, or similar listing.
    Collection,
}

/// Result of resolving an input reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedWorklist {
    /// Sanitized name used for the output folder.
    pub collection_name: String,
    /// Single item or collection.
    pub mode: ResolveMode,
    /// Items in resolution order, indices `1..=items.len()`.
    pub items: Vec<WorkItem>,
    /// Collection entries dropped for lacking any reference.
    pub unresolvable: usize,
    /// Heights the single item is offered in, highest first. Empty for collections.
    pub available_heights: Vec<u32>,
}

/// Resolves input references through a [`MetadataProbe`].
#[derive(Clone)]
pub struct ItemResolver {
    probe: Arc<dyn MetadataProbe>,
}

impl std::fmt::Debug for ItemResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ItemResolver").finish_non_exhaustive()
    }
}

impl ItemResolver {
    /// Creates a resolver backed by `probe`.
    #[must_use]
    pub fn new(probe: Arc<dyn MetadataProbe>) -> Self {
        Self { probe }
    }

    /// Probes `reference` and builds the worklist.
    ///
    /// # Errors
    ///
    /// - [`ResolveError::MissingReference`] for blank input
    /// - [`ResolveError::Probe`] when the probe fails
    /// - [`ResolveError::EmptyCollection`] when no collection entry is resolvable
    #[instrument(skip(self))]
    pub async fn resolve(&self, reference: &str) -> Result<ResolvedWorklist, ResolveError> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(ResolveError::MissingReference);
        }

        let probed = self
            .probe
            .probe(reference)
            .await
            .map_err(|source| ResolveError::Probe {
                reference: reference.to_string(),
                source,
            })?;

        match probed {
            ProbeResult::Single(item) => Ok(resolve_single(reference, item)),
            ProbeResult::Collection(collection) => resolve_collection(reference, collection),
        }
    }
}

fn resolve_single(reference: &str, item: ProbedItem) -> ResolvedWorklist {
    let collection_name = sanitize_name(
        item.title.as_deref().unwrap_or_default(),
        SINGLE_FALLBACK_NAME,
    );
    let item_reference = item.webpage_url.unwrap_or_else(|| reference.to_string());
    debug!(name = %collection_name, reference = %item_reference, "resolved single item");

    ResolvedWorklist {
        collection_name,
        mode: ResolveMode::Single,
        items: vec![WorkItem::new(1, item_reference).with_completion_key(item.completion_key)],
        unresolvable: 0,
        available_heights: item.available_heights,
    }
}

fn resolve_collection(
    reference: &str,
    collection: ProbedCollection,
) -> Result<ResolvedWorklist, ResolveError> {
    let collection_name = sanitize_name(
        collection.title.as_deref().unwrap_or_default(),
        COLLECTION_FALLBACK_NAME,
    );
    let listed = collection.entries.len();

    let items: Vec<WorkItem> = collection
        .entries
        .iter()
        .filter_map(|entry| {
            entry_reference(entry).map(|entry_ref| (entry_ref, entry.completion_key.clone()))
        })
        .enumerate()
        .map(|(offset, (entry_ref, key))| {
            WorkItem::new(offset + 1, entry_ref).with_completion_key(key)
        })
        .collect();

    let unresolvable = listed - items.len();
    if unresolvable > 0 {
        warn!(
            unresolvable,
            listed, "skipping collection entries without a resolvable reference"
        );
    }

    if items.is_empty() {
        return Err(ResolveError::EmptyCollection {
            reference: reference.to_string(),
        });
    }

    info!(name = %collection_name, items = items.len(), "resolved collection");
    Ok(ResolvedWorklist {
        collection_name,
        mode: ResolveMode::Collection,
        items,
        unresolvable,
        available_heights: Vec::new(),
    })
}

/// Direct entry URL, else a canonical watch URL rebuilt from the entry id.
fn entry_reference(entry: &ProbedEntry) -> Option<String> {
    if let Some(url) = entry.url.as_deref().filter(|u| !u.trim().is_empty()) {
        return Some(url.to_string());
    }
    entry
        .id
        .as_deref()
        .filter(|id| !id.trim().is_empty())
        .map(|id| format!("https://www.youtube.com/watch?v={id}"))
}
