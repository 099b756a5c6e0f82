//! Error types for worklist resolution.

use thiserror::Error;

use crate::backend::BackendError;

/// Fatal errors raised before any fetch is dispatched.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// No reference was supplied.
    #[error("no URL provided")]
    MissingReference,

    /// The metadata probe failed; nothing was resolved.
    #[error("could not read metadata for {reference}: {source}")]
    Probe {
        /// The reference that was probed.
        reference: String,
        /// The backend failure.
        #[source]
        source: BackendError,
    },

    /// The collection had no entry with a resolvable reference.
    #[error("no entries found in collection {reference}")]
    EmptyCollection {
        /// The reference that was probed.
        reference: String,
    },
}
