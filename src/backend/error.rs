//! Error types for backend invocations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors reported by a probe or fetch backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The backend executable could not be located.
    #[error("{tool} not found on PATH")]
    ToolNotFound {
        /// Name or path of the missing tool.
        tool: String,
    },

    /// The backend process could not be started.
    #[error("failed to start {program}: {source}")]
    Spawn {
        /// Program that failed to start.
        program: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The backend ran and reported a failure.
    #[error("{reason}")]
    Failed {
        /// Human-readable cause, usually the backend's last error line.
        reason: String,
    },

    /// The backend produced output that could not be understood.
    #[error("unreadable backend output: {reason}")]
    InvalidOutput {
        /// What was wrong with the output.
        reason: String,
    },
}

impl BackendError {
    /// Creates a failure with the given cause.
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }

    /// Creates an invalid-output error.
    pub fn invalid_output(reason: impl Into<String>) -> Self {
        Self::InvalidOutput {
            reason: reason.into(),
        }
    }
}
