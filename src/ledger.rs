//! Completion ledger: the append-only record of finished items.
//!
//! One ledger lives in each collection directory as `_archive.txt`, one key
//! per line. The format matches yt-dlp's `--download-archive` file so the
//! backend and the worker share a single file: the backend appends keys
//! itself, and the worker appends any key still missing after a successful
//! fetch. Keys are never removed.
//!
//! Reads take a shared advisory lock and appends an exclusive one, so
//! concurrent workers never observe or produce torn lines.

use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use thiserror::Error;
use tracing::debug;

/// File name of the ledger inside a collection directory.
pub const LEDGER_FILE_NAME: &str = "_archive.txt";

/// Errors raised while reading or appending to the ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Reading, locking, or writing the ledger file failed.
    #[error("ledger IO error at {path}: {source}")]
    Io {
        /// Ledger path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },
}

/// Handle to a collection's completion ledger.
///
/// Cheap to share behind an `Arc`; every operation re-reads the file, so
/// keys appended by the backend process are visible immediately.
#[derive(Debug, Clone)]
pub struct CompletionLedger {
    path: PathBuf,
}

impl CompletionLedger {
    /// Ledger for the collection directory `dir`. The file is created on first append.
    #[must_use]
    pub fn open(dir: &Path) -> Self {
        Self::at(dir.join(LEDGER_FILE_NAME))
    }

    /// Ledger backed by an explicit file path.
    #[must_use]
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true if `key` has been recorded.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Io`] if the file exists but cannot be read.
    pub fn has(&self, key: &str) -> Result<bool, LedgerError> {
        let key = key.trim();
        Ok(self.read_contents()?.lines().any(|line| line.trim() == key))
    }

    /// Returns every recorded key.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Io`] if the file exists but cannot be read.
    pub fn keys(&self) -> Result<HashSet<String>, LedgerError> {
        Ok(self
            .read_contents()?
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Appends `key` unless it is already present.
    ///
    /// Returns `true` if a line was written.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Io`] if the file cannot be opened, locked, or written.
    pub fn record(&self, key: &str) -> Result<bool, LedgerError> {
        let key = key.trim();
        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&self.path)
            .map_err(|e| self.io_error(e))?;
        file.lock_exclusive().map_err(|e| self.io_error(e))?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| self.io_error(e))?;
        if contents.lines().any(|line| line.trim() == key) {
            return Ok(false);
        }

        let mut line = String::with_capacity(key.len() + 2);
        if !contents.is_empty() && !contents.ends_with('\n') {
            line.push('\n');
        }
        line.push_str(key);
        line.push('\n');
        file.write_all(line.as_bytes())
            .map_err(|e| self.io_error(e))?;
        file.flush().map_err(|e| self.io_error(e))?;

        debug!(key, path = %self.path.display(), "recorded completion");
        // Lock is released when `file` is dropped.
        Ok(true)
    }

    fn read_contents(&self) -> Result<String, LedgerError> {
        let mut file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(String::new()),
            Err(e) => return Err(self.io_error(e)),
        };
        file.lock_shared().map_err(|e| self.io_error(e))?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| self.io_error(e))?;
        Ok(contents)
    }

    fn io_error(&self, source: io::Error) -> LedgerError {
        LedgerError::Io {
            path: self.path.clone(),
            source,
        }
    }
}
