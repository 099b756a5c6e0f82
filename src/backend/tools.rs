//! External tool discovery.

use std::path::{Path, PathBuf};

use tracing::debug;

use super::BackendError;

/// Default yt-dlp executable name.
pub const YTDLP_BINARY: &str = "yt-dlp";

/// Locates the yt-dlp executable.
///
/// An explicit path is used as-is when it exists, otherwise it is looked up
/// on `PATH` (so `--ytdlp-path yt-dlp-nightly` works). Without an explicit
/// path, `yt-dlp` is looked up on `PATH`.
///
/// # Errors
///
/// Returns [`BackendError::ToolNotFound`] if no executable can be found.
pub fn locate_ytdlp(explicit: Option<&Path>) -> Result<PathBuf, BackendError> {
    let candidate = explicit.unwrap_or_else(|| Path::new(YTDLP_BINARY));
    if explicit.is_some() && candidate.is_file() {
        debug!(path = %candidate.display(), "using explicit yt-dlp path");
        return Ok(candidate.to_path_buf());
    }
    which::which(candidate).map_err(|_| BackendError::ToolNotFound {
        tool: candidate.display().to_string(),
    })
}

/// Returns true when `ffmpeg` is on `PATH`. Merging split video+audio needs it.
#[must_use]
pub fn ffmpeg_available() -> bool {
    which::which("ffmpeg").is_ok()
}
