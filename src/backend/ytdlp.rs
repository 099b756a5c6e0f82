//! yt-dlp process backend.
//!
//! Probing runs `yt-dlp --flat-playlist --dump-single-json` so collections
//! are listed without resolving every entry. Fetching runs one yt-dlp
//! process per item with the format selector, output template, retry
//! budget and shared `--download-archive` ledger.

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, instrument, trace};
use url::Url;

use super::{
    BackendError, FetchBackend, FetchRequest, MetadataProbe, ProbeResult, ProbedCollection,
    ProbedEntry, ProbedItem,
};

/// Placeholder yt-dlp substitutes for missing template fields.
const NA_PLACEHOLDER: &str = "NA";

/// Backend that shells out to the yt-dlp executable.
#[derive(Debug, Clone)]
pub struct YtDlpBackend {
    program: PathBuf,
}

impl YtDlpBackend {
    /// Creates a backend invoking the given executable.
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Returns the executable path.
    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    fn spawn_error(&self, source: std::io::Error) -> BackendError {
        if source.kind() == std::io::ErrorKind::NotFound {
            BackendError::ToolNotFound {
                tool: self.program.display().to_string(),
            }
        } else {
            BackendError::Spawn {
                program: self.program.clone(),
                source,
            }
        }
    }
}

#[async_trait]
impl MetadataProbe for YtDlpBackend {
    #[instrument(skip(self), fields(program = %self.program.display()))]
    async fn probe(&self, reference: &str) -> Result<ProbeResult, BackendError> {
        let output = self
            .command()
            .args([
                "--flat-playlist",
                "--dump-single-json",
                "--skip-download",
                "--no-warnings",
                "--yes-playlist",
                "--",
                reference,
            ])
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BackendError::failed(extract_failure_reason(
                &stderr,
                output.status,
            )));
        }

        debug!(bytes = output.stdout.len(), "probe output received");
        parse_probe_output(&output.stdout)
    }
}

#[async_trait]
impl FetchBackend for YtDlpBackend {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    fn completion_key(&self, reference: &str) -> Option<String> {
        youtube_archive_key(reference)
    }

    #[instrument(skip(self, request), fields(reference = %request.reference))]
    async fn fetch(&self, request: &FetchRequest) -> Result<(), BackendError> {
        let mut child = self
            .command()
            .args(build_fetch_args(request))
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let (_, stderr_text) = tokio::join!(log_stdout(stdout), collect_stderr(stderr));

        let status = child.wait().await.map_err(|e| self.spawn_error(e))?;
        if status.success() {
            return Ok(());
        }
        Err(BackendError::failed(extract_failure_reason(
            &stderr_text,
            status,
        )))
    }
}

async fn log_stdout<R: AsyncRead + Unpin>(stream: Option<R>) {
    let Some(stream) = stream else {
        return;
    };
    let mut lines = BufReader::new(stream).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        trace!(target: "yt_dlp", "{line}");
    }
}

async fn collect_stderr<R: AsyncRead + Unpin>(stream: Option<R>) -> String {
    let Some(stream) = stream else {
        return String::new();
    };
    let mut collected = String::new();
    let mut lines = BufReader::new(stream).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        debug!(target: "yt_dlp", "{line}");
        collected.push_str(&line);
        collected.push('\n');
    }
    collected
}

/// Builds the yt-dlp argument list for one item fetch.
#[must_use]
pub fn build_fetch_args(request: &FetchRequest) -> Vec<String> {
    vec![
        "--format".to_string(),
        request.policy.as_str().to_string(),
        "--output".to_string(),
        request.output_template.clone(),
        "--download-archive".to_string(),
        request.ledger_path.display().to_string(),
        "--retries".to_string(),
        request.retries.to_string(),
        "--fragment-retries".to_string(),
        request.retries.to_string(),
        "--concurrent-fragments".to_string(),
        request.fragment_concurrency.to_string(),
        "--merge-output-format".to_string(),
        request.merge_format.selector().to_string(),
        "--no-playlist".to_string(),
        "--windows-filenames".to_string(),
        "--output-na-placeholder".to_string(),
        NA_PLACEHOLDER.to_string(),
        "--newline".to_string(),
        "--no-progress".to_string(),
        "--".to_string(),
        request.reference.clone(),
    ]
}

/// Picks the most useful failure line from yt-dlp's stderr.
///
/// Preference: last `ERROR:` line, then the last non-empty line, then the exit status.
fn extract_failure_reason(stderr: &str, status: ExitStatus) -> String {
    let lines: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    lines
        .iter()
        .rev()
        .find(|line| line.starts_with("ERROR:"))
        .or_else(|| lines.last())
        .map_or_else(|| format!("yt-dlp exited with {status}"), ToString::to_string)
}

#[derive(Debug, Deserialize)]
struct RawInfo {
    #[serde(rename = "_type")]
    kind: Option<String>,
    id: Option<String>,
    extractor_key: Option<String>,
    title: Option<String>,
    webpage_url: Option<String>,
    #[serde(default)]
    entries: Option<Vec<Option<RawEntry>>>,
    #[serde(default)]
    formats: Vec<RawFormat>,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    url: Option<String>,
    id: Option<String>,
    ie_key: Option<String>,
    extractor_key: Option<String>,
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawFormat {
    vcodec: Option<String>,
    height: Option<u32>,
}

/// Parses `--dump-single-json` output into a [`ProbeResult`].
///
/// Anything typed `playlist` or carrying an `entries` list is a collection;
/// everything else is a single item.
///
/// # Errors
///
/// Returns [`BackendError::InvalidOutput`] if the output is not the expected JSON object.
pub fn parse_probe_output(stdout: &[u8]) -> Result<ProbeResult, BackendError> {
    let info: RawInfo = serde_json::from_slice(stdout)
        .map_err(|e| BackendError::invalid_output(format!("probe JSON: {e}")))?;

    let is_collection = info.kind.as_deref() == Some("playlist") || info.entries.is_some();
    if is_collection {
        let entries = info
            .entries
            .unwrap_or_default()
            .into_iter()
            .map(|entry| {
                entry.map_or_else(ProbedEntry::default, |raw| {
                    let extractor = raw.extractor_key.or(raw.ie_key);
                    let id = non_empty(raw.id);
                    ProbedEntry {
                        completion_key: archive_key(extractor.as_deref(), id.as_deref()),
                        url: non_empty(raw.url),
                        id,
                        title: raw.title,
                    }
                })
            })
            .collect();
        return Ok(ProbeResult::Collection(ProbedCollection {
            title: info.title,
            entries,
        }));
    }

    let mut heights: Vec<u32> = info
        .formats
        .iter()
        .filter(|f| f.vcodec.as_deref().is_some_and(|v| v != "none" && !v.is_empty()))
        .filter_map(|f| f.height)
        .collect();
    heights.sort_unstable_by(|a, b| b.cmp(a));
    heights.dedup();

    Ok(ProbeResult::Single(ProbedItem {
        completion_key: archive_key(info.extractor_key.as_deref(), info.id.as_deref()),
        title: info.title,
        webpage_url: non_empty(info.webpage_url),
        available_heights: heights,
    }))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Builds yt-dlp's archive key (`<extractor lowercased> <id>`).
///
/// Returns `None` unless both parts are present.
#[must_use]
pub fn archive_key(extractor: Option<&str>, id: Option<&str>) -> Option<String> {
    let extractor = extractor.map(str::trim).filter(|e| !e.is_empty())?;
    let id = id.map(str::trim).filter(|i| !i.is_empty())?;
    Some(format!("{} {id}", extractor.to_lowercase()))
}

/// Computes yt-dlp's archive key (`youtube <id>`) for YouTube video URLs.
///
/// Returns `None` for other hosts; yt-dlp then decides skips on its own.
#[must_use]
pub fn youtube_archive_key(reference: &str) -> Option<String> {
    let url = Url::parse(reference).ok()?;
    let host = url.host_str()?.to_ascii_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);

    let id = match host {
        "youtu.be" => url.path_segments()?.next().map(str::to_string),
        "youtube.com" | "m.youtube.com" | "music.youtube.com" => {
            let mut segments = url.path_segments()?;
            match segments.next()? {
                "watch" => url
                    .query_pairs()
                    .find(|(k, _)| k == "v")
                    .map(|(_, v)| v.into_owned()),
                "shorts" | "live" | "embed" => segments.next().map(str::to_string),
                _ => None,
            }
        }
        _ => None,
    }?;

    is_video_id(&id).then(|| format!("youtube {id}"))
}

fn is_video_id(id: &str) -> bool {
    id.len() == 11
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
