//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use playlist_dl_core::MergeFormat;

/// Download a YouTube video or a whole playlist with yt-dlp.
///
/// Anything not given on the command line is asked for interactively.
/// Finished items are recorded in `_archive.txt`; re-run any time to resume.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "playlist-dl")]
#[command(author, version, about)]
pub struct Args {
    /// Video or playlist URL (prompted for when omitted)
    pub url: Option<String>,

    /// Quality: max, 2160p, 1440p, 1080p, 720p, 480p, 360p, or custom:N
    #[arg(short = 'f', long)]
    pub quality: Option<String>,

    /// Parallel video downloads (1-64)
    #[arg(short = 'w', long, value_parser = clap::value_parser!(u8).range(1..=64))]
    pub workers: Option<u8>,

    /// Concurrent fragments per video (1-64)
    #[arg(short = 'F', long, value_parser = clap::value_parser!(u8).range(1..=64))]
    pub fragments: Option<u8>,

    /// Retries per video and per fragment (0-100)
    #[arg(short = 'r', long, value_parser = clap::value_parser!(u8).range(0..=100))]
    pub retries: Option<u8>,

    /// Output root folder; the playlist folder is created inside it
    #[arg(short = 'o', long)]
    pub output_dir: Option<PathBuf>,

    /// Merge container: mp4 (falls back to mkv when needed) or mkv
    #[arg(long)]
    pub merge_format: Option<MergeFormat>,

    /// Path to the yt-dlp executable
    #[arg(long)]
    pub ytdlp_path: Option<PathBuf>,

    /// Use defaults for anything not given and start without confirmation
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Config file (default: $XDG_CONFIG_HOME/playlist-dl/config.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Disable colored log output
    #[arg(long)]
    pub no_color: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress everything but errors in the log
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}
