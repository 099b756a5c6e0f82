//! Merges CLI flags, the config file, and built-in defaults.
//!
//! A value given on the command line is final and never prompted for. A
//! value from the config file replaces the built-in default shown at the
//! prompt.

use std::env;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use anyhow::Result;

use playlist_dl_core::{
    DEFAULT_FRAGMENT_CONCURRENCY, DEFAULT_RETRIES, MergeFormat, default_worker_count,
};

use crate::app_config::{FileConfig, VerbositySetting};
use crate::cli::Args;

/// Quality token offered when nothing else is configured.
pub(crate) const DEFAULT_QUALITY: &str = "max";

/// A setting and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Choice<T> {
    /// Given on the command line; used as-is.
    Given(T),
    /// Offered as the prompt default.
    Suggested(T),
}

impl<T> Choice<T> {
    fn pick(cli: Option<T>, config: Option<T>, builtin: T) -> Self {
        match cli {
            Some(value) => Self::Given(value),
            None => Self::Suggested(config.unwrap_or(builtin)),
        }
    }

    pub(crate) fn value(&self) -> &T {
        match self {
            Self::Given(value) | Self::Suggested(value) => value,
        }
    }
}

/// Every run input before prompting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RunChoices {
    pub(crate) url: Option<String>,
    pub(crate) quality: Choice<String>,
    pub(crate) workers: Choice<usize>,
    pub(crate) fragments: Choice<usize>,
    pub(crate) output_root: Choice<PathBuf>,
    pub(crate) retries: u32,
    pub(crate) merge_format: MergeFormat,
    pub(crate) ytdlp_path: Option<PathBuf>,
    pub(crate) assume_yes: bool,
}

pub(crate) fn resolve_choices(args: &Args, config: &FileConfig) -> Result<RunChoices> {
    let url = args
        .url
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(str::to_string);

    let merge_format = match args.merge_format {
        Some(format) => format,
        None => config.parsed_merge_format()?.unwrap_or_default(),
    };

    Ok(RunChoices {
        url,
        quality: Choice::pick(
            args.quality.clone(),
            config.quality.clone(),
            DEFAULT_QUALITY.to_string(),
        ),
        workers: Choice::pick(
            args.workers.map(usize::from),
            config.workers.map(usize::from),
            default_worker_count(),
        ),
        fragments: Choice::pick(
            args.fragments.map(usize::from),
            config.fragments.map(usize::from),
            DEFAULT_FRAGMENT_CONCURRENCY as usize,
        ),
        output_root: Choice::pick(
            args.output_dir.clone(),
            config.output_dir.clone(),
            PathBuf::from("."),
        ),
        retries: args
            .retries
            .or(config.retries)
            .map_or(DEFAULT_RETRIES, u32::from),
        merge_format,
        ytdlp_path: args.ytdlp_path.clone().or_else(|| config.ytdlp_path.clone()),
        assume_yes: args.yes,
    })
}

/// Expands a leading `~` component to `$HOME`.
pub(crate) fn expand_home(path: &Path) -> PathBuf {
    expand_home_with(path, env::var_os("HOME").as_deref())
}

fn expand_home_with(path: &Path, home: Option<&OsStr>) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match home.filter(|home| !home.is_empty()) {
        Some(home) if rest.as_os_str().is_empty() => PathBuf::from(home),
        Some(home) => Path::new(home).join(rest),
        None => path.to_path_buf(),
    }
}

/// Default log filter when `RUST_LOG` is not forced by a CLI flag.
pub(crate) fn resolve_default_log_level(args: &Args, config: &FileConfig) -> &'static str {
    if args.quiet {
        return "error";
    }
    match args.verbose {
        0 => match config.verbosity {
            Some(VerbositySetting::Quiet) => "error",
            Some(VerbositySetting::Verbose) => "info",
            Some(VerbositySetting::Debug) => "debug",
            Some(VerbositySetting::Default) | None => "warn",
        },
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

pub(crate) fn should_force_cli_log_level(args: &Args) -> bool {
    args.verbose > 0 || args.quiet
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn args(argv: &[&str]) -> Args {
        let mut full = vec!["playlist-dl"];
        full.extend_from_slice(argv);
        Args::try_parse_from(full).unwrap()
    }

    #[test]
    fn test_cli_value_is_given_and_wins_over_config() {
        let config = FileConfig {
            workers: Some(3),
            quality: Some("480p".to_string()),
            ..FileConfig::default()
        };
        let choices = resolve_choices(&args(&["-w", "9", "-f", "720p"]), &config).unwrap();
        assert_eq!(choices.workers, Choice::Given(9));
        assert_eq!(choices.quality, Choice::Given("720p".to_string()));
    }

    #[test]
    fn test_config_value_becomes_suggestion() {
        let config = FileConfig {
            fragments: Some(8),
            output_dir: Some(PathBuf::from("/media")),
            ..FileConfig::default()
        };
        let choices = resolve_choices(&args(&[]), &config).unwrap();
        assert_eq!(choices.fragments, Choice::Suggested(8));
        assert_eq!(choices.output_root, Choice::Suggested(PathBuf::from("/media")));
    }

    #[test]
    fn test_builtin_defaults() {
        let choices = resolve_choices(&args(&[]), &FileConfig::default()).unwrap();
        assert_eq!(choices.url, None);
        assert_eq!(choices.quality.value(), DEFAULT_QUALITY);
        assert_eq!(*choices.workers.value(), default_worker_count());
        assert_eq!(*choices.fragments.value(), 4);
        assert_eq!(choices.output_root.value(), &PathBuf::from("."));
        assert_eq!(choices.retries, 10);
        assert_eq!(choices.merge_format, MergeFormat::Mp4);
        assert!(!choices.assume_yes);
    }

    #[test]
    fn test_blank_url_argument_counts_as_missing() {
        let choices = resolve_choices(&args(&["   "]), &FileConfig::default()).unwrap();
        assert_eq!(choices.url, None);
    }

    #[test]
    fn test_merge_format_and_retries_from_config() {
        let config = FileConfig {
            merge_format: Some("mkv".to_string()),
            retries: Some(2),
            ..FileConfig::default()
        };
        let choices = resolve_choices(&args(&[]), &config).unwrap();
        assert_eq!(choices.merge_format, MergeFormat::Mkv);
        assert_eq!(choices.retries, 2);

        let choices = resolve_choices(&args(&["--merge-format", "mp4", "-r", "0"]), &config).unwrap();
        assert_eq!(choices.merge_format, MergeFormat::Mp4);
        assert_eq!(choices.retries, 0);
    }

    #[test]
    fn test_expand_home_replaces_leading_tilde() {
        let home = Some(OsStr::new("/home/ana"));
        assert_eq!(
            expand_home_with(Path::new("~/Videos"), home),
            PathBuf::from("/home/ana/Videos")
        );
        assert_eq!(expand_home_with(Path::new("~"), home), PathBuf::from("/home/ana"));
    }

    #[test]
    fn test_expand_home_leaves_other_paths_alone() {
        let home = Some(OsStr::new("/home/ana"));
        assert_eq!(
            expand_home_with(Path::new("/srv/~/x"), home),
            PathBuf::from("/srv/~/x")
        );
        assert_eq!(
            expand_home_with(Path::new("~other/x"), home),
            PathBuf::from("~other/x")
        );
        assert_eq!(expand_home_with(Path::new("~/x"), None), PathBuf::from("~/x"));
    }

    #[test]
    fn test_log_level_from_flags_and_config() {
        let config = FileConfig::default();
        assert_eq!(resolve_default_log_level(&args(&[]), &config), "warn");
        assert_eq!(resolve_default_log_level(&args(&["-q"]), &config), "error");
        assert_eq!(resolve_default_log_level(&args(&["-v"]), &config), "info");
        assert_eq!(resolve_default_log_level(&args(&["-vv"]), &config), "debug");
        assert_eq!(resolve_default_log_level(&args(&["-vvv"]), &config), "trace");

        let config = FileConfig {
            verbosity: Some(VerbositySetting::Debug),
            ..FileConfig::default()
        };
        assert_eq!(resolve_default_log_level(&args(&[]), &config), "debug");
        assert_eq!(resolve_default_log_level(&args(&["-q"]), &config), "error");
    }

    #[test]
    fn test_force_cli_log_level_only_with_flags() {
        assert!(!should_force_cli_log_level(&args(&[])));
        assert!(should_force_cli_log_level(&args(&["-v"])));
        assert!(should_force_cli_log_level(&args(&["-q"])));
    }
}
