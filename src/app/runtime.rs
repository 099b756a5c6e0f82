use std::fs;
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use clap::Parser;
use playlist_dl_core::backend::{ffmpeg_available, locate_ytdlp};
use playlist_dl_core::fetch::MAX_WORKERS;
use playlist_dl_core::{
    CompletionLedger, FetchEngine, FetchSettings, FetchWorker, ItemResolver, YtDlpBackend,
    resolve_quality,
};
use tracing::{debug, info, warn};

use crate::app::config_runtime::{self, Choice};
use crate::app::prompts::Prompter;
use crate::app::{exit_handler, progress_manager, terminal};
use crate::cli::Args;
use crate::output::{self, RunPlan};
use crate::{ProcessExit, app_config};

pub(crate) async fn run_playlist_dl() -> Result<ProcessExit> {
    let args = Args::parse();

    let loaded = app_config::load_config(args.config.as_deref())?;
    let file_config = loaded.file_config();

    let default_level = config_runtime::resolve_default_log_level(&args, &file_config);
    let force_cli_log_level = config_runtime::should_force_cli_log_level(&args);
    let no_color = terminal::is_no_color_requested(&args);
    terminal::init_tracing(default_level, force_cli_log_level, no_color);

    debug!(?args, config = ?loaded.path, "CLI arguments parsed");

    let choices = config_runtime::resolve_choices(&args, &file_config)?;

    let ytdlp = locate_ytdlp(choices.ytdlp_path.as_deref())
        .context("yt-dlp is required: install it or pass --ytdlp-path")?;
    info!(path = %ytdlp.display(), "Using yt-dlp");
    if !ffmpeg_available() {
        warn!("ffmpeg not found on PATH; merging separate streams will fail");
        println!("{}", output::FFMPEG_MISSING_NOTE);
    }

    let interactive = !choices.assume_yes;
    let mut prompter = Prompter::stdio();

    let url = match choices.url.clone() {
        Some(url) => url,
        None if interactive => prompter.ask("Playlist or video URL: ")?,
        None => String::new(),
    };

    let backend = Arc::new(YtDlpBackend::new(ytdlp));
    println!("Fetching playlist info...");
    let resolved = ItemResolver::new(backend.clone())
        .resolve(&url)
        .await
        .context("Could not resolve the URL")?;

    let quality_token = match &choices.quality {
        Choice::Suggested(default) if interactive => {
            for line in output::quality_menu_lines(&resolved.available_heights) {
                prompter.say(&line)?;
            }
            prompter.ask_with_default("Quality", default)?
        }
        choice => choice.value().clone(),
    };
    let workers = match &choices.workers {
        Choice::Suggested(default) if interactive => {
            prompter.ask_count("Parallel downloads (videos at once)", *default)?
        }
        choice => *choice.value(),
    };
    let fragments = match &choices.fragments {
        Choice::Suggested(default) if interactive => {
            prompter.ask_count("Concurrent fragments per video", *default)?
        }
        choice => *choice.value(),
    };
    let output_root = match &choices.output_root {
        Choice::Suggested(default) if interactive => PathBuf::from(
            prompter.ask_with_default("Output folder", &default.display().to_string())?,
        ),
        choice => choice.value().clone(),
    };
    let output_root = config_runtime::expand_home(&output_root);

    let workers = clamp_count("workers", workers, MAX_WORKERS);
    let fragments = clamp_count("fragments", fragments, MAX_WORKERS);

    let quality = resolve_quality(&quality_token);
    if let Some(warning) = &quality.warning {
        println!("{warning}");
    }

    let target_dir = output_root.join(&resolved.collection_name);
    output::print_lines(&output::run_plan_lines(&RunPlan {
        collection_name: &resolved.collection_name,
        mode: resolved.mode,
        item_count: resolved.items.len(),
        unresolvable: resolved.unresolvable,
        target_dir: &target_dir,
        quality_token: &quality_token,
        policy: quality.policy.as_str(),
        workers,
        fragments,
        merge_format: choices.merge_format,
    }));

    if interactive {
        prompter.ask("\nPress Enter to start (Ctrl+C to cancel)...")?;
    }

    fs::create_dir_all(&target_dir)
        .with_context(|| format!("Failed to create output folder '{}'", target_dir.display()))?;
    info!(dir = %target_dir.display(), "Output folder ready");

    let ledger = Arc::new(CompletionLedger::open(&target_dir));
    let settings = FetchSettings {
        output_dir: target_dir.clone(),
        policy: quality.policy,
        fragment_concurrency: u32::try_from(fragments).unwrap_or(u32::MAX),
        retries: choices.retries,
        merge_format: choices.merge_format,
    };
    let worker = Arc::new(FetchWorker::new(backend, ledger, settings));
    let engine = FetchEngine::new(workers)?;

    let interrupted = Arc::new(AtomicBool::new(false));
    let interrupted_signal = Arc::clone(&interrupted);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupted_signal.store(true, Ordering::SeqCst);
        }
    });

    let use_bar = terminal::should_use_progress_bar(
        io::stderr().is_terminal(),
        args.quiet,
        terminal::is_dumb_terminal(),
    );
    let total = resolved.items.len();
    let reporter = progress_manager::ProgressReporter::new(use_bar, total);

    let report = engine
        .run(resolved.items, worker, Arc::clone(&interrupted), |outcome| {
            reporter.report(outcome);
        })
        .await?;
    reporter.finish();

    output::print_lines(&output::completion_summary_lines(
        &report,
        &target_dir,
        choices.merge_format,
    ));

    if report.was_interrupted() {
        warn!(
            succeeded = report.success_count(),
            total, "Interrupted. Run again to resume."
        );
    }

    Ok(exit_handler::determine_exit_outcome(&report))
}

fn clamp_count(field: &str, value: usize, max: usize) -> usize {
    if value > max {
        warn!(field, value, max, "value above maximum; clamping");
        max
    } else {
        value.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::clamp_count;

    #[test]
    fn test_clamp_count_bounds() {
        assert_eq!(clamp_count("workers", 0, 64), 1);
        assert_eq!(clamp_count("workers", 8, 64), 8);
        assert_eq!(clamp_count("workers", 500, 64), 64);
    }
}
