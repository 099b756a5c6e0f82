//! CLI output formatting and display helpers.
//!
//! Builders return lines so the text can be tested without capturing stdout.

use std::path::Path;

use playlist_dl_core::quality::STANDARD_HEIGHTS;
use playlist_dl_core::{LEDGER_FILE_NAME, MergeFormat, ResolveMode, RunReport};

/// Printed when `ffmpeg` is not on `PATH`.
pub const FFMPEG_MISSING_NOTE: &str =
    "Note: ffmpeg was not found on PATH. Separate video and audio streams cannot be merged.";

/// Everything shown in the pre-run summary block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPlan<'a> {
    pub collection_name: &'a str,
    pub mode: ResolveMode,
    pub item_count: usize,
    pub unresolvable: usize,
    pub target_dir: &'a Path,
    pub quality_token: &'a str,
    pub policy: &'a str,
    pub workers: usize,
    pub fragments: usize,
    pub merge_format: MergeFormat,
}

/// Returns terminal width from COLUMNS, or 80 if unset/invalid.
pub fn terminal_width() -> usize {
    std::env::var("COLUMNS")
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .filter(|width| *width >= 20)
        .unwrap_or(80)
}

/// Truncates text to at most `width` chars, appending ellipsis if truncated.
pub fn truncate_to_width(text: &str, width: usize) -> String {
    let text_len = text.chars().count();
    if text_len <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }
    if width == 1 {
        return "…".to_string();
    }

    let mut output: String = text.chars().take(width - 1).collect();
    output.push('…');
    output
}

fn height_label(height: u32) -> String {
    format!("{height}p")
}

/// Menu shown before the quality prompt.
///
/// Lists the standard tiers and, for single items, the heights the probe
/// actually found.
pub fn quality_menu_lines(available_heights: &[u32]) -> Vec<String> {
    let tiers: Vec<String> = STANDARD_HEIGHTS
        .iter()
        .filter(|height| (360..=2160).contains(*height))
        .map(|height| height_label(*height))
        .collect();

    let mut lines = vec![
        "Quality options:".to_string(),
        format!("  max (best available), {}", tiers.join(", ")),
        "  custom:N caps the height at N pixels (e.g. custom:900)".to_string(),
    ];
    if !available_heights.is_empty() {
        let available: Vec<String> = available_heights.iter().map(|h| height_label(*h)).collect();
        lines.push(format!("  available: {}", available.join(", ")));
    }
    lines
}

/// Pre-run summary block.
pub fn run_plan_lines(plan: &RunPlan<'_>) -> Vec<String> {
    let width = terminal_width();
    let label = match plan.mode {
        ResolveMode::Single => "Video",
        ResolveMode::Collection => "Playlist",
    };

    let mut lines = vec![
        String::new(),
        "=== Summary ===".to_string(),
        truncate_to_width(&format!("{:<12}{}", format!("{label}:"), plan.collection_name), width),
        format!("Items:      {}", plan.item_count),
    ];
    if plan.unresolvable > 0 {
        lines.push(format!(
            "Skipped:    {} entries without a usable link",
            plan.unresolvable
        ));
    }
    lines.extend([
        truncate_to_width(&format!("Folder:     {}", plan.target_dir.display()), width),
        format!("Quality:    {} -> {}", plan.quality_token, plan.policy),
        format!("Workers:    {}", plan.workers),
        format!("Fragments:  {}", plan.fragments),
        format!("Container:  {}", plan.merge_format),
    ]);
    lines
}

/// Final summary with counts, sorted failures, and remediation hints.
pub fn completion_summary_lines(
    report: &RunReport,
    target_dir: &Path,
    merge_format: MergeFormat,
) -> Vec<String> {
    let mut lines = vec![
        String::new(),
        "=== Finished ===".to_string(),
        format!("Succeeded:  {}", report.success_count()),
        format!("Failed:     {}", report.failure_count()),
    ];
    if report.already_satisfied_count() > 0 {
        lines.push(format!(
            "  ({} already downloaded earlier)",
            report.already_satisfied_count()
        ));
    }
    if report.not_dispatched() > 0 {
        lines.push(format!("Not started: {}", report.not_dispatched()));
    }
    lines.push(format!("Folder:     {}", target_dir.display()));

    if !report.failures().is_empty() {
        lines.push(String::new());
        lines.push("Failed items:".to_string());
        for failure in report.failures() {
            lines.push(format!("  [{:03}] {}", failure.index, failure.reference));
            lines.push(format!("        {}", failure.detail));
        }
    }

    if report.failure_count() > 0 || report.was_interrupted() {
        lines.push(String::new());
        lines.push(format!(
            "Run the same command again to resume; finished items are skipped via {LEDGER_FILE_NAME}."
        ));
    }
    if report.failure_count() > 0 && merge_format == MergeFormat::Mp4 {
        lines.push("If failures mention merging, retry with --merge-format mkv.".to_string());
    }
    lines
}

pub fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{line}");
    }
}
