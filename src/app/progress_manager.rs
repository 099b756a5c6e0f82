//! Progress UI for fetch runs.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use playlist_dl_core::FetchOutcome;

/// Prints one line per outcome, above a progress bar when enabled.
pub(crate) struct ProgressReporter {
    bar: Option<ProgressBar>,
}

impl ProgressReporter {
    pub(crate) fn new(use_bar: bool, total: usize) -> Self {
        if !use_bar {
            return Self { bar: None };
        }
        let bar = ProgressBar::new(u64::try_from(total).unwrap_or(u64::MAX));
        bar.set_style(
            ProgressStyle::with_template("{spinner} [{elapsed_precise}] {bar:30} {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar.set_message("downloading");
        bar.enable_steady_tick(Duration::from_millis(120));
        Self { bar: Some(bar) }
    }

    pub(crate) fn report(&self, outcome: &FetchOutcome) {
        match &self.bar {
            Some(bar) => {
                bar.suspend(|| println!("{outcome}"));
                bar.inc(1);
            }
            None => println!("{outcome}"),
        }
    }

    pub(crate) fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}
