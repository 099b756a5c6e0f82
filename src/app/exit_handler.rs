//! Exit code logic for the process.
//!
//! Single responsibility: map a finished run to the process exit outcome.

use playlist_dl_core::RunReport;

use crate::ProcessExit;

/// Determines the process exit outcome from a finished run.
///
/// Per-item failures do not fail the process; they are listed in the summary
/// and resolved by re-running. Only an interrupt changes the exit code.
pub(crate) fn determine_exit_outcome(report: &RunReport) -> ProcessExit {
    if report.was_interrupted() {
        ProcessExit::Interrupted
    } else {
        ProcessExit::Success
    }
}
