//! Run-level aggregation of fetch outcomes.

use super::worker::{FetchOutcome, OutcomeStatus};

/// One failed item, as listed in the final summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedItem {
    /// Work item index.
    pub index: usize,
    /// Work item reference.
    pub reference: String,
    /// Failure cause.
    pub detail: String,
}

/// Aggregate of every outcome in a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    total: usize,
    fetched: usize,
    already_satisfied: usize,
    failures: Vec<FailedItem>,
    not_dispatched: usize,
    interrupted: bool,
}

impl RunReport {
    /// Empty report for a worklist of `total` items.
    #[must_use]
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    /// Number of items in the worklist.
    #[must_use]
    pub fn total(&self) -> usize {
        self.total
    }

    /// Items that ended successfully (fetched or already satisfied).
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.fetched + self.already_satisfied
    }

    /// Items fetched during this run.
    #[must_use]
    pub fn fetched_count(&self) -> usize {
        self.fetched
    }

    /// Items skipped because the ledger already recorded them.
    #[must_use]
    pub fn already_satisfied_count(&self) -> usize {
        self.already_satisfied
    }

    /// Items that failed.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Failed items, sorted by index once the run is finished.
    #[must_use]
    pub fn failures(&self) -> &[FailedItem] {
        &self.failures
    }

    /// Items never dispatched because the run was interrupted.
    #[must_use]
    pub fn not_dispatched(&self) -> usize {
        self.not_dispatched
    }

    /// True if a user interrupt stopped the run early.
    #[must_use]
    pub fn was_interrupted(&self) -> bool {
        self.interrupted
    }

    /// Folds one outcome into the report.
    pub fn record(&mut self, outcome: &FetchOutcome) {
        match outcome.status {
            OutcomeStatus::Fetched => self.fetched += 1,
            OutcomeStatus::AlreadySatisfied => self.already_satisfied += 1,
            OutcomeStatus::Failed => self.failures.push(FailedItem {
                index: outcome.index,
                reference: outcome.reference.clone(),
                detail: outcome.detail.clone(),
            }),
        }
    }

    pub(crate) fn mark_interrupted(&mut self, not_dispatched: usize) {
        self.interrupted = true;
        self.not_dispatched += not_dispatched;
    }

    pub(crate) fn finalize(mut self) -> Self {
        self.failures.sort_by_key(|failure| failure.index);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worklist::WorkItem;

    #[test]
    fn test_report_counts_by_status() {
        let mut report = RunReport::new(4);
        report.record(&FetchOutcome::fetched(&WorkItem::new(1, "a")));
        report.record(&FetchOutcome::already_satisfied(&WorkItem::new(2, "b")));
        report.record(&FetchOutcome::failed(&WorkItem::new(3, "c"), "x"));
        report.record(&FetchOutcome::fetched(&WorkItem::new(4, "d")));

        assert_eq!(report.total(), 4);
        assert_eq!(report.success_count(), 3);
        assert_eq!(report.fetched_count(), 2);
        assert_eq!(report.already_satisfied_count(), 1);
        assert_eq!(report.failure_count(), 1);
        assert!(!report.was_interrupted());
    }

    #[test]
    fn test_finalize_sorts_failures_by_index() {
        let mut report = RunReport::new(3);
        report.record(&FetchOutcome::failed(&WorkItem::new(3, "c"), "late"));
        report.record(&FetchOutcome::failed(&WorkItem::new(1, "a"), "early"));
        report.record(&FetchOutcome::failed(&WorkItem::new(2, "b"), "mid"));

        let report = report.finalize();
        let indices: Vec<usize> = report.failures().iter().map(|f| f.index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
        assert_eq!(report.failures()[0].detail, "early");
    }

    #[test]
    fn test_mark_interrupted_accumulates() {
        let mut report = RunReport::new(10);
        report.mark_interrupted(4);
        assert!(report.was_interrupted());
        assert_eq!(report.not_dispatched(), 4);
    }
}
