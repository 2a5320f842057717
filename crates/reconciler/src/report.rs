//! The pass report: what one reconciliation pass did (or, in dry-run mode,
//! would have done).

use serde::Serialize;

use board::PassId;

/// One stale item surfaced by the rule engine's advisory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaleItem {
    /// `owner/name` of the repository.
    pub repo: String,
    /// Item number within the repository.
    pub number: u64,
    /// Item title.
    pub title: String,
    /// Whole days since the work item was last updated.
    pub days_inactive: i64,
}

/// Summary of one reconciliation pass.
///
/// Counters distinguish *planned* mutations (what the rule engine decided)
/// from *applied* ones (writes that actually reached the tracker): in dry-run
/// mode everything is planned and nothing is applied.
#[derive(Debug, Clone, Serialize)]
pub struct PassReport {
    /// Correlates this report with the pass's log events.
    pub pass_id: PassId,
    /// Whether mutating calls were skipped.
    pub dry_run: bool,
    /// Board items with attached content that were evaluated.
    pub items_visited: usize,
    /// Board items skipped because their content was deleted.
    pub items_without_content: usize,
    /// Field mutations the rule engine decided on.
    pub mutations_planned: usize,
    /// Field mutations written to the tracker.
    pub mutations_applied: usize,
    /// Field mutations that failed (logged, pass continued).
    pub mutations_failed: usize,
    /// Agent dispatch label swaps performed (or planned, in dry-run).
    pub dispatches: usize,
    /// Dispatch label swaps that failed.
    pub dispatches_failed: usize,
    /// Stale items surfaced for operator review.
    pub stale_items: Vec<StaleItem>,
    /// Repositories whose open-item fetch failed and were skipped.
    pub repos_failed: usize,
    /// Orphans enrolled onto the board (or planned, in dry-run).
    pub orphans_enrolled: usize,
    /// Orphan enrollments that failed.
    pub enrollments_failed: usize,
}

impl PassReport {
    pub(crate) fn new(pass_id: PassId, dry_run: bool) -> Self {
        Self {
            pass_id,
            dry_run,
            items_visited: 0,
            items_without_content: 0,
            mutations_planned: 0,
            mutations_applied: 0,
            mutations_failed: 0,
            dispatches: 0,
            dispatches_failed: 0,
            stale_items: Vec::new(),
            repos_failed: 0,
            orphans_enrolled: 0,
            enrollments_failed: 0,
        }
    }

    /// Returns `true` if any per-item operation failed during the pass.
    pub fn has_failures(&self) -> bool {
        self.mutations_failed > 0
            || self.dispatches_failed > 0
            || self.enrollments_failed > 0
            || self.repos_failed > 0
    }
}
