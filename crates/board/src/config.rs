//! Engine configuration.
//!
//! Everything the rule engine and reconciler can be tuned by lives in one
//! immutable [`EngineConfig`] value, built once at startup and passed in at
//! construction. There is no ambient configuration state.

use serde::Deserialize;

use crate::Priority;

/// Default label → priority lookup table, in precedence order.
///
/// Table order matters: the first key contained in a label wins.
fn default_label_priorities() -> Vec<(String, Priority)> {
    [
        ("critical", Priority::P0),
        ("high", Priority::P1),
        ("bug", Priority::P1),
        ("enhancement", Priority::P2),
        ("feature", Priority::P2),
        ("documentation", Priority::P3),
    ]
    .into_iter()
    .map(|(k, p)| (k.to_string(), p))
    .collect()
}

fn default_priority() -> Priority {
    Priority::P2
}

fn default_stale_after_days() -> i64 {
    30
}

fn default_sweep_concurrency() -> usize {
    8
}

fn default_status_field() -> String {
    "Status".into()
}

fn default_priority_field() -> String {
    "Priority".into()
}

fn default_status_todo() -> String {
    "Todo".into()
}

fn default_status_in_progress() -> String {
    "In Progress".into()
}

fn default_status_done() -> String {
    "Done".into()
}

fn default_agent_pending_label() -> String {
    "ai-pending".into()
}

fn default_agent_assigned_label() -> String {
    "ai-assigned".into()
}

/// Immutable configuration for one reconciliation pass.
///
/// Deserializable from the optional `gardener.toml` file; every key has a
/// default matching the behaviour the board was originally gardened with.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Name of the single-select status field on the board.
    pub status_field: String,
    /// Name of the single-select priority field on the board.
    pub priority_field: String,
    /// Option name meaning "not started".
    pub status_todo: String,
    /// Option name meaning "actively worked".
    pub status_in_progress: String,
    /// Option name meaning "finished".
    pub status_done: String,
    /// Label marking an item queued for automated work.
    pub agent_pending_label: String,
    /// Label marking an item an agent has picked up.
    pub agent_assigned_label: String,
    /// Ordered label → priority lookup table for derived priorities.
    /// The first key contained in any label wins.
    pub label_priorities: Vec<(String, Priority)>,
    /// Priority assigned when no table key matches an open, unprioritised item.
    pub default_priority: Priority,
    /// An open item untouched for strictly more than this many days is
    /// reported stale.
    pub stale_after_days: i64,
    /// Maximum repositories swept concurrently.
    pub sweep_concurrency: usize,
    /// When set, every mutating tracker call is logged and skipped.
    pub dry_run: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            status_field: default_status_field(),
            priority_field: default_priority_field(),
            status_todo: default_status_todo(),
            status_in_progress: default_status_in_progress(),
            status_done: default_status_done(),
            agent_pending_label: default_agent_pending_label(),
            agent_assigned_label: default_agent_assigned_label(),
            label_priorities: default_label_priorities(),
            default_priority: default_priority(),
            stale_after_days: default_stale_after_days(),
            sweep_concurrency: default_sweep_concurrency(),
            dry_run: false,
        }
    }
}

impl EngineConfig {
    /// Looks up the derived priority for a set of labels.
    ///
    /// Scans the table in order; the first key contained (case-insensitively)
    /// in any label wins. Falls back to [`Self::default_priority`].
    pub fn derived_priority(&self, labels: &[String]) -> Priority {
        for label in labels {
            let normalized = label.to_lowercase();
            for (key, priority) in &self.label_priorities {
                if normalized.contains(key.as_str()) {
                    return *priority;
                }
            }
        }
        self.default_priority
    }
}
