//! Shared value types for the board domain.
//!
//! Unlike the newtype identifiers in [`crate::identifiers`], these types carry
//! meaningful values with invariants (e.g. a board item holds at most one
//! value per field, a priority is one of four ranks) and participate in the
//! rule engine's decisions.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{BoardItemId, FieldId, OptionId, RepoRef, WorkItemId};

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp.
///
/// Wraps [`chrono::DateTime<Utc>`] so callers never depend on `chrono` types
/// directly; the underlying representation can change without affecting the
/// domain API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Returns the current UTC time as a [`Timestamp`].
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a [`Timestamp`] from a [`DateTime<Utc>`].
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Parses an RFC 3339 timestamp (the tracker's wire format).
    ///
    /// Returns `None` if the string is not a valid RFC 3339 datetime.
    #[must_use]
    pub fn parse_rfc3339(s: &str) -> Option<Self> {
        DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| Self(dt.with_timezone(&Utc)))
    }

    /// Returns the underlying [`DateTime<Utc>`].
    pub fn as_datetime(self) -> DateTime<Utc> {
        self.0
    }

    /// Whole days elapsed from `self` to `later`. Negative if `later` is earlier.
    pub fn days_until(self, later: Timestamp) -> i64 {
        (later.0 - self.0).num_days()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

// ---------------------------------------------------------------------------
// Work items
// ---------------------------------------------------------------------------

/// The two kinds of work item the tracker can attach to a board item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkItemKind {
    /// A tracked issue.
    Issue,
    /// A change request (pull request) against a repository.
    ChangeRequest,
}

/// Lifecycle state of a work item, as reported by the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkItemState {
    /// Still open.
    Open,
    /// Closed without merging (issues and declined change requests).
    Closed,
    /// Merged (change requests only).
    Merged,
}

impl WorkItemState {
    /// Returns `true` for [`Closed`](Self::Closed) and [`Merged`](Self::Merged).
    pub fn is_closed(self) -> bool {
        matches!(self, Self::Closed | Self::Merged)
    }
}

/// A snapshot of one work item as fetched from the tracker.
///
/// Created and mutated externally (by humans and automated agents); the
/// engine only reads it, with one exception: the agent-dispatch label swap,
/// which goes through the tracker client rather than this value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    /// Tracker content identifier.
    pub id: WorkItemId,
    /// Issue or change request.
    pub kind: WorkItemKind,
    /// Repository the item lives in.
    pub repo: RepoRef,
    /// Item number within the repository (used for label mutations).
    pub number: u64,
    /// Title, for logging only.
    pub title: String,
    /// Open / closed / merged.
    pub state: WorkItemState,
    /// Author login, when the tracker still knows it.
    pub author: Option<String>,
    /// Label names. Insertion order is irrelevant to every rule.
    pub labels: Vec<String>,
    /// Number of assignees (the fetch requests at most one; rules only need
    /// "has at least one").
    pub assignee_count: usize,
    /// Last time the item itself was updated.
    pub updated_at: Timestamp,
}

impl WorkItem {
    /// Returns `true` if any label contains `needle` case-insensitively.
    pub fn has_label_containing(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.labels.iter().any(|l| l.to_lowercase().contains(&needle))
    }

    /// Returns `true` if the exact label name is present.
    pub fn has_label(&self, name: &str) -> bool {
        self.labels.iter().any(|l| l == name)
    }
}

// ---------------------------------------------------------------------------
// Board items and field values
// ---------------------------------------------------------------------------

/// The value currently stored in one (board item, field) pair.
///
/// Decoded once at the wire boundary; a malformed or unrecognised shape
/// decodes to *no value* rather than failing the pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldValue {
    /// Free-form text field value.
    Text(String),
    /// Date field value.
    Date(Timestamp),
    /// The *name* of the selected option of a single-select field.
    Option(String),
}

impl FieldValue {
    /// Returns the selected option name, if this is a single-select value.
    pub fn as_option_name(&self) -> Option<&str> {
        match self {
            Self::Option(name) => Some(name.as_str()),
            _ => None,
        }
    }
}

/// One row on the project board.
///
/// Created by enrollment (sweeper or a human adding an item), mutated by the
/// rule engine, never deleted by this engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardItem {
    /// Board item identifier (distinct from the content's [`WorkItemId`]).
    pub id: BoardItemId,
    /// Attached work item. `None` when the content was deleted; such items
    /// are skipped, not treated as an error.
    pub content: Option<WorkItem>,
    /// Last time the board item was updated.
    pub updated_at: Timestamp,
    /// Current field values, keyed by field name. At most one value per field.
    pub values: BTreeMap<String, FieldValue>,
}

impl BoardItem {
    /// Returns the selected option name of a single-select field, if set.
    pub fn select_value(&self, field_name: &str) -> Option<&str> {
        self.values.get(field_name).and_then(FieldValue::as_option_name)
    }
}

// ---------------------------------------------------------------------------
// Fields
// ---------------------------------------------------------------------------

/// Data type of a board field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldDataType {
    /// Free-form text.
    Text,
    /// Calendar date.
    Date,
    /// One of an ordered set of named options.
    SingleSelect,
}

/// One option of a single-select field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldOption {
    /// Option identifier, used in field mutations.
    pub id: OptionId,
    /// Option display name (administrators may decorate these, e.g.
    /// `"P0 - Critical"`).
    pub name: String,
}

/// A field defined on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Field identifier, used in field mutations.
    pub id: FieldId,
    /// Field display name (e.g. `"Status"`).
    pub name: String,
    /// Data type of the field's values.
    pub data_type: FieldDataType,
    /// Options, in board order. Empty unless `data_type` is
    /// [`FieldDataType::SingleSelect`].
    pub options: Vec<FieldOption>,
}

impl Field {
    /// Finds the first option whose name *contains* `target`.
    ///
    /// Substring containment (rather than equality) tolerates administrators
    /// renaming options with decorative suffixes: target `"P0"` matches an
    /// option named `"P0 - Critical"`.
    pub fn option_matching(&self, target: &str) -> Option<&FieldOption> {
        self.options.iter().find(|opt| opt.name.contains(target))
    }
}

// ---------------------------------------------------------------------------
// Priority
// ---------------------------------------------------------------------------

/// Priority rank derived from work-item labels.
///
/// Not a stored entity: recomputed on every pass and compared against the
/// board's Priority field by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Priority {
    /// Critical.
    P0,
    /// High.
    P1,
    /// Normal.
    P2,
    /// Low.
    P3,
}

impl Priority {
    /// The token looked up in the board's Priority options (`"P0"`..`"P3"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::P0 => "P0",
            Self::P1 => "P1",
            Self::P2 => "P2",
            Self::P3 => "P3",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_and_merged_count_as_closed() {
        assert!(!WorkItemState::Open.is_closed());
        assert!(WorkItemState::Closed.is_closed());
        assert!(WorkItemState::Merged.is_closed());
    }

    #[test]
    fn label_containment_is_case_insensitive() {
        let item = WorkItem {
            id: WorkItemId::new("I_1").unwrap(),
            kind: WorkItemKind::Issue,
            repo: RepoRef {
                org: crate::OrgName::new("atnplex").unwrap(),
                name: crate::RepoName::new("core").unwrap(),
            },
            number: 7,
            title: "t".into(),
            state: WorkItemState::Open,
            author: None,
            labels: vec!["Critical-Path".into()],
            assignee_count: 0,
            updated_at: Timestamp::now(),
        };
        assert!(item.has_label_containing("critical"));
        assert!(!item.has_label("critical"));
    }

    #[test]
    fn option_matching_uses_substring_containment() {
        let field = Field {
            id: FieldId::new("F1").unwrap(),
            name: "Priority".into(),
            data_type: FieldDataType::SingleSelect,
            options: vec![
                FieldOption {
                    id: OptionId::new("o1").unwrap(),
                    name: "P0 - Critical".into(),
                },
                FieldOption {
                    id: OptionId::new("o2").unwrap(),
                    name: "P1 - High".into(),
                },
            ],
        };
        assert_eq!(field.option_matching("P1").unwrap().id.as_str(), "o2");
        assert!(field.option_matching("P4").is_none());
    }

    #[test]
    fn rfc3339_parse_accepts_zulu_suffix() {
        let ts = Timestamp::parse_rfc3339("2026-01-15T10:30:00Z").unwrap();
        assert_eq!(ts.as_datetime().timezone(), Utc);
        assert!(Timestamp::parse_rfc3339("not a date").is_none());
    }
}
