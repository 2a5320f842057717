//! Newtype domain identifiers.
//!
//! Every domain concept that has an identity is represented as a distinct
//! newtype wrapping a primitive. This prevents accidentally interchanging —
//! for example — a [`WorkItemId`] with a [`BoardItemId`] even though both are
//! opaque tracker node identifiers under the hood.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Identifiers — tracker-assigned opaque node ids
// ---------------------------------------------------------------------------

string_id! {
    /// Identifies a work item (issue or change request) by its tracker node id.
    ///
    /// This is the *content* identifier: the same value appears both on a
    /// board item's attached content and in the org-wide open-item inventory,
    /// and is the key the sweeper's set difference is computed over.
    WorkItemId
}

string_id! {
    /// Identifies one row on the project board.
    ///
    /// Distinct from the [`WorkItemId`] of the content it wraps; field value
    /// mutations address the board item, not the work item.
    BoardItemId
}

string_id! {
    /// Identifies the project board itself.
    BoardId
}

string_id! {
    /// Identifies a field defined on the board (e.g. "Status").
    FieldId
}

string_id! {
    /// Identifies one option of a single-select field (e.g. the "Done" option).
    OptionId
}

// ---------------------------------------------------------------------------
// Identifiers — configuration / org names
// ---------------------------------------------------------------------------

string_id! {
    /// A tracker organization login (e.g. `"atnplex"`).
    OrgName
}

string_id! {
    /// A repository name within an organization (without the owner prefix).
    RepoName
}

/// The human-visible board number within an organization (e.g. project 4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoardNumber(u64);

impl BoardNumber {
    /// Creates a board number from a raw integer.
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the underlying integer value.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for BoardNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Identifiers — internally generated
// ---------------------------------------------------------------------------

/// Identifies a single reconciliation pass (one invocation of the engine).
///
/// Generated fresh for every run; propagated through spans so all activity
/// from a single pass can be correlated in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PassId(Uuid);

impl PassId {
    /// Generates a new random pass identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a [`PassId`] from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Returns the underlying [`Uuid`].
    pub fn as_uuid(self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for PassId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Compound references
// ---------------------------------------------------------------------------

/// Addresses one board within an organization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoardRef {
    /// Owning organization.
    pub org: OrgName,
    /// Board number within the organization.
    pub number: BoardNumber,
}

impl std::fmt::Display for BoardRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/projects/{}", self.org, self.number)
    }
}

/// Addresses one repository within an organization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoRef {
    /// Owning organization.
    pub org: OrgName,
    /// Repository name.
    pub name: RepoName,
}

impl std::fmt::Display for RepoRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.org, self.name)
    }
}
