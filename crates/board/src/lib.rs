//! Board reconciliation domain for the Gardener.
//!
//! This crate contains every domain concept, newtype identifier, shared value
//! type, the field catalog, the rule engine, and the tracker port trait used
//! throughout the workspace. Infrastructure crates implement the traits
//! defined here; they never add domain rules.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! It defines *what* is needed; infrastructure crates define *how* to supply
//! it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype domain identifiers (`WorkItemId`, `FieldId`, etc.) |
//! | [`types`] | Shared value types (`WorkItem`, `BoardItem`, `FieldValue`, etc.) |
//! | [`errors`] | Tracker error and retry-policy types |
//! | [`config`] | The immutable engine configuration |
//! | [`catalog`] | Per-pass field name → field/option index |
//! | [`rules`] | The pure rule engine (`decide`) |
//! | [`ports`] | The `TrackerClient` port trait |

pub mod catalog;
pub mod config;
pub mod errors;
pub mod identifiers;
pub mod ports;
pub mod rules;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use catalog::FieldCatalog;
pub use config::EngineConfig;
pub use errors::{RetryPolicy, TrackerError};
pub use identifiers::{
    BoardId, BoardItemId, BoardNumber, BoardRef, FieldId, OptionId, OrgName, PassId, RepoName,
    RepoRef, WorkItemId,
};
pub use ports::TrackerClient;
pub use rules::{decide, Advisory, AgentDispatch, Decision, FieldMutation};
pub use types::{
    BoardItem, Field, FieldDataType, FieldOption, FieldValue, Priority, Timestamp, WorkItem,
    WorkItemKind, WorkItemState,
};
