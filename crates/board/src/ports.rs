//! Port trait for the external tracker.
//!
//! The reconciler consumes the tracker purely through [`TrackerClient`]; the
//! `github` crate supplies the production implementation and tests supply
//! in-memory fakes. All tracker API details (authentication, pagination,
//! rate limiting) live behind this trait — the domain never sees them.
//!
//! Every operation is expected to be idempotent or safely repeatable:
//! [`TrackerClient::enroll_item`] in particular must be a no-op (or safely
//! repeatable) when the work item is already on the board.

use async_trait::async_trait;

use crate::{
    BoardItem, BoardItemId, BoardRef, Field, FieldId, OptionId, RepoRef, TrackerError, WorkItem,
    WorkItemId,
};

/// Read and write access to the tracker, as required by one pass.
#[async_trait]
pub trait TrackerClient: Send + Sync {
    /// Fetches every field defined on the board, including single-select
    /// options. Called once per pass; failure is fatal to the pass.
    async fn fetch_field_catalog(&self, board: &BoardRef) -> Result<Vec<Field>, TrackerError>;

    /// Fetches every item on the board with its content, field values, and
    /// timestamps. Failure is fatal to the pass.
    async fn fetch_board_items(&self, board: &BoardRef) -> Result<Vec<BoardItem>, TrackerError>;

    /// Fetches every open work item (issues and change requests) in one
    /// repository. Failure is item-local: the sweeper skips the repository.
    async fn fetch_open_work_items(&self, repo: &RepoRef) -> Result<Vec<WorkItem>, TrackerError>;

    /// Lists every repository in the organization.
    async fn list_repositories(&self, org: &str) -> Result<Vec<RepoRef>, TrackerError>;

    /// Selects `option` on `field` for one board item. One atomic call; a
    /// failure leaves the previous value intact.
    async fn set_field_value(
        &self,
        board: &BoardRef,
        item: &BoardItemId,
        field: &FieldId,
        option: &OptionId,
    ) -> Result<(), TrackerError>;

    /// Adds a work item to the board. Safe to repeat: the tracker treats an
    /// already-enrolled item as a no-op.
    async fn enroll_item(&self, board: &BoardRef, content: &WorkItemId) -> Result<(), TrackerError>;

    /// Atomically swaps one label for another on a work item.
    async fn swap_label(
        &self,
        repo: &RepoRef,
        number: u64,
        remove: &str,
        add: &str,
    ) -> Result<(), TrackerError>;
}
