//! Gardener orchestration layer.
//!
//! Sequences calls between the rule engine in the [`board`] crate and the
//! [`board::TrackerClient`] port: the reconcile loop visits every board item
//! and applies the engine's decisions, then the sweeper enrolls open work
//! items that are missing from the board. Contains no domain rules of its
//! own.
//!
//! ## Architectural Layer
//!
//! **Orchestration.** Write sequencing, the dry-run gate, bounded sweep
//! concurrency, and the pass report live here; decisions live in [`board`].

pub mod pass;
pub mod report;

pub use pass::{PassError, Reconciler};
pub use report::{PassReport, StaleItem};
