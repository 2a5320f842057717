//! The reconciliation pass: reconcile loop followed by the sweeper.
//!
//! The loop over board items is sequential by design — it serialises writes
//! against the board API and builds the "seen" set the sweeper's correctness
//! depends on. The sweeper's per-repository fetches have no cross-repository
//! dependency and run with bounded concurrency; only the merged union
//! matters, so worker ordering is irrelevant.
//!
//! The engine owns no persisted state: everything is re-derived from the
//! tracker each run, so a pass interrupted or failed anywhere is safely
//! re-runnable from scratch.

use std::collections::HashSet;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::Instrument;

use board::{
    decide, Advisory, AgentDispatch, BoardItem, BoardRef, EngineConfig, FieldCatalog,
    FieldMutation, PassId, RepoRef, Timestamp, TrackerClient, TrackerError, WorkItem, WorkItemId,
};

use crate::report::{PassReport, StaleItem};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Fatal pass failure.
///
/// Anything item-local (one mutation failing, one repository's fetch failing,
/// an item with deleted content) is logged and skipped instead; only the
/// fetches the whole pass depends on abort it. A fatal failure before the
/// loop means nothing was mutated and a rerun is safe; a fatal failure at the
/// sweep stage leaves only idempotent, already-correct mutations behind.
#[derive(Debug, Error)]
pub enum PassError {
    /// The field catalog could not be fetched.
    #[error("failed to fetch field catalog for {board}")]
    Catalog {
        /// Board the fetch addressed.
        board: BoardRef,
        /// Underlying tracker failure.
        #[source]
        source: TrackerError,
    },

    /// The board item list could not be fetched.
    #[error("failed to fetch board items for {board}")]
    BoardItems {
        /// Board the fetch addressed.
        board: BoardRef,
        /// Underlying tracker failure.
        #[source]
        source: TrackerError,
    },

    /// The organization's repository list could not be fetched; the sweeper
    /// cannot compute the orphan set without it.
    #[error("failed to list repositories for organization {org}")]
    Repositories {
        /// Organization the listing addressed.
        org: String,
        /// Underlying tracker failure.
        #[source]
        source: TrackerError,
    },
}

// ---------------------------------------------------------------------------
// Reconciler
// ---------------------------------------------------------------------------

/// Drives one full reconciliation pass over a board.
pub struct Reconciler<C> {
    client: Arc<C>,
    board: BoardRef,
    config: EngineConfig,
}

impl<C: TrackerClient + 'static> Reconciler<C> {
    /// Creates a reconciler for one board. `config` is immutable for the
    /// reconciler's lifetime.
    pub fn new(client: Arc<C>, board: BoardRef, config: EngineConfig) -> Self {
        Self {
            client,
            board,
            config,
        }
    }

    /// Runs one pass: reconcile every board item, then sweep for orphans.
    ///
    /// The loop runs to completion before the sweep starts — the sweep's set
    /// difference needs the complete on-board set.
    pub async fn run(&self) -> Result<PassReport, PassError> {
        let pass_id = PassId::new_random();
        let span = tracing::info_span!(
            "pass",
            %pass_id,
            board = %self.board,
            dry_run = self.config.dry_run,
        );

        async {
            let mut report = PassReport::new(pass_id, self.config.dry_run);

            let fields = self
                .client
                .fetch_field_catalog(&self.board)
                .await
                .map_err(|source| PassError::Catalog {
                    board: self.board.clone(),
                    source,
                })?;
            let catalog = FieldCatalog::new(fields);

            let items = self
                .client
                .fetch_board_items(&self.board)
                .await
                .map_err(|source| PassError::BoardItems {
                    board: self.board.clone(),
                    source,
                })?;
            tracing::info!(count = items.len(), "reconciling board items");

            let mut seen = HashSet::new();
            let now = Timestamp::now();
            for item in &items {
                self.reconcile_item(item, &catalog, now, &mut seen, &mut report)
                    .await;
            }

            self.sweep(&seen, &mut report).await?;

            tracing::info!(
                mutations = report.mutations_applied,
                orphans = report.orphans_enrolled,
                stale = report.stale_items.len(),
                "pass complete"
            );
            Ok(report)
        }
        .instrument(span)
        .await
    }

    /// Reconciles one board item. Never fails the pass: every tracker error
    /// here is item-local.
    async fn reconcile_item(
        &self,
        item: &BoardItem,
        catalog: &FieldCatalog,
        now: Timestamp,
        seen: &mut HashSet<WorkItemId>,
        report: &mut PassReport,
    ) {
        let Some(work) = &item.content else {
            tracing::debug!(board_item = %item.id, "content deleted; skipping");
            report.items_without_content += 1;
            return;
        };
        seen.insert(work.id.clone());
        report.items_visited += 1;

        let decision = decide(item, work, catalog, &self.config, now);
        if decision.is_empty() {
            return;
        }

        for mutation in &decision.mutations {
            report.mutations_planned += 1;
            match self.apply_mutation(item, work, mutation).await {
                Ok(true) => report.mutations_applied += 1,
                Ok(false) => {}
                Err(error) => {
                    tracing::warn!(
                        board_item = %item.id,
                        field = %mutation.field_name,
                        %error,
                        "field mutation failed; continuing"
                    );
                    report.mutations_failed += 1;
                }
            }
        }

        for advisory in &decision.advisories {
            match advisory {
                Advisory::Stale { days_inactive } => {
                    tracing::warn!(
                        repo = %work.repo,
                        number = work.number,
                        title = %work.title,
                        days_inactive,
                        "stale item; review required"
                    );
                    report.stale_items.push(StaleItem {
                        repo: work.repo.to_string(),
                        number: work.number,
                        title: work.title.clone(),
                        days_inactive: *days_inactive,
                    });
                }
            }
        }

        if let Some(dispatch) = &decision.dispatch {
            match self.apply_dispatch(work, dispatch).await {
                Ok(_) => report.dispatches += 1,
                Err(error) => {
                    tracing::warn!(
                        repo = %work.repo,
                        number = work.number,
                        %error,
                        "agent dispatch failed; continuing"
                    );
                    report.dispatches_failed += 1;
                }
            }
        }
    }

    /// Writes one field mutation. Returns `Ok(false)` when dry-run skipped it.
    async fn apply_mutation(
        &self,
        item: &BoardItem,
        work: &WorkItem,
        mutation: &FieldMutation,
    ) -> Result<bool, TrackerError> {
        tracing::info!(
            repo = %work.repo,
            number = work.number,
            field = %mutation.field_name,
            value = %mutation.option_name,
            "setting field"
        );
        if self.config.dry_run {
            tracing::info!("dry-run: mutation skipped");
            return Ok(false);
        }
        self.client
            .set_field_value(&self.board, &item.id, &mutation.field_id, &mutation.option_id)
            .await?;
        Ok(true)
    }

    /// Swaps the pending label for the assigned one on the work item.
    ///
    /// The progression rule reacts to the new label on the *next* pass;
    /// dispatch and progression converge across two passes.
    async fn apply_dispatch(
        &self,
        work: &WorkItem,
        dispatch: &AgentDispatch,
    ) -> Result<(), TrackerError> {
        tracing::info!(
            repo = %work.repo,
            number = work.number,
            remove = %dispatch.remove,
            add = %dispatch.add,
            "dispatching agent"
        );
        if self.config.dry_run {
            tracing::info!("dry-run: label swap skipped");
            return Ok(());
        }
        self.client
            .swap_label(&work.repo, work.number, &dispatch.remove, &dispatch.add)
            .await
    }

    /// Finds open work items missing from the board and enrolls them.
    async fn sweep(
        &self,
        seen: &HashSet<WorkItemId>,
        report: &mut PassReport,
    ) -> Result<(), PassError> {
        let org = self.board.org.as_str();
        let repos = self
            .client
            .list_repositories(org)
            .await
            .map_err(|source| PassError::Repositories {
                org: org.to_string(),
                source,
            })?;
        tracing::info!(repos = repos.len(), "sweeping for orphans");

        let candidates = self.fetch_candidates(repos, report).await;

        for work in candidates {
            if seen.contains(&work.id) {
                continue;
            }
            tracing::info!(
                repo = %work.repo,
                number = work.number,
                title = %work.title,
                "orphan found; enrolling"
            );
            if self.config.dry_run {
                tracing::info!("dry-run: enrollment skipped");
                report.orphans_enrolled += 1;
                continue;
            }
            match self.client.enroll_item(&self.board, &work.id).await {
                Ok(()) => report.orphans_enrolled += 1,
                Err(error) => {
                    tracing::warn!(repo = %work.repo, number = work.number, %error, "enrollment failed; continuing");
                    report.enrollments_failed += 1;
                }
            }
        }
        Ok(())
    }

    /// Fetches open work items for every repository with bounded concurrency.
    ///
    /// A failing repository is logged and skipped; ordering across workers is
    /// irrelevant because only the merged union feeds the set difference.
    async fn fetch_candidates(&self, repos: Vec<RepoRef>, report: &mut PassReport) -> Vec<WorkItem> {
        let limit = self.config.sweep_concurrency.max(1);
        let semaphore = Arc::new(Semaphore::new(limit));
        let mut workers: JoinSet<(RepoRef, Result<Vec<WorkItem>, TrackerError>)> = JoinSet::new();

        for repo in repos {
            let client = Arc::clone(&self.client);
            let semaphore = Arc::clone(&semaphore);
            workers.spawn(
                async move {
                    // The semaphore is never closed, so acquisition only fails
                    // if the runtime is shutting down.
                    let _permit = semaphore.acquire_owned().await.ok();
                    let result = client.fetch_open_work_items(&repo).await;
                    (repo, result)
                }
                .in_current_span(),
            );
        }

        let mut candidates = Vec::new();
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok((_, Ok(items))) => candidates.extend(items),
                Ok((repo, Err(error))) => {
                    tracing::warn!(%repo, %error, "repository fetch failed; skipping");
                    report.repos_failed += 1;
                }
                Err(error) => {
                    tracing::warn!(%error, "sweep worker aborted; skipping");
                    report.repos_failed += 1;
                }
            }
        }
        candidates
    }
}
