//! The rule engine: pure decision logic for one board item.
//!
//! [`decide`] inspects one board item together with its attached work item
//! and computes the ordered list of field mutations that bring the item into
//! compliance, plus any advisories and agent dispatches. It performs no I/O
//! and holds no state: given the same snapshot it always produces the same
//! decision, and a decision whose mutations have been applied produces an
//! empty decision on the next pass.
//!
//! Status rules fire in strict precedence order with first-match-wins *per
//! field*: once a status mutation is chosen no later status rule is
//! consulted. Priority is decided independently of status.

use crate::{
    BoardItem, EngineConfig, FieldCatalog, FieldId, OptionId, Priority, Timestamp, WorkItem,
    WorkItemKind, WorkItemState,
};

// ---------------------------------------------------------------------------
// Decision types
// ---------------------------------------------------------------------------

/// One field mutation the reconciler must apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMutation {
    /// Field to mutate.
    pub field_id: FieldId,
    /// Field name, for logging.
    pub field_name: String,
    /// Option to select.
    pub option_id: OptionId,
    /// Option name, for logging.
    pub option_name: String,
}

/// A read-only signal for operator visibility. Never a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advisory {
    /// The item is open, not done, and has not been touched within the
    /// configured threshold.
    Stale {
        /// Whole days since the work item was last updated.
        days_inactive: i64,
    },
}

/// A label swap on the work item that hands it to an automated agent.
///
/// The swap mutates the *work item*, not the board item being reconciled;
/// the agent-assigned progression rule reacts to the new label on the next
/// pass. Dispatch and progression are eventually consistent across two
/// passes, not instantaneous within one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentDispatch {
    /// Label to remove (the pending marker).
    pub remove: String,
    /// Label to add (the assigned marker).
    pub add: String,
}

/// Everything [`decide`] concluded about one board item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Decision {
    /// Field mutations, in application order.
    pub mutations: Vec<FieldMutation>,
    /// Advisories for operator visibility.
    pub advisories: Vec<Advisory>,
    /// Agent dispatch, when the pending label is present.
    pub dispatch: Option<AgentDispatch>,
}

impl Decision {
    /// Returns `true` if the decision requires no action at all.
    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty() && self.advisories.is_empty() && self.dispatch.is_none()
    }
}

// ---------------------------------------------------------------------------
// Decision entry point
// ---------------------------------------------------------------------------

/// Computes the compliance decision for one board item.
///
/// `now` is the evaluation instant; passing it in keeps the function pure and
/// lets tests pin time.
pub fn decide(
    item: &BoardItem,
    work: &WorkItem,
    catalog: &FieldCatalog,
    config: &EngineConfig,
    now: Timestamp,
) -> Decision {
    let mut decision = Decision::default();

    if let Some(mutation) = status_mutation(item, work, catalog, config) {
        decision.mutations.push(mutation);
    }
    if let Some(mutation) = priority_mutation(item, work, catalog, config) {
        decision.mutations.push(mutation);
    }
    if let Some(advisory) = stale_advisory(item, work, config, now) {
        decision.advisories.push(advisory);
    }
    if work.has_label(&config.agent_pending_label) {
        decision.dispatch = Some(AgentDispatch {
            remove: config.agent_pending_label.clone(),
            add: config.agent_assigned_label.clone(),
        });
    }

    decision
}

/// Returns `true` if the current single-select value already satisfies
/// `target`.
///
/// Containment rather than equality, mirroring the catalog's option lookup:
/// a value named `"Done ✅"` satisfies target `"Done"`, so a decorated board
/// never re-fires the same rule every pass.
fn satisfies(current: Option<&str>, target: &str) -> bool {
    current.is_some_and(|value| value.contains(target))
}

/// Builds the mutation selecting `target` on `field_name`, or `None` if the
/// field or option is missing from the board (the rule is skipped, never an
/// error).
fn select(catalog: &FieldCatalog, field_name: &str, target: &str) -> Option<FieldMutation> {
    match catalog.field_option(field_name, target) {
        Some((field, option)) => Some(FieldMutation {
            field_id: field.id.clone(),
            field_name: field.name.clone(),
            option_id: option.id.clone(),
            option_name: option.name.clone(),
        }),
        None => {
            tracing::warn!(field = field_name, option = target, "field or option missing on board; rule skipped");
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Status precedence
// ---------------------------------------------------------------------------

/// Evaluates the status precedence chain; the first rule that matches wins.
fn status_mutation(
    item: &BoardItem,
    work: &WorkItem,
    catalog: &FieldCatalog,
    config: &EngineConfig,
) -> Option<FieldMutation> {
    let current = item.select_value(&config.status_field);

    // 1. Closed sync: closed or merged content must read Done. Overrides
    //    every later rule.
    if work.state.is_closed() {
        if satisfies(current, &config.status_done) {
            return None;
        }
        return select(catalog, &config.status_field, &config.status_done);
    }

    // 2. Agent-assigned progression.
    if work.has_label(&config.agent_assigned_label) && !satisfies(current, &config.status_in_progress) {
        if let Some(m) = select(catalog, &config.status_field, &config.status_in_progress) {
            return Some(m);
        }
    }

    // 3. An open change request is being worked by definition.
    if work.kind == WorkItemKind::ChangeRequest && !satisfies(current, &config.status_in_progress) {
        if let Some(m) = select(catalog, &config.status_field, &config.status_in_progress) {
            return Some(m);
        }
    }

    // 4. An assigned issue progresses out of triage, but never backwards
    //    from a later column.
    if work.kind == WorkItemKind::Issue
        && work.assignee_count > 0
        && (current.is_none() || satisfies(current, &config.status_todo))
    {
        if let Some(m) = select(catalog, &config.status_field, &config.status_in_progress) {
            return Some(m);
        }
    }

    // 5. Default triage: anything still unstatused lands in Todo.
    if current.is_none() {
        return select(catalog, &config.status_field, &config.status_todo);
    }

    None
}

// ---------------------------------------------------------------------------
// Priority
// ---------------------------------------------------------------------------

/// Decides the priority mutation, independent of status.
///
/// Forced priorities (critical/high markers) correct drift and overwrite any
/// existing value; derived priorities only fill gaps and never fight a
/// human's manual downgrade.
fn priority_mutation(
    item: &BoardItem,
    work: &WorkItem,
    catalog: &FieldCatalog,
    config: &EngineConfig,
) -> Option<FieldMutation> {
    let current = item.select_value(&config.priority_field);

    let (target, forced) = if work.has_label_containing("critical") || work.has_label_containing("p0") {
        (Priority::P0, true)
    } else if work.has_label_containing("high") || work.has_label_containing("p1") {
        (Priority::P1, true)
    } else if current.is_none() && work.state == WorkItemState::Open {
        (config.derived_priority(&work.labels), false)
    } else {
        return None;
    };

    let apply = if forced {
        !satisfies(current, target.as_str())
    } else {
        current.is_none()
    };
    if !apply {
        return None;
    }

    select(catalog, &config.priority_field, target.as_str())
}

// ---------------------------------------------------------------------------
// Staleness
// ---------------------------------------------------------------------------

/// Emits the staleness advisory for open, not-done items idle past the
/// threshold. Read-only: never produces a mutation.
fn stale_advisory(
    item: &BoardItem,
    work: &WorkItem,
    config: &EngineConfig,
    now: Timestamp,
) -> Option<Advisory> {
    if work.state != WorkItemState::Open {
        return None;
    }
    if satisfies(item.select_value(&config.status_field), &config.status_done) {
        return None;
    }
    let days_inactive = work.updated_at.days_until(now);
    if days_inactive > config.stale_after_days {
        Some(Advisory::Stale { days_inactive })
    } else {
        None
    }
}

// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::{Duration, Utc};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        BoardItemId, Field, FieldDataType, FieldOption, FieldValue, OrgName, RepoName, RepoRef,
        WorkItemId,
    };

    fn select_field(id: &str, name: &str, options: &[(&str, &str)]) -> Field {
        Field {
            id: FieldId::new(id).unwrap(),
            name: name.to_string(),
            data_type: FieldDataType::SingleSelect,
            options: options
                .iter()
                .map(|(id, name)| FieldOption {
                    id: OptionId::new(*id).unwrap(),
                    name: (*name).to_string(),
                })
                .collect(),
        }
    }

    fn catalog() -> FieldCatalog {
        FieldCatalog::new(vec![
            select_field(
                "F-status",
                "Status",
                &[("todo", "Todo"), ("wip", "In Progress"), ("done", "Done")],
            ),
            select_field(
                "F-priority",
                "Priority",
                &[
                    ("p0", "P0 - Critical"),
                    ("p1", "P1 - High"),
                    ("p2", "P2"),
                    ("p3", "P3 - Low"),
                ],
            ),
        ])
    }

    fn work_item(kind: WorkItemKind, state: WorkItemState, labels: &[&str]) -> WorkItem {
        WorkItem {
            id: WorkItemId::new("I_work").unwrap(),
            kind,
            repo: RepoRef {
                org: OrgName::new("atnplex").unwrap(),
                name: RepoName::new("core").unwrap(),
            },
            number: 12,
            title: "example".into(),
            state,
            author: Some("octocat".into()),
            labels: labels.iter().map(|l| l.to_string()).collect(),
            assignee_count: 0,
            updated_at: Timestamp::now(),
        }
    }

    fn board_item(values: &[(&str, &str)]) -> BoardItem {
        BoardItem {
            id: BoardItemId::new("B_item").unwrap(),
            content: None,
            updated_at: Timestamp::now(),
            values: values
                .iter()
                .map(|(field, option)| ((*field).to_string(), FieldValue::Option((*option).to_string())))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    fn decide_now(item: &BoardItem, work: &WorkItem) -> Decision {
        decide(item, work, &catalog(), &EngineConfig::default(), Timestamp::now())
    }

    fn option_ids(decision: &Decision) -> Vec<&str> {
        decision.mutations.iter().map(|m| m.option_id.as_str()).collect()
    }

    #[test]
    fn closed_sync_wins_over_agent_progression() {
        // Rule 1 over rule 2: a closed item with the agent label gets exactly
        // one mutation, Status=Done.
        let work = work_item(WorkItemKind::Issue, WorkItemState::Closed, &["ai-assigned"]);
        let item = board_item(&[]);
        let decision = decide_now(&item, &work);
        assert_eq!(option_ids(&decision), vec!["done"]);
    }

    #[test]
    fn merged_change_request_goes_done() {
        let work = work_item(WorkItemKind::ChangeRequest, WorkItemState::Merged, &[]);
        let item = board_item(&[("Status", "In Progress")]);
        let decision = decide_now(&item, &work);
        assert_eq!(option_ids(&decision), vec!["done"]);
    }

    #[test]
    fn agent_label_progresses_open_item() {
        let work = work_item(WorkItemKind::Issue, WorkItemState::Open, &["ai-assigned"]);
        let item = board_item(&[("Status", "Todo"), ("Priority", "P2")]);
        let decision = decide_now(&item, &work);
        assert_eq!(option_ids(&decision), vec!["wip"]);
    }

    #[test]
    fn open_change_request_progresses() {
        let work = work_item(WorkItemKind::ChangeRequest, WorkItemState::Open, &[]);
        let item = board_item(&[("Status", "Todo"), ("Priority", "P2")]);
        let decision = decide_now(&item, &work);
        assert_eq!(option_ids(&decision), vec!["wip"]);
    }

    #[test]
    fn assigned_issue_leaves_triage_but_never_regresses() {
        let mut work = work_item(WorkItemKind::Issue, WorkItemState::Open, &[]);
        work.assignee_count = 1;

        let todo = board_item(&[("Status", "Todo"), ("Priority", "P2")]);
        assert_eq!(option_ids(&decide_now(&todo, &work)), vec!["wip"]);

        // An assigned issue a human moved past In Progress stays put.
        let done = board_item(&[("Status", "Done"), ("Priority", "P2")]);
        assert!(decide_now(&done, &work).mutations.is_empty());
    }

    #[test]
    fn unstatused_open_item_lands_in_todo() {
        let work = work_item(WorkItemKind::Issue, WorkItemState::Open, &["chore"]);
        let item = board_item(&[("Priority", "P2")]);
        let decision = decide_now(&item, &work);
        assert_eq!(option_ids(&decision), vec!["todo"]);
    }

    #[test]
    fn forced_priority_overrides_existing_value() {
        let work = work_item(WorkItemKind::Issue, WorkItemState::Open, &["p0-urgent"]);
        let item = board_item(&[("Status", "Todo"), ("Priority", "P2")]);
        let decision = decide_now(&item, &work);
        assert_eq!(option_ids(&decision), vec!["p0"]);
    }

    #[test]
    fn derived_priority_never_overrides() {
        let work = work_item(WorkItemKind::Issue, WorkItemState::Open, &["enhancement"]);
        let item = board_item(&[("Status", "Todo"), ("Priority", "P1 - High")]);
        let decision = decide_now(&item, &work);
        assert!(decision.mutations.is_empty());
    }

    #[test]
    fn unmatched_labels_derive_the_default_priority() {
        let work = work_item(WorkItemKind::Issue, WorkItemState::Open, &["chore"]);
        let item = board_item(&[("Status", "Todo")]);
        let decision = decide_now(&item, &work);
        assert_eq!(option_ids(&decision), vec!["p2"]);
    }

    #[test]
    fn closed_item_without_priority_derives_none() {
        // The derived branch requires an open item; closed items only get the
        // status sync.
        let work = work_item(WorkItemKind::Issue, WorkItemState::Closed, &["enhancement"]);
        let item = board_item(&[("Status", "Done")]);
        let decision = decide_now(&item, &work);
        assert!(decision.mutations.is_empty());
    }

    #[test]
    fn decorated_option_names_do_not_refire_forced_priority() {
        let work = work_item(WorkItemKind::Issue, WorkItemState::Open, &["critical"]);
        let item = board_item(&[("Status", "Todo"), ("Priority", "P0 - Critical")]);
        let decision = decide_now(&item, &work);
        assert!(decision.mutations.is_empty());
    }

    #[test]
    fn staleness_is_advisory_only() {
        let mut work = work_item(WorkItemKind::Issue, WorkItemState::Open, &["chore"]);
        work.updated_at = Timestamp::from_utc(Utc::now() - Duration::days(45));
        let item = board_item(&[("Status", "Todo"), ("Priority", "P2")]);
        let decision = decide_now(&item, &work);
        assert!(decision.mutations.is_empty());
        assert_eq!(decision.advisories, vec![Advisory::Stale { days_inactive: 45 }]);
    }

    #[test]
    fn fresh_or_closed_items_are_never_stale() {
        let mut closed = work_item(WorkItemKind::Issue, WorkItemState::Closed, &[]);
        closed.updated_at = Timestamp::from_utc(Utc::now() - Duration::days(400));
        let item = board_item(&[("Status", "Done")]);
        assert!(decide_now(&item, &closed).advisories.is_empty());

        let fresh = work_item(WorkItemKind::Issue, WorkItemState::Open, &[]);
        let item = board_item(&[("Status", "Todo"), ("Priority", "P2")]);
        assert!(decide_now(&item, &fresh).advisories.is_empty());
    }

    #[test]
    fn pending_label_emits_dispatch() {
        let work = work_item(WorkItemKind::Issue, WorkItemState::Open, &["ai-pending"]);
        let item = board_item(&[("Status", "Todo"), ("Priority", "P2")]);
        let decision = decide_now(&item, &work);
        assert_eq!(
            decision.dispatch,
            Some(AgentDispatch {
                remove: "ai-pending".into(),
                add: "ai-assigned".into(),
            })
        );
    }

    #[test]
    fn missing_status_field_skips_status_rules() {
        let catalog = FieldCatalog::new(vec![select_field("F-priority", "Priority", &[("p2", "P2")])]);
        let work = work_item(WorkItemKind::Issue, WorkItemState::Closed, &[]);
        let item = board_item(&[]);
        let decision = decide(&item, &work, &catalog, &EngineConfig::default(), Timestamp::now());
        assert!(decision.mutations.is_empty());
    }

    #[test]
    fn decide_is_idempotent_once_mutations_land() {
        let work = work_item(WorkItemKind::ChangeRequest, WorkItemState::Open, &["bug"]);
        let item = board_item(&[]);

        let first = decide_now(&item, &work);
        assert_eq!(option_ids(&first), vec!["wip", "p1"]);

        // Notionally apply the mutations, then decide again.
        let mut applied = item;
        for mutation in &first.mutations {
            applied
                .values
                .insert(mutation.field_name.clone(), FieldValue::Option(mutation.option_name.clone()));
        }
        let second = decide_now(&applied, &work);
        assert!(second.mutations.is_empty());
    }
}
