//! Wire types for GraphQL responses, decoded once at this boundary.
//!
//! Decoding is deliberately lenient where the domain requires it: a field
//! value whose shape we do not recognise (an iteration value, a draft issue's
//! empty content object, a malformed date) decodes to *no value* instead of
//! failing the pass. Structural problems — a missing `data` envelope, an
//! absent project — are real errors and are reported as such by the client.

use serde::Deserialize;

use board::{
    BoardItem, BoardItemId, Field, FieldDataType, FieldId, FieldOption, FieldValue, OptionId,
    OrgName, RepoName, RepoRef, Timestamp, WorkItem, WorkItemId, WorkItemKind, WorkItemState,
};

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// Top-level GraphQL response envelope.
#[derive(Debug, Deserialize)]
pub struct Envelope {
    /// Query payload; absent when the request failed entirely.
    pub data: Option<serde_json::Value>,
    /// Application-level errors.
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

/// One entry of a GraphQL `errors` array.
#[derive(Debug, Deserialize)]
pub struct GraphQlError {
    /// Human-readable message.
    pub message: String,
}

/// Cursor-pagination marker shared by every list surface.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

/// A page of nodes. GitHub may interleave `null` nodes (deleted entities).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paged<T> {
    pub nodes: Vec<Option<T>>,
    pub page_info: PageInfo,
}

impl<T> Paged<T> {
    /// The present nodes, dropping interleaved nulls.
    pub fn into_nodes(self) -> Vec<T> {
        self.nodes.into_iter().flatten().collect()
    }
}

// ---------------------------------------------------------------------------
// Project fields
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ProjectFieldsData {
    pub organization: Option<ProjectFieldsOrg>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFieldsOrg {
    pub project_v2: Option<ProjectFields>,
}

#[derive(Debug, Deserialize)]
pub struct ProjectFields {
    pub id: String,
    pub fields: Paged<FieldNode>,
}

/// One field definition. Non-select field kinds arrive without options.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldNode {
    pub id: Option<String>,
    pub name: Option<String>,
    pub data_type: Option<String>,
    #[serde(default)]
    pub options: Vec<OptionNode>,
}

#[derive(Debug, Deserialize)]
pub struct OptionNode {
    pub id: String,
    pub name: String,
}

impl FieldNode {
    /// Converts to a domain [`Field`].
    ///
    /// Returns `None` for field kinds the engine does not reconcile
    /// (iteration, number, ...) and for nodes missing an id or name.
    pub fn into_field(self) -> Option<Field> {
        let data_type = match self.data_type.as_deref() {
            Some("TEXT") | Some("TITLE") => FieldDataType::Text,
            Some("DATE") => FieldDataType::Date,
            Some("SINGLE_SELECT") => FieldDataType::SingleSelect,
            _ => return None,
        };
        let id = FieldId::new(self.id?)?;
        let name = self.name?;
        let options = self
            .options
            .into_iter()
            .filter_map(|opt| {
                Some(FieldOption {
                    id: OptionId::new(opt.id)?,
                    name: opt.name,
                })
            })
            .collect();
        Some(Field {
            id,
            name,
            data_type,
            options,
        })
    }
}

// ---------------------------------------------------------------------------
// Project items
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ProjectItemsData {
    pub node: Option<ProjectItemsNode>,
}

#[derive(Debug, Deserialize)]
pub struct ProjectItemsNode {
    pub items: Paged<ItemNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemNode {
    pub id: String,
    pub updated_at: Option<String>,
    pub content: Option<ContentNode>,
    pub field_values: ValueNodes,
}

/// Field values are fetched in one slice, not paginated; the engine touches
/// two fields and boards define far fewer than the slice size.
#[derive(Debug, Deserialize)]
pub struct ValueNodes {
    pub nodes: Vec<Option<FieldValueNode>>,
}

/// A board item's attached content.
///
/// Every field except `__typename` is optional: draft issues (and any future
/// content kind) arrive as an object carrying only the typename and must
/// decode to "no content".
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentNode {
    #[serde(rename = "__typename")]
    pub typename: String,
    pub id: Option<String>,
    pub number: Option<u64>,
    pub repository: Option<RepositoryNode>,
    pub title: Option<String>,
    pub state: Option<String>,
    pub updated_at: Option<String>,
    pub author: Option<AuthorNode>,
    pub labels: Option<NamedNodes>,
    pub assignees: Option<LoginNodes>,
}

#[derive(Debug, Deserialize)]
pub struct RepositoryNode {
    pub name: String,
    pub owner: OwnerNode,
}

#[derive(Debug, Deserialize)]
pub struct OwnerNode {
    pub login: String,
}

#[derive(Debug, Deserialize)]
pub struct AuthorNode {
    pub login: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NamedNodes {
    pub nodes: Vec<Option<NamedNode>>,
}

#[derive(Debug, Deserialize)]
pub struct NamedNode {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginNodes {
    pub nodes: Vec<Option<OwnerNode>>,
}

impl ContentNode {
    /// Converts to a domain [`WorkItem`].
    ///
    /// Returns `None` for draft issues, unknown typenames, and nodes missing
    /// required fields — the reconciler skips such board items.
    pub fn into_work_item(self) -> Option<WorkItem> {
        let kind = match self.typename.as_str() {
            "Issue" => WorkItemKind::Issue,
            "PullRequest" => WorkItemKind::ChangeRequest,
            _ => return None,
        };
        let state = match self.state.as_deref() {
            Some("OPEN") => WorkItemState::Open,
            Some("CLOSED") => WorkItemState::Closed,
            Some("MERGED") => WorkItemState::Merged,
            _ => return None,
        };
        let repository = self.repository?;
        let repo = RepoRef {
            org: OrgName::new(repository.owner.login)?,
            name: RepoName::new(repository.name)?,
        };
        let labels = self
            .labels
            .map(|l| l.nodes.into_iter().flatten().map(|n| n.name).collect())
            .unwrap_or_default();
        let assignee_count = self
            .assignees
            .map(|a| a.nodes.into_iter().flatten().count())
            .unwrap_or(0);
        Some(WorkItem {
            id: WorkItemId::new(self.id?)?,
            kind,
            repo,
            number: self.number?,
            title: self.title.unwrap_or_default(),
            state,
            author: self.author.and_then(|a| a.login),
            labels,
            assignee_count,
            updated_at: parse_timestamp(self.updated_at.as_deref())?,
        })
    }
}

/// One field value of a board item.
///
/// The three recognised shapes each carry the field name plus exactly one of
/// `name` (single-select), `text`, or `date`. Anything else — including the
/// empty objects GraphQL emits for value kinds outside the fragment set —
/// decodes to no value.
#[derive(Debug, Deserialize)]
pub struct FieldValueNode {
    pub field: Option<FieldRefNode>,
    pub name: Option<String>,
    pub text: Option<String>,
    pub date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FieldRefNode {
    pub name: Option<String>,
}

impl FieldValueNode {
    /// Extracts `(field name, value)`, or `None` for unrecognised shapes.
    pub fn into_value(self) -> Option<(String, FieldValue)> {
        let field_name = self.field?.name?;
        let value = if let Some(name) = self.name {
            FieldValue::Option(name)
        } else if let Some(text) = self.text {
            FieldValue::Text(text)
        } else if let Some(date) = self.date {
            FieldValue::Date(parse_timestamp(Some(&date))?)
        } else {
            return None;
        };
        Some((field_name, value))
    }
}

impl ItemNode {
    /// Converts to a domain [`BoardItem`].
    pub fn into_board_item(self) -> Option<BoardItem> {
        let id = BoardItemId::new(self.id)?;
        let updated_at = parse_timestamp(self.updated_at.as_deref())?;
        let content = self.content.and_then(ContentNode::into_work_item);
        let values = self
            .field_values
            .nodes
            .into_iter()
            .flatten()
            .filter_map(FieldValueNode::into_value)
            .collect();
        Some(BoardItem {
            id,
            content,
            updated_at,
            values,
        })
    }
}

// ---------------------------------------------------------------------------
// Repository sweeps
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct RepoIssuesData {
    pub repository: Option<RepoIssues>,
}

#[derive(Debug, Deserialize)]
pub struct RepoIssues {
    pub issues: Paged<SweepNode>,
}

#[derive(Debug, Deserialize)]
pub struct RepoPullRequestsData {
    pub repository: Option<RepoPullRequests>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoPullRequests {
    pub pull_requests: Paged<SweepNode>,
}

/// The slim shape fetched for sweep candidates: enough to compute the set
/// difference and enroll, nothing more.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepNode {
    pub id: String,
    pub number: u64,
    pub title: String,
    pub updated_at: Option<String>,
}

impl SweepNode {
    /// Converts to a [`WorkItem`] known to be open in `repo`.
    ///
    /// Labels and assignees are not fetched for sweep candidates; the sweeper
    /// only needs identity.
    pub fn into_work_item(self, kind: WorkItemKind, repo: &RepoRef) -> Option<WorkItem> {
        Some(WorkItem {
            id: WorkItemId::new(self.id)?,
            kind,
            repo: repo.clone(),
            number: self.number,
            title: self.title,
            state: WorkItemState::Open,
            author: None,
            labels: Vec::new(),
            assignee_count: 0,
            updated_at: parse_timestamp(self.updated_at.as_deref()).unwrap_or_else(Timestamp::now),
        })
    }
}

// ---------------------------------------------------------------------------
// Organization repositories
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct OrgReposData {
    pub organization: Option<OrgRepos>,
}

#[derive(Debug, Deserialize)]
pub struct OrgRepos {
    pub repositories: Paged<NamedNode>,
}

// ---------------------------------------------------------------------------
// Timestamps
// ---------------------------------------------------------------------------

/// Parses the tracker's timestamp formats: RFC 3339 for `updatedAt`, plain
/// `YYYY-MM-DD` for date field values.
fn parse_timestamp(raw: Option<&str>) -> Option<Timestamp> {
    let raw = raw?;
    if let Some(ts) = Timestamp::parse_rfc3339(raw) {
        return Some(ts);
    }
    let date = chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    let midnight = date.and_hms_opt(0, 0, 0)?.and_utc();
    Some(Timestamp::from_utc(midnight))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn field_nodes_convert_and_unknown_kinds_are_dropped() {
        let node: FieldNode = serde_json::from_value(json!({
            "id": "F1",
            "name": "Priority",
            "dataType": "SINGLE_SELECT",
            "options": [{"id": "o1", "name": "P0 - Critical"}]
        }))
        .unwrap();
        let field = node.into_field().unwrap();
        assert_eq!(field.name, "Priority");
        assert_eq!(field.data_type, FieldDataType::SingleSelect);
        assert_eq!(field.options.len(), 1);

        let iteration: FieldNode = serde_json::from_value(json!({
            "id": "F2",
            "name": "Sprint",
            "dataType": "ITERATION"
        }))
        .unwrap();
        assert!(iteration.into_field().is_none());
    }

    #[test]
    fn item_node_decodes_content_and_values() {
        let node: ItemNode = serde_json::from_value(json!({
            "id": "B_1",
            "updatedAt": "2026-08-01T12:00:00Z",
            "content": {
                "__typename": "Issue",
                "id": "I_1",
                "number": 7,
                "repository": {"name": "core", "owner": {"login": "atnplex"}},
                "title": "Fix the flux capacitor",
                "state": "OPEN",
                "updatedAt": "2026-07-30T08:00:00Z",
                "author": {"login": "octocat"},
                "labels": {"nodes": [{"name": "bug"}, null]},
                "assignees": {"nodes": [{"login": "hubot"}]}
            },
            "fieldValues": {
                "nodes": [
                    {"field": {"name": "Status"}, "name": "Todo"},
                    {"field": {"name": "Notes"}, "text": "needs triage"},
                    {"field": {"name": "Due"}, "date": "2026-09-01"},
                    {}
                ]
            }
        }))
        .unwrap();

        let item = node.into_board_item().unwrap();
        let work = item.content.as_ref().unwrap();
        assert_eq!(work.labels, vec!["bug".to_string()]);
        assert_eq!(work.assignee_count, 1);
        assert_eq!(work.state, WorkItemState::Open);
        assert_eq!(item.select_value("Status"), Some("Todo"));
        assert!(matches!(item.values.get("Notes"), Some(FieldValue::Text(t)) if t == "needs triage"));
        assert!(matches!(item.values.get("Due"), Some(FieldValue::Date(_))));
        // The empty object decoded to no value.
        assert_eq!(item.values.len(), 3);
    }

    #[test]
    fn draft_content_decodes_to_no_content() {
        let node: ItemNode = serde_json::from_value(json!({
            "id": "B_2",
            "updatedAt": "2026-08-01T12:00:00Z",
            "content": {"__typename": "DraftIssue"},
            "fieldValues": {"nodes": []}
        }))
        .unwrap();
        let item = node.into_board_item().unwrap();
        assert!(item.content.is_none());
    }

    #[test]
    fn merged_pull_request_state_is_preserved() {
        let content: ContentNode = serde_json::from_value(json!({
            "__typename": "PullRequest",
            "id": "PR_1",
            "number": 12,
            "repository": {"name": "core", "owner": {"login": "atnplex"}},
            "title": "Add widget",
            "state": "MERGED",
            "updatedAt": "2026-08-01T12:00:00Z",
            "author": null,
            "labels": {"nodes": []},
            "assignees": {"nodes": []}
        }))
        .unwrap();
        let work = content.into_work_item().unwrap();
        assert_eq!(work.kind, WorkItemKind::ChangeRequest);
        assert_eq!(work.state, WorkItemState::Merged);
        assert_eq!(work.author, None);
    }

    #[test]
    fn malformed_field_values_decode_to_no_value() {
        let missing_field: FieldValueNode =
            serde_json::from_value(json!({"name": "Todo"})).unwrap();
        assert!(missing_field.into_value().is_none());

        let bad_date: FieldValueNode =
            serde_json::from_value(json!({"field": {"name": "Due"}, "date": "soonish"})).unwrap();
        assert!(bad_date.into_value().is_none());
    }

    #[test]
    fn paged_nodes_drop_nulls_and_carry_the_cursor() {
        let page: Paged<NamedNode> = serde_json::from_value(json!({
            "nodes": [{"name": "core"}, null, {"name": "tools"}],
            "pageInfo": {"hasNextPage": true, "endCursor": "abc"}
        }))
        .unwrap();
        assert!(page.page_info.has_next_page);
        assert_eq!(page.page_info.end_cursor.as_deref(), Some("abc"));
        let names: Vec<String> = page.into_nodes().into_iter().map(|n| n.name).collect();
        assert_eq!(names, vec!["core".to_string(), "tools".to_string()]);
    }

    #[test]
    fn sweep_node_becomes_an_open_work_item() {
        let node: SweepNode = serde_json::from_value(json!({
            "id": "I_9",
            "number": 9,
            "title": "orphan",
            "updatedAt": "2026-08-01T12:00:00Z"
        }))
        .unwrap();
        let repo = RepoRef {
            org: OrgName::new("atnplex").unwrap(),
            name: RepoName::new("core").unwrap(),
        };
        let work = node.into_work_item(WorkItemKind::Issue, &repo).unwrap();
        assert_eq!(work.state, WorkItemState::Open);
        assert_eq!(work.id.as_str(), "I_9");
    }
}
