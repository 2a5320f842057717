//! Gardener GitHub infrastructure adapter.
//!
//! Implements the [`board::TrackerClient`] port against the GitHub GraphQL v4
//! API (Projects V2 boards) and the REST issues API (label swaps). All
//! GitHub API details — authentication, cursor pagination, rate-limit
//! classification — are handled here; the domain and orchestration crates
//! never see them.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** This crate must not contain domain rules.

mod graphql;
mod wire;

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::json;

use board::{
    BoardItem, BoardItemId, BoardRef, Field, FieldId, OptionId, OrgName, RepoName, RepoRef,
    TrackerClient, TrackerError, WorkItem, WorkItemId, WorkItemKind,
};

use wire::{
    Envelope, ItemNode, OrgReposData, Paged, ProjectFieldsData, ProjectItemsData, RepoIssuesData,
    RepoPullRequestsData, SweepNode,
};

const GRAPHQL_URL: &str = "https://api.github.com/graphql";
const REST_URL: &str = "https://api.github.com";
const USER_AGENT: &str = concat!("gardener/", env!("CARGO_PKG_VERSION"));

/// GitHub-backed [`TrackerClient`].
pub struct GithubTracker {
    http: reqwest::Client,
    graphql_url: String,
    rest_url: String,
    /// Project node ids resolved this run, keyed by `org/number`. Mutations
    /// address the node id; the catalog fetch populates this as a side
    /// effect, so the lookup is normally a cache hit.
    project_ids: Mutex<HashMap<String, String>>,
}

impl GithubTracker {
    /// Creates a client authenticating with `token` (a classic or fine-grained
    /// PAT with project and repo scopes).
    pub fn new(token: &str) -> Result<Self, TrackerError> {
        Self::with_endpoints(token, GRAPHQL_URL, REST_URL)
    }

    /// Creates a client against non-default endpoints (GitHub Enterprise,
    /// test servers).
    pub fn with_endpoints(
        token: &str,
        graphql_url: &str,
        rest_url: &str,
    ) -> Result<Self, TrackerError> {
        let mut headers = reqwest::header::HeaderMap::new();
        let mut auth = reqwest::header::HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| TrackerError::Unauthorized {
                message: "token contains characters invalid in a header".into(),
            })?;
        auth.set_sensitive(true);
        headers.insert(reqwest::header::AUTHORIZATION, auth);

        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| TrackerError::Transport {
                message: e.to_string(),
            })?;
        Ok(Self {
            http,
            graphql_url: graphql_url.to_string(),
            rest_url: rest_url.to_string(),
            project_ids: Mutex::new(HashMap::new()),
        })
    }

    // -- transport -----------------------------------------------------------

    /// Posts one GraphQL document and decodes the `data` payload.
    async fn graphql<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<T, TrackerError> {
        let response = self
            .http
            .post(&self.graphql_url)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await
            .map_err(transport_error)?;
        let response = classify_status(response)?;
        let envelope: Envelope = response.json().await.map_err(|e| TrackerError::Decode {
            message: e.to_string(),
        })?;
        if !envelope.errors.is_empty() {
            let message = envelope
                .errors
                .iter()
                .map(|e| e.message.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(TrackerError::Api { message });
        }
        let data = envelope.data.ok_or_else(|| TrackerError::Decode {
            message: "response carried neither data nor errors".into(),
        })?;
        serde_json::from_value(data).map_err(|e| TrackerError::Decode {
            message: e.to_string(),
        })
    }

    /// Resolves (and caches) the project node id for a board.
    async fn project_id(&self, board: &BoardRef) -> Result<String, TrackerError> {
        let key = board.to_string();
        if let Ok(ids) = self.project_ids.lock() {
            if let Some(id) = ids.get(&key) {
                return Ok(id.clone());
            }
        }
        // Cache miss: the first catalog page carries the id.
        let data: ProjectFieldsData = self
            .graphql(
                graphql::PROJECT_FIELDS,
                json!({ "org": board.org.as_str(), "number": board.number.as_u64(), "cursor": null }),
            )
            .await?;
        let project = data
            .organization
            .and_then(|o| o.project_v2)
            .ok_or_else(|| TrackerError::NotFound {
                what: format!("board {board}"),
            })?;
        if let Ok(mut ids) = self.project_ids.lock() {
            ids.insert(key, project.id.clone());
        }
        Ok(project.id)
    }

    /// Paginates a repository list surface (open issues or open PRs).
    async fn sweep_pages(
        &self,
        query: &str,
        repo: &RepoRef,
        kind: WorkItemKind,
        extract: impl Fn(serde_json::Value) -> Result<Option<Paged<SweepNode>>, TrackerError>,
    ) -> Result<Vec<WorkItem>, TrackerError> {
        let mut items = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let raw: serde_json::Value = self
                .graphql(
                    query,
                    json!({ "owner": repo.org.as_str(), "repo": repo.name.as_str(), "cursor": cursor }),
                )
                .await?;
            let page = extract(raw)?.ok_or_else(|| TrackerError::NotFound {
                what: format!("repository {repo}"),
            })?;
            let page_info = page.page_info.clone();
            items.extend(
                page.into_nodes()
                    .into_iter()
                    .filter_map(|node| node.into_work_item(kind, repo)),
            );
            if !page_info.has_next_page {
                return Ok(items);
            }
            cursor = page_info.end_cursor;
        }
    }
}

// ---------------------------------------------------------------------------
// Error classification
// ---------------------------------------------------------------------------

fn transport_error(e: reqwest::Error) -> TrackerError {
    TrackerError::Transport {
        message: e.to_string(),
    }
}

/// Maps HTTP status codes onto the tracker error taxonomy.
///
/// GitHub signals primary rate limits with 429 and secondary ones with 403
/// plus a `Retry-After` header; both are transient. A bare 403 is an
/// authorization problem.
fn classify_status(response: reqwest::Response) -> Result<reqwest::Response, TrackerError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let retry_after = response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_secs);
    match status.as_u16() {
        429 => Err(TrackerError::RateLimited { retry_after }),
        403 if retry_after.is_some() => Err(TrackerError::RateLimited { retry_after }),
        401 | 403 => Err(TrackerError::Unauthorized {
            message: format!("HTTP {status}"),
        }),
        404 => Err(TrackerError::NotFound {
            what: "requested entity".into(),
        }),
        _ => Err(TrackerError::Api {
            message: format!("HTTP {status}"),
        }),
    }
}

// ---------------------------------------------------------------------------
// Port implementation
// ---------------------------------------------------------------------------

#[async_trait]
impl TrackerClient for GithubTracker {
    async fn fetch_field_catalog(&self, board: &BoardRef) -> Result<Vec<Field>, TrackerError> {
        let mut fields = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let data: ProjectFieldsData = self
                .graphql(
                    graphql::PROJECT_FIELDS,
                    json!({ "org": board.org.as_str(), "number": board.number.as_u64(), "cursor": cursor }),
                )
                .await?;
            let project = data
                .organization
                .and_then(|o| o.project_v2)
                .ok_or_else(|| TrackerError::NotFound {
                    what: format!("board {board}"),
                })?;
            if let Ok(mut ids) = self.project_ids.lock() {
                ids.insert(board.to_string(), project.id.clone());
            }
            let page_info = project.fields.page_info.clone();
            fields.extend(
                project
                    .fields
                    .into_nodes()
                    .into_iter()
                    .filter_map(wire::FieldNode::into_field),
            );
            if !page_info.has_next_page {
                tracing::debug!(board = %board, fields = fields.len(), "field catalog fetched");
                return Ok(fields);
            }
            cursor = page_info.end_cursor;
        }
    }

    async fn fetch_board_items(&self, board: &BoardRef) -> Result<Vec<BoardItem>, TrackerError> {
        let project_id = self.project_id(board).await?;
        let mut items = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let data: ProjectItemsData = self
                .graphql(
                    graphql::PROJECT_ITEMS,
                    json!({ "projectId": project_id, "cursor": cursor }),
                )
                .await?;
            let page = data
                .node
                .ok_or_else(|| TrackerError::NotFound {
                    what: format!("board {board}"),
                })?
                .items;
            let page_info = page.page_info.clone();
            items.extend(
                page.into_nodes()
                    .into_iter()
                    .filter_map(ItemNode::into_board_item),
            );
            if !page_info.has_next_page {
                tracing::debug!(board = %board, items = items.len(), "board items fetched");
                return Ok(items);
            }
            cursor = page_info.end_cursor;
        }
    }

    async fn fetch_open_work_items(&self, repo: &RepoRef) -> Result<Vec<WorkItem>, TrackerError> {
        let mut items = self
            .sweep_pages(
                graphql::REPO_OPEN_ISSUES,
                repo,
                WorkItemKind::Issue,
                |raw| {
                    let data: RepoIssuesData =
                        serde_json::from_value(raw).map_err(decode_error)?;
                    Ok(data.repository.map(|r| r.issues))
                },
            )
            .await?;
        let pulls = self
            .sweep_pages(
                graphql::REPO_OPEN_PULL_REQUESTS,
                repo,
                WorkItemKind::ChangeRequest,
                |raw| {
                    let data: RepoPullRequestsData =
                        serde_json::from_value(raw).map_err(decode_error)?;
                    Ok(data.repository.map(|r| r.pull_requests))
                },
            )
            .await?;
        items.extend(pulls);
        Ok(items)
    }

    async fn list_repositories(&self, org: &str) -> Result<Vec<RepoRef>, TrackerError> {
        let org_name = OrgName::new(org).ok_or_else(|| TrackerError::Api {
            message: "organization name is empty".into(),
        })?;
        let mut repos = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let data: OrgReposData = self
                .graphql(
                    graphql::ORG_REPOSITORIES,
                    json!({ "org": org, "cursor": cursor }),
                )
                .await?;
            let page = data
                .organization
                .ok_or_else(|| TrackerError::NotFound {
                    what: format!("organization {org}"),
                })?
                .repositories;
            let page_info = page.page_info.clone();
            repos.extend(page.into_nodes().into_iter().filter_map(|node| {
                Some(RepoRef {
                    org: org_name.clone(),
                    name: RepoName::new(node.name)?,
                })
            }));
            if !page_info.has_next_page {
                return Ok(repos);
            }
            cursor = page_info.end_cursor;
        }
    }

    async fn set_field_value(
        &self,
        board: &BoardRef,
        item: &BoardItemId,
        field: &FieldId,
        option: &OptionId,
    ) -> Result<(), TrackerError> {
        let project_id = self.project_id(board).await?;
        let _: serde_json::Value = self
            .graphql(
                graphql::UPDATE_FIELD_VALUE,
                json!({
                    "projectId": project_id,
                    "itemId": item.as_str(),
                    "fieldId": field.as_str(),
                    "optionId": option.as_str(),
                }),
            )
            .await?;
        Ok(())
    }

    async fn enroll_item(&self, board: &BoardRef, content: &WorkItemId) -> Result<(), TrackerError> {
        let project_id = self.project_id(board).await?;
        let _: serde_json::Value = self
            .graphql(
                graphql::ADD_ITEM,
                json!({ "projectId": project_id, "contentId": content.as_str() }),
            )
            .await?;
        Ok(())
    }

    async fn swap_label(
        &self,
        repo: &RepoRef,
        number: u64,
        remove: &str,
        add: &str,
    ) -> Result<(), TrackerError> {
        // Remove first; a 404 means the label is already gone (e.g. a rerun
        // after a partial failure) and is not an error.
        let remove_url = format!(
            "{}/repos/{}/{}/issues/{}/labels/{}",
            self.rest_url,
            repo.org,
            repo.name,
            number,
            urlencoding::encode(remove),
        );
        let response = self
            .http
            .delete(&remove_url)
            .send()
            .await
            .map_err(transport_error)?;
        match classify_status(response) {
            Ok(_) | Err(TrackerError::NotFound { .. }) => {}
            Err(e) => return Err(e),
        }

        let add_url = format!(
            "{}/repos/{}/{}/issues/{}/labels",
            self.rest_url, repo.org, repo.name, number,
        );
        let response = self
            .http
            .post(&add_url)
            .json(&json!({ "labels": [add] }))
            .send()
            .await
            .map_err(transport_error)?;
        classify_status(response)?;
        Ok(())
    }
}

fn decode_error(e: serde_json::Error) -> TrackerError {
    TrackerError::Decode {
        message: e.to_string(),
    }
}
