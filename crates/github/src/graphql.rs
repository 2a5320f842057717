//! GraphQL documents sent to the GitHub v4 API.
//!
//! All list surfaces page with `pageInfo { hasNextPage endCursor }` until
//! exhausted; the `$cursor` variable is `null` on the first request.

/// Resolves a project by organization login and number, returning its node id
/// and one page of field definitions (with options for single-selects).
pub const PROJECT_FIELDS: &str = r"
query($org: String!, $number: Int!, $cursor: String) {
  organization(login: $org) {
    projectV2(number: $number) {
      id
      fields(first: 100, after: $cursor) {
        nodes {
          ... on ProjectV2Field { id, name, dataType }
          ... on ProjectV2SingleSelectField {
            id, name, dataType
            options { id, name }
          }
        }
        pageInfo { hasNextPage, endCursor }
      }
    }
  }
}
";

/// One page of board items with content, labels, assignees, and field values.
pub const PROJECT_ITEMS: &str = r"
query($projectId: ID!, $cursor: String) {
  node(id: $projectId) {
    ... on ProjectV2 {
      items(first: 100, after: $cursor) {
        nodes {
          id
          updatedAt
          content {
            __typename
            ... on Issue {
              id
              number
              repository { name, owner { login } }
              title
              state
              updatedAt
              author { login }
              labels(first: 10) { nodes { name } }
              assignees(first: 1) { nodes { login } }
            }
            ... on PullRequest {
              id
              number
              repository { name, owner { login } }
              title
              state
              updatedAt
              author { login }
              labels(first: 10) { nodes { name } }
              assignees(first: 1) { nodes { login } }
            }
          }
          fieldValues(first: 20) {
            nodes {
              ... on ProjectV2ItemFieldSingleSelectValue {
                field { ... on ProjectV2FieldCommon { name } }
                name
              }
              ... on ProjectV2ItemFieldTextValue {
                field { ... on ProjectV2FieldCommon { name } }
                text
              }
              ... on ProjectV2ItemFieldDateValue {
                field { ... on ProjectV2FieldCommon { name } }
                date
              }
            }
          }
        }
        pageInfo { hasNextPage, endCursor }
      }
    }
  }
}
";

/// One page of open issues in a repository.
pub const REPO_OPEN_ISSUES: &str = r"
query($owner: String!, $repo: String!, $cursor: String) {
  repository(owner: $owner, name: $repo) {
    issues(states: OPEN, first: 100, after: $cursor) {
      nodes { id, number, title, updatedAt }
      pageInfo { hasNextPage, endCursor }
    }
  }
}
";

/// One page of open pull requests in a repository.
pub const REPO_OPEN_PULL_REQUESTS: &str = r"
query($owner: String!, $repo: String!, $cursor: String) {
  repository(owner: $owner, name: $repo) {
    pullRequests(states: OPEN, first: 100, after: $cursor) {
      nodes { id, number, title, updatedAt }
      pageInfo { hasNextPage, endCursor }
    }
  }
}
";

/// One page of the organization's repositories.
pub const ORG_REPOSITORIES: &str = r"
query($org: String!, $cursor: String) {
  organization(login: $org) {
    repositories(first: 100, after: $cursor) {
      nodes { name }
      pageInfo { hasNextPage, endCursor }
    }
  }
}
";

/// Selects a single-select option on one board item field.
pub const UPDATE_FIELD_VALUE: &str = r"
mutation($projectId: ID!, $itemId: ID!, $fieldId: ID!, $optionId: String!) {
  updateProjectV2ItemFieldValue(
    input: {
      projectId: $projectId, itemId: $itemId, fieldId: $fieldId, value: { singleSelectOptionId: $optionId }
    }
  ) { projectV2Item { id } }
}
";

/// Adds a work item to the board by content id. A no-op when the item is
/// already enrolled.
pub const ADD_ITEM: &str = r"
mutation($projectId: ID!, $contentId: ID!) {
  addProjectV2ItemById(input: {projectId: $projectId, contentId: $contentId}) {
    item { id }
  }
}
";
