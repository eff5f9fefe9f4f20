//! GitHub adapter
//!
//! Reqwest-backed `IssueClient` implementation. Reads go through the
//! GraphQL API so the ProjectV2 status field is visible alongside state and
//! labels; issue creation uses the REST API. Works against github.com and
//! GitHub Enterprise hosts.

use crate::config::GitHubConfig;
use crate::github::client::{IssueClient, NewIssue};
use crate::github::retry::{with_retry, RetryConfig};
use crate::model::{ExternalIssue, ExternalIssueRef, IssueState};
use crate::{MirrorSyncError, Result};
use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// Per-request timeout for GraphQL queries (can return large result sets)
const GRAPHQL_TIMEOUT: Duration = Duration::from_secs(30);
/// Per-request timeout for create operations
const WRITE_TIMEOUT: Duration = Duration::from_secs(15);

/// GitHub API client
pub struct GitHubAdapter {
    client: Client,
    rest_base_url: String,
    graphql_url: String,
    auth_token: Option<String>,
    status_field: String,
    retry: RetryConfig,
}

/// GraphQL response wrapper
#[derive(Debug, Deserialize)]
struct GraphQLResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQLError>>,
}

#[derive(Debug, Deserialize)]
struct GraphQLError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct SingleIssueData {
    repository: Option<RepositoryData>,
}

#[derive(Debug, Deserialize)]
struct RepositoryData {
    issue: Option<IssueNode>,
}

#[derive(Debug, Deserialize)]
struct SearchData {
    search: SearchConnection,
}

#[derive(Debug, Deserialize)]
struct SearchConnection {
    #[serde(rename = "issueCount")]
    issue_count: u32,
    edges: Vec<SearchEdge>,
}

/// Nodes arrive untyped: the `... on Issue` fragment leaves anything else
/// as an empty object, which is skipped rather than failing the page.
#[derive(Debug, Deserialize)]
struct SearchEdge {
    node: serde_json::Value,
}

/// Issue node from GraphQL
#[derive(Debug, Deserialize)]
struct IssueNode {
    number: u64,
    title: String,
    body: Option<String>,
    state: String,
    url: String,
    #[serde(rename = "updatedAt")]
    updated_at: String,
    #[serde(rename = "closedAt")]
    closed_at: Option<String>,
    labels: LabelsConnection,
    #[serde(rename = "projectItems", default)]
    project_items: ProjectItemsConnection,
    repository: RepositoryRefNode,
}

#[derive(Debug, Deserialize)]
struct LabelsConnection {
    nodes: Vec<LabelNode>,
}

#[derive(Debug, Deserialize)]
struct LabelNode {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct ProjectItemsConnection {
    #[serde(default)]
    nodes: Vec<ProjectItemNode>,
}

#[derive(Debug, Deserialize)]
struct ProjectItemNode {
    #[serde(rename = "fieldValueByName", default)]
    field_value_by_name: Option<FieldValueNode>,
}

/// The single-select fragment may not match, leaving an empty object
#[derive(Debug, Deserialize)]
struct FieldValueNode {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RepositoryRefNode {
    #[serde(rename = "nameWithOwner")]
    name_with_owner: String,
}

/// REST issue shape returned by creation
#[derive(Debug, Deserialize)]
struct RestIssue {
    number: u64,
    title: String,
    body: Option<String>,
    state: String,
    #[serde(default)]
    labels: Vec<RestLabel>,
    html_url: String,
    updated_at: String,
    #[serde(default)]
    closed_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RestLabel {
    name: String,
}

#[derive(Debug, Serialize)]
struct CreateIssueRequest<'a> {
    title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    labels: Vec<String>,
}

const SINGLE_ISSUE_QUERY: &str = r#"
    query($owner: String!, $name: String!, $number: Int!, $field: String!) {
        repository(owner: $owner, name: $name) {
            issue(number: $number) {
                number
                title
                body
                state
                url
                updatedAt
                closedAt
                labels(first: 50) {
                    nodes { name }
                }
                projectItems(first: 5) {
                    nodes {
                        fieldValueByName(name: $field) {
                            ... on ProjectV2ItemFieldSingleSelectValue { name }
                        }
                    }
                }
                repository { nameWithOwner }
            }
        }
    }
"#;

const SEARCH_QUERY: &str = r#"
    query($query: String!, $first: Int!, $field: String!) {
        search(query: $query, type: ISSUE, first: $first) {
            issueCount
            edges {
                node {
                    ... on Issue {
                        number
                        title
                        body
                        state
                        url
                        updatedAt
                        closedAt
                        labels(first: 50) {
                            nodes { name }
                        }
                        projectItems(first: 5) {
                            nodes {
                                fieldValueByName(name: $field) {
                                    ... on ProjectV2ItemFieldSingleSelectValue { name }
                                }
                            }
                        }
                        repository { nameWithOwner }
                    }
                }
            }
        }
    }
"#;

impl GitHubAdapter {
    /// Create a new GitHub adapter
    ///
    /// The auth token is read from the environment variable named by the
    /// config (`GITHUB_TOKEN` by default). Returns an error if the HTTP
    /// client cannot be created.
    pub fn new(config: &GitHubConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .default_headers({
                let mut headers = header::HeaderMap::new();
                headers.insert(
                    header::USER_AGENT,
                    header::HeaderValue::from_static("mirrorsync/0.4"),
                );
                headers.insert(
                    header::ACCEPT,
                    header::HeaderValue::from_static("application/vnd.github.v3+json"),
                );
                headers
            })
            .build()?;

        let base_url = config.url.trim_end_matches('/');
        let (rest_base_url, graphql_url) = if base_url.contains("github.com") {
            (
                "https://api.github.com".to_string(),
                "https://api.github.com/graphql".to_string(),
            )
        } else {
            (
                format!("{}/api/v3", base_url),
                format!("{}/api/graphql", base_url),
            )
        };

        let auth_token = std::env::var(config.token_env_name()).ok();

        Ok(Self {
            client,
            rest_base_url,
            graphql_url,
            auth_token,
            status_field: config.status_field_name().to_string(),
            retry: RetryConfig::default(),
        })
    }

    /// Set the authentication token explicitly
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Override the retry policy
    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth_token.is_some()
    }

    /// Force an `is:issue` qualifier and a deterministic sort into a
    /// search query, unless the caller already set them
    fn normalize_query(query: &str) -> String {
        let mut normalized = query.trim().to_string();
        if !normalized.contains("is:issue") {
            normalized.push_str(" is:issue");
        }
        if !normalized.contains("sort:") {
            normalized.push_str(" sort:updated-desc");
        }
        normalized
    }

    /// Execute a GraphQL query
    async fn graphql<T: for<'de> Deserialize<'de>>(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<T> {
        let body = serde_json::json!({
            "query": query,
            "variables": variables,
        });

        let mut request = self.client.post(&self.graphql_url).json(&body);
        if let Some(ref token) = self.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request.timeout(GRAPHQL_TIMEOUT).send().await?;

        match response.status() {
            StatusCode::OK => {
                let result: GraphQLResponse<T> = response.json().await?;
                if let Some(errors) = result.errors {
                    let message = errors
                        .iter()
                        .map(|e| e.message.as_str())
                        .collect::<Vec<_>>()
                        .join("; ");
                    return Err(MirrorSyncError::Integration(format!(
                        "GraphQL error: {}",
                        message
                    )));
                }
                result.data.ok_or_else(|| {
                    MirrorSyncError::Integration("No data in GraphQL response".to_string())
                })
            }
            StatusCode::UNAUTHORIZED => Err(MirrorSyncError::Auth(
                "GitHub authentication failed".to_string(),
            )),
            StatusCode::FORBIDDEN => Err(MirrorSyncError::Integration(
                "GitHub API forbidden (rate limit?)".to_string(),
            )),
            status => {
                let error_body = response.text().await.unwrap_or_default();
                Err(MirrorSyncError::Integration(format!(
                    "GitHub API error: HTTP {}: {}",
                    status, error_body
                )))
            }
        }
    }

    async fn get_issue_once(&self, issue_ref: &ExternalIssueRef) -> Result<ExternalIssue> {
        debug!(issue = %issue_ref, "Fetching GitHub issue");

        let variables = serde_json::json!({
            "owner": issue_ref.owner,
            "name": issue_ref.repo,
            "number": issue_ref.number,
            "field": self.status_field,
        });

        let data: SingleIssueData = self.graphql(SINGLE_ISSUE_QUERY, variables).await?;

        let node = data
            .repository
            .and_then(|r| r.issue)
            .ok_or_else(|| MirrorSyncError::IssueNotFound(issue_ref.to_string()))?;

        Ok(issue_from_node(node))
    }

    async fn search_issues_once(&self, query: &str, first: u32) -> Result<Vec<ExternalIssue>> {
        let normalized = Self::normalize_query(query);
        let variables = serde_json::json!({
            "query": normalized,
            "first": first,
            "field": self.status_field,
        });

        debug!(query = %normalized, first = %first, "Searching GitHub issues");

        let data: SearchData = self.graphql(SEARCH_QUERY, variables).await?;

        let mut issues = Vec::new();
        for edge in data.search.edges {
            match serde_json::from_value::<IssueNode>(edge.node) {
                Ok(node) => issues.push(issue_from_node(node)),
                // Non-issue node (empty fragment); skip it
                Err(e) => debug!(error = %e, "Skipping non-issue search node"),
            }
        }

        info!(
            count = data.search.issue_count,
            returned = issues.len(),
            "GitHub search complete"
        );

        Ok(issues)
    }

    async fn create_issue_once(
        &self,
        owner: &str,
        repo: &str,
        issue: &NewIssue,
    ) -> Result<ExternalIssue> {
        let url = format!("{}/repos/{}/{}/issues", self.rest_base_url, owner, repo);

        info!(repo = %repo, title = %issue.title, "Creating GitHub issue");

        let payload = CreateIssueRequest {
            title: &issue.title,
            body: issue.body.as_deref(),
            labels: issue.labels.clone(),
        };

        let mut request = self.client.post(&url).json(&payload);
        if let Some(ref token) = self.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request.timeout(WRITE_TIMEOUT).send().await?;

        match response.status() {
            StatusCode::CREATED => {
                let created: RestIssue = response.json().await?;
                info!(number = created.number, "GitHub issue created");
                Ok(issue_from_rest(created, owner, repo))
            }
            StatusCode::UNAUTHORIZED => Err(MirrorSyncError::Auth(
                "GitHub authentication failed".to_string(),
            )),
            status => {
                let error_body = response.text().await.unwrap_or_default();
                Err(MirrorSyncError::Integration(format!(
                    "GitHub create issue failed: HTTP {}: {}",
                    status, error_body
                )))
            }
        }
    }
}

#[async_trait]
impl IssueClient for GitHubAdapter {
    async fn get_issue(&self, issue_ref: &ExternalIssueRef) -> Result<ExternalIssue> {
        with_retry(&self.retry, "github.get_issue", || {
            self.get_issue_once(issue_ref)
        })
        .await
    }

    async fn search_issues(&self, query: &str, first: u32) -> Result<Vec<ExternalIssue>> {
        with_retry(&self.retry, "github.search_issues", || {
            self.search_issues_once(query, first)
        })
        .await
    }

    async fn create_issue(
        &self,
        owner: &str,
        repo: &str,
        issue: NewIssue,
    ) -> Result<ExternalIssue> {
        with_retry(&self.retry, "github.create_issue", || {
            self.create_issue_once(owner, repo, &issue)
        })
        .await
    }
}

/// Convert a GraphQL issue node into the engine's issue shape
fn issue_from_node(node: IssueNode) -> ExternalIssue {
    let project_status = node
        .project_items
        .nodes
        .iter()
        .filter_map(|item| item.field_value_by_name.as_ref())
        .filter_map(|value| value.name.as_deref())
        .find(|name| !name.trim().is_empty())
        .map(|name| name.to_string());

    ExternalIssue {
        number: node.number,
        repo: node.repository.name_with_owner,
        title: node.title,
        body: node.body,
        state: IssueState::parse(&node.state),
        labels: node.labels.nodes.into_iter().map(|l| l.name).collect(),
        url: node.url,
        updated_at: node.updated_at,
        closed_at: node.closed_at,
        project_status,
    }
}

/// Convert a REST issue into the engine's issue shape
fn issue_from_rest(issue: RestIssue, owner: &str, repo: &str) -> ExternalIssue {
    ExternalIssue {
        number: issue.number,
        repo: format!("{}/{}", owner, repo),
        title: issue.title,
        body: issue.body,
        state: IssueState::parse(&issue.state),
        labels: issue.labels.into_iter().map(|l| l.name).collect(),
        url: issue.html_url,
        updated_at: issue.updated_at,
        closed_at: issue.closed_at,
        project_status: None,
    }
}
