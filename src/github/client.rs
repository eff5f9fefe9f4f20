//! Issue client seam
//!
//! The engine's view of the external tracker. Implementations own auth,
//! transport, and retry; the engine only sees typed issues and typed errors.

use crate::model::{ExternalIssue, ExternalIssueRef};
use crate::Result;
use async_trait::async_trait;

/// Request payload for creating a new external issue
#[derive(Debug, Clone)]
pub struct NewIssue {
    /// Issue title (callers embed canonical-id markers via `title_with_marker`)
    pub title: String,

    /// Issue body, if any
    pub body: Option<String>,

    /// Labels to apply on creation
    pub labels: Vec<String>,
}

/// Authenticated client for the external issue tracker
///
/// Every method is one logical tracker operation; bounded retry with
/// backoff happens inside the implementation, so a returned error means
/// retries are exhausted or the failure is permanent.
#[async_trait]
pub trait IssueClient: Send + Sync {
    /// Fetch a single issue with state, labels, timestamps, and the
    /// optional project-status field
    async fn get_issue(&self, issue_ref: &ExternalIssueRef) -> Result<ExternalIssue>;

    /// Run a scoped issue search (pull requests excluded), sorted by
    /// update time, returning at most `first` hits
    async fn search_issues(&self, query: &str, first: u32) -> Result<Vec<ExternalIssue>>;

    /// Create a new issue in the given repository
    async fn create_issue(&self, owner: &str, repo: &str, issue: NewIssue)
        -> Result<ExternalIssue>;
}
