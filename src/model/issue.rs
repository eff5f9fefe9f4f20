//! External issue shapes
//!
//! Types describing issues as seen through the external tracker client,
//! plus the internal tracked-issue link used to drive a sync pass.

use super::IssueId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one issue in the external tracker
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExternalIssueRef {
    /// Organization or user owning the repository
    pub owner: String,

    /// Repository name
    pub repo: String,

    /// Issue number within the repository
    pub number: u64,
}

impl ExternalIssueRef {
    /// Create a new reference
    pub fn new(owner: impl Into<String>, repo: impl Into<String>, number: u64) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            number,
        }
    }

    /// The `owner/repo` form used by search queries and snapshot keys
    pub fn full_repo(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

impl fmt::Display for ExternalIssueRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}#{}", self.owner, self.repo, self.number)
    }
}

/// Open/closed state of an external issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    Open,
    Closed,
}

impl IssueState {
    /// Parse a tracker-supplied state string
    ///
    /// Tolerant of both REST ("open") and GraphQL ("OPEN") casings.
    /// Unrecognized values fall back to `Open`, matching how the tracker
    /// treats issues that are not explicitly closed.
    pub fn parse(state: &str) -> Self {
        match state.trim().to_lowercase().as_str() {
            "closed" => IssueState::Closed,
            _ => IssueState::Open,
        }
    }

    /// Stable string encoding used in snapshots and persistence
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueState::Open => "open",
            IssueState::Closed => "closed",
        }
    }
}

impl fmt::Display for IssueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An issue as returned by the external tracker client
///
/// One shape serves both single-issue fetches and search results. Labels
/// keep the tracker's order; consumers that need determinism sort locally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalIssue {
    /// Issue number within its repository
    pub number: u64,

    /// Repository in `owner/repo` form
    pub repo: String,

    /// Issue title
    pub title: String,

    /// Issue body, absent when the tracker returns none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,

    /// Open/closed state
    pub state: IssueState,

    /// Label names in tracker order
    #[serde(default)]
    pub labels: Vec<String>,

    /// Web URL of the issue
    pub url: String,

    /// Last update timestamp (RFC 3339)
    pub updated_at: String,

    /// Close timestamp (RFC 3339), when closed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<String>,

    /// Single-select project field value, when the issue sits on a project board
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_status: Option<String>,
}

/// An internally-tracked issue and its (optional) external link
///
/// Issues without a linked external number are out of scope for a status
/// sync pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedIssue {
    /// Internal identifier
    pub id: IssueId,

    /// Linked issue number in the external tracker, if any
    pub external_number: Option<u64>,
}

impl TrackedIssue {
    /// Create a tracked issue with an external link
    pub fn linked(id: impl Into<IssueId>, external_number: u64) -> Self {
        Self {
            id: id.into(),
            external_number: Some(external_number),
        }
    }

    /// Create a tracked issue without an external link
    pub fn unlinked(id: impl Into<IssueId>) -> Self {
        Self {
            id: id.into(),
            external_number: None,
        }
    }
}

/// Lightweight snapshot of an external issue discovered by the bulk search
/// sub-pass, keyed by `(repo, number)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredIssue {
    /// Repository in `owner/repo` form
    pub repo: String,

    /// Issue number within the repository
    pub number: u64,

    /// Issue title at discovery time
    pub title: String,

    /// Open/closed state at discovery time
    pub state: IssueState,

    /// Web URL of the issue
    pub url: String,

    /// Last update timestamp (RFC 3339)
    pub updated_at: String,
}

impl DiscoveredIssue {
    /// Build a snapshot from a search hit
    pub fn from_external(issue: &ExternalIssue) -> Self {
        Self {
            repo: issue.repo.clone(),
            number: issue.number,
            title: issue.title.clone(),
            state: issue.state,
            url: issue.url.clone(),
            updated_at: issue.updated_at.clone(),
        }
    }
}
