//! Canonical-id resolver
//!
//! Answers "does an external issue already represent this canonical id?"
//! before the control plane creates a new one. One repository-scoped search,
//! marker matching over the candidates, and an explicit local tie-break so
//! the answer never depends on the search API's result ordering.

use crate::canonical::marker::{check_match, MarkerLocation};
use crate::github::IssueClient;
use crate::model::ExternalIssue;
use crate::{MirrorSyncError, Result};
use tracing::{debug, info};

/// Search page size for canonical-id resolution
const SEARCH_PAGE: u32 = 100;

/// Result of a canonical-id resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CanonicalMatch {
    /// An external issue carries a marker equal to the queried id
    Found {
        issue_number: u64,
        issue_url: String,
        matched_by: MarkerLocation,
    },
    /// No candidate matched
    NotFound,
}

/// Resolver for canonical identifiers embedded in external issues
pub struct CanonicalIdResolver<'a> {
    client: &'a dyn IssueClient,
}

impl<'a> CanonicalIdResolver<'a> {
    /// Create a resolver over the given client
    pub fn new(client: &'a dyn IssueClient) -> Self {
        Self { client }
    }

    /// Resolve a canonical id against one repository
    ///
    /// Rejects empty ids before any external call. Body matches beat title
    /// matches; within a location the lowest issue number wins. Idempotent:
    /// unchanged external state yields identical results.
    pub async fn resolve(
        &self,
        owner: &str,
        repo: &str,
        canonical_id: &str,
    ) -> Result<CanonicalMatch> {
        let id = canonical_id.trim();
        if id.is_empty() {
            return Err(MirrorSyncError::Validation(
                "canonical id must not be empty".to_string(),
            ));
        }

        let query = format!(
            "repo:{}/{} is:issue \"{}\"",
            owner,
            repo,
            sanitize_term(id)
        );

        debug!(id = %id, repo = %repo, "Resolving canonical id");

        let candidates = self
            .client
            .search_issues(&query, SEARCH_PAGE)
            .await
            .map_err(|e| {
                MirrorSyncError::Resolver(format!(
                    "canonical-id search failed: {}",
                    e.sanitized_message()
                ))
            })?;

        let matched = pick_match(&candidates, id);

        match &matched {
            CanonicalMatch::Found {
                issue_number,
                matched_by,
                ..
            } => {
                info!(id = %id, number = issue_number, matched_by = ?matched_by, "Canonical id resolved")
            }
            CanonicalMatch::NotFound => debug!(id = %id, "Canonical id not present"),
        }

        Ok(matched)
    }
}

/// Evaluate markers over all candidates with an explicit tie-break: body
/// beats title, then lowest issue number wins within each location.
fn pick_match(candidates: &[ExternalIssue], id: &str) -> CanonicalMatch {
    let mut best_body: Option<&ExternalIssue> = None;
    let mut best_title: Option<&ExternalIssue> = None;

    for candidate in candidates {
        match check_match(candidate, id) {
            Some(MarkerLocation::Body) => {
                if best_body.map_or(true, |b| candidate.number < b.number) {
                    best_body = Some(candidate);
                }
            }
            Some(MarkerLocation::Title) => {
                if best_title.map_or(true, |b| candidate.number < b.number) {
                    best_title = Some(candidate);
                }
            }
            None => {}
        }
    }

    if let Some(issue) = best_body {
        return CanonicalMatch::Found {
            issue_number: issue.number,
            issue_url: issue.url.clone(),
            matched_by: MarkerLocation::Body,
        };
    }
    if let Some(issue) = best_title {
        return CanonicalMatch::Found {
            issue_number: issue.number,
            issue_url: issue.url.clone(),
            matched_by: MarkerLocation::Title,
        };
    }
    CanonicalMatch::NotFound
}

/// Strip characters with meaning in the search query syntax
fn sanitize_term(term: &str) -> String {
    term.chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | ' '))
        .collect()
}
