//! Persistence layer
//!
//! The store seam the orchestrator writes through, and its SQLite
//! implementation. Each per-issue update is an independent write to a
//! disjoint row; committed writes survive a later run failure.

mod sqlite;

pub use sqlite::{SqliteStore, StoreConfig};

use crate::model::{DiscoveredIssue, IssueId, IssueSyncState};
use crate::Result;

/// Mirror-state persistence for tracked issues and discovery snapshots
pub trait MirrorStore {
    /// Upsert the sync state for one tracked issue (keyed by internal id)
    fn save_issue_state(&self, state: &IssueSyncState) -> Result<()>;

    /// Load the sync state for one tracked issue
    fn load_issue_state(&self, issue_id: &IssueId) -> Result<Option<IssueSyncState>>;

    /// All persisted sync states, ordered by external number then id
    fn list_issue_states(&self) -> Result<Vec<IssueSyncState>>;

    /// Idempotently upsert a discovery snapshot (keyed by repo + number)
    fn upsert_discovered(&self, issue: &DiscoveredIssue) -> Result<()>;

    /// All discovery snapshots, ordered by repo then number
    fn list_discovered(&self) -> Result<Vec<DiscoveredIssue>>;
}
