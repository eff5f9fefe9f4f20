//! Sync run ledger
//!
//! Append-only audit record of sync invocations. A row is created when a
//! run starts and updated exactly once when it reaches a terminal state.

use crate::Result;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a sync run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    /// Created at run start, not yet terminal
    Running,
    Success,
    Failed,
}

impl RunStatus {
    /// Stable string encoding used for persistence
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Running => "RUNNING",
            RunStatus::Success => "SUCCESS",
            RunStatus::Failed => "FAILED",
        }
    }

    /// Parse the persisted encoding back into a status
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "RUNNING" => Some(RunStatus::Running),
            "SUCCESS" => Some(RunStatus::Success),
            "FAILED" => Some(RunStatus::Failed),
            _ => None,
        }
    }
}

/// One ledger row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRun {
    /// Ledger-assigned run identifier
    pub run_id: i64,

    /// Discovery query the run executed
    pub query: String,

    /// Lifecycle state
    pub status: RunStatus,

    /// Issues found by the discovery search
    pub total_count: u64,

    /// Discovery snapshots upserted
    pub upserted_count: u64,

    /// Sanitized failure description for failed runs
    pub error: Option<String>,

    /// When the run started (RFC 3339)
    pub started_at: String,

    /// When the run reached a terminal state (RFC 3339)
    pub finished_at: Option<String>,
}

/// Terminal outcome written back to a ledger row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub status: RunStatus,
    pub total_count: u64,
    pub upserted_count: u64,
    pub error: Option<String>,
}

impl RunOutcome {
    /// Successful terminal outcome
    pub fn success(total_count: u64, upserted_count: u64) -> Self {
        Self {
            status: RunStatus::Success,
            total_count,
            upserted_count,
            error: None,
        }
    }

    /// Failed terminal outcome with a sanitized error description
    pub fn failed(total_count: u64, upserted_count: u64, error: impl Into<String>) -> Self {
        Self {
            status: RunStatus::Failed,
            total_count,
            upserted_count,
            error: Some(error.into()),
        }
    }
}

/// Append-only ledger of sync runs
pub trait SyncRunLedger {
    /// Open a ledger row for a starting run, returning its id
    fn create_run(&self, query: &str) -> Result<i64>;

    /// Write the terminal outcome for a run; called exactly once per run
    fn update_run(&self, run_id: i64, outcome: &RunOutcome) -> Result<()>;

    /// Most recent runs, newest first
    fn list_runs(&self, limit: u32) -> Result<Vec<SyncRun>>;
}
