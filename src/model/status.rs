//! Mirror status types
//!
//! The canonical mirror-status vocabulary, the raw signal extracted from an
//! external issue, and the persisted per-issue sync state.

use super::IssueId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical mirror status derived from external signals
///
/// `Unknown` is the fail-closed default: it is recorded whenever signals are
/// missing or contradictory rather than guessing a more committal value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MirrorStatus {
    Unknown,
    Open,
    InProgress,
    MergeReady,
    Done,
    Hold,
    Closed,
    Error,
}

impl MirrorStatus {
    /// Stable string encoding used for persistence
    pub fn as_str(&self) -> &'static str {
        match self {
            MirrorStatus::Unknown => "UNKNOWN",
            MirrorStatus::Open => "OPEN",
            MirrorStatus::InProgress => "IN_PROGRESS",
            MirrorStatus::MergeReady => "MERGE_READY",
            MirrorStatus::Done => "DONE",
            MirrorStatus::Hold => "HOLD",
            MirrorStatus::Closed => "CLOSED",
            MirrorStatus::Error => "ERROR",
        }
    }

    /// Parse the persisted encoding back into a status
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "UNKNOWN" => Some(MirrorStatus::Unknown),
            "OPEN" => Some(MirrorStatus::Open),
            "IN_PROGRESS" => Some(MirrorStatus::InProgress),
            "MERGE_READY" => Some(MirrorStatus::MergeReady),
            "DONE" => Some(MirrorStatus::Done),
            "HOLD" => Some(MirrorStatus::Hold),
            "CLOSED" => Some(MirrorStatus::Closed),
            "ERROR" => Some(MirrorStatus::Error),
            _ => None,
        }
    }
}

impl fmt::Display for MirrorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which external signal produced a raw status value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusSource {
    /// Project-board single-select field
    Project,

    /// `status: <value>` convention label
    Label,

    /// Open/closed issue state fallback
    State,
}

impl StatusSource {
    /// Stable string encoding used for persistence
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusSource::Project => "external_project",
            StatusSource::Label => "external_label",
            StatusSource::State => "external_state",
        }
    }

    /// Parse the persisted encoding back into a source
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "external_project" => Some(StatusSource::Project),
            "external_label" => Some(StatusSource::Label),
            "external_state" => Some(StatusSource::State),
            _ => None,
        }
    }
}

/// A raw status value together with the signal that produced it
///
/// Absence of any signal is modeled as `Option<StatusSignal>` at the
/// extraction seam, keeping "no signal" distinct from an empty value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSignal {
    /// Raw status text as seen on the external issue
    pub raw: String,

    /// Where the value came from
    pub source: StatusSource,
}

/// Sanitized record of a per-issue fetch failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncIssueError {
    /// Stable error code (e.g., "http", "not_found")
    pub code: String,

    /// One-line message, no stack traces or credential material
    pub message: String,
}

/// Persisted mirror state for one tracked-and-linked issue
///
/// Written only by the sync orchestrator; user-facing edit flows never touch
/// these fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueSyncState {
    /// Internal issue identifier
    pub issue_id: IssueId,

    /// Linked issue number in the external tracker
    pub external_number: u64,

    /// Canonical mirror status
    pub mirror_status: MirrorStatus,

    /// Bounded serialized status snapshot, absent after a fetch failure
    pub status_raw_snapshot: Option<String>,

    /// Signal source behind the current status, absent after a fetch failure
    pub status_source: Option<StatusSource>,

    /// External update timestamp the status was derived from
    pub status_updated_at: Option<String>,

    /// When this row was last written by a sync pass (RFC 3339)
    pub last_sync_at: String,

    /// Fetch failure recorded for this issue, if the last pass failed it
    pub sync_error: Option<SyncIssueError>,
}
