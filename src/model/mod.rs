//! Core data structures
//!
//! Defines the issue identifiers, external issue shapes, and persisted
//! mirror-state types shared across the engine.

mod ids;
mod issue;
mod status;

pub use ids::IssueId;
pub use issue::{DiscoveredIssue, ExternalIssue, ExternalIssueRef, IssueState, TrackedIssue};
pub use status::{IssueSyncState, MirrorStatus, StatusSignal, StatusSource, SyncIssueError};
