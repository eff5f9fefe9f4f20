//! External tracker client
//!
//! The `IssueClient` seam the engine consumes, a reqwest-backed GitHub
//! adapter (REST writes, GraphQL reads so the ProjectV2 status field is
//! visible), and the bounded-retry policy the adapter applies to every
//! external call.

mod adapter;
mod client;
pub mod retry;

pub use adapter::GitHubAdapter;
pub use client::{IssueClient, NewIssue};
pub use retry::{with_retry, RetryConfig, RetryDecision, RetryableError};
