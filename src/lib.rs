//! MirrorSync - Issue-Repository Reconciliation Engine
//!
//! MirrorSync keeps an internal software-delivery control plane's view of
//! its tracked issues current against an external GitHub-style tracker.
//! The external system is the source of truth for mirror fields; sync is a
//! one-way, deterministic batch pass that isolates per-issue failures and
//! records every invocation in an append-only run ledger.
//!
//! # Architecture
//!
//! - **model**: Core data structures (issue ids, external issues, mirror state)
//! - **status**: Pure status pipeline (extraction, classification, snapshot bounding)
//! - **canonical**: Canonical-id markers and resolution against the tracker
//! - **github**: External tracker client (trait, reqwest adapter, retry policy)
//! - **store**: Persistence (SQLite mirror store and run ledger)
//! - **sync**: Batch orchestrator and run ledger types
//! - **config**: YAML configuration

pub mod canonical;
pub mod config;
pub mod error;
pub mod github;
pub mod logging;
pub mod model;
pub mod status;
pub mod store;
pub mod sync;

// Re-exports
pub use canonical::{CanonicalIdResolver, CanonicalMatch};
pub use error::{MirrorSyncError, Result};
pub use status::{classify, extract_status};
pub use sync::{SyncOptions, SyncOrchestrator, SyncReport};
