//! Synchronization pass
//!
//! The batch orchestrator that brings every tracked-and-linked issue's
//! mirror state current, plus the append-only run ledger recording each
//! invocation.

mod ledger;
mod orchestrator;

pub use ledger::{RunOutcome, RunStatus, SyncRun, SyncRunLedger};
pub use orchestrator::{SyncOptions, SyncOrchestrator, SyncReport};
