//! Status derivation pipeline
//!
//! Pure functions that turn an external issue's ambiguous signals into a
//! canonical mirror status: extraction (which signal applies), classification
//! (what the signal means), and snapshot bounding (what gets persisted).

mod classify;
mod extract;
mod snapshot;

pub use classify::classify;
pub use extract::extract_status;
pub use snapshot::{bound_snapshot, DEFAULT_SNAPSHOT_BUDGET};
