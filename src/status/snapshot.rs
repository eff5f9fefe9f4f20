//! Snapshot bounding
//!
//! Serializes the status-relevant fields of an external issue and
//! deterministically truncates the result to a byte budget. Only labels are
//! ever trimmed; state and timestamps survive in full.

use crate::model::IssueState;
use crate::Result;
use serde::Serialize;

/// Storage budget for a persisted status snapshot, in bytes
pub const DEFAULT_SNAPSHOT_BUDGET: usize = 256;

#[derive(Serialize)]
struct Snapshot<'a> {
    state: &'a str,
    labels: &'a [String],
    updated_at: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    closed_at: Option<&'a str>,
}

/// Serialize a status snapshot, trimming labels until it fits `max_bytes`
///
/// Labels are sorted ascending before serialization, so the retained subset
/// is a function of the label *set*: any permutation of the input order
/// truncates to the same result. When trimming is needed, the
/// lexicographically largest remaining label is removed first.
pub fn bound_snapshot(
    state: IssueState,
    labels: &[String],
    updated_at: &str,
    closed_at: Option<&str>,
    max_bytes: usize,
) -> Result<String> {
    let mut labels: Vec<String> = labels.to_vec();
    labels.sort();

    loop {
        let serialized = serde_json::to_string(&Snapshot {
            state: state.as_str(),
            labels: &labels,
            updated_at,
            closed_at,
        })?;

        if serialized.len() <= max_bytes || labels.is_empty() {
            return Ok(serialized);
        }
        labels.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_small_snapshot_is_untrimmed() {
        let snapshot = bound_snapshot(
            IssueState::Open,
            &labels(&["bug", "area: sync"]),
            "2026-03-01T10:00:00Z",
            None,
            DEFAULT_SNAPSHOT_BUDGET,
        )
        .unwrap();

        assert!(snapshot.len() <= DEFAULT_SNAPSHOT_BUDGET);
        assert!(snapshot.contains("bug"));
        assert!(snapshot.contains("area: sync"));
        // No closed_at key when the issue is open
        assert!(!snapshot.contains("closed_at"));
    }

    #[test]
    fn test_output_never_exceeds_budget() {
        let many: Vec<String> = (0..40).map(|i| format!("label-{:02}", i)).collect();
        let snapshot = bound_snapshot(
            IssueState::Closed,
            &many,
            "2026-03-01T10:00:00Z",
            Some("2026-03-02T09:30:00Z"),
            DEFAULT_SNAPSHOT_BUDGET,
        )
        .unwrap();

        assert!(snapshot.len() <= DEFAULT_SNAPSHOT_BUDGET);
        // Non-label fields survive trimming in full
        assert!(snapshot.contains("closed"));
        assert!(snapshot.contains("2026-03-01T10:00:00Z"));
        assert!(snapshot.contains("2026-03-02T09:30:00Z"));
    }

    #[test]
    fn test_largest_labels_are_dropped_first() {
        let many: Vec<String> = (0..40).map(|i| format!("label-{:02}", i)).collect();
        let snapshot = bound_snapshot(
            IssueState::Open,
            &many,
            "2026-03-01T10:00:00Z",
            None,
            DEFAULT_SNAPSHOT_BUDGET,
        )
        .unwrap();

        // The smallest labels are retained; the tail is dropped
        assert!(snapshot.contains("label-00"));
        assert!(!snapshot.contains("label-39"));
    }

    #[test]
    fn test_truncation_is_order_independent() {
        let forward: Vec<String> = (0..40).map(|i| format!("label-{:02}", i)).collect();
        let mut reversed = forward.clone();
        reversed.reverse();
        let mut interleaved = forward.clone();
        interleaved.swap(0, 20);
        interleaved.swap(5, 35);

        let expected = bound_snapshot(
            IssueState::Open,
            &forward,
            "2026-03-01T10:00:00Z",
            None,
            DEFAULT_SNAPSHOT_BUDGET,
        )
        .unwrap();

        for permutation in [&reversed, &interleaved] {
            let snapshot = bound_snapshot(
                IssueState::Open,
                permutation,
                "2026-03-01T10:00:00Z",
                None,
                DEFAULT_SNAPSHOT_BUDGET,
            )
            .unwrap();
            assert_eq!(snapshot, expected);
        }
    }

    #[test]
    fn test_custom_budget_is_honored() {
        let snapshot = bound_snapshot(
            IssueState::Open,
            &labels(&["alpha", "beta", "gamma"]),
            "2026-03-01T10:00:00Z",
            None,
            80,
        )
        .unwrap();

        assert!(snapshot.len() <= 80);
    }
}
