//! Raw status classification
//!
//! Normalizes a raw status value into the canonical mirror-status
//! vocabulary. Unrecognized input classifies to nothing: the caller must
//! fall back to `Unknown` rather than guess.

use crate::model::MirrorStatus;

/// Keyword families checked in order; the first family with a hit wins.
/// `MergeReady` is checked before `Open` so "merge ready" never falls
/// through to the bare "ready" keyword.
const FAMILIES: &[(MirrorStatus, &[&str])] = &[
    (
        MirrorStatus::InProgress,
        &["implementing", "in progress", "in-progress", "wip"],
    ),
    (
        MirrorStatus::MergeReady,
        &["review", "pr", "merge ready", "merge-ready"],
    ),
    (MirrorStatus::Done, &["done", "completed", "closed"]),
    (MirrorStatus::Hold, &["blocked", "hold", "waiting"]),
    (MirrorStatus::Open, &["ready", "todo", "to do"]),
];

/// Classify a raw status value into a canonical mirror status
///
/// Trims and case-folds the input, then matches keyword families. Returns
/// `None` for empty or unrecognized input.
pub fn classify(raw: &str) -> Option<MirrorStatus> {
    let normalized = raw.trim().to_lowercase();
    if normalized.is_empty() {
        return None;
    }

    FAMILIES.iter().find_map(|(status, keywords)| {
        keywords
            .iter()
            .any(|kw| matches_keyword(&normalized, kw))
            .then_some(*status)
    })
}

/// Short keywords ("pr") match only on word boundaries; longer ones match
/// as substrings so label conventions like "status: in progress" still hit.
fn matches_keyword(normalized: &str, keyword: &str) -> bool {
    if keyword.len() <= 2 {
        normalized
            .split(|c: char| !c.is_alphanumeric())
            .any(|word| word == keyword)
    } else {
        normalized.contains(keyword)
    }
}
