//! Raw status extraction
//!
//! Derives a raw status signal from an external issue's project field,
//! labels, and open/closed state. Precedence is an ordered list of small
//! strategy functions evaluated first-non-null-wins, so each signal source
//! stays independently testable.

use crate::model::{IssueState, StatusSignal, StatusSource};

/// Label convention marking an explicit status, e.g. `status: in progress`
const STATUS_LABEL_PREFIX: &str = "status:";

/// Inputs to one extraction pass
struct SignalInput<'a> {
    project_status: Option<&'a str>,
    labels: &'a [String],
    state: IssueState,
}

type Strategy = for<'a> fn(&SignalInput<'a>) -> Option<StatusSignal>;

/// Precedence order: project field, then status label, then state fallback
const STRATEGIES: &[Strategy] = &[project_field, status_label, state_fallback];

/// Extract the highest-precedence raw status signal from an external issue
///
/// Returns `None` when the issue carries no status signal at all. Pure and
/// deterministic: the same inputs always produce the same signal.
pub fn extract_status(
    project_status: Option<&str>,
    labels: &[String],
    state: IssueState,
) -> Option<StatusSignal> {
    let input = SignalInput {
        project_status,
        labels,
        state,
    };
    STRATEGIES.iter().find_map(|strategy| strategy(&input))
}

/// Non-empty trimmed project-board field wins outright
fn project_field(input: &SignalInput<'_>) -> Option<StatusSignal> {
    let value = input.project_status?.trim();
    if value.is_empty() {
        return None;
    }
    Some(StatusSignal {
        raw: value.to_string(),
        source: StatusSource::Project,
    })
}

/// First label matching the `status: <value>` convention
fn status_label(input: &SignalInput<'_>) -> Option<StatusSignal> {
    input.labels.iter().find_map(|label| {
        let rest = label.trim().to_lowercase();
        let rest = rest.strip_prefix(STATUS_LABEL_PREFIX)?;
        if rest.trim().is_empty() {
            return None;
        }
        Some(StatusSignal {
            raw: label.clone(),
            source: StatusSource::Label,
        })
    })
}

/// A closed issue is itself a weak signal; open issues carry none
fn state_fallback(input: &SignalInput<'_>) -> Option<StatusSignal> {
    match input.state {
        IssueState::Closed => Some(StatusSignal {
            raw: "closed".to_string(),
            source: StatusSource::State,
        }),
        IssueState::Open => None,
    }
}
