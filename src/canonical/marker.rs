//! Canonical-id markers
//!
//! Issues created by the control plane embed their canonical identifier in
//! free text twice: a bracketed `[CID:<id>]` prefix in the title and a
//! `Canonical-ID: <id>` line in the body. Extraction returns a tagged
//! `Marker` so absent and malformed markers stay distinguishable from
//! present ones.

use crate::model::ExternalIssue;
use serde::{Deserialize, Serialize};

/// Title marker prefix inside the brackets
const TITLE_MARKER_KEY: &str = "CID:";

/// Body marker line prefix
const BODY_MARKER_KEY: &str = "Canonical-ID:";

/// Where a marker was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerLocation {
    Title,
    Body,
}

/// A canonical-id marker extracted from issue text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    /// Where the marker was embedded
    pub location: MarkerLocation,

    /// The embedded canonical identifier
    pub value: String,
}

/// Extract a `[CID:<id>]` marker from an issue title
///
/// Whitespace around the key and the id is tolerated. Empty and
/// unterminated markers are rejected.
pub fn extract_from_title(title: &str) -> Option<Marker> {
    let mut rest = title;
    while let Some(open) = rest.find('[') {
        let after = &rest[open + 1..];
        if let Some(tail) = after.trim_start().strip_prefix(TITLE_MARKER_KEY) {
            let close = tail.find(']')?;
            let value = tail[..close].trim();
            if value.is_empty() {
                return None;
            }
            return Some(Marker {
                location: MarkerLocation::Title,
                value: value.to_string(),
            });
        }
        rest = after;
    }
    None
}

/// Extract a `Canonical-ID: <id>` line from an issue body
///
/// The first matching line wins; both `\n` and `\r\n` line endings are
/// accepted. A matching line with an empty value rejects the marker.
pub fn extract_from_body(body: &str) -> Option<Marker> {
    for line in body.lines() {
        if let Some(tail) = line.trim_start().strip_prefix(BODY_MARKER_KEY) {
            let value = tail.trim();
            if value.is_empty() {
                return None;
            }
            return Some(Marker {
                location: MarkerLocation::Body,
                value: value.to_string(),
            });
        }
    }
    None
}

/// Check whether an issue carries a marker equal to `id`
///
/// The body marker is checked first and always wins when both markers are
/// present and both equal the queried id.
pub fn check_match(issue: &ExternalIssue, id: &str) -> Option<MarkerLocation> {
    if let Some(marker) = issue.body.as_deref().and_then(extract_from_body) {
        if marker.value == id {
            return Some(MarkerLocation::Body);
        }
    }
    if let Some(marker) = extract_from_title(&issue.title) {
        if marker.value == id {
            return Some(MarkerLocation::Title);
        }
    }
    None
}

/// Build an issue title carrying a canonical-id marker
pub fn title_with_marker(id: &str, title: &str) -> String {
    format!("[{}{}] {}", TITLE_MARKER_KEY, id, title)
}

/// Build an issue body carrying a canonical-id marker
pub fn body_with_marker(id: &str, body: &str) -> String {
    format!("{} {}\n\n{}", BODY_MARKER_KEY, id, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::IssueState;

    fn issue(title: &str, body: Option<&str>) -> ExternalIssue {
        ExternalIssue {
            number: 1,
            repo: "acme/delivery".to_string(),
            title: title.to_string(),
            body: body.map(|b| b.to_string()),
            state: IssueState::Open,
            labels: vec![],
            url: "https://github.com/acme/delivery/issues/1".to_string(),
            updated_at: "2026-03-01T10:00:00Z".to_string(),
            closed_at: None,
            project_status: None,
        }
    }

    #[test]
    fn test_title_marker_roundtrip() {
        for id in ["DEL-2041", "req_77", "a"] {
            let title = title_with_marker(id, "Fix the pipeline");
            let marker = extract_from_title(&title).unwrap();
            assert_eq!(marker.value, id);
            assert_eq!(marker.location, MarkerLocation::Title);
        }
    }

    #[test]
    fn test_body_marker_roundtrip() {
        for id in ["DEL-2041", "req_77"] {
            let body = body_with_marker(id, "Deploy fails on staging.");
            let marker = extract_from_body(&body).unwrap();
            assert_eq!(marker.value, id);
            assert_eq!(marker.location, MarkerLocation::Body);
        }
    }

    #[test]
    fn test_title_marker_tolerates_whitespace() {
        let marker = extract_from_title("[ CID:  DEL-2041  ] Fix the pipeline").unwrap();
        assert_eq!(marker.value, "DEL-2041");
    }

    #[test]
    fn test_title_marker_rejects_empty_and_unterminated() {
        assert_eq!(extract_from_title("[CID:] Fix"), None);
        assert_eq!(extract_from_title("[CID:   ] Fix"), None);
        assert_eq!(extract_from_title("[CID:DEL-2041 Fix"), None);
        assert_eq!(extract_from_title("Fix the pipeline"), None);
    }

    #[test]
    fn test_title_marker_ignores_unrelated_brackets() {
        let marker = extract_from_title("[backend] [CID:DEL-2041] Fix").unwrap();
        assert_eq!(marker.value, "DEL-2041");
    }

    #[test]
    fn test_body_marker_first_line_wins() {
        let body = "Canonical-ID: DEL-1\nCanonical-ID: DEL-2";
        assert_eq!(extract_from_body(body).unwrap().value, "DEL-1");
    }

    #[test]
    fn test_body_marker_tolerates_crlf() {
        let body = "Summary line\r\nCanonical-ID: DEL-2041\r\n\r\nDetails.";
        assert_eq!(extract_from_body(body).unwrap().value, "DEL-2041");
    }

    #[test]
    fn test_body_marker_rejects_empty_and_missing() {
        assert_eq!(extract_from_body("Canonical-ID:"), None);
        assert_eq!(extract_from_body("Canonical-ID:   "), None);
        assert_eq!(extract_from_body("no marker here"), None);
        assert_eq!(extract_from_body(""), None);
    }

    #[test]
    fn test_check_match_prefers_body() {
        let both = issue(
            &title_with_marker("DEL-2041", "Fix"),
            Some(&body_with_marker("DEL-2041", "details")),
        );
        assert_eq!(check_match(&both, "DEL-2041"), Some(MarkerLocation::Body));
    }

    #[test]
    fn test_check_match_falls_back_to_title() {
        let title_only = issue(&title_with_marker("DEL-2041", "Fix"), Some("no marker"));
        assert_eq!(
            check_match(&title_only, "DEL-2041"),
            Some(MarkerLocation::Title)
        );

        let absent_body = issue(&title_with_marker("DEL-2041", "Fix"), None);
        assert_eq!(
            check_match(&absent_body, "DEL-2041"),
            Some(MarkerLocation::Title)
        );
    }

    #[test]
    fn test_check_match_requires_equality() {
        let other = issue(
            &title_with_marker("DEL-9999", "Fix"),
            Some(&body_with_marker("DEL-9999", "details")),
        );
        assert_eq!(check_match(&other, "DEL-2041"), None);
    }

    #[test]
    fn test_check_match_title_wins_when_body_differs() {
        // Body marker present but for a different id: the title marker
        // equal to the queried id still matches.
        let mixed = issue(
            &title_with_marker("DEL-2041", "Fix"),
            Some(&body_with_marker("DEL-9999", "details")),
        );
        assert_eq!(check_match(&mixed, "DEL-2041"), Some(MarkerLocation::Title));
    }
}
