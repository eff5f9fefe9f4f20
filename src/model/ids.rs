//! Type-safe ID wrapper for internally-tracked issues

use serde::{Deserialize, Serialize};
use std::fmt;

/// Type-safe wrapper for internal issue IDs
///
/// Prevents mixing internal identifiers with external issue numbers at
/// compile time. Internal IDs are opaque strings assigned by the control
/// plane (e.g., "DEL-2041").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IssueId(String);

impl IssueId {
    /// Create a new IssueId from a string
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the underlying string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IssueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for IssueId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for IssueId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_id_roundtrip() {
        let id = IssueId::new("DEL-2041");
        assert_eq!(id.as_str(), "DEL-2041");
        assert_eq!(id.to_string(), "DEL-2041");
    }

    #[test]
    fn test_issue_id_ordering_is_lexicographic() {
        let a = IssueId::new("A");
        let b = IssueId::new("B");
        assert!(a < b);
    }
}
