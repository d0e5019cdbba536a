//! Query normalization for intent matching.

use std::fmt;

/// Lower-cased, trimmed form of a user query.
///
/// Only used for matching; the original text is what gets displayed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedQuery(String);

impl NormalizedQuery {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True if the query contains at least one of `needles` as a substring.
    pub fn contains_any<S: AsRef<str>>(&self, needles: &[S]) -> bool {
        needles.iter().any(|n| self.0.contains(n.as_ref()))
    }
}

impl fmt::Display for NormalizedQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NormalizedQuery {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Normalize raw input for matching. Pure, total and idempotent.
pub fn normalize(raw: &str) -> NormalizedQuery {
    NormalizedQuery(raw.to_lowercase().trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_and_whitespace_insensitive() {
        assert_eq!(normalize("  Library  "), normalize("library"));
        assert_eq!(normalize("\tWIFI\n").as_str(), "wifi");
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "",
            "   ",
            "When does the LIBRARY close?",
            "  Événements à venir  ",
            "wifi\u{00a0}",
            "ΣΊΣΥΦΟΣ",
        ];
        for input in inputs {
            let once = normalize(input);
            let twice = normalize(once.as_str());
            assert_eq!(once, twice, "not idempotent for {:?}", input);
        }
    }

    #[test]
    fn test_interior_whitespace_preserved() {
        assert_eq!(normalize("  Wifi   in the  Office ").as_str(), "wifi   in the  office");
    }

    #[test]
    fn test_whitespace_only_normalizes_to_empty() {
        assert!(normalize(" \t\n ").is_empty());
    }

    #[test]
    fn test_contains_any() {
        let q = normalize("Where is the Registrar?");
        assert!(q.contains_any(&["registr", "office"]));
        assert!(!q.contains_any(&["wifi", "internet"]));
        assert!(!q.contains_any::<&str>(&[]));
    }

    #[test]
    fn test_display_matches_inner() {
        assert_eq!(normalize(" Open ").to_string(), "open");
    }
}
