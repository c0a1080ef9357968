//! Branch search
//!
//! Stateless normalize-and-filter over the current branch snapshot. No
//! caching of its own; it sees whatever snapshot the caller holds.

use std::sync::LazyLock;

use regex::Regex;

use crate::branch::BranchRecord;
use crate::parse::format_timestamp;

/// Separator characters collapsed to a single space during normalization
static SEPARATOR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s\-_+/\\.]+").expect("Invalid separator regex"));

/// Normalize text for matching: lowercase, separators collapsed to spaces
pub fn normalize(text: &str) -> String {
    SEPARATOR_REGEX
        .replace_all(&text.to_lowercase(), " ")
        .trim()
        .to_string()
}

/// Filter records by a free-text query
///
/// The query is split into whitespace terms after normalization. A record
/// matches iff every term appears as a substring of at least one normalized
/// field (name, dates, created-from): AND across terms, OR across fields per
/// term. An empty query matches every record.
pub fn search(query: &str, records: &[BranchRecord]) -> Vec<BranchRecord> {
    let normalized = normalize(query);
    let terms: Vec<&str> = normalized.split_whitespace().collect();
    if terms.is_empty() {
        return records.to_vec();
    }

    records
        .iter()
        .filter(|record| {
            let fields = [
                normalize(&record.name),
                record
                    .reflog_date
                    .map(|d| normalize(&format_timestamp(&d)))
                    .unwrap_or_default(),
                record
                    .created_at
                    .map(|d| normalize(&format_timestamp(&d)))
                    .unwrap_or_default(),
                normalize(&record.created_from),
            ];
            terms
                .iter()
                .all(|term| fields.iter().any(|field| field.contains(term)))
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn record(name: &str, created_from: &str) -> BranchRecord {
        BranchRecord {
            name: name.to_string(),
            created_at: Some(Utc.with_ymd_and_hms(2024, 6, 2, 10, 30, 0).unwrap()),
            reflog_date: None,
            created_from: created_from.to_string(),
            bug_ticket: "DI-1".to_string(),
        }
    }

    #[test]
    fn test_normalize_collapses_separators() {
        assert_eq!(normalize("Feat/Foo_bar-baz.ts"), "feat foo bar baz ts");
        assert_eq!(normalize("  a   b  "), "a b");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_empty_query_matches_all() {
        let records = vec![record("feature/a", "origin"), record("fix/b", "upstream")];
        assert_eq!(search("", &records).len(), 2);
        assert_eq!(search("   ", &records).len(), 2);
    }

    #[test]
    fn test_terms_and_across_fields() {
        let records = vec![
            record("feat/widgets-bob", "origin"),
            record("feat/other", "bob"),
            record("fix/widgets", "origin"),
        ];
        // Both terms must match somewhere, possibly in different fields
        let hits = search("feat bob", &records);
        let names: Vec<&str> = hits.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["feat/widgets-bob", "feat/other"]);
    }

    #[test]
    fn test_query_separators_are_normalized_too() {
        let records = vec![record("feature/login-page", "origin")];
        assert_eq!(search("feature/login", &records).len(), 1);
        assert_eq!(search("login_page", &records).len(), 1);
        assert_eq!(search("nomatch", &records).len(), 0);
    }

    #[test]
    fn test_date_fields_are_searchable() {
        let records = vec![record("feature/a", "origin")];
        assert_eq!(search("jun 02 2024", &records).len(), 1);
    }
}
