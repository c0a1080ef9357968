//! Parsers for git textual output
//!
//! Pure, total functions turning semi-structured git output into typed
//! records. Malformed input yields `None` or an empty value, never an error:
//! a dropped line degrades one field, it does not abort a refresh.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use regex::Regex;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

/// Issue-tracker token shape: short uppercase prefix, hyphen, digits
///
/// Also handed to `git log --extended-regexp --grep` so history scans can be
/// bounded to the first matching commit.
pub const TICKET_PATTERN: &str = "[A-Z][A-Z0-9]+-[0-9]+";

static TICKET_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(TICKET_PATTERN).expect("Invalid ticket regex"));

/// Embedded ISO-8601 timestamp inside a reflog line, offset optional
static REFLOG_ISO_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(?:Z|[+-]\d{2}:?\d{2})?")
        .expect("Invalid reflog ISO regex")
});

/// Friendly reflog date: `Mon DD, YYYY, HH:MM`
static REFLOG_FRIENDLY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z]{3}\s+\d{1,2},\s+\d{4},\s+\d{2}:\d{2}")
        .expect("Invalid reflog friendly regex")
});

/// Legacy embedded-token pattern in branch names: `_token_`
static LEGACY_TOKEN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_([A-Za-z0-9\-_]+)_").expect("Invalid legacy token regex"));

/// Graph-annotated log line: `<graph-chars><40-hex-hash>|<author>|<date>|<message>`
///
/// The message is captured greedily so a `|` inside the commit subject does
/// not split the line.
static GRAPH_LOG_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([|*\\/ \t]*)([0-9a-f]{40})\|([^|]*)\|([^|]*)\|(.*)$")
        .expect("Invalid graph log regex")
});

/// One commit from a log or comparison query
#[derive(Debug, Clone, Serialize)]
pub struct CommitRecord {
    /// ASCII-art graph characters preceding the commit (may be empty)
    pub graph_prefix: String,
    /// Full 40-character commit id
    pub hash: String,
    /// Author name
    pub author: String,
    /// Author date
    pub date: DateTime<Utc>,
    /// Commit subject
    pub message: String,
    /// Which side of a comparison this commit belongs to; None for a plain log
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    /// Issue-tracker tokens found in the message, in order, duplicates kept
    pub tickets: Vec<String>,
}

/// Per-file change counts from a numeric diff-stat
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStat {
    /// Changed file path
    pub file: String,
    /// Lines added (0 for binary files)
    pub added: u64,
    /// Lines deleted (0 for binary files)
    pub deleted: u64,
}

impl FileStat {
    /// Net line change; derived, never stored
    pub fn net(&self) -> i64 {
        self.added as i64 - self.deleted as i64
    }
}

impl Serialize for FileStat {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("FileStat", 4)?;
        s.serialize_field("file", &self.file)?;
        s.serialize_field("added", &self.added)?;
        s.serialize_field("deleted", &self.deleted)?;
        s.serialize_field("net", &self.net())?;
        s.end()
    }
}

/// Parse the author date of a branch's first commit (RFC 3339)
///
/// Empty or unparseable input yields None.
pub fn parse_creation_date(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc3339(trimmed)
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

/// Extract a date from a single reflog line
///
/// An embedded full ISO-8601 timestamp wins; otherwise a `Mon DD, YYYY,
/// HH:MM` pattern is tried. Unmatched input yields None. Timestamps without
/// an offset are taken as UTC.
pub fn parse_reflog_date(line: &str) -> Option<DateTime<Utc>> {
    if let Some(m) = REFLOG_ISO_REGEX.find(line) {
        let text = m.as_str();
        if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
            return Some(dt.with_timezone(&Utc));
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S") {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    let m = REFLOG_FRIENDLY_REGEX.find(line)?;
    NaiveDateTime::parse_from_str(m.as_str(), "%b %d, %Y, %H:%M")
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Derive a created-from value from a branch name alone
///
/// Takes the token before the first `/`; failing that, a legacy embedded
/// `_token_` pattern; failing that, empty string. The upstream tracking ref
/// is preferred over this heuristic and is resolved by the aggregator.
pub fn created_from_fallback(branch_name: &str) -> String {
    if let Some((prefix, _)) = branch_name.split_once('/') {
        if !prefix.is_empty() {
            return prefix.to_string();
        }
    }
    LEGACY_TOKEN_REGEX
        .captures(branch_name)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// First issue-tracker token in the text, if any
pub fn first_ticket(text: &str) -> Option<String> {
    TICKET_REGEX.find(text).map(|m| m.as_str().to_string())
}

/// All issue-tracker tokens in the text, in order, duplicates kept
pub fn all_tickets(text: &str) -> Vec<String> {
    TICKET_REGEX
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Parse one graph-annotated log line into a [`CommitRecord`]
///
/// Lines that don't match the expected shape, including lines whose date
/// field is unparseable, are dropped.
pub fn parse_graph_log_line(line: &str, branch: Option<&str>) -> Option<CommitRecord> {
    let caps = GRAPH_LOG_REGEX.captures(line)?;
    let date = parse_creation_date(&caps[4])?;
    let message = caps[5].to_string();
    Some(CommitRecord {
        graph_prefix: caps[1].trim().to_string(),
        hash: caps[2].to_string(),
        author: caps[3].to_string(),
        date,
        tickets: all_tickets(&message),
        message,
        branch: branch.map(|b| b.to_string()),
    })
}

/// Parse one `git diff --numstat` line: `<added> <deleted> <path>`
///
/// `-` in either numeric field marks a binary file and maps to 0. Lines with
/// fewer than three tokens are dropped.
pub fn parse_numstat_line(line: &str) -> Option<FileStat> {
    let mut parts = line.split_whitespace();
    let added = parse_numstat_count(parts.next()?)?;
    let deleted = parse_numstat_count(parts.next()?)?;
    let rest: Vec<&str> = parts.collect();
    if rest.is_empty() {
        return None;
    }
    Some(FileStat {
        file: rest.join(" "),
        added,
        deleted,
    })
}

fn parse_numstat_count(token: &str) -> Option<u64> {
    if token == "-" {
        return Some(0);
    }
    token.parse().ok()
}

/// Format a timestamp for display and search normalization
///
/// Records carry true UTC timestamps; this fixed `Mon DD YYYY HH:MM` form is
/// applied only at the presentation boundary.
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.format("%b %d %Y %H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creation_date_empty_and_garbage() {
        assert!(parse_creation_date("").is_none());
        assert!(parse_creation_date("   ").is_none());
        assert!(parse_creation_date("not-a-date").is_none());
    }

    #[test]
    fn test_creation_date_valid() {
        let dt = parse_creation_date("2024-01-02T03:04:05Z").unwrap();
        assert_eq!(dt.to_rfc3339(), "2024-01-02T03:04:05+00:00");

        // Offset form, as produced by %aI
        let dt = parse_creation_date("2024-01-02T03:04:05+05:30").unwrap();
        assert_eq!(format_timestamp(&dt), "Jan 01 2024 21:34");
    }

    #[test]
    fn test_reflog_date_iso_wins() {
        let line = "abc123 branch: Created from 2024-03-04T05:06:07Z (Mar 01, 2024, 00:00)";
        let dt = parse_reflog_date(line).unwrap();
        assert_eq!(dt.to_rfc3339(), "2024-03-04T05:06:07+00:00");
    }

    #[test]
    fn test_reflog_date_friendly() {
        let line = "HEAD@{Jan 02, 2024, 15:04}: branch: Created from origin/main";
        let dt = parse_reflog_date(line).unwrap();
        assert_eq!(format_timestamp(&dt), "Jan 02 2024 15:04");
    }

    #[test]
    fn test_reflog_date_unmatched() {
        assert!(parse_reflog_date("").is_none());
        assert!(parse_reflog_date("branch: Created from origin/main").is_none());
    }

    #[test]
    fn test_created_from_fallback() {
        assert_eq!(created_from_fallback("origin/foo"), "origin");
        assert_eq!(created_from_fallback("a/b/c"), "a");
        assert_eq!(created_from_fallback("fix_aclp_June_02"), "aclp_June");
        assert_eq!(created_from_fallback("plainbranch"), "");
        assert_eq!(created_from_fallback(""), "");
    }

    #[test]
    fn test_tickets() {
        assert_eq!(first_ticket("DI-1234: fix widget"), Some("DI-1234".into()));
        assert_eq!(first_ticket("no tokens here"), None);
        assert_eq!(
            all_tickets("DI-1 then ABC-22 then DI-1 again"),
            vec!["DI-1", "ABC-22", "DI-1"]
        );
        assert!(all_tickets("lowercase di-1 skipped").is_empty());
    }

    #[test]
    fn test_graph_log_line() {
        let hash = "a".repeat(40);
        let line = format!("| * {hash}|Alice|2024-05-06T07:08:09Z|DI-9 fix the | pipe thing");
        let commit = parse_graph_log_line(&line, Some("feature/x")).unwrap();
        assert_eq!(commit.graph_prefix, "| *");
        assert_eq!(commit.hash, hash);
        assert_eq!(commit.author, "Alice");
        // Message captured greedily, delimiter and all
        assert_eq!(commit.message, "DI-9 fix the | pipe thing");
        assert_eq!(commit.branch.as_deref(), Some("feature/x"));
        assert_eq!(commit.tickets, vec!["DI-9"]);
    }

    #[test]
    fn test_graph_log_line_dropped() {
        // Short hash
        assert!(parse_graph_log_line("* abc123|Bob|2024-01-01T00:00:00Z|msg", None).is_none());
        // Unparseable date
        let hash = "b".repeat(40);
        let line = format!("{hash}|Bob|yesterday|msg");
        assert!(parse_graph_log_line(&line, None).is_none());
        assert!(parse_graph_log_line("", None).is_none());
    }

    #[test]
    fn test_numstat_line() {
        let stat = parse_numstat_line("12\t3\tsrc/a.ts").unwrap();
        assert_eq!(stat.added, 12);
        assert_eq!(stat.deleted, 3);
        assert_eq!(stat.file, "src/a.ts");
        assert_eq!(stat.net(), 9);
    }

    #[test]
    fn test_numstat_binary_marker() {
        let stat = parse_numstat_line("- - binary.png").unwrap();
        assert_eq!(stat.added, 0);
        assert_eq!(stat.deleted, 0);
        assert_eq!(stat.net(), 0);
    }

    #[test]
    fn test_numstat_dropped() {
        assert!(parse_numstat_line("12 3").is_none());
        assert!(parse_numstat_line("").is_none());
        assert!(parse_numstat_line("x y path").is_none());
    }

    #[test]
    fn test_file_stat_serializes_net() {
        let stat = FileStat {
            file: "a.rs".into(),
            added: 5,
            deleted: 2,
        };
        let json = serde_json::to_value(&stat).unwrap();
        assert_eq!(json["net"], 3);
    }
}
