//! Core data models for the team knowledge base.
//!
//! These are the rows that flow between the SQLite store and the CLI: bugs,
//! code documentation entries, changelog entries, learnings, decisions,
//! tasks, and board messages. Inputs are validated before insertion (typed
//! vocabularies in [`crate::vocab`], roster/area checks against the config);
//! these structs represent what comes back out.

use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

/// Parse a JSON-array text column into a list, tolerating NULL and legacy
/// malformed values (treated as empty).
pub fn parse_json_list(raw: Option<String>) -> Vec<String> {
    raw.and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or_default()
}

/// Serialize a list for storage in a JSON-array text column.
pub fn to_json_list(items: &[String]) -> String {
    serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string())
}

#[derive(Debug, Clone, Serialize)]
pub struct Bug {
    pub id: String,
    pub title: String,
    pub status: String,
    pub priority: String,
    pub area: Option<String>,
    pub owner: Option<String>,
    pub trivial: bool,
    pub description: Option<String>,
    pub expected_behavior: Option<String>,
    pub root_cause: Option<String>,
    pub fix_applied: Option<String>,
    pub files_changed: Vec<String>,
    pub acceptance_criteria: Vec<String>,
    pub found_by: Option<String>,
    pub verified_by: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Bug {
    pub fn from_row(row: &SqliteRow) -> Self {
        Self {
            id: row.get("id"),
            title: row.get("title"),
            status: row.get("status"),
            priority: row.get("priority"),
            area: row.get("area"),
            owner: row.get("owner"),
            trivial: row.get::<i64, _>("trivial") != 0,
            description: row.get("description"),
            expected_behavior: row.get("expected_behavior"),
            root_cause: row.get("root_cause"),
            fix_applied: row.get("fix_applied"),
            files_changed: parse_json_list(row.get("files_changed")),
            acceptance_criteria: parse_json_list(row.get("acceptance_criteria")),
            found_by: row.get("found_by"),
            verified_by: row.get("verified_by"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CodeDoc {
    pub id: i64,
    pub file_path: String,
    pub symbol_name: Option<String>,
    pub symbol_type: String,
    pub parent_id: Option<i64>,
    pub line_start: Option<i64>,
    pub line_end: Option<i64>,
    pub signature: Option<String>,
    pub purpose: String,
    pub why: Option<String>,
    pub connections: Vec<String>,
    pub area: String,
    pub last_verified: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl CodeDoc {
    pub fn from_row(row: &SqliteRow) -> Self {
        Self {
            id: row.get("id"),
            file_path: row.get("file_path"),
            symbol_name: row.get("symbol_name"),
            symbol_type: row.get("symbol_type"),
            parent_id: row.get("parent_id"),
            line_start: row.get("line_start"),
            line_end: row.get("line_end"),
            signature: row.get("signature"),
            purpose: row.get("purpose"),
            why: row.get("why"),
            connections: parse_json_list(row.get("connections")),
            area: row.get("area"),
            last_verified: row.get("last_verified"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChangelogEntry {
    pub id: i64,
    pub date: String,
    pub title: String,
    pub what_changed: String,
    pub what_it_was: Option<String>,
    pub why: String,
    pub files_affected: Vec<String>,
    pub related_bug_id: Option<String>,
    pub created_at: String,
}

impl ChangelogEntry {
    pub fn from_row(row: &SqliteRow) -> Self {
        Self {
            id: row.get("id"),
            date: row.get("date"),
            title: row.get("title"),
            what_changed: row.get("what_changed"),
            what_it_was: row.get("what_it_was"),
            why: row.get("why"),
            files_affected: parse_json_list(row.get("files_affected")),
            related_bug_id: row.get("related_bug_id"),
            created_at: row.get("created_at"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Learning {
    pub id: i64,
    pub category: String,
    pub learning: String,
    pub context: Option<String>,
    pub related_bug_id: Option<String>,
    pub created_at: String,
}

impl Learning {
    pub fn from_row(row: &SqliteRow) -> Self {
        Self {
            id: row.get("id"),
            category: row.get("category"),
            learning: row.get("learning"),
            context: row.get("context"),
            related_bug_id: row.get("related_bug_id"),
            created_at: row.get("created_at"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Decision {
    pub id: i64,
    pub date: String,
    pub decision: String,
    pub rationale: String,
    pub alternatives: Vec<String>,
    pub related_area: Option<String>,
    pub created_at: String,
}

impl Decision {
    pub fn from_row(row: &SqliteRow) -> Self {
        Self {
            id: row.get("id"),
            date: row.get("date"),
            decision: row.get("decision"),
            rationale: row.get("rationale"),
            alternatives: parse_json_list(row.get("alternatives")),
            related_area: row.get("related_area"),
            created_at: row.get("created_at"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Task {
    pub id: String,
    pub bug_id: Option<String>,
    pub title: String,
    pub owner: String,
    pub status: String,
    pub priority: i64,
    pub notes: Option<String>,
    pub files_editing: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Task {
    pub fn from_row(row: &SqliteRow) -> Self {
        Self {
            id: row.get("id"),
            bug_id: row.get("bug_id"),
            title: row.get("title"),
            owner: row.get("owner"),
            status: row.get("status"),
            priority: row.get("priority"),
            notes: row.get("notes"),
            files_editing: parse_json_list(row.get("files_editing")),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }
}

/// A board message. Append-only; the database is the source of truth and
/// `team/BOARD.md`-style views are rendered from it, never edited.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub id: i64,
    pub author: String,
    pub message_type: String,
    pub content: String,
    pub data: Option<serde_json::Value>,
    pub refs: Option<serde_json::Value>,
    pub mentions: Vec<String>,
    pub routed_to: Option<String>,
    pub routed_id: Option<String>,
    pub resolved: bool,
    pub created_at: String,
}

impl Message {
    pub fn from_row(row: &SqliteRow) -> Self {
        let data: Option<String> = row.get("data");
        let refs: Option<String> = row.get("refs");
        Self {
            id: row.get("id"),
            author: row.get("author"),
            message_type: row.get("message_type"),
            content: row.get("content"),
            data: data.and_then(|s| serde_json::from_str(&s).ok()),
            refs: refs.and_then(|s| serde_json::from_str(&s).ok()),
            mentions: parse_json_list(row.get("mentions")),
            routed_to: row.get("routed_to"),
            routed_id: row.get("routed_id"),
            resolved: row.get::<i64, _>("resolved") != 0,
            created_at: row.get("created_at"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DocsIndexEntry {
    pub id: i64,
    pub path: String,
    pub category: String,
    pub title: String,
    pub purpose: Option<String>,
    pub when_to_read: Option<String>,
    pub keywords: Vec<String>,
    pub updated_at: String,
}

impl DocsIndexEntry {
    pub fn from_row(row: &SqliteRow) -> Self {
        Self {
            id: row.get("id"),
            path: row.get("path"),
            category: row.get("category"),
            title: row.get("title"),
            purpose: row.get("purpose"),
            when_to_read: row.get("when_to_read"),
            keywords: parse_json_list(row.get("keywords")),
            updated_at: row.get("updated_at"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json_list_tolerates_bad_input() {
        assert_eq!(parse_json_list(None), Vec::<String>::new());
        assert_eq!(parse_json_list(Some("not json".into())), Vec::<String>::new());
        assert_eq!(
            parse_json_list(Some("[\"a\",\"b\"]".into())),
            vec!["a".to_string(), "b".to_string()]
        );
    }

    #[test]
    fn test_to_json_list_roundtrip() {
        let files = vec!["src/a.rs".to_string(), "src/b.rs".to_string()];
        assert_eq!(parse_json_list(Some(to_json_list(&files))), files);
    }
}
