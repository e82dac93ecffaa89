//! Enforced work sessions for bug fixing.
//!
//! A work session is a small state machine that gates a bug's path to
//! `review`. Starting one claims the bug and surfaces everything already
//! known about its area (code docs, learnings, completed bugs, decisions);
//! completing one requires a summary, a root cause, and a non-empty list of
//! changed files, none of which may be a protected test path.
//!
//! CLI processes are short-lived, so session state lives in the
//! `work_sessions` table rather than in memory. At most one incomplete
//! session exists per bug.

use anyhow::{bail, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::board;
use crate::bugs;
use crate::config::Config;
use crate::db;
use crate::models::{self, Bug, CodeDoc, Decision, Learning};
use crate::render;
use crate::vocab::MessageType;

// Files matching these patterns cannot be modified during bug fixes. Test
// changes go through a separate approval, not through a fix session.
const PROTECTED_GLOBS: &[&str] = &[
    "qa/**",
    "**/*.spec.ts",
    "**/*.test.ts",
    "**/*.spec.tsx",
    "**/*.test.tsx",
];

const PROTECTED_DIR_SEGMENTS: &[&str] = &["test", "tests", "__tests__", "e2e", "spec"];

/// Build the protected-path matcher: built-in patterns plus any
/// `[protected].extra_globs` from config.
pub fn protected_globset(config: &Config) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in PROTECTED_GLOBS {
        builder.add(Glob::new(pattern)?);
    }
    for pattern in &config.protected.extra_globs {
        builder.add(Glob::new(&pattern.to_lowercase())?);
    }
    Ok(builder.build()?)
}

/// Check whether a path is protected. Case-insensitive; backslashes are
/// normalized so Windows-style paths match the same patterns.
pub fn is_protected_path(file_path: &str, globs: &GlobSet) -> bool {
    let normalized = file_path.replace('\\', "/").to_lowercase();

    if globs.is_match(&normalized) {
        return true;
    }
    if normalized.starts_with("qa/") {
        return true;
    }
    if normalized
        .split('/')
        .any(|part| PROTECTED_DIR_SEGMENTS.contains(&part))
    {
        return true;
    }
    false
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkSessionRecord {
    pub id: String,
    pub author: String,
    pub bug_id: String,
    pub started_at: String,
    pub completed_at: Option<String>,
    pub files_touched: Vec<String>,
    pub notes: Vec<String>,
    pub learning_logged: bool,
    pub review_requested: bool,
}

impl WorkSessionRecord {
    pub fn is_complete(&self) -> bool {
        self.completed_at.is_some()
    }

    fn from_row(row: &SqliteRow) -> Self {
        Self {
            id: row.get("id"),
            author: row.get("author"),
            bug_id: row.get("bug_id"),
            started_at: row.get("started_at"),
            completed_at: row.get("completed_at"),
            files_touched: models::parse_json_list(row.get("files_touched")),
            notes: models::parse_json_list(row.get("notes")),
            learning_logged: row.get::<i64, _>("learning_logged") != 0,
            review_requested: row.get::<i64, _>("review_requested") != 0,
        }
    }
}

/// Everything worth knowing before touching code for a bug. Loaded once at
/// session start and printed to the worker.
#[derive(Debug, Serialize)]
pub struct WorkContext {
    pub bug: Bug,
    pub code_docs: Vec<CodeDoc>,
    pub learnings: Vec<Learning>,
    pub similar_bugs: Vec<Bug>,
    pub decisions: Vec<Decision>,
}

impl WorkContext {
    pub fn summary(&self) -> String {
        let mut lines = vec![
            format!("=== WORK CONTEXT FOR {} ===", self.bug.id),
            String::new(),
            format!("BUG: {}", self.bug.title),
            format!("Area: {}", self.bug.area.as_deref().unwrap_or("(none)")),
            format!("Priority: {}", self.bug.priority),
            String::new(),
        ];

        if let Some(ref description) = self.bug.description {
            lines.push(format!("Description: {}", description));
            lines.push(String::new());
        }

        if !self.bug.acceptance_criteria.is_empty() {
            lines.push("Acceptance Criteria:".to_string());
            for criterion in &self.bug.acceptance_criteria {
                lines.push(format!("  - {}", criterion));
            }
            lines.push(String::new());
        }

        if !self.code_docs.is_empty() {
            lines.push(format!("RELATED CODE ({} items):", self.code_docs.len()));
            for doc in self.code_docs.iter().take(10) {
                let symbol = doc
                    .symbol_name
                    .as_deref()
                    .map(|s| format!("::{}", s))
                    .unwrap_or_default();
                lines.push(format!(
                    "  - {}{} ({})",
                    doc.file_path, symbol, doc.symbol_type
                ));
                lines.push(format!("    {}", clip(&doc.purpose, 80)));
            }
            lines.push(String::new());
        }

        if !self.learnings.is_empty() {
            lines.push(format!("RELEVANT LEARNINGS ({} items):", self.learnings.len()));
            for learn in self.learnings.iter().take(5) {
                lines.push(format!("  - [{}] {}", learn.category, learn.learning));
            }
            lines.push(String::new());
        }

        if !self.similar_bugs.is_empty() {
            lines.push(format!(
                "REFERENCE ONLY - COMPLETED BUGS FOR CONTEXT ({} items):",
                self.similar_bugs.len()
            ));
            lines.push(
                "  (Do NOT work on these - they are already done. Use for patterns.)".to_string(),
            );
            for bug in self.similar_bugs.iter().take(5) {
                lines.push(format!("  - {} (DONE): {}", bug.id, bug.title));
                if let Some(ref root_cause) = bug.root_cause {
                    lines.push(format!("    Root cause: {}", clip(root_cause, 60)));
                }
                if let Some(ref fix) = bug.fix_applied {
                    lines.push(format!("    Fix: {}", clip(fix, 60)));
                }
            }
            lines.push(String::new());
        }

        if !self.decisions.is_empty() {
            lines.push(format!("RELATED DECISIONS ({} items):", self.decisions.len()));
            for dec in self.decisions.iter().take(5) {
                lines.push(format!("  - {}", dec.decision));
                lines.push(format!("    Rationale: {}", clip(&dec.rationale, 60)));
            }
            lines.push(String::new());
        }

        lines.join("\n")
    }
}

fn clip(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let clipped: String = s.chars().take(max).collect();
        format!("{}...", clipped)
    }
}

// ============ Context loading ============

pub async fn load_context(pool: &SqlitePool, bug_id: &str) -> Result<WorkContext> {
    let bug = match bugs::get_bug(pool, bug_id).await? {
        Some(bug) => bug,
        None => bail!("Bug not found: {}", bug_id),
    };

    let (code_docs, learnings, similar_bugs, decisions) = match bug.area {
        Some(ref area) => (
            load_code_docs(pool, area).await?,
            load_learnings(pool, area).await?,
            load_similar_bugs(pool, area, &bug.id).await?,
            load_decisions(pool, area).await?,
        ),
        None => (Vec::new(), Vec::new(), Vec::new(), Vec::new()),
    };

    Ok(WorkContext {
        bug,
        code_docs,
        learnings,
        similar_bugs,
        decisions,
    })
}

async fn load_code_docs(pool: &SqlitePool, area: &str) -> Result<Vec<CodeDoc>> {
    let rows = sqlx::query(
        "SELECT * FROM code_docs WHERE area = ? ORDER BY file_path, line_start LIMIT 50",
    )
    .bind(area)
    .fetch_all(pool)
    .await?;
    Ok(rows.iter().map(CodeDoc::from_row).collect())
}

async fn load_learnings(pool: &SqlitePool, area: &str) -> Result<Vec<Learning>> {
    let rows = sqlx::query(
        r#"
        SELECT * FROM learnings
        WHERE category = ? OR category = 'general'
        ORDER BY created_at DESC, id DESC
        LIMIT 20
        "#,
    )
    .bind(area)
    .fetch_all(pool)
    .await?;
    Ok(rows.iter().map(Learning::from_row).collect())
}

async fn load_similar_bugs(pool: &SqlitePool, area: &str, exclude_id: &str) -> Result<Vec<Bug>> {
    let rows = sqlx::query(
        r#"
        SELECT * FROM bugs
        WHERE area = ? AND status = 'done' AND id != ?
        ORDER BY updated_at DESC, id DESC
        LIMIT 10
        "#,
    )
    .bind(area)
    .bind(exclude_id)
    .fetch_all(pool)
    .await?;
    Ok(rows.iter().map(Bug::from_row).collect())
}

async fn load_decisions(pool: &SqlitePool, area: &str) -> Result<Vec<Decision>> {
    let rows = sqlx::query(
        r#"
        SELECT * FROM decisions
        WHERE related_area = ? OR related_area IS NULL
        ORDER BY created_at DESC, id DESC
        LIMIT 10
        "#,
    )
    .bind(area)
    .fetch_all(pool)
    .await?;
    Ok(rows.iter().map(Decision::from_row).collect())
}

// ============ Session lookup ============

async fn active_session(pool: &SqlitePool, bug_id: &str) -> Result<Option<WorkSessionRecord>> {
    let row = sqlx::query(
        r#"
        SELECT * FROM work_sessions
        WHERE bug_id = ? COLLATE NOCASE AND completed_at IS NULL
        ORDER BY started_at DESC
        LIMIT 1
        "#,
    )
    .bind(bug_id.to_uppercase())
    .fetch_optional(pool)
    .await?;
    Ok(row.as_ref().map(WorkSessionRecord::from_row))
}

async fn latest_session(pool: &SqlitePool, bug_id: &str) -> Result<Option<WorkSessionRecord>> {
    let row = sqlx::query(
        r#"
        SELECT * FROM work_sessions
        WHERE bug_id = ? COLLATE NOCASE
        ORDER BY started_at DESC, rowid DESC
        LIMIT 1
        "#,
    )
    .bind(bug_id.to_uppercase())
    .fetch_optional(pool)
    .await?;
    Ok(row.as_ref().map(WorkSessionRecord::from_row))
}

/// Resolve the session a subcommand refers to. With an explicit bug ID, the
/// active session for that bug; without one, the only active session, if
/// exactly one exists.
async fn resolve_active(pool: &SqlitePool, bug_id: Option<&str>) -> Result<WorkSessionRecord> {
    if let Some(bug_id) = bug_id {
        return match active_session(pool, bug_id).await? {
            Some(session) => Ok(session),
            None => bail!(
                "No active work session for {}. Start one with 'tb work start {}'.",
                bug_id.to_uppercase(),
                bug_id.to_uppercase()
            ),
        };
    }

    let rows = sqlx::query("SELECT * FROM work_sessions WHERE completed_at IS NULL")
        .fetch_all(pool)
        .await?;
    match rows.len() {
        0 => bail!("No active work session. Start one with 'tb work start <BUG-ID>'."),
        1 => Ok(WorkSessionRecord::from_row(&rows[0])),
        n => bail!(
            "{} active work sessions; pass --bug to pick one.",
            n
        ),
    }
}

// ============ Commands ============

/// Start a work session: claim the bug, log the start on the board, and
/// print the surfaced context.
pub async fn run_start(config: &Config, bug_id: &str, as_flag: Option<&str>) -> Result<()> {
    let author = config.resolve_author(as_flag)?;
    let pool = db::connect(config).await?;

    let context = load_context(&pool, bug_id).await?;
    if context.bug.status == "done" {
        pool.close().await;
        bail!(
            "{} is already done. Reopen it first with 'tb bugs update --id {} --status open'.",
            context.bug.id,
            context.bug.id
        );
    }
    if let Some(existing) = active_session(&pool, bug_id).await? {
        pool.close().await;
        bail!(
            "{} already has an active session (started {} by {}).",
            context.bug.id,
            existing.started_at,
            existing.author
        );
    }

    let session_id = Uuid::new_v4().to_string();
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO work_sessions (id, author, bug_id, started_at)
        VALUES (?, ?, ?, datetime('now'))
        "#,
    )
    .bind(&session_id)
    .bind(&author)
    .bind(&context.bug.id)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        UPDATE bugs SET status = 'in_progress', owner = ?, updated_at = datetime('now')
        WHERE id = ?
        "#,
    )
    .bind(&author)
    .bind(&context.bug.id)
    .execute(&mut *tx)
    .await?;

    board::insert_message(
        &mut *tx,
        &author,
        MessageType::Status,
        &format!("Started work on {}: {}", context.bug.id, context.bug.title),
        None,
        Some(&serde_json::json!({ "bug_id": context.bug.id })),
        &[],
    )
    .await?;

    tx.commit().await?;
    pool.close().await;

    println!("Started session {} for {}", session_id, context.bug.id);
    println!();
    println!("{}", context.summary());
    Ok(())
}

/// Record a file touched during the session. Protected test paths are
/// rejected outright.
pub async fn run_touch(config: &Config, file_path: &str, bug_id: Option<&str>) -> Result<()> {
    let globs = protected_globset(config)?;
    if is_protected_path(file_path, &globs) {
        bail!(
            "Cannot modify test file '{}' during a bug fix. Test changes require \
             separate approval. Fix the code, not the tests.",
            file_path
        );
    }

    let pool = db::connect(config).await?;
    let mut session = resolve_active(&pool, bug_id).await?;

    if !session.files_touched.iter().any(|f| f == file_path) {
        session.files_touched.push(file_path.to_string());
        sqlx::query("UPDATE work_sessions SET files_touched = ? WHERE id = ?")
            .bind(models::to_json_list(&session.files_touched))
            .bind(&session.id)
            .execute(&pool)
            .await?;
    }
    pool.close().await;

    println!(
        "Touched {} ({} file{} in session)",
        file_path,
        session.files_touched.len(),
        if session.files_touched.len() == 1 { "" } else { "s" }
    );
    Ok(())
}

pub async fn run_note(config: &Config, note: &str, bug_id: Option<&str>) -> Result<()> {
    if note.trim().is_empty() {
        bail!("Note must not be empty");
    }

    let pool = db::connect(config).await?;
    let mut session = resolve_active(&pool, bug_id).await?;

    session.notes.push(note.to_string());
    sqlx::query("UPDATE work_sessions SET notes = ? WHERE id = ?")
        .bind(models::to_json_list(&session.notes))
        .bind(&session.id)
        .execute(&pool)
        .await?;
    pool.close().await;

    println!("Noted ({} note{})", session.notes.len(), if session.notes.len() == 1 { "" } else { "s" });
    Ok(())
}

pub async fn run_status(config: &Config, bug_id: Option<&str>, json: bool) -> Result<()> {
    let pool = db::connect(config).await?;

    let session = match bug_id {
        Some(bug_id) => match latest_session(&pool, bug_id).await? {
            Some(session) => session,
            None => {
                pool.close().await;
                bail!("No work session recorded for {}", bug_id.to_uppercase());
            }
        },
        None => resolve_active(&pool, None).await?,
    };
    pool.close().await;

    if json {
        render::print_json(&session)?;
        return Ok(());
    }

    println!("Session:   {}", session.id);
    println!("Bug:       {}", session.bug_id);
    println!("Author:    {}", session.author);
    println!("Started:   {}", session.started_at);
    match session.completed_at {
        Some(ref ts) => println!("Completed: {}", ts),
        None => println!("Completed: (in progress)"),
    }
    println!("Files touched ({}):", session.files_touched.len());
    for file in &session.files_touched {
        println!("  - {}", file);
    }
    println!("Notes ({}):", session.notes.len());
    for note in &session.notes {
        println!("  - {}", note);
    }
    println!(
        "Learning logged: {}   Review requested: {}",
        session.learning_logged, session.review_requested
    );
    Ok(())
}

/// Complete the session. All gates must pass; on success the bug moves to
/// `review` and a changelog entry is written, atomically.
pub async fn run_complete(
    config: &Config,
    bug_id: &str,
    summary: &str,
    root_cause: &str,
    files_csv: Option<&str>,
) -> Result<()> {
    let pool = db::connect(config).await?;
    let session = resolve_active(&pool, Some(bug_id)).await?;

    // Gate 1 & 2: summary and root cause must have substance
    if summary.trim().is_empty() {
        pool.close().await;
        bail!("Summary is required");
    }
    if root_cause.trim().is_empty() {
        pool.close().await;
        bail!("Root cause is required");
    }

    // Gate 3: at least one file; explicit --files overrides touched files
    let final_files: Vec<String> = match files_csv {
        Some(csv) => csv
            .split(',')
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(str::to_string)
            .collect(),
        None => session.files_touched.clone(),
    };
    if final_files.is_empty() {
        pool.close().await;
        bail!("No files changed. Use 'tb work touch' during work or pass --files.");
    }

    // Gate 4: test immutability holds for the final list too
    let globs = protected_globset(config)?;
    for file in &final_files {
        if is_protected_path(file, &globs) {
            pool.close().await;
            bail!(
                "Cannot complete with test file '{}' in changes. Fix the code, \
                 not the tests. Test changes require separate approval.",
                file
            );
        }
    }

    let bug = match bugs::get_bug(&pool, &session.bug_id).await? {
        Some(bug) => bug,
        None => {
            pool.close().await;
            bail!("Bug not found: {}", session.bug_id);
        }
    };

    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        UPDATE bugs
        SET status = 'review', root_cause = ?, fix_applied = ?, files_changed = ?,
            updated_at = datetime('now')
        WHERE id = ?
        "#,
    )
    .bind(root_cause)
    .bind(summary)
    .bind(models::to_json_list(&final_files))
    .bind(&bug.id)
    .execute(&mut *tx)
    .await?;

    board::insert_message(
        &mut *tx,
        &session.author,
        MessageType::Status,
        &format!("Completed {}: {}", bug.id, summary),
        None,
        Some(&serde_json::json!({ "bug_id": bug.id })),
        &[],
    )
    .await?;

    sqlx::query(
        r#"
        INSERT INTO changelog (date, title, what_changed, what_it_was, why,
                               files_affected, related_bug_id, created_at)
        VALUES (date('now'), ?, ?, ?, ?, ?, ?, datetime('now'))
        "#,
    )
    .bind(format!("Fix {}: {}", bug.id, bug.title))
    .bind(summary)
    .bind(root_cause)
    .bind(format!("Bug fix: {}", root_cause))
    .bind(models::to_json_list(&final_files))
    .bind(&bug.id)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        UPDATE work_sessions
        SET completed_at = datetime('now'), files_touched = ?
        WHERE id = ?
        "#,
    )
    .bind(models::to_json_list(&final_files))
    .bind(&session.id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    pool.close().await;

    println!("{} completed and moved to review.", bug.id);
    println!("Remember to log what you learned: tb work learn {} --learning \"...\"", bug.id);
    Ok(())
}

/// Record a learning from this session, linked to the bug. Category defaults
/// to the bug's area, falling back to `general`.
pub async fn run_learn(
    config: &Config,
    bug_id: &str,
    learning: &str,
    category: Option<&str>,
    context: Option<&str>,
) -> Result<()> {
    if learning.trim().len() < 10 {
        bail!("Learning must be at least 10 characters");
    }

    let pool = db::connect(config).await?;
    let session = match latest_session(&pool, bug_id).await? {
        Some(session) => session,
        None => {
            pool.close().await;
            bail!(
                "No work session recorded for {}. Use 'tb learn add' for standalone learnings.",
                bug_id.to_uppercase()
            );
        }
    };

    let bug = bugs::get_bug(&pool, &session.bug_id).await?;
    let category = match category {
        Some(c) => {
            if !config.is_learning_category(c) {
                pool.close().await;
                bail!(
                    "Invalid learning category '{}'. Must be 'general' or a configured area.",
                    c
                );
            }
            c.to_string()
        }
        None => bug
            .as_ref()
            .and_then(|b| b.area.clone())
            .filter(|area| config.is_learning_category(area))
            .unwrap_or_else(|| "general".to_string()),
    };

    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        r#"
        INSERT INTO learnings (category, learning, context, related_bug_id, created_at)
        VALUES (?, ?, ?, ?, datetime('now'))
        "#,
    )
    .bind(&category)
    .bind(learning)
    .bind(context)
    .bind(&session.bug_id)
    .execute(&mut *tx)
    .await?;
    let learning_id = result.last_insert_rowid();

    let msg_id = board::insert_message(
        &mut *tx,
        &session.author,
        MessageType::Learning,
        learning,
        Some(&serde_json::json!({ "category": category, "bug_id": session.bug_id })),
        None,
        &[],
    )
    .await?;
    sqlx::query("UPDATE messages SET routed_to = 'learnings', routed_id = ? WHERE id = ?")
        .bind(learning_id.to_string())
        .bind(msg_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("UPDATE work_sessions SET learning_logged = 1 WHERE id = ?")
        .bind(&session.id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    pool.close().await;

    println!("Logged learning {} for {}", learning_id, session.bug_id);
    Ok(())
}

/// Request review from the configured reviewer. Only valid once the session
/// is complete.
pub async fn run_review(config: &Config, bug_id: &str, notes: Option<&str>) -> Result<()> {
    let pool = db::connect(config).await?;
    let session = match latest_session(&pool, bug_id).await? {
        Some(session) => session,
        None => {
            pool.close().await;
            bail!("No work session recorded for {}", bug_id.to_uppercase());
        }
    };
    if !session.is_complete() {
        pool.close().await;
        bail!("Cannot request review before completing work");
    }

    let mut content = format!("Review requested for {}", session.bug_id);
    if let Some(notes) = notes {
        content.push_str(": ");
        content.push_str(notes);
    }
    let reviewer = format!("@{}", config.team.reviewer);

    let mut tx = pool.begin().await?;
    board::insert_message(
        &mut *tx,
        &session.author,
        MessageType::ReviewRequest,
        &content,
        None,
        Some(&serde_json::json!({ "bug_id": session.bug_id })),
        &[reviewer.clone()],
    )
    .await?;
    sqlx::query("UPDATE work_sessions SET review_requested = 1 WHERE id = ?")
        .bind(&session.id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    pool.close().await;

    println!("Review requested from {} for {}", reviewer, session.bug_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn globs() -> GlobSet {
        protected_globset(&Config::minimal()).unwrap()
    }

    #[test]
    fn test_protected_qa_prefix() {
        let globs = globs();
        assert!(is_protected_path("QA/api/auth.test.ts", &globs));
        assert!(is_protected_path("qa/e2e/smoke.spec.ts", &globs));
    }

    #[test]
    fn test_protected_extensions() {
        let globs = globs();
        assert!(is_protected_path("src/components/Toast.test.tsx", &globs));
        assert!(is_protected_path("src/lib/api.spec.ts", &globs));
    }

    #[test]
    fn test_protected_dir_segments() {
        let globs = globs();
        assert!(is_protected_path("src/__tests__/helpers.ts", &globs));
        assert!(is_protected_path("packages/core/tests/fixtures.ts", &globs));
        assert!(is_protected_path("e2e/onboarding.ts", &globs));
    }

    #[test]
    fn test_backslashes_normalized() {
        let globs = globs();
        assert!(is_protected_path("QA\\api\\auth.test.ts", &globs));
        assert!(is_protected_path("src\\__tests__\\x.ts", &globs));
    }

    #[test]
    fn test_regular_source_not_protected() {
        let globs = globs();
        assert!(!is_protected_path("src/components/Toast.tsx", &globs));
        assert!(!is_protected_path("src/lib/storage.ts", &globs));
        // "test" must be a full path segment, not a substring
        assert!(!is_protected_path("src/contest/entry.ts", &globs));
        assert!(!is_protected_path("src/latest.ts", &globs));
    }

    #[test]
    fn test_extra_globs_from_config() {
        let mut config = Config::minimal();
        config.protected.extra_globs = vec!["migrations/**".to_string()];
        let globs = protected_globset(&config).unwrap();
        assert!(is_protected_path("migrations/001_init.sql", &globs));
        assert!(!is_protected_path("src/db.rs", &globs));
    }

    #[test]
    fn test_context_summary_sections() {
        let context = WorkContext {
            bug: Bug {
                id: "BUG-026".into(),
                title: "Toast never dismisses".into(),
                status: "open".into(),
                priority: "high".into(),
                area: Some("ui".into()),
                owner: None,
                trivial: false,
                description: Some("Toast stays on screen".into()),
                expected_behavior: None,
                root_cause: None,
                fix_applied: None,
                files_changed: vec![],
                acceptance_criteria: vec!["Toast dismisses after 5s".into()],
                found_by: None,
                verified_by: None,
                created_at: String::new(),
                updated_at: String::new(),
            },
            code_docs: vec![],
            learnings: vec![Learning {
                id: 1,
                category: "ui".into(),
                learning: "Attach handlers in effects".into(),
                context: None,
                related_bug_id: None,
                created_at: String::new(),
            }],
            similar_bugs: vec![],
            decisions: vec![],
        };

        let summary = context.summary();
        assert!(summary.contains("=== WORK CONTEXT FOR BUG-026 ==="));
        assert!(summary.contains("Acceptance Criteria:"));
        assert!(summary.contains("RELEVANT LEARNINGS (1 items):"));
        assert!(!summary.contains("RELATED CODE"));
    }
}
