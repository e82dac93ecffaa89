use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

/// Create all tables and indexes. Idempotent — `CREATE TABLE IF NOT EXISTS`
/// throughout, so rerunning against a populated database is safe.
pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    apply_schema(&pool).await?;
    pool.close().await;
    Ok(())
}

pub async fn apply_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS bugs (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'open',
            priority TEXT NOT NULL DEFAULT 'medium',
            area TEXT,
            owner TEXT,
            trivial INTEGER NOT NULL DEFAULT 0,
            description TEXT,
            expected_behavior TEXT,
            root_cause TEXT,
            fix_applied TEXT,
            files_changed TEXT,
            acceptance_criteria TEXT,
            found_by TEXT,
            verified_by TEXT,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS code_docs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            file_path TEXT NOT NULL,
            symbol_name TEXT,
            symbol_type TEXT NOT NULL,
            parent_id INTEGER,
            line_start INTEGER,
            line_end INTEGER,
            signature TEXT,
            purpose TEXT NOT NULL,
            why TEXT,
            connections TEXT NOT NULL DEFAULT '[]',
            area TEXT NOT NULL,
            last_verified TEXT,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE(file_path, symbol_name, line_start)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS changelog (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            date TEXT NOT NULL,
            title TEXT NOT NULL,
            what_changed TEXT NOT NULL,
            what_it_was TEXT,
            why TEXT NOT NULL,
            files_affected TEXT NOT NULL DEFAULT '[]',
            related_bug_id TEXT,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS learnings (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            category TEXT NOT NULL,
            learning TEXT NOT NULL,
            context TEXT,
            related_bug_id TEXT,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS decisions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            date TEXT NOT NULL,
            decision TEXT NOT NULL,
            rationale TEXT NOT NULL,
            alternatives TEXT,
            related_area TEXT,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tasks (
            id TEXT PRIMARY KEY,
            bug_id TEXT,
            title TEXT NOT NULL,
            owner TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending',
            priority INTEGER NOT NULL DEFAULT 2,
            notes TEXT,
            files_editing TEXT NOT NULL DEFAULT '[]',
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Board messages are append-only; content never changes after insert,
    // only the resolved flag flips.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS messages (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            author TEXT NOT NULL,
            message_type TEXT NOT NULL,
            content TEXT NOT NULL,
            data TEXT,
            refs TEXT,
            mentions TEXT,
            routed_to TEXT,
            routed_id TEXT,
            resolved INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS bug_code_refs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            bug_id TEXT NOT NULL,
            code_doc_id INTEGER NOT NULL,
            relationship TEXT NOT NULL,
            notes TEXT,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS changelog_code_refs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            changelog_id INTEGER NOT NULL,
            code_doc_id INTEGER NOT NULL,
            change_type TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS code_calls (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            caller_id INTEGER NOT NULL,
            callee_id INTEGER,
            callee_name TEXT NOT NULL,
            call_type TEXT NOT NULL DEFAULT 'direct',
            line_number INTEGER,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS docs_index (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            path TEXT NOT NULL UNIQUE,
            category TEXT NOT NULL,
            title TEXT NOT NULL,
            purpose TEXT,
            when_to_read TEXT,
            keywords TEXT NOT NULL DEFAULT '[]',
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Work sessions persist across CLI invocations; at most one incomplete
    // session per bug (enforced at start time).
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS work_sessions (
            id TEXT PRIMARY KEY,
            author TEXT NOT NULL,
            bug_id TEXT NOT NULL,
            started_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            completed_at TEXT,
            files_touched TEXT NOT NULL DEFAULT '[]',
            notes TEXT NOT NULL DEFAULT '[]',
            learning_logged INTEGER NOT NULL DEFAULT 0,
            review_requested INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Curriculum tables: the stem is the sequential skeleton, each row
    // pointing at one payload row in content_blocks, prompts, or
    // curriculum_tools.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS stem (
            id INTEGER PRIMARY KEY,
            part INTEGER NOT NULL,
            module INTEGER NOT NULL,
            exercise INTEGER NOT NULL,
            activity INTEGER NOT NULL,
            sequence INTEGER NOT NULL,
            block_type TEXT NOT NULL,
            content_id INTEGER NOT NULL,
            connection_id INTEGER,
            UNIQUE(part, module, exercise, activity, sequence)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS content_blocks (
            id INTEGER PRIMARY KEY,
            content_type TEXT NOT NULL,
            content TEXT NOT NULL,
            version INTEGER NOT NULL DEFAULT 1,
            is_active INTEGER NOT NULL DEFAULT 1
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS prompts (
            id INTEGER PRIMARY KEY,
            prompt_text TEXT NOT NULL,
            input_type TEXT NOT NULL,
            input_config TEXT,
            version INTEGER NOT NULL DEFAULT 1,
            is_active INTEGER NOT NULL DEFAULT 1
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS curriculum_tools (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            instructions TEXT NOT NULL DEFAULT '',
            has_reminder INTEGER NOT NULL DEFAULT 0,
            reminder_frequency TEXT,
            version INTEGER NOT NULL DEFAULT 1,
            is_active INTEGER NOT NULL DEFAULT 1
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Indexes for the common filter columns
    for stmt in [
        "CREATE INDEX IF NOT EXISTS idx_bugs_status ON bugs(status)",
        "CREATE INDEX IF NOT EXISTS idx_bugs_area ON bugs(area)",
        "CREATE INDEX IF NOT EXISTS idx_code_docs_area ON code_docs(area)",
        "CREATE INDEX IF NOT EXISTS idx_code_docs_file ON code_docs(file_path)",
        "CREATE INDEX IF NOT EXISTS idx_code_docs_parent ON code_docs(parent_id)",
        "CREATE INDEX IF NOT EXISTS idx_messages_created ON messages(created_at DESC)",
        "CREATE INDEX IF NOT EXISTS idx_messages_type ON messages(message_type)",
        "CREATE INDEX IF NOT EXISTS idx_calls_caller ON code_calls(caller_id)",
        "CREATE INDEX IF NOT EXISTS idx_calls_callee ON code_calls(callee_id)",
        "CREATE INDEX IF NOT EXISTS idx_sessions_bug ON work_sessions(bug_id)",
        "CREATE INDEX IF NOT EXISTS idx_stem_order ON stem(part, module, exercise, activity, sequence)",
    ] {
        sqlx::query(stmt).execute(pool).await?;
    }

    Ok(())
}
