//! Bug tracker storage and commands.
//!
//! Bugs carry the full fix record: status lifecycle (open -> in_progress ->
//! review -> done), root cause, fix summary, and the files changed. The
//! normal path to `review` is a work session ([`crate::session`]);
//! `run_complete` is the escape hatch for fixes that landed outside one.

use anyhow::{bail, Result};
use sqlx::{Row, SqlitePool};

use crate::board;
use crate::config::Config;
use crate::db;
use crate::models::{Bug, CodeDoc};
use crate::render;
use crate::vocab::{BugStatus, MessageType, Priority, Relationship};

pub async fn get_bug(pool: &SqlitePool, bug_id: &str) -> Result<Option<Bug>> {
    let row = sqlx::query("SELECT * FROM bugs WHERE id = ? COLLATE NOCASE")
        .bind(bug_id.to_uppercase())
        .fetch_optional(pool)
        .await?;
    Ok(row.as_ref().map(Bug::from_row))
}

/// Allocate the next sequential BUG-N id, zero-padded to three digits.
pub async fn next_bug_id(pool: &SqlitePool) -> Result<String> {
    let ids: Vec<String> = sqlx::query_scalar("SELECT id FROM bugs WHERE id LIKE 'BUG-%'")
        .fetch_all(pool)
        .await?;

    let max = ids
        .iter()
        .filter_map(|id| id.strip_prefix("BUG-"))
        .filter_map(|n| n.parse::<u64>().ok())
        .max()
        .unwrap_or(0);

    Ok(format!("BUG-{:03}", max + 1))
}

#[derive(Debug, Default)]
pub struct BugFilters {
    pub id: Option<String>,
    pub status: Option<BugStatus>,
    pub priority: Option<Priority>,
    pub area: Option<String>,
    pub owner: Option<String>,
}

pub async fn run_list(config: &Config, filters: &BugFilters, limit: i64, json: bool) -> Result<()> {
    let pool = db::connect(config).await?;

    let mut conditions: Vec<&str> = Vec::new();
    let mut params: Vec<String> = Vec::new();

    if let Some(ref id) = filters.id {
        conditions.push("id = ?");
        params.push(id.to_uppercase());
    }
    if let Some(status) = filters.status {
        conditions.push("status = ?");
        params.push(status.as_str().to_string());
    }
    if let Some(priority) = filters.priority {
        conditions.push("priority = ?");
        params.push(priority.as_str().to_string());
    }
    if let Some(ref area) = filters.area {
        conditions.push("area = ?");
        params.push(area.clone());
    }
    if let Some(ref owner) = filters.owner {
        conditions.push("owner = ?");
        params.push(owner.clone());
    }

    let where_clause = if conditions.is_empty() {
        "1=1".to_string()
    } else {
        conditions.join(" AND ")
    };

    // Critical first, then newest
    let sql = format!(
        r#"
        SELECT * FROM bugs
        WHERE {}
        ORDER BY
            CASE priority
                WHEN 'critical' THEN 1
                WHEN 'high' THEN 2
                WHEN 'medium' THEN 3
                WHEN 'low' THEN 4
            END,
            created_at DESC,
            id DESC
        LIMIT ?
        "#,
        where_clause
    );

    let mut query = sqlx::query(&sql);
    for p in &params {
        query = query.bind(p);
    }
    let rows = query.bind(limit).fetch_all(&pool).await?;
    let bugs: Vec<Bug> = rows.iter().map(Bug::from_row).collect();
    pool.close().await;

    if json {
        render::print_json(&bugs)?;
    } else {
        let table_rows: Vec<Vec<String>> = bugs
            .iter()
            .map(|b| {
                vec![
                    b.id.clone(),
                    b.title.clone(),
                    b.status.clone(),
                    b.priority.clone(),
                    b.area.clone().unwrap_or_default(),
                    b.owner.clone().unwrap_or_default(),
                ]
            })
            .collect();
        println!(
            "{}",
            render::format_table(
                &["id", "title", "status", "priority", "area", "owner"],
                &table_rows
            )
        );
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub async fn run_add(
    config: &Config,
    title: &str,
    area: &str,
    priority: Priority,
    owner: Option<&str>,
    description: Option<&str>,
    expected_behavior: Option<&str>,
    found_by: Option<&str>,
) -> Result<()> {
    if title.trim().len() < 5 {
        bail!("Bug title must be at least 5 characters");
    }
    if !config.is_area(area) {
        bail!(
            "Invalid area '{}'. Must be one of: {}",
            area,
            config.vocab.areas.join(", ")
        );
    }
    if let Some(owner) = owner {
        if !config.is_member(owner) {
            bail!(
                "Unknown owner '{}'. Must be one of: {}",
                owner,
                config.team.members.join(", ")
            );
        }
    }
    let found_by = match found_by {
        Some(name) => Some(config.resolve_author(Some(name))?),
        None => None,
    };

    let pool = db::connect(config).await?;
    let bug_id = next_bug_id(&pool).await?;

    sqlx::query(
        r#"
        INSERT INTO bugs (id, title, status, priority, area, owner, description,
                          expected_behavior, found_by, created_at, updated_at)
        VALUES (?, ?, 'open', ?, ?, ?, ?, ?, ?, datetime('now'), datetime('now'))
        "#,
    )
    .bind(&bug_id)
    .bind(title)
    .bind(priority.as_str())
    .bind(area)
    .bind(owner)
    .bind(description)
    .bind(expected_behavior)
    .bind(found_by)
    .execute(&pool)
    .await?;
    pool.close().await;

    println!("Created bug: {}", bug_id);
    Ok(())
}

#[derive(Debug, Default)]
pub struct BugUpdates {
    pub status: Option<BugStatus>,
    pub priority: Option<Priority>,
    pub owner: Option<String>,
    pub root_cause: Option<String>,
    pub fix_applied: Option<String>,
    pub verified_by: Option<String>,
}

pub async fn run_update(config: &Config, bug_id: &str, updates: &BugUpdates) -> Result<()> {
    let mut set_parts: Vec<&str> = Vec::new();
    let mut params: Vec<String> = Vec::new();

    if let Some(status) = updates.status {
        set_parts.push("status = ?");
        params.push(status.as_str().to_string());
    }
    if let Some(priority) = updates.priority {
        set_parts.push("priority = ?");
        params.push(priority.as_str().to_string());
    }
    if let Some(ref owner) = updates.owner {
        if !config.is_member(owner) {
            bail!(
                "Unknown owner '{}'. Must be one of: {}",
                owner,
                config.team.members.join(", ")
            );
        }
        set_parts.push("owner = ?");
        params.push(owner.clone());
    }
    if let Some(ref root_cause) = updates.root_cause {
        set_parts.push("root_cause = ?");
        params.push(root_cause.clone());
    }
    if let Some(ref fix) = updates.fix_applied {
        set_parts.push("fix_applied = ?");
        params.push(fix.clone());
    }
    if let Some(ref verifier) = updates.verified_by {
        if !config.is_member(verifier) {
            bail!(
                "Unknown team member '{}'. Must be one of: {}",
                verifier,
                config.team.members.join(", ")
            );
        }
        set_parts.push("verified_by = ?");
        params.push(verifier.clone());
    }

    if set_parts.is_empty() {
        bail!("No updates specified");
    }
    set_parts.push("updated_at = datetime('now')");

    let pool = db::connect(config).await?;
    let sql = format!(
        "UPDATE bugs SET {} WHERE id = ? COLLATE NOCASE",
        set_parts.join(", ")
    );
    let mut query = sqlx::query(&sql);
    for p in &params {
        query = query.bind(p);
    }
    let result = query.bind(bug_id.to_uppercase()).execute(&pool).await?;
    pool.close().await;

    if result.rows_affected() == 0 {
        bail!("Bug not found: {}", bug_id);
    }
    println!("Updated bug: {}", bug_id.to_uppercase());
    Ok(())
}

pub async fn run_link(
    config: &Config,
    bug_id: &str,
    code_doc_id: i64,
    relationship: Relationship,
    notes: Option<&str>,
) -> Result<()> {
    let pool = db::connect(config).await?;

    if get_bug(&pool, bug_id).await?.is_none() {
        pool.close().await;
        bail!("Bug not found: {}", bug_id);
    }
    let doc_exists: bool = sqlx::query_scalar("SELECT COUNT(*) > 0 FROM code_docs WHERE id = ?")
        .bind(code_doc_id)
        .fetch_one(&pool)
        .await?;
    if !doc_exists {
        pool.close().await;
        bail!("Code doc not found: {}", code_doc_id);
    }

    let result = sqlx::query(
        r#"
        INSERT INTO bug_code_refs (bug_id, code_doc_id, relationship, notes, created_at)
        VALUES (?, ?, ?, ?, datetime('now'))
        "#,
    )
    .bind(bug_id.to_uppercase())
    .bind(code_doc_id)
    .bind(relationship.as_str())
    .bind(notes)
    .execute(&pool)
    .await?;
    pool.close().await;

    println!("Created link: {}", result.last_insert_rowid());
    Ok(())
}

/// List code docs linked to a bug, with the relationship that links them.
pub async fn run_code(config: &Config, bug_id: &str, json: bool) -> Result<()> {
    let pool = db::connect(config).await?;
    let rows = sqlx::query(
        r#"
        SELECT c.*, r.relationship
        FROM code_docs c
        JOIN bug_code_refs r ON c.id = r.code_doc_id
        WHERE r.bug_id = ? COLLATE NOCASE
        ORDER BY c.file_path, c.line_start
        "#,
    )
    .bind(bug_id.to_uppercase())
    .fetch_all(&pool)
    .await?;

    let results: Vec<(CodeDoc, String)> = rows
        .iter()
        .map(|row| (CodeDoc::from_row(row), row.get("relationship")))
        .collect();
    pool.close().await;

    if json {
        let values: Vec<serde_json::Value> = results
            .iter()
            .map(|(doc, rel)| {
                let mut v = serde_json::to_value(doc).unwrap_or_default();
                v["relationship"] = serde_json::Value::String(rel.clone());
                v
            })
            .collect();
        render::print_json(&values)?;
    } else {
        let table_rows: Vec<Vec<String>> = results
            .iter()
            .map(|(doc, rel)| {
                vec![
                    doc.id.to_string(),
                    doc.file_path.clone(),
                    doc.symbol_name.clone().unwrap_or_default(),
                    rel.clone(),
                    doc.purpose.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            render::format_table(
                &["id", "file_path", "symbol_name", "relationship", "purpose"],
                &table_rows
            )
        );
    }

    Ok(())
}

/// Escape hatch: mark a bug done without a work session. Prefer
/// `tb work start` / `tb work complete` for new work.
pub async fn run_complete(
    config: &Config,
    bug_id: &str,
    summary: &str,
    root_cause: &str,
    as_flag: Option<&str>,
) -> Result<()> {
    let author = config.resolve_author(as_flag)?;
    if summary.trim().is_empty() {
        bail!("Summary is required");
    }
    if root_cause.trim().is_empty() {
        bail!("Root cause is required");
    }

    let pool = db::connect(config).await?;
    let bug = match get_bug(&pool, bug_id).await? {
        Some(bug) => bug,
        None => {
            pool.close().await;
            bail!("Bug not found: {}", bug_id);
        }
    };

    let mut tx = pool.begin().await?;
    sqlx::query(
        r#"
        UPDATE bugs
        SET status = 'done', owner = ?, fix_applied = ?, root_cause = ?,
            updated_at = datetime('now')
        WHERE id = ?
        "#,
    )
    .bind(&author)
    .bind(summary)
    .bind(root_cause)
    .bind(&bug.id)
    .execute(&mut *tx)
    .await?;

    board::insert_message(
        &mut *tx,
        &author,
        MessageType::Status,
        &format!("{} marked DONE. Summary: {}", bug.id, summary),
        None,
        Some(&serde_json::json!({ "bug_id": bug.id })),
        &[],
    )
    .await?;

    tx.commit().await?;
    pool.close().await;

    println!("{} marked done.", bug.id);
    Ok(())
}
