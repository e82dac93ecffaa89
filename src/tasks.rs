//! Task tracking: lightweight TASK-N records, optionally tied to a bug.

use anyhow::{bail, Result};
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;
use crate::models::Task;
use crate::render;
use crate::vocab::TaskStatus;

async fn next_task_id(pool: &SqlitePool) -> Result<String> {
    let ids: Vec<String> = sqlx::query_scalar("SELECT id FROM tasks WHERE id LIKE 'TASK-%'")
        .fetch_all(pool)
        .await?;
    let max = ids
        .iter()
        .filter_map(|id| id.strip_prefix("TASK-"))
        .filter_map(|n| n.parse::<u64>().ok())
        .max()
        .unwrap_or(0);
    Ok(format!("TASK-{:03}", max + 1))
}

pub async fn run_list(
    config: &Config,
    owner: Option<&str>,
    status: Option<TaskStatus>,
    bug_id: Option<&str>,
    limit: i64,
    json: bool,
) -> Result<()> {
    let pool = db::connect(config).await?;

    let mut conditions: Vec<&str> = Vec::new();
    let mut params: Vec<String> = Vec::new();

    if let Some(owner) = owner {
        conditions.push("owner = ?");
        params.push(owner.to_string());
    }
    if let Some(status) = status {
        conditions.push("status = ?");
        params.push(status.as_str().to_string());
    }
    if let Some(bug) = bug_id {
        conditions.push("bug_id = ?");
        params.push(bug.to_uppercase());
    }

    let where_clause = if conditions.is_empty() {
        "1=1".to_string()
    } else {
        conditions.join(" AND ")
    };

    let sql = format!(
        "SELECT * FROM tasks WHERE {} ORDER BY priority, created_at DESC LIMIT ?",
        where_clause
    );
    let mut query = sqlx::query(&sql);
    for p in &params {
        query = query.bind(p);
    }
    let rows = query.bind(limit).fetch_all(&pool).await?;
    let tasks: Vec<Task> = rows.iter().map(Task::from_row).collect();
    pool.close().await;

    if json {
        render::print_json(&tasks)?;
    } else {
        let table_rows: Vec<Vec<String>> = tasks
            .iter()
            .map(|t| {
                vec![
                    t.id.clone(),
                    t.title.clone(),
                    t.owner.clone(),
                    t.status.clone(),
                    t.priority.to_string(),
                    t.bug_id.clone().unwrap_or_default(),
                ]
            })
            .collect();
        println!(
            "{}",
            render::format_table(
                &["id", "title", "owner", "status", "priority", "bug"],
                &table_rows
            )
        );
    }

    Ok(())
}

pub async fn run_add(
    config: &Config,
    title: &str,
    owner: &str,
    bug_id: Option<&str>,
    priority: i64,
    notes: Option<&str>,
) -> Result<()> {
    if title.trim().len() < 5 {
        bail!("Task title must be at least 5 characters");
    }
    if !config.is_member(owner) {
        bail!(
            "Unknown owner '{}'. Must be one of: {}",
            owner,
            config.team.members.join(", ")
        );
    }
    if !(1..=3).contains(&priority) {
        bail!("Priority must be 1 (high), 2 (medium), or 3 (low)");
    }

    let pool = db::connect(config).await?;
    let task_id = next_task_id(&pool).await?;

    sqlx::query(
        r#"
        INSERT INTO tasks (id, bug_id, title, owner, status, priority, notes,
                           created_at, updated_at)
        VALUES (?, ?, ?, ?, 'pending', ?, ?, datetime('now'), datetime('now'))
        "#,
    )
    .bind(&task_id)
    .bind(bug_id.map(str::to_uppercase))
    .bind(title)
    .bind(owner)
    .bind(priority)
    .bind(notes)
    .execute(&pool)
    .await?;
    pool.close().await;

    println!("Created task: {}", task_id);
    Ok(())
}

pub async fn run_update(
    config: &Config,
    task_id: &str,
    status: Option<TaskStatus>,
    owner: Option<&str>,
    notes: Option<&str>,
    priority: Option<i64>,
) -> Result<()> {
    let mut set_parts: Vec<&str> = Vec::new();
    let mut params: Vec<String> = Vec::new();

    if let Some(status) = status {
        set_parts.push("status = ?");
        params.push(status.as_str().to_string());
    }
    if let Some(owner) = owner {
        if !config.is_member(owner) {
            bail!(
                "Unknown owner '{}'. Must be one of: {}",
                owner,
                config.team.members.join(", ")
            );
        }
        set_parts.push("owner = ?");
        params.push(owner.to_string());
    }
    if let Some(notes) = notes {
        set_parts.push("notes = ?");
        params.push(notes.to_string());
    }
    if let Some(priority) = priority {
        if !(1..=3).contains(&priority) {
            bail!("Priority must be 1 (high), 2 (medium), or 3 (low)");
        }
        set_parts.push("priority = ?");
        params.push(priority.to_string());
    }

    if set_parts.is_empty() {
        bail!("No updates specified");
    }
    set_parts.push("updated_at = datetime('now')");

    let pool = db::connect(config).await?;
    let sql = format!(
        "UPDATE tasks SET {} WHERE id = ? COLLATE NOCASE",
        set_parts.join(", ")
    );
    let mut query = sqlx::query(&sql);
    for p in &params {
        query = query.bind(p);
    }
    let result = query.bind(task_id.to_uppercase()).execute(&pool).await?;
    pool.close().await;

    if result.rows_affected() == 0 {
        bail!("Task not found: {}", task_id);
    }
    println!("Updated task: {}", task_id.to_uppercase());
    Ok(())
}
