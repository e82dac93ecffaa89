//! Changelog storage and queries.
//!
//! Entries record what changed, what it replaced, and why. Most arrive
//! automatically when a work session completes; `tb history add` covers
//! everything else.

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, Utc};

use crate::config::Config;
use crate::db;
use crate::models::{self, ChangelogEntry};
use crate::render;

pub async fn run_list(
    config: &Config,
    days: Option<i64>,
    file_path: Option<&str>,
    bug_id: Option<&str>,
    limit: i64,
    json: bool,
) -> Result<()> {
    let pool = db::connect(config).await?;

    let mut conditions: Vec<&str> = Vec::new();
    let mut params: Vec<String> = Vec::new();

    if let Some(days) = days {
        conditions.push("date >= date('now', ?)");
        params.push(format!("-{} days", days));
    }
    if let Some(file) = file_path {
        // files_affected is a JSON array; a substring match is enough here
        conditions.push("files_affected LIKE ?");
        params.push(format!("%{}%", file));
    }
    if let Some(bug) = bug_id {
        conditions.push("related_bug_id = ?");
        params.push(bug.to_uppercase());
    }

    let where_clause = if conditions.is_empty() {
        "1=1".to_string()
    } else {
        conditions.join(" AND ")
    };

    let sql = format!(
        "SELECT * FROM changelog WHERE {} ORDER BY date DESC, id DESC LIMIT ?",
        where_clause
    );
    let mut query = sqlx::query(&sql);
    for p in &params {
        query = query.bind(p);
    }
    let rows = query.bind(limit).fetch_all(&pool).await?;
    let entries: Vec<ChangelogEntry> = rows.iter().map(ChangelogEntry::from_row).collect();
    pool.close().await;

    if json {
        render::print_json(&entries)?;
    } else {
        let table_rows: Vec<Vec<String>> = entries
            .iter()
            .map(|e| {
                vec![
                    e.id.to_string(),
                    e.date.clone(),
                    e.title.clone(),
                    e.why.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            render::format_table(&["id", "date", "title", "why"], &table_rows)
        );
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub async fn run_add(
    config: &Config,
    title: &str,
    what_changed: &str,
    why: &str,
    what_it_was: Option<&str>,
    date: Option<&str>,
    files_csv: Option<&str>,
    bug_id: Option<&str>,
) -> Result<()> {
    if title.trim().len() < 5 {
        bail!("Title must be at least 5 characters");
    }
    if what_changed.trim().len() < 10 {
        bail!("--what-changed must be at least 10 characters");
    }
    if why.trim().len() < 10 {
        bail!("--why must be at least 10 characters");
    }

    let date = match date {
        Some(raw) => {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .with_context(|| format!("Date must be YYYY-MM-DD, got '{}'", raw))?;
            raw.to_string()
        }
        None => Utc::now().format("%Y-%m-%d").to_string(),
    };

    let files: Vec<String> = files_csv
        .map(|csv| {
            csv.split(',')
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let pool = db::connect(config).await?;
    let result = sqlx::query(
        r#"
        INSERT INTO changelog (date, title, what_changed, what_it_was, why,
                               files_affected, related_bug_id, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, datetime('now'))
        "#,
    )
    .bind(&date)
    .bind(title)
    .bind(what_changed)
    .bind(what_it_was)
    .bind(why)
    .bind(models::to_json_list(&files))
    .bind(bug_id.map(str::to_uppercase))
    .execute(&pool)
    .await?;
    pool.close().await;

    println!("Created changelog entry: {}", result.last_insert_rowid());
    Ok(())
}
