//! Learnings: short, reusable observations captured while working.
//!
//! Categories are the configured areas plus `general` for anything
//! cross-cutting. Learnings captured inside a work session go through
//! `tb work learn` instead, which links them to the bug.

use anyhow::{bail, Result};

use crate::config::Config;
use crate::db;
use crate::models::Learning;
use crate::render;

pub async fn run_list(
    config: &Config,
    category: Option<&str>,
    search: Option<&str>,
    limit: i64,
    json: bool,
) -> Result<()> {
    let pool = db::connect(config).await?;

    let mut conditions: Vec<&str> = Vec::new();
    let mut params: Vec<String> = Vec::new();

    if let Some(category) = category {
        conditions.push("category = ?");
        params.push(category.to_string());
    }
    if let Some(search) = search {
        conditions.push("learning LIKE ?");
        params.push(format!("%{}%", search));
    }

    let where_clause = if conditions.is_empty() {
        "1=1".to_string()
    } else {
        conditions.join(" AND ")
    };

    let sql = format!(
        "SELECT * FROM learnings WHERE {} ORDER BY created_at DESC, id DESC LIMIT ?",
        where_clause
    );
    let mut query = sqlx::query(&sql);
    for p in &params {
        query = query.bind(p);
    }
    let rows = query.bind(limit).fetch_all(&pool).await?;
    let learnings: Vec<Learning> = rows.iter().map(Learning::from_row).collect();
    pool.close().await;

    if json {
        render::print_json(&learnings)?;
    } else {
        let table_rows: Vec<Vec<String>> = learnings
            .iter()
            .map(|l| {
                vec![
                    l.id.to_string(),
                    l.category.clone(),
                    l.learning.clone(),
                    l.context.clone().unwrap_or_default(),
                ]
            })
            .collect();
        println!(
            "{}",
            render::format_table(&["id", "category", "learning", "context"], &table_rows)
        );
    }

    Ok(())
}

pub async fn run_add(
    config: &Config,
    category: &str,
    learning: &str,
    context: Option<&str>,
    bug_id: Option<&str>,
) -> Result<()> {
    if !config.is_learning_category(category) {
        bail!(
            "Invalid category '{}'. Must be 'general' or one of: {}",
            category,
            config.vocab.areas.join(", ")
        );
    }
    if learning.trim().len() < 10 {
        bail!("Learning must be at least 10 characters");
    }

    let pool = db::connect(config).await?;
    let result = sqlx::query(
        r#"
        INSERT INTO learnings (category, learning, context, related_bug_id, created_at)
        VALUES (?, ?, ?, ?, datetime('now'))
        "#,
    )
    .bind(category)
    .bind(learning)
    .bind(context)
    .bind(bug_id.map(str::to_uppercase))
    .execute(&pool)
    .await?;
    pool.close().await;

    println!("Created learning: {}", result.last_insert_rowid());
    Ok(())
}
