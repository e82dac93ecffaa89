//! Decision log: what was decided, why, and what was considered instead.

use anyhow::{bail, Result};

use crate::config::Config;
use crate::db;
use crate::models::{self, Decision};
use crate::render;

pub async fn run_list(config: &Config, area: Option<&str>, limit: i64, json: bool) -> Result<()> {
    let pool = db::connect(config).await?;

    let rows = match area {
        Some(area) => {
            sqlx::query(
                r#"
                SELECT * FROM decisions
                WHERE related_area = ? OR related_area IS NULL
                ORDER BY created_at DESC, id DESC
                LIMIT ?
                "#,
            )
            .bind(area)
            .bind(limit)
            .fetch_all(&pool)
            .await?
        }
        None => {
            sqlx::query("SELECT * FROM decisions ORDER BY created_at DESC, id DESC LIMIT ?")
                .bind(limit)
                .fetch_all(&pool)
                .await?
        }
    };
    let decisions: Vec<Decision> = rows.iter().map(Decision::from_row).collect();
    pool.close().await;

    if json {
        render::print_json(&decisions)?;
    } else {
        let table_rows: Vec<Vec<String>> = decisions
            .iter()
            .map(|d| {
                vec![
                    d.id.to_string(),
                    d.date.clone(),
                    d.decision.clone(),
                    d.rationale.clone(),
                    d.related_area.clone().unwrap_or_default(),
                ]
            })
            .collect();
        println!(
            "{}",
            render::format_table(&["id", "date", "decision", "rationale", "area"], &table_rows)
        );
    }

    Ok(())
}

pub async fn run_add(
    config: &Config,
    decision: &str,
    rationale: &str,
    area: Option<&str>,
    alternatives: &[String],
) -> Result<()> {
    if decision.trim().is_empty() {
        bail!("Decision text must not be empty");
    }
    if rationale.trim().is_empty() {
        bail!("Rationale must not be empty");
    }
    if let Some(area) = area {
        if !config.is_area(area) {
            bail!(
                "Invalid area '{}'. Must be one of: {}",
                area,
                config.vocab.areas.join(", ")
            );
        }
    }

    let alternatives_json = if alternatives.is_empty() {
        None
    } else {
        Some(models::to_json_list(alternatives))
    };

    let pool = db::connect(config).await?;
    let result = sqlx::query(
        r#"
        INSERT INTO decisions (date, decision, rationale, alternatives, related_area, created_at)
        VALUES (date('now'), ?, ?, ?, ?, datetime('now'))
        "#,
    )
    .bind(decision)
    .bind(rationale)
    .bind(alternatives_json)
    .bind(area)
    .execute(&pool)
    .await?;
    pool.close().await;

    println!("Created decision: {}", result.last_insert_rowid());
    Ok(())
}
