//! Knowledge base statistics.
//!
//! A quick health overview: row counts per table, bugs by status, code docs
//! by area, and open board messages by type. Used by `tb stats` to confirm
//! that writes are landing where expected.

use anyhow::Result;
use sqlx::{Row, SqlitePool};
use std::collections::BTreeMap;

use crate::config::Config;
use crate::db;
use crate::render;

const COUNTED_TABLES: &[&str] = &[
    "bugs",
    "code_docs",
    "changelog",
    "learnings",
    "decisions",
    "tasks",
    "messages",
    "docs_index",
    "work_sessions",
    "stem",
];

#[derive(Debug, serde::Serialize)]
pub struct Stats {
    pub totals: BTreeMap<String, i64>,
    pub bugs_by_status: BTreeMap<String, i64>,
    pub code_docs_by_area: BTreeMap<String, i64>,
    pub open_messages_by_type: BTreeMap<String, i64>,
    pub db_size_bytes: u64,
}

pub async fn collect_stats(config: &Config, pool: &SqlitePool) -> Result<Stats> {
    let mut totals = BTreeMap::new();
    for table in COUNTED_TABLES {
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(pool)
            .await?;
        totals.insert(table.to_string(), count);
    }

    let bugs_by_status = group_count(pool, "SELECT status AS k, COUNT(*) AS c FROM bugs GROUP BY status").await?;
    let code_docs_by_area =
        group_count(pool, "SELECT area AS k, COUNT(*) AS c FROM code_docs GROUP BY area").await?;
    let open_messages_by_type = group_count(
        pool,
        "SELECT message_type AS k, COUNT(*) AS c FROM messages WHERE resolved = 0 GROUP BY message_type",
    )
    .await?;

    let db_size_bytes = std::fs::metadata(&config.db.path).map(|m| m.len()).unwrap_or(0);

    Ok(Stats {
        totals,
        bugs_by_status,
        code_docs_by_area,
        open_messages_by_type,
        db_size_bytes,
    })
}

async fn group_count(pool: &SqlitePool, sql: &str) -> Result<BTreeMap<String, i64>> {
    let rows = sqlx::query(sql).fetch_all(pool).await?;
    Ok(rows
        .iter()
        .map(|row| (row.get::<String, _>("k"), row.get::<i64, _>("c")))
        .collect())
}

pub async fn run_stats(config: &Config, json: bool) -> Result<()> {
    let pool = db::connect(config).await?;
    let stats = collect_stats(config, &pool).await?;
    pool.close().await;

    if json {
        render::print_json(&stats)?;
        return Ok(());
    }

    println!("Team Knowledge Base — Stats");
    println!("===========================");
    println!();
    println!("  Database:  {}", config.db.path.display());
    println!("  Size:      {}", format_bytes(stats.db_size_bytes));
    println!();
    for (table, count) in &stats.totals {
        println!("  {:<14} {}", format!("{}:", table), count);
    }

    if !stats.bugs_by_status.is_empty() {
        println!();
        println!("  Bugs by status:");
        for (status, count) in &stats.bugs_by_status {
            println!("    {}: {}", status, count);
        }
    }

    if !stats.code_docs_by_area.is_empty() {
        println!();
        println!("  Code docs by area:");
        for (area, count) in &stats.code_docs_by_area {
            println!("    {}: {}", area, count);
        }
    }

    if !stats.open_messages_by_type.is_empty() {
        println!();
        println!("  Open messages by type:");
        for (message_type, count) in &stats.open_messages_by_type {
            println!("    {}: {}", message_type, count);
        }
    }

    println!();
    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MB");
    }
}
