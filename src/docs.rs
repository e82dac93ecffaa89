//! Code documentation index: what each file/symbol does, why, and how it
//! connects to the rest of the codebase.
//!
//! Entries are keyed by (file_path, symbol_name, line_start) and upserted,
//! so re-documenting a symbol refreshes it in place. Symbol extraction from
//! source is out of scope here; entries arrive through the CLI.

use anyhow::{bail, Result};
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use std::path::Path;

use crate::config::Config;
use crate::db;
use crate::models::{self, CodeDoc};
use crate::render;
use crate::vocab::SymbolType;

/// Look up a code doc by symbol name, preferring top-level entries over
/// nested ones. An optional file filter narrows the search.
pub async fn get_code_doc_by_name(
    pool: &SqlitePool,
    symbol_name: &str,
    file_path: Option<&str>,
) -> Result<Option<CodeDoc>> {
    let row = match file_path {
        Some(file) => {
            sqlx::query(
                "SELECT * FROM code_docs WHERE symbol_name = ? AND file_path LIKE ? LIMIT 1",
            )
            .bind(symbol_name)
            .bind(format!("%{}%", file))
            .fetch_optional(pool)
            .await?
        }
        None => {
            sqlx::query(
                r#"
                SELECT * FROM code_docs
                WHERE symbol_name = ?
                ORDER BY CASE WHEN parent_id IS NULL THEN 0 ELSE 1 END, id
                LIMIT 1
                "#,
            )
            .bind(symbol_name)
            .fetch_optional(pool)
            .await?
        }
    };
    Ok(row.as_ref().map(CodeDoc::from_row))
}

#[derive(Debug, Default)]
pub struct DocFilters {
    pub file_path: Option<String>,
    pub symbol_name: Option<String>,
    pub symbol_type: Option<SymbolType>,
    pub area: Option<String>,
    pub search: Option<String>,
}

pub async fn run_list(config: &Config, filters: &DocFilters, limit: i64, json: bool) -> Result<()> {
    let pool = db::connect(config).await?;

    let mut conditions: Vec<&str> = Vec::new();
    let mut params: Vec<String> = Vec::new();

    if let Some(ref file) = filters.file_path {
        conditions.push("file_path LIKE ?");
        params.push(format!("%{}%", file));
    }
    if let Some(ref symbol) = filters.symbol_name {
        conditions.push("symbol_name LIKE ?");
        params.push(format!("%{}%", symbol));
    }
    if let Some(symbol_type) = filters.symbol_type {
        conditions.push("symbol_type = ?");
        params.push(symbol_type.as_str().to_string());
    }
    if let Some(ref area) = filters.area {
        conditions.push("area = ?");
        params.push(area.clone());
    }
    if let Some(ref search) = filters.search {
        conditions.push("(purpose LIKE ? OR why LIKE ?)");
        params.push(format!("%{}%", search));
        params.push(format!("%{}%", search));
    }

    let where_clause = if conditions.is_empty() {
        "1=1".to_string()
    } else {
        conditions.join(" AND ")
    };

    let sql = format!(
        "SELECT * FROM code_docs WHERE {} ORDER BY file_path, line_start LIMIT ?",
        where_clause
    );
    let mut query = sqlx::query(&sql);
    for p in &params {
        query = query.bind(p);
    }
    let rows = query.bind(limit).fetch_all(&pool).await?;
    let docs: Vec<CodeDoc> = rows.iter().map(CodeDoc::from_row).collect();
    pool.close().await;

    if json {
        render::print_json(&docs)?;
    } else {
        let table_rows: Vec<Vec<String>> = docs
            .iter()
            .map(|d| {
                vec![
                    d.id.to_string(),
                    d.file_path.clone(),
                    d.symbol_name.clone().unwrap_or_default(),
                    d.symbol_type.clone(),
                    d.area.clone(),
                    d.purpose.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            render::format_table(
                &["id", "file_path", "symbol_name", "symbol_type", "area", "purpose"],
                &table_rows
            )
        );
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub async fn run_add(
    config: &Config,
    file_path: &str,
    symbol_name: Option<&str>,
    symbol_type: SymbolType,
    line_start: Option<i64>,
    line_end: Option<i64>,
    signature: Option<&str>,
    purpose: &str,
    why: Option<&str>,
    connections_csv: Option<&str>,
    area: &str,
) -> Result<()> {
    if purpose.trim().len() < 10 {
        bail!("Purpose must be at least 10 characters");
    }
    if !config.is_area(area) {
        bail!(
            "Invalid area '{}'. Must be one of: {}",
            area,
            config.vocab.areas.join(", ")
        );
    }
    if let Some(start) = line_start {
        if start < 1 {
            bail!("line_start must be >= 1");
        }
    }
    if let (Some(start), Some(end)) = (line_start, line_end) {
        if end < start {
            bail!("line_end must be >= line_start");
        }
    }

    let connections: Vec<String> = connections_csv
        .map(|csv| {
            csv.split(',')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let pool = db::connect(config).await?;
    let result = sqlx::query(
        r#"
        INSERT INTO code_docs (
            file_path, symbol_name, symbol_type, line_start, line_end,
            signature, purpose, why, connections, area, last_verified
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(file_path, symbol_name, line_start) DO UPDATE SET
            symbol_type = excluded.symbol_type,
            line_end = excluded.line_end,
            signature = excluded.signature,
            purpose = excluded.purpose,
            why = excluded.why,
            connections = excluded.connections,
            area = excluded.area,
            last_verified = excluded.last_verified,
            updated_at = datetime('now')
        "#,
    )
    .bind(file_path)
    .bind(symbol_name)
    .bind(symbol_type.as_str())
    .bind(line_start)
    .bind(line_end)
    .bind(signature)
    .bind(purpose)
    .bind(why)
    .bind(models::to_json_list(&connections))
    .bind(area)
    .bind(Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string())
    .execute(&pool)
    .await?;
    pool.close().await;

    println!("Stored code doc: {}", result.last_insert_rowid());
    Ok(())
}

/// Show one symbol in full: the doc itself, nested entries under it, and
/// any bugs linked through bug_code_refs.
pub async fn run_show(config: &Config, symbol: &str, file_path: Option<&str>) -> Result<()> {
    let pool = db::connect(config).await?;
    let doc = match get_code_doc_by_name(&pool, symbol, file_path).await? {
        Some(doc) => doc,
        None => {
            pool.close().await;
            bail!("Symbol not found: {}", symbol);
        }
    };

    let nested_rows = sqlx::query("SELECT * FROM code_docs WHERE parent_id = ? ORDER BY line_start")
        .bind(doc.id)
        .fetch_all(&pool)
        .await?;
    let nested: Vec<CodeDoc> = nested_rows.iter().map(CodeDoc::from_row).collect();

    let bug_rows = sqlx::query(
        r#"
        SELECT b.id, b.title, b.status, r.relationship
        FROM bugs b
        JOIN bug_code_refs r ON b.id = r.bug_id
        WHERE r.code_doc_id = ?
        ORDER BY b.created_at DESC
        "#,
    )
    .bind(doc.id)
    .fetch_all(&pool)
    .await?;
    pool.close().await;

    println!("--- {} ---", doc.symbol_name.as_deref().unwrap_or(&doc.file_path));
    println!("id:        {}", doc.id);
    println!("file:      {}", doc.file_path);
    println!("type:      {}", doc.symbol_type);
    println!("area:      {}", doc.area);
    if let (Some(start), Some(end)) = (doc.line_start, doc.line_end) {
        println!("lines:     {}-{}", start, end);
    }
    if let Some(ref signature) = doc.signature {
        println!("signature: {}", signature);
    }
    println!("purpose:   {}", doc.purpose);
    if let Some(ref why) = doc.why {
        println!("why:       {}", why);
    }
    if !doc.connections.is_empty() {
        println!("connects:  {}", doc.connections.join(", "));
    }

    if !nested.is_empty() {
        println!();
        println!("Nested ({}):", nested.len());
        for child in &nested {
            println!(
                "  - {} ({}) @ line {}",
                child.symbol_name.as_deref().unwrap_or("?"),
                child.symbol_type,
                child.line_start.unwrap_or(0)
            );
        }
    }

    if !bug_rows.is_empty() {
        println!();
        println!("Linked bugs ({}):", bug_rows.len());
        for row in &bug_rows {
            let id: String = row.get("id");
            let title: String = row.get("title");
            let status: String = row.get("status");
            let relationship: String = row.get("relationship");
            println!("  - {} [{}] ({}): {}", id, status, relationship, title);
        }
    }

    Ok(())
}

/// Remove entries whose file no longer exists on disk. Run from the project
/// root the stored paths are relative to.
pub async fn run_prune(config: &Config, dry_run: bool) -> Result<()> {
    let pool = db::connect(config).await?;
    let rows = sqlx::query("SELECT id, file_path, symbol_name FROM code_docs ORDER BY file_path")
        .fetch_all(&pool)
        .await?;

    let mut removed = 0u64;
    for row in &rows {
        let id: i64 = row.get("id");
        let file_path: String = row.get("file_path");
        let symbol: Option<String> = row.get("symbol_name");

        if !Path::new(&file_path).exists() {
            println!(
                "  {} orphan: {} ({})",
                if dry_run { "would remove" } else { "removing" },
                symbol.as_deref().unwrap_or("(file)"),
                file_path
            );
            if !dry_run {
                sqlx::query("DELETE FROM code_docs WHERE id = ?")
                    .bind(id)
                    .execute(&pool)
                    .await?;
                sqlx::query("DELETE FROM bug_code_refs WHERE code_doc_id = ?")
                    .bind(id)
                    .execute(&pool)
                    .await?;
            }
            removed += 1;
        }
    }
    pool.close().await;

    println!(
        "{} orphaned doc{}{}",
        removed,
        if removed == 1 { "" } else { "s" },
        if dry_run { " (dry-run)" } else { " removed" }
    );
    Ok(())
}
