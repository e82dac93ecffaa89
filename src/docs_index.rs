//! Documentation index: a registry of the team's prose documents.
//!
//! `tb index sync` walks the configured docs root and registers every file
//! matching the include globs, keyed by relative path. Titles come from the
//! first markdown heading when there is one, otherwise the file name. Richer
//! fields (purpose, when to read, keywords) are filled in manually with
//! `tb index add`, which upserts over a synced row.

use anyhow::{bail, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use walkdir::WalkDir;

use crate::config::Config;
use crate::db;
use crate::models::{self, DocsIndexEntry};
use crate::render;
use crate::vocab::DocCategory;

pub async fn run_sync(config: &Config, category: DocCategory) -> Result<()> {
    let root = &config.docs_index.root;
    if !root.exists() {
        bail!("Docs root does not exist: {}", root.display());
    }

    let include_set = build_globset(&config.docs_index.include_globs)?;
    let exclude_set = build_globset(&config.docs_index.exclude_globs)?;

    let mut found: Vec<(String, String)> = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        let rel_str = relative.to_string_lossy().replace('\\', "/");

        if exclude_set.is_match(&rel_str) || !include_set.is_match(&rel_str) {
            continue;
        }

        let body = std::fs::read_to_string(path).unwrap_or_default();
        let title = extract_title(&body).unwrap_or_else(|| {
            path.file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| rel_str.clone())
        });

        found.push((rel_str, title));
    }

    // Deterministic ordering
    found.sort_by(|a, b| a.0.cmp(&b.0));

    let pool = db::connect(config).await?;
    let mut added = 0u64;
    let mut updated = 0u64;

    for (path, title) in &found {
        let exists: bool = sqlx::query_scalar("SELECT COUNT(*) > 0 FROM docs_index WHERE path = ?")
            .bind(path)
            .fetch_one(&pool)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO docs_index (path, category, title, updated_at)
            VALUES (?, ?, ?, datetime('now'))
            ON CONFLICT(path) DO UPDATE SET
                title = excluded.title,
                category = excluded.category,
                updated_at = datetime('now')
            "#,
        )
        .bind(path)
        .bind(category.as_str())
        .bind(title)
        .execute(&pool)
        .await?;

        if exists {
            updated += 1;
        } else {
            added += 1;
        }
    }
    pool.close().await;

    println!("index sync");
    println!("  scanned: {} files", found.len());
    println!("  added: {}", added);
    println!("  updated: {}", updated);
    println!("ok");
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub async fn run_add(
    config: &Config,
    path: &str,
    category: DocCategory,
    title: &str,
    purpose: Option<&str>,
    when_to_read: Option<&str>,
    keywords_csv: Option<&str>,
) -> Result<()> {
    if title.trim().len() < 3 {
        bail!("Title must be at least 3 characters");
    }

    let keywords: Vec<String> = keywords_csv
        .map(|csv| {
            csv.split(',')
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let pool = db::connect(config).await?;
    sqlx::query(
        r#"
        INSERT INTO docs_index (path, category, title, purpose, when_to_read, keywords, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, datetime('now'))
        ON CONFLICT(path) DO UPDATE SET
            category = excluded.category,
            title = excluded.title,
            purpose = excluded.purpose,
            when_to_read = excluded.when_to_read,
            keywords = excluded.keywords,
            updated_at = datetime('now')
        "#,
    )
    .bind(path)
    .bind(category.as_str())
    .bind(title)
    .bind(purpose)
    .bind(when_to_read)
    .bind(models::to_json_list(&keywords))
    .execute(&pool)
    .await?;
    pool.close().await;

    println!("Indexed: {}", path);
    Ok(())
}

pub async fn run_list(
    config: &Config,
    category: Option<DocCategory>,
    search: Option<&str>,
    limit: i64,
    json: bool,
) -> Result<()> {
    let pool = db::connect(config).await?;

    let mut conditions: Vec<&str> = Vec::new();
    let mut params: Vec<String> = Vec::new();
    if let Some(category) = category {
        conditions.push("category = ?");
        params.push(category.as_str().to_string());
    }
    if let Some(search) = search {
        conditions.push("(title LIKE ? OR purpose LIKE ? OR keywords LIKE ?)");
        let like = format!("%{}%", search);
        params.push(like.clone());
        params.push(like.clone());
        params.push(like);
    }

    let where_clause = if conditions.is_empty() {
        "1=1".to_string()
    } else {
        conditions.join(" AND ")
    };

    let sql = format!(
        "SELECT * FROM docs_index WHERE {} ORDER BY path LIMIT ?",
        where_clause
    );
    let mut query = sqlx::query(&sql);
    for p in &params {
        query = query.bind(p);
    }
    let rows = query.bind(limit).fetch_all(&pool).await?;
    let entries: Vec<DocsIndexEntry> = rows.iter().map(DocsIndexEntry::from_row).collect();
    pool.close().await;

    if json {
        render::print_json(&entries)?;
    } else {
        let table_rows: Vec<Vec<String>> = entries
            .iter()
            .map(|e| {
                vec![
                    e.id.to_string(),
                    e.path.clone(),
                    e.category.clone(),
                    e.title.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            render::format_table(&["id", "path", "category", "title"], &table_rows)
        );
    }

    Ok(())
}

/// First markdown heading line, with the leading hashes stripped.
fn extract_title(body: &str) -> Option<String> {
    body.lines().find_map(|line| {
        let trimmed = line.trim_start();
        trimmed
            .strip_prefix('#')
            .map(|rest| rest.trim_start_matches('#').trim().to_string())
            .filter(|t| !t.is_empty())
    })
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_title_first_heading() {
        assert_eq!(
            extract_title("# Deployment Runbook\n\nSteps..."),
            Some("Deployment Runbook".to_string())
        );
        assert_eq!(
            extract_title("intro text\n\n## Section Two\n"),
            Some("Section Two".to_string())
        );
    }

    #[test]
    fn test_extract_title_none() {
        assert_eq!(extract_title("no headings here"), None);
        assert_eq!(extract_title("#\n##\n"), None);
    }
}
