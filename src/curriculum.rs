//! Normalized curriculum tables.
//!
//! The stem is the sequential skeleton of the curriculum: one row per unit
//! of content, ordered by (part, module, exercise, activity, sequence), each
//! pointing at exactly one payload row in `content_blocks`, `prompts`, or
//! `curriculum_tools`. Import takes the already-normalized JSON export;
//! parsing the source document is someone else's problem.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};
use std::collections::HashSet;
use std::path::Path;

use crate::config::Config;
use crate::db;
use crate::render;
use crate::vocab::BlockType;

#[derive(Debug, Deserialize)]
pub struct CurriculumExport {
    #[serde(default)]
    pub content_blocks: Vec<ContentBlockIn>,
    #[serde(default)]
    pub prompts: Vec<PromptIn>,
    #[serde(default)]
    pub tools: Vec<ToolIn>,
    #[serde(default)]
    pub stem: Vec<StemIn>,
}

#[derive(Debug, Deserialize)]
pub struct ContentBlockIn {
    pub id: i64,
    pub content_type: String,
    pub content: String,
    #[serde(default = "default_version")]
    pub version: i64,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

#[derive(Debug, Deserialize)]
pub struct PromptIn {
    pub id: i64,
    pub prompt_text: String,
    pub input_type: String,
    #[serde(default)]
    pub input_config: Option<serde_json::Value>,
    #[serde(default = "default_version")]
    pub version: i64,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

#[derive(Debug, Deserialize)]
pub struct ToolIn {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub instructions: String,
    #[serde(default)]
    pub has_reminder: bool,
    #[serde(default)]
    pub reminder_frequency: Option<String>,
    #[serde(default = "default_version")]
    pub version: i64,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

#[derive(Debug, Deserialize)]
pub struct StemIn {
    pub id: i64,
    pub part: i64,
    pub module: i64,
    pub exercise: i64,
    pub activity: i64,
    pub sequence: i64,
    pub block_type: BlockType,
    pub content_id: i64,
    #[serde(default)]
    pub connection_id: Option<i64>,
}

fn default_version() -> i64 {
    1
}
fn default_active() -> bool {
    true
}

/// Referential and ordering checks, done before anything is written.
pub fn validate_export(export: &CurriculumExport) -> Result<()> {
    let content_ids: HashSet<i64> = export.content_blocks.iter().map(|b| b.id).collect();
    let prompt_ids: HashSet<i64> = export.prompts.iter().map(|p| p.id).collect();
    let tool_ids: HashSet<i64> = export.tools.iter().map(|t| t.id).collect();

    if content_ids.len() != export.content_blocks.len() {
        bail!("Duplicate content_block ids in export");
    }
    if prompt_ids.len() != export.prompts.len() {
        bail!("Duplicate prompt ids in export");
    }
    if tool_ids.len() != export.tools.len() {
        bail!("Duplicate tool ids in export");
    }

    let mut stem_ids = HashSet::new();
    let mut positions = HashSet::new();
    for row in &export.stem {
        if !stem_ids.insert(row.id) {
            bail!("Duplicate stem id: {}", row.id);
        }
        let position = (row.part, row.module, row.exercise, row.activity, row.sequence);
        if !positions.insert(position) {
            bail!(
                "Duplicate stem position {}.{}.{}.{} seq {}",
                row.part,
                row.module,
                row.exercise,
                row.activity,
                row.sequence
            );
        }

        let (known, table) = match row.block_type {
            BlockType::Content => (content_ids.contains(&row.content_id), "content_blocks"),
            BlockType::Prompt => (prompt_ids.contains(&row.content_id), "prompts"),
            BlockType::Tool => (tool_ids.contains(&row.content_id), "tools"),
        };
        if !known {
            bail!(
                "Stem row {} references {} id {} which is not in the export",
                row.id,
                table,
                row.content_id
            );
        }
    }

    Ok(())
}

pub async fn run_import(config: &Config, file: &Path, replace: bool, dry_run: bool) -> Result<()> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read export file: {}", file.display()))?;
    let export: CurriculumExport =
        serde_json::from_str(&raw).with_context(|| "Failed to parse curriculum export JSON")?;

    validate_export(&export)?;

    if dry_run {
        println!("curriculum import (dry-run)");
        println!("  content blocks: {}", export.content_blocks.len());
        println!("  prompts: {}", export.prompts.len());
        println!("  tools: {}", export.tools.len());
        println!("  stem rows: {}", export.stem.len());
        return Ok(());
    }

    let pool = db::connect(config).await?;
    let mut tx = pool.begin().await?;

    if replace {
        for table in ["stem", "content_blocks", "prompts", "curriculum_tools"] {
            sqlx::query(&format!("DELETE FROM {}", table))
                .execute(&mut *tx)
                .await?;
        }
    }

    for block in &export.content_blocks {
        sqlx::query(
            r#"
            INSERT INTO content_blocks (id, content_type, content, version, is_active)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(block.id)
        .bind(&block.content_type)
        .bind(&block.content)
        .bind(block.version)
        .bind(block.is_active as i64)
        .execute(&mut *tx)
        .await?;
    }

    for prompt in &export.prompts {
        sqlx::query(
            r#"
            INSERT INTO prompts (id, prompt_text, input_type, input_config, version, is_active)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(prompt.id)
        .bind(&prompt.prompt_text)
        .bind(&prompt.input_type)
        .bind(prompt.input_config.as_ref().map(|v| v.to_string()))
        .bind(prompt.version)
        .bind(prompt.is_active as i64)
        .execute(&mut *tx)
        .await?;
    }

    for tool in &export.tools {
        sqlx::query(
            r#"
            INSERT INTO curriculum_tools (id, name, description, instructions,
                                          has_reminder, reminder_frequency, version, is_active)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(tool.id)
        .bind(&tool.name)
        .bind(&tool.description)
        .bind(&tool.instructions)
        .bind(tool.has_reminder as i64)
        .bind(&tool.reminder_frequency)
        .bind(tool.version)
        .bind(tool.is_active as i64)
        .execute(&mut *tx)
        .await?;
    }

    for row in &export.stem {
        sqlx::query(
            r#"
            INSERT INTO stem (id, part, module, exercise, activity, sequence,
                              block_type, content_id, connection_id)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(row.id)
        .bind(row.part)
        .bind(row.module)
        .bind(row.exercise)
        .bind(row.activity)
        .bind(row.sequence)
        .bind(row.block_type.as_str())
        .bind(row.content_id)
        .bind(row.connection_id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    pool.close().await;

    println!("curriculum import");
    println!("  content blocks: {}", export.content_blocks.len());
    println!("  prompts: {}", export.prompts.len());
    println!("  tools: {}", export.tools.len());
    println!("  stem rows: {}", export.stem.len());
    println!("ok");
    Ok(())
}

#[derive(Debug, Serialize)]
struct StemView {
    id: i64,
    location: String,
    block_type: String,
    content_id: i64,
    label: String,
}

pub async fn run_show(
    config: &Config,
    part: Option<i64>,
    module: Option<i64>,
    json: bool,
) -> Result<()> {
    let pool = db::connect(config).await?;

    let mut conditions: Vec<&str> = Vec::new();
    let mut params: Vec<i64> = Vec::new();
    if let Some(part) = part {
        conditions.push("part = ?");
        params.push(part);
    }
    if let Some(module) = module {
        conditions.push("module = ?");
        params.push(module);
    }
    let where_clause = if conditions.is_empty() {
        "1=1".to_string()
    } else {
        conditions.join(" AND ")
    };

    let sql = format!(
        r#"
        SELECT * FROM stem
        WHERE {}
        ORDER BY part, module, exercise, activity, sequence
        "#,
        where_clause
    );
    let mut query = sqlx::query(&sql);
    for p in &params {
        query = query.bind(p);
    }
    let rows = query.fetch_all(&pool).await?;

    let mut views = Vec::new();
    for row in &rows {
        let block_type: String = row.get("block_type");
        let content_id: i64 = row.get("content_id");
        let label = payload_label(&pool, &block_type, content_id).await?;

        views.push(StemView {
            id: row.get("id"),
            location: format!(
                "{}.{}.{}.{} seq {}",
                row.get::<i64, _>("part"),
                row.get::<i64, _>("module"),
                row.get::<i64, _>("exercise"),
                row.get::<i64, _>("activity"),
                row.get::<i64, _>("sequence"),
            ),
            block_type,
            content_id,
            label,
        });
    }
    pool.close().await;

    if json {
        render::print_json(&views)?;
    } else {
        let table_rows: Vec<Vec<String>> = views
            .iter()
            .map(|v| {
                vec![
                    v.id.to_string(),
                    v.location.clone(),
                    v.block_type.clone(),
                    v.content_id.to_string(),
                    v.label.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            render::format_table(
                &["id", "location", "type", "content_id", "label"],
                &table_rows
            )
        );
    }

    Ok(())
}

async fn payload_label(pool: &SqlitePool, block_type: &str, content_id: i64) -> Result<String> {
    let label: Option<String> = match block_type {
        "content" => {
            sqlx::query_scalar("SELECT substr(content, 1, 60) FROM content_blocks WHERE id = ?")
                .bind(content_id)
                .fetch_optional(pool)
                .await?
        }
        "prompt" => {
            sqlx::query_scalar("SELECT substr(prompt_text, 1, 60) FROM prompts WHERE id = ?")
                .bind(content_id)
                .fetch_optional(pool)
                .await?
        }
        "tool" => {
            sqlx::query_scalar("SELECT name FROM curriculum_tools WHERE id = ?")
                .bind(content_id)
                .fetch_optional(pool)
                .await?
        }
        _ => None,
    };
    Ok(label.unwrap_or_else(|| "(missing payload)".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn export_json(stem_content_id: i64, block_type: &str) -> CurriculumExport {
        serde_json::from_str(&format!(
            r#"{{
                "content_blocks": [{{"id": 100000, "content_type": "instruction", "content": "Read this"}}],
                "prompts": [{{"id": 100000, "prompt_text": "Reflect", "input_type": "textarea"}}],
                "tools": [{{"id": 100000, "name": "List Builder"}}],
                "stem": [{{"id": 1, "part": 1, "module": 1, "exercise": 1, "activity": 1,
                           "sequence": 1, "block_type": "{}", "content_id": {}}}]
            }}"#,
            block_type, stem_content_id
        ))
        .unwrap()
    }

    #[test]
    fn test_valid_export_passes() {
        assert!(validate_export(&export_json(100000, "content")).is_ok());
        assert!(validate_export(&export_json(100000, "prompt")).is_ok());
        assert!(validate_export(&export_json(100000, "tool")).is_ok());
    }

    #[test]
    fn test_dangling_payload_ref_rejected() {
        let err = validate_export(&export_json(999999, "content")).unwrap_err();
        assert!(err.to_string().contains("content_blocks id 999999"));
    }

    #[test]
    fn test_duplicate_position_rejected() {
        let mut export = export_json(100000, "content");
        export.stem.push(StemIn {
            id: 2,
            part: 1,
            module: 1,
            exercise: 1,
            activity: 1,
            sequence: 1,
            block_type: BlockType::Prompt,
            content_id: 100000,
            connection_id: None,
        });
        let err = validate_export(&export).unwrap_err();
        assert!(err.to_string().contains("Duplicate stem position"));
    }

    #[test]
    fn test_duplicate_stem_id_rejected() {
        let mut export = export_json(100000, "content");
        export.stem.push(StemIn {
            id: 1,
            part: 1,
            module: 1,
            exercise: 1,
            activity: 2,
            sequence: 1,
            block_type: BlockType::Content,
            content_id: 100000,
            connection_id: None,
        });
        assert!(validate_export(&export).is_err());
    }
}
