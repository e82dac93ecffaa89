//! Board message engine.
//!
//! The board is an append-only coordination feed over the `messages` table.
//! Three message types are *routable*: posting a `bug`, `learning`, or
//! `decision` message also inserts a row in the matching table and stamps the
//! message with `routed_to`/`routed_id`, all in one transaction.
//!
//! Non-routed posts pass through the completion-claim gate: a post that
//! claims a bug is finished while the bug's status says otherwise is
//! rejected, pointing the author at the work-session flow instead.

use anyhow::{bail, Context, Result};
use chrono::{Duration, NaiveDateTime, Utc};
use regex::Regex;
use sqlx::{Row, SqlitePool};

use crate::config::Config;
use crate::db;
use crate::models::{self, Message};
use crate::render;
use crate::vocab::{MessageType, Priority};

const DEFAULT_LIMIT: i64 = 50;
const DELETE_WINDOW_HOURS: i64 = 1;

/// Insert a board message and return its ID. Takes any executor so callers
/// can compose it into their own transactions.
pub async fn insert_message<'e, E>(
    executor: E,
    author: &str,
    message_type: MessageType,
    content: &str,
    data: Option<&serde_json::Value>,
    refs: Option<&serde_json::Value>,
    mentions: &[String],
) -> Result<i64>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    let mentions_json = if mentions.is_empty() {
        None
    } else {
        Some(models::to_json_list(mentions))
    };

    let result = sqlx::query(
        r#"
        INSERT INTO messages (author, message_type, content, data, refs, mentions, created_at)
        VALUES (?, ?, ?, ?, ?, ?, datetime('now'))
        "#,
    )
    .bind(author)
    .bind(message_type.as_str())
    .bind(content)
    .bind(data.map(|v| v.to_string()))
    .bind(refs.map(|v| v.to_string()))
    .bind(mentions_json)
    .execute(executor)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Bug IDs named in an explicit completion claim ("BUG-12 is fixed",
/// "resolved IMP-3"). Returns an empty list when the content contains no
/// claim — technical discussion that merely mentions a bug ID passes.
pub fn completion_claim_ids(content: &str) -> Vec<String> {
    let claim_patterns = [
        r"(?i)\b(?:bug|imp)-\d+\b.{0,30}\b(?:done|fixed|resolved|completed|finished)\b",
        r"(?i)\b(?:done|fixed|resolved|completed|finished)\b.{0,30}\b(?:bug|imp)-\d+\b",
    ];

    let has_claim = claim_patterns.iter().any(|p| {
        Regex::new(p)
            .expect("claim pattern is valid")
            .is_match(content)
    });
    if !has_claim {
        return Vec::new();
    }

    let id_re = Regex::new(r"(?i)\b(?:bug|imp)-\d+").expect("id pattern is valid");
    let mut ids: Vec<String> = id_re
        .find_iter(content)
        .map(|m| m.as_str().to_uppercase())
        .collect();
    ids.sort();
    ids.dedup();
    ids
}

/// Reject completion claims for bugs that are not actually in `review` or
/// `done`. Unknown bug IDs pass (the claim may refer to another tracker).
async fn check_completion_claim(pool: &SqlitePool, content: &str) -> Result<()> {
    for bug_id in completion_claim_ids(content) {
        let status: Option<String> =
            sqlx::query_scalar("SELECT status FROM bugs WHERE id = ? COLLATE NOCASE")
                .bind(&bug_id)
                .fetch_optional(pool)
                .await?;

        if let Some(status) = status {
            if status != "done" && status != "review" {
                bail!(
                    "Workflow violation: you claim {} is complete, but its status is '{}'. \
                     Use 'tb work start {}' and 'tb work complete' to update it properly, \
                     or 'tb bugs complete {}' if the fix already landed.",
                    bug_id,
                    status,
                    bug_id,
                    bug_id
                );
            }
        }
    }
    Ok(())
}

fn normalize_mentions(csv: Option<&str>) -> Vec<String> {
    csv.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(|m| {
                if m.starts_with('@') {
                    m.to_string()
                } else {
                    format!("@{}", m)
                }
            })
            .collect()
    })
    .unwrap_or_default()
}

#[allow(clippy::too_many_arguments)]
pub async fn run_post(
    config: &Config,
    as_flag: Option<&str>,
    message_type: MessageType,
    content: &str,
    mentions_csv: Option<&str>,
    bug: Option<&str>,
    task: Option<&str>,
    reply_to: Option<i64>,
    data_json: Option<&str>,
) -> Result<()> {
    let author = config.resolve_author(as_flag)?;

    if content.trim().is_empty() {
        bail!("Message content must not be empty");
    }

    let mentions = normalize_mentions(mentions_csv);
    if message_type == MessageType::Assignment && mentions.is_empty() {
        bail!("Assignments require at least one --mentions entry");
    }

    let data: Option<serde_json::Value> = match data_json {
        Some(raw) => Some(serde_json::from_str(raw).with_context(|| "Invalid JSON in --data")?),
        None => None,
    };

    let mut refs = serde_json::Map::new();
    if let Some(bug_id) = bug {
        refs.insert("bug_id".into(), bug_id.to_uppercase().into());
    }
    if let Some(task_id) = task {
        refs.insert("task_id".into(), task_id.to_uppercase().into());
    }
    if let Some(reply) = reply_to {
        refs.insert("reply_to".into(), reply.into());
    }
    let refs = if refs.is_empty() {
        None
    } else {
        Some(serde_json::Value::Object(refs))
    };

    let pool = db::connect(config).await?;

    // Only non-routed posts can smuggle completion claims past the workflow
    if message_type.routes_to().is_none() {
        check_completion_claim(&pool, content).await?;
    }

    let mut tx = pool.begin().await?;
    let msg_id = insert_message(
        &mut *tx,
        &author,
        message_type,
        content,
        data.as_ref(),
        refs.as_ref(),
        &mentions,
    )
    .await?;

    let routed_id = match message_type {
        MessageType::Bug => Some(route_bug(&mut tx, config, msg_id, &author, content, data.as_ref()).await?),
        MessageType::Learning => {
            Some(route_learning(&mut tx, config, content, data.as_ref(), refs.as_ref()).await?)
        }
        MessageType::Decision => Some(route_decision(&mut tx, config, content, data.as_ref()).await?),
        _ => None,
    };

    if let Some(ref routed_id) = routed_id {
        let routed_to = message_type.routes_to().expect("routable type");
        sqlx::query("UPDATE messages SET routed_to = ?, routed_id = ? WHERE id = ?")
            .bind(routed_to)
            .bind(routed_id)
            .bind(msg_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    pool.close().await;

    match routed_id {
        Some(routed) => println!("Posted message: {} -> {}", msg_id, routed),
        None => println!("Posted message: {}", msg_id),
    }
    Ok(())
}

async fn route_bug(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    config: &Config,
    msg_id: i64,
    author: &str,
    content: &str,
    data: Option<&serde_json::Value>,
) -> Result<String> {
    let area = data
        .and_then(|d| d.get("area"))
        .and_then(|v| v.as_str())
        .ok_or_else(|| anyhow::anyhow!("Bug posts need --data with an \"area\" field"))?;
    if !config.is_area(area) {
        bail!(
            "Invalid area '{}'. Must be one of: {}",
            area,
            config.vocab.areas.join(", ")
        );
    }

    let priority = match data.and_then(|d| d.get("priority")).and_then(|v| v.as_str()) {
        Some(p) => p.parse::<Priority>()?,
        None => Priority::Medium,
    };
    let description = data
        .and_then(|d| d.get("description"))
        .and_then(|v| v.as_str());

    let bug_id = format!("BUG-{}", msg_id);
    sqlx::query(
        r#"
        INSERT INTO bugs (id, title, area, priority, status, description, found_by, created_at, updated_at)
        VALUES (?, ?, ?, ?, 'open', ?, ?, datetime('now'), datetime('now'))
        "#,
    )
    .bind(&bug_id)
    .bind(content)
    .bind(area)
    .bind(priority.as_str())
    .bind(description)
    .bind(author)
    .execute(&mut **tx)
    .await?;

    Ok(bug_id)
}

async fn route_learning(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    config: &Config,
    content: &str,
    data: Option<&serde_json::Value>,
    refs: Option<&serde_json::Value>,
) -> Result<String> {
    let category = data
        .and_then(|d| d.get("category"))
        .and_then(|v| v.as_str())
        .unwrap_or("general");
    if !config.is_learning_category(category) {
        bail!(
            "Invalid learning category '{}'. Must be 'general' or a configured area.",
            category
        );
    }

    let context = data.and_then(|d| d.get("context")).and_then(|v| v.as_str());
    let related_bug_id = refs
        .and_then(|r| r.get("bug_id"))
        .and_then(|v| v.as_str())
        .map(str::to_string);

    let result = sqlx::query(
        r#"
        INSERT INTO learnings (category, learning, context, related_bug_id, created_at)
        VALUES (?, ?, ?, ?, datetime('now'))
        "#,
    )
    .bind(category)
    .bind(content)
    .bind(context)
    .bind(related_bug_id)
    .execute(&mut **tx)
    .await?;

    Ok(result.last_insert_rowid().to_string())
}

async fn route_decision(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    config: &Config,
    content: &str,
    data: Option<&serde_json::Value>,
) -> Result<String> {
    let rationale = data
        .and_then(|d| d.get("rationale"))
        .and_then(|v| v.as_str())
        .ok_or_else(|| anyhow::anyhow!("Decision posts need --data with a \"rationale\" field"))?;

    let area = data.and_then(|d| d.get("area")).and_then(|v| v.as_str());
    if let Some(area) = area {
        if !config.is_area(area) {
            bail!(
                "Invalid area '{}'. Must be one of: {}",
                area,
                config.vocab.areas.join(", ")
            );
        }
    }

    let alternatives = data
        .and_then(|d| d.get("alternatives"))
        .map(|v| v.to_string());

    let result = sqlx::query(
        r#"
        INSERT INTO decisions (date, decision, rationale, alternatives, related_area, created_at)
        VALUES (date('now'), ?, ?, ?, ?, datetime('now'))
        "#,
    )
    .bind(content)
    .bind(rationale)
    .bind(alternatives)
    .bind(area)
    .execute(&mut **tx)
    .await?;

    Ok(result.last_insert_rowid().to_string())
}

#[allow(clippy::too_many_arguments)]
pub async fn run_list(
    config: &Config,
    author: Option<&str>,
    message_type: Option<MessageType>,
    resolved: Option<bool>,
    after: Option<&str>,
    today: bool,
    mentions: Option<&str>,
    limit: i64,
    json: bool,
) -> Result<()> {
    let pool = db::connect(config).await?;

    let mut conditions: Vec<String> = Vec::new();
    let mut params: Vec<String> = Vec::new();

    if let Some(author) = author {
        conditions.push("author = ?".into());
        params.push(author.to_string());
    }
    if let Some(mt) = message_type {
        conditions.push("message_type = ?".into());
        params.push(mt.as_str().to_string());
    }
    if let Some(resolved) = resolved {
        conditions.push("resolved = ?".into());
        params.push(if resolved { "1".into() } else { "0".into() });
    }
    let after = if today {
        Some(Utc::now().format("%Y-%m-%d").to_string())
    } else {
        after.map(str::to_string)
    };
    if let Some(after) = after {
        conditions.push("date(created_at) >= ?".into());
        params.push(after);
    }
    if let Some(mention) = mentions {
        conditions.push("mentions LIKE ?".into());
        params.push(format!("%{}%", mention));
    }

    let where_clause = if conditions.is_empty() {
        "1=1".to_string()
    } else {
        conditions.join(" AND ")
    };

    let sql = format!(
        "SELECT * FROM messages WHERE {} ORDER BY created_at DESC, id DESC LIMIT ?",
        where_clause
    );
    let mut query = sqlx::query(&sql);
    for p in &params {
        query = query.bind(p);
    }
    let rows = query.bind(limit).fetch_all(&pool).await?;
    let messages: Vec<Message> = rows.iter().map(Message::from_row).collect();
    pool.close().await;

    if json {
        render::print_json(&messages)?;
    } else {
        let table_rows: Vec<Vec<String>> = messages
            .iter()
            .map(|m| {
                vec![
                    m.id.to_string(),
                    m.created_at.clone(),
                    m.author.clone(),
                    m.message_type.clone(),
                    m.content.clone(),
                    if m.resolved { "yes".into() } else { "no".into() },
                ]
            })
            .collect();
        println!(
            "{}",
            render::format_table(
                &["id", "created_at", "author", "type", "content", "resolved"],
                &table_rows
            )
        );
    }

    Ok(())
}

pub async fn run_resolve(config: &Config, msg_id: i64) -> Result<()> {
    let pool = db::connect(config).await?;
    let result = sqlx::query("UPDATE messages SET resolved = 1 WHERE id = ?")
        .bind(msg_id)
        .execute(&pool)
        .await?;
    pool.close().await;

    if result.rows_affected() == 0 {
        bail!("Message not found: {}", msg_id);
    }
    println!("Resolved message: {}", msg_id);
    Ok(())
}

/// Delete one of your own messages, and only within an hour of posting.
/// Everything older is part of the permanent record.
pub async fn run_delete(config: &Config, msg_id: i64, as_flag: Option<&str>) -> Result<()> {
    let author = config.resolve_author(as_flag)?;
    let pool = db::connect(config).await?;

    let row = sqlx::query("SELECT author, created_at FROM messages WHERE id = ?")
        .bind(msg_id)
        .fetch_optional(&pool)
        .await?;

    let row = match row {
        Some(row) => row,
        None => {
            pool.close().await;
            bail!("Message not found: {}", msg_id);
        }
    };

    let owner: String = row.get("author");
    if owner != author {
        pool.close().await;
        bail!("Can only delete your own messages (message {} is {}'s)", msg_id, owner);
    }

    let created_at: String = row.get("created_at");
    let created = NaiveDateTime::parse_from_str(&created_at, "%Y-%m-%d %H:%M:%S")
        .with_context(|| format!("Unparseable message timestamp: {}", created_at))?;
    if Utc::now().naive_utc() - created > Duration::hours(DELETE_WINDOW_HOURS) {
        pool.close().await;
        bail!(
            "Can only delete messages less than {} hour old",
            DELETE_WINDOW_HOURS
        );
    }

    sqlx::query("DELETE FROM messages WHERE id = ?")
        .bind(msg_id)
        .execute(&pool)
        .await?;
    pool.close().await;

    println!("Deleted message: {}", msg_id);
    Ok(())
}

/// Render unresolved messages as markdown for human reading. The database is
/// the source of truth; this view is never edited by hand.
pub async fn run_render(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    let rows = sqlx::query(
        "SELECT * FROM messages WHERE resolved = 0 ORDER BY created_at DESC, id DESC LIMIT ?",
    )
    .bind(DEFAULT_LIMIT)
    .fetch_all(&pool)
    .await?;
    let messages: Vec<Message> = rows.iter().map(Message::from_row).collect();
    pool.close().await;

    println!("{}", render_board_md(&messages));
    Ok(())
}

fn render_board_md(messages: &[Message]) -> String {
    let mut lines = vec![
        "# Team Board".to_string(),
        String::new(),
        "_Generated from the team database. Do not edit directly._".to_string(),
        String::new(),
        "---".to_string(),
        String::new(),
    ];

    for msg in messages {
        let timestamp = msg.created_at.chars().take(16).collect::<String>();
        let mentions_str = if msg.mentions.is_empty() {
            String::new()
        } else {
            format!(" -> {}", msg.mentions.join(", "))
        };

        lines.push(format!(
            "### [{}] {}{}",
            msg.message_type.to_uppercase(),
            msg.author,
            mentions_str
        ));
        lines.push(format!("_{}_", timestamp));
        lines.push(String::new());
        lines.push(msg.content.clone());
        lines.push(String::new());
        lines.push("---".to_string());
        lines.push(String::new());
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_detected_either_order() {
        assert_eq!(completion_claim_ids("BUG-12 is fixed"), vec!["BUG-12"]);
        assert_eq!(completion_claim_ids("fixed BUG-12 today"), vec!["BUG-12"]);
        assert_eq!(completion_claim_ids("finally resolved imp-3"), vec!["IMP-3"]);
    }

    #[test]
    fn test_no_claim_on_technical_mentions() {
        assert!(completion_claim_ids("Investigating BUG-12, looks like a race").is_empty());
        assert!(completion_claim_ids("the onComplete callback fires twice").is_empty());
        assert!(completion_claim_ids("BUG-12 blocked on DB access").is_empty());
    }

    #[test]
    fn test_claim_requires_proximity() {
        // Claim word more than 30 chars away from the bug ID
        let content = "BUG-12 needs a long investigation across several modules before anything is done";
        assert!(completion_claim_ids(content).is_empty());
    }

    #[test]
    fn test_claim_ids_deduped_and_uppercased() {
        let ids = completion_claim_ids("bug-7 fixed, also fixed BUG-7");
        assert_eq!(ids, vec!["BUG-7"]);
    }

    #[test]
    fn test_normalize_mentions() {
        assert_eq!(
            normalize_mentions(Some("@Fizz, Buzz ,")),
            vec!["@Fizz".to_string(), "@Buzz".to_string()]
        );
        assert!(normalize_mentions(None).is_empty());
    }

    #[test]
    fn test_render_board_md_shape() {
        let messages = vec![Message {
            id: 1,
            author: "Fizz".into(),
            message_type: "status".into(),
            content: "Working on the toast".into(),
            data: None,
            refs: None,
            mentions: vec!["@Pazz".into()],
            routed_to: None,
            routed_id: None,
            resolved: false,
            created_at: "2026-08-07 10:00:00".into(),
        }];
        let md = render_board_md(&messages);
        assert!(md.starts_with("# Team Board"));
        assert!(md.contains("### [STATUS] Fizz -> @Pazz"));
        assert!(md.contains("Working on the toast"));
    }
}
