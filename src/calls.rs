//! Function call relationships between documented symbols.
//!
//! Edges live in `code_calls` and point at `code_docs` rows; the callee side
//! may be external (name only, no doc). The tree commands load the whole
//! edge set up front and walk it in memory, which keeps recursion simple and
//! makes cycles easy to guard against.

use anyhow::{bail, Result};
use serde::Serialize;
use sqlx::{Row, SqlitePool};
use std::collections::{HashMap, HashSet};

use crate::config::Config;
use crate::db;
use crate::docs;
use crate::render;
use crate::vocab::CallType;

#[derive(Debug, Clone)]
struct CallEdge {
    caller_id: i64,
    callee_id: Option<i64>,
    callee_name: String,
    call_type: String,
    line_number: Option<i64>,
}

#[derive(Debug, Clone)]
struct SymbolInfo {
    name: String,
    symbol_type: String,
    file_path: String,
}

#[derive(Debug, Serialize)]
pub struct TreeNode {
    pub id: Option<i64>,
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: Option<String>,
    pub line: Option<i64>,
    pub external: bool,
    pub children: Vec<TreeNode>,
}

pub async fn run_add(
    config: &Config,
    caller_id: i64,
    callee_name: &str,
    call_type: CallType,
    callee_id: Option<i64>,
    line_number: Option<i64>,
) -> Result<()> {
    if callee_name.trim().is_empty() {
        bail!("--callee-name must not be empty");
    }

    let pool = db::connect(config).await?;
    let caller_exists: bool = sqlx::query_scalar("SELECT COUNT(*) > 0 FROM code_docs WHERE id = ?")
        .bind(caller_id)
        .fetch_one(&pool)
        .await?;
    if !caller_exists {
        pool.close().await;
        bail!("Caller code doc not found: {}", caller_id);
    }
    if let Some(callee_id) = callee_id {
        let callee_exists: bool =
            sqlx::query_scalar("SELECT COUNT(*) > 0 FROM code_docs WHERE id = ?")
                .bind(callee_id)
                .fetch_one(&pool)
                .await?;
        if !callee_exists {
            pool.close().await;
            bail!("Callee code doc not found: {}", callee_id);
        }
    }

    let result = sqlx::query(
        r#"
        INSERT INTO code_calls (caller_id, callee_id, callee_name, call_type, line_number, created_at)
        VALUES (?, ?, ?, ?, ?, datetime('now'))
        "#,
    )
    .bind(caller_id)
    .bind(callee_id)
    .bind(callee_name)
    .bind(call_type.as_str())
    .bind(line_number)
    .execute(&pool)
    .await?;
    pool.close().await;

    println!("Stored call: {}", result.last_insert_rowid());
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub async fn run_list(
    config: &Config,
    from: Option<&str>,
    to: Option<&str>,
    name: Option<&str>,
    call_type: Option<CallType>,
    limit: i64,
    json: bool,
) -> Result<()> {
    let pool = db::connect(config).await?;

    if let Some(from_name) = from {
        let doc = match docs::get_code_doc_by_name(&pool, from_name, None).await? {
            Some(doc) => doc,
            None => {
                pool.close().await;
                bail!("Symbol not found: {}", from_name);
            }
        };
        let rows = sqlx::query(
            "SELECT * FROM code_calls WHERE caller_id = ? ORDER BY line_number",
        )
        .bind(doc.id)
        .fetch_all(&pool)
        .await?;
        pool.close().await;

        println!("Functions called by {} (code_id:{}):", from_name, doc.id);
        println!();
        for row in &rows {
            let callee_id: Option<i64> = row.get("callee_id");
            let callee_name: String = row.get("callee_name");
            let call_type: String = row.get("call_type");
            let line: Option<i64> = row.get("line_number");
            let ext = if callee_id.is_none() { " [external]" } else { "" };
            println!(
                "  -> {} ({}) @ line {}{}",
                callee_name,
                call_type,
                line.map(|l| l.to_string()).unwrap_or_else(|| "?".into()),
                ext
            );
        }
        return Ok(());
    }

    if let Some(to_name) = to {
        let doc = match docs::get_code_doc_by_name(&pool, to_name, None).await? {
            Some(doc) => doc,
            None => {
                pool.close().await;
                bail!("Symbol not found: {}", to_name);
            }
        };
        let rows = sqlx::query(
            r#"
            SELECT c.call_type, c.line_number, caller.symbol_name AS caller_name,
                   caller.file_path AS caller_file
            FROM code_calls c
            JOIN code_docs caller ON c.caller_id = caller.id
            WHERE c.callee_id = ?
            ORDER BY caller.file_path, c.line_number
            "#,
        )
        .bind(doc.id)
        .fetch_all(&pool)
        .await?;
        pool.close().await;

        println!("Functions that call {} (code_id:{}):", to_name, doc.id);
        println!();
        for row in &rows {
            let caller_name: Option<String> = row.get("caller_name");
            let caller_file: String = row.get("caller_file");
            let call_type: String = row.get("call_type");
            let line: Option<i64> = row.get("line_number");
            println!(
                "  <- {} ({}) @ {}:{}",
                caller_name.as_deref().unwrap_or("?"),
                call_type,
                caller_file,
                line.map(|l| l.to_string()).unwrap_or_else(|| "?".into()),
            );
        }
        return Ok(());
    }

    // General query
    let mut conditions: Vec<&str> = Vec::new();
    let mut params: Vec<String> = Vec::new();
    if let Some(name) = name {
        conditions.push("c.callee_name LIKE ?");
        params.push(format!("%{}%", name));
    }
    if let Some(call_type) = call_type {
        conditions.push("c.call_type = ?");
        params.push(call_type.as_str().to_string());
    }
    let where_clause = if conditions.is_empty() {
        "1=1".to_string()
    } else {
        conditions.join(" AND ")
    };

    let sql = format!(
        r#"
        SELECT c.*, caller.symbol_name AS caller_name
        FROM code_calls c
        JOIN code_docs caller ON c.caller_id = caller.id
        WHERE {}
        ORDER BY c.line_number
        LIMIT ?
        "#,
        where_clause
    );
    let mut query = sqlx::query(&sql);
    for p in &params {
        query = query.bind(p);
    }
    let rows = query.bind(limit).fetch_all(&pool).await?;
    pool.close().await;

    if json {
        let values: Vec<serde_json::Value> = rows
            .iter()
            .map(|row| {
                serde_json::json!({
                    "id": row.get::<i64, _>("id"),
                    "caller_id": row.get::<i64, _>("caller_id"),
                    "caller_name": row.get::<Option<String>, _>("caller_name"),
                    "callee_id": row.get::<Option<i64>, _>("callee_id"),
                    "callee_name": row.get::<String, _>("callee_name"),
                    "call_type": row.get::<String, _>("call_type"),
                    "line_number": row.get::<Option<i64>, _>("line_number"),
                })
            })
            .collect();
        render::print_json(&values)?;
    } else {
        let table_rows: Vec<Vec<String>> = rows
            .iter()
            .map(|row| {
                vec![
                    row.get::<Option<String>, _>("caller_name").unwrap_or_default(),
                    row.get::<String, _>("callee_name"),
                    row.get::<String, _>("call_type"),
                    row.get::<Option<i64>, _>("line_number")
                        .map(|l| l.to_string())
                        .unwrap_or_default(),
                ]
            })
            .collect();
        println!(
            "{}",
            render::format_table(
                &["caller_name", "callee_name", "call_type", "line_number"],
                &table_rows
            )
        );
    }

    Ok(())
}

pub async fn run_tree(
    config: &Config,
    symbol: &str,
    depth: usize,
    callers: bool,
    json: bool,
) -> Result<()> {
    let pool = db::connect(config).await?;
    let doc = match docs::get_code_doc_by_name(&pool, symbol, None).await? {
        Some(doc) => doc,
        None => {
            pool.close().await;
            bail!("Symbol not found: {}", symbol);
        }
    };

    let (edges, symbols) = load_graph(&pool).await?;
    pool.close().await;

    let mut visited = HashSet::new();
    visited.insert(doc.id);
    let tree = build_tree(doc.id, depth, callers, &edges, &symbols, &mut visited);

    if json {
        render::print_json(&tree)?;
    } else {
        print_tree(&tree, "", true, true);
    }
    Ok(())
}

async fn load_graph(pool: &SqlitePool) -> Result<(Vec<CallEdge>, HashMap<i64, SymbolInfo>)> {
    let edge_rows = sqlx::query("SELECT * FROM code_calls ORDER BY line_number")
        .fetch_all(pool)
        .await?;
    let edges: Vec<CallEdge> = edge_rows
        .iter()
        .map(|row| CallEdge {
            caller_id: row.get("caller_id"),
            callee_id: row.get("callee_id"),
            callee_name: row.get("callee_name"),
            call_type: row.get("call_type"),
            line_number: row.get("line_number"),
        })
        .collect();

    let doc_rows = sqlx::query("SELECT id, symbol_name, symbol_type, file_path FROM code_docs")
        .fetch_all(pool)
        .await?;
    let symbols: HashMap<i64, SymbolInfo> = doc_rows
        .iter()
        .map(|row| {
            let id: i64 = row.get("id");
            let name: Option<String> = row.get("symbol_name");
            (
                id,
                SymbolInfo {
                    name: name.unwrap_or_else(|| "(file)".to_string()),
                    symbol_type: row.get("symbol_type"),
                    file_path: row.get("file_path"),
                },
            )
        })
        .collect();

    Ok((edges, symbols))
}

fn build_tree(
    id: i64,
    depth: usize,
    callers: bool,
    edges: &[CallEdge],
    symbols: &HashMap<i64, SymbolInfo>,
    visited: &mut HashSet<i64>,
) -> TreeNode {
    let info = symbols.get(&id);
    let mut node = TreeNode {
        id: Some(id),
        name: info.map(|i| i.name.clone()).unwrap_or_else(|| "?".into()),
        node_type: info.map(|i| i.symbol_type.clone()),
        line: None,
        external: false,
        children: Vec::new(),
    };

    if depth == 0 {
        return node;
    }

    for edge in edges {
        let (matches, next_id, child_name, external) = if callers {
            (
                edge.callee_id == Some(id),
                Some(edge.caller_id),
                symbols
                    .get(&edge.caller_id)
                    .map(|i| i.name.clone())
                    .unwrap_or_else(|| "?".into()),
                false,
            )
        } else {
            (
                edge.caller_id == id,
                edge.callee_id,
                edge.callee_name.clone(),
                edge.callee_id.is_none(),
            )
        };
        if !matches {
            continue;
        }

        let child = match next_id {
            // Recurse only into unvisited documented symbols
            Some(next) if !visited.contains(&next) => {
                visited.insert(next);
                let mut subtree = build_tree(next, depth - 1, callers, edges, symbols, visited);
                subtree.name = child_name;
                subtree.node_type = Some(edge.call_type.clone());
                subtree.line = edge.line_number;
                subtree.external = external;
                subtree
            }
            _ => TreeNode {
                id: next_id,
                name: child_name,
                node_type: Some(edge.call_type.clone()),
                line: edge.line_number,
                external,
                children: Vec::new(),
            },
        };
        node.children.push(child);
    }

    node
}

fn print_tree(node: &TreeNode, prefix: &str, is_last: bool, is_root: bool) {
    if is_root {
        let type_marker = node
            .node_type
            .as_deref()
            .map(|t| format!(" ({})", t))
            .unwrap_or_default();
        println!(
            "{}{} code_id:{}",
            node.name,
            type_marker,
            node.id.map(|i| i.to_string()).unwrap_or_else(|| "?".into())
        );
    } else {
        let connector = if is_last { "`-- " } else { "|-- " };
        let ext_marker = if node.external { " [external]" } else { "" };
        let type_marker = node
            .node_type
            .as_deref()
            .map(|t| format!(" ({})", t))
            .unwrap_or_default();
        let line_marker = node
            .line
            .map(|l| format!(" @ line {}", l))
            .unwrap_or_default();
        println!(
            "{}{}{}{}{}{}",
            prefix, connector, node.name, type_marker, line_marker, ext_marker
        );
    }

    let child_prefix = if is_root {
        String::new()
    } else if is_last {
        format!("{}    ", prefix)
    } else {
        format!("{}|   ", prefix)
    };
    for (i, child) in node.children.iter().enumerate() {
        let child_last = i == node.children.len() - 1;
        print_tree(child, &child_prefix, child_last, false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(caller: i64, callee: Option<i64>, name: &str) -> CallEdge {
        CallEdge {
            caller_id: caller,
            callee_id: callee,
            callee_name: name.to_string(),
            call_type: "direct".to_string(),
            line_number: Some(10),
        }
    }

    fn symbol(name: &str) -> SymbolInfo {
        SymbolInfo {
            name: name.to_string(),
            symbol_type: "function".to_string(),
            file_path: "src/lib.ts".to_string(),
        }
    }

    #[test]
    fn test_tree_down_with_external_leaf() {
        let edges = vec![edge(1, Some(2), "inner"), edge(2, None, "fetch")];
        let symbols: HashMap<i64, SymbolInfo> =
            [(1, symbol("outer")), (2, symbol("inner"))].into_iter().collect();

        let mut visited = HashSet::from([1]);
        let tree = build_tree(1, 3, false, &edges, &symbols, &mut visited);

        assert_eq!(tree.name, "outer");
        assert_eq!(tree.children.len(), 1);
        assert_eq!(tree.children[0].name, "inner");
        assert_eq!(tree.children[0].children.len(), 1);
        assert_eq!(tree.children[0].children[0].name, "fetch");
        assert!(tree.children[0].children[0].external);
    }

    #[test]
    fn test_tree_cycle_terminates() {
        let edges = vec![edge(1, Some(2), "b"), edge(2, Some(1), "a")];
        let symbols: HashMap<i64, SymbolInfo> =
            [(1, symbol("a")), (2, symbol("b"))].into_iter().collect();

        let mut visited = HashSet::from([1]);
        let tree = build_tree(1, 10, false, &edges, &symbols, &mut visited);

        // a -> b -> a, second 'a' is a leaf because it was already visited
        assert_eq!(tree.children.len(), 1);
        let b = &tree.children[0];
        assert_eq!(b.children.len(), 1);
        assert!(b.children[0].children.is_empty());
    }

    #[test]
    fn test_tree_depth_limits() {
        let edges = vec![edge(1, Some(2), "b"), edge(2, Some(3), "c")];
        let symbols: HashMap<i64, SymbolInfo> =
            [(1, symbol("a")), (2, symbol("b")), (3, symbol("c"))]
                .into_iter()
                .collect();

        let mut visited = HashSet::from([1]);
        let tree = build_tree(1, 1, false, &edges, &symbols, &mut visited);
        assert_eq!(tree.children.len(), 1);
        assert!(tree.children[0].children.is_empty());
    }

    #[test]
    fn test_tree_up_lists_callers() {
        let edges = vec![edge(1, Some(3), "shared"), edge(2, Some(3), "shared")];
        let symbols: HashMap<i64, SymbolInfo> = [
            (1, symbol("callerA")),
            (2, symbol("callerB")),
            (3, symbol("shared")),
        ]
        .into_iter()
        .collect();

        let mut visited = HashSet::from([3]);
        let tree = build_tree(3, 2, true, &edges, &symbols, &mut visited);
        let names: Vec<&str> = tree.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["callerA", "callerB"]);
    }
}
