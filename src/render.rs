//! Plain-text table rendering for list commands.
//!
//! Every list command prints either a simple ASCII table (default) or
//! pretty-printed JSON (`--json`). Cell values are truncated to a maximum
//! column width so wide free-text fields stay readable.

const MAX_COL_WIDTH: usize = 50;

/// Render rows as an ASCII table. Returns "No results found." for an empty
/// row set so callers can print the result unconditionally.
pub fn format_table(columns: &[&str], rows: &[Vec<String>]) -> String {
    if rows.is_empty() {
        return "No results found.".to_string();
    }

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, col)| {
            let data_max = rows
                .iter()
                .map(|row| cell(row, i).chars().count().min(MAX_COL_WIDTH))
                .max()
                .unwrap_or(0);
            col.chars().count().max(data_max)
        })
        .collect();

    let header = columns
        .iter()
        .enumerate()
        .map(|(i, col)| pad(col, widths[i]))
        .collect::<Vec<_>>()
        .join(" | ");
    let separator = widths
        .iter()
        .map(|w| "-".repeat(*w))
        .collect::<Vec<_>>()
        .join("-+-");

    let mut lines = vec![header, separator];
    for row in rows {
        let line = (0..columns.len())
            .map(|i| pad(&truncate(cell(row, i), widths[i]), widths[i]))
            .collect::<Vec<_>>()
            .join(" | ");
        lines.push(line.trim_end().to_string());
    }

    lines.join("\n")
}

/// Print a serializable value as pretty JSON.
pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn cell<'a>(row: &'a [String], index: usize) -> &'a str {
    row.get(index).map(String::as_str).unwrap_or("")
}

fn truncate(s: &str, width: usize) -> String {
    // Flatten newlines so one row stays one line
    let flat: String = s.replace('\n', " ");
    flat.chars().take(width).collect()
}

fn pad(s: &str, width: usize) -> String {
    let len = s.chars().count();
    if len >= width {
        s.to_string()
    } else {
        format!("{}{}", s, " ".repeat(width - len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_rows() {
        assert_eq!(format_table(&["id", "title"], &[]), "No results found.");
    }

    #[test]
    fn test_basic_table() {
        let rows = vec![
            vec!["BUG-1".to_string(), "Toast never dismisses".to_string()],
            vec!["BUG-2".to_string(), "Login loops".to_string()],
        ];
        let out = format_table(&["id", "title"], &rows);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("id"));
        assert!(lines[1].contains("-+-"));
        assert!(lines[2].contains("BUG-1"));
        assert!(lines[3].contains("Login loops"));
    }

    #[test]
    fn test_long_values_truncated() {
        let long = "x".repeat(200);
        let rows = vec![vec!["1".to_string(), long]];
        let out = format_table(&["id", "text"], &rows);
        for line in out.lines() {
            assert!(line.chars().count() <= MAX_COL_WIDTH + 10);
        }
    }

    #[test]
    fn test_newlines_flattened() {
        let rows = vec![vec!["1".to_string(), "line one\nline two".to_string()]];
        let out = format_table(&["id", "text"], &rows);
        assert_eq!(out.lines().count(), 3);
        assert!(out.contains("line one line two"));
    }
}
