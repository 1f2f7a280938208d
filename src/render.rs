//! Text output for query results

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use logsift_types::StoredRecord;

const RULE_WIDTH: usize = 120;

/// (header, column width, max content width)
const COLUMNS: [(&str, usize, Option<usize>); 6] = [
    ("IP", 15, None),
    ("Date", 20, Some(19)),
    ("Method", 6, None),
    ("URL", 40, Some(40)),
    ("Status", 6, None),
    ("Size", 6, None),
];

/// Render records as a fixed-width table followed by a row count
pub fn render_table(records: &[StoredRecord]) -> String {
    if records.is_empty() {
        return "Nothing found.\n".to_string();
    }

    let rule = "-".repeat(RULE_WIDTH);
    let headers: Vec<String> = COLUMNS.iter().map(|(h, _, _)| h.to_string()).collect();

    let mut lines = vec![rule.clone(), render_row(&headers), rule.clone()];
    lines.extend(records.iter().map(|stored| {
        let r = &stored.record;
        render_row(&[
            r.ip.clone(),
            r.timestamp.clone(),
            r.method.clone(),
            r.url.clone(),
            r.status.to_string(),
            r.size.to_string(),
        ])
    }));
    lines.push(rule);
    lines.push(format!("Total rows: {}", records.len()));

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Render records as one JSON object per line
pub fn render_json_lines(records: &[StoredRecord]) -> serde_json::Result<String> {
    let mut out = String::new();
    for record in records {
        out.push_str(&serde_json::to_string(record)?);
        out.push('\n');
    }
    Ok(out)
}

fn render_row(cells: &[String]) -> String {
    let parts: Vec<String> = cells
        .iter()
        .zip(COLUMNS.iter())
        .map(|(cell, (_, width, max))| {
            let text = match max {
                Some(max) => truncate_to_width(cell, *max),
                None => cell.as_str(),
            };
            pad_to_width(text, *width)
        })
        .collect();
    format!("| {} |", parts.join(" | "))
}

/// Longest prefix of `s` that fits in `max` display columns
fn truncate_to_width(s: &str, max: usize) -> &str {
    let mut width = 0;
    for (idx, c) in s.char_indices() {
        width += c.width().unwrap_or(0);
        if width > max {
            return &s[..idx];
        }
    }
    s
}

/// Left-align `s` in `width` display columns; longer text is left as is
fn pad_to_width(s: &str, width: usize) -> String {
    let padding = width.saturating_sub(s.width());
    format!("{s}{}", " ".repeat(padding))
}
