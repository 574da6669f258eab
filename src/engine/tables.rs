//! Page text → blocks, with optional column-alignment table detection.
//!
//! A PDF text layer loses table borders but usually keeps wide gaps between
//! columns. A run of at least [`MIN_TABLE_ROWS`] consecutive lines that all
//! split into the same number (≥ 2) of cells on tab / multi-space gaps is
//! emitted as a [`Table`] block. Everything else becomes paragraph text,
//! split on blank lines.

use super::{Block, Table};
use once_cell::sync::Lazy;
use regex::Regex;

/// Header plus at least two body rows.
pub const MIN_TABLE_ROWS: usize = 3;

static RE_CELL_GAP: Lazy<Regex> = Lazy::new(|| Regex::new(r"\t+| {2,}").unwrap());

/// Split a line into cells on tab / multi-space gaps.
fn cells(line: &str) -> Vec<String> {
    RE_CELL_GAP
        .split(line.trim())
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}

/// Split `text` into paragraph blocks, detecting tables when asked.
pub fn page_blocks(text: &str, detect_tables: bool) -> Vec<Block> {
    if !detect_tables {
        return paragraphs(text);
    }

    let lines: Vec<&str> = text.lines().collect();
    let mut blocks = Vec::new();
    let mut pending: Vec<&str> = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let first = cells(lines[i]);
        if first.len() >= 2 {
            let width = first.len();
            let mut rows = vec![first];
            let mut j = i + 1;
            while j < lines.len() {
                let next = cells(lines[j]);
                if next.len() != width {
                    break;
                }
                rows.push(next);
                j += 1;
            }
            if rows.len() >= MIN_TABLE_ROWS {
                blocks.extend(paragraphs(&pending.join("\n")));
                pending.clear();
                blocks.push(Block::Table(Table { rows }));
                i = j;
                continue;
            }
        }
        pending.push(lines[i]);
        i += 1;
    }

    blocks.extend(paragraphs(&pending.join("\n")));
    blocks
}

/// Blank-line separated paragraphs, trimmed, empty ones dropped.
pub fn paragraphs(text: &str) -> Vec<Block> {
    let mut out = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                out.push(Block::Text(current.join("\n")));
                current.clear();
            }
        } else {
            current.push(line.trim_end());
        }
    }
    if !current.is_empty() {
        out.push(Block::Text(current.join("\n")));
    }
    out
}
