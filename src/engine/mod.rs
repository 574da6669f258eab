//! Extraction engines: PDF bytes in, structured document out.
//!
//! The batch pipeline only ever talks to an [`Extractor`]. It never knows
//! whether text came from a PDF text layer, an OCR pass, or a test fixture,
//! so the marker and logging logic can be exercised without any native
//! library installed.
//!
//! ```text
//! bytes + Features ──▶ Extractor::extract ──▶ ExtractedDocument
//!                                             └─ pages ─ blocks (Text | Table | Image)
//! ```
//!
//! [`PdfiumExtractor`] is the production engine.

pub mod ocr;
pub mod pdfium;
pub mod tables;

pub use pdfium::PdfiumExtractor;

use crate::error::ExtractionError;
use serde::{Deserialize, Serialize};

/// Feature flags passed to the engine for every document of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Features {
    /// Run OCR on pages that have no text layer.
    pub ocr: bool,
    /// Turn column-aligned text into table blocks.
    pub detect_tables: bool,
}

/// A document as returned by an engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedDocument {
    /// Pages in document order.
    pub pages: Vec<ExtractedPage>,
}

impl ExtractedDocument {
    pub fn new(pages: Vec<ExtractedPage>) -> Self {
        Self { pages }
    }
}

/// One page: an ordered sequence of blocks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedPage {
    pub blocks: Vec<Block>,
}

impl ExtractedPage {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }
}

/// A unit of page content in reading order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Block {
    /// Markdown text (headings, paragraphs, lists).
    Text(String),
    /// A detected table.
    Table(Table),
    /// An embedded picture, in stream position.
    Image,
}

impl Block {
    pub fn text(s: impl Into<String>) -> Self {
        Block::Text(s.into())
    }

    pub fn image() -> Self {
        Block::Image
    }
}

/// Rows of cells; the first row is the header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Render as a GitHub-flavoured Markdown table.
    ///
    /// Short rows are padded to the widest row; `|` inside a cell is escaped.
    pub fn to_markdown(&self) -> String {
        let width = self.rows.iter().map(Vec::len).max().unwrap_or(0);
        if width == 0 {
            return String::new();
        }

        let render_row = |row: &[String]| -> String {
            let mut line = String::from("|");
            for i in 0..width {
                let cell = row.get(i).map(|c| c.trim()).unwrap_or("");
                line.push(' ');
                line.push_str(&cell.replace('|', "\\|"));
                line.push_str(" |");
            }
            line
        };

        let mut lines = Vec::with_capacity(self.rows.len() + 1);
        lines.push(render_row(&self.rows[0]));
        lines.push(format!("|{}", " --- |".repeat(width)));
        for row in &self.rows[1..] {
            lines.push(render_row(row));
        }
        lines.join("\n")
    }
}

/// The extraction collaborator.
///
/// Implementations are called from the blocking thread pool, one document at
/// a time.
pub trait Extractor: Send + Sync {
    /// Short engine name for logs, e.g. `"pdfium"`.
    fn name(&self) -> &str;

    /// Confirm the engine can run; returns a description (library path,
    /// version). Called once per run before any file is processed.
    fn check(&self) -> Result<String, ExtractionError>;

    /// Extract one PDF.
    fn extract(&self, pdf: &[u8], features: Features) -> Result<ExtractedDocument, ExtractionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_renders_gfm() {
        let t = Table {
            rows: vec![
                vec!["Item".into(), "Qty".into()],
                vec!["apple".into(), "3".into()],
                vec!["pear".into()],
            ],
        };
        assert_eq!(
            t.to_markdown(),
            "| Item | Qty |\n| --- | --- |\n| apple | 3 |\n| pear |  |"
        );
    }

    #[test]
    fn table_escapes_pipes() {
        let t = Table {
            rows: vec![vec!["a|b".into()], vec!["c".into()]],
        };
        assert!(t.to_markdown().starts_with("| a\\|b |"));
    }

    #[test]
    fn empty_table_renders_nothing() {
        assert_eq!(Table::default().to_markdown(), "");
    }
}
