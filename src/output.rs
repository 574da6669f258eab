//! Result types for a batch run.

use crate::engine::Features;
use serde::Serialize;
use std::path::PathBuf;

/// How one discovered PDF ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Skipped,
    Failed,
}

impl Outcome {
    /// Upper-case label used in log lines.
    pub fn label(self) -> &'static str {
        match self {
            Outcome::Success => "SUCCESS",
            Outcome::Skipped => "SKIPPED",
            Outcome::Failed => "FAILED",
        }
    }
}

/// Content statistics of one produced Markdown file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FileStats {
    pub pages: usize,
    pub images: usize,
    /// Unicode scalar values in the Markdown, markers included.
    pub characters: usize,
    /// Whitespace-separated tokens in the Markdown, markers included.
    pub words: usize,
}

impl FileStats {
    pub fn from_markdown(markdown: &str, pages: usize, images: usize) -> Self {
        Self {
            pages,
            images,
            characters: markdown.chars().count(),
            words: markdown.split_whitespace().count(),
        }
    }
}

/// One line of the aggregate log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    pub pdf: PathBuf,
    /// Path relative to the source folder.
    pub relative: PathBuf,
    pub markdown: PathBuf,
    /// `None` when no per-file log was written (skips, output conflicts).
    pub log: Option<PathBuf>,
    pub outcome: Outcome,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<FileStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileRecord {
    /// `SUCCESS sub/a.pdf -> /out/sub/a.md (12 pages, 3 images, 812 ms)`
    pub fn summary_line(&self) -> String {
        let name = self.relative.display();
        match self.outcome {
            Outcome::Success => {
                let stats = self.stats.unwrap_or_default();
                format!(
                    "{} {name} -> {} ({} pages, {} images, {} ms)",
                    self.outcome.label(),
                    self.markdown.display(),
                    stats.pages,
                    stats.images,
                    self.duration_ms
                )
            }
            Outcome::Skipped => format!(
                "{} {name}: {} already exists",
                self.outcome.label(),
                self.markdown.display()
            ),
            Outcome::Failed => format!(
                "{} {name} ({} ms): {}",
                self.outcome.label(),
                self.duration_ms,
                self.error.as_deref().unwrap_or("unknown error")
            ),
        }
    }
}

/// Everything a run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Engine description returned by the extractor check.
    pub engine: String,
    /// Features after the dependency policy was applied.
    pub features: Features,
    /// Downgrade warnings from the dependency probe.
    pub warnings: Vec<String>,
    pub run_log: PathBuf,
    pub files: Vec<FileRecord>,
    pub total_duration_ms: u64,
}

impl RunSummary {
    fn count(&self, outcome: Outcome) -> usize {
        self.files.iter().filter(|f| f.outcome == outcome).count()
    }

    pub fn discovered(&self) -> usize {
        self.files.len()
    }

    pub fn succeeded(&self) -> usize {
        self.count(Outcome::Success)
    }

    pub fn skipped(&self) -> usize {
        self.count(Outcome::Skipped)
    }

    pub fn failed(&self) -> usize {
        self.count(Outcome::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(outcome: Outcome) -> FileRecord {
        FileRecord {
            pdf: PathBuf::from("/in/sub/a.pdf"),
            relative: PathBuf::from("sub/a.pdf"),
            markdown: PathBuf::from("/out/sub/a.md"),
            log: None,
            outcome,
            duration_ms: 15,
            stats: None,
            error: None,
        }
    }

    #[test]
    fn stats_count_markers_as_words() {
        let s = FileStats::from_markdown("<PAGINA:001>\n\nOlá mundo\n", 1, 0);
        assert_eq!(s.words, 3);
        assert_eq!(s.characters, 24);
    }

    #[test]
    fn summary_lines() {
        let mut ok = record(Outcome::Success);
        ok.stats = Some(FileStats {
            pages: 2,
            images: 1,
            characters: 10,
            words: 2,
        });
        assert_eq!(
            ok.summary_line(),
            "SUCCESS sub/a.pdf -> /out/sub/a.md (2 pages, 1 images, 15 ms)"
        );

        let mut failed = record(Outcome::Failed);
        failed.error = Some("corrupt".into());
        assert_eq!(failed.summary_line(), "FAILED sub/a.pdf (15 ms): corrupt");

        assert!(record(Outcome::Skipped)
            .summary_line()
            .starts_with("SKIPPED sub/a.pdf"));
    }

    #[test]
    fn summary_counts() {
        let summary = RunSummary {
            engine: "test".into(),
            features: Features::default(),
            warnings: vec![],
            run_log: PathBuf::from("log.txt"),
            files: vec![
                record(Outcome::Success),
                record(Outcome::Failed),
                record(Outcome::Skipped),
                record(Outcome::Success),
            ],
            total_duration_ms: 0,
        };
        assert_eq!(summary.discovered(), 4);
        assert_eq!(summary.succeeded(), 2);
        assert_eq!(summary.failed(), 1);
        assert_eq!(summary.skipped(), 1);
    }
}
