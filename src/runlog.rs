//! Human-readable log files: one per PDF plus one aggregate per run.
//!
//! Both use the same line format, `[YYYY-MM-DD HH:MM:SS] message`, in local
//! time.
//!
//! * [`FileLog`] collects the lines of one conversion in memory and is written
//!   once, next to the mirrored Markdown path under the log folder.
//! * [`RunLog`] is the aggregate [`RUN_LOG_FILE`]. It is truncated when a run
//!   starts and appended after every file, so an interrupted run still leaves
//!   a record of every file finished so far.
//!
//! These files are for the operator; diagnostics go through `tracing`.

use crate::error::{BatchError, FileError};
use crate::output::{FileRecord, RunSummary};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::warn;

/// Aggregate log file name, created in the log folder.
pub const RUN_LOG_FILE: &str = "log_extração.txt";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Current local time as `YYYY-MM-DD HH:MM:SS`.
pub fn timestamp() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

fn stamp(message: &str) -> String {
    format!("[{}] {message}\n", timestamp())
}

// ── Per-file log ─────────────────────────────────────────────────────────────

/// Lines for one PDF, written with [`FileLog::save`].
#[derive(Debug)]
pub struct FileLog {
    path: PathBuf,
    content: String,
}

impl FileLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            content: String::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn push(&mut self, message: impl AsRef<str>) {
        self.content.push_str(&stamp(message.as_ref()));
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Write the log, replacing any previous one and creating parent folders.
    pub async fn save(&self) -> Result<(), FileError> {
        let write_err = |source| FileError::Write {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
        }
        tokio::fs::write(&self.path, &self.content)
            .await
            .map_err(write_err)
    }
}

// ── Aggregate run log ────────────────────────────────────────────────────────

/// The run-wide log. Holds the open file for the duration of the run.
pub struct RunLog {
    path: PathBuf,
    file: tokio::fs::File,
}

impl RunLog {
    /// Create (or truncate) the aggregate log, creating its folder.
    pub async fn create(path: impl Into<PathBuf>) -> Result<Self, BatchError> {
        let path = path.into();
        let err = |source| BatchError::RunLog {
            path: path.clone(),
            source,
        };
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(err)?;
        }
        let file = tokio::fs::File::create(&path).await.map_err(err)?;
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one timestamped line and flush it.
    ///
    /// A failed append only warns: the per-file results are already on disk
    /// and the run carries on.
    pub async fn line(&mut self, message: impl AsRef<str>) {
        let line = stamp(message.as_ref());
        let result = async {
            self.file.write_all(line.as_bytes()).await?;
            self.file.flush().await
        }
        .await;
        if let Err(e) = result {
            warn!("Could not append to {}: {e}", self.path.display());
        }
    }

    /// Append the outcome of one file.
    pub async fn record(&mut self, record: &FileRecord) {
        self.line(record.summary_line()).await;
    }

    /// Append the closing summary block.
    pub async fn finish(&mut self, summary: &RunSummary) {
        self.line("── Summary ──").await;
        self.line(format!("Discovered: {}", summary.discovered()))
            .await;
        self.line(format!("Succeeded:  {}", summary.succeeded()))
            .await;
        self.line(format!("Failed:     {}", summary.failed())).await;
        self.line(format!("Skipped:    {}", summary.skipped())).await;
        self.line(format!("Duration:   {} ms", summary.total_duration_ms))
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::Outcome;

    fn is_stamped(line: &str) -> bool {
        // [2024-01-31 12:00:00] ...
        line.len() > 22
            && line.starts_with('[')
            && &line[20..22] == "] "
            && chrono::NaiveDateTime::parse_from_str(&line[1..20], TIMESTAMP_FORMAT).is_ok()
    }

    #[test]
    fn lines_are_timestamped() {
        let mut log = FileLog::new("x.log");
        log.push("Starting extraction");
        log.push("Pages: 3");
        let lines: Vec<&str> = log.content().lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|l| is_stamped(l)));
        assert!(lines[1].ends_with("Pages: 3"));
    }

    #[tokio::test]
    async fn file_log_creates_parent_folders() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a/b/report.log");
        let mut log = FileLog::new(&path);
        log.push("hello");
        log.save().await.unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.ends_with("hello\n"));
    }

    #[tokio::test]
    async fn run_log_truncates_and_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(RUN_LOG_FILE);
        std::fs::write(&path, "stale content from a previous run\n").unwrap();

        let mut log = RunLog::create(&path).await.unwrap();
        log.line("Run started").await;
        log.record(&FileRecord {
            pdf: "a.pdf".into(),
            relative: "a.pdf".into(),
            markdown: "a.md".into(),
            log: None,
            outcome: Outcome::Failed,
            duration_ms: 3,
            stats: None,
            error: Some("corrupt PDF: bad xref".into()),
        })
        .await;

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(!written.contains("stale"));
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|l| is_stamped(l)));
        assert!(lines[1].ends_with("FAILED a.pdf (3 ms): corrupt PDF: bad xref"));
    }
}
