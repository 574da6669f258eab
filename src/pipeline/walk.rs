//! Lazy discovery of PDFs and their mirrored output paths.
//!
//! [`FileWalker`] yields one [`Discovery`] per `.pdf` found (extension
//! matched case-insensitively, entries sorted by file name so runs are
//! reproducible). Each discovery already knows where its Markdown and log go:
//!
//! ```text
//! source/sub/a.pdf ─▶ destination/sub/a.md
//!                  └▶ logs/sub/a.log
//! ```
//!
//! Nothing is read or written here; the walker only decides.

use crate::config::RunConfig;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Paths for one PDF of the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTask {
    /// The PDF to convert.
    pub pdf: PathBuf,
    /// `pdf` relative to the source folder, used in log lines.
    pub relative: PathBuf,
    /// Output Markdown file.
    pub markdown: PathBuf,
    /// Per-file log.
    pub log: PathBuf,
}

/// What the walker decided for one PDF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Discovery {
    /// Convert it.
    Pending(FileTask),
    /// The Markdown already exists and overwriting is off.
    Skipped(FileTask),
    /// An earlier PDF of this run already maps to the same Markdown file.
    Conflict { task: FileTask, claimed_by: PathBuf },
}

impl Discovery {
    pub fn task(&self) -> &FileTask {
        match self {
            Discovery::Pending(t) | Discovery::Skipped(t) => t,
            Discovery::Conflict { task, .. } => task,
        }
    }
}

enum Source {
    Tree(walkdir::IntoIter),
    Single(Option<PathBuf>),
}

/// Iterator over the PDFs of a run.
pub struct FileWalker {
    source: Source,
    source_folder: PathBuf,
    destination_folder: PathBuf,
    log_folder: PathBuf,
    overwrite: bool,
    /// Markdown path → PDF that claimed it.
    claimed: HashMap<PathBuf, PathBuf>,
}

impl FileWalker {
    pub fn new(config: &RunConfig) -> Self {
        let source = match &config.single_file {
            Some(pdf) => Source::Single(Some(pdf.clone())),
            None => {
                let max_depth = if config.subfolders { usize::MAX } else { 1 };
                Source::Tree(
                    WalkDir::new(&config.source_folder)
                        .min_depth(1)
                        .max_depth(max_depth)
                        .follow_links(true)
                        .sort_by_file_name()
                        .into_iter(),
                )
            }
        };

        Self {
            source,
            source_folder: config.source_folder.clone(),
            destination_folder: config.destination_folder.clone(),
            log_folder: config.log_folder.clone(),
            overwrite: config.overwrite,
            claimed: HashMap::new(),
        }
    }

    fn next_pdf(&mut self) -> Option<PathBuf> {
        match &mut self.source {
            Source::Single(pdf) => pdf.take(),
            Source::Tree(entries) => loop {
                let entry = match entries.next()? {
                    Ok(entry) => entry,
                    Err(e) => {
                        warn!("Skipping unreadable entry: {e}");
                        continue;
                    }
                };
                if entry.file_type().is_file() && is_pdf(entry.path()) {
                    return Some(entry.into_path());
                }
            },
        }
    }

    /// Mirror `pdf`'s position under the source folder into the output folders.
    pub fn task_for(&self, pdf: &Path) -> FileTask {
        let relative = match pdf.strip_prefix(&self.source_folder) {
            Ok(rel) => rel.to_path_buf(),
            Err(_) => PathBuf::from(pdf.file_name().unwrap_or(pdf.as_os_str())),
        };
        FileTask {
            pdf: pdf.to_path_buf(),
            markdown: self.destination_folder.join(&relative).with_extension("md"),
            log: self.log_folder.join(&relative).with_extension("log"),
            relative,
        }
    }
}

impl Iterator for FileWalker {
    type Item = Discovery;

    fn next(&mut self) -> Option<Discovery> {
        let pdf = self.next_pdf()?;
        let task = self.task_for(&pdf);

        if let Some(first) = self.claimed.get(&task.markdown) {
            return Some(Discovery::Conflict {
                claimed_by: first.clone(),
                task,
            });
        }
        self.claimed.insert(task.markdown.clone(), task.pdf.clone());

        if !self.overwrite && task.markdown.exists() {
            debug!("Output exists, skipping: {}", task.markdown.display());
            return Some(Discovery::Skipped(task));
        }
        Some(Discovery::Pending(task))
    }
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}
