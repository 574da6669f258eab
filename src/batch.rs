//! Batch entry points: one run over a folder (or a single PDF).
//!
//! ## Run sequence
//!
//! ```text
//! check source ─▶ check engine ─▶ probe deps ─▶ open run log ─▶ walk
//!                                   │                             │
//!                          abort or downgrade        per PDF: read ─▶ extract ─▶ markers
//!                                                             ─▶ (cleanup) ─▶ .md + .log
//! ```
//!
//! Everything before the walk is fatal and returns [`BatchError`] with no
//! Markdown written. Inside the walk every failure is local to its file: it
//! lands in that file's log and in the aggregate log, and the walk moves on.
//! Files are processed one at a time, in walk order.

use crate::config::RunConfig;
use crate::engine::{Extractor, Features, PdfiumExtractor};
use crate::error::{BatchError, FileError};
use crate::output::{FileRecord, FileStats, Outcome, RunSummary};
use crate::pipeline::walk::{Discovery, FileTask, FileWalker};
use crate::pipeline::{cleanup, input, invoke, markers};
use crate::probe::{self, DependencyProbe, ProbeReport, SystemProbe};
use crate::progress::{NoopProgressCallback, ProgressCallback};
use crate::runlog::{self, FileLog, RunLog};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// A configured run with its collaborators.
///
/// ```rust,no_run
/// # async fn demo() -> Result<(), extrator_pdf::BatchError> {
/// use extrator_pdf::{Batch, RunConfig};
///
/// let config = RunConfig::builder("./pdfs").destination_folder("./md").build()?;
/// let summary = Batch::new(config).run().await?;
/// println!("{} converted, {} failed", summary.succeeded(), summary.failed());
/// # Ok(())
/// # }
/// ```
pub struct Batch {
    config: RunConfig,
    extractor: Arc<dyn Extractor>,
    probe: Arc<dyn DependencyProbe>,
    progress: ProgressCallback,
}

impl Batch {
    /// A run using pdfium, the system dependency probe and no progress events.
    pub fn new(config: RunConfig) -> Self {
        let extractor = PdfiumExtractor::new().ocr_language(config.ocr_language.clone());
        Self {
            config,
            extractor: Arc::new(extractor),
            probe: Arc::new(SystemProbe),
            progress: Arc::new(NoopProgressCallback),
        }
    }

    pub fn extractor(mut self, extractor: Arc<dyn Extractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn probe(mut self, probe: Arc<dyn DependencyProbe>) -> Self {
        self.probe = probe;
        self
    }

    pub fn progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = progress;
        self
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Execute the run.
    ///
    /// # Returns
    /// `Ok(RunSummary)` once every discovered PDF was attempted, even if some
    /// failed (check [`RunSummary::failed`]).
    ///
    /// # Errors
    /// Only for fatal conditions: missing source, unusable engine, a missing
    /// dependency under the strict policy, or an aggregate log that cannot be
    /// created.
    pub async fn run(&self) -> Result<RunSummary, BatchError> {
        let total_start = Instant::now();
        let config = &self.config;

        // ── Step 1: Source must exist ────────────────────────────────────
        check_source(config)?;

        // ── Step 2: Engine must load ─────────────────────────────────────
        let engine = invoke::check(self.extractor.clone())
            .await
            .map_err(|e| BatchError::EngineUnavailable(e.to_string()))?;
        info!("Extraction engine: {engine}");

        // ── Step 3: Dependency policy ────────────────────────────────────
        let report = self.probe_dependencies().await?;
        for warning in &report.warnings {
            warn!("{warning}");
        }
        let features = report.features;

        // ── Step 4: Aggregate log ────────────────────────────────────────
        let mut run_log = RunLog::create(config.run_log_path()).await?;
        write_run_header(&mut run_log, config, &engine, &report).await;

        if config.environment_notes {
            write_environment_notes(&mut run_log, config, &engine, &report).await;
        }

        self.progress.on_run_start(&features, &report.warnings);

        // ── Step 5: Walk ─────────────────────────────────────────────────
        let mut files = Vec::new();
        let mut index = 0;
        for discovery in FileWalker::new(config) {
            let record = match discovery {
                Discovery::Pending(task) => {
                    index += 1;
                    self.progress.on_file_start(index, &task.relative);
                    let record = self.convert_task(&task, features).await;
                    self.progress.on_file_complete(index, &record);
                    record
                }
                Discovery::Skipped(task) => {
                    let record = unprocessed(&task, Outcome::Skipped, None);
                    self.progress.on_file_skipped(&record);
                    record
                }
                Discovery::Conflict { task, claimed_by } => {
                    let err = FileError::OutputConflict {
                        output: task.markdown.clone(),
                        claimed_by,
                    };
                    warn!("{}: {err}", task.relative.display());
                    let record = unprocessed(&task, Outcome::Failed, Some(err.to_string()));
                    self.progress.on_file_skipped(&record);
                    record
                }
            };
            run_log.record(&record).await;
            files.push(record);
        }

        // ── Step 6: Summary ──────────────────────────────────────────────
        let summary = RunSummary {
            engine,
            features,
            warnings: report.warnings,
            run_log: run_log.path().to_path_buf(),
            files,
            total_duration_ms: total_start.elapsed().as_millis() as u64,
        };
        run_log.finish(&summary).await;

        info!(
            "Run complete: {} discovered, {} succeeded, {} failed, {} skipped in {}ms",
            summary.discovered(),
            summary.succeeded(),
            summary.failed(),
            summary.skipped(),
            summary.total_duration_ms
        );
        self.progress.on_run_complete(&summary);
        Ok(summary)
    }

    async fn probe_dependencies(&self) -> Result<ProbeReport, BatchError> {
        let config = self.config.clone();
        let prober = self.probe.clone();
        tokio::task::spawn_blocking(move || probe::resolve_features(&config, prober.as_ref()))
            .await
            .map_err(|e| BatchError::Internal(format!("dependency probe panicked: {e}")))?
    }

    /// Convert one PDF and write its per-file log. Never fails the run.
    async fn convert_task(&self, task: &FileTask, features: Features) -> FileRecord {
        let start = Instant::now();
        info!("Converting {}", task.relative.display());

        let mut log = FileLog::new(&task.log);
        log.push(format!("Starting extraction: {}", task.pdf.display()));
        log.push(format!("Output: {}", task.markdown.display()));
        log.push(format!(
            "Engine: {}, OCR: {}, tables: {}",
            self.extractor.name(),
            on_off(features.ocr),
            on_off(features.detect_tables)
        ));

        let result = convert_pdf(
            task,
            self.extractor.clone(),
            features,
            self.config.clean_text,
        )
        .await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match &result {
            Ok(stats) => {
                log.push(format!("Pages: {}", stats.pages));
                log.push(format!("Images: {}", stats.images));
                log.push(format!("Characters: {}", stats.characters));
                log.push(format!("Words: {}", stats.words));
                log.push(format!("Finished successfully in {duration_ms} ms"));
            }
            Err(e) => {
                warn!("{}: {e}", task.relative.display());
                log.push(format!("ERROR: {e}"));
                log.push(format!("Failed after {duration_ms} ms"));
            }
        }

        // The Markdown is already written; a log that cannot be saved only warns.
        let log_path = match log.save().await {
            Ok(()) => Some(task.log.clone()),
            Err(e) => {
                warn!("{}: {e}", task.relative.display());
                None
            }
        };

        match result {
            Ok(stats) => FileRecord {
                pdf: task.pdf.clone(),
                relative: task.relative.clone(),
                markdown: task.markdown.clone(),
                log: log_path,
                outcome: Outcome::Success,
                duration_ms,
                stats: Some(stats),
                error: None,
            },
            Err(e) => FileRecord {
                pdf: task.pdf.clone(),
                relative: task.relative.clone(),
                markdown: task.markdown.clone(),
                log: log_path,
                outcome: Outcome::Failed,
                duration_ms,
                stats: None,
                error: Some(e.to_string()),
            },
        }
    }
}

/// Run with the default collaborators.
pub async fn run(config: RunConfig) -> Result<RunSummary, BatchError> {
    Batch::new(config).run().await
}

/// Synchronous wrapper around [`run`].
///
/// Creates a temporary Tokio runtime. Do not call from within an existing
/// Tokio runtime (it will panic). Use [`run`] instead in async contexts.
pub fn run_sync(config: RunConfig) -> Result<RunSummary, BatchError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| BatchError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(run(config))
}

/// Convert one PDF to its Markdown file.
///
/// Reads `task.pdf`, extracts it, inserts markers, optionally cleans the text
/// and writes `task.markdown` atomically (temp file + rename), so a failed
/// conversion never leaves a partial Markdown file behind.
pub async fn convert_pdf(
    task: &FileTask,
    extractor: Arc<dyn Extractor>,
    features: Features,
    clean: bool,
) -> Result<FileStats, FileError> {
    let bytes = input::read_pdf(&task.pdf).await?;
    let document = invoke::extract(extractor, bytes, features).await?;

    let marked = markers::render(&document);
    let markdown = if clean {
        cleanup::clean_text(&marked.markdown)
    } else {
        marked.markdown
    };
    debug!(
        "{}: {} pages, {} images, {} bytes of Markdown",
        task.relative.display(),
        marked.pages,
        marked.images,
        markdown.len()
    );

    write_atomic(&task.markdown, &markdown).await?;
    Ok(FileStats::from_markdown(
        &markdown,
        marked.pages,
        marked.images,
    ))
}

async fn write_atomic(path: &Path, content: &str) -> Result<(), FileError> {
    let write_err = |source| FileError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let tmp_path = path.with_extension("md.tmp");
    tokio::fs::write(&tmp_path, content)
        .await
        .map_err(write_err)?;

    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(write_err(e));
    }
    Ok(())
}

fn check_source(config: &RunConfig) -> Result<(), BatchError> {
    match &config.single_file {
        Some(pdf) if !pdf.is_file() => Err(BatchError::SourceNotFound { path: pdf.clone() }),
        Some(_) => Ok(()),
        None if !config.source_folder.is_dir() => Err(BatchError::SourceNotFound {
            path: config.source_folder.clone(),
        }),
        None => Ok(()),
    }
}

fn unprocessed(task: &FileTask, outcome: Outcome, error: Option<String>) -> FileRecord {
    FileRecord {
        pdf: task.pdf.clone(),
        relative: task.relative.clone(),
        markdown: task.markdown.clone(),
        log: None,
        outcome,
        duration_ms: 0,
        stats: None,
        error,
    }
}

fn on_off(v: bool) -> &'static str {
    if v {
        "on"
    } else {
        "off"
    }
}

async fn write_run_header(
    run_log: &mut RunLog,
    config: &RunConfig,
    engine: &str,
    report: &ProbeReport,
) {
    run_log.line("Run started").await;
    match &config.single_file {
        Some(pdf) => run_log.line(format!("Single file: {}", pdf.display())).await,
        None => {
            run_log
                .line(format!("Source folder: {}", config.source_folder.display()))
                .await;
            run_log
                .line(format!(
                    "Subfolders: {}, overwrite: {}",
                    on_off(config.subfolders),
                    on_off(config.overwrite)
                ))
                .await;
        }
    }
    run_log
        .line(format!(
            "Destination folder: {}",
            config.destination_folder.display()
        ))
        .await;
    run_log
        .line(format!("Log folder: {}", config.log_folder.display()))
        .await;
    run_log.line(format!("Engine: {engine}")).await;

    for status in &report.statuses {
        let state = match (status.available, &status.detail) {
            (true, Some(detail)) => format!("found ({detail})"),
            (true, None) => "found".to_string(),
            (false, _) => "missing".to_string(),
        };
        run_log
            .line(format!("Dependency {}: {state}", status.dependency))
            .await;
    }
    run_log
        .line(format!(
            "Features: OCR {}, table detection {}",
            on_off(report.features.ocr),
            on_off(report.features.detect_tables)
        ))
        .await;
    for warning in &report.warnings {
        run_log.line(format!("WARNING: {warning}")).await;
    }
}

async fn write_environment_notes(
    run_log: &mut RunLog,
    config: &RunConfig,
    engine: &str,
    report: &ProbeReport,
) {
    let path = config.log_folder.join(probe::ENVIRONMENT_NOTES_FILE);
    let notes = report.environment_notes(engine, &runlog::timestamp());
    match tokio::fs::write(&path, notes).await {
        Ok(()) => debug!("Environment notes written to {}", path.display()),
        Err(e) => {
            warn!("Could not write {}: {e}", path.display());
            run_log
                .line(format!("WARNING: could not write {}: {e}", path.display()))
                .await;
        }
    }
}
