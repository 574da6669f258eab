//! # extrator-pdf
//!
//! Batch conversion of PDF documents to Markdown with page and image markers.
//!
//! Every page of the output opens with `<PAGINA:nnn>` and every picture is
//! replaced by `<IMAGEM:nnn>`, numbered across the whole document, so
//! downstream tools can cite page numbers and figures without the PDF.
//!
//! ## Pipeline Overview
//!
//! ```text
//! YAML config / single PDF
//!  │
//!  ├─ 1. Config   parse, default, make paths absolute
//!  ├─ 2. Probe    tesseract / libGL present? abort or downgrade features
//!  ├─ 3. Walk     lazy, sorted, skip PDFs whose .md already exists
//!  ├─ 4. Extract  pdfium text layer + optional OCR (spawn_blocking)
//!  ├─ 5. Markers  <PAGINA:nnn> / <IMAGEM:nnn>, tables as GFM
//!  └─ 6. Logs     one .log per PDF + log_extração.txt for the run
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use extrator_pdf::{config, Batch};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = config::resolve("config.yaml".as_ref())?;
//!     let summary = Batch::new(config).run().await?;
//!     eprintln!(
//!         "{} converted, {} failed, {} skipped",
//!         summary.succeeded(),
//!         summary.failed(),
//!         summary.skipped()
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `extrair-pdf` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! extrator-pdf = { version = "0.2", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod batch;
pub mod config;
pub mod engine;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod probe;
pub mod progress;
pub mod runlog;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use batch::{convert_pdf, run, run_sync, Batch};
pub use config::{RunConfig, RunConfigBuilder};
pub use engine::{Block, ExtractedDocument, ExtractedPage, Extractor, Features, PdfiumExtractor, Table};
pub use error::{BatchError, ExtractionError, FileError};
pub use output::{FileRecord, FileStats, Outcome, RunSummary};
pub use probe::{Dependency, DependencyProbe, DependencyStatus, SystemProbe};
pub use progress::{BatchProgressCallback, NoopProgressCallback, ProgressCallback};
