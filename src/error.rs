//! Error types for the extrator-pdf library.
//!
//! Three error types reflect three distinct failure scopes:
//!
//! * [`BatchError`] (**fatal**): the run cannot start at all (bad config,
//!   missing source folder, a required dependency is absent under the strict
//!   policy). Returned as `Err(BatchError)` from [`crate::batch::run`] before
//!   any output is written.
//!
//! * [`FileError`] (**non-fatal**): a single PDF failed (unreadable, corrupt,
//!   output not writable). Recorded in that file's log and in the aggregate
//!   run log; the walker moves on to the next file.
//!
//! * [`ExtractionError`]: what an [`crate::engine::Extractor`] returns.
//!   Always surfaces wrapped in [`FileError::Extraction`].

use crate::probe::Dependency;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the extrator-pdf library.
#[derive(Debug, Error)]
pub enum BatchError {
    // ── Config errors ─────────────────────────────────────────────────────
    /// The YAML configuration file does not exist.
    #[error("Configuration file not found: '{path}'")]
    ConfigNotFound { path: PathBuf },

    /// The configuration file exists but could not be read.
    #[error("Failed to read configuration '{path}': {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid YAML for the recognised keys.
    #[error("Invalid YAML in '{path}': {detail}")]
    ConfigParse { path: PathBuf, detail: String },

    /// `pasta_origem` is absent or empty.
    #[error("Missing mandatory key 'pasta_origem' in '{path}'")]
    MissingSourceFolder { path: PathBuf },

    /// The source folder does not exist or is not a directory.
    #[error("Source folder not found or not a directory: '{path}'")]
    SourceNotFound { path: PathBuf },

    /// The CLI argument is neither an existing `.pdf` nor a `.yaml`/`.yml` path.
    #[error("Unsupported input '{path}': expected an existing .pdf file or a .yaml configuration")]
    UnsupportedInput { path: PathBuf },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Dependency errors ─────────────────────────────────────────────────
    /// A requested feature's dependency is absent and
    /// `ignorar_dependencias` is false.
    #[error(
        "Optional dependency missing: {dependency} (needed for {feature}).\n\
Install it or set 'ignorar_dependencias: true' to continue without it."
    )]
    MissingDependency {
        dependency: Dependency,
        feature: &'static str,
    },

    /// The extraction engine itself cannot be loaded.
    #[error(
        "Extraction engine unavailable: {0}\n\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium (or pass --pdfium-lib) to use an existing copy,\n\
or place the library next to the executable.\n"
    )]
    EngineUnavailable(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create an output folder or the aggregate run log.
    #[error("Failed to prepare '{path}': {source}")]
    RunLog {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single PDF.
#[derive(Debug, Error)]
pub enum FileError {
    /// The PDF could not be read from disk.
    #[error("Failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file has a `.pdf` extension but no `%PDF` header.
    #[error("File is not a valid PDF: '{path}' (first bytes: {magic:?})")]
    NotAPdf { path: PathBuf, magic: Vec<u8> },

    /// The extraction engine rejected the document.
    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    /// The Markdown or per-file log could not be written.
    #[error("Failed to write '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Another input in this run already maps to the same output file.
    #[error("Output '{output}' is already produced by '{claimed_by}'")]
    OutputConflict { output: PathBuf, claimed_by: PathBuf },
}

/// Errors raised by an extraction engine for one document.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum ExtractionError {
    /// Header, trailer or xref table is damaged.
    #[error("corrupt PDF: {0}")]
    Corrupt(String),

    /// The document is encrypted with a user password.
    #[error("PDF is password-protected")]
    PasswordProtected,

    /// The engine does not support this document.
    #[error("unsupported document: {0}")]
    Unsupported(String),

    /// Engine-internal failure (binding, rendering, OCR process).
    #[error("engine failure: {0}")]
    Engine(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_dependency_display() {
        let e = BatchError::MissingDependency {
            dependency: Dependency::TableDetection,
            feature: "table detection",
        };
        let msg = e.to_string();
        assert!(msg.contains("libGL"), "got: {msg}");
        assert!(msg.contains("ignorar_dependencias"), "got: {msg}");
    }

    #[test]
    fn extraction_error_wraps_into_file_error() {
        let e: FileError = ExtractionError::PasswordProtected.into();
        assert!(e.to_string().contains("password"));
    }

    #[test]
    fn output_conflict_display() {
        let e = FileError::OutputConflict {
            output: PathBuf::from("/out/a.md"),
            claimed_by: PathBuf::from("/in/a.pdf"),
        };
        let msg = e.to_string();
        assert!(msg.contains("/out/a.md"));
        assert!(msg.contains("/in/a.pdf"));
    }

    #[test]
    fn missing_source_folder_display() {
        let e = BatchError::MissingSourceFolder {
            path: PathBuf::from("config.yaml"),
        };
        assert!(e.to_string().contains("pasta_origem"));
    }
}
