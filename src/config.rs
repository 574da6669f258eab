//! Run configuration: resolution from a YAML file or a single PDF path.
//!
//! All batch behaviour is controlled through [`RunConfig`], produced by
//! [`RunConfigBuilder::build`]. The builder keeps the "explicitly set vs.
//! defaulted" distinction alive until the very end, so CLI overrides such as
//! `--dest` still let an unset `pasta_log` follow the new destination.
//!
//! # Recognised YAML keys
//!
//! | Key | Default |
//! |-----|---------|
//! | `pasta_origem` | required |
//! | `pasta_destino` | `pasta_origem` |
//! | `pasta_log` | `pasta_destino` |
//! | `subpastas` | `true` |
//! | `sobrescrever` | `false` |
//! | `ocr` | `true` |
//! | `detectar_tabelas` | `true` |
//! | `ignorar_dependencias` | `true` |
//! | `idioma_ocr` | `eng` |
//! | `limpar_texto` | `false` |
//! | `gerar_dicas` | `true` |
//!
//! Unknown keys are ignored.

use crate::error::BatchError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default tesseract language when `idioma_ocr` is not set.
pub const DEFAULT_OCR_LANGUAGE: &str = "eng";

/// Fully resolved configuration for one batch run.
///
/// All paths are absolute. Built via [`RunConfig::builder`] or [`resolve`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunConfig {
    /// Folder scanned for PDF files.
    pub source_folder: PathBuf,

    /// Set in single-PDF mode: only this file is processed.
    pub single_file: Option<PathBuf>,

    /// Root of the mirrored `.md` tree. Default: `source_folder`.
    pub destination_folder: PathBuf,

    /// Root of the mirrored `.log` tree and home of the aggregate log.
    /// Default: `destination_folder`.
    pub log_folder: PathBuf,

    /// Recurse into subfolders. Default: true.
    pub subfolders: bool,

    /// Re-extract files whose `.md` already exists. Default: false.
    pub overwrite: bool,

    /// Request OCR for pages without a text layer. Default: true.
    pub ocr: bool,

    /// Request table-structure detection. Default: true.
    pub detect_tables: bool,

    /// Downgrade features whose dependency is missing instead of aborting.
    /// Default: true.
    pub ignore_missing_deps: bool,

    /// Tesseract language code(s), e.g. `eng` or `por+eng`.
    pub ocr_language: String,

    /// Apply the noise-cleanup pass to the final Markdown. Default: false.
    pub clean_text: bool,

    /// Write `dicas_ambiente.md` next to the aggregate log. Default: true.
    pub environment_notes: bool,
}

impl RunConfig {
    /// Create a builder rooted at `source_folder`.
    pub fn builder(source_folder: impl Into<PathBuf>) -> RunConfigBuilder {
        RunConfigBuilder {
            source_folder: source_folder.into(),
            ..RunConfigBuilder::default()
        }
    }

    /// Path of the aggregate run log.
    pub fn run_log_path(&self) -> PathBuf {
        self.log_folder.join(crate::runlog::RUN_LOG_FILE)
    }
}

/// Builder for [`RunConfig`].
#[derive(Debug, Clone, Default)]
pub struct RunConfigBuilder {
    source_folder: PathBuf,
    single_file: Option<PathBuf>,
    destination_folder: Option<PathBuf>,
    log_folder: Option<PathBuf>,
    subfolders: Option<bool>,
    overwrite: Option<bool>,
    ocr: Option<bool>,
    detect_tables: Option<bool>,
    ignore_missing_deps: Option<bool>,
    ocr_language: Option<String>,
    clean_text: Option<bool>,
    environment_notes: Option<bool>,
}

impl RunConfigBuilder {
    pub fn single_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.single_file = Some(path.into());
        self
    }

    pub fn destination_folder(mut self, path: impl Into<PathBuf>) -> Self {
        self.destination_folder = Some(path.into());
        self
    }

    pub fn log_folder(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_folder = Some(path.into());
        self
    }

    pub fn subfolders(mut self, v: bool) -> Self {
        self.subfolders = Some(v);
        self
    }

    pub fn overwrite(mut self, v: bool) -> Self {
        self.overwrite = Some(v);
        self
    }

    pub fn ocr(mut self, v: bool) -> Self {
        self.ocr = Some(v);
        self
    }

    pub fn detect_tables(mut self, v: bool) -> Self {
        self.detect_tables = Some(v);
        self
    }

    pub fn ignore_missing_deps(mut self, v: bool) -> Self {
        self.ignore_missing_deps = Some(v);
        self
    }

    pub fn ocr_language(mut self, lang: impl Into<String>) -> Self {
        self.ocr_language = Some(lang.into());
        self
    }

    pub fn clean_text(mut self, v: bool) -> Self {
        self.clean_text = Some(v);
        self
    }

    pub fn environment_notes(mut self, v: bool) -> Self {
        self.environment_notes = Some(v);
        self
    }

    /// Fill defaults, make every path absolute, and validate.
    pub fn build(self) -> Result<RunConfig, BatchError> {
        if self.source_folder.as_os_str().is_empty() {
            return Err(BatchError::InvalidConfig(
                "source folder must not be empty".into(),
            ));
        }

        let ocr_language = self
            .ocr_language
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| DEFAULT_OCR_LANGUAGE.to_string());
        if !ocr_language
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '+')
        {
            return Err(BatchError::InvalidConfig(format!(
                "OCR language must look like 'eng' or 'por+eng', got '{ocr_language}'"
            )));
        }

        let source_folder = absolute(&self.source_folder)?;
        let destination_folder = match self.destination_folder {
            Some(p) => absolute(&p)?,
            None => source_folder.clone(),
        };
        let log_folder = match self.log_folder {
            Some(p) => absolute(&p)?,
            None => destination_folder.clone(),
        };
        let single_file = self.single_file.as_deref().map(absolute).transpose()?;

        Ok(RunConfig {
            source_folder,
            single_file,
            destination_folder,
            log_folder,
            subfolders: self.subfolders.unwrap_or(true),
            overwrite: self.overwrite.unwrap_or(false),
            ocr: self.ocr.unwrap_or(true),
            detect_tables: self.detect_tables.unwrap_or(true),
            ignore_missing_deps: self.ignore_missing_deps.unwrap_or(true),
            ocr_language,
            clean_text: self.clean_text.unwrap_or(false),
            environment_notes: self.environment_notes.unwrap_or(true),
        })
    }
}

fn absolute(path: &Path) -> Result<PathBuf, BatchError> {
    std::path::absolute(path).map_err(|e| {
        BatchError::InvalidConfig(format!("cannot resolve path '{}': {e}", path.display()))
    })
}

// ── Input classification ─────────────────────────────────────────────────

/// What the single CLI argument points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigInput {
    /// A `.yaml` / `.yml` configuration file (may not exist yet).
    Yaml(PathBuf),
    /// An existing `.pdf` file.
    Pdf(PathBuf),
}

/// Decide whether `arg` is a YAML configuration or a single PDF.
pub fn classify_input(arg: &Path) -> Result<ConfigInput, BatchError> {
    let ext = arg
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("yaml" | "yml") => Ok(ConfigInput::Yaml(arg.to_path_buf())),
        Some("pdf") if arg.is_file() => Ok(ConfigInput::Pdf(arg.to_path_buf())),
        _ => Err(BatchError::UnsupportedInput {
            path: arg.to_path_buf(),
        }),
    }
}

/// Load a builder from the CLI argument without building it, so callers can
/// apply overrides first.
pub fn load(arg: &Path) -> Result<RunConfigBuilder, BatchError> {
    match classify_input(arg)? {
        ConfigInput::Yaml(path) => load_yaml(&path),
        ConfigInput::Pdf(path) => Ok(single_pdf(&path)),
    }
}

/// Resolve the CLI argument straight to a [`RunConfig`].
pub fn resolve(arg: &Path) -> Result<RunConfig, BatchError> {
    load(arg)?.build()
}

/// Builder targeting exactly one PDF, everything else at defaults.
pub fn single_pdf(pdf: &Path) -> RunConfigBuilder {
    let parent = pdf
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    RunConfig::builder(parent).single_file(pdf)
}

// ── YAML ─────────────────────────────────────────────────────────────────

/// On-disk shape of the configuration file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    pasta_origem: Option<PathBuf>,
    pasta_destino: Option<PathBuf>,
    pasta_log: Option<PathBuf>,
    subpastas: Option<bool>,
    sobrescrever: Option<bool>,
    ocr: Option<bool>,
    detectar_tabelas: Option<bool>,
    ignorar_dependencias: Option<bool>,
    idioma_ocr: Option<String>,
    limpar_texto: Option<bool>,
    gerar_dicas: Option<bool>,
}

/// Read and parse a YAML configuration into a builder.
pub fn load_yaml(path: &Path) -> Result<RunConfigBuilder, BatchError> {
    if !path.exists() {
        return Err(BatchError::ConfigNotFound {
            path: path.to_path_buf(),
        });
    }
    let content = std::fs::read_to_string(path).map_err(|source| BatchError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    let builder = parse_yaml(&content, path)?;
    debug!("Loaded configuration from {}", path.display());
    Ok(builder)
}

/// Parse YAML text. `origin` is used in error messages only.
pub fn parse_yaml(content: &str, origin: &Path) -> Result<RunConfigBuilder, BatchError> {
    let file: FileConfig = if content.trim().is_empty() {
        FileConfig::default()
    } else {
        serde_yaml::from_str(content).map_err(|e| BatchError::ConfigParse {
            path: origin.to_path_buf(),
            detail: e.to_string(),
        })?
    };

    let source = non_empty(file.pasta_origem).ok_or_else(|| BatchError::MissingSourceFolder {
        path: origin.to_path_buf(),
    })?;

    let mut builder = RunConfig::builder(source);
    if let Some(dest) = non_empty(file.pasta_destino) {
        builder = builder.destination_folder(dest);
    }
    if let Some(log) = non_empty(file.pasta_log) {
        builder = builder.log_folder(log);
    }
    builder.subfolders = file.subpastas;
    builder.overwrite = file.sobrescrever;
    builder.ocr = file.ocr;
    builder.detect_tables = file.detectar_tabelas;
    builder.ignore_missing_deps = file.ignorar_dependencias;
    builder.ocr_language = file.idioma_ocr;
    builder.clean_text = file.limpar_texto;
    builder.environment_notes = file.gerar_dicas;
    Ok(builder)
}

fn non_empty(path: Option<PathBuf>) -> Option<PathBuf> {
    path.filter(|p| !p.as_os_str().is_empty())
}

/// Commented configuration template written by `--init`.
pub const CONFIG_TEMPLATE: &str = "\
# Batch PDF to Markdown extraction
# Run with: extrair-pdf config_extracao.yaml

# Folder containing the PDF files (required)
pasta_origem: ./pdfs

# Where the .md files go (empty: same as pasta_origem)
pasta_destino: ./textos

# Where the .log files go (empty: same as pasta_destino)
# pasta_log: ./logs

# Recurse into subfolders (default: true)
subpastas: true

# Re-extract files whose .md already exists (default: false)
sobrescrever: false

# OCR for scanned pages, needs tesseract (default: true)
ocr: true
# idioma_ocr: eng

# Table-structure detection, needs libGL (default: true)
detectar_tabelas: true

# true: run without the features whose dependency is missing, with a warning
# false: abort before processing anything when a dependency is missing
ignorar_dependencias: true

# Collapse repeated spaces, blank lines and punctuation (default: false)
# limpar_texto: false
";

/// Write [`CONFIG_TEMPLATE`] to `path`, creating parent folders.
pub fn write_template(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, CONFIG_TEMPLATE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> PathBuf {
        PathBuf::from("config.yaml")
    }

    #[test]
    fn defaults_cascade_from_source() {
        let cfg = parse_yaml("pasta_origem: /data/pdfs\n", &origin())
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(cfg.source_folder, PathBuf::from("/data/pdfs"));
        assert_eq!(cfg.destination_folder, cfg.source_folder);
        assert_eq!(cfg.log_folder, cfg.destination_folder);
        assert!(cfg.subfolders);
        assert!(!cfg.overwrite);
        assert!(cfg.ocr);
        assert!(cfg.detect_tables);
        assert!(cfg.ignore_missing_deps);
        assert!(!cfg.clean_text);
        assert!(cfg.environment_notes);
        assert_eq!(cfg.ocr_language, "eng");
        assert!(cfg.single_file.is_none());
    }

    #[test]
    fn log_follows_destination() {
        let cfg = parse_yaml("pasta_origem: /in\npasta_destino: /out\n", &origin())
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(cfg.destination_folder, PathBuf::from("/out"));
        assert_eq!(cfg.log_folder, PathBuf::from("/out"));
    }

    #[test]
    fn all_keys_recognised() {
        let yaml = "\
pasta_origem: /in
pasta_destino: /out
pasta_log: /logs
subpastas: false
sobrescrever: true
ocr: false
detectar_tabelas: false
ignorar_dependencias: false
idioma_ocr: por+eng
limpar_texto: true
gerar_dicas: false
";
        let cfg = parse_yaml(yaml, &origin()).unwrap().build().unwrap();
        assert_eq!(cfg.log_folder, PathBuf::from("/logs"));
        assert!(!cfg.subfolders);
        assert!(cfg.overwrite);
        assert!(!cfg.ocr);
        assert!(!cfg.detect_tables);
        assert!(!cfg.ignore_missing_deps);
        assert_eq!(cfg.ocr_language, "por+eng");
        assert!(cfg.clean_text);
        assert!(!cfg.environment_notes);
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let cfg = parse_yaml("pasta_origem: /in\nmodelo: docling\nfoo: [1, 2]\n", &origin())
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(cfg.source_folder, PathBuf::from("/in"));
    }

    #[test]
    fn empty_destination_means_default() {
        let cfg = parse_yaml("pasta_origem: /in\npasta_destino: ''\npasta_log:\n", &origin())
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(cfg.destination_folder, PathBuf::from("/in"));
        assert_eq!(cfg.log_folder, PathBuf::from("/in"));
    }

    #[test]
    fn missing_source_is_config_error() {
        let err = parse_yaml("pasta_destino: /out\n", &origin()).unwrap_err();
        assert!(matches!(err, BatchError::MissingSourceFolder { .. }));

        let err = parse_yaml("", &origin()).unwrap_err();
        assert!(matches!(err, BatchError::MissingSourceFolder { .. }));

        let err = parse_yaml("pasta_origem: ''\n", &origin()).unwrap_err();
        assert!(matches!(err, BatchError::MissingSourceFolder { .. }));
    }

    #[test]
    fn malformed_yaml_is_parse_error() {
        let err = parse_yaml("pasta_origem: [unclosed\n", &origin()).unwrap_err();
        assert!(matches!(err, BatchError::ConfigParse { .. }));

        let err = parse_yaml("subpastas: maybe\npasta_origem: /in\n", &origin()).unwrap_err();
        assert!(matches!(err, BatchError::ConfigParse { .. }));
    }

    #[test]
    fn relative_paths_become_absolute() {
        let cfg = RunConfig::builder("pdfs").build().unwrap();
        assert!(cfg.source_folder.is_absolute());
        assert!(cfg.source_folder.ends_with("pdfs"));
    }

    #[test]
    fn invalid_ocr_language_rejected() {
        let err = RunConfig::builder("/in")
            .ocr_language("eng; rm -rf /")
            .build()
            .unwrap_err();
        assert!(matches!(err, BatchError::InvalidConfig(_)));
    }

    #[test]
    fn single_pdf_targets_parent() {
        let cfg = single_pdf(Path::new("/docs/report.pdf")).build().unwrap();
        assert_eq!(cfg.source_folder, PathBuf::from("/docs"));
        assert_eq!(cfg.single_file, Some(PathBuf::from("/docs/report.pdf")));
        assert_eq!(cfg.destination_folder, PathBuf::from("/docs"));
        assert!(!cfg.overwrite);
    }

    #[test]
    fn classify_rejects_other_extensions() {
        let err = classify_input(Path::new("notes.txt")).unwrap_err();
        assert!(matches!(err, BatchError::UnsupportedInput { .. }));
        // Missing PDFs are not accepted either.
        let err = classify_input(Path::new("/definitely/not/here.pdf")).unwrap_err();
        assert!(matches!(err, BatchError::UnsupportedInput { .. }));
        assert_eq!(
            classify_input(Path::new("Run.YML")).unwrap(),
            ConfigInput::Yaml(PathBuf::from("Run.YML"))
        );
    }

    #[test]
    fn missing_yaml_is_not_found() {
        let err = load(Path::new("/definitely/not/here.yaml")).unwrap_err();
        assert!(matches!(err, BatchError::ConfigNotFound { .. }));
    }

    #[test]
    fn template_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/config.yaml");
        write_template(&path).unwrap();
        let cfg = load(&path).unwrap().build().unwrap();
        assert!(cfg.source_folder.ends_with("pdfs"));
        assert!(cfg.destination_folder.ends_with("textos"));
    }
}
