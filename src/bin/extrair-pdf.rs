//! CLI binary for extrator-pdf.
//!
//! A thin shim over the library crate: resolves the YAML configuration (or
//! single PDF), applies flag overrides, runs the batch and prints a summary.

use anyhow::{Context, Result};
use clap::Parser;
use extrator_pdf::config::{self, RunConfigBuilder};
use extrator_pdf::{
    Batch, BatchError, BatchProgressCallback, Features, FileRecord, Outcome, PdfiumExtractor,
    ProgressCallback, RunSummary,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner plus one line per file. The walk is lazy, so there is no total to
/// draw a bar against.
struct CliProgressCallback {
    bar: ProgressBar,
    converted: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.set_message("checking dependencies…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            converted: AtomicUsize::new(0),
        })
    }
}

impl BatchProgressCallback for CliProgressCallback {
    fn on_run_start(&self, features: &Features, warnings: &[String]) {
        for warning in warnings {
            self.bar.println(format!("{} {}", yellow("⚠"), warning));
        }
        self.bar.println(format!(
            "{} {}  {}",
            cyan("◆"),
            bold("Extracting"),
            dim(&format!(
                "OCR {}, tables {}",
                if features.ocr { "on" } else { "off" },
                if features.detect_tables { "on" } else { "off" }
            ))
        ));
        self.bar.set_prefix("Extracting");
    }

    fn on_file_start(&self, index: usize, pdf: &Path) {
        self.bar.set_message(file_start_message(
            index,
            pdf,
            self.converted.load(Ordering::SeqCst),
        ));
    }

    fn on_file_complete(&self, _index: usize, record: &FileRecord) {
        let name = record.relative.display().to_string();
        let seconds = dim(&format!("{:.1}s", record.duration_ms as f64 / 1000.0));
        match (&record.outcome, &record.stats) {
            (Outcome::Success, Some(stats)) => {
                self.converted.fetch_add(1, Ordering::SeqCst);
                self.bar.println(format!(
                    "  {} {name}  {}  {seconds}",
                    green("✓"),
                    dim(&format!("{} pages, {} images", stats.pages, stats.images)),
                ));
            }
            _ => {
                let error = record.error.as_deref().unwrap_or("unknown error");
                let msg = if error.chars().count() > 100 {
                    format!("{}\u{2026}", error.chars().take(99).collect::<String>())
                } else {
                    error.to_string()
                };
                self.bar
                    .println(format!("  {} {name}  {}  {seconds}", red("✗"), red(&msg)));
            }
        }
    }

    fn on_file_skipped(&self, record: &FileRecord) {
        let reason = match record.outcome {
            Outcome::Skipped => "output exists".to_string(),
            _ => record.error.clone().unwrap_or_default(),
        };
        self.bar.println(format!(
            "  {} {}  {}",
            dim("↷"),
            dim(&record.relative.display().to_string()),
            dim(&reason)
        ));
    }

    fn on_run_complete(&self, _summary: &RunSummary) {
        self.bar.finish_and_clear();
    }
}

fn file_start_message(index: usize, pdf: &Path, converted: usize) -> String {
    if converted == 0 {
        format!("#{index} {}", pdf.display())
    } else {
        format!("#{index} {}  ({converted} converted)", pdf.display())
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Batch run driven by a YAML file
  extrair-pdf config_extracao.yaml

  # Create a commented configuration template
  extrair-pdf --init config_extracao.yaml

  # Convert one PDF next to itself
  extrair-pdf relatorio.pdf

  # Override the YAML: re-extract everything, abort on missing dependencies
  extrair-pdf config.yaml --overwrite --strict-deps

  # Machine-readable summary
  extrair-pdf config.yaml --json > summary.json

OUTPUT:
  Each page starts with <PAGINA:nnn>; each image becomes <IMAGEM:nnn>, numbered
  across the whole document. Every converted PDF gets a .log file, and the run
  writes log_extração.txt plus dicas_ambiente.md into the log folder.

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH   Path to libpdfium (file or folder)
  RUST_LOG          Override the tracing filter (e.g. extrator_pdf=debug)

OPTIONAL DEPENDENCIES:
  tesseract   OCR of scanned pages         sudo apt-get install tesseract-ocr
  libGL       table-structure detection    sudo apt-get install libgl1
"#;

/// Batch-convert PDF files to Markdown with page and image markers.
#[derive(Parser, Debug)]
#[command(
    name = "extrair-pdf",
    version,
    about = "Batch-convert PDF files to Markdown with <PAGINA> and <IMAGEM> markers",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// YAML configuration file, or a single .pdf to convert.
    input: PathBuf,

    /// Write a configuration template to INPUT when it does not exist.
    #[arg(long)]
    init: bool,

    /// Destination folder for .md files (overrides pasta_destino).
    #[arg(long, env = "EXTRAIR_PDF_DEST")]
    dest: Option<PathBuf>,

    /// Folder for .log files (overrides pasta_log).
    #[arg(long, env = "EXTRAIR_PDF_LOG_DIR")]
    log_dir: Option<PathBuf>,

    /// Re-extract PDFs whose .md already exists.
    #[arg(long)]
    overwrite: bool,

    /// Only process the top level of the source folder.
    #[arg(long)]
    no_subfolders: bool,

    /// Disable OCR.
    #[arg(long)]
    no_ocr: bool,

    /// Disable table detection.
    #[arg(long)]
    no_tables: bool,

    /// Abort when a requested optional dependency is missing.
    #[arg(long)]
    strict_deps: bool,

    /// Tesseract language(s), e.g. por or por+eng.
    #[arg(long, env = "EXTRAIR_PDF_OCR_LANG")]
    ocr_lang: Option<String>,

    /// Collapse repeated whitespace, blank lines and punctuation.
    #[arg(long)]
    clean: bool,

    /// Path to libpdfium (file or containing folder).
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// Print the run summary as JSON on stdout.
    #[arg(long)]
    json: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "EXTRAIR_PDF_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner gives the per-file feedback; library INFO logs would
    // tear it.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && io::stderr().is_terminal();
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Resolve configuration ────────────────────────────────────────────
    let builder = match config::load(&cli.input) {
        Ok(builder) => builder,
        Err(BatchError::ConfigNotFound { path }) => return offer_template(&cli, &path),
        Err(e) => return Err(e).context("Invalid configuration"),
    };
    let config = apply_overrides(builder, &cli)
        .build()
        .context("Invalid configuration")?;

    // ── Collaborators ────────────────────────────────────────────────────
    let mut extractor = PdfiumExtractor::new().ocr_language(config.ocr_language.clone());
    if let Some(ref lib) = cli.pdfium_lib {
        extractor = extractor.library_path(lib);
    }

    let mut batch = Batch::new(config).extractor(Arc::new(extractor));
    if show_progress {
        batch = batch.progress(CliProgressCallback::new() as ProgressCallback);
    }

    // ── Run ──────────────────────────────────────────────────────────────
    let summary = batch.run().await.context("Extraction aborted")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&summary).context("Failed to serialise summary")?;
        println!("{json}");
    } else if !cli.quiet {
        print_summary(&summary);
    }

    // Per-file failures are reported, not fatal.
    Ok(ExitCode::SUCCESS)
}

/// Map flags onto the builder. Flags only ever override the YAML.
fn apply_overrides(mut builder: RunConfigBuilder, cli: &Cli) -> RunConfigBuilder {
    if let Some(ref dest) = cli.dest {
        builder = builder.destination_folder(dest);
    }
    if let Some(ref logs) = cli.log_dir {
        builder = builder.log_folder(logs);
    }
    if let Some(ref lang) = cli.ocr_lang {
        builder = builder.ocr_language(lang);
    }
    if cli.overwrite {
        builder = builder.overwrite(true);
    }
    if cli.no_subfolders {
        builder = builder.subfolders(false);
    }
    if cli.no_ocr {
        builder = builder.ocr(false);
    }
    if cli.no_tables {
        builder = builder.detect_tables(false);
    }
    if cli.strict_deps {
        builder = builder.ignore_missing_deps(false);
    }
    if cli.clean {
        builder = builder.clean_text(true);
    }
    builder
}

/// Missing YAML: write a template with `--init`, otherwise ask on a terminal.
fn offer_template(cli: &Cli, path: &Path) -> Result<ExitCode> {
    let create = if cli.init {
        true
    } else if io::stdin().is_terminal() {
        eprint!(
            "{} Configuration file not found: {}\n  Create a template there? (s/n): ",
            yellow("⚠"),
            bold(&path.display().to_string())
        );
        io::stderr().flush().ok();
        let mut answer = String::new();
        io::stdin()
            .lock()
            .read_line(&mut answer)
            .context("Failed to read answer")?;
        is_yes(&answer)
    } else {
        return Err(BatchError::ConfigNotFound {
            path: path.to_path_buf(),
        })
        .context("Run with --init to create a template");
    };

    if create {
        config::write_template(path)
            .with_context(|| format!("Failed to write template to {}", path.display()))?;
        eprintln!(
            "{} Template written to {}. Edit 'pasta_origem' and run again.",
            green("✔"),
            bold(&path.display().to_string())
        );
    } else {
        eprintln!("{}", dim("No configuration written."));
    }
    Ok(ExitCode::SUCCESS)
}

fn is_yes(answer: &str) -> bool {
    matches!(
        answer.trim().to_lowercase().as_str(),
        "s" | "sim" | "y" | "yes"
    )
}

fn print_summary(summary: &RunSummary) {
    let failed = summary.failed();
    let icon = if failed == 0 {
        green("✔")
    } else if summary.succeeded() == 0 && summary.skipped() == 0 {
        red("✘")
    } else {
        cyan("⚠")
    };
    eprintln!(
        "{icon}  {} converted, {} failed, {} skipped of {} PDFs  {}ms",
        bold(&summary.succeeded().to_string()),
        if failed == 0 {
            failed.to_string()
        } else {
            red(&failed.to_string())
        },
        summary.skipped(),
        summary.discovered(),
        summary.total_duration_ms,
    );
    eprintln!(
        "   log: {}",
        dim(&summary.run_log.display().to_string())
    );
}
