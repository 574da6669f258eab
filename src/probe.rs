//! Optional-dependency probing and the feature-downgrade policy.
//!
//! OCR needs the `tesseract` executable and table-structure detection needs
//! the `libGL` runtime. Neither is required to produce Markdown from a PDF
//! with a text layer, so a missing one either silently disables its feature
//! (`ignorar_dependencias: true`) or aborts the run before any file is
//! touched (`ignorar_dependencias: false`).
//!
//! Probing sits behind [`DependencyProbe`] so tests can simulate any
//! environment.

use crate::config::RunConfig;
use crate::engine::Features;
use crate::error::BatchError;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, warn};

/// File written into the log folder with the probe results.
pub const ENVIRONMENT_NOTES_FILE: &str = "dicas_ambiente.md";

/// An optional native dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Dependency {
    /// The tesseract OCR executable.
    OcrEngine,
    /// The libGL runtime used by table-structure detection.
    TableDetection,
}

impl Dependency {
    /// Human name of the feature this dependency enables.
    pub fn feature(self) -> &'static str {
        match self {
            Dependency::OcrEngine => "OCR",
            Dependency::TableDetection => "table detection",
        }
    }

    fn install_hint(self) -> &'static str {
        match self {
            Dependency::OcrEngine => "sudo apt-get install -y tesseract-ocr tesseract-ocr-por",
            Dependency::TableDetection => "sudo apt-get install -y libgl1 libglib2.0-0",
        }
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dependency::OcrEngine => f.write_str("tesseract"),
            Dependency::TableDetection => f.write_str("libGL"),
        }
    }
}

/// Result of probing one dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyStatus {
    pub dependency: Dependency,
    pub available: bool,
    /// Version string or library path when found.
    pub detail: Option<String>,
}

impl DependencyStatus {
    pub fn found(dependency: Dependency, detail: impl Into<String>) -> Self {
        Self {
            dependency,
            available: true,
            detail: Some(detail.into()),
        }
    }

    pub fn missing(dependency: Dependency) -> Self {
        Self {
            dependency,
            available: false,
            detail: None,
        }
    }
}

/// Checks whether an optional dependency is present.
pub trait DependencyProbe: Send + Sync {
    fn probe(&self, dependency: Dependency) -> DependencyStatus;
}

/// Probes the real machine: `PATH` for tesseract, library folders for libGL.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProbe;

impl DependencyProbe for SystemProbe {
    fn probe(&self, dependency: Dependency) -> DependencyStatus {
        match dependency {
            Dependency::OcrEngine => match tesseract_version() {
                Some(v) => DependencyStatus::found(dependency, v),
                None => DependencyStatus::missing(dependency),
            },
            Dependency::TableDetection => match find_libgl() {
                Some(p) => DependencyStatus::found(dependency, p.display().to_string()),
                None => DependencyStatus::missing(dependency),
            },
        }
    }
}

/// First line of `tesseract --version`. Older releases print it on stderr.
fn tesseract_version() -> Option<String> {
    let path = which::which("tesseract").ok()?;
    let output = Command::new(&path).arg("--version").output().ok()?;
    if !output.status.success() {
        debug!("tesseract --version exited with {}", output.status);
        return None;
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    stdout
        .lines()
        .chain(stderr.lines())
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(str::to_string)
        .or_else(|| Some(path.display().to_string()))
}

fn libgl_candidates() -> Vec<PathBuf> {
    match std::env::consts::OS {
        "macos" => vec![PathBuf::from("/System/Library/Frameworks/OpenGL.framework")],
        "windows" => {
            let root = std::env::var_os("SystemRoot").unwrap_or_else(|| "C:\\Windows".into());
            vec![Path::new(&root).join("System32").join("opengl32.dll")]
        }
        _ => {
            let mut dirs: Vec<PathBuf> = std::env::var_os("LD_LIBRARY_PATH")
                .map(|v| std::env::split_paths(&v).collect())
                .unwrap_or_default();
            dirs.extend(
                [
                    "/usr/lib",
                    "/usr/lib64",
                    "/usr/local/lib",
                    "/lib",
                    "/lib64",
                    "/usr/lib/x86_64-linux-gnu",
                    "/usr/lib/aarch64-linux-gnu",
                    "/lib/x86_64-linux-gnu",
                    "/lib/aarch64-linux-gnu",
                ]
                .map(PathBuf::from),
            );
            dirs.iter()
                .flat_map(|d| [d.join("libGL.so.1"), d.join("libGL.so")])
                .collect()
        }
    }
}

fn find_libgl() -> Option<PathBuf> {
    libgl_candidates().into_iter().find(|p| p.exists())
}

// ── Policy ───────────────────────────────────────────────────────────────

/// Outcome of probing for one run.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeReport {
    /// Status of every dependency a requested feature needs.
    pub statuses: Vec<DependencyStatus>,
    /// Features actually passed to the extraction engine.
    pub features: Features,
    /// One line per downgraded feature.
    pub warnings: Vec<String>,
}

impl ProbeReport {
    /// Status for `dependency`, if it was probed.
    pub fn status(&self, dependency: Dependency) -> Option<&DependencyStatus> {
        self.statuses.iter().find(|s| s.dependency == dependency)
    }

    /// Markdown report of the environment with install hints for what is missing.
    pub fn environment_notes(&self, engine: &str, checked_at: &str) -> String {
        let mut lines = vec![
            "# Extraction environment".to_string(),
            String::new(),
            format!("Checked at: {checked_at}"),
            String::new(),
            format!("- **Engine**: {engine}"),
        ];

        for dep in [Dependency::OcrEngine, Dependency::TableDetection] {
            let line = match self.status(dep) {
                Some(s) if s.available => format!(
                    "- **{dep}** ({}): available {}",
                    dep.feature(),
                    s.detail.as_deref().unwrap_or("")
                ),
                Some(_) => format!("- **{dep}** ({}): not found", dep.feature()),
                None => format!("- **{dep}** ({}): not requested", dep.feature()),
            };
            lines.push(line.trim_end().to_string());
        }

        let missing: Vec<&DependencyStatus> =
            self.statuses.iter().filter(|s| !s.available).collect();
        if !missing.is_empty() {
            lines.push(String::new());
            lines.push("## Installing missing dependencies".to_string());
            for s in missing {
                lines.push(String::new());
                lines.push(format!("### {} ({})", s.dependency, s.dependency.feature()));
                lines.push("```bash".to_string());
                lines.push(s.dependency.install_hint().to_string());
                lines.push("```".to_string());
            }
        }
        lines.push(String::new());
        lines.join("\n")
    }
}

/// Probe the dependencies of every requested feature and apply the
/// downgrade-or-abort policy.
///
/// Runs once per run, before the walker starts.
pub fn resolve_features(
    config: &RunConfig,
    probe: &dyn DependencyProbe,
) -> Result<ProbeReport, BatchError> {
    let mut report = ProbeReport {
        statuses: Vec::new(),
        features: Features {
            ocr: config.ocr,
            detect_tables: config.detect_tables,
        },
        warnings: Vec::new(),
    };

    let requested = [
        (config.ocr, Dependency::OcrEngine),
        (config.detect_tables, Dependency::TableDetection),
    ];

    for (wanted, dependency) in requested {
        if !wanted {
            continue;
        }
        let status = probe.probe(dependency);
        debug!(?status, "probed {dependency}");

        if !status.available {
            if !config.ignore_missing_deps {
                return Err(BatchError::MissingDependency {
                    dependency,
                    feature: dependency.feature(),
                });
            }
            let msg = format!("{dependency} not available: {} disabled", dependency.feature());
            warn!("{msg}");
            report.warnings.push(msg);
            match dependency {
                Dependency::OcrEngine => report.features.ocr = false,
                Dependency::TableDetection => report.features.detect_tables = false,
            }
        }
        report.statuses.push(status);
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedProbe {
        ocr: bool,
        tables: bool,
    }

    impl DependencyProbe for FixedProbe {
        fn probe(&self, dependency: Dependency) -> DependencyStatus {
            let available = match dependency {
                Dependency::OcrEngine => self.ocr,
                Dependency::TableDetection => self.tables,
            };
            if available {
                DependencyStatus::found(dependency, "test")
            } else {
                DependencyStatus::missing(dependency)
            }
        }
    }

    fn config(ignore: bool) -> RunConfig {
        RunConfig::builder("/in")
            .ignore_missing_deps(ignore)
            .build()
            .unwrap()
    }

    #[test]
    fn everything_present_keeps_features() {
        let report = resolve_features(&config(false), &FixedProbe { ocr: true, tables: true })
            .unwrap();
        assert!(report.features.ocr);
        assert!(report.features.detect_tables);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn missing_ocr_is_downgraded_when_ignoring() {
        let report = resolve_features(&config(true), &FixedProbe { ocr: false, tables: true })
            .unwrap();
        assert!(!report.features.ocr);
        assert!(report.features.detect_tables);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("tesseract"));
    }

    #[test]
    fn missing_tables_aborts_when_strict() {
        let err = resolve_features(&config(false), &FixedProbe { ocr: true, tables: false })
            .unwrap_err();
        assert!(matches!(
            err,
            BatchError::MissingDependency {
                dependency: Dependency::TableDetection,
                ..
            }
        ));
    }

    #[test]
    fn unrequested_features_are_not_probed() {
        let cfg = RunConfig::builder("/in")
            .ocr(false)
            .detect_tables(false)
            .ignore_missing_deps(false)
            .build()
            .unwrap();
        let report = resolve_features(&cfg, &FixedProbe { ocr: false, tables: false }).unwrap();
        assert!(report.statuses.is_empty());
        assert!(!report.features.ocr);
        assert!(!report.features.detect_tables);
    }

    #[test]
    fn notes_list_install_hints_for_missing() {
        let report = resolve_features(&config(true), &FixedProbe { ocr: false, tables: true })
            .unwrap();
        let notes = report.environment_notes("pdfium", "2025-01-18 10:00:00");
        assert!(notes.contains("**tesseract** (OCR): not found"));
        assert!(notes.contains("**libGL** (table detection): available test"));
        assert!(notes.contains("tesseract-ocr"));
        assert!(!notes.contains("libgl1"));
    }
}
