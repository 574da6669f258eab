//! OCR through the `tesseract` command-line engine.
//!
//! The rendered page is written to a temporary PNG and handed to
//! `tesseract <png> stdout -l <lang> --psm 1`; the temp file is removed when
//! the [`tempfile::NamedTempFile`] drops, even on error.

use crate::error::ExtractionError;
use image::{DynamicImage, ImageFormat};
use std::path::PathBuf;
use std::process::Command;
use tracing::debug;

/// A located tesseract executable plus the language to recognise.
#[derive(Debug, Clone)]
pub struct TesseractOcr {
    binary: PathBuf,
    language: String,
}

impl TesseractOcr {
    /// Find `tesseract` on `PATH`.
    pub fn locate(language: impl Into<String>) -> Option<Self> {
        which::which("tesseract").ok().map(|binary| Self {
            binary,
            language: language.into(),
        })
    }

    /// Recognise the text in `image`.
    pub fn recognize(&self, image: &DynamicImage) -> Result<String, ExtractionError> {
        let tmp = tempfile::Builder::new()
            .prefix("extrator-ocr-")
            .suffix(".png")
            .tempfile()
            .map_err(|e| ExtractionError::Engine(format!("OCR temp file: {e}")))?;

        image
            .save_with_format(tmp.path(), ImageFormat::Png)
            .map_err(|e| ExtractionError::Engine(format!("OCR page encode: {e}")))?;

        let output = Command::new(&self.binary)
            .arg(tmp.path())
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .arg("--psm")
            .arg("1")
            .output()
            .map_err(|e| ExtractionError::Engine(format!("failed to run tesseract: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExtractionError::Engine(format!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let text = normalise_ocr_text(&String::from_utf8_lossy(&output.stdout));
        debug!("OCR recognised {} chars", text.len());
        Ok(text)
    }
}

/// Drop form feeds and CR, trim trailing whitespace per line and at the end.
fn normalise_ocr_text(raw: &str) -> String {
    raw.replace('\x0c', "")
        .replace("\r\n", "\n")
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
