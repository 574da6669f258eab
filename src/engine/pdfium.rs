//! Production engine: pdfium text layer, page objects and rendering.
//!
//! ## Reading order
//!
//! Pages without images use pdfium's full-page text, which keeps line
//! structure. Pages with images are walked object by object in content-stream
//! order so each picture lands between the text that surrounds it in the
//! stream; that order is also the order image markers are numbered in.
//!
//! ## OCR
//!
//! A page whose text layer is empty is rendered to a bitmap (longest edge
//! capped at [`OCR_RENDER_PIXELS`]) and passed to tesseract. A failed OCR
//! pass only costs that page its text; the document still succeeds.

use super::ocr::TesseractOcr;
use super::tables::page_blocks;
use super::{Block, ExtractedDocument, ExtractedPage, Extractor, Features};
use crate::config::DEFAULT_OCR_LANGUAGE;
use crate::error::ExtractionError;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Longest edge, in pixels, of page renders handed to OCR.
pub const OCR_RENDER_PIXELS: u32 = 2480;

/// pdfium-backed [`Extractor`].
#[derive(Debug, Clone)]
pub struct PdfiumExtractor {
    /// Library file or folder containing it. `None`: `./`, then the system library.
    library_path: Option<PathBuf>,
    ocr_language: String,
}

impl Default for PdfiumExtractor {
    fn default() -> Self {
        Self {
            library_path: None,
            ocr_language: DEFAULT_OCR_LANGUAGE.to_string(),
        }
    }
}

impl PdfiumExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.library_path = Some(path.into());
        self
    }

    pub fn ocr_language(mut self, lang: impl Into<String>) -> Self {
        self.ocr_language = lang.into();
        self
    }

    /// Bind libpdfium, returning the bound instance and where it came from.
    fn bind(&self) -> Result<(Pdfium, String), ExtractionError> {
        let (bindings, origin) = match &self.library_path {
            Some(path) => {
                let file = library_file(path);
                let origin = file.display().to_string();
                (Pdfium::bind_to_library(&file), origin)
            }
            None => match Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(
                "./",
            )) {
                Ok(b) => (Ok(b), "./".to_string()),
                Err(_) => (Pdfium::bind_to_system_library(), "system library".to_string()),
            },
        };

        let bindings = bindings.map_err(|e| {
            ExtractionError::Engine(format!("failed to bind libpdfium ({origin}): {e:?}"))
        })?;
        Ok((Pdfium::new(bindings), origin))
    }

    fn extract_page(
        &self,
        page_num: usize,
        page: &PdfPage,
        features: Features,
        ocr: Option<&TesseractOcr>,
    ) -> Result<ExtractedPage, ExtractionError> {
        let text_page = page.text().map_err(|e| {
            ExtractionError::Engine(format!("page {page_num}: text layer unavailable: {e:?}"))
        })?;

        let image_count = page
            .objects()
            .iter()
            .filter(|o| o.object_type() == PdfPageObjectType::Image)
            .count();
        let full_text = normalise_text(&text_page.all());

        let mut blocks = if image_count == 0 {
            page_blocks(&full_text, features.detect_tables)
        } else {
            stream_blocks(page, features.detect_tables)
        };

        if full_text.trim().is_empty() {
            if let Some(ocr) = ocr {
                match ocr_page(page, ocr) {
                    Ok(text) => blocks.extend(page_blocks(&text, features.detect_tables)),
                    Err(e) => warn!("Page {page_num}: OCR failed, keeping page without text: {e}"),
                }
            }
        }

        debug!(
            "Page {page_num}: {} blocks, {image_count} images",
            blocks.len()
        );
        Ok(ExtractedPage::new(blocks))
    }
}

impl Extractor for PdfiumExtractor {
    fn name(&self) -> &str {
        "pdfium"
    }

    fn check(&self) -> Result<String, ExtractionError> {
        let (_pdfium, origin) = self.bind()?;
        Ok(format!("pdfium ({origin})"))
    }

    fn extract(&self, pdf: &[u8], features: Features) -> Result<ExtractedDocument, ExtractionError> {
        let (pdfium, _) = self.bind()?;
        let document = pdfium
            .load_pdf_from_byte_slice(pdf, None)
            .map_err(classify_load_error)?;

        let ocr = if features.ocr {
            let located = TesseractOcr::locate(self.ocr_language.clone());
            if located.is_none() {
                warn!("OCR requested but tesseract is not on PATH; continuing without OCR");
            }
            located
        } else {
            None
        };

        let pages = document.pages();
        info!("PDF loaded: {} pages", pages.len());

        let mut extracted = Vec::with_capacity(pages.len() as usize);
        for (idx, page) in pages.iter().enumerate() {
            extracted.push(self.extract_page(idx + 1, &page, features, ocr.as_ref())?);
        }

        Ok(ExtractedDocument::new(extracted))
    }
}

/// `path` may name the library itself or the folder holding it.
fn library_file(path: &Path) -> PathBuf {
    if path.is_dir() {
        Pdfium::pdfium_platform_library_name_at_path(path)
    } else {
        path.to_path_buf()
    }
}

/// Map a pdfium load failure onto the engine error taxonomy.
fn classify_load_error(e: PdfiumError) -> ExtractionError {
    let detail = format!("{e:?}");
    if detail.contains("Password") {
        ExtractionError::PasswordProtected
    } else if detail.contains("Security") {
        ExtractionError::Unsupported(format!("unsupported security handler: {detail}"))
    } else {
        ExtractionError::Corrupt(detail)
    }
}

/// Walk page objects in content-stream order, cutting the text at each image.
fn stream_blocks(page: &PdfPage, detect_tables: bool) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut run: Vec<String> = Vec::new();

    for object in page.objects().iter() {
        match object.object_type() {
            PdfPageObjectType::Text => {
                if let Some(text) = object.as_text_object() {
                    let fragment = normalise_text(&text.text());
                    if !fragment.trim().is_empty() {
                        run.push(fragment);
                    }
                }
            }
            PdfPageObjectType::Image => {
                blocks.extend(page_blocks(&run.join("\n"), detect_tables));
                run.clear();
                blocks.push(Block::image());
            }
            _ => {}
        }
    }
    blocks.extend(page_blocks(&run.join("\n"), detect_tables));
    blocks
}

fn ocr_page(page: &PdfPage, ocr: &TesseractOcr) -> Result<String, ExtractionError> {
    let render_config = PdfRenderConfig::new()
        .set_target_width(OCR_RENDER_PIXELS as i32)
        .set_maximum_height(OCR_RENDER_PIXELS as i32);

    let bitmap = page
        .render_with_config(&render_config)
        .map_err(|e| ExtractionError::Engine(format!("render for OCR failed: {e:?}")))?;

    let image = bitmap.as_image();
    debug!("Rendered page for OCR → {}x{} px", image.width(), image.height());
    ocr.recognize(&image)
}

/// CRLF → LF and drop control characters pdfium leaves in text runs.
fn normalise_text(raw: &str) -> String {
    raw.replace("\r\n", "\n")
        .chars()
        .map(|c| if c == '\r' { '\n' } else { c })
        .filter(|c| *c == '\n' || *c == '\t' || !c.is_control())
        .collect()
}
