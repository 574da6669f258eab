//! Run the extraction engine off the async executor.
//!
//! Engines are synchronous and CPU-bound (pdfium is not async, tesseract is
//! a child process), so each document goes through
//! [`tokio::task::spawn_blocking`].

use crate::engine::{ExtractedDocument, Extractor, Features};
use crate::error::ExtractionError;
use std::sync::Arc;
use tracing::debug;

/// Extract one document on the blocking pool.
pub async fn extract(
    extractor: Arc<dyn Extractor>,
    pdf: Vec<u8>,
    features: Features,
) -> Result<ExtractedDocument, ExtractionError> {
    debug!("Invoking {} on {} bytes", extractor.name(), pdf.len());
    tokio::task::spawn_blocking(move || extractor.extract(&pdf, features))
        .await
        .map_err(|e| ExtractionError::Engine(format!("extraction task panicked: {e}")))?
}

/// Run [`Extractor::check`] on the blocking pool.
pub async fn check(extractor: Arc<dyn Extractor>) -> Result<String, ExtractionError> {
    tokio::task::spawn_blocking(move || extractor.check())
        .await
        .map_err(|e| ExtractionError::Engine(format!("engine check panicked: {e}")))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Block, ExtractedPage};

    struct Echo;

    impl Extractor for Echo {
        fn name(&self) -> &str {
            "echo"
        }
        fn check(&self) -> Result<String, ExtractionError> {
            Ok("echo 1.0".into())
        }
        fn extract(&self, pdf: &[u8], features: Features) -> Result<ExtractedDocument, ExtractionError> {
            if pdf.is_empty() {
                return Err(ExtractionError::Corrupt("empty".into()));
            }
            let text = format!("{} bytes, ocr={}", pdf.len(), features.ocr);
            Ok(ExtractedDocument::new(vec![ExtractedPage::new(vec![
                Block::text(text),
            ])]))
        }
    }

    struct Panics;

    impl Extractor for Panics {
        fn name(&self) -> &str {
            "panics"
        }
        fn check(&self) -> Result<String, ExtractionError> {
            panic!("no engine")
        }
        fn extract(&self, _: &[u8], _: Features) -> Result<ExtractedDocument, ExtractionError> {
            panic!("boom")
        }
    }

    #[tokio::test]
    async fn passes_bytes_and_features() {
        let features = Features {
            ocr: true,
            detect_tables: false,
        };
        let doc = extract(Arc::new(Echo), b"%PDF".to_vec(), features)
            .await
            .unwrap();
        assert_eq!(doc.pages[0].blocks[0], Block::text("4 bytes, ocr=true"));
    }

    #[tokio::test]
    async fn engine_error_is_returned() {
        let err = extract(Arc::new(Echo), Vec::new(), Features::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::Corrupt(_)));
    }

    #[tokio::test]
    async fn panic_becomes_engine_error() {
        let err = extract(Arc::new(Panics), b"%PDF".to_vec(), Features::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::Engine(_)));
        assert!(check(Arc::new(Panics)).await.is_err());
        assert_eq!(check(Arc::new(Echo)).await.unwrap(), "echo 1.0");
    }
}
