//! Input loading: read one PDF into memory and validate its header.
//!
//! The engine receives bytes, not a path. Reading here lets us report
//! missing files, permission problems and non-PDF content as ordinary
//! per-file errors before the engine is involved.

use crate::error::FileError;
use std::path::Path;
use tracing::debug;

/// PDF readers accept the `%PDF-` header anywhere in the first KiB.
const HEADER_WINDOW: usize = 1024;

/// Read `path` and check it carries a `%PDF` header.
pub async fn read_pdf(path: &Path) -> Result<Vec<u8>, FileError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| FileError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    check_header(path, &bytes)?;
    debug!("Read {} bytes from {}", bytes.len(), path.display());
    Ok(bytes)
}

/// Fail with [`FileError::NotAPdf`] unless `%PDF` appears in the header window.
pub fn check_header(path: &Path, bytes: &[u8]) -> Result<(), FileError> {
    let window = &bytes[..bytes.len().min(HEADER_WINDOW)];
    if window.windows(4).any(|w| w == b"%PDF") {
        return Ok(());
    }
    Err(FileError::NotAPdf {
        path: path.to_path_buf(),
        magic: bytes.iter().take(4).copied().collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_header() {
        assert!(check_header(Path::new("a.pdf"), b"%PDF-1.7\n...").is_ok());
    }

    #[test]
    fn accepts_header_after_junk() {
        let mut bytes = vec![0u8; 100];
        bytes.extend_from_slice(b"%PDF-1.4");
        assert!(check_header(Path::new("a.pdf"), &bytes).is_ok());
    }

    #[test]
    fn rejects_other_content() {
        let err = check_header(Path::new("a.pdf"), b"PK\x03\x04zip").unwrap_err();
        match err {
            FileError::NotAPdf { magic, .. } => assert_eq!(magic, b"PK\x03\x04".to_vec()),
            other => panic!("unexpected {other:?}"),
        }
        assert!(check_header(Path::new("a.pdf"), b"").is_err());
    }

    #[tokio::test]
    async fn missing_file_is_read_error() {
        let err = read_pdf(Path::new("/definitely/not/here.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, FileError::Read { .. }));
    }
}
