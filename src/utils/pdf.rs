//! PDF text extraction for full-text email discovery.

use std::path::Path;
use thiserror::Error;

/// Errors that can occur during PDF extraction
#[derive(Debug, Error)]
pub enum PdfExtractError {
    #[error("Failed to extract text from PDF: {0}")]
    ExtractionFailed(String),

    #[error("File not found or not a valid PDF: {0}")]
    InvalidFile(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Extract text from a PDF file.
///
/// Returns the extracted text content, or an error if extraction fails.
/// Scanned PDFs without a text layer yield an empty string.
pub fn extract_text(path: &Path) -> Result<String, PdfExtractError> {
    if !path.is_file() {
        return Err(PdfExtractError::InvalidFile(format!(
            "Not a file: {}",
            path.display()
        )));
    }

    let bytes = std::fs::read(path)?;
    let text = pdf_extract::extract_text_from_mem(&bytes)
        .map_err(|e| PdfExtractError::ExtractionFailed(e.to_string()))?;

    if text.trim().is_empty() {
        tracing::debug!("Extracted empty text from PDF: {}", path.display());
    }
    Ok(text)
}

/// Extract text if the file exists and can be read, logging failures
pub fn extract_text_if_present(path: &Path) -> Option<String> {
    if !path.exists() {
        return None;
    }
    match extract_text(path) {
        Ok(text) => Some(text),
        Err(e) => {
            tracing::warn!("Could not read full text {}: {}", path.display(), e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_nonexistent_file() {
        let result = extract_text(Path::new("/nonexistent/file.pdf"));
        assert!(matches!(result, Err(PdfExtractError::InvalidFile(_))));
    }

    #[test]
    fn test_missing_file_is_none() {
        assert!(extract_text_if_present(Path::new("/nonexistent/file.pdf")).is_none());
    }

    #[test]
    fn test_garbage_pdf_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"not a pdf at all").unwrap();

        assert!(extract_text(&path).is_err());
        assert!(extract_text_if_present(&path).is_none());
    }
}
