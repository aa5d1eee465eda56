//! Text extraction from uploaded papers.
//!
//! Dispatches on the upload's file extension:
//! - `.pdf` via the `pdf-extract` crate (on the blocking pool)
//! - `.docx` by reading `word/document.xml` out of the ZIP container
//! - `.txt` read directly
//!
//! Legacy binary `.doc` files are refused; reading them as text yields
//! garbage.

mod docx;

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

/// Extensions accepted by the upload gate, including the refused `.doc`.
pub const ACCEPTED_EXTENSIONS: [&str; 4] = [".pdf", ".txt", ".doc", ".docx"];

/// Errors that can occur during text extraction.
///
/// Display strings are safe to show to clients; library details are logged.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Unsupported file format{}. Please upload PDF, TXT, DOC, or DOCX files.", describe_extension(.0))]
    UnsupportedFileType(Option<String>),

    #[error("Legacy .doc files cannot be read. Please save the paper as DOCX or PDF and upload it again.")]
    LegacyWordFormat,

    #[error("{0}")]
    ExtractionFailed(&'static str),

    #[error("Failed to read uploaded file")]
    Io(#[from] std::io::Error),
}

fn describe_extension(ext: &Option<String>) -> String {
    match ext {
        Some(ext) => format!(" ({})", ext),
        None => String::new(),
    }
}

impl ExtractionError {
    /// Whether the caller caused this error (bad upload) rather than the server.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ExtractionError::UnsupportedFileType(_) | ExtractionError::LegacyWordFormat
        )
    }
}

/// Supported document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
    Text,
}

impl DocumentKind {
    /// Classify an upload by its original filename.
    pub fn from_filename(filename: &str) -> Result<Self, ExtractionError> {
        let ext = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e.to_lowercase()));

        match ext.as_deref() {
            Some(".pdf") => Ok(DocumentKind::Pdf),
            Some(".docx") => Ok(DocumentKind::Docx),
            Some(".txt") => Ok(DocumentKind::Text),
            Some(".doc") => Err(ExtractionError::LegacyWordFormat),
            _ => Err(ExtractionError::UnsupportedFileType(ext)),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            DocumentKind::Pdf => ".pdf",
            DocumentKind::Docx => ".docx",
            DocumentKind::Text => ".txt",
        }
    }
}

/// Extract plain text from a file of the given kind.
pub async fn extract_text(path: &Path, kind: DocumentKind) -> Result<String, ExtractionError> {
    debug!(path = %path.display(), ?kind, "Extracting text");

    let text = match kind {
        DocumentKind::Text => {
            let bytes = tokio::fs::read(path).await?;
            let text = String::from_utf8_lossy(&bytes).into_owned();
            text.strip_prefix('\u{feff}').map(str::to_string).unwrap_or(text)
        }
        DocumentKind::Pdf => extract_pdf(path.to_path_buf()).await?,
        DocumentKind::Docx => {
            let path = path.to_path_buf();
            run_blocking("DOCX", move || docx::extract_docx(&path)).await?
        }
    };

    debug!(chars = text.chars().count(), ?kind, "Text extracted");
    Ok(text)
}

async fn extract_pdf(path: PathBuf) -> Result<String, ExtractionError> {
    run_blocking("PDF", move || {
        pdf_extract::extract_text(&path).map_err(|e| {
            warn!(error = ?e, "PDF parser rejected file");
            ExtractionError::ExtractionFailed("Failed to extract text from PDF")
        })
    })
    .await
}

/// Run a parser on the blocking pool. A panicking parser becomes an
/// extraction failure instead of taking the request task down.
async fn run_blocking<F>(format: &'static str, f: F) -> Result<String, ExtractionError>
where
    F: FnOnce() -> Result<String, ExtractionError> + Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => result,
        Err(e) => {
            warn!(format, error = %e, "Text extraction task failed");
            Err(ExtractionError::ExtractionFailed(match format {
                "PDF" => "Failed to extract text from PDF",
                _ => "Failed to extract text from document",
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_from_filename() {
        assert_eq!(DocumentKind::from_filename("a.pdf").unwrap(), DocumentKind::Pdf);
        assert_eq!(DocumentKind::from_filename("A.PDF").unwrap(), DocumentKind::Pdf);
        assert_eq!(DocumentKind::from_filename("notes.txt").unwrap(), DocumentKind::Text);
        assert_eq!(DocumentKind::from_filename("x.y.docx").unwrap(), DocumentKind::Docx);
    }

    #[test]
    fn test_from_filename_rejections() {
        let err = DocumentKind::from_filename("data.csv").unwrap_err();
        assert!(matches!(err, ExtractionError::UnsupportedFileType(Some(ref e)) if e == ".csv"));
        assert!(err.is_client_error());
        assert!(err.to_string().contains("(.csv)"));

        let err = DocumentKind::from_filename("README").unwrap_err();
        assert!(matches!(err, ExtractionError::UnsupportedFileType(None)));

        let err = DocumentKind::from_filename("old.doc").unwrap_err();
        assert!(matches!(err, ExtractionError::LegacyWordFormat));
        assert!(err.is_client_error());
    }

    #[test]
    fn test_accepted_extensions_cover_kinds() {
        for kind in [DocumentKind::Pdf, DocumentKind::Docx, DocumentKind::Text] {
            assert!(ACCEPTED_EXTENSIONS.contains(&kind.extension()));
        }
    }

    #[tokio::test]
    async fn test_extract_text_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all("\u{feff}Plain paper text, with ünïcode.".as_bytes())
            .unwrap();

        let text = extract_text(file.path(), DocumentKind::Text).await.unwrap();
        assert_eq!(text, "Plain paper text, with ünïcode.");
    }

    #[tokio::test]
    async fn test_extract_text_invalid_utf8_is_lossy() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"abc\xffdef").unwrap();

        let text = extract_text(file.path(), DocumentKind::Text).await.unwrap();
        assert_eq!(text, "abc\u{fffd}def");
    }

    #[tokio::test]
    async fn test_corrupt_pdf_is_extraction_failure() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"%PDF-1.4\nthis is not really a pdf").unwrap();

        let err = extract_text(file.path(), DocumentKind::Pdf).await.unwrap_err();
        assert!(matches!(err, ExtractionError::ExtractionFailed(_)));
        assert!(!err.is_client_error());
        assert_eq!(err.to_string(), "Failed to extract text from PDF");
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = extract_text(&dir.path().join("gone.txt"), DocumentKind::Text)
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::Io(_)));
        assert_eq!(err.to_string(), "Failed to read uploaded file");
    }
}
