pub mod chunker;
pub mod docx;

pub use chunker::{Chunk, ChunkMode, TextChunker};
pub use docx::DocxExtractor;

use async_trait::async_trait;
use std::path::Path;

use crate::error::{SowError, SowResult};

/// Turns a document file into plain text: non-blank paragraphs, one per
/// line, in document order.
#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    async fn extract(&self, path: &Path) -> SowResult<String>;
}

/// Extractor for UTF-8 text documents (`.txt`, `.md`, ...). Each line is a
/// paragraph.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

#[async_trait]
impl DocumentExtractor for PlainTextExtractor {
    async fn extract(&self, path: &Path) -> SowResult<String> {
        if !path.exists() {
            return Err(SowError::DocumentNotFound(path.to_path_buf()));
        }

        let bytes = tokio::fs::read(path).await.map_err(|e| SowError::DocumentRead {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let text = String::from_utf8(bytes).map_err(|e| SowError::DocumentRead {
            path: path.to_path_buf(),
            reason: format!("not valid UTF-8 text: {}", e),
        })?;

        Ok(join_paragraphs(text.lines()))
    }
}

/// Chooses the extractor from the file extension: `.docx` is read as a Word
/// document, anything else as plain text.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtensionExtractor;

#[async_trait]
impl DocumentExtractor for ExtensionExtractor {
    async fn extract(&self, path: &Path) -> SowResult<String> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("docx") => DocxExtractor.extract(path).await,
            _ => PlainTextExtractor.extract(path).await,
        }
    }
}

pub fn join_paragraphs<'a>(paragraphs: impl Iterator<Item = &'a str>) -> String {
    paragraphs
        .filter(|p| !p.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_extract_drops_blank_paragraphs() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        write!(file, "Scope\n\n   \nDeliver a portal.\r\nTimeline: 6 weeks\n").unwrap();

        let text = PlainTextExtractor.extract(file.path()).await.unwrap();
        assert_eq!(text, "Scope\nDeliver a portal.\nTimeline: 6 weeks");
    }

    #[tokio::test]
    async fn test_missing_document() {
        let err = PlainTextExtractor
            .extract(Path::new("/no/such/sow.txt"))
            .await
            .unwrap_err();
        assert!(matches!(err, SowError::DocumentNotFound(_)));
    }

    #[tokio::test]
    async fn test_extension_picks_extractor() {
        let mut file = tempfile::Builder::new().suffix(".md").tempfile().unwrap();
        write!(file, "# Scope\n\nPortal").unwrap();
        let text = ExtensionExtractor.extract(file.path()).await.unwrap();
        assert_eq!(text, "# Scope\nPortal");

        let mut file = tempfile::Builder::new().suffix(".DOCX").tempfile().unwrap();
        write!(file, "plain text is not a Word archive").unwrap();
        let err = ExtensionExtractor.extract(file.path()).await.unwrap_err();
        assert!(matches!(err, SowError::DocumentRead { ref reason, .. } if reason.contains("DOCX")));
    }

    #[tokio::test]
    async fn test_binary_document_is_read_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[0xff, 0xfe, 0x00, 0x9f]).unwrap();

        let err = PlainTextExtractor.extract(file.path()).await.unwrap_err();
        assert!(matches!(err, SowError::DocumentRead { .. }));
    }
}
