use anyhow::{Context, Result};
use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{Cursor, Read};
use std::path::Path;

use super::{join_paragraphs, DocumentExtractor};
use crate::error::{SowError, SowResult};

const MAIN_PART: &str = "word/document.xml";

/// Extractor for Word `.docx` files. Reads the body paragraphs of the main
/// document part. Paragraphs inside tables, headers and footers are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocxExtractor;

#[async_trait]
impl DocumentExtractor for DocxExtractor {
    async fn extract(&self, path: &Path) -> SowResult<String> {
        if !path.exists() {
            return Err(SowError::DocumentNotFound(path.to_path_buf()));
        }

        let read_error = |e: anyhow::Error| SowError::DocumentRead {
            path: path.to_path_buf(),
            reason: format!("{:#}", e),
        };

        let bytes = tokio::fs::read(path)
            .await
            .context("cannot read file")
            .map_err(read_error)?;
        let xml = main_part(&bytes).map_err(read_error)?;
        let paragraphs = body_paragraphs(&xml).map_err(read_error)?;

        log::debug!("Read {} paragraphs from {}", paragraphs.len(), path.display());
        Ok(join_paragraphs(paragraphs.iter().map(String::as_str)))
    }
}

fn main_part(bytes: &[u8]) -> Result<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).context("not a DOCX archive")?;
    let mut part = archive
        .by_name(MAIN_PART)
        .with_context(|| format!("archive has no {}", MAIN_PART))?;

    let mut xml = String::new();
    part.read_to_string(&mut xml)
        .with_context(|| format!("{} is not valid UTF-8", MAIN_PART))?;
    Ok(xml)
}

/// Text of each top-level body paragraph, in order. Runs are concatenated,
/// `w:tab` becomes a tab and `w:br`/`w:cr` a newline.
fn body_paragraphs(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut paragraph_depth = 0usize;
    let mut table_depth = 0usize;
    let mut props_depth = 0usize;
    let mut in_text = false;

    loop {
        match reader.read_event().context("malformed document XML")? {
            Event::Start(e) => match e.name().as_ref() {
                b"w:tbl" => table_depth += 1,
                b"w:p" => paragraph_depth += 1,
                b"w:pPr" => props_depth += 1,
                b"w:t" => in_text = true,
                _ => {}
            },
            Event::End(e) => match e.name().as_ref() {
                b"w:tbl" => table_depth = table_depth.saturating_sub(1),
                b"w:pPr" => props_depth = props_depth.saturating_sub(1),
                b"w:t" => in_text = false,
                b"w:p" => {
                    paragraph_depth = paragraph_depth.saturating_sub(1);
                    if paragraph_depth == 0 {
                        let text = std::mem::take(&mut current);
                        if table_depth == 0 {
                            paragraphs.push(text);
                        }
                    }
                }
                _ => {}
            },
            Event::Empty(e) if paragraph_depth > 0 && props_depth == 0 => match e.name().as_ref() {
                b"w:tab" => current.push('\t'),
                b"w:br" | b"w:cr" => current.push('\n'),
                _ => {}
            },
            Event::Text(t) if in_text => {
                current.push_str(&t.unescape().context("bad text entity")?);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs)
}
