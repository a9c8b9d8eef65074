use serde::{Deserialize, Serialize};

use crate::config::ChunkingConfig;
use crate::error::{SowError, SowResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkMode {
    /// Fixed windows that share `overlap` characters, broken at the latest
    /// sentence or line end inside the lookback window.
    Overlap,
    /// Whole words packed up to `max_size`. No overlap.
    WordBounded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub index: usize,
    pub total: usize,
    pub text: String,
    /// Leading characters repeated from the previous chunk
    pub overlap_with_previous: usize,
}

impl Chunk {
    /// The chunk without the region it shares with its predecessor.
    pub fn core(&self) -> &str {
        match self.text.char_indices().nth(self.overlap_with_previous) {
            Some((byte, _)) => &self.text[byte..],
            None if self.overlap_with_previous == 0 => &self.text,
            None => "",
        }
    }

    /// 1-based position for display ("chunk 2/5").
    pub fn label(&self) -> String {
        format!("{}/{}", self.index + 1, self.total)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextChunker {
    mode: ChunkMode,
    max_size: usize,
    overlap: usize,
}

impl TextChunker {
    pub fn new(mode: ChunkMode, max_size: usize, overlap: usize) -> SowResult<Self> {
        if max_size == 0 {
            return Err(SowError::Configuration(
                "chunk max_size must be greater than zero".to_string(),
            ));
        }
        if mode == ChunkMode::Overlap && overlap >= max_size {
            return Err(SowError::Configuration(format!(
                "chunk overlap ({}) must be smaller than max_size ({})",
                overlap, max_size
            )));
        }
        Ok(Self {
            mode,
            max_size,
            overlap,
        })
    }

    pub fn from_config(config: &ChunkingConfig) -> SowResult<Self> {
        Self::new(config.mode, config.max_size, config.overlap)
    }

    pub fn chunk(&self, text: &str) -> Vec<Chunk> {
        let pieces: Vec<(String, usize)> = match self.mode {
            ChunkMode::Overlap => overlap_spans(text, self.max_size, self.overlap)
                .into_iter()
                .map(|span| (span.text.to_string(), span.shared))
                .collect(),
            ChunkMode::WordBounded => split_by_words(text, self.max_size)
                .into_iter()
                .map(|t| (t, 0))
                .collect(),
        };

        let total = pieces.len();
        pieces
            .into_iter()
            .enumerate()
            .map(|(index, (text, overlap_with_previous))| Chunk {
                index,
                total,
                text,
                overlap_with_previous,
            })
            .collect()
    }
}

struct Span<'a> {
    text: &'a str,
    shared: usize,
}

fn overlap_spans(text: &str, max_size: usize, overlap: usize) -> Vec<Span<'_>> {
    // Byte offset of every char boundary, including the end of the text
    let bounds: Vec<usize> = text
        .char_indices()
        .map(|(b, _)| b)
        .chain(std::iter::once(text.len()))
        .collect();
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();

    if len <= max_size {
        return vec![Span { text, shared: 0 }];
    }

    let mut spans = Vec::new();
    let mut start = 0;
    let mut previous_end: usize = 0;
    loop {
        let mut end = (start + max_size).min(len);

        if end < len {
            let window_start = (end + 1).saturating_sub(overlap).max(start);
            if let Some(pos) = (window_start..end).rev().find(|&i| is_break(chars[i])) {
                end = pos + 1;
            }
        }

        spans.push(Span {
            text: &text[bounds[start]..bounds[end]],
            shared: previous_end.saturating_sub(start),
        });

        if end >= len {
            break;
        }
        previous_end = end;
        start = end.saturating_sub(overlap).max(start + 1);
    }

    spans
}

fn is_break(c: char) -> bool {
    c == '.' || c == '\n'
}

/// Word-bounded split. A single word longer than `max_size` becomes its own
/// oversized chunk.
pub fn split_by_words(text: &str, max_size: usize) -> Vec<String> {
    if text.chars().count() <= max_size {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        if current.is_empty() {
            current.push_str(word);
            current_len = word_len;
        } else if current_len + 1 + word_len > max_size {
            chunks.push(std::mem::take(&mut current));
            current.push_str(word);
            current_len = word_len;
        } else {
            current.push(' ');
            current.push_str(word);
            current_len += 1 + word_len;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
