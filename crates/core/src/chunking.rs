use crate::error::IngestError;
use crate::models::{RagConfig, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};

/// Sizes are counted in characters, not bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

impl From<&RagConfig> for ChunkingConfig {
    fn from(value: &RagConfig) -> Self {
        Self {
            chunk_size: value.chunk_size,
            overlap: value.chunk_overlap,
        }
    }
}

impl ChunkingConfig {
    pub fn validate(&self) -> Result<(), IngestError> {
        if self.chunk_size == 0 {
            return Err(IngestError::InvalidChunkConfig(
                "chunk_size must be at least 1".to_string(),
            ));
        }
        if self.overlap >= self.chunk_size {
            return Err(IngestError::InvalidChunkConfig(format!(
                "overlap {} must be smaller than chunk_size {}",
                self.overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

fn is_cut_boundary(c: char) -> bool {
    matches!(c, '。' | '\n' | ' ')
}

/// Splits `text` into overlapping passages, preferring to cut after the last
/// sentence terminator, newline or space inside each window.
///
/// Text that fits in one window comes back as a single trimmed chunk, which is
/// empty for empty input. Longer text never yields empty chunks.
pub fn split_text(text: &str, config: ChunkingConfig) -> Result<Vec<String>, IngestError> {
    config.validate()?;

    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= config.chunk_size {
        return Ok(vec![text.trim().to_string()]);
    }

    let mut chunks = Vec::new();
    let mut start = 0usize;

    while start < chars.len() {
        let mut end = start + config.chunk_size;

        if end < chars.len() {
            let window = &chars[start..end];
            if let Some(cut) = window.iter().rposition(|c| is_cut_boundary(*c)) {
                if cut > 0 {
                    end = start + cut + 1;
                }
            }
        }

        let piece: String = chars[start..end.min(chars.len())].iter().collect();
        let piece = piece.trim();
        if !piece.is_empty() {
            chunks.push(piece.to_string());
        }

        // A boundary close to `start` can put `end - overlap` behind us.
        let next = end.saturating_sub(config.overlap);
        start = if next > start { next } else { end };
    }

    Ok(chunks)
}
