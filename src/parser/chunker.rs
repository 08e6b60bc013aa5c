use thiserror::Error;

pub const DEFAULT_CHUNK_SIZE: usize = 1000;
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ChunkError {
    #[error("Invalid chunker configuration: size {size}, overlap {overlap}")]
    InvalidConfig { size: usize, overlap: usize },
}

/// Splits text into overlapping windows that prefer to end on a sentence
/// terminator, then on whitespace. Lengths are counted in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextChunker {
    chunk_size: usize,
    overlap: usize,
}

impl Default for TextChunker {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

impl TextChunker {
    /// A chunker whose overlap is strictly smaller than its window.
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self, ChunkError> {
        if chunk_size == 0 || overlap >= chunk_size {
            return Err(ChunkError::InvalidConfig {
                size: chunk_size,
                overlap,
            });
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    pub fn chunk(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let len = chars.len();

        if len <= self.chunk_size {
            return vec![text.to_string()];
        }

        let mut chunks = Vec::new();
        let mut start = 0;

        while start < len {
            let mut end = start + self.chunk_size;

            if end >= len {
                chunks.push(chars[start..].iter().collect());
                break;
            }

            let window = &chars[start..end];
            if let Some(dot) = rposition_after_first(window, |c| c == '.') {
                end = start + dot + 1;
            } else if let Some(space) = rposition_after_first(window, char::is_whitespace) {
                end = start + space;
            }

            chunks.push(chars[start..end].iter().collect());

            // Stepping back by the overlap must still move forward.
            start = match end.checked_sub(self.overlap) {
                Some(next) if next > start => next,
                _ => end,
            };
        }

        chunks
    }
}

/// Last index matching `pred`, ignoring index 0 so a window never collapses
/// to nothing.
fn rposition_after_first(window: &[char], pred: impl Fn(char) -> bool) -> Option<usize> {
    window
        .iter()
        .rposition(|&c| pred(c))
        .filter(|&idx| idx > 0)
}

/// Convenience wrapper over [`TextChunker`].
pub fn chunk_text(text: &str, size: usize, overlap: usize) -> Result<Vec<String>, ChunkError> {
    Ok(TextChunker::new(size, overlap)?.chunk(text))
}
