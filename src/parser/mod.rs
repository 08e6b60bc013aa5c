//! Document extraction: format-specific readers feeding the text chunker.

pub mod chunker;
mod pdf;
mod pptx;
mod text;

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::sync::OnceLock;
use thiserror::Error;
use tracing::info;

pub use chunker::{chunk_text, ChunkError, TextChunker, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),

    #[error("{0}")]
    ExtractionFailure(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Pdf,
    Pptx,
    Txt,
}

impl FileType {
    /// Detect the file type from the (case-insensitive) extension
    pub fn from_path(path: &Path) -> Result<Self, ExtractionError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "pdf" => Ok(FileType::Pdf),
            "pptx" => Ok(FileType::Pptx),
            "txt" => Ok(FileType::Txt),
            _ => Err(ExtractionError::UnsupportedFormat(format!(".{}", extension))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Pdf => "pdf",
            FileType::Pptx => "pptx",
            FileType::Txt => "txt",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Text extracted from one uploaded file. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedDocument {
    pub raw_text: String,
    pub chunks: Vec<String>,
    pub page_count: usize,
    pub file_type: FileType,
}

impl ExtractedDocument {
    pub fn word_count(&self) -> usize {
        self.raw_text.split_whitespace().count()
    }
}

/// Dispatches on file extension and chunks the normalized text.
#[derive(Debug, Clone, Default)]
pub struct DocumentExtractor {
    chunker: TextChunker,
}

impl DocumentExtractor {
    pub fn new(chunker: TextChunker) -> Self {
        Self { chunker }
    }

    pub fn extract(&self, path: &Path) -> Result<ExtractedDocument, ExtractionError> {
        let file_type = FileType::from_path(path)?;

        let (raw_text, page_count) = match file_type {
            FileType::Pdf => pdf::extract_pdf(path)?,
            FileType::Pptx => pptx::extract_pptx(path)?,
            FileType::Txt => (text::extract_txt(path)?, 1),
        };

        let chunks = self.chunker.chunk(&normalize_whitespace(&raw_text));
        info!(
            path = %path.display(),
            file_type = %file_type,
            page_count,
            chunks = chunks.len(),
            "extracted document"
        );

        Ok(ExtractedDocument {
            raw_text,
            chunks,
            page_count,
            file_type,
        })
    }
}

/// Extract a document with the default chunking parameters
pub fn extract_document(path: &Path) -> Result<ExtractedDocument, ExtractionError> {
    DocumentExtractor::default().extract(path)
}

/// Collapse every whitespace run to one space and trim.
pub fn normalize_whitespace(text: &str) -> String {
    static WHITESPACE: OnceLock<Regex> = OnceLock::new();
    let re = WHITESPACE.get_or_init(|| Regex::new(r"\s+").expect("whitespace pattern"));
    re.replace_all(text, " ").trim().to_string()
}

/// Runs of capitalized words ("Cell Membrane", "Mitosis"), deduplicated in
/// first-seen order.
pub fn capitalized_phrases(text: &str) -> Vec<String> {
    static PHRASE: OnceLock<Regex> = OnceLock::new();
    let re = PHRASE.get_or_init(|| {
        Regex::new(r"\b[A-Z][a-z]+(?:\s+[A-Z][a-z]+)*\b").expect("capitalized phrase pattern")
    });

    let mut seen = HashSet::new();
    re.find_iter(text)
        .map(|m| m.as_str().to_string())
        .filter(|phrase| seen.insert(phrase.clone()))
        .collect()
}

/// Up to 20 capitalized phrases longer than three characters.
pub fn key_phrases(text: &str) -> Vec<String> {
    capitalized_phrases(text)
        .into_iter()
        .filter(|phrase| phrase.chars().count() > 3)
        .take(20)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_type_detection() {
        assert_eq!(FileType::from_path(Path::new("a/b.PDF")).unwrap(), FileType::Pdf);
        assert_eq!(FileType::from_path(Path::new("deck.pptx")).unwrap(), FileType::Pptx);
        assert_eq!(FileType::from_path(Path::new("notes.txt")).unwrap(), FileType::Txt);

        match FileType::from_path(Path::new("report.docx")) {
            Err(ExtractionError::UnsupportedFormat(ext)) => assert_eq!(ext, ".docx"),
            other => panic!("expected unsupported format, got {:?}", other),
        }
        assert!(FileType::from_path(Path::new("README")).is_err());
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  a\n\n b\t c  "), "a b c");
        assert_eq!(normalize_whitespace("\n\n"), "");
    }

    #[test]
    fn test_extract_txt_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "Line one.\n\nLine   two.").unwrap();

        let doc = extract_document(&path).unwrap();
        assert_eq!(doc.file_type, FileType::Txt);
        assert_eq!(doc.page_count, 1);
        assert_eq!(doc.raw_text, "Line one.\n\nLine   two.");
        assert_eq!(doc.chunks, vec!["Line one. Line two.".to_string()]);
        assert_eq!(doc.word_count(), 4);
    }

    #[test]
    fn test_long_document_is_chunked() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("long.txt");
        let body = "The mitochondria produce energy for the cell. ".repeat(60);
        std::fs::write(&path, &body).unwrap();

        let doc = DocumentExtractor::new(TextChunker::new(300, 50).unwrap())
            .extract(&path)
            .unwrap();
        assert!(doc.chunks.len() > 1);
        assert!(doc.chunks.iter().all(|c| c.chars().count() <= 300));
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slides.key");
        std::fs::write(&path, "x").unwrap();

        assert!(matches!(
            extract_document(&path),
            Err(ExtractionError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_key_phrases() {
        let text = "Cell Theory says cells divide. Mitosis and Cell Theory differ. The end. Ab";
        let phrases = key_phrases(text);
        assert_eq!(phrases, vec!["Cell Theory", "Mitosis"]);
        assert_eq!(
            capitalized_phrases(text),
            vec!["Cell Theory", "Mitosis", "The", "Ab"]
        );
    }
}
