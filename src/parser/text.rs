use std::path::Path;

use super::ExtractionError;

/// Read a text file as UTF-8, decoding it as Latin-1 when it is not valid
/// UTF-8.
pub(crate) fn extract_txt(path: &Path) -> Result<String, ExtractionError> {
    let bytes = std::fs::read(path)
        .map_err(|e| ExtractionError::ExtractionFailure(format!("Error processing TXT: {}", e)))?;

    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(e) => Ok(decode_latin1(e.as_bytes())),
    }
}

/// Every byte maps to the code point of the same value.
fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf8_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "Théorie cellulaire").unwrap();

        assert_eq!(extract_txt(&path).unwrap(), "Théorie cellulaire");
    }

    #[test]
    fn test_latin1_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        // "café" in Latin-1: 0xE9 alone is invalid UTF-8.
        std::fs::write(&path, [b'c', b'a', b'f', 0xE9]).unwrap();

        assert_eq!(extract_txt(&path).unwrap(), "café");
    }

    #[test]
    fn test_missing_file_is_extraction_failure() {
        let dir = tempfile::tempdir().unwrap();
        let err = extract_txt(&dir.path().join("missing.txt")).unwrap_err();
        assert!(matches!(err, ExtractionError::ExtractionFailure(_)));
    }
}
