//! OCR Types
//!
//! Defines the provider kinds and error type for OCR backends.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// OCR provider type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OcrProvider {
    /// Tesseract OCR (local binary)
    Tesseract,
    /// Ollama vision model (local LLM)
    Ollama,
    /// Engine supplied by the embedding application
    Custom,
}

impl Default for OcrProvider {
    fn default() -> Self {
        Self::Tesseract
    }
}

impl OcrProvider {
    /// Parse a provider name as used in configuration
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "tesseract" => Some(Self::Tesseract),
            "ollama" => Some(Self::Ollama),
            "custom" => Some(Self::Custom),
            _ => None,
        }
    }
}

/// OCR error types
#[derive(Debug, Clone, thiserror::Error)]
pub enum OcrError {
    #[error("OCR provider not available: {0}")]
    ProviderNotAvailable(String),

    #[error("OCR handle has not been initialized")]
    NotInitialized,

    #[error("OCR handle has been shut down")]
    ShutDown,

    #[error("Failed to encode image for OCR: {0}")]
    ImageEncoding(String),

    #[error("OCR processing failed: {0}")]
    ProcessingError(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("OCR timed out after {0:?}")]
    Timeout(Duration),
}

/// Split raw recognized text into trimmed, non-empty lines in reading order
pub fn split_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_lines() {
        assert_eq!(
            split_lines("  Hello \r\n\n World\n\x0c"),
            vec!["Hello".to_string(), "World".to_string()]
        );
        assert!(split_lines("").is_empty());
        assert!(split_lines("\n  \n").is_empty());
    }

    #[test]
    fn test_timeout_message_keeps_subsecond_limits() {
        let err = OcrError::Timeout(Duration::from_millis(200));
        assert_eq!(err.to_string(), "OCR timed out after 200ms");
    }

    #[test]
    fn test_provider_from_name() {
        assert_eq!(OcrProvider::from_name("Tesseract"), Some(OcrProvider::Tesseract));
        assert_eq!(OcrProvider::from_name(" ollama "), Some(OcrProvider::Ollama));
        assert_eq!(OcrProvider::from_name("easyocr"), None);
    }
}
