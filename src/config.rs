//! Configuration management for the extraction pipeline

use serde::Deserialize;
use std::env;

use crate::docx::DocumentOptions;
use crate::ocr::OcrProvider;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub ocr: OcrConfig,
    /// Maximum number of images recognized at the same time
    pub max_concurrency: usize,
    pub document: DocumentOptions,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    pub provider: OcrProvider,
    pub language: String,
    pub tesseract_binary: String,
    pub ollama_url: String,
    pub ollama_model: String,
    /// Per-image recognition timeout (0 disables)
    pub timeout_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            ocr: OcrConfig::default(),
            max_concurrency: 4,
            document: DocumentOptions::default(),
        }
    }
}

impl Default for OcrConfig {
    fn default() -> Self {
        OcrConfig {
            provider: OcrProvider::Tesseract,
            language: "eng".to_string(),
            tesseract_binary: "tesseract".to_string(),
            ollama_url: "http://localhost:11434".to_string(),
            ollama_model: "llava".to_string(),
            timeout_secs: 120,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    ///
    /// Unset keys keep their defaults; set but unparsable keys are errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = PipelineConfig::default();

        let provider = match lookup("OCR_PROVIDER") {
            Some(value) => OcrProvider::from_name(&value).ok_or(ConfigError::Invalid {
                key: "OCR_PROVIDER",
                value,
            })?,
            None => defaults.ocr.provider,
        };

        Ok(PipelineConfig {
            ocr: OcrConfig {
                provider,
                language: lookup("OCR_LANGUAGE").unwrap_or(defaults.ocr.language),
                tesseract_binary: lookup("TESSERACT_BINARY")
                    .unwrap_or(defaults.ocr.tesseract_binary),
                ollama_url: lookup("OLLAMA_URL").unwrap_or(defaults.ocr.ollama_url),
                ollama_model: lookup("OLLAMA_MODEL").unwrap_or(defaults.ocr.ollama_model),
                timeout_secs: parse_or(&lookup, "OCR_TIMEOUT_SECS", defaults.ocr.timeout_secs)?,
            },
            max_concurrency: parse_or(&lookup, "OCR_MAX_CONCURRENCY", defaults.max_concurrency)?
                .max(1),
            document: DocumentOptions {
                title: match lookup("OCR_DOCUMENT_TITLE") {
                    Some(title) if title.trim().is_empty() => None,
                    Some(title) => Some(title),
                    None => defaults.document.title,
                },
                number_headings: parse_or(
                    &lookup,
                    "OCR_NUMBER_HEADINGS",
                    defaults.document.number_headings,
                )?,
                separators: parse_or(&lookup, "OCR_SEPARATORS", defaults.document.separators)?,
                generated_at: None,
            },
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}
