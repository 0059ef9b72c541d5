//! OCR Module
//!
//! Provides the optical character recognition capability used by the
//! extraction pipeline. The pipeline only relies on one contract: a decoded
//! image goes in, recognized lines in reading order come out.
//!
//! Supports multiple backends:
//! - Tesseract (local binary)
//! - Ollama vision models (local LLM)
//! - Any embedder-supplied `OcrEngine`
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ocr_extractor::ocr::{OcrHandle, TesseractProvider};
//!
//! let handle = OcrHandle::new(Arc::new(TesseractProvider::default()));
//! handle.initialize().await?;
//! let lines = handle.recognize(&image).await?;
//! handle.shutdown();
//! ```

mod handle;
mod provider;
mod types;

pub use handle::{HandleState, HandleStats, OcrHandle};
pub use provider::{encode_png, OcrEngine, OllamaProvider, TesseractProvider};
pub use types::{split_lines, OcrError, OcrProvider};

#[cfg(test)]
pub(crate) use provider::mock::MockEngine;
