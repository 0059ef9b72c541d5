//! OCR Extractor Library
//!
//! Turns a batch of uploaded images into a Word document of their text.
//!
//! # Modules
//!
//! - `input`: Accepted image formats, upload records and decoding
//! - `ocr`: OCR engines (Tesseract, Ollama) behind a lifecycle-managed handle
//! - `pipeline`: Batch validation, recognition and export
//! - `docx`: Office Open XML writer and reader
//! - `config`: Pipeline configuration

pub mod config;
pub mod docx;
pub mod error;
pub mod input;
pub mod ocr;
pub mod pipeline;

pub use config::PipelineConfig;
pub use error::{PipelineError, Result};
pub use input::{ImageFormat, ImageInput};
pub use pipeline::{ExportedDocument, ExtractionBatch, ExtractionPipeline, ExtractionResult};
