//! Batch text extraction
//!
//! Image ingestion → OCR → per-image aggregation → document assembly.

mod service;
mod types;

pub use service::{ExtractionPipeline, DEFAULT_MAX_CONCURRENCY};
pub use types::{
    BatchSummary, ExportedDocument, ExtractionBatch, ExtractionOutcome, ExtractionResult,
    FailedImage, NO_TEXT_PLACEHOLDER,
};
