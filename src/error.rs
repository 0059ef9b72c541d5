//! Error types for the extraction pipeline

use thiserror::Error;

use crate::docx::SerializationError;

/// Pipeline-wide result type
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Batch-level pipeline errors
///
/// Per-image OCR failures are not represented here: they are recorded on the
/// affected `ExtractionResult` and the batch carries on.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Unsupported format '{format}' for image {index} ({name})")]
    UnsupportedFormat {
        index: usize,
        name: String,
        format: String,
    },

    #[error("Corrupt image {index} ({name}): {reason}")]
    CorruptImage {
        index: usize,
        name: String,
        reason: String,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] SerializationError),

    #[error("Batch cancelled")]
    Cancelled,
}

impl PipelineError {
    /// Index of the offending image, for input errors
    pub fn image_index(&self) -> Option<usize> {
        match self {
            Self::UnsupportedFormat { index, .. } | Self::CorruptImage { index, .. } => Some(*index),
            _ => None,
        }
    }

    /// Display name of the offending image, for input errors
    pub fn image_name(&self) -> Option<&str> {
        match self {
            Self::UnsupportedFormat { name, .. } | Self::CorruptImage { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Whether the caller can fix this by changing the uploaded files
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::UnsupportedFormat { .. } | Self::CorruptImage { .. })
    }
}
