//! Document model and writer types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Title used when no other is configured
pub const DEFAULT_TITLE: &str = "OCR Extracted Text";

/// One heading with the paragraphs that follow it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub heading: String,
    /// Body paragraphs, one per recognized line
    pub paragraphs: Vec<String>,
    /// Emphasized remark rendered after the paragraphs (placeholders, failures)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Section {
    pub fn new(heading: impl Into<String>, paragraphs: Vec<String>) -> Self {
        Self {
            heading: heading.into(),
            paragraphs,
            note: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Document-level presentation options
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DocumentOptions {
    /// Title paragraph at the top of the document
    pub title: Option<String>,
    /// Generation time printed under the title
    ///
    /// Never filled in from the clock by the writer, so output stays
    /// reproducible unless the caller opts in.
    pub generated_at: Option<DateTime<Utc>>,
    /// Prefix headings with "Image N: "
    pub number_headings: bool,
    /// Separator rule between sections
    pub separators: bool,
}

impl Default for DocumentOptions {
    fn default() -> Self {
        Self {
            title: Some(DEFAULT_TITLE.to_string()),
            generated_at: None,
            number_headings: false,
            separators: false,
        }
    }
}

/// Document contents as read back from a package
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocxContents {
    pub title: Option<String>,
    pub sections: Vec<Section>,
}

/// Errors while writing or reading a document package
#[derive(Debug, Error)]
pub enum SerializationError {
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed document: {0}")]
    Malformed(String),
}

impl From<quick_xml::events::attributes::AttrError> for SerializationError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        SerializationError::Xml(err.into())
    }
}
