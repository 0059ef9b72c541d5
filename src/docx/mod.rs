//! Word document export
//!
//! Writes ordered sections (heading + paragraphs) into an Office Open XML
//! package and reads such packages back.

mod reader;
mod types;
mod writer;

pub use reader::{read_document, read_sections};
pub use types::{DocumentOptions, DocxContents, Section, SerializationError, DEFAULT_TITLE};
pub use writer::{DocumentWriter, DocxWriter, WORDML_NS};
