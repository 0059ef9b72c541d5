//! DOCX section reader
//!
//! Reads a package produced by `DocxWriter` back into sections. Paragraph
//! roles are recovered from their style: `Heading1` starts a section,
//! `OcrNote` is the section note, unstyled paragraphs are body text.

use std::io::{Cursor, Read};

use quick_xml::{events::Event, Reader};
use zip::ZipArchive;

use super::types::{DocxContents, Section, SerializationError};
use super::writer::{STYLE_HEADING, STYLE_NOTE, STYLE_TITLE};

/// Read the title and sections of a document
pub fn read_document(bytes: &[u8]) -> Result<DocxContents, SerializationError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;

    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|_| SerializationError::Malformed("missing word/document.xml".to_string()))?
        .read_to_string(&mut xml)?;

    let mut contents = DocxContents::default();
    for (style, text) in paragraphs(&xml)? {
        match style.as_deref() {
            Some(STYLE_TITLE) => contents.title = Some(text),
            Some(STYLE_HEADING) => contents.sections.push(Section::new(text, Vec::new())),
            Some(STYLE_NOTE) => {
                if let Some(section) = contents.sections.last_mut() {
                    section.note = Some(text);
                }
            }
            Some(_) => {}
            None => {
                if let Some(section) = contents.sections.last_mut() {
                    section.paragraphs.push(text);
                }
            }
        }
    }

    Ok(contents)
}

/// Read only the sections of a document
pub fn read_sections(bytes: &[u8]) -> Result<Vec<Section>, SerializationError> {
    Ok(read_document(bytes)?.sections)
}

/// Flatten `word/document.xml` into (style, text) pairs in document order
fn paragraphs(xml: &str) -> Result<Vec<(Option<String>, String)>, SerializationError> {
    let mut reader = Reader::from_str(xml);
    let mut result = Vec::new();

    let mut current: Option<(Option<String>, String)> = None;
    let mut in_run = false;
    let mut in_text = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.name().as_ref() {
                b"w:p" => current = Some((None, String::new())),
                b"w:r" => in_run = true,
                b"w:t" => in_text = true,
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"w:pStyle" => {
                    if let (Some(paragraph), Some(attr)) =
                        (current.as_mut(), e.try_get_attribute("w:val")?)
                    {
                        paragraph.0 = Some(attr.unescape_value()?.into_owned());
                    }
                }
                b"w:p" => result.push((None, String::new())),
                b"w:tab" if in_run => {
                    if let Some(paragraph) = current.as_mut() {
                        paragraph.1.push('\t');
                    }
                }
                _ => {}
            },
            Event::Text(t) if in_text => {
                if let Some(paragraph) = current.as_mut() {
                    paragraph.1.push_str(&t.unescape()?);
                }
            }
            Event::End(e) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:r" => in_run = false,
                b"w:p" => {
                    let paragraph = current.take().ok_or_else(|| {
                        SerializationError::Malformed("unbalanced paragraph".to_string())
                    })?;
                    result.push(paragraph);
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::{DocumentOptions, DocumentWriter, DocxWriter};

    #[test]
    fn test_reads_back_written_sections() {
        let sections = vec![
            Section::new("a.png", vec!["Hello".to_string()]),
            Section::new("b.png", vec!["World".to_string(), "Foo".to_string()]),
            Section::new("c.png", vec![]).with_note("No text extracted from this image."),
        ];
        let writer = DocxWriter::new(DocumentOptions {
            separators: true,
            ..DocumentOptions::default()
        });
        let bytes = writer.build_document(&sections).unwrap();

        let contents = read_document(&bytes).unwrap();
        assert_eq!(contents.title.as_deref(), Some("OCR Extracted Text"));
        assert_eq!(contents.sections, sections);
    }

    #[test]
    fn test_unescapes_text() {
        let sections = vec![Section::new("x&y.png", vec!["1 < 2".to_string()])];
        let bytes = DocxWriter::default().build_document(&sections).unwrap();
        assert_eq!(read_sections(&bytes).unwrap(), sections);
    }

    #[test]
    fn test_keeps_tabs() {
        let sections = vec![Section::new(
            "invoice.png",
            vec!["Item\tQty\tPrice".to_string(), "\tindented".to_string()],
        )];
        let bytes = DocxWriter::default().build_document(&sections).unwrap();
        assert_eq!(read_sections(&bytes).unwrap(), sections);
    }

    #[test]
    fn test_rejects_non_zip() {
        assert!(matches!(
            read_sections(b"plain text"),
            Err(SerializationError::Zip(_))
        ));
    }

    #[test]
    fn test_rejects_zip_without_document_part() {
        use std::io::Write;
        use zip::{write::SimpleFileOptions, ZipWriter};

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file("hello.txt", SimpleFileOptions::default()).unwrap();
        zip.write_all(b"hi").unwrap();
        let bytes = zip.finish().unwrap().into_inner();

        assert!(matches!(
            read_sections(&bytes),
            Err(SerializationError::Malformed(_))
        ));
    }
}
