//! DOCX package writer
//!
//! Produces the smallest WordprocessingML package Word and LibreOffice will
//! open: content types, package relationships, the main document part and a
//! styles part.
//!
//! Output is byte-for-byte reproducible: ZIP entries are written in a fixed
//! order with a fixed timestamp, and nothing is read from the clock.

use std::io::{Cursor, Write};

use quick_xml::{
    events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
    Writer,
};
use zip::{write::SimpleFileOptions, CompressionMethod, ZipWriter};

use super::types::{DocumentOptions, Section, SerializationError};

/// WordprocessingML main namespace
pub const WORDML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

pub(crate) const STYLE_TITLE: &str = "Title";
pub(crate) const STYLE_HEADING: &str = "Heading1";
pub(crate) const STYLE_META: &str = "OcrMeta";
pub(crate) const STYLE_NOTE: &str = "OcrNote";
pub(crate) const STYLE_SEPARATOR: &str = "OcrSeparator";

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/></Types>"#;

const PACKAGE_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

const DOCUMENT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#;

// Calibri 11pt body with 1.5 line spacing, blue level-1 headings, grey
// centered metadata line and red italic notes.
const STYLES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:docDefaults><w:rPrDefault><w:rPr><w:rFonts w:ascii="Calibri" w:hAnsi="Calibri" w:eastAsia="Calibri" w:cs="Calibri"/><w:sz w:val="22"/><w:szCs w:val="22"/></w:rPr></w:rPrDefault><w:pPrDefault><w:pPr><w:spacing w:after="120" w:line="360" w:lineRule="auto"/></w:pPr></w:pPrDefault></w:docDefaults><w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:qFormat/></w:style><w:style w:type="paragraph" w:styleId="Title"><w:name w:val="Title"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/><w:pPr><w:jc w:val="center"/></w:pPr><w:rPr><w:sz w:val="56"/><w:szCs w:val="56"/></w:rPr></w:style><w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/><w:pPr><w:keepNext/><w:spacing w:before="240" w:after="120"/><w:outlineLvl w:val="0"/></w:pPr><w:rPr><w:b/><w:color w:val="1F77B4"/><w:sz w:val="32"/><w:szCs w:val="32"/></w:rPr></w:style><w:style w:type="paragraph" w:customStyle="1" w:styleId="OcrMeta"><w:name w:val="OCR Metadata"/><w:basedOn w:val="Normal"/><w:pPr><w:jc w:val="center"/></w:pPr><w:rPr><w:color w:val="808080"/><w:sz w:val="20"/><w:szCs w:val="20"/></w:rPr></w:style><w:style w:type="paragraph" w:customStyle="1" w:styleId="OcrNote"><w:name w:val="OCR Note"/><w:basedOn w:val="Normal"/><w:rPr><w:i/><w:color w:val="FF0000"/></w:rPr></w:style><w:style w:type="paragraph" w:customStyle="1" w:styleId="OcrSeparator"><w:name w:val="OCR Separator"/><w:basedOn w:val="Normal"/><w:pPr><w:pBdr><w:bottom w:val="single" w:sz="6" w:space="1" w:color="auto"/></w:pBdr></w:pPr></w:style></w:styles>"#;

/// Builds a document byte stream from ordered sections
pub trait DocumentWriter: Send + Sync {
    fn build_document(&self, sections: &[Section]) -> Result<Vec<u8>, SerializationError>;
}

/// Office Open XML writer
#[derive(Debug, Clone, Default)]
pub struct DocxWriter {
    options: DocumentOptions,
}

impl DocxWriter {
    pub fn new(options: DocumentOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &DocumentOptions {
        &self.options
    }

    /// Render `word/document.xml`
    pub fn document_xml(&self, sections: &[Section]) -> Result<Vec<u8>, SerializationError> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));

        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;

        let mut document = BytesStart::new("w:document");
        document.push_attribute(("xmlns:w", WORDML_NS));
        writer.write_event(Event::Start(document))?;
        writer.write_event(Event::Start(BytesStart::new("w:body")))?;

        if let Some(ref title) = self.options.title {
            write_paragraph(&mut writer, Some(STYLE_TITLE), title)?;
        }
        if let Some(generated_at) = self.options.generated_at {
            let stamp = format!("Generated on: {}", generated_at.format("%Y-%m-%d %H:%M:%S"));
            write_paragraph(&mut writer, Some(STYLE_META), &stamp)?;
        }

        for (idx, section) in sections.iter().enumerate() {
            write_paragraph(&mut writer, Some(STYLE_HEADING), &section.heading)?;
            for paragraph in &section.paragraphs {
                write_paragraph(&mut writer, None, paragraph)?;
            }
            if let Some(ref note) = section.note {
                write_paragraph(&mut writer, Some(STYLE_NOTE), note)?;
            }
            if self.options.separators && idx + 1 < sections.len() {
                write_paragraph(&mut writer, Some(STYLE_SEPARATOR), "")?;
            }
        }

        write_section_properties(&mut writer)?;

        writer.write_event(Event::End(BytesEnd::new("w:body")))?;
        writer.write_event(Event::End(BytesEnd::new("w:document")))?;

        Ok(writer.into_inner().into_inner())
    }
}

impl DocumentWriter for DocxWriter {
    fn build_document(&self, sections: &[Section]) -> Result<Vec<u8>, SerializationError> {
        let document_xml = self.document_xml(sections)?;

        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(zip::DateTime::default());

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

        zip.start_file("[Content_Types].xml", options)?;
        zip.write_all(CONTENT_TYPES_XML.as_bytes())?;

        zip.start_file("_rels/.rels", options)?;
        zip.write_all(PACKAGE_RELS_XML.as_bytes())?;

        zip.start_file("word/document.xml", options)?;
        zip.write_all(&document_xml)?;

        zip.start_file("word/styles.xml", options)?;
        zip.write_all(STYLES_XML.as_bytes())?;

        zip.start_file("word/_rels/document.xml.rels", options)?;
        zip.write_all(DOCUMENT_RELS_XML.as_bytes())?;

        let bytes = zip.finish()?.into_inner();
        tracing::debug!(
            "Built DOCX package: {} sections, {} bytes",
            sections.len(),
            bytes.len()
        );
        Ok(bytes)
    }
}

fn write_paragraph<W: std::io::Write>(
    writer: &mut Writer<W>,
    style: Option<&str>,
    text: &str,
) -> Result<(), SerializationError> {
    writer.write_event(Event::Start(BytesStart::new("w:p")))?;

    if let Some(style) = style {
        writer.write_event(Event::Start(BytesStart::new("w:pPr")))?;
        let mut style_elem = BytesStart::new("w:pStyle");
        style_elem.push_attribute(("w:val", style));
        writer.write_event(Event::Empty(style_elem))?;
        writer.write_event(Event::End(BytesEnd::new("w:pPr")))?;
    }

    let text = xml_safe(text);
    if !text.is_empty() {
        writer.write_event(Event::Start(BytesStart::new("w:r")))?;
        // Tabs are run content of their own, not text
        for (i, piece) in text.split('\t').enumerate() {
            if i > 0 {
                writer.write_event(Event::Empty(BytesStart::new("w:tab")))?;
            }
            if piece.is_empty() {
                continue;
            }
            let mut t = BytesStart::new("w:t");
            t.push_attribute(("xml:space", "preserve"));
            writer.write_event(Event::Start(t))?;
            writer.write_event(Event::Text(BytesText::new(piece)))?;
            writer.write_event(Event::End(BytesEnd::new("w:t")))?;
        }
        writer.write_event(Event::End(BytesEnd::new("w:r")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("w:p")))?;
    Ok(())
}

/// US Letter with one-inch margins
fn write_section_properties<W: std::io::Write>(
    writer: &mut Writer<W>,
) -> Result<(), SerializationError> {
    writer.write_event(Event::Start(BytesStart::new("w:sectPr")))?;

    let mut size = BytesStart::new("w:pgSz");
    size.push_attribute(("w:w", "12240"));
    size.push_attribute(("w:h", "15840"));
    writer.write_event(Event::Empty(size))?;

    let mut margins = BytesStart::new("w:pgMar");
    for (side, value) in [
        ("w:top", "1440"),
        ("w:right", "1440"),
        ("w:bottom", "1440"),
        ("w:left", "1440"),
        ("w:header", "720"),
        ("w:footer", "720"),
        ("w:gutter", "0"),
    ] {
        margins.push_attribute((side, value));
    }
    writer.write_event(Event::Empty(margins))?;

    writer.write_event(Event::End(BytesEnd::new("w:sectPr")))?;
    Ok(())
}

/// Drop characters XML 1.0 cannot carry; line breaks become spaces
fn xml_safe(text: &str) -> String {
    text.chars()
        .filter_map(|c| match c {
            '\t' => Some('\t'),
            '\n' | '\r' => Some(' '),
            c if (c as u32) < 0x20 => None,
            '\u{FFFE}' | '\u{FFFF}' => None,
            c => Some(c),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io::Read;

    fn sample() -> Vec<Section> {
        vec![
            Section::new("a.png", vec!["Hello".to_string()]),
            Section::new("empty.bmp", vec![]).with_note("No text extracted from this image."),
        ]
    }

    #[test]
    fn test_document_xml_structure() {
        let writer = DocxWriter::default();
        let xml = String::from_utf8(writer.document_xml(&sample()).unwrap()).unwrap();

        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>"));
        assert!(xml.contains(r#"<w:pStyle w:val="Title"/>"#));
        assert!(xml.contains(">OCR Extracted Text</w:t>"));
        assert!(xml.contains(r#"<w:pStyle w:val="Heading1"/></w:pPr><w:r><w:t xml:space="preserve">a.png</w:t>"#));
        assert!(xml.contains(r#"<w:pStyle w:val="OcrNote"/>"#));
        assert!(!xml.contains("OcrMeta"));
        assert!(xml.ends_with("</w:body></w:document>"));
    }

    #[test]
    fn test_escapes_markup() {
        let writer = DocxWriter::new(DocumentOptions {
            title: None,
            ..DocumentOptions::default()
        });
        let sections = vec![Section::new("<b>&.png", vec!["x < y & \"z\"\u{7}".to_string()])];
        let xml = String::from_utf8(writer.document_xml(&sections).unwrap()).unwrap();

        assert!(xml.contains("&lt;b&gt;&amp;.png"));
        assert!(xml.contains("x &lt; y &amp;"));
        assert!(!xml.contains('\u{7}'));
        assert!(!xml.contains("Title"));
    }

    #[test]
    fn test_tabs_become_tab_elements() {
        let writer = DocxWriter::default();
        let sections = vec![Section::new("t.png", vec!["Qty\tPrice\t".to_string()])];
        let xml = String::from_utf8(writer.document_xml(&sections).unwrap()).unwrap();

        assert!(xml.contains(
            r#"<w:r><w:t xml:space="preserve">Qty</w:t><w:tab/><w:t xml:space="preserve">Price</w:t><w:tab/></w:r>"#
        ));
        assert!(!xml.contains('\t'));
    }

    #[test]
    fn test_timestamp_and_separators() {
        let writer = DocxWriter::new(DocumentOptions {
            generated_at: Some(chrono::Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap()),
            separators: true,
            ..DocumentOptions::default()
        });
        let xml = String::from_utf8(writer.document_xml(&sample()).unwrap()).unwrap();

        assert!(xml.contains("Generated on: 2024-03-01 09:30:00"));
        // one separator between two sections, none after the last
        assert_eq!(xml.matches(r#"w:val="OcrSeparator""#).count(), 1);
    }

    #[test]
    fn test_package_parts() {
        let bytes = DocxWriter::default().build_document(&sample()).unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();

        let names: Vec<String> = archive.file_names().map(str::to_string).collect();
        for part in [
            "[Content_Types].xml",
            "_rels/.rels",
            "word/document.xml",
            "word/styles.xml",
            "word/_rels/document.xml.rels",
        ] {
            assert!(names.iter().any(|n| n == part), "missing {}", part);
        }

        let mut styles = String::new();
        archive
            .by_name("word/styles.xml")
            .unwrap()
            .read_to_string(&mut styles)
            .unwrap();
        assert!(styles.contains(r#"w:styleId="Heading1""#));
    }

    #[test]
    fn test_build_is_deterministic() {
        let writer = DocxWriter::default();
        let first = writer.build_document(&sample()).unwrap();
        let second = writer.build_document(&sample()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_xml_safe() {
        assert_eq!(xml_safe("a\tb\nc"), "a\tb c");
        assert_eq!(xml_safe("form\u{c}feed"), "formfeed");
        assert_eq!(xml_safe("ünïcødé"), "ünïcødé");
    }
}
