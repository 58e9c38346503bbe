//! Whole-file document formats: one file becomes one row

use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::{Error, Result};
use crate::types::{Column, CorpusHeader, DataType, FileReference, Table, Value};

/// Column holding the document text
pub const DOCUMENT_HEADER: &str = "document";
/// Column holding the file name without extension
pub const FILENAME_HEADER: &str = "filename";
/// Column holding the logical file path
pub const FILEPATH_HEADER: &str = "filepath";

/// Text extraction for a document format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DocumentKind {
    Txt,
    Docx,
    Odt,
}

/// Fixed headers proposed for every document file
pub(crate) fn headers() -> Vec<CorpusHeader> {
    vec![
        CorpusHeader::new(DOCUMENT_HEADER, DataType::Text),
        CorpusHeader::new(FILENAME_HEADER, DataType::Text),
        CorpusHeader::new(FILEPATH_HEADER, DataType::Category),
    ]
}

/// One-row table for the included headers. The file is only read when the
/// document column is included.
pub(crate) fn load(file: &FileReference, kind: DocumentKind, headers: &[CorpusHeader]) -> Result<Table> {
    let mut columns = Vec::new();
    for header in headers.iter().filter(|h| h.include) {
        let raw = match header.name.as_str() {
            DOCUMENT_HEADER => extract_text(file, kind)?,
            FILENAME_HEADER => file.filename_no_ext().to_string(),
            FILEPATH_HEADER => file.path().to_string(),
            other => {
                return Err(Error::load(file.path(), format!("column '{}' not found", other)));
            }
        };
        let value = Value::Text(raw).cast(header.datatype).map_err(|e| {
            Error::load(file.path(), format!("column '{}': {}", header.name, e))
        })?;
        columns.push(Column::new(header.name.clone(), header.datatype, vec![value]));
    }
    Table::with_rows(columns, 1)
}

fn extract_text(file: &FileReference, kind: DocumentKind) -> Result<String> {
    let bytes = file.read_bytes()?;
    let text = match kind {
        DocumentKind::Txt => String::from_utf8(bytes).map_err(|_| Error::encoding(file.path()))?,
        DocumentKind::Docx => docx_text(&bytes).map_err(|e| Error::load(file.path(), e))?,
        DocumentKind::Odt => odt_text(&bytes).map_err(|e| Error::load(file.path(), e))?,
    };
    tracing::debug!("Extracted {} characters from {}", text.len(), file.path());
    Ok(text)
}

/// Paragraph text of a DOCX document, one line per paragraph
fn docx_text(bytes: &[u8]) -> std::result::Result<String, String> {
    let doc = docx_rs::read_docx(bytes).map_err(|e| e.to_string())?;

    let mut paragraphs = Vec::new();
    for child in doc.document.children {
        if let docx_rs::DocumentChild::Paragraph(p) = child {
            let mut text = String::new();
            for child in p.children {
                if let docx_rs::ParagraphChild::Run(run) = child {
                    for child in run.children {
                        match child {
                            docx_rs::RunChild::Text(t) => text.push_str(&t.text),
                            docx_rs::RunChild::Tab(_) => text.push('\t'),
                            docx_rs::RunChild::Break(_) => text.push('\n'),
                            _ => {}
                        }
                    }
                }
            }
            paragraphs.push(text);
        }
    }
    Ok(paragraphs.join("\n"))
}

/// Paragraph and heading text of an ODT document, one line per paragraph
fn odt_text(bytes: &[u8]) -> std::result::Result<String, String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| e.to_string())?;
    let mut xml = String::new();
    archive
        .by_name("content.xml")
        .map_err(|e| e.to_string())?
        .read_to_string(&mut xml)
        .map_err(|e| e.to_string())?;

    let mut reader = Reader::from_str(&xml);
    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if matches!(e.local_name().as_ref(), b"p" | b"h") {
                    depth += 1;
                }
            }
            Ok(Event::Empty(e)) => {
                if depth > 0 {
                    match e.local_name().as_ref() {
                        b"s" => {
                            let count = e
                                .try_get_attribute("text:c")
                                .ok()
                                .flatten()
                                .and_then(|a| String::from_utf8_lossy(&a.value).parse::<usize>().ok())
                                .unwrap_or(1);
                            current.push_str(&" ".repeat(count));
                        }
                        b"tab" => current.push('\t'),
                        b"line-break" => current.push('\n'),
                        _ => {}
                    }
                } else if matches!(e.local_name().as_ref(), b"p" | b"h") {
                    paragraphs.push(String::new());
                }
            }
            Ok(Event::Text(e)) => {
                if depth > 0 {
                    let text = e.unescape().map_err(|e| e.to_string())?;
                    current.push_str(&text);
                }
            }
            Ok(Event::End(e)) => {
                if matches!(e.local_name().as_ref(), b"p" | b"h") && depth > 0 {
                    depth -= 1;
                    if depth == 0 {
                        paragraphs.push(std::mem::take(&mut current));
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.to_string()),
            _ => {}
        }
    }
    Ok(paragraphs.join("\n"))
}
