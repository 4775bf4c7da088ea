//! Text extraction from structured documents (DOCX, PDF).
//!
//! Each document is reduced to a list of units (paragraphs or pages) which are
//! joined with single spaces in their original order.

use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

/// Part of a DOCX package holding the body text
const DOCX_BODY: &str = "word/document.xml";

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("failed to open document: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid docx archive: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("invalid docx xml: {0}")]
    Xml(String),
    #[error("failed to extract pdf text: {0}")]
    Pdf(String),
}

/// Structured formats recognised by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Docx,
    Pdf,
}

impl DocumentKind {
    /// Detect from the file extension, ignoring case
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "docx" => Some(DocumentKind::Docx),
            "pdf" => Some(DocumentKind::Pdf),
            _ => None,
        }
    }

    pub fn extract(self, path: &Path) -> Result<String, DocumentError> {
        let units = match self {
            DocumentKind::Docx => docx_paragraphs(path)?,
            DocumentKind::Pdf => pdf_pages(path)?,
        };
        tracing::debug!(kind = ?self, units = units.len(), "extracted document");
        Ok(join_units(&units))
    }
}

/// Join extracted units with single spaces, preserving order
pub fn join_units<S: AsRef<str>>(units: &[S]) -> String {
    units
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Paragraph texts of a DOCX file, in document order
pub fn docx_paragraphs(path: &Path) -> Result<Vec<String>, DocumentError> {
    let file = std::fs::File::open(path)?;
    let mut archive = zip::ZipArchive::new(file)?;
    let mut xml = String::new();
    archive.by_name(DOCX_BODY)?.read_to_string(&mut xml)?;
    paragraphs_from_xml(&xml)
}

/// Walk WordprocessingML and collect the text of every `w:p`.
///
/// Text comes from `w:t` runs; `w:tab` and `w:br` become a tab and a newline.
/// Paragraphs nested in text boxes are collected on their own, ahead of the
/// paragraph that anchors them, and never cut into that paragraph's text.
/// The VML copy of a text box under `mc:Fallback` is skipped. Table cell
/// paragraphs are collected in document order like body paragraphs.
pub fn paragraphs_from_xml(xml: &str) -> Result<Vec<String>, DocumentError> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs = Vec::new();
    // innermost open paragraph last
    let mut open: Vec<String> = Vec::new();
    let mut in_text = false;
    let mut fallback_depth = 0usize;

    loop {
        let event = reader.read_event().map_err(xml_error)?;
        if fallback_depth > 0 {
            match &event {
                Event::Start(e) if e.name().as_ref() == b"mc:Fallback" => fallback_depth += 1,
                Event::End(e) if e.name().as_ref() == b"mc:Fallback" => fallback_depth -= 1,
                Event::Eof => break,
                _ => {}
            }
            continue;
        }

        match event {
            Event::Start(e) => match e.name().as_ref() {
                b"w:p" => open.push(String::new()),
                b"w:t" => in_text = true,
                b"mc:Fallback" => fallback_depth = 1,
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"w:p" => paragraphs.push(String::new()),
                b"w:tab" => push_to(&mut open, "\t"),
                b"w:br" | b"w:cr" => push_to(&mut open, "\n"),
                _ => {}
            },
            Event::Text(t) if in_text => {
                let text = t.decode().map_err(xml_error)?;
                push_to(&mut open, &text);
            }
            Event::GeneralRef(r) if in_text => {
                if let Some(ch) = r.resolve_char_ref().map_err(xml_error)? {
                    let mut buf = [0u8; 4];
                    push_to(&mut open, ch.encode_utf8(&mut buf));
                } else {
                    let name = r.decode().map_err(xml_error)?;
                    if let Some(resolved) = quick_xml::escape::resolve_predefined_entity(&name) {
                        push_to(&mut open, resolved);
                    }
                }
            }
            Event::End(e) => match e.name().as_ref() {
                b"w:p" => {
                    if let Some(paragraph) = open.pop() {
                        paragraphs.push(paragraph);
                    }
                }
                b"w:t" => in_text = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs)
}

fn push_to(open: &mut [String], text: &str) {
    if let Some(paragraph) = open.last_mut() {
        paragraph.push_str(text);
    }
}

fn xml_error<E: std::fmt::Display>(e: E) -> DocumentError {
    DocumentError::Xml(e.to_string())
}

/// Text of each PDF page, in page order.
///
/// Leading and trailing layout whitespace is trimmed from every page.
pub fn pdf_pages(path: &Path) -> Result<Vec<String>, DocumentError> {
    let pages =
        pdf_extract::extract_text_by_pages(path).map_err(|e| DocumentError::Pdf(e.to_string()))?;
    Ok(pages.iter().map(|page| page.trim().to_string()).collect())
}
