//! Parse-back checks for produced documents.

use crate::font::winansi_to_char;
use lopdf::Document as LoDocument;
use lopdf::Object as LoObject;
use lopdf::content::Content;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PdfInspectErrorCode {
    PdfParseFailed,
    PdfEncryptedUnsupported,
    PdfEmptyOrNoPages,
    PdfIoError,
}

impl PdfInspectErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PdfInspectErrorCode::PdfParseFailed => "PDF_PARSE_FAILED",
            PdfInspectErrorCode::PdfEncryptedUnsupported => "PDF_ENCRYPTED_UNSUPPORTED",
            PdfInspectErrorCode::PdfEmptyOrNoPages => "PDF_EMPTY_OR_NO_PAGES",
            PdfInspectErrorCode::PdfIoError => "PDF_IO_ERROR",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfInspectError {
    pub code: PdfInspectErrorCode,
    pub message: String,
}

impl std::fmt::Display for PdfInspectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for PdfInspectError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfInspectReport {
    pub pdf_version: String,
    pub page_count: usize,
    pub encrypted: bool,
    pub file_size_bytes: usize,
    pub title: Option<String>,
    /// Strings shown with `Tj`, per page in page order.
    pub page_text: Vec<Vec<String>>,
}

impl PdfInspectReport {
    pub fn contains_text(&self, needle: &str) -> bool {
        self.page_text
            .iter()
            .flatten()
            .any(|run| run.as_str() == needle)
    }

    /// Fails unless the document can be handed to a preview surface.
    pub fn require_previewable(&self) -> Result<(), PdfInspectError> {
        if self.encrypted {
            return Err(PdfInspectError {
                code: PdfInspectErrorCode::PdfEncryptedUnsupported,
                message: "encrypted pdf is not supported".to_string(),
            });
        }
        if self.page_count == 0 {
            return Err(PdfInspectError {
                code: PdfInspectErrorCode::PdfEmptyOrNoPages,
                message: "pdf has no pages".to_string(),
            });
        }
        Ok(())
    }
}

pub fn inspect_pdf_bytes(bytes: &[u8]) -> Result<PdfInspectReport, PdfInspectError> {
    let pdf = LoDocument::load_mem(bytes).map_err(|err| PdfInspectError {
        code: PdfInspectErrorCode::PdfParseFailed,
        message: err.to_string(),
    })?;

    let pages = pdf.get_pages();
    let mut page_text = Vec::with_capacity(pages.len());
    for page_id in pages.values() {
        let content = pdf
            .get_page_content(*page_id)
            .and_then(|raw| Content::decode(&raw))
            .map_err(|err| PdfInspectError {
                code: PdfInspectErrorCode::PdfParseFailed,
                message: format!("page content: {err}"),
            })?;
        let runs = content
            .operations
            .iter()
            .filter(|op| op.operator == "Tj")
            .filter_map(|op| match op.operands.first() {
                Some(LoObject::String(bytes, _)) => Some(decode_winansi(bytes)),
                _ => None,
            })
            .collect();
        page_text.push(runs);
    }

    Ok(PdfInspectReport {
        pdf_version: pdf.version.clone(),
        page_count: pages.len(),
        encrypted: pdf.is_encrypted(),
        file_size_bytes: bytes.len(),
        title: document_title(&pdf),
        page_text,
    })
}

pub fn inspect_pdf_path(path: &Path) -> Result<PdfInspectReport, PdfInspectError> {
    let data = std::fs::read(path).map_err(|err| PdfInspectError {
        code: PdfInspectErrorCode::PdfIoError,
        message: err.to_string(),
    })?;
    inspect_pdf_bytes(&data)
}

fn document_title(pdf: &LoDocument) -> Option<String> {
    let info_id = pdf.trailer.get(b"Info").ok()?.as_reference().ok()?;
    let info = pdf.get_dictionary(info_id).ok()?;
    match info.get(b"Title").ok()? {
        LoObject::String(bytes, _) => Some(decode_winansi(bytes)),
        _ => None,
    }
}

fn decode_winansi(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|byte| winansi_to_char(*byte).unwrap_or('?'))
        .collect()
}
