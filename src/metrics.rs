use crate::canvas::Document;
use crate::error::InvoiceError;
use crate::layout::META_ROW;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageMetrics {
    pub page_number: usize,
    pub command_count: usize,
    pub row_count: usize,
    pub content_bytes: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentMetrics {
    pub pages: Vec<PageMetrics>,
    pub layout_ms: f64,
    pub total_bytes: usize,
}

impl DocumentMetrics {
    /// Collects per-page counters. Serializes the document if that has not
    /// happened yet.
    pub fn collect(document: &Document, layout_ms: f64) -> Result<Self, InvoiceError> {
        let serialized = document.serialized()?;
        let pages = document
            .pages()
            .iter()
            .enumerate()
            .map(|(index, page)| PageMetrics {
                page_number: index + 1,
                command_count: page.commands.len(),
                row_count: page.meta_count(META_ROW),
                content_bytes: serialized.content_bytes.get(index).copied().unwrap_or(0),
            })
            .collect();
        Ok(Self {
            pages,
            layout_ms,
            total_bytes: serialized.bytes.len(),
        })
    }

    pub fn total_rows(&self) -> usize {
        self.pages.iter().map(|page| page.row_count).sum()
    }
}
