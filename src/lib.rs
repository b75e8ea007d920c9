mod assembler;
mod canvas;
mod debug;
mod error;
mod font;
mod format;
mod frame;
mod inspect;
mod layout;
mod metrics;
mod model;
mod page_template;
mod pdf;
mod totals;
mod types;

pub use assembler::DocumentAssembler;
use base64::Engine;
pub use canvas::{Canvas, Command, Document, Page, TextStyle};
use debug::{DebugCounters, DebugLogger};
pub use error::{ErrorClass, InvoiceError};
pub use font::{FontFace, FontId, FontSet, WinAnsiText, encode_winansi};
pub use format::{
    CurrencyFormat, DateStyle, Grouping, InvoiceFormatter, LocaleFormatter, round_half_up,
};
pub use frame::Frame;
pub use inspect::{
    PdfInspectError, PdfInspectErrorCode, PdfInspectReport, inspect_pdf_bytes, inspect_pdf_path,
};
pub use layout::{
    Align, BreakReason, Column, InvoiceLayout, LayoutReport, PageBreak, table_columns,
};
pub use metrics::{DocumentMetrics, PageMetrics};
pub use model::{
    Client, FALLBACK_INVOICE_NUMBER, InvoiceData, InvoiceStatus, Issuer, LineItem, parse_date,
};
pub use page_template::{DEFAULT_FOOTER, PageTemplate};
use serde_json::json;
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
pub use totals::{TotalSource, Totals, compute_totals};
pub use types::{Color, Margins, Point, Pt, Rect, Size};

/// Turns invoice records into PDF documents. Immutable after `build()` and
/// safe to share between threads; every render owns its own pages.
pub struct InvoiceRenderer {
    template: PageTemplate,
    fonts: Arc<FontSet>,
    formatter: Arc<dyn InvoiceFormatter>,
    issuer: Issuer,
    page_footer: Option<String>,
    title_prefix: String,
    debug: Option<DebugLogger>,
}

#[derive(Clone)]
pub struct InvoiceRendererBuilder {
    page_size: Size,
    margins: Margins,
    issuer: Issuer,
    locale: LocaleFormatter,
    formatter: Option<Arc<dyn InvoiceFormatter>>,
    font_files: Vec<(FontId, PathBuf)>,
    font_bytes: Vec<(FontId, Vec<u8>, String)>,
    page_footer: Option<String>,
    title_prefix: String,
    debug_path: Option<PathBuf>,
}

/// A finished invoice ready for download or preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoicePdf {
    filename: String,
    bytes: Vec<u8>,
    page_count: usize,
}

impl InvoicePdf {
    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    pub fn content_disposition(&self) -> String {
        format!("attachment; filename=\"{}\"", self.filename)
    }

    /// Inline reference for preview surfaces. Callers drop it when done.
    pub fn data_uri(&self) -> String {
        format!(
            "data:application/pdf;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&self.bytes)
        )
    }

    pub fn sha256_hex(&self) -> String {
        let digest = Sha256::digest(&self.bytes);
        digest.iter().map(|byte| format!("{byte:02x}")).collect()
    }
}

/// `Invoice-<number>.pdf`, with path separators, quotes and control
/// characters in the number replaced by `-`.
pub fn attachment_filename(invoice_number: &str) -> String {
    let trimmed = invoice_number.trim();
    let number = if trimmed.is_empty() {
        FALLBACK_INVOICE_NUMBER
    } else {
        trimmed
    };
    let safe: String = number
        .chars()
        .map(|ch| match ch {
            '/' | '\\' | '"' | '\'' | ':' => '-',
            c if c.is_control() => '-',
            c => c,
        })
        .collect();
    format!("Invoice-{safe}.pdf")
}

impl InvoiceRenderer {
    pub fn builder() -> InvoiceRendererBuilder {
        InvoiceRendererBuilder::new()
    }

    pub fn template(&self) -> &PageTemplate {
        &self.template
    }

    /// Lays out one invoice without serializing it.
    pub fn render_document(&self, invoice: &InvoiceData) -> Result<Document, InvoiceError> {
        self.render_document_timed(invoice).map(|(document, _)| document)
    }

    pub fn render(&self, invoice: &InvoiceData) -> Result<InvoicePdf, InvoiceError> {
        let document = self.render_document(invoice)?;
        self.finish_pdf(invoice, &document)
    }

    /// Decodes a REST payload and renders it.
    pub fn render_json(&self, payload: &str) -> Result<InvoicePdf, InvoiceError> {
        let invoice = InvoiceData::from_json(payload)?;
        self.render(&invoice)
    }

    pub fn render_with_metrics(
        &self,
        invoice: &InvoiceData,
    ) -> Result<(InvoicePdf, DocumentMetrics), InvoiceError> {
        let (document, layout_ms) = self.render_document_timed(invoice)?;
        let metrics = DocumentMetrics::collect(&document, layout_ms)?;
        let pdf = self.finish_pdf(invoice, &document)?;
        Ok((pdf, metrics))
    }

    /// Renders each invoice on the rayon pool. Results come back in input
    /// order; one failure does not affect the others.
    pub fn render_many_parallel(
        &self,
        invoices: &[InvoiceData],
    ) -> Vec<Result<InvoicePdf, InvoiceError>> {
        use rayon::prelude::*;

        invoices
            .par_iter()
            .map(|invoice| self.render(invoice))
            .collect()
    }

    fn finish_pdf(
        &self,
        invoice: &InvoiceData,
        document: &Document,
    ) -> Result<InvoicePdf, InvoiceError> {
        let bytes = document.serialize()?.to_vec();
        if let Some(debug) = &self.debug {
            debug.log_event(
                "render.pdf",
                json!({
                    "invoice": invoice.display_number(),
                    "bytes": bytes.len(),
                }),
            );
            debug.flush();
        }
        Ok(InvoicePdf {
            filename: attachment_filename(&invoice.invoice_number),
            bytes,
            page_count: document.page_count(),
        })
    }

    fn render_document_timed(
        &self,
        invoice: &InvoiceData,
    ) -> Result<(Document, f64), InvoiceError> {
        invoice.validate()?;
        let start = Instant::now();
        let totals = compute_totals(&invoice.items, invoice.precomputed_total)?;
        let mut assembler = DocumentAssembler::new(self.template.clone(), Arc::clone(&self.fonts));
        let layout = InvoiceLayout::new(&self.issuer, self.formatter.as_ref());
        let report = layout.lay_out(invoice, &totals, &mut assembler)?;
        let title = format!("{} {}", self.title_prefix, invoice.display_number());
        let document = assembler.finish(title, self.page_footer.clone());
        let layout_ms = start.elapsed().as_secs_f64() * 1000.0;

        log::info!(
            "laid out {} ({} rows, {} pages)",
            invoice.display_number(),
            report.rows,
            document.page_count()
        );
        if let Some(debug) = &self.debug {
            for page_break in &report.breaks {
                debug.log_event(
                    "layout.page_break",
                    json!({
                        "invoice": invoice.display_number(),
                        "reason": page_break.reason.as_str(),
                        "page": page_break.page,
                        "row": page_break.row,
                    }),
                );
            }
            debug.log_event(
                "render.document",
                json!({
                    "invoice": invoice.display_number(),
                    "pages": document.page_count(),
                    "rows": report.rows,
                    "totals_source": format!("{:?}", totals.source),
                    "layout_ms": layout_ms,
                }),
            );
            let mut counters = DebugCounters::default();
            counters.increment("pages", document.page_count() as u64);
            counters.increment("rows", report.rows as u64);
            counters.increment("page_breaks", report.breaks.len() as u64);
            debug.emit_summary(invoice.display_number(), &counters);
            debug.flush();
        }
        Ok((document, layout_ms))
    }
}

impl InvoiceRendererBuilder {
    pub fn new() -> Self {
        Self {
            page_size: Size::a4(),
            margins: Margins::default(),
            issuer: Issuer::default(),
            locale: LocaleFormatter::default(),
            formatter: None,
            font_files: Vec::new(),
            font_bytes: Vec::new(),
            page_footer: Some(DEFAULT_FOOTER.to_string()),
            title_prefix: "Invoice".to_string(),
            debug_path: None,
        }
    }

    pub fn page_size(mut self, size: Size) -> Self {
        self.page_size = size;
        self
    }

    pub fn margins(mut self, margins: Margins) -> Self {
        self.margins = margins;
        self
    }

    pub fn margin_all(mut self, value: f32) -> Self {
        self.margins = Margins::all(value);
        self
    }

    pub fn issuer(mut self, issuer: Issuer) -> Self {
        self.issuer = issuer;
        self
    }

    /// Replaces the built-in locale formatter entirely.
    pub fn formatter(mut self, formatter: impl InvoiceFormatter + 'static) -> Self {
        self.formatter = Some(Arc::new(formatter));
        self
    }

    pub fn currency(mut self, currency: CurrencyFormat) -> Self {
        self.locale.currency = currency;
        self
    }

    pub fn date_style(mut self, style: DateStyle) -> Self {
        self.locale.date_style = style;
        self
    }

    pub fn register_font_file(mut self, font: FontId, path: impl Into<PathBuf>) -> Self {
        self.font_files.push((font, path.into()));
        self
    }

    pub fn register_font_bytes(
        mut self,
        font: FontId,
        data: Vec<u8>,
        name: impl Into<String>,
    ) -> Self {
        self.font_bytes.push((font, data, name.into()));
        self
    }

    /// `{page}` and `{pages}` are substituted. `None` drops the footer and
    /// its reserved space.
    pub fn page_footer(mut self, template: Option<String>) -> Self {
        self.page_footer = template;
        self
    }

    pub fn title_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.title_prefix = prefix.into();
        self
    }

    pub fn debug_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.debug_path = Some(path.into());
        self
    }

    pub fn build(self) -> Result<InvoiceRenderer, InvoiceError> {
        let mut template = PageTemplate::new(self.page_size, self.margins);
        if self.page_footer.is_none() {
            template = template.without_footer();
        }
        template.validate()?;
        let columns = table_columns(template.content_rect());
        if columns.iter().any(|column| column.text_width() <= Pt::ZERO) {
            return Err(InvoiceError::InvalidConfiguration(
                "content area is too narrow for the item table".to_string(),
            ));
        }

        let fonts = if self.font_files.is_empty() && self.font_bytes.is_empty() {
            FontSet::standard()
        } else {
            let mut set = FontSet::standard().as_ref().clone();
            for (id, path) in &self.font_files {
                set.register(*id, FontFace::load_file(path)?);
            }
            for (id, data, name) in self.font_bytes {
                set.register(id, FontFace::from_truetype_bytes(data, &name)?);
            }
            Arc::new(set)
        };
        let formatter: Arc<dyn InvoiceFormatter> = match self.formatter {
            Some(formatter) => formatter,
            None => Arc::new(self.locale),
        };
        let debug = match self.debug_path {
            Some(path) => Some(DebugLogger::new(path)?),
            None => None,
        };
        Ok(InvoiceRenderer {
            template,
            fonts,
            formatter,
            issuer: self.issuer,
            page_footer: self.page_footer,
            title_prefix: self.title_prefix,
            debug,
        })
    }
}

impl Default for InvoiceRendererBuilder {
    fn default() -> Self {
        Self::new()
    }
}
