use crate::canvas::{Canvas, Document, Page};
use crate::error::InvoiceError;
use crate::font::FontSet;
use crate::page_template::PageTemplate;
use std::sync::Arc;

/// Owns the page sequence while a document is being laid out. Closing a page
/// moves its canvas into an immutable [`Page`].
pub struct DocumentAssembler {
    template: PageTemplate,
    fonts: Arc<FontSet>,
    pages: Vec<Page>,
    current: Option<Canvas>,
}

impl DocumentAssembler {
    pub fn new(template: PageTemplate, fonts: Arc<FontSet>) -> Self {
        Self {
            template,
            fonts,
            pages: Vec::new(),
            current: None,
        }
    }

    /// Closes the current page, if any, and starts a fresh one.
    pub fn new_page(&mut self) -> Result<&mut Canvas, InvoiceError> {
        let canvas = Canvas::new(&self.template, Arc::clone(&self.fonts))?;
        if let Some(previous) = self.current.take() {
            self.pages.push(previous.finish());
        }
        Ok(self.current.insert(canvas))
    }

    pub fn current(&mut self) -> Result<&mut Canvas, InvoiceError> {
        self.current.as_mut().ok_or_else(|| {
            InvoiceError::Serialization("no page has been started".to_string())
        })
    }

    /// Pages closed so far plus the one being drawn.
    pub fn page_count(&self) -> usize {
        self.pages.len() + usize::from(self.current.is_some())
    }

    pub fn finish(mut self, title: String, footer: Option<String>) -> Document {
        if let Some(current) = self.current.take() {
            self.pages.push(current.finish());
        }
        Document::new(title, self.template, self.pages, self.fonts, footer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::TextStyle;
    use crate::types::Pt;

    #[test]
    fn pages_are_kept_in_creation_order() {
        let mut assembler = DocumentAssembler::new(PageTemplate::default(), FontSet::standard());
        assert_eq!(assembler.page_count(), 0);
        assert!(assembler.current().is_err());
        for label in ["one", "two", "three"] {
            let canvas = assembler.new_page().expect("page");
            canvas
                .draw_text(label, Pt::from_i32(50), Pt::from_i32(700), TextStyle::default())
                .expect("draw");
        }
        assert_eq!(assembler.page_count(), 3);
        let doc = assembler.finish("Invoice".to_string(), None);
        let labels: Vec<&str> = doc
            .pages()
            .iter()
            .flat_map(|page| page.text_runs().map(|(_, _, text)| text))
            .collect();
        assert_eq!(labels, ["one", "two", "three"]);
    }

    #[test]
    fn finishing_without_pages_yields_an_empty_document() {
        let assembler = DocumentAssembler::new(PageTemplate::default(), FontSet::standard());
        let doc = assembler.finish("Invoice".to_string(), None);
        assert_eq!(doc.page_count(), 0);
    }
}
