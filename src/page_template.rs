use crate::error::InvoiceError;
use crate::frame::Frame;
use crate::types::{Margins, Pt, Rect, Size};

pub const DEFAULT_FOOTER: &str = "Page {page} of {pages}";
pub const FOOTER_RESERVE: i32 = 20;

/// Page geometry shared by every page of a document.
#[derive(Debug, Clone, PartialEq)]
pub struct PageTemplate {
    pub page_size: Size,
    pub margins: Margins,
    /// Height kept free above the bottom margin for the page footer.
    pub footer_reserve: Pt,
}

impl PageTemplate {
    pub fn new(page_size: Size, margins: Margins) -> Self {
        Self {
            page_size,
            margins,
            footer_reserve: Pt::from_i32(FOOTER_RESERVE),
        }
    }

    pub fn without_footer(mut self) -> Self {
        self.footer_reserve = Pt::ZERO;
        self
    }

    pub fn content_rect(&self) -> Rect {
        let bottom = self.margins.bottom + self.footer_reserve;
        Rect {
            x: self.margins.left,
            y: bottom,
            width: self.page_size.width - self.margins.left - self.margins.right,
            height: self.page_size.height - self.margins.top - bottom,
        }
    }

    /// Baseline of the footer line, inside the reserve.
    pub fn footer_baseline(&self) -> Pt {
        self.margins.bottom + Pt::from_i32(6)
    }

    pub fn instantiate_frame(&self) -> Frame {
        Frame::new(self.content_rect())
    }

    pub fn validate(&self) -> Result<(), InvoiceError> {
        if !self.page_size.is_positive() {
            return Err(InvoiceError::InvalidPageSize {
                width: self.page_size.width.to_f32(),
                height: self.page_size.height.to_f32(),
            });
        }
        let m = &self.margins;
        if [m.top, m.right, m.bottom, m.left]
            .iter()
            .any(|value| *value < Pt::ZERO)
        {
            return Err(InvoiceError::InvalidConfiguration(
                "margins cannot be negative".to_string(),
            ));
        }
        let content = self.content_rect();
        if content.width <= Pt::ZERO || content.height <= Pt::ZERO {
            return Err(InvoiceError::InvalidConfiguration(format!(
                "margins leave no content area on a {}x{}pt page",
                self.page_size.width.to_f32(),
                self.page_size.height.to_f32()
            )));
        }
        Ok(())
    }
}

impl Default for PageTemplate {
    fn default() -> Self {
        PageTemplate::new(Size::a4(), Margins::default())
    }
}

/// Expands `{page}` and `{pages}` in a footer template.
pub fn substitute_placeholders(template: &str, page: usize, pages: usize) -> String {
    template
        .replace("{pages}", &pages.to_string())
        .replace("{page}", &page.to_string())
}
