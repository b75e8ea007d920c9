use crate::error::InvoiceError;
use crate::font::{FontId, FontSet};
use crate::frame::Frame;
use crate::page_template::PageTemplate;
use crate::pdf::{self, SerializedPdf};
use crate::types::{Color, Point, Pt, Size};
use std::sync::{Arc, OnceLock};

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    // Non-rendered metadata used for page-aware reporting. Ignored by the PDF renderer.
    Meta {
        key: String,
        value: String,
    },
    SetFillColor(Color),
    SetStrokeColor(Color),
    SetLineWidth(Pt),
    SetFont {
        font: FontId,
        size: Pt,
    },
    DrawString {
        x: Pt,
        y: Pt,
        text: String,
    },
    FillRect {
        x: Pt,
        y: Pt,
        width: Pt,
        height: Pt,
    },
    Line {
        from: Point,
        to: Point,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub font: FontId,
    pub size: Pt,
    pub color: Color,
}

impl TextStyle {
    pub fn new(font: FontId, size: f32) -> Self {
        Self {
            font,
            size: Pt::from_f32(size),
            color: Color::BLACK,
        }
    }
}

impl Default for TextStyle {
    fn default() -> Self {
        TextStyle::new(FontId::Regular, 10.0)
    }
}

/// A closed page. Only the document that owns it can read it back.
#[derive(Debug, Clone)]
pub struct Page {
    pub size: Size,
    pub commands: Vec<Command>,
    /// Where the content cursor stood when the page was closed.
    pub cursor: Point,
}

impl Page {
    pub fn text_runs(&self) -> impl Iterator<Item = (Pt, Pt, &str)> {
        self.commands.iter().filter_map(|command| match command {
            Command::DrawString { x, y, text } => Some((*x, *y, text.as_str())),
            _ => None,
        })
    }

    pub fn meta_values<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.commands.iter().filter_map(move |command| match command {
            Command::Meta { key: k, value } if k == key => Some(value.as_str()),
            _ => None,
        })
    }

    pub fn meta_count(&self, key: &str) -> usize {
        self.meta_values(key).count()
    }
}

#[derive(Debug, Clone, PartialEq)]
struct GraphicsState {
    fill_color: Color,
    stroke_color: Color,
    line_width: Pt,
    font: Option<(FontId, Pt)>,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            fill_color: Color::BLACK,
            stroke_color: Color::BLACK,
            line_width: Pt::from_i32(1),
            font: None,
        }
    }
}

/// Drawing surface for one page. Origin is the bottom-left corner; units are
/// points.
pub struct Canvas {
    page_size: Size,
    commands: Vec<Command>,
    frame: Frame,
    fonts: Arc<FontSet>,
    state: GraphicsState,
}

impl Canvas {
    pub fn new(template: &PageTemplate, fonts: Arc<FontSet>) -> Result<Self, InvoiceError> {
        if !template.page_size.is_positive() {
            return Err(InvoiceError::InvalidPageSize {
                width: template.page_size.width.to_f32(),
                height: template.page_size.height.to_f32(),
            });
        }
        Ok(Self {
            page_size: template.page_size,
            commands: Vec::new(),
            frame: template.instantiate_frame(),
            fonts,
            state: GraphicsState::default(),
        })
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn frame_mut(&mut self) -> &mut Frame {
        &mut self.frame
    }

    pub fn meta(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.commands.push(Command::Meta {
            key: key.into(),
            value: value.into(),
        });
    }

    pub fn measure_text_width(&self, text: &str, font: FontId, size: Pt) -> Result<Pt, InvoiceError> {
        self.fonts.measure_text_width(text, font, size)
    }

    /// Places the baseline start of `text` at `(x, y)`. No wrapping.
    pub fn draw_text(
        &mut self,
        text: &str,
        x: Pt,
        y: Pt,
        style: TextStyle,
    ) -> Result<(), InvoiceError> {
        if self.fonts.face(style.font).is_none() {
            return Err(InvoiceError::UnknownFont(style.font));
        }
        self.set_font(style.font, style.size);
        self.set_fill_color(style.color);
        self.commands.push(Command::DrawString {
            x,
            y,
            text: text.to_string(),
        });
        Ok(())
    }

    /// Draws `text` so that it ends at `right_x`. Returns the start x.
    pub fn draw_text_right(
        &mut self,
        text: &str,
        right_x: Pt,
        y: Pt,
        style: TextStyle,
    ) -> Result<Pt, InvoiceError> {
        let width = self.measure_text_width(text, style.font, style.size)?;
        let x = right_x - width;
        self.draw_text(text, x, y, style)?;
        Ok(x)
    }

    pub fn draw_line(&mut self, from: Point, to: Point, thickness: Pt, color: Color) {
        self.set_stroke_color(color);
        self.set_line_width(thickness);
        self.commands.push(Command::Line { from, to });
    }

    pub fn fill_rect(&mut self, x: Pt, y: Pt, width: Pt, height: Pt, color: Color) {
        self.set_fill_color(color);
        self.commands.push(Command::FillRect {
            x,
            y,
            width,
            height,
        });
    }

    fn set_fill_color(&mut self, color: Color) {
        if self.state.fill_color == color {
            return;
        }
        self.state.fill_color = color;
        self.commands.push(Command::SetFillColor(color));
    }

    fn set_stroke_color(&mut self, color: Color) {
        if self.state.stroke_color == color {
            return;
        }
        self.state.stroke_color = color;
        self.commands.push(Command::SetStrokeColor(color));
    }

    fn set_line_width(&mut self, width: Pt) {
        let width = width.max(Pt::ZERO);
        if self.state.line_width == width {
            return;
        }
        self.state.line_width = width;
        self.commands.push(Command::SetLineWidth(width));
    }

    fn set_font(&mut self, font: FontId, size: Pt) {
        if self.state.font == Some((font, size)) {
            return;
        }
        self.state.font = Some((font, size));
        self.commands.push(Command::SetFont { font, size });
    }

    pub fn finish(self) -> Page {
        let rect = self.frame.rect();
        Page {
            size: self.page_size,
            commands: self.commands,
            cursor: Point::new(rect.x, self.frame.top_y()),
        }
    }
}

/// A finished page sequence. There is no mutating API: the first successful
/// serialization is cached and every later call returns the same bytes.
#[derive(Debug)]
pub struct Document {
    title: String,
    template: PageTemplate,
    pages: Vec<Page>,
    fonts: Arc<FontSet>,
    footer: Option<String>,
    encoded: OnceLock<SerializedPdf>,
}

impl Document {
    pub(crate) fn new(
        title: String,
        template: PageTemplate,
        pages: Vec<Page>,
        fonts: Arc<FontSet>,
        footer: Option<String>,
    ) -> Self {
        Self {
            title,
            template,
            pages,
            fonts,
            footer,
            encoded: OnceLock::new(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn template(&self) -> &PageTemplate {
        &self.template
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn fonts(&self) -> &FontSet {
        &self.fonts
    }

    pub fn footer(&self) -> Option<&str> {
        self.footer.as_deref()
    }

    pub fn serialize(&self) -> Result<&[u8], InvoiceError> {
        Ok(&self.serialized()?.bytes)
    }

    pub fn serialized(&self) -> Result<&SerializedPdf, InvoiceError> {
        if let Some(serialized) = self.encoded.get() {
            return Ok(serialized);
        }
        let serialized = pdf::document_to_pdf(self)?;
        Ok(self.encoded.get_or_init(|| serialized))
    }
}
