use crate::canvas::{Command, Document, Page};
use crate::error::InvoiceError;
use crate::font::{FontFace, FontId, FontProgram, FontProgramKind, encode_winansi};
use crate::page_template::substitute_placeholders;
use crate::types::{Color, Pt};
use std::fmt::Write as _;

pub const PRODUCER: &str = "tallysheet";
const FOOTER_SIZE: i32 = 8;
const FOOTER_GRAY: f32 = 0.4;

const CATALOG_ID: usize = 1;
const PAGES_ID: usize = 2;
const RESOURCES_ID: usize = 3;
const INFO_ID: usize = 4;

/// Bytes of a serialized document plus per-page stream sizes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializedPdf {
    pub bytes: Vec<u8>,
    pub content_bytes: Vec<usize>,
    /// Characters that had no WinAnsi code and were printed as `?`.
    pub replaced_chars: usize,
}

pub fn document_to_pdf(document: &Document) -> Result<SerializedPdf, InvoiceError> {
    if document.pages().is_empty() {
        return Err(InvoiceError::Serialization(
            "document has no pages".to_string(),
        ));
    }

    let mut objects: Vec<String> = Vec::new();
    objects.push(format!(
        "<< /Type /Catalog /Pages {} 0 R >>",
        PAGES_ID
    ));
    // Pages and resources are filled in once ids are known.
    objects.push(String::new());
    objects.push(String::new());
    objects.push(info_object(document.title()));

    let mut font_refs: Vec<(FontId, usize)> = Vec::new();
    for (id, face) in document.fonts().faces() {
        let font_id = objects.len() + 1;
        match &face.program {
            FontProgram::Standard { .. } => {
                objects.push(standard_font_object(face));
            }
            FontProgram::Embedded { data, kind, .. } => {
                let descriptor_id = font_id + 1;
                let file_id = font_id + 2;
                objects.push(truetype_font_object(face, *kind, descriptor_id));
                objects.push(font_descriptor_object(face, *kind, file_id));
                objects.push(font_file_object(data, *kind));
            }
        }
        font_refs.push((id, font_id));
    }
    objects[RESOURCES_ID - 1] = font_resources(&font_refs);

    let mut renderer = PageRenderer::default();
    let mut content_bytes = Vec::with_capacity(document.page_count());
    let mut page_ids = Vec::with_capacity(document.page_count());
    let pages = document.page_count();
    for (index, page) in document.pages().iter().enumerate() {
        let mut content = renderer.render_page(page)?;
        if let Some(template) = document.footer() {
            let text = substitute_placeholders(template, index + 1, pages);
            content.push_str(&renderer.render_footer(document, &text)?);
        }
        content_bytes.push(content.len());
        let content_id = objects.len() + 1;
        objects.push(stream_object(&content));
        let page_id = objects.len() + 1;
        objects.push(format!(
            "<< /Type /Page /Parent {} 0 R /MediaBox [0 0 {} {}] /Resources {} 0 R /Contents {} 0 R >>",
            PAGES_ID,
            fmt_pt(page.size.width),
            fmt_pt(page.size.height),
            RESOURCES_ID,
            content_id
        ));
        page_ids.push(page_id);
    }
    let kids = page_ids
        .iter()
        .map(|id| format!("{id} 0 R"))
        .collect::<Vec<_>>()
        .join(" ");
    objects[PAGES_ID - 1] = format!(
        "<< /Type /Pages /Kids [{}] /Count {} >>",
        kids,
        page_ids.len()
    );

    if renderer.replaced > 0 {
        log::warn!(
            "{} character(s) outside WinAnsi printed as '?' in {:?}",
            renderer.replaced,
            document.title()
        );
    }

    Ok(SerializedPdf {
        bytes: build_pdf(&objects, CATALOG_ID, INFO_ID),
        content_bytes,
        replaced_chars: renderer.replaced,
    })
}

#[derive(Default)]
struct PageRenderer {
    font: Option<(FontId, Pt)>,
    replaced: usize,
}

impl PageRenderer {
    fn render_page(&mut self, page: &Page) -> Result<String, InvoiceError> {
        self.font = None;
        let mut out = String::new();
        for command in &page.commands {
            match command {
                Command::Meta { .. } => {}
                Command::SetFillColor(color) => {
                    let _ = writeln!(out, "{} rg", color_components(*color));
                }
                Command::SetStrokeColor(color) => {
                    let _ = writeln!(out, "{} RG", color_components(*color));
                }
                Command::SetLineWidth(width) => {
                    let _ = writeln!(out, "{} w", fmt_pt(*width));
                }
                Command::SetFont { font, size } => {
                    self.font = Some((*font, *size));
                }
                Command::DrawString { x, y, text } => {
                    let Some((font, size)) = self.font else {
                        return Err(InvoiceError::Serialization(format!(
                            "text {text:?} drawn before a font was selected"
                        )));
                    };
                    out.push_str(&self.text_object(font, size, *x, *y, text));
                }
                Command::FillRect {
                    x,
                    y,
                    width,
                    height,
                } => {
                    let _ = writeln!(
                        out,
                        "{} {} {} {} re f",
                        fmt_pt(*x),
                        fmt_pt(*y),
                        fmt_pt(*width),
                        fmt_pt(*height)
                    );
                }
                Command::Line { from, to } => {
                    let _ = writeln!(
                        out,
                        "{} {} m {} {} l S",
                        fmt_pt(from.x),
                        fmt_pt(from.y),
                        fmt_pt(to.x),
                        fmt_pt(to.y)
                    );
                }
            }
        }
        Ok(out)
    }

    /// Footer text, right-aligned to the content edge, in its own graphics
    /// state so page content is left untouched.
    fn render_footer(&mut self, document: &Document, text: &str) -> Result<String, InvoiceError> {
        let template = document.template();
        let size = Pt::from_i32(FOOTER_SIZE);
        let width = document
            .fonts()
            .measure_text_width(text, FontId::Regular, size)?;
        let right = template.page_size.width - template.margins.right;
        let mut out = String::from("q\n");
        let _ = writeln!(out, "{} rg", color_components(Color::gray(FOOTER_GRAY)));
        out.push_str(&self.text_object(
            FontId::Regular,
            size,
            right - width,
            template.footer_baseline(),
            text,
        ));
        out.push_str("Q\n");
        Ok(out)
    }

    fn text_object(&mut self, font: FontId, size: Pt, x: Pt, y: Pt, text: &str) -> String {
        let encoded = encode_winansi(text);
        self.replaced += encoded.replaced;
        format!(
            "BT /{} {} Tf {} {} Td ({}) Tj ET\n",
            font.resource_name(),
            fmt_pt(size),
            fmt_pt(x),
            fmt_pt(y),
            escape_pdf_bytes(&encoded.bytes)
        )
    }
}

fn build_pdf(objects: &[String], catalog_id: usize, info_id: usize) -> Vec<u8> {
    let mut out: Vec<u8> = Vec::new();
    out.extend_from_slice(b"%PDF-1.7\n");
    out.extend_from_slice(b"%\xE2\xE3\xCF\xD3\n");

    let mut offsets = Vec::with_capacity(objects.len());
    for (index, obj) in objects.iter().enumerate() {
        offsets.push(out.len());
        let obj_id = index + 1;
        out.extend_from_slice(format!("{} 0 obj\n", obj_id).as_bytes());
        out.extend_from_slice(obj.as_bytes());
        out.extend_from_slice(b"\nendobj\n");
    }

    let xref_start = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
    out.extend_from_slice(b"0000000000 65535 f \n");
    for offset in offsets {
        out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }

    let trailer = format!(
        "trailer\n<< /Size {} /Root {} 0 R /Info {} 0 R >>\nstartxref\n{}\n%%EOF\n",
        objects.len() + 1,
        catalog_id,
        info_id,
        xref_start
    );
    out.extend_from_slice(trailer.as_bytes());
    out
}

fn info_object(title: &str) -> String {
    let title = encode_winansi(title);
    format!(
        "<< /Title ({}) /Producer ({}) >>",
        escape_pdf_bytes(&title.bytes),
        PRODUCER
    )
}

fn font_resources(fonts: &[(FontId, usize)]) -> String {
    let entries = fonts
        .iter()
        .map(|(id, obj)| format!("/{} {} 0 R", id.resource_name(), obj))
        .collect::<Vec<_>>()
        .join(" ");
    format!("<< /Font << {} >> >>", entries)
}

fn standard_font_object(face: &FontFace) -> String {
    format!(
        "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
        face.base_name()
    )
}

fn truetype_font_object(face: &FontFace, kind: FontProgramKind, descriptor_id: usize) -> String {
    let metrics = &face.metrics;
    let subtype = match kind {
        FontProgramKind::OpenTypeCff => "Type1",
        FontProgramKind::TrueType => "TrueType",
    };
    let widths = metrics
        .widths
        .iter()
        .map(|value| value.to_string())
        .collect::<Vec<_>>()
        .join(" ");
    format!(
        "<< /Type /Font /Subtype /{} /BaseFont /{} /FirstChar {} /LastChar {} /Widths [{}] /FontDescriptor {} 0 R /Encoding /WinAnsiEncoding >>",
        subtype,
        face.base_name(),
        metrics.first_char,
        crate::font::FontMetrics::LAST_CHAR,
        widths,
        descriptor_id
    )
}

fn font_descriptor_object(face: &FontFace, kind: FontProgramKind, font_file_id: usize) -> String {
    let metrics = &face.metrics;
    let mut flags = 32;
    if metrics.is_fixed_pitch {
        flags |= 1;
    }
    let font_file_entry = match kind {
        FontProgramKind::OpenTypeCff => "FontFile3",
        FontProgramKind::TrueType => "FontFile2",
    };
    format!(
        "<< /Type /FontDescriptor /FontName /{} /Flags {} /FontBBox [{} {} {} {}] /ItalicAngle {} /Ascent {} /Descent {} /CapHeight {} /StemV {} /MissingWidth {} /{} {} 0 R >>",
        face.base_name(),
        flags,
        metrics.bbox.0,
        metrics.bbox.1,
        metrics.bbox.2,
        metrics.bbox.3,
        metrics.italic_angle,
        metrics.ascent,
        metrics.descent,
        metrics.cap_height,
        metrics.stem_v,
        metrics.missing_width,
        font_file_entry,
        font_file_id
    )
}

fn font_file_object(data: &[u8], kind: FontProgramKind) -> String {
    let mut stream_data = ascii_hex_encode(data);
    stream_data.push('>');
    stream_data.push('\n');
    let mut dict = format!(
        "<< /Length {} /Length1 {} /Filter /ASCIIHexDecode",
        stream_data.len(),
        data.len()
    );
    if matches!(kind, FontProgramKind::OpenTypeCff) {
        dict.push_str(" /Subtype /OpenType");
    }
    dict.push_str(" >>\nstream\n");
    format!("{}{}endstream", dict, stream_data)
}

fn ascii_hex_encode(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() * 2 + data.len() / 32);
    for (index, byte) in data.iter().enumerate() {
        let _ = write!(&mut out, "{:02X}", byte);
        if index % 32 == 31 {
            out.push('\n');
        }
    }
    out
}

fn stream_object(content: &str) -> String {
    format!(
        "<< /Length {} >>\nstream\n{}\nendstream",
        content.len(),
        content
    )
}

/// Literal-string body for already encoded single-byte text. Bytes outside
/// printable ASCII are written as octal escapes.
fn escape_pdf_bytes(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() + 8);
    for byte in bytes {
        match byte {
            b'\\' => out.push_str("\\\\"),
            b'(' => out.push_str("\\("),
            b')' => out.push_str("\\)"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b if *b < 0x20 || *b >= 0x7f => {
                let _ = write!(out, "\\{:03o}", b);
            }
            b => out.push(*b as char),
        }
    }
    out
}

fn color_components(color: Color) -> String {
    format!(
        "{} {} {}",
        fmt_unit(color.r),
        fmt_unit(color.g),
        fmt_unit(color.b)
    )
}

fn fmt_unit(value: f32) -> String {
    let value = if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) };
    format_milli((value as f64 * 1000.0).round() as i64)
}

fn format_milli(milli: i64) -> String {
    if milli == 0 {
        return "0".to_string();
    }
    let sign = if milli < 0 { "-" } else { "" };
    let abs = milli.abs();
    let int_part = abs / 1000;
    let frac_part = abs % 1000;
    if frac_part == 0 {
        format!("{}{}", sign, int_part)
    } else {
        let mut s = format!("{}{}.{:03}", sign, int_part, frac_part);
        while s.ends_with('0') {
            s.pop();
        }
        s
    }
}

fn fmt_pt(value: Pt) -> String {
    format_milli(value.to_milli())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::DocumentAssembler;
    use crate::canvas::TextStyle;
    use crate::font::FontSet;
    use crate::page_template::{DEFAULT_FOOTER, PageTemplate};

    fn document(labels: &[&str], footer: Option<&str>) -> Document {
        let mut assembler = DocumentAssembler::new(PageTemplate::default(), FontSet::standard());
        for label in labels {
            let canvas = assembler.new_page().expect("page");
            canvas
                .draw_text(label, Pt::from_i32(50), Pt::from_i32(700), TextStyle::default())
                .expect("draw");
        }
        assembler.finish("Invoice INV-1".to_string(), footer.map(str::to_string))
    }

    fn contains(bytes: &[u8], needle: &str) -> bool {
        bytes
            .windows(needle.len())
            .any(|window| window == needle.as_bytes())
    }

    #[test]
    fn numbers_are_trimmed() {
        assert_eq!(format_milli(0), "0");
        assert_eq!(format_milli(595_280), "595.28");
        assert_eq!(format_milli(-1_500), "-1.5");
        assert_eq!(format_milli(20_000), "20");
        assert_eq!(fmt_unit(0.9), "0.9");
    }

    #[test]
    fn writes_a_classic_xref_document() {
        let serialized = document(&["hello"], None).serialize().map(<[u8]>::to_vec).expect("pdf");
        assert!(serialized.starts_with(b"%PDF-1.7\n"));
        assert!(contains(&serialized, "/Type /Catalog"));
        assert!(contains(&serialized, "/BaseFont /Helvetica "));
        assert!(contains(&serialized, "/BaseFont /Helvetica-Bold"));
        assert!(contains(&serialized, "/MediaBox [0 0 595.28 841.89]"));
        assert!(contains(&serialized, "BT /F1 10 Tf 50 700 Td (hello) Tj ET"));
        assert!(contains(&serialized, "/Producer (tallysheet)"));
        assert!(serialized.ends_with(b"%%EOF\n"));
    }

    #[test]
    fn footer_is_added_to_every_page() {
        let doc = document(&["a", "b"], Some(DEFAULT_FOOTER));
        let bytes = doc.serialize().expect("pdf");
        assert!(contains(bytes, "(Page 1 of 2) Tj"));
        assert!(contains(bytes, "(Page 2 of 2) Tj"));
        // Closed pages are not touched by the footer.
        assert!(
            doc.pages()
                .iter()
                .all(|page| page.text_runs().all(|(_, _, t)| !t.starts_with("Page")))
        );
    }

    #[test]
    fn special_bytes_are_escaped() {
        assert_eq!(escape_pdf_bytes(b"a(b)c\\"), "a\\(b\\)c\\\\");
        assert_eq!(escape_pdf_bytes(&[0xE9]), "\\351");
    }

    #[test]
    fn text_before_font_is_rejected() {
        let page = Page {
            size: crate::types::Size::a4(),
            commands: vec![Command::DrawString {
                x: Pt::ZERO,
                y: Pt::ZERO,
                text: "x".to_string(),
            }],
            cursor: crate::types::Point::new(Pt::ZERO, Pt::ZERO),
        };
        let err = PageRenderer::default()
            .render_page(&page)
            .expect_err("no font selected");
        assert!(matches!(err, InvoiceError::Serialization(_)));
    }

    #[test]
    fn replaced_characters_are_counted() {
        let doc = document(&["\u{4E2D}\u{6587}"], None);
        let serialized = document_to_pdf(&doc).expect("pdf");
        assert_eq!(serialized.replaced_chars, 2);
        assert_eq!(serialized.content_bytes.len(), 1);
    }
}
