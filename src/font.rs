use crate::error::InvoiceError;
use crate::types::Pt;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, OnceLock};

/// The two faces the layout draws with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FontId {
    Regular,
    Bold,
}

impl FontId {
    /// Key used in the page resource dictionary.
    pub fn resource_name(self) -> &'static str {
        match self {
            FontId::Regular => "F1",
            FontId::Bold => "F2",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontProgramKind {
    TrueType,
    OpenTypeCff,
}

#[derive(Debug, Clone)]
pub enum FontProgram {
    /// One of the PDF base-14 faces; nothing is embedded.
    Standard { base_name: &'static str },
    Embedded {
        name: String,
        data: Arc<[u8]>,
        kind: FontProgramKind,
    },
}

/// Glyph metrics in 1/1000 em for WinAnsi codes `first_char..=255`.
#[derive(Debug, Clone)]
pub struct FontMetrics {
    pub first_char: u8,
    pub widths: Vec<u16>,
    pub ascent: i16,
    pub descent: i16,
    pub cap_height: i16,
    pub italic_angle: i16,
    pub stem_v: i16,
    pub bbox: (i16, i16, i16, i16),
    pub missing_width: u16,
    pub is_fixed_pitch: bool,
}

impl FontMetrics {
    pub const LAST_CHAR: u8 = 255;

    pub fn advance(&self, code: u8) -> u16 {
        if code < self.first_char {
            return self.missing_width;
        }
        let idx = (code - self.first_char) as usize;
        self.widths.get(idx).copied().unwrap_or(self.missing_width)
    }

    fn from_face(face: &ttf_parser::Face<'_>) -> Self {
        let units_per_em = face.units_per_em().max(1);
        let scale = 1000.0 / units_per_em as f32;
        let first_char = 32u8;
        let mut widths = Vec::with_capacity((Self::LAST_CHAR - first_char) as usize + 1);
        for code in first_char..=Self::LAST_CHAR {
            let width = winansi_to_char(code)
                .and_then(|ch| face.glyph_index(ch))
                .and_then(|id| face.glyph_hor_advance(id))
                .unwrap_or(0);
            let scaled = (width as f32 * scale).round() as i32;
            widths.push(scaled.clamp(0, u16::MAX as i32) as u16);
        }
        let missing_width = widths.first().copied().unwrap_or(0);
        let ascent = scale_i16(face.ascender(), scale);
        let descent = scale_i16(face.descender(), scale);
        let cap_height = face
            .capital_height()
            .map(|value| scale_i16(value, scale))
            .unwrap_or(ascent);
        let bbox = face.global_bounding_box();
        let bbox = (
            scale_i16(bbox.x_min, scale),
            scale_i16(bbox.y_min, scale),
            scale_i16(bbox.x_max, scale),
            scale_i16(bbox.y_max, scale),
        );
        let italic_angle = face
            .italic_angle()
            .map(|value| value.round() as i16)
            .unwrap_or(0);
        Self {
            first_char,
            widths,
            ascent,
            descent,
            cap_height,
            italic_angle,
            stem_v: 80,
            bbox,
            missing_width,
            is_fixed_pitch: face.is_monospaced(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FontFace {
    pub program: FontProgram,
    pub metrics: FontMetrics,
}

impl FontFace {
    pub fn helvetica() -> Self {
        Self {
            program: FontProgram::Standard {
                base_name: "Helvetica",
            },
            metrics: standard_metrics(&HELVETICA_ASCII, &HELVETICA_HIGH, (-166, -225, 1000, 931)),
        }
    }

    pub fn helvetica_bold() -> Self {
        Self {
            program: FontProgram::Standard {
                base_name: "Helvetica-Bold",
            },
            metrics: standard_metrics(
                &HELVETICA_BOLD_ASCII,
                &HELVETICA_BOLD_HIGH,
                (-170, -228, 1003, 962),
            ),
        }
    }

    /// Parses a TrueType/OpenType program. `source_name` is only used for
    /// naming when the font carries no usable name record.
    pub fn from_truetype_bytes(data: Vec<u8>, source_name: &str) -> Result<Self, InvoiceError> {
        let face = ttf_parser::Face::parse(&data, 0).map_err(|err| {
            InvoiceError::FontLoad(format!("invalid font data for {source_name}: {err}"))
        })?;
        let name = postscript_name(&face).unwrap_or_else(|| source_name.to_string());
        let kind = if face.tables().cff.is_some() {
            FontProgramKind::OpenTypeCff
        } else {
            FontProgramKind::TrueType
        };
        let metrics = FontMetrics::from_face(&face);
        Ok(Self {
            program: FontProgram::Embedded {
                name,
                data: Arc::from(data),
                kind,
            },
            metrics,
        })
    }

    pub fn load_file(path: impl AsRef<Path>) -> Result<Self, InvoiceError> {
        let path = path.as_ref();
        let data = fs::read(path).map_err(|err| {
            InvoiceError::FontLoad(format!("cannot read {}: {err}", path.display()))
        })?;
        let stem = path
            .file_stem()
            .and_then(|v| v.to_str())
            .unwrap_or("EmbeddedFont");
        Self::from_truetype_bytes(data, stem)
    }

    pub fn base_name(&self) -> String {
        match &self.program {
            FontProgram::Standard { base_name } => (*base_name).to_string(),
            FontProgram::Embedded { name, .. } => sanitize_font_name(name),
        }
    }

    pub fn measure_encoded(&self, encoded: &[u8], size: Pt) -> Pt {
        let units: i64 = encoded
            .iter()
            .map(|code| self.metrics.advance(*code) as i64)
            .sum();
        if units <= 0 {
            return Pt::ZERO;
        }
        size.mul_ratio(units, 1000)
    }
}

/// Faces keyed by [`FontId`]. Immutable once built; shared between renders
/// through an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct FontSet {
    faces: BTreeMap<FontId, FontFace>,
}

static STANDARD_FONTS: OnceLock<Arc<FontSet>> = OnceLock::new();

impl FontSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Helvetica and Helvetica-Bold, built once per process.
    pub fn standard() -> Arc<FontSet> {
        STANDARD_FONTS
            .get_or_init(|| {
                let mut set = FontSet::empty();
                set.register(FontId::Regular, FontFace::helvetica());
                set.register(FontId::Bold, FontFace::helvetica_bold());
                Arc::new(set)
            })
            .clone()
    }

    pub fn register(&mut self, id: FontId, face: FontFace) {
        self.faces.insert(id, face);
    }

    pub fn face(&self, id: FontId) -> Option<&FontFace> {
        self.faces.get(&id)
    }

    pub fn faces(&self) -> impl Iterator<Item = (FontId, &FontFace)> {
        self.faces.iter().map(|(id, face)| (*id, face))
    }

    pub fn measure_text_width(&self, text: &str, font: FontId, size: Pt) -> Result<Pt, InvoiceError> {
        let face = self.face(font).ok_or(InvoiceError::UnknownFont(font))?;
        let encoded = encode_winansi(text);
        Ok(face.measure_encoded(&encoded.bytes, size))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WinAnsiText {
    pub bytes: Vec<u8>,
    /// Characters with no WinAnsi code and no ASCII stand-in, printed as `?`.
    pub replaced: usize,
    /// Characters printed through an ASCII stand-in such as `Rs.` for the rupee sign.
    pub fallbacks: usize,
}

/// Encodes `text` to WinAnsi (cp1252), the single-byte encoding used for both
/// measuring and drawing.
pub fn encode_winansi(text: &str) -> WinAnsiText {
    let mut bytes = Vec::with_capacity(text.len());
    let mut replaced = 0usize;
    let mut fallbacks = 0usize;
    for ch in text.chars() {
        let stand_in: Option<&[u8]> = match ch {
            '\u{20B9}' => Some(b"Rs."),
            '\u{2265}' => Some(b">="),
            '\u{2264}' => Some(b"<="),
            _ => None,
        };
        if let Some(stand_in) = stand_in {
            bytes.extend_from_slice(stand_in);
            fallbacks += 1;
            continue;
        }
        match char_to_winansi(ch) {
            Some(byte) => bytes.push(byte),
            None => {
                bytes.push(b'?');
                replaced += 1;
            }
        }
    }
    WinAnsiText {
        bytes,
        replaced,
        fallbacks,
    }
}

fn char_to_winansi(ch: char) -> Option<u8> {
    let byte = match ch {
        '\u{0000}'..='\u{007F}' => ch as u8,
        '\u{00A0}'..='\u{00FF}' => ch as u8,
        '\u{20AC}' => 0x80,
        '\u{201A}' => 0x82,
        '\u{0192}' => 0x83,
        '\u{201E}' => 0x84,
        '\u{2026}' => 0x85,
        '\u{2020}' => 0x86,
        '\u{2021}' => 0x87,
        '\u{02C6}' => 0x88,
        '\u{2030}' => 0x89,
        '\u{0160}' => 0x8A,
        '\u{2039}' => 0x8B,
        '\u{0152}' => 0x8C,
        '\u{017D}' => 0x8E,
        '\u{2018}' => 0x91,
        '\u{2019}' => 0x92,
        '\u{201C}' => 0x93,
        '\u{201D}' => 0x94,
        '\u{2022}' => 0x95,
        '\u{2013}' => 0x96,
        '\u{2014}' => 0x97,
        '\u{02DC}' => 0x98,
        '\u{2122}' => 0x99,
        '\u{0161}' => 0x9A,
        '\u{203A}' => 0x9B,
        '\u{0153}' => 0x9C,
        '\u{017E}' => 0x9E,
        '\u{0178}' => 0x9F,
        _ => return None,
    };
    Some(byte)
}

/// Inverse of [`char_to_winansi`], used to look up glyphs in embedded faces.
pub fn winansi_to_char(code: u8) -> Option<char> {
    let ch = match code {
        0x00..=0x7F | 0xA0..=0xFF => code as char,
        0x80 => '\u{20AC}',
        0x82 => '\u{201A}',
        0x83 => '\u{0192}',
        0x84 => '\u{201E}',
        0x85 => '\u{2026}',
        0x86 => '\u{2020}',
        0x87 => '\u{2021}',
        0x88 => '\u{02C6}',
        0x89 => '\u{2030}',
        0x8A => '\u{0160}',
        0x8B => '\u{2039}',
        0x8C => '\u{0152}',
        0x8E => '\u{017D}',
        0x91 => '\u{2018}',
        0x92 => '\u{2019}',
        0x93 => '\u{201C}',
        0x94 => '\u{201D}',
        0x95 => '\u{2022}',
        0x96 => '\u{2013}',
        0x97 => '\u{2014}',
        0x98 => '\u{02DC}',
        0x99 => '\u{2122}',
        0x9A => '\u{0161}',
        0x9B => '\u{203A}',
        0x9C => '\u{0153}',
        0x9E => '\u{017E}',
        0x9F => '\u{0178}',
        _ => return None,
    };
    Some(ch)
}

fn standard_metrics(
    ascii: &[u16; 95],
    high: &[(u8, u16)],
    bbox: (i16, i16, i16, i16),
) -> FontMetrics {
    let first_char = 32u8;
    let mut widths = vec![556u16; (FontMetrics::LAST_CHAR - first_char) as usize + 1];
    widths[..ascii.len()].copy_from_slice(ascii);
    for (code, width) in high {
        if let Some(slot) = widths.get_mut((*code - first_char) as usize) {
            *slot = *width;
        }
    }
    FontMetrics {
        first_char,
        widths,
        ascent: 718,
        descent: -207,
        cap_height: 718,
        italic_angle: 0,
        stem_v: 88,
        bbox,
        missing_width: 278,
        is_fixed_pitch: false,
    }
}

// AFM advance widths for codes 32..=126.
#[rustfmt::skip]
const HELVETICA_ASCII: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD_ASCII: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

// Punctuation above ASCII that differs from the 556 default.
const HELVETICA_HIGH: [(u8, u16); 9] = [
    (0x85, 1000),
    (0x91, 222),
    (0x92, 222),
    (0x93, 333),
    (0x94, 333),
    (0x95, 350),
    (0x97, 1000),
    (0x99, 1000),
    (0xA0, 278),
];

const HELVETICA_BOLD_HIGH: [(u8, u16); 9] = [
    (0x85, 1000),
    (0x91, 278),
    (0x92, 278),
    (0x93, 500),
    (0x94, 500),
    (0x95, 350),
    (0x97, 1000),
    (0x99, 1000),
    (0xA0, 278),
];

fn scale_i16(value: i16, scale: f32) -> i16 {
    let scaled = (value as f32 * scale).round() as i32;
    scaled.clamp(i16::MIN as i32, i16::MAX as i32) as i16
}

fn postscript_name(face: &ttf_parser::Face<'_>) -> Option<String> {
    use ttf_parser::name::name_id;

    let mut full = None;
    for entry in face.names() {
        let Some(name) = entry.to_string() else {
            continue;
        };
        match entry.name_id {
            name_id::POST_SCRIPT_NAME => return Some(name),
            name_id::FULL_NAME if full.is_none() => full = Some(name),
            _ => {}
        }
    }
    full
}

pub(crate) fn sanitize_font_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric() || *ch == '-' || *ch == '_')
        .collect();
    if cleaned.is_empty() {
        "EmbeddedFont".to_string()
    } else {
        cleaned
    }
}
