use fixed::types::I32F32;

/// A length in PDF points (1/72 inch), quantized to thousandths so that layout
/// arithmetic is reproducible across platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pt(I32F32);

impl Pt {
    pub const ZERO: Pt = Pt(I32F32::from_bits(0));

    pub fn from_f32(value: f32) -> Pt {
        if !value.is_finite() {
            return Pt::ZERO;
        }
        let milli = (value as f64 * 1000.0).round();
        let milli = milli.clamp(i32::MIN as f64, i32::MAX as f64) as i64;
        Pt::from_milli(milli)
    }

    pub fn from_i32(value: i32) -> Pt {
        Pt::from_milli(value as i64 * 1000)
    }

    pub fn from_milli(milli: i64) -> Pt {
        let denom = 1i128 << 32;
        let adj = if milli >= 0 { 500 } else { -500 };
        let bits = (milli as i128 * denom + adj) / 1000;
        let bits = bits.clamp(i64::MIN as i128, i64::MAX as i128) as i64;
        Pt(I32F32::from_bits(bits))
    }

    pub fn to_f32(self) -> f32 {
        self.0.to_num()
    }

    pub fn to_milli(self) -> i64 {
        let bits = self.0.to_bits() as i128;
        let denom = 1i128 << 32;
        let scaled = bits * 1000;
        let adj = if scaled >= 0 { denom / 2 } else { -denom / 2 };
        ((scaled + adj) / denom) as i64
    }

    pub fn max(self, other: Pt) -> Pt {
        if self >= other { self } else { other }
    }

    pub fn min(self, other: Pt) -> Pt {
        if self <= other { self } else { other }
    }

    /// `self * num / denom`, rounded half away from zero at milli precision.
    pub fn mul_ratio(self, num: i64, denom: i64) -> Pt {
        if denom == 0 {
            return Pt::ZERO;
        }
        let scaled = (self.to_milli() as i128).saturating_mul(num as i128);
        let denom = denom as i128;
        let half = denom.abs() / 2;
        let milli = if scaled >= 0 {
            (scaled + half) / denom
        } else {
            -((-scaled + half) / denom)
        };
        Pt::from_milli(milli.clamp(i64::MIN as i128, i64::MAX as i128) as i64)
    }
}

impl std::ops::Add for Pt {
    type Output = Pt;
    fn add(self, rhs: Pt) -> Pt {
        Pt::from_milli(self.to_milli() + rhs.to_milli())
    }
}

impl std::ops::AddAssign for Pt {
    fn add_assign(&mut self, rhs: Pt) {
        *self = *self + rhs;
    }
}

impl std::ops::Sub for Pt {
    type Output = Pt;
    fn sub(self, rhs: Pt) -> Pt {
        Pt::from_milli(self.to_milli() - rhs.to_milli())
    }
}

impl std::ops::SubAssign for Pt {
    fn sub_assign(&mut self, rhs: Pt) {
        *self = *self - rhs;
    }
}

impl std::ops::Mul<i32> for Pt {
    type Output = Pt;
    fn mul(self, rhs: i32) -> Pt {
        Pt::from_milli(self.to_milli().saturating_mul(rhs as i64))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub x: Pt,
    pub y: Pt,
}

impl Point {
    pub fn new(x: Pt, y: Pt) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    pub width: Pt,
    pub height: Pt,
}

impl Size {
    pub fn a4() -> Self {
        Self {
            width: Pt::from_f32(595.28),
            height: Pt::from_f32(841.89),
        }
    }

    pub fn letter() -> Self {
        // 8.5in x 11in at 72pt/in.
        Self {
            width: Pt::from_f32(612.0),
            height: Pt::from_f32(792.0),
        }
    }

    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width: Pt::from_f32(width),
            height: Pt::from_f32(height),
        }
    }

    pub fn is_positive(&self) -> bool {
        self.width > Pt::ZERO && self.height > Pt::ZERO
    }
}

/// Axis-aligned rectangle in page space: `(x, y)` is the bottom-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: Pt,
    pub y: Pt,
    pub width: Pt,
    pub height: Pt,
}

impl Rect {
    pub fn left(&self) -> Pt {
        self.x
    }

    pub fn right(&self) -> Pt {
        self.x + self.width
    }

    pub fn bottom(&self) -> Pt {
        self.y
    }

    pub fn top(&self) -> Pt {
        self.y + self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Margins {
    pub top: Pt,
    pub right: Pt,
    pub bottom: Pt,
    pub left: Pt,
}

impl Margins {
    pub fn all(value: f32) -> Self {
        let v = Pt::from_f32(value);
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }
}

impl Default for Margins {
    fn default() -> Self {
        Margins::all(50.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };

    pub fn gray(level: f32) -> Self {
        Self {
            r: level,
            g: level,
            b: level,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pt_quantizes_to_milli_points() {
        assert_eq!(Pt::from_f32(595.28).to_milli(), 595_280);
        assert_eq!(Pt::from_f32(0.0004), Pt::ZERO);
        assert_eq!((Pt::from_f32(1.5) + Pt::from_f32(2.25)).to_milli(), 3_750);
        assert_eq!((Pt::from_i32(10) - Pt::from_f32(0.5)).to_milli(), 9_500);
    }

    #[test]
    fn mul_ratio_rounds_half_away_from_zero() {
        // 10pt * 2223 / 1000 = 22.23pt
        assert_eq!(Pt::from_i32(10).mul_ratio(2223, 1000).to_milli(), 22_230);
        assert_eq!(Pt::from_f32(0.001).mul_ratio(1, 2).to_milli(), 1);
        assert_eq!(Pt::from_i32(3).mul_ratio(1, 0), Pt::ZERO);
    }

    #[test]
    fn rect_edges_follow_bottom_left_origin() {
        let rect = Rect {
            x: Pt::from_i32(50),
            y: Pt::from_i32(70),
            width: Pt::from_i32(100),
            height: Pt::from_i32(200),
        };
        assert_eq!(rect.right(), Pt::from_i32(150));
        assert_eq!(rect.top(), Pt::from_i32(270));
        assert_eq!(rect.bottom(), Pt::from_i32(70));
    }
}
