/// EMF+ primitive field codecs
///
/// Fixed-width readers shared by every record and object decoder: packed
/// colors, points and rectangles in their three wire encodings, affine
/// transforms, counted arrays and flag-word accessors.
use crate::common::binary::ByteCursor;
use crate::common::error::{Error, Result};
use crate::images::emfplus::options::check_ceiling;

/// A named boolean or multi-bit sub-range of a flag word.
///
/// The mask must be non-zero and contiguous.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitField {
    mask: u32,
    shift: u32,
}

impl BitField {
    pub const fn new(mask: u32) -> Self {
        Self {
            mask,
            shift: mask.trailing_zeros(),
        }
    }

    /// True when any bit of the field is set in `word`.
    #[inline]
    pub const fn is_set(self, word: u32) -> bool {
        word & self.mask != 0
    }

    /// The field's value, shifted down to bit 0.
    #[inline]
    pub const fn value(self, word: u32) -> u32 {
        match (word & self.mask).checked_shr(self.shift) {
            Some(v) => v,
            None => 0,
        }
    }
}

/// Bit fields of the 16-bit record flag word.
///
/// Several records reuse bit 13 under different names.
pub mod record_flags {
    use super::BitField;

    /// Brush argument is an inline color instead of an object slot
    pub const SOLID_COLOR: BitField = BitField::new(0x8000);
    /// Coordinates are 16-bit integers
    pub const COMPRESSED: BitField = BitField::new(0x4000);
    /// DrawLines: connect the last point back to the first
    pub const CLOSED: BitField = BitField::new(0x2000);
    /// FillPolygon / FillClosedCurve: winding fill mode
    pub const WINDING: BitField = BitField::new(0x2000);
    /// MultiplyWorldTransform and friends: apply after the current transform
    pub const POST_MULTIPLY: BitField = BitField::new(0x2000);
    /// DrawImage / DrawImagePoints: image effect applied
    pub const EFFECT: BitField = BitField::new(0x2000);
    /// Coordinates are relative 7/15-bit integers
    pub const RELATIVE_POSITION: BitField = BitField::new(0x0800);
    /// Clip records: set operation in bits 8..12
    pub const COMBINE_MODE: BitField = BitField::new(0x0F00);
    /// Page unit in bits 8..16
    pub const PAGE_UNIT: BitField = BitField::new(0xFF00);
    /// Object records: continuation follows
    pub const CONTINUABLE: BitField = BitField::new(0x8000);
    /// Object records: object type in bits 8..15
    pub const OBJECT_TYPE: BitField = BitField::new(0x7F00);
    /// Object or slot index in the low byte
    pub const OBJECT_ID: BitField = BitField::new(0x00FF);
}

/// Packed 32-bit color.
///
/// Channel order on the wire is alpha in the low byte, then red, green and
/// blue in the high byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    pub alpha: u8,
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Color {
    #[inline]
    pub const fn from_u32(word: u32) -> Self {
        Self {
            alpha: word as u8,
            red: (word >> 8) as u8,
            green: (word >> 16) as u8,
            blue: (word >> 24) as u8,
        }
    }

    #[inline]
    pub const fn to_u32(self) -> u32 {
        (self.alpha as u32)
            | ((self.red as u32) << 8)
            | ((self.green as u32) << 16)
            | ((self.blue as u32) << 24)
    }

    pub fn read(cursor: &mut ByteCursor<'_>) -> Result<Self> {
        Ok(Self::from_u32(cursor.read_u32()?))
    }

    /// Linear interpolation between two colors, channel by channel.
    pub fn lerp(self, other: Color, t: f32) -> Color {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (f32::from(a) + (f32::from(b) - f32::from(a)) * t).round() as u8;
        Color {
            alpha: mix(self.alpha, other.alpha),
            red: mix(self.red, other.red),
            green: mix(self.green, other.green),
            blue: mix(self.blue, other.blue),
        }
    }

    /// Hex color string in `#RRGGBB` form.
    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.red, self.green, self.blue)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointF {
    pub x: f32,
    pub y: f32,
}

impl PointF {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RectF {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl RectF {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn min_x(&self) -> f32 {
        self.x.min(self.x + self.width)
    }

    pub fn max_x(&self) -> f32 {
        self.x.max(self.x + self.width)
    }

    pub fn min_y(&self) -> f32 {
        self.y.min(self.y + self.height)
    }

    pub fn max_y(&self) -> f32 {
        self.y.max(self.y + self.height)
    }

    /// Float form: four 32-bit floats.
    pub fn read(cursor: &mut ByteCursor<'_>) -> Result<Self> {
        Ok(Self::new(
            cursor.read_f32()?,
            cursor.read_f32()?,
            cursor.read_f32()?,
            cursor.read_f32()?,
        ))
    }

    /// Compressed form: four signed 16-bit integers.
    pub fn read_compressed(cursor: &mut ByteCursor<'_>) -> Result<Self> {
        Ok(Self::new(
            f32::from(cursor.read_i16()?),
            f32::from(cursor.read_i16()?),
            f32::from(cursor.read_i16()?),
            f32::from(cursor.read_i16()?),
        ))
    }

    /// Read in the form selected by the record's `COMPRESSED` bit.
    pub fn read_with_flags(cursor: &mut ByteCursor<'_>, flags: u16) -> Result<Self> {
        if record_flags::COMPRESSED.is_set(u32::from(flags)) {
            Self::read_compressed(cursor)
        } else {
            Self::read(cursor)
        }
    }
}

/// Wire encoding of a point list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointEncoding {
    Float,
    Compressed,
    Relative,
}

impl PointEncoding {
    /// `RELATIVE_POSITION` wins over `COMPRESSED`.
    pub const fn from_flags(flags: u32) -> Self {
        if record_flags::RELATIVE_POSITION.is_set(flags) {
            PointEncoding::Relative
        } else if record_flags::COMPRESSED.is_set(flags) {
            PointEncoding::Compressed
        } else {
            PointEncoding::Float
        }
    }

    /// Smallest possible encoded size of one point.
    pub const fn min_point_size(self) -> usize {
        match self {
            PointEncoding::Float => 8,
            PointEncoding::Compressed => 4,
            PointEncoding::Relative => 2,
        }
    }

    pub fn read_point(self, cursor: &mut ByteCursor<'_>) -> Result<PointF> {
        Ok(match self {
            PointEncoding::Float => PointF::new(cursor.read_f32()?, cursor.read_f32()?),
            PointEncoding::Compressed => {
                PointF::new(f32::from(cursor.read_i16()?), f32::from(cursor.read_i16()?))
            },
            PointEncoding::Relative => {
                let x = read_relative_int(cursor)?;
                let y = read_relative_int(cursor)?;
                PointF::new(x as f32, y as f32)
            },
        })
    }

    /// Read `count` points; the caller has already validated `count`.
    pub fn read_points(self, cursor: &mut ByteCursor<'_>, count: usize) -> Result<Vec<PointF>> {
        let mut points = Vec::with_capacity(count);
        for _ in 0..count {
            points.push(self.read_point(cursor)?);
        }
        Ok(points)
    }
}

/// Decode one EmfPlusInteger7 / EmfPlusInteger15 value.
///
/// A clear high bit means a single byte carrying a signed 7-bit value. A
/// set high bit means the low 7 bits and the following byte form a signed
/// 15-bit value, high byte first.
pub fn read_relative_int(cursor: &mut ByteCursor<'_>) -> Result<i32> {
    let first = cursor.read_u8()?;
    if first & 0x80 == 0 {
        Ok(i32::from(((first << 1) as i8) >> 1))
    } else {
        let second = cursor.read_u8()?;
        let raw = (u16::from(first & 0x7F) << 8) | u16::from(second);
        Ok(i32::from(((raw << 1) as i16) >> 1))
    }
}

/// 2x3 affine transform.
///
/// Maps `(x, y)` to `(m11*x + m21*y + dx, m12*x + m22*y + dy)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub m11: f64,
    pub m12: f64,
    pub m21: f64,
    pub m22: f64,
    pub dx: f64,
    pub dy: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        m11: 1.0,
        m12: 0.0,
        m21: 0.0,
        m22: 1.0,
        dx: 0.0,
        dy: 0.0,
    };

    /// Six sequential 32-bit floats.
    pub fn read(cursor: &mut ByteCursor<'_>) -> Result<Self> {
        Ok(Self {
            m11: f64::from(cursor.read_f32()?),
            m12: f64::from(cursor.read_f32()?),
            m21: f64::from(cursor.read_f32()?),
            m22: f64::from(cursor.read_f32()?),
            dx: f64::from(cursor.read_f32()?),
            dy: f64::from(cursor.read_f32()?),
        })
    }

    /// Coefficients in `(m00, m10, m01, m11, m02, m12)` order.
    pub fn to_array(&self) -> [f64; 6] {
        [self.m11, self.m12, self.m21, self.m22, self.dx, self.dy]
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.m11 * x + self.m21 * y + self.dx,
            self.m12 * x + self.m22 * y + self.dy,
        )
    }
}

/// Signature carried in the upper 20 bits of every graphics version word.
pub const METAFILE_SIGNATURE: u32 = 0xDBC01;

/// Version prefix of headers and objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphicsVersion {
    /// Low 12 bits; 1 for GDI+ 1.0, 2 for GDI+ 1.1
    pub version: u16,
}

impl GraphicsVersion {
    pub fn read(cursor: &mut ByteCursor<'_>) -> Result<Self> {
        let offset = cursor.offset();
        let word = cursor.read_u32()?;
        let signature = word >> 12;
        if signature != METAFILE_SIGNATURE {
            return Err(Error::malformed(
                offset,
                format!("bad graphics version signature 0x{:05X}", signature),
            ));
        }
        Ok(Self {
            version: (word & 0x0FFF) as u16,
        })
    }

    pub const fn to_u32(self) -> u32 {
        (METAFILE_SIGNATURE << 12) | (self.version as u32 & 0x0FFF)
    }
}

/// Read a 32-bit element count and validate it.
///
/// The count is checked against `ceiling` first, then against the bytes
/// left in the cursor, so no allocation is ever sized from it unchecked.
pub fn read_count(cursor: &mut ByteCursor<'_>, ceiling: u32, min_elem_size: usize) -> Result<usize> {
    let offset = cursor.offset();
    let count = cursor.read_u32()?;
    check_count(cursor, offset, count, ceiling, min_elem_size)
}

/// Validate a count that has already been read.
pub fn check_count(
    cursor: &ByteCursor<'_>,
    offset: usize,
    count: u32,
    ceiling: u32,
    min_elem_size: usize,
) -> Result<usize> {
    check_ceiling(offset, u64::from(count), ceiling)?;
    let needed = u64::from(count) * min_elem_size as u64;
    if needed > cursor.remaining() as u64 {
        return Err(Error::malformed(
            offset,
            format!(
                "count {} needs {} bytes, {} available",
                count,
                needed,
                cursor.remaining()
            ),
        ));
    }
    Ok(count as usize)
}

pub fn read_f32_array(cursor: &mut ByteCursor<'_>, count: usize) -> Result<Vec<f32>> {
    let mut values = Vec::with_capacity(count);
    for _ in 0..count {
        values.push(cursor.read_f32()?);
    }
    Ok(values)
}

pub fn read_color_array(cursor: &mut ByteCursor<'_>, count: usize) -> Result<Vec<Color>> {
    let mut values = Vec::with_capacity(count);
    for _ in 0..count {
        values.push(Color::read(cursor)?);
    }
    Ok(values)
}
