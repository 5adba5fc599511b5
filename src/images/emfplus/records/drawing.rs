/// EMF+ drawing records
///
/// Record bodies that draw or fill geometry. Pens, paths, regions, images
/// and fonts are referenced by object-table slot, usually through the low
/// byte of the record flags. Brushes are either a slot or an inline color.
use bitflags::bitflags;

use super::primitives::{
    Color, PointEncoding, PointF, RectF, Transform, check_count, record_flags,
};
use super::types::UnitType;
use crate::common::binary::{ByteCursor, parse_utf16le_string_len};
use crate::common::error::{Error, Result};
use crate::images::emfplus::object_table::OBJECT_TABLE_SIZE;
use crate::images::emfplus::options::DecodeOptions;
use crate::images::emfplus::transform::reconstruct;

/// Brush argument of a fill record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrushRef {
    Color(Color),
    Slot(u8),
}

impl BrushRef {
    /// Read the 32-bit brush field, interpreted through `SOLID_COLOR`.
    pub fn read(cursor: &mut ByteCursor<'_>, flags: u16) -> Result<Self> {
        let offset = cursor.offset();
        let value = cursor.read_u32()?;
        if record_flags::SOLID_COLOR.is_set(u32::from(flags)) {
            Ok(BrushRef::Color(Color::from_u32(value)))
        } else {
            Ok(BrushRef::Slot(slot_from_u32(value, offset)?))
        }
    }
}

/// Validate an object slot index.
pub fn slot_from_u32(value: u32, offset: usize) -> Result<u8> {
    if value as usize >= OBJECT_TABLE_SIZE {
        return Err(Error::malformed(
            offset,
            format!("object slot {} out of range", value),
        ));
    }
    Ok(value as u8)
}

/// Object slot carried in the low byte of the record flags.
pub fn slot_from_flags(flags: u16, offset: usize) -> Result<u8> {
    slot_from_u32(record_flags::OBJECT_ID.value(u32::from(flags)), offset)
}

/// Read `count` points in the encoding selected by the record flags.
///
/// Relative points are resolved against the previous point.
fn read_record_points(
    cursor: &mut ByteCursor<'_>,
    flags: u16,
    options: &DecodeOptions,
) -> Result<Vec<PointF>> {
    let encoding = PointEncoding::from_flags(u32::from(flags));
    let offset = cursor.offset();
    let count = cursor.read_u32()?;
    let count = check_count(
        cursor,
        offset,
        count,
        options.max_array_len,
        encoding.min_point_size(),
    )?;
    let points = encoding.read_points(cursor, count)?;
    if encoding == PointEncoding::Relative {
        // Relative streams end on a 4-byte boundary
        cursor.skip_padding(4);
        Ok(accumulate(points))
    } else {
        Ok(points)
    }
}

fn accumulate(points: Vec<PointF>) -> Vec<PointF> {
    let (mut x, mut y) = (0.0f32, 0.0f32);
    points
        .into_iter()
        .map(|p| {
            x += p.x;
            y += p.y;
            PointF::new(x, y)
        })
        .collect()
}

fn read_record_rects(
    cursor: &mut ByteCursor<'_>,
    flags: u16,
    options: &DecodeOptions,
) -> Result<Vec<RectF>> {
    let compressed = record_flags::COMPRESSED.is_set(u32::from(flags));
    let offset = cursor.offset();
    let count = cursor.read_u32()?;
    let count = check_count(
        cursor,
        offset,
        count,
        options.max_array_len,
        if compressed { 8 } else { 16 },
    )?;
    let mut rects = Vec::with_capacity(count);
    for _ in 0..count {
        rects.push(RectF::read_with_flags(cursor, flags)?);
    }
    Ok(rects)
}

#[derive(Debug, Clone, PartialEq)]
pub struct FillRects {
    pub brush: BrushRef,
    pub rects: Vec<RectF>,
}

impl FillRects {
    pub fn decode(cursor: &mut ByteCursor<'_>, flags: u16, options: &DecodeOptions) -> Result<Self> {
        let brush = BrushRef::read(cursor, flags)?;
        let rects = read_record_rects(cursor, flags, options)?;
        Ok(Self { brush, rects })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawRects {
    pub pen_slot: u8,
    pub rects: Vec<RectF>,
}

impl DrawRects {
    pub fn decode(cursor: &mut ByteCursor<'_>, flags: u16, options: &DecodeOptions) -> Result<Self> {
        let pen_slot = slot_from_flags(flags, cursor.offset())?;
        let rects = read_record_rects(cursor, flags, options)?;
        Ok(Self { pen_slot, rects })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FillPolygon {
    pub brush: BrushRef,
    pub points: Vec<PointF>,
}

impl FillPolygon {
    pub fn decode(cursor: &mut ByteCursor<'_>, flags: u16, options: &DecodeOptions) -> Result<Self> {
        let brush = BrushRef::read(cursor, flags)?;
        let points = read_record_points(cursor, flags, options)?;
        Ok(Self { brush, points })
    }
}

/// DrawLines and DrawBeziers.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawPoints {
    pub pen_slot: u8,
    /// Connect the last point back to the first (DrawLines only)
    pub closed: bool,
    pub points: Vec<PointF>,
}

impl DrawPoints {
    pub fn decode(cursor: &mut ByteCursor<'_>, flags: u16, options: &DecodeOptions) -> Result<Self> {
        let pen_slot = slot_from_flags(flags, cursor.offset())?;
        let closed = record_flags::CLOSED.is_set(u32::from(flags));
        let points = read_record_points(cursor, flags, options)?;
        Ok(Self {
            pen_slot,
            closed,
            points,
        })
    }
}

/// FillEllipse, or FillPie when the angles are present.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FillShape {
    pub brush: BrushRef,
    pub angles: Option<ArcAngles>,
    pub rect: RectF,
}

impl FillShape {
    pub fn decode(cursor: &mut ByteCursor<'_>, flags: u16, with_angles: bool) -> Result<Self> {
        let brush = BrushRef::read(cursor, flags)?;
        let angles = if with_angles {
            Some(ArcAngles::read(cursor)?)
        } else {
            None
        };
        let rect = RectF::read_with_flags(cursor, flags)?;
        Ok(Self {
            brush,
            angles,
            rect,
        })
    }
}

/// DrawEllipse, or DrawPie / DrawArc when the angles are present.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawShape {
    pub pen_slot: u8,
    pub angles: Option<ArcAngles>,
    pub rect: RectF,
}

impl DrawShape {
    pub fn decode(cursor: &mut ByteCursor<'_>, flags: u16, with_angles: bool) -> Result<Self> {
        let pen_slot = slot_from_flags(flags, cursor.offset())?;
        let angles = if with_angles {
            Some(ArcAngles::read(cursor)?)
        } else {
            None
        };
        let rect = RectF::read_with_flags(cursor, flags)?;
        Ok(Self {
            pen_slot,
            angles,
            rect,
        })
    }
}

/// Angles in degrees, clockwise from the x axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcAngles {
    pub start_angle: f32,
    pub sweep_angle: f32,
}

impl ArcAngles {
    fn read(cursor: &mut ByteCursor<'_>) -> Result<Self> {
        Ok(Self {
            start_angle: cursor.read_f32()?,
            sweep_angle: cursor.read_f32()?,
        })
    }
}

/// FillClosedCurve, DrawClosedCurve and DrawCurve.
#[derive(Debug, Clone, PartialEq)]
pub struct Curve {
    /// Pen slot for the draw records
    pub pen_slot: Option<u8>,
    /// Brush for FillClosedCurve
    pub brush: Option<BrushRef>,
    /// FillClosedCurve: winding instead of alternate fill
    pub winding: bool,
    pub tension: f32,
    /// DrawCurve: first point drawn and number of segments
    pub segment_range: Option<(u32, u32)>,
    pub points: Vec<PointF>,
}

impl Curve {
    pub fn decode_fill_closed(
        cursor: &mut ByteCursor<'_>,
        flags: u16,
        options: &DecodeOptions,
    ) -> Result<Self> {
        let brush = BrushRef::read(cursor, flags)?;
        let tension = cursor.read_f32()?;
        let points = read_record_points(cursor, flags, options)?;
        Ok(Self {
            pen_slot: None,
            brush: Some(brush),
            winding: record_flags::WINDING.is_set(u32::from(flags)),
            tension,
            segment_range: None,
            points,
        })
    }

    pub fn decode_draw_closed(
        cursor: &mut ByteCursor<'_>,
        flags: u16,
        options: &DecodeOptions,
    ) -> Result<Self> {
        let pen_slot = slot_from_flags(flags, cursor.offset())?;
        let tension = cursor.read_f32()?;
        let points = read_record_points(cursor, flags, options)?;
        Ok(Self {
            pen_slot: Some(pen_slot),
            brush: None,
            winding: false,
            tension,
            segment_range: None,
            points,
        })
    }

    pub fn decode_draw(cursor: &mut ByteCursor<'_>, flags: u16, options: &DecodeOptions) -> Result<Self> {
        let pen_slot = slot_from_flags(flags, cursor.offset())?;
        let tension = cursor.read_f32()?;
        let first = cursor.read_u32()?;
        let segments = cursor.read_u32()?;
        // DrawCurve has no relative form
        let points = read_record_points(cursor, flags & !0x0800, options)?;
        Ok(Self {
            pen_slot: Some(pen_slot),
            brush: None,
            winding: false,
            tension,
            segment_range: Some((first, segments)),
            points,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawImage {
    pub image_slot: u8,
    pub attributes_slot: u8,
    pub effect: bool,
    pub src_unit: UnitType,
    pub src_rect: RectF,
    pub dest_rect: RectF,
}

impl DrawImage {
    pub fn decode(cursor: &mut ByteCursor<'_>, flags: u16) -> Result<Self> {
        let image_slot = slot_from_flags(flags, cursor.offset())?;
        let attributes_offset = cursor.offset();
        let attributes_slot = slot_from_u32(cursor.read_u32()?, attributes_offset)?;
        let src_unit = UnitType::read(cursor)?;
        let src_rect = RectF::read(cursor)?;
        let dest_rect = RectF::read_with_flags(cursor, flags)?;
        Ok(Self {
            image_slot,
            attributes_slot,
            effect: record_flags::EFFECT.is_set(u32::from(flags)),
            src_unit,
            src_rect,
            dest_rect,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawImagePoints {
    pub image_slot: u8,
    pub attributes_slot: u8,
    pub effect: bool,
    pub src_unit: UnitType,
    pub src_rect: RectF,
    /// Where the source's upper-left, upper-right and lower-left corners land
    pub points: [PointF; 3],
    /// Transform taking `src_rect` onto `points`
    pub transform: Transform,
}

impl DrawImagePoints {
    pub fn decode(cursor: &mut ByteCursor<'_>, flags: u16, options: &DecodeOptions) -> Result<Self> {
        let image_slot = slot_from_flags(flags, cursor.offset())?;
        let attributes_offset = cursor.offset();
        let attributes_slot = slot_from_u32(cursor.read_u32()?, attributes_offset)?;
        let src_unit = UnitType::read(cursor)?;
        let src_rect = RectF::read(cursor)?;
        let points_offset = cursor.offset();
        let points = read_record_points(cursor, flags, options)?;
        let points: [PointF; 3] = points.try_into().map_err(|p: Vec<PointF>| {
            Error::malformed(
                points_offset,
                format!("expected 3 destination points, got {}", p.len()),
            )
        })?;
        let transform = reconstruct(&src_rect, &points, points_offset)?;
        Ok(Self {
            image_slot,
            attributes_slot,
            effect: record_flags::EFFECT.is_set(u32::from(flags)),
            src_unit,
            src_rect,
            points,
            transform,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawString {
    pub font_slot: u8,
    pub brush: BrushRef,
    pub format_slot: u8,
    pub layout_rect: RectF,
    pub text: String,
}

impl DrawString {
    pub fn decode(cursor: &mut ByteCursor<'_>, flags: u16, options: &DecodeOptions) -> Result<Self> {
        let font_slot = slot_from_flags(flags, cursor.offset())?;
        let brush = BrushRef::read(cursor, flags)?;
        let format_offset = cursor.offset();
        let format_slot = slot_from_u32(cursor.read_u32()?, format_offset)?;
        let length_offset = cursor.offset();
        let length = cursor.read_u32()?;
        let layout_rect = RectF::read(cursor)?;
        let length = check_count(cursor, length_offset, length, options.max_array_len, 2)?;
        let text = parse_utf16le_string_len(cursor.take(length * 2)?, length);
        cursor.skip_padding(4);
        Ok(Self {
            font_slot,
            brush,
            format_slot,
            layout_rect,
            text,
        })
    }
}

bitflags! {
    /// Driver string options (MS-EMFPLUS 2.1.2.3)
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DriverStringOptions: u32 {
        /// Glyphs are character codes rather than glyph indices
        const CMAP_LOOKUP = 0x0000_0001;
        const VERTICAL = 0x0000_0002;
        /// Only the first position is given; the rest follow the advances
        const REALIZED_ADVANCE = 0x0000_0004;
        const LIMIT_SUBPIXEL = 0x0000_0008;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawDriverString {
    pub font_slot: u8,
    pub brush: BrushRef,
    pub options: DriverStringOptions,
    pub glyphs: Vec<u16>,
    pub positions: Vec<PointF>,
    pub transform: Option<Transform>,
}

impl DrawDriverString {
    pub fn decode(cursor: &mut ByteCursor<'_>, flags: u16, options: &DecodeOptions) -> Result<Self> {
        let font_slot = slot_from_flags(flags, cursor.offset())?;
        let brush = BrushRef::read(cursor, flags)?;
        let string_options = DriverStringOptions::from_bits_retain(cursor.read_u32()?);
        let matrix_present = cursor.read_u32()? != 0;
        let count_offset = cursor.offset();
        let count = cursor.read_u32()?;
        let count = check_count(cursor, count_offset, count, options.max_array_len, 10)?;

        let mut glyphs = Vec::with_capacity(count);
        for _ in 0..count {
            glyphs.push(cursor.read_u16()?);
        }
        let positions = PointEncoding::Float.read_points(cursor, count)?;
        let transform = if matrix_present {
            Some(Transform::read(cursor)?)
        } else {
            None
        };
        cursor.skip_padding(4);

        Ok(Self {
            font_slot,
            brush,
            options: string_options,
            glyphs,
            positions,
            transform,
        })
    }

    /// The glyphs as text, when they are character codes.
    pub fn text(&self) -> Option<String> {
        if !self.options.contains(DriverStringOptions::CMAP_LOOKUP) {
            return None;
        }
        Some(
            char::decode_utf16(self.glyphs.iter().copied())
                .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bytes(words: &[u32]) -> Vec<u8> {
        words.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    #[test]
    fn test_fill_rects_with_inline_color() {
        let mut data = bytes(&[0xFF00_00FF, 2]);
        for v in [0i16, 0, 10, 10, 5, 5, 1, 1] {
            data.extend_from_slice(&v.to_le_bytes());
        }
        let mut cursor = ByteCursor::new(&data);
        let record = FillRects::decode(&mut cursor, 0xC000, &DecodeOptions::default()).unwrap();
        assert!(cursor.is_empty());
        assert_eq!(record.brush, BrushRef::Color(Color::from_u32(0xFF00_00FF)));
        assert_eq!(record.rects[1], RectF::new(5.0, 5.0, 1.0, 1.0));
    }

    #[test]
    fn test_brush_slot_out_of_range() {
        let data = bytes(&[70, 0]);
        let mut cursor = ByteCursor::new(&data);
        assert!(matches!(
            FillRects::decode(&mut cursor, 0, &DecodeOptions::default()),
            Err(Error::MalformedRecord { offset: 0, .. })
        ));
    }

    #[test]
    fn test_draw_lines_relative() {
        let mut data = bytes(&[3]);
        data.extend_from_slice(&[0x0A, 0x0A, 0x05, 0x00, 0x00, 0x05, 0x00, 0x00]);
        let mut cursor = ByteCursor::new(&data);
        let record = DrawPoints::decode(&mut cursor, 0x2802, &DecodeOptions::default()).unwrap();
        assert!(cursor.is_empty());
        assert_eq!(record.pen_slot, 2);
        assert!(record.closed);
        assert_eq!(
            record.points,
            vec![
                PointF::new(10.0, 10.0),
                PointF::new(15.0, 10.0),
                PointF::new(15.0, 15.0)
            ]
        );
    }

    #[test]
    fn test_draw_image_points_transform() {
        let mut data = bytes(&[0, 2]);
        for v in [0.0f32, 0.0, 4.0, 2.0] {
            data.extend_from_slice(&v.to_le_bytes());
        }
        data.extend(bytes(&[3]));
        for v in [10.0f32, 10.0, 18.0, 10.0, 10.0, 14.0] {
            data.extend_from_slice(&v.to_le_bytes());
        }
        let mut cursor = ByteCursor::new(&data);
        let record = DrawImagePoints::decode(&mut cursor, 0x0001, &DecodeOptions::default()).unwrap();
        assert!(cursor.is_empty());
        assert_eq!(record.image_slot, 1);
        assert_eq!(record.transform.to_array(), [2.0, 0.0, 0.0, 2.0, 10.0, 10.0]);
    }

    #[test]
    fn test_draw_image() {
        let mut data = bytes(&[5, 2]);
        for v in [0.0f32, 0.0, 4.0, 2.0, 10.0, 10.0, 8.0, 4.0] {
            data.extend_from_slice(&v.to_le_bytes());
        }
        let mut cursor = ByteCursor::new(&data);
        let record = DrawImage::decode(&mut cursor, 0x0002).unwrap();
        assert!(cursor.is_empty());
        assert_eq!(record.image_slot, 2);
        assert_eq!(record.attributes_slot, 5);
        assert_eq!(record.dest_rect, RectF::new(10.0, 10.0, 8.0, 4.0));
    }

    #[test]
    fn test_draw_image_attributes_slot_out_of_range() {
        let mut data = bytes(&[64, 2]);
        data.extend_from_slice(&[0u8; 32]);
        let mut cursor = ByteCursor::with_base(&data, 40);
        assert!(matches!(
            DrawImage::decode(&mut cursor, 0x0002),
            Err(Error::MalformedRecord { offset: 40, .. })
        ));
    }

    #[test]
    fn test_draw_image_points_needs_three_points() {
        let mut data = bytes(&[0, 2]);
        for v in [0.0f32, 0.0, 4.0, 2.0] {
            data.extend_from_slice(&v.to_le_bytes());
        }
        data.extend(bytes(&[2]));
        data.extend_from_slice(&[0u8; 16]);
        let mut cursor = ByteCursor::new(&data);
        assert!(matches!(
            DrawImagePoints::decode(&mut cursor, 0, &DecodeOptions::default()),
            Err(Error::MalformedRecord { offset: 24, .. })
        ));
    }

    #[test]
    fn test_draw_string() {
        let mut data = bytes(&[0x0000_00FF, 4, 2]);
        for v in [0.0f32, 0.0, 100.0, 20.0] {
            data.extend_from_slice(&v.to_le_bytes());
        }
        for c in "Hi".encode_utf16() {
            data.extend_from_slice(&c.to_le_bytes());
        }
        let mut cursor = ByteCursor::new(&data);
        let record = DrawString::decode(&mut cursor, 0x8003, &DecodeOptions::default()).unwrap();
        assert!(cursor.is_empty());
        assert_eq!(record.font_slot, 3);
        assert_eq!(record.text, "Hi");
        assert_eq!(record.format_slot, 4);
    }

    #[test]
    fn test_draw_driver_string() {
        let mut data = bytes(&[1, DriverStringOptions::CMAP_LOOKUP.bits(), 0, 3]);
        for c in "abc".encode_utf16() {
            data.extend_from_slice(&c.to_le_bytes());
        }
        for v in [0.0f32, 0.0, 5.0, 0.0, 10.0, 0.0] {
            data.extend_from_slice(&v.to_le_bytes());
        }
        data.extend_from_slice(&[0, 0]);
        let mut cursor = ByteCursor::new(&data);
        let record = DrawDriverString::decode(&mut cursor, 0x0000, &DecodeOptions::default()).unwrap();
        assert!(cursor.is_empty());
        assert_eq!(record.brush, BrushRef::Slot(1));
        assert_eq!(record.text().as_deref(), Some("abc"));
        assert_eq!(record.positions[2], PointF::new(10.0, 0.0));
    }
}
