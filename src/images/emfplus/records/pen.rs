/// EMF+ pen objects
///
/// A pen is a fixed prefix, up to thirteen optional fields each announced
/// by its own flag bit, and a trailing brush that paints the stroke.
use bitflags::bitflags;
use tracing::warn;

use super::brush::Brush;
use super::line_cap::CustomLineCap;
use super::primitives::{GraphicsVersion, Transform, read_count, read_f32_array};
use super::types::{DashedLineCapType, LineCapType, LineJoin, LineStyle, PenAlignment, UnitType};
use crate::common::binary::ByteCursor;
use crate::common::error::{Error, Result};
use crate::images::emfplus::device_context::{DrawingContext, Fill, Stroke};
use crate::images::emfplus::options::DecodeOptions;

bitflags! {
    /// Pen data flags (MS-EMFPLUS 2.1.2.7)
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PenDataFlags: u32 {
        const TRANSFORM = 0x0000_0001;
        const START_CAP = 0x0000_0002;
        const END_CAP = 0x0000_0004;
        const JOIN = 0x0000_0008;
        const MITER_LIMIT = 0x0000_0010;
        const LINE_STYLE = 0x0000_0020;
        const DASHED_LINE_CAP = 0x0000_0040;
        const DASHED_LINE_OFFSET = 0x0000_0080;
        const DASHED_LINE = 0x0000_0100;
        const NON_CENTER = 0x0000_0200;
        const COMPOUND_LINE = 0x0000_0400;
        const CUSTOM_START_CAP = 0x0000_0800;
        const CUSTOM_END_CAP = 0x0000_1000;
    }
}

/// GDI+ default miter limit.
pub const DEFAULT_MITER_LIMIT: f32 = 10.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Pen {
    pub version: GraphicsVersion,
    pub flags: PenDataFlags,
    pub unit: UnitType,
    pub width: f32,
    pub transform: Option<Transform>,
    pub start_cap: Option<LineCapType>,
    pub end_cap: Option<LineCapType>,
    pub join: Option<LineJoin>,
    pub miter_limit: Option<f32>,
    pub line_style: Option<LineStyle>,
    pub dashed_line_cap: Option<DashedLineCapType>,
    pub dash_offset: Option<f32>,
    /// Dash and gap lengths in multiples of the pen width
    pub dash_pattern: Option<Vec<f32>>,
    pub alignment: Option<PenAlignment>,
    pub compound_line: Option<Vec<f32>>,
    pub custom_start_cap: Option<CustomLineCap>,
    pub custom_end_cap: Option<CustomLineCap>,
    pub brush: Brush,
}

impl Pen {
    /// Decode a pen occupying the rest of the cursor.
    pub fn decode(cursor: &mut ByteCursor<'_>, options: &DecodeOptions) -> Result<Self> {
        let version = GraphicsVersion::read(cursor)?;
        let pen_type = cursor.read_u32()?;
        if pen_type != 0 {
            warn!(pen_type, "non-zero pen type");
        }
        let flags = PenDataFlags::from_bits_retain(cursor.read_u32()?);
        let unit = UnitType::read(cursor)?;
        let width = cursor.read_f32()?;

        let transform = if flags.contains(PenDataFlags::TRANSFORM) {
            Some(Transform::read(cursor)?)
        } else {
            None
        };
        let start_cap = read_if(cursor, flags, PenDataFlags::START_CAP, LineCapType::read)?;
        let end_cap = read_if(cursor, flags, PenDataFlags::END_CAP, LineCapType::read)?;
        let join = read_if(cursor, flags, PenDataFlags::JOIN, LineJoin::read)?;
        let miter_limit = read_if(cursor, flags, PenDataFlags::MITER_LIMIT, read_f32)?;
        let line_style = read_if(cursor, flags, PenDataFlags::LINE_STYLE, LineStyle::read)?;
        let dashed_line_cap = read_if(
            cursor,
            flags,
            PenDataFlags::DASHED_LINE_CAP,
            DashedLineCapType::read,
        )?;
        let dash_offset = read_if(cursor, flags, PenDataFlags::DASHED_LINE_OFFSET, read_f32)?;
        let dash_pattern = if flags.contains(PenDataFlags::DASHED_LINE) {
            let count = read_count(cursor, options.max_dash_count, 4)?;
            Some(read_f32_array(cursor, count)?)
        } else {
            None
        };
        let alignment = read_if(cursor, flags, PenDataFlags::NON_CENTER, PenAlignment::read)?;
        let compound_line = if flags.contains(PenDataFlags::COMPOUND_LINE) {
            let offset = cursor.offset();
            let count = read_count(cursor, options.max_dash_count, 4)?;
            let values = read_f32_array(cursor, count)?;
            validate_compound_line(offset, &values)?;
            Some(values)
        } else {
            None
        };
        let custom_start_cap = if flags.contains(PenDataFlags::CUSTOM_START_CAP) {
            Some(CustomLineCap::decode_sized(cursor, options)?)
        } else {
            None
        };
        let custom_end_cap = if flags.contains(PenDataFlags::CUSTOM_END_CAP) {
            Some(CustomLineCap::decode_sized(cursor, options)?)
        } else {
            None
        };

        let brush = Brush::decode(cursor, options)?;

        Ok(Self {
            version,
            flags,
            unit,
            width,
            transform,
            start_cap,
            end_cap,
            join,
            miter_limit,
            line_style,
            dashed_line_cap,
            dash_offset,
            dash_pattern,
            alignment,
            compound_line,
            custom_start_cap,
            custom_end_cap,
            brush,
        })
    }

    /// Dash pattern in effect: the explicit array, else the pattern implied
    /// by the line style.
    pub fn effective_dash_pattern(&self) -> Option<Vec<f32>> {
        if let Some(pattern) = &self.dash_pattern {
            return Some(pattern.clone());
        }
        let pattern: &[f32] = match self.line_style? {
            LineStyle::Solid | LineStyle::Custom => return None,
            LineStyle::Dash => &[3.0, 1.0],
            LineStyle::Dot => &[1.0, 1.0],
            LineStyle::DashDot => &[3.0, 1.0, 1.0, 1.0],
            LineStyle::DashDotDot => &[3.0, 1.0, 1.0, 1.0, 1.0, 1.0],
        };
        Some(pattern.to_vec())
    }

    pub fn to_stroke(&self) -> Stroke {
        let mut stroke = Stroke {
            width: self.width,
            unit: self.unit,
            start_cap: self.start_cap.unwrap_or(LineCapType::Flat),
            end_cap: self.end_cap.unwrap_or(LineCapType::Flat),
            join: self.join.unwrap_or(LineJoin::Miter),
            miter_limit: self.miter_limit.unwrap_or(DEFAULT_MITER_LIMIT),
            dash_pattern: self.effective_dash_pattern(),
            dash_offset: self.dash_offset.unwrap_or(0.0),
            alignment: self.alignment.unwrap_or(PenAlignment::Center),
            compound_line: self.compound_line.clone(),
            transform: self.transform.unwrap_or_default(),
            fill: Fill::None,
        };
        self.brush.apply_to_stroke(&mut stroke);
        stroke
    }

    pub fn apply_to(&self, ctx: &mut dyn DrawingContext) {
        ctx.set_stroke(self.to_stroke());
    }
}

fn read_f32(cursor: &mut ByteCursor<'_>) -> Result<f32> {
    Ok(cursor.read_f32()?)
}

fn read_if<T>(
    cursor: &mut ByteCursor<'_>,
    flags: PenDataFlags,
    bit: PenDataFlags,
    read: impl FnOnce(&mut ByteCursor<'_>) -> Result<T>,
) -> Result<Option<T>> {
    if flags.contains(bit) {
        read(cursor).map(Some)
    } else {
        Ok(None)
    }
}

/// Compound line positions are non-decreasing fractions in `[0, 1]`.
fn validate_compound_line(offset: usize, values: &[f32]) -> Result<()> {
    if values.iter().any(|v| !(0.0..=1.0).contains(v)) {
        return Err(Error::malformed(offset, "compound line value outside [0, 1]"));
    }
    if values.windows(2).any(|w| w[1] < w[0]) {
        return Err(Error::malformed(offset, "compound line values decrease"));
    }
    Ok(())
}
