//! Decoded EMF+ records and the per-type dispatch.

use tracing::{debug, trace};

use super::object_table::{ObjectChunk, ObjectTable, ObjectUpdate};
use super::options::DecodeOptions;
use super::records::drawing::{
    BrushRef, Curve, DrawDriverString, DrawImage, DrawImagePoints, DrawPoints, DrawRects,
    DrawShape, DrawString, FillPolygon, FillRects, FillShape, slot_from_flags, slot_from_u32,
};
use super::records::primitives::{Color, GraphicsVersion, RectF, Transform, record_flags};
use super::records::types::{CombineMode, EmfPlusRecordType, ObjectType, UnitType};
use crate::common::binary::ByteCursor;
use crate::common::error::{Error, Result};

/// EMF+ header record contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmfPlusHeader {
    pub version: GraphicsVersion,
    /// Metafile is EMF+ dual (has a plain EMF rendering too)
    pub dual: bool,
    /// Recorded against a video display rather than a printer
    pub video_display: bool,
    pub dpi_x: u32,
    pub dpi_y: u32,
}

/// Outcome of an Object record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectRecord {
    pub slot: u8,
    /// Raw object type from the record flags
    pub object_type: u8,
    pub continuable: bool,
    pub update: ObjectUpdate,
}

impl ObjectRecord {
    pub fn kind(&self) -> Option<ObjectType> {
        ObjectType::from_u32(u32::from(self.object_type))
    }
}

/// Interpreted payload of one record.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordBody {
    Header(EmfPlusHeader),
    EndOfFile,
    Object(ObjectRecord),

    Clear(Color),
    FillRects(FillRects),
    DrawRects(DrawRects),
    FillPolygon(FillPolygon),
    DrawLines(DrawPoints),
    FillEllipse(FillShape),
    DrawEllipse(DrawShape),
    FillPie(FillShape),
    DrawPie(DrawShape),
    DrawArc(DrawShape),
    FillRegion { brush: BrushRef, region_slot: u8 },
    FillPath { brush: BrushRef, path_slot: u8 },
    DrawPath { pen_slot: u8, path_slot: u8 },
    FillClosedCurve(Curve),
    DrawClosedCurve(Curve),
    DrawCurve(Curve),
    DrawBeziers(DrawPoints),
    DrawImage(DrawImage),
    DrawImagePoints(DrawImagePoints),
    DrawString(DrawString),
    DrawDriverString(DrawDriverString),
    StrokeFillPath { path_slot: u8 },

    SetRenderingOrigin { x: i32, y: i32 },
    SetAntiAliasMode { smoothing: bool, mode: u8 },
    SetTextRenderingHint(u8),
    SetTextContrast(u16),
    SetInterpolationMode(u8),
    SetPixelOffsetMode(u8),
    SetCompositingMode(u8),
    SetCompositingQuality(u8),

    Save(u32),
    Restore(u32),
    BeginContainer {
        page_unit: UnitType,
        dest_rect: RectF,
        src_rect: RectF,
        stack_index: u32,
    },
    BeginContainerNoParams(u32),
    EndContainer(u32),

    SetWorldTransform(Transform),
    ResetWorldTransform,
    MultiplyWorldTransform { transform: Transform, post_multiply: bool },
    TranslateWorldTransform { dx: f32, dy: f32, post_multiply: bool },
    ScaleWorldTransform { sx: f32, sy: f32, post_multiply: bool },
    RotateWorldTransform { angle: f32, post_multiply: bool },
    SetPageTransform { page_unit: UnitType, scale: f32 },

    ResetClip,
    SetClipRect { mode: CombineMode, rect: RectF },
    SetClipPath { mode: CombineMode, path_slot: u8 },
    SetClipRegion { mode: CombineMode, region_slot: u8 },
    OffsetClip { dx: f32, dy: f32 },

    /// Opaque or unrecognised record, payload kept verbatim
    Unknown { payload: Vec<u8> },
}

/// One decoded record.
#[derive(Debug, Clone, PartialEq)]
pub struct EmfPlusRecord {
    /// Absolute offset of the record header
    pub offset: usize,
    /// Raw type code
    pub type_code: u16,
    pub record_type: Option<EmfPlusRecordType>,
    pub flags: u16,
    pub data_size: u32,
    pub body: RecordBody,
}

fn combine_mode(flags: u16, offset: usize) -> Result<CombineMode> {
    let value = record_flags::COMBINE_MODE.value(u32::from(flags));
    CombineMode::from_u32(value)
        .ok_or_else(|| Error::malformed(offset, format!("invalid combine mode {}", value)))
}

fn unit_from(value: u32, offset: usize) -> Result<UnitType> {
    UnitType::from_u32(value)
        .ok_or_else(|| Error::malformed(offset, format!("invalid page unit {}", value)))
}

/// Decode a record payload.
///
/// The payload cursor must be consumed exactly; Object records update
/// `table` as a side effect.
pub(crate) fn decode_body(
    record_type: Option<EmfPlusRecordType>,
    flags: u16,
    cursor: &mut ByteCursor<'_>,
    table: &mut ObjectTable,
    options: &DecodeOptions,
) -> Result<RecordBody> {
    use EmfPlusRecordType as T;

    let offset = cursor.offset();
    let Some(record_type) = record_type else {
        table.ensure_no_open_continuation(offset, "unknown record")?;
        debug!(offset, bytes = cursor.remaining(), "captured unknown record verbatim");
        return Ok(RecordBody::Unknown {
            payload: cursor.take_rest().to_vec(),
        });
    };

    if record_type != T::Object {
        table.ensure_no_open_continuation(offset, record_type.name())?;
    }

    let flag_word = u32::from(flags);
    let post_multiply = record_flags::POST_MULTIPLY.is_set(flag_word);

    let body = match record_type {
        T::Header => {
            let version = GraphicsVersion::read(cursor)?;
            let emf_plus_flags = cursor.read_u32()?;
            let dpi_x = cursor.read_u32()?;
            let dpi_y = cursor.read_u32()?;
            RecordBody::Header(EmfPlusHeader {
                version,
                dual: flags & 0x0001 != 0,
                video_display: emf_plus_flags & 0x0001 != 0,
                dpi_x,
                dpi_y,
            })
        },
        T::EndOfFile => {
            table.clear();
            RecordBody::EndOfFile
        },
        T::Object => {
            let slot = record_flags::OBJECT_ID.value(flag_word) as u8;
            let object_type = record_flags::OBJECT_TYPE.value(flag_word) as u8;
            let continuable = record_flags::CONTINUABLE.is_set(flag_word);
            let total_size = if continuable {
                Some(cursor.read_u32()?)
            } else {
                None
            };
            let data_offset = cursor.offset();
            let data = cursor.take_rest();
            let update = table.begin_object(
                ObjectChunk {
                    slot,
                    object_type,
                    total_size,
                    data,
                    offset: data_offset,
                },
                options,
            )?;
            RecordBody::Object(ObjectRecord {
                slot,
                object_type,
                continuable,
                update,
            })
        },

        T::Clear => RecordBody::Clear(Color::read(cursor)?),
        T::FillRects => RecordBody::FillRects(FillRects::decode(cursor, flags, options)?),
        T::DrawRects => RecordBody::DrawRects(DrawRects::decode(cursor, flags, options)?),
        T::FillPolygon => RecordBody::FillPolygon(FillPolygon::decode(cursor, flags, options)?),
        T::DrawLines => RecordBody::DrawLines(DrawPoints::decode(cursor, flags, options)?),
        T::FillEllipse => RecordBody::FillEllipse(FillShape::decode(cursor, flags, false)?),
        T::DrawEllipse => RecordBody::DrawEllipse(DrawShape::decode(cursor, flags, false)?),
        T::FillPie => RecordBody::FillPie(FillShape::decode(cursor, flags, true)?),
        T::DrawPie => RecordBody::DrawPie(DrawShape::decode(cursor, flags, true)?),
        T::DrawArc => RecordBody::DrawArc(DrawShape::decode(cursor, flags, true)?),
        T::FillRegion => RecordBody::FillRegion {
            region_slot: slot_from_flags(flags, offset)?,
            brush: BrushRef::read(cursor, flags)?,
        },
        T::FillPath => RecordBody::FillPath {
            path_slot: slot_from_flags(flags, offset)?,
            brush: BrushRef::read(cursor, flags)?,
        },
        T::DrawPath => {
            let path_slot = slot_from_flags(flags, offset)?;
            let pen_offset = cursor.offset();
            let pen_slot = slot_from_u32(cursor.read_u32()?, pen_offset)?;
            RecordBody::DrawPath {
                pen_slot,
                path_slot,
            }
        },
        T::FillClosedCurve => {
            RecordBody::FillClosedCurve(Curve::decode_fill_closed(cursor, flags, options)?)
        },
        T::DrawClosedCurve => {
            RecordBody::DrawClosedCurve(Curve::decode_draw_closed(cursor, flags, options)?)
        },
        T::DrawCurve => RecordBody::DrawCurve(Curve::decode_draw(cursor, flags, options)?),
        T::DrawBeziers => RecordBody::DrawBeziers(DrawPoints::decode(cursor, flags, options)?),
        T::DrawImage => RecordBody::DrawImage(DrawImage::decode(cursor, flags)?),
        T::DrawImagePoints => {
            RecordBody::DrawImagePoints(DrawImagePoints::decode(cursor, flags, options)?)
        },
        T::DrawString => RecordBody::DrawString(DrawString::decode(cursor, flags, options)?),
        T::DrawDriverString => {
            RecordBody::DrawDriverString(DrawDriverString::decode(cursor, flags, options)?)
        },
        T::StrokeFillPath => RecordBody::StrokeFillPath {
            path_slot: slot_from_flags(flags, offset)?,
        },

        T::SetRenderingOrigin => RecordBody::SetRenderingOrigin {
            x: cursor.read_i32()?,
            y: cursor.read_i32()?,
        },
        T::SetAntiAliasMode => RecordBody::SetAntiAliasMode {
            smoothing: flags & 0x0001 != 0,
            mode: ((flags >> 1) & 0x7F) as u8,
        },
        T::SetTextRenderingHint => RecordBody::SetTextRenderingHint(flags as u8),
        T::SetTextContrast => RecordBody::SetTextContrast(flags & 0x0FFF),
        T::SetInterpolationMode => RecordBody::SetInterpolationMode(flags as u8),
        T::SetPixelOffsetMode => RecordBody::SetPixelOffsetMode(flags as u8),
        T::SetCompositingMode => RecordBody::SetCompositingMode(flags as u8),
        T::SetCompositingQuality => RecordBody::SetCompositingQuality(flags as u8),

        T::Save => RecordBody::Save(cursor.read_u32()?),
        T::Restore => RecordBody::Restore(cursor.read_u32()?),
        T::BeginContainer => RecordBody::BeginContainer {
            page_unit: unit_from(record_flags::PAGE_UNIT.value(flag_word), offset)?,
            dest_rect: RectF::read(cursor)?,
            src_rect: RectF::read(cursor)?,
            stack_index: cursor.read_u32()?,
        },
        T::BeginContainerNoParams => RecordBody::BeginContainerNoParams(cursor.read_u32()?),
        T::EndContainer => RecordBody::EndContainer(cursor.read_u32()?),

        T::SetWorldTransform => RecordBody::SetWorldTransform(Transform::read(cursor)?),
        T::ResetWorldTransform => RecordBody::ResetWorldTransform,
        T::MultiplyWorldTransform => RecordBody::MultiplyWorldTransform {
            transform: Transform::read(cursor)?,
            post_multiply,
        },
        T::TranslateWorldTransform => RecordBody::TranslateWorldTransform {
            dx: cursor.read_f32()?,
            dy: cursor.read_f32()?,
            post_multiply,
        },
        T::ScaleWorldTransform => RecordBody::ScaleWorldTransform {
            sx: cursor.read_f32()?,
            sy: cursor.read_f32()?,
            post_multiply,
        },
        T::RotateWorldTransform => RecordBody::RotateWorldTransform {
            angle: cursor.read_f32()?,
            post_multiply,
        },
        T::SetPageTransform => RecordBody::SetPageTransform {
            page_unit: unit_from(flag_word & 0xFF, offset)?,
            scale: cursor.read_f32()?,
        },

        T::ResetClip => RecordBody::ResetClip,
        T::SetClipRect => RecordBody::SetClipRect {
            mode: combine_mode(flags, offset)?,
            rect: RectF::read(cursor)?,
        },
        T::SetClipPath => RecordBody::SetClipPath {
            mode: combine_mode(flags, offset)?,
            path_slot: slot_from_flags(flags, offset)?,
        },
        T::SetClipRegion => RecordBody::SetClipRegion {
            mode: combine_mode(flags, offset)?,
            region_slot: slot_from_flags(flags, offset)?,
        },
        T::OffsetClip => RecordBody::OffsetClip {
            dx: cursor.read_f32()?,
            dy: cursor.read_f32()?,
        },

        opaque => {
            debug_assert!(opaque.is_opaque());
            debug!(record = opaque.name(), offset, "captured opaque record verbatim");
            RecordBody::Unknown {
                payload: cursor.take_rest().to_vec(),
            }
        },
    };

    trace!(record = record_type.name(), offset, "decoded record body");
    Ok(body)
}
