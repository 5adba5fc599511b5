/// EMF+ custom line caps
///
/// Used both as a top-level object and embedded in pens as custom start and
/// end caps.
use bitflags::bitflags;

use super::path::Path;
use super::primitives::{GraphicsVersion, PointF};
use super::types::{LineCapType, LineJoin};
use crate::common::binary::ByteCursor;
use crate::common::error::{Error, Result};
use crate::images::emfplus::options::{DecodeOptions, check_ceiling};

bitflags! {
    /// Custom line cap data flags (MS-EMFPLUS 2.1.2.2)
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CustomLineCapFlags: u32 {
        const FILL_PATH = 0x0000_0001;
        const LINE_PATH = 0x0000_0002;
    }
}

/// Stroke settings shared by both cap kinds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CapStroke {
    pub start_cap: LineCapType,
    pub end_cap: LineCapType,
    pub join: LineJoin,
    pub miter_limit: f32,
    pub width_scale: f32,
    /// Reserved by GDI+, kept as stored
    pub fill_hot_spot: PointF,
    pub line_hot_spot: PointF,
}

impl CapStroke {
    fn read(cursor: &mut ByteCursor<'_>) -> Result<Self> {
        Ok(Self {
            start_cap: LineCapType::read(cursor)?,
            end_cap: LineCapType::read(cursor)?,
            join: LineJoin::read(cursor)?,
            miter_limit: cursor.read_f32()?,
            width_scale: cursor.read_f32()?,
            fill_hot_spot: PointF::new(cursor.read_f32()?, cursor.read_f32()?),
            line_hot_spot: PointF::new(cursor.read_f32()?, cursor.read_f32()?),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CustomLineCapData {
    /// Cap outlined and/or filled by paths
    Default {
        flags: CustomLineCapFlags,
        base_cap: LineCapType,
        base_inset: f32,
        stroke: CapStroke,
        fill_path: Option<Path>,
        line_path: Option<Path>,
    },
    AdjustableArrow {
        width: f32,
        height: f32,
        middle_inset: f32,
        filled: bool,
        stroke: CapStroke,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CustomLineCap {
    pub version: GraphicsVersion,
    pub data: CustomLineCapData,
}

impl CustomLineCap {
    /// Decode a cap occupying the rest of the cursor.
    pub fn decode(cursor: &mut ByteCursor<'_>, options: &DecodeOptions) -> Result<Self> {
        let version = GraphicsVersion::read(cursor)?;
        let kind = cursor.read_u32()?;

        let data = if kind != 0 {
            CustomLineCapData::AdjustableArrow {
                width: cursor.read_f32()?,
                height: cursor.read_f32()?,
                middle_inset: cursor.read_f32()?,
                filled: cursor.read_u32()? != 0,
                stroke: CapStroke::read(cursor)?,
            }
        } else {
            let flags = CustomLineCapFlags::from_bits_retain(cursor.read_u32()?);
            let base_cap = LineCapType::read(cursor)?;
            let base_inset = cursor.read_f32()?;
            let stroke = CapStroke::read(cursor)?;
            let fill_path = if flags.contains(CustomLineCapFlags::FILL_PATH) {
                Some(read_cap_path(cursor, options)?)
            } else {
                None
            };
            let line_path = if flags.contains(CustomLineCapFlags::LINE_PATH) {
                Some(read_cap_path(cursor, options)?)
            } else {
                None
            };
            CustomLineCapData::Default {
                flags,
                base_cap,
                base_inset,
                stroke,
                fill_path,
                line_path,
            }
        };

        Ok(Self { version, data })
    }

    /// Decode a pen-embedded cap: a byte size followed by the cap.
    pub fn decode_sized(cursor: &mut ByteCursor<'_>, options: &DecodeOptions) -> Result<Self> {
        let offset = cursor.offset();
        let size = cursor.read_u32()?;
        check_ceiling(offset, u64::from(size), options.max_object_size)?;
        let mut sub = cursor.sub_cursor(size as usize)?;
        let cap = Self::decode(&mut sub, options)?;
        if !sub.is_empty() {
            return Err(Error::malformed(
                offset,
                format!("custom line cap left {} of {} bytes unread", sub.remaining(), size),
            ));
        }
        Ok(cap)
    }

    pub fn stroke(&self) -> &CapStroke {
        match &self.data {
            CustomLineCapData::Default { stroke, .. }
            | CustomLineCapData::AdjustableArrow { stroke, .. } => stroke,
        }
    }
}

fn read_cap_path(cursor: &mut ByteCursor<'_>, options: &DecodeOptions) -> Result<Path> {
    let offset = cursor.offset();
    let size = cursor.read_i32()?;
    let size = usize::try_from(size)
        .map_err(|_| Error::malformed(offset, format!("negative cap path length {}", size)))?;
    check_ceiling(offset, size as u64, options.max_object_size)?;
    Path::decode_sized(cursor, size, options)
}
