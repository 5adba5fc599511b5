/// EMF+ path objects
///
/// A path is a point list with a parallel array of point-type bytes. Points
/// come in one of three encodings and the type array may be run-length
/// compressed.
use bitflags::bitflags;
use tracing::warn;

use super::primitives::{GraphicsVersion, PointEncoding, PointF, check_count};
use crate::common::binary::ByteCursor;
use crate::common::error::{Error, Result};
use crate::images::emfplus::device_context::DrawingContext;
use crate::images::emfplus::options::DecodeOptions;

bitflags! {
    /// Path point flags (MS-EMFPLUS 2.2.1.6)
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PathPointFlags: u16 {
        /// Points are relative 7/15-bit offsets
        const RELATIVE = 0x0800;
        /// Point types are run-length encoded
        const RLE_COMPRESSED = 0x1000;
        /// Points are 16-bit integers
        const COMPRESSED = 0x4000;
    }
}

/// Geometry of a single path point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointKind {
    Start,
    Line,
    Unused,
    Bezier,
}

/// One point-type byte: a kind in the low nibble plus flag bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PointType(pub u8);

impl PointType {
    pub const KIND_MASK: u8 = 0x0F;
    pub const DASHED: u8 = 0x10;
    pub const MARKER: u8 = 0x20;
    pub const CLOSE: u8 = 0x80;

    /// `None` for kind values 4..=15.
    pub fn kind(self) -> Option<PointKind> {
        match self.0 & Self::KIND_MASK {
            0 => Some(PointKind::Start),
            1 => Some(PointKind::Line),
            2 => Some(PointKind::Unused),
            3 => Some(PointKind::Bezier),
            _ => None,
        }
    }

    pub fn is_dashed(self) -> bool {
        self.0 & Self::DASHED != 0
    }

    pub fn is_marker(self) -> bool {
        self.0 & Self::MARKER != 0
    }

    pub fn is_closed(self) -> bool {
        self.0 & Self::CLOSE != 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    pub version: GraphicsVersion,
    pub flags: PathPointFlags,
    /// Decoded points; raw offsets when [`PathPointFlags::RELATIVE`] is set
    pub points: Vec<PointF>,
    pub point_types: Vec<PointType>,
}

impl Path {
    pub fn encoding(&self) -> PointEncoding {
        PointEncoding::from_flags(u32::from(self.flags.bits()))
    }

    /// Decode a path that occupies the whole cursor.
    pub fn decode(cursor: &mut ByteCursor<'_>, options: &DecodeOptions) -> Result<Self> {
        let version = GraphicsVersion::read(cursor)?;
        let count_offset = cursor.offset();
        let count = cursor.read_u32()?;
        let raw_flags = cursor.read_u16()?;
        let reserved = cursor.read_u16()?;
        if reserved != 0 {
            warn!(reserved, "non-zero reserved field in path point flags");
        }
        let flags = PathPointFlags::from_bits_retain(raw_flags);
        let encoding = PointEncoding::from_flags(u32::from(raw_flags));
        let count = check_count(
            cursor,
            count_offset,
            count,
            options.max_array_len,
            encoding.min_point_size(),
        )?;

        let points = encoding.read_points(cursor, count)?;
        let point_types = if flags.contains(PathPointFlags::RLE_COMPRESSED) {
            read_rle_point_types(cursor, count)?
        } else {
            cursor.take(count)?.iter().map(|&b| PointType(b)).collect()
        };
        cursor.skip_padding(4);

        Ok(Self {
            version,
            flags,
            points,
            point_types,
        })
    }

    /// Decode a nested path of `size` bytes, which must be consumed exactly.
    pub fn decode_sized(
        cursor: &mut ByteCursor<'_>,
        size: usize,
        options: &DecodeOptions,
    ) -> Result<Self> {
        let offset = cursor.offset();
        let mut sub = cursor.sub_cursor(size)?;
        let path = Self::decode(&mut sub, options)?;
        if !sub.is_empty() {
            return Err(Error::malformed(
                offset,
                format!("embedded path left {} of {} bytes unread", sub.remaining(), size),
            ));
        }
        Ok(path)
    }

    /// Points in absolute coordinates.
    ///
    /// Relative points are offsets from the previous point, the first one
    /// from the origin.
    pub fn absolute_points(&self) -> Vec<PointF> {
        if !self.flags.contains(PathPointFlags::RELATIVE) {
            return self.points.clone();
        }
        let mut x = 0.0f32;
        let mut y = 0.0f32;
        self.points
            .iter()
            .map(|p| {
                x += p.x;
                y += p.y;
                PointF::new(x, y)
            })
            .collect()
    }

    /// Indices of points that start a new figure.
    pub fn figure_starts(&self) -> Vec<usize> {
        self.point_types
            .iter()
            .enumerate()
            .filter(|(_, t)| t.kind() == Some(PointKind::Start))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn apply_to(&self, ctx: &mut dyn DrawingContext) {
        ctx.set_path(self);
    }
}

/// Expand a run-length encoded point-type array.
///
/// Each run is a control byte (bit 7 marks a bezier run, bits 0..6 hold the
/// run length) followed by the type byte. Runs fill consecutive entries
/// from the current position.
fn read_rle_point_types(cursor: &mut ByteCursor<'_>, count: usize) -> Result<Vec<PointType>> {
    let mut types = Vec::with_capacity(count);
    while types.len() < count {
        let offset = cursor.offset();
        let control = cursor.read_u8()?;
        let mut point_type = cursor.read_u8()?;
        let run = usize::from(control & 0x3F);
        if run == 0 {
            return Err(Error::malformed(offset, "zero-length point type run"));
        }
        if types.len() + run > count {
            return Err(Error::malformed(
                offset,
                format!(
                    "point type run of {} overflows {} remaining entries",
                    run,
                    count - types.len()
                ),
            ));
        }
        if control & 0x80 != 0 {
            point_type = (point_type & !PointType::KIND_MASK) | 3;
        }
        types.extend(std::iter::repeat_n(PointType(point_type), run));
    }
    Ok(types)
}
