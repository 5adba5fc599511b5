/// EMF+ region objects
///
/// A region is a binary tree: interior nodes combine two child regions with
/// a set operation, leaves are rectangles, paths, or the empty and infinite
/// regions.
use tracing::warn;

use super::path::Path;
use super::primitives::{GraphicsVersion, RectF};
use crate::common::binary::ByteCursor;
use crate::common::error::{Error, Result};
use crate::images::emfplus::device_context::DrawingContext;
use crate::images::emfplus::options::{DecodeOptions, check_ceiling};

/// Region node type codes (MS-EMFPLUS 2.1.1.27)
pub mod node_type {
    pub const AND: u32 = 0x0000_0001;
    pub const OR: u32 = 0x0000_0002;
    pub const XOR: u32 = 0x0000_0003;
    pub const EXCLUDE: u32 = 0x0000_0004;
    pub const COMPLEMENT: u32 = 0x0000_0005;
    pub const RECT: u32 = 0x1000_0000;
    pub const PATH: u32 = 0x1000_0001;
    pub const EMPTY: u32 = 0x1000_0002;
    pub const INFINITE: u32 = 0x1000_0003;
}

/// Set operation of an interior node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionOp {
    And,
    Or,
    Xor,
    Exclude,
    Complement,
}

impl RegionOp {
    fn from_code(code: u32) -> Option<Self> {
        match code {
            node_type::AND => Some(RegionOp::And),
            node_type::OR => Some(RegionOp::Or),
            node_type::XOR => Some(RegionOp::Xor),
            node_type::EXCLUDE => Some(RegionOp::Exclude),
            node_type::COMPLEMENT => Some(RegionOp::Complement),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RegionNode {
    Combine {
        op: RegionOp,
        left: Box<RegionNode>,
        right: Box<RegionNode>,
    },
    Rect(RectF),
    Path(Path),
    Empty,
    Infinite,
}

impl RegionNode {
    /// Number of nodes in this subtree, including itself.
    pub fn node_count(&self) -> usize {
        match self {
            RegionNode::Combine { left, right, .. } => 1 + left.node_count() + right.node_count(),
            _ => 1,
        }
    }

    fn decode(cursor: &mut ByteCursor<'_>, options: &DecodeOptions, depth: u32) -> Result<Self> {
        let offset = cursor.offset();
        check_ceiling(offset, u64::from(depth), options.max_region_depth)?;
        let code = cursor.read_u32()?;

        if let Some(op) = RegionOp::from_code(code) {
            let left = Self::decode(cursor, options, depth + 1)?;
            let right = Self::decode(cursor, options, depth + 1)?;
            return Ok(RegionNode::Combine {
                op,
                left: Box::new(left),
                right: Box::new(right),
            });
        }

        match code {
            node_type::RECT => Ok(RegionNode::Rect(RectF::read(cursor)?)),
            node_type::PATH => {
                let size_offset = cursor.offset();
                let size = cursor.read_i32()?;
                let size = usize::try_from(size).map_err(|_| {
                    Error::malformed(size_offset, format!("negative region path length {}", size))
                })?;
                check_ceiling(size_offset, size as u64, options.max_object_size)?;
                Ok(RegionNode::Path(Path::decode_sized(cursor, size, options)?))
            },
            node_type::EMPTY => Ok(RegionNode::Empty),
            node_type::INFINITE => Ok(RegionNode::Infinite),
            _ => Err(Error::UnsupportedObjectType {
                offset,
                kind: "region node",
                code,
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub version: GraphicsVersion,
    /// Declared number of child nodes below the root
    pub node_count: u32,
    pub root: RegionNode,
}

impl Region {
    pub fn decode(cursor: &mut ByteCursor<'_>, options: &DecodeOptions) -> Result<Self> {
        let version = GraphicsVersion::read(cursor)?;
        let node_count = cursor.read_u32()?;
        let root = RegionNode::decode(cursor, options, 0)?;
        let children = root.node_count() - 1;
        if children as u64 != u64::from(node_count) {
            warn!(declared = node_count, actual = children, "region node count mismatch");
        }
        Ok(Self {
            version,
            node_count,
            root,
        })
    }

    pub fn apply_to(&self, ctx: &mut dyn DrawingContext) {
        ctx.set_clip_region(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::images::emfplus::records::primitives::PointF;

    fn push_rect(data: &mut Vec<u8>, rect: [f32; 4]) {
        data.extend_from_slice(&node_type::RECT.to_le_bytes());
        for v in rect {
            data.extend_from_slice(&v.to_le_bytes());
        }
    }

    #[test]
    fn test_and_of_two_rects() {
        let mut data = Vec::new();
        data.extend_from_slice(&0xDBC0_1002u32.to_le_bytes());
        data.extend_from_slice(&2u32.to_le_bytes());
        data.extend_from_slice(&node_type::AND.to_le_bytes());
        push_rect(&mut data, [0.0, 0.0, 10.0, 10.0]);
        push_rect(&mut data, [5.0, 5.0, 1.5, 2.5]);

        let mut cursor = ByteCursor::new(&data);
        let region = Region::decode(&mut cursor, &DecodeOptions::default()).unwrap();
        assert!(cursor.is_empty());
        assert_eq!(
            region.root,
            RegionNode::Combine {
                op: RegionOp::And,
                left: Box::new(RegionNode::Rect(RectF::new(0.0, 0.0, 10.0, 10.0))),
                right: Box::new(RegionNode::Rect(RectF::new(5.0, 5.0, 1.5, 2.5))),
            }
        );
    }

    #[test]
    fn test_unknown_node_type() {
        let mut data = Vec::new();
        data.extend_from_slice(&0xDBC0_1002u32.to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(&0x2000_0000u32.to_le_bytes());
        let mut cursor = ByteCursor::with_base(&data, 100);
        let err = Region::decode(&mut cursor, &DecodeOptions::default()).unwrap_err();
        assert_eq!(
            err,
            Error::UnsupportedObjectType {
                offset: 108,
                kind: "region node",
                code: 0x2000_0000
            }
        );
    }

    #[test]
    fn test_depth_guard() {
        let mut data = Vec::new();
        data.extend_from_slice(&0xDBC0_1002u32.to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());
        for _ in 0..8 {
            data.extend_from_slice(&node_type::OR.to_le_bytes());
        }
        let options = DecodeOptions {
            max_region_depth: 4,
            ..DecodeOptions::default()
        };
        let mut cursor = ByteCursor::new(&data);
        assert!(matches!(
            Region::decode(&mut cursor, &options),
            Err(Error::OversizedAllocation { .. })
        ));
    }

    #[test]
    fn test_empty_and_infinite_leaves() {
        let mut data = Vec::new();
        data.extend_from_slice(&0xDBC0_1002u32.to_le_bytes());
        data.extend_from_slice(&2u32.to_le_bytes());
        data.extend_from_slice(&node_type::EXCLUDE.to_le_bytes());
        data.extend_from_slice(&node_type::INFINITE.to_le_bytes());
        data.extend_from_slice(&node_type::EMPTY.to_le_bytes());
        let mut cursor = ByteCursor::new(&data);
        let region = Region::decode(&mut cursor, &DecodeOptions::default()).unwrap();
        assert_eq!(region.root.node_count(), 3);
        assert!(matches!(
            region.root,
            RegionNode::Combine {
                op: RegionOp::Exclude,
                ..
            }
        ));
    }

    #[test]
    fn test_path_leaf() {
        let mut path = Vec::new();
        path.extend_from_slice(&0xDBC0_1002u32.to_le_bytes());
        path.extend_from_slice(&2u32.to_le_bytes());
        path.extend_from_slice(&0x4000u16.to_le_bytes());
        path.extend_from_slice(&0u16.to_le_bytes());
        for v in [1i16, 2, 30, 40] {
            path.extend_from_slice(&v.to_le_bytes());
        }
        path.extend_from_slice(&[0x00, 0x01, 0x00, 0x00]);

        let mut data = Vec::new();
        data.extend_from_slice(&0xDBC0_1002u32.to_le_bytes());
        data.extend_from_slice(&2u32.to_le_bytes());
        data.extend_from_slice(&node_type::XOR.to_le_bytes());
        data.extend_from_slice(&node_type::PATH.to_le_bytes());
        data.extend_from_slice(&(path.len() as i32).to_le_bytes());
        data.extend_from_slice(&path);
        data.extend_from_slice(&node_type::INFINITE.to_le_bytes());

        let mut cursor = ByteCursor::new(&data);
        let region = Region::decode(&mut cursor, &DecodeOptions::default()).unwrap();
        assert!(cursor.is_empty());
        let RegionNode::Combine {
            op: RegionOp::Xor,
            left,
            right,
        } = &region.root
        else {
            panic!("expected an XOR node, got {:?}", region.root);
        };
        let RegionNode::Path(leaf) = left.as_ref() else {
            panic!("expected a path leaf, got {:?}", left);
        };
        assert_eq!(
            leaf.points,
            vec![
                PointF::new(1.0, 2.0),
                PointF::new(30.0, 40.0)
            ]
        );
        assert_eq!(right.as_ref(), &RegionNode::Infinite);
    }

    #[test]
    fn test_negative_path_leaf_length() {
        let mut data = Vec::new();
        data.extend_from_slice(&0xDBC0_1002u32.to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(&node_type::PATH.to_le_bytes());
        data.extend_from_slice(&(-4i32).to_le_bytes());
        let mut cursor = ByteCursor::new(&data);
        assert!(matches!(
            Region::decode(&mut cursor, &DecodeOptions::default()),
            Err(Error::MalformedRecord { offset: 12, .. })
        ));
    }
}
