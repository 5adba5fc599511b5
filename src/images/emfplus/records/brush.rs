/// EMF+ brush objects
///
/// Five brush kinds share one object type. Gradient brushes carry optional
/// trailing fields whose presence is announced by a flag word and which are
/// always read in the same order.
use bitflags::bitflags;
use tracing::{debug, warn};

use super::image::Image;
use super::path::Path;
use super::primitives::{
    Color, GraphicsVersion, PointF, RectF, Transform, read_color_array, read_count, read_f32_array,
};
use super::types::{HatchStyle, WrapMode};
use crate::common::binary::ByteCursor;
use crate::common::error::{Error, Result};
use crate::images::emfplus::device_context::{DrawingContext, Fill, GradientStop, Stroke};
use crate::images::emfplus::options::{DecodeOptions, check_ceiling};

bitflags! {
    /// Brush data flags (MS-EMFPLUS 2.1.2.1)
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct BrushDataFlags: u32 {
        /// Path gradient boundary is a path object rather than a point list
        const PATH = 0x0000_0001;
        const TRANSFORM = 0x0000_0002;
        const PRESET_COLORS = 0x0000_0004;
        const BLEND_FACTORS_H = 0x0000_0008;
        const BLEND_FACTORS_V = 0x0000_0010;
        const FOCUS_SCALES = 0x0000_0040;
        const IS_GAMMA_CORRECTED = 0x0000_0080;
        /// World transform is not applied to a texture brush
        const DO_NOT_TRANSFORM = 0x0000_0100;
    }
}

impl BrushDataFlags {
    fn read(cursor: &mut ByteCursor<'_>) -> Result<Self> {
        let offset = cursor.offset();
        let flags = Self::from_bits_retain(cursor.read_u32()?);
        if flags.contains(Self::PRESET_COLORS)
            && flags.intersects(Self::BLEND_FACTORS_H | Self::BLEND_FACTORS_V)
        {
            return Err(Error::InvalidFlagCombination {
                offset,
                flags: flags.bits(),
                reason: "preset colors and blend factors are mutually exclusive",
            });
        }
        Ok(flags)
    }
}

/// Brush type codes (MS-EMFPLUS 2.1.1.3)
pub mod brush_type {
    pub const SOLID_COLOR: u32 = 0;
    pub const HATCH_FILL: u32 = 1;
    pub const TEXTURE_FILL: u32 = 2;
    pub const PATH_GRADIENT: u32 = 3;
    pub const LINEAR_GRADIENT: u32 = 4;
}

/// Color stops at explicit positions along a gradient.
#[derive(Debug, Clone, PartialEq)]
pub struct PresetColors {
    pub positions: Vec<f32>,
    pub colors: Vec<Color>,
}

impl PresetColors {
    fn read(cursor: &mut ByteCursor<'_>, options: &DecodeOptions) -> Result<Self> {
        let count = read_count(cursor, options.max_array_len, 8)?;
        let positions = read_f32_array(cursor, count)?;
        let colors = read_color_array(cursor, count)?;
        Ok(Self { positions, colors })
    }
}

/// Blend factors: fraction of the end color at each position.
#[derive(Debug, Clone, PartialEq)]
pub struct BlendFactors {
    pub positions: Vec<f32>,
    pub factors: Vec<f32>,
}

impl BlendFactors {
    fn read(cursor: &mut ByteCursor<'_>, options: &DecodeOptions) -> Result<Self> {
        let count = read_count(cursor, options.max_array_len, 8)?;
        let positions = read_f32_array(cursor, count)?;
        let factors = read_f32_array(cursor, count)?;
        Ok(Self { positions, factors })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinearGradient {
    pub flags: BrushDataFlags,
    pub wrap_mode: WrapMode,
    pub rect: RectF,
    pub start_color: Color,
    pub end_color: Color,
    pub transform: Option<Transform>,
    pub preset_colors: Option<PresetColors>,
    pub blend_factors_v: Option<BlendFactors>,
    pub blend_factors_h: Option<BlendFactors>,
}

impl LinearGradient {
    fn decode(cursor: &mut ByteCursor<'_>, options: &DecodeOptions) -> Result<Self> {
        let flags = BrushDataFlags::read(cursor)?;
        let wrap_mode = WrapMode::read(cursor)?;
        let rect = RectF::read(cursor)?;
        let start_color = Color::read(cursor)?;
        let end_color = Color::read(cursor)?;
        // Two reserved words
        cursor.skip(8)?;

        let transform = read_optional_transform(cursor, flags)?;
        let preset_colors = if flags.contains(BrushDataFlags::PRESET_COLORS) {
            Some(PresetColors::read(cursor, options)?)
        } else {
            None
        };
        let blend_factors_v = if flags.contains(BrushDataFlags::BLEND_FACTORS_V) {
            Some(BlendFactors::read(cursor, options)?)
        } else {
            None
        };
        let blend_factors_h = if flags.contains(BrushDataFlags::BLEND_FACTORS_H) {
            Some(BlendFactors::read(cursor, options)?)
        } else {
            None
        };

        Ok(Self {
            flags,
            wrap_mode,
            rect,
            start_color,
            end_color,
            transform,
            preset_colors,
            blend_factors_v,
            blend_factors_h,
        })
    }

    /// Stops along the gradient direction.
    pub fn stops(&self) -> Vec<GradientStop> {
        if let Some(preset) = &self.preset_colors {
            return preset_stops(preset);
        }
        let blend = self.blend_factors_h.as_ref().or(self.blend_factors_v.as_ref());
        blend_stops(blend, self.start_color, self.end_color)
    }
}

/// Outline of a path gradient.
#[derive(Debug, Clone, PartialEq)]
pub enum GradientBoundary {
    Path(Path),
    Points(Vec<PointF>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PathGradient {
    pub flags: BrushDataFlags,
    pub wrap_mode: WrapMode,
    pub center_color: Color,
    pub center: PointF,
    pub surrounding_colors: Vec<Color>,
    pub boundary: GradientBoundary,
    pub transform: Option<Transform>,
    pub preset_colors: Option<PresetColors>,
    pub blend_factors_h: Option<BlendFactors>,
    pub focus_scales: Option<PointF>,
}

impl PathGradient {
    fn decode(cursor: &mut ByteCursor<'_>, options: &DecodeOptions) -> Result<Self> {
        let flags = BrushDataFlags::read(cursor)?;
        let wrap_mode = WrapMode::read(cursor)?;
        let center_color = Color::read(cursor)?;
        let center = PointF::new(cursor.read_f32()?, cursor.read_f32()?);
        let count = read_count(cursor, options.max_array_len, 4)?;
        let surrounding_colors = read_color_array(cursor, count)?;

        let boundary = if flags.contains(BrushDataFlags::PATH) {
            let size_offset = cursor.offset();
            let size = cursor.read_u32()?;
            check_ceiling(size_offset, u64::from(size), options.max_object_size)?;
            GradientBoundary::Path(Path::decode_sized(cursor, size as usize, options)?)
        } else {
            let count = read_count(cursor, options.max_array_len, 8)?;
            let mut points = Vec::with_capacity(count);
            for _ in 0..count {
                points.push(PointF::new(cursor.read_f32()?, cursor.read_f32()?));
            }
            GradientBoundary::Points(points)
        };

        let transform = read_optional_transform(cursor, flags)?;
        let preset_colors = if flags.contains(BrushDataFlags::PRESET_COLORS) {
            Some(PresetColors::read(cursor, options)?)
        } else {
            None
        };
        let blend_factors_h = if flags.contains(BrushDataFlags::BLEND_FACTORS_H) {
            Some(BlendFactors::read(cursor, options)?)
        } else {
            None
        };
        if flags.contains(BrushDataFlags::BLEND_FACTORS_V) {
            warn!("vertical blend factors flag ignored on a path gradient");
        }
        let focus_scales = if flags.contains(BrushDataFlags::FOCUS_SCALES) {
            let offset = cursor.offset();
            let count = cursor.read_u32()?;
            if count != 2 {
                return Err(Error::malformed(
                    offset,
                    format!("focus scale count must be 2, got {}", count),
                ));
            }
            Some(PointF::new(cursor.read_f32()?, cursor.read_f32()?))
        } else {
            None
        };

        Ok(Self {
            flags,
            wrap_mode,
            center_color,
            center,
            surrounding_colors,
            boundary,
            transform,
            preset_colors,
            blend_factors_h,
            focus_scales,
        })
    }

    /// Stops from the boundary (position 0) to the center (position 1).
    pub fn stops(&self) -> Vec<GradientStop> {
        if let Some(preset) = &self.preset_colors {
            return preset_stops(preset);
        }
        let edge = self
            .surrounding_colors
            .first()
            .copied()
            .unwrap_or(self.center_color);
        blend_stops(self.blend_factors_h.as_ref(), edge, self.center_color)
    }

    pub fn boundary_points(&self) -> Vec<PointF> {
        match &self.boundary {
            GradientBoundary::Path(path) => path.absolute_points(),
            GradientBoundary::Points(points) => points.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BrushData {
    SolidColor(Color),
    HatchFill {
        style: HatchStyle,
        foreground: Color,
        background: Color,
    },
    TextureFill {
        flags: BrushDataFlags,
        wrap_mode: WrapMode,
        transform: Option<Transform>,
        image: Option<Image>,
    },
    PathGradient(PathGradient),
    LinearGradient(LinearGradient),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Brush {
    pub version: GraphicsVersion,
    pub data: BrushData,
}

impl Brush {
    /// Decode a brush occupying the rest of the cursor.
    pub fn decode(cursor: &mut ByteCursor<'_>, options: &DecodeOptions) -> Result<Self> {
        let version = GraphicsVersion::read(cursor)?;
        let type_offset = cursor.offset();
        let kind = cursor.read_u32()?;

        let data = match kind {
            brush_type::SOLID_COLOR => BrushData::SolidColor(Color::read(cursor)?),
            brush_type::HATCH_FILL => BrushData::HatchFill {
                style: HatchStyle::read(cursor)?,
                foreground: Color::read(cursor)?,
                background: Color::read(cursor)?,
            },
            brush_type::TEXTURE_FILL => {
                let flags = BrushDataFlags::read(cursor)?;
                let wrap_mode = WrapMode::read(cursor)?;
                let transform = read_optional_transform(cursor, flags)?;
                let image = if cursor.is_empty() {
                    None
                } else {
                    Some(Image::decode(cursor, options)?)
                };
                BrushData::TextureFill {
                    flags,
                    wrap_mode,
                    transform,
                    image,
                }
            },
            brush_type::PATH_GRADIENT => {
                BrushData::PathGradient(PathGradient::decode(cursor, options)?)
            },
            brush_type::LINEAR_GRADIENT => {
                BrushData::LinearGradient(LinearGradient::decode(cursor, options)?)
            },
            code => {
                return Err(Error::UnsupportedObjectType {
                    offset: type_offset,
                    kind: "brush",
                    code,
                });
            },
        };
        debug!(kind, "decoded brush");

        Ok(Self { version, data })
    }

    /// Paint described by this brush.
    pub fn to_fill(&self) -> Fill {
        match &self.data {
            BrushData::SolidColor(color) => Fill::Solid(*color),
            BrushData::HatchFill {
                style,
                foreground,
                background,
            } => Fill::Hatch {
                style: *style,
                foreground: *foreground,
                background: *background,
            },
            BrushData::TextureFill {
                wrap_mode,
                transform,
                image,
                ..
            } => Fill::Texture {
                wrap_mode: *wrap_mode,
                transform: transform.unwrap_or_default(),
                image: image.clone(),
            },
            BrushData::LinearGradient(gradient) => Fill::LinearGradient {
                rect: gradient.rect,
                stops: gradient.stops(),
                wrap_mode: gradient.wrap_mode,
                transform: gradient.transform.unwrap_or_default(),
            },
            BrushData::PathGradient(gradient) => Fill::PathGradient {
                center: gradient.center,
                boundary: gradient.boundary_points(),
                stops: gradient.stops(),
                wrap_mode: gradient.wrap_mode,
                transform: gradient.transform.unwrap_or_default(),
            },
        }
    }

    pub fn apply_to(&self, ctx: &mut dyn DrawingContext) {
        ctx.set_fill(self.to_fill());
    }

    /// Use this brush as the paint of a stroke.
    pub fn apply_to_stroke(&self, stroke: &mut Stroke) {
        stroke.fill = self.to_fill();
    }
}

fn read_optional_transform(
    cursor: &mut ByteCursor<'_>,
    flags: BrushDataFlags,
) -> Result<Option<Transform>> {
    if flags.contains(BrushDataFlags::TRANSFORM) {
        Ok(Some(Transform::read(cursor)?))
    } else {
        Ok(None)
    }
}

fn preset_stops(preset: &PresetColors) -> Vec<GradientStop> {
    preset
        .positions
        .iter()
        .zip(&preset.colors)
        .map(|(&position, &color)| GradientStop { position, color })
        .collect()
}

fn blend_stops(blend: Option<&BlendFactors>, from: Color, to: Color) -> Vec<GradientStop> {
    match blend {
        Some(blend) if !blend.positions.is_empty() => blend
            .positions
            .iter()
            .zip(&blend.factors)
            .map(|(&position, &factor)| GradientStop {
                position,
                color: from.lerp(to, factor),
            })
            .collect(),
        _ => vec![
            GradientStop {
                position: 0.0,
                color: from,
            },
            GradientStop {
                position: 1.0,
                color: to,
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::images::emfplus::records::image::ImageData;

    fn words(values: &[u32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    fn floats(values: &[f32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    fn linear_header(flags: u32) -> Vec<u8> {
        let mut data = words(&[0xDBC0_1002, brush_type::LINEAR_GRADIENT, flags, 0]);
        data.extend(floats(&[0.0, 0.0, 100.0, 50.0]));
        data.extend(words(&[0xFF00_00FF, 0xFFFF_FFFF, 0, 0]));
        data
    }

    #[test]
    fn test_solid_brush() {
        let data = words(&[0xDBC0_1002, brush_type::SOLID_COLOR, 0x4433_2211]);
        let mut cursor = ByteCursor::new(&data);
        let brush = Brush::decode(&mut cursor, &DecodeOptions::default()).unwrap();
        assert!(cursor.is_empty());
        assert_eq!(brush.data, BrushData::SolidColor(Color::from_u32(0x4433_2211)));
        assert_eq!(brush.to_fill(), Fill::Solid(Color::from_u32(0x4433_2211)));
    }

    #[test]
    fn test_hatch_brush() {
        let data = words(&[0xDBC0_1002, brush_type::HATCH_FILL, 0x05, 0xFF, 0xFFFF_FFFF]);
        let mut cursor = ByteCursor::new(&data);
        let brush = Brush::decode(&mut cursor, &DecodeOptions::default()).unwrap();
        assert!(matches!(
            brush.data,
            BrushData::HatchFill {
                style: HatchStyle::DiagonalCross,
                ..
            }
        ));
    }

    #[test]
    fn test_unknown_brush_type() {
        let data = words(&[0xDBC0_1002, 9, 0]);
        let mut cursor = ByteCursor::new(&data);
        assert_eq!(
            Brush::decode(&mut cursor, &DecodeOptions::default()).unwrap_err(),
            Error::UnsupportedObjectType {
                offset: 4,
                kind: "brush",
                code: 9
            }
        );
    }

    #[test]
    fn test_linear_gradient_optional_fields_in_order() {
        let flags = (BrushDataFlags::TRANSFORM | BrushDataFlags::BLEND_FACTORS_H).bits();
        let mut data = linear_header(flags);
        data.extend(floats(&[1.0, 0.0, 0.0, 1.0, 5.0, 6.0]));
        data.extend(words(&[2]));
        data.extend(floats(&[0.0, 1.0, 0.25, 0.75]));
        let mut cursor = ByteCursor::new(&data);
        let brush = Brush::decode(&mut cursor, &DecodeOptions::default()).unwrap();
        assert!(cursor.is_empty());

        let BrushData::LinearGradient(gradient) = &brush.data else {
            panic!("expected linear gradient");
        };
        assert_eq!(gradient.transform.map(|t| t.dx), Some(5.0));
        assert!(gradient.preset_colors.is_none());
        assert_eq!(
            gradient.blend_factors_h.as_ref().map(|b| b.factors.clone()),
            Some(vec![0.25, 0.75])
        );
        let stops = gradient.stops();
        assert_eq!(stops.len(), 2);
        assert_eq!(stops[1].position, 1.0);
    }

    #[test]
    fn test_preset_and_blend_are_exclusive() {
        let flags = (BrushDataFlags::PRESET_COLORS | BrushDataFlags::BLEND_FACTORS_H).bits();
        let data = linear_header(flags);
        let mut cursor = ByteCursor::new(&data);
        let err = Brush::decode(&mut cursor, &DecodeOptions::default()).unwrap_err();
        assert_eq!(
            err,
            Error::InvalidFlagCombination {
                offset: 8,
                flags,
                reason: "preset colors and blend factors are mutually exclusive",
            }
        );
        // Nothing past the flag word was consumed.
        assert_eq!(cursor.position(), 12);
    }

    #[test]
    fn test_path_gradient_with_points_and_focus() {
        let flags = BrushDataFlags::FOCUS_SCALES.bits();
        let mut data = words(&[0xDBC0_1002, brush_type::PATH_GRADIENT, flags, 0, 0xFFFF_FFFF]);
        data.extend(floats(&[5.0, 5.0]));
        data.extend(words(&[1, 0x0000_00FF, 3]));
        data.extend(floats(&[0.0, 0.0, 10.0, 0.0, 5.0, 10.0]));
        data.extend(words(&[2]));
        data.extend(floats(&[0.5, 0.25]));
        let mut cursor = ByteCursor::new(&data);
        let brush = Brush::decode(&mut cursor, &DecodeOptions::default()).unwrap();
        assert!(cursor.is_empty());

        let BrushData::PathGradient(gradient) = &brush.data else {
            panic!("expected path gradient");
        };
        assert_eq!(gradient.boundary_points().len(), 3);
        assert_eq!(gradient.focus_scales, Some(PointF::new(0.5, 0.25)));
        let stops = gradient.stops();
        assert_eq!(stops[0].color, Color::from_u32(0x0000_00FF));
        assert_eq!(stops[1].color, Color::from_u32(0xFFFF_FFFF));
    }

    #[test]
    fn test_texture_brush_without_image() {
        let data = words(&[0xDBC0_1002, brush_type::TEXTURE_FILL, 0, 1]);
        let mut cursor = ByteCursor::new(&data);
        let brush = Brush::decode(&mut cursor, &DecodeOptions::default()).unwrap();
        assert_eq!(
            brush.data,
            BrushData::TextureFill {
                flags: BrushDataFlags::empty(),
                wrap_mode: WrapMode::TileFlipX,
                transform: None,
                image: None,
            }
        );
    }

    fn square_path() -> Vec<u8> {
        let mut data = words(&[0xDBC0_1002, 4, 0]);
        data.extend(floats(&[0.0, 0.0, 10.0, 0.0, 10.0, 10.0, 0.0, 10.0]));
        data.extend_from_slice(&[0x00, 0x01, 0x01, 0x81]);
        data
    }

    #[test]
    fn test_linear_gradient_preset_colors() {
        let mut data = linear_header(BrushDataFlags::PRESET_COLORS.bits());
        data.extend(words(&[3]));
        data.extend(floats(&[0.0, 0.5, 1.0]));
        data.extend(words(&[0xFF00_00FF, 0xFF00_FF00, 0xFFFF_0000]));
        let mut cursor = ByteCursor::new(&data);
        let brush = Brush::decode(&mut cursor, &DecodeOptions::default()).unwrap();
        assert!(cursor.is_empty());

        let BrushData::LinearGradient(gradient) = &brush.data else {
            panic!("expected linear gradient");
        };
        assert!(gradient.blend_factors_h.is_none());
        assert_eq!(
            gradient.stops(),
            vec![
                GradientStop {
                    position: 0.0,
                    color: Color::from_u32(0xFF00_00FF)
                },
                GradientStop {
                    position: 0.5,
                    color: Color::from_u32(0xFF00_FF00)
                },
                GradientStop {
                    position: 1.0,
                    color: Color::from_u32(0xFFFF_0000)
                },
            ]
        );
    }

    #[test]
    fn test_path_gradient_with_boundary_path_and_presets() {
        let flags = (BrushDataFlags::PATH | BrushDataFlags::PRESET_COLORS).bits();
        let mut data = words(&[0xDBC0_1002, brush_type::PATH_GRADIENT, flags, 0, 0xFFFF_FFFF]);
        data.extend(floats(&[5.0, 5.0]));
        data.extend(words(&[1, 0xFF00_0000]));
        let path = square_path();
        data.extend(words(&[path.len() as u32]));
        data.extend(path);
        data.extend(words(&[2]));
        data.extend(floats(&[0.0, 1.0]));
        data.extend(words(&[0xFF00_0000, 0xFFFF_FFFF]));
        let mut cursor = ByteCursor::new(&data);
        let brush = Brush::decode(&mut cursor, &DecodeOptions::default()).unwrap();
        assert!(cursor.is_empty());

        let BrushData::PathGradient(gradient) = &brush.data else {
            panic!("expected path gradient");
        };
        let GradientBoundary::Path(boundary) = &gradient.boundary else {
            panic!("expected a boundary path, got {:?}", gradient.boundary);
        };
        assert_eq!(boundary.points.len(), 4);
        assert_eq!(gradient.boundary_points()[2], PointF::new(10.0, 10.0));
        let stops = gradient.stops();
        assert_eq!(stops.len(), 2);
        assert_eq!(stops[1].color, Color::from_u32(0xFFFF_FFFF));
        assert!(matches!(brush.to_fill(), Fill::PathGradient { ref boundary, .. } if boundary.len() == 4));
    }

    #[test]
    fn test_path_gradient_boundary_size_must_match() {
        let flags = BrushDataFlags::PATH.bits();
        let mut data = words(&[0xDBC0_1002, brush_type::PATH_GRADIENT, flags, 0, 0xFFFF_FFFF]);
        data.extend(floats(&[5.0, 5.0]));
        data.extend(words(&[0]));
        let mut path = square_path();
        path.extend_from_slice(&[0; 4]);
        data.extend(words(&[path.len() as u32]));
        data.extend(path);
        let mut cursor = ByteCursor::new(&data);
        assert!(matches!(
            Brush::decode(&mut cursor, &DecodeOptions::default()),
            Err(Error::MalformedRecord { .. })
        ));
    }

    #[test]
    fn test_texture_brush_with_image() {
        let flags = BrushDataFlags::TRANSFORM.bits();
        let mut data = words(&[0xDBC0_1002, brush_type::TEXTURE_FILL, flags, 0]);
        data.extend(floats(&[1.0, 0.0, 0.0, 1.0, 3.0, 4.0]));
        data.extend(words(&[0xDBC0_1002, 1, 2, 1, 8, 0x0026_200A, 0]));
        data.extend_from_slice(&[0x11; 8]);
        let mut cursor = ByteCursor::new(&data);
        let brush = Brush::decode(&mut cursor, &DecodeOptions::default()).unwrap();
        assert!(cursor.is_empty());

        let BrushData::TextureFill {
            wrap_mode,
            transform,
            image: Some(image),
            ..
        } = &brush.data
        else {
            panic!("expected texture with image, got {:?}", brush.data);
        };
        assert_eq!(*wrap_mode, WrapMode::Tile);
        assert_eq!(transform.map(|t| t.dy), Some(4.0));
        match &image.data {
            ImageData::Bitmap {
                width,
                height,
                data,
                ..
            } => {
                assert_eq!((*width, *height), (2, 1));
                assert_eq!(data, &vec![0x11; 8]);
            },
            other => panic!("unexpected image data {:?}", other),
        }
        assert!(matches!(brush.to_fill(), Fill::Texture { image: Some(_), .. }));
    }
}
