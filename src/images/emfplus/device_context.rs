// Drawing-state boundary for decoded EMF+ objects
//
// Decoded objects push their properties onto a caller-supplied context. The
// context is passed explicitly, so nothing here depends on a renderer.

use super::records::font::{Font, StringFormat};
use super::records::image::{Image, ImageAttributes};
use super::records::line_cap::CustomLineCap;
use super::records::path::Path;
use super::records::primitives::{Color, PointF, RectF, Transform};
use super::records::region::Region;
use super::records::types::{HatchStyle, LineCapType, LineJoin, PenAlignment, UnitType, WrapMode};

/// A color at a fractional position along a gradient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientStop {
    pub position: f32,
    pub color: Color,
}

/// Paint resolved from a brush.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Fill {
    #[default]
    None,
    Solid(Color),
    Hatch {
        style: HatchStyle,
        foreground: Color,
        background: Color,
    },
    LinearGradient {
        rect: RectF,
        stops: Vec<GradientStop>,
        wrap_mode: WrapMode,
        transform: Transform,
    },
    PathGradient {
        center: PointF,
        boundary: Vec<PointF>,
        stops: Vec<GradientStop>,
        wrap_mode: WrapMode,
        transform: Transform,
    },
    Texture {
        wrap_mode: WrapMode,
        transform: Transform,
        image: Option<Image>,
    },
}

/// Stroke settings resolved from a pen.
#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    pub width: f32,
    pub unit: UnitType,
    pub start_cap: LineCapType,
    pub end_cap: LineCapType,
    pub join: LineJoin,
    pub miter_limit: f32,
    /// Dash and gap lengths in multiples of the width
    pub dash_pattern: Option<Vec<f32>>,
    pub dash_offset: f32,
    pub alignment: PenAlignment,
    pub compound_line: Option<Vec<f32>>,
    pub transform: Transform,
    pub fill: Fill,
}

/// Mutable drawing state that decoded objects are applied to.
pub trait DrawingContext {
    fn set_fill(&mut self, fill: Fill);
    fn set_stroke(&mut self, stroke: Stroke);
    fn set_path(&mut self, path: &Path);
    fn set_clip_region(&mut self, region: &Region);
    fn set_font(&mut self, font: &Font);
    fn set_string_format(&mut self, format: &StringFormat);
    fn set_image(&mut self, image: &Image);
    fn set_image_attributes(&mut self, attributes: &ImageAttributes);
    fn set_line_cap(&mut self, cap: &CustomLineCap);
}

/// Context that keeps the most recently applied value of each property.
#[derive(Debug, Clone, Default)]
pub struct RecordingContext {
    pub fill: Option<Fill>,
    pub stroke: Option<Stroke>,
    pub path: Option<Path>,
    pub clip: Option<Region>,
    pub font: Option<Font>,
    pub string_format: Option<StringFormat>,
    pub image: Option<Image>,
    pub image_attributes: Option<ImageAttributes>,
    pub line_cap: Option<CustomLineCap>,
    /// Number of properties applied so far
    pub applied: usize,
}

impl RecordingContext {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DrawingContext for RecordingContext {
    fn set_fill(&mut self, fill: Fill) {
        self.fill = Some(fill);
        self.applied += 1;
    }

    fn set_stroke(&mut self, stroke: Stroke) {
        self.stroke = Some(stroke);
        self.applied += 1;
    }

    fn set_path(&mut self, path: &Path) {
        self.path = Some(path.clone());
        self.applied += 1;
    }

    fn set_clip_region(&mut self, region: &Region) {
        self.clip = Some(region.clone());
        self.applied += 1;
    }

    fn set_font(&mut self, font: &Font) {
        self.font = Some(font.clone());
        self.applied += 1;
    }

    fn set_string_format(&mut self, format: &StringFormat) {
        self.string_format = Some(format.clone());
        self.applied += 1;
    }

    fn set_image(&mut self, image: &Image) {
        self.image = Some(image.clone());
        self.applied += 1;
    }

    fn set_image_attributes(&mut self, attributes: &ImageAttributes) {
        self.image_attributes = Some(*attributes);
        self.applied += 1;
    }

    fn set_line_cap(&mut self, cap: &CustomLineCap) {
        self.line_cap = Some(cap.clone());
        self.applied += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::binary::ByteCursor;
    use crate::images::emfplus::options::DecodeOptions;
    use crate::images::emfplus::records::object::GraphicsObject;
    use crate::images::emfplus::records::pen::Pen;

    #[test]
    fn test_pen_applies_stroke_with_brush_fill() {
        let mut data = Vec::new();
        for v in [0xDBC0_1002u32, 0, 0, 0] {
            data.extend_from_slice(&v.to_le_bytes());
        }
        data.extend_from_slice(&1.0f32.to_le_bytes());
        for v in [0xDBC0_1002u32, 0, 0x0000_FFFF] {
            data.extend_from_slice(&v.to_le_bytes());
        }
        let mut cursor = ByteCursor::new(&data);
        let pen = Pen::decode(&mut cursor, &DecodeOptions::default()).unwrap();

        let mut ctx = RecordingContext::new();
        GraphicsObject::Pen(pen).apply_to(&mut ctx);
        let stroke = ctx.stroke.expect("stroke applied");
        assert_eq!(stroke.width, 1.0);
        assert_eq!(stroke.unit, UnitType::World);
        assert_eq!(stroke.fill, Fill::Solid(Color::from_u32(0x0000_FFFF)));
        assert_eq!(ctx.applied, 1);
        assert!(ctx.fill.is_none());
    }

    #[test]
    fn test_unknown_object_applies_nothing() {
        let mut ctx = RecordingContext::new();
        GraphicsObject::Unknown {
            object_type: 0x40,
            data: Vec::new(),
        }
        .apply_to(&mut ctx);
        assert_eq!(ctx.applied, 0);
    }
}
