/// EMF+ graphics objects
///
/// The tagged union stored in the object table, and the per-type decoder
/// selection for an assembled object body.
use super::brush::Brush;
use super::font::{Font, StringFormat};
use super::image::{Image, ImageAttributes};
use super::line_cap::CustomLineCap;
use super::path::Path;
use super::pen::Pen;
use super::region::Region;
use super::types::ObjectType;
use crate::common::binary::ByteCursor;
use crate::common::error::{Error, Result};
use crate::images::emfplus::device_context::DrawingContext;
use crate::images::emfplus::options::DecodeOptions;

#[derive(Debug, Clone, PartialEq)]
pub enum GraphicsObject {
    Brush(Brush),
    Pen(Pen),
    Path(Path),
    Region(Region),
    Image(Image),
    Font(Font),
    StringFormat(StringFormat),
    ImageAttributes(ImageAttributes),
    CustomLineCap(CustomLineCap),
    /// Object of an unrecognised type, kept as stored
    Unknown { object_type: u8, data: Vec<u8> },
}

impl GraphicsObject {
    /// Decode a complete object body of the given raw type.
    ///
    /// `base` is the absolute offset of the first body byte. The body must
    /// be consumed exactly.
    pub fn decode(object_type: u8, data: &[u8], base: usize, options: &DecodeOptions) -> Result<Self> {
        let mut cursor = ByteCursor::with_base(data, base);
        let object = match ObjectType::from_u32(u32::from(object_type)) {
            Some(ObjectType::Brush) => GraphicsObject::Brush(Brush::decode(&mut cursor, options)?),
            Some(ObjectType::Pen) => GraphicsObject::Pen(Pen::decode(&mut cursor, options)?),
            Some(ObjectType::Path) => GraphicsObject::Path(Path::decode(&mut cursor, options)?),
            Some(ObjectType::Region) => {
                GraphicsObject::Region(Region::decode(&mut cursor, options)?)
            },
            Some(ObjectType::Image) => GraphicsObject::Image(Image::decode(&mut cursor, options)?),
            Some(ObjectType::Font) => GraphicsObject::Font(Font::decode(&mut cursor, options)?),
            Some(ObjectType::StringFormat) => {
                GraphicsObject::StringFormat(StringFormat::decode(&mut cursor, options)?)
            },
            Some(ObjectType::ImageAttributes) => {
                GraphicsObject::ImageAttributes(ImageAttributes::decode(&mut cursor)?)
            },
            Some(ObjectType::CustomLineCap) => {
                GraphicsObject::CustomLineCap(CustomLineCap::decode(&mut cursor, options)?)
            },
            Some(ObjectType::Invalid) | None => GraphicsObject::Unknown {
                object_type,
                data: cursor.take_rest().to_vec(),
            },
        };

        if !cursor.is_empty() {
            return Err(Error::malformed(
                cursor.offset(),
                format!(
                    "object body has {} unread bytes of {}",
                    cursor.remaining(),
                    data.len()
                ),
            ));
        }
        Ok(object)
    }

    pub fn object_type(&self) -> Option<ObjectType> {
        Some(match self {
            GraphicsObject::Brush(_) => ObjectType::Brush,
            GraphicsObject::Pen(_) => ObjectType::Pen,
            GraphicsObject::Path(_) => ObjectType::Path,
            GraphicsObject::Region(_) => ObjectType::Region,
            GraphicsObject::Image(_) => ObjectType::Image,
            GraphicsObject::Font(_) => ObjectType::Font,
            GraphicsObject::StringFormat(_) => ObjectType::StringFormat,
            GraphicsObject::ImageAttributes(_) => ObjectType::ImageAttributes,
            GraphicsObject::CustomLineCap(_) => ObjectType::CustomLineCap,
            GraphicsObject::Unknown { .. } => return None,
        })
    }

    /// Push this object's decoded properties onto a drawing context.
    pub fn apply_to(&self, ctx: &mut dyn DrawingContext) {
        match self {
            GraphicsObject::Brush(brush) => brush.apply_to(ctx),
            GraphicsObject::Pen(pen) => pen.apply_to(ctx),
            GraphicsObject::Path(path) => path.apply_to(ctx),
            GraphicsObject::Region(region) => region.apply_to(ctx),
            GraphicsObject::Image(image) => image.apply_to(ctx),
            GraphicsObject::Font(font) => font.apply_to(ctx),
            GraphicsObject::StringFormat(format) => format.apply_to(ctx),
            GraphicsObject::ImageAttributes(attributes) => attributes.apply_to(ctx),
            GraphicsObject::CustomLineCap(cap) => ctx.set_line_cap(cap),
            GraphicsObject::Unknown { .. } => {},
        }
    }
}
