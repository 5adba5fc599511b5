/// EMF+ image and image-attribute objects
use tracing::debug;

use super::primitives::{BitField, Color, GraphicsVersion};
use super::types::{BitmapDataType, ImageDataType, MetafileDataType, ObjectClamp, WrapMode};
use crate::common::binary::ByteCursor;
use crate::common::error::Result;
use crate::images::emfplus::device_context::DrawingContext;
use crate::images::emfplus::options::{DecodeOptions, check_ceiling};

/// GDI+ pixel format word (MS-EMFPLUS 2.1.1.25)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PixelFormat(pub u32);

impl PixelFormat {
    const INDEX: BitField = BitField::new(0x0000_00FF);
    const BITS_PER_PIXEL: BitField = BitField::new(0x0000_FF00);
    const INDEXED: BitField = BitField::new(0x0001_0000);
    const GDI: BitField = BitField::new(0x0002_0000);
    const ALPHA: BitField = BitField::new(0x0004_0000);
    const PREMULTIPLIED: BitField = BitField::new(0x0008_0000);
    const EXTENDED: BitField = BitField::new(0x0010_0000);
    const CANONICAL: BitField = BitField::new(0x0020_0000);

    pub const fn index(self) -> u32 {
        Self::INDEX.value(self.0)
    }

    pub const fn bits_per_pixel(self) -> u32 {
        Self::BITS_PER_PIXEL.value(self.0)
    }

    pub const fn is_indexed(self) -> bool {
        Self::INDEXED.is_set(self.0)
    }

    pub const fn is_gdi(self) -> bool {
        Self::GDI.is_set(self.0)
    }

    pub const fn has_alpha(self) -> bool {
        Self::ALPHA.is_set(self.0)
    }

    pub const fn is_premultiplied(self) -> bool {
        Self::PREMULTIPLIED.is_set(self.0)
    }

    pub const fn is_extended(self) -> bool {
        Self::EXTENDED.is_set(self.0)
    }

    pub const fn is_canonical(self) -> bool {
        Self::CANONICAL.is_set(self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImageData {
    /// Unrecognised image kind; bytes kept as stored
    Unknown(Vec<u8>),
    Bitmap {
        width: i32,
        height: i32,
        stride: i32,
        pixel_format: PixelFormat,
        data_type: BitmapDataType,
        /// Raw pixels or a compressed (PNG, JPEG, ...) stream
        data: Vec<u8>,
    },
    Metafile {
        metafile_type: MetafileDataType,
        data: Vec<u8>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    pub version: GraphicsVersion,
    pub data: ImageData,
}

impl Image {
    /// Decode an image occupying the rest of the cursor.
    pub fn decode(cursor: &mut ByteCursor<'_>, options: &DecodeOptions) -> Result<Self> {
        let version = GraphicsVersion::read(cursor)?;
        let image_type = ImageDataType::read(cursor)?;

        let data = match image_type {
            ImageDataType::Unknown => ImageData::Unknown(take_bounded_rest(cursor, options)?),
            ImageDataType::Bitmap => {
                let width = cursor.read_i32()?;
                let height = cursor.read_i32()?;
                let stride = cursor.read_i32()?;
                let pixel_format = PixelFormat(cursor.read_u32()?);
                let data_type = BitmapDataType::read(cursor)?;
                let data = take_bounded_rest(cursor, options)?;
                debug!(width, height, bytes = data.len(), "bitmap image");
                ImageData::Bitmap {
                    width,
                    height,
                    stride,
                    pixel_format,
                    data_type,
                    data,
                }
            },
            ImageDataType::Metafile => {
                let metafile_type = MetafileDataType::read(cursor)?;
                let size_offset = cursor.offset();
                let size = cursor.read_u32()?;
                check_ceiling(size_offset, u64::from(size), options.max_object_size)?;
                let data = cursor.take(size as usize)?.to_vec();
                cursor.skip_padding(4);
                debug!(?metafile_type, bytes = data.len(), "embedded metafile");
                ImageData::Metafile {
                    metafile_type,
                    data,
                }
            },
        };

        Ok(Self { version, data })
    }

    pub fn apply_to(&self, ctx: &mut dyn DrawingContext) {
        ctx.set_image(self);
    }
}

fn take_bounded_rest(cursor: &mut ByteCursor<'_>, options: &DecodeOptions) -> Result<Vec<u8>> {
    check_ceiling(
        cursor.offset(),
        cursor.remaining() as u64,
        options.max_object_size,
    )?;
    Ok(cursor.take_rest().to_vec())
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageAttributes {
    pub version: GraphicsVersion,
    pub wrap_mode: WrapMode,
    pub clamp_color: Color,
    pub object_clamp: ObjectClamp,
}

impl ImageAttributes {
    pub fn decode(cursor: &mut ByteCursor<'_>) -> Result<Self> {
        let version = GraphicsVersion::read(cursor)?;
        cursor.skip(4)?;
        let wrap_mode = WrapMode::read(cursor)?;
        let clamp_color = Color::read(cursor)?;
        let object_clamp = ObjectClamp::read(cursor)?;
        cursor.skip(4)?;
        Ok(Self {
            version,
            wrap_mode,
            clamp_color,
            object_clamp,
        })
    }

    pub fn apply_to(&self, ctx: &mut dyn DrawingContext) {
        ctx.set_image_attributes(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::error::Error;

    fn words(values: &[u32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    #[test]
    fn test_bitmap_image() {
        let mut data = words(&[0xDBC0_1002, 1, 2, 2, 8, 0x0026_200A, 0]);
        data.extend_from_slice(&[0xAA; 16]);
        let mut cursor = ByteCursor::new(&data);
        let image = Image::decode(&mut cursor, &DecodeOptions::default()).unwrap();
        assert!(cursor.is_empty());
        match image.data {
            ImageData::Bitmap {
                width,
                pixel_format,
                data_type,
                data,
                ..
            } => {
                assert_eq!(width, 2);
                assert_eq!(pixel_format.bits_per_pixel(), 32);
                assert!(pixel_format.has_alpha());
                assert!(pixel_format.is_canonical());
                assert_eq!(data_type, BitmapDataType::Pixel);
                assert_eq!(data.len(), 16);
            },
            other => panic!("unexpected image data {:?}", other),
        }
    }

    #[test]
    fn test_metafile_size_ceiling() {
        let data = words(&[0xDBC0_1002, 2, 3, 0x7FFF_FFFF]);
        let options = DecodeOptions {
            max_object_size: 1024,
            ..DecodeOptions::default()
        };
        let mut cursor = ByteCursor::new(&data);
        assert!(matches!(
            Image::decode(&mut cursor, &options),
            Err(Error::OversizedAllocation { .. })
        ));
    }

    #[test]
    fn test_image_attributes() {
        let data = words(&[0xDBC0_1002, 0, 4, 0xFF00_00FF, 1, 0]);
        let mut cursor = ByteCursor::new(&data);
        let attributes = ImageAttributes::decode(&mut cursor).unwrap();
        assert!(cursor.is_empty());
        assert_eq!(attributes.wrap_mode, WrapMode::Clamp);
        assert_eq!(attributes.clamp_color.blue, 0xFF);
        assert_eq!(attributes.object_clamp, ObjectClamp::Bitmap);
    }
}
