/// EMF+ font and string format objects
use bitflags::bitflags;
use tracing::warn;

use super::primitives::{GraphicsVersion, check_count, read_f32_array};
use super::types::{StringAlignment, UnitType};
use crate::common::binary::{ByteCursor, parse_utf16le_string_len};
use crate::common::error::{Error, Result};
use crate::images::emfplus::device_context::DrawingContext;
use crate::images::emfplus::options::DecodeOptions;

bitflags! {
    /// Font style flags (MS-EMFPLUS 2.1.2.4)
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FontStyle: u32 {
        const BOLD = 0x0000_0001;
        const ITALIC = 0x0000_0002;
        const UNDERLINE = 0x0000_0004;
        const STRIKEOUT = 0x0000_0008;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Font {
    pub version: GraphicsVersion,
    pub em_size: f32,
    pub size_unit: UnitType,
    pub style: FontStyle,
    pub family: String,
}

impl Font {
    pub fn decode(cursor: &mut ByteCursor<'_>, options: &DecodeOptions) -> Result<Self> {
        let version = GraphicsVersion::read(cursor)?;
        let em_size = cursor.read_f32()?;
        let size_unit = UnitType::read(cursor)?;
        let style = FontStyle::from_bits_retain(cursor.read_u32()?);
        let reserved = cursor.read_u32()?;
        if reserved != 0 {
            warn!(reserved, "non-zero reserved field in font");
        }
        let length_offset = cursor.offset();
        let length = cursor.read_u32()?;
        let length = check_count(cursor, length_offset, length, options.max_array_len, 2)?;
        let name = cursor.take(length * 2)?;
        let family = parse_utf16le_string_len(name, length);
        cursor.skip_padding(4);

        Ok(Self {
            version,
            em_size,
            size_unit,
            style,
            family,
        })
    }

    pub fn is_bold(&self) -> bool {
        self.style.contains(FontStyle::BOLD)
    }

    pub fn is_italic(&self) -> bool {
        self.style.contains(FontStyle::ITALIC)
    }

    pub fn apply_to(&self, ctx: &mut dyn DrawingContext) {
        ctx.set_font(self);
    }
}

/// A run of characters addressed by a string format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharacterRange {
    pub first: i32,
    pub length: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StringFormat {
    pub version: GraphicsVersion,
    pub flags: u32,
    pub language: u32,
    pub alignment: StringAlignment,
    pub line_alignment: StringAlignment,
    pub digit_substitution: u32,
    pub digit_language: u32,
    pub first_tab_offset: f32,
    pub hotkey_prefix: i32,
    pub leading_margin: f32,
    pub trailing_margin: f32,
    pub tracking: f32,
    pub trimming: u32,
    pub tab_stops: Vec<f32>,
    pub ranges: Vec<CharacterRange>,
}

impl StringFormat {
    pub fn decode(cursor: &mut ByteCursor<'_>, options: &DecodeOptions) -> Result<Self> {
        let version = GraphicsVersion::read(cursor)?;
        let flags = cursor.read_u32()?;
        let language = cursor.read_u32()?;
        let alignment = StringAlignment::read(cursor)?;
        let line_alignment = StringAlignment::read(cursor)?;
        let digit_substitution = cursor.read_u32()?;
        let digit_language = cursor.read_u32()?;
        let first_tab_offset = cursor.read_f32()?;
        let hotkey_prefix = cursor.read_i32()?;
        let leading_margin = cursor.read_f32()?;
        let trailing_margin = cursor.read_f32()?;
        let tracking = cursor.read_f32()?;
        let trimming = cursor.read_u32()?;
        let tab_stop_offset = cursor.offset();
        let tab_stop_count = read_signed_count(cursor)?;
        let range_offset = cursor.offset();
        let range_count = read_signed_count(cursor)?;

        let tab_stop_count = check_count(
            cursor,
            tab_stop_offset,
            tab_stop_count,
            options.max_array_len,
            4,
        )?;
        let tab_stops = read_f32_array(cursor, tab_stop_count)?;
        let range_count = check_count(cursor, range_offset, range_count, options.max_array_len, 8)?;
        let mut ranges = Vec::with_capacity(range_count);
        for _ in 0..range_count {
            ranges.push(CharacterRange {
                first: cursor.read_i32()?,
                length: cursor.read_i32()?,
            });
        }

        Ok(Self {
            version,
            flags,
            language,
            alignment,
            line_alignment,
            digit_substitution,
            digit_language,
            first_tab_offset,
            hotkey_prefix,
            leading_margin,
            trailing_margin,
            tracking,
            trimming,
            tab_stops,
            ranges,
        })
    }

    pub fn apply_to(&self, ctx: &mut dyn DrawingContext) {
        ctx.set_string_format(self);
    }
}

fn read_signed_count(cursor: &mut ByteCursor<'_>) -> Result<u32> {
    let offset = cursor.offset();
    let count = cursor.read_i32()?;
    u32::try_from(count).map_err(|_| Error::malformed(offset, format!("negative count {}", count)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_font() {
        let mut data = Vec::new();
        data.extend_from_slice(&0xDBC0_1002u32.to_le_bytes());
        data.extend_from_slice(&12.0f32.to_le_bytes());
        data.extend_from_slice(&3u32.to_le_bytes());
        data.extend_from_slice(&(FontStyle::BOLD | FontStyle::ITALIC).bits().to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(&5u32.to_le_bytes());
        for c in "Arial".encode_utf16() {
            data.extend_from_slice(&c.to_le_bytes());
        }
        data.extend_from_slice(&[0, 0]);

        let mut cursor = ByteCursor::new(&data);
        let font = Font::decode(&mut cursor, &DecodeOptions::default()).unwrap();
        assert!(cursor.is_empty());
        assert_eq!(font.family, "Arial");
        assert_eq!(font.size_unit, UnitType::Point);
        assert!(font.is_bold());
        assert!(font.is_italic());
    }

    #[test]
    fn test_font_name_longer_than_data() {
        let mut data = Vec::new();
        data.extend_from_slice(&0xDBC0_1002u32.to_le_bytes());
        data.extend_from_slice(&12.0f32.to_le_bytes());
        data.extend_from_slice(&3u32.to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(&100u32.to_le_bytes());
        let mut cursor = ByteCursor::new(&data);
        assert!(matches!(
            Font::decode(&mut cursor, &DecodeOptions::default()),
            Err(Error::MalformedRecord { offset: 20, .. })
        ));
    }

    #[test]
    fn test_string_format() {
        let mut data = Vec::new();
        for v in [0xDBC0_1002u32, 0x1000, 0x0409, 1, 2, 0, 0] {
            data.extend_from_slice(&v.to_le_bytes());
        }
        data.extend_from_slice(&0.0f32.to_le_bytes());
        data.extend_from_slice(&0i32.to_le_bytes());
        for v in [1.0f32, 2.0, 0.5] {
            data.extend_from_slice(&v.to_le_bytes());
        }
        data.extend_from_slice(&1u32.to_le_bytes());
        data.extend_from_slice(&1i32.to_le_bytes());
        data.extend_from_slice(&1i32.to_le_bytes());
        data.extend_from_slice(&8.0f32.to_le_bytes());
        data.extend_from_slice(&0i32.to_le_bytes());
        data.extend_from_slice(&4i32.to_le_bytes());

        let mut cursor = ByteCursor::new(&data);
        let format = StringFormat::decode(&mut cursor, &DecodeOptions::default()).unwrap();
        assert!(cursor.is_empty());
        assert_eq!(format.alignment, StringAlignment::Center);
        assert_eq!(format.line_alignment, StringAlignment::Far);
        assert_eq!(format.tab_stops, vec![8.0]);
        assert_eq!(format.ranges, vec![CharacterRange { first: 0, length: 4 }]);
    }
}
