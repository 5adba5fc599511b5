/// EMF+ Record Types and Enumerations
///
/// Closed code-to-kind tables based on the [MS-EMFPLUS] specification. Every
/// numeric code read from a stream is mapped through one of these tables; an
/// unmapped value is reported as an error instead of being carried forward.
///
/// References:
/// - [MS-EMFPLUS]: Enhanced Metafile Format Plus Extensions
use crate::common::binary::ByteCursor;
use crate::common::error::{Error, Result};

/// EMF+ Record Type enumeration
///
/// All record types defined in [MS-EMFPLUS] section 2.1.1.1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum EmfPlusRecordType {
    // Control Records
    Header = 0x4001,
    EndOfFile = 0x4002,
    Comment = 0x4003,
    GetDc = 0x4004,
    MultiFormatStart = 0x4005,
    MultiFormatSection = 0x4006,
    MultiFormatEnd = 0x4007,

    // Object Record
    Object = 0x4008,

    // Drawing Records
    Clear = 0x4009,
    FillRects = 0x400A,
    DrawRects = 0x400B,
    FillPolygon = 0x400C,
    DrawLines = 0x400D,
    FillEllipse = 0x400E,
    DrawEllipse = 0x400F,
    FillPie = 0x4010,
    DrawPie = 0x4011,
    DrawArc = 0x4012,
    FillRegion = 0x4013,
    FillPath = 0x4014,
    DrawPath = 0x4015,
    FillClosedCurve = 0x4016,
    DrawClosedCurve = 0x4017,
    DrawCurve = 0x4018,
    DrawBeziers = 0x4019,
    DrawImage = 0x401A,
    DrawImagePoints = 0x401B,
    DrawString = 0x401C,

    // Property Records
    SetRenderingOrigin = 0x401D,
    SetAntiAliasMode = 0x401E,
    SetTextRenderingHint = 0x401F,
    SetTextContrast = 0x4020,
    SetInterpolationMode = 0x4021,
    SetPixelOffsetMode = 0x4022,
    SetCompositingMode = 0x4023,
    SetCompositingQuality = 0x4024,

    // State Records
    Save = 0x4025,
    Restore = 0x4026,
    BeginContainer = 0x4027,
    BeginContainerNoParams = 0x4028,
    EndContainer = 0x4029,

    // Transform Records
    SetWorldTransform = 0x402A,
    ResetWorldTransform = 0x402B,
    MultiplyWorldTransform = 0x402C,
    TranslateWorldTransform = 0x402D,
    ScaleWorldTransform = 0x402E,
    RotateWorldTransform = 0x402F,
    SetPageTransform = 0x4030,

    // Clipping Records
    ResetClip = 0x4031,
    SetClipRect = 0x4032,
    SetClipPath = 0x4033,
    SetClipRegion = 0x4034,
    OffsetClip = 0x4035,

    DrawDriverString = 0x4036,
    StrokeFillPath = 0x4037,
    SerializableObject = 0x4038,

    // Terminal Server Records
    SetTsGraphics = 0x4039,
    SetTsClip = 0x403A,
}

impl EmfPlusRecordType {
    /// Convert from the 16-bit type code of a record header
    #[inline]
    pub const fn from_u16(value: u16) -> Option<Self> {
        match value {
            0x4001 => Some(Self::Header),
            0x4002 => Some(Self::EndOfFile),
            0x4003 => Some(Self::Comment),
            0x4004 => Some(Self::GetDc),
            0x4005 => Some(Self::MultiFormatStart),
            0x4006 => Some(Self::MultiFormatSection),
            0x4007 => Some(Self::MultiFormatEnd),
            0x4008 => Some(Self::Object),
            0x4009 => Some(Self::Clear),
            0x400A => Some(Self::FillRects),
            0x400B => Some(Self::DrawRects),
            0x400C => Some(Self::FillPolygon),
            0x400D => Some(Self::DrawLines),
            0x400E => Some(Self::FillEllipse),
            0x400F => Some(Self::DrawEllipse),
            0x4010 => Some(Self::FillPie),
            0x4011 => Some(Self::DrawPie),
            0x4012 => Some(Self::DrawArc),
            0x4013 => Some(Self::FillRegion),
            0x4014 => Some(Self::FillPath),
            0x4015 => Some(Self::DrawPath),
            0x4016 => Some(Self::FillClosedCurve),
            0x4017 => Some(Self::DrawClosedCurve),
            0x4018 => Some(Self::DrawCurve),
            0x4019 => Some(Self::DrawBeziers),
            0x401A => Some(Self::DrawImage),
            0x401B => Some(Self::DrawImagePoints),
            0x401C => Some(Self::DrawString),
            0x401D => Some(Self::SetRenderingOrigin),
            0x401E => Some(Self::SetAntiAliasMode),
            0x401F => Some(Self::SetTextRenderingHint),
            0x4020 => Some(Self::SetTextContrast),
            0x4021 => Some(Self::SetInterpolationMode),
            0x4022 => Some(Self::SetPixelOffsetMode),
            0x4023 => Some(Self::SetCompositingMode),
            0x4024 => Some(Self::SetCompositingQuality),
            0x4025 => Some(Self::Save),
            0x4026 => Some(Self::Restore),
            0x4027 => Some(Self::BeginContainer),
            0x4028 => Some(Self::BeginContainerNoParams),
            0x4029 => Some(Self::EndContainer),
            0x402A => Some(Self::SetWorldTransform),
            0x402B => Some(Self::ResetWorldTransform),
            0x402C => Some(Self::MultiplyWorldTransform),
            0x402D => Some(Self::TranslateWorldTransform),
            0x402E => Some(Self::ScaleWorldTransform),
            0x402F => Some(Self::RotateWorldTransform),
            0x4030 => Some(Self::SetPageTransform),
            0x4031 => Some(Self::ResetClip),
            0x4032 => Some(Self::SetClipRect),
            0x4033 => Some(Self::SetClipPath),
            0x4034 => Some(Self::SetClipRegion),
            0x4035 => Some(Self::OffsetClip),
            0x4036 => Some(Self::DrawDriverString),
            0x4037 => Some(Self::StrokeFillPath),
            0x4038 => Some(Self::SerializableObject),
            0x4039 => Some(Self::SetTsGraphics),
            0x403A => Some(Self::SetTsClip),
            _ => None,
        }
    }

    /// Records whose payload is kept verbatim even though the type is known.
    #[inline]
    pub const fn is_opaque(self) -> bool {
        matches!(
            self,
            Self::Comment
                | Self::GetDc
                | Self::MultiFormatStart
                | Self::MultiFormatSection
                | Self::MultiFormatEnd
                | Self::SerializableObject
                | Self::SetTsGraphics
                | Self::SetTsClip
        )
    }

    /// Get record type name for debugging
    pub const fn name(self) -> &'static str {
        match self {
            Self::Header => "EmfPlusHeader",
            Self::EndOfFile => "EmfPlusEndOfFile",
            Self::Comment => "EmfPlusComment",
            Self::GetDc => "EmfPlusGetDC",
            Self::MultiFormatStart => "EmfPlusMultiFormatStart",
            Self::MultiFormatSection => "EmfPlusMultiFormatSection",
            Self::MultiFormatEnd => "EmfPlusMultiFormatEnd",
            Self::Object => "EmfPlusObject",
            Self::Clear => "EmfPlusClear",
            Self::FillRects => "EmfPlusFillRects",
            Self::DrawRects => "EmfPlusDrawRects",
            Self::FillPolygon => "EmfPlusFillPolygon",
            Self::DrawLines => "EmfPlusDrawLines",
            Self::FillEllipse => "EmfPlusFillEllipse",
            Self::DrawEllipse => "EmfPlusDrawEllipse",
            Self::FillPie => "EmfPlusFillPie",
            Self::DrawPie => "EmfPlusDrawPie",
            Self::DrawArc => "EmfPlusDrawArc",
            Self::FillRegion => "EmfPlusFillRegion",
            Self::FillPath => "EmfPlusFillPath",
            Self::DrawPath => "EmfPlusDrawPath",
            Self::FillClosedCurve => "EmfPlusFillClosedCurve",
            Self::DrawClosedCurve => "EmfPlusDrawClosedCurve",
            Self::DrawCurve => "EmfPlusDrawCurve",
            Self::DrawBeziers => "EmfPlusDrawBeziers",
            Self::DrawImage => "EmfPlusDrawImage",
            Self::DrawImagePoints => "EmfPlusDrawImagePoints",
            Self::DrawString => "EmfPlusDrawString",
            Self::SetRenderingOrigin => "EmfPlusSetRenderingOrigin",
            Self::SetAntiAliasMode => "EmfPlusSetAntiAliasMode",
            Self::SetTextRenderingHint => "EmfPlusSetTextRenderingHint",
            Self::SetTextContrast => "EmfPlusSetTextContrast",
            Self::SetInterpolationMode => "EmfPlusSetInterpolationMode",
            Self::SetPixelOffsetMode => "EmfPlusSetPixelOffsetMode",
            Self::SetCompositingMode => "EmfPlusSetCompositingMode",
            Self::SetCompositingQuality => "EmfPlusSetCompositingQuality",
            Self::Save => "EmfPlusSave",
            Self::Restore => "EmfPlusRestore",
            Self::BeginContainer => "EmfPlusBeginContainer",
            Self::BeginContainerNoParams => "EmfPlusBeginContainerNoParams",
            Self::EndContainer => "EmfPlusEndContainer",
            Self::SetWorldTransform => "EmfPlusSetWorldTransform",
            Self::ResetWorldTransform => "EmfPlusResetWorldTransform",
            Self::MultiplyWorldTransform => "EmfPlusMultiplyWorldTransform",
            Self::TranslateWorldTransform => "EmfPlusTranslateWorldTransform",
            Self::ScaleWorldTransform => "EmfPlusScaleWorldTransform",
            Self::RotateWorldTransform => "EmfPlusRotateWorldTransform",
            Self::SetPageTransform => "EmfPlusSetPageTransform",
            Self::ResetClip => "EmfPlusResetClip",
            Self::SetClipRect => "EmfPlusSetClipRect",
            Self::SetClipPath => "EmfPlusSetClipPath",
            Self::SetClipRegion => "EmfPlusSetClipRegion",
            Self::OffsetClip => "EmfPlusOffsetClip",
            Self::DrawDriverString => "EmfPlusDrawDriverString",
            Self::StrokeFillPath => "EmfPlusStrokeFillPath",
            Self::SerializableObject => "EmfPlusSerializableObject",
            Self::SetTsGraphics => "EmfPlusSetTSGraphics",
            Self::SetTsClip => "EmfPlusSetTSClip",
        }
    }
}

/// Declares a closed `u32`-coded enumeration with a checked decoder.
macro_rules! emfplus_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident ($label:literal) {
            $( $(#[$vmeta:meta])* $variant:ident = $value:expr ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u32)]
        $vis enum $name {
            $( $(#[$vmeta])* $variant = $value ),+
        }

        impl $name {
            #[inline]
            pub const fn from_u32(value: u32) -> Option<Self> {
                match value {
                    $( v if v == $value => Some(Self::$variant), )+
                    _ => None,
                }
            }

            /// Read a 32-bit code and map it, rejecting unknown values.
            pub fn read(cursor: &mut ByteCursor<'_>) -> Result<Self> {
                let offset = cursor.offset();
                let value = cursor.read_u32()?;
                Self::from_u32(value).ok_or_else(|| {
                    Error::malformed(offset, format!("invalid {} value 0x{:08X}", $label, value))
                })
            }
        }
    };
}

emfplus_enum! {
    /// Object types stored in the EMF+ object table
    pub enum ObjectType ("object") {
        Invalid = 0x00,
        Brush = 0x01,
        Pen = 0x02,
        Path = 0x03,
        Region = 0x04,
        Image = 0x05,
        Font = 0x06,
        StringFormat = 0x07,
        ImageAttributes = 0x08,
        CustomLineCap = 0x09,
    }
}

emfplus_enum! {
    /// Units of measure for widths, sizes and page transforms
    pub enum UnitType ("unit") {
        World = 0x00,
        Display = 0x01,
        Pixel = 0x02,
        Point = 0x03,
        Inch = 0x04,
        Document = 0x05,
        Millimeter = 0x06,
    }
}

emfplus_enum! {
    /// How a texture or gradient is tiled outside its boundary
    pub enum WrapMode ("wrap mode") {
        Tile = 0x00,
        TileFlipX = 0x01,
        TileFlipY = 0x02,
        TileFlipXY = 0x03,
        Clamp = 0x04,
    }
}

emfplus_enum! {
    /// Set operation used when combining clip regions
    pub enum CombineMode ("combine mode") {
        Replace = 0x00,
        Intersect = 0x01,
        Union = 0x02,
        Xor = 0x03,
        Exclude = 0x04,
        Complement = 0x05,
    }
}

emfplus_enum! {
    /// Shape at the start or end of a stroked line
    pub enum LineCapType ("line cap") {
        Flat = 0x00,
        Square = 0x01,
        Round = 0x02,
        Triangle = 0x03,
        NoAnchor = 0x10,
        SquareAnchor = 0x11,
        RoundAnchor = 0x12,
        DiamondAnchor = 0x13,
        ArrowAnchor = 0x14,
        AnchorMask = 0xF0,
        Custom = 0xFF,
    }
}

emfplus_enum! {
    /// How two stroked segments are joined
    pub enum LineJoin ("line join") {
        Miter = 0x00,
        Bevel = 0x01,
        Round = 0x02,
        MiterClipped = 0x03,
    }
}

emfplus_enum! {
    /// Dash style of a stroked line
    pub enum LineStyle ("line style") {
        Solid = 0x00,
        Dash = 0x01,
        Dot = 0x02,
        DashDot = 0x03,
        DashDotDot = 0x04,
        Custom = 0x05,
    }
}

emfplus_enum! {
    /// Shape at both ends of each dash
    pub enum DashedLineCapType ("dashed line cap") {
        Flat = 0x00,
        Round = 0x02,
        Triangle = 0x03,
    }
}

emfplus_enum! {
    /// Placement of the pen width relative to the stroked geometry
    pub enum PenAlignment ("pen alignment") {
        Center = 0x00,
        Inset = 0x01,
        Left = 0x02,
        Outset = 0x03,
        Right = 0x04,
    }
}

emfplus_enum! {
    /// Pattern drawn by a hatch brush
    pub enum HatchStyle ("hatch style") {
        Horizontal = 0x00,
        Vertical = 0x01,
        ForwardDiagonal = 0x02,
        BackwardDiagonal = 0x03,
        LargeGrid = 0x04,
        DiagonalCross = 0x05,
        Percent05 = 0x06,
        Percent10 = 0x07,
        Percent20 = 0x08,
        Percent25 = 0x09,
        Percent30 = 0x0A,
        Percent40 = 0x0B,
        Percent50 = 0x0C,
        Percent60 = 0x0D,
        Percent70 = 0x0E,
        Percent75 = 0x0F,
        Percent80 = 0x10,
        Percent90 = 0x11,
        LightDownwardDiagonal = 0x12,
        LightUpwardDiagonal = 0x13,
        DarkDownwardDiagonal = 0x14,
        DarkUpwardDiagonal = 0x15,
        WideDownwardDiagonal = 0x16,
        WideUpwardDiagonal = 0x17,
        LightVertical = 0x18,
        LightHorizontal = 0x19,
        NarrowVertical = 0x1A,
        NarrowHorizontal = 0x1B,
        DarkVertical = 0x1C,
        DarkHorizontal = 0x1D,
        DashedDownwardDiagonal = 0x1E,
        DashedUpwardDiagonal = 0x1F,
        DashedHorizontal = 0x20,
        DashedVertical = 0x21,
        SmallConfetti = 0x22,
        LargeConfetti = 0x23,
        ZigZag = 0x24,
        Wave = 0x25,
        DiagonalBrick = 0x26,
        HorizontalBrick = 0x27,
        Weave = 0x28,
        Plaid = 0x29,
        Divot = 0x2A,
        DottedGrid = 0x2B,
        DottedDiamond = 0x2C,
        Shingle = 0x2D,
        Trellis = 0x2E,
        Sphere = 0x2F,
        SmallGrid = 0x30,
        SmallCheckerBoard = 0x31,
        LargeCheckerBoard = 0x32,
        OutlinedDiamond = 0x33,
        SolidDiamond = 0x34,
    }
}

emfplus_enum! {
    /// Kind of data carried by an image object
    pub enum ImageDataType ("image data") {
        Unknown = 0x00,
        Bitmap = 0x01,
        Metafile = 0x02,
    }
}

emfplus_enum! {
    /// Encoding of bitmap image data
    pub enum BitmapDataType ("bitmap data") {
        Pixel = 0x00,
        Compressed = 0x01,
    }
}

emfplus_enum! {
    /// Kind of metafile embedded in an image object
    pub enum MetafileDataType ("metafile data") {
        Wmf = 0x01,
        WmfPlaceable = 0x02,
        Emf = 0x03,
        EmfPlusOnly = 0x04,
        EmfPlusDual = 0x05,
    }
}

emfplus_enum! {
    /// Clamping applied by image attributes
    pub enum ObjectClamp ("object clamp") {
        Rect = 0x00,
        Bitmap = 0x01,
    }
}

emfplus_enum! {
    /// Horizontal or vertical alignment of text in a layout rectangle
    pub enum StringAlignment ("string alignment") {
        Near = 0x00,
        Center = 0x01,
        Far = 0x02,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_type_lookup() {
        assert_eq!(EmfPlusRecordType::from_u16(0x4001), Some(EmfPlusRecordType::Header));
        assert_eq!(EmfPlusRecordType::from_u16(0x4008), Some(EmfPlusRecordType::Object));
        assert_eq!(EmfPlusRecordType::from_u16(0x403A), Some(EmfPlusRecordType::SetTsClip));
        assert_eq!(EmfPlusRecordType::from_u16(0x4000), None);
        assert_eq!(EmfPlusRecordType::from_u16(0x403B), None);
        assert_eq!(EmfPlusRecordType::FillRects.name(), "EmfPlusFillRects");
    }

    #[test]
    fn test_opaque_records() {
        assert!(EmfPlusRecordType::Comment.is_opaque());
        assert!(EmfPlusRecordType::SerializableObject.is_opaque());
        assert!(!EmfPlusRecordType::Object.is_opaque());
    }

    #[test]
    fn test_enum_read_rejects_unknown_values() {
        let data = 0x04u32.to_le_bytes();
        let mut cursor = ByteCursor::with_base(&data, 8);
        assert_eq!(WrapMode::read(&mut cursor).unwrap(), WrapMode::Clamp);

        let data = 0x07u32.to_le_bytes();
        let mut cursor = ByteCursor::with_base(&data, 8);
        let err = WrapMode::read(&mut cursor).unwrap_err();
        assert!(matches!(err, Error::MalformedRecord { offset: 8, .. }));
    }

    #[test]
    fn test_hatch_style_range() {
        assert_eq!(HatchStyle::from_u32(0x34), Some(HatchStyle::SolidDiamond));
        assert_eq!(HatchStyle::from_u32(0x35), None);
        assert_eq!(LineCapType::from_u32(0xFF), Some(LineCapType::Custom));
    }
}
