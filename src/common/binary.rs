//! Binary data parsing utilities shared by the record decoders.
//!
//! This module provides a forward-only little-endian cursor over a borrowed
//! byte slice. Every cursor remembers the absolute position of its first byte
//! inside the metafile stream, so errors raised deep inside a nested object
//! decoder still report the file offset at which decoding failed.

use zerocopy::{F32, FromBytes, I16, I32, LE, U16, U32};

/// Binary parsing error type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BinaryError {
    /// Not enough data to read the requested type
    InsufficientData {
        offset: usize,
        expected: usize,
        available: usize,
    },
}

impl std::fmt::Display for BinaryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BinaryError::InsufficientData {
                offset,
                expected,
                available,
            } => {
                write!(
                    f,
                    "Insufficient data at offset {}: expected {}, got {}",
                    offset, expected, available
                )
            },
        }
    }
}

impl std::error::Error for BinaryError {}

/// Result type for binary operations
pub type BinaryResult<T> = Result<T, BinaryError>;

/// Little-endian reader over a borrowed byte slice.
///
/// # Examples
///
/// ```
/// use emfplus::common::binary::ByteCursor;
/// let data = [0x34, 0x12, 0x78, 0x56, 0x34, 0x12];
/// let mut cursor = ByteCursor::new(&data);
/// assert_eq!(cursor.read_u16().unwrap(), 0x1234);
/// assert_eq!(cursor.read_u32().unwrap(), 0x12345678);
/// assert!(cursor.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
    base: usize,
}

impl<'a> ByteCursor<'a> {
    /// Create a cursor whose first byte sits at absolute offset 0.
    #[inline]
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_base(data, 0)
    }

    /// Create a cursor whose first byte sits at absolute offset `base`.
    #[inline]
    pub fn with_base(data: &'a [u8], base: usize) -> Self {
        Self { data, pos: 0, base }
    }

    /// Number of bytes consumed so far.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Absolute stream offset of the next unread byte.
    #[inline]
    pub fn offset(&self) -> usize {
        self.base + self.pos
    }

    /// Number of bytes left to read.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Total length of the underlying slice.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    fn ensure(&self, n: usize) -> BinaryResult<()> {
        if n > self.remaining() {
            return Err(BinaryError::InsufficientData {
                offset: self.offset(),
                expected: n,
                available: self.remaining(),
            });
        }
        Ok(())
    }

    /// Borrow the next `n` bytes and advance past them.
    #[inline]
    pub fn take(&mut self, n: usize) -> BinaryResult<&'a [u8]> {
        self.ensure(n)?;
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Borrow everything that is left and move to the end.
    #[inline]
    pub fn take_rest(&mut self) -> &'a [u8] {
        let slice = &self.data[self.pos..];
        self.pos = self.data.len();
        slice
    }

    /// Advance by `n` bytes without looking at them.
    #[inline]
    pub fn skip(&mut self, n: usize) -> BinaryResult<()> {
        self.take(n).map(|_| ())
    }

    /// Split the next `n` bytes off into an independent cursor.
    ///
    /// The returned cursor keeps reporting absolute offsets.
    pub fn sub_cursor(&mut self, n: usize) -> BinaryResult<ByteCursor<'a>> {
        let base = self.offset();
        let data = self.take(n)?;
        Ok(ByteCursor::with_base(data, base))
    }

    #[inline]
    pub fn read_u8(&mut self) -> BinaryResult<u8> {
        Ok(self.take(1)?[0])
    }

    #[inline]
    pub fn read_u16(&mut self) -> BinaryResult<u16> {
        let bytes = self.take(2)?;
        Ok(U16::<LE>::read_from_bytes(bytes).map(|v| v.get()).unwrap_or_default())
    }

    #[inline]
    pub fn read_i16(&mut self) -> BinaryResult<i16> {
        let bytes = self.take(2)?;
        Ok(I16::<LE>::read_from_bytes(bytes).map(|v| v.get()).unwrap_or_default())
    }

    #[inline]
    pub fn read_u32(&mut self) -> BinaryResult<u32> {
        let bytes = self.take(4)?;
        Ok(U32::<LE>::read_from_bytes(bytes).map(|v| v.get()).unwrap_or_default())
    }

    #[inline]
    pub fn read_i32(&mut self) -> BinaryResult<i32> {
        let bytes = self.take(4)?;
        Ok(I32::<LE>::read_from_bytes(bytes).map(|v| v.get()).unwrap_or_default())
    }

    #[inline]
    pub fn read_f32(&mut self) -> BinaryResult<f32> {
        let bytes = self.take(4)?;
        Ok(F32::<LE>::read_from_bytes(bytes).map(|v| v.get()).unwrap_or_default())
    }

    /// Read a zerocopy structure from the front of the remaining bytes.
    pub fn read_struct<T: FromBytes>(&mut self) -> BinaryResult<T> {
        let bytes = self.take(std::mem::size_of::<T>())?;
        T::read_from_bytes(bytes).map_err(|_| BinaryError::InsufficientData {
            offset: self.offset(),
            expected: std::mem::size_of::<T>(),
            available: bytes.len(),
        })
    }

    /// Skip the padding that brings `position()` up to a multiple of `align`.
    ///
    /// Padding is lenient: if the data ends before the boundary, the cursor
    /// stops at the end and no error is raised. Returns the bytes skipped.
    pub fn skip_padding(&mut self, align: usize) -> usize {
        let pad = (align - self.pos % align) % align;
        let pad = pad.min(self.remaining());
        self.pos += pad;
        pad
    }
}

/// Decode `char_count` UTF-16LE code units into a `String`.
///
/// Unpaired surrogates are replaced with U+FFFD; embedded NULs are kept.
///
/// # Examples
///
/// ```
/// use emfplus::common::binary::parse_utf16le_string_len;
/// let data = vec![0x48, 0x00, 0x65, 0x00, 0x6C, 0x00, 0x6C, 0x00, 0x6F, 0x00];
/// assert_eq!(parse_utf16le_string_len(&data, 5), "Hello");
/// assert_eq!(parse_utf16le_string_len(&data, 3), "Hel");
/// ```
pub fn parse_utf16le_string_len(data: &[u8], char_count: usize) -> String {
    let units = data
        .chunks_exact(2)
        .take(char_count)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]));
    char::decode_utf16(units)
        .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}
