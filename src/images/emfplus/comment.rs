// EMF+ payload extraction from EMF comment records
//
// EMF+ records travel inside EMR_COMMENT records of an ordinary EMF file,
// tagged with the "EMF+" comment identifier.

use tracing::debug;
use zerocopy::{FromBytes, LE, U32};

use crate::common::binary::ByteCursor;
use crate::common::error::{Error, Result};

/// EMR_COMMENT record type
pub const EMR_COMMENT: u32 = 70;
/// EMR_EOF record type
pub const EMR_EOF: u32 = 14;
/// "EMF+" comment identifier
pub const EMF_PLUS_SIGNATURE: u32 = 0x2B46_4D45;

/// Raw EMF record header (8 bytes)
#[derive(Debug, Clone, Copy, FromBytes)]
#[repr(C)]
struct RawEmfRecordHeader {
    record_type: U32<LE>,
    size: U32<LE>,
}

/// Concatenate the EMF+ record streams embedded in an EMF file.
///
/// Walks the EMF record list from the start (the header record included)
/// until EMR_EOF or the end of the data.
pub fn emfplus_streams(emf: &[u8]) -> Result<Vec<u8>> {
    let mut cursor = ByteCursor::new(emf);
    let mut stream = Vec::new();

    while !cursor.is_empty() {
        let offset = cursor.offset();
        let header: RawEmfRecordHeader = cursor.read_struct()?;
        let record_type = header.record_type.get();
        let size = header.size.get() as usize;
        if size < 8 || size - 8 > cursor.remaining() {
            return Err(Error::malformed(
                offset,
                format!("invalid EMF record size {}", size),
            ));
        }
        let mut body = cursor.sub_cursor(size - 8)?;

        if record_type == EMR_EOF {
            break;
        }
        if record_type != EMR_COMMENT || body.remaining() < 8 {
            continue;
        }

        let data_size = body.read_u32()? as usize;
        let identifier = body.read_u32()?;
        if identifier != EMF_PLUS_SIGNATURE {
            continue;
        }
        let payload_len = data_size.saturating_sub(4);
        let payload = body.take(payload_len)?;
        debug!(offset, bytes = payload.len(), "EMF+ comment");
        stream.extend_from_slice(payload);
    }

    Ok(stream)
}
