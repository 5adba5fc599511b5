//! Decoder configuration.
//!
//! Every length read from untrusted input is checked against one of these
//! ceilings before it sizes an allocation.
use serde::{Deserialize, Serialize};

use crate::common::error::{Error, Result};

/// Allocation ceilings applied while decoding an EMF+ stream.
///
/// # Examples
///
/// ```
/// use emfplus::images::emfplus::DecodeOptions;
///
/// let options = DecodeOptions {
///     max_array_len: 4096,
///     ..DecodeOptions::default()
/// };
/// assert_eq!(options.max_region_depth, 256);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeOptions {
    /// Largest accepted record payload (`data_size`) in bytes
    pub max_record_size: u32,
    /// Largest element count for any array (points, rects, colors, glyphs)
    pub max_array_len: u32,
    /// Largest object body in bytes, including continued objects
    pub max_object_size: u32,
    /// Deepest accepted region node nesting
    pub max_region_depth: u32,
    /// Largest dash pattern or compound line array
    pub max_dash_count: u32,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            max_record_size: 16 * 1024 * 1024,
            max_array_len: 1_000_000,
            max_object_size: 50_000_000,
            max_region_depth: 256,
            max_dash_count: 1000,
        }
    }
}

/// Fail with `OversizedAllocation` when `requested` exceeds `ceiling`.
#[inline]
pub(crate) fn check_ceiling(offset: usize, requested: u64, ceiling: u32) -> Result<()> {
    if requested > u64::from(ceiling) {
        return Err(Error::OversizedAllocation {
            offset,
            requested,
            ceiling: u64::from(ceiling),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = DecodeOptions::default();
        assert_eq!(options.max_record_size, 16 * 1024 * 1024);
        assert_eq!(options.max_array_len, 1_000_000);
        assert_eq!(options.max_object_size, 50_000_000);
        assert_eq!(options.max_dash_count, 1000);
    }

    #[test]
    fn test_check_ceiling() {
        assert!(check_ceiling(0, 10, 10).is_ok());
        let err = check_ceiling(40, 11, 10).unwrap_err();
        assert_eq!(
            err,
            Error::OversizedAllocation {
                offset: 40,
                requested: 11,
                ceiling: 10
            }
        );
    }
}
