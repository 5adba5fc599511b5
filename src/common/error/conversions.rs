//! Error conversion implementations.
//!
//! This module contains From trait implementations to convert from internal
//! error types to the unified Error type.

use super::types::Error;
use crate::common::binary::BinaryError;

// Running out of bytes mid-structure is always malformed input.
impl From<BinaryError> for Error {
    fn from(err: BinaryError) -> Self {
        match err {
            BinaryError::InsufficientData {
                offset,
                expected,
                available,
            } => Error::MalformedRecord {
                offset,
                reason: format!(
                    "truncated data: needed {} bytes, {} available",
                    expected, available
                ),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_error_becomes_malformed_record() {
        let err: Error = BinaryError::InsufficientData {
            offset: 42,
            expected: 4,
            available: 1,
        }
        .into();
        assert!(matches!(err, Error::MalformedRecord { offset: 42, .. }));
        assert_eq!(err.offset(), 42);
    }
}
