//! Unified error types for EMF+ decoding.
//!
//! Every failure carries the absolute byte offset at which it was detected so
//! callers can point at the offending record in the metafile stream.

// Submodule declarations
pub mod conversions;
pub mod types;

// Re-exports
pub use types::{Error, Result};
