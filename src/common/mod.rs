//! Common types and utilities shared by the decoders.

pub mod binary;
pub mod error;

pub use error::{Error, Result};
