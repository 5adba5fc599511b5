//! Emfplus - A Rust library for decoding EMF+ metafile records
//!
//! EMF+ is the GDI+ drawing layer stored inside Enhanced Metafiles, which in
//! turn are embedded in Office documents. This library turns an untrusted
//! EMF+ byte stream into typed records and graphics objects.
//!
//! # Features
//!
//! - **Record decoding**: Every EMF+ record type, with exact byte accounting
//! - **Object table**: Brushes, pens, paths, regions, images, fonts and more,
//!   including objects split across several records
//! - **Bounded allocation**: Every length read from the stream is checked
//!   against configurable ceilings
//! - **Drawing-state boundary**: Decoded objects apply themselves to a
//!   caller-supplied context
//!
//! # Example - Decoding a stream
//!
//! ```
//! use emfplus::images::emfplus::{EmfPlusParser, RecordBody};
//!
//! # fn main() -> Result<(), emfplus::Error> {
//! let data = [0x02, 0x40, 0x00, 0x00, 0x0C, 0, 0, 0, 0, 0, 0, 0];
//! for record in EmfPlusParser::new(&data) {
//!     let record = record?;
//!     if record.body == RecordBody::EndOfFile {
//!         println!("end of metafile at offset {}", record.offset);
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Example - EMF+ inside an EMF file
//!
//! ```no_run
//! use emfplus::images::emfplus::{DecodeOptions, decode, emfplus_streams};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let emf = std::fs::read("drawing.emf")?;
//! let stream = emfplus_streams(&emf)?;
//! let records = decode(&stream, DecodeOptions::default())?;
//! println!("{} EMF+ records", records.len());
//! # Ok(())
//! # }
//! ```

pub mod common;
pub mod images;

pub use common::{Error, Result};
pub use images::emfplus::{DecodeOptions, EmfPlusParser, EmfPlusRecord, GraphicsObject, RecordBody};
