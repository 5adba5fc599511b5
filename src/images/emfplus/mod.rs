// EMF+ (Enhanced Metafile Format Plus) decoding
//
// EMF+ is the GDI+ record layer carried inside EMF comment records. This
// module decodes an EMF+ record stream into typed records and graphics
// objects.
//
// # Architecture
//
// - `parser`: record framing and the streaming parser
// - `record`: decoded record bodies and per-type dispatch
// - `object_table`: the 64-slot object table and continued objects
// - `records`: object and record structures
// - `transform`: affine transform reconstruction
// - `device_context`: the drawing-state boundary objects are applied to
// - `comment`: EMF+ extraction from EMF comment records
//
// # Quick Start
//
// ```
// use emfplus::images::emfplus::{DecodeOptions, RecordBody, decode};
//
// let data = [0x02, 0x40, 0x00, 0x00, 0x0C, 0, 0, 0, 0, 0, 0, 0];
// let records = decode(&data, DecodeOptions::default()).unwrap();
// assert!(matches!(records[0].body, RecordBody::EndOfFile));
// ```

pub mod comment;
pub mod device_context;
pub mod object_table;
pub mod options;
pub mod parser;
pub mod record;
pub mod records;
pub mod transform;

pub use comment::emfplus_streams;
pub use device_context::{DrawingContext, Fill, GradientStop, RecordingContext, Stroke};
pub use object_table::{ObjectTable, ObjectUpdate};
pub use options::DecodeOptions;
pub use parser::{EmfPlusParser, RawRecord, RecordReader, decode};
pub use record::{EmfPlusHeader, EmfPlusRecord, ObjectRecord, RecordBody};
pub use records::GraphicsObject;
