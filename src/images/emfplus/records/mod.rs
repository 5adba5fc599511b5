/// EMF+ record and object structures
///
/// Organized by category:
/// - `types`: record type registry and closed enumerations
/// - `primitives`: colors, points, rectangles, transforms, counted arrays
/// - `brush`, `pen`, `line_cap`, `path`, `region`, `image`, `font`: object decoders
/// - `object`: the object union stored in the object table
/// - `drawing`: drawing record bodies
pub mod brush;
pub mod drawing;
pub mod font;
pub mod image;
pub mod line_cap;
pub mod object;
pub mod path;
pub mod pen;
pub mod primitives;
pub mod region;
pub mod types;

pub use brush::{Brush, BrushData, BrushDataFlags};
pub use drawing::BrushRef;
pub use font::{Font, FontStyle, StringFormat};
pub use image::{Image, ImageAttributes, ImageData, PixelFormat};
pub use line_cap::{CustomLineCap, CustomLineCapData};
pub use object::GraphicsObject;
pub use path::{Path, PathPointFlags, PointKind, PointType};
pub use pen::{Pen, PenDataFlags};
pub use primitives::{Color, GraphicsVersion, PointF, RectF, Transform};
pub use region::{Region, RegionNode, RegionOp};
pub use types::{EmfPlusRecordType, ObjectType};
