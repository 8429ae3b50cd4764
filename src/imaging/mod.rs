// Imaging module - decoding, colour adjustment, shape and text rasterisation
pub mod adjust;
pub mod codec;
pub mod color;
pub mod draw;
mod error;
pub mod text;

pub use codec::{DecodeMode, PixelBuffer};
pub use color::{Color, parse_color};
pub use draw::{Circle, Drawable, Line, Polygon, Rectangle, Stroke};
pub use error::ImagingError;
pub use text::{FontBook, Text, Typeface};
