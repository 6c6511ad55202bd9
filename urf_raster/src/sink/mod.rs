mod bmp;
mod discard;
mod interface;
mod output;
mod tiff;

pub use bmp::BmpSink;
pub use discard::DiscardSink;
pub use interface::PixelSink;
pub use output::{OutputFormat, OutputSink};
pub use tiff::TiffSink;
