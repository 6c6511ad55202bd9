mod compressed;
mod limits;
mod scanline;

pub use compressed::{decode, UrfRasterDecoder};
pub use limits::Limits;
pub use scanline::Scanline;
