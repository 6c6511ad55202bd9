mod decode;
mod urf;

pub use decode::DecodeError;
pub use urf::UrfError;
