mod common;
mod urf;

pub use common::ReadHeaderFuture;
pub use urf::{UrfPageReader, UrfReader};
