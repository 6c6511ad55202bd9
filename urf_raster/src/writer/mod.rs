mod urf;

pub use urf::UrfWriter;
