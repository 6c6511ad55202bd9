mod compressed;

pub use compressed::UrfRasterEncoder;
