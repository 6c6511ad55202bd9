pub mod pixel;
pub mod urf;
