use super::DecodeError;
use crate::model::urf::UrfColorSpace;
use num_enum::TryFromPrimitiveError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum UrfError {
    #[error("IO error")]
    IoError(#[from] std::io::Error),
    #[error("Invalid magic")]
    InvalidMagic,
    #[error("Unknown color space")]
    UnknownColorSpace(#[from] TryFromPrimitiveError<UrfColorSpace>),
    #[error("Image encoding error")]
    ImageError(#[from] image::ImageError),
    #[error("Data too large")]
    DataTooLarge,
    #[error("Unsupported pixel format: {0} bits per pixel")]
    UnsupportedPixelFormat(u8),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl UrfError {
    /// `true` if the raster body of a page ended before all of its lines were read.
    pub fn is_truncated(&self) -> bool {
        matches!(self, UrfError::Decode(e) if e.is_truncated())
    }
}
