use crate::error::DecodeError;

/// Layout of one pixel in the raster body: chunky, 8 bits per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelFormat {
    bits_per_pixel: u8,
}

impl PixelFormat {
    pub const GRAY8: PixelFormat = PixelFormat { bits_per_pixel: 8 };
    pub const RGB24: PixelFormat = PixelFormat { bits_per_pixel: 24 };
    pub const CMYK32: PixelFormat = PixelFormat { bits_per_pixel: 32 };

    /// Fails with [`DecodeError::UnsupportedPixelFormat`] unless `bits_per_pixel`
    /// is a non-zero multiple of 8.
    pub fn new(bits_per_pixel: u8) -> Result<Self, DecodeError> {
        if bits_per_pixel == 0 || bits_per_pixel % 8 != 0 {
            return Err(DecodeError::UnsupportedPixelFormat(bits_per_pixel));
        }
        Ok(PixelFormat { bits_per_pixel })
    }

    pub fn bits_per_pixel(&self) -> u8 {
        self.bits_per_pixel
    }

    pub fn pixel_bytes(&self) -> usize {
        (self.bits_per_pixel / 8) as usize
    }
}

/// How the channel bytes of a pixel read from the stream are placed into a scanline.
///
/// URF carries pixels in colour-space order (e.g. R, G, B). Some file formats
/// store them the other way round (BMP stores B, G, R), so each sink picks the
/// order it wants to receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChannelOrder {
    /// Channel bytes are copied as they appear in the stream.
    #[default]
    Straight,
    /// Channel bytes of every pixel are reversed.
    Reversed,
}
