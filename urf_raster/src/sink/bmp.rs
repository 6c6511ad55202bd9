use super::PixelSink;
use crate::error::UrfError;
use crate::model::pixel::PixelFormat;
use crate::model::urf::UrfPageHeader;
use byteorder::{ByteOrder, LittleEndian};
use image::codecs::bmp::BmpEncoder;
use image::ExtendedColorType;
use log::debug;
use std::io::{self, Write};

const BLANK: u8 = 0xff;
// Offsets in a BITMAPFILEHEADER followed by a BITMAPINFOHEADER (or larger).
const DIB_HEADER_OFFSET: usize = 14;
const X_PIXELS_PER_METRE_OFFSET: usize = 38;
const Y_PIXELS_PER_METRE_OFFSET: usize = 42;
const INFO_HEADER_SIZE: u32 = 40;

/// Collects the lines of a 24 bit RGB page and encodes them as a BMP file.
///
/// Lines that were never received stay white.
#[derive(Debug)]
pub struct BmpSink {
    width: u32,
    height: u32,
    pixels_per_metre: i32,
    pixels: Vec<u8>,
}

impl BmpSink {
    pub fn new(
        width: u32,
        height: u32,
        pixel_format: PixelFormat,
        dot_per_inch: u32,
    ) -> Result<Self, UrfError> {
        if pixel_format != PixelFormat::RGB24 {
            return Err(UrfError::UnsupportedPixelFormat(
                pixel_format.bits_per_pixel(),
            ));
        }
        let size = (width as u64 * 3)
            .checked_mul(height as u64)
            .filter(|size| *size <= u32::MAX as u64)
            .ok_or(UrfError::DataTooLarge)?;
        let size = usize::try_from(size).map_err(|_| UrfError::DataTooLarge)?;
        let mut pixels = Vec::new();
        pixels
            .try_reserve_exact(size)
            .map_err(|_| UrfError::DataTooLarge)?;
        pixels.resize(size, BLANK);
        Ok(BmpSink {
            width,
            height,
            pixels_per_metre: (dot_per_inch as f64 / 0.0254).round() as i32,
            pixels,
        })
    }

    pub fn for_page(header: &UrfPageHeader) -> Result<Self, UrfError> {
        Self::new(
            header.width,
            header.height,
            header.pixel_format()?,
            header.dot_per_inch,
        )
    }

    /// Encode the page and write the complete file.
    pub fn finish<W: Write>(self, mut writer: W) -> Result<(), UrfError> {
        let mut file = Vec::new();
        BmpEncoder::new(&mut file).encode(
            &self.pixels,
            self.width,
            self.height,
            ExtendedColorType::Rgb8,
        )?;
        if file.len() >= Y_PIXELS_PER_METRE_OFFSET + 4
            && LittleEndian::read_u32(&file[DIB_HEADER_OFFSET..]) >= INFO_HEADER_SIZE
        {
            LittleEndian::write_i32(&mut file[X_PIXELS_PER_METRE_OFFSET..], self.pixels_per_metre);
            LittleEndian::write_i32(&mut file[Y_PIXELS_PER_METRE_OFFSET..], self.pixels_per_metre);
        }
        debug!(
            "writing {}x{} bitmap, {} bytes",
            self.width,
            self.height,
            file.len()
        );
        writer.write_all(&file)?;
        writer.flush()?;
        Ok(())
    }
}

impl PixelSink for BmpSink {
    fn accept_line(&mut self, line_index: u32, line: &[u8]) -> io::Result<()> {
        let stride = self.width as usize * 3;
        if line_index >= self.height || line.len() != stride {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "line does not fit the bitmap",
            ));
        }
        let start = line_index as usize * stride;
        self.pixels[start..start + stride].copy_from_slice(line);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::pixel::ChannelOrder;

    #[test]
    fn test_encoded_file() {
        let mut sink = BmpSink::new(1, 2, PixelFormat::RGB24, 300).unwrap();
        sink.accept_line(0, &[1, 2, 3]).unwrap();
        sink.accept_line(1, &[4, 5, 6]).unwrap();
        let mut file = Vec::new();
        sink.finish(&mut file).unwrap();

        assert_eq!(&file[..2], b"BM");
        assert_eq!(LittleEndian::read_u32(&file[2..6]) as usize, file.len());
        assert_eq!(LittleEndian::read_i32(&file[18..22]), 1);
        assert_eq!(LittleEndian::read_i32(&file[22..26]), 2);
        assert_eq!(LittleEndian::read_u16(&file[28..30]), 24);
        assert_eq!(LittleEndian::read_i32(&file[38..42]), 11811);
        assert_eq!(LittleEndian::read_i32(&file[42..46]), 11811);
        // last line first, stored as B, G, R
        let data = LittleEndian::read_u32(&file[10..14]) as usize;
        assert_eq!(&file[data..data + 3], &[6, 5, 4]);
        assert_eq!(&file[data + 4..data + 7], &[3, 2, 1]);

        let image = image::load_from_memory(&file).unwrap().to_rgb8();
        assert_eq!(image.dimensions(), (1, 2));
        assert_eq!(image.into_raw(), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_missing_lines_stay_white() {
        let mut sink = BmpSink::new(2, 2, PixelFormat::RGB24, 72).unwrap();
        sink.accept_line(1, &[0, 0, 0, 10, 20, 30]).unwrap();
        let mut file = Vec::new();
        sink.finish(&mut file).unwrap();
        let image = image::load_from_memory(&file).unwrap().to_rgb8();
        assert_eq!(
            image.into_raw(),
            vec![0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0, 0, 0, 10, 20, 30]
        );
    }

    #[test]
    fn test_rejects_foreign_lines() {
        let mut sink = BmpSink::new(2, 1, PixelFormat::RGB24, 72).unwrap();
        assert!(sink.accept_line(1, &[0; 6]).is_err());
        assert!(sink.accept_line(0, &[0; 3]).is_err());
        assert!(sink.accept_line(0, &[0; 6]).is_ok());
    }

    #[test]
    fn test_unsupported_pixel_format() {
        assert!(matches!(
            BmpSink::new(2, 2, PixelFormat::GRAY8, 300),
            Err(UrfError::UnsupportedPixelFormat(8))
        ));
        assert!(matches!(
            BmpSink::new(2, 2, PixelFormat::CMYK32, 300),
            Err(UrfError::UnsupportedPixelFormat(32))
        ));
    }

    #[test]
    fn test_uses_straight_channel_order() {
        let sink = BmpSink::new(1, 1, PixelFormat::RGB24, 300).unwrap();
        assert_eq!(sink.channel_order(), ChannelOrder::Straight);
    }
}
