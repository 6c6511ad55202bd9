use arbitrary::Arbitrary;
use futures::io::Cursor;
use honggfuzz::fuzz;
use std::pin::Pin;
use urf_raster::decode::{Limits, UrfRasterDecoder};
use urf_raster::encode::UrfRasterEncoder;
use urf_raster::model::pixel::PixelFormat;
use urf_raster_fuzz::PageBuffer;

#[derive(Clone, Debug, Arbitrary)]
pub struct DataInput {
    pub data: Vec<u8>,
    pub width: u8,
    pub pixel_format: u8,
    pub blank_fill: Option<u8>,
}

fn main() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    loop {
        fuzz!(|input: DataInput| {
            let pixel_format = match input.pixel_format % 3 {
                0 => PixelFormat::GRAY8,
                1 => PixelFormat::RGB24,
                _ => PixelFormat::CMYK32,
            };
            let width = input.width.max(1) as u32;
            let bytes_per_line = width as usize * pixel_format.pixel_bytes();
            let height = input.data.len() / bytes_per_line;
            if height == 0 {
                return;
            }
            let data = &input.data[..height * bytes_per_line];

            let mut encoder = UrfRasterEncoder::new(width, pixel_format).unwrap();
            if let Some(fill_byte) = input.blank_fill {
                encoder = encoder.with_blank_fill(fill_byte);
            }
            let mut compressed = Vec::new();
            encoder.encode_page(data, &mut compressed).unwrap();

            rt.block_on(async {
                let mut compressed = Cursor::new(compressed);
                let mut decoder =
                    UrfRasterDecoder::new(width, height as u32, pixel_format, Limits::NO_LIMITS)
                        .unwrap()
                        .with_fill_byte(input.blank_fill.unwrap_or(0xff));
                let mut decoded = PageBuffer::default();
                decoder
                    .decode(Pin::new(&mut compressed), &mut decoded)
                    .await
                    .unwrap();
                assert_eq!(data, decoded.pixels.as_slice());
            });
        });
    }
}
