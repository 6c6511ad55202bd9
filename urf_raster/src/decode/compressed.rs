use super::{Limits, Scanline};
use crate::error::DecodeError;
use crate::model::pixel::{ChannelOrder, PixelFormat};
use crate::model::urf::UrfPageHeader;
use crate::sink::PixelSink;
use futures::{AsyncRead, AsyncReadExt};
use log::{debug, trace};
use std::io;
use std::pin::Pin;
use std::slice;

/// Decoder for the run-length compressed raster body of one URF page.
///
/// The body is a sequence of line records. Each record starts with an unsigned
/// byte `r`: the line that follows is emitted `r + 1` times. The line itself is
/// a sequence of runs, each introduced by a signed control byte `c`:
///
/// - `c == -128`: the rest of the line is blank (filled with the fill byte).
/// - `0 <= c <= 127`: one pixel follows and is repeated `c + 1` times.
/// - `-127 <= c <= -1`: `1 - c` literal pixels follow.
///
/// A run that would cross the end of the line is cut at the line end; literal
/// pixels past the line end are not read.
#[derive(Debug)]
pub struct UrfRasterDecoder {
    height: u32,
    pixel_format: PixelFormat,
    fill_byte: u8,
    channel_order: Option<ChannelOrder>,
    line: Scanline,
}

impl UrfRasterDecoder {
    pub fn new(
        width: u32,
        height: u32,
        pixel_format: PixelFormat,
        limits: &Limits,
    ) -> Result<Self, DecodeError> {
        if width == 0 || height == 0 {
            return Err(DecodeError::InvalidGeometry);
        }
        let bytes_per_line = width as u64 * pixel_format.pixel_bytes() as u64;
        let num_bytes = bytes_per_line
            .checked_mul(height as u64)
            .ok_or(DecodeError::LimitExceeded)?;
        limits.check(width, height, bytes_per_line, num_bytes)?;
        let width = usize::try_from(width).map_err(|_| DecodeError::LimitExceeded)?;
        Ok(UrfRasterDecoder {
            height,
            pixel_format,
            fill_byte: 0xff,
            channel_order: None,
            line: Scanline::new(width, pixel_format.pixel_bytes())?,
        })
    }

    /// Decoder set up from a page header: geometry, pixel format and the blank
    /// value of the page's colour space.
    pub fn for_page(header: &UrfPageHeader, limits: &Limits) -> Result<Self, DecodeError> {
        Ok(Self::new(header.width, header.height, header.pixel_format()?, limits)?
            .with_fill_byte(header.fill_byte()))
    }

    pub fn with_fill_byte(mut self, fill_byte: u8) -> Self {
        self.fill_byte = fill_byte;
        self
    }

    /// Force a channel order instead of the one requested by the sink.
    pub fn with_channel_order(mut self, channel_order: ChannelOrder) -> Self {
        self.channel_order = Some(channel_order);
        self
    }

    pub fn width(&self) -> u32 {
        self.line.width() as u32
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel_format(&self) -> PixelFormat {
        self.pixel_format
    }

    /// Decode exactly `height` lines from `reader` into `sink`, in order.
    ///
    /// `reader` must be positioned on the first line record of the page. On
    /// success it is left right after the last record of the page. On failure
    /// the lines already passed to the sink stay there.
    pub async fn decode<R, S>(
        &mut self,
        mut reader: Pin<&mut R>,
        sink: &mut S,
    ) -> Result<(), DecodeError>
    where
        R: AsyncRead + ?Sized,
        S: PixelSink + ?Sized,
    {
        let channel_order = self
            .channel_order
            .unwrap_or_else(|| sink.channel_order());
        self.line.set_channel_order(channel_order);

        let mut current_line = 0u32;
        while current_line < self.height {
            let line_repeat = match read_byte(reader.as_mut()).await {
                Ok(Some(code)) => code as u32 + 1,
                Ok(None) => {
                    return Err(DecodeError::TruncatedStream {
                        line: current_line,
                        column: 0,
                    })
                }
                Err(source) => {
                    return Err(DecodeError::Io {
                        line: current_line,
                        source,
                    })
                }
            };

            self.read_line(reader.as_mut(), current_line).await?;

            let remaining = self.height - current_line;
            if line_repeat > remaining {
                debug!(
                    "l{:06}: line repeated {} times, only {} lines left in page",
                    current_line, line_repeat, remaining
                );
            } else {
                debug!("l{:06}: end of line, emitting {} times", current_line, line_repeat);
            }
            for _ in 0..line_repeat.min(remaining) {
                sink.accept_line(current_line, self.line.as_bytes())
                    .map_err(|source| DecodeError::Sink {
                        line: current_line,
                        source,
                    })?;
                current_line += 1;
            }
        }
        Ok(())
    }

    /// Assemble one full line into the scanline buffer.
    async fn read_line<R>(&mut self, mut reader: Pin<&mut R>, line: u32) -> Result<(), DecodeError>
    where
        R: AsyncRead + ?Sized,
    {
        self.line.reset();
        while !self.line.is_complete() {
            let column = self.line.pos() as u32;
            let code = match read_byte(reader.as_mut()).await {
                Ok(Some(code)) => code as i8,
                Ok(None) => return Err(DecodeError::TruncatedStream { line, column }),
                Err(source) => return Err(DecodeError::Io { line, source }),
            };
            match code {
                i8::MIN => {
                    let painted = self.line.fill_rest(self.fill_byte);
                    trace!("p{:06}l{:06}: blank {} pixels to end of line", column, line, painted);
                }
                0..=127 => {
                    let count = code as usize + 1;
                    self.read_pixel(reader.as_mut(), line).await?;
                    let written = 1 + self.line.repeat_last(count - 1);
                    trace!("p{:06}l{:06}: repeat pixel {} times", column, line, written);
                    if written < count {
                        debug!(
                            "p{:06}l{:06}: forced end of line, {} repeated pixels dropped",
                            column,
                            line,
                            count - written
                        );
                    }
                }
                -127..=-1 => {
                    let count = (1 - code as i32) as usize;
                    let mut written = 0;
                    while written < count && !self.line.is_complete() {
                        self.read_pixel(reader.as_mut(), line).await?;
                        written += 1;
                    }
                    trace!("p{:06}l{:06}: copy {} literal pixels", column, line, written);
                    if written < count {
                        debug!(
                            "p{:06}l{:06}: forced end of line, {} literal pixels not read",
                            column,
                            line,
                            count - written
                        );
                    }
                }
            }
        }
        Ok(())
    }

    async fn read_pixel<R>(&mut self, mut reader: Pin<&mut R>, line: u32) -> Result<(), DecodeError>
    where
        R: AsyncRead + ?Sized,
    {
        let column = self.line.pos() as u32;
        match reader.read_exact(self.line.next_pixel_mut()).await {
            Ok(()) => {
                self.line.commit_pixel();
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                Err(DecodeError::TruncatedStream { line, column })
            }
            Err(source) => Err(DecodeError::Io { line, source }),
        }
    }
}

/// Decode one page body of `width` x `height` pixels into `sink`, blank runs
/// painted with `0xff`.
pub async fn decode<R, S>(
    reader: Pin<&mut R>,
    width: u32,
    height: u32,
    pixel_format: PixelFormat,
    sink: &mut S,
) -> Result<(), DecodeError>
where
    R: AsyncRead + ?Sized,
    S: PixelSink + ?Sized,
{
    UrfRasterDecoder::new(width, height, pixel_format, Limits::NO_LIMITS)?
        .decode(reader, sink)
        .await
}

/// Read a single byte, `None` at end of stream.
async fn read_byte<R>(mut reader: Pin<&mut R>) -> io::Result<Option<u8>>
where
    R: AsyncRead + ?Sized,
{
    let mut byte = 0u8;
    loop {
        match reader.read(slice::from_mut(&mut byte)).await {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(byte)),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{decode, UrfRasterDecoder};
    use crate::decode::Limits;
    use crate::encode::UrfRasterEncoder;
    use crate::error::DecodeError;
    use crate::model::pixel::{ChannelOrder, PixelFormat};
    use crate::sink::PixelSink;
    use futures::io::Cursor;
    use std::io;
    use std::pin::Pin;

    #[derive(Default)]
    struct CollectSink {
        order: ChannelOrder,
        indices: Vec<u32>,
        data: Vec<u8>,
    }

    impl PixelSink for CollectSink {
        fn channel_order(&self) -> ChannelOrder {
            self.order
        }

        fn accept_line(&mut self, line_index: u32, line: &[u8]) -> io::Result<()> {
            self.indices.push(line_index);
            self.data.extend_from_slice(line);
            Ok(())
        }
    }

    async fn decode_bytes(
        input: &[u8],
        width: u32,
        height: u32,
        pixel_format: PixelFormat,
    ) -> (Result<(), DecodeError>, CollectSink, u64) {
        let mut reader = Cursor::new(input);
        let mut sink = CollectSink::default();
        let result = decode(Pin::new(&mut reader), width, height, pixel_format, &mut sink).await;
        (result, sink, reader.position())
    }

    async fn roundtrip(pixels: &[u8], width: u32, height: u32, pixel_format: PixelFormat) {
        let mut body = Vec::new();
        UrfRasterEncoder::new(width, pixel_format)
            .unwrap()
            .encode_page(pixels, &mut body)
            .unwrap();
        let (result, sink, position) = decode_bytes(&body, width, height, pixel_format).await;
        result.unwrap();
        assert_eq!(sink.data, pixels);
        assert_eq!(position, body.len() as u64);
    }

    #[tokio::test]
    async fn test_roundtrip_literal_lines() {
        // every pixel differs from its neighbours, on every line
        let pixels: Vec<u8> = (0..5 * 3 * 3).map(|i| (i * 7) as u8).collect();
        roundtrip(&pixels, 5, 3, PixelFormat::RGB24).await;
        let pixels: Vec<u8> = (0..5 * 2).map(|i| i as u8).collect();
        roundtrip(&pixels, 5, 2, PixelFormat::GRAY8).await;
    }

    #[tokio::test]
    async fn test_roundtrip_repeated_lines() {
        let pixels = [0x11, 0x22, 0x33, 0x44].repeat(300 * 4);
        roundtrip(&pixels, 300, 4, PixelFormat::CMYK32).await;
    }

    #[tokio::test]
    async fn test_roundtrip_mixed_lines() {
        let mut pixels = Vec::new();
        for y in 0..6u8 {
            for x in 0..200u8 {
                let value = if x < 140 || y % 2 == 0 { 0x40 } else { x ^ y };
                pixels.extend_from_slice(&[value, value.wrapping_add(1), y]);
            }
        }
        roundtrip(&pixels, 200, 6, PixelFormat::RGB24).await;
    }

    #[tokio::test]
    async fn test_decompress() {
        const UNCOMPRESSED_DATA: &[u8] = &[
            0xff, 0xff, 0xff, 0xff, 0xff, 0x00, 0xff, 0xff, 0x00, 0xff, 0xff, 0x00, 0xff, 0xff,
            0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x00, 0x00,
            0x00, 0xff, 0xff, 0xff, 0x00, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
            0x00, 0xff, 0x00, 0xff, 0xff, 0xff, 0xff, 0xff, 0x00, 0xff, 0xff, 0x00, 0xff, 0xff,
            0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x00, 0xff, 0x00, 0x00, 0xff, 0x00, 0x00,
            0xff, 0x00, 0xff, 0xff, 0x00, 0xff, 0xff, 0x00, 0xff, 0xff, 0x00, 0xff, 0xff, 0xff,
            0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x00, 0xff, 0x00, 0xff, 0xff, 0xff, 0xff, 0xff,
            0xff, 0xff, 0xff, 0x00, 0xff, 0xff, 0x00, 0xff, 0xff, 0x00, 0xff, 0xff, 0xff, 0xff,
            0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
            0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
            0xff, 0xff, 0xff, 0xff, 0xff, 0x00, 0x00, 0xff, 0x00, 0x00, 0xff, 0x00, 0x00, 0xff,
            0x00, 0x00, 0xff, 0x00, 0x00, 0xff, 0x00, 0x00, 0xff, 0x00, 0x00, 0xff, 0x00, 0x00,
            0xff, 0x00, 0x00, 0xff, 0x00, 0x00, 0xff, 0x00, 0x00, 0xff, 0x00, 0x00, 0xff, 0x00,
            0x00, 0xff, 0x00, 0x00, 0xff, 0x00, 0x00, 0xff, 0x00, 0x00,
        ];
        const COMPRESSED_DATA: &[u8] = &[
            0x00, 0x00, 0xff, 0xff, 0xff, 0x02, 0xff, 0xff, 0x00, 0x03, 0xff, 0xff, 0xff, 0x00,
            0xfe, 0xff, 0xff, 0x00, 0x00, 0x00, 0xff, 0xff, 0xff, 0x00, 0x02, 0xff, 0xff, 0xff,
            0x00, 0x00, 0xff, 0x00, 0x00, 0xff, 0xff, 0xff, 0x00, 0x01, 0xff, 0xff, 0x00, 0x02,
            0xff, 0xff, 0xff, 0x02, 0x00, 0xff, 0x00, 0x00, 0x02, 0xff, 0xff, 0x00, 0x02, 0xff,
            0xff, 0xff, 0x00, 0x00, 0xff, 0x00, 0x00, 0xff, 0xff, 0xff, 0x00, 0x00, 0xff, 0xff,
            0xff, 0x02, 0xff, 0xff, 0x00, 0x03, 0xff, 0xff, 0xff, 0x00, 0x07, 0xff, 0xff, 0xff,
            0x01, 0x07, 0xff, 0x00, 0x00,
        ];
        let (result, sink, position) =
            decode_bytes(COMPRESSED_DATA, 8, 8, PixelFormat::RGB24).await;
        result.unwrap();
        assert_eq!(sink.data, UNCOMPRESSED_DATA);
        assert_eq!(sink.indices, (0..8).collect::<Vec<_>>());
        assert_eq!(position, COMPRESSED_DATA.len() as u64);
    }

    #[tokio::test]
    async fn test_decompress_highly_repetitive_data() {
        const WIDTH: u32 = 512;
        const HEIGHT: u32 = 512;
        const COMPRESSED_DATA: &[u8] = &[
            0xff, 0x7f, 0xcc, 0xcc, 0xcc, 0x7f, 0xcc, 0xcc, 0xcc, 0x7f, 0xcc, 0xcc, 0xcc, 0x7f,
            0xcc, 0xcc, 0xcc, 0xff, 0x7f, 0xcc, 0xcc, 0xcc, 0x7f, 0xcc, 0xcc, 0xcc, 0x7f, 0xcc,
            0xcc, 0xcc, 0x7f, 0xcc, 0xcc, 0xcc,
        ];
        let (result, sink, _) =
            decode_bytes(COMPRESSED_DATA, WIDTH, HEIGHT, PixelFormat::RGB24).await;
        result.unwrap();
        assert_eq!(sink.indices.len(), HEIGHT as usize);
        assert!(sink.data.iter().all(|&b| b == 0xcc));
        assert_eq!(sink.data.len(), (WIDTH * HEIGHT * 3) as usize);
    }

    #[tokio::test]
    async fn test_repeat_run_fills_line() {
        let (result, sink, position) =
            decode_bytes(&[0x00, 0x01, 0xaa], 2, 1, PixelFormat::GRAY8).await;
        result.unwrap();
        assert_eq!(sink.data, [0xaa, 0xaa]);
        assert_eq!(sink.indices, [0]);
        assert_eq!(position, 3);
    }

    #[tokio::test]
    async fn test_literal_run_stops_reading_at_line_end() {
        // 0xfe asks for 3 literal pixels but the line only has room for 2.
        let (result, sink, position) =
            decode_bytes(&[0x00, 0xfe, 0x11, 0x22, 0x33], 2, 1, PixelFormat::GRAY8).await;
        result.unwrap();
        assert_eq!(sink.data, [0x11, 0x22]);
        assert_eq!(position, 4);
    }

    #[tokio::test]
    async fn test_repeat_run_consumes_one_pixel_when_clamped() {
        // 0x7f asks for 128 copies on a 3 pixel line, followed by the next record.
        let input = [0x00, 0x7f, 0x01, 0x02, 0x00, 0x02, 0x03, 0x04];
        let (result, sink, position) = decode_bytes(&input, 3, 2, PixelFormat::new(16).unwrap()).await;
        result.unwrap();
        assert_eq!(sink.data, [1, 2, 1, 2, 1, 2, 3, 4, 3, 4, 3, 4]);
        assert_eq!(position, input.len() as u64);
    }

    #[tokio::test]
    async fn test_blank_fills_whole_line() {
        let (result, sink, position) =
            decode_bytes(&[0x00, 0x80], 5, 1, PixelFormat::RGB24).await;
        result.unwrap();
        assert_eq!(sink.data, [0xff; 15]);
        assert_eq!(position, 2);
    }

    #[tokio::test]
    async fn test_blank_after_pixels_uses_fill_byte() {
        let input = [0x01, 0x00, 0x10, 0x20, 0x80];
        let mut reader = Cursor::new(&input[..]);
        let mut sink = CollectSink::default();
        UrfRasterDecoder::new(3, 2, PixelFormat::new(16).unwrap(), Limits::NO_LIMITS)
            .unwrap()
            .with_fill_byte(0x00)
            .decode(Pin::new(&mut reader), &mut sink)
            .await
            .unwrap();
        assert_eq!(sink.data, [0x10, 0x20, 0, 0, 0, 0, 0x10, 0x20, 0, 0, 0, 0]);
        assert_eq!(sink.indices, [0, 1]);
    }

    #[tokio::test]
    async fn test_line_repeat_is_clamped_at_page_end() {
        // 0x05 repeats the line 6 times on a 4 line page; trailing data is left unread.
        let input = [0x05, 0x00, 0x42, 0x00, 0x00, 0x43];
        let (result, sink, position) = decode_bytes(&input, 1, 4, PixelFormat::GRAY8).await;
        result.unwrap();
        assert_eq!(sink.indices, [0, 1, 2, 3]);
        assert_eq!(sink.data, [0x42; 4]);
        assert_eq!(position, 3);
    }

    #[tokio::test]
    async fn test_sink_channel_order_is_honoured() {
        let input = [0x00, 0xff, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06];
        let mut reader = Cursor::new(&input[..]);
        let mut sink = CollectSink {
            order: ChannelOrder::Reversed,
            ..Default::default()
        };
        decode(Pin::new(&mut reader), 2, 1, PixelFormat::RGB24, &mut sink)
            .await
            .unwrap();
        assert_eq!(sink.data, [0x03, 0x02, 0x01, 0x06, 0x05, 0x04]);

        let mut reader = Cursor::new(&input[..]);
        let mut sink = CollectSink {
            order: ChannelOrder::Reversed,
            ..Default::default()
        };
        UrfRasterDecoder::new(2, 1, PixelFormat::RGB24, Limits::NO_LIMITS)
            .unwrap()
            .with_channel_order(ChannelOrder::Straight)
            .decode(Pin::new(&mut reader), &mut sink)
            .await
            .unwrap();
        assert_eq!(sink.data, [0x01, 0x02, 0x03, 0x04, 0x05, 0x06]);
    }

    #[tokio::test]
    async fn test_truncated_pixel_payload() {
        // Second line record ends in the middle of a pixel.
        let input = [0x00, 0x01, 0x0a, 0x0b, 0x00, 0xff, 0x0c, 0x0d, 0x0e];
        let (result, sink, _) = decode_bytes(&input, 2, 3, PixelFormat::new(16).unwrap()).await;
        let err = result.unwrap_err();
        assert!(matches!(
            err,
            DecodeError::TruncatedStream { line: 1, column: 1 }
        ));
        assert_eq!(err.lines_completed(), 1);
        assert_eq!(sink.indices, [0]);
        assert_eq!(sink.data, [0x0a, 0x0b, 0x0a, 0x0b]);
    }

    #[tokio::test]
    async fn test_truncated_at_line_record() {
        let (result, sink, _) = decode_bytes(&[0x00, 0x80], 4, 2, PixelFormat::GRAY8).await;
        assert!(matches!(
            result,
            Err(DecodeError::TruncatedStream { line: 1, column: 0 })
        ));
        assert_eq!(sink.indices, [0]);
    }

    #[tokio::test]
    async fn test_truncated_at_control_byte() {
        let (result, sink, _) = decode_bytes(&[0x00, 0x00, 0x01], 4, 1, PixelFormat::GRAY8).await;
        assert!(matches!(
            result,
            Err(DecodeError::TruncatedStream { line: 0, column: 1 })
        ));
        assert!(sink.indices.is_empty());
    }

    #[tokio::test]
    async fn test_empty_stream() {
        let (result, sink, _) = decode_bytes(&[], 4, 1, PixelFormat::GRAY8).await;
        assert!(matches!(
            result,
            Err(DecodeError::TruncatedStream { line: 0, column: 0 })
        ));
        assert!(sink.indices.is_empty());
    }

    #[test]
    fn test_invalid_geometry_and_limits() {
        assert!(matches!(
            UrfRasterDecoder::new(0, 1, PixelFormat::RGB24, Limits::NO_LIMITS),
            Err(DecodeError::InvalidGeometry)
        ));
        assert!(matches!(
            UrfRasterDecoder::new(1, 0, PixelFormat::RGB24, Limits::NO_LIMITS),
            Err(DecodeError::InvalidGeometry)
        ));
        let limits = Limits::for_page_size(100, 100);
        assert!(UrfRasterDecoder::new(100, 100, PixelFormat::RGB24, &limits).is_ok());
        assert!(matches!(
            UrfRasterDecoder::new(101, 1, PixelFormat::RGB24, &limits),
            Err(DecodeError::LimitExceeded)
        ));
        assert!(matches!(
            UrfRasterDecoder::new(100, 101, PixelFormat::RGB24, &limits),
            Err(DecodeError::LimitExceeded)
        ));
    }

    #[test]
    fn test_page_size_limit_ignores_pixel_format() {
        let limits = Limits::for_page_size(100, 10);
        assert!(UrfRasterDecoder::new(100, 10, PixelFormat::GRAY8, &limits).is_ok());
        assert!(UrfRasterDecoder::new(100, 10, PixelFormat::CMYK32, &limits).is_ok());
        assert!(matches!(
            UrfRasterDecoder::new(400, 10, PixelFormat::GRAY8, &limits),
            Err(DecodeError::LimitExceeded)
        ));
        assert!(matches!(
            UrfRasterDecoder::new(133, 10, PixelFormat::RGB24, &limits),
            Err(DecodeError::LimitExceeded)
        ));
    }
}
