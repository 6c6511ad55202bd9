use crate::model::pixel::PixelFormat;
use log::trace;
use std::io;

const MAX_RUN: usize = 0x7f;
const MAX_LINE_REPEAT: usize = 256;
const BLANK_CODE: u8 = 0x80;

/// Encoder producing the run-length compressed raster body of a URF page.
///
/// Identical consecutive lines are grouped into one record. Within a line,
/// runs of identical pixels are written as repeat runs of at most 128 pixels
/// and everything else as literal runs of at most 127 pixels.
#[derive(Debug, Clone)]
pub struct UrfRasterEncoder {
    pixel_bytes: usize,
    bytes_per_line: usize,
    blank_fill: Option<u8>,
}

impl UrfRasterEncoder {
    pub fn new(width: u32, pixel_format: PixelFormat) -> io::Result<Self> {
        let pixel_bytes = pixel_format.pixel_bytes();
        let bytes_per_line = usize::try_from(width)
            .ok()
            .and_then(|width| width.checked_mul(pixel_bytes))
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "line is too large"))?;
        Ok(UrfRasterEncoder {
            pixel_bytes,
            bytes_per_line,
            blank_fill: None,
        })
    }

    /// Emit the end-of-line blank code when the rest of a line holds only
    /// `fill_byte`.
    pub fn with_blank_fill(mut self, fill_byte: u8) -> Self {
        self.blank_fill = Some(fill_byte);
        self
    }

    pub fn bytes_per_line(&self) -> usize {
        self.bytes_per_line
    }

    /// Compress a whole page of `pixels`, given top to bottom, into `out`.
    pub fn encode_page(&self, pixels: &[u8], out: &mut Vec<u8>) -> io::Result<()> {
        if self.bytes_per_line == 0 {
            return Ok(());
        }
        if pixels.len() % self.bytes_per_line != 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "page size must be a multiple of the line size",
            ));
        }
        let mut lines = pixels.chunks_exact(self.bytes_per_line).peekable();
        while let Some(line) = lines.next() {
            let mut repeat = 1;
            while repeat < MAX_LINE_REPEAT && lines.next_if_eq(&line).is_some() {
                repeat += 1;
            }
            self.encode_line(line, repeat, out);
        }
        Ok(())
    }

    /// Write one line record: the line is emitted `repeat` times (1 to 256).
    pub fn encode_line(&self, line: &[u8], repeat: usize, out: &mut Vec<u8>) {
        debug_assert!((1..=MAX_LINE_REPEAT).contains(&repeat));
        out.push((repeat - 1) as u8);

        let mut start = 0;
        while start < line.len() {
            if let Some(fill_byte) = self.blank_fill {
                if line[start..].iter().all(|&b| b == fill_byte) {
                    trace!("blank from byte {}", start);
                    out.push(BLANK_CODE);
                    return;
                }
            }
            let mut chunks = line[start..].chunks(self.pixel_bytes);
            let first = match chunks.next() {
                Some(chunk) => chunk,
                None => return,
            };
            let (tag, data) = match chunks.next() {
                Some(second) if second == first => {
                    let mut tag = 1;
                    for chunk in chunks {
                        if chunk != first || tag >= MAX_RUN {
                            break;
                        }
                        tag += 1;
                    }
                    start += self.pixel_bytes * (tag + 1);
                    (tag as u8, first)
                }
                Some(second) => {
                    let mut count = 1;
                    let mut prev = second;
                    for chunk in chunks {
                        if chunk == prev {
                            break;
                        }
                        count += 1;
                        prev = chunk;
                        if count >= MAX_RUN {
                            break;
                        }
                    }
                    let end = start + self.pixel_bytes * count;
                    let data = &line[start..end];
                    start = end;
                    ((!(count as u8)).wrapping_add(2), data)
                }
                None => {
                    start += self.pixel_bytes;
                    (0, first)
                }
            };
            out.push(tag);
            out.extend_from_slice(data);
        }
    }
}
