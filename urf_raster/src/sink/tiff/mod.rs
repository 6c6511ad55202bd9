mod packbits;

use super::PixelSink;
use crate::error::UrfError;
use crate::model::pixel::{ChannelOrder, PixelFormat};
use crate::model::urf::UrfPageHeader;
use byteorder::{LittleEndian, WriteBytesExt};
use log::debug;
use std::io::{self, Write};

const HEADER_SIZE: u32 = 8;
const STRIP_SIZE: usize = 8192;

const SHORT: u16 = 3;
const LONG: u16 = 4;
const RATIONAL: u16 = 5;

const TAG_IMAGE_WIDTH: u16 = 256;
const TAG_IMAGE_LENGTH: u16 = 257;
const TAG_BITS_PER_SAMPLE: u16 = 258;
const TAG_COMPRESSION: u16 = 259;
const TAG_PHOTOMETRIC: u16 = 262;
const TAG_STRIP_OFFSETS: u16 = 273;
const TAG_ORIENTATION: u16 = 274;
const TAG_SAMPLES_PER_PIXEL: u16 = 277;
const TAG_ROWS_PER_STRIP: u16 = 278;
const TAG_STRIP_BYTE_COUNTS: u16 = 279;
const TAG_X_RESOLUTION: u16 = 282;
const TAG_Y_RESOLUTION: u16 = 283;
const TAG_PLANAR_CONFIGURATION: u16 = 284;
const TAG_RESOLUTION_UNIT: u16 = 296;
const TAG_INK_SET: u16 = 332;

const COMPRESSION_PACKBITS: u16 = 32773;
const PHOTOMETRIC_BLACK_IS_ZERO: u16 = 1;
const PHOTOMETRIC_RGB: u16 = 2;
const PHOTOMETRIC_SEPARATED: u16 = 5;
const ORIENTATION_TOP_LEFT: u16 = 1;
const PLANAR_CONTIG: u16 = 1;
const RESOLUTION_UNIT_INCH: u16 = 2;
const INK_SET_CMYK: u16 = 1;

/// Builds a single page, PackBits compressed, little-endian TIFF in memory.
///
/// Lines must arrive in order. Every line is packed on its own and lines are
/// grouped into strips of roughly 8 KiB of raw data.
#[derive(Debug)]
pub struct TiffSink {
    width: u32,
    height: u32,
    samples_per_pixel: u16,
    photometric: u16,
    dot_per_inch: u32,
    line_bytes: usize,
    rows_per_strip: u32,
    strip_data: Vec<u8>,
    strip_byte_counts: Vec<u32>,
    strip_start: usize,
    next_line: u32,
}

enum Value {
    Inline([u8; 4]),
    External(Vec<u8>),
}

struct Entry {
    tag: u16,
    field_type: u16,
    count: u32,
    value: Value,
}

impl Entry {
    fn shorts(tag: u16, values: &[u16]) -> Self {
        let mut bytes = Vec::with_capacity(values.len() * 2);
        for value in values {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
        Self::with_bytes(tag, SHORT, values.len() as u32, bytes)
    }

    fn longs(tag: u16, values: &[u32]) -> Self {
        let mut bytes = Vec::with_capacity(values.len() * 4);
        for value in values {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
        Self::with_bytes(tag, LONG, values.len() as u32, bytes)
    }

    fn rational(tag: u16, numerator: u32, denominator: u32) -> Self {
        let mut bytes = Vec::with_capacity(8);
        bytes.extend_from_slice(&numerator.to_le_bytes());
        bytes.extend_from_slice(&denominator.to_le_bytes());
        Self::with_bytes(tag, RATIONAL, 1, bytes)
    }

    fn with_bytes(tag: u16, field_type: u16, count: u32, bytes: Vec<u8>) -> Self {
        let value = if bytes.len() <= 4 {
            let mut inline = [0u8; 4];
            inline[..bytes.len()].copy_from_slice(&bytes);
            Value::Inline(inline)
        } else {
            Value::External(bytes)
        };
        Entry {
            tag,
            field_type,
            count,
            value,
        }
    }
}

fn align(offset: u64) -> u64 {
    offset.div_ceil(4) * 4
}

fn too_large() -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, "TIFF file too large")
}

impl TiffSink {
    pub fn new(
        width: u32,
        height: u32,
        pixel_format: PixelFormat,
        dot_per_inch: u32,
    ) -> Result<Self, UrfError> {
        let (samples_per_pixel, photometric) = match pixel_format.bits_per_pixel() {
            8 => (1, PHOTOMETRIC_BLACK_IS_ZERO),
            24 => (3, PHOTOMETRIC_RGB),
            32 => (4, PHOTOMETRIC_SEPARATED),
            other => return Err(UrfError::UnsupportedPixelFormat(other)),
        };
        let line_bytes = usize::try_from(width)
            .ok()
            .and_then(|width| width.checked_mul(pixel_format.pixel_bytes()))
            .ok_or(UrfError::DataTooLarge)?;
        let rows_per_strip = (STRIP_SIZE / line_bytes.max(1)).clamp(1, height.max(1) as usize);
        Ok(TiffSink {
            width,
            height,
            samples_per_pixel,
            photometric,
            dot_per_inch,
            line_bytes,
            rows_per_strip: rows_per_strip as u32,
            strip_data: Vec::new(),
            strip_byte_counts: Vec::new(),
            strip_start: 0,
            next_line: 0,
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

    pub fn rows_per_strip(&self) -> u32 {
        self.rows_per_strip
    }

    fn close_strip(&mut self) -> io::Result<()> {
        let count = self.strip_data.len() - self.strip_start;
        self.strip_byte_counts
            .push(u32::try_from(count).map_err(|_| too_large())?);
        self.strip_start = self.strip_data.len();
        Ok(())
    }

    /// Serialize the complete file. Fails unless every line has been accepted.
    pub fn finish<W: Write>(mut self, mut writer: W) -> io::Result<()> {
        if self.next_line != self.height {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "not all lines are written",
            ));
        }
        if self.strip_start != self.strip_data.len() {
            self.close_strip()?;
        }

        let mut strip_offsets = Vec::with_capacity(self.strip_byte_counts.len());
        let mut offset = HEADER_SIZE as u64;
        for count in &self.strip_byte_counts {
            strip_offsets.push(u32::try_from(offset).map_err(|_| too_large())?);
            offset += *count as u64;
        }

        let bits_per_sample = vec![8u16; self.samples_per_pixel as usize];
        let mut entries = vec![
            Entry::longs(TAG_IMAGE_WIDTH, &[self.width]),
            Entry::longs(TAG_IMAGE_LENGTH, &[self.height]),
            Entry::shorts(TAG_BITS_PER_SAMPLE, &bits_per_sample),
            Entry::shorts(TAG_COMPRESSION, &[COMPRESSION_PACKBITS]),
            Entry::shorts(TAG_PHOTOMETRIC, &[self.photometric]),
            Entry::longs(TAG_STRIP_OFFSETS, &strip_offsets),
            Entry::shorts(TAG_ORIENTATION, &[ORIENTATION_TOP_LEFT]),
            Entry::shorts(TAG_SAMPLES_PER_PIXEL, &[self.samples_per_pixel]),
            Entry::longs(TAG_ROWS_PER_STRIP, &[self.rows_per_strip]),
            Entry::longs(TAG_STRIP_BYTE_COUNTS, &self.strip_byte_counts),
            Entry::rational(TAG_X_RESOLUTION, self.dot_per_inch, 1),
            Entry::rational(TAG_Y_RESOLUTION, self.dot_per_inch, 1),
            Entry::shorts(TAG_PLANAR_CONFIGURATION, &[PLANAR_CONTIG]),
            Entry::shorts(TAG_RESOLUTION_UNIT, &[RESOLUTION_UNIT_INCH]),
        ];
        if self.photometric == PHOTOMETRIC_SEPARATED {
            entries.push(Entry::shorts(TAG_INK_SET, &[INK_SET_CMYK]));
        }

        // external values follow the strips, the IFD comes last
        let mut external_offsets = Vec::with_capacity(entries.len());
        offset = align(offset);
        for entry in &entries {
            if let Value::External(bytes) = &entry.value {
                external_offsets.push(u32::try_from(offset).map_err(|_| too_large())?);
                offset = align(offset + bytes.len() as u64);
            }
        }
        let ifd_offset = u32::try_from(offset).map_err(|_| too_large())?;
        let ifd_size = 2 + entries.len() as u64 * 12 + 4;
        u32::try_from(offset + ifd_size).map_err(|_| too_large())?;

        debug!(
            "writing {}x{} TIFF, {} strips, IFD at {}",
            self.width,
            self.height,
            self.strip_byte_counts.len(),
            ifd_offset
        );

        let mut position = HEADER_SIZE as u64;
        writer.write_all(b"II")?;
        writer.write_u16::<LittleEndian>(42)?;
        writer.write_u32::<LittleEndian>(ifd_offset)?;
        writer.write_all(&self.strip_data)?;
        position += self.strip_data.len() as u64;

        for entry in &entries {
            if let Value::External(bytes) = &entry.value {
                let padding = align(position) - position;
                writer.write_all(&[0u8; 4][..padding as usize])?;
                writer.write_all(bytes)?;
                position = align(position) + bytes.len() as u64;
            }
        }
        let padding = align(position) - position;
        writer.write_all(&[0u8; 4][..padding as usize])?;

        writer.write_u16::<LittleEndian>(entries.len() as u16)?;
        let mut external_offsets = external_offsets.into_iter();
        for entry in &entries {
            writer.write_u16::<LittleEndian>(entry.tag)?;
            writer.write_u16::<LittleEndian>(entry.field_type)?;
            writer.write_u32::<LittleEndian>(entry.count)?;
            match &entry.value {
                Value::Inline(bytes) => writer.write_all(bytes)?,
                Value::External(_) => {
                    let offset = external_offsets.next().ok_or_else(too_large)?;
                    writer.write_u32::<LittleEndian>(offset)?;
                }
            }
        }
        writer.write_u32::<LittleEndian>(0)?;
        writer.flush()
    }
}

impl PixelSink for TiffSink {
    fn channel_order(&self) -> ChannelOrder {
        ChannelOrder::Straight
    }

    fn accept_line(&mut self, line_index: u32, line: &[u8]) -> io::Result<()> {
        if line_index != self.next_line
            || line_index >= self.height
            || line.len() != self.line_bytes
        {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "line does not fit the image",
            ));
        }
        packbits::compress(line, &mut self.strip_data);
        self.next_line += 1;
        if self.next_line % self.rows_per_strip == 0 {
            self.close_strip()?;
        }
        Ok(())
    }
}
