use crate::encode::UrfRasterEncoder;
use crate::error::UrfError;
use crate::model::urf::{UrfHeader, UrfPageHeader};
use futures::{AsyncWrite, AsyncWriteExt};
use log::{debug, warn};
use std::io;
use std::ops::DerefMut;
use std::pin::Pin;

/// Writer of a URF (UNIRAST) file, page by page.
pub struct UrfWriter<W> {
    writer: Pin<W>,
    page_count: u32,
    pages_written: u32,
    blank_fill: bool,
    buffer: Vec<u8>,
}

impl<W> UrfWriter<W>
where
    W: DerefMut<Target: AsyncWrite>,
{
    pub async fn new(mut writer: Pin<W>, header: &UrfHeader) -> Result<Self, UrfError> {
        writer.as_mut().write_all(&header.to_bytes()).await?;
        Ok(UrfWriter {
            writer,
            page_count: header.page_count,
            pages_written: 0,
            blank_fill: false,
            buffer: Vec::new(),
        })
    }

    /// Compress blank line ends with the end-of-line code, using the blank
    /// value of each page's colour space.
    pub fn with_blank_fill(mut self) -> Self {
        self.blank_fill = true;
        self
    }

    /// Write a page header followed by the compressed `pixels`, given top to
    /// bottom with no padding.
    pub async fn write_page(
        &mut self,
        header: &UrfPageHeader,
        pixels: &[u8],
    ) -> Result<(), UrfError> {
        let num_bytes = header.num_bytes().ok_or(UrfError::DataTooLarge)?;
        if pixels.len() as u64 != num_bytes {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "pixel data does not match the page size",
            )
            .into());
        }
        let mut encoder = UrfRasterEncoder::new(header.width, header.pixel_format()?)?;
        if self.blank_fill {
            encoder = encoder.with_blank_fill(header.fill_byte());
        }
        self.buffer.clear();
        self.buffer.extend_from_slice(&header.to_bytes());
        encoder.encode_page(pixels, &mut self.buffer)?;
        debug!(
            "page {}: {} bytes of pixels compressed to {}",
            self.pages_written,
            pixels.len(),
            self.buffer.len() - header.to_bytes().len()
        );
        self.writer.as_mut().write_all(&self.buffer).await?;
        self.pages_written += 1;
        Ok(())
    }

    /// Flush and give back the underlying writer.
    pub async fn finish(mut self) -> Result<Pin<W>, UrfError> {
        if self.pages_written != self.page_count {
            warn!(
                "file header announces {} page(s), wrote {}",
                self.page_count, self.pages_written
            );
        }
        self.writer.as_mut().flush().await?;
        Ok(self.writer)
    }
}
