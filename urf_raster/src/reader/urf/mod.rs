use super::common::ReadHeaderFuture;
use crate::decode::{Limits, UrfRasterDecoder};
use crate::error::UrfError;
use crate::model::urf::{UrfHeader, UrfPageHeader, URF_HEADER_SIZE, URF_PAGE_HEADER_SIZE};
use crate::sink::{DiscardSink, PixelSink};
use futures::{AsyncRead, AsyncReadExt};
use log::{info, warn};
use std::io;
use std::ops::DerefMut;
use std::pin::Pin;

/// Reader of a URF (UNIRAST) file.
///
/// The file header is read on construction. When it announces a page count,
/// reading stops after that many pages; a count of zero reads to end of stream. Pages are then visited one at a
/// time with [`UrfReader::next_page`] and [`UrfPageReader::next_page`], each
/// call consuming the previous reader since the stream is not seekable.
pub struct UrfReader<R> {
    reader: Pin<R>,
    header: UrfHeader,
    limits: Limits,
}

impl<R> UrfReader<R>
where
    R: DerefMut<Target: AsyncRead>,
{
    pub async fn new(reader: Pin<R>) -> Result<Self, UrfError> {
        Self::new_with_limits(reader, Limits::default()).await
    }

    pub async fn new_with_limits(mut reader: Pin<R>, limits: Limits) -> Result<Self, UrfError> {
        let bytes = ReadHeaderFuture::<_, URF_HEADER_SIZE>::new(reader.as_mut())
            .await?
            .ok_or_else(|| io::Error::from(io::ErrorKind::UnexpectedEof))?;
        let header = UrfHeader::from_bytes(&bytes)?;
        info!("UNIRAST file, with {} page(s)", header.page_count);
        Ok(UrfReader {
            reader,
            header,
            limits,
        })
    }

    pub fn header(&self) -> &UrfHeader {
        &self.header
    }

    /// Read the header of the first page, `None` if the file has no pages.
    pub async fn next_page(self) -> Result<Option<UrfPageReader<R>>, UrfError> {
        UrfPageReader::read(self.reader, self.limits, self.header.page_count, 0).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PageState {
    Pending,
    Decoded,
    Failed,
}

/// One page of a URF file, positioned at the start of its raster body.
pub struct UrfPageReader<R> {
    reader: Pin<R>,
    header: UrfPageHeader,
    index: u32,
    page_count: u32,
    limits: Limits,
    state: PageState,
}

impl<R> UrfPageReader<R>
where
    R: DerefMut<Target: AsyncRead>,
{
    async fn read(
        mut reader: Pin<R>,
        limits: Limits,
        page_count: u32,
        index: u32,
    ) -> Result<Option<Self>, UrfError> {
        if page_count != 0 && index >= page_count {
            let mut byte = [0u8; 1];
            if reader.as_mut().read(&mut byte).await? != 0 {
                warn!(
                    "ignoring data after the {} page(s) announced by the file header",
                    page_count
                );
            }
            return Ok(None);
        }
        let bytes = match ReadHeaderFuture::<_, URF_PAGE_HEADER_SIZE>::new(reader.as_mut()).await? {
            Some(bytes) => bytes,
            None => {
                if page_count != 0 {
                    warn!(
                        "file header announces {} page(s), found {}",
                        page_count, index
                    );
                }
                return Ok(None);
            }
        };
        let header = UrfPageHeader::from_bytes(&bytes)?;
        for (field, value) in header.unknown_fields() {
            warn!("page {}: unknown {} value {}", index, field, value);
        }
        if header.bits_per_pixel as usize != header.color_space.num_colors() * 8 {
            warn!(
                "page {}: {} bpp does not match colour space {:?}",
                index, header.bits_per_pixel, header.color_space
            );
        }
        info!(
            "page {}: {}x{} pixels, {} bpp, {:?}, {} dpi, duplex {:?}, quality {:?}",
            index,
            header.width,
            header.height,
            header.bits_per_pixel,
            header.color_space,
            header.dot_per_inch,
            header.duplex,
            header.quality
        );
        Ok(Some(UrfPageReader {
            reader,
            header,
            index,
            page_count,
            limits,
            state: PageState::Pending,
        }))
    }

    pub fn header(&self) -> &UrfPageHeader {
        &self.header
    }

    /// Position of the page in the file, counted from zero.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Decode the raster body of the page into `sink`.
    ///
    /// The body can only be decoded once. If decoding fails the stream position
    /// is lost, and no further page can be read.
    pub async fn decode_into<S>(&mut self, mut sink: S) -> Result<(), UrfError>
    where
        S: PixelSink,
    {
        if self.state != PageState::Pending {
            return Err(io::Error::new(io::ErrorKind::Other, "content is already consumed").into());
        }
        self.state = PageState::Failed;
        let mut decoder = UrfRasterDecoder::for_page(&self.header, &self.limits)?;
        decoder.decode(self.reader.as_mut(), &mut sink).await?;
        self.state = PageState::Decoded;
        Ok(())
    }

    /// Move to the next page. A page that was not decoded is skipped.
    pub async fn next_page(mut self) -> Result<Option<Self>, UrfError> {
        match self.state {
            PageState::Pending => self.decode_into(DiscardSink).await?,
            PageState::Decoded => {}
            PageState::Failed => return Ok(None),
        }
        Self::read(self.reader, self.limits, self.page_count, self.index + 1).await
    }
}
