use futures::io::Cursor;
use futures::AsyncRead;
use std::io;
use std::ops::DerefMut;
use std::pin::Pin;
use urf_raster::decode::Limits;
use urf_raster::reader::UrfReader;
use urf_raster::sink::PixelSink;
use urf_raster::writer::UrfWriter;

/// Collects every decoded line of a page, top to bottom.
#[derive(Debug, Default)]
pub struct PageBuffer {
    pub pixels: Vec<u8>,
}

impl PixelSink for PageBuffer {
    fn accept_line(&mut self, _line_index: u32, line: &[u8]) -> io::Result<()> {
        self.pixels.extend_from_slice(line);
        Ok(())
    }
}

/// Decode every page of `reader`, encode the pixels again and check that the
/// re-encoded file decodes to the same pixels.
pub async fn roundtrip_urf<R>(reader: UrfReader<R>) -> Result<(), Box<dyn std::error::Error>>
where
    R: DerefMut<Target: AsyncRead>,
{
    // Errors while reading the input are returned, the input is not guaranteed
    // to be valid. Anything read successfully must survive the round trip, so
    // failures past that point panic.
    let mut pages = Vec::new();
    let mut output = Vec::<u8>::new();
    let mut writer = UrfWriter::new(Pin::new(&mut output), reader.header())
        .await
        .unwrap();

    let mut next = reader.next_page().await?;
    while let Some(mut page) = next {
        if page.index() >= 300 {
            return Err("page_count > 300".into());
        }
        let mut buffer = PageBuffer::default();
        page.decode_into(&mut buffer).await?;
        writer
            .write_page(page.header(), &buffer.pixels)
            .await
            .unwrap();
        pages.push((page.header().clone(), buffer.pixels));
        next = page.next_page().await?;
    }
    writer.finish().await.unwrap();

    let mut output = Cursor::new(output);
    let reader = UrfReader::new_with_limits(Pin::new(&mut output), Limits::default())
        .await
        .unwrap();
    let mut next = reader.next_page().await.unwrap();
    for (header, pixels) in pages {
        let mut page = next.unwrap();
        assert_eq!(page.header(), &header);
        let mut buffer = PageBuffer::default();
        page.decode_into(&mut buffer).await.unwrap();
        assert_eq!(buffer.pixels, pixels);
        next = page.next_page().await.unwrap();
    }
    assert!(next.is_none());
    Ok(())
}
