//! Conversion of every page of a URF stream into one image file per page.

use crate::decode::Limits;
use crate::error::UrfError;
use crate::reader::UrfReader;
use crate::sink::OutputSink;
use futures::AsyncRead;
use log::{info, warn};
use std::fs::File;
use std::io::BufWriter;
use std::ops::DerefMut;
use std::path::PathBuf;
use std::pin::Pin;

pub use crate::sink::OutputFormat;

#[derive(Debug, Clone)]
pub struct ConvertOptions {
    pub format: OutputFormat,
    /// Directory receiving the `pageNNNN.<ext>` files.
    pub output_dir: PathBuf,
    pub limits: Limits,
}

impl ConvertOptions {
    pub fn new(format: OutputFormat) -> Self {
        ConvertOptions {
            format,
            output_dir: PathBuf::from("."),
            limits: Limits::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConvertSummary {
    pub pages_written: u32,
    /// The stream ended inside a page after at least one complete page. That
    /// page was dropped.
    pub truncated: bool,
}

/// Decode every page of `reader` and write it to `options.output_dir`.
///
/// The sink of a page is built before its body is decoded, so a page in a
/// pixel format the output cannot hold fails without creating a file. A page
/// cut short by the end of the stream ends the conversion without error when
/// an earlier page was complete.
pub async fn convert<R>(reader: Pin<R>, options: &ConvertOptions) -> Result<ConvertSummary, UrfError>
where
    R: DerefMut<Target: AsyncRead>,
{
    let reader = UrfReader::new_with_limits(reader, options.limits.clone()).await?;
    let mut summary = ConvertSummary::default();
    let mut next = reader.next_page().await?;
    while let Some(mut page) = next {
        let mut sink = OutputSink::for_page(options.format, page.header())?;
        match page.decode_into(&mut sink).await {
            Ok(()) => {}
            Err(e) if e.is_truncated() && summary.pages_written > 0 => {
                warn!(
                    "page {}: {}, treated as end of file",
                    page.index(),
                    e
                );
                summary.truncated = true;
                break;
            }
            Err(e) => return Err(e),
        }

        let path = options.output_dir.join(sink.format().file_name(page.index()));
        sink.finish(BufWriter::new(File::create(&path)?))?;
        info!("wrote {}", path.display());
        summary.pages_written += 1;
        next = page.next_page().await?;
    }
    Ok(summary)
}
