use super::{BmpSink, PixelSink, TiffSink};
use crate::error::UrfError;
use crate::model::pixel::ChannelOrder;
use crate::model::urf::UrfPageHeader;
use derive_more::From;
use std::io::{self, Write};

/// File format produced for each page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Bmp,
    Tiff,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Bmp => "bmp",
            OutputFormat::Tiff => "tiff",
        }
    }

    /// File name of page `page_index`, counted from zero.
    pub fn file_name(&self, page_index: u32) -> String {
        format!("page{:04}.{}", page_index, self.extension())
    }
}

#[derive(Debug, From)]
pub enum OutputSink {
    Bmp(BmpSink),
    Tiff(TiffSink),
}

impl OutputSink {
    pub fn for_page(format: OutputFormat, header: &UrfPageHeader) -> Result<Self, UrfError> {
        Ok(match format {
            OutputFormat::Bmp => BmpSink::for_page(header)?.into(),
            OutputFormat::Tiff => TiffSink::for_page(header)?.into(),
        })
    }

    pub fn format(&self) -> OutputFormat {
        match self {
            OutputSink::Bmp(_) => OutputFormat::Bmp,
            OutputSink::Tiff(_) => OutputFormat::Tiff,
        }
    }

    pub fn finish<W: Write>(self, writer: W) -> Result<(), UrfError> {
        match self {
            OutputSink::Bmp(sink) => sink.finish(writer),
            OutputSink::Tiff(sink) => Ok(sink.finish(writer)?),
        }
    }
}

impl PixelSink for OutputSink {
    fn channel_order(&self) -> ChannelOrder {
        match self {
            OutputSink::Bmp(sink) => sink.channel_order(),
            OutputSink::Tiff(sink) => sink.channel_order(),
        }
    }

    fn accept_line(&mut self, line_index: u32, line: &[u8]) -> io::Result<()> {
        match self {
            OutputSink::Bmp(sink) => sink.accept_line(line_index, line),
            OutputSink::Tiff(sink) => sink.accept_line(line_index, line),
        }
    }
}
