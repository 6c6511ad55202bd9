use crate::model::pixel::ChannelOrder;
use std::io;

/// Receives decoded scanlines, one call per line, top to bottom.
///
/// `line` is only valid for the duration of the call: the decoder reuses the
/// buffer for the next line.
pub trait PixelSink {
    /// Order in which the channel bytes of each pixel are placed in `line`.
    fn channel_order(&self) -> ChannelOrder {
        ChannelOrder::Straight
    }

    /// Accept line `line_index`. Called exactly `height` times per page with
    /// strictly increasing indices.
    fn accept_line(&mut self, line_index: u32, line: &[u8]) -> io::Result<()>;
}

impl<S> PixelSink for &mut S
where
    S: PixelSink + ?Sized,
{
    fn channel_order(&self) -> ChannelOrder {
        (**self).channel_order()
    }

    fn accept_line(&mut self, line_index: u32, line: &[u8]) -> io::Result<()> {
        (**self).accept_line(line_index, line)
    }
}
