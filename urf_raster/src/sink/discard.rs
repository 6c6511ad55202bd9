use super::PixelSink;
use std::io;

/// A sink that drops every line, used to skip over the body of a page.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardSink;

impl PixelSink for DiscardSink {
    fn accept_line(&mut self, _line_index: u32, _line: &[u8]) -> io::Result<()> {
        Ok(())
    }
}
