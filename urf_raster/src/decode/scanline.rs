use crate::error::DecodeError;
use crate::model::pixel::ChannelOrder;

/// The single reusable line buffer of a page decode.
///
/// Pixels are written left to right; `pos` counts the pixels written so far and
/// never exceeds `width`. Once `pos == width` the line is complete.
#[derive(Debug)]
pub struct Scanline {
    buffer: Vec<u8>,
    pixel_bytes: usize,
    width: usize,
    pos: usize,
    channel_order: ChannelOrder,
}

impl Scanline {
    pub fn new(width: usize, pixel_bytes: usize) -> Result<Self, DecodeError> {
        let len = width
            .checked_mul(pixel_bytes)
            .ok_or(DecodeError::LimitExceeded)?;
        let mut buffer = Vec::new();
        buffer
            .try_reserve_exact(len)
            .map_err(|_| DecodeError::LimitExceeded)?;
        buffer.resize(len, 0);
        Ok(Scanline {
            buffer,
            pixel_bytes,
            width,
            pos: 0,
            channel_order: ChannelOrder::Straight,
        })
    }

    pub fn set_channel_order(&mut self, channel_order: ChannelOrder) {
        self.channel_order = channel_order;
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn is_complete(&self) -> bool {
        self.pos >= self.width
    }

    /// Start a new line. The previous content is kept until overwritten.
    pub fn reset(&mut self) {
        self.pos = 0;
    }

    /// Slot for the pixel at the cursor, to be filled with raw stream bytes and
    /// then committed with [`Scanline::commit_pixel`].
    pub fn next_pixel_mut(&mut self) -> &mut [u8] {
        debug_assert!(!self.is_complete());
        let start = self.pos * self.pixel_bytes;
        &mut self.buffer[start..start + self.pixel_bytes]
    }

    /// Apply the channel order to the slot at the cursor and advance past it.
    pub fn commit_pixel(&mut self) {
        if self.channel_order == ChannelOrder::Reversed {
            self.next_pixel_mut().reverse();
        }
        self.pos += 1;
    }

    /// Copy the last committed pixel up to `count` more times, stopping at the end
    /// of the line. Returns the number of copies written.
    pub fn repeat_last(&mut self, count: usize) -> usize {
        debug_assert!(self.pos > 0);
        let count = count.min(self.width - self.pos);
        if count == 0 {
            return 0;
        }
        let start = self.pos * self.pixel_bytes;
        let (filled, rest) = self.buffer.split_at_mut(start);
        let last_pixel = &filled[start - self.pixel_bytes..];
        for chunk in rest[..count * self.pixel_bytes].chunks_exact_mut(self.pixel_bytes) {
            chunk.copy_from_slice(last_pixel);
        }
        self.pos += count;
        count
    }

    /// Paint the rest of the line with `byte` and complete it. Returns the number
    /// of pixels painted.
    pub fn fill_rest(&mut self, byte: u8) -> usize {
        let painted = self.width - self.pos;
        self.buffer[self.pos * self.pixel_bytes..].fill(byte);
        self.pos = self.width;
        painted
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push(line: &mut Scanline, pixel: &[u8]) {
        line.next_pixel_mut().copy_from_slice(pixel);
        line.commit_pixel();
    }

    #[test]
    fn test_repeat_is_clamped_at_width() {
        let mut line = Scanline::new(4, 2).unwrap();
        push(&mut line, &[1, 2]);
        assert_eq!(line.repeat_last(10), 3);
        assert!(line.is_complete());
        assert_eq!(line.as_bytes(), &[1, 2, 1, 2, 1, 2, 1, 2]);
    }

    #[test]
    fn test_fill_rest() {
        let mut line = Scanline::new(3, 1).unwrap();
        push(&mut line, &[7]);
        assert_eq!(line.fill_rest(0xff), 2);
        assert_eq!(line.as_bytes(), &[7, 0xff, 0xff]);
        assert!(line.is_complete());
    }

    #[test]
    fn test_reversed_channel_order() {
        let mut line = Scanline::new(2, 3).unwrap();
        line.set_channel_order(ChannelOrder::Reversed);
        push(&mut line, &[0x11, 0x22, 0x33]);
        assert_eq!(line.repeat_last(1), 1);
        assert_eq!(line.as_bytes(), &[0x33, 0x22, 0x11, 0x33, 0x22, 0x11]);
    }

    #[test]
    fn test_reset_keeps_content() {
        let mut line = Scanline::new(2, 1).unwrap();
        push(&mut line, &[5]);
        push(&mut line, &[6]);
        line.reset();
        assert_eq!(line.pos(), 0);
        assert!(!line.is_complete());
        push(&mut line, &[9]);
        assert_eq!(line.as_bytes(), &[9, 6]);
    }
}
