use crate::error::DecodeError;

#[derive(Clone, Debug)]
pub struct Limits {
    // The maximum number of bytes to decode per line, using for creating line buffer.
    pub bytes_per_line: u64,
    // The maximum number of bytes to decode per page.
    pub bytes_per_page: u64,
    // The maximum page width in pixels.
    pub max_width: u32,
    // The maximum page height in pixels.
    pub max_height: u32,
}

impl Limits {
    pub const NO_LIMITS: &Self = &Self {
        bytes_per_line: u64::MAX,
        bytes_per_page: u64::MAX,
        max_width: u32::MAX,
        max_height: u32::MAX,
    };

    /// Limits for pages of at most `max_width` x `max_height` pixels, whatever
    /// their pixel format.
    pub fn for_page_size(max_width: u32, max_height: u32) -> Self {
        Self {
            max_width,
            max_height,
            ..Self::NO_LIMITS.clone()
        }
    }

    pub(crate) fn check(
        &self,
        width: u32,
        height: u32,
        bytes_per_line: u64,
        num_bytes: u64,
    ) -> Result<(), DecodeError> {
        if width > self.max_width
            || height > self.max_height
            || bytes_per_line > self.bytes_per_line
            || num_bytes > self.bytes_per_page
        {
            return Err(DecodeError::LimitExceeded);
        }
        Ok(())
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self::NO_LIMITS.clone()
    }
}
