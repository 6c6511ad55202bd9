use std::io;
use thiserror::Error;

/// Failure while decoding the raster body of one page.
///
/// Lines delivered to the sink before the failure stay delivered; use
/// [`DecodeError::lines_completed`] to find out how many there were.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Truncated stream at line {line}, column {column}")]
    TruncatedStream { line: u32, column: u32 },
    #[error("IO error at line {line}")]
    Io {
        line: u32,
        #[source]
        source: io::Error,
    },
    #[error("Sink rejected line {line}")]
    Sink {
        line: u32,
        #[source]
        source: io::Error,
    },
    #[error("Unsupported pixel format: {0} bits per pixel")]
    UnsupportedPixelFormat(u8),
    #[error("Invalid page geometry")]
    InvalidGeometry,
    #[error("Page exceeds decode limits")]
    LimitExceeded,
}

impl DecodeError {
    /// Number of lines the sink received before decoding stopped.
    pub fn lines_completed(&self) -> u32 {
        match self {
            DecodeError::TruncatedStream { line, .. }
            | DecodeError::Io { line, .. }
            | DecodeError::Sink { line, .. } => *line,
            DecodeError::UnsupportedPixelFormat(_)
            | DecodeError::InvalidGeometry
            | DecodeError::LimitExceeded => 0,
        }
    }

    pub fn is_truncated(&self) -> bool {
        matches!(self, DecodeError::TruncatedStream { .. })
    }
}
