use thiserror::Error;

/// Errors surfaced while reading a trace.
///
/// Truncated frames are not errors: the reader simply stops at the last complete frame.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The payload of a frame could not be decoded as an event.
    #[error("malformed event payload at frame #{frame}: {reason}")]
    Malformed { frame: u64, reason: String },
}

impl DecodeError {
    pub fn is_malformed(&self) -> bool {
        matches!(self, DecodeError::Malformed { .. })
    }
}

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("event payload of {0} bytes does not fit in a frame")]
    PayloadTooLarge(usize),
}
