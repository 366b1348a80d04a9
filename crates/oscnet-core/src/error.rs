//! Error types for oscnet

use thiserror::Error;

/// Result type alias for oscnet operations
pub type Result<T> = std::result::Result<T, Error>;

/// oscnet error types
#[derive(Error, Debug)]
pub enum Error {
    /// Leading byte was neither '/' (message) nor '#' (bundle)
    #[error("unrecognised data: leading byte 0x{0:02x} is neither '/' nor '#'")]
    UnrecognisedData(u8),

    /// Insufficient bytes for a fixed- or declared-length field
    #[error("truncated {field}: need {needed} bytes, have {have}")]
    TruncatedField {
        field: &'static str,
        needed: usize,
        have: usize,
    },

    /// Packet started with '#' but the "#bundle" literal was missing
    #[error("malformed bundle prefix")]
    MalformedBundlePrefix,

    /// OSC string bytes were not valid UTF-8
    #[error("invalid string: {0}")]
    InvalidString(String),

    /// Encoded element length field was negative or overran the buffer
    #[error("invalid element length: {0}")]
    InvalidElementLength(i32),

    /// Packet exceeds the encodable size
    #[error("payload too large: {0} bytes")]
    PayloadTooLarge(usize),
}

impl Error {
    /// Shorthand used by the codec's bounds checks.
    pub(crate) fn truncated(field: &'static str, needed: usize, have: usize) -> Self {
        Error::TruncatedField {
            field,
            needed,
            have,
        }
    }
}
