//! # Codec Errors
//!
//! Every failure the codec can report. All of them are deterministic functions of
//! the input buffers, so callers never retry: they supply another carrier or a
//! smaller payload instead.

use thiserror::Error;

/// Result type alias for codec operations.
pub type Result<T> = std::result::Result<T, StegoError>;

/// Errors raised while estimating, embedding or extracting a payload.
///
/// Messages carry sizes and header values only. Extracted bytes are never part
/// of an error, even when the checksum fails.
#[derive(Error, Debug)]
pub enum StegoError {
    /// The carrier could not be decoded as the media it was declared to be.
    #[error("invalid carrier format: {0}")]
    InvalidCarrierFormat(String),

    /// Header plus payload do not fit into the carrier's low bits.
    #[error("insufficient capacity: need {required_bits} bits, carrier has {available_bits} bits")]
    InsufficientCapacity {
        required_bits: u64,
        available_bits: u64,
    },

    /// Fewer than 64 low bits are available, so no header can be read.
    #[error("incomplete header: only {available_bits} bits available, 64 required")]
    IncompleteHeader { available_bits: u64 },

    /// The embedded length is zero or larger than the carrier could hold.
    #[error("invalid data length: {declared} bytes (max capacity: {max_capacity} bytes)")]
    InvalidDataLength { declared: u64, max_capacity: u64 },

    /// The recovered payload does not add up to the embedded checksum.
    #[error("checksum mismatch: expected {expected}, actual {actual}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    /// No tail record marker exists in the carrier.
    #[error("no hidden data found: marker not present")]
    MarkerNotFound,

    /// The tail record's length runs past the end of the carrier.
    #[error("corrupt length: record declares {declared} bytes, only {available} present")]
    CorruptLength { declared: u64, available: u64 },

    /// The tail record ends inside its 4-byte length field.
    #[error("corrupt length: length field cut off, {available} of 4 bytes present")]
    TruncatedLengthField { available: u64 },

    /// Reading or writing a carrier failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StegoError {
    /// Whether the error was caused by the caller's input rather than the host.
    pub fn is_input_error(&self) -> bool {
        !matches!(self, StegoError::Io(_))
    }
}
