//! # Steganographic Codec
//!
//! Hides an arbitrary payload inside a carrier media file and recovers it
//! exactly. Two strategies exist:
//!
//! - [`lsb`]: pixel LSB embedding for `png`, `jpg`, `jpeg` and `bmp`
//! - [`tail`]: a marked record appended to any other media
//!
//! The carrier's declared extension picks the strategy ([`CodecKind::select`]).
//! After decoding, [`sniff`] guesses an extension for the recovered bytes.
//!
//! Every function here is synchronous and pure over its input buffers: no
//! globals, no file handles, nothing shared between calls.
//!
//! ## Example
//! ```ignore
//! let carrier = std::fs::read("cover.png")?;
//! let capacity = codec::estimate_capacity(&carrier, "png");
//! let stego = codec::encode(&carrier, b"meet at noon", "png")?;
//! let decoded = codec::decode(&stego, "png")?;
//! assert_eq!(decoded.payload, b"meet at noon");
//! assert_eq!(decoded.extension, ".txt");
//! ```

pub mod capacity;
pub mod error;
pub mod lsb;
pub mod media;
pub mod sniff;
pub mod tail;

use log::{debug, error};

pub use error::{Result, StegoError};
pub use lsb::{EmbeddedHeader, LsbCodec};
pub use media::{is_accepted_media, Codec, CodecKind, MediaClass, ACCEPTED_EXTENSIONS};
pub use sniff::sniff;
pub use tail::TailCodec;

/// A recovered payload and the extension sniffed from its content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub payload: Vec<u8>,
    /// Extension with its leading dot, e.g. `".wav"`.
    pub extension: &'static str,
}

/// Maximum payload size for a carrier with the given extension.
///
/// Returns 0 when the carrier cannot be decoded as declared; callers treat 0
/// as "cannot hold anything" and reject the operation.
pub fn estimate_capacity(carrier: &[u8], ext: &str) -> u64 {
    let class = MediaClass::from_extension(ext);
    match capacity::estimate(carrier, class) {
        Ok(bytes) => bytes,
        Err(e) => {
            error!("Capacity estimation failed for .{} carrier: {}", ext, e);
            0
        }
    }
}

/// Largest payload `encode` accepts for a carrier of the given estimated
/// `capacity`. The LSB header is paid for out of the raster figure.
pub fn payload_limit(capacity: u64, ext: &str) -> u64 {
    match CodecKind::select(ext) {
        CodecKind::Lsb => capacity.saturating_sub(lsb::HEADER_LEN as u64),
        CodecKind::TailAppend => capacity,
    }
}

/// Embed `payload` into `carrier` using the codec for `ext`.
pub fn encode(carrier: &[u8], payload: &[u8], ext: &str) -> Result<Vec<u8>> {
    let kind = CodecKind::select(ext);
    debug!(
        "Encoding {} bytes into {} byte .{} carrier with {:?}",
        payload.len(),
        carrier.len(),
        ext,
        kind
    );
    kind.encode(carrier, payload)
}

/// Recover the payload from `carrier` and sniff its type.
pub fn decode(carrier: &[u8], ext: &str) -> Result<Decoded> {
    let kind = CodecKind::select(ext);
    let payload = kind.decode(carrier)?;
    let extension = sniff(&payload);
    debug!(
        "Decoded {} bytes from .{} carrier with {:?}, looks like {}",
        payload.len(),
        ext,
        kind,
        extension
    );
    Ok(Decoded { payload, extension })
}
