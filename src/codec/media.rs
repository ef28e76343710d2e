//! # Media Classification and Codec Selection
//!
//! Static lookup tables keyed by the carrier's *declared* extension. Nothing here
//! looks at file content: a `.jpg` that actually holds PNG bytes is still routed
//! to the LSB codec, and a `.tiff` is accepted as media but tail-appended.

use std::path::Path;

use super::error::Result;
use super::lsb::LsbCodec;
use super::tail::TailCodec;

/// Every extension accepted as a carrier.
pub const ACCEPTED_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "bmp", "tiff", "mp3", "wav", "flac", "m4a", "mp4", "avi", "mov", "mkv",
];

/// Extensions whose carriers are decoded to pixels and LSB-embedded.
pub const LSB_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp"];

const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "flac", "m4a"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "mkv"];

/// Coarse class of a carrier, used for capacity estimation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaClass {
    RasterImage,
    Audio,
    Video,
    Other,
}

impl MediaClass {
    /// Classify a bare extension (`"png"`, `".PNG"` and `"png"` are equivalent).
    pub fn from_extension(ext: &str) -> Self {
        let ext = normalize_extension(ext);
        if LSB_EXTENSIONS.contains(&ext.as_str()) {
            MediaClass::RasterImage
        } else if AUDIO_EXTENSIONS.contains(&ext.as_str()) {
            MediaClass::Audio
        } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            MediaClass::Video
        } else {
            MediaClass::Other
        }
    }

    /// Bytes reserved off the file size for tail-appended carriers.
    pub(crate) fn tail_reserve(self) -> u64 {
        match self {
            MediaClass::Video => 2048,
            _ => 1024,
        }
    }
}

/// Lowercase an extension and strip any leading dot.
pub fn normalize_extension(ext: &str) -> String {
    ext.trim_start_matches('.').to_ascii_lowercase()
}

/// Extension of a file name, lowercased, without the dot.
pub fn extension_of(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(normalize_extension)
}

/// Whether a file name carries one of the accepted media extensions.
pub fn is_accepted_media(file_name: &str) -> bool {
    extension_of(file_name)
        .map(|ext| ACCEPTED_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Shared capability of both embedding strategies.
pub trait Codec {
    /// Produce a new carrier holding `payload`. The input carrier is not modified.
    fn encode(&self, carrier: &[u8], payload: &[u8]) -> Result<Vec<u8>>;

    /// Recover the payload hidden in `carrier`.
    fn decode(&self, carrier: &[u8]) -> Result<Vec<u8>>;
}

/// The closed set of embedding strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecKind {
    /// Low bit of every color channel of a decoded raster image.
    Lsb,
    /// Marked record appended after the carrier's last byte.
    TailAppend,
}

impl CodecKind {
    /// Route a declared extension to its codec.
    ///
    /// `{png, jpg, jpeg, bmp}` go to [`CodecKind::Lsb`]; every other extension,
    /// including the accepted `tiff`, goes to [`CodecKind::TailAppend`].
    pub fn select(ext: &str) -> Self {
        let ext = normalize_extension(ext);
        if LSB_EXTENSIONS.contains(&ext.as_str()) {
            CodecKind::Lsb
        } else {
            CodecKind::TailAppend
        }
    }

    /// Extension of the buffer this codec produces, when it differs from the input's.
    pub fn output_extension(self) -> Option<&'static str> {
        match self {
            CodecKind::Lsb => Some("png"),
            CodecKind::TailAppend => None,
        }
    }
}

impl Codec for CodecKind {
    fn encode(&self, carrier: &[u8], payload: &[u8]) -> Result<Vec<u8>> {
        match self {
            CodecKind::Lsb => LsbCodec.encode(carrier, payload),
            CodecKind::TailAppend => TailCodec.encode(carrier, payload),
        }
    }

    fn decode(&self, carrier: &[u8]) -> Result<Vec<u8>> {
        match self {
            CodecKind::Lsb => LsbCodec.decode(carrier),
            CodecKind::TailAppend => TailCodec.decode(carrier),
        }
    }
}
