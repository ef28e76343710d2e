//! # LSB Pixel Codec
//!
//! Hides a payload in the least significant bit of every color channel of a
//! raster image.
//!
//! ## Layout
//!
//! ```text
//! [length: u32 BE][checksum: u32 BE][payload bytes ...]
//! ```
//!
//! The 8-byte header and the payload are expanded MSB-first into a bitstream.
//! Bit `i` lands in pixel `i / 3`, channel `i % 3` (R, G, B), walking the image
//! row by row. The checksum is the sum of all payload bytes modulo 2^32; it
//! detects corruption, not tampering.
//!
//! ## Capacity
//!
//! A `width x height` image holds `width * height * 3` bits, so the payload can be
//! at most `width * height * 3 / 8 - 8` bytes.
//!
//! The carrier is always converted to 8-bit RGB before any bit accounting, and
//! the result is written back as PNG. A lossy re-encode would wipe the low bits.
//!
//! Decoding a carrier may allocate at most [`DECODE_ALLOC_LIMIT`] bytes. Capacity
//! estimation applies the same ceiling to the 8-bit RGBA size of the image, so
//! a carrier it accepts is one the encoder can open. A 16-bit carrier needs
//! twice that and may still be refused at encode time.

use std::io::{self, Cursor};

use image::io::{Limits, Reader as ImageReader};
use image::{ImageFormat, RgbImage};
use log::{debug, error};

use super::error::{Result, StegoError};
use super::media::Codec;

/// Size of the embedded header in bytes.
pub const HEADER_LEN: usize = 8;

const HEADER_BITS: usize = HEADER_LEN * 8;

/// Most bytes a carrier decode may allocate (4 GiB).
pub const DECODE_ALLOC_LIMIT: u64 = 4 * 1024 * 1024 * 1024;

/// Fixed header written ahead of the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbeddedHeader {
    pub length: u32,
    pub checksum: u32,
}

impl EmbeddedHeader {
    /// Header describing `payload`.
    ///
    /// Fails when the payload length does not fit the 32-bit length field.
    pub fn for_payload(payload: &[u8]) -> Result<Self> {
        let length = u32::try_from(payload.len()).map_err(|_| StegoError::InsufficientCapacity {
            required_bits: combined_bits(payload.len()),
            available_bits: u64::from(u32::MAX) * 8,
        })?;
        Ok(Self {
            length,
            checksum: additive_checksum(payload),
        })
    }

    pub fn to_bytes(self) -> [u8; HEADER_LEN] {
        let mut bytes = [0u8; HEADER_LEN];
        bytes[..4].copy_from_slice(&self.length.to_be_bytes());
        bytes[4..].copy_from_slice(&self.checksum.to_be_bytes());
        bytes
    }

    pub fn from_bytes(bytes: [u8; HEADER_LEN]) -> Self {
        Self {
            length: u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            checksum: u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
        }
    }
}

/// Sum of all bytes, wrapping at 2^32.
pub fn additive_checksum(data: &[u8]) -> u32 {
    data.iter()
        .fold(0u32, |acc, &byte| acc.wrapping_add(u32::from(byte)))
}

/// Payload bytes a `width x height` grid can carry, header overhead not subtracted.
pub fn grid_capacity(width: u32, height: u32) -> u64 {
    u64::from(width) * u64::from(height) * 3 / 8
}

fn combined_bits(payload_len: usize) -> u64 {
    (HEADER_LEN as u64 + payload_len as u64) * 8
}

/// Decode a carrier and normalize it to 8-bit RGB.
///
/// Encoder and decoder must go through this same conversion or the bits will
/// not line up.
pub(crate) fn load_rgb(carrier: &[u8]) -> Result<RgbImage> {
    let mut reader = ImageReader::new(Cursor::new(carrier)).with_guessed_format()?;
    let mut limits = Limits::default();
    limits.max_alloc = Some(DECODE_ALLOC_LIMIT);
    reader.limits(limits);

    let image = reader
        .decode()
        .map_err(|e| StegoError::InvalidCarrierFormat(e.to_string()))?;
    Ok(image.to_rgb8())
}

/// Write `data` MSB-first into the low bit of consecutive channel bytes.
///
/// The caller guarantees `channels.len() >= data.len() * 8`.
fn embed_bits(channels: &mut [u8], data: &[u8]) {
    for (group, &byte) in channels.chunks_exact_mut(8).zip(data) {
        for (shift, channel) in (0..8).rev().zip(group.iter_mut()) {
            *channel = (*channel & 0xFE) | ((byte >> shift) & 1);
        }
    }
}

/// Pack the low bit of every channel byte, MSB-first, eight channels per byte.
fn pack_low_bits(channels: &[u8]) -> Vec<u8> {
    channels
        .chunks_exact(8)
        .map(|group| group.iter().fold(0u8, |acc, &c| (acc << 1) | (c & 1)))
        .collect()
}

/// Least-significant-bit codec for `png`, `jpg`, `jpeg` and `bmp` carriers.
#[derive(Debug, Clone, Copy, Default)]
pub struct LsbCodec;

impl Codec for LsbCodec {
    fn encode(&self, carrier: &[u8], payload: &[u8]) -> Result<Vec<u8>> {
        let mut pixels = load_rgb(carrier)?;

        // A zero length header is rejected on the way back out.
        if payload.is_empty() {
            return Err(StegoError::InvalidDataLength {
                declared: 0,
                max_capacity: grid_capacity(pixels.width(), pixels.height())
                    .saturating_sub(HEADER_LEN as u64),
            });
        }

        let header = EmbeddedHeader::for_payload(payload)?;
        let mut combined = Vec::with_capacity(HEADER_LEN + payload.len());
        combined.extend_from_slice(&header.to_bytes());
        combined.extend_from_slice(payload);

        let required_bits = combined_bits(payload.len());
        let available_bits = pixels.len() as u64;
        if required_bits > available_bits {
            return Err(StegoError::InsufficientCapacity {
                required_bits,
                available_bits,
            });
        }

        embed_bits(&mut pixels, &combined);
        debug!(
            "Embedded {} payload bytes into {}x{} carrier ({} of {} bits)",
            payload.len(),
            pixels.width(),
            pixels.height(),
            required_bits,
            available_bits
        );

        let mut output = Vec::new();
        pixels
            .write_to(&mut Cursor::new(&mut output), ImageFormat::Png)
            .map_err(|e| StegoError::Io(io::Error::new(io::ErrorKind::Other, e)))?;
        Ok(output)
    }

    fn decode(&self, carrier: &[u8]) -> Result<Vec<u8>> {
        let pixels = load_rgb(carrier)?;
        let channels: &[u8] = &pixels;
        let total_bits = channels.len() as u64;

        if channels.len() < HEADER_BITS {
            return Err(StegoError::IncompleteHeader {
                available_bits: total_bits,
            });
        }

        let mut header_bytes = [0u8; HEADER_LEN];
        header_bytes.copy_from_slice(&pack_low_bits(&channels[..HEADER_BITS]));
        let header = EmbeddedHeader::from_bytes(header_bytes);

        let max_capacity = (total_bits - HEADER_BITS as u64) / 8;
        let declared = u64::from(header.length);
        if declared == 0 || declared > max_capacity {
            return Err(StegoError::InvalidDataLength {
                declared,
                max_capacity,
            });
        }

        let data_end = HEADER_BITS + header.length as usize * 8;
        let data_bits = channels
            .get(HEADER_BITS..data_end)
            .ok_or(StegoError::InvalidDataLength {
                declared,
                max_capacity,
            })?;
        let payload = pack_low_bits(data_bits);

        let actual = additive_checksum(&payload);
        if actual != header.checksum {
            error!(
                "Checksum verification failed: header={:02x?}, extracted length={} bytes",
                header_bytes,
                payload.len()
            );
            return Err(StegoError::ChecksumMismatch {
                expected: header.checksum,
                actual,
            });
        }

        Ok(payload)
    }
}
