//! # Tail-Append Codec
//!
//! Appends a marked record after the carrier's last byte:
//!
//! ```text
//! [carrier bytes ...]["STEGANO_MARKER"][length: u32 BE][payload bytes ...]
//! ```
//!
//! Most players ignore trailing bytes, so the carrier still plays. Decoding looks
//! for the *rightmost* marker, since the same byte pattern may occur earlier in
//! genuine carrier content.

use log::debug;

use super::error::{Result, StegoError};
use super::media::Codec;

/// Marker opening a tail record.
pub const MARKER: &[u8; 14] = b"STEGANO_MARKER";

const LENGTH_LEN: usize = 4;

/// Bytes a tail record adds on top of its payload.
pub const RECORD_OVERHEAD: usize = MARKER.len() + LENGTH_LEN;

/// Offsets of every occurrence of `needle` in `haystack`, rightmost first.
fn rfind_all<'a>(haystack: &'a [u8], needle: &'a [u8]) -> impl Iterator<Item = usize> + 'a {
    let positions = if needle.is_empty() || haystack.len() < needle.len() {
        0
    } else {
        haystack.len() - needle.len() + 1
    };
    (0..positions)
        .rev()
        .filter(move |&pos| &haystack[pos..pos + needle.len()] == needle)
}

/// Payload bounds of a record whose marker sits at `pos`.
///
/// Returns `(data_start, declared_length)`, or `None` when the length field
/// itself is cut off.
fn record_at(carrier: &[u8], pos: usize) -> Option<(usize, u32)> {
    let length_start = pos + MARKER.len();
    let bytes = carrier.get(length_start..length_start + LENGTH_LEN)?;
    let length = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    Some((length_start + LENGTH_LEN, length))
}

/// Tail-append codec used for every carrier that is not LSB-capable.
///
/// Encoding never fails: capacity is advisory and checked by the caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct TailCodec;

impl Codec for TailCodec {
    fn encode(&self, carrier: &[u8], payload: &[u8]) -> Result<Vec<u8>> {
        let length = u32::try_from(payload.len()).map_err(|_| StegoError::InsufficientCapacity {
            required_bits: payload.len() as u64 * 8,
            available_bits: u64::from(u32::MAX) * 8,
        })?;

        let mut output = Vec::with_capacity(carrier.len() + RECORD_OVERHEAD + payload.len());
        output.extend_from_slice(carrier);
        output.extend_from_slice(MARKER);
        output.extend_from_slice(&length.to_be_bytes());
        output.extend_from_slice(payload);
        Ok(output)
    }

    fn decode(&self, carrier: &[u8]) -> Result<Vec<u8>> {
        let rightmost = rfind_all(carrier, MARKER)
            .next()
            .ok_or(StegoError::MarkerNotFound)?;

        // An appended record always ends at the last byte. Prefer the rightmost
        // marker that satisfies this, so marker bytes inside a payload are skipped.
        let pos = rfind_all(carrier, MARKER)
            .find(|&pos| {
                record_at(carrier, pos)
                    .map(|(start, length)| start + length as usize == carrier.len())
                    .unwrap_or(false)
            })
            .unwrap_or(rightmost);

        let Some((data_start, length)) = record_at(carrier, pos) else {
            return Err(StegoError::TruncatedLengthField {
                available: (carrier.len() - pos - MARKER.len()) as u64,
            });
        };

        let available = carrier.len() - data_start;
        let payload = carrier
            .get(data_start..data_start + length as usize)
            .ok_or(StegoError::CorruptLength {
                declared: u64::from(length),
                available: available as u64,
            })?;

        debug!("Found tail record at offset {}, {} bytes", pos, length);
        Ok(payload.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_layout() {
        let out = TailCodec.encode(&[0xAA; 10], b"hello").unwrap();
        assert_eq!(out.len(), 10 + 14 + 4 + 5);
        assert_eq!(&out[..10], &[0xAA; 10]);
        assert_eq!(&out[10..24], MARKER);
        assert_eq!(&out[24..28], &[0, 0, 0, 5]);
        assert_eq!(&out[28..], b"hello");
        assert_eq!(TailCodec.decode(&out).unwrap(), b"hello");
    }

    #[test]
    fn test_empty_payload_and_empty_carrier() {
        let out = TailCodec.encode(&[], &[]).unwrap();
        assert_eq!(out.len(), RECORD_OVERHEAD);
        assert_eq!(TailCodec.decode(&out).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_rightmost_marker_wins() {
        // a decoy record already sits inside the carrier
        let mut carrier = b"header".to_vec();
        carrier.extend_from_slice(MARKER);
        carrier.extend_from_slice(&[0, 0, 0, 3]);
        carrier.extend_from_slice(b"bad trailing content");

        let out = TailCodec.encode(&carrier, b"real payload").unwrap();
        assert_eq!(TailCodec.decode(&out).unwrap(), b"real payload");
    }

    #[test]
    fn test_marker_not_found() {
        assert!(matches!(
            TailCodec.decode(b"plain old audio bytes"),
            Err(StegoError::MarkerNotFound)
        ));
        assert!(matches!(
            TailCodec.decode(&[]),
            Err(StegoError::MarkerNotFound)
        ));
        assert!(matches!(
            TailCodec.decode(&MARKER[..13]),
            Err(StegoError::MarkerNotFound)
        ));
    }

    #[test]
    fn test_corrupt_length() {
        let mut out = TailCodec.encode(b"carrier", b"payload").unwrap();
        out.truncate(out.len() - 1);
        assert!(matches!(
            TailCodec.decode(&out),
            Err(StegoError::CorruptLength {
                declared: 7,
                available: 6
            })
        ));
    }

    #[test]
    fn test_truncated_length_field() {
        let mut data = b"carrier".to_vec();
        data.extend_from_slice(MARKER);
        data.extend_from_slice(&[0, 0]);
        let err = TailCodec.decode(&data).unwrap_err();
        assert!(matches!(
            err,
            StegoError::TruncatedLengthField { available: 2 }
        ));
        assert_eq!(
            err.to_string(),
            "corrupt length: length field cut off, 2 of 4 bytes present"
        );

        // marker flush against the end
        assert!(matches!(
            TailCodec.decode(MARKER),
            Err(StegoError::TruncatedLengthField { available: 0 })
        ));
    }

    #[test]
    fn test_payload_containing_marker() {
        let mut payload = b"before ".to_vec();
        payload.extend_from_slice(MARKER);
        payload.extend_from_slice(b" after");
        let out = TailCodec.encode(b"carrier", &payload).unwrap();
        assert_eq!(TailCodec.decode(&out).unwrap(), payload);

        let out = TailCodec.encode(b"carrier", MARKER).unwrap();
        assert_eq!(TailCodec.decode(&out).unwrap(), MARKER);
    }

    #[test]
    fn test_rfind_all() {
        assert_eq!(rfind_all(b"abcabc", b"abc").collect::<Vec<_>>(), vec![3, 0]);
        assert_eq!(rfind_all(b"abc", b"abcd").count(), 0);
        assert_eq!(rfind_all(b"abc", b"").count(), 0);
    }
}
