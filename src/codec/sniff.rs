//! # File Type Sniffing
//!
//! Guesses an extension for a recovered payload from its leading bytes. The
//! table is ordered and the first match wins. Container formats (`RIFF`, the
//! MPEG-4 `ftyp` box) carry a sub-table of brand tags searched for in the rest
//! of the prefix.

/// Number of leading bytes inspected.
pub const PREFIX_LEN: usize = 32;

/// Extension returned for readable text.
pub const TEXT_EXTENSION: &str = ".txt";

/// Extension returned when nothing else matches.
pub const FALLBACK_EXTENSION: &str = ".dat";

/// How a signature resolves to an extension.
enum Resolve {
    Direct(&'static str),
    /// Brand tags searched after the outer magic.
    Nested(&'static [([u8; 4], &'static str)]),
}

struct Signature {
    offset: usize,
    magic: &'static [u8],
    resolve: Resolve,
}

const fn direct(magic: &'static [u8], ext: &'static str) -> Signature {
    Signature {
        offset: 0,
        magic,
        resolve: Resolve::Direct(ext),
    }
}

static SIGNATURES: &[Signature] = &[
    direct(b"\x89PNG", ".png"),
    direct(b"\xFF\xD8\xFF", ".jpg"),
    direct(b"GIF8", ".gif"),
    direct(b"BM", ".bmp"),
    direct(b"ID3", ".mp3"),
    direct(b"PK\x03\x04", ".zip"),
    direct(b"%PDF", ".pdf"),
    direct(b"Rar!", ".rar"),
    direct(b"7z\xBC\xAF", ".7z"),
    direct(b"\xD0\xCF\x11\xE0", ".doc"),
    direct(b"fLaC", ".flac"),
    direct(b"\x1A\x45\xDF\xA3", ".mkv"),
    Signature {
        offset: 0,
        magic: b"RIFF",
        resolve: Resolve::Nested(&[(*b"WAVE", ".wav"), (*b"AVI ", ".avi")]),
    },
    Signature {
        offset: 4,
        magic: b"ftyp",
        resolve: Resolve::Nested(&[
            (*b"mp41", ".mp4"),
            (*b"mp42", ".mp4"),
            (*b"isom", ".mp4"),
            (*b"M4A ", ".m4a"),
            (*b"qt  ", ".mov"),
        ]),
    },
];

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|window| window == needle)
}

impl Signature {
    fn matches(&self, prefix: &[u8]) -> Option<&'static str> {
        let end = self.offset + self.magic.len();
        if prefix.get(self.offset..end)? != self.magic {
            return None;
        }
        match &self.resolve {
            Resolve::Direct(ext) => Some(*ext),
            Resolve::Nested(tags) => {
                let rest = &prefix[end..];
                tags.iter()
                    .find(|(tag, _)| contains(rest, tag))
                    .map(|(_, ext)| *ext)
            }
        }
    }
}

/// Whether a prefix reads as text: valid UTF-8 without stray control characters.
///
/// A multi-byte sequence cut off at the end of the prefix is tolerated.
pub fn is_readable_text(prefix: &[u8]) -> bool {
    let text = match std::str::from_utf8(prefix) {
        Ok(text) => text,
        Err(e) if e.error_len().is_none() => {
            // truncated trailing character; the valid part is all we can judge
            match std::str::from_utf8(&prefix[..e.valid_up_to()]) {
                Ok(text) => text,
                Err(_) => return false,
            }
        }
        Err(_) => return false,
    };
    !text.is_empty()
        && text
            .chars()
            .all(|c| !c.is_control() || matches!(c, '\t' | '\n' | '\r' | '\x0C'))
}

/// Best-guess extension (with leading dot) for `buffer`. Never fails.
pub fn sniff(buffer: &[u8]) -> &'static str {
    let prefix = &buffer[..buffer.len().min(PREFIX_LEN)];

    if let Some(ext) = SIGNATURES.iter().find_map(|sig| sig.matches(prefix)) {
        return ext;
    }
    if is_readable_text(prefix) {
        TEXT_EXTENSION
    } else {
        FALLBACK_EXTENSION
    }
}
