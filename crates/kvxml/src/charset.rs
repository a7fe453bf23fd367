//! Character-set detection and best-effort transcoding.
//!
//! Text inside the crate is always UTF-8. Conversion only happens at the
//! byte boundary: input files are decoded after sniffing a byte-order mark
//! or the `encoding` of the XML declaration, and written chunks are encoded
//! into the charset named in the output declaration. Labels we don't know
//! are passed through as UTF-8.

use std::borrow::Cow;

use tracing::debug;

/// Character sets the reader and writer can convert
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Charset {
    Utf8,
    Latin1,
    Ascii,
}

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const UTF16LE_BOM: &[u8] = &[0xFF, 0xFE];
const UTF16BE_BOM: &[u8] = &[0xFE, 0xFF];

impl Charset {
    /// Look up an encoding label as used in XML declarations
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Some(Self::Utf8),
            "iso-8859-1" | "iso8859-1" | "iso_8859-1" | "latin1" | "latin-1" | "l1" => {
                Some(Self::Latin1)
            }
            "us-ascii" | "ascii" => Some(Self::Ascii),
            _ => None,
        }
    }

    /// True if `ch` has a representation in this charset
    pub fn can_encode(self, ch: char) -> bool {
        match self {
            Self::Utf8 => true,
            Self::Latin1 => u32::from(ch) <= 0xFF,
            Self::Ascii => ch.is_ascii(),
        }
    }

    /// Encode UTF-8 text; characters without a representation become `?`
    pub fn encode(self, text: &str) -> Cow<'_, [u8]> {
        match self {
            Self::Utf8 => Cow::Borrowed(text.as_bytes()),
            Self::Latin1 | Self::Ascii if text.is_ascii() => Cow::Borrowed(text.as_bytes()),
            Self::Latin1 | Self::Ascii => Cow::Owned(
                text.chars()
                    .map(|ch| {
                        if self.can_encode(ch) {
                            u8::try_from(u32::from(ch)).unwrap_or(b'?')
                        } else {
                            b'?'
                        }
                    })
                    .collect(),
            ),
        }
    }

    /// Decode bytes in this charset. Bytes above 0x7F in ASCII input are
    /// read as Latin-1 rather than rejected.
    pub fn decode(self, bytes: &[u8]) -> Cow<'_, str> {
        match self {
            Self::Utf8 => String::from_utf8_lossy(bytes),
            Self::Latin1 | Self::Ascii => match std::str::from_utf8(bytes) {
                Ok(text) if text.is_ascii() => Cow::Borrowed(text),
                _ => Cow::Owned(bytes.iter().copied().map(char::from).collect()),
            },
        }
    }
}

/// Make `text` representable in `target` by replacing characters it can't
/// hold with `?`. Unknown targets leave the text unchanged.
pub fn normalize(text: &str, target: Option<Charset>) -> Cow<'_, str> {
    match target {
        Some(charset) if !text.chars().all(|ch| charset.can_encode(ch)) => {
            debug!(?charset, "replacing characters not representable in output charset");
            Cow::Owned(
                text.chars()
                    .map(|ch| if charset.can_encode(ch) { ch } else { '?' })
                    .collect(),
            )
        }
        _ => Cow::Borrowed(text),
    }
}

/// Decode the raw bytes of an XML document.
///
/// Detection order: byte-order mark, then the declared `encoding`, then
/// UTF-8 if the bytes are valid UTF-8, falling back to Latin-1.
pub fn decode_document(bytes: &[u8]) -> Cow<'_, str> {
    if let Some(rest) = bytes.strip_prefix(UTF8_BOM) {
        return String::from_utf8_lossy(rest);
    }
    if let Some(rest) = bytes.strip_prefix(UTF16LE_BOM) {
        return Cow::Owned(decode_utf16(rest, u16::from_le_bytes));
    }
    if let Some(rest) = bytes.strip_prefix(UTF16BE_BOM) {
        return Cow::Owned(decode_utf16(rest, u16::from_be_bytes));
    }

    match declared_encoding(bytes).and_then(Charset::from_label) {
        Some(Charset::Utf8) | None => match std::str::from_utf8(bytes) {
            Ok(text) => Cow::Borrowed(text),
            Err(_) => {
                debug!("input is not valid UTF-8, decoding as Latin-1");
                Charset::Latin1.decode(bytes)
            }
        },
        Some(charset) => charset.decode(bytes),
    }
}

fn decode_utf16(bytes: &[u8], to_unit: fn([u8; 2]) -> u16) -> String {
    let units = bytes.chunks_exact(2).map(|pair| match pair {
        [first, second] => to_unit([*first, *second]),
        _ => 0,
    });
    char::decode_utf16(units)
        .map(|unit| unit.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

/// The `encoding` pseudo-attribute of a leading XML declaration
fn declared_encoding(bytes: &[u8]) -> Option<&str> {
    let rest = bytes.strip_prefix(b"<?xml")?;
    let end = rest.windows(2).position(|w| w == b"?>")?;
    let decl = std::str::from_utf8(rest.get(..end)?).ok()?;

    let after = decl.split_once("encoding")?.1.trim_start();
    let after = after.strip_prefix('=')?.trim_start();
    let quote = after.chars().next().filter(|q| *q == '"' || *q == '\'')?;
    let value = after.get(1..)?;
    value.split(quote).next()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels() {
        assert_eq!(Charset::from_label("UTF-8"), Some(Charset::Utf8));
        assert_eq!(Charset::from_label("ISO-8859-1"), Some(Charset::Latin1));
        assert_eq!(Charset::from_label("us-ascii"), Some(Charset::Ascii));
        assert_eq!(Charset::from_label("Shift_JIS"), None);
    }

    #[test]
    fn test_encode_latin1() {
        assert_eq!(&*Charset::Latin1.encode("café"), b"caf\xE9");
        assert_eq!(&*Charset::Latin1.encode("€"), b"?");
        assert_eq!(&*Charset::Utf8.encode("€"), "€".as_bytes());
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("plain", Some(Charset::Ascii)), "plain");
        assert_eq!(normalize("naïve", Some(Charset::Ascii)), "na?ve");
        assert_eq!(normalize("naïve", Some(Charset::Latin1)), "naïve");
        assert_eq!(normalize("naïve €", None), "naïve €");
    }

    #[test]
    fn test_decode_utf8_with_bom() {
        let bytes = b"\xEF\xBB\xBF<a>\xC3\xA9</a>";
        assert_eq!(decode_document(bytes), "<a>é</a>");
    }

    #[test]
    fn test_decode_declared_latin1() {
        let bytes = b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><a>\xE9</a>";
        assert!(decode_document(bytes).ends_with("<a>é</a>"));
    }

    #[test]
    fn test_decode_falls_back_to_latin1() {
        let bytes = b"<a>\xE9t\xE9</a>";
        assert_eq!(decode_document(bytes), "<a>été</a>");
    }

    #[test]
    fn test_decode_utf16le() {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in "<a/>".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        assert_eq!(decode_document(&bytes), "<a/>");
    }

    #[test]
    fn test_declared_encoding() {
        assert_eq!(
            declared_encoding(b"<?xml version='1.0' encoding='latin1'?><a/>"),
            Some("latin1")
        );
        assert_eq!(declared_encoding(b"<?xml version=\"1.0\"?><a/>"), None);
        assert_eq!(declared_encoding(b"<a/>"), None);
    }
}
