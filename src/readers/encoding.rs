use std::borrow::Cow;

use encoding_rs::{UTF_8, WINDOWS_1252};

use crate::types::SourceEncoding;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Decode raw bytes with the given encoding.
///
/// Returns `None` when the bytes are not valid in that encoding. Latin-1 maps
/// every byte to the code point of the same value and so always succeeds.
/// With the default fallback order, Windows-1252 is therefore only reached
/// after a Latin-1 parse failure, which it repeats: both decodings leave the
/// ASCII delimiters and line breaks in the same places.
pub fn decode(bytes: &[u8], encoding: SourceEncoding) -> Option<Cow<'_, str>> {
    match encoding {
        SourceEncoding::Utf8 => {
            let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
            UTF_8.decode_without_bom_handling_and_without_replacement(bytes)
        }
        SourceEncoding::Latin1 => Some(Cow::Owned(bytes.iter().map(|&b| char::from(b)).collect())),
        SourceEncoding::Windows1252 => {
            WINDOWS_1252.decode_without_bom_handling_and_without_replacement(bytes)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_utf8() {
        let text = decode("São Paulo".as_bytes(), SourceEncoding::Utf8).unwrap();
        assert_eq!(text, "São Paulo");
    }

    #[test]
    fn test_decode_utf8_strips_bom() {
        let text = decode(b"\xEF\xBB\xBFSG_UF", SourceEncoding::Utf8).unwrap();
        assert_eq!(text, "SG_UF");
    }

    #[test]
    fn test_decode_utf8_rejects_latin1_bytes() {
        // "São" in Latin-1
        assert!(decode(b"S\xE3o", SourceEncoding::Utf8).is_none());
    }

    #[test]
    fn test_decode_latin1() {
        let text = decode(b"S\xE3o", SourceEncoding::Latin1).unwrap();
        assert_eq!(text, "São");
    }

    #[test]
    fn test_decode_windows1252_specials() {
        // 0x80 is the euro sign in Windows-1252
        let text = decode(b"\x80", SourceEncoding::Windows1252).unwrap();
        assert_eq!(text, "€");
    }
}
