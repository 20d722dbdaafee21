use std::borrow::Cow;

use encoding_rs::WINDOWS_1252;
use simdutf8::basic;

/// Strips trailing NUL and blank padding from a fixed-width character field.
pub fn trim_trailing(bytes: &[u8]) -> &[u8] {
    match bytes.iter().rposition(|b| *b != 0 && *b != b' ') {
        Some(last) => &bytes[..=last],
        None => &[],
    }
}

/// Validates a character field as UTF-8 without copying.
pub fn decode_utf8(bytes: &[u8]) -> Option<&str> {
    basic::from_utf8(bytes).ok()
}

/// Decodes bytes that failed UTF-8 validation. Windows-1252 maps every byte,
/// so this never fails.
pub fn decode_legacy(bytes: &[u8]) -> Cow<'_, str> {
    if let Some(text) = decode_utf8(bytes) {
        return Cow::Borrowed(text);
    }
    let (decoded, _, _) = WINDOWS_1252.decode(bytes);
    decoded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_nul_and_space_padding() {
        assert_eq!(trim_trailing(b"abc \0\0 "), b"abc");
        assert_eq!(trim_trailing(b"  \0"), b"");
        assert_eq!(trim_trailing(b" lead"), b" lead");
    }

    #[test]
    fn legacy_decoding_maps_latin_bytes() {
        assert_eq!(decode_legacy(b"caf\xe9"), "café");
        assert_eq!(decode_legacy("déjà".as_bytes()), "déjà");
    }
}
