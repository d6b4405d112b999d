// ID3 frame payload codecs

use crate::config::Id3Version;
use crate::utils::encoding::{decode_text, encode_latin1, encode_text, TextEncoding};

/// Language written into new comment frames
pub const DEFAULT_LANGUAGE: &[u8; 3] = b"eng";

/// Decode text frame data
pub fn decode_text_frame(data: &[u8]) -> String {
    if data.is_empty() {
        return String::new();
    }

    let encoding = TextEncoding::from_byte(data[0]);
    decode_text(&data[1..], encoding)
}

/// Encode text frame data, choosing the narrowest encoding the version allows
pub fn encode_text_frame(text: &str, version: Id3Version) -> Vec<u8> {
    let encoding = choose_encoding(text, version);
    let mut result = vec![encoding as u8];
    result.extend(encode_text(text, encoding));
    result
}

/// Decode a COMM frame: encoding, language, description, text
pub fn decode_comment_frame(data: &[u8]) -> String {
    if data.len() < 4 {
        return String::new();
    }

    let encoding = TextEncoding::from_byte(data[0]);
    let body = &data[4..];
    let width = encoding.terminator_len();

    // Skip the content description up to and including its terminator
    let mut index = 0;
    while index + width <= body.len() {
        if body[index..index + width].iter().all(|&b| b == 0) {
            return decode_text(&body[index + width..], encoding);
        }
        index += width;
    }
    String::new()
}

/// Encode a COMM frame with an empty description
pub fn encode_comment_frame(text: &str, version: Id3Version) -> Vec<u8> {
    let encoding = choose_encoding(text, version);
    let mut result = vec![encoding as u8];
    result.extend_from_slice(DEFAULT_LANGUAGE);
    // Empty description
    if encoding == TextEncoding::Utf16 {
        result.extend_from_slice(&[0xFF, 0xFE]);
    }
    result.extend(std::iter::repeat(0u8).take(encoding.terminator_len()));
    result.extend(encode_text(text, encoding));
    result
}

fn choose_encoding(text: &str, version: Id3Version) -> TextEncoding {
    if text.is_ascii() || encode_latin1(text).is_some() {
        return TextEncoding::Iso8859_1;
    }
    match version {
        Id3Version::V23 => TextEncoding::Utf16,
        Id3Version::V24 => TextEncoding::Utf8,
    }
}

/// ID3v2.2 three character frame ids and their v2.3 equivalents
const V22_FRAME_IDS: [(&str, &str); 15] = [
    ("TT2", "TIT2"),
    ("TP1", "TPE1"),
    ("TP2", "TPE2"),
    ("TP3", "TPE3"),
    ("TAL", "TALB"),
    ("TYE", "TYER"),
    ("TRK", "TRCK"),
    ("TCO", "TCON"),
    ("COM", "COMM"),
    ("TCM", "TCOM"),
    ("TXT", "TEXT"),
    ("TEN", "TENC"),
    ("TRC", "TSRC"),
    ("TPB", "TPUB"),
    ("TCR", "TCOP"),
];

/// Map an ID3v2.2 frame id to its v2.3 equivalent
pub fn upgrade_v22_frame_id(id: &str) -> Option<&'static str> {
    V22_FRAME_IDS
        .iter()
        .find(|(old, _)| *old == id)
        .map(|(_, new)| *new)
}

/// Map a v2.3 frame id back to its ID3v2.2 form
pub fn downgrade_to_v22_frame_id(id: &str) -> Option<&'static str> {
    V22_FRAME_IDS
        .iter()
        .find(|(_, new)| *new == id)
        .map(|(old, _)| *old)
}
