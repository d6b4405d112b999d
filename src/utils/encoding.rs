// Encoding utilities

use encoding_rs::{mem, UTF_16BE, UTF_16LE, UTF_8};

/// ID3v2 text encoding byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Iso8859_1 = 0,
    Utf16 = 1,
    Utf16BE = 2,
    Utf8 = 3,
}

impl TextEncoding {
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            0 => TextEncoding::Iso8859_1,
            1 => TextEncoding::Utf16,
            2 => TextEncoding::Utf16BE,
            3 => TextEncoding::Utf8,
            _ => TextEncoding::Iso8859_1,
        }
    }

    /// Width in bytes of the string terminator for this encoding
    pub fn terminator_len(self) -> usize {
        match self {
            TextEncoding::Utf16 | TextEncoding::Utf16BE => 2,
            TextEncoding::Iso8859_1 | TextEncoding::Utf8 => 1,
        }
    }
}

/// Decode text with specified encoding, stripping trailing terminators
pub fn decode_text(data: &[u8], encoding: TextEncoding) -> String {
    let text = match encoding {
        TextEncoding::Iso8859_1 => decode_latin1(data),
        TextEncoding::Utf16 => {
            // Detect BOM
            if data.len() >= 2 && data[0..2] == [0xFF, 0xFE] {
                UTF_16LE.decode_without_bom_handling(&data[2..]).0.into_owned()
            } else if data.len() >= 2 && data[0..2] == [0xFE, 0xFF] {
                UTF_16BE.decode_without_bom_handling(&data[2..]).0.into_owned()
            } else {
                UTF_16LE.decode_without_bom_handling(data).0.into_owned()
            }
        }
        TextEncoding::Utf16BE => UTF_16BE.decode_without_bom_handling(data).0.into_owned(),
        TextEncoding::Utf8 => UTF_8.decode_without_bom_handling(data).0.into_owned(),
    };
    text.trim_end_matches('\0').to_string()
}

/// Encode text with specified encoding (no terminator)
pub fn encode_text(text: &str, encoding: TextEncoding) -> Vec<u8> {
    match encoding {
        TextEncoding::Iso8859_1 => encode_latin1(text).unwrap_or_else(|| text.bytes().collect()),
        TextEncoding::Utf16 => {
            let mut bytes = vec![0xFF, 0xFE];
            bytes.extend(text.encode_utf16().flat_map(u16::to_le_bytes));
            bytes
        }
        TextEncoding::Utf16BE => text.encode_utf16().flat_map(u16::to_be_bytes).collect(),
        TextEncoding::Utf8 => text.as_bytes().to_vec(),
    }
}

/// Decode ISO-8859-1 text (AIFF text chunks, ID3 encoding 0)
pub fn decode_latin1(data: &[u8]) -> String {
    mem::decode_latin1(data).into_owned()
}

/// Encode as ISO-8859-1, `None` if a character is above U+00FF
pub fn encode_latin1(text: &str) -> Option<Vec<u8>> {
    if text.chars().any(|c| c as u32 > 0xFF) {
        return None;
    }
    Some(mem::encode_latin1_lossy(text).into_owned())
}

/// Strict UTF-8 decode, `None` on malformed input
pub fn decode_utf8_strict(data: &[u8]) -> Option<String> {
    UTF_8
        .decode_without_bom_handling_and_without_replacement(data)
        .map(|text| text.into_owned())
}
