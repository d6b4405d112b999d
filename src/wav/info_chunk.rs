// LIST/INFO tuple parser
//
// The payload of a LIST chunk of type INFO is a run of (code, size, value)
// tuples with no framing chunk of their own. Sizes are little-endian and each
// tuple is padded to an even length.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Cursor, Read, Write};
use std::path::Path;
use tracing::{debug, error};

use super::tag::{InfoTuple, WavInfoTag};
use crate::field_mapping::FieldMappings;
use crate::iff::TYPE_LENGTH;
use crate::utils::encoding::decode_utf8_strict;
use crate::utils::io::four_cc_to_string;

pub const LIST_ID: &[u8; 4] = b"LIST";
pub const INFO_TYPE: &[u8; 4] = b"INFO";

/// Parse the tuples that follow the `INFO` type id.
///
/// Trailing padding ends the parse successfully. A non-alphabetic code, a
/// value running past the buffer or a value that is not UTF-8 makes the whole
/// block corrupt: `None` is returned and nothing from this call is kept.
pub fn read_info_tuples(data: &[u8], path: &Path) -> Option<WavInfoTag> {
    let mut tag = WavInfoTag::new();
    let mut cursor = Cursor::new(data);

    while remaining(&cursor) >= TYPE_LENGTH {
        let mut raw = [0u8; 4];
        cursor.read_exact(&mut raw).ok()?;
        let code = four_cc_to_string(&raw);
        if raw.iter().all(|&b| b <= b' ') {
            debug!("{}: padding after LIST INFO tuples", path.display());
            return Some(tag);
        }

        let size = match cursor.read_u32::<LittleEndian>() {
            Ok(size) => size as usize,
            Err(_) => {
                error!("{}: LIST INFO appears corrupt, tuple {} has no size", path.display(), code);
                return None;
            }
        };

        if !raw.iter().all(u8::is_ascii_alphabetic) {
            error!("{}: LIST INFO appears corrupt, ignoring: {}:{}", path.display(), code, size);
            return None;
        }

        if size > remaining(&cursor) {
            error!(
                "{}: LIST INFO appears corrupt, {} declares {} bytes but {} remain",
                path.display(),
                code,
                size,
                remaining(&cursor)
            );
            return None;
        }
        let mut value = vec![0u8; size];
        cursor.read_exact(&mut value).ok()?;
        let terminator_len = value.iter().rev().take_while(|&&b| b == 0).count();
        let value = match decode_utf8_strict(&value[..size - terminator_len]) {
            Some(value) => value,
            None => {
                error!("{}: LIST INFO appears corrupt, {} is not valid UTF-8", path.display(), code);
                return None;
            }
        };

        debug!("{}: INFO {}:{}:{}", path.display(), code, size, value);
        let key = FieldMappings::from_wav_info(&code);
        tag.push_tuple(InfoTuple {
            code,
            key,
            value,
            terminator_len,
        });

        if size % 2 != 0 && remaining(&cursor) > 0 {
            cursor.set_position(cursor.position() + 1);
        }
    }
    Some(tag)
}

fn remaining(cursor: &Cursor<&[u8]>) -> usize {
    cursor.get_ref().len().saturating_sub(cursor.position() as usize)
}

/// Encode one tuple: NUL-terminated value, size including the NUL, padded
pub fn write_info_tuple<W: Write>(writer: &mut W, code: &str, value: &str) -> io::Result<()> {
    write_framed_tuple(writer, code, value, 1)
}

/// Encode one tuple with `terminator_len` NULs counted in its size
fn write_framed_tuple<W: Write>(writer: &mut W, code: &str, value: &str, terminator_len: usize) -> io::Result<()> {
    let mut id = [b' '; 4];
    for (slot, byte) in id.iter_mut().zip(code.bytes()) {
        *slot = byte;
    }
    let size = value.len() + terminator_len;
    writer.write_all(&id)?;
    writer.write_u32::<LittleEndian>(size as u32)?;
    writer.write_all(value.as_bytes())?;
    writer.write_all(&vec![0u8; terminator_len])?;
    if size % 2 != 0 {
        writer.write_all(&[0])?;
    }
    Ok(())
}

/// Encode the LIST payload: `INFO`, then every tuple in order
pub fn info_payload(tag: &WavInfoTag) -> io::Result<Vec<u8>> {
    let mut out = INFO_TYPE.to_vec();
    for tuple in tag.tuples() {
        write_framed_tuple(&mut out, &tuple.code, &tuple.value, tuple.terminator_len)?;
    }
    Ok(out)
}
