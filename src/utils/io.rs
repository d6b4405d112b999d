// Byte-level I/O helpers shared by the chunk readers and writers

use byteorder::{BigEndian, LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Seek, SeekFrom, Write};

/// Byte order of multi-byte integers in a container family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// IFF/AIFF
    Big,
    /// RIFF/WAV
    Little,
}

/// Read a signed 32-bit integer in the given byte order
pub fn read_i32<R: Read>(reader: &mut R, order: ByteOrder) -> io::Result<i32> {
    match order {
        ByteOrder::Big => reader.read_i32::<BigEndian>(),
        ByteOrder::Little => reader.read_i32::<LittleEndian>(),
    }
}

/// Write an unsigned 32-bit integer in the given byte order
pub fn write_u32<W: Write>(writer: &mut W, value: u32, order: ByteOrder) -> io::Result<()> {
    match order {
        ByteOrder::Big => writer.write_u32::<BigEndian>(value),
        ByteOrder::Little => writer.write_u32::<LittleEndian>(value),
    }
}

/// Read a four character code
pub fn read_four_cc<R: Read>(reader: &mut R) -> io::Result<[u8; 4]> {
    let mut id = [0u8; 4];
    reader.read_exact(&mut id)?;
    Ok(id)
}

/// Render a four character code for logs and error messages
pub fn four_cc_to_string(id: &[u8; 4]) -> String {
    id.iter().map(|&b| b as char).collect()
}

/// Read synchsafe 32-bit integer (7 bits per byte)
pub fn synchsafe_to_u32(bytes: [u8; 4]) -> u32 {
    ((bytes[0] as u32 & 0x7F) << 21)
        | ((bytes[1] as u32 & 0x7F) << 14)
        | ((bytes[2] as u32 & 0x7F) << 7)
        | (bytes[3] as u32 & 0x7F)
}

/// Encode a value below 2^28 as a synchsafe integer
pub fn u32_to_synchsafe(value: u32) -> [u8; 4] {
    [
        ((value >> 21) & 0x7F) as u8,
        ((value >> 14) & 0x7F) as u8,
        ((value >> 7) & 0x7F) as u8,
        (value & 0x7F) as u8,
    ]
}

/// Check if file has signature at current position
pub fn check_signature<R: Read + Seek>(reader: &mut R, signature: &[u8]) -> io::Result<bool> {
    let pos = reader.stream_position()?;
    let mut buffer = vec![0u8; signature.len()];
    let matched = match reader.read_exact(&mut buffer) {
        Ok(()) => buffer == signature,
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => false,
        Err(e) => return Err(e),
    };
    reader.seek(SeekFrom::Start(pos))?;
    Ok(matched)
}

/// Fill `buffer` as far as the reader allows and return how much was read
pub fn read_up_to<R: Read>(reader: &mut R, buffer: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buffer.len() {
        match reader.read(&mut buffer[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Copy exactly `len` bytes from `reader` to `writer`
pub fn copy_exact<R: Read, W: Write>(reader: &mut R, writer: &mut W, len: u64) -> io::Result<()> {
    let copied = io::copy(&mut reader.take(len), writer)?;
    if copied != len {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("expected {} bytes, copied {}", len, copied),
        ));
    }
    Ok(())
}

/// Decode an 80-bit IEEE 754 extended precision float (AIFF sample rates)
pub fn extended_to_f64(bytes: [u8; 10]) -> f64 {
    let sign = if bytes[0] & 0x80 != 0 { -1.0 } else { 1.0 };
    let exponent = (((bytes[0] & 0x7F) as i32) << 8) | bytes[1] as i32;
    let mantissa = u64::from_be_bytes([
        bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7], bytes[8], bytes[9],
    ]);

    if exponent == 0 && mantissa == 0 {
        return 0.0;
    }
    if exponent == 0x7FFF {
        return if mantissa == 0 { sign * f64::INFINITY } else { f64::NAN };
    }

    // The mantissa carries an explicit integer bit, so it is scaled by 2^-63
    sign * (mantissa as f64) * 2f64.powi(exponent - 16383 - 63)
}

/// Encode a finite, non-negative f64 as an 80-bit extended float
pub fn f64_to_extended(value: f64) -> [u8; 10] {
    let mut out = [0u8; 10];
    if value <= 0.0 || !value.is_finite() {
        return out;
    }
    let bits = value.to_bits();
    let exponent = ((bits >> 52) & 0x7FF) as i32 - 1023 + 16383;
    let mantissa = ((bits & 0x000F_FFFF_FFFF_FFFF) | 0x0010_0000_0000_0000) << 11;
    out[0] = ((exponent >> 8) & 0x7F) as u8;
    out[1] = (exponent & 0xFF) as u8;
    out[2..].copy_from_slice(&mantissa.to_be_bytes());
    out
}
