// Chunk header codec

use std::io::{self, Read, Seek, Write};
use std::path::Path;

use crate::error::{Error, Result};
use crate::utils::io::{four_cc_to_string, read_up_to, write_u32, ByteOrder};

/// Identifier plus size field
pub const CHUNK_HEADER_SIZE: u64 = 8;

/// Length of a chunk or form type identifier
pub const TYPE_LENGTH: usize = 4;

/// Header of a single chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkHeader {
    pub id: [u8; 4],
    /// Payload size, excluding the header and any pad byte
    pub size: u64,
    /// Offset of the identifier in the file
    pub start_location: u64,
}

impl ChunkHeader {
    /// Decode the header at the current position.
    ///
    /// `Ok(None)` means fewer than [`CHUNK_HEADER_SIZE`] bytes remain, which is
    /// the normal end of a chunk sequence. A size field that decodes negative is
    /// corruption and is reported as [`Error::Corrupt`].
    pub fn read<R: Read + Seek>(reader: &mut R, order: ByteOrder, path: &Path) -> Result<Option<Self>> {
        let start_location = reader.stream_position()?;
        let mut buffer = [0u8; CHUNK_HEADER_SIZE as usize];
        if read_up_to(reader, &mut buffer)? < buffer.len() {
            return Ok(None);
        }

        let id = [buffer[0], buffer[1], buffer[2], buffer[3]];
        let raw = [buffer[4], buffer[5], buffer[6], buffer[7]];
        let size = match order {
            ByteOrder::Big => i32::from_be_bytes(raw),
            ByteOrder::Little => i32::from_le_bytes(raw),
        };

        if size < 0 {
            return Err(Error::corrupt(
                path,
                format!(
                    "not a valid header, chunk {} at {} declares size {}",
                    four_cc_to_string(&id),
                    start_location,
                    size
                ),
            ));
        }

        Ok(Some(ChunkHeader {
            id,
            size: size as u64,
            start_location,
        }))
    }

    /// Encode this header
    pub fn write<W: Write>(&self, writer: &mut W, order: ByteOrder) -> io::Result<()> {
        writer.write_all(&self.id)?;
        write_u32(writer, self.size as u32, order)
    }

    pub fn id_string(&self) -> String {
        four_cc_to_string(&self.id)
    }

    /// Offset of the first payload byte
    pub fn data_start(&self) -> u64 {
        self.start_location + CHUNK_HEADER_SIZE
    }

    /// Offset one past the last payload byte
    pub fn data_end(&self) -> u64 {
        self.data_start() + self.size
    }

    /// Offset one past the pad byte, if the size is odd
    pub fn padded_end(&self) -> u64 {
        self.data_end() + self.size % 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn decodes_both_byte_orders() {
        let path = Path::new("t");
        let be = ChunkHeader::read(&mut Cursor::new(b"COMM\x00\x00\x00\x12".to_vec()), ByteOrder::Big, path)
            .unwrap()
            .unwrap();
        assert_eq!(be.id_string(), "COMM");
        assert_eq!(be.size, 18);

        let le = ChunkHeader::read(&mut Cursor::new(b"fmt \x10\x00\x00\x00".to_vec()), ByteOrder::Little, path)
            .unwrap()
            .unwrap();
        assert_eq!(le.id_string(), "fmt ");
        assert_eq!(le.size, 16);
        assert_eq!(le.data_start(), 8);
    }

    #[test]
    fn short_input_is_not_an_error() {
        let header = ChunkHeader::read(&mut Cursor::new(b"SSND\x00".to_vec()), ByteOrder::Big, Path::new("t")).unwrap();
        assert!(header.is_none());
    }

    #[test]
    fn negative_size_is_corruption() {
        let err = ChunkHeader::read(
            &mut Cursor::new(b"SSND\xFF\xFF\xFF\xFF".to_vec()),
            ByteOrder::Big,
            Path::new("t"),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Corrupt { .. }));
    }

    #[test]
    fn write_round_trips() {
        let header = ChunkHeader {
            id: *b"LIST",
            size: 77,
            start_location: 0,
        };
        let mut out = Vec::new();
        header.write(&mut out, ByteOrder::Little).unwrap();
        let decoded = ChunkHeader::read(&mut Cursor::new(out), ByteOrder::Little, Path::new("t"))
            .unwrap()
            .unwrap();
        assert_eq!(decoded, header);
        assert_eq!(decoded.padded_end(), 86);
    }
}
