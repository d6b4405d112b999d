// IFF/RIFF chunk plumbing shared by the AIFF and WAV modules
//
// Both families frame every record as a four character id followed by a 32-bit
// size; IFF stores the size big-endian, RIFF little-endian. Payloads are padded
// to an even length and the pad byte is not counted in the size.

use serde::Serialize;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;
use tracing::{debug, error};

use crate::error::{Error, Result};
use crate::utils::io::{copy_exact, four_cc_to_string, read_four_cc, read_i32, write_u32, ByteOrder};

pub mod chunk_header;

pub use chunk_header::{ChunkHeader, CHUNK_HEADER_SIZE, TYPE_LENGTH};

/// Result of handing one chunk to a format's registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkStatus {
    /// Recognised and decoded
    Parsed,
    /// Not in the registry, or deliberately not buffered
    Skipped,
    /// Recognised but the payload could not be decoded
    Malformed,
    /// Handled; the bytes after it are not part of the chunk sequence
    Last,
}

/// How a walk over a chunk sequence ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkOutcome {
    /// Reached the end of the region or ran out of header bytes
    Complete,
    /// A recognised chunk could not be decoded; everything after it is unread
    Aborted { id: [u8; 4], offset: u64 },
}

impl WalkOutcome {
    pub fn is_complete(&self) -> bool {
        matches!(self, WalkOutcome::Complete)
    }
}

/// Top-level chunk location, kept for diagnostics and `info` output
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChunkSummary {
    pub id: String,
    pub start: u64,
    pub size: u64,
}

impl From<&ChunkHeader> for ChunkSummary {
    fn from(header: &ChunkHeader) -> Self {
        ChunkSummary {
            id: header.id_string(),
            start: header.start_location,
            size: header.size,
        }
    }
}

/// `FORM`/`RIFF` header at the start of a container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerHeader {
    pub id: [u8; 4],
    pub size: u64,
    pub form_type: [u8; 4],
}

impl ContainerHeader {
    /// The outer header plus the form type
    pub const SIZE: u64 = 12;

    /// Read and validate the outer header at the current position
    pub fn read<R: Read>(reader: &mut R, expected_id: &[u8; 4], order: ByteOrder, path: &Path) -> Result<Self> {
        let id = read_four_cc(reader).map_err(|e| eof_as_corrupt(e, path))?;
        if &id != expected_id {
            return Err(Error::corrupt(
                path,
                format!("expected {} header, found {}", four_cc_to_string(expected_id), four_cc_to_string(&id)),
            ));
        }
        let size = read_i32(reader, order).map_err(|e| eof_as_corrupt(e, path))?;
        if size < 0 {
            return Err(Error::corrupt(path, format!("container declares negative size {}", size)));
        }
        let form_type = read_four_cc(reader).map_err(|e| eof_as_corrupt(e, path))?;
        Ok(ContainerHeader {
            id,
            size: size as u64,
            form_type,
        })
    }

    /// Offset one past the last byte the container declares
    pub fn end(&self) -> u64 {
        CHUNK_HEADER_SIZE + self.size
    }
}

fn eof_as_corrupt(e: io::Error, path: &Path) -> Error {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        Error::corrupt(path, "file ends inside the container header")
    } else {
        Error::Io(e)
    }
}

/// Walk the chunk sequence from the current position up to `end`.
///
/// `visit` is handed each header with the reader positioned at the payload. It
/// may read as much or as little as it likes: the walker always repositions to
/// the declared end of the payload and then to the next even boundary.
pub fn walk_chunks<R, F>(reader: &mut R, order: ByteOrder, end: u64, path: &Path, mut visit: F) -> Result<WalkOutcome>
where
    R: Read + Seek,
    F: FnMut(&ChunkHeader, &mut R) -> Result<ChunkStatus>,
{
    while reader.stream_position()? < end {
        let header = match ChunkHeader::read(reader, order, path)? {
            Some(header) => header,
            None => break,
        };
        debug!(
            "{}: chunk {} at {} size {}",
            path.display(),
            header.id_string(),
            header.start_location,
            header.size
        );

        match visit(&header, reader)? {
            ChunkStatus::Malformed => {
                error!("{}: unable to read chunk {}", path.display(), header.id_string());
                return Ok(WalkOutcome::Aborted {
                    id: header.id,
                    offset: header.start_location,
                });
            }
            ChunkStatus::Last => break,
            ChunkStatus::Parsed | ChunkStatus::Skipped => {}
        }

        reader.seek(SeekFrom::Start(header.data_end()))?;
        ensure_on_equal_boundary(reader, &header, end)?;
    }
    Ok(WalkOutcome::Complete)
}

/// Skip the pad byte after an odd-sized chunk, if the region still has one
pub fn ensure_on_equal_boundary<S: Seek>(stream: &mut S, header: &ChunkHeader, end: u64) -> io::Result<()> {
    if header.size % 2 != 0 {
        let pos = stream.stream_position()?;
        if pos < end {
            debug!("Skipping pad byte after chunk {}", header.id_string());
            stream.seek(SeekFrom::Start(pos + 1))?;
        }
    }
    Ok(())
}

/// Write a complete chunk (header, payload, pad byte)
pub fn write_chunk<W: Write>(writer: &mut W, id: &[u8; 4], payload: &[u8], order: ByteOrder) -> io::Result<u64> {
    writer.write_all(id)?;
    write_u32(writer, payload.len() as u32, order)?;
    writer.write_all(payload)?;
    let mut written = CHUNK_HEADER_SIZE + payload.len() as u64;
    if payload.len() % 2 != 0 {
        writer.write_all(&[0])?;
        written += 1;
    }
    Ok(written)
}

/// Copy a chunk verbatim from `reader` (header, payload, pad byte) and return
/// the number of bytes written. A missing trailing pad byte is supplied.
pub fn copy_chunk<R: Read + Seek, W: Write>(
    reader: &mut R,
    writer: &mut W,
    header: &ChunkHeader,
    order: ByteOrder,
) -> io::Result<u64> {
    writer.write_all(&header.id)?;
    write_u32(writer, header.size as u32, order)?;
    reader.seek(SeekFrom::Start(header.data_start()))?;
    copy_exact(reader, writer, header.size)?;
    let mut written = CHUNK_HEADER_SIZE + header.size;
    if header.size % 2 != 0 {
        writer.write_all(&[0])?;
        written += 1;
    }
    Ok(written)
}

/// Read the whole payload of a chunk into memory
pub fn read_payload<R: Read + Seek>(reader: &mut R, header: &ChunkHeader) -> io::Result<Vec<u8>> {
    reader.seek(SeekFrom::Start(header.data_start()))?;
    let mut data = vec![0u8; header.size as usize];
    reader.read_exact(&mut data)?;
    Ok(data)
}

/// Collect the headers of every top-level chunk between the current position and `end`
pub fn list_chunks<R: Read + Seek>(reader: &mut R, order: ByteOrder, end: u64, path: &Path) -> Result<Vec<ChunkHeader>> {
    let mut headers = Vec::new();
    walk_chunks(reader, order, end, path, |header, _| {
        headers.push(header.clone());
        Ok(ChunkStatus::Skipped)
    })?;
    Ok(headers)
}
