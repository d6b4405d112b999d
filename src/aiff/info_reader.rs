// Structural pass over an AIFF file: everything except the ID3 chunk

use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use tracing::{debug, error};

use super::chunk::AiffChunk;
use super::tag::misaligned_id3_shift;
use crate::audio_header::{AiffInfo, AudioHeader};
use crate::error::{Error, Result};
use crate::iff::{walk_chunks, ChunkStatus, ContainerHeader, WalkOutcome};
use crate::utils::io::{four_cc_to_string, ByteOrder};

pub const FORM_ID: &[u8; 4] = b"FORM";
pub const AIFF_TYPE: &[u8; 4] = b"AIFF";
pub const AIFC_TYPE: &[u8; 4] = b"AIFC";

/// Read the FORM header and report whether the form is AIFF-C
pub fn read_form_header<R: Read + Seek>(reader: &mut R, path: &Path) -> Result<(ContainerHeader, bool)> {
    reader.seek(SeekFrom::Start(0))?;
    let container = ContainerHeader::read(reader, FORM_ID, ByteOrder::Big, path)?;
    let is_aifc = match &container.form_type {
        AIFF_TYPE => false,
        AIFC_TYPE => true,
        other => {
            return Err(Error::corrupt(
                path,
                format!("FORM type {} is neither AIFF nor AIFC", four_cc_to_string(other)),
            ))
        }
    };
    Ok((container, is_aifc))
}

/// Walk every top-level chunk and accumulate the audio properties.
///
/// A malformed recognised chunk stops the walk; the returned header then has
/// [`AudioHeader::aborted_at`] set and lacks whatever later chunks would have
/// contributed.
pub fn read_audio_header<R: Read + Seek>(reader: &mut R, path: &Path) -> Result<AudioHeader> {
    let file_len = reader.seek(SeekFrom::End(0))?;
    let (container, is_aifc) = read_form_header(reader, path)?;
    debug!(
        "{}: reading AIFF file size {}, FORM size {}",
        path.display(),
        file_len,
        container.size
    );

    let mut header = AudioHeader::default();
    header.aiff = Some(AiffInfo {
        form_type: four_cc_to_string(&container.form_type),
        ..Default::default()
    });

    let outcome = walk_chunks(reader, ByteOrder::Big, file_len, path, |chunk_header, reader| {
        if misaligned_id3_shift(&chunk_header.id).is_some() {
            return Ok(ChunkStatus::Last);
        }
        match AiffChunk::read(chunk_header, reader, is_aifc, file_len) {
            Some(AiffChunk::Unknown { .. }) => Ok(ChunkStatus::Skipped),
            Some(chunk) => {
                chunk.apply(&mut header);
                Ok(ChunkStatus::Parsed)
            }
            None => Ok(ChunkStatus::Malformed),
        }
    })?;

    if let WalkOutcome::Aborted { id, offset } = outcome {
        error!(
            "{}: unable to process chunk {} at {}, audio properties are incomplete",
            path.display(),
            four_cc_to_string(&id),
            offset
        );
        header.aborted_at = Some(offset);
    }

    header.derive_bit_rate();
    Ok(header)
}
