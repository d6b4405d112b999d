// Structural pass over a WAV file

use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use tracing::{debug, error};

use super::chunk::{parse_fact, WavChunkType, WavFormat};
use crate::audio_header::AudioHeader;
use crate::error::{Error, Result};
use crate::iff::{read_payload, walk_chunks, ChunkStatus, ContainerHeader, WalkOutcome};
use crate::utils::io::{four_cc_to_string, ByteOrder};

pub const RIFF_ID: &[u8; 4] = b"RIFF";
pub const WAVE_TYPE: &[u8; 4] = b"WAVE";

/// Read and validate the RIFF header
pub fn read_riff_header<R: Read + Seek>(reader: &mut R, path: &Path) -> Result<ContainerHeader> {
    reader.seek(SeekFrom::Start(0))?;
    let container = ContainerHeader::read(reader, RIFF_ID, ByteOrder::Little, path)?;
    if &container.form_type != WAVE_TYPE {
        return Err(Error::corrupt(
            path,
            format!("RIFF type {} is not WAVE", four_cc_to_string(&container.form_type)),
        ));
    }
    Ok(container)
}

/// Walk the top-level chunks and accumulate the audio properties.
///
/// Track length comes from the `fact` sample count when there is one, else
/// from the data length and byte rate.
pub fn read_audio_header<R: Read + Seek>(reader: &mut R, path: &Path) -> Result<AudioHeader> {
    let file_len = reader.seek(SeekFrom::End(0))?;
    let container = read_riff_header(reader, path)?;
    debug!("{}: reading WAV file size {}, RIFF size {}", path.display(), file_len, container.size);

    let mut header = AudioHeader::default();
    let mut format: Option<WavFormat> = None;
    let mut fact_samples: Option<u32> = None;

    let outcome = walk_chunks(reader, ByteOrder::Little, file_len, path, |chunk, reader| {
        match WavChunkType::get(&chunk.id) {
            Some(WavChunkType::Format) => {
                let parsed = read_payload(reader, chunk).ok().and_then(|data| WavFormat::parse(&data));
                match parsed {
                    Some(parsed) => {
                        parsed.apply(&mut header);
                        format = Some(parsed);
                        Ok(ChunkStatus::Parsed)
                    }
                    None => Ok(ChunkStatus::Malformed),
                }
            }
            Some(WavChunkType::Fact) => match read_payload(reader, chunk).ok().and_then(|data| parse_fact(&data)) {
                Some(samples) => {
                    fact_samples = Some(samples);
                    Ok(ChunkStatus::Parsed)
                }
                None => Ok(ChunkStatus::Malformed),
            },
            Some(WavChunkType::Data) => {
                header.set_audio_data(chunk.data_start(), chunk.size);
                Ok(ChunkStatus::Parsed)
            }
            _ => Ok(ChunkStatus::Skipped),
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

    if let Some(format) = format {
        calculate_track_length(&mut header, &format, fact_samples);
    }
    header.derive_bit_rate();
    Ok(header)
}

fn calculate_track_length(header: &mut AudioHeader, format: &WavFormat, fact_samples: Option<u32>) {
    if let Some(samples) = fact_samples {
        header.sample_frames = Some(samples as u64);
        if format.sample_rate > 0 {
            header.precise_track_length = Some(samples as f64 / format.sample_rate as f64);
        }
    } else if let Some(length) = header.audio_data_length {
        if format.block_align > 0 {
            header.sample_frames = Some(length / format.block_align as u64);
        }
        if format.byte_rate > 0 {
            header.precise_track_length = Some(length as f64 / format.byte_rate as f64);
        }
    }
}
