// AIFF chunk registry and per-chunk decoders
//
// The set of chunks decoded during the structural pass is closed: an id either
// maps to one `AiffChunkType` or the chunk is skipped as unknown.

use byteorder::{BigEndian, ReadBytesExt};
use chrono::{DateTime, Utc};
use std::io::{Cursor, Read, Seek};

use crate::audio_header::{AiffComment, AudioHeader};
use crate::iff::{read_payload, ChunkHeader};
use crate::utils::encoding::decode_latin1;
use crate::utils::io::{extended_to_f64, four_cc_to_string};

/// Seconds between 1904-01-01 (the AIFF epoch) and 1970-01-01
const AIFF_EPOCH_OFFSET: i64 = 2_082_844_800;

/// AIFF-C compression types that store uncompressed samples
const UNCOMPRESSED_TYPES: [&[u8; 4]; 8] = [b"NONE", b"twos", b"sowt", b"fl32", b"fl64", b"in24", b"in32", b"raw "];

/// Chunk ids recognised by the structural reader
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiffChunkType {
    FormatVersion,
    Application,
    Common,
    Comments,
    Name,
    Author,
    Copyright,
    Annotation,
    Sound,
}

impl AiffChunkType {
    pub fn get(id: &[u8; 4]) -> Option<Self> {
        let chunk_type = match id {
            b"FVER" => AiffChunkType::FormatVersion,
            b"APPL" => AiffChunkType::Application,
            b"COMM" => AiffChunkType::Common,
            b"COMT" => AiffChunkType::Comments,
            b"NAME" => AiffChunkType::Name,
            b"AUTH" => AiffChunkType::Author,
            b"(c) " => AiffChunkType::Copyright,
            b"ANNO" => AiffChunkType::Annotation,
            b"SSND" => AiffChunkType::Sound,
            _ => return None,
        };
        Some(chunk_type)
    }

    pub fn code(self) -> &'static [u8; 4] {
        match self {
            AiffChunkType::FormatVersion => b"FVER",
            AiffChunkType::Application => b"APPL",
            AiffChunkType::Common => b"COMM",
            AiffChunkType::Comments => b"COMT",
            AiffChunkType::Name => b"NAME",
            AiffChunkType::Author => b"AUTH",
            AiffChunkType::Copyright => b"(c) ",
            AiffChunkType::Annotation => b"ANNO",
            AiffChunkType::Sound => b"SSND",
        }
    }
}

/// Decoded COMM chunk
#[derive(Debug, Clone, PartialEq)]
pub struct CommonChunk {
    pub channels: i16,
    pub sample_frames: u32,
    pub sample_size: i16,
    pub sample_rate: f64,
    /// AIFF-C only: compression type and its human-readable name
    pub compression: Option<([u8; 4], String)>,
}

/// One decoded top-level AIFF chunk
#[derive(Debug, Clone, PartialEq)]
pub enum AiffChunk {
    FormatVersion { timestamp: u32 },
    Application { signature: String, name: Option<String> },
    Common(CommonChunk),
    Comments(Vec<AiffComment>),
    Name(String),
    Author(String),
    Copyright(String),
    Annotation(String),
    /// Only the location of the sample data; the payload is never buffered
    Sound { start: u64, length: u64 },
    Unknown { id: [u8; 4], size: u64 },
}

impl AiffChunk {
    /// Decode the chunk introduced by `header`.
    ///
    /// Returns `None` if the chunk is recognised but its payload is malformed or
    /// runs past `end`.
    pub fn read<R: Read + Seek>(header: &ChunkHeader, reader: &mut R, is_aifc: bool, end: u64) -> Option<Self> {
        let chunk_type = match AiffChunkType::get(&header.id) {
            Some(chunk_type) => chunk_type,
            None => {
                return Some(AiffChunk::Unknown {
                    id: header.id,
                    size: header.size,
                })
            }
        };

        if chunk_type == AiffChunkType::Sound {
            return Some(AiffChunk::Sound {
                start: header.data_start(),
                length: header.size,
            });
        }

        if header.data_end() > end {
            return None;
        }
        let data = read_payload(reader, header).ok()?;

        match chunk_type {
            AiffChunkType::FormatVersion => {
                let timestamp = Cursor::new(&data).read_u32::<BigEndian>().ok()?;
                Some(AiffChunk::FormatVersion { timestamp })
            }
            AiffChunkType::Application => Self::parse_application(&data),
            AiffChunkType::Common => Self::parse_common(&data, is_aifc).map(AiffChunk::Common),
            AiffChunkType::Comments => Self::parse_comments(&data).map(AiffChunk::Comments),
            AiffChunkType::Name => Some(AiffChunk::Name(text_payload(&data))),
            AiffChunkType::Author => Some(AiffChunk::Author(text_payload(&data))),
            AiffChunkType::Copyright => Some(AiffChunk::Copyright(text_payload(&data))),
            AiffChunkType::Annotation => Some(AiffChunk::Annotation(text_payload(&data))),
            AiffChunkType::Sound => unreachable!("sound chunks are never buffered"),
        }
    }

    fn parse_application(data: &[u8]) -> Option<Self> {
        if data.len() < 4 {
            return None;
        }
        let signature = decode_latin1(&data[0..4]);
        // Only Apple II and Macintosh applications carry a readable name
        let name = if signature == "pdos" || signature == "stoc" {
            let mut cursor = Cursor::new(&data[4..]);
            Some(read_pascal_string(&mut cursor)?)
        } else {
            None
        };
        Some(AiffChunk::Application { signature, name })
    }

    fn parse_common(data: &[u8], is_aifc: bool) -> Option<CommonChunk> {
        let mut cursor = Cursor::new(data);
        let channels = cursor.read_i16::<BigEndian>().ok()?;
        let sample_frames = cursor.read_u32::<BigEndian>().ok()?;
        let sample_size = cursor.read_i16::<BigEndian>().ok()?;
        let mut rate = [0u8; 10];
        cursor.read_exact(&mut rate).ok()?;
        let sample_rate = extended_to_f64(rate);

        // Track length is derived from the rate, so it has to be usable
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return None;
        }

        let compression = if is_aifc {
            let mut kind = [0u8; 4];
            cursor.read_exact(&mut kind).ok()?;
            let name = read_pascal_string(&mut cursor).unwrap_or_default();
            Some((kind, name))
        } else {
            None
        };

        Some(CommonChunk {
            channels,
            sample_frames,
            sample_size,
            sample_rate,
            compression,
        })
    }

    fn parse_comments(data: &[u8]) -> Option<Vec<AiffComment>> {
        let mut cursor = Cursor::new(data);
        let count = cursor.read_u16::<BigEndian>().ok()?;
        let mut comments = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let timestamp = cursor.read_u32::<BigEndian>().ok()?;
            let marker_id = cursor.read_i16::<BigEndian>().ok()?;
            let length = cursor.read_u16::<BigEndian>().ok()? as usize;
            let mut text = vec![0u8; length];
            cursor.read_exact(&mut text).ok()?;
            if length % 2 != 0 {
                // Pad byte may be missing on the final comment
                let _ = cursor.read_u8();
            }
            comments.push(AiffComment {
                timestamp: aiff_timestamp(timestamp),
                marker_id,
                text: text_payload(&text),
            });
        }
        Some(comments)
    }

    /// Fold this chunk into the accumulator
    pub fn apply(self, header: &mut AudioHeader) {
        let info = header.aiff.get_or_insert_with(Default::default);
        match self {
            AiffChunk::FormatVersion { timestamp } => {
                info.format_version = aiff_timestamp(timestamp);
            }
            AiffChunk::Application { signature, name } => {
                info.applications.push(name.unwrap_or(signature));
            }
            AiffChunk::Common(common) => {
                let lossless = match &common.compression {
                    Some((kind, name)) => {
                        let kind_string = four_cc_to_string(kind);
                        info.compression_type = Some(kind_string.clone());
                        info.compression_name = Some(name.clone());
                        header.encoding_type = Some(format!("AIFF-C {}", kind_string.trim_end()));
                        UNCOMPRESSED_TYPES.contains(&kind)
                    }
                    None => {
                        header.encoding_type = Some("AIFF".to_string());
                        true
                    }
                };
                header.lossless = Some(lossless);
                header.channels = Some(common.channels.max(0) as u16);
                header.bits_per_sample = Some(common.sample_size.max(0) as u16);
                header.sample_frames = Some(common.sample_frames as u64);
                header.sample_rate = Some(common.sample_rate.round() as u32);
                header.precise_track_length = Some(common.sample_frames as f64 / common.sample_rate);
            }
            AiffChunk::Comments(comments) => info.comments.extend(comments),
            AiffChunk::Name(name) => info.name = Some(name),
            AiffChunk::Author(author) => info.author = Some(author),
            AiffChunk::Copyright(copyright) => info.copyright = Some(copyright),
            AiffChunk::Annotation(annotation) => info.annotations.push(annotation),
            AiffChunk::Sound { start, length } => header.set_audio_data(start, length),
            AiffChunk::Unknown { .. } => {}
        }
    }
}

/// Convert seconds since 1904 to a UTC time; zero means unset
fn aiff_timestamp(seconds: u32) -> Option<DateTime<Utc>> {
    if seconds == 0 {
        return None;
    }
    DateTime::from_timestamp(seconds as i64 - AIFF_EPOCH_OFFSET, 0)
}

fn text_payload(data: &[u8]) -> String {
    decode_latin1(data).trim_end_matches('\0').to_string()
}

/// Length byte, text, then a pad byte if the total is odd
fn read_pascal_string<R: Read>(reader: &mut R) -> Option<String> {
    let length = reader.read_u8().ok()? as usize;
    let mut text = vec![0u8; length];
    reader.read_exact(&mut text).ok()?;
    if (length + 1) % 2 != 0 {
        let _ = reader.read_u8();
    }
    Some(decode_latin1(&text))
}
