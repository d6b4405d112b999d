// AIFF tag: a container-level wrapper around an optional ID3v2 tag

use serde::Serialize;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use tracing::{debug, warn};

use super::info_reader::read_form_header;
use crate::config::Id3Version;
use crate::error::Result;
use crate::field_mapping::FieldKey;
use crate::id3::Id3v2Tag;
use crate::iff::{read_payload, walk_chunks, ChunkHeader, ChunkStatus, ChunkSummary};
use crate::tag::Tag;
use crate::utils::io::ByteOrder;

/// Chunk ids that carry an ID3v2 tag inside AIFF and WAV files
pub const ID3_CHUNK_IDS: [&[u8; 4]; 2] = [b"ID3 ", b"id3 "];

pub fn is_id3_chunk(id: &[u8; 4]) -> bool {
    ID3_CHUNK_IDS.contains(&id)
}

/// Distance from a misread chunk header to an `ID3 ` chunk written one byte
/// off the even boundary.
///
/// A writer that dropped the pad byte after an odd chunk leaves the walker
/// reading `D3 ` plus the first size byte; one that wrote a stray extra byte
/// leaves it reading `\0ID3`.
pub fn misaligned_id3_shift(id: &[u8; 4]) -> Option<i64> {
    match id {
        [b'D', b'3', b' ', _] => Some(-1),
        [0, b'I', b'D', b'3'] => Some(1),
        _ => None,
    }
}

/// Where an embedded ID3 chunk was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Id3ChunkLocation {
    /// Offset of the chunk header
    pub start: u64,
    /// Offset one past the payload
    pub end: u64,
}

impl Id3ChunkLocation {
    pub fn size_including_header(&self) -> u64 {
        self.end - self.start
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AiffTag {
    id3: Option<Id3v2Tag>,
    location: Option<Id3ChunkLocation>,
    incorrectly_aligned: bool,
    chunk_summaries: Vec<ChunkSummary>,
    new_tag_version: Id3Version,
}

impl AiffTag {
    /// An AIFF tag with no ID3 content. Fields set later create an ID3 tag
    /// of `version`.
    pub fn new(version: Id3Version) -> Self {
        AiffTag {
            id3: None,
            location: None,
            incorrectly_aligned: false,
            chunk_summaries: Vec::new(),
            new_tag_version: version,
        }
    }

    pub fn id3(&self) -> Option<&Id3v2Tag> {
        self.id3.as_ref()
    }

    pub fn set_id3(&mut self, tag: Id3v2Tag) {
        self.id3 = Some(tag);
    }

    /// True if the file already held an ID3 chunk when it was read
    pub fn is_existing_id3_tag(&self) -> bool {
        self.location.is_some()
    }

    pub fn id3_location(&self) -> Option<Id3ChunkLocation> {
        self.location
    }

    /// The ID3 chunk started on an odd offset and was found one byte off the
    /// chunk boundary
    pub fn is_incorrectly_aligned(&self) -> bool {
        self.incorrectly_aligned
    }

    pub fn chunk_summaries(&self) -> &[ChunkSummary] {
        &self.chunk_summaries
    }

    fn id3_or_new(&mut self) -> &mut Id3v2Tag {
        let version = self.new_tag_version;
        self.id3.get_or_insert_with(|| Id3v2Tag::new(version))
    }
}

impl Tag for AiffTag {
    fn format_name(&self) -> &'static str {
        "AIFF"
    }

    fn get(&self, key: FieldKey) -> Option<String> {
        self.id3.as_ref().and_then(|tag| tag.get(key))
    }

    fn set(&mut self, key: FieldKey, value: &str) -> Result<()> {
        self.id3_or_new().set(key, value)
    }

    fn remove(&mut self, key: FieldKey) {
        if let Some(tag) = self.id3.as_mut() {
            tag.remove(key);
        }
    }

    fn field_count(&self) -> usize {
        self.id3.as_ref().map_or(0, |tag| tag.field_count())
    }
}

/// Read the tag phase of an AIFF file: locate the ID3 chunk and summarise
/// every top-level chunk.
pub fn read_tag<R: Read + Seek>(reader: &mut R, path: &Path, version: Id3Version) -> Result<AiffTag> {
    let file_len = reader.seek(SeekFrom::End(0))?;
    read_form_header(reader, path)?;

    let mut tag = AiffTag::new(version);
    walk_chunks(reader, ByteOrder::Big, file_len, path, |header, reader| {
        if let Some(shift) = misaligned_id3_shift(&header.id) {
            let start = header.start_location.saturating_add_signed(shift);
            warn!("{}: ID3 chunk starts on odd offset {}", path.display(), start);
            if tag.id3.is_none() {
                read_misaligned_id3(&mut tag, reader, start, file_len, path)?;
            }
            return Ok(ChunkStatus::Last);
        }

        tag.chunk_summaries.push(ChunkSummary::from(header));
        if !is_id3_chunk(&header.id) {
            return Ok(ChunkStatus::Skipped);
        }

        if tag.id3.is_some() {
            warn!(
                "{}: ignoring additional ID3 chunk at {}",
                path.display(),
                header.start_location
            );
            return Ok(ChunkStatus::Skipped);
        }

        let data = match read_payload(reader, header) {
            Ok(data) => data,
            Err(e) => {
                warn!("{}: unable to read ID3 chunk: {}", path.display(), e);
                return Ok(ChunkStatus::Skipped);
            }
        };

        match Id3v2Tag::parse(&data) {
            Some(id3) => {
                debug!(
                    "{}: ID3 chunk at {} with {} frames",
                    path.display(),
                    header.start_location,
                    id3.field_count()
                );
                tag.id3 = Some(id3);
                tag.location = Some(Id3ChunkLocation {
                    start: header.start_location,
                    end: header.data_end(),
                });
                Ok(ChunkStatus::Parsed)
            }
            None => {
                warn!("{}: ID3 chunk does not hold a readable ID3v2 tag", path.display());
                Ok(ChunkStatus::Skipped)
            }
        }
    })?;

    Ok(tag)
}

/// Read an `ID3 ` chunk that starts at odd offset `start`
fn read_misaligned_id3<R: Read + Seek>(
    tag: &mut AiffTag,
    reader: &mut R,
    start: u64,
    file_len: u64,
    path: &Path,
) -> Result<()> {
    reader.seek(SeekFrom::Start(start))?;
    let header = match ChunkHeader::read(reader, ByteOrder::Big, path) {
        Ok(Some(header)) if is_id3_chunk(&header.id) && header.data_end() <= file_len => header,
        _ => {
            warn!("{}: no readable ID3 chunk at {}", path.display(), start);
            return Ok(());
        }
    };

    let data = read_payload(reader, &header)?;
    match Id3v2Tag::parse(&data) {
        Some(id3) => {
            tag.chunk_summaries.push(ChunkSummary::from(&header));
            tag.id3 = Some(id3);
            tag.location = Some(Id3ChunkLocation {
                start,
                end: header.data_end(),
            });
            tag.incorrectly_aligned = true;
        }
        None => warn!("{}: ID3 chunk does not hold a readable ID3v2 tag", path.display()),
    }
    Ok(())
}
