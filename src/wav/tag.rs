// WAV tags: the LIST/INFO block, and the wrapper that composes it with ID3

use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use tracing::{debug, error, warn};

use super::chunk::WavChunkType;
use super::info_chunk::{read_info_tuples, INFO_TYPE};
use super::info_reader::read_riff_header;
use crate::aiff::tag::Id3ChunkLocation;
use crate::config::Id3Version;
use crate::error::{Error, Result};
use crate::field_mapping::{FieldKey, FieldMappings};
use crate::id3::Id3v2Tag;
use crate::iff::{read_payload, walk_chunks, ChunkHeader, ChunkStatus, ChunkSummary, TYPE_LENGTH};
use crate::tag::Tag;
use crate::utils::io::ByteOrder;

/// One INFO tuple, as read from the file or as set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoTuple {
    pub code: String,
    /// Field the code maps to; `None` for codes kept only to be written back
    pub key: Option<FieldKey>,
    pub value: String,
    /// NUL bytes after the value that are counted in the tuple size
    pub terminator_len: usize,
}

impl InfoTuple {
    fn new(code: String, key: Option<FieldKey>, value: String) -> Self {
        InfoTuple {
            code,
            key,
            value,
            terminator_len: 1,
        }
    }
}

/// Metadata from a LIST chunk of type INFO.
///
/// Tuples keep the order and framing they were read with, so an unchanged
/// block is written back byte for byte. New fields are appended.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WavInfoTag {
    tuples: Vec<InfoTuple>,
    start_location: Option<u64>,
    end_location: Option<u64>,
}

impl WavInfoTag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self, key: FieldKey) -> Option<&str> {
        self.position(key).map(|index| self.tuples[index].value.as_str())
    }

    fn position(&self, key: FieldKey) -> Option<usize> {
        self.tuples.iter().position(|tuple| tuple.key == Some(key))
    }

    /// Store a tuple as read; a later value for a mapped field replaces the
    /// earlier one in place
    pub(crate) fn push_tuple(&mut self, tuple: InfoTuple) {
        match tuple.key.and_then(|key| self.position(key)) {
            Some(index) => self.tuples[index] = tuple,
            None => self.tuples.push(tuple),
        }
    }

    /// Keep a tuple with no semantic mapping so it can be written back unchanged
    pub fn add_unrecognised(&mut self, code: String, value: String) {
        self.tuples.push(InfoTuple::new(code, None, value));
    }

    /// Every tuple in file order
    pub fn tuples(&self) -> &[InfoTuple] {
        &self.tuples
    }

    /// Codes with no semantic mapping and their values, in file order
    pub fn unrecognised_fields(&self) -> Vec<(&str, &str)> {
        self.tuples
            .iter()
            .filter(|tuple| tuple.key.is_none())
            .map(|tuple| (tuple.code.as_str(), tuple.value.as_str()))
            .collect()
    }

    pub fn start_location(&self) -> Option<u64> {
        self.start_location
    }

    pub fn end_location(&self) -> Option<u64> {
        self.end_location
    }

    pub fn set_location(&mut self, start: u64, end: u64) {
        self.start_location = Some(start);
        self.end_location = Some(end);
    }

    /// Size of the LIST chunk this tag was read from, header included
    pub fn size_of_tag(&self) -> u64 {
        match (self.start_location, self.end_location) {
            (Some(start), Some(end)) => end - start,
            _ => 0,
        }
    }
}

impl Tag for WavInfoTag {
    fn format_name(&self) -> &'static str {
        "WAV INFO"
    }

    fn get(&self, key: FieldKey) -> Option<String> {
        self.value(key).map(str::to_string)
    }

    fn set(&mut self, key: FieldKey, value: &str) -> Result<()> {
        if value.contains('\0') {
            return Err(Error::InvalidFieldValue {
                key,
                reason: "INFO values cannot contain NUL".to_string(),
            });
        }
        let tuple = InfoTuple::new(FieldMappings::to_wav_info(key).to_string(), Some(key), value.to_string());
        match self.position(key) {
            Some(index) => self.tuples[index] = tuple,
            None => self.tuples.push(tuple),
        }
        Ok(())
    }

    fn remove(&mut self, key: FieldKey) {
        self.tuples.retain(|tuple| tuple.key != Some(key));
    }

    fn field_count(&self) -> usize {
        self.tuples.len()
    }
}

/// Tag of a WAV file: an optional INFO block and an optional ID3 tag.
///
/// Reads prefer the ID3 value and fall back to INFO. Writes go to both, and
/// [`crate::config::WavSaveMode`] decides which blocks reach the file.
#[derive(Debug, Clone, PartialEq)]
pub struct WavTag {
    info: Option<WavInfoTag>,
    id3: Option<Id3v2Tag>,
    id3_location: Option<Id3ChunkLocation>,
    chunk_summaries: Vec<ChunkSummary>,
    new_tag_version: Id3Version,
}

impl WavTag {
    pub fn new(version: Id3Version) -> Self {
        WavTag {
            info: None,
            id3: None,
            id3_location: None,
            chunk_summaries: Vec::new(),
            new_tag_version: version,
        }
    }

    pub fn info(&self) -> Option<&WavInfoTag> {
        self.info.as_ref()
    }

    pub fn set_info(&mut self, info: WavInfoTag) {
        self.info = Some(info);
    }

    pub fn id3(&self) -> Option<&Id3v2Tag> {
        self.id3.as_ref()
    }

    pub fn set_id3(&mut self, tag: Id3v2Tag) {
        self.id3 = Some(tag);
    }

    pub fn is_existing_id3_tag(&self) -> bool {
        self.id3_location.is_some()
    }

    pub fn is_existing_info_tag(&self) -> bool {
        self.info.as_ref().is_some_and(|info| info.start_location.is_some())
    }

    pub fn id3_location(&self) -> Option<Id3ChunkLocation> {
        self.id3_location
    }

    pub fn chunk_summaries(&self) -> &[ChunkSummary] {
        &self.chunk_summaries
    }
}

impl Tag for WavTag {
    fn format_name(&self) -> &'static str {
        "WAV"
    }

    fn get(&self, key: FieldKey) -> Option<String> {
        self.id3
            .as_ref()
            .and_then(|tag| tag.get(key))
            .or_else(|| self.info.as_ref().and_then(|info| info.get(key)))
    }

    fn set(&mut self, key: FieldKey, value: &str) -> Result<()> {
        self.info.get_or_insert_with(WavInfoTag::new).set(key, value)?;
        let version = self.new_tag_version;
        match self.id3.get_or_insert_with(|| Id3v2Tag::new(version)).set(key, value) {
            // INFO holds every field; ID3 lacks a few
            Ok(()) | Err(Error::FieldNotSupported { .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }

    fn remove(&mut self, key: FieldKey) {
        if let Some(info) = self.info.as_mut() {
            info.remove(key);
        }
        if let Some(id3) = self.id3.as_mut() {
            id3.remove(key);
        }
    }

    /// Fields across both blocks; a value held by both counts twice
    fn field_count(&self) -> usize {
        let info = self.info.as_ref().map_or(0, |info| info.field_count());
        info + self.id3.as_ref().map_or(0, |id3| id3.field_count())
    }
}

/// Read the tag phase of a WAV file: LIST/INFO through the tuple parser and
/// the ID3 chunk into the inner tag.
pub fn read_tag<R: Read + Seek>(reader: &mut R, path: &Path, version: Id3Version) -> Result<WavTag> {
    let file_len = reader.seek(SeekFrom::End(0))?;
    read_riff_header(reader, path)?;

    let mut tag = WavTag::new(version);
    walk_chunks(reader, ByteOrder::Little, file_len, path, |header, reader| {
        tag.chunk_summaries.push(ChunkSummary::from(header));
        match WavChunkType::get(&header.id) {
            Some(WavChunkType::List) => read_list_chunk(&mut tag, header, reader, path),
            Some(WavChunkType::Id3) => read_id3_chunk(&mut tag, header, reader, path),
            _ => Ok(ChunkStatus::Skipped),
        }
    })?;
    Ok(tag)
}

fn read_list_chunk<R: Read + Seek>(
    tag: &mut WavTag,
    header: &ChunkHeader,
    reader: &mut R,
    path: &Path,
) -> Result<ChunkStatus> {
    if header.size < TYPE_LENGTH as u64 {
        return Ok(ChunkStatus::Skipped);
    }
    let data = match read_payload(reader, header) {
        Ok(data) => data,
        Err(e) => {
            warn!("{}: unable to read LIST chunk: {}", path.display(), e);
            return Ok(ChunkStatus::Skipped);
        }
    };
    if &data[..TYPE_LENGTH] != INFO_TYPE {
        debug!("{}: skipping LIST chunk of another type", path.display());
        return Ok(ChunkStatus::Skipped);
    }
    if tag.info.is_some() {
        warn!("{}: ignoring additional LIST INFO chunk at {}", path.display(), header.start_location);
        return Ok(ChunkStatus::Skipped);
    }

    match read_info_tuples(&data[TYPE_LENGTH..], path) {
        Some(mut info) => {
            info.set_location(header.start_location, header.data_end());
            tag.info = Some(info);
            Ok(ChunkStatus::Parsed)
        }
        None => {
            error!("{}: discarding corrupt LIST INFO chunk at {}", path.display(), header.start_location);
            Ok(ChunkStatus::Skipped)
        }
    }
}

fn read_id3_chunk<R: Read + Seek>(
    tag: &mut WavTag,
    header: &ChunkHeader,
    reader: &mut R,
    path: &Path,
) -> Result<ChunkStatus> {
    if tag.id3.is_some() {
        warn!("{}: ignoring additional ID3 chunk at {}", path.display(), header.start_location);
        return Ok(ChunkStatus::Skipped);
    }
    let parsed = read_payload(reader, header).ok().and_then(|data| Id3v2Tag::parse(&data));
    match parsed {
        Some(id3) => {
            tag.id3 = Some(id3);
            tag.id3_location = Some(Id3ChunkLocation {
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
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id3_value_wins_over_info() {
        let mut tag = WavTag::new(Id3Version::V23);
        let mut info = WavInfoTag::new();
        info.set(FieldKey::Title, "info title").unwrap();
        info.set(FieldKey::Genre, "info genre").unwrap();
        tag.set_info(info);
        let mut id3 = Id3v2Tag::new(Id3Version::V23);
        id3.set(FieldKey::Title, "id3 title").unwrap();
        tag.set_id3(id3);

        assert_eq!(tag.get(FieldKey::Title).as_deref(), Some("id3 title"));
        assert_eq!(tag.get(FieldKey::Genre).as_deref(), Some("info genre"));
    }

    #[test]
    fn set_reaches_both_blocks() {
        let mut tag = WavTag::new(Id3Version::V24);
        tag.set(FieldKey::Artist, "Both").unwrap();
        tag.set(FieldKey::Rating, "5").unwrap();

        assert_eq!(tag.info().unwrap().value(FieldKey::Artist), Some("Both"));
        assert_eq!(tag.id3().unwrap().get(FieldKey::Artist).as_deref(), Some("Both"));
        assert_eq!(tag.get(FieldKey::Rating).as_deref(), Some("5"));
        assert_eq!(tag.id3().unwrap().version(), Id3Version::V24);

        tag.remove(FieldKey::Artist);
        tag.remove(FieldKey::Rating);
        assert!(tag.is_empty());
    }

    #[test]
    fn info_rejects_embedded_nul() {
        let mut info = WavInfoTag::new();
        let err = info.set(FieldKey::Title, "a\0b").unwrap_err();
        assert!(matches!(err, Error::InvalidFieldValue { .. }));
    }

    #[test]
    fn unrecognised_tuples_count_as_fields() {
        let mut info = WavInfoTag::new();
        assert!(info.is_empty());
        info.add_unrecognised("IXXX".to_string(), "foo".to_string());
        assert!(!info.is_empty());
        assert_eq!(info.fields(), Vec::new());
    }
}
