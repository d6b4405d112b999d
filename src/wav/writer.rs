// WAV serializer: rewrites the RIFF with new LIST/INFO and ID3 chunks

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;
use tracing::debug;

use super::chunk::WavChunkType;
use super::info_chunk::{info_payload, INFO_TYPE, LIST_ID};
use super::info_reader::read_riff_header;
use super::tag::WavTag;
use crate::config::{TagOptions, WavSaveMode};
use crate::error::{Error, Result};
use crate::iff::{copy_chunk, list_chunks, write_chunk, ChunkHeader, ContainerHeader, CHUNK_HEADER_SIZE, TYPE_LENGTH};
use crate::tag::Tag;
use crate::utils::io::{write_u32, ByteOrder};

/// ID3 chunk id used when writing WAV files
pub const WAV_ID3_ID: &[u8; 4] = b"id3 ";

const MAX_RIFF_SIZE: u64 = i32::MAX as u64;

/// Binds a [`WavTag`] to the write engine
pub struct WavTagSerializer<'a> {
    tag: &'a WavTag,
}

impl<'a> WavTagSerializer<'a> {
    pub fn new(tag: &'a WavTag) -> Self {
        WavTagSerializer { tag }
    }
}

impl crate::writer::TagSerializer for WavTagSerializer<'_> {
    fn is_empty(&self) -> bool {
        self.tag.is_empty()
    }

    fn write_tag(&self, source: &mut File, target: &mut File, options: &TagOptions, path: &Path) -> Result<()> {
        let mut writer = BufWriter::new(target);
        write_tag(self.tag, options.wav_save, &mut BufReader::new(source), &mut writer, path)?;
        writer.flush()?;
        Ok(())
    }

    fn delete_tag(&self, source: &mut File, target: &mut File, path: &Path) -> Result<()> {
        let mut writer = BufWriter::new(target);
        delete_tag(&mut BufReader::new(source), &mut writer, path)?;
        writer.flush()?;
        Ok(())
    }
}

/// Copy every chunk except LIST/INFO and ID3, then append the blocks `mode` selects
pub fn write_tag<R, W>(tag: &WavTag, mode: WavSaveMode, source: &mut R, target: &mut W, path: &Path) -> Result<()>
where
    R: Read + Seek,
    W: Write + Seek,
{
    let info = match tag.info() {
        Some(info) if mode.saves_info() && !info.is_empty() => Some(info_payload(info)?),
        _ => None,
    };
    let id3 = match tag.id3() {
        Some(id3) if mode.saves_id3() && !id3.is_empty() => Some(id3.to_bytes()),
        _ => None,
    };
    rewrite(source, target, path, info.as_deref(), id3.as_deref())
}

/// Copy every chunk except LIST/INFO and ID3
pub fn delete_tag<R, W>(source: &mut R, target: &mut W, path: &Path) -> Result<()>
where
    R: Read + Seek,
    W: Write + Seek,
{
    rewrite(source, target, path, None, None)
}

fn rewrite<R, W>(source: &mut R, target: &mut W, path: &Path, info: Option<&[u8]>, id3: Option<&[u8]>) -> Result<()>
where
    R: Read + Seek,
    W: Write + Seek,
{
    let file_len = source.seek(SeekFrom::End(0))?;
    let container = read_riff_header(source, path)?;
    let chunks = list_chunks(source, ByteOrder::Little, file_len, path)?;

    target.write_all(&container.id)?;
    write_u32(target, 0, ByteOrder::Little)?;
    target.write_all(&container.form_type)?;

    let mut written = ContainerHeader::SIZE;
    for chunk in &chunks {
        if is_tag_chunk(source, chunk)? {
            debug!("{}: dropping {} chunk at {}", path.display(), chunk.id_string(), chunk.start_location);
            continue;
        }
        written += copy_chunk(source, target, chunk, ByteOrder::Little)?;
    }

    if let Some(info) = info {
        written += write_chunk(target, LIST_ID, info, ByteOrder::Little)?;
    }
    if let Some(id3) = id3 {
        written += write_chunk(target, WAV_ID3_ID, id3, ByteOrder::Little)?;
    }

    let riff_size = written - CHUNK_HEADER_SIZE;
    if riff_size > MAX_RIFF_SIZE {
        return Err(Error::write_failed(
            path,
            format!("new RIFF size {} does not fit the size field", riff_size),
            None,
        ));
    }
    target.seek(SeekFrom::Start(4))?;
    write_u32(target, riff_size as u32, ByteOrder::Little)?;
    target.seek(SeekFrom::Start(written))?;
    Ok(())
}

/// ID3 chunks and LIST chunks of type INFO are replaced on write
fn is_tag_chunk<R: Read + Seek>(source: &mut R, chunk: &ChunkHeader) -> Result<bool> {
    match WavChunkType::get(&chunk.id) {
        Some(WavChunkType::Id3) => Ok(true),
        Some(WavChunkType::List) if chunk.size >= TYPE_LENGTH as u64 => {
            source.seek(SeekFrom::Start(chunk.data_start()))?;
            let mut list_type = [0u8; 4];
            source.read_exact(&mut list_type)?;
            Ok(&list_type == INFO_TYPE)
        }
        _ => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Id3Version;
    use crate::field_mapping::FieldKey;
    use crate::wav::tag::read_tag;
    use std::io::Cursor;

    fn wav_file(extra: &[(&[u8; 4], Vec<u8>)]) -> Vec<u8> {
        let mut body = Vec::new();
        write_chunk(&mut body, b"fmt ", &[0u8; 16], ByteOrder::Little).unwrap();
        write_chunk(&mut body, b"data", &[5u8; 41], ByteOrder::Little).unwrap();
        for (id, payload) in extra {
            write_chunk(&mut body, id, payload, ByteOrder::Little).unwrap();
        }
        let mut out = b"RIFF".to_vec();
        out.extend_from_slice(&(body.len() as u32 + 4).to_le_bytes());
        out.extend_from_slice(b"WAVE");
        out.extend(body);
        out
    }

    fn write(source: &[u8], tag: &WavTag, mode: WavSaveMode) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        write_tag(tag, mode, &mut Cursor::new(source.to_vec()), &mut out, Path::new("t.wav")).unwrap();
        out.into_inner()
    }

    fn read(data: &[u8]) -> WavTag {
        read_tag(&mut Cursor::new(data.to_vec()), Path::new("t.wav"), Id3Version::V23).unwrap()
    }

    #[test]
    fn writes_info_and_id3_blocks() {
        let original = wav_file(&[]);
        let mut tag = read(&original);
        tag.set(FieldKey::Title, "Title").unwrap();
        tag.set(FieldKey::Artist, "Artist").unwrap();

        let written = write(&original, &tag, WavSaveMode::Both);
        let riff_size = u32::from_le_bytes([written[4], written[5], written[6], written[7]]) as usize;
        assert_eq!(riff_size + 8, written.len());

        let reread = read(&written);
        assert!(reread.is_existing_info_tag());
        assert!(reread.is_existing_id3_tag());
        assert_eq!(reread.info().unwrap().value(FieldKey::Title), Some("Title"));
        assert_eq!(reread.id3().unwrap().get(FieldKey::Artist).as_deref(), Some("Artist"));
    }

    #[test]
    fn save_mode_selects_blocks() {
        let original = wav_file(&[]);
        let mut tag = read(&original);
        tag.set(FieldKey::Album, "Album").unwrap();

        let info_only = read(&write(&original, &tag, WavSaveMode::Info));
        assert!(info_only.info().is_some());
        assert!(info_only.id3().is_none());

        let id3_only = read(&write(&original, &tag, WavSaveMode::Id3));
        assert!(id3_only.info().is_none());
        assert_eq!(id3_only.get(FieldKey::Album).as_deref(), Some("Album"));
    }

    #[test]
    fn other_list_types_are_kept() {
        let mut adtl = b"adtl".to_vec();
        adtl.extend_from_slice(b"labl\x04\x00\x00\x00abcd");
        let original = wav_file(&[(b"LIST", adtl.clone())]);
        let mut tag = read(&original);
        tag.set(FieldKey::Title, "x").unwrap();

        let written = write(&original, &tag, WavSaveMode::Info);
        let lists: Vec<_> = read(&written)
            .chunk_summaries()
            .iter()
            .filter(|chunk| chunk.id == "LIST")
            .cloned()
            .collect();
        assert_eq!(lists.len(), 2);
        assert!(written.windows(adtl.len()).any(|window| window == adtl.as_slice()));
    }

    #[test]
    fn delete_removes_tag_chunks() {
        let original = wav_file(&[]);
        let mut tag = read(&original);
        tag.set(FieldKey::Genre, "Jazz").unwrap();
        let tagged = write(&original, &tag, WavSaveMode::Both);

        let mut out = Cursor::new(Vec::new());
        delete_tag(&mut Cursor::new(tagged), &mut out, Path::new("t.wav")).unwrap();
        assert_eq!(out.into_inner(), original);
    }
}
