// AIFF serializer: rewrites the FORM with the ID3 chunk replaced

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;
use tracing::debug;

use super::info_reader::read_form_header;
use super::tag::{is_id3_chunk, misaligned_id3_shift, AiffTag, ID3_CHUNK_IDS};
use crate::config::TagOptions;
use crate::error::{Error, Result};
use crate::iff::{copy_chunk, walk_chunks, write_chunk, ChunkStatus, ContainerHeader, CHUNK_HEADER_SIZE};
use crate::tag::Tag;
use crate::utils::io::{write_u32, ByteOrder};

/// Largest payload a 32-bit size field can describe
const MAX_FORM_SIZE: u64 = i32::MAX as u64;

/// Binds an [`AiffTag`] to the write engine
pub struct AiffTagSerializer<'a> {
    tag: &'a AiffTag,
}

impl<'a> AiffTagSerializer<'a> {
    pub fn new(tag: &'a AiffTag) -> Self {
        AiffTagSerializer { tag }
    }
}

impl crate::writer::TagSerializer for AiffTagSerializer<'_> {
    fn is_empty(&self) -> bool {
        self.tag.is_empty()
    }

    fn write_tag(&self, source: &mut File, target: &mut File, _options: &TagOptions, path: &Path) -> Result<()> {
        let mut writer = BufWriter::new(target);
        write_tag(self.tag, &mut BufReader::new(source), &mut writer, path)?;
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

/// Copy every chunk except ID3 chunks, then append the tag as a new `ID3 ` chunk
pub fn write_tag<R, W>(tag: &AiffTag, source: &mut R, target: &mut W, path: &Path) -> Result<()>
where
    R: Read + Seek,
    W: Write + Seek,
{
    let id3 = tag.id3().filter(|id3| !id3.is_empty()).map(|id3| id3.to_bytes());
    rewrite(source, target, path, id3.as_deref())
}

/// Copy every chunk except ID3 chunks
pub fn delete_tag<R, W>(source: &mut R, target: &mut W, path: &Path) -> Result<()>
where
    R: Read + Seek,
    W: Write + Seek,
{
    rewrite(source, target, path, None)
}

fn rewrite<R, W>(source: &mut R, target: &mut W, path: &Path, id3: Option<&[u8]>) -> Result<()>
where
    R: Read + Seek,
    W: Write + Seek,
{
    let file_len = source.seek(SeekFrom::End(0))?;
    let (container, _) = read_form_header(source, path)?;
    // An ID3 chunk written off the even boundary ends the sequence and is
    // replaced like any other ID3 chunk
    let mut chunks = Vec::new();
    walk_chunks(source, ByteOrder::Big, file_len, path, |header, _| {
        if misaligned_id3_shift(&header.id).is_some() {
            debug!("{}: dropping misaligned ID3 chunk near {}", path.display(), header.start_location);
            return Ok(ChunkStatus::Last);
        }
        chunks.push(header.clone());
        Ok(ChunkStatus::Skipped)
    })?;

    target.write_all(&container.id)?;
    write_u32(target, 0, ByteOrder::Big)?;
    target.write_all(&container.form_type)?;

    let mut written = ContainerHeader::SIZE;
    for chunk in &chunks {
        if is_id3_chunk(&chunk.id) {
            debug!("{}: dropping {} chunk at {}", path.display(), chunk.id_string(), chunk.start_location);
            continue;
        }
        written += copy_chunk(source, target, chunk, ByteOrder::Big)?;
    }

    if let Some(id3) = id3 {
        written += write_chunk(target, ID3_CHUNK_IDS[0], id3, ByteOrder::Big)?;
    }

    let form_size = written - CHUNK_HEADER_SIZE;
    if form_size > MAX_FORM_SIZE {
        return Err(Error::write_failed(
            path,
            format!("new FORM size {} does not fit the size field", form_size),
            None,
        ));
    }
    target.seek(SeekFrom::Start(4))?;
    write_u32(target, form_size as u32, ByteOrder::Big)?;
    target.seek(SeekFrom::Start(written))?;
    Ok(())
}
