// AIFF and AIFF-C support
//
// Audio properties come from the structural pass in `info_reader`; the tag is
// an ID3v2 tag stored in an `ID3 ` chunk.

use std::io::{Read, Seek};
use std::path::Path;

use crate::audio_file::AudioFileReader;
use crate::audio_header::AudioHeader;
use crate::config::TagOptions;
use crate::error::Result;

pub mod chunk;
pub mod info_reader;
pub mod tag;
pub mod writer;

pub use chunk::{AiffChunk, AiffChunkType};
pub use tag::AiffTag;
pub use writer::AiffTagSerializer;

/// Reads audio and metadata information from AIFF files
#[derive(Debug, Clone, Copy, Default)]
pub struct AiffFileReader;

impl AudioFileReader for AiffFileReader {
    type Tag = AiffTag;

    fn read_audio_header<R: Read + Seek>(&self, reader: &mut R, path: &Path) -> Result<AudioHeader> {
        info_reader::read_audio_header(reader, path)
    }

    fn read_tag<R: Read + Seek>(&self, reader: &mut R, path: &Path, options: &TagOptions) -> Result<AiffTag> {
        tag::read_tag(reader, path, options.id3_version)
    }
}
