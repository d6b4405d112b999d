// WAV support
//
// Metadata lives in a LIST chunk of type INFO, an `id3 ` chunk, or both.

use std::io::{Read, Seek};
use std::path::Path;

use crate::audio_file::AudioFileReader;
use crate::audio_header::AudioHeader;
use crate::config::TagOptions;
use crate::error::Result;

pub mod chunk;
pub mod info_chunk;
pub mod info_reader;
pub mod tag;
pub mod writer;

pub use tag::{WavInfoTag, WavTag};
pub use writer::WavTagSerializer;

/// Reads audio and metadata information from WAV files
#[derive(Debug, Clone, Copy, Default)]
pub struct WavFileReader;

impl AudioFileReader for WavFileReader {
    type Tag = WavTag;

    fn read_audio_header<R: Read + Seek>(&self, reader: &mut R, path: &Path) -> Result<AudioHeader> {
        info_reader::read_audio_header(reader, path)
    }

    fn read_tag<R: Read + Seek>(&self, reader: &mut R, path: &Path, options: &TagOptions) -> Result<WavTag> {
        tag::read_tag(reader, path, options.id3_version)
    }
}
