//! chunktag - tag reading and crash-safe tag rewriting for AIFF and WAV files
//!
//! Files are read in two phases: a structural walk over the container's chunks
//! that collects audio properties, then a tag pass that decodes the metadata
//! chunks (an `ID3 ` chunk for AIFF, `LIST`/`INFO` and `id3 ` for WAV).
//!
//! Writes never touch the original until a complete new file has been staged
//! next to it. The staged file is then either copied over the original under
//! an advisory lock, keeping the file's identity, or swapped in by rename.
//!
//! ```no_run
//! use chunktag::{AudioFile, FieldKey, Tag, TagOptions};
//!
//! let options = TagOptions::default();
//! let mut file = AudioFile::read("song.wav", &options)?;
//! file.tag_mut().set(FieldKey::Title, "New title")?;
//! file.save(&options)?;
//! # Ok::<(), chunktag::Error>(())
//! ```

pub mod aiff;
pub mod audio_file;
pub mod audio_header;
pub mod config;
pub mod error;
pub mod field_mapping;
pub mod fs;
pub mod id3;
pub mod iff;
pub mod tag;
pub mod utils;
pub mod wav;
pub mod writer;

use std::path::Path;

pub use audio_file::{AudioFile, AudioFileReader, FileFormat, FileTag, MINIMUM_SIZE};
pub use audio_header::{AiffComment, AiffInfo, AudioHeader};
pub use config::{Id3Version, TagOptions, WavSaveMode};
pub use error::{Error, Result};
pub use field_mapping::{FieldKey, FieldMappings};
pub use fs::{FileSystem, StdFileSystem};
pub use iff::ChunkSummary;
pub use tag::Tag;
pub use writer::{AudioFileModificationListener, AudioFileWriter, ModificationHandler, ModifyVeto};

/// Read the audio properties and tag of a file
pub fn read(path: impl AsRef<Path>, options: &TagOptions) -> Result<AudioFile> {
    AudioFile::read(path, options)
}

/// Write `file`'s current tag back to disk
pub fn write(file: &AudioFile, options: &TagOptions) -> Result<()> {
    file.save(options)
}

/// Strip the tag from the file at `path`, leaving the audio untouched
pub fn delete(path: impl AsRef<Path>, options: &TagOptions) -> Result<()> {
    let mut file = AudioFile::read(path, options)?;
    file.delete_tag(options)
}
