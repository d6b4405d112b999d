// Format detection, the two-phase read template and the file-level facade

use serde::Serialize;
use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::aiff::{AiffFileReader, AiffTag, AiffTagSerializer};
use crate::audio_header::AudioHeader;
use crate::config::TagOptions;
use crate::error::{Error, Result};
use crate::field_mapping::FieldKey;
use crate::fs::{FileSystem, StdFileSystem};
use crate::iff::ChunkSummary;
use crate::tag::Tag;
use crate::utils::io::read_up_to;
use crate::wav::{WavFileReader, WavTag, WavTagSerializer};
use crate::writer::{AudioFileModificationListener, AudioFileWriter, TagSerializer};

/// Files this small cannot hold a header plus any audio
pub const MINIMUM_SIZE: u64 = 100;

/// Supported container formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    Aiff,
    Aifc,
    Wav,
}

impl FileFormat {
    /// Detect the format from the leading magic, falling back to the extension
    pub fn detect<R: Read + Seek>(reader: &mut R, path: &Path) -> Result<Self> {
        reader.seek(SeekFrom::Start(0))?;
        let mut magic = [0u8; 12];
        let read = read_up_to(reader, &mut magic)?;
        reader.seek(SeekFrom::Start(0))?;

        if read == magic.len() {
            match (&magic[0..4], &magic[8..12]) {
                (b"FORM", b"AIFF") => return Ok(FileFormat::Aiff),
                (b"FORM", b"AIFC") => return Ok(FileFormat::Aifc),
                (b"RIFF", b"WAVE") => return Ok(FileFormat::Wav),
                _ => {}
            }
        }

        debug!("{}: no known magic, trying the extension", path.display());
        Self::from_extension(path).ok_or_else(|| Error::UnsupportedFormat { path: path.into() })
    }

    pub fn from_extension(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "aif" | "aiff" => Some(FileFormat::Aiff),
            "aifc" => Some(FileFormat::Aifc),
            "wav" | "wave" => Some(FileFormat::Wav),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileFormat::Aiff => "AIFF",
            FileFormat::Aifc => "AIFF-C",
            FileFormat::Wav => "WAV",
        }
    }
}

/// Open `path` for reading after the read preconditions.
///
/// No payload is read: missing files, unreadable files and files of at most
/// [`MINIMUM_SIZE`] bytes are rejected first.
pub fn open_checked(fs: &dyn FileSystem, path: &Path) -> Result<File> {
    let file = fs.open_read(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => Error::NotFound { path: path.into() },
        io::ErrorKind::PermissionDenied => Error::NoReadPermission { path: path.into() },
        _ => Error::Io(e),
    })?;
    let len = fs.len(path)?;
    if len <= MINIMUM_SIZE {
        return Err(Error::TooSmall { path: path.into(), len });
    }
    Ok(file)
}

/// Two-phase reader: structure and audio properties first, then the tag
pub trait AudioFileReader {
    type Tag;

    fn read_audio_header<R: Read + Seek>(&self, reader: &mut R, path: &Path) -> Result<AudioHeader>;

    fn read_tag<R: Read + Seek>(&self, reader: &mut R, path: &Path, options: &TagOptions) -> Result<Self::Tag>;

    /// Both phases over an already opened reader
    fn read_from<R: Read + Seek>(
        &self,
        reader: &mut R,
        path: &Path,
        options: &TagOptions,
    ) -> Result<(AudioHeader, Self::Tag)> {
        let header = self.read_audio_header(reader, path)?;
        let tag = self.read_tag(reader, path, options)?;
        Ok((header, tag))
    }

    /// Check the preconditions, then read both phases
    fn read(&self, fs: &dyn FileSystem, path: &Path, options: &TagOptions) -> Result<(AudioHeader, Self::Tag)> {
        let mut reader = BufReader::new(open_checked(fs, path)?);
        self.read_from(&mut reader, path, options)
    }
}

/// Tag of any supported format
#[derive(Debug, Clone, PartialEq)]
pub enum FileTag {
    Aiff(AiffTag),
    Wav(WavTag),
}

impl FileTag {
    /// Serializer bound to this tag
    pub fn serializer(&self) -> Box<dyn TagSerializer + '_> {
        match self {
            FileTag::Aiff(tag) => Box::new(AiffTagSerializer::new(tag)),
            FileTag::Wav(tag) => Box::new(WavTagSerializer::new(tag)),
        }
    }

    pub fn chunk_summaries(&self) -> &[ChunkSummary] {
        match self {
            FileTag::Aiff(tag) => tag.chunk_summaries(),
            FileTag::Wav(tag) => tag.chunk_summaries(),
        }
    }

    fn as_tag(&self) -> &dyn Tag {
        match self {
            FileTag::Aiff(tag) => tag,
            FileTag::Wav(tag) => tag,
        }
    }

    fn as_tag_mut(&mut self) -> &mut dyn Tag {
        match self {
            FileTag::Aiff(tag) => tag,
            FileTag::Wav(tag) => tag,
        }
    }
}

impl Tag for FileTag {
    fn format_name(&self) -> &'static str {
        self.as_tag().format_name()
    }

    fn get(&self, key: FieldKey) -> Option<String> {
        self.as_tag().get(key)
    }

    fn set(&mut self, key: FieldKey, value: &str) -> Result<()> {
        self.as_tag_mut().set(key, value)
    }

    fn remove(&mut self, key: FieldKey) {
        self.as_tag_mut().remove(key)
    }

    fn field_count(&self) -> usize {
        self.as_tag().field_count()
    }
}

/// A read audio file: its audio properties and its tag
#[derive(Debug, Clone)]
pub struct AudioFile {
    path: PathBuf,
    format: FileFormat,
    header: AudioHeader,
    tag: FileTag,
}

impl AudioFile {
    /// Read a file from disk
    pub fn read(path: impl AsRef<Path>, options: &TagOptions) -> Result<Self> {
        Self::read_with(&StdFileSystem, path.as_ref(), options)
    }

    pub fn read_with(fs: &dyn FileSystem, path: &Path, options: &TagOptions) -> Result<Self> {
        let mut reader = BufReader::new(open_checked(fs, path)?);
        let format = FileFormat::detect(&mut reader, path)?;
        debug!("{}: detected {}", path.display(), format.as_str());

        let (header, tag) = match format {
            FileFormat::Aiff | FileFormat::Aifc => {
                let (header, tag) = AiffFileReader.read_from(&mut reader, path, options)?;
                (header, FileTag::Aiff(tag))
            }
            FileFormat::Wav => {
                let (header, tag) = WavFileReader.read_from(&mut reader, path, options)?;
                (header, FileTag::Wav(tag))
            }
        };

        Ok(AudioFile {
            path: path.to_path_buf(),
            format,
            header,
            tag,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> FileFormat {
        self.format
    }

    pub fn audio_header(&self) -> &AudioHeader {
        &self.header
    }

    pub fn tag(&self) -> &FileTag {
        &self.tag
    }

    pub fn tag_mut(&mut self) -> &mut FileTag {
        &mut self.tag
    }

    /// Write the current tag back to the file
    pub fn save(&self, options: &TagOptions) -> Result<()> {
        self.save_with(&AudioFileWriter::new(&StdFileSystem), options)
    }

    pub fn save_with(&self, writer: &AudioFileWriter<'_>, options: &TagOptions) -> Result<()> {
        writer.write(&self.path, &*self.tag.serializer(), options)
    }

    /// Save, notifying `listener` around the write
    pub fn save_notifying(&self, listener: &dyn AudioFileModificationListener, options: &TagOptions) -> Result<()> {
        self.save_with(&AudioFileWriter::new(&StdFileSystem).with_listener(listener), options)
    }

    /// Remove the tag from the file
    pub fn delete_tag(&mut self, options: &TagOptions) -> Result<()> {
        self.delete_tag_with(&AudioFileWriter::new(&StdFileSystem), options)
    }

    pub fn delete_tag_with(&mut self, writer: &AudioFileWriter<'_>, options: &TagOptions) -> Result<()> {
        writer.delete(&self.path, &*self.tag.serializer(), options)?;
        self.tag = match self.format {
            FileFormat::Aiff | FileFormat::Aifc => FileTag::Aiff(AiffTag::new(options.id3_version)),
            FileFormat::Wav => FileTag::Wav(WavTag::new(options.id3_version)),
        };
        Ok(())
    }
}
