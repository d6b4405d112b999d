// Error types shared by the readers, the tag model and the write engine

use std::io;
use std::path::PathBuf;

use crate::field_mapping::FieldKey;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{}: file not found", path.display())]
    NotFound { path: PathBuf },

    #[error("{}: no permission to read file", path.display())]
    NoReadPermission { path: PathBuf },

    #[error("{}: file is too small to be a valid audio file ({len} bytes)", path.display())]
    TooSmall { path: PathBuf, len: u64 },

    #[error("{}: unsupported or unrecognised file format", path.display())]
    UnsupportedFormat { path: PathBuf },

    /// A declared size or a chunk payload that no conforming file can contain.
    #[error("{}: corrupt file: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },

    #[error("{}: file is not writable", path.display())]
    NotWritable { path: PathBuf },

    #[error("{}: write failed: {reason}", path.display())]
    WriteFailed {
        path: PathBuf,
        reason: String,
        #[source]
        source: Option<io::Error>,
    },

    #[error("{}: file is locked by another writer", path.display())]
    FileLocked { path: PathBuf },

    #[error("{}: modification vetoed: {reason}", path.display())]
    Vetoed { path: PathBuf, reason: String },

    /// The original file has been renamed to `backup` and could not be renamed back.
    #[error(
        "{}: write failed and the original could not be restored, it remains at {}",
        path.display(),
        backup.display()
    )]
    RollbackFailed {
        path: PathBuf,
        backup: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("field {key} is not supported by {format} tags")]
    FieldNotSupported { key: FieldKey, format: &'static str },

    #[error("invalid value for field {key}: {reason}")]
    InvalidFieldValue { key: FieldKey, reason: String },

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    pub(crate) fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::Corrupt {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn write_failed(
        path: impl Into<PathBuf>,
        reason: impl Into<String>,
        source: Option<io::Error>,
    ) -> Self {
        Error::WriteFailed {
            path: path.into(),
            reason: reason.into(),
            source,
        }
    }

    /// True for a caller-initiated abort rather than a failure.
    pub fn is_veto(&self) -> bool {
        matches!(self, Error::Vetoed { .. })
    }
}
