// Options passed explicitly into every read, write and delete

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::Result;

/// ID3v2 revision used when an embedded ID3 tag is (re)serialised
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Id3Version {
    #[default]
    V23,
    V24,
}

impl Id3Version {
    pub fn major(self) -> u8 {
        match self {
            Id3Version::V23 => 3,
            Id3Version::V24 => 4,
        }
    }
}

/// Which metadata blocks a WAV write emits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WavSaveMode {
    /// Only the LIST/INFO chunk
    Info,
    /// Only the embedded ID3 chunk
    Id3,
    /// Both, INFO first
    #[default]
    Both,
}

impl WavSaveMode {
    pub fn saves_info(self) -> bool {
        matches!(self, WavSaveMode::Info | WavSaveMode::Both)
    }

    pub fn saves_id3(self) -> bool {
        matches!(self, WavSaveMode::Id3 | WavSaveMode::Both)
    }
}

/// Immutable tag options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TagOptions {
    /// Refuse to write files whose permissions say they are read-only
    pub check_is_writable: bool,
    /// Commit by copying into the existing file (keeps inode) instead of rename-swap
    pub preserve_file_identity: bool,
    pub id3_version: Id3Version,
    pub wav_save: WavSaveMode,
}

impl Default for TagOptions {
    fn default() -> Self {
        TagOptions {
            check_is_writable: true,
            preserve_file_identity: true,
            id3_version: Id3Version::V23,
            wav_save: WavSaveMode::Both,
        }
    }
}

impl TagOptions {
    /// Load options from a JSON file; missing keys keep their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e).into())
    }

    pub fn with_preserve_file_identity(mut self, preserve: bool) -> Self {
        self.preserve_file_identity = preserve;
        self
    }

    pub fn with_check_is_writable(mut self, check: bool) -> Self {
        self.check_is_writable = check;
        self
    }

    pub fn with_id3_version(mut self, version: Id3Version) -> Self {
        self.id3_version = version;
        self
    }

    pub fn with_wav_save(mut self, mode: WavSaveMode) -> Self {
        self.wav_save = mode;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let options: TagOptions =
            serde_json::from_str(r#"{"preserve_file_identity": false, "id3_version": "v24"}"#).unwrap();
        assert!(!options.preserve_file_identity);
        assert!(options.check_is_writable);
        assert_eq!(options.id3_version, Id3Version::V24);
        assert_eq!(options.wav_save, WavSaveMode::Both);
    }

    #[test]
    fn save_mode_flags() {
        assert!(WavSaveMode::Both.saves_info() && WavSaveMode::Both.saves_id3());
        assert!(!WavSaveMode::Info.saves_id3());
        assert!(!WavSaveMode::Id3.saves_info());
    }
}
