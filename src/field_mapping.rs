// Semantic field mapping
//
// Each container stores the same logical fields under its own codes:
// - WAV LIST/INFO: four character tuple codes (INAM, IART, IPRD, etc.)
// - ID3v2 (embedded in AIFF and WAV): frame ids (TIT2, TPE1, TALB, etc.)
//
// The lookups here are closed: a code either maps to exactly one key or it is
// kept by the caller as an unrecognised field.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::Id3Version;

/// Semantic metadata fields understood by every tag type in the crate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKey {
    Title,
    Artist,
    Album,
    AlbumArtist,
    Year,
    Track,
    Genre,
    Comment,
    Composer,
    Conductor,
    Lyricist,
    Encoder,
    Rating,
    Isrc,
    RecordLabel,
    Copyright,
}

impl FieldKey {
    /// Every key, in the order fields are emitted when a tag is serialised.
    pub const ALL: [FieldKey; 16] = [
        FieldKey::Title,
        FieldKey::Artist,
        FieldKey::Album,
        FieldKey::AlbumArtist,
        FieldKey::Year,
        FieldKey::Track,
        FieldKey::Genre,
        FieldKey::Comment,
        FieldKey::Composer,
        FieldKey::Conductor,
        FieldKey::Lyricist,
        FieldKey::Encoder,
        FieldKey::Rating,
        FieldKey::Isrc,
        FieldKey::RecordLabel,
        FieldKey::Copyright,
    ];

    /// Get standard field name (lowercase)
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKey::Title => "title",
            FieldKey::Artist => "artist",
            FieldKey::Album => "album",
            FieldKey::AlbumArtist => "album_artist",
            FieldKey::Year => "year",
            FieldKey::Track => "track",
            FieldKey::Genre => "genre",
            FieldKey::Comment => "comment",
            FieldKey::Composer => "composer",
            FieldKey::Conductor => "conductor",
            FieldKey::Lyricist => "lyricist",
            FieldKey::Encoder => "encoder",
            FieldKey::Rating => "rating",
            FieldKey::Isrc => "isrc",
            FieldKey::RecordLabel => "record_label",
            FieldKey::Copyright => "copyright",
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        FieldKey::ALL
            .iter()
            .copied()
            .find(|key| key.as_str() == normalized)
            .ok_or_else(|| format!("unknown field '{}'", s))
    }
}

/// Format-specific field codes
pub struct FieldMappings;

impl FieldMappings {
    // WAV LIST/INFO codes
    pub const INFO_TITLE: &'static str = "INAM";
    pub const INFO_ARTIST: &'static str = "IART";
    pub const INFO_ALBUM: &'static str = "IPRD";
    pub const INFO_ALBUM_ARTIST: &'static str = "iaar";
    pub const INFO_YEAR: &'static str = "ICRD";
    pub const INFO_TRACK: &'static str = "ITRK";
    pub const INFO_GENRE: &'static str = "IGNR";
    pub const INFO_COMMENT: &'static str = "ICMT";
    pub const INFO_COMPOSER: &'static str = "IMUS";
    pub const INFO_CONDUCTOR: &'static str = "ITCH";
    pub const INFO_LYRICIST: &'static str = "IWRI";
    pub const INFO_ENCODER: &'static str = "ISFT";
    pub const INFO_RATING: &'static str = "IRTD";
    pub const INFO_ISRC: &'static str = "ISRC";
    pub const INFO_RECORD_LABEL: &'static str = "ICMS";
    pub const INFO_COPYRIGHT: &'static str = "ICOP";

    // ID3v2 frame ids
    pub const ID3V2_TITLE: &'static str = "TIT2";
    pub const ID3V2_ARTIST: &'static str = "TPE1";
    pub const ID3V2_ALBUM: &'static str = "TALB";
    pub const ID3V2_ALBUM_ARTIST: &'static str = "TPE2";
    pub const ID3V23_YEAR: &'static str = "TYER";
    pub const ID3V24_YEAR: &'static str = "TDRC";
    pub const ID3V2_TRACK: &'static str = "TRCK";
    pub const ID3V2_GENRE: &'static str = "TCON";
    pub const ID3V2_COMMENT: &'static str = "COMM";
    pub const ID3V2_COMPOSER: &'static str = "TCOM";
    pub const ID3V2_CONDUCTOR: &'static str = "TPE3";
    pub const ID3V2_LYRICIST: &'static str = "TEXT";
    pub const ID3V2_ENCODER: &'static str = "TENC";
    pub const ID3V2_ISRC: &'static str = "TSRC";
    pub const ID3V2_RECORD_LABEL: &'static str = "TPUB";
    pub const ID3V2_COPYRIGHT: &'static str = "TCOP";

    /// Get the INFO tuple code for a field
    pub fn to_wav_info(key: FieldKey) -> &'static str {
        match key {
            FieldKey::Title => Self::INFO_TITLE,
            FieldKey::Artist => Self::INFO_ARTIST,
            FieldKey::Album => Self::INFO_ALBUM,
            FieldKey::AlbumArtist => Self::INFO_ALBUM_ARTIST,
            FieldKey::Year => Self::INFO_YEAR,
            FieldKey::Track => Self::INFO_TRACK,
            FieldKey::Genre => Self::INFO_GENRE,
            FieldKey::Comment => Self::INFO_COMMENT,
            FieldKey::Composer => Self::INFO_COMPOSER,
            FieldKey::Conductor => Self::INFO_CONDUCTOR,
            FieldKey::Lyricist => Self::INFO_LYRICIST,
            FieldKey::Encoder => Self::INFO_ENCODER,
            FieldKey::Rating => Self::INFO_RATING,
            FieldKey::Isrc => Self::INFO_ISRC,
            FieldKey::RecordLabel => Self::INFO_RECORD_LABEL,
            FieldKey::Copyright => Self::INFO_COPYRIGHT,
        }
    }

    /// Convert an INFO tuple code to a field
    pub fn from_wav_info(code: &str) -> Option<FieldKey> {
        match code {
            Self::INFO_TITLE => Some(FieldKey::Title),
            Self::INFO_ARTIST => Some(FieldKey::Artist),
            Self::INFO_ALBUM => Some(FieldKey::Album),
            Self::INFO_ALBUM_ARTIST => Some(FieldKey::AlbumArtist),
            Self::INFO_YEAR => Some(FieldKey::Year),
            Self::INFO_TRACK | "IPRT" => Some(FieldKey::Track), // IPRT is written by some older taggers
            Self::INFO_GENRE => Some(FieldKey::Genre),
            Self::INFO_COMMENT => Some(FieldKey::Comment),
            Self::INFO_COMPOSER => Some(FieldKey::Composer),
            Self::INFO_CONDUCTOR => Some(FieldKey::Conductor),
            Self::INFO_LYRICIST => Some(FieldKey::Lyricist),
            Self::INFO_ENCODER => Some(FieldKey::Encoder),
            Self::INFO_RATING => Some(FieldKey::Rating),
            Self::INFO_ISRC => Some(FieldKey::Isrc),
            Self::INFO_RECORD_LABEL => Some(FieldKey::RecordLabel),
            Self::INFO_COPYRIGHT => Some(FieldKey::Copyright),
            _ => None,
        }
    }

    /// Get the ID3v2 frame id for a field, `None` for fields that have no text frame
    pub fn to_id3v2(key: FieldKey, version: Id3Version) -> Option<&'static str> {
        let id = match key {
            FieldKey::Title => Self::ID3V2_TITLE,
            FieldKey::Artist => Self::ID3V2_ARTIST,
            FieldKey::Album => Self::ID3V2_ALBUM,
            FieldKey::AlbumArtist => Self::ID3V2_ALBUM_ARTIST,
            FieldKey::Year => match version {
                Id3Version::V23 => Self::ID3V23_YEAR,
                Id3Version::V24 => Self::ID3V24_YEAR,
            },
            FieldKey::Track => Self::ID3V2_TRACK,
            FieldKey::Genre => Self::ID3V2_GENRE,
            FieldKey::Comment => Self::ID3V2_COMMENT,
            FieldKey::Composer => Self::ID3V2_COMPOSER,
            FieldKey::Conductor => Self::ID3V2_CONDUCTOR,
            FieldKey::Lyricist => Self::ID3V2_LYRICIST,
            FieldKey::Encoder => Self::ID3V2_ENCODER,
            FieldKey::Rating => return None,
            FieldKey::Isrc => Self::ID3V2_ISRC,
            FieldKey::RecordLabel => Self::ID3V2_RECORD_LABEL,
            FieldKey::Copyright => Self::ID3V2_COPYRIGHT,
        };
        Some(id)
    }

    /// Convert an ID3v2 frame id to a field
    pub fn from_id3v2(frame_id: &str) -> Option<FieldKey> {
        match frame_id {
            Self::ID3V2_TITLE => Some(FieldKey::Title),
            Self::ID3V2_ARTIST => Some(FieldKey::Artist),
            Self::ID3V2_ALBUM => Some(FieldKey::Album),
            Self::ID3V2_ALBUM_ARTIST => Some(FieldKey::AlbumArtist),
            Self::ID3V23_YEAR | Self::ID3V24_YEAR => Some(FieldKey::Year),
            Self::ID3V2_TRACK => Some(FieldKey::Track),
            Self::ID3V2_GENRE => Some(FieldKey::Genre),
            Self::ID3V2_COMMENT => Some(FieldKey::Comment),
            Self::ID3V2_COMPOSER => Some(FieldKey::Composer),
            Self::ID3V2_CONDUCTOR => Some(FieldKey::Conductor),
            Self::ID3V2_LYRICIST => Some(FieldKey::Lyricist),
            Self::ID3V2_ENCODER => Some(FieldKey::Encoder),
            Self::ID3V2_ISRC => Some(FieldKey::Isrc),
            Self::ID3V2_RECORD_LABEL => Some(FieldKey::RecordLabel),
            Self::ID3V2_COPYRIGHT => Some(FieldKey::Copyright),
            _ => None,
        }
    }
}
