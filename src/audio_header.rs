// Audio properties accumulated while walking a container's chunks

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

/// Bits per byte, used when deriving a bit rate
const BITS_IN_BYTE: f64 = 8.0;
/// Bits per kilobit
const KILOBIT: f64 = 1000.0;

/// Structural and audio information read in the first phase of a read.
///
/// Chunk handlers write into this record as they are decoded, so fields are
/// optional until the chunk that establishes them has been seen.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AudioHeader {
    /// Human-readable encoding, e.g. "AIFF", "AIFC sowt" or "WAV PCM"
    pub encoding_type: Option<String>,
    pub channels: Option<u16>,
    pub sample_rate: Option<u32>,
    pub bits_per_sample: Option<u16>,
    pub sample_frames: Option<u64>,
    pub lossless: Option<bool>,
    pub audio_data_length: Option<u64>,
    pub audio_data_start: Option<u64>,
    pub audio_data_end: Option<u64>,
    /// Track length in seconds
    pub precise_track_length: Option<f64>,
    bit_rate: Option<f64>,
    /// Offset of a malformed chunk that stopped the structural parse; fields
    /// established by later chunks are missing
    pub aborted_at: Option<u64>,
    /// Decoded AIFF informational chunks; `None` for other formats
    pub aiff: Option<AiffInfo>,
}

impl AudioHeader {
    /// Bit rate in kbit/s, only known once both data length and track length are
    pub fn bit_rate(&self) -> Option<f64> {
        self.bit_rate
    }

    /// Rounded bit rate in kbit/s
    pub fn bit_rate_kbps(&self) -> Option<u32> {
        self.bit_rate.map(|rate| rate.round() as u32)
    }

    pub fn track_length(&self) -> Option<Duration> {
        self.precise_track_length.map(Duration::from_secs_f64)
    }

    /// Record where the audio payload lives without reading it
    pub fn set_audio_data(&mut self, start: u64, length: u64) {
        self.audio_data_length = Some(length);
        self.audio_data_start = Some(start);
        self.audio_data_end = Some(start + length);
    }

    /// Derive the bit rate from data length and track length.
    ///
    /// Left unset unless both are known and the track length is positive.
    pub fn derive_bit_rate(&mut self) {
        if let (Some(length), Some(seconds)) = (self.audio_data_length, self.precise_track_length) {
            if seconds > 0.0 {
                self.bit_rate = Some(length as f64 * BITS_IN_BYTE / (seconds * KILOBIT));
            }
        }
    }
}

/// Comment record from an AIFF COMT chunk
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AiffComment {
    pub timestamp: Option<DateTime<Utc>>,
    pub marker_id: i16,
    pub text: String,
}

/// Informational AIFF chunks
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AiffInfo {
    pub form_type: String,
    pub format_version: Option<DateTime<Utc>>,
    pub compression_type: Option<String>,
    pub compression_name: Option<String>,
    pub applications: Vec<String>,
    pub name: Option<String>,
    pub author: Option<String>,
    pub copyright: Option<String>,
    pub annotations: Vec<String>,
    pub comments: Vec<AiffComment>,
}
