// WAV chunk registry and the `fmt `/`fact` decoders

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Cursor;

use crate::audio_header::AudioHeader;

pub const FORMAT_PCM: u16 = 0x0001;
pub const FORMAT_IEEE_FLOAT: u16 = 0x0003;
pub const FORMAT_ALAW: u16 = 0x0006;
pub const FORMAT_MULAW: u16 = 0x0007;
pub const FORMAT_EXTENSIBLE: u16 = 0xFFFE;

/// Top-level RIFF chunks the WAV readers act on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WavChunkType {
    Format,
    Fact,
    Data,
    List,
    Id3,
}

impl WavChunkType {
    pub fn get(id: &[u8; 4]) -> Option<Self> {
        let chunk_type = match id {
            b"fmt " => WavChunkType::Format,
            b"fact" => WavChunkType::Fact,
            b"data" => WavChunkType::Data,
            b"LIST" => WavChunkType::List,
            b"id3 " | b"ID3 " => WavChunkType::Id3,
            _ => return None,
        };
        Some(chunk_type)
    }
}

/// Decoded `fmt ` chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavFormat {
    pub format_code: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    /// Sub-format code of a WAVE_FORMAT_EXTENSIBLE chunk
    pub sub_format: Option<u16>,
}

impl WavFormat {
    /// Decode a `fmt ` payload; `None` if it is shorter than the fixed part
    pub fn parse(data: &[u8]) -> Option<Self> {
        let mut cursor = Cursor::new(data);
        let format_code = cursor.read_u16::<LittleEndian>().ok()?;
        let channels = cursor.read_u16::<LittleEndian>().ok()?;
        let sample_rate = cursor.read_u32::<LittleEndian>().ok()?;
        let byte_rate = cursor.read_u32::<LittleEndian>().ok()?;
        let block_align = cursor.read_u16::<LittleEndian>().ok()?;
        let bits_per_sample = cursor.read_u16::<LittleEndian>().ok()?;

        // cbSize, valid bits, channel mask, then the sub-format GUID
        let sub_format = if format_code == FORMAT_EXTENSIBLE {
            let extension_size = cursor.read_u16::<LittleEndian>().ok()?;
            if extension_size < 22 {
                return None;
            }
            cursor.read_u16::<LittleEndian>().ok()?;
            cursor.read_u32::<LittleEndian>().ok()?;
            Some(cursor.read_u16::<LittleEndian>().ok()?)
        } else {
            None
        };

        Some(WavFormat {
            format_code,
            channels,
            sample_rate,
            byte_rate,
            block_align,
            bits_per_sample,
            sub_format,
        })
    }

    /// The format code that describes the samples
    pub fn effective_format(&self) -> u16 {
        self.sub_format.unwrap_or(self.format_code)
    }

    pub fn is_lossless(&self) -> bool {
        matches!(self.effective_format(), FORMAT_PCM | FORMAT_IEEE_FLOAT)
    }

    pub fn encoding_name(&self) -> String {
        match self.effective_format() {
            FORMAT_PCM => "WAV PCM".to_string(),
            FORMAT_IEEE_FLOAT => "WAV IEEE float".to_string(),
            FORMAT_ALAW => "WAV A-law".to_string(),
            FORMAT_MULAW => "WAV mu-law".to_string(),
            other => format!("WAV 0x{:04X}", other),
        }
    }

    pub fn apply(&self, header: &mut AudioHeader) {
        header.encoding_type = Some(self.encoding_name());
        header.channels = Some(self.channels);
        header.sample_rate = Some(self.sample_rate);
        header.bits_per_sample = Some(self.bits_per_sample);
        header.lossless = Some(self.is_lossless());
    }
}

/// Sample count from a `fact` payload
pub fn parse_fact(data: &[u8]) -> Option<u32> {
    Cursor::new(data).read_u32::<LittleEndian>().ok()
}
