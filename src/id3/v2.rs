// ID3v2 tag implementation
//
// The tag is carried inside an AIFF or WAV chunk, so it is always parsed from
// an in-memory chunk payload and serialised back to one.

use tracing::debug;

use super::frames::{
    decode_comment_frame, decode_text_frame, encode_comment_frame, encode_text_frame,
    downgrade_to_v22_frame_id, upgrade_v22_frame_id,
};
use crate::config::Id3Version;
use crate::error::{Error, Result};
use crate::field_mapping::{FieldKey, FieldMappings};
use crate::utils::io::{synchsafe_to_u32, u32_to_synchsafe};

/// ID3v2 header structure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Id3v2Header {
    pub version: (u8, u8),
    pub flags: u8,
    pub size: u32,
}

/// ID3v2 frame structure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Id3Frame {
    pub frame_id: String,
    pub flags: u16,
    pub data: Vec<u8>,
}

/// ID3v2 tag structure
///
/// Frames with no semantic mapping are kept verbatim and written back unchanged.
/// A v2.2 tag keeps its three character frame ids and is written back as v2.2.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Id3v2Tag {
    /// Text encoding rules; v2.2 follows the v2.3 rules
    version: Id3Version,
    /// Major version written to the header
    major: u8,
    frames: Vec<Id3Frame>,
}

impl Id3v2Header {
    pub const HEADER_SIZE: usize = 10;
    const ID: [u8; 3] = [b'I', b'D', b'3'];
    const FLAG_EXTENDED_HEADER: u8 = 0x40;

    /// Parse ID3v2 header from the start of a buffer
    pub fn parse(buffer: &[u8]) -> Option<Self> {
        if buffer.len() < Self::HEADER_SIZE || buffer[0..3] != Self::ID {
            return None;
        }

        let version = (buffer[3], buffer[4]);
        let flags = buffer[5];
        let size = synchsafe_to_u32([buffer[6], buffer[7], buffer[8], buffer[9]]);

        Some(Id3v2Header {
            version,
            flags,
            size,
        })
    }
}

impl Id3v2Tag {
    /// Create an empty tag
    pub fn new(version: Id3Version) -> Self {
        Id3v2Tag {
            version,
            major: version.major(),
            frames: Vec::new(),
        }
    }

    pub fn version(&self) -> Id3Version {
        self.version
    }

    /// Major version the tag is serialised in: 2, 3 or 4
    pub fn major_version(&self) -> u8 {
        self.major
    }

    pub fn frames(&self) -> &[Id3Frame] {
        &self.frames
    }

    /// Parse an ID3v2 tag from a chunk payload.
    ///
    /// Returns `None` when the payload does not start with an ID3v2 header or
    /// uses a major version this crate does not read.
    pub fn parse(data: &[u8]) -> Option<Self> {
        let header = Id3v2Header::parse(data)?;
        let major = header.version.0;
        let version = match major {
            2 | 3 => Id3Version::V23,
            4 => Id3Version::V24,
            other => {
                debug!("Unsupported ID3v2 major version {}", other);
                return None;
            }
        };

        let end = (Id3v2Header::HEADER_SIZE + header.size as usize).min(data.len());
        let mut pos = Id3v2Header::HEADER_SIZE;

        if header.flags & Id3v2Header::FLAG_EXTENDED_HEADER != 0 && header.version.0 >= 3 {
            if pos + 4 > end {
                return Some(Id3v2Tag {
                    version,
                    major,
                    frames: Vec::new(),
                });
            }
            let raw = [data[pos], data[pos + 1], data[pos + 2], data[pos + 3]];
            // v2.3 excludes the size field itself, v2.4 includes it
            pos += if header.version.0 == 4 {
                synchsafe_to_u32(raw) as usize
            } else {
                u32::from_be_bytes(raw) as usize + 4
            };
        }

        let mut frames = Vec::new();
        while pos < end {
            let parsed = if header.version.0 == 2 {
                Self::parse_v22_frame(&data[pos..end])
            } else {
                Self::parse_frame(&data[pos..end], header.version.0)
            };
            match parsed {
                Some((frame, consumed)) => {
                    pos += consumed;
                    frames.push(frame);
                }
                None => break,
            }
        }

        Some(Id3v2Tag {
            version,
            major,
            frames,
        })
    }

    /// Parse one v2.3/v2.4 frame; `None` at padding or a frame that overruns the tag
    fn parse_frame(buffer: &[u8], major: u8) -> Option<(Id3Frame, usize)> {
        if buffer.len() < 10 || buffer[0] == 0 {
            return None;
        }
        if !buffer[0..4].iter().all(|b| b.is_ascii_uppercase() || b.is_ascii_digit()) {
            debug!("Invalid ID3 frame id, treating rest of tag as padding");
            return None;
        }

        let frame_id = String::from_utf8_lossy(&buffer[0..4]).to_string();
        let raw = [buffer[4], buffer[5], buffer[6], buffer[7]];
        // Frame size parsing depends on version
        let size = if major >= 4 {
            synchsafe_to_u32(raw)
        } else {
            u32::from_be_bytes(raw)
        } as usize;
        let flags = u16::from_be_bytes([buffer[8], buffer[9]]);

        if 10 + size > buffer.len() {
            debug!("ID3 frame {} overruns tag, ignoring remainder", frame_id);
            return None;
        }

        let frame = Id3Frame {
            frame_id,
            flags,
            data: buffer[10..10 + size].to_vec(),
        };
        Some((frame, 10 + size))
    }

    /// Parse one v2.2 frame: three character id, 24-bit size, no flags
    fn parse_v22_frame(buffer: &[u8]) -> Option<(Id3Frame, usize)> {
        if buffer.len() < 6 || buffer[0] == 0 {
            return None;
        }
        if !buffer[0..3].iter().all(|b| b.is_ascii_uppercase() || b.is_ascii_digit()) {
            debug!("Invalid ID3v2.2 frame id, treating rest of tag as padding");
            return None;
        }
        let size = u32::from_be_bytes([0, buffer[3], buffer[4], buffer[5]]) as usize;
        if 6 + size > buffer.len() {
            return None;
        }

        let frame = Id3Frame {
            frame_id: String::from_utf8_lossy(&buffer[0..3]).to_string(),
            flags: 0,
            data: buffer[6..6 + size].to_vec(),
        };
        Some((frame, 6 + size))
    }

    /// Serialise the tag, header included, in its own version
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut body = Vec::new();
        for frame in &self.frames {
            let size = frame.data.len() as u32;
            body.extend_from_slice(frame.frame_id.as_bytes());
            match self.major {
                2 => body.extend_from_slice(&size.to_be_bytes()[1..]),
                3 => body.extend_from_slice(&size.to_be_bytes()),
                _ => body.extend_from_slice(&u32_to_synchsafe(size)),
            }
            if self.major > 2 {
                body.extend_from_slice(&frame.flags.to_be_bytes());
            }
            body.extend_from_slice(&frame.data);
        }

        let mut out = Vec::with_capacity(Id3v2Header::HEADER_SIZE + body.len());
        out.extend_from_slice(&Id3v2Header::ID);
        out.push(self.major);
        out.push(0);
        out.push(0);
        out.extend_from_slice(&u32_to_synchsafe(body.len() as u32));
        out.extend(body);
        out
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn field_count(&self) -> usize {
        self.frames.len()
    }

    /// Field a frame id stands for in a tag of version `major`
    fn field_of(major: u8, frame_id: &str) -> Option<FieldKey> {
        if major == 2 {
            upgrade_v22_frame_id(frame_id).and_then(FieldMappings::from_id3v2)
        } else {
            FieldMappings::from_id3v2(frame_id)
        }
    }

    /// Frame id new values of `key` are written to
    fn frame_id_for(&self, key: FieldKey) -> Option<&'static str> {
        let frame_id = FieldMappings::to_id3v2(key, self.version)?;
        if self.major == 2 {
            downgrade_to_v22_frame_id(frame_id)
        } else {
            Some(frame_id)
        }
    }

    /// First value stored for a field
    pub fn get(&self, key: FieldKey) -> Option<String> {
        self.frames
            .iter()
            .find(|frame| Self::field_of(self.major, &frame.frame_id) == Some(key))
            .map(|frame| {
                if key == FieldKey::Comment {
                    decode_comment_frame(&frame.data)
                } else {
                    decode_text_frame(&frame.data)
                }
            })
    }

    /// Replace every frame for a field with a single new frame
    pub fn set(&mut self, key: FieldKey, value: &str) -> Result<()> {
        let frame_id = self.frame_id_for(key).ok_or(Error::FieldNotSupported {
            key,
            format: "ID3v2",
        })?;

        let data = if key == FieldKey::Comment {
            encode_comment_frame(value, self.version)
        } else {
            encode_text_frame(value, self.version)
        };

        let new_frame = Id3Frame {
            frame_id: frame_id.to_string(),
            flags: 0,
            data,
        };

        let major = self.major;
        let is_key = |frame: &Id3Frame| Self::field_of(major, &frame.frame_id) == Some(key);
        match self.frames.iter().position(is_key) {
            Some(index) => {
                self.frames[index] = new_frame;
                let mut seen = 0;
                self.frames.retain(|frame| {
                    if is_key(frame) {
                        seen += 1;
                        seen == 1
                    } else {
                        true
                    }
                });
            }
            None => self.frames.push(new_frame),
        }
        Ok(())
    }

    /// Remove every frame for a field
    pub fn remove(&mut self, key: FieldKey) {
        let major = self.major;
        self.frames
            .retain(|frame| Self::field_of(major, &frame.frame_id) != Some(key));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_v23_tag(frames: &[(&str, &[u8])]) -> Vec<u8> {
        let mut body = Vec::new();
        for (id, data) in frames {
            body.extend_from_slice(id.as_bytes());
            body.extend_from_slice(&(data.len() as u32).to_be_bytes());
            body.extend_from_slice(&[0, 0]);
            body.extend_from_slice(data);
        }
        // Trailing padding
        body.extend_from_slice(&[0u8; 16]);
        let mut out = b"ID3\x03\x00\x00".to_vec();
        out.extend_from_slice(&u32_to_synchsafe(body.len() as u32));
        out.extend(body);
        out
    }

    #[test]
    fn parses_text_and_keeps_unknown_frames() {
        let raw = raw_v23_tag(&[("TIT2", b"\x00Song"), ("PRIV", b"opaque"), ("TPE1", b"\x00Band")]);
        let tag = Id3v2Tag::parse(&raw).unwrap();

        assert_eq!(tag.version(), Id3Version::V23);
        assert_eq!(tag.get(FieldKey::Title).as_deref(), Some("Song"));
        assert_eq!(tag.get(FieldKey::Artist).as_deref(), Some("Band"));
        assert_eq!(tag.field_count(), 3);
        assert_eq!(tag.frames()[1].data, b"opaque");
    }

    #[test]
    fn serialisation_is_stable() {
        let raw = raw_v23_tag(&[("TIT2", b"\x00Song"), ("PRIV", b"opaque")]);
        let tag = Id3v2Tag::parse(&raw).unwrap();
        let bytes = tag.to_bytes();
        let reparsed = Id3v2Tag::parse(&bytes).unwrap();
        assert_eq!(reparsed, tag);
        assert_eq!(reparsed.to_bytes(), bytes);
    }

    #[test]
    fn set_replaces_duplicates() {
        let raw = raw_v23_tag(&[("TYER", b"\x001999"), ("TIT2", b"\x00A"), ("TDRC", b"\x002001")]);
        let mut tag = Id3v2Tag::parse(&raw).unwrap();
        tag.set(FieldKey::Year, "2024").unwrap();

        assert_eq!(tag.get(FieldKey::Year).as_deref(), Some("2024"));
        assert_eq!(tag.field_count(), 2);
        assert_eq!(tag.frames()[0].frame_id, "TYER");
    }

    #[test]
    fn v24_uses_synchsafe_frame_sizes() {
        let mut tag = Id3v2Tag::new(Id3Version::V24);
        tag.set(FieldKey::Title, &"x".repeat(200)).unwrap();
        let bytes = tag.to_bytes();
        // 201 bytes of frame data: synchsafe 0x00 0x00 0x01 0x49
        assert_eq!(&bytes[14..18], &[0x00, 0x00, 0x01, 0x49]);
        assert_eq!(Id3v2Tag::parse(&bytes).unwrap().get(FieldKey::Title).unwrap().len(), 200);
    }

    #[test]
    fn v22_tag_keeps_its_frames() {
        let mut body = Vec::new();
        body.extend_from_slice(b"TT2\x00\x00\x05\x00Song");
        body.extend_from_slice(b"PIC\x00\x00\x07\x00PNG\x03\x00\x89");
        body.extend_from_slice(b"TBP\x00\x00\x04\x00120");
        let mut raw = b"ID3\x02\x00\x00".to_vec();
        raw.extend_from_slice(&u32_to_synchsafe(body.len() as u32));
        raw.extend(body);

        let mut tag = Id3v2Tag::parse(&raw).unwrap();
        assert_eq!(tag.major_version(), 2);
        assert_eq!(tag.get(FieldKey::Title).as_deref(), Some("Song"));
        assert_eq!(tag.field_count(), 3);
        assert_eq!(tag.to_bytes(), raw);

        tag.set(FieldKey::Year, "1959").unwrap();
        tag.set(FieldKey::Title, "So What").unwrap();
        let reparsed = Id3v2Tag::parse(&tag.to_bytes()).unwrap();
        assert_eq!(reparsed.frames()[0].frame_id, "TT2");
        assert_eq!(reparsed.frames()[1].frame_id, "PIC");
        assert_eq!(reparsed.frames()[3].frame_id, "TYE");
        assert_eq!(reparsed.get(FieldKey::Year).as_deref(), Some("1959"));
        assert_eq!(reparsed.get(FieldKey::Title).as_deref(), Some("So What"));
    }

    #[test]
    fn rating_has_no_text_frame() {
        let mut tag = Id3v2Tag::new(Id3Version::V23);
        assert!(matches!(
            tag.set(FieldKey::Rating, "5"),
            Err(Error::FieldNotSupported { .. })
        ));
    }

    #[test]
    fn rejects_non_id3_payload() {
        assert!(Id3v2Tag::parse(b"not a tag at all").is_none());
    }
}
