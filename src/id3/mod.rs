// ID3v2 tags embedded in AIFF and WAV chunks
pub mod frames;
pub mod v2;

pub use v2::{Id3Frame, Id3v2Header, Id3v2Tag};
