// Field-level access shared by every tag type

use crate::error::Result;
use crate::field_mapping::FieldKey;

/// Semantic field access over a format-specific tag
pub trait Tag {
    /// Name used in error messages
    fn format_name(&self) -> &'static str;

    fn get(&self, key: FieldKey) -> Option<String>;

    /// Replace the value of a field
    fn set(&mut self, key: FieldKey, value: &str) -> Result<()>;

    fn remove(&mut self, key: FieldKey);

    /// Number of stored fields, including ones with no semantic mapping
    fn field_count(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.field_count() == 0
    }

    /// Every mapped field that has a value, in [`FieldKey::ALL`] order
    fn fields(&self) -> Vec<(FieldKey, String)> {
        FieldKey::ALL
            .iter()
            .filter_map(|key| self.get(*key).map(|value| (*key, value)))
            .collect()
    }
}

impl Tag for crate::id3::Id3v2Tag {
    fn format_name(&self) -> &'static str {
        "ID3v2"
    }

    fn get(&self, key: FieldKey) -> Option<String> {
        crate::id3::Id3v2Tag::get(self, key)
    }

    fn set(&mut self, key: FieldKey, value: &str) -> Result<()> {
        crate::id3::Id3v2Tag::set(self, key, value)
    }

    fn remove(&mut self, key: FieldKey) {
        crate::id3::Id3v2Tag::remove(self, key)
    }

    fn field_count(&self) -> usize {
        crate::id3::Id3v2Tag::field_count(self)
    }
}
