// Tag persistence: staging, commit strategies and modification listeners

use std::fs::File;
use std::path::Path;

use crate::config::TagOptions;
use crate::error::Result;

pub mod engine;
pub mod listener;
pub mod temp;

pub use engine::AudioFileWriter;
pub use listener::{AudioFileModificationListener, ModificationHandler, ModifyVeto};

/// Format-specific serializer bound to the tag it writes.
///
/// Both operations read the original from `source` and write a complete new
/// file into `target`; neither may modify `source`.
pub trait TagSerializer {
    /// An empty tag is written by stripping the tag instead
    fn is_empty(&self) -> bool;

    fn write_tag(&self, source: &mut File, target: &mut File, options: &TagOptions, path: &Path) -> Result<()>;

    /// Copy everything except the tag
    fn delete_tag(&self, source: &mut File, target: &mut File, path: &Path) -> Result<()>;
}
