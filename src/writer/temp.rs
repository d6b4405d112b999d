// Temporary and backup file naming, and the temp-file guard

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::fs::FileSystem;

pub const TEMP_FILENAME_SUFFIX: &str = ".tmp";

/// Names longer than this are cut down when the filesystem rejects the temp name
pub const FILE_NAME_TOO_LONG_SAFE_LIMIT: usize = 50;

pub const BACKUP_SUFFIX: &str = ".old";

/// Attempts at finding an unused temp name before giving up
const MAX_NAME_ATTEMPTS: u32 = 100;

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A staged temporary file, removed on drop unless it has been consumed
pub struct TempFile<'a> {
    fs: &'a dyn FileSystem,
    path: PathBuf,
    armed: bool,
}

impl TempFile<'_> {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The file has been renamed into place and must be left alone
    pub fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for TempFile<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match self.fs.remove(&self.path) {
            Ok(()) => debug!("Deleted temporary file {}", self.path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!("Unable to delete temporary file {}: {}", self.path.display(), e),
        }
    }
}

/// Temp name prefix derived from the target's file name, dots replaced
pub fn temp_prefix(file_name: &str) -> String {
    file_name.replace('.', "_")
}

/// Create a new temporary file next to `target`.
///
/// A filesystem that rejects the name as too long gets one retry with the
/// target's name cut to [`FILE_NAME_TOO_LONG_SAFE_LIMIT`] characters.
pub fn create_temp_file<'a>(fs: &'a dyn FileSystem, target: &Path) -> Result<(TempFile<'a>, File)> {
    let dir = parent_dir(target);
    let name = file_name(target);

    match create_in(fs, &dir, &temp_prefix(&name)) {
        Ok(created) => Ok(created),
        Err(e) if e.kind() == io::ErrorKind::InvalidFilename && name.chars().count() > FILE_NAME_TOO_LONG_SAFE_LIMIT => {
            let short: String = name.chars().take(FILE_NAME_TOO_LONG_SAFE_LIMIT).collect();
            debug!("{}: temp name too long, retrying with {}", target.display(), short);
            create_in(fs, &dir, &temp_prefix(&short)).map_err(|e| {
                Error::write_failed(
                    target,
                    format!("unable to create temporary file in {}", dir.display()),
                    Some(e),
                )
            })
        }
        Err(e) => Err(Error::write_failed(
            target,
            format!("unable to create temporary file in {}", dir.display()),
            Some(e),
        )),
    }
}

fn create_in<'a>(fs: &'a dyn FileSystem, dir: &Path, prefix: &str) -> io::Result<(TempFile<'a>, File)> {
    let pid = std::process::id();
    let mut last_error = None;
    for _ in 0..MAX_NAME_ATTEMPTS {
        let unique = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        let path = dir.join(format!("{}{}{}{}", prefix, pid, unique, TEMP_FILENAME_SUFFIX));
        match fs.create_new(&path) {
            Ok(file) => {
                debug!("Created temporary file {}", path.display());
                return Ok((TempFile { fs, path, armed: true }, file));
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => last_error = Some(e),
            Err(e) => return Err(e),
        }
    }
    Err(last_error.unwrap_or_else(|| io::Error::new(io::ErrorKind::AlreadyExists, "no free temporary name")))
}

/// First unused backup name: `<base>.old`, then `<base>.old1`, `<base>.old2`, ...
///
/// `base` is the file name without its extension.
pub fn backup_path(fs: &dyn FileSystem, original: &Path) -> PathBuf {
    let dir = parent_dir(original);
    let base = original
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut candidate = dir.join(format!("{}{}", base, BACKUP_SUFFIX));
    let mut count = 1u64;
    while fs.exists(&candidate) {
        candidate = dir.join(format!("{}{}{}", base, BACKUP_SUFFIX, count));
        count += 1;
    }
    candidate
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::StdFileSystem;
    use std::fs;

    #[test]
    fn temp_prefix_replaces_dots() {
        assert_eq!(temp_prefix("song.final.aif"), "song_final_aif");
    }

    #[test]
    fn temp_file_is_colocated_and_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("track.wav");
        let (temp, file) = create_temp_file(&StdFileSystem, &target).unwrap();
        drop(file);

        let temp_path = temp.path().to_path_buf();
        assert_eq!(temp_path.parent(), Some(dir.path()));
        let name = temp_path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("track_wav"));
        assert!(name.ends_with(TEMP_FILENAME_SUFFIX));
        assert!(temp_path.exists());

        drop(temp);
        assert!(!temp_path.exists());
    }

    #[test]
    fn disarmed_temp_file_survives_drop() {
        let dir = tempfile::tempdir().unwrap();
        let (mut temp, _file) = create_temp_file(&StdFileSystem, &dir.path().join("a.aif")).unwrap();
        let temp_path = temp.path().to_path_buf();
        temp.disarm();
        drop(temp);
        assert!(temp_path.exists());
    }

    #[test]
    fn backup_name_skips_existing() {
        let dir = tempfile::tempdir().unwrap();
        let original = dir.path().join("base.aif");
        assert_eq!(backup_path(&StdFileSystem, &original), dir.path().join("base.old"));

        fs::write(dir.path().join("base.old"), b"").unwrap();
        fs::write(dir.path().join("base.old1"), b"").unwrap();
        assert_eq!(backup_path(&StdFileSystem, &original), dir.path().join("base.old2"));
    }
}
