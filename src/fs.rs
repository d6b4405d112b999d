// Filesystem capability used by the readers and the write engine
//
// Everything the engine does to the disk goes through this trait so a test can
// swap in an implementation that fails at a chosen step.

use std::fs::{self, File, OpenOptions, TryLockError};
use std::io::{self, Seek, SeekFrom, Write};
use std::path::Path;
use std::time::SystemTime;

/// Operations the read and write paths need from the filesystem
pub trait FileSystem {
    fn open_read(&self, path: &Path) -> io::Result<File>;

    fn open_read_write(&self, path: &Path) -> io::Result<File>;

    /// Create a file that must not exist yet
    fn create_new(&self, path: &Path) -> io::Result<File>;

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    fn remove(&self, path: &Path) -> io::Result<()>;

    fn exists(&self, path: &Path) -> bool;

    fn len(&self, path: &Path) -> io::Result<u64>;

    /// Whether the current process may open `path` for writing
    fn is_writable(&self, path: &Path) -> io::Result<bool> {
        match self.open_read_write(path) {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Take a non-blocking exclusive advisory lock, released when `file` is closed
    fn try_lock(&self, file: &File) -> Result<(), TryLockError>;

    fn modified(&self, path: &Path) -> io::Result<SystemTime>;

    fn set_modified(&self, path: &Path, time: SystemTime) -> io::Result<()>;

    /// Overwrite `to` with the whole content of `from` and truncate `to` to
    /// that length. Returns the new length.
    fn transfer(&self, from: &mut File, to: &mut File) -> io::Result<u64>;
}

/// [`FileSystem`] backed by `std::fs`
#[derive(Debug, Clone, Copy, Default)]
pub struct StdFileSystem;

impl FileSystem for StdFileSystem {
    fn open_read(&self, path: &Path) -> io::Result<File> {
        File::open(path)
    }

    fn open_read_write(&self, path: &Path) -> io::Result<File> {
        OpenOptions::new().read(true).write(true).open(path)
    }

    fn create_new(&self, path: &Path) -> io::Result<File> {
        OpenOptions::new().read(true).write(true).create_new(true).open(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(from, to)
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn len(&self, path: &Path) -> io::Result<u64> {
        Ok(fs::metadata(path)?.len())
    }

    fn try_lock(&self, file: &File) -> Result<(), TryLockError> {
        file.try_lock()
    }

    fn modified(&self, path: &Path) -> io::Result<SystemTime> {
        fs::metadata(path)?.modified()
    }

    fn set_modified(&self, path: &Path, time: SystemTime) -> io::Result<()> {
        OpenOptions::new().write(true).open(path)?.set_modified(time)
    }

    fn transfer(&self, from: &mut File, to: &mut File) -> io::Result<u64> {
        from.seek(SeekFrom::Start(0))?;
        to.seek(SeekFrom::Start(0))?;
        let size = io::copy(from, to)?;
        to.set_len(size)?;
        to.flush()?;
        to.sync_all()?;
        Ok(size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn transfer_truncates_longer_target() {
        let dir = tempfile::tempdir().unwrap();
        let short = dir.path().join("short");
        let long = dir.path().join("long");
        fs::write(&short, b"new").unwrap();
        fs::write(&long, b"old content that is longer").unwrap();

        let fs = StdFileSystem;
        let mut from = fs.open_read(&short).unwrap();
        let mut to = fs.open_read_write(&long).unwrap();
        assert_eq!(fs.transfer(&mut from, &mut to).unwrap(), 3);
        drop(to);

        let mut content = Vec::new();
        File::open(&long).unwrap().read_to_end(&mut content).unwrap();
        assert_eq!(content, b"new");
    }

    #[test]
    fn create_new_refuses_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("taken");
        fs::write(&path, b"x").unwrap();
        let err = StdFileSystem.create_new(&path).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
    }

    #[test]
    fn missing_file_is_not_writable_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = StdFileSystem.is_writable(&dir.path().join("missing")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
