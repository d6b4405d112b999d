// Atomic write and delete protocol
//
// New content is always staged in a temporary file next to the target. The
// original is only touched by the commit step, which either transfers the
// staged bytes into it (keeping its identity) or renames the staged file over
// it with a backup that is restored if the swap fails.

use std::fs::{File, TryLockError};
use std::io::{self, Write};
use std::path::Path;
use tracing::{debug, error, info, warn};

use super::listener::{AudioFileModificationListener, ModifyVeto};
use super::temp::{backup_path, create_temp_file, TempFile};
use super::TagSerializer;
use crate::audio_file::MINIMUM_SIZE;
use crate::config::TagOptions;
use crate::error::{Error, Result};
use crate::fs::FileSystem;

/// Runs one write or delete per call; no state survives between calls
pub struct AudioFileWriter<'a> {
    fs: &'a dyn FileSystem,
    listener: Option<&'a dyn AudioFileModificationListener>,
}

impl<'a> AudioFileWriter<'a> {
    pub fn new(fs: &'a dyn FileSystem) -> Self {
        AudioFileWriter { fs, listener: None }
    }

    pub fn with_listener(mut self, listener: &'a dyn AudioFileModificationListener) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Replace the tag in `path` with the one `serializer` is bound to.
    ///
    /// An empty tag is handled as a delete.
    pub fn write(&self, path: &Path, serializer: &dyn TagSerializer, options: &TagOptions) -> Result<()> {
        if serializer.is_empty() {
            debug!("{}: tag is empty, deleting instead", path.display());
            return self.delete(path, serializer, options);
        }
        info!("{}: writing tag", path.display());
        self.precheck(path, options)?;
        self.rewrite(path, serializer, options, false)
    }

    /// Remove the tag from `path`
    pub fn delete(&self, path: &Path, serializer: &dyn TagSerializer, options: &TagOptions) -> Result<()> {
        info!("{}: deleting tag", path.display());
        self.precheck(path, options)?;
        self.rewrite(path, serializer, options, true)
    }

    fn precheck(&self, path: &Path, options: &TagOptions) -> Result<()> {
        if options.check_is_writable {
            match self.fs.is_writable(path) {
                Ok(true) => {}
                Ok(false) => {
                    error!("{}: file is not writable", path.display());
                    return Err(Error::NotWritable { path: path.into() });
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    return Err(Error::NotFound { path: path.into() });
                }
                Err(e) => {
                    return Err(Error::write_failed(path, "unable to open file for editing", Some(e)));
                }
            }
        }

        let len = self.fs.len(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => Error::NotFound { path: path.into() },
            _ => Error::Io(e),
        })?;
        if len <= MINIMUM_SIZE {
            error!("{}: file is too small to be valid ({} bytes)", path.display(), len);
            return Err(Error::TooSmall { path: path.into(), len });
        }
        Ok(())
    }

    fn rewrite(&self, path: &Path, serializer: &dyn TagSerializer, options: &TagOptions, delete: bool) -> Result<()> {
        let (mut temp, mut target) = create_temp_file(self.fs, path)?;

        let staged = self.stage(path, &temp, &mut target, serializer, options, delete);
        drop(target);
        staged?;

        let new_len = self.fs.len(temp.path())?;
        if new_len == 0 {
            debug!("{}: nothing staged, original left as is", path.display());
        } else if options.preserve_file_identity {
            self.transfer_content(&temp, path)?;
        } else {
            self.swap_files(&mut temp, path)?;
        }
        drop(temp);

        if let Some(listener) = self.listener {
            listener.file_operation_finished(path);
        }
        Ok(())
    }

    /// Serialise into the temp file, with the listener hooks either side
    fn stage(
        &self,
        path: &Path,
        temp: &TempFile<'_>,
        target: &mut File,
        serializer: &dyn TagSerializer,
        options: &TagOptions,
        delete: bool,
    ) -> Result<()> {
        let mut source = self.fs.open_read(path).map_err(|e| {
            error!("{}: unable to open file for editing: {}", path.display(), e);
            Error::write_failed(path, "unable to open file for editing", Some(e))
        })?;

        if let Some(listener) = self.listener {
            listener
                .file_will_be_modified(path, delete)
                .map_err(|veto| vetoed(path, veto))?;
        }

        let serialized = if delete {
            serializer.delete_tag(&mut source, target, path)
        } else {
            serializer.write_tag(&mut source, target, options, path)
        };
        serialized
            .and_then(|()| target.flush().map_err(Error::from))
            .map_err(|e| staging_failed(path, e))?;

        if let Some(listener) = self.listener {
            listener
                .file_modified(path, temp.path())
                .map_err(|veto| vetoed(path, veto))?;
        }
        Ok(())
    }

    /// Copy the staged bytes into the original, keeping its identity
    fn transfer_content(&self, temp: &TempFile<'_>, path: &Path) -> Result<()> {
        let mut original = self.fs.open_read_write(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => Error::NotFound { path: path.into() },
            _ => Error::write_failed(path, "unable to open file for editing", Some(e)),
        })?;

        match self.fs.try_lock(&original) {
            Ok(()) => {}
            Err(TryLockError::WouldBlock) => {
                warn!("{}: file is locked by another writer", path.display());
                return Err(Error::FileLocked { path: path.into() });
            }
            Err(TryLockError::Error(e)) => {
                warn!("{}: unable to lock file, writing without a lock: {}", path.display(), e);
            }
        }

        let mut staged = self.fs.open_read(temp.path()).map_err(|e| {
            Error::write_failed(path, format!("staged file {} is missing", temp.path().display()), Some(e))
        })?;
        let size = self.fs.transfer(&mut staged, &mut original).map_err(|e| {
            error!("{}: unable to transfer new content: {}", path.display(), e);
            Error::write_failed(path, "unable to transfer new content into the original file", Some(e))
        })?;
        debug!("{}: transferred {} bytes", path.display(), size);
        Ok(())
    }

    /// Rename the original to a backup, the temp file into place, then drop the backup
    fn swap_files(&self, temp: &mut TempFile<'_>, path: &Path) -> Result<()> {
        let modified = self.fs.modified(path).ok();
        let backup = backup_path(self.fs, path);

        self.fs.rename(path, &backup).map_err(|e| {
            error!(
                "{}: unable to rename original to backup {}: {}",
                path.display(),
                backup.display(),
                e
            );
            Error::write_failed(path, format!("unable to rename original to {}", backup.display()), Some(e))
        })?;

        if let Err(e) = self.fs.rename(temp.path(), path) {
            warn!(
                "{}: unable to rename {} to original: {}",
                path.display(),
                temp.path().display(),
                e
            );
            return match self.fs.rename(&backup, path) {
                Ok(()) => Err(Error::write_failed(
                    path,
                    "unable to rename temporary file to the original name",
                    Some(e),
                )),
                Err(rollback) => {
                    error!(
                        "{}: unable to restore original from {}: {}",
                        path.display(),
                        backup.display(),
                        rollback
                    );
                    Err(Error::RollbackFailed {
                        path: path.into(),
                        backup,
                        source: rollback,
                    })
                }
            };
        }
        temp.disarm();

        if let Some(time) = modified {
            if let Err(e) = self.fs.set_modified(path, time) {
                warn!("{}: unable to restore modification time: {}", path.display(), e);
            }
        }
        if let Err(e) = self.fs.remove(&backup) {
            warn!("{}: unable to delete backup {}: {}", path.display(), backup.display(), e);
        }
        Ok(())
    }
}

fn vetoed(path: &Path, veto: ModifyVeto) -> Error {
    info!("{}: modification vetoed: {}", path.display(), veto.reason);
    Error::Vetoed {
        path: path.into(),
        reason: veto.reason,
    }
}

fn staging_failed(path: &Path, e: Error) -> Error {
    error!("{}: write failed: {}", path.display(), e);
    match e {
        Error::Io(io) => Error::write_failed(path, "unable to write new content", Some(io)),
        other => other,
    }
}
