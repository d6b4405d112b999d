// Shared builders and a filesystem that fails on request
#![allow(dead_code)]

use std::cell::RefCell;
use std::fs::{self, File, TryLockError};
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chunktag::iff::write_chunk;
use chunktag::utils::io::{f64_to_extended, ByteOrder};
use chunktag::{FileSystem, StdFileSystem};

pub const SAMPLE_RATE: u32 = 8000;
pub const DATA_LEN: usize = 4000;

/// `fmt ` payload: PCM, stereo, 16 bit at [`SAMPLE_RATE`]
pub fn pcm_format() -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&2u16.to_le_bytes());
    out.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
    out.extend_from_slice(&(SAMPLE_RATE * 4).to_le_bytes());
    out.extend_from_slice(&4u16.to_le_bytes());
    out.extend_from_slice(&16u16.to_le_bytes());
    out
}

/// RIFF/WAVE file with `fmt `, `data` and then `extra`
pub fn wav_bytes(extra: &[(&[u8; 4], Vec<u8>)]) -> Vec<u8> {
    let mut body = Vec::new();
    write_chunk(&mut body, b"fmt ", &pcm_format(), ByteOrder::Little).unwrap();
    write_chunk(&mut body, b"data", &audio_payload(), ByteOrder::Little).unwrap();
    for (id, payload) in extra {
        write_chunk(&mut body, id, payload, ByteOrder::Little).unwrap();
    }
    container(b"RIFF", b"WAVE", body, ByteOrder::Little)
}

/// `COMM` payload for stereo 16 bit audio
pub fn common(frames: u32, rate: f64) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&2i16.to_be_bytes());
    out.extend_from_slice(&frames.to_be_bytes());
    out.extend_from_slice(&16i16.to_be_bytes());
    out.extend_from_slice(&f64_to_extended(rate));
    out
}

/// FORM/AIFF file with `COMM`, `SSND` and then `extra`
pub fn aiff_bytes(extra: &[(&[u8; 4], Vec<u8>)]) -> Vec<u8> {
    let mut body = Vec::new();
    write_chunk(&mut body, b"COMM", &common(1000, SAMPLE_RATE as f64), ByteOrder::Big).unwrap();
    write_chunk(&mut body, b"SSND", &audio_payload(), ByteOrder::Big).unwrap();
    for (id, payload) in extra {
        write_chunk(&mut body, id, payload, ByteOrder::Big).unwrap();
    }
    container(b"FORM", b"AIFF", body, ByteOrder::Big)
}

pub fn container(id: &[u8; 4], form_type: &[u8; 4], body: Vec<u8>, order: ByteOrder) -> Vec<u8> {
    let size = body.len() as u32 + 4;
    let mut out = id.to_vec();
    match order {
        ByteOrder::Big => out.extend_from_slice(&size.to_be_bytes()),
        ByteOrder::Little => out.extend_from_slice(&size.to_le_bytes()),
    }
    out.extend_from_slice(form_type);
    out.extend(body);
    out
}

/// LIST payload of type INFO built from already encoded tuples
pub fn info_list(tuples: &[u8]) -> Vec<u8> {
    let mut out = b"INFO".to_vec();
    out.extend_from_slice(tuples);
    out
}

pub fn audio_payload() -> Vec<u8> {
    (0..DATA_LEN).map(|i| (i % 251) as u8).collect()
}

pub fn write_file(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

/// Names of every file left in `dir`, sorted
pub fn dir_entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

pub fn temp_files(dir: &Path) -> Vec<String> {
    dir_entries(dir).into_iter().filter(|name| name.ends_with(".tmp")).collect()
}

/// [`StdFileSystem`] with failures injected at chosen steps
#[derive(Default)]
pub struct FailingFs {
    /// `try_lock` fails with this error kind
    pub lock_error: Option<io::ErrorKind>,
    /// `try_lock` reports another holder
    pub lock_held: bool,
    /// `transfer` fails before writing anything
    pub fail_transfer: bool,
    /// Renaming the staged file onto the original fails
    pub fail_rename_into_place: bool,
    /// Renaming the backup back onto the original fails
    pub fail_rollback: bool,
    /// Every rename attempted, successful or not
    pub renames: RefCell<Vec<(PathBuf, PathBuf)>>,
}

fn injected(what: &str) -> io::Error {
    io::Error::other(format!("injected {} failure", what))
}

fn is_backup(path: &Path) -> bool {
    path.extension()
        .map(|extension| extension.to_string_lossy().starts_with("old"))
        .unwrap_or(false)
}

impl FileSystem for FailingFs {
    fn open_read(&self, path: &Path) -> io::Result<File> {
        StdFileSystem.open_read(path)
    }

    fn open_read_write(&self, path: &Path) -> io::Result<File> {
        StdFileSystem.open_read_write(path)
    }

    fn create_new(&self, path: &Path) -> io::Result<File> {
        StdFileSystem.create_new(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        self.renames.borrow_mut().push((from.to_path_buf(), to.to_path_buf()));
        let name = from.to_string_lossy();
        if self.fail_rename_into_place && name.ends_with(".tmp") {
            return Err(injected("rename"));
        }
        if self.fail_rollback && is_backup(from) {
            return Err(injected("rollback"));
        }
        StdFileSystem.rename(from, to)
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        StdFileSystem.remove(path)
    }

    fn exists(&self, path: &Path) -> bool {
        StdFileSystem.exists(path)
    }

    fn len(&self, path: &Path) -> io::Result<u64> {
        StdFileSystem.len(path)
    }

    fn try_lock(&self, file: &File) -> Result<(), TryLockError> {
        if self.lock_held {
            return Err(TryLockError::WouldBlock);
        }
        match self.lock_error {
            Some(kind) => Err(TryLockError::Error(io::Error::new(kind, "injected lock failure"))),
            None => StdFileSystem.try_lock(file),
        }
    }

    fn modified(&self, path: &Path) -> io::Result<SystemTime> {
        StdFileSystem.modified(path)
    }

    fn set_modified(&self, path: &Path, time: SystemTime) -> io::Result<()> {
        StdFileSystem.set_modified(path, time)
    }

    fn transfer(&self, from: &mut File, to: &mut File) -> io::Result<u64> {
        if self.fail_transfer {
            return Err(injected("transfer"));
        }
        StdFileSystem.transfer(from, to)
    }
}
