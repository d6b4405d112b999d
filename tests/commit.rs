mod common;

use rstest::rstest;
use std::cell::RefCell;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chunktag::{
    AudioFile, AudioFileModificationListener, AudioFileWriter, Error, FieldKey, ModifyVeto, StdFileSystem, Tag,
    TagOptions,
};
use common::*;

/// A tagged-in-memory WAV file on disk, plus its original bytes
fn prepared(dir: &Path, name: &str) -> (AudioFile, Vec<u8>) {
    let content = wav_bytes(&[]);
    let path = write_file(dir, name, &content);
    let mut file = AudioFile::read(&path, &TagOptions::default()).unwrap();
    file.tag_mut().set(FieldKey::Title, "So What").unwrap();
    (file, content)
}

fn swap_options() -> TagOptions {
    TagOptions::default().with_preserve_file_identity(false)
}

#[test]
fn failed_transfer_leaves_original_and_no_temp_file() {
    let dir = tempfile::tempdir().unwrap();
    let (file, content) = prepared(dir.path(), "d.wav");
    let fs = FailingFs {
        fail_transfer: true,
        ..Default::default()
    };

    let err = file
        .save_with(&AudioFileWriter::new(&fs), &TagOptions::default())
        .unwrap_err();
    assert!(matches!(err, Error::WriteFailed { .. }));
    assert_eq!(fs::read(file.path()).unwrap(), content);
    assert!(temp_files(dir.path()).is_empty());
}

#[rstest]
#[case(io::ErrorKind::Unsupported)]
#[case(io::ErrorKind::PermissionDenied)]
fn lock_failure_writes_without_lock(#[case] kind: io::ErrorKind) {
    let dir = tempfile::tempdir().unwrap();
    let (file, content) = prepared(dir.path(), "l.wav");
    let fs = FailingFs {
        lock_error: Some(kind),
        ..Default::default()
    };

    file.save_with(&AudioFileWriter::new(&fs), &TagOptions::default()).unwrap();
    assert_ne!(fs::read(file.path()).unwrap(), content);
    let reread = AudioFile::read(file.path(), &TagOptions::default()).unwrap();
    assert_eq!(reread.tag().get(FieldKey::Title).as_deref(), Some("So What"));
}

#[test]
fn held_lock_refuses_the_write() {
    let dir = tempfile::tempdir().unwrap();
    let (file, content) = prepared(dir.path(), "h.wav");
    let fs = FailingFs {
        lock_held: true,
        ..Default::default()
    };

    let err = file
        .save_with(&AudioFileWriter::new(&fs), &TagOptions::default())
        .unwrap_err();
    assert!(matches!(err, Error::FileLocked { .. }));
    assert_eq!(fs::read(file.path()).unwrap(), content);
    assert!(temp_files(dir.path()).is_empty());
}

#[test]
fn swap_failure_rolls_back_to_the_original() {
    let dir = tempfile::tempdir().unwrap();
    let (file, content) = prepared(dir.path(), "r.wav");
    let fs = FailingFs {
        fail_rename_into_place: true,
        ..Default::default()
    };

    let err = file.save_with(&AudioFileWriter::new(&fs), &swap_options()).unwrap_err();
    assert!(matches!(err, Error::WriteFailed { .. }));
    assert_eq!(fs::read(file.path()).unwrap(), content);
    assert_eq!(dir_entries(dir.path()), vec!["r.wav".to_string()]);

    let renames = fs.renames.borrow();
    assert_eq!(renames.len(), 3);
    assert_eq!(renames[0], (file.path().to_path_buf(), dir.path().join("r.old")));
    assert_eq!(renames[1].1, file.path());
    assert_eq!(renames[2], (dir.path().join("r.old"), file.path().to_path_buf()));
}

#[test]
fn failed_rollback_is_reported_with_the_backup() {
    let dir = tempfile::tempdir().unwrap();
    let (file, content) = prepared(dir.path(), "x.wav");
    let fs = FailingFs {
        fail_rename_into_place: true,
        fail_rollback: true,
        ..Default::default()
    };

    let err = file.save_with(&AudioFileWriter::new(&fs), &swap_options()).unwrap_err();
    let backup = match err {
        Error::RollbackFailed { backup, .. } => backup,
        other => panic!("expected a rollback failure, got {:?}", other),
    };
    assert_eq!(backup, dir.path().join("x.old"));
    assert_eq!(fs::read(&backup).unwrap(), content);
    assert!(!file.path().exists());
    assert!(temp_files(dir.path()).is_empty());
}

#[test]
fn backup_name_skips_existing_files() {
    let dir = tempfile::tempdir().unwrap();
    let (file, _) = prepared(dir.path(), "song.wav");
    write_file(dir.path(), "song.old", b"keep me");
    write_file(dir.path(), "song.old1", b"keep me too");
    let fs = FailingFs::default();

    file.save_with(&AudioFileWriter::new(&fs), &swap_options()).unwrap();

    assert_eq!(fs.renames.borrow()[0].1, dir.path().join("song.old2"));
    assert_eq!(
        dir_entries(dir.path()),
        vec!["song.old".to_string(), "song.old1".to_string(), "song.wav".to_string()]
    );
    assert_eq!(fs::read(dir.path().join("song.old")).unwrap(), b"keep me");
}

#[test]
fn swap_keeps_the_modification_time() {
    let dir = tempfile::tempdir().unwrap();
    let (file, _) = prepared(dir.path(), "m.wav");
    let stamp = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000_000);
    File::options()
        .write(true)
        .open(file.path())
        .unwrap()
        .set_modified(stamp)
        .unwrap();

    file.save(&swap_options()).unwrap();
    assert_eq!(fs::metadata(file.path()).unwrap().modified().unwrap(), stamp);
}

#[derive(Default)]
struct Recorder {
    veto_before: bool,
    veto_staged: bool,
    events: RefCell<Vec<String>>,
    staged: RefCell<Option<PathBuf>>,
}

impl AudioFileModificationListener for Recorder {
    fn file_will_be_modified(&self, _path: &Path, delete: bool) -> Result<(), ModifyVeto> {
        self.events.borrow_mut().push(format!("will_be_modified delete={}", delete));
        if self.veto_before {
            return Err(ModifyVeto::new("read-only session"));
        }
        Ok(())
    }

    fn file_modified(&self, _path: &Path, temp: &Path) -> Result<(), ModifyVeto> {
        self.events.borrow_mut().push("modified".to_string());
        *self.staged.borrow_mut() = Some(temp.to_path_buf());
        if self.veto_staged {
            return Err(ModifyVeto::new("checksum mismatch"));
        }
        Ok(())
    }

    fn file_operation_finished(&self, _path: &Path) {
        self.events.borrow_mut().push("finished".to_string());
    }
}

#[test]
fn listener_sees_every_step_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let (file, _) = prepared(dir.path(), "n.wav");
    let recorder = Recorder::default();

    file.save_notifying(&recorder, &TagOptions::default()).unwrap();
    assert_eq!(
        *recorder.events.borrow(),
        vec!["will_be_modified delete=false", "modified", "finished"]
    );
    let staged = recorder.staged.borrow().clone().unwrap();
    assert_eq!(staged.parent(), Some(dir.path()));
    assert!(!staged.exists());
}

#[rstest]
#[case(true, false)]
#[case(false, true)]
fn veto_stops_the_write(#[case] veto_before: bool, #[case] veto_staged: bool) {
    let dir = tempfile::tempdir().unwrap();
    let (file, content) = prepared(dir.path(), "v.wav");
    let recorder = Recorder {
        veto_before,
        veto_staged,
        ..Default::default()
    };

    let err = file.save_notifying(&recorder, &TagOptions::default()).unwrap_err();
    assert!(matches!(err, Error::Vetoed { .. }));
    assert_eq!(fs::read(file.path()).unwrap(), content);
    assert!(temp_files(dir.path()).is_empty());
    assert!(!recorder.events.borrow().contains(&"finished".to_string()));
}

#[test]
fn delete_is_reported_to_listeners() {
    let dir = tempfile::tempdir().unwrap();
    let (file, _) = prepared(dir.path(), "del.wav");
    file.save(&TagOptions::default()).unwrap();

    let recorder = Recorder::default();
    let mut reread = AudioFile::read(file.path(), &TagOptions::default()).unwrap();
    let writer = AudioFileWriter::new(&StdFileSystem).with_listener(&recorder);
    reread.delete_tag_with(&writer, &TagOptions::default()).unwrap();

    assert_eq!(recorder.events.borrow()[0], "will_be_modified delete=true");
    assert!(reread.tag().is_empty());
}
