// CLI command implementations
//
// Every command processes its files independently; a failure is reported and
// counted, then the next file is processed.

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Local};
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chunktag::{AudioFile, FieldKey, FileTag, Tag, TagOptions};

use super::output::{OutputFormatter, TagReport};

/// Read and print the tag of each file
pub fn command_read(files: &[PathBuf], options: &TagOptions, formatter: &OutputFormatter) -> usize {
    let stdout = io::stdout();
    let mut writer = stdout.lock();
    run_each(files, formatter, |path| {
        let audio = AudioFile::read(path, options).with_context(|| format!("Failed to read {}", path.display()))?;
        let report = TagReport {
            path: path.display().to_string(),
            format: audio.format().as_str(),
            tag_format: audio.tag().format_name(),
            fields: tag_fields(audio.tag()),
        };
        formatter.output_tag(&report, &mut writer)?;
        Ok(None)
    })
}

/// Apply `KEY=VALUE` assignments to each file and save it
pub fn command_write(
    files: &[PathBuf],
    assignments: &[String],
    options: &TagOptions,
    formatter: &OutputFormatter,
) -> Result<usize> {
    let assignments = parse_assignments(assignments)?;
    Ok(run_each(files, formatter, |path| {
        let mut audio = AudioFile::read(path, options).with_context(|| format!("Failed to read {}", path.display()))?;
        for (key, value) in &assignments {
            match value {
                Some(value) => audio
                    .tag_mut()
                    .set(*key, value)
                    .with_context(|| format!("Failed to set {} on {}", key, path.display()))?,
                None => audio.tag_mut().remove(*key),
            }
        }
        audio.save(options).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(Some(format!("Updated {}", path.display())))
    }))
}

/// Strip the tag from each file
pub fn command_delete(files: &[PathBuf], options: &TagOptions, formatter: &OutputFormatter) -> usize {
    run_each(files, formatter, |path| {
        chunktag::delete(path, options).with_context(|| format!("Failed to delete tag from {}", path.display()))?;
        Ok(Some(format!("Removed tag from {}", path.display())))
    })
}

/// Show audio properties and chunk layout of each file
pub fn command_info(files: &[PathBuf], options: &TagOptions, formatter: &OutputFormatter) -> usize {
    let stdout = io::stdout();
    let mut writer = stdout.lock();
    run_each(files, formatter, |path| {
        let audio = AudioFile::read(path, options).with_context(|| format!("Failed to read {}", path.display()))?;
        let value = file_info(&audio)?;
        formatter.output_value(&value, &mut writer)?;
        writeln!(writer)?;
        Ok(None)
    })
}

fn run_each<F>(files: &[PathBuf], formatter: &OutputFormatter, mut action: F) -> usize
where
    F: FnMut(&Path) -> Result<Option<String>>,
{
    let mut failures = 0;
    for path in files {
        match action(path) {
            Ok(Some(message)) => formatter.print_success(&message),
            Ok(None) => {}
            Err(e) => {
                formatter.print_error(&format!("{:#}", e));
                failures += 1;
            }
        }
    }
    failures
}

/// Parse `KEY=VALUE`; an empty value means "remove the field"
pub fn parse_assignments(assignments: &[String]) -> Result<Vec<(FieldKey, Option<String>)>> {
    assignments
        .iter()
        .map(|assignment| {
            let (key, value) = assignment
                .split_once('=')
                .ok_or_else(|| anyhow!("Expected KEY=VALUE, got '{}'", assignment))?;
            let key: FieldKey = key.parse().map_err(|e: String| anyhow!(e))?;
            let value = if value.is_empty() { None } else { Some(value.to_string()) };
            Ok((key, value))
        })
        .collect()
}

fn tag_fields(tag: &FileTag) -> BTreeMap<String, String> {
    let mut fields: BTreeMap<String, String> = tag
        .fields()
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect();
    if let FileTag::Wav(wav) = tag {
        if let Some(info) = wav.info() {
            for (code, value) in info.unrecognised_fields() {
                fields.insert(format!("info:{}", code), value.to_string());
            }
        }
    }
    fields
}

fn file_info(audio: &AudioFile) -> Result<serde_json::Value> {
    let header = audio.audio_header();
    let metadata = std::fs::metadata(audio.path())
        .with_context(|| format!("Failed to stat {}", audio.path().display()))?;
    let modified = metadata
        .modified()
        .ok()
        .map(|mtime| DateTime::<Local>::from(mtime).format("%Y-%m-%d %H:%M:%S").to_string());

    let chunks: Vec<String> = audio
        .tag()
        .chunk_summaries()
        .iter()
        .map(|chunk| format!("{}@{}+{}", chunk.id, chunk.start, chunk.size))
        .collect();

    let mut value = serde_json::to_value(header)?;
    let Some(obj) = value.as_object_mut() else {
        bail!("audio header did not serialize to an object");
    };
    obj.insert("path".into(), audio.path().display().to_string().into());
    obj.insert("format".into(), audio.format().as_str().into());
    obj.insert("size".into(), metadata.len().into());
    obj.insert("modified".into(), serde_json::to_value(modified)?);
    obj.insert("bit_rate_kbps".into(), serde_json::to_value(header.bit_rate_kbps())?);
    obj.insert("chunks".into(), serde_json::to_value(chunks)?);
    obj.insert("tag_fields".into(), audio.tag().field_count().into());
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_assignments() {
        let parsed = parse_assignments(&["Title=So What".to_string(), "album_artist=".to_string()]).unwrap();
        assert_eq!(parsed[0], (FieldKey::Title, Some("So What".to_string())));
        assert_eq!(parsed[1], (FieldKey::AlbumArtist, None));
    }

    #[test]
    fn rejects_bad_assignments() {
        assert!(parse_assignments(&["title".to_string()]).is_err());
        assert!(parse_assignments(&["tempo=120".to_string()]).is_err());
    }

    #[test]
    fn value_may_contain_equals() {
        let parsed = parse_assignments(&["comment=a=b".to_string()]).unwrap();
        assert_eq!(parsed[0].1.as_deref(), Some("a=b"));
    }
}
