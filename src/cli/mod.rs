// CLI module for chunktag
//
// Argument parsing, glob expansion and output formatting for the binary.

pub mod commands;
pub mod config;
pub mod output;

pub use config::{Commands, Config};
pub use output::OutputFormatter;

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Expand glob patterns; arguments without glob characters pass through as-is
/// so a missing file is reported by the command instead of vanishing.
pub fn expand_files(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for pattern in patterns {
        if !pattern.contains(['*', '?', '[']) {
            files.push(PathBuf::from(pattern));
            continue;
        }
        let mut matched = false;
        for entry in glob::glob(pattern).with_context(|| format!("Invalid glob pattern: {}", pattern))? {
            let path = entry.with_context(|| format!("Error reading path for {}", pattern))?;
            if path.is_file() {
                files.push(path);
                matched = true;
            }
        }
        if !matched {
            tracing::warn!("no files match {}", pattern);
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_patterns_and_keeps_plain_paths() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.wav"), b"x").unwrap();
        std::fs::write(dir.path().join("b.wav"), b"x").unwrap();
        std::fs::write(dir.path().join("c.aiff"), b"x").unwrap();

        let pattern = format!("{}/*.wav", dir.path().display());
        let missing = "missing.wav".to_string();
        let files = expand_files(&[pattern, missing]).unwrap();
        assert_eq!(files.len(), 3);
        assert!(files[0].ends_with("a.wav"));
        assert!(files[1].ends_with("b.wav"));
        assert_eq!(files[2], PathBuf::from("missing.wav"));
    }
}
