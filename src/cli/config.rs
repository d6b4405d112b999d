// CLI configuration
use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use chunktag::{Id3Version, TagOptions, WavSaveMode};

/// chunktag - AIFF and WAV tag CLI tool
#[derive(Parser, Debug)]
#[command(name = "chunktag")]
#[command(about = "Read and rewrite tags in AIFF and WAV files", long_about = None)]
#[command(version)]
pub struct Config {
    /// Output format
    #[arg(short, long, value_enum, default_value = "pretty", global = true)]
    pub format: OutputFormat,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Verbose mode (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Load tag options from a JSON file
    #[arg(long, value_name = "FILE", global = true)]
    pub options: Option<PathBuf>,

    /// Replace files by rename instead of copying over them in place
    #[arg(long, global = true)]
    pub no_preserve_identity: bool,

    /// Skip the writability check before writing
    #[arg(long, global = true)]
    pub skip_writable_check: bool,

    /// ID3 version for newly created tags
    #[arg(long, value_enum, global = true)]
    pub id3_version: Option<Id3VersionArg>,

    /// Which WAV tag blocks to write
    #[arg(long, value_enum, global = true)]
    pub wav_save: Option<WavSaveArg>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable listing
    #[default]
    Pretty,
    /// One JSON document per file
    Json,
    /// KEY=VALUE lines
    KeyValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Id3VersionArg {
    #[value(name = "2.3")]
    V23,
    #[value(name = "2.4")]
    V24,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum WavSaveArg {
    Info,
    Id3,
    Both,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Read tags from audio file(s)
    Read {
        /// Audio file paths or glob patterns
        #[arg(value_name = "FILE", required = true)]
        files: Vec<String>,
    },

    /// Set tag fields in audio file(s)
    Write {
        /// Audio file paths or glob patterns
        #[arg(value_name = "FILE", required = true)]
        files: Vec<String>,

        /// Field to set, e.g. --set title="Blue in Green"; an empty value removes the field
        #[arg(short = 's', long = "set", value_name = "KEY=VALUE", required = true)]
        fields: Vec<String>,
    },

    /// Remove the tag from audio file(s)
    Delete {
        /// Audio file paths or glob patterns
        #[arg(value_name = "FILE", required = true)]
        files: Vec<String>,
    },

    /// Show audio properties and chunk layout
    Info {
        /// Audio file paths or glob patterns
        #[arg(value_name = "FILE", required = true)]
        files: Vec<String>,
    },
}

impl Config {
    /// Options file first, then the flags on top of it
    pub fn tag_options(&self) -> Result<TagOptions> {
        let mut options = match &self.options {
            Some(path) => TagOptions::from_json_file(path)
                .with_context(|| format!("Failed to load options from {}", path.display()))?,
            None => TagOptions::default(),
        };
        if self.no_preserve_identity {
            options = options.with_preserve_file_identity(false);
        }
        if self.skip_writable_check {
            options = options.with_check_is_writable(false);
        }
        if let Some(version) = self.id3_version {
            options = options.with_id3_version(match version {
                Id3VersionArg::V23 => Id3Version::V23,
                Id3VersionArg::V24 => Id3Version::V24,
            });
        }
        if let Some(mode) = self.wav_save {
            options = options.with_wav_save(match mode {
                WavSaveArg::Info => WavSaveMode::Info,
                WavSaveArg::Id3 => WavSaveMode::Id3,
                WavSaveArg::Both => WavSaveMode::Both,
            });
        }
        Ok(options)
    }

    /// Default log filter when RUST_LOG is unset
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        }
    }
}
