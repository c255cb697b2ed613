use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::audio::AudioFormat;
use crate::boundary_planner::DEFAULT_MAX_GAP_MS;
use crate::subtitle_processor::DEFAULT_SENTENCE_TERMINATORS;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and defaulting of settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Format of the source audio and of the exported clips
    #[serde(default)]
    pub audio_format: AudioFormat,

    /// Largest silence between two cues that is shared as padding, in milliseconds
    #[serde(default = "default_max_gap_ms")]
    pub max_gap_ms: u64,

    /// Characters that end a sentence; numbered blocks are merged until one is seen
    #[serde(default = "default_sentence_terminators")]
    pub sentence_terminators: Vec<char>,

    /// Export settings
    #[serde(default)]
    pub export: ExportConfig,

    /// External codec settings
    #[serde(default)]
    pub codec: CodecConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Settings for writing cue clips
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ExportConfig {
    // @field: Number of cues sliced and encoded at the same time
    #[serde(default = "default_concurrent_exports")]
    pub concurrent_exports: usize,

    // @field: Remove the output directory when an export fails midway
    #[serde(default)]
    pub cleanup_on_failure: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            concurrent_exports: default_concurrent_exports(),
            cleanup_on_failure: false,
        }
    }
}

/// Settings for the ffmpeg codec backend
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CodecConfig {
    /// ffmpeg executable name or path
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: String,

    /// ffprobe executable name or path
    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: String,

    /// Timeout for a single ffmpeg/ffprobe invocation in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            ffprobe_path: default_ffprobe_path(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Values given on the command line that take precedence over the config file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub audio_format: Option<AudioFormat>,
    pub max_gap_ms: Option<u64>,
    pub sentence_terminators: Option<Vec<char>>,
    pub concurrent_exports: Option<usize>,
    /// Only ever switches cleanup on
    pub cleanup_on_failure: bool,
    pub log_level: Option<LogLevel>,
}

fn default_max_gap_ms() -> u64 {
    DEFAULT_MAX_GAP_MS
}

fn default_sentence_terminators() -> Vec<char> {
    DEFAULT_SENTENCE_TERMINATORS.to_vec()
}

fn default_concurrent_exports() -> usize {
    1
}

fn default_ffmpeg_path() -> String {
    "ffmpeg".to_string()
}

fn default_ffprobe_path() -> String {
    "ffprobe".to_string()
}

fn default_timeout_secs() -> u64 {
    300 // decoding a long source can take a while
}

impl Config {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;

        let reader = BufReader::new(file);
        serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Apply command line overrides on top of loaded values
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(format) = overrides.audio_format {
            self.audio_format = format;
        }

        if let Some(max_gap_ms) = overrides.max_gap_ms {
            self.max_gap_ms = max_gap_ms;
        }

        if let Some(terminators) = &overrides.sentence_terminators {
            self.sentence_terminators = terminators.clone();
        }

        if let Some(jobs) = overrides.concurrent_exports {
            self.export.concurrent_exports = jobs;
        }

        if overrides.cleanup_on_failure {
            self.export.cleanup_on_failure = true;
        }

        if let Some(log_level) = overrides.log_level {
            self.log_level = log_level;
        }
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.sentence_terminators.is_empty() {
            return Err(anyhow!("At least one sentence terminator is required"));
        }

        if self.sentence_terminators.iter().any(|c| c.is_whitespace()) {
            return Err(anyhow!("Sentence terminators cannot be whitespace"));
        }

        if self.export.concurrent_exports == 0 {
            return Err(anyhow!("export.concurrent_exports must be at least 1"));
        }

        if self.codec.ffmpeg_path.trim().is_empty() || self.codec.ffprobe_path.trim().is_empty() {
            return Err(anyhow!("codec.ffmpeg_path and codec.ffprobe_path cannot be empty"));
        }

        if self.codec.timeout_secs == 0 {
            return Err(anyhow!("codec.timeout_secs must be at least 1"));
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            audio_format: AudioFormat::default(),
            max_gap_ms: default_max_gap_ms(),
            sentence_terminators: default_sentence_terminators(),
            export: ExportConfig::default(),
            codec: CodecConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
