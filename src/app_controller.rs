use anyhow::{anyhow, Context, Result};
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::app_config::Config;
use crate::audio::{AudioCodec, FfmpegCodec};
use crate::errors::ExportError;
use crate::exporter::{ExportOptions, ExportSummary, SegmentExporter};
use crate::file_utils::FileManager;
use crate::subtitle_processor::Timeline;

// @module: Application controller for subtitle-driven audio slicing

/// Input and output locations of one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SliceJob {
    pub audio_file: PathBuf,
    pub subtitle_file: PathBuf,
    pub output_dir: PathBuf,
}

/// Main application controller
pub struct Controller {
    // @field: App configuration
    config: Config,

    // @field: Audio backend
    codec: Arc<dyn AudioCodec>,
}

impl Controller {
    // @method: Create a new controller backed by ffmpeg
    pub fn with_config(config: Config) -> Result<Self> {
        let codec = Arc::new(FfmpegCodec::with_config(&config.codec));
        Self::with_codec(config, codec)
    }

    /// Create a controller with a custom audio backend
    pub fn with_codec(config: Config, codec: Arc<dyn AudioCodec>) -> Result<Self> {
        config.validate().context("Configuration validation failed")?;
        Ok(Self { config, codec })
    }

    /// Parse the subtitle file of a job
    pub fn load_timeline(&self, subtitle_file: &Path) -> Result<Timeline> {
        let timeline = Timeline::parse_srt_file(subtitle_file, &self.config.sentence_terminators)
            .with_context(|| format!("Failed to load subtitles from {}", subtitle_file.display()))?;
        debug!("{}", timeline);
        Ok(timeline)
    }

    /// Run the full workflow: parse subtitles, decode audio once, export every cue
    pub async fn run(&self, job: &SliceJob) -> Result<ExportSummary> {
        let start_time = Instant::now();

        if !FileManager::file_exists(&job.subtitle_file) {
            return Err(anyhow!("Subtitle file does not exist: {:?}", job.subtitle_file));
        }
        if !FileManager::file_exists(&job.audio_file) {
            return Err(anyhow!("Audio file does not exist: {:?}", job.audio_file));
        }
        // Checked again atomically when the directory is created
        if job.output_dir.exists() {
            return Err(ExportError::AlreadyExists(job.output_dir.clone()).into());
        }

        let timeline = self.load_timeline(&job.subtitle_file)?;
        info!("Loaded {} cue(s) from {}", timeline.len(), job.subtitle_file.display());

        let format = self.config.audio_format;
        let audio_bytes = FileManager::read_bytes(&job.audio_file)?;
        let audio = self
            .codec
            .decode(&audio_bytes, format)
            .await
            .with_context(|| format!("Failed to decode {} as {}", job.audio_file.display(), format))?;
        drop(audio_bytes);
        info!(
            "Decoded {} ({})",
            job.audio_file.display(),
            Self::format_duration(Duration::from_millis(audio.duration_ms()))
        );

        let exporter = SegmentExporter::new(Arc::clone(&self.codec), ExportOptions::from(&self.config));
        let summary = exporter
            .export(&timeline, &audio, &job.output_dir, format)
            .await
            .with_context(|| format!("Failed to export cues into {}", job.output_dir.display()))?;

        info!(
            "Exported {} cue(s) to {} in {}",
            summary.cues_exported,
            job.output_dir.display(),
            Self::format_duration(start_time.elapsed())
        );

        Ok(summary)
    }

    // Format duration in a human-readable format (HH:MM:SS)
    pub fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
