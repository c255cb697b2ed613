/*!
 * Per-cue clip export.
 *
 * The exporter creates the output directory, computes every export window up
 * front and then slices, encodes and writes one audio clip plus one text file
 * per cue. Windows only depend on the timeline, so once they are known the
 * per-cue work is independent and can run with bounded concurrency.
 */

use futures::stream::{self, StreamExt, TryStreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::app_config::Config;
use crate::audio::{AudioCodec, AudioFormat, PcmBuffer};
use crate::boundary_planner::{plan_boundaries, ExportWindow, DEFAULT_MAX_GAP_MS};
use crate::errors::ExportError;
use crate::file_utils::FileManager;
use crate::subtitle_processor::{Cue, Timeline};

/// Options controlling an export run
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOptions {
    /// Gap cap used when planning windows
    pub max_gap_ms: u64,
    /// Number of cues processed at the same time
    pub concurrent_exports: usize,
    /// Remove the output directory if a cue fails
    pub cleanup_on_failure: bool,
    /// Draw a progress bar on stderr
    pub show_progress: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            max_gap_ms: DEFAULT_MAX_GAP_MS,
            concurrent_exports: 1,
            cleanup_on_failure: false,
            show_progress: false,
        }
    }
}

impl From<&Config> for ExportOptions {
    fn from(config: &Config) -> Self {
        Self {
            max_gap_ms: config.max_gap_ms,
            concurrent_exports: config.export.concurrent_exports,
            cleanup_on_failure: config.export.cleanup_on_failure,
            show_progress: true,
        }
    }
}

/// Files written for one cue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CueFiles {
    pub cue_id: String,
    pub audio_path: PathBuf,
    pub text_path: PathBuf,
}

/// Result of a completed export
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub cues_exported: usize,
    pub files: Vec<CueFiles>,
}

/// Writes one clip and one text file per cue
#[derive(Debug, Clone)]
pub struct SegmentExporter {
    codec: Arc<dyn AudioCodec>,
    options: ExportOptions,
}

impl SegmentExporter {
    pub fn new(codec: Arc<dyn AudioCodec>, options: ExportOptions) -> Self {
        Self { codec, options }
    }

    /// Export every cue of `timeline` into a new `output_dir`.
    ///
    /// Fails with [`ExportError::AlreadyExists`] before writing anything if the
    /// directory exists. A failure on an individual cue stops the run; files
    /// already written stay in place unless `cleanup_on_failure` is set.
    pub async fn export(
        &self,
        timeline: &Timeline,
        audio: &PcmBuffer,
        output_dir: &Path,
        format: AudioFormat,
    ) -> Result<ExportSummary, ExportError> {
        FileManager::create_output_dir(output_dir)?;

        if timeline.is_empty() {
            warn!("No cues to export, {} left empty", output_dir.display());
            return Ok(ExportSummary::default());
        }

        match self.export_cues(timeline, audio, output_dir, format).await {
            Ok(summary) => Ok(summary),
            Err(e) => {
                if self.options.cleanup_on_failure {
                    warn!("Export failed, removing {}", output_dir.display());
                    if let Err(cleanup_error) = FileManager::remove_dir_all(output_dir) {
                        error!("Failed to clean up output directory: {}", cleanup_error);
                    }
                }
                Err(e)
            }
        }
    }

    async fn export_cues(
        &self,
        timeline: &Timeline,
        audio: &PcmBuffer,
        output_dir: &Path,
        format: AudioFormat,
    ) -> Result<ExportSummary, ExportError> {
        let windows = plan_boundaries(timeline, self.options.max_gap_ms);
        let progress_bar = self.progress_bar(windows.len() as u64);

        info!(
            "Exporting {} cue(s) as {} into {}",
            windows.len(),
            format,
            output_dir.display()
        );

        let files: Vec<CueFiles> = stream::iter(timeline.iter().zip(windows.iter()))
            .map(|(cue, window)| {
                let progress_bar = progress_bar.clone();
                async move {
                    let files = self.export_cue(cue, window, audio, output_dir, format).await?;
                    progress_bar.inc(1);
                    Ok::<CueFiles, ExportError>(files)
                }
            })
            .buffered(self.options.concurrent_exports.max(1))
            .try_collect::<Vec<CueFiles>>()
            .await
            .inspect_err(|_| progress_bar.abandon())?;

        progress_bar.finish_and_clear();

        Ok(ExportSummary {
            cues_exported: files.len(),
            files,
        })
    }

    async fn export_cue(
        &self,
        cue: &Cue,
        window: &ExportWindow,
        audio: &PcmBuffer,
        output_dir: &Path,
        format: AudioFormat,
    ) -> Result<CueFiles, ExportError> {
        let (start_ms, end_ms) = window.slice_range();
        debug!("Cue {}: exporting [{}, {}) ms", cue.id, start_ms, end_ms);

        let clip = self.codec.slice(audio, start_ms, end_ms)?;
        let encoded = self.codec.encode(&clip, format).await?;

        let audio_path = FileManager::cue_output_path(output_dir, &cue.id, format.extension());
        tokio::fs::write(&audio_path, encoded)
            .await
            .map_err(|e| ExportError::io(&audio_path, e))?;

        let text_path = FileManager::cue_output_path(output_dir, &cue.id, "txt");
        tokio::fs::write(&text_path, cue.text.as_bytes())
            .await
            .map_err(|e| ExportError::io(&text_path, e))?;

        Ok(CueFiles {
            cue_id: cue.id.clone(),
            audio_path,
            text_path,
        })
    }

    fn progress_bar(&self, total: u64) -> ProgressBar {
        if !self.options.show_progress {
            return ProgressBar::hidden();
        }

        let progress_bar = ProgressBar::new(total);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} cues ({percent}%) {eta}")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(style.progress_chars("█▓▒░"));
        progress_bar
    }
}
