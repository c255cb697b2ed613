/*!
 * ffmpeg-backed audio codec.
 *
 * Decoding probes the source with `ffprobe` and converts it to raw `s16le`
 * PCM with `ffmpeg`; encoding feeds PCM back into `ffmpeg` on stdin. Source
 * and encoded files go through temporary files because some containers
 * (m4a in particular) need a seekable input or output.
 */

use async_trait::async_trait;
use log::{debug, error};
use serde_json::Value;
use std::io::Write;
use std::path::Path;
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::{AudioCodec, AudioFormat, PcmBuffer};
use crate::app_config::CodecConfig;
use crate::errors::CodecError;

/// Audio codec that shells out to ffmpeg and ffprobe
#[derive(Debug, Clone)]
pub struct FfmpegCodec {
    ffmpeg_path: String,
    ffprobe_path: String,
    timeout: Duration,
}

/// Stream parameters reported by ffprobe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamInfo {
    pub sample_rate: u32,
    pub channels: u16,
}

impl Default for FfmpegCodec {
    fn default() -> Self {
        Self::with_config(&CodecConfig::default())
    }
}

impl FfmpegCodec {
    pub fn with_config(config: &CodecConfig) -> Self {
        FfmpegCodec {
            ffmpeg_path: config.ffmpeg_path.clone(),
            ffprobe_path: config.ffprobe_path.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Run a tool to completion, optionally feeding `stdin`, under the configured timeout
    async fn run_tool(&self, tool: &str, args: &[&str], stdin: Option<Vec<u8>>) -> Result<Output, CodecError> {
        debug!("Running {} {}", tool, args.join(" "));

        let mut command = Command::new(tool);
        command
            .args(args)
            .stdin(if stdin.is_some() { Stdio::piped() } else { Stdio::null() })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = command.spawn().map_err(|e| CodecError::ToolUnavailable {
            tool: tool.to_string(),
            message: e.to_string(),
        })?;

        let run = async move {
            if let (Some(data), Some(mut pipe)) = (stdin, child.stdin.take()) {
                pipe.write_all(&data).await?;
                pipe.shutdown().await?;
            }
            child.wait_with_output().await
        };

        let output = tokio::select! {
            result = run => result?,
            _ = tokio::time::sleep(self.timeout) => {
                return Err(CodecError::Timeout {
                    tool: tool.to_string(),
                    secs: self.timeout.as_secs(),
                });
            }
        };

        Ok(output)
    }

    /// Read sample rate and channel count of the first audio stream
    pub async fn probe(&self, path: &Path) -> Result<StreamInfo, CodecError> {
        let path_str = path.to_string_lossy().to_string();
        let output = self
            .run_tool(
                &self.ffprobe_path,
                &[
                    "-v", "error",
                    "-select_streams", "a:0",
                    "-show_entries", "stream=sample_rate,channels",
                    "-print_format", "json",
                    path_str.as_str(),
                ],
                None,
            )
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CodecError::Probe(filter_ffmpeg_stderr(&stderr)));
        }

        parse_probe_output(&String::from_utf8_lossy(&output.stdout))
    }
}

#[async_trait]
impl AudioCodec for FfmpegCodec {
    async fn decode(&self, bytes: &[u8], format: AudioFormat) -> Result<PcmBuffer, CodecError> {
        let mut source = tempfile::Builder::new()
            .prefix("subslice-source-")
            .suffix(&format!(".{}", format.extension()))
            .tempfile()?;
        source.write_all(bytes)?;
        source.flush()?;

        let info = self.probe(source.path()).await?;
        let rate = info.sample_rate.to_string();
        let channels = info.channels.to_string();
        let source_path = source.path().to_string_lossy().to_string();

        let output = self
            .run_tool(
                &self.ffmpeg_path,
                &[
                    "-v", "error",
                    "-nostdin",
                    "-i", source_path.as_str(),
                    "-vn",
                    "-f", "s16le",
                    "-acodec", "pcm_s16le",
                    "-ar", rate.as_str(),
                    "-ac", channels.as_str(),
                    "pipe:1",
                ],
                None,
            )
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let filtered = filter_ffmpeg_stderr(&stderr);
            error!("Audio decoding failed: {}", filtered);
            return Err(CodecError::Decode(filtered));
        }

        let buffer = PcmBuffer::from_le_bytes(info.sample_rate, info.channels, &output.stdout);
        debug!("Decoded {:?}", buffer);
        Ok(buffer)
    }

    async fn encode(&self, buffer: &PcmBuffer, format: AudioFormat) -> Result<Vec<u8>, CodecError> {
        let target = tempfile::Builder::new()
            .prefix("subslice-clip-")
            .suffix(&format!(".{}", format.extension()))
            .tempfile()?;
        let target_path = target.path().to_string_lossy().to_string();
        let rate = buffer.sample_rate().to_string();
        let channels = buffer.channels().to_string();

        let output = self
            .run_tool(
                &self.ffmpeg_path,
                &[
                    "-y",
                    "-v", "error",
                    "-f", "s16le",
                    "-ar", rate.as_str(),
                    "-ac", channels.as_str(),
                    "-i", "pipe:0",
                    "-f", format.muxer(),
                    target_path.as_str(),
                ],
                Some(buffer.to_le_bytes()),
            )
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CodecError::Encode(filter_ffmpeg_stderr(&stderr)));
        }

        Ok(tokio::fs::read(target.path()).await?)
    }
}

/// Extract stream parameters from `ffprobe -print_format json` output
pub fn parse_probe_output(stdout: &str) -> Result<StreamInfo, CodecError> {
    let json: Value = serde_json::from_str(stdout)
        .map_err(|e| CodecError::Probe(format!("invalid ffprobe JSON: {}", e)))?;

    let stream = json
        .get("streams")
        .and_then(|s| s.as_array())
        .and_then(|streams| streams.first())
        .ok_or_else(|| CodecError::Probe("no audio stream found".to_string()))?;

    // ffprobe reports sample_rate as a string and channels as a number
    let sample_rate = stream
        .get("sample_rate")
        .and_then(|v| v.as_str().and_then(|s| s.parse::<u32>().ok()).or_else(|| v.as_u64().map(|n| n as u32)))
        .filter(|rate| *rate > 0)
        .ok_or_else(|| CodecError::Probe("missing sample rate".to_string()))?;

    let channels = stream
        .get("channels")
        .and_then(|v| v.as_u64())
        .and_then(|n| u16::try_from(n).ok())
        .filter(|channels| *channels > 0)
        .ok_or_else(|| CodecError::Probe("missing channel count".to_string()))?;

    Ok(StreamInfo { sample_rate, channels })
}

/// Filter ffmpeg stderr to only show meaningful error lines, stripping the
/// version banner, build configuration, and stream metadata noise.
pub fn filter_ffmpeg_stderr(stderr: &str) -> String {
    let noise_prefixes = [
        "ffmpeg version",
        "ffprobe version",
        "built with",
        "configuration:",
        "lib",
        "Input #",
        "Metadata:",
        "Duration:",
        "Stream #",
        "Output #",
        "Stream mapping:",
        "Press [q]",
    ];

    let meaningful: Vec<&str> = stderr
        .lines()
        .filter(|line| {
            let trimmed = line.trim();
            !trimmed.is_empty() && !noise_prefixes.iter().any(|p| trimmed.starts_with(p))
        })
        .collect();

    if meaningful.is_empty() {
        "unknown ffmpeg error (stderr was empty after filtering)".to_string()
    } else {
        meaningful.join("\n")
    }
}
