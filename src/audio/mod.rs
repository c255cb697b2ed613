/*!
 * Audio capability boundary.
 *
 * The segmentation core only needs three operations from an audio backend:
 * decode a whole source file once, cut a millisecond range out of the decoded
 * buffer, and encode a range back into a container format. They are grouped in
 * the [`AudioCodec`] trait so the exporter can run against a real backend
 * ([`ffmpeg::FfmpegCodec`]) or a recording fake in tests.
 */

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};
use std::str::FromStr;
use std::sync::Arc;

use crate::errors::CodecError;

pub mod ffmpeg;

pub use self::ffmpeg::FfmpegCodec;

/// Audio container formats the exporter can read and write
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    #[default]
    Mp3,
    Wav,
    Flac,
    Ogg,
    Opus,
    M4a,
    Aac,
}

impl AudioFormat {
    /// File extension used for exported clips
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Wav => "wav",
            Self::Flac => "flac",
            Self::Ogg => "ogg",
            Self::Opus => "opus",
            Self::M4a => "m4a",
            Self::Aac => "aac",
        }
    }

    /// ffmpeg muxer name for this format
    pub fn muxer(&self) -> &'static str {
        match self {
            Self::M4a => "ipod",
            Self::Aac => "adts",
            other => other.extension(),
        }
    }

    pub fn all() -> &'static [AudioFormat] {
        &[
            Self::Mp3,
            Self::Wav,
            Self::Flac,
            Self::Ogg,
            Self::Opus,
            Self::M4a,
            Self::Aac,
        ]
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

impl FromStr for AudioFormat {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().trim_start_matches('.').to_lowercase();
        Self::all()
            .iter()
            .copied()
            .find(|format| format.extension() == normalized)
            .ok_or_else(|| CodecError::UnsupportedFormat(s.to_string()))
    }
}

/// Decoded audio as interleaved signed 16-bit samples.
///
/// Slices share the sample storage of the buffer they were cut from, so a
/// decoded source can be handed to many concurrent exporters cheaply.
#[derive(Clone, PartialEq, Eq)]
pub struct PcmBuffer {
    sample_rate: u32,
    channels: u16,
    samples: Arc<[i16]>,
    start_frame: usize,
    frame_count: usize,
}

impl PcmBuffer {
    /// Build a buffer from interleaved samples; a trailing partial frame is ignored
    pub fn new(sample_rate: u32, channels: u16, samples: Vec<i16>) -> Self {
        let channels = channels.max(1);
        let frame_count = samples.len() / channels as usize;
        PcmBuffer {
            sample_rate,
            channels,
            samples: samples.into(),
            start_frame: 0,
            frame_count,
        }
    }

    /// Build a buffer from little-endian `s16le` bytes as produced by ffmpeg
    pub fn from_le_bytes(sample_rate: u32, channels: u16, bytes: &[u8]) -> Self {
        let samples = bytes
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        Self::new(sample_rate, channels, samples)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    pub fn is_empty(&self) -> bool {
        self.frame_count == 0
    }

    /// Interleaved samples of this buffer
    pub fn samples(&self) -> &[i16] {
        let channels = self.channels as usize;
        let start = self.start_frame * channels;
        &self.samples[start..start + self.frame_count * channels]
    }

    pub fn to_le_bytes(&self) -> Vec<u8> {
        self.samples().iter().flat_map(|sample| sample.to_le_bytes()).collect()
    }

    /// Length of the buffer in whole milliseconds
    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        (self.frame_count as u128 * 1000 / self.sample_rate as u128) as u64
    }

    /// Frame offset of a millisecond position, clamped to this buffer
    fn frame_at(&self, ms: i64) -> usize {
        if ms <= 0 {
            return 0;
        }
        let frame = ms as u128 * self.sample_rate as u128 / 1000;
        frame.min(self.frame_count as u128) as usize
    }

    /// Cut the half-open range `[start_ms, end_ms)`.
    ///
    /// Positions outside the buffer are clamped, so a range running past the
    /// end yields a shorter buffer and an inverted range yields an empty one.
    pub fn slice_ms(&self, start_ms: i64, end_ms: i64) -> PcmBuffer {
        let start = self.frame_at(start_ms);
        let end = self.frame_at(end_ms).max(start);
        PcmBuffer {
            sample_rate: self.sample_rate,
            channels: self.channels,
            samples: Arc::clone(&self.samples),
            start_frame: self.start_frame + start,
            frame_count: end - start,
        }
    }
}

impl Debug for PcmBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PcmBuffer")
            .field("sample_rate", &self.sample_rate)
            .field("channels", &self.channels)
            .field("frames", &self.frame_count)
            .field("duration_ms", &self.duration_ms())
            .finish()
    }
}

/// Decode, slice and encode operations needed by the exporter
#[async_trait]
pub trait AudioCodec: Send + Sync + Debug {
    /// Decode a complete source file
    async fn decode(&self, bytes: &[u8], format: AudioFormat) -> Result<PcmBuffer, CodecError>;

    /// Extract the half-open millisecond range `[start_ms, end_ms)`
    fn slice(&self, buffer: &PcmBuffer, start_ms: i64, end_ms: i64) -> Result<PcmBuffer, CodecError> {
        Ok(buffer.slice_ms(start_ms, end_ms))
    }

    /// Encode a buffer into the given container format
    async fn encode(&self, buffer: &PcmBuffer, format: AudioFormat) -> Result<Vec<u8>, CodecError>;
}
