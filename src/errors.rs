/*!
 * Error types for the subslice application.
 *
 * This module contains custom error types for the different stages of the
 * segmentation pipeline, using the thiserror crate for ergonomic error definitions.
 * The application layer wraps them in `anyhow` errors with context.
 */

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading or interpreting subtitle data
#[derive(Error, Debug)]
pub enum SubtitleError {
    /// A timestamp string is not in `HH:MM:SS,mmm` form
    #[error("Invalid timestamp format: {0}")]
    InvalidTimestamp(String),

    /// The subtitle file could not be read
    #[error("Failed to read subtitle file {path:?}: {source}")]
    Read {
        /// Path of the subtitle file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised by the audio codec backend
#[derive(Error, Debug)]
pub enum CodecError {
    /// The requested audio format is not known to the codec
    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(String),

    /// The external tool could not be started
    #[error("Failed to run {tool}: {message}")]
    ToolUnavailable {
        /// Tool name or path
        tool: String,
        /// Reason reported by the OS
        message: String,
    },

    /// The external tool did not finish in time
    #[error("{tool} timed out after {secs} seconds")]
    Timeout {
        /// Tool name or path
        tool: String,
        /// Timeout that was exceeded
        secs: u64,
    },

    /// Stream information could not be read from the source
    #[error("Failed to probe audio stream: {0}")]
    Probe(String),

    /// The source audio could not be decoded
    #[error("Failed to decode audio: {0}")]
    Decode(String),

    /// A slice could not be encoded
    #[error("Failed to encode audio: {0}")]
    Encode(String),

    /// Temporary file handling failed
    #[error("Codec I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur while exporting cue segments
#[derive(Error, Debug)]
pub enum ExportError {
    /// The output directory already exists
    #[error("Output directory already exists: {0:?}")]
    AlreadyExists(PathBuf),

    /// Slicing or encoding a cue failed
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// Writing to the output directory failed
    #[error("Failed to write {path:?}: {source}")]
    Io {
        /// Path that was being written
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl ExportError {
    /// Wrap an I/O error with the path it occurred on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}
