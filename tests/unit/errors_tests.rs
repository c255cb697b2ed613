/*!
 * Tests for error types
 */

use std::error::Error;
use std::io;
use std::path::PathBuf;

use subslice::errors::{CodecError, ExportError, SubtitleError};

/// Test error messages
#[test]
fn test_error_display_shouldDescribeFailure() {
    let error = SubtitleError::InvalidTimestamp("00:00".to_string());
    assert_eq!(error.to_string(), "Invalid timestamp format: 00:00");

    let error = CodecError::Timeout {
        tool: "ffmpeg".to_string(),
        secs: 30,
    };
    assert_eq!(error.to_string(), "ffmpeg timed out after 30 seconds");

    let error = ExportError::AlreadyExists(PathBuf::from("out"));
    assert!(error.to_string().starts_with("Output directory already exists"));
}

/// Test that wrapped I/O errors keep their source
#[test]
fn test_export_error_io_shouldKeepPathAndSource() {
    let error = ExportError::io("out/1.mp3", io::Error::new(io::ErrorKind::PermissionDenied, "denied"));

    match &error {
        ExportError::Io { path, .. } => assert_eq!(path, &PathBuf::from("out/1.mp3")),
        other => panic!("unexpected variant {:?}", other),
    }
    assert!(error.source().is_some());
}

/// Test that codec failures convert into export errors
#[test]
fn test_export_error_from_codec_error_shouldKeepCodecDetails() {
    let error = ExportError::from(CodecError::Encode("bad frame".to_string()));

    assert!(matches!(error, ExportError::Codec(CodecError::Encode(_))));
    assert_eq!(error.to_string(), "Codec error: Failed to encode audio: bad frame");
}

/// Test recovering a typed error from an anyhow chain
#[test]
fn test_export_error_shouldBeDowncastableFromAnyhow() {
    let error = anyhow::Error::from(ExportError::AlreadyExists(PathBuf::from("out")))
        .context("Failed to export cues");

    assert!(matches!(
        error.downcast_ref::<ExportError>(),
        Some(ExportError::AlreadyExists(_))
    ));
}
