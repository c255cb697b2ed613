/*!
 * # subslice - Subtitle-driven audio slicing
 *
 * A Rust library that cuts an audio track into one clip per subtitle cue.
 *
 * ## Features
 *
 * - Tolerant SRT parsing that merges numbered blocks splitting one sentence
 * - Export windows that share the silence between neighbouring cues
 * - One audio clip and one text file per cue
 * - ffmpeg-backed decoding and encoding (mp3, wav, flac, ogg, opus, m4a, aac)
 * - Bounded concurrent export
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `subtitle_processor`: SRT parsing into an ordered cue timeline
 * - `boundary_planner`: Export window computation
 * - `exporter`: Per-cue slicing and file output
 * - `audio`: Audio codec trait and the ffmpeg backend
 * - `file_utils`: File system operations
 * - `app_controller`: Main application controller
 * - `errors`: Custom error types for the application
 *
 * The pipeline is `parse -> plan_boundaries -> export`:
 *
 * ```
 * use subslice::boundary_planner::{plan_boundaries, DEFAULT_MAX_GAP_MS};
 * use subslice::subtitle_processor::Timeline;
 *
 * let timeline = Timeline::parse_srt_string(
 *     "1\n00:00:01,000 --> 00:00:02,000\nHello.\n\n2\n00:00:03,000 --> 00:00:04,000\nBye.\n",
 * );
 * let windows = plan_boundaries(&timeline, DEFAULT_MAX_GAP_MS);
 * assert_eq!(windows[0].export_end_ms, 2_500);
 * assert_eq!(windows[1].export_start_ms, 2_500);
 * ```
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod audio;
pub mod boundary_planner;
pub mod exporter;
pub mod file_utils;
pub mod subtitle_processor;
pub mod app_controller;
pub mod errors;

// Re-export main types for easier usage
pub use app_config::Config;
pub use audio::{AudioCodec, AudioFormat, FfmpegCodec, PcmBuffer};
pub use boundary_planner::{plan_boundaries, ExportWindow};
pub use exporter::{ExportOptions, ExportSummary, SegmentExporter};
pub use subtitle_processor::{parse_timestamp, Cue, CueParser, Timeline};
pub use errors::{CodecError, ExportError, SubtitleError};
