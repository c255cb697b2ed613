/*!
 * Tests for export window planning
 */

use subslice::boundary_planner::{plan_boundaries, plan_window, DEFAULT_MAX_GAP_MS};
use subslice::subtitle_processor::{Cue, Timeline};

use crate::common;

fn timeline_from_spans(spans: &[(u64, u64)]) -> Timeline {
    Timeline::from_cues(
        spans
            .iter()
            .enumerate()
            .map(|(i, (start, end))| Cue::with_span((i + 1).to_string(), *start, *end, "Sentence.")),
    )
}

/// Test the three-cue scenario with a 1000 ms and an 8000 ms gap
#[test]
fn test_plan_boundaries_withMixedGaps_shouldSplitCappedGaps() {
    let timeline = Timeline::parse_srt_string(common::THREE_CUE_SRT);
    let windows = plan_boundaries(&timeline, DEFAULT_MAX_GAP_MS);

    assert_eq!(windows.len(), 3);

    // First cue: no left padding, half of the 1000 ms gap on the right
    assert_eq!((windows[0].export_start_ms, windows[0].export_end_ms), (0, 1_500));
    // Middle cue: 500 ms on the left, half of the capped 5000 ms on the right
    assert_eq!((windows[1].export_start_ms, windows[1].export_end_ms), (1_500, 5_500));
    // Last cue: no right padding
    assert_eq!((windows[2].export_start_ms, windows[2].export_end_ms), (8_500, 12_000));
}

/// Test that the window index follows the timeline position
#[test]
fn test_plan_boundaries_shouldNumberWindowsByPosition() {
    let timeline = timeline_from_spans(&[(0, 1_000), (2_000, 3_000), (4_000, 5_000)]);
    let indexes: Vec<usize> = plan_boundaries(&timeline, DEFAULT_MAX_GAP_MS)
        .iter()
        .map(|window| window.index)
        .collect();
    assert_eq!(indexes, vec![0, 1, 2]);
}

/// Test that gaps beyond the cap pad exactly like the cap
#[test]
fn test_plan_boundaries_withHugeGap_shouldMatchCappedGap() {
    let capped = plan_boundaries(&timeline_from_spans(&[(0, 1_000), (6_000, 7_000)]), DEFAULT_MAX_GAP_MS);
    let huge = plan_boundaries(&timeline_from_spans(&[(0, 1_000), (21_000, 22_000)]), DEFAULT_MAX_GAP_MS);

    assert_eq!(capped[0].export_end_ms, 3_500);
    assert_eq!(huge[0].export_end_ms, 3_500);
    assert_eq!(huge[1].export_start_ms, 21_000 - 2_500);
    assert_eq!(capped[1].duration_ms(), huge[1].duration_ms());
}

/// Test that neighbors never overlap while the gap is within twice the cap
#[test]
fn test_plan_boundaries_withGapsUpToTwiceTheCap_shouldNotOverlap() {
    for gap in [0u64, 1, 2, 999, 1_000, 4_999, 5_000, 7_777, 10_000] {
        let timeline = timeline_from_spans(&[(0, 1_000), (1_000 + gap, 2_000 + gap)]);
        let windows = plan_boundaries(&timeline, DEFAULT_MAX_GAP_MS);

        let (_, first_end) = windows[0].slice_range();
        let (second_start, _) = windows[1].slice_range();
        assert!(
            first_end <= second_start + 1,
            "gap {}: first ends at {}, second starts at {}",
            gap,
            first_end,
            second_start
        );
        assert!(windows[0].export_end_ms <= windows[1].export_start_ms, "gap {}", gap);
    }
}

/// Test that boundaries meet exactly when an uncapped gap splits evenly
#[test]
fn test_plan_boundaries_withGapWithinCap_shouldMeetOnlyForEvenGaps() {
    for gap in [0u64, 1, 2, 999, 1_000, 2_501, 4_999, 5_000] {
        let timeline = timeline_from_spans(&[(0, 1_000), (1_000 + gap, 2_000 + gap)]);
        let windows = plan_boundaries(&timeline, DEFAULT_MAX_GAP_MS);

        assert_eq!(
            windows[0].export_end_ms == windows[1].export_start_ms,
            gap % 2 == 0,
            "gap {}",
            gap
        );
        // An odd gap leaves exactly one millisecond between the windows
        if gap % 2 == 1 {
            assert_eq!(windows[1].export_start_ms - windows[0].export_end_ms, 1, "gap {}", gap);
        }
    }
}

/// Test that padding never goes before the cue start of a lone cue
#[test]
fn test_plan_boundaries_withSingleCue_shouldUseCueBounds() {
    let windows = plan_boundaries(&timeline_from_spans(&[(2_000, 3_000)]), DEFAULT_MAX_GAP_MS);
    assert_eq!(windows[0].slice_range(), (2_000, 3_001));
    assert_eq!(windows[0].duration_ms(), 1_000);
}

/// Test that merged cues are padded from their outer spans
#[test]
fn test_plan_boundaries_withMergedCue_shouldUseEffectiveBounds() {
    let srt = common::build_srt(&[
        ("1", 1_000, 2_000, "Hello"),
        ("2", 2_500, 4_000, "world."),
        ("3", 6_000, 7_000, "Next."),
    ]);
    let timeline = Timeline::parse_srt_string(&srt);
    let windows = plan_boundaries(&timeline, DEFAULT_MAX_GAP_MS);

    assert_eq!(windows.len(), 2);
    assert_eq!(windows[0].export_start_ms, 1_000);
    assert_eq!(windows[0].export_end_ms, 5_000);
    assert_eq!(windows[1].export_start_ms, 5_000);
}

/// Test an empty timeline
#[test]
fn test_plan_boundaries_withEmptyTimeline_shouldReturnNoWindows() {
    assert!(plan_boundaries(&Timeline::default(), DEFAULT_MAX_GAP_MS).is_empty());
    assert!(plan_window(&Timeline::default(), 0, DEFAULT_MAX_GAP_MS).is_none());
}

/// Test a zero cap
#[test]
fn test_plan_boundaries_withZeroCap_shouldNotPad() {
    let windows = plan_boundaries(&timeline_from_spans(&[(0, 1_000), (3_000, 4_000)]), 0);
    assert_eq!(windows[0].export_end_ms, 1_000);
    assert_eq!(windows[1].export_start_ms, 3_000);
}
