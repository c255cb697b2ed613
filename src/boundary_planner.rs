/*!
 * Export window planning.
 *
 * Each cue is widened into the silence around it. The gap to a neighbor is
 * capped at `max_gap_ms` and split in half, so a cue takes at most half of the
 * capped gap on each side and two neighbors never claim the same millisecond
 * while the natural gap stays within twice the cap. The first cue gets no
 * left padding and the last cue gets no right padding.
 */

use crate::subtitle_processor::{Cue, Timeline};

/// Largest inter-cue gap that contributes padding, in milliseconds
pub const DEFAULT_MAX_GAP_MS: u64 = 5_000;

/// Export boundaries of one cue in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportWindow {
    /// Position of the cue in the timeline
    pub index: usize,
    pub export_start_ms: i64,
    pub export_end_ms: i64,
}

impl ExportWindow {
    /// Half-open range handed to the audio slicer.
    ///
    /// The end boundary is inclusive, so one millisecond is added.
    pub fn slice_range(&self) -> (i64, i64) {
        (self.export_start_ms, self.export_end_ms + 1)
    }

    pub fn duration_ms(&self) -> i64 {
        self.export_end_ms - self.export_start_ms
    }
}

/// Half of the capped gap, rounded toward negative infinity
fn half_capped_gap(gap: i64, max_gap_ms: u64) -> i64 {
    let cap = i64::try_from(max_gap_ms).unwrap_or(i64::MAX);
    gap.min(cap).div_euclid(2)
}

fn start_of(cue: &Cue) -> i64 {
    cue.effective_start_ms() as i64
}

fn end_of(cue: &Cue) -> i64 {
    cue.effective_end_ms() as i64
}

/// Compute the export window of the cue at `index`.
///
/// Returns `None` when `index` is out of range.
pub fn plan_window(timeline: &Timeline, index: usize, max_gap_ms: u64) -> Option<ExportWindow> {
    let cue = timeline.get(index)?;
    let cur_start = start_of(cue);
    let cur_end = end_of(cue);

    let export_start_ms = match index.checked_sub(1).and_then(|prev| timeline.get(prev)) {
        Some(prev) => cur_start - half_capped_gap(cur_start - end_of(prev), max_gap_ms),
        None => cur_start,
    };

    let export_end_ms = match timeline.get(index + 1) {
        Some(next) => cur_end + half_capped_gap(start_of(next) - cur_end, max_gap_ms),
        None => cur_end,
    };

    Some(ExportWindow {
        index,
        export_start_ms,
        export_end_ms,
    })
}

/// Compute one export window per cue, in timeline order
pub fn plan_boundaries(timeline: &Timeline, max_gap_ms: u64) -> Vec<ExportWindow> {
    (0..timeline.len())
        .filter_map(|index| plan_window(timeline, index, max_gap_ms))
        .collect()
}
