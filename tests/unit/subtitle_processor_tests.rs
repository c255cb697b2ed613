/*!
 * Tests for subtitle parsing functionality
 */

use std::cmp::Ordering;

use anyhow::Result;
use subslice::errors::SubtitleError;
use subslice::subtitle_processor::{
    compare_cue_ids, format_timestamp, parse_timestamp, Cue, CueParser, Timeline, TimeSpan,
};

use crate::common;

/// Test parsing a regular SRT timestamp
#[test]
fn test_parse_timestamp_withValidInput_shouldReturnMilliseconds() {
    assert_eq!(parse_timestamp("00:01:16,326").unwrap(), 76_326);
    assert_eq!(parse_timestamp("01:00:00,000").unwrap(), 3_600_000);
    assert_eq!(parse_timestamp("00:00:00,000").unwrap(), 0);
}

/// Test that surrounding whitespace is ignored
#[test]
fn test_parse_timestamp_withSurroundingWhitespace_shouldIgnoreIt() {
    assert_eq!(parse_timestamp(" 00:00:02,500 ").unwrap(), 2_500);
}

/// Test that fields are not range checked
#[test]
fn test_parse_timestamp_withOutOfRangeMinutes_shouldStillCombineFields() {
    assert_eq!(parse_timestamp("00:75:00,000").unwrap(), 75 * 60_000);
}

/// Test rejecting malformed timestamps
#[test]
fn test_parse_timestamp_withMalformedInput_shouldFail() {
    for input in [
        "",
        "00:01",
        "00:00:01.000",
        "aa:00:01,000",
        "00:00:01,",
        "00:00:00:01,000",
        "99999999999999:00:00,000",
        "00:00:00,99999999999999999999",
    ] {
        match parse_timestamp(input) {
            Err(SubtitleError::InvalidTimestamp(value)) => assert_eq!(value, input),
            other => panic!("expected InvalidTimestamp for {:?}, got {:?}", input, other),
        }
    }
}

/// Test formatting milliseconds back to SRT form
#[test]
fn test_format_timestamp_shouldPadAllFields() {
    assert_eq!(format_timestamp(76_326), "00:01:16,326");
    assert_eq!(format_timestamp(3_723_004), "01:02:03,004");
}

/// Test numeric ordering of cue ids
#[test]
fn test_compare_cue_ids_shouldCompareNumerically() {
    assert_eq!(compare_cue_ids("2", "10"), Ordering::Less);
    assert_eq!(compare_cue_ids("10", "9"), Ordering::Greater);
    assert_eq!(compare_cue_ids("007", "7"), Ordering::Equal);
    assert_eq!(compare_cue_ids("007", "10"), Ordering::Less);
    assert_eq!(
        compare_cue_ids("123456789012345678901234567890", "99"),
        Ordering::Greater
    );
}

/// Test parsing three complete cues
#[test]
fn test_parse_srt_string_withCompleteSentences_shouldKeepEveryCue() {
    let timeline = Timeline::parse_srt_string(common::THREE_CUE_SRT);

    assert_eq!(timeline.len(), 3);
    let ids: Vec<&str> = timeline.iter().map(|cue| cue.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2", "3"]);

    let second = timeline.get(1).unwrap();
    assert_eq!(second.text, "This is the second cue. ");
    assert_eq!(second.spans, vec![TimeSpan::new(2_000, 3_000)]);
}

/// Test merging numbered blocks of one sentence
#[test]
fn test_parse_srt_string_withUnfinishedSentence_shouldMergeFollowingBlock() {
    let timeline = Timeline::parse_srt_string(common::SPLIT_SENTENCE_SRT);

    assert_eq!(timeline.len(), 1);
    let cue = timeline.get(0).unwrap();
    assert_eq!(cue.id, "1");
    assert_eq!(cue.text, "Hello world. ");
    assert_eq!(cue.spans.len(), 2);
    assert_eq!(cue.effective_start_ms(), 1_000);
    assert_eq!(cue.effective_end_ms(), 4_000);
    assert_eq!(cue.start_spans().collect::<Vec<_>>(), vec![1_000, 2_500]);
    assert_eq!(cue.end_spans().collect::<Vec<_>>(), vec![2_000, 4_000]);
}

/// Test that a merge chain continues until a terminator appears
#[test]
fn test_parse_srt_string_withLongSentence_shouldMergeAllBlocks() {
    let srt = common::build_srt(&[
        ("1", 0, 1_000, "One"),
        ("2", 1_000, 2_000, "two"),
        ("3", 2_000, 3_000, "three."),
        ("4", 4_000, 5_000, "Four."),
    ]);
    let timeline = Timeline::parse_srt_string(&srt);

    assert_eq!(timeline.len(), 2);
    assert_eq!(timeline.get(0).unwrap().text, "One two three. ");
    assert_eq!(timeline.get(0).unwrap().effective_end_ms(), 3_000);
    assert_eq!(timeline.get(1).unwrap().id, "4");
}

/// Test multi-line text within one block
#[test]
fn test_parse_srt_string_withMultiLineText_shouldJoinWithSpaces() {
    let srt = "1\n00:00:01,000 --> 00:00:02,000\nLine one\nLine two.\n";
    let timeline = Timeline::parse_srt_string(srt);

    assert_eq!(timeline.get(0).unwrap().text, "Line one Line two. ");
    assert_eq!(timeline.get(0).unwrap().trimmed_text(), "Line one Line two.");
}

/// Test that cues are sorted numerically regardless of source order
#[test]
fn test_parse_srt_string_withOutOfOrderIds_shouldSortNumerically() {
    let srt = common::build_srt(&[
        ("10", 20_000, 21_000, "Ten."),
        ("2", 3_000, 4_000, "Two."),
        ("1", 1_000, 2_000, "One."),
    ]);
    let timeline = Timeline::parse_srt_string(&srt);

    let ids: Vec<&str> = timeline.iter().map(|cue| cue.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2", "10"]);
}

/// Test that the BOM and Windows line endings are handled
#[test]
fn test_parse_srt_string_withBomAndCrlf_shouldParseNormally() {
    let srt = "\u{feff}1\r\n00:00:01,000 --> 00:00:02,000\r\nHello.\r\n\r\n2\r\n00:00:03,000 --> 00:00:04,000\r\nBye.\r\n";
    let timeline = Timeline::parse_srt_string(srt);

    assert_eq!(timeline.len(), 2);
    assert_eq!(timeline.get(0).unwrap().id, "1");
    assert_eq!(timeline.get(0).unwrap().text, "Hello. ");
    assert_eq!(timeline.get(1).unwrap().effective_start_ms(), 3_000);
}

/// Test that a lone carriage return separates lines
#[test]
fn test_parse_srt_string_withCarriageReturnLineEndings_shouldSplitLines() {
    let srt = "1\r00:00:01,000 --> 00:00:02,000\rHello.\r\r2\r00:00:03,000 --> 00:00:04,000\rBye.\r";
    let timeline = Timeline::parse_srt_string(srt);

    assert_eq!(timeline.len(), 2);
    assert_eq!(timeline.get(0).unwrap().text, "Hello. ");
    assert_eq!(timeline.get(1).unwrap().spans, vec![TimeSpan::new(3_000, 4_000)]);
}

/// Test that only ASCII digit lines open cues
#[test]
fn test_parse_srt_string_withNonAsciiDigitLine_shouldKeepItAsText() {
    let srt = "1\n00:00:01,000 --> 00:00:02,000\nDone.\n\n\u{0662}\n00:00:03,000 --> 00:00:04,000\nMore.\n";
    let timeline = Timeline::parse_srt_string(srt);

    assert_eq!(timeline.len(), 1);
    assert_eq!(timeline.get(0).unwrap().text, "Done. \u{0662} More. ");
    assert_eq!(timeline.get(0).unwrap().spans.len(), 2);
}

/// Test that ids with the same numeric value keep source order
#[test]
fn test_parse_srt_string_withEqualNumericIds_shouldKeepSourceOrder() {
    let srt = common::build_srt(&[
        ("7", 0, 1_000, "Plain."),
        ("007", 2_000, 3_000, "Padded."),
        ("3", 4_000, 5_000, "Three."),
    ]);
    let timeline = Timeline::parse_srt_string(&srt);

    let ids: Vec<&str> = timeline.iter().map(|cue| cue.id.as_str()).collect();
    assert_eq!(ids, vec!["3", "7", "007"]);
}

/// Test that a malformed time line becomes text
#[test]
fn test_parse_srt_string_withMalformedTimeLine_shouldTreatItAsText() {
    let srt = "1\n00:00:01,000 --> 00:00:02,000\n00:00:03.000 --> 00:00:04.000\nDone.\n";
    let timeline = Timeline::parse_srt_string(srt);

    let cue = timeline.get(0).unwrap();
    assert_eq!(cue.spans.len(), 1);
    assert_eq!(cue.text, "00:00:03.000 --> 00:00:04.000 Done. ");
}

/// Test that lines before the first cue number are skipped
#[test]
fn test_parse_srt_string_withLeadingStrayLines_shouldIgnoreThem() {
    common::init_test_logging();
    let srt = "Preamble text\n00:00:00,000 --> 00:00:00,500\n\n1\n00:00:01,000 --> 00:00:02,000\nHello.\n";
    let timeline = Timeline::parse_srt_string(srt);

    assert_eq!(timeline.len(), 1);
    assert_eq!(timeline.get(0).unwrap().spans, vec![TimeSpan::new(1_000, 2_000)]);
    assert_eq!(timeline.get(0).unwrap().text, "Hello. ");
}

/// Test that a block without a time span is dropped
#[test]
fn test_parse_srt_string_withSpanlessBlock_shouldDropIt() {
    let srt = "1\nNo timing here.\n\n2\n00:00:01,000 --> 00:00:02,000\nTimed.\n";
    let timeline = Timeline::parse_srt_string(srt);

    assert_eq!(timeline.len(), 1);
    assert_eq!(timeline.get(0).unwrap().id, "2");
}

/// Test that a repeated id keeps only the later block
#[test]
fn test_parse_srt_string_withDuplicateId_shouldKeepLaterBlock() {
    let srt = common::build_srt(&[
        ("1", 0, 1_000, "First."),
        ("1", 5_000, 6_000, "Again."),
    ]);
    let timeline = Timeline::parse_srt_string(&srt);

    assert_eq!(timeline.len(), 1);
    assert_eq!(timeline.get(0).unwrap().text, "Again. ");
    assert_eq!(timeline.get(0).unwrap().effective_start_ms(), 5_000);
}

/// Test that a repeated id keeps the position of its first appearance
#[test]
fn test_parse_srt_string_withDuplicateIdAfterEqualValue_shouldKeepFirstPosition() {
    let srt = common::build_srt(&[
        ("01", 0, 1_000, "Padded."),
        ("1", 2_000, 3_000, "Plain."),
        ("01", 4_000, 5_000, "Padded again."),
    ]);
    let timeline = Timeline::parse_srt_string(&srt);

    let ids: Vec<&str> = timeline.iter().map(|cue| cue.id.as_str()).collect();
    assert_eq!(ids, vec!["01", "1"]);
    assert_eq!(timeline.get(0).unwrap().text, "Padded again. ");
}

/// Test custom sentence terminators
#[test]
fn test_parse_srt_string_withQuestionTerminator_shouldSplitOnQuestionMark() {
    let srt = common::build_srt(&[
        ("1", 0, 1_000, "Ready?"),
        ("2", 1_500, 2_500, "Go."),
    ]);

    let merged = Timeline::parse_srt_string(&srt);
    assert_eq!(merged.len(), 1);
    assert_eq!(merged.get(0).unwrap().text, "Ready? Go. ");

    let split = Timeline::parse_srt_string_with_terminators(&srt, &['.', '?']);
    assert_eq!(split.len(), 2);
    assert_eq!(split.get(1).unwrap().id, "2");
}

/// Test the transition guard of the line parser
#[test]
fn test_cue_parser_accepts_new_cue_shouldFollowOpenCueText() {
    let mut parser = CueParser::default();
    assert!(parser.accepts_new_cue());

    parser.feed_line("1");
    // An open cue without text counts as finished
    assert!(parser.accepts_new_cue());

    parser.feed_line("00:00:01,000 --> 00:00:02,000");
    parser.feed_line("Half a");
    assert!(!parser.accepts_new_cue());

    parser.feed_line("2");
    assert_eq!(parser.open_cue().unwrap().id, "1");

    parser.feed_line("sentence.");
    assert!(parser.accepts_new_cue());

    let timeline = parser.finish();
    assert_eq!(timeline.len(), 1);
    assert_eq!(timeline.get(0).unwrap().text, "Half a sentence. ");
}

/// Test the sentence check on cues
#[test]
fn test_cue_ends_sentence_shouldLookAtLastNonSpaceCharacter() {
    let cue = Cue::with_span("1", 0, 1_000, "Done.");
    assert!(cue.ends_sentence(&['.']));
    assert!(!cue.ends_sentence(&['!']));

    let open = Cue::with_span("2", 0, 1_000, "Not done");
    assert!(!open.ends_sentence(&['.']));

    assert!(Cue::new("3").ends_sentence(&['.']));
}

/// Test that the number of cues is the number of distinct sentence starts
#[test]
fn test_parse_srt_string_cueCount_shouldNotExceedDistinctIds() {
    let srt = common::build_srt(&[
        ("1", 0, 1_000, "A"),
        ("2", 1_000, 2_000, "b."),
        ("3", 3_000, 4_000, "C."),
        ("4", 5_000, 6_000, "D"),
        ("5", 6_000, 7_000, "e"),
    ]);
    let timeline = Timeline::parse_srt_string(&srt);

    assert_eq!(timeline.len(), 3);
    for cue in &timeline {
        assert!(!cue.spans.is_empty());
    }
}

/// Test reading a subtitle file from disk
#[test]
fn test_parse_srt_file_withExistingFile_shouldParse() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_subtitle(temp_dir.path(), "talk.srt")?;

    let timeline = Timeline::parse_srt_file(&path, &['.'])?;
    assert_eq!(timeline.len(), 3);
    Ok(())
}

/// Test reading a missing subtitle file
#[test]
fn test_parse_srt_file_withMissingFile_shouldReturnReadError() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("missing.srt");

    match Timeline::parse_srt_file(&path, &['.']) {
        Err(SubtitleError::Read { path: failed, .. }) => assert_eq!(failed, path),
        other => panic!("expected read error, got {:?}", other),
    }
    Ok(())
}

/// Test the timeline summary
#[test]
fn test_timeline_display_shouldSummarizeSpan() {
    let timeline = Timeline::parse_srt_string(common::THREE_CUE_SRT);
    let summary = timeline.to_string();

    assert!(summary.contains("Cues: 3"));
    assert!(summary.contains("00:00:00,000 - 00:00:12,000"));
}
