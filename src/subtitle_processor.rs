use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;
use regex::Regex;
use once_cell::sync::Lazy;
use log::{debug, warn};
use crate::errors::SubtitleError;

// @module: Subtitle parsing into an ordered cue timeline

/// Characters that close a sentence unless configured otherwise
pub const DEFAULT_SENTENCE_TERMINATORS: &[char] = &['.'];

// @const: SRT time-span line, matched against the whole trimmed line
static TIME_SPAN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9]{2}:[0-9]{2}:[0-9]{2},[0-9]{3}\s-->\s[0-9]{2}:[0-9]{2}:[0-9]{2},[0-9]{3}$").unwrap()
});

const BYTE_ORDER_MARK: char = '\u{feff}';

/// Parse an SRT timestamp (`HH:MM:SS,mmm`) to milliseconds.
///
/// Surrounding whitespace is ignored. Components are combined as
/// `hours * 3_600_000 + minutes * 60_000 + seconds * 1_000 + millis`
/// without range checks on the individual fields. A total that does not fit
/// in `u64` is rejected.
pub fn parse_timestamp(timestamp: &str) -> Result<u64, SubtitleError> {
    let invalid = || SubtitleError::InvalidTimestamp(timestamp.to_string());
    let trimmed = timestamp.trim();

    let mut parts = trimmed.split(':');
    let (Some(hours), Some(minutes), Some(rest), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(invalid());
    };
    let (seconds, millis) = rest.split_once(',').ok_or_else(invalid)?;

    let field = |value: &str| -> Result<u64, SubtitleError> {
        if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        value.parse::<u64>().map_err(|_| invalid())
    };

    let (hours, minutes, seconds, millis) = (field(hours)?, field(minutes)?, field(seconds)?, field(millis)?);
    hours
        .checked_mul(3_600_000)
        .and_then(|total| total.checked_add(minutes.checked_mul(60_000)?))
        .and_then(|total| total.checked_add(seconds.checked_mul(1_000)?))
        .and_then(|total| total.checked_add(millis))
        .ok_or_else(invalid)
}

/// Format a timestamp in milliseconds to SRT format (HH:MM:SS,mmm)
pub fn format_timestamp(ms: u64) -> String {
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1_000;
    let millis = ms % 1_000;

    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
}

/// Compare two cue ids by numeric value.
///
/// Ids are digit strings of arbitrary length, so the comparison strips
/// leading zeros and compares length first instead of parsing to an integer.
pub fn compare_cue_ids(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn is_cue_id_line(line: &str) -> bool {
    !line.is_empty() && line.bytes().all(|b| b.is_ascii_digit())
}

/// Split on `\n`, `\r\n` and a lone `\r`
fn universal_lines(content: &str) -> impl Iterator<Item = &str> {
    content
        .split('\n')
        .flat_map(|line| line.strip_suffix('\r').unwrap_or(line).split('\r'))
}

// @struct: One `start --> end` line of a cue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSpan {
    // @field: Start time in ms
    pub start_ms: u64,

    // @field: End time in ms
    pub end_ms: u64,
}

impl TimeSpan {
    pub fn new(start_ms: u64, end_ms: u64) -> Self {
        TimeSpan { start_ms, end_ms }
    }
}

// @struct: One subtitle block, possibly merged from several numbered blocks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cue {
    // @field: Sequence number as written in the source, used as the output file stem
    pub id: String,

    // @field: Text lines, each followed by a single space
    pub text: String,

    // @field: Time spans in source order
    pub spans: Vec<TimeSpan>,
}

impl Cue {
    /// Create an empty cue with the given id
    pub fn new(id: impl Into<String>) -> Self {
        Cue {
            id: id.into(),
            text: String::new(),
            spans: Vec::new(),
        }
    }

    /// Create a cue with a single span and the given text, used by tests and benches
    pub fn with_span(id: impl Into<String>, start_ms: u64, end_ms: u64, text: &str) -> Self {
        let mut cue = Self::new(id);
        cue.push_span(TimeSpan::new(start_ms, end_ms));
        cue.push_text_line(text);
        cue
    }

    pub fn push_span(&mut self, span: TimeSpan) {
        self.spans.push(span);
    }

    /// Append a text line followed by the word separator
    pub fn push_text_line(&mut self, line: &str) {
        self.text.push_str(line);
        self.text.push(' ');
    }

    /// Start of the first span. Cues inside a [`Timeline`] always have one.
    pub fn effective_start_ms(&self) -> u64 {
        self.spans.first().map_or(0, |span| span.start_ms)
    }

    /// End of the last span. Cues inside a [`Timeline`] always have one.
    pub fn effective_end_ms(&self) -> u64 {
        self.spans.last().map_or(0, |span| span.end_ms)
    }

    pub fn start_spans(&self) -> impl Iterator<Item = u64> + '_ {
        self.spans.iter().map(|span| span.start_ms)
    }

    pub fn end_spans(&self) -> impl Iterator<Item = u64> + '_ {
        self.spans.iter().map(|span| span.end_ms)
    }

    pub fn trimmed_text(&self) -> &str {
        self.text.trim()
    }

    /// Whether the accumulated text closes a sentence.
    ///
    /// A cue without text has nothing left to continue and counts as closed.
    pub fn ends_sentence(&self, terminators: &[char]) -> bool {
        self.text
            .trim()
            .chars()
            .last()
            .is_none_or(|last| terminators.contains(&last))
    }
}

impl fmt::Display for Cue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.id)?;
        for span in &self.spans {
            writeln!(f, "{} --> {}", format_timestamp(span.start_ms), format_timestamp(span.end_ms))?;
        }
        writeln!(f, "{}", self.trimmed_text())?;
        writeln!(f)
    }
}

/// Line-oriented parser state.
///
/// `open_cue` points at the cue receiving span and text lines. A digit
/// line only opens a new cue when [`CueParser::accepts_new_cue`] allows it;
/// otherwise it is stray numbering inside an unfinished sentence and the
/// following lines keep extending the open cue.
///
/// Cues are kept in the order their id was first seen.
#[derive(Debug)]
pub struct CueParser {
    open_cue: Option<usize>,
    cues: Vec<Cue>,
    positions: HashMap<String, usize>,
    terminators: Vec<char>,
    line_number: usize,
}

impl Default for CueParser {
    fn default() -> Self {
        Self::new(DEFAULT_SENTENCE_TERMINATORS)
    }
}

impl CueParser {
    pub fn new(terminators: &[char]) -> Self {
        CueParser {
            open_cue: None,
            cues: Vec::new(),
            positions: HashMap::new(),
            terminators: terminators.to_vec(),
            line_number: 0,
        }
    }

    /// The cue currently receiving lines, if any
    pub fn open_cue(&self) -> Option<&Cue> {
        self.open_cue.and_then(|position| self.cues.get(position))
    }

    fn open_cue_mut(&mut self) -> Option<&mut Cue> {
        self.open_cue.and_then(|position| self.cues.get_mut(position))
    }

    /// Transition guard for digit lines
    pub fn accepts_new_cue(&self) -> bool {
        self.open_cue().is_none_or(|cue| cue.ends_sentence(&self.terminators))
    }

    /// Feed one raw line of subtitle text
    pub fn feed_line(&mut self, raw: &str) {
        self.line_number += 1;
        let line = raw.trim();

        if line.is_empty() {
            return;
        }

        if is_cue_id_line(line) {
            if self.accepts_new_cue() {
                self.open(line);
            } else {
                debug!("Merging numbered block {} into unfinished cue at line {}", line, self.line_number);
            }
            return;
        }

        let line_number = self.line_number;
        if TIME_SPAN_REGEX.is_match(line) {
            let span = match Self::parse_span(line) {
                Some(span) => span,
                None => return,
            };
            match self.open_cue_mut() {
                Some(cue) => cue.push_span(span),
                None => warn!("Ignoring time span before any cue number at line {}: {}", line_number, line),
            }
            return;
        }

        match self.open_cue_mut() {
            Some(cue) => cue.push_text_line(line),
            None => warn!("Ignoring text before any cue number at line {}: {}", line_number, line),
        }
    }

    fn open(&mut self, id: &str) {
        let position = match self.positions.get(id) {
            Some(&position) => {
                warn!("Cue {} appears more than once, keeping the later block (line {})", id, self.line_number);
                self.cues[position] = Cue::new(id);
                position
            }
            None => {
                self.cues.push(Cue::new(id));
                self.positions.insert(id.to_string(), self.cues.len() - 1);
                self.cues.len() - 1
            }
        };
        self.open_cue = Some(position);
    }

    fn parse_span(line: &str) -> Option<TimeSpan> {
        let (start, end) = line.split_once("-->")?;
        // The regex guarantees both sides are well formed
        let start_ms = parse_timestamp(start).ok()?;
        let end_ms = parse_timestamp(end).ok()?;
        Some(TimeSpan::new(start_ms, end_ms))
    }

    /// Close the parser and build the ordered timeline
    pub fn finish(self) -> Timeline {
        Timeline::from_cues(self.cues)
    }
}

/// Cues ordered by numeric id, each with at least one time span
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Timeline {
    cues: Vec<Cue>,
}

impl Timeline {
    /// Build a timeline from cues in any order.
    ///
    /// Cues without a time span cannot be placed on the audio track and are dropped.
    /// The sort is stable, so ids with the same numeric value keep their input order.
    pub fn from_cues<I: IntoIterator<Item = Cue>>(cues: I) -> Self {
        let mut cues: Vec<Cue> = cues
            .into_iter()
            .filter(|cue| {
                if cue.spans.is_empty() {
                    warn!("Dropping cue {} because it has no time span", cue.id);
                    false
                } else {
                    true
                }
            })
            .collect();

        cues.sort_by(|a, b| compare_cue_ids(&a.id, &b.id));

        Timeline { cues }
    }

    /// Parse SRT content with the default sentence terminators
    pub fn parse_srt_string(content: &str) -> Self {
        Self::parse_srt_string_with_terminators(content, DEFAULT_SENTENCE_TERMINATORS)
    }

    /// Parse SRT content, merging numbered blocks until a terminator closes the sentence
    pub fn parse_srt_string_with_terminators(content: &str, terminators: &[char]) -> Self {
        let content = content.strip_prefix(BYTE_ORDER_MARK).unwrap_or(content);

        let mut parser = CueParser::new(terminators);
        for line in universal_lines(content) {
            parser.feed_line(line);
        }

        let timeline = parser.finish();
        debug!("Parsed {} cue(s)", timeline.len());
        timeline
    }

    /// Read and parse an SRT file
    pub fn parse_srt_file<P: AsRef<Path>>(path: P, terminators: &[char]) -> Result<Self, SubtitleError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| SubtitleError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse_srt_string_with_terminators(&content, terminators))
    }

    pub fn cues(&self) -> &[Cue] {
        &self.cues
    }

    pub fn len(&self) -> usize {
        self.cues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Cue> {
        self.cues.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Cue> {
        self.cues.get(index)
    }
}

impl<'a> IntoIterator for &'a Timeline {
    type Item = &'a Cue;
    type IntoIter = std::slice::Iter<'a, Cue>;

    fn into_iter(self) -> Self::IntoIter {
        self.cues.iter()
    }
}

impl fmt::Display for Timeline {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Subtitle Timeline")?;
        writeln!(f, "Cues: {}", self.cues.len())?;
        if let (Some(first), Some(last)) = (self.cues.first(), self.cues.last()) {
            writeln!(
                f,
                "Span: {} - {}",
                format_timestamp(first.effective_start_ms()),
                format_timestamp(last.effective_end_ms())
            )?;
        }
        Ok(())
    }
}
