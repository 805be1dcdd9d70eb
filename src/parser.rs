//! Block parser for chat-export intercepts.
//!
//! An export is a sequence of blocks of the form:
//!
//! ```text
//! 05.03.2024, 14:22:10      header (civil date/time)
//! 145.9500                  frequency, MHz
//! Alpha-Net                 radio network
//! UNIT-1                    who
//! UNIT-2                    komu
//! UNIT-3                    zero or more addressees (ignored)
//!                           blank line or body marker ends addressees
//! Hello world               body, up to the next header or EOF
//! ```
//!
//! [`BlockParser`] is an explicit state machine over a [`LineCursor`]. Each
//! call to [`BlockParser::next_block`] walks exactly one block and returns
//! either a [`ParsedBlock`] or a [`SkippedBlock`] describing why it was
//! rejected. A rejected block never swallows the header of the block after
//! it: field states stop in front of any header line they encounter.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

use crate::fingerprint::content_digest;
use crate::models::{ParsedBlock, MAX_BODY_CHARS, MAX_FREQ_MHZ, MAX_RADIONET_CHARS, MIN_FREQ_MHZ};
use crate::timestamp::{CivilTimestamp, TimestampError, TimestampNormalizer};

/// Why a single block was rejected. Always local to that block.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BlockFailure {
    #[error("bad frequency line {line:?}: {detail}")]
    MalformedFrequency { line: String, detail: &'static str },
    #[error("empty '{field}' line")]
    EmptyField { field: &'static str },
    #[error("block ends before the '{field}' line")]
    TruncatedBlock { field: &'static str },
    #[error("invalid header timestamp {header:?}: {reason}")]
    InvalidTimestamp { header: String, reason: String },
    #[error("unexpected: {0}")]
    Unexpected(String),
}

/// A rejected block together with the line its header sits on.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedBlock {
    /// 1-based line number of the header.
    pub line: usize,
    pub failure: BlockFailure,
}

impl fmt::Display for SkippedBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.failure)
    }
}

/// Forward-only cursor over the lines of one export.
#[derive(Debug, Clone)]
pub struct LineCursor<'a> {
    lines: &'a [&'a str],
    pos: usize,
}

impl<'a> LineCursor<'a> {
    pub fn new(lines: &'a [&'a str]) -> Self {
        Self { lines, pos: 0 }
    }

    pub fn peek(&self) -> Option<&'a str> {
        self.lines.get(self.pos).copied()
    }

    pub fn advance(&mut self) -> Option<&'a str> {
        let line = self.peek()?;
        self.pos += 1;
        Some(line)
    }

    /// 1-based number of the line [`peek`](Self::peek) would return.
    pub fn line_number(&self) -> usize {
        self.pos + 1
    }
}

/// States of the block state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseState {
    SeekingHeader,
    ReadFreq,
    ReadNetwork,
    ReadWho,
    ReadKomu,
    ReadAddressees,
    ReadBody,
    /// Block complete, ready to be emitted.
    Emit,
    /// No further header in the input.
    Exhausted,
}

fn header_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[0-9]{2}\.[0-9]{2}\.[0-9]{4}, [0-9]{2}:[0-9]{2}:[0-9]{2}$")
            .expect("header pattern is a valid regex")
    })
}

/// True if `line` (ignoring surrounding whitespace) opens a new block.
pub fn is_header_line(line: &str) -> bool {
    header_regex().is_match(line.trim())
}

fn is_body_marker(line: &str) -> bool {
    line.starts_with('\u{2014}') || line.starts_with("- ")
}

fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

/// Fields gathered while walking one block.
#[derive(Default)]
struct Draft<'a> {
    line: usize,
    civil: Option<CivilTimestamp>,
    freq_mhz: f64,
    radionet: String,
    who: String,
    komu: String,
    body: Vec<&'a str>,
    raw: Vec<&'a str>,
}

impl<'a> Draft<'a> {
    /// Trailing body lines that are empty or whitespace-only are dropped,
    /// not just empty ones. Interior blank lines stay.
    fn finish(self) -> Result<ParsedBlock, BlockFailure> {
        let civil = self
            .civil
            .ok_or_else(|| BlockFailure::Unexpected("block emitted without a header".into()))?;

        let mut body = self.body;
        while body.last().is_some_and(|l| l.trim().is_empty()) {
            body.pop();
        }

        Ok(ParsedBlock {
            line: self.line,
            date: civil.date,
            time: civil.time,
            ts_utc: civil.ts_utc,
            freq_mhz: self.freq_mhz,
            radionet: self.radionet,
            who: self.who,
            komu: self.komu,
            body_full: truncate_chars(&body.join("\n"), MAX_BODY_CHARS),
            src_hash: content_digest(&self.raw.join("\n")),
        })
    }
}

/// State machine turning lines into intercept blocks.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockParser {
    normalizer: TimestampNormalizer,
}

impl BlockParser {
    pub fn new(normalizer: TimestampNormalizer) -> Self {
        Self { normalizer }
    }

    /// Parse the next block at or after the cursor.
    ///
    /// Returns `None` once no header remains. On failure the cursor is left
    /// where the failing state stopped, which is never past a header line.
    pub fn next_block<'a>(
        &self,
        cursor: &mut LineCursor<'a>,
    ) -> Option<Result<ParsedBlock, SkippedBlock>> {
        let mut draft = Draft::default();
        let mut state = ParseState::SeekingHeader;

        loop {
            let step = match state {
                ParseState::SeekingHeader => self.seek_header(cursor, &mut draft),
                ParseState::ReadFreq => read_freq(cursor, &mut draft),
                ParseState::ReadNetwork => read_network(cursor, &mut draft),
                ParseState::ReadWho => read_who(cursor, &mut draft),
                ParseState::ReadKomu => read_komu(cursor, &mut draft),
                ParseState::ReadAddressees => read_addressees(cursor, &mut draft),
                ParseState::ReadBody => read_body(cursor, &mut draft),
                ParseState::Emit => {
                    let line = draft.line;
                    return Some(
                        draft
                            .finish()
                            .map_err(|failure| SkippedBlock { line, failure }),
                    );
                }
                ParseState::Exhausted => return None,
            };

            match step {
                Ok(next) => state = next,
                Err(failure) => {
                    return Some(Err(SkippedBlock {
                        line: draft.line,
                        failure,
                    }))
                }
            }
        }
    }

    fn seek_header<'a>(
        &self,
        cursor: &mut LineCursor<'a>,
        draft: &mut Draft<'a>,
    ) -> Result<ParseState, BlockFailure> {
        while let Some(line) = cursor.peek() {
            if !is_header_line(line) {
                cursor.advance();
                continue;
            }

            draft.line = cursor.line_number();
            cursor.advance();
            draft.raw.push(line);

            let civil = self.normalizer.normalize(line).map_err(|e| match e {
                TimestampError::Invalid(reason) => BlockFailure::InvalidTimestamp {
                    header: line.trim().to_string(),
                    reason,
                },
                other => BlockFailure::Unexpected(other.to_string()),
            })?;
            draft.civil = Some(civil);
            return Ok(ParseState::ReadFreq);
        }
        Ok(ParseState::Exhausted)
    }
}

/// Consume the next line as a required field, refusing to run into EOF or
/// into the next block's header.
fn take_field_line<'a>(
    cursor: &mut LineCursor<'a>,
    draft: &mut Draft<'a>,
    field: &'static str,
) -> Result<&'a str, BlockFailure> {
    match cursor.peek() {
        Some(line) if !is_header_line(line) => {
            cursor.advance();
            draft.raw.push(line);
            Ok(line)
        }
        _ => Err(BlockFailure::TruncatedBlock { field }),
    }
}

fn read_freq<'a>(
    cursor: &mut LineCursor<'a>,
    draft: &mut Draft<'a>,
) -> Result<ParseState, BlockFailure> {
    let line = take_field_line(cursor, draft, "frequency")?;
    let compact: String = line.chars().filter(|c| !c.is_whitespace()).collect();

    let freq: f64 = compact
        .parse()
        .map_err(|_| BlockFailure::MalformedFrequency {
            line: line.trim().to_string(),
            detail: "not a number",
        })?;
    if !(MIN_FREQ_MHZ..=MAX_FREQ_MHZ).contains(&freq) {
        return Err(BlockFailure::MalformedFrequency {
            line: line.trim().to_string(),
            detail: "outside 0.001..=4000 MHz",
        });
    }

    draft.freq_mhz = freq;
    Ok(ParseState::ReadNetwork)
}

fn read_network<'a>(
    cursor: &mut LineCursor<'a>,
    draft: &mut Draft<'a>,
) -> Result<ParseState, BlockFailure> {
    let line = take_field_line(cursor, draft, "radionet")?;
    draft.radionet = truncate_chars(line.trim(), MAX_RADIONET_CHARS);
    Ok(ParseState::ReadWho)
}

fn read_who<'a>(
    cursor: &mut LineCursor<'a>,
    draft: &mut Draft<'a>,
) -> Result<ParseState, BlockFailure> {
    let who = take_field_line(cursor, draft, "who")?.trim();
    if who.is_empty() {
        return Err(BlockFailure::EmptyField { field: "who" });
    }
    draft.who = who.to_string();
    Ok(ParseState::ReadKomu)
}

fn read_komu<'a>(
    cursor: &mut LineCursor<'a>,
    draft: &mut Draft<'a>,
) -> Result<ParseState, BlockFailure> {
    let komu = take_field_line(cursor, draft, "komu")?.trim();
    if komu.is_empty() {
        return Err(BlockFailure::EmptyField { field: "komu" });
    }
    draft.komu = komu.to_string();
    Ok(ParseState::ReadAddressees)
}

fn read_addressees<'a>(
    cursor: &mut LineCursor<'a>,
    draft: &mut Draft<'a>,
) -> Result<ParseState, BlockFailure> {
    while let Some(line) = cursor.peek() {
        if line.trim().is_empty() {
            // The separating blank line belongs to this block.
            cursor.advance();
            draft.raw.push(line);
            break;
        }
        if is_body_marker(line) || is_header_line(line) {
            break;
        }
        cursor.advance();
        draft.raw.push(line);
    }
    Ok(ParseState::ReadBody)
}

fn read_body<'a>(
    cursor: &mut LineCursor<'a>,
    draft: &mut Draft<'a>,
) -> Result<ParseState, BlockFailure> {
    while let Some(line) = cursor.peek() {
        if is_header_line(line) {
            break;
        }
        cursor.advance();
        draft.raw.push(line);
        draft.body.push(line);
    }
    Ok(ParseState::Emit)
}
