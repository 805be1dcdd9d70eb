//! Core data models used throughout the ingestion pipeline.
//!
//! A [`ParsedBlock`] is what the block parser produces from raw export text.
//! The orchestrator stamps it with a chat id, identity key and ingestion time
//! to obtain the persisted [`InterceptRecord`].

use serde::Serialize;

/// Lowest frequency accepted on a frequency line, in MHz.
pub const MIN_FREQ_MHZ: f64 = 0.001;
/// Highest frequency accepted on a frequency line, in MHz.
pub const MAX_FREQ_MHZ: f64 = 4000.0;
/// Maximum number of characters kept from a radio network line.
pub const MAX_RADIONET_CHARS: usize = 500;
/// Maximum number of characters kept from an intercept body.
pub const MAX_BODY_CHARS: usize = 50_000;

/// One intercept as parsed from the export, before identity is assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedBlock {
    /// 1-based line number of the block's header line.
    pub line: usize,
    /// Civil date as `YYYY-MM-DD`, source timezone.
    pub date: String,
    /// Civil time as `HH:MM:SS`, source timezone.
    pub time: String,
    pub ts_utc: i64,
    pub freq_mhz: f64,
    pub radionet: String,
    pub who: String,
    pub komu: String,
    pub body_full: String,
    /// Digest of every raw line consumed for this block.
    pub src_hash: String,
}

/// Persisted intercept row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterceptRecord {
    pub id: String,
    pub chat_id: String,
    pub date: String,
    pub time: String,
    pub ts_utc: i64,
    pub freq_mhz: f64,
    pub radionet: String,
    pub who: String,
    pub komu: String,
    pub body_full: String,
    pub ingested_at_utc: i64,
    pub src_hash: String,
}

/// Outcome of a single import run. Not persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportStats {
    /// Blocks attempted (parsed or failed).
    pub total: u64,
    /// Rows actually written to the store.
    pub inserted: u64,
    /// Blocks that failed to parse.
    pub skipped: u64,
    /// One message per skipped block.
    pub warnings: Vec<String>,
}

impl ImportStats {
    /// Well-formed blocks that were already stored (or repeated in the file).
    pub fn duplicates(&self) -> u64 {
        self.total
            .saturating_sub(self.skipped)
            .saturating_sub(self.inserted)
    }
}
