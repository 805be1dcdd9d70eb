//! Civil header timestamps to UTC.
//!
//! Export headers carry `DD.MM.YYYY, HH:MM:SS` in the timezone of the people
//! who wrote them. [`TimestampNormalizer`] keeps the civil date and time for
//! display and computes the UTC epoch under one fixed IANA zone.

use anyhow::{anyhow, Result};
use chrono::{Duration, LocalResult, NaiveDateTime, Offset, TimeZone};
use chrono_tz::Tz;
use thiserror::Error;

/// Zone used when nothing else is configured.
pub const DEFAULT_TIMEZONE: &str = "Europe/Kyiv";

const HEADER_FORMAT: &str = "%d.%m.%Y, %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimestampError {
    #[error("{0}")]
    Invalid(String),
    #[error("{civil} has no UTC equivalent in {zone}")]
    Unmappable { civil: String, zone: String },
}

/// A header timestamp: civil parts as authored plus the UTC instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CivilTimestamp {
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM:SS`
    pub time: String,
    pub ts_utc: i64,
}

#[derive(Debug, Clone, Copy)]
pub struct TimestampNormalizer {
    tz: Tz,
}

impl TimestampNormalizer {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// Build a normalizer from an IANA zone name such as `Europe/Kyiv`.
    pub fn from_name(name: &str) -> Result<Self> {
        let tz: Tz = name
            .parse()
            .map_err(|e| anyhow!("Unknown timezone '{}': {}", name, e))?;
        Ok(Self::new(tz))
    }

    /// Normalize a trimmed header line.
    pub fn normalize(&self, header: &str) -> Result<CivilTimestamp, TimestampError> {
        let naive = NaiveDateTime::parse_from_str(header.trim(), HEADER_FORMAT)
            .map_err(|e| TimestampError::Invalid(e.to_string()))?;
        let ts_utc = self.utc_epoch(&naive)?;

        Ok(CivilTimestamp {
            date: naive.format("%Y-%m-%d").to_string(),
            time: naive.format("%H:%M:%S").to_string(),
            ts_utc,
        })
    }

    /// UTC epoch seconds of a civil date/time in this zone.
    pub fn utc_epoch(&self, naive: &NaiveDateTime) -> Result<i64, TimestampError> {
        match self.tz.from_local_datetime(naive) {
            LocalResult::Single(dt) => Ok(dt.timestamp()),
            // Autumn fold: the wall clock shows this time twice; take the first.
            LocalResult::Ambiguous(earliest, _) => Ok(earliest.timestamp()),
            // Spring gap: apply the offset that was in force before the jump.
            LocalResult::None => {
                let before = *naive - Duration::hours(3);
                let offset = self
                    .tz
                    .offset_from_local_datetime(&before)
                    .earliest()
                    .ok_or_else(|| TimestampError::Unmappable {
                        civil: naive.to_string(),
                        zone: self.tz.name().to_string(),
                    })?;
                let seconds = offset.fix().local_minus_utc() as i64;
                Ok(naive.and_utc().timestamp() - seconds)
            }
        }
    }
}

impl Default for TimestampNormalizer {
    fn default() -> Self {
        Self::new(chrono_tz::Europe::Kyiv)
    }
}
