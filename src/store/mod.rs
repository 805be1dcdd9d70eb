//! Storage abstraction for intercept records.
//!
//! The [`RecordStore`] trait is the only way the pipeline touches storage.
//! Records are append-only: a store never updates or deletes a row, and a
//! write whose `id` already exists is silently ignored.
//!
//! | Implementation | Purpose |
//! |----------------|---------|
//! | [`SqliteRecordStore`] | Indexed SQLite table, the production store |
//! | [`MemoryRecordStore`] | `HashMap`-backed store for tests and dry runs |

pub mod memory;
pub mod sqlite;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::InterceptRecord;

pub use memory::MemoryRecordStore;
pub use sqlite::SqliteRecordStore;

/// Filters for range retrieval. Unset fields do not constrain the result.
///
/// Ranges are inclusive on both ends.
#[derive(Debug, Clone, Default)]
pub struct RecordQuery {
    pub since_ts: Option<i64>,
    pub until_ts: Option<i64>,
    pub freq_min: Option<f64>,
    pub freq_max: Option<f64>,
    pub who: Option<String>,
    pub komu: Option<String>,
    pub chat_id: Option<String>,
    pub limit: Option<i64>,
}

impl RecordQuery {
    /// In-process evaluation of the filters (limit excluded).
    pub fn matches(&self, record: &InterceptRecord) -> bool {
        self.since_ts.map_or(true, |ts| record.ts_utc >= ts)
            && self.until_ts.map_or(true, |ts| record.ts_utc <= ts)
            && self.freq_min.map_or(true, |f| record.freq_mhz >= f)
            && self.freq_max.map_or(true, |f| record.freq_mhz <= f)
            && self.who.as_deref().map_or(true, |w| record.who == w)
            && self.komu.as_deref().map_or(true, |k| record.komu == k)
            && self.chat_id.as_deref().map_or(true, |c| record.chat_id == c)
    }
}

/// Append-only, insert-or-ignore record storage.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`insert_or_ignore`](RecordStore::insert_or_ignore) | Atomically write a batch, skipping known ids |
/// | [`get`](RecordStore::get) | Fetch one record by id |
/// | [`query`](RecordStore::query) | Range retrieval ordered by `ts_utc`, then `id` |
/// | [`count`](RecordStore::count) | Number of stored records |
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Write every record whose `id` is not yet stored.
    ///
    /// The batch is all-or-nothing: on error nothing from it is visible.
    /// Returns the number of rows actually written.
    async fn insert_or_ignore(&self, records: &[InterceptRecord]) -> Result<u64>;

    async fn get(&self, id: &str) -> Result<Option<InterceptRecord>>;

    async fn query(&self, query: &RecordQuery) -> Result<Vec<InterceptRecord>>;

    async fn count(&self) -> Result<i64>;
}
