//! In-memory [`RecordStore`] implementation for tests.
//!
//! Records live in a `HashMap` keyed by `id` behind a `std::sync::RwLock`.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::models::InterceptRecord;

use super::{RecordQuery, RecordStore};

pub struct MemoryRecordStore {
    records: RwLock<HashMap<String, InterceptRecord>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<T>(_: T) -> anyhow::Error {
    anyhow!("record store lock poisoned")
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn insert_or_ignore(&self, records: &[InterceptRecord]) -> Result<u64> {
        let mut stored = self.records.write().map_err(poisoned)?;
        let mut inserted = 0;
        for record in records {
            if !stored.contains_key(&record.id) {
                stored.insert(record.id.clone(), record.clone());
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn get(&self, id: &str) -> Result<Option<InterceptRecord>> {
        let stored = self.records.read().map_err(poisoned)?;
        Ok(stored.get(id).cloned())
    }

    async fn query(&self, query: &RecordQuery) -> Result<Vec<InterceptRecord>> {
        let stored = self.records.read().map_err(poisoned)?;
        let mut hits: Vec<InterceptRecord> = stored
            .values()
            .filter(|r| query.matches(r))
            .cloned()
            .collect();
        hits.sort_by(|a, b| a.ts_utc.cmp(&b.ts_utc).then_with(|| a.id.cmp(&b.id)));
        if let Some(limit) = query.limit {
            hits.truncate(limit.max(0) as usize);
        }
        Ok(hits)
    }

    async fn count(&self) -> Result<i64> {
        let stored = self.records.read().map_err(poisoned)?;
        Ok(stored.len() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, ts_utc: i64, freq_mhz: f64, body: &str) -> InterceptRecord {
        InterceptRecord {
            id: id.to_string(),
            chat_id: "chat".to_string(),
            date: "2024-03-05".to_string(),
            time: "14:22:10".to_string(),
            ts_utc,
            freq_mhz,
            radionet: "Net".to_string(),
            who: "A".to_string(),
            komu: "B".to_string(),
            body_full: body.to_string(),
            ingested_at_utc: 0,
            src_hash: String::new(),
        }
    }

    #[tokio::test]
    async fn test_insert_or_ignore_keeps_first_row() {
        let store = MemoryRecordStore::new();
        let first = store
            .insert_or_ignore(&[record("a", 10, 145.0, "original")])
            .await
            .unwrap();
        assert_eq!(first, 1);

        let second = store
            .insert_or_ignore(&[record("a", 10, 145.0, "changed"), record("b", 20, 150.0, "")])
            .await
            .unwrap();
        assert_eq!(second, 1);
        assert_eq!(store.count().await.unwrap(), 2);
        assert_eq!(store.get("a").await.unwrap().unwrap().body_full, "original");
    }

    #[tokio::test]
    async fn test_query_orders_and_limits() {
        let store = MemoryRecordStore::new();
        store
            .insert_or_ignore(&[
                record("c", 30, 433.0, ""),
                record("a", 10, 145.0, ""),
                record("b", 20, 150.0, ""),
            ])
            .await
            .unwrap();

        let all = store.query(&RecordQuery::default()).await.unwrap();
        let ids: Vec<&str> = all.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);

        let q = RecordQuery {
            freq_min: Some(146.0),
            limit: Some(1),
            ..Default::default()
        };
        let hits = store.query(&q).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "b");
    }
}
