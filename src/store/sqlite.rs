//! SQLite-backed [`RecordStore`] implementation.
//!
//! Writes go through `INSERT OR IGNORE` against the `id` primary key, so a
//! duplicate intercept is a no-op rather than an error, and concurrent
//! importers racing on the same record end up with a single row. Each
//! batch runs in one transaction.

use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

use crate::db;
use crate::migrate;
use crate::models::InterceptRecord;

use super::{RecordQuery, RecordStore};

const SELECT_COLUMNS: &str = "SELECT id, chat_id, date, time, ts_utc, freq_mhz, radionet, who, \
     komu, body_full, ingested_at_utc, src_hash FROM intercepts";

/// SQLite implementation of the [`RecordStore`] trait.
pub struct SqliteRecordStore {
    pool: SqlitePool,
}

impl SqliteRecordStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to `db_path`, creating the file and schema if needed.
    pub async fn open(db_path: &Path) -> Result<Self> {
        let pool = db::connect(db_path).await?;
        migrate::run_migrations(&pool)
            .await
            .with_context(|| format!("Failed to migrate database: {}", db_path.display()))?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}

fn row_to_record(row: &SqliteRow) -> InterceptRecord {
    InterceptRecord {
        id: row.get("id"),
        chat_id: row.get("chat_id"),
        date: row.get("date"),
        time: row.get("time"),
        ts_utc: row.get("ts_utc"),
        freq_mhz: row.get("freq_mhz"),
        radionet: row.get("radionet"),
        who: row.get("who"),
        komu: row.get("komu"),
        body_full: row.get("body_full"),
        ingested_at_utc: row.get("ingested_at_utc"),
        src_hash: row.get("src_hash"),
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn insert_or_ignore(&self, records: &[InterceptRecord]) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0u64;

        for record in records {
            let result = sqlx::query(
                r#"
                INSERT OR IGNORE INTO intercepts (id, chat_id, date, time, ts_utc, freq_mhz,
                                                  radionet, who, komu, body_full,
                                                  ingested_at_utc, src_hash)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&record.id)
            .bind(&record.chat_id)
            .bind(&record.date)
            .bind(&record.time)
            .bind(record.ts_utc)
            .bind(record.freq_mhz)
            .bind(&record.radionet)
            .bind(&record.who)
            .bind(&record.komu)
            .bind(&record.body_full)
            .bind(record.ingested_at_utc)
            .bind(&record.src_hash)
            .execute(&mut *tx)
            .await?;

            inserted += result.rows_affected();
        }

        // Dropping an uncommitted transaction rolls it back.
        tx.commit().await?;
        Ok(inserted)
    }

    async fn get(&self, id: &str) -> Result<Option<InterceptRecord>> {
        let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(row_to_record))
    }

    async fn query(&self, query: &RecordQuery) -> Result<Vec<InterceptRecord>> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(SELECT_COLUMNS);
        qb.push(" WHERE 1 = 1");

        if let Some(ts) = query.since_ts {
            qb.push(" AND ts_utc >= ").push_bind(ts);
        }
        if let Some(ts) = query.until_ts {
            qb.push(" AND ts_utc <= ").push_bind(ts);
        }
        if let Some(f) = query.freq_min {
            qb.push(" AND freq_mhz >= ").push_bind(f);
        }
        if let Some(f) = query.freq_max {
            qb.push(" AND freq_mhz <= ").push_bind(f);
        }
        if let Some(ref who) = query.who {
            qb.push(" AND who = ").push_bind(who.clone());
        }
        if let Some(ref komu) = query.komu {
            qb.push(" AND komu = ").push_bind(komu.clone());
        }
        if let Some(ref chat_id) = query.chat_id {
            qb.push(" AND chat_id = ").push_bind(chat_id.clone());
        }

        qb.push(" ORDER BY ts_utc ASC, id ASC");
        if let Some(limit) = query.limit {
            qb.push(" LIMIT ").push_bind(limit);
        }

        let rows = qb.build().fetch_all(&self.pool).await?;
        Ok(rows.iter().map(row_to_record).collect())
    }

    async fn count(&self) -> Result<i64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM intercepts")
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }
}
