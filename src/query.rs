//! Read-side retrieval for `intercepts query` and `intercepts get`.
//!
//! Downstream consumers (frequency resolution, report rendering) read
//! ranges of records through [`RecordStore::query`]; this module is the
//! CLI face of the same calls.

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, NaiveDateTime};

use crate::config::Config;
use crate::models::InterceptRecord;
use crate::store::{RecordQuery, RecordStore, SqliteRecordStore};
use crate::timestamp::TimestampNormalizer;

/// Maximum characters of a body shown in the human-readable listing.
const PREVIEW_CHARS: usize = 120;

/// Parse a `--since`/`--until` bound in the configured zone.
///
/// Accepts `YYYY-MM-DD` (start or end of that day, depending on
/// `end_of_day`) or `YYYY-MM-DD HH:MM:SS`.
pub fn parse_bound(value: &str, end_of_day: bool, normalizer: &TimestampNormalizer) -> Result<i64> {
    let value = value.trim();
    let naive = match NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        Ok(dt) => dt,
        Err(_) => {
            let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", value))?;
            let time = if end_of_day {
                date.and_hms_opt(23, 59, 59)
            } else {
                date.and_hms_opt(0, 0, 0)
            };
            match time {
                Some(dt) => dt,
                None => bail!("Invalid date '{}'", value),
            }
        }
    };
    Ok(normalizer.utc_epoch(&naive)?)
}

/// Raw `query` arguments as given on the command line.
#[derive(Debug, Clone, Default)]
pub struct QueryArgs {
    pub since: Option<String>,
    pub until: Option<String>,
    pub freq_min: Option<f64>,
    pub freq_max: Option<f64>,
    pub who: Option<String>,
    pub komu: Option<String>,
    pub chat: Option<String>,
    pub limit: Option<i64>,
}

impl QueryArgs {
    pub fn to_query(&self, normalizer: &TimestampNormalizer) -> Result<RecordQuery> {
        if let (Some(lo), Some(hi)) = (self.freq_min, self.freq_max) {
            if lo > hi {
                bail!("--freq-min ({}) is greater than --freq-max ({})", lo, hi);
            }
        }
        if matches!(self.limit, Some(n) if n < 1) {
            bail!("--limit must be >= 1");
        }

        Ok(RecordQuery {
            since_ts: self
                .since
                .as_deref()
                .map(|s| parse_bound(s, false, normalizer))
                .transpose()?,
            until_ts: self
                .until
                .as_deref()
                .map(|s| parse_bound(s, true, normalizer))
                .transpose()?,
            freq_min: self.freq_min,
            freq_max: self.freq_max,
            who: self.who.clone(),
            komu: self.komu.clone(),
            chat_id: self.chat.clone(),
            limit: self.limit,
        })
    }
}

fn preview(body: &str) -> String {
    let first = body.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
    let mut out: String = first.chars().take(PREVIEW_CHARS).collect();
    if first.chars().count() > PREVIEW_CHARS || body.lines().count() > 1 {
        out.push_str(" …");
    }
    out
}

/// CLI entry point for `intercepts query`.
pub async fn run_query(config: &Config, args: &QueryArgs, json: bool) -> Result<()> {
    let query = args.to_query(&config.normalizer()?)?;
    let store = SqliteRecordStore::open(&config.db.path).await?;
    let records = store.query(&query).await;
    store.close().await;
    let records = records?;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for record in &records {
        println!(
            "{} {}  {:>12.6} MHz  {}  {} -> {}",
            record.date, record.time, record.freq_mhz, record.radionet, record.who, record.komu
        );
        println!("    id: {}", record.id);
        let body = preview(&record.body_full);
        if !body.is_empty() {
            println!("    {}", body);
        }
    }
    println!();
    println!("{} record(s)", records.len());

    Ok(())
}

fn print_record(record: &InterceptRecord) {
    let ingested = chrono::DateTime::from_timestamp(record.ingested_at_utc, 0)
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
        .unwrap_or_else(|| record.ingested_at_utc.to_string());

    println!("--- Intercept ---");
    println!("id:          {}", record.id);
    println!("chat_id:     {}", record.chat_id);
    println!("date:        {}", record.date);
    println!("time:        {}", record.time);
    println!("ts_utc:      {}", record.ts_utc);
    println!("freq_mhz:    {:.6}", record.freq_mhz);
    println!("radionet:    {}", record.radionet);
    println!("who:         {}", record.who);
    println!("komu:        {}", record.komu);
    println!("src_hash:    {}", record.src_hash);
    println!("ingested_at: {}", ingested);
    println!();
    println!("--- Body ---");
    println!("{}", record.body_full);
}

/// CLI entry point for `intercepts get`.
pub async fn run_get(config: &Config, id: &str, json: bool) -> Result<()> {
    let store = SqliteRecordStore::open(&config.db.path).await?;
    let record = store.get(id).await;
    store.close().await;

    let record = match record? {
        Some(r) => r,
        None => bail!("record not found: {}", id),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        print_record(&record);
    }
    Ok(())
}
