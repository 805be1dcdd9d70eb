//! Store overview.
//!
//! Provides a quick summary of what's been ingested: record counts, the
//! covered time span and a per-chat breakdown. Used by `intercepts stats` to
//! confirm that imports landed where expected.

use anyhow::Result;
use sqlx::Row;

use crate::config::Config;
use crate::store::{RecordStore, SqliteRecordStore};

/// Per-chat breakdown of stored records.
struct ChatStats {
    chat_id: String,
    records: i64,
    first_ts: i64,
    last_ts: i64,
    last_ingest_ts: i64,
}

/// Run the stats command: query the database and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let store = SqliteRecordStore::open(&config.db.path).await?;
    let result = print_stats(config, &store).await;
    store.close().await;
    result
}

async fn print_stats(config: &Config, store: &SqliteRecordStore) -> Result<()> {
    let pool = store.pool();
    let total = store.count().await?;

    let distinct_freqs: i64 = sqlx::query_scalar("SELECT COUNT(DISTINCT freq_mhz) FROM intercepts")
        .fetch_one(pool)
        .await?;
    let distinct_pairs: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM (SELECT DISTINCT who, komu FROM intercepts)")
            .fetch_one(pool)
            .await?;

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("Intercepts — Store Stats");
    println!("========================");
    println!();
    println!("  Database:     {}", config.db.path.display());
    println!("  Size:         {}", format_bytes(db_size));
    println!();
    println!("  Records:      {}", total);
    println!("  Frequencies:  {}", distinct_freqs);
    println!("  Who/komu:     {}", distinct_pairs);

    let rows = sqlx::query(
        r#"
        SELECT
            chat_id,
            COUNT(*) AS records,
            MIN(ts_utc) AS first_ts,
            MAX(ts_utc) AS last_ts,
            MAX(ingested_at_utc) AS last_ingest_ts
        FROM intercepts
        GROUP BY chat_id
        ORDER BY records DESC, chat_id ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    let chats: Vec<ChatStats> = rows
        .iter()
        .map(|row| ChatStats {
            chat_id: row.get("chat_id"),
            records: row.get("records"),
            first_ts: row.get("first_ts"),
            last_ts: row.get("last_ts"),
            last_ingest_ts: row.get("last_ingest_ts"),
        })
        .collect();

    if !chats.is_empty() {
        println!();
        println!("  By chat:");
        println!(
            "  {:<20} {:>8}   {:<16}   {:<16}   {}",
            "CHAT", "RECORDS", "FIRST (UTC)", "LAST (UTC)", "LAST IMPORT"
        );
        println!("  {}", "-".repeat(88));

        for c in &chats {
            println!(
                "  {:<20} {:>8}   {:<16}   {:<16}   {}",
                c.chat_id,
                c.records,
                format_ts_iso(c.first_ts),
                format_ts_iso(c.last_ts),
                format_ts_iso(c.last_ingest_ts)
            );
        }
    }

    println!();
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ts.to_string())
}
