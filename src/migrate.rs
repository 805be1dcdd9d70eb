use anyhow::Result;
use sqlx::SqlitePool;

/// Create the intercepts table and its indexes. Safe to run repeatedly.
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS intercepts (
            id TEXT PRIMARY KEY,
            chat_id TEXT NOT NULL,
            date TEXT NOT NULL,
            time TEXT NOT NULL,
            ts_utc INTEGER NOT NULL,
            freq_mhz REAL NOT NULL,
            radionet TEXT NOT NULL,
            who TEXT NOT NULL,
            komu TEXT NOT NULL,
            body_full TEXT NOT NULL,
            ingested_at_utc INTEGER NOT NULL,
            src_hash TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Range lookups by time, frequency and correspondents
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_intercepts_ts ON intercepts(ts_utc)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_intercepts_freq ON intercepts(freq_mhz)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_intercepts_who_komu ON intercepts(who, komu)")
        .execute(pool)
        .await?;

    Ok(())
}
