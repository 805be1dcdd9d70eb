//! Ingestion pipeline orchestration.
//!
//! Coordinates one import run: read export → decode → scan blocks →
//! fingerprint → single-transaction insert-or-ignore. Malformed blocks are
//! counted and reported, never fatal. The only fatal conditions are an
//! unreadable source file and a store that cannot be opened or committed,
//! and both leave the store as it was.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::config::{Config, DEFAULT_CHAT_ID};
use crate::fingerprint::record_id;
use crate::models::{ImportStats, InterceptRecord, ParsedBlock};
use crate::scanner::{BlockScanner, ScanReport};
use crate::store::{MemoryRecordStore, RecordStore, SqliteRecordStore};
use crate::timestamp::TimestampNormalizer;

/// Per-run parameters, passed explicitly by the caller.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Source-chat tag stored on, and hashed into, every record.
    pub chat_id: String,
    pub normalizer: TimestampNormalizer,
    /// Parse and fingerprint only; nothing is written.
    pub dry_run: bool,
}

impl IngestOptions {
    pub fn new(chat_id: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            normalizer: TimestampNormalizer::default(),
            dry_run: false,
        }
    }
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self::new(DEFAULT_CHAT_ID)
    }
}

/// Decode export bytes, dropping anything that is not valid UTF-8 and a
/// leading byte-order mark.
pub fn decode_lossy(bytes: &[u8]) -> String {
    let mut text = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        text.push_str(chunk.valid());
    }
    match text.strip_prefix('\u{feff}') {
        Some(stripped) => stripped.to_string(),
        None => text,
    }
}

pub fn read_export(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read export file: {}", path.display()))?;
    Ok(decode_lossy(&bytes))
}

fn to_record(block: &ParsedBlock, chat_id: &str, ingested_at_utc: i64) -> InterceptRecord {
    InterceptRecord {
        id: record_id(
            chat_id,
            &block.date,
            &block.time,
            block.freq_mhz,
            &block.who,
            &block.komu,
            &block.body_full,
        ),
        chat_id: chat_id.to_string(),
        date: block.date.clone(),
        time: block.time.clone(),
        ts_utc: block.ts_utc,
        freq_mhz: block.freq_mhz,
        radionet: block.radionet.clone(),
        who: block.who.clone(),
        komu: block.komu.clone(),
        body_full: block.body_full.clone(),
        ingested_at_utc,
        src_hash: block.src_hash.clone(),
    }
}

/// Attach identity and ingestion time to every parsed block.
pub fn build_records(
    report: &ScanReport,
    chat_id: &str,
    ingested_at_utc: i64,
) -> Vec<InterceptRecord> {
    report
        .blocks
        .iter()
        .map(|block| to_record(block, chat_id, ingested_at_utc))
        .collect()
}

fn stats_for(report: &ScanReport, inserted: u64) -> ImportStats {
    ImportStats {
        total: report.total() as u64,
        inserted,
        skipped: report.skipped.len() as u64,
        warnings: report.skipped.iter().map(|s| s.to_string()).collect(),
    }
}

/// Scan already-decoded export text and write it to `store`.
///
/// All records go to the store in one `insert_or_ignore` call. A dry run
/// never touches the store.
pub async fn ingest_text(
    store: &dyn RecordStore,
    text: &str,
    options: &IngestOptions,
) -> Result<ImportStats> {
    let report = BlockScanner::new(options.normalizer).scan_text(text);
    let records = build_records(&report, &options.chat_id, chrono::Utc::now().timestamp());

    let inserted = if options.dry_run || records.is_empty() {
        0
    } else {
        store.insert_or_ignore(&records).await?
    };

    let stats = stats_for(&report, inserted);
    info!(
        total = stats.total,
        inserted = stats.inserted,
        skipped = stats.skipped,
        duplicates = stats.duplicates(),
        dry_run = options.dry_run,
        "import finished"
    );
    Ok(stats)
}

/// Import one export file into the SQLite store at `db_path`.
///
/// The file is read before the store is opened, so an unreadable export
/// never touches the database. A dry run does not open it at all.
pub async fn import_file(
    path: &Path,
    db_path: &Path,
    options: &IngestOptions,
) -> Result<ImportStats> {
    let text = read_export(path)?;
    info!(file = %path.display(), chat_id = %options.chat_id, "importing export");

    if options.dry_run {
        return ingest_text(&MemoryRecordStore::new(), &text, options).await;
    }

    let store = SqliteRecordStore::open(db_path).await?;
    let stats = ingest_text(&store, &text, options)
        .await
        .with_context(|| format!("Failed to commit records to {}", db_path.display()));
    store.close().await;
    stats
}

/// Render the run summary printed by `intercepts import`.
pub fn format_summary(stats: &ImportStats, warnings_limit: usize) -> String {
    let mut out = format!(
        "TOTAL: {} | INSERTED: {} | SKIPPED: {}",
        stats.total, stats.inserted, stats.skipped
    );

    if !stats.warnings.is_empty() {
        out.push_str("\nWARNINGS:");
        for warning in stats.warnings.iter().take(warnings_limit) {
            out.push_str("\n - ");
            out.push_str(warning);
        }
        if stats.warnings.len() > warnings_limit {
            out.push_str(&format!(
                "\n ... and {} more",
                stats.warnings.len() - warnings_limit
            ));
        }
    }

    out
}

/// CLI entry point for `intercepts import`.
pub async fn run_import(
    config: &Config,
    file: &Path,
    chat_id: Option<String>,
    dry_run: bool,
) -> Result<()> {
    let options = IngestOptions {
        chat_id: chat_id.unwrap_or_else(|| config.ingest.chat_id.clone()),
        normalizer: config.normalizer()?,
        dry_run,
    };

    let stats = import_file(file, &config.db.path, &options).await?;

    if dry_run {
        println!("import {} (dry-run)", file.display());
    }
    println!("{}", format_summary(&stats, config.ingest.warnings_limit));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIO_A: &str =
        "05.03.2024, 14:22:10\n145.9500\nAlpha-Net\nUNIT-1\nUNIT-2\n\nHello world\n";

    #[test]
    fn test_decode_drops_invalid_bytes() {
        let bytes = b"\xef\xbb\xbfhello \xff\xfeworld";
        assert_eq!(decode_lossy(bytes), "hello world");
    }

    #[test]
    fn test_decode_keeps_cyrillic() {
        let text = "\u{041f}\u{0440}\u{0438}\u{0432}\u{0456}\u{0442}";
        assert_eq!(decode_lossy(text.as_bytes()), text);
    }

    #[tokio::test]
    async fn test_ingest_text_scenario_a() {
        let store = MemoryRecordStore::new();
        let stats = ingest_text(&store, SCENARIO_A, &IngestOptions::default())
            .await
            .unwrap();
        assert_eq!(stats.total, 1);
        assert_eq!(stats.inserted, 1);
        assert_eq!(stats.skipped, 0);

        let records = store.query(&Default::default()).await.unwrap();
        let r = &records[0];
        assert_eq!(r.chat_id, DEFAULT_CHAT_ID);
        assert_eq!(r.date, "2024-03-05");
        assert_eq!(r.time, "14:22:10");
        assert_eq!(r.freq_mhz, 145.95);
        assert_eq!(r.radionet, "Alpha-Net");
        assert_eq!(r.who, "UNIT-1");
        assert_eq!(r.komu, "UNIT-2");
        assert_eq!(r.body_full, "Hello world");
        assert_eq!(
            r.id,
            record_id(
                DEFAULT_CHAT_ID,
                "2024-03-05",
                "14:22:10",
                145.95,
                "UNIT-1",
                "UNIT-2",
                "Hello world"
            )
        );
    }

    #[tokio::test]
    async fn test_ingest_text_twice_is_idempotent() {
        let store = MemoryRecordStore::new();
        let options = IngestOptions::default();
        ingest_text(&store, SCENARIO_A, &options).await.unwrap();
        let again = ingest_text(&store, SCENARIO_A, &options).await.unwrap();
        assert_eq!(again.total, 1);
        assert_eq!(again.inserted, 0);
        assert_eq!(again.skipped, 0);
        assert_eq!(again.duplicates(), 1);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_within_one_file() {
        let store = MemoryRecordStore::new();
        let text = format!("{}{}", SCENARIO_A, SCENARIO_A);
        let stats = ingest_text(&store, &text, &IngestOptions::default())
            .await
            .unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.inserted, 1);
        assert_eq!(stats.skipped, 0);
    }

    #[tokio::test]
    async fn test_chat_id_changes_identity() {
        let store = MemoryRecordStore::new();
        ingest_text(&store, SCENARIO_A, &IngestOptions::new("alpha"))
            .await
            .unwrap();
        let stats = ingest_text(&store, SCENARIO_A, &IngestOptions::new("bravo"))
            .await
            .unwrap();
        assert_eq!(stats.inserted, 1);
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_addressees_do_not_change_identity() {
        let store = MemoryRecordStore::new();
        let with_cc = "05.03.2024, 14:22:10\n145.9500\nAlpha-Net\nUNIT-1\nUNIT-2\nUNIT-7\nUNIT-9\n\nHello world\n";
        let options = IngestOptions::default();
        ingest_text(&store, SCENARIO_A, &options).await.unwrap();
        let stats = ingest_text(&store, with_cc, &options).await.unwrap();
        assert_eq!(stats.inserted, 0);

        let plain = BlockScanner::default().scan_text(SCENARIO_A);
        let noisy = BlockScanner::default().scan_text(with_cc);
        let a = build_records(&plain, "c", 0);
        let b = build_records(&noisy, "c", 0);
        assert_eq!(a[0].id, b[0].id);
        assert_ne!(a[0].src_hash, b[0].src_hash);
    }

    #[tokio::test]
    async fn test_dry_run_writes_nothing() {
        let store = MemoryRecordStore::new();
        let options = IngestOptions {
            dry_run: true,
            ..IngestOptions::default()
        };
        let stats = ingest_text(&store, SCENARIO_A, &options).await.unwrap();
        assert_eq!(stats.total, 1);
        assert_eq!(stats.inserted, 0);
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_import_file_dry_run_leaves_no_database() {
        let tmp = tempfile::TempDir::new().unwrap();
        let export = tmp.path().join("export.txt");
        std::fs::write(&export, SCENARIO_A).unwrap();
        let db = tmp.path().join("data").join("data.db");
        let options = IngestOptions {
            dry_run: true,
            ..IngestOptions::default()
        };

        let stats = import_file(&export, &db, &options).await.unwrap();
        assert_eq!((stats.total, stats.inserted, stats.skipped), (1, 0, 0));
        assert!(!db.exists());
    }

    #[tokio::test]
    async fn test_import_file_matches_ingest_text() {
        let tmp = tempfile::TempDir::new().unwrap();
        let export = tmp.path().join("export.txt");
        let text = format!("{}05.03.2024, 14:30:00\nabc\nNet\nA\nB\n\nbad\n", SCENARIO_A);
        std::fs::write(&export, &text).unwrap();
        let db = tmp.path().join("data.db");
        let options = IngestOptions::default();

        let memory = MemoryRecordStore::new();
        let expected = ingest_text(&memory, &text, &options).await.unwrap();
        let first = import_file(&export, &db, &options).await.unwrap();
        assert_eq!(first, expected);

        let again = import_file(&export, &db, &options).await.unwrap();
        assert_eq!((again.total, again.inserted, again.skipped), (2, 0, 1));
    }

    #[tokio::test]
    async fn test_import_file_empty_export_creates_schema() {
        let tmp = tempfile::TempDir::new().unwrap();
        let export = tmp.path().join("empty.txt");
        std::fs::write(&export, "").unwrap();
        let db = tmp.path().join("data.db");

        let stats = import_file(&export, &db, &IngestOptions::default())
            .await
            .unwrap();
        assert_eq!((stats.total, stats.inserted, stats.skipped), (0, 0, 0));

        let store = SqliteRecordStore::open(&db).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
        store.close().await;
    }

    #[test]
    fn test_summary_without_warnings() {
        let stats = ImportStats {
            total: 3,
            inserted: 2,
            skipped: 0,
            warnings: vec![],
        };
        assert_eq!(
            format_summary(&stats, 20),
            "TOTAL: 3 | INSERTED: 2 | SKIPPED: 0"
        );
    }

    #[test]
    fn test_summary_truncates_warnings() {
        let warnings: Vec<String> = (1..=25).map(|i| format!("line {}: bad", i)).collect();
        let stats = ImportStats {
            total: 25,
            inserted: 0,
            skipped: 25,
            warnings,
        };
        let summary = format_summary(&stats, 20);
        let lines: Vec<&str> = summary.lines().collect();
        assert_eq!(lines[0], "TOTAL: 25 | INSERTED: 0 | SKIPPED: 25");
        assert_eq!(lines[1], "WARNINGS:");
        assert_eq!(lines[2], " - line 1: bad");
        assert_eq!(lines[21], " - line 20: bad");
        assert_eq!(lines[22], " ... and 5 more");
        assert_eq!(lines.len(), 23);
    }
}
