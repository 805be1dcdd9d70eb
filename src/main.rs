//! # Intercepts CLI (`intercepts`)
//!
//! Commands for creating the store, importing chat exports, and reading
//! records back.
//!
//! ## Usage
//!
//! ```bash
//! intercepts [--config ./config/intercepts.toml] [--db ./data/data.db] <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `intercepts init` | Create the SQLite database and schema |
//! | `intercepts import <file>` | Ingest one chat export |
//! | `intercepts query` | List records by time, frequency, correspondents |
//! | `intercepts get <id>` | Show one record |
//! | `intercepts stats` | Summarise the store |
//!
//! ## Examples
//!
//! ```bash
//! # Import an export under the default chat id
//! intercepts import ./exports/2024-03-05.txt
//!
//! # Import under another chat id into a specific store
//! intercepts import ./exports/bravo.txt --chat Bravo --db ./data/bravo.db
//!
//! # Everything on 145–146 MHz during one day, as JSON
//! intercepts query --since 2024-03-05 --until 2024-03-05 --freq-min 145 --freq-max 146 --json
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use intercept_ingest::query::QueryArgs;
use intercept_ingest::store::SqliteRecordStore;
use intercept_ingest::{config, ingest, logging, query, stats};

const DEFAULT_CONFIG_PATH: &str = "./config/intercepts.toml";

/// Intercepts CLI: idempotent ingestion of chat-export radio intercepts.
///
/// Settings are read from an optional TOML file (`--config`); flags given
/// on the command line take precedence.
#[derive(Parser)]
#[command(
    name = "intercepts",
    about = "Idempotent ingestion of chat-export radio intercepts into SQLite",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/intercepts.toml`, which is skipped if absent.
    /// An explicitly given path must exist.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database path. Overrides `[db].path`.
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Log parsing details to stderr.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file, the `intercepts` table and its
    /// indexes. Idempotent.
    Init,

    /// Import one chat export.
    ///
    /// Parses every intercept block, skips malformed ones with a warning,
    /// and stores each intercept once. Re-importing an overlapping export
    /// only adds what is new.
    Import {
        /// Path to the exported `.txt` file.
        file: PathBuf,

        /// Source-chat identifier. Overrides `[ingest].chat_id`.
        #[arg(long)]
        chat: Option<String>,

        /// Parse and report without writing to the database.
        #[arg(long)]
        dry_run: bool,
    },

    /// List stored intercepts.
    ///
    /// Dates are interpreted in the configured source timezone. All ranges
    /// are inclusive. Results are ordered by time.
    Query {
        /// On or after this date (`YYYY-MM-DD` or `YYYY-MM-DD HH:MM:SS`).
        #[arg(long)]
        since: Option<String>,

        /// On or before this date (`YYYY-MM-DD` or `YYYY-MM-DD HH:MM:SS`).
        #[arg(long)]
        until: Option<String>,

        /// Lowest frequency, MHz.
        #[arg(long)]
        freq_min: Option<f64>,

        /// Highest frequency, MHz.
        #[arg(long)]
        freq_max: Option<f64>,

        /// Exact `who` value.
        #[arg(long)]
        who: Option<String>,

        /// Exact `komu` value.
        #[arg(long)]
        komu: Option<String>,

        /// Only records from this chat.
        #[arg(long)]
        chat: Option<String>,

        /// Maximum number of records.
        #[arg(long)]
        limit: Option<i64>,

        /// Print JSON instead of a listing.
        #[arg(long)]
        json: bool,
    },

    /// Show a single intercept by id.
    Get {
        /// Record id (hex digest).
        id: String,

        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Summarise the store.
    Stats,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let mut cfg = match &cli.config {
        Some(path) => config::load_or_default(path, true)?,
        None => config::load_or_default(&PathBuf::from(DEFAULT_CONFIG_PATH), false)?,
    };
    if let Some(db) = cli.db {
        cfg.db.path = db;
    }

    match cli.command {
        Commands::Init => {
            SqliteRecordStore::open(&cfg.db.path).await?.close().await;
            println!("Database initialized successfully.");
        }
        Commands::Import {
            file,
            chat,
            dry_run,
        } => {
            ingest::run_import(&cfg, &file, chat, dry_run).await?;
        }
        Commands::Query {
            since,
            until,
            freq_min,
            freq_max,
            who,
            komu,
            chat,
            limit,
            json,
        } => {
            let args = QueryArgs {
                since,
                until,
                freq_min,
                freq_max,
                who,
                komu,
                chat,
                limit,
            };
            query::run_query(&cfg, &args, json).await?;
        }
        Commands::Get { id, json } => {
            query::run_get(&cfg, &id, json).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
    }

    Ok(())
}
