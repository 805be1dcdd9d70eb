//! # Intercept Ingest
//!
//! Idempotent ingestion of chat-export radio intercepts into an indexed
//! SQLite store.
//!
//! Analysts re-export the same chat log over and over; every export may
//! overlap with the previous ones. This crate parses each export into
//! intercept records, fingerprints them by logical content, and writes them
//! with insert-or-ignore semantics so that every intercept is stored exactly
//! once, however many times it is imported.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌──────────────┐   ┌──────────────┐   ┌──────────┐
//! │  Export    │──▶│ BlockScanner │──▶│ Fingerprints │──▶│  SQLite  │
//! │  (.txt)    │   │ (state mach.)│   │  id/src_hash │   │ intercepts│
//! └────────────┘   └──────────────┘   └──────────────┘   └────┬─────┘
//!                                                             │
//!                                               query / get / stats
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! intercepts init                          # create database
//! intercepts import export.txt --chat Ocheret
//! intercepts query --since 2024-03-01 --freq-min 140 --freq-max 150
//! intercepts stats
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`timestamp`] | Civil header time → UTC |
//! | [`fingerprint`] | Content digests and identity keys |
//! | [`parser`] | Block state machine |
//! | [`scanner`] | Whole-file block scanning |
//! | [`store`] | Record storage trait and backends |
//! | [`ingest`] | Import orchestration |
//! | [`query`] | Range retrieval |
//! | [`stats`] | Store overview |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod config;
pub mod db;
pub mod fingerprint;
pub mod ingest;
pub mod logging;
pub mod migrate;
pub mod models;
pub mod parser;
pub mod query;
pub mod scanner;
pub mod stats;
pub mod store;
pub mod timestamp;
