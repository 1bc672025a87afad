//! # Royale Meta
//!
//! Collects battle logs for a mobile card game and answers card meta
//! questions over them.
//!
//! ## Architecture
//!
//! - **models**: Core data structures (players, battles, battle times, tags)
//! - **fetch**: Game API client behind the `MatchSource` trait
//! - **ingest**: Clan → member → profile → battle-log ingestion with upserts
//! - **storage**: Document store (in-memory index + JSONL logs)
//! - **query**: The analytics and the card/date catalogs
//! - **calculate**: Percentage helpers shared by the analytics
//! - **api**: REST API endpoints
//! - **config**: Configuration loading and validation

pub mod api;
pub mod calculate;
pub mod config;
pub mod fetch;
pub mod ingest;
pub mod models;
pub mod query;
pub mod storage;

pub use models::*;
