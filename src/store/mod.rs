// src/store/mod.rs
//! Persistence seam for the pipeline.
//!
//! The pipeline treats storage as an external collaborator: everything it needs
//! is expressed on the [`Store`] trait, and each trait method is one logical
//! unit of work (one ingest batch, one headline's full mention/score set), so
//! implementations can map a method to a transaction. [`MemoryStore`] is the
//! in-crate reference implementation used by tests and the demo binary.

pub mod entities;
pub mod memory;

use std::collections::HashSet;

use anyhow::Result;
use chrono::{DateTime, Utc};

pub use entities::{
    Headline, Mention, NewHeadline, NewMention, NewRiskScore, NewTicker, RiskScore, Ticker,
};
pub use memory::MemoryStore;

#[async_trait::async_trait]
pub trait Store: Send + Sync {
    // --- tickers (reference data) ---

    /// Insert a ticker. Fails if the symbol is already taken (case-insensitive).
    async fn insert_ticker(&self, ticker: NewTicker) -> Result<Ticker>;

    async fn list_tickers(&self) -> Result<Vec<Ticker>>;

    async fn ticker_by_symbol(&self, symbol: &str) -> Result<Option<Ticker>>;

    // --- headlines ---

    async fn headline(&self, id: i64) -> Result<Option<Headline>>;

    /// Subset of `urls` that already exist on stored headlines.
    async fn existing_urls(&self, urls: &[String]) -> Result<HashSet<String>>;

    /// Subset of `hashes` matching the SHA-256 of a stored headline's trimmed title.
    async fn existing_title_hashes(&self, hashes: &[String]) -> Result<HashSet<String>>;

    /// Insert a batch of headlines atomically and return them with ids assigned.
    async fn insert_headlines(&self, rows: Vec<NewHeadline>) -> Result<Vec<Headline>>;

    /// Delete a headline: its mentions go with it, its risk scores survive with
    /// `headline_id` cleared. Returns whether the headline existed.
    async fn delete_headline(&self, id: i64) -> Result<bool>;

    // --- processing backlog ---

    /// Ids of headlines with zero mentions AND zero risk scores, newest first.
    async fn unprocessed_headlines(&self, limit: usize) -> Result<Vec<i64>>;

    /// Write one headline's mention/score rows in a single unit: either every
    /// pair lands or none do. Fails if the headline does not exist.
    async fn record_mentions_and_scores(
        &self,
        headline_id: i64,
        rows: Vec<(NewMention, NewRiskScore)>,
    ) -> Result<()>;

    // --- reads for analysis ---

    async fn mentions_for_headline(&self, headline_id: i64) -> Result<Vec<Mention>>;

    async fn scores_for_headline(&self, headline_id: i64) -> Result<Vec<RiskScore>>;

    /// Risk scores for a ticker with `start <= created_at < end`, ascending.
    async fn scores_for_ticker(
        &self,
        ticker_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<RiskScore>>;

    /// Direct score insert, used by seed/backfill paths.
    async fn insert_score(&self, score: NewRiskScore) -> Result<RiskScore>;
}
