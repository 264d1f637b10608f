// src/store/entities.rs
//! Persisted record shapes. Ids are assigned by the store on insert.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An ingested news item. Immutable once inserted; deleting one cascades to
/// its mentions while its risk scores survive with `headline_id` cleared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Headline {
    pub id: i64,
    pub source: Option<String>,
    pub url: Option<String>,
    pub title: String,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Canonical identity for a tradable security. Read-mostly reference data,
/// seeded out of band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticker {
    pub id: i64,
    pub symbol: String,
    pub name: Option<String>,
    pub sector: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A detected reference linking one headline to one ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mention {
    pub id: i64,
    pub headline_id: i64,
    pub ticker_id: i64,
    /// Truncated title snippet (at most 512 chars).
    pub context: Option<String>,
    pub relevance: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// A scored observation tied to a ticker and (optionally) the headline that
/// produced it. The defining observation unit of the backtest engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskScore {
    pub id: i64,
    pub ticker_id: i64,
    pub headline_id: Option<i64>,
    /// Scoring model identifier (e.g. the sentiment model's name).
    pub model: String,
    /// Sentiment in [-1, 1]; negative means riskier.
    pub sentiment: Option<f64>,
    /// Urgency in [0, 1].
    pub urgency: Option<f64>,
    /// Volatility in [0, 1].
    pub volatility: Option<f64>,
    /// Composite risk percent in [0, 100].
    pub composite: Option<f64>,
    pub created_at: DateTime<Utc>,
}

// ---- Insertion shapes ----

#[derive(Debug, Clone, Default)]
pub struct NewHeadline {
    pub source: Option<String>,
    pub url: Option<String>,
    pub title: String,
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct NewTicker {
    pub symbol: String,
    pub name: Option<String>,
    pub sector: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewMention {
    pub ticker_id: i64,
    pub context: Option<String>,
    pub relevance: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct NewRiskScore {
    pub ticker_id: i64,
    pub headline_id: Option<i64>,
    pub model: String,
    pub sentiment: Option<f64>,
    pub urgency: Option<f64>,
    pub volatility: Option<f64>,
    pub composite: Option<f64>,
    /// Explicit observation time; `None` means "now". Seed/backfill paths set it.
    pub created_at: Option<DateTime<Utc>>,
}
