// src/ingest/types.rs
use anyhow::Result;
use chrono::{DateTime, Utc};

/// A normalized headline record as produced by a feed provider.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct RawHeadline {
    /// Display title; also the content-dedup key via SHA-256 of the trimmed text.
    pub title: String,
    pub published_at: Option<DateTime<Utc>>,
    pub source: Option<String>,
    /// Natural dedup key when present.
    pub url: Option<String>,
}

#[async_trait::async_trait]
pub trait HeadlineProvider: Send + Sync {
    async fn fetch_latest(&self) -> Result<Vec<RawHeadline>>;
    fn name(&self) -> &'static str;
}
