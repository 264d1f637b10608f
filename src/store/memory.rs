// src/store/memory.rs
//! In-memory [`Store`] backed by a single `RwLock`.
//!
//! Every trait method takes the lock exactly once, so each logical unit of
//! work is atomic under concurrent writers without further coordination.

use std::collections::HashSet;
use std::sync::RwLock;

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};

use crate::ingest::title_hash;
use crate::store::entities::{
    Headline, Mention, NewHeadline, NewMention, NewRiskScore, NewTicker, RiskScore, Ticker,
};
use crate::store::Store;

#[derive(Debug, Default)]
struct Inner {
    headlines: Vec<Headline>,
    tickers: Vec<Ticker>,
    mentions: Vec<Mention>,
    scores: Vec<RiskScore>,
    next_id: i64,
}

impl Inner {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl Store for MemoryStore {
    async fn insert_ticker(&self, ticker: NewTicker) -> Result<Ticker> {
        let mut inner = self.inner.write().expect("store lock poisoned");
        if inner
            .tickers
            .iter()
            .any(|t| t.symbol.eq_ignore_ascii_case(&ticker.symbol))
        {
            bail!("ticker symbol '{}' already exists", ticker.symbol);
        }
        let row = Ticker {
            id: inner.next_id(),
            symbol: ticker.symbol,
            name: ticker.name,
            sector: ticker.sector,
            created_at: Utc::now(),
        };
        inner.tickers.push(row.clone());
        Ok(row)
    }

    async fn list_tickers(&self) -> Result<Vec<Ticker>> {
        let inner = self.inner.read().expect("store lock poisoned");
        Ok(inner.tickers.clone())
    }

    async fn ticker_by_symbol(&self, symbol: &str) -> Result<Option<Ticker>> {
        let inner = self.inner.read().expect("store lock poisoned");
        Ok(inner
            .tickers
            .iter()
            .find(|t| t.symbol.eq_ignore_ascii_case(symbol))
            .cloned())
    }

    async fn headline(&self, id: i64) -> Result<Option<Headline>> {
        let inner = self.inner.read().expect("store lock poisoned");
        Ok(inner.headlines.iter().find(|h| h.id == id).cloned())
    }

    async fn existing_urls(&self, urls: &[String]) -> Result<HashSet<String>> {
        let inner = self.inner.read().expect("store lock poisoned");
        let wanted: HashSet<&str> = urls.iter().map(String::as_str).collect();
        Ok(inner
            .headlines
            .iter()
            .filter_map(|h| h.url.as_deref())
            .filter(|u| wanted.contains(u))
            .map(str::to_string)
            .collect())
    }

    async fn existing_title_hashes(&self, hashes: &[String]) -> Result<HashSet<String>> {
        let inner = self.inner.read().expect("store lock poisoned");
        let wanted: HashSet<&str> = hashes.iter().map(String::as_str).collect();
        Ok(inner
            .headlines
            .iter()
            .map(|h| title_hash(h.title.trim()))
            .filter(|h| wanted.contains(h.as_str()))
            .collect())
    }

    async fn insert_headlines(&self, rows: Vec<NewHeadline>) -> Result<Vec<Headline>> {
        let mut inner = self.inner.write().expect("store lock poisoned");
        let now = Utc::now();
        let mut out = Vec::with_capacity(rows.len());
        for r in rows {
            let row = Headline {
                id: inner.next_id(),
                source: r.source,
                url: r.url,
                title: r.title,
                published_at: r.published_at,
                created_at: now,
            };
            inner.headlines.push(row.clone());
            out.push(row);
        }
        Ok(out)
    }

    async fn delete_headline(&self, id: i64) -> Result<bool> {
        let mut inner = self.inner.write().expect("store lock poisoned");
        let before = inner.headlines.len();
        inner.headlines.retain(|h| h.id != id);
        if inner.headlines.len() == before {
            return Ok(false);
        }
        // CASCADE for mentions, SET NULL for risk scores.
        inner.mentions.retain(|m| m.headline_id != id);
        for s in inner.scores.iter_mut() {
            if s.headline_id == Some(id) {
                s.headline_id = None;
            }
        }
        Ok(true)
    }

    async fn unprocessed_headlines(&self, limit: usize) -> Result<Vec<i64>> {
        let inner = self.inner.read().expect("store lock poisoned");
        let mentioned: HashSet<i64> = inner.mentions.iter().map(|m| m.headline_id).collect();
        let scored: HashSet<i64> = inner.scores.iter().filter_map(|s| s.headline_id).collect();
        let mut ids: Vec<i64> = inner
            .headlines
            .iter()
            .map(|h| h.id)
            .filter(|id| !mentioned.contains(id) && !scored.contains(id))
            .collect();
        ids.sort_unstable_by(|a, b| b.cmp(a));
        ids.truncate(limit);
        Ok(ids)
    }

    async fn record_mentions_and_scores(
        &self,
        headline_id: i64,
        rows: Vec<(NewMention, NewRiskScore)>,
    ) -> Result<()> {
        let mut inner = self.inner.write().expect("store lock poisoned");
        if !inner.headlines.iter().any(|h| h.id == headline_id) {
            bail!("headline {headline_id} does not exist");
        }
        let now = Utc::now();
        for (m, s) in rows {
            let mention_id = inner.next_id();
            inner.mentions.push(Mention {
                id: mention_id,
                headline_id,
                ticker_id: m.ticker_id,
                context: m.context,
                relevance: m.relevance,
                created_at: now,
            });
            let score_id = inner.next_id();
            inner.scores.push(RiskScore {
                id: score_id,
                ticker_id: s.ticker_id,
                headline_id: s.headline_id,
                model: s.model,
                sentiment: s.sentiment,
                urgency: s.urgency,
                volatility: s.volatility,
                composite: s.composite,
                created_at: s.created_at.unwrap_or(now),
            });
        }
        Ok(())
    }

    async fn mentions_for_headline(&self, headline_id: i64) -> Result<Vec<Mention>> {
        let inner = self.inner.read().expect("store lock poisoned");
        Ok(inner
            .mentions
            .iter()
            .filter(|m| m.headline_id == headline_id)
            .cloned()
            .collect())
    }

    async fn scores_for_headline(&self, headline_id: i64) -> Result<Vec<RiskScore>> {
        let inner = self.inner.read().expect("store lock poisoned");
        Ok(inner
            .scores
            .iter()
            .filter(|s| s.headline_id == Some(headline_id))
            .cloned()
            .collect())
    }

    async fn scores_for_ticker(
        &self,
        ticker_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<RiskScore>> {
        let inner = self.inner.read().expect("store lock poisoned");
        let mut out: Vec<RiskScore> = inner
            .scores
            .iter()
            .filter(|s| s.ticker_id == ticker_id && s.created_at >= start && s.created_at < end)
            .cloned()
            .collect();
        out.sort_by_key(|s| s.created_at);
        Ok(out)
    }

    async fn insert_score(&self, score: NewRiskScore) -> Result<RiskScore> {
        let mut inner = self.inner.write().expect("store lock poisoned");
        let row = RiskScore {
            id: inner.next_id(),
            ticker_id: score.ticker_id,
            headline_id: score.headline_id,
            model: score.model,
            sentiment: score.sentiment,
            urgency: score.urgency,
            volatility: score.volatility,
            composite: score.composite,
            created_at: score.created_at.unwrap_or_else(Utc::now),
        };
        inner.scores.push(row.clone());
        Ok(row)
    }
}
