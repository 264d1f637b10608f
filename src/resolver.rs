// src/resolver.rs
//! Free-text candidate → canonical ticker resolution.
//!
//! Matching is three-tier, first match wins per candidate: exact symbol
//! (case-insensitive), exact display name (case-insensitive), then fuzzy
//! Levenshtein against all display names with a 0.85 cutoff. Unmatched
//! candidates are silently dropped; output is deduplicated by ticker id in
//! first-resolution order.
//!
//! The symbol/name index is expensive to rebuild per call, so the resolver
//! keeps a snapshot with a bounded TTL (default 300 s). Readers clone an `Arc`
//! to the current snapshot; on expiry the index is rebuilt from the store and
//! swapped in whole, so a half-built index is never observable. The clock is
//! injected to keep expiry testable.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use anyhow::Result;
use strsim::normalized_levenshtein;

use crate::store::{Store, Ticker};

pub const DEFAULT_TTL_SECS: u64 = 300;
pub const FUZZY_CUTOFF: f64 = 0.85;

const ENV_TTL: &str = "RESOLVER_TTL_SECS";

/// Cache TTL from `$RESOLVER_TTL_SECS`, falling back to the 300 s default.
pub fn ttl_from_env() -> Duration {
    let secs = std::env::var(ENV_TTL)
        .ok()
        .and_then(|s| s.trim().parse::<u64>().ok())
        .unwrap_or(DEFAULT_TTL_SECS);
    Duration::from_secs(secs)
}

pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Immutable lookup structure over the ticker reference set.
#[derive(Debug)]
pub struct TickerIndex {
    by_symbol: HashMap<String, Ticker>,
    by_name_lower: HashMap<String, Ticker>,
    names_lower: Vec<String>,
}

impl TickerIndex {
    pub fn build(tickers: &[Ticker]) -> Self {
        let mut by_symbol = HashMap::with_capacity(tickers.len());
        let mut by_name_lower = HashMap::with_capacity(tickers.len());
        let mut names_lower = Vec::with_capacity(tickers.len());

        for t in tickers {
            by_symbol.insert(t.symbol.to_ascii_uppercase(), t.clone());
            if let Some(name) = t.name.as_deref() {
                let lower = name.to_lowercase();
                names_lower.push(lower.clone());
                by_name_lower.insert(lower, t.clone());
            }
        }

        Self {
            by_symbol,
            by_name_lower,
            names_lower,
        }
    }

    fn lookup(&self, candidate: &str) -> Option<&Ticker> {
        // 1) symbol exact
        if let Some(t) = self.by_symbol.get(&candidate.to_ascii_uppercase()) {
            return Some(t);
        }

        // 2) name exact (case-insensitive)
        let lower = candidate.to_lowercase();
        if let Some(t) = self.by_name_lower.get(&lower) {
            return Some(t);
        }

        // 3) fuzzy against names only: single best match above the cutoff
        let mut best: Option<(f64, &str)> = None;
        for name in &self.names_lower {
            let sim = normalized_levenshtein(&lower, name);
            if sim >= FUZZY_CUTOFF && best.map_or(true, |(b, _)| sim > b) {
                best = Some((sim, name.as_str()));
            }
        }
        best.and_then(|(_, name)| self.by_name_lower.get(name))
    }
}

struct Cached {
    built_at: Instant,
    index: Arc<TickerIndex>,
}

pub struct EntityResolver {
    store: Arc<dyn Store>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    cached: RwLock<Option<Cached>>,
}

impl EntityResolver {
    pub fn new(store: Arc<dyn Store>, ttl: Duration) -> Self {
        Self::with_clock(store, ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<dyn Store>, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            ttl,
            clock,
            cached: RwLock::new(None),
        }
    }

    /// Current index snapshot, rebuilding first if the cached one has expired.
    /// Concurrent callers during a rebuild keep using the previous snapshot.
    async fn current_index(&self) -> Result<Arc<TickerIndex>> {
        let now = self.clock.now();
        {
            let guard = self.cached.read().expect("resolver cache lock poisoned");
            if let Some(c) = guard.as_ref() {
                if now.duration_since(c.built_at) < self.ttl {
                    return Ok(Arc::clone(&c.index));
                }
            }
        }

        let tickers = self.store.list_tickers().await?;
        let index = Arc::new(TickerIndex::build(&tickers));

        let mut guard = self.cached.write().expect("resolver cache lock poisoned");
        *guard = Some(Cached {
            built_at: self.clock.now(),
            index: Arc::clone(&index),
        });
        Ok(index)
    }

    /// Resolve candidates to tickers: deduplicated by id, in the order each
    /// ticker was first resolved. Candidates that match nothing are dropped.
    pub async fn resolve(&self, candidates: &[String]) -> Result<Vec<Ticker>> {
        let cleaned: Vec<&str> = candidates
            .iter()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .collect();
        if cleaned.is_empty() {
            return Ok(Vec::new());
        }

        let index = self.current_index().await?;

        let mut out: Vec<Ticker> = Vec::new();
        for cand in cleaned {
            if let Some(t) = index.lookup(cand) {
                if !out.iter().any(|m| m.id == t.id) {
                    out.push(t.clone());
                }
            }
        }
        Ok(out)
    }
}
