// src/backtest/prices.rs
//! Price-history collaborator seam.

use std::collections::BTreeMap;

use anyhow::Result;
use chrono::{Datelike, NaiveDate, Weekday};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::error::CoreError;

/// Daily close prices keyed by calendar date.
pub type DailySeries = BTreeMap<NaiveDate, f64>;

#[async_trait::async_trait]
pub trait PriceProvider: Send + Sync {
    /// Daily closes for `symbol` over `[start, end)`. Implementors fail with
    /// a `NoData` error when the source returns nothing.
    async fn fetch_prices(&self, symbol: &str, start: NaiveDate, end: NaiveDate)
        -> Result<DailySeries>;

    fn name(&self) -> &'static str;
}

/// Business days (Mon–Fri) in `[start, end)`.
pub fn business_days(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut out = Vec::new();
    let mut d = start;
    while d < end {
        if !matches!(d.weekday(), Weekday::Sat | Weekday::Sun) {
            out.push(d);
        }
        d = d.succ_opt().expect("date overflow");
    }
    out
}

/// Deterministic seeded random walk over business days; stands in for a real
/// market-data source in the demo binary and tests.
#[derive(Debug, Clone)]
pub struct SyntheticPrices {
    pub seed: u64,
    pub start_price: f64,
}

impl Default for SyntheticPrices {
    fn default() -> Self {
        Self {
            seed: 42,
            start_price: 100.0,
        }
    }
}

#[async_trait::async_trait]
impl PriceProvider for SyntheticPrices {
    async fn fetch_prices(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<DailySeries> {
        let days = business_days(start, end);
        if days.is_empty() {
            return Err(CoreError::NoData(format!(
                "no trading days for {symbol} between {start} and {end}"
            ))
            .into());
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut close = self.start_price;
        let mut out = DailySeries::new();
        for d in days {
            out.insert(d, close);
            let ret: f64 = rng.random_range(-0.010..0.012);
            close *= 1.0 + ret;
        }
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "synthetic"
    }
}
