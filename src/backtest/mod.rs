// src/backtest/mod.rs
//! Risk/return backtest engine.
//!
//! Validates the risk signal against subsequent price moves: daily risk at day
//! t is paired with the simple return realized between t and t+1, under the
//! assumption that the risk reading is causally prior to that return. The
//! aligned sample feeds Pearson correlation, a 90th-percentile-thresholded
//! AUC, and the mean next-day return conditioned on top-decile risk.

pub mod prices;
pub mod report;
pub mod stats;

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;
use chrono::NaiveDate;
use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing::info;

use crate::error::CoreError;
use crate::store::Store;

pub use prices::{business_days, DailySeries, PriceProvider, SyntheticPrices};
pub use report::ReportPaths;

/// Risk percentile used both for the AUC threshold split and the
/// decile-conditioned return.
const TOP_DECILE_PCT: f64 = 90.0;

/// Below this many aligned observations the statistics are defined as
/// unreliable and left unset.
const MIN_OBSERVATIONS: usize = 3;

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("backtest_runs_total", "Completed backtest runs.");
    });
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestResults {
    pub pearson_corr: Option<f64>,
    pub auc_thresholded: Option<f64>,
    pub avg_return_top_decile: Option<f64>,
    pub count_observations: usize,
}

/// Daily risk series for a ticker: composite scores in `[start, end)` grouped
/// by UTC calendar date, arithmetic mean per day, unscored rows dropped.
pub async fn fetch_risk_timeseries(
    store: &dyn Store,
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<DailySeries> {
    let ticker = store
        .ticker_by_symbol(symbol)
        .await?
        .ok_or_else(|| CoreError::TickerNotFound(symbol.to_string()))?;

    let start_dt = start.and_hms_opt(0, 0, 0).expect("midnight").and_utc();
    let end_dt = end.and_hms_opt(0, 0, 0).expect("midnight").and_utc();
    let rows = store.scores_for_ticker(ticker.id, start_dt, end_dt).await?;

    let mut sums: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
    for row in rows {
        let Some(composite) = row.composite else {
            continue;
        };
        let day = row.created_at.date_naive();
        let e = sums.entry(day).or_insert((0.0, 0));
        e.0 += composite;
        e.1 += 1;
    }

    if sums.is_empty() {
        return Err(CoreError::NoData(format!(
            "no risk scores for {symbol} between {start} and {end}"
        ))
        .into());
    }

    Ok(sums
        .into_iter()
        .map(|(day, (sum, n))| (day, sum / n as f64))
        .collect())
}

/// Inner-join risk(t) with the next trading day's return, dropping dates
/// missing either side. Returns `(date, risk, next_return)` triples in date
/// order. "Next" follows the price series, so holiday gaps pair Friday's risk
/// with the Friday→Monday return.
pub(crate) fn align_risk_and_next_returns(
    prices: &DailySeries,
    risk: &DailySeries,
) -> Vec<(NaiveDate, f64, f64)> {
    let price_rows: Vec<(&NaiveDate, &f64)> = prices.iter().collect();

    let mut out = Vec::new();
    for pair in price_rows.windows(2) {
        let (day, close) = pair[0];
        let (_, next_close) = pair[1];
        if *close == 0.0 {
            continue;
        }
        let next_ret = next_close / close - 1.0;
        if let Some(r) = risk.get(day) {
            out.push((*day, *r, next_ret));
        }
    }
    out
}

/// Signal-quality statistics over the aligned sample. Fewer than three aligned
/// observations yields all-`None` statistics with the true count.
pub fn compute_metrics(prices: &DailySeries, risk: &DailySeries) -> BacktestResults {
    let aligned = align_risk_and_next_returns(prices, risk);
    let n = aligned.len();
    if n < MIN_OBSERVATIONS {
        return BacktestResults {
            pearson_corr: None,
            auc_thresholded: None,
            avg_return_top_decile: None,
            count_observations: n,
        };
    }

    let risk_v: Vec<f64> = aligned.iter().map(|(_, r, _)| *r).collect();
    let ret_v: Vec<f64> = aligned.iter().map(|(_, _, ret)| *ret).collect();

    let pearson_corr = stats::pearson_correlation(&risk_v, &ret_v);

    // Binary split at the in-sample 90th percentile of risk; label = "next-day
    // return is negative"; AUC over the binarized predictor.
    let threshold = stats::percentile(&risk_v, TOP_DECILE_PCT);
    let high: Vec<f64> = risk_v
        .iter()
        .map(|&r| if r >= threshold { 1.0 } else { 0.0 })
        .collect();
    let negative: Vec<bool> = ret_v.iter().map(|&r| r < 0.0).collect();
    let auc_thresholded = stats::rank_auc(&negative, &high);

    let top: Vec<f64> = aligned
        .iter()
        .filter(|(_, r, _)| *r >= threshold)
        .map(|(_, _, ret)| *ret)
        .collect();
    let avg_return_top_decile = if top.is_empty() {
        None
    } else {
        Some(top.iter().sum::<f64>() / top.len() as f64)
    };

    BacktestResults {
        pearson_corr,
        auc_thresholded,
        avg_return_top_decile,
        count_observations: n,
    }
}

/// Full run: prices → risk series → metrics → report artifacts.
///
/// Fails fast with no artifacts when price or risk data is entirely absent;
/// once metrics exist (even all-`None`), report generation always writes the
/// complete artifact set.
pub async fn run_backtest(
    store: &dyn Store,
    prices_provider: &dyn PriceProvider,
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
    outdir: &Path,
) -> Result<ReportPaths> {
    ensure_metrics_described();

    let prices = prices_provider.fetch_prices(symbol, start, end).await?;
    if prices.is_empty() {
        return Err(CoreError::NoData(format!(
            "price source '{}' returned nothing for {symbol}",
            prices_provider.name()
        ))
        .into());
    }

    let risk = fetch_risk_timeseries(store, symbol, start, end).await?;
    let results = compute_metrics(&prices, &risk);
    let paths = report::generate_report(symbol, start, end, &prices, &risk, &results, outdir)?;

    counter!("backtest_runs_total").increment(1);
    info!(symbol, %start, %end, n = results.count_observations, "backtest complete");

    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, day).unwrap()
    }

    fn series(pairs: &[(u32, f64)]) -> DailySeries {
        pairs.iter().map(|&(day, v)| (d(day), v)).collect()
    }

    #[test]
    fn alignment_pairs_risk_with_next_day_return() {
        let prices = series(&[(1, 100.0), (2, 110.0), (3, 99.0)]);
        let risk = series(&[(1, 0.5), (2, 0.9)]);

        let aligned = align_risk_and_next_returns(&prices, &risk);
        assert_eq!(aligned.len(), 2);
        assert_eq!(aligned[0].0, d(1));
        assert!((aligned[0].2 - 0.10).abs() < 1e-12);
        assert!((aligned[1].2 - (99.0 / 110.0 - 1.0)).abs() < 1e-12);
    }

    #[test]
    fn alignment_drops_dates_missing_either_side() {
        let prices = series(&[(1, 100.0), (2, 101.0), (3, 102.0), (4, 103.0)]);
        let risk = series(&[(2, 0.4), (9, 0.8)]);
        let aligned = align_risk_and_next_returns(&prices, &risk);
        assert_eq!(aligned.len(), 1);
        assert_eq!(aligned[0].0, d(2));
    }

    #[test]
    fn under_sampled_metrics_are_all_none_with_exact_count() {
        let prices = series(&[(1, 100.0), (2, 101.0), (3, 102.0)]);
        let risk = series(&[(1, 0.5), (2, 0.6)]);
        let out = compute_metrics(&prices, &risk);
        assert_eq!(out.count_observations, 2);
        assert_eq!(out.pearson_corr, None);
        assert_eq!(out.auc_thresholded, None);
        assert_eq!(out.avg_return_top_decile, None);
    }

    #[test]
    fn high_risk_before_drawdowns_correlates_negatively() {
        // Risk 1.0 on days preceding negative returns, 0.2 otherwise.
        let rets = [-0.05, 0.02, -0.03, 0.01, -0.04, 0.015, 0.0, -0.02, 0.03, -0.01, 0.02];
        let mut prices = DailySeries::new();
        let mut close = 100.0;
        prices.insert(d(1), close);
        for (i, r) in rets.iter().enumerate() {
            close *= 1.0 + r;
            prices.insert(d(2 + i as u32), close);
        }

        let mut risk = DailySeries::new();
        for (i, r) in rets.iter().enumerate() {
            risk.insert(d(1 + i as u32), if *r < 0.0 { 1.0 } else { 0.2 });
        }
        // Value for the final day (no next return); median-ish filler.
        risk.insert(d(12), 0.5);

        let out = compute_metrics(&prices, &risk);
        assert_eq!(out.count_observations, rets.len());
        assert!(out.pearson_corr.unwrap() < 0.0);
        if let Some(auc) = out.auc_thresholded {
            assert!(auc >= 0.5);
        }
        assert!(out.avg_return_top_decile.unwrap() < 0.0);
    }
}
