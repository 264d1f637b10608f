// src/backtest/report.rs
//! Report artifacts for a backtest run: twin-axis price/risk chart, a
//! risk-vs-next-return scatter, a one-row metrics CSV, and an HTML report
//! embedding all of it. Filenames are keyed by symbol and date range so
//! repeated runs do not collide.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use plotters::prelude::*;

use crate::backtest::{align_risk_and_next_returns, BacktestResults, DailySeries};

#[derive(Debug, Clone, PartialEq)]
pub struct ReportPaths {
    pub html: PathBuf,
    pub csv: PathBuf,
    pub plot_price_risk: PathBuf,
    pub plot_scatter: PathBuf,
}

/// Write the full artifact set. Statistics may be `None`; the report is still
/// complete (absent values render as `NA` / empty CSV fields).
pub fn generate_report(
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
    prices: &DailySeries,
    risk: &DailySeries,
    results: &BacktestResults,
    outdir: &Path,
) -> Result<ReportPaths> {
    fs::create_dir_all(outdir)
        .with_context(|| format!("creating report directory {}", outdir.display()))?;

    let stem = format!("{symbol}_{start}_{end}");
    let plot_price_risk = outdir.join(format!("{stem}_price_risk.png"));
    let plot_scatter = outdir.join(format!("{stem}_scatter.png"));
    let csv_path = outdir.join(format!("{stem}_metrics.csv"));
    let html_path = outdir.join(format!("{stem}_report.html"));

    price_risk_chart(&plot_price_risk, symbol, start, end, prices, risk)?;
    scatter_chart(&plot_scatter, prices, risk)?;
    write_metrics_csv(&csv_path, symbol, start, end, results)?;
    write_html(&html_path, symbol, start, end, results, &plot_price_risk, &plot_scatter, &csv_path)?;

    Ok(ReportPaths {
        html: html_path,
        csv: csv_path,
        plot_price_risk,
        plot_scatter,
    })
}

fn fmt_opt(v: Option<f64>) -> String {
    v.map(|x| x.to_string()).unwrap_or_default()
}

fn fmt_opt_na(v: Option<f64>) -> String {
    v.map(|x| format!("{x:.4}")).unwrap_or_else(|| "NA".to_string())
}

fn write_metrics_csv(
    path: &Path,
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
    results: &BacktestResults,
) -> Result<()> {
    let mut w = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    w.write_record([
        "symbol",
        "start",
        "end",
        "pearson_corr",
        "auc_thresholded",
        "avg_return_top_decile",
        "n",
    ])?;
    w.write_record([
        symbol.to_string(),
        start.to_string(),
        end.to_string(),
        fmt_opt(results.pearson_corr),
        fmt_opt(results.auc_thresholded),
        fmt_opt(results.avg_return_top_decile),
        results.count_observations.to_string(),
    ])?;
    w.flush()?;
    Ok(())
}

fn date_ordinal(d: NaiveDate) -> f64 {
    d.num_days_from_ce() as f64
}

fn date_label(x: f64) -> String {
    NaiveDate::from_num_days_from_ce_opt(x as i32)
        .map(|d| d.format("%m-%d").to_string())
        .unwrap_or_default()
}

fn padded(min: f64, max: f64) -> (f64, f64) {
    if (max - min).abs() < 1e-9 {
        (min - 1.0, max + 1.0)
    } else {
        let pad = (max - min) * 0.05;
        (min - pad, max + pad)
    }
}

fn bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values {
        min = min.min(v);
        max = max.max(v);
    }
    if min.is_finite() && max.is_finite() {
        padded(min, max)
    } else {
        (0.0, 1.0)
    }
}

/// Price and risk on twin y-axes over the shared date axis.
fn price_risk_chart(
    path: &Path,
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
    prices: &DailySeries,
    risk: &DailySeries,
) -> Result<()> {
    let (x_min, x_max) = bounds(
        prices
            .keys()
            .chain(risk.keys())
            .map(|d| date_ordinal(*d)),
    );
    let (p_min, p_max) = bounds(prices.values().copied());
    let (r_min, r_max) = bounds(risk.values().copied());

    let root = BitMapBackend::new(path, (1080, 480)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(12)
        .caption(
            format!("{symbol} Price and Risk ({start} to {end})"),
            ("sans-serif", 22),
        )
        .x_label_area_size(35)
        .y_label_area_size(55)
        .right_y_label_area_size(55)
        .build_cartesian_2d(x_min..x_max, p_min..p_max)?
        .set_secondary_coord(x_min..x_max, r_min..r_max);

    chart
        .configure_mesh()
        .x_labels(8)
        .x_label_formatter(&|x| date_label(*x))
        .y_desc("Close")
        .draw()?;
    chart.configure_secondary_axes().y_desc("Risk").draw()?;

    chart.draw_series(LineSeries::new(
        prices.iter().map(|(d, c)| (date_ordinal(*d), *c)),
        &BLUE,
    ))?;
    chart.draw_secondary_series(LineSeries::new(
        risk.iter().map(|(d, r)| (date_ordinal(*d), *r)),
        &RED.mix(0.6),
    ))?;

    root.present()
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

/// Scatter of risk(t) against return(t+1) with a zero-return guide line.
fn scatter_chart(path: &Path, prices: &DailySeries, risk: &DailySeries) -> Result<()> {
    let aligned = align_risk_and_next_returns(prices, risk);

    let (x_min, x_max) = bounds(aligned.iter().map(|(_, r, _)| *r));
    let (y_min, y_max) = bounds(aligned.iter().map(|(_, _, ret)| *ret));
    let y_min = y_min.min(0.0);
    let y_max = y_max.max(0.0);

    let root = BitMapBackend::new(path, (600, 480)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(12)
        .caption("Risk vs Next-Day Return", ("sans-serif", 22))
        .x_label_area_size(40)
        .y_label_area_size(55)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)?;

    chart
        .configure_mesh()
        .x_desc("Risk (t)")
        .y_desc("Return (t+1)")
        .draw()?;

    let grey = RGBColor(128, 128, 128);
    chart.draw_series(LineSeries::new([(x_min, 0.0), (x_max, 0.0)], &grey))?;
    chart.draw_series(
        aligned
            .iter()
            .map(|(_, r, ret)| Circle::new((*r, *ret), 4, BLUE.mix(0.7).filled())),
    )?;

    root.present()
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn write_html(
    path: &Path,
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
    results: &BacktestResults,
    price_risk_png: &Path,
    scatter_png: &Path,
    metrics_csv: &Path,
) -> Result<()> {
    let file_name = |p: &Path| {
        p.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    };

    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8" />
  <title>Backtest Report - {symbol}</title>
  <style>
    body {{ font-family: Arial, sans-serif; margin: 20px; }}
    .metric {{ margin: 4px 0; }}
    img {{ max-width: 100%; height: auto; }}
  </style>
</head>
<body>
  <h2>Backtest Report - {symbol}</h2>
  <div class="metric">Date range: <b>{start}</b> to <b>{end}</b></div>
  <div class="metric">Observations (days): <b>{n}</b></div>
  <div class="metric">Pearson corr (risk_t vs return_t+1): <b>{pearson}</b></div>
  <div class="metric">AUC (thresholded risk &rarr; negative return): <b>{auc}</b></div>
  <div class="metric">Avg next-day return after top-decile risk: <b>{avg_top}</b></div>

  <h3>Price and Risk</h3>
  <img src="{price_risk}" alt="Price and Risk" />

  <h3>Risk vs Next-Day Return</h3>
  <img src="{scatter}" alt="Scatter" />

  <h3>Metrics (CSV)</h3>
  <p>See <code>{csv}</code></p>
</body>
</html>
"#,
        n = results.count_observations,
        pearson = fmt_opt_na(results.pearson_corr),
        auc = fmt_opt_na(results.auc_thresholded),
        avg_top = fmt_opt_na(results.avg_return_top_decile),
        price_risk = file_name(price_risk_png),
        scatter = file_name(scatter_png),
        csv = file_name(metrics_csv),
    );

    fs::write(path, html).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}
