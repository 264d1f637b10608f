//! Demo backtest runner.
//!
//! Seeds an in-memory store with a ticker and a few weeks of synthetic
//! composite risk scores, synthesizes business-day prices, runs the full
//! backtest, and prints the artifact paths.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use chrono::{Duration, NaiveDate, TimeZone, Utc};
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use news_risk_analyzer::backtest::{run_backtest, SyntheticPrices};
use news_risk_analyzer::store::{MemoryStore, NewRiskScore, NewTicker, Store};

#[derive(Debug, Parser)]
#[command(name = "backtest_demo", about = "Risk/return backtester demo")]
struct Args {
    /// Ticker symbol, e.g. AAPL
    #[arg(long, default_value = "AAPL")]
    symbol: String,

    /// Start date YYYY-MM-DD
    #[arg(long, default_value = "2024-01-01")]
    start: NaiveDate,

    /// End date YYYY-MM-DD (exclusive)
    #[arg(long, default_value = "2024-02-01")]
    end: NaiveDate,

    /// Output directory for report and plots
    #[arg(long, default_value = "backtest_reports")]
    outdir: PathBuf,
}

/// Insert 15 days of cycling synthetic composites so the report has variation.
async fn seed_demo_scores(store: &dyn Store, symbol: &str, start: NaiveDate) -> Result<()> {
    let ticker = store
        .insert_ticker(NewTicker {
            symbol: symbol.to_string(),
            name: Some(format!("{symbol} Demo Corp.")),
            sector: None,
        })
        .await?;

    let base = Utc
        .from_utc_datetime(&start.and_hms_opt(12, 0, 0).expect("midday"));
    for i in 0..15 {
        let composite = 0.2 + 0.05 * (i % 5) as f64;
        store
            .insert_score(NewRiskScore {
                ticker_id: ticker.id,
                headline_id: None,
                model: "synthetic".to_string(),
                sentiment: None,
                urgency: None,
                volatility: None,
                composite: Some(composite),
                created_at: Some(base + Duration::days(i)),
            })
            .await?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();

    let args = Args::parse();

    let store = Arc::new(MemoryStore::new());
    seed_demo_scores(store.as_ref(), &args.symbol, args.start).await?;

    let prices = SyntheticPrices::default();
    let paths = run_backtest(
        store.as_ref(),
        &prices,
        &args.symbol,
        args.start,
        args.end,
        &args.outdir,
    )
    .await?;

    println!("Backtest complete. Outputs:");
    println!(" - html: {}", paths.html.display());
    println!(" - csv: {}", paths.csv.display());
    println!(" - plot_price_risk: {}", paths.plot_price_risk.display());
    println!(" - plot_scatter: {}", paths.plot_scatter.display());

    Ok(())
}
