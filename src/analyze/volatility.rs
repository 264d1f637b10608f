// src/analyze/volatility.rs
//! Lightweight volatility heuristic in [0, 1]: sentiment magnitude blended
//! with urgency. Used at read/analyze time, not at ingestion.

pub fn estimate_volatility(sentiment: f64, urgency: f64) -> f64 {
    let vol = 0.5 * sentiment.abs() + 0.5 * urgency;
    vol.clamp(0.0, 1.0)
}
