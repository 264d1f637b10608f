// src/analyze/mod.rs
//! Text-analysis collaborators for the processing pipeline: entity candidate
//! detection, sentiment, urgency, and the read-time volatility heuristic.

pub mod entities;
pub mod sentiment;
pub mod urgency;
pub mod volatility;

pub use entities::{EntityDetector, HeuristicDetector};
pub use sentiment::{LexiconSentiment, SentimentModel};
pub use urgency::urgency_score;
pub use volatility::estimate_volatility;

use anyhow::Result;
use serde::Serialize;

use crate::scoring::{compute_risk_score, RiskWeights};

/// Ad-hoc risk assessment of a piece of text, composite included.
///
/// This is the read-time path: ingestion persists raw sentiment/urgency only,
/// while composite scoring happens when someone asks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextAssessment {
    pub entities: Vec<String>,
    pub sentiment: f64,
    pub urgency: f64,
    pub volatility: f64,
    pub risk_percent: f64,
}

/// Run the full per-text analysis: candidates, sentiment (neutral on model
/// unavailability), urgency, estimated volatility, and the composite.
pub async fn assess_text(
    detector: &dyn EntityDetector,
    model: &dyn SentimentModel,
    text: &str,
    weights: Option<RiskWeights>,
) -> Result<TextAssessment> {
    let entities = detector.detect_entities(text);

    let sentiment = match model.score(text).await {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(error = ?e, model = model.name(), "sentiment model unavailable, using neutral");
            0.0
        }
    };
    let urgency = urgency_score(text);
    let volatility = estimate_volatility(sentiment, urgency);

    let breakdown = compute_risk_score(Some(sentiment), Some(urgency), Some(volatility), weights);

    Ok(TextAssessment {
        entities,
        sentiment,
        urgency,
        volatility,
        risk_percent: breakdown.composite,
    })
}
