// src/scoring.rs
//! Composite risk scoring.
//!
//! Pure and infallible: out-of-range inputs are clamped, missing inputs are
//! treated as neutral, and weights are renormalized to sum to 1 before use, so
//! scaling every weight by the same factor leaves the composite unchanged.
//!
//! Component conversion to a 0–100 risk scale (higher = more risk):
//! - `sentiment_risk = (1 - sentiment) * 50` (sentiment -1 → 100, +1 → 0)
//! - `urgency_risk = urgency * 100`
//! - `volatility_risk = volatility * 100`
//!
//! Composite = weighted sum of the three, rounded to 2 decimals.

use serde::Deserialize;
use std::path::Path;

const ENV_WEIGHTS_PATH: &str = "RISK_WEIGHTS_PATH";
const DEFAULT_WEIGHTS_PATH: &str = "config/risk_weights.toml";

/// Component weights. The canonical defaults are 0.6 / 0.3 / 0.1
/// (sentiment / urgency / volatility).
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct RiskWeights {
    pub sentiment: f64,
    pub urgency: f64,
    pub volatility: f64,
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            sentiment: 0.6,
            urgency: 0.3,
            volatility: 0.1,
        }
    }
}

/// Per-key overrides merged onto the defaults; unknown concerns cannot be
/// expressed, matching the fixed component set.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct WeightOverrides {
    pub sentiment: Option<f64>,
    pub urgency: Option<f64>,
    pub volatility: Option<f64>,
}

impl RiskWeights {
    pub fn with_overrides(self, o: WeightOverrides) -> Self {
        Self {
            sentiment: o.sentiment.unwrap_or(self.sentiment),
            urgency: o.urgency.unwrap_or(self.urgency),
            volatility: o.volatility.unwrap_or(self.volatility),
        }
    }

    /// Scale so the components sum to 1. A zero/negative total falls back to 1
    /// to keep the scorer total, never panicking or erroring.
    fn normalized(self) -> Self {
        let total = self.sentiment + self.urgency + self.volatility;
        let total = if total > 0.0 { total } else { 1.0 };
        Self {
            sentiment: self.sentiment / total,
            urgency: self.urgency / total,
            volatility: self.volatility / total,
        }
    }

    /// Load weight overrides from a TOML file.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let overrides: WeightOverrides = toml::from_str(&content)?;
        Ok(Self::default().with_overrides(overrides))
    }

    /// Resolve weights from `$RISK_WEIGHTS_PATH`, then `config/risk_weights.toml`,
    /// then the built-in defaults. Unreadable files log a warning and fall back.
    pub fn load_default() -> Self {
        let path = std::env::var(ENV_WEIGHTS_PATH)
            .map(std::path::PathBuf::from)
            .unwrap_or_else(|_| std::path::PathBuf::from(DEFAULT_WEIGHTS_PATH));
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(w) => w,
            Err(e) => {
                tracing::warn!(error = ?e, path = %path.display(), "risk weights unreadable, using defaults");
                Self::default()
            }
        }
    }
}

/// Composite plus the three unweighted sub-scores, all in [0, 100].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskBreakdown {
    pub composite: f64,
    pub sentiment_risk: f64,
    pub urgency_risk: f64,
    pub volatility_risk: f64,
}

/// Compute the composite risk percent. Missing inputs are neutral (0); all
/// inputs are clamped before use. Never errors.
pub fn compute_risk_score(
    sentiment: Option<f64>,
    urgency: Option<f64>,
    volatility: Option<f64>,
    weights: Option<RiskWeights>,
) -> RiskBreakdown {
    let w = weights.unwrap_or_default().normalized();

    let s = sentiment.unwrap_or(0.0).clamp(-1.0, 1.0);
    let u = urgency.unwrap_or(0.0).clamp(0.0, 1.0);
    let v = volatility.unwrap_or(0.0).clamp(0.0, 1.0);

    let sentiment_risk = (1.0 - s) * 50.0;
    let urgency_risk = u * 100.0;
    let volatility_risk = v * 100.0;

    let composite =
        sentiment_risk * w.sentiment + urgency_risk * w.urgency + volatility_risk * w.volatility;

    RiskBreakdown {
        composite: round2(composite),
        sentiment_risk,
        urgency_risk,
        volatility_risk,
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documented_example_with_default_weights() {
        // sentiment -0.2, urgency 0.8, volatility 0.5 -> sub-scores (60, 80, 50)
        // composite = 60*0.6 + 80*0.3 + 50*0.1 = 65.00
        let out = compute_risk_score(Some(-0.2), Some(0.8), Some(0.5), None);
        assert_eq!(out.sentiment_risk, 60.0);
        assert_eq!(out.urgency_risk, 80.0);
        assert_eq!(out.volatility_risk, 50.0);
        assert_eq!(out.composite, 65.0);
    }

    #[test]
    fn out_of_range_inputs_are_clamped() {
        let clamped = compute_risk_score(Some(-5.0), Some(2.0), Some(-1.0), None);
        let exact = compute_risk_score(Some(-1.0), Some(1.0), Some(0.0), None);
        assert_eq!(clamped, exact);
    }

    #[test]
    fn missing_inputs_are_neutral() {
        let out = compute_risk_score(None, None, None, None);
        assert_eq!(out.sentiment_risk, 50.0);
        assert_eq!(out.urgency_risk, 0.0);
        assert_eq!(out.volatility_risk, 0.0);
    }

    #[test]
    fn weight_scaling_is_invariant() {
        let doubled = RiskWeights {
            sentiment: 1.2,
            urgency: 0.6,
            volatility: 0.2,
        };
        let a = compute_risk_score(Some(-0.2), Some(0.8), Some(0.5), None);
        let b = compute_risk_score(Some(-0.2), Some(0.8), Some(0.5), Some(doubled));
        assert_eq!(a.composite, b.composite);
    }

    #[test]
    fn zero_weights_fall_back_without_panicking() {
        let zero = RiskWeights {
            sentiment: 0.0,
            urgency: 0.0,
            volatility: 0.0,
        };
        let out = compute_risk_score(Some(-1.0), Some(1.0), Some(1.0), Some(zero));
        assert!(out.composite >= 0.0 && out.composite <= 100.0);
    }

    #[test]
    fn result_is_always_in_range() {
        let worst = compute_risk_score(Some(-1.0), Some(1.0), Some(1.0), None);
        assert_eq!(worst.composite, 100.0);
        let best = compute_risk_score(Some(1.0), Some(0.0), Some(0.0), None);
        assert_eq!(best.composite, 0.0);
    }

    #[test]
    fn partial_toml_overrides_merge_onto_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("risk_weights.toml");
        std::fs::write(&path, "urgency = 0.5\n").unwrap();

        let w = RiskWeights::load_from(&path).unwrap();
        assert_eq!(w.sentiment, 0.6);
        assert_eq!(w.urgency, 0.5);
        assert_eq!(w.volatility, 0.1);
    }

    #[test]
    fn overrides_merge_onto_defaults() {
        let w = RiskWeights::default().with_overrides(WeightOverrides {
            urgency: Some(0.5),
            ..Default::default()
        });
        assert_eq!(w.sentiment, 0.6);
        assert_eq!(w.urgency, 0.5);
        assert_eq!(w.volatility, 0.1);
    }
}
