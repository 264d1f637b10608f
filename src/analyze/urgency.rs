// src/analyze/urgency.rs
//! Keyword-weighted urgency score.
//!
//! Score = sum of matched phrase weights / sum of all weights, clamped to
//! [0, 1]. The table is fixed; phrases match as substrings of the lowercased
//! text, so multi-word phrases ("guidance cut") work without tokenization.

use once_cell::sync::Lazy;

static KEYWORDS: Lazy<Vec<(&'static str, f64)>> = Lazy::new(|| {
    vec![
        ("breaking", 1.0),
        ("urgent", 1.0),
        ("plunges", 0.8),
        ("soars", 0.8),
        ("downgrade", 0.6),
        ("upgrade", 0.6),
        ("halts", 0.7),
        ("bankruptcy", 1.0),
        ("investigation", 0.6),
        ("guidance cut", 0.8),
        ("profit warning", 0.9),
    ]
});

pub fn urgency_score(text: &str) -> f64 {
    if text.trim().is_empty() {
        return 0.0;
    }

    let text_l = text.to_lowercase();
    let total_weight: f64 = KEYWORDS.iter().map(|(_, w)| w).sum();
    let matched: f64 = KEYWORDS
        .iter()
        .filter(|(k, _)| text_l.contains(k))
        .map(|(_, w)| w)
        .sum();

    (matched / total_weight).clamp(0.0, 1.0)
}
