// src/analyze/sentiment.rs
//! Sentiment collaborator seam plus the built-in lexicon model.
//!
//! `Err` from [`SentimentModel::score`] means "model unavailable"; the caller
//! decides the fallback (the orchestrator degrades to neutral 0.0). The model
//! never silently swallows its own failures.

use anyhow::Result;
use once_cell::sync::Lazy;
use std::collections::HashMap;

#[async_trait::async_trait]
pub trait SentimentModel: Send + Sync {
    /// Sentiment in [-1, 1].
    async fn score(&self, text: &str) -> Result<f64>;

    /// Model identifier persisted on each `RiskScore`.
    fn name(&self) -> &'static str;
}

static LEXICON: Lazy<HashMap<String, i32>> = Lazy::new(|| {
    let raw = include_str!("../sentiment_lexicon.json");
    serde_json::from_str::<HashMap<String, i32>>(raw).expect("valid sentiment lexicon")
});

/// Word-polarity values span [-3, 3]; used to normalize the sum into [-1, 1].
const MAX_WORD_SCORE: f64 = 3.0;

/// Lexicon scorer with a short negation window.
#[derive(Debug, Clone, Default)]
pub struct LexiconSentiment;

impl LexiconSentiment {
    pub fn new() -> Self {
        Self
    }

    #[inline]
    fn word_score(&self, w: &str) -> i32 {
        *LEXICON.get(w).unwrap_or(&0)
    }

    /// Raw lexicon sum and the number of scoring words.
    ///
    /// Negation: a negator within the previous 1..=3 tokens inverts the sign of
    /// the word's lexicon score.
    fn score_tokens(&self, text: &str) -> (i32, usize) {
        let tokens: Vec<String> = tokenize(text).collect();
        let mut score: i32 = 0;
        let mut hits: usize = 0;

        for i in 0..tokens.len() {
            let base = self.word_score(tokens[i].as_str());
            if base == 0 {
                continue;
            }
            let negated = (1..=3).any(|k| i >= k && is_negator(tokens[i - k].as_str()));
            score += if negated { -base } else { base };
            hits += 1;
        }

        (score, hits)
    }
}

#[async_trait::async_trait]
impl SentimentModel for LexiconSentiment {
    async fn score(&self, text: &str) -> Result<f64> {
        if text.trim().is_empty() {
            return Ok(0.0);
        }
        let (sum, hits) = self.score_tokens(text);
        if hits == 0 {
            return Ok(0.0);
        }
        let normalized = sum as f64 / (MAX_WORD_SCORE * hits as f64);
        Ok(normalized.clamp(-1.0, 1.0))
    }

    fn name(&self) -> &'static str {
        "lexicon"
    }
}

/// Alphanumeric tokens, lower-cased.
fn tokenize(s: &str) -> impl Iterator<Item = String> + '_ {
    s.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_ascii_lowercase())
}

fn is_negator(tok: &str) -> bool {
    matches!(
        tok,
        "not" | "no" | "never" | "isn't" | "wasn't" | "aren't" | "won't" | "can't" | "cannot"
            | "without"
    )
}
