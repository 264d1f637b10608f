// src/pipeline.rs
//! Per-headline processing: detect entity candidates, resolve them to tickers,
//! score sentiment/urgency, and persist one mention + one risk score per
//! resolved ticker in a single unit of work.

use std::sync::Arc;

use anyhow::Result;
use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;
use tracing::{info, warn};

use crate::analyze::{EntityDetector, SentimentModel};
use crate::error::CoreError;
use crate::resolver::EntityResolver;
use crate::store::{NewMention, NewRiskScore, Store};

const CONTEXT_MAX_CHARS: usize = 512;

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("pipeline_processed_total", "Headlines processed successfully.");
        describe_counter!("pipeline_failed_total", "Headlines that failed processing.");
        describe_counter!("pipeline_mentions_total", "Mention rows created.");
    });
}

/// Outcome summary for one processed headline.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessSummary {
    pub headline_id: i64,
    pub tickers: Vec<String>,
    pub sentiment: f64,
    pub urgency: f64,
    pub mentions_created: usize,
}

pub struct Processor {
    store: Arc<dyn Store>,
    resolver: EntityResolver,
    detector: Box<dyn EntityDetector>,
    sentiment: Box<dyn SentimentModel>,
}

impl Processor {
    pub fn new(
        store: Arc<dyn Store>,
        resolver: EntityResolver,
        detector: Box<dyn EntityDetector>,
        sentiment: Box<dyn SentimentModel>,
    ) -> Self {
        Self {
            store,
            resolver,
            detector,
            sentiment,
        }
    }

    /// Process one headline by id.
    ///
    /// Creates exactly one mention and one risk score per resolved ticker, all
    /// written atomically; sentiment and urgency are copied verbatim onto each
    /// score while volatility and composite stay unset (composite scoring runs
    /// at read time). Fails with [`CoreError::HeadlineNotFound`] for unknown
    /// ids; a sentiment collaborator failure degrades to neutral 0.0.
    pub async fn process_headline(&self, headline_id: i64) -> Result<ProcessSummary> {
        ensure_metrics_described();

        let headline = self
            .store
            .headline(headline_id)
            .await?
            .ok_or(CoreError::HeadlineNotFound(headline_id))?;

        let candidates = self.detector.detect_entities(&headline.title);
        let tickers = self.resolver.resolve(&candidates).await?;

        let sentiment = match self.sentiment.score(&headline.title).await {
            Ok(s) => s,
            Err(e) => {
                warn!(error = ?e, headline_id, model = self.sentiment.name(),
                    "sentiment model unavailable, using neutral");
                0.0
            }
        };
        let urgency = crate::analyze::urgency_score(&headline.title);

        let context: String = headline.title.chars().take(CONTEXT_MAX_CHARS).collect();
        let rows: Vec<(NewMention, NewRiskScore)> = tickers
            .iter()
            .map(|t| {
                (
                    NewMention {
                        ticker_id: t.id,
                        context: Some(context.clone()),
                        relevance: Some(1.0),
                    },
                    NewRiskScore {
                        ticker_id: t.id,
                        headline_id: Some(headline.id),
                        model: self.sentiment.name().to_string(),
                        sentiment: Some(sentiment),
                        urgency: Some(urgency),
                        volatility: None,
                        composite: None,
                        created_at: None,
                    },
                )
            })
            .collect();

        let mentions_created = rows.len();
        if !rows.is_empty() {
            self.store
                .record_mentions_and_scores(headline.id, rows)
                .await?;
        }

        counter!("pipeline_mentions_total").increment(mentions_created as u64);

        Ok(ProcessSummary {
            headline_id: headline.id,
            tickers: tickers.into_iter().map(|t| t.symbol).collect(),
            sentiment,
            urgency,
            mentions_created,
        })
    }

    /// Drain the unprocessed backlog (headlines with zero mentions AND zero
    /// risk scores, newest first). Per-headline failures are logged and do not
    /// abort the rest. Returns the number processed successfully.
    pub async fn process_unprocessed(&self, limit: usize) -> Result<usize> {
        ensure_metrics_described();

        let ids = self.store.unprocessed_headlines(limit).await?;
        let mut processed = 0usize;

        for id in ids {
            match self.process_headline(id).await {
                Ok(summary) => {
                    processed += 1;
                    counter!("pipeline_processed_total").increment(1);
                    info!(
                        headline_id = id,
                        tickers = summary.mentions_created,
                        "processed headline"
                    );
                }
                Err(e) => {
                    counter!("pipeline_failed_total").increment(1);
                    warn!(error = ?e, headline_id = id, "failed processing headline");
                }
            }
        }

        Ok(processed)
    }
}
