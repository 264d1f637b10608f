// tests/pipeline_process.rs
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use news_risk_analyzer::analyze::{HeuristicDetector, LexiconSentiment, SentimentModel};
use news_risk_analyzer::error::CoreError;
use news_risk_analyzer::ingest::{save_headlines, types::RawHeadline};
use news_risk_analyzer::resolver::EntityResolver;
use news_risk_analyzer::store::{
    Headline, MemoryStore, Mention, NewHeadline, NewMention, NewRiskScore, NewTicker, RiskScore,
    Store, Ticker,
};
use news_risk_analyzer::Processor;

fn item(title: &str, url: &str) -> RawHeadline {
    RawHeadline {
        title: title.to_string(),
        published_at: None,
        source: Some("Test Wire".to_string()),
        url: Some(url.to_string()),
    }
}

async fn seeded_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store
        .insert_ticker(NewTicker {
            symbol: "AAPL".into(),
            name: Some("Apple Inc.".into()),
            sector: Some("Technology".into()),
        })
        .await
        .unwrap();
    store
        .insert_ticker(NewTicker {
            symbol: "TSLA".into(),
            name: Some("Tesla Inc.".into()),
            sector: None,
        })
        .await
        .unwrap();
    store
}

fn processor(store: Arc<dyn Store>) -> Processor {
    let resolver = EntityResolver::new(Arc::clone(&store), Duration::from_secs(300));
    Processor::new(
        store,
        resolver,
        Box::new(HeuristicDetector::new()),
        Box::new(LexiconSentiment::new()),
    )
}

#[tokio::test]
async fn unknown_headline_is_not_found() {
    let store = seeded_store().await;
    let p = processor(store);
    let err = p.process_headline(12345).await.unwrap_err();
    match err.downcast_ref::<CoreError>() {
        Some(CoreError::HeadlineNotFound(id)) => assert_eq!(*id, 12345),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn one_mention_and_one_score_per_resolved_ticker() {
    let store = seeded_store().await;
    save_headlines(
        store.as_ref(),
        vec![item("AAPL and TSLA tumble on rate fears", "https://example.test/1")],
    )
    .await
    .unwrap();
    let id = store.unprocessed_headlines(10).await.unwrap()[0];

    let p = processor(Arc::clone(&store) as Arc<dyn Store>);
    let summary = p.process_headline(id).await.unwrap();

    assert_eq!(summary.tickers, vec!["AAPL", "TSLA"]);
    assert_eq!(summary.mentions_created, 2);
    assert!(summary.sentiment < 0.0);
    assert_eq!(summary.urgency, 0.0);

    let mentions = store.mentions_for_headline(id).await.unwrap();
    let scores = store.scores_for_headline(id).await.unwrap();
    assert_eq!(mentions.len(), 2);
    assert_eq!(scores.len(), 2);

    // 1:1 correspondence between mentions and scores per ticker.
    let mention_tickers: HashSet<i64> = mentions.iter().map(|m| m.ticker_id).collect();
    let score_tickers: HashSet<i64> = scores.iter().map(|s| s.ticker_id).collect();
    assert_eq!(mention_tickers, score_tickers);

    for m in &mentions {
        assert_eq!(m.relevance, Some(1.0));
        assert_eq!(m.context.as_deref(), Some("AAPL and TSLA tumble on rate fears"));
    }
    for s in &scores {
        // Sentiment/urgency copied verbatim; composite deferred to read time.
        assert_eq!(s.sentiment, Some(summary.sentiment));
        assert_eq!(s.urgency, Some(summary.urgency));
        assert_eq!(s.volatility, None);
        assert_eq!(s.composite, None);
        assert_eq!(s.model, "lexicon");
    }

    // Processed headlines leave the backlog.
    assert!(store.unprocessed_headlines(10).await.unwrap().is_empty());
}

#[tokio::test]
async fn zero_match_headlines_stay_in_the_backlog() {
    let store = seeded_store().await;
    save_headlines(
        store.as_ref(),
        vec![item("quiet session expected midweek", "https://example.test/2")],
    )
    .await
    .unwrap();

    let p = processor(Arc::clone(&store) as Arc<dyn Store>);
    let processed = p.process_unprocessed(10).await.unwrap();
    assert_eq!(processed, 1);

    // No mentions were created, so the headline is still "unprocessed".
    assert_eq!(store.unprocessed_headlines(10).await.unwrap().len(), 1);
}

/// Sentiment collaborator that is always unavailable.
struct DownSentiment;

#[async_trait]
impl SentimentModel for DownSentiment {
    async fn score(&self, _text: &str) -> Result<f64> {
        Err(anyhow!("model not loaded"))
    }
    fn name(&self) -> &'static str {
        "down"
    }
}

#[tokio::test]
async fn unavailable_sentiment_degrades_to_neutral() {
    let store = seeded_store().await;
    save_headlines(
        store.as_ref(),
        vec![item("AAPL slides", "https://example.test/3")],
    )
    .await
    .unwrap();
    let id = store.unprocessed_headlines(10).await.unwrap()[0];

    let resolver =
        EntityResolver::new(Arc::clone(&store) as Arc<dyn Store>, Duration::from_secs(300));
    let p = Processor::new(
        Arc::clone(&store) as Arc<dyn Store>,
        resolver,
        Box::new(HeuristicDetector::new()),
        Box::new(DownSentiment),
    );

    let summary = p.process_headline(id).await.unwrap();
    assert_eq!(summary.sentiment, 0.0);
    let scores = store.scores_for_headline(id).await.unwrap();
    assert_eq!(scores[0].sentiment, Some(0.0));
    assert_eq!(scores[0].model, "down");
}

/// Store wrapper that fails the mention/score write for one headline.
struct FlakyStore {
    inner: Arc<MemoryStore>,
    poisoned: i64,
}

#[async_trait]
impl Store for FlakyStore {
    async fn insert_ticker(&self, t: NewTicker) -> Result<Ticker> {
        self.inner.insert_ticker(t).await
    }
    async fn list_tickers(&self) -> Result<Vec<Ticker>> {
        self.inner.list_tickers().await
    }
    async fn ticker_by_symbol(&self, symbol: &str) -> Result<Option<Ticker>> {
        self.inner.ticker_by_symbol(symbol).await
    }
    async fn headline(&self, id: i64) -> Result<Option<Headline>> {
        self.inner.headline(id).await
    }
    async fn existing_urls(&self, urls: &[String]) -> Result<HashSet<String>> {
        self.inner.existing_urls(urls).await
    }
    async fn existing_title_hashes(&self, hashes: &[String]) -> Result<HashSet<String>> {
        self.inner.existing_title_hashes(hashes).await
    }
    async fn insert_headlines(&self, rows: Vec<NewHeadline>) -> Result<Vec<Headline>> {
        self.inner.insert_headlines(rows).await
    }
    async fn delete_headline(&self, id: i64) -> Result<bool> {
        self.inner.delete_headline(id).await
    }
    async fn unprocessed_headlines(&self, limit: usize) -> Result<Vec<i64>> {
        self.inner.unprocessed_headlines(limit).await
    }
    async fn record_mentions_and_scores(
        &self,
        headline_id: i64,
        rows: Vec<(NewMention, NewRiskScore)>,
    ) -> Result<()> {
        if headline_id == self.poisoned {
            bail!("simulated write failure");
        }
        self.inner.record_mentions_and_scores(headline_id, rows).await
    }
    async fn mentions_for_headline(&self, headline_id: i64) -> Result<Vec<Mention>> {
        self.inner.mentions_for_headline(headline_id).await
    }
    async fn scores_for_headline(&self, headline_id: i64) -> Result<Vec<RiskScore>> {
        self.inner.scores_for_headline(headline_id).await
    }
    async fn scores_for_ticker(
        &self,
        ticker_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<RiskScore>> {
        self.inner.scores_for_ticker(ticker_id, start, end).await
    }
    async fn insert_score(&self, s: NewRiskScore) -> Result<RiskScore> {
        self.inner.insert_score(s).await
    }
}

#[tokio::test]
async fn one_failing_headline_does_not_abort_the_backlog() {
    let memory = seeded_store().await;
    save_headlines(
        memory.as_ref(),
        vec![
            item("AAPL slides on downgrade", "https://example.test/4"),
            item("TSLA rallies on record deliveries", "https://example.test/5"),
        ],
    )
    .await
    .unwrap();

    // Newest first: poison the headline processed first.
    let backlog = memory.unprocessed_headlines(10).await.unwrap();
    let poisoned = backlog[0];

    let flaky = Arc::new(FlakyStore {
        inner: Arc::clone(&memory),
        poisoned,
    });
    let p = processor(Arc::clone(&flaky) as Arc<dyn Store>);

    let processed = p.process_unprocessed(10).await.unwrap();
    assert_eq!(processed, 1);

    // The failed headline kept all-or-nothing semantics and stays unprocessed.
    assert_eq!(memory.unprocessed_headlines(10).await.unwrap(), vec![poisoned]);
    assert!(memory.mentions_for_headline(poisoned).await.unwrap().is_empty());
}
