// tests/e2e_smoke.rs
//! Whole-pipeline smoke: ingest -> process -> read scores -> composite at read time.

use std::sync::Arc;
use std::time::Duration;

use news_risk_analyzer::analyze::{estimate_volatility, HeuristicDetector, LexiconSentiment};
use news_risk_analyzer::ingest::{run_once, types::HeadlineProvider};
use news_risk_analyzer::ingest::providers::rss::RssProvider;
use news_risk_analyzer::resolver::EntityResolver;
use news_risk_analyzer::scoring::compute_risk_score;
use news_risk_analyzer::store::{MemoryStore, NewTicker, Store};
use news_risk_analyzer::Processor;

const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Example Markets</title>
    <item>
      <title>BREAKING: AAPL plunges after profit warning</title>
      <link>https://example.test/aapl-warning</link>
      <pubDate>Thu, 02 Oct 2025 12:00:00 GMT</pubDate>
    </item>
    <item>
      <title>BREAKING: AAPL plunges after profit warning</title>
      <link>https://example.test/aapl-warning-dupe</link>
    </item>
  </channel>
</rss>
"#;

#[tokio::test]
async fn ingest_process_and_score_end_to_end() {
    let store = Arc::new(MemoryStore::new());
    store
        .insert_ticker(NewTicker {
            symbol: "AAPL".into(),
            name: Some("Apple Inc.".into()),
            sector: Some("Technology".into()),
        })
        .await
        .unwrap();

    // Ingest: the near-duplicate item is dropped inside the batch.
    let providers: Vec<Box<dyn HeadlineProvider>> =
        vec![Box::new(RssProvider::from_document(None, FEED))];
    let inserted = run_once(&providers, store.as_ref()).await.unwrap();
    assert_eq!(inserted, 1);

    // Process the backlog.
    let resolver =
        EntityResolver::new(Arc::clone(&store) as Arc<dyn Store>, Duration::from_secs(300));
    let processor = Processor::new(
        Arc::clone(&store) as Arc<dyn Store>,
        resolver,
        Box::new(HeuristicDetector::new()),
        Box::new(LexiconSentiment::new()),
    );
    assert_eq!(processor.process_unprocessed(10).await.unwrap(), 1);
    assert!(store.unprocessed_headlines(10).await.unwrap().is_empty());

    // One stored score for AAPL, sentiment negative, urgency positive.
    let headline_id = {
        let all = store.list_tickers().await.unwrap();
        let aapl = all.iter().find(|t| t.symbol == "AAPL").unwrap();
        let start = chrono::Utc::now() - chrono::Duration::hours(1);
        let end = chrono::Utc::now() + chrono::Duration::hours(1);
        let scores = store.scores_for_ticker(aapl.id, start, end).await.unwrap();
        assert_eq!(scores.len(), 1);
        let score = &scores[0];
        assert!(score.sentiment.unwrap() < 0.0);
        assert!(score.urgency.unwrap() > 0.0);
        assert_eq!(score.composite, None);

        // Composite is computed at read time from the stored components.
        let volatility = estimate_volatility(score.sentiment.unwrap(), score.urgency.unwrap());
        let breakdown =
            compute_risk_score(score.sentiment, score.urgency, Some(volatility), None);
        assert!(breakdown.composite > 50.0);
        assert!(breakdown.composite <= 100.0);

        score.headline_id.unwrap()
    };

    // Mentions and scores stay 1:1 for the processed headline.
    let mentions = store.mentions_for_headline(headline_id).await.unwrap();
    let scores = store.scores_for_headline(headline_id).await.unwrap();
    assert_eq!(mentions.len(), scores.len());
}
