// src/ingest/providers/rss.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::{counter, histogram};
use quick_xml::de::from_str;
use serde::Deserialize;

use crate::ingest::types::{HeadlineProvider, RawHeadline};
use crate::ingest::{normalize_title, parse_published_at};

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    title: Option<String>,
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
}

/// RSS 2.0 provider over a document the caller already fetched.
/// Malformed entries (no title or no link) are skipped, not errors.
pub struct RssProvider {
    source: Option<String>,
    rss_content: String,
}

impl RssProvider {
    pub fn from_document(source: Option<&str>, content: &str) -> Self {
        Self {
            source: source.map(str::to_string),
            rss_content: content.to_string(),
        }
    }
}

#[async_trait]
impl HeadlineProvider for RssProvider {
    async fn fetch_latest(&self) -> Result<Vec<RawHeadline>> {
        let t0 = std::time::Instant::now();

        let rss: Rss = from_str(&self.rss_content).context("parsing rss xml")?;
        let feed_title = self.source.clone().or(rss.channel.title);

        let mut out = Vec::with_capacity(rss.channel.item.len());
        for it in rss.channel.item {
            let title = normalize_title(it.title.as_deref().unwrap_or_default());
            if title.is_empty() || it.link.is_none() {
                continue;
            }
            out.push(RawHeadline {
                title,
                published_at: it.pub_date.as_deref().and_then(parse_published_at),
                source: feed_title.clone(),
                url: it.link,
            });
        }

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("ingest_parse_ms").record(ms);
        counter!("ingest_events_total").increment(out.len() as u64);

        Ok(out)
    }

    fn name(&self) -> &'static str {
        "rss"
    }
}
