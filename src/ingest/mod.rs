// src/ingest/mod.rs
pub mod providers;
pub mod types;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use once_cell::sync::OnceCell;
use sha2::{Digest, Sha256};

use crate::ingest::types::{HeadlineProvider, RawHeadline};
use crate::store::{NewHeadline, Store};
use anyhow::Result;
use chrono::{DateTime, Utc};

/// One-time metrics registration (so series show up for any exporter the caller wires).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("ingest_events_total", "Events parsed from providers.");
        describe_counter!("ingest_inserted_total", "Headlines persisted after dedup.");
        describe_counter!(
            "ingest_dedup_total",
            "Records rejected as URL or title-hash duplicates."
        );
        describe_counter!(
            "ingest_dropped_total",
            "Records dropped for empty/whitespace titles."
        );
        describe_counter!(
            "ingest_provider_errors_total",
            "Provider fetch/parse errors."
        );
        describe_histogram!("ingest_parse_ms", "Provider parse time in milliseconds.");
        describe_gauge!("ingest_last_run_ts", "Unix ts when the ingest sink last ran.");
    });
}

/// Normalize a feed title: decode HTML entities, strip tags, fold smart quotes,
/// collapse whitespace, trim trailing sentence punctuation.
pub fn normalize_title(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    // 3) Normalize “ ” ‘ ’ « » to ASCII quotes
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 4) Collapse whitespace
    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();
    out = out.trim().to_string();

    // 5) Strip trailing sentence punctuation (keep quotes)
    while let Some(last) = out.chars().last() {
        if matches!(last, '!' | '?' | '.' | ',') {
            out.pop();
        } else {
            break;
        }
    }

    out
}

/// SHA-256 hex digest of a title; the content-based dedup key.
pub fn title_hash(title: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(title.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(64);
    for b in digest.iter() {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// Parse feed timestamps: ISO-8601 (with or without `Z`) first, then RFC 2822.
pub fn parse_published_at(value: &str) -> Option<DateTime<Utc>> {
    let v = value.trim();
    if v.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(v) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(v) {
        return Some(dt.with_timezone(&Utc));
    }
    None
}

/// Persist only the records that are new.
///
/// Dedup keys: exact URL, and SHA-256 of the trimmed title, checked against the
/// store and against earlier records in the same batch (accumulating sets, so two
/// near-duplicates in one call do not both land). Empty/whitespace titles are
/// dropped unconditionally. One atomic store insert per batch; returns the
/// number of rows actually inserted.
pub async fn save_headlines(store: &dyn Store, items: Vec<RawHeadline>) -> Result<usize> {
    ensure_metrics_described();
    if items.is_empty() {
        return Ok(0);
    }

    let urls: Vec<String> = items.iter().filter_map(|i| i.url.clone()).collect();
    let mut seen_urls = store.existing_urls(&urls).await?;

    let hashes: Vec<String> = items.iter().map(|i| title_hash(i.title.trim())).collect();
    let mut seen_hashes = store.existing_title_hashes(&hashes).await?;

    let mut fresh: Vec<NewHeadline> = Vec::with_capacity(items.len());
    let mut dropped = 0u64;
    let mut dedup = 0u64;

    for item in items {
        let title = item.title.trim().to_string();
        if title.is_empty() {
            dropped += 1;
            continue;
        }
        let hash = title_hash(&title);

        if let Some(url) = item.url.as_deref() {
            if seen_urls.contains(url) {
                dedup += 1;
                continue;
            }
        }
        if seen_hashes.contains(&hash) {
            dedup += 1;
            continue;
        }

        if let Some(url) = item.url.clone() {
            seen_urls.insert(url);
        }
        seen_hashes.insert(hash);

        fresh.push(NewHeadline {
            source: item.source,
            url: item.url,
            title,
            published_at: item.published_at,
        });
    }

    let inserted = if fresh.is_empty() {
        0
    } else {
        store.insert_headlines(fresh).await?.len()
    };

    counter!("ingest_inserted_total").increment(inserted as u64);
    counter!("ingest_dedup_total").increment(dedup);
    counter!("ingest_dropped_total").increment(dropped);
    gauge!("ingest_last_run_ts").set(Utc::now().timestamp().max(0) as f64);

    Ok(inserted)
}

/// Run ingest once over the given providers and persist whatever is new.
///
/// A failing provider is logged and skipped; one bad feed never blocks the rest.
pub async fn run_once(providers: &[Box<dyn HeadlineProvider>], store: &dyn Store) -> Result<usize> {
    ensure_metrics_described();

    let mut raw = Vec::new();
    for p in providers {
        match p.fetch_latest().await {
            Ok(mut v) => raw.append(&mut v),
            Err(e) => {
                tracing::warn!(error = ?e, provider = p.name(), "provider error");
                counter!("ingest_provider_errors_total").increment(1);
            }
        }
    }

    save_headlines(store, raw).await
}
