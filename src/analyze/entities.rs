// src/analyze/entities.rs
//! Entity candidate extraction from headline text.
//!
//! Candidates are free-text strings; the resolver decides which of them name a
//! known ticker. Ordering follows first appearance in the text, no duplicates.

use once_cell::sync::OnceCell;
use regex::Regex;

pub trait EntityDetector: Send + Sync {
    /// Ordered candidate strings, possibly empty, no duplicates.
    fn detect_entities(&self, text: &str) -> Vec<String>;
}

/// Heuristic detector: cashtags (`$AAPL`), uppercase 1–5 letter tokens, and
/// capitalized multi-word runs ("Apple Inc").
#[derive(Debug, Clone, Default)]
pub struct HeuristicDetector;

impl HeuristicDetector {
    pub fn new() -> Self {
        Self
    }
}

fn re_cashtag() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"(?i)\$(?P<sym>[a-z]{1,5})\b").expect("cashtag regex"))
}

fn re_upper_token() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"\b[A-Z]{1,5}\b").expect("upper token regex"))
}

fn re_name_run() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"\b[A-Z][a-z]+(?:\s+[A-Z][a-z]+)+\b").expect("name run regex"))
}

impl EntityDetector for HeuristicDetector {
    fn detect_entities(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        // Collect (position, candidate) across all patterns, then order by
        // first appearance and drop repeats.
        let mut found: Vec<(usize, String)> = Vec::new();

        for caps in re_cashtag().captures_iter(text) {
            let m = caps.name("sym").expect("cashtag capture");
            found.push((m.start(), m.as_str().to_ascii_uppercase()));
        }
        for m in re_name_run().find_iter(text) {
            found.push((m.start(), m.as_str().to_string()));
        }
        for m in re_upper_token().find_iter(text) {
            // Skip tokens that are the symbol part of a cashtag.
            if m.start() > 0 && text.as_bytes()[m.start() - 1] == b'$' {
                continue;
            }
            found.push((m.start(), m.as_str().to_string()));
        }

        found.sort_by_key(|(pos, _)| *pos);

        let mut out: Vec<String> = Vec::with_capacity(found.len());
        for (_, cand) in found {
            if !out.iter().any(|c| c.eq_ignore_ascii_case(&cand)) {
                out.push(cand);
            }
        }
        out
    }
}
