//! News ranking
//!
//! Derives `RankedNewsItem`s once per analysis run. Relevance blends symbol
//! mentions, source credibility and recency; sentiment weight grows with the
//! density of lexicon hits.

use crate::lexicon;
use chrono::{DateTime, Utc};
use common::{NewsItem, RankedNewsItem};
use std::cmp::Ordering;

const TITLE_MENTION: f64 = 0.5;
const SUMMARY_MENTION: f64 = 0.3;
const NO_MENTION: f64 = 0.1;
const RECENCY_WEIGHT: f64 = 0.2;
const RECENCY_HALF_DAY_HOURS: f64 = 24.0;

const TIER_ONE_SOURCES: &[&str] = &[
    "reuters",
    "bloomberg",
    "wall street journal",
    "wsj",
    "financial times",
    "cnbc",
    "marketwatch",
    "associated press",
    "barron's",
];

fn mentions_symbol(text: &str, symbol: &str) -> bool {
    let symbol = symbol.trim().trim_start_matches('$').to_lowercase();
    if symbol.is_empty() {
        return false;
    }
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '.'))
        .map(|token| token.trim_matches('.'))
        .any(|token| token == symbol)
}

fn source_credibility(source: &str) -> f64 {
    let source = source.to_lowercase();
    if TIER_ONE_SOURCES.iter().any(|s| source.contains(s)) {
        0.2
    } else if source.trim().is_empty() {
        0.0
    } else {
        0.1
    }
}

/// Relevance of an item to `symbol`, in [0, 1]
pub fn relevance_score(item: &NewsItem, symbol: &str, as_of: DateTime<Utc>) -> f64 {
    let mention = if mentions_symbol(&item.title, symbol) {
        TITLE_MENTION
    } else if mentions_symbol(&item.summary, symbol) {
        SUMMARY_MENTION
    } else {
        NO_MENTION
    };
    let recency = RECENCY_WEIGHT * (-item.age_hours(as_of) / RECENCY_HALF_DAY_HOURS).exp();

    (mention + source_credibility(&item.source) + recency).clamp(0.0, 1.0)
}

/// How much sentiment-bearing language the item carries, in [0.1, 1)
pub fn sentiment_weight(item: &NewsItem) -> f64 {
    let hits = lexicon::tally(&item.text()).total_hits() as f64;
    0.1 + 0.9 * hits / (hits + 2.0)
}

/// Rank news by relevance x sentiment weight, descending
///
/// Ties break on recency, then on the original position.
pub fn rank_news(symbol: &str, news: &[NewsItem], as_of: DateTime<Utc>) -> Vec<RankedNewsItem> {
    let mut ranked: Vec<(usize, RankedNewsItem)> = news
        .iter()
        .enumerate()
        .map(|(index, item)| {
            (
                index,
                RankedNewsItem {
                    item: item.clone(),
                    relevance_score: relevance_score(item, symbol, as_of),
                    sentiment_weight: sentiment_weight(item),
                    processing_order: 0,
                },
            )
        })
        .collect();

    ranked.sort_by(|(ia, a), (ib, b)| {
        b.priority()
            .partial_cmp(&a.priority())
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.item.published_at.cmp(&a.item.published_at))
            .then_with(|| ia.cmp(ib))
    });

    ranked
        .into_iter()
        .enumerate()
        .map(|(order, (_, mut item))| {
            item.processing_order = order;
            item
        })
        .collect()
}
