//! Weighted financial keyword lexicon
//!
//! Shared by the keyword heuristic provider, the news ranker and the article layer.
//! Matching is case-insensitive and on word boundaries, so "miss" never fires on
//! "mission".

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Weighted sum at which an article's impact saturates at +/-1
pub const IMPACT_SATURATION: f64 = 2.0;

const SENTIMENT_TERMS: &[(&str, f64)] = &[
    // Strong positive
    ("skyrocket", 0.9),
    ("skyrockets", 0.9),
    ("surge", 0.8),
    ("surges", 0.8),
    ("soar", 0.8),
    ("soars", 0.8),
    ("record high", 0.8),
    ("raises guidance", 0.8),
    ("upgrade", 0.7),
    ("upgraded", 0.7),
    ("breakthrough", 0.7),
    ("bullish", 0.7),
    // Moderate positive
    ("beat", 0.6),
    ("beats", 0.6),
    ("outperform", 0.6),
    ("rally", 0.6),
    ("rallies", 0.6),
    ("approval", 0.5),
    ("approved", 0.5),
    ("gain", 0.4),
    ("gains", 0.4),
    ("rise", 0.4),
    ("rises", 0.4),
    ("growth", 0.4),
    ("profit", 0.4),
    ("partnership", 0.4),
    ("recovery", 0.4),
    ("strong", 0.3),
    ("buy", 0.3),
    ("expansion", 0.3),
    ("dividend", 0.3),
    // Strong negative
    ("bankruptcy", -1.0),
    ("crash", -0.9),
    ("crashes", -0.9),
    ("fraud", -0.9),
    ("plunge", -0.8),
    ("plunges", -0.8),
    ("cuts guidance", -0.8),
    ("downgrade", -0.7),
    ("downgraded", -0.7),
    ("tumble", -0.7),
    ("tumbles", -0.7),
    ("bearish", -0.7),
    // Moderate negative
    ("miss", -0.6),
    ("misses", -0.6),
    ("underperform", -0.6),
    ("investigation", -0.6),
    ("slump", -0.6),
    ("selloff", -0.6),
    ("sell-off", -0.6),
    ("lawsuit", -0.5),
    ("recall", -0.5),
    ("layoffs", -0.5),
    ("loss", -0.4),
    ("losses", -0.4),
    ("fall", -0.4),
    ("falls", -0.4),
    ("decline", -0.4),
    ("declines", -0.4),
    ("warning", -0.4),
    ("weak", -0.3),
    ("sell", -0.3),
];

const URGENCY_TERMS: &[&str] = &[
    "breaking",
    "halt",
    "halted",
    "plunge",
    "plunges",
    "crash",
    "bankruptcy",
    "fraud",
    "investigation",
    "recall",
    "urgent",
    "alert",
    "emergency",
    "default",
];

/// Topic an article is mainly about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopicCategory {
    Earnings,
    Regulatory,
    Macro,
    Product,
    Corporate,
    Analyst,
    General,
}

const TOPIC_TERMS: &[(TopicCategory, &[&str])] = &[
    (
        TopicCategory::Earnings,
        &["earnings", "revenue", "eps", "quarter", "quarterly", "guidance", "profit"],
    ),
    (
        TopicCategory::Regulatory,
        &["sec", "regulator", "regulatory", "fda", "antitrust", "lawsuit", "investigation", "fine"],
    ),
    (
        TopicCategory::Macro,
        &["fed", "inflation", "interest rate", "rates", "gdp", "recession", "tariff", "economy"],
    ),
    (
        TopicCategory::Product,
        &["launch", "launches", "product", "release", "unveil", "unveils", "recall"],
    ),
    (
        TopicCategory::Corporate,
        &["merger", "acquisition", "acquire", "acquires", "buyback", "ceo", "partnership", "deal"],
    ),
    (
        TopicCategory::Analyst,
        &["analyst", "analysts", "upgrade", "downgrade", "price target", "rating"],
    ),
];

fn build_pattern<'a>(terms: impl Iterator<Item = &'a str>) -> Regex {
    let mut terms: Vec<&str> = terms.collect();
    // Longest first so phrases win over their own words
    terms.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
    let alternation = terms
        .iter()
        .map(|t| regex::escape(t))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{})\b", alternation)).expect("lexicon pattern is valid")
}

lazy_static! {
    static ref TERM_WEIGHTS: HashMap<&'static str, f64> = SENTIMENT_TERMS.iter().copied().collect();
    static ref SENTIMENT_PATTERN: Regex = build_pattern(SENTIMENT_TERMS.iter().map(|(t, _)| *t));
    static ref URGENCY_PATTERN: Regex = build_pattern(URGENCY_TERMS.iter().copied());
    static ref TOPIC_PATTERNS: Vec<(TopicCategory, Regex)> = TOPIC_TERMS
        .iter()
        .map(|(topic, terms)| (*topic, build_pattern(terms.iter().copied())))
        .collect();
}

/// Keyword hits found in one text
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeywordTally {
    pub bullish_hits: usize,
    pub bearish_hits: usize,
    pub weighted_sum: f64,
    pub absolute_sum: f64,
}

impl KeywordTally {
    pub fn total_hits(&self) -> usize {
        self.bullish_hits + self.bearish_hits
    }

    /// Net direction in [-1, 1]: weighted sum over total absolute weight
    pub fn net_score(&self) -> f64 {
        if self.absolute_sum > 0.0 {
            (self.weighted_sum / self.absolute_sum).clamp(-1.0, 1.0)
        } else {
            0.0
        }
    }

    /// Bounded impact in [-1, 1]
    pub fn impact(&self) -> f64 {
        (self.weighted_sum / IMPACT_SATURATION).clamp(-1.0, 1.0)
    }
}

/// Count weighted sentiment keywords in a text
pub fn tally(text: &str) -> KeywordTally {
    let mut tally = KeywordTally::default();

    for found in SENTIMENT_PATTERN.find_iter(text) {
        let term = found.as_str().to_lowercase();
        let Some(weight) = TERM_WEIGHTS.get(term.as_str()) else {
            continue;
        };
        if *weight > 0.0 {
            tally.bullish_hits += 1;
        } else {
            tally.bearish_hits += 1;
        }
        tally.weighted_sum += weight;
        tally.absolute_sum += weight.abs();
    }

    tally
}

/// Whether the text carries an urgency marker
pub fn is_urgent(text: &str) -> bool {
    URGENCY_PATTERN.is_match(text)
}

/// Topic with the most keyword hits; ties resolve in declaration order
pub fn topic_category(text: &str) -> TopicCategory {
    let mut best = (TopicCategory::General, 0usize);
    for (topic, pattern) in TOPIC_PATTERNS.iter() {
        let hits = pattern.find_iter(text).count();
        if hits > best.1 {
            best = (*topic, hits);
        }
    }
    best.0
}
