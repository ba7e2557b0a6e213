//! Sentiment labels and price directions
//!
//! All free-form label strings coming from models, classifiers and predictors are
//! normalised through [`SentimentLabel::parse`] / [`Direction::parse`] so the lexicon
//! lives in exactly one place.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Directional sentiment of a piece of evidence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Bullish,
    Bearish,
    Neutral,
}

impl SentimentLabel {
    /// Normalise a raw label. Unknown labels map to `Neutral`.
    ///
    /// `flat`, `hold` and `sideways` are treated as `Neutral`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "bullish" | "bull" | "positive" | "pos" | "up" | "buy" | "long" | "strong_buy"
            | "strong buy" => SentimentLabel::Bullish,
            "bearish" | "bear" | "negative" | "neg" | "down" | "sell" | "short" | "strong_sell"
            | "strong sell" => SentimentLabel::Bearish,
            _ => SentimentLabel::Neutral,
        }
    }

    /// Label for a signed score using a symmetric dead band.
    pub fn from_score(score: f64, threshold: f64) -> Self {
        if score > threshold {
            SentimentLabel::Bullish
        } else if score < -threshold {
            SentimentLabel::Bearish
        } else {
            SentimentLabel::Neutral
        }
    }

    /// Sign of the label: +1, -1 or 0.
    pub fn sign(self) -> f64 {
        match self {
            SentimentLabel::Bullish => 1.0,
            SentimentLabel::Bearish => -1.0,
            SentimentLabel::Neutral => 0.0,
        }
    }

    /// Fixed direction score used by the fusion engine.
    pub fn direction_score(self) -> f64 {
        self.sign() * 0.8
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SentimentLabel::Bullish => "bullish",
            SentimentLabel::Bearish => "bearish",
            SentimentLabel::Neutral => "neutral",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Direction> for SentimentLabel {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Up => SentimentLabel::Bullish,
            Direction::Down => SentimentLabel::Bearish,
            Direction::Neutral => SentimentLabel::Neutral,
        }
    }
}

/// Price direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Up,
    Down,
    Neutral,
}

impl Direction {
    /// Normalise a raw direction string through the shared lexicon.
    pub fn parse(raw: &str) -> Self {
        SentimentLabel::parse(raw).into()
    }

    /// Plain direction for a combined score: >0.1 up, <-0.1 down.
    pub fn from_score(score: f64) -> Self {
        SentimentLabel::from_score(score, 0.1).into()
    }

    pub fn direction_score(self) -> f64 {
        SentimentLabel::from(self).direction_score()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Up => "UP",
            Direction::Down => "DOWN",
            Direction::Neutral => "NEUTRAL",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<SentimentLabel> for Direction {
    fn from(label: SentimentLabel) -> Self {
        match label {
            SentimentLabel::Bullish => Direction::Up,
            SentimentLabel::Bearish => Direction::Down,
            SentimentLabel::Neutral => Direction::Neutral,
        }
    }
}
