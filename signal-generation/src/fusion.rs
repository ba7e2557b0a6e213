// Signal Fusion Engine
// Combines a technical price-direction estimate with a sentiment verdict

use common::{cap_confidence, sanitize_confidence, Direction, FusionError, FusionResult, SentimentVerdict, TechnicalPrediction};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

/// Confidence multiplier when only one side contributes
pub const SINGLE_SOURCE_PENALTY: f64 = 0.85;

const WEIGHT_TOLERANCE: f64 = 1e-9;

/// Relative weights of the technical and sentiment sides
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FusionWeights {
    pub technical: f64,
    pub sentiment: f64,
}

impl FusionWeights {
    /// Technical in [0.6, 0.7], sentiment in [0.3, 0.4], summing to 1
    pub fn new(technical: f64, sentiment: f64) -> FusionResult<Self> {
        let weights = Self { technical, sentiment };
        weights.validate()?;
        Ok(weights)
    }

    pub fn validate(&self) -> FusionResult<()> {
        let in_range = (0.6 - WEIGHT_TOLERANCE..=0.7 + WEIGHT_TOLERANCE).contains(&self.technical)
            && (0.3 - WEIGHT_TOLERANCE..=0.4 + WEIGHT_TOLERANCE).contains(&self.sentiment);
        let sums_to_one = (self.technical + self.sentiment - 1.0).abs() <= WEIGHT_TOLERANCE;

        if in_range && sums_to_one {
            Ok(())
        } else {
            Err(FusionError::InvalidWeights {
                technical: self.technical,
                sentiment: self.sentiment,
            })
        }
    }
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self {
            technical: 0.65,
            sentiment: 0.35,
        }
    }
}

/// Graded trade action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradeAction {
    #[serde(rename = "BUY STRONG")]
    BuyStrong,
    #[serde(rename = "BUY WEAK")]
    BuyWeak,
    #[serde(rename = "HOLD NEUTRAL")]
    HoldNeutral,
    #[serde(rename = "SELL WEAK")]
    SellWeak,
    #[serde(rename = "SELL STRONG")]
    SellStrong,
}

impl TradeAction {
    pub fn as_str(self) -> &'static str {
        match self {
            TradeAction::BuyStrong => "BUY STRONG",
            TradeAction::BuyWeak => "BUY WEAK",
            TradeAction::HoldNeutral => "HOLD NEUTRAL",
            TradeAction::SellWeak => "SELL WEAK",
            TradeAction::SellStrong => "SELL STRONG",
        }
    }
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a fused signal was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FusionMethod {
    WeightedFusion,
    TechnicalOnly,
    SentimentOnly,
    ErrorFallback,
}

/// Both fusion inputs, kept verbatim for audit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalComponents {
    pub sentiment: SentimentVerdict,
    pub technical: Option<TechnicalPrediction>,
}

/// Final fused trading signal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedSignal {
    pub symbol: String,
    pub action: TradeAction,
    pub direction: Direction,
    pub combined_score: f64,
    pub confidence: f64, // 0.0 to 0.95
    pub reasoning: String,
    pub method: FusionMethod,
    pub fallback_mode: bool,
    pub components: SignalComponents,
}

/// Graded action from a combined score. Boundaries are exclusive.
pub fn classify_action(combined_score: f64) -> TradeAction {
    if combined_score > 0.5 {
        TradeAction::BuyStrong
    } else if combined_score > 0.2 {
        TradeAction::BuyWeak
    } else if combined_score < -0.5 {
        TradeAction::SellStrong
    } else if combined_score < -0.2 {
        TradeAction::SellWeak
    } else {
        TradeAction::HoldNeutral
    }
}

fn describe_technical(technical: Option<&TechnicalPrediction>) -> String {
    match technical {
        Some(t) => format!("Technical: {} ({:.2})", t.direction, sanitize_confidence(t.confidence)),
        None => "Technical: unavailable".to_string(),
    }
}

fn describe_sentiment(sentiment: &SentimentVerdict) -> String {
    if sentiment.is_unavailable() {
        format!("Sentiment: unavailable ({})", sentiment.method.as_str())
    } else {
        format!(
            "Sentiment: {} ({:.2}, {})",
            sentiment.label,
            sentiment.confidence,
            sentiment.method.as_str()
        )
    }
}

/// Fuse a technical prediction and a sentiment verdict into one signal.
///
/// Never fails: a missing side switches to single-source mode with a confidence
/// penalty, and two missing sides produce a zero-confidence HOLD. No ids or
/// timestamps are attached, so identical inputs produce identical output.
pub fn fuse(
    symbol: &str,
    technical: Option<&TechnicalPrediction>,
    sentiment: &SentimentVerdict,
    weights: &FusionWeights,
) -> FusedSignal {
    let sentiment_available = !sentiment.is_unavailable();

    let (combined_score, raw_confidence, method) = match (technical, sentiment_available) {
        (Some(t), true) => (
            t.direction.direction_score() * weights.technical
                + sentiment.label.direction_score() * weights.sentiment,
            sanitize_confidence(t.confidence) * weights.technical
                + sanitize_confidence(sentiment.confidence) * weights.sentiment,
            FusionMethod::WeightedFusion,
        ),
        (Some(t), false) => (
            t.direction.direction_score(),
            sanitize_confidence(t.confidence) * SINGLE_SOURCE_PENALTY,
            FusionMethod::TechnicalOnly,
        ),
        (None, true) => (
            sentiment.label.direction_score(),
            sanitize_confidence(sentiment.confidence) * SINGLE_SOURCE_PENALTY,
            FusionMethod::SentimentOnly,
        ),
        (None, false) => (0.0, 0.0, FusionMethod::ErrorFallback),
    };

    let action = classify_action(combined_score);
    let direction = Direction::from_score(combined_score);
    let confidence = cap_confidence(raw_confidence);
    let fallback_mode = method != FusionMethod::WeightedFusion;

    let reasoning = format!(
        "{}; {}; combined {:+.2} -> {}",
        describe_technical(technical),
        describe_sentiment(sentiment),
        combined_score,
        action
    );

    debug!(symbol, combined_score, ?method, "Fusion inputs combined");
    info!(symbol, action = %action, confidence, fallback_mode, "Signal fused");

    FusedSignal {
        symbol: symbol.to_string(),
        action,
        direction,
        combined_score,
        confidence,
        reasoning,
        method,
        fallback_mode,
        components: SignalComponents {
            sentiment: sentiment.clone(),
            technical: technical.cloned(),
        },
    }
}
