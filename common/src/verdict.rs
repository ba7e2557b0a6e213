use crate::direction::SentimentLabel;
use serde::{Deserialize, Serialize};

/// Which tier of the fallback chain produced a verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionMethod {
    NoData,
    GenerativeModel,
    Classifier,
    RuleBasedFinal,
    ErrorFallback,
}

impl ResolutionMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            ResolutionMethod::NoData => "no_data",
            ResolutionMethod::GenerativeModel => "generative_model",
            ResolutionMethod::Classifier => "classifier",
            ResolutionMethod::RuleBasedFinal => "rule_based_final",
            ResolutionMethod::ErrorFallback => "error_fallback",
        }
    }
}

/// Sentiment judgment for one symbol, produced by exactly one provider tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentVerdict {
    pub label: SentimentLabel,
    pub confidence: f64,    // 0.0 to 1.0
    pub score: Option<f64>, // -1.0 to 1.0
    pub model_id: String,
    pub source_count: usize,
    pub reasoning: String,
    pub method: ResolutionMethod,
    pub fallback_used: bool,
}

impl SentimentVerdict {
    /// Degenerate verdict for an empty news list
    pub fn no_data() -> Self {
        Self {
            label: SentimentLabel::Neutral,
            confidence: 0.0,
            score: None,
            model_id: "none".to_string(),
            source_count: 0,
            reasoning: "no data".to_string(),
            method: ResolutionMethod::NoData,
            fallback_used: false,
        }
    }

    /// Floor verdict when resolution itself broke down
    pub fn error_fallback(message: impl Into<String>) -> Self {
        Self {
            reasoning: message.into(),
            method: ResolutionMethod::ErrorFallback,
            fallback_used: true,
            ..Self::no_data()
        }
    }

    /// True when the verdict carries no usable sentiment evidence.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self.method,
            ResolutionMethod::NoData | ResolutionMethod::ErrorFallback
        )
    }
}
