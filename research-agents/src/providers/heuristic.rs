//! Deterministic keyword heuristic, the floor of the fallback chain
//!
//! Pure computation over strings. `judge` has no error path, so the chain can
//! always produce a verdict.

use crate::lexicon;
use crate::provider::{ProviderConfig, ProviderJudgment, ProviderTier, SentimentProvider};
use async_trait::async_trait;
use common::{FusionError, SentimentLabel};

/// Confidence given to a verdict with no keyword evidence at all
const BASE_CONFIDENCE: f64 = 0.3;
/// Extra confidence available from strong, well-covered evidence
const EVIDENCE_CONFIDENCE: f64 = 0.3;
/// Hits needed for full coverage
const FULL_COVERAGE_HITS: f64 = 6.0;

pub struct KeywordHeuristicProvider {
    config: ProviderConfig,
    label_threshold: f64,
}

impl KeywordHeuristicProvider {
    pub fn new(label_threshold: f64) -> Self {
        Self {
            config: ProviderConfig {
                provider_id: "keyword-heuristic".to_string(),
                name: "Keyword Heuristic".to_string(),
                enabled: true,
                max_batch_size: usize::MAX,
            },
            label_threshold,
        }
    }

    /// Score a text from lexicon hits
    pub fn judge(&self, text: &str) -> ProviderJudgment {
        let tally = lexicon::tally(text);
        let score = tally.net_score();
        let coverage = (tally.total_hits() as f64 / FULL_COVERAGE_HITS).min(1.0);
        let confidence = BASE_CONFIDENCE + EVIDENCE_CONFIDENCE * score.abs() * coverage;
        let label = SentimentLabel::from_score(score, self.label_threshold);

        ProviderJudgment {
            label,
            confidence,
            score: Some(score),
            reasoning: format!(
                "Keyword heuristic: {} bullish / {} bearish hits, net score {:.2}",
                tally.bullish_hits, tally.bearish_hits, score
            ),
        }
    }
}

impl Default for KeywordHeuristicProvider {
    fn default() -> Self {
        Self::new(0.1)
    }
}

#[async_trait]
impl SentimentProvider for KeywordHeuristicProvider {
    fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn tier(&self) -> ProviderTier {
        ProviderTier::KeywordHeuristic
    }

    fn model_id(&self) -> String {
        "keyword-lexicon-v1".to_string()
    }

    fn is_configured(&self) -> bool {
        true
    }

    async fn invoke(&self, text: &str) -> Result<ProviderJudgment, FusionError> {
        Ok(self.judge(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bullish_text() {
        let provider = KeywordHeuristicProvider::default();
        let judgment = provider.judge("Stock soars to record high after earnings beat");
        assert_eq!(judgment.label, SentimentLabel::Bullish);
        assert!(judgment.confidence > BASE_CONFIDENCE);
        assert!(judgment.confidence <= BASE_CONFIDENCE + EVIDENCE_CONFIDENCE);
    }

    #[test]
    fn test_empty_text_is_neutral_with_positive_confidence() {
        let provider = KeywordHeuristicProvider::default();
        let judgment = provider.judge("");
        assert_eq!(judgment.label, SentimentLabel::Neutral);
        assert_eq!(judgment.confidence, BASE_CONFIDENCE);
    }

    #[test]
    fn test_mixed_text_balances() {
        let provider = KeywordHeuristicProvider::default();
        let judgment = provider.judge("gains offset by losses");
        assert_eq!(judgment.label, SentimentLabel::Neutral);
        assert_eq!(judgment.score, Some(0.0));
    }
}
