// Agreement Scorer
// Measures consensus among sentiment layers and the technical direction

use common::{Direction, FusionError, FusionResult};
use research_agents::SentimentLayer;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgreementStatus {
    HighConsensus,
    MediumConsensus,
    LowConsensus,
    NoConsensus,
    InsufficientLayers,
    Error,
}

impl AgreementStatus {
    /// Bucket a consensus ratio, highest bucket first
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio >= 0.8 {
            AgreementStatus::HighConsensus
        } else if ratio >= 0.6 {
            AgreementStatus::MediumConsensus
        } else if ratio >= 0.4 {
            AgreementStatus::LowConsensus
        } else {
            AgreementStatus::NoConsensus
        }
    }

    pub fn score(self) -> f64 {
        match self {
            AgreementStatus::HighConsensus => 0.9,
            AgreementStatus::MediumConsensus => 0.7,
            AgreementStatus::LowConsensus => 0.5,
            AgreementStatus::NoConsensus => 0.2,
            AgreementStatus::InsufficientLayers | AgreementStatus::Error => 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgreementResult {
    pub status: AgreementStatus,
    pub score: f64,
    pub layer_consistency: f64,
    pub agreements: usize,
    pub comparisons: usize,
}

impl AgreementResult {
    fn short_circuit(status: AgreementStatus) -> Self {
        Self {
            status,
            score: status.score(),
            layer_consistency: 0.0,
            agreements: 0,
            comparisons: 0,
        }
    }
}

fn count_agreements(directions: &[Direction], technical: Option<Direction>) -> FusionResult<(usize, usize)> {
    let mut agreements = 0;
    let mut comparisons = 0;

    for (i, a) in directions.iter().enumerate() {
        for b in &directions[i + 1..] {
            comparisons += 1;
            if a == b {
                agreements += 1;
            }
        }
    }

    if let Some(technical) = technical {
        for direction in directions {
            comparisons += 1;
            if *direction == technical {
                agreements += 1;
            }
        }
    }

    if comparisons == 0 {
        return Err(FusionError::Computation("no comparisons formed".to_string()));
    }
    Ok((agreements, comparisons))
}

/// Pairwise agreement of evidence-carrying layers with each other and with the technical view.
///
/// Fewer than two such layers short-circuit to `InsufficientLayers`; any internal
/// failure is reported as `Error` with a neutral score.
pub fn score_agreement(layers: &[SentimentLayer], technical_direction: Option<Direction>) -> AgreementResult {
    let directions: Vec<Direction> = layers
        .iter()
        .filter(|l| l.has_evidence())
        .map(|l| Direction::from(l.sentiment))
        .collect();

    if directions.len() < 2 {
        debug!(usable = directions.len(), "Not enough layers for agreement");
        return AgreementResult::short_circuit(AgreementStatus::InsufficientLayers);
    }

    match count_agreements(&directions, technical_direction) {
        Ok((agreements, comparisons)) => {
            let layer_consistency = agreements as f64 / comparisons as f64;
            let status = AgreementStatus::from_ratio(layer_consistency);
            AgreementResult {
                status,
                score: status.score(),
                layer_consistency,
                agreements,
                comparisons,
            }
        }
        Err(e) => {
            warn!(error = %e, "Agreement scoring failed");
            AgreementResult::short_circuit(AgreementStatus::Error)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::SentimentLabel;
    use research_agents::LayerType;

    fn layers(labels: &[SentimentLabel]) -> Vec<SentimentLayer> {
        let types = [LayerType::Primary, LayerType::Article, LayerType::Temporal];
        labels
            .iter()
            .zip(types)
            .map(|(label, layer_type)| SentimentLayer::new(layer_type, *label, 0.6))
            .collect()
    }

    #[test]
    fn test_scenario_a_counts() {
        use SentimentLabel::*;
        let result = score_agreement(&layers(&[Bullish, Bullish, Neutral]), Some(Direction::Up));

        assert_eq!(result.comparisons, 6);
        assert_eq!(result.agreements, 3);
        assert!((result.layer_consistency - 0.5).abs() < 1e-9);
        assert_eq!(result.status, AgreementStatus::LowConsensus);
        assert_eq!(result.score, 0.5);
    }

    #[test]
    fn test_full_consensus() {
        use SentimentLabel::*;
        let result = score_agreement(&layers(&[Bearish, Bearish, Bearish]), Some(Direction::Down));
        assert_eq!(result.status, AgreementStatus::HighConsensus);
        assert_eq!(result.score, 0.9);
        assert_eq!(result.layer_consistency, 1.0);
    }

    #[test]
    fn test_without_technical_only_layer_pairs() {
        use SentimentLabel::*;
        let result = score_agreement(&layers(&[Bullish, Bearish, Neutral]), None);
        assert_eq!(result.comparisons, 3);
        assert_eq!(result.agreements, 0);
        assert_eq!(result.status, AgreementStatus::NoConsensus);
        assert_eq!(result.score, 0.2);
    }

    #[test]
    fn test_insufficient_layers() {
        let error = FusionError::Computation("boom".to_string());
        let mut sequence = layers(&[SentimentLabel::Bullish]);
        sequence.push(SentimentLayer::degraded(LayerType::Article, &error));
        sequence.push(SentimentLayer::degraded(LayerType::Temporal, &error));

        let result = score_agreement(&sequence, Some(Direction::Up));
        assert_eq!(result.status, AgreementStatus::InsufficientLayers);
        assert_eq!(result.score, 0.5);
        assert_eq!(result.comparisons, 0);
    }

    #[test]
    fn test_score_always_in_bounds() {
        use SentimentLabel::*;
        let labels = [Bullish, Bearish, Neutral];
        let technicals = [Some(Direction::Up), Some(Direction::Down), Some(Direction::Neutral), None];
        for a in labels {
            for b in labels {
                for c in labels {
                    for technical in technicals {
                        let result = score_agreement(&layers(&[a, b, c]), technical);
                        assert!((0.0..=1.0).contains(&result.score));
                        assert!((0.0..=1.0).contains(&result.layer_consistency));
                        assert_eq!(result.status, AgreementStatus::from_ratio(result.layer_consistency));
                    }
                }
            }
        }
    }

    #[test]
    fn test_status_serializes_upper() {
        let json = serde_json::to_string(&AgreementStatus::InsufficientLayers).unwrap();
        assert_eq!(json, "\"INSUFFICIENT_LAYERS\"");
    }
}
