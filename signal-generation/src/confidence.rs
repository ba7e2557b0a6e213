// Confidence Composer
// Turns a layer sequence into one capped confidence figure

use common::{SentimentLabel, CONFIDENCE_CEILING};
use research_agents::SentimentLayer;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How many distinct labels the usable layers carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsistencyLevel {
    High,
    Medium,
    Low,
}

impl ConsistencyLevel {
    pub fn bonus(self) -> f64 {
        match self {
            ConsistencyLevel::High => 0.15,
            ConsistencyLevel::Medium => 0.05,
            ConsistencyLevel::Low => 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerConsistency {
    pub overall_consistency: ConsistencyLevel,
    /// Share of usable layers carrying the majority label
    pub model_agreement: f64,
}

/// Consistency of the layers carrying evidence: one distinct label is high, two medium,
/// otherwise low. No evidence at all is low with zero agreement.
pub fn evaluate_consistency(layers: &[SentimentLayer]) -> LayerConsistency {
    let mut counts: HashMap<SentimentLabel, usize> = HashMap::new();
    for layer in layers.iter().filter(|l| l.has_evidence()) {
        *counts.entry(layer.sentiment).or_insert(0) += 1;
    }
    let usable: usize = counts.values().sum();

    let overall_consistency = match counts.len() {
        1 => ConsistencyLevel::High,
        2 => ConsistencyLevel::Medium,
        _ => ConsistencyLevel::Low,
    };
    let model_agreement = match counts.values().max() {
        Some(majority) if usable > 0 => *majority as f64 / usable as f64,
        _ => 0.0,
    };

    LayerConsistency {
        overall_consistency,
        model_agreement,
    }
}

/// Composed confidence with its parts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceMetrics {
    pub overall_confidence: f64,
    pub base_confidence: f64,
    pub consistency_bonus: f64,
    pub agreement_bonus: f64,
}

impl ConfidenceMetrics {
    pub fn level(&self) -> ConfidenceLevel {
        ConfidenceLevel::from_confidence(self.overall_confidence)
    }
}

fn agreement_bonus(model_agreement: f64) -> f64 {
    if model_agreement > 0.8 {
        0.1
    } else if model_agreement > 0.6 {
        0.05
    } else {
        0.0
    }
}

/// Mean confidence of the layers carrying evidence plus consistency and agreement
/// bonuses, capped at the confidence ceiling. Errored layers and layers built from
/// zero articles are left out of the mean; with none left everything is zero.
pub fn compose_confidence(layers: &[SentimentLayer], consistency: &LayerConsistency) -> ConfidenceMetrics {
    let usable: Vec<f64> = layers
        .iter()
        .filter(|l| l.has_evidence())
        .map(|l| common::sanitize_confidence(l.confidence))
        .collect();

    if usable.is_empty() {
        return ConfidenceMetrics::default();
    }

    let base_confidence = usable.iter().sum::<f64>() / usable.len() as f64;
    let consistency_bonus = consistency.overall_consistency.bonus();
    let agreement_bonus = agreement_bonus(consistency.model_agreement);

    ConfidenceMetrics {
        overall_confidence: (base_confidence + consistency_bonus + agreement_bonus).min(CONFIDENCE_CEILING),
        base_confidence,
        consistency_bonus,
        agreement_bonus,
    }
}

/// Canonical confidence buckets
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    VeryLow,
    Low,
    Medium,
    High,
    VeryHigh,
}

impl ConfidenceLevel {
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence >= 0.8 {
            ConfidenceLevel::VeryHigh
        } else if confidence >= 0.6 {
            ConfidenceLevel::High
        } else if confidence >= 0.4 {
            ConfidenceLevel::Medium
        } else if confidence >= 0.2 {
            ConfidenceLevel::Low
        } else {
            ConfidenceLevel::VeryLow
        }
    }
}

/// Entry strength, read off the same buckets as [`ConfidenceLevel`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStrength {
    Strong,
    Moderate,
    Weak,
}

impl From<ConfidenceLevel> for EntryStrength {
    fn from(level: ConfidenceLevel) -> Self {
        match level {
            ConfidenceLevel::VeryHigh | ConfidenceLevel::High => EntryStrength::Strong,
            ConfidenceLevel::Medium => EntryStrength::Moderate,
            ConfidenceLevel::Low | ConfidenceLevel::VeryLow => EntryStrength::Weak,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::FusionError;
    use research_agents::LayerType;

    fn layer(layer_type: LayerType, sentiment: SentimentLabel, confidence: f64) -> SentimentLayer {
        SentimentLayer::new(layer_type, sentiment, confidence)
    }

    fn scenario_a() -> Vec<SentimentLayer> {
        vec![
            layer(LayerType::Primary, SentimentLabel::Bullish, 0.8),
            layer(LayerType::Article, SentimentLabel::Bullish, 0.75),
            layer(LayerType::Temporal, SentimentLabel::Neutral, 0.5),
        ]
    }

    #[test]
    fn test_scenario_a_medium_consistency() {
        let layers = scenario_a();
        let consistency = evaluate_consistency(&layers);
        assert_eq!(consistency.overall_consistency, ConsistencyLevel::Medium);
        assert!((consistency.model_agreement - 2.0 / 3.0).abs() < 1e-9);

        let metrics = compose_confidence(&layers, &consistency);
        assert_eq!(metrics.consistency_bonus, 0.05);
        assert_eq!(metrics.agreement_bonus, 0.05);
        assert!((metrics.base_confidence - 0.6833333333).abs() < 1e-6);
        assert!((metrics.overall_confidence - (metrics.base_confidence + 0.1)).abs() < 1e-9);
    }

    #[test]
    fn test_ceiling_is_hard() {
        let layers = vec![
            layer(LayerType::Primary, SentimentLabel::Bearish, 1.0),
            layer(LayerType::Article, SentimentLabel::Bearish, 1.0),
            layer(LayerType::Temporal, SentimentLabel::Bearish, 1.0),
        ];
        let consistency = evaluate_consistency(&layers);
        assert_eq!(consistency.overall_consistency, ConsistencyLevel::High);

        let metrics = compose_confidence(&layers, &consistency);
        assert_eq!(metrics.overall_confidence, CONFIDENCE_CEILING);
        assert_eq!(metrics.level(), ConfidenceLevel::VeryHigh);
    }

    #[test]
    fn test_errored_layers_excluded_from_mean() {
        let error = FusionError::Computation("boom".to_string());
        let layers = vec![
            layer(LayerType::Primary, SentimentLabel::Bullish, 0.6),
            SentimentLayer::degraded(LayerType::Article, &error),
            layer(LayerType::Temporal, SentimentLabel::Bullish, 0.4),
        ];
        let consistency = evaluate_consistency(&layers);
        let metrics = compose_confidence(&layers, &consistency);

        assert!((metrics.base_confidence - 0.5).abs() < 1e-9);
        assert_eq!(consistency.model_agreement, 1.0);
    }

    #[test]
    fn test_all_layers_errored() {
        let error = FusionError::Computation("boom".to_string());
        let layers = vec![
            SentimentLayer::degraded(LayerType::Primary, &error),
            SentimentLayer::degraded(LayerType::Article, &error),
            SentimentLayer::degraded(LayerType::Temporal, &error),
        ];
        let consistency = evaluate_consistency(&layers);
        assert_eq!(consistency.overall_consistency, ConsistencyLevel::Low);

        let metrics = compose_confidence(&layers, &consistency);
        assert_eq!(metrics, ConfidenceMetrics::default());
    }

    #[test]
    fn test_three_labels_is_low() {
        let layers = vec![
            layer(LayerType::Primary, SentimentLabel::Bullish, 0.5),
            layer(LayerType::Article, SentimentLabel::Bearish, 0.5),
            layer(LayerType::Temporal, SentimentLabel::Neutral, 0.5),
        ];
        let consistency = evaluate_consistency(&layers);
        assert_eq!(consistency.overall_consistency, ConsistencyLevel::Low);
        assert_eq!(compose_confidence(&layers, &consistency).agreement_bonus, 0.0);
    }

    #[test]
    fn test_buckets() {
        assert_eq!(ConfidenceLevel::from_confidence(0.8), ConfidenceLevel::VeryHigh);
        assert_eq!(ConfidenceLevel::from_confidence(0.79), ConfidenceLevel::High);
        assert_eq!(ConfidenceLevel::from_confidence(0.4), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::from_confidence(0.1), ConfidenceLevel::VeryLow);
        assert_eq!(EntryStrength::from(ConfidenceLevel::High), EntryStrength::Strong);
        assert_eq!(EntryStrength::from(ConfidenceLevel::Low), EntryStrength::Weak);
    }
}
