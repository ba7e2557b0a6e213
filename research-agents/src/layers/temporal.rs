//! Temporal layer: article impacts re-weighted by freshness

use super::article::ArticleLayerDetail;
use super::{LayerDetail, LayerType, SentimentLayer};
use crate::config::AnalyzerConfig;
use chrono::{DateTime, Utc};
use common::{FusionError, FusionResult, SentimentLabel};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

const MAX_TEMPORAL_CONFIDENCE: f64 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Improving,
    Declining,
    Stable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalLayerDetail {
    pub weighted_score: f64,
    pub trend: Trend,
    pub newer_half_score: f64,
    pub older_half_score: f64,
    pub temporal_consistency: f64,
    pub freshest_age_hours: Option<f64>,
}

/// Exponential decay e^(-lambda * age). Strictly decreasing in age for lambda > 0.
pub fn decay_weight(age_hours: f64, lambda: f64) -> f64 {
    (-lambda * age_hours.max(0.0)).exp()
}

struct Weighted {
    age_hours: f64,
    weight: f64,
    impact: f64,
}

fn weighted_mean(points: &[Weighted]) -> f64 {
    let total: f64 = points.iter().map(|p| p.weight).sum();
    if total > 0.0 {
        points.iter().map(|p| p.weight * p.impact).sum::<f64>() / total
    } else {
        0.0
    }
}

pub fn analyze(
    articles: &ArticleLayerDetail,
    config: &AnalyzerConfig,
    as_of: DateTime<Utc>,
) -> FusionResult<SentimentLayer> {
    let ages: Vec<f64> = articles
        .articles
        .iter()
        .map(|a| ((as_of - a.published_at).num_milliseconds() as f64 / 3_600_000.0).max(0.0))
        .collect();
    let freshest = ages.iter().copied().reduce(f64::min);

    // Decay is taken relative to the freshest article; ratios are unchanged
    let mut points: Vec<Weighted> = articles
        .articles
        .iter()
        .zip(&ages)
        .map(|(article, age)| Weighted {
            age_hours: *age,
            weight: decay_weight(age - freshest.unwrap_or(0.0), config.decay_lambda)
                * article.relevance_score,
            impact: article.impact,
        })
        .collect();

    let weighted_score = weighted_mean(&points);

    let (trend, newer_half_score, older_half_score, temporal_consistency) = if points.len() < 2 {
        (Trend::Stable, weighted_score, weighted_score, 1.0)
    } else {
        points.sort_by(|a, b| a.age_hours.total_cmp(&b.age_hours));
        let mid = points.len() / 2;
        let newer = weighted_mean(&points[..mid]);
        let older = weighted_mean(&points[mid..]);
        let diff = newer - older;
        let trend = if diff > config.trend_threshold {
            Trend::Improving
        } else if diff < -config.trend_threshold {
            Trend::Declining
        } else {
            Trend::Stable
        };
        let spread = points.iter().map(|p| p.impact).population_std_dev();
        (trend, newer, older, (1.0 - 2.0 * spread).max(0.0))
    };

    if !weighted_score.is_finite() || !temporal_consistency.is_finite() {
        return Err(FusionError::Computation(
            "non-finite temporal score".to_string(),
        ));
    }

    let (sentiment, confidence) = if points.is_empty() {
        (SentimentLabel::Neutral, 0.0)
    } else {
        (
            SentimentLabel::from_score(weighted_score, config.label_threshold),
            weighted_score.abs().min(MAX_TEMPORAL_CONFIDENCE) * (0.5 + 0.5 * temporal_consistency),
        )
    };

    let mut layer = SentimentLayer::new(LayerType::Temporal, sentiment, confidence);
    layer.detail = LayerDetail::Temporal(TemporalLayerDetail {
        weighted_score,
        trend,
        newer_half_score,
        older_half_score,
        temporal_consistency,
        freshest_age_hours: freshest,
    });
    Ok(layer)
}
