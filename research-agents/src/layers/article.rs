//! Article layer: per-article impact, topic and urgency

use super::{LayerDetail, LayerType, SentimentLayer};
use crate::config::AnalyzerConfig;
use crate::lexicon::{self, TopicCategory};
use chrono::{DateTime, Utc};
use common::{FusionError, FusionResult, RankedNewsItem, SentimentLabel};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Layer confidence never exceeds this, however strong the mean impact
const MAX_ARTICLE_CONFIDENCE: f64 = 0.9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleScore {
    /// Position in the ranked list; scores are keyed by it before aggregation
    pub processing_order: usize,
    pub title: String,
    pub source: String,
    pub relevance_score: f64,
    pub impact: f64, // -1.0 to 1.0
    pub category: TopicCategory,
    pub urgent: bool,
    pub published_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleLayerDetail {
    pub articles: Vec<ArticleScore>,
    /// Relevance-weighted mean impact
    pub weighted_impact: f64,
    pub average_impact: f64,
    pub urgent_count: usize,
    pub category_counts: BTreeMap<TopicCategory, usize>,
}

impl ArticleLayerDetail {
    pub fn impacts(&self) -> Vec<f64> {
        self.articles.iter().map(|a| a.impact).collect()
    }
}

/// Score one ranked article. Pure, so articles can be scored in any order.
pub fn score_article(ranked: &RankedNewsItem) -> ArticleScore {
    let text = ranked.item.text();
    ArticleScore {
        processing_order: ranked.processing_order,
        title: ranked.item.title.clone(),
        source: ranked.item.source.clone(),
        relevance_score: ranked.relevance_score,
        impact: lexicon::tally(&text).impact(),
        category: lexicon::topic_category(&text),
        urgent: lexicon::is_urgent(&text),
        published_at: ranked.item.published_at,
    }
}

pub fn analyze(ranked: &[RankedNewsItem], config: &AnalyzerConfig) -> FusionResult<SentimentLayer> {
    let mut scored: BTreeMap<usize, ArticleScore> = BTreeMap::new();
    for item in ranked.iter().take(config.article_top_m) {
        let score = score_article(item);
        debug!(
            order = score.processing_order,
            impact = score.impact,
            category = ?score.category,
            urgent = score.urgent,
            "Article scored"
        );
        scored.insert(score.processing_order, score);
    }
    let articles: Vec<ArticleScore> = scored.into_values().collect();

    let relevance_total: f64 = articles.iter().map(|a| a.relevance_score).sum();
    let weighted_impact = if relevance_total > 0.0 {
        articles
            .iter()
            .map(|a| a.relevance_score * a.impact)
            .sum::<f64>()
            / relevance_total
    } else {
        0.0
    };
    let average_impact = if articles.is_empty() {
        0.0
    } else {
        articles.iter().map(|a| a.impact).sum::<f64>() / articles.len() as f64
    };

    if !weighted_impact.is_finite() || !average_impact.is_finite() {
        return Err(FusionError::Computation(
            "non-finite article impact".to_string(),
        ));
    }

    let mut category_counts = BTreeMap::new();
    for article in &articles {
        *category_counts.entry(article.category).or_insert(0) += 1;
    }
    let urgent_count = articles.iter().filter(|a| a.urgent).count();

    let (sentiment, confidence) = if articles.is_empty() {
        (SentimentLabel::Neutral, 0.0)
    } else {
        (
            SentimentLabel::from_score(weighted_impact, config.label_threshold),
            weighted_impact.abs().min(MAX_ARTICLE_CONFIDENCE),
        )
    };

    let mut layer = SentimentLayer::new(LayerType::Article, sentiment, confidence);
    layer.detail = LayerDetail::Article(ArticleLayerDetail {
        articles,
        weighted_impact,
        average_impact,
        urgent_count,
        category_counts,
    });
    Ok(layer)
}
