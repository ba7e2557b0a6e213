//! Multi-layer sentiment analyzer
//!
//! Runs three passes over the same ranked news, strictly in order:
//! - primary: one fallback-chain verdict over the top items
//! - article: per-article impact, topic and urgency, relevance-weighted
//! - temporal: the article breakdown re-weighted by freshness
//!
//! Each pass returns `FusionResult`; a failed pass is converted once, here, into
//! a neutral zero-confidence layer carrying the error message.

pub mod article;
pub mod primary;
pub mod temporal;

pub use article::{ArticleLayerDetail, ArticleScore};
pub use primary::PrimaryLayerDetail;
pub use temporal::{decay_weight, TemporalLayerDetail, Trend};

use crate::config::AnalyzerConfig;
use crate::fallback::FallbackChain;
use crate::ranking::rank_news;
use chrono::{DateTime, Utc};
use common::{FusionError, NewsItem, SentimentLabel, SentimentVerdict};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerType {
    Primary,
    Article,
    Temporal,
}

/// Layer-specific payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayerDetail {
    Primary(PrimaryLayerDetail),
    Article(ArticleLayerDetail),
    Temporal(TemporalLayerDetail),
    None,
}

/// One analytical pass over the news corpus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentLayer {
    pub layer_type: LayerType,
    pub sentiment: SentimentLabel,
    pub confidence: f64, // 0.0 to 1.0
    pub detail: LayerDetail,
    pub error: Option<String>,
}

impl SentimentLayer {
    /// Layer without a detail payload
    pub fn new(layer_type: LayerType, sentiment: SentimentLabel, confidence: f64) -> Self {
        Self {
            layer_type,
            sentiment,
            confidence: common::sanitize_confidence(confidence),
            detail: LayerDetail::None,
            error: None,
        }
    }

    /// Floor value for a failed layer
    pub fn degraded(layer_type: LayerType, error: &FusionError) -> Self {
        Self {
            layer_type,
            sentiment: SentimentLabel::Neutral,
            confidence: 0.0,
            detail: LayerDetail::None,
            error: Some(error.to_string()),
        }
    }

    /// False for layers that errored
    pub fn is_usable(&self) -> bool {
        self.error.is_none()
    }

    /// Usable and built from at least one article.
    ///
    /// An empty corpus yields neutral zero-confidence layers; those carry no
    /// information and must not count towards consistency or agreement.
    pub fn has_evidence(&self) -> bool {
        if !self.is_usable() {
            return false;
        }
        match &self.detail {
            LayerDetail::Primary(detail) => detail.articles_considered > 0,
            LayerDetail::Article(detail) => !detail.articles.is_empty(),
            LayerDetail::Temporal(detail) => detail.freshest_age_hours.is_some(),
            LayerDetail::None => true,
        }
    }

    pub fn article_detail(&self) -> Option<&ArticleLayerDetail> {
        match &self.detail {
            LayerDetail::Article(detail) if self.is_usable() => Some(detail),
            _ => None,
        }
    }
}

/// Output of one analyzer run for a symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerAnalysis {
    pub symbol: String,
    pub ranked_count: usize,
    /// Always primary, article, temporal
    pub layers: Vec<SentimentLayer>,
    pub primary_verdict: SentimentVerdict,
}

impl LayerAnalysis {
    pub fn layer(&self, layer_type: LayerType) -> Option<&SentimentLayer> {
        self.layers.iter().find(|l| l.layer_type == layer_type)
    }

    pub fn usable_layers(&self) -> impl Iterator<Item = &SentimentLayer> {
        self.layers.iter().filter(|l| l.is_usable())
    }

    /// Layers that carry article evidence
    pub fn evidence_layers(&self) -> impl Iterator<Item = &SentimentLayer> {
        self.layers.iter().filter(|l| l.has_evidence())
    }
}

pub struct MultiLayerAnalyzer {
    chain: FallbackChain,
    config: AnalyzerConfig,
}

impl MultiLayerAnalyzer {
    pub fn new(chain: FallbackChain, config: AnalyzerConfig) -> Self {
        Self { chain, config }
    }

    pub fn chain(&self) -> &FallbackChain {
        &self.chain
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Resolve one verdict for `symbol` through the fallback chain
    pub async fn resolve_sentiment(&self, symbol: &str, news: &[NewsItem]) -> SentimentVerdict {
        self.chain.resolve_sentiment(symbol, news).await
    }

    /// Run the three layers against the current time
    pub async fn analyze_sentiment_layers(&self, symbol: &str, news: &[NewsItem]) -> LayerAnalysis {
        self.analyze_at(symbol, news, Utc::now()).await
    }

    /// Run the three layers with article ages measured from `as_of`
    pub async fn analyze_at(&self, symbol: &str, news: &[NewsItem], as_of: DateTime<Utc>) -> LayerAnalysis {
        let ranked = rank_news(symbol, news, as_of);

        let (primary_layer, primary_verdict) =
            match primary::analyze(&self.chain, symbol, &ranked, self.config.primary_top_n).await {
                Ok(result) => result,
                Err(e) => {
                    warn!(symbol, error = %e, "Primary layer failed");
                    (
                        SentimentLayer::degraded(LayerType::Primary, &e),
                        SentimentVerdict::error_fallback(e.to_string()),
                    )
                }
            };

        let article_layer = article::analyze(&ranked, &self.config).unwrap_or_else(|e| {
            warn!(symbol, error = %e, "Article layer failed");
            SentimentLayer::degraded(LayerType::Article, &e)
        });

        let temporal_layer = article_layer
            .article_detail()
            .ok_or_else(|| FusionError::Computation("article breakdown unavailable".to_string()))
            .and_then(|detail| temporal::analyze(detail, &self.config, as_of))
            .unwrap_or_else(|e| {
                warn!(symbol, error = %e, "Temporal layer failed");
                SentimentLayer::degraded(LayerType::Temporal, &e)
            });

        info!(
            symbol,
            ranked = ranked.len(),
            primary = %primary_layer.sentiment,
            primary_confidence = primary_layer.confidence,
            article = %article_layer.sentiment,
            article_confidence = article_layer.confidence,
            temporal = %temporal_layer.sentiment,
            temporal_confidence = temporal_layer.confidence,
            "Sentiment layers analyzed"
        );

        LayerAnalysis {
            symbol: symbol.to_string(),
            ranked_count: ranked.len(),
            layers: vec![primary_layer, article_layer, temporal_layer],
            primary_verdict,
        }
    }
}
