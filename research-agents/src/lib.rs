//! Sentiment Research - Layer 1
//!
//! Turns a symbol's news into sentiment evidence for the fusion engine.
//! It includes:
//! - Sentiment provider trait plus generative, classifier and keyword-heuristic tiers
//! - Model registry with per-tier availability and usage accounting
//! - Fallback chain that always resolves to exactly one verdict
//! - News ranking by relevance and keyword density
//! - Multi-layer analyzer (primary, article, temporal)

pub mod config;
pub mod fallback;
pub mod layers;
pub mod lexicon;
pub mod provider;
pub mod providers;
pub mod ranking;
pub mod registry;

// Re-export commonly used types
pub use config::AnalyzerConfig;
pub use fallback::FallbackChain;
pub use layers::{
    ArticleLayerDetail, ArticleScore, LayerAnalysis, LayerDetail, LayerType, MultiLayerAnalyzer,
    PrimaryLayerDetail, SentimentLayer, TemporalLayerDetail, Trend,
};
pub use lexicon::TopicCategory;
pub use provider::{ProviderConfig, ProviderJudgment, ProviderStatus, ProviderTier, SentimentProvider};
pub use providers::{
    ClassifierOutput, ClassifierProvider, GenerativeModelProvider, KeywordHeuristicProvider,
    TextClassifier, TextGenerator,
};
pub use ranking::rank_news;
pub use registry::{ModelRegistry, ProviderUsage};

// Re-export common types for convenience
pub use common::{FusionError, NewsItem, RankedNewsItem, SentimentLabel, SentimentVerdict};
