// Signal Fusion Pipeline
// Orchestrates news -> sentiment layers -> confidence/agreement -> fused signal per symbol

use crate::agreement::{score_agreement, AgreementResult};
use crate::confidence::{compose_confidence, evaluate_consistency, ConfidenceMetrics, LayerConsistency};
use crate::config::{FusionConfig, PipelineSettings};
use crate::fusion::{fuse, FusedSignal, FusionWeights};
use crate::sink::SignalSink;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{FusionResult, NewsItem, ResolutionMethod, SentimentLabel, SentimentVerdict, TechnicalPrediction};
use research_agents::{FallbackChain, LayerAnalysis, ModelRegistry, MultiLayerAnalyzer};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

/// Source of recent news for a symbol
#[async_trait]
pub trait NewsProvider: Send + Sync {
    async fn fetch_news(&self, symbol: &str) -> Result<Vec<NewsItem>>;
}

/// Source of a technical price-direction estimate for a symbol
#[async_trait]
pub trait TechnicalPredictor: Send + Sync {
    async fn predict(&self, symbol: &str) -> Result<TechnicalPrediction>;
}

/// Everything produced for one symbol in one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolReport {
    pub symbol: String,
    pub analysis: LayerAnalysis,
    pub consistency: LayerConsistency,
    pub confidence: ConfidenceMetrics,
    pub agreement: AgreementResult,
    /// Consolidated verdict handed to the fusion engine
    pub verdict: SentimentVerdict,
    pub technical: Option<TechnicalPrediction>,
    pub signal: FusedSignal,
}

/// Confidence-weighted vote of the layers carrying evidence, with the composed confidence.
///
/// An empty corpus passes the primary `no_data` verdict straight through so fusion
/// runs technical-only.
pub fn consolidate_verdict(analysis: &LayerAnalysis, metrics: &ConfidenceMetrics) -> SentimentVerdict {
    let primary = &analysis.primary_verdict;
    if primary.method == ResolutionMethod::NoData {
        return primary.clone();
    }

    let usable: Vec<_> = analysis.evidence_layers().collect();
    if usable.is_empty() {
        return SentimentVerdict::error_fallback("all sentiment layers failed");
    }

    let mut tally = [
        (SentimentLabel::Bullish, 0.0),
        (SentimentLabel::Bearish, 0.0),
        (SentimentLabel::Neutral, 0.0),
    ];
    for layer in &usable {
        if let Some(entry) = tally.iter_mut().find(|(label, _)| *label == layer.sentiment) {
            entry.1 += layer.confidence;
        }
    }
    tally.sort_by(|a, b| b.1.total_cmp(&a.1));
    // A tie for first place is no decision
    let label = if tally[0].1 > tally[1].1 {
        tally[0].0
    } else {
        SentimentLabel::Neutral
    };

    let total_weight: f64 = usable.iter().map(|l| l.confidence).sum();
    let score = if total_weight > 0.0 {
        usable.iter().map(|l| l.sentiment.sign() * l.confidence).sum::<f64>() / total_weight
    } else {
        0.0
    };

    let (method, fallback_used) = if primary.is_unavailable() {
        (ResolutionMethod::RuleBasedFinal, true)
    } else {
        (primary.method, primary.fallback_used)
    };

    SentimentVerdict {
        label,
        confidence: metrics.overall_confidence,
        score: Some(score),
        model_id: primary.model_id.clone(),
        source_count: primary.source_count.max(analysis.ranked_count),
        reasoning: format!(
            "{} of {} layers usable, consensus {}; primary: {}",
            usable.len(),
            analysis.layers.len(),
            label,
            primary.reasoning
        ),
        method,
        fallback_used,
    }
}

/// Per-symbol fusion pipeline
pub struct FusionPipeline {
    news: Arc<dyn NewsProvider>,
    technical: Arc<dyn TechnicalPredictor>,
    analyzer: MultiLayerAnalyzer,
    weights: FusionWeights,
    settings: PipelineSettings,
    sink: Option<Arc<dyn SignalSink>>,
}

impl FusionPipeline {
    /// Create a new pipeline; rejects invalid weights or settings up front
    pub fn new(
        config: FusionConfig,
        registry: Arc<ModelRegistry>,
        news: Arc<dyn NewsProvider>,
        technical: Arc<dyn TechnicalPredictor>,
    ) -> FusionResult<Self> {
        config.validate()?;

        let chain = FallbackChain::new(registry).with_label_threshold(config.analyzer.label_threshold);
        Ok(Self {
            news,
            technical,
            analyzer: MultiLayerAnalyzer::new(chain, config.analyzer),
            weights: config.weights,
            settings: config.pipeline,
            sink: None,
        })
    }

    /// Set signal sink
    pub fn with_sink(mut self, sink: Arc<dyn SignalSink>) -> Self {
        info!("Setting signal sink");
        self.sink = Some(sink);
        self
    }

    pub fn weights(&self) -> &FusionWeights {
        &self.weights
    }

    pub fn is_enabled(&self) -> bool {
        self.settings.enabled
    }

    /// Run the full pipeline for one symbol against the current time
    pub async fn process_symbol(&self, symbol: &str) -> SymbolReport {
        self.process_symbol_at(symbol, Utc::now()).await
    }

    /// Run the full pipeline for one symbol. Collaborator failures degrade, never abort.
    pub async fn process_symbol_at(&self, symbol: &str, as_of: DateTime<Utc>) -> SymbolReport {
        let news = match self.news.fetch_news(symbol).await {
            Ok(news) => news,
            Err(e) => {
                warn!(symbol, error = %e, "News fetch failed, continuing without news");
                Vec::new()
            }
        };

        let technical = match self.technical.predict(symbol).await {
            Ok(prediction) => Some(prediction),
            Err(e) => {
                warn!(symbol, error = %e, "Technical prediction failed, continuing sentiment-only");
                None
            }
        };

        let analysis = self.analyzer.analyze_at(symbol, &news, as_of).await;
        let consistency = evaluate_consistency(&analysis.layers);
        let confidence = compose_confidence(&analysis.layers, &consistency);
        let agreement = score_agreement(&analysis.layers, technical.as_ref().map(|t| t.direction));
        let verdict = consolidate_verdict(&analysis, &confidence);

        debug!(
            symbol,
            consistency = ?consistency.overall_consistency,
            overall_confidence = confidence.overall_confidence,
            agreement = ?agreement.status,
            "Layer evidence composed"
        );

        let signal = fuse(symbol, technical.as_ref(), &verdict, &self.weights);

        if let Some(sink) = &self.sink {
            if let Err(e) = sink.publish(&signal).await {
                warn!(symbol, error = %e, "Failed to publish signal");
            }
        }

        SymbolReport {
            symbol: symbol.to_string(),
            analysis,
            consistency,
            confidence,
            agreement,
            verdict,
            technical,
            signal,
        }
    }

    /// Process several symbols concurrently, bounded by `max_concurrent_symbols`.
    ///
    /// Reports come back in input order.
    pub async fn process_batch(self: &Arc<Self>, symbols: &[String]) -> Vec<SymbolReport> {
        if !self.settings.enabled {
            debug!("Pipeline is disabled, skipping signal generation");
            return Vec::new();
        }

        let as_of = Utc::now();
        let semaphore = Arc::new(Semaphore::new(self.settings.max_concurrent_symbols.max(1)));
        let mut tasks = Vec::with_capacity(symbols.len());

        for symbol in symbols {
            let pipeline = Arc::clone(self);
            let semaphore = Arc::clone(&semaphore);
            let symbol = symbol.clone();

            tasks.push(tokio::spawn(async move {
                let _permit = semaphore.acquire().await;
                pipeline.process_symbol_at(&symbol, as_of).await
            }));
        }

        let mut reports = Vec::with_capacity(tasks.len());
        for (symbol, result) in symbols.iter().zip(futures::future::join_all(tasks).await) {
            match result {
                Ok(report) => reports.push(report),
                Err(e) => error!(symbol = %symbol, error = %e, "Symbol task failed"),
            }
        }

        info!(requested = symbols.len(), produced = reports.len(), "Batch processed");
        reports
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agreement::AgreementStatus;
    use crate::confidence::ConsistencyLevel;
    use crate::fusion::{FusionMethod, TradeAction};
    use crate::sink::InMemorySink;
    use chrono::Duration;
    use common::Direction;
    use research_agents::{GenerativeModelProvider, TextGenerator};
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    struct StaticNews {
        by_symbol: HashMap<String, Vec<NewsItem>>,
    }

    #[async_trait]
    impl NewsProvider for StaticNews {
        async fn fetch_news(&self, symbol: &str) -> Result<Vec<NewsItem>> {
            Ok(self.by_symbol.get(symbol).cloned().unwrap_or_default())
        }
    }

    struct FailingNews;

    #[async_trait]
    impl NewsProvider for FailingNews {
        async fn fetch_news(&self, _symbol: &str) -> Result<Vec<NewsItem>> {
            Err(anyhow::anyhow!("news API rate limited"))
        }
    }

    struct StaticTechnical {
        direction: Direction,
        confidence: f64,
    }

    #[async_trait]
    impl TechnicalPredictor for StaticTechnical {
        async fn predict(&self, _symbol: &str) -> Result<TechnicalPrediction> {
            Ok(TechnicalPrediction {
                current_price: dec!(100.00),
                predicted_price: dec!(103.00),
                direction: self.direction,
                confidence: self.confidence,
            })
        }
    }

    struct FailingTechnical;

    #[async_trait]
    impl TechnicalPredictor for FailingTechnical {
        async fn predict(&self, _symbol: &str) -> Result<TechnicalPrediction> {
            Err(anyhow::anyhow!("not enough price history"))
        }
    }

    struct BullishGenerator;

    #[async_trait]
    impl TextGenerator for BullishGenerator {
        fn model_name(&self) -> &str {
            "scripted-llm"
        }

        async fn generate(&self, _prompt: &str) -> Result<String> {
            Ok(r#"{"sentiment": "bullish", "confidence": 0.8, "reasoning": "strong quarter"}"#.to_string())
        }
    }

    fn bullish_news(now: DateTime<Utc>) -> Vec<NewsItem> {
        vec![
            NewsItem {
                title: "ACME shares surge after earnings beat".to_string(),
                summary: "Revenue growth tops estimates".to_string(),
                source: "Reuters".to_string(),
                published_at: now - Duration::hours(1),
                url: "https://example.com/a".to_string(),
            },
            NewsItem {
                title: "Analysts upgrade ACME on strong growth".to_string(),
                summary: String::new(),
                source: "Bloomberg".to_string(),
                published_at: now - Duration::hours(4),
                url: "https://example.com/b".to_string(),
            },
            NewsItem {
                title: "ACME rallies to record high".to_string(),
                summary: String::new(),
                source: "CNBC".to_string(),
                published_at: now - Duration::hours(9),
                url: "https://example.com/c".to_string(),
            },
        ]
    }

    async fn registry_with_generator() -> Arc<ModelRegistry> {
        let registry = ModelRegistry::new()
            .with_generative(Arc::new(GenerativeModelProvider::with_generator(Arc::new(BullishGenerator))));
        registry.load().await;
        Arc::new(registry)
    }

    fn news_for(symbol: &str, items: Vec<NewsItem>) -> Arc<StaticNews> {
        let mut by_symbol = HashMap::new();
        by_symbol.insert(symbol.to_string(), items);
        Arc::new(StaticNews { by_symbol })
    }

    #[tokio::test]
    async fn test_full_pipeline_agreeing_sources() {
        let now = Utc::now();
        let sink = Arc::new(InMemorySink::new());
        let pipeline = FusionPipeline::new(
            FusionConfig::default(),
            registry_with_generator().await,
            news_for("ACME", bullish_news(now)),
            Arc::new(StaticTechnical {
                direction: Direction::Up,
                confidence: 0.7,
            }),
        )
        .unwrap()
        .with_sink(sink.clone());

        let report = pipeline.process_symbol_at("ACME", now).await;

        assert_eq!(report.analysis.primary_verdict.method, ResolutionMethod::GenerativeModel);
        assert_eq!(report.verdict.label, SentimentLabel::Bullish);
        assert_eq!(report.signal.method, FusionMethod::WeightedFusion);
        assert_eq!(report.signal.action, TradeAction::BuyStrong);
        assert!(report.signal.confidence <= 0.95);
        assert!(report.confidence.overall_confidence <= 0.95);
        assert_eq!(sink.get_by_symbol("ACME").await.len(), 1);
    }

    #[tokio::test]
    async fn test_no_news_runs_technical_only() {
        let pipeline = FusionPipeline::new(
            FusionConfig::default(),
            registry_with_generator().await,
            Arc::new(FailingNews),
            Arc::new(StaticTechnical {
                direction: Direction::Down,
                confidence: 0.6,
            }),
        )
        .unwrap();

        let report = pipeline.process_symbol("ACME").await;

        assert_eq!(report.verdict.method, ResolutionMethod::NoData);
        assert_eq!(report.signal.method, FusionMethod::TechnicalOnly);
        assert!(report.signal.fallback_mode);
        assert_eq!(report.signal.direction, Direction::Down);
        assert!((report.signal.confidence - 0.6 * 0.85).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_empty_corpus_carries_no_sentiment_confidence() {
        let pipeline = FusionPipeline::new(
            FusionConfig::default(),
            registry_with_generator().await,
            news_for("ACME", vec![]),
            Arc::new(StaticTechnical {
                direction: Direction::Neutral,
                confidence: 0.5,
            }),
        )
        .unwrap();

        let report = pipeline.process_symbol("ACME").await;

        assert_eq!(report.analysis.evidence_layers().count(), 0);
        assert_eq!(report.consistency.overall_consistency, ConsistencyLevel::Low);
        assert_eq!(report.consistency.model_agreement, 0.0);
        assert_eq!(report.confidence.overall_confidence, 0.0);
        assert_eq!(report.confidence.consistency_bonus, 0.0);
        assert_eq!(report.agreement.status, AgreementStatus::InsufficientLayers);
        assert_eq!(report.agreement.score, 0.5);
        assert_eq!(report.agreement.comparisons, 0);
        assert_eq!(report.verdict.method, ResolutionMethod::NoData);
        assert_eq!(report.signal.method, FusionMethod::TechnicalOnly);
    }

    #[tokio::test]
    async fn test_technical_failure_runs_sentiment_only() {
        let now = Utc::now();
        let pipeline = FusionPipeline::new(
            FusionConfig::default(),
            registry_with_generator().await,
            news_for("ACME", bullish_news(now)),
            Arc::new(FailingTechnical),
        )
        .unwrap();

        let report = pipeline.process_symbol_at("ACME", now).await;

        assert!(report.technical.is_none());
        assert_eq!(report.signal.method, FusionMethod::SentimentOnly);
        assert_eq!(report.signal.direction, Direction::Up);
    }

    #[tokio::test]
    async fn test_nothing_available_holds() {
        let pipeline = FusionPipeline::new(
            FusionConfig::default(),
            Arc::new(ModelRegistry::new()),
            Arc::new(FailingNews),
            Arc::new(FailingTechnical),
        )
        .unwrap();

        let report = pipeline.process_symbol("ACME").await;
        assert_eq!(report.signal.action, TradeAction::HoldNeutral);
        assert_eq!(report.signal.confidence, 0.0);
        assert_eq!(report.signal.method, FusionMethod::ErrorFallback);
    }

    #[tokio::test]
    async fn test_batch_preserves_order() {
        let now = Utc::now();
        let mut by_symbol = HashMap::new();
        by_symbol.insert("ACME".to_string(), bullish_news(now));
        let pipeline = Arc::new(
            FusionPipeline::new(
                FusionConfig::default(),
                registry_with_generator().await,
                Arc::new(StaticNews { by_symbol }),
                Arc::new(StaticTechnical {
                    direction: Direction::Neutral,
                    confidence: 0.5,
                }),
            )
            .unwrap(),
        );

        let symbols: Vec<String> = ["INIT", "ACME", "ZETA", "BETA"].iter().map(|s| s.to_string()).collect();
        let reports = pipeline.process_batch(&symbols).await;

        let order: Vec<&str> = reports.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(order, vec!["INIT", "ACME", "ZETA", "BETA"]);
        assert_eq!(reports[1].verdict.label, SentimentLabel::Bullish);
        assert_eq!(reports[0].verdict.method, ResolutionMethod::NoData);
    }

    #[tokio::test]
    async fn test_disabled_batch_is_empty() {
        let mut config = FusionConfig::default();
        config.pipeline.enabled = false;
        let pipeline = Arc::new(
            FusionPipeline::new(
                config,
                Arc::new(ModelRegistry::new()),
                Arc::new(FailingNews),
                Arc::new(FailingTechnical),
            )
            .unwrap(),
        );

        assert!(pipeline.process_batch(&["ACME".to_string()]).await.is_empty());
    }

    #[test]
    fn test_invalid_weights_rejected() {
        let mut config = FusionConfig::default();
        config.weights.technical = 0.9;
        let result = FusionPipeline::new(
            config,
            Arc::new(ModelRegistry::new()),
            Arc::new(FailingNews),
            Arc::new(FailingTechnical),
        );
        assert!(result.is_err());
    }
}
