//! Fallback chain selector
//!
//! Tries the generative model, then the classifier, then the keyword heuristic.
//! Any error, empty judgment or unavailable provider moves on to the next tier.
//! The heuristic tier has no error path, so `resolve_sentiment` always returns.

use crate::provider::{ProviderJudgment, ProviderTier, SentimentProvider};
use crate::registry::ModelRegistry;
use common::{FusionError, FusionResult, NewsItem, ResolutionMethod, SentimentLabel, SentimentVerdict};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

pub struct FallbackChain {
    registry: Arc<ModelRegistry>,
    label_threshold: f64,
}

impl FallbackChain {
    pub fn new(registry: Arc<ModelRegistry>) -> Self {
        Self {
            registry,
            label_threshold: 0.1,
        }
    }

    pub fn with_label_threshold(mut self, threshold: f64) -> Self {
        self.label_threshold = threshold;
        self
    }

    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    /// Resolve one verdict for `symbol` from its news
    pub async fn resolve_sentiment(&self, symbol: &str, news: &[NewsItem]) -> SentimentVerdict {
        if news.is_empty() {
            debug!(symbol, "No news, returning degenerate verdict");
            return SentimentVerdict::no_data();
        }

        let context = build_context(symbol, news);

        match self.try_generative(&context, news.len()).await {
            Ok(verdict) => {
                info!(symbol, model = %verdict.model_id, label = %verdict.label, "Sentiment resolved by generative model");
                return verdict;
            }
            Err(e) => warn!(symbol, error = %e, "Generative tier unavailable, falling back"),
        }

        match self.try_classifier(news).await {
            Ok(verdict) => {
                info!(symbol, model = %verdict.model_id, label = %verdict.label, "Sentiment resolved by classifier");
                return verdict;
            }
            Err(e) => warn!(symbol, error = %e, "Classifier tier unavailable, falling back"),
        }

        let verdict = self.heuristic_verdict(&context, news.len());
        info!(symbol, label = %verdict.label, "Sentiment resolved by keyword heuristic");
        verdict
    }

    async fn try_generative(&self, context: &str, source_count: usize) -> FusionResult<SentimentVerdict> {
        let tier = ProviderTier::GenerativeModel;
        let provider = self
            .registry
            .provider(tier)
            .ok_or_else(|| FusionError::ProviderUnavailable {
                provider: "generative-model".to_string(),
            })?;

        let started = Instant::now();
        let result = provider.invoke(context).await;
        let failed = !matches!(&result, Ok(j) if !j.is_empty());
        self.registry
            .record_call(tier, started.elapsed().as_millis() as u64, failed);

        let judgment = result?;
        if judgment.is_empty() {
            return Err(FusionError::EmptyResponse {
                provider: provider.config().provider_id.clone(),
            });
        }

        Ok(verdict_from(judgment, provider.model_id(), source_count, ResolutionMethod::GenerativeModel, false))
    }

    async fn try_classifier(&self, news: &[NewsItem]) -> FusionResult<SentimentVerdict> {
        let tier = ProviderTier::Classifier;
        let provider = self
            .registry
            .provider(tier)
            .ok_or_else(|| FusionError::ProviderUnavailable {
                provider: "article-classifier".to_string(),
            })?;

        let texts: Vec<String> = news.iter().map(NewsItem::text).collect();
        let started = Instant::now();
        let result = provider.invoke_batch(&texts).await;
        let aggregated = result.map(|judgments| aggregate_judgments(&judgments, self.label_threshold));
        let failed = !matches!(&aggregated, Ok(Some(_)));
        self.registry
            .record_call(tier, started.elapsed().as_millis() as u64, failed);

        let judgment = aggregated?.ok_or_else(|| FusionError::EmptyResponse {
            provider: provider.config().provider_id.clone(),
        })?;

        Ok(verdict_from(judgment, provider.model_id(), news.len(), ResolutionMethod::Classifier, true))
    }

    fn heuristic_verdict(&self, context: &str, source_count: usize) -> SentimentVerdict {
        let heuristic = self.registry.heuristic();
        let started = Instant::now();
        let judgment = heuristic.judge(context);
        self.registry.record_call(
            ProviderTier::KeywordHeuristic,
            started.elapsed().as_millis() as u64,
            false,
        );
        verdict_from(
            judgment,
            heuristic.model_id(),
            source_count,
            ResolutionMethod::RuleBasedFinal,
            true,
        )
    }
}

fn verdict_from(
    judgment: ProviderJudgment,
    model_id: String,
    source_count: usize,
    method: ResolutionMethod,
    fallback_used: bool,
) -> SentimentVerdict {
    SentimentVerdict {
        label: judgment.label,
        confidence: common::sanitize_confidence(judgment.confidence),
        score: judgment.score,
        model_id,
        source_count,
        reasoning: judgment.reasoning,
        method,
        fallback_used,
    }
}

/// Single prompt context covering every item
pub fn build_context(symbol: &str, news: &[NewsItem]) -> String {
    let mut context = format!("Instrument: {}\nRecent news:\n", symbol);
    for (i, item) in news.iter().enumerate() {
        context.push_str(&format!("{}. [{}] {}\n", i + 1, item.source, item.text()));
    }
    context
}

/// Combine per-article judgments into one
///
/// Label from the mean signed confidence; confidence is the mean confidence
/// scaled by the share of articles agreeing with the final label. Empty
/// judgments are ignored; None when nothing is left.
pub fn aggregate_judgments(judgments: &[ProviderJudgment], label_threshold: f64) -> Option<ProviderJudgment> {
    let usable: Vec<&ProviderJudgment> = judgments.iter().filter(|j| !j.is_empty()).collect();
    if usable.is_empty() {
        return None;
    }

    let n = usable.len() as f64;
    let mean_signed = usable.iter().map(|j| j.signed_strength()).sum::<f64>() / n;
    let mean_confidence = usable.iter().map(|j| j.confidence).sum::<f64>() / n;
    let label = SentimentLabel::from_score(mean_signed, label_threshold);
    let agreeing = usable.iter().filter(|j| j.label == label).count() as f64;

    let confidence = mean_confidence * agreeing / n;
    if confidence <= 0.0 {
        return None;
    }

    Some(ProviderJudgment {
        label,
        confidence,
        score: Some(mean_signed.clamp(-1.0, 1.0)),
        reasoning: format!(
            "{} of {} articles classified {} (mean signed confidence {:.2})",
            agreeing as usize,
            usable.len(),
            label,
            mean_signed
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{ProviderConfig, SentimentProvider};
    use crate::providers::{ClassifierOutput, ClassifierProvider, GenerativeModelProvider, TextClassifier, TextGenerator};
    use async_trait::async_trait;
    use chrono::Utc;

    struct FailingGenerator;

    #[async_trait]
    impl TextGenerator for FailingGenerator {
        fn model_name(&self) -> &str {
            "failing-llm"
        }

        async fn generate(&self, _prompt: &str) -> anyhow::Result<String> {
            Err(anyhow::anyhow!("timeout after 30s"))
        }
    }

    struct ZeroConfidenceGenerator;

    #[async_trait]
    impl TextGenerator for ZeroConfidenceGenerator {
        fn model_name(&self) -> &str {
            "zero-llm"
        }

        async fn generate(&self, _prompt: &str) -> anyhow::Result<String> {
            Ok(r#"{"sentiment": "bullish", "confidence": 0.0}"#.to_string())
        }
    }

    struct GoodGenerator;

    #[async_trait]
    impl TextGenerator for GoodGenerator {
        fn model_name(&self) -> &str {
            "good-llm"
        }

        async fn generate(&self, _prompt: &str) -> anyhow::Result<String> {
            Ok(r#"{"sentiment": "bearish", "confidence": 0.8, "reasoning": "guidance cut"}"#.to_string())
        }
    }

    struct PositiveClassifier;

    #[async_trait]
    impl TextClassifier for PositiveClassifier {
        fn model_name(&self) -> &str {
            "finbert-mini"
        }

        async fn classify(&self, texts: &[String]) -> anyhow::Result<Vec<ClassifierOutput>> {
            Ok(texts
                .iter()
                .map(|_| ClassifierOutput {
                    label: "positive".to_string(),
                    probability: 0.8,
                })
                .collect())
        }
    }

    struct FailingClassifier;

    #[async_trait]
    impl TextClassifier for FailingClassifier {
        fn model_name(&self) -> &str {
            "failing-classifier"
        }

        async fn classify(&self, _texts: &[String]) -> anyhow::Result<Vec<ClassifierOutput>> {
            Err(anyhow::anyhow!("model not loaded"))
        }
    }

    fn sample_news() -> Vec<NewsItem> {
        vec![
            NewsItem {
                title: "ACME shares surge after earnings beat".to_string(),
                summary: "Revenue growth tops estimates".to_string(),
                source: "Reuters".to_string(),
                published_at: Utc::now(),
                url: "https://example.com/1".to_string(),
            },
            NewsItem {
                title: "Analysts upgrade ACME".to_string(),
                summary: String::new(),
                source: "Bloomberg".to_string(),
                published_at: Utc::now(),
                url: "https://example.com/2".to_string(),
            },
        ]
    }

    async fn chain(registry: ModelRegistry) -> FallbackChain {
        registry.load().await;
        FallbackChain::new(Arc::new(registry))
    }

    #[tokio::test]
    async fn test_empty_news_is_no_data() {
        let chain = chain(ModelRegistry::new().with_generative(Arc::new(
            GenerativeModelProvider::with_generator(Arc::new(GoodGenerator)),
        )))
        .await;
        let verdict = chain.resolve_sentiment("ACME", &[]).await;
        assert_eq!(verdict, SentimentVerdict::no_data());
        assert_eq!(chain.registry().usage(ProviderTier::GenerativeModel).calls, 0);
    }

    #[tokio::test]
    async fn test_generative_tier_wins() {
        let chain = chain(ModelRegistry::new().with_generative(Arc::new(
            GenerativeModelProvider::with_generator(Arc::new(GoodGenerator)),
        )))
        .await;
        let verdict = chain.resolve_sentiment("ACME", &sample_news()).await;
        assert_eq!(verdict.method, ResolutionMethod::GenerativeModel);
        assert_eq!(verdict.label, SentimentLabel::Bearish);
        assert!(!verdict.fallback_used);
        assert_eq!(verdict.model_id, "good-llm");
        assert_eq!(verdict.source_count, 2);
    }

    #[tokio::test]
    async fn test_failed_generative_falls_to_classifier() {
        let chain = chain(
            ModelRegistry::new()
                .with_generative(Arc::new(GenerativeModelProvider::with_generator(Arc::new(FailingGenerator))))
                .with_classifier(Arc::new(ClassifierProvider::with_classifier(Arc::new(PositiveClassifier)))),
        )
        .await;
        let verdict = chain.resolve_sentiment("ACME", &sample_news()).await;
        assert_eq!(verdict.method, ResolutionMethod::Classifier);
        assert_eq!(verdict.label, SentimentLabel::Bullish);
        assert!(verdict.fallback_used);
        assert!((verdict.confidence - 0.8).abs() < 1e-9);

        let usage = chain.registry().usage(ProviderTier::GenerativeModel);
        assert_eq!(usage.calls, 1);
        assert_eq!(usage.failures, 1);
    }

    #[tokio::test]
    async fn test_zero_confidence_falls_through() {
        let chain = chain(ModelRegistry::new().with_generative(Arc::new(
            GenerativeModelProvider::with_generator(Arc::new(ZeroConfidenceGenerator)),
        )))
        .await;
        let verdict = chain.resolve_sentiment("ACME", &sample_news()).await;
        assert_eq!(verdict.method, ResolutionMethod::RuleBasedFinal);
    }

    #[tokio::test]
    async fn test_all_model_tiers_fail_uses_heuristic() {
        let chain = chain(
            ModelRegistry::new()
                .with_generative(Arc::new(GenerativeModelProvider::with_generator(Arc::new(FailingGenerator))))
                .with_classifier(Arc::new(ClassifierProvider::with_classifier(Arc::new(FailingClassifier)))),
        )
        .await;
        let first = chain.resolve_sentiment("ACME", &sample_news()).await;
        let second = chain.resolve_sentiment("ACME", &sample_news()).await;

        assert_eq!(first.method, ResolutionMethod::RuleBasedFinal);
        assert_eq!(first.method.as_str(), "rule_based_final");
        assert!(first.confidence > 0.0);
        assert_eq!(first.label, SentimentLabel::Bullish);
        assert!(first.fallback_used);
        assert_eq!(first.model_id, chain.registry().heuristic().model_id());
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_unloaded_registry_skips_model_tiers() {
        let registry = ModelRegistry::new().with_generative(Arc::new(
            GenerativeModelProvider::with_generator(Arc::new(GoodGenerator)),
        ));
        let chain = FallbackChain::new(Arc::new(registry));
        let verdict = chain.resolve_sentiment("ACME", &sample_news()).await;
        assert_eq!(verdict.method, ResolutionMethod::RuleBasedFinal);
    }

    #[tokio::test]
    async fn test_disabled_classifier_is_skipped() {
        let mut config = ProviderConfig::default();
        config.enabled = false;
        let classifier = ClassifierProvider::new(config, Arc::new(PositiveClassifier));
        assert!(!classifier.is_configured());
        let chain = chain(ModelRegistry::new().with_classifier(Arc::new(classifier))).await;
        let verdict = chain.resolve_sentiment("ACME", &sample_news()).await;
        assert_eq!(verdict.method, ResolutionMethod::RuleBasedFinal);
    }

    #[test]
    fn test_aggregate_judgments() {
        let judgment = |label, confidence| ProviderJudgment {
            label,
            confidence,
            score: None,
            reasoning: String::new(),
        };
        let judgments = vec![
            judgment(SentimentLabel::Bullish, 0.9),
            judgment(SentimentLabel::Bullish, 0.7),
            judgment(SentimentLabel::Bearish, 0.5),
            judgment(SentimentLabel::Neutral, 0.0),
        ];
        let aggregated = aggregate_judgments(&judgments, 0.1).unwrap();
        assert_eq!(aggregated.label, SentimentLabel::Bullish);
        // mean confidence 0.7, two of three agree
        assert!((aggregated.confidence - 0.7 * 2.0 / 3.0).abs() < 1e-9);
        assert!(aggregate_judgments(&[judgment(SentimentLabel::Bullish, 0.0)], 0.1).is_none());
    }

    #[test]
    fn test_build_context_numbers_items() {
        let context = build_context("ACME", &sample_news());
        assert!(context.starts_with("Instrument: ACME"));
        assert!(context.contains("1. [Reuters] ACME shares surge"));
        assert!(context.contains("2. [Bloomberg] Analysts upgrade ACME"));
    }
}
