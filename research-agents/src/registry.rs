//! Model registry
//!
//! Holds the sentiment providers a caller wants to use, in chain order, and
//! tracks whether they have been loaded. The registry is created by the caller
//! and injected into the fallback chain; it is the only state shared between
//! concurrently analysed symbols.

use crate::provider::{ProviderStatus, ProviderTier, SentimentProvider};
use crate::providers::KeywordHeuristicProvider;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// Per-tier call accounting. Tracked only, never enforced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderUsage {
    pub calls: u64,
    pub failures: u64,
    pub total_latency_ms: u64,
}

pub struct ModelRegistry {
    generative: Option<Arc<dyn SentimentProvider>>,
    classifier: Option<Arc<dyn SentimentProvider>>,
    heuristic: KeywordHeuristicProvider,
    statuses: DashMap<ProviderTier, ProviderStatus>,
    usage: DashMap<ProviderTier, ProviderUsage>,
    loaded: AtomicBool,
}

impl ModelRegistry {
    /// Registry with only the keyword heuristic
    pub fn new() -> Self {
        Self {
            generative: None,
            classifier: None,
            heuristic: KeywordHeuristicProvider::default(),
            statuses: DashMap::new(),
            usage: DashMap::new(),
            loaded: AtomicBool::new(false),
        }
    }

    /// Set the generative model provider
    pub fn with_generative(mut self, provider: Arc<dyn SentimentProvider>) -> Self {
        self.generative = Some(provider);
        self
    }

    /// Set the classifier provider
    pub fn with_classifier(mut self, provider: Arc<dyn SentimentProvider>) -> Self {
        self.classifier = Some(provider);
        self
    }

    /// Set the heuristic's label threshold
    pub fn with_label_threshold(mut self, threshold: f64) -> Self {
        self.heuristic = KeywordHeuristicProvider::new(threshold);
        self
    }

    /// Health-check every registered provider and mark the registry loaded.
    ///
    /// A provider that fails its check stays registered but is skipped by the chain.
    pub async fn load(&self) {
        for (tier, provider) in [
            (ProviderTier::GenerativeModel, &self.generative),
            (ProviderTier::Classifier, &self.classifier),
        ] {
            let status = match provider {
                None => ProviderStatus::Disabled,
                Some(p) if !p.is_configured() => ProviderStatus::Disabled,
                Some(p) => match p.health_check().await {
                    Ok(()) => ProviderStatus::Available,
                    Err(e) => {
                        warn!(tier = ?tier, error = %e, "Provider failed health check");
                        ProviderStatus::Unavailable
                    }
                },
            };
            self.statuses.insert(tier, status);
        }
        self.statuses
            .insert(ProviderTier::KeywordHeuristic, ProviderStatus::Available);
        self.loaded.store(true, Ordering::SeqCst);

        info!(
            generative = ?self.status(ProviderTier::GenerativeModel),
            classifier = ?self.status(ProviderTier::Classifier),
            "Model registry loaded"
        );
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::SeqCst)
    }

    /// Status of a tier; model tiers are unavailable until the registry is loaded.
    pub fn status(&self, tier: ProviderTier) -> ProviderStatus {
        if tier == ProviderTier::KeywordHeuristic {
            return ProviderStatus::Available;
        }
        if !self.is_loaded() {
            return ProviderStatus::Unavailable;
        }
        self.statuses
            .get(&tier)
            .map(|s| *s.value())
            .unwrap_or(ProviderStatus::Disabled)
    }

    /// Provider for a model tier, if registered and available
    pub fn provider(&self, tier: ProviderTier) -> Option<Arc<dyn SentimentProvider>> {
        if self.status(tier) != ProviderStatus::Available {
            return None;
        }
        match tier {
            ProviderTier::GenerativeModel => self.generative.clone(),
            ProviderTier::Classifier => self.classifier.clone(),
            ProviderTier::KeywordHeuristic => None,
        }
    }

    pub fn heuristic(&self) -> &KeywordHeuristicProvider {
        &self.heuristic
    }

    /// Record one provider call
    pub fn record_call(&self, tier: ProviderTier, latency_ms: u64, failed: bool) {
        let mut usage = self.usage.entry(tier).or_default();
        usage.calls += 1;
        usage.total_latency_ms += latency_ms;
        if failed {
            usage.failures += 1;
        }
    }

    pub fn usage(&self, tier: ProviderTier) -> ProviderUsage {
        self.usage
            .get(&tier)
            .map(|u| u.value().clone())
            .unwrap_or_default()
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{ProviderConfig, ProviderJudgment};
    use async_trait::async_trait;
    use common::FusionError;

    struct BrokenProvider {
        config: ProviderConfig,
    }

    #[async_trait]
    impl SentimentProvider for BrokenProvider {
        fn config(&self) -> &ProviderConfig {
            &self.config
        }

        fn tier(&self) -> ProviderTier {
            ProviderTier::GenerativeModel
        }

        fn model_id(&self) -> String {
            "broken".to_string()
        }

        async fn invoke(&self, _text: &str) -> Result<ProviderJudgment, FusionError> {
            Err(FusionError::provider_failed("broken", "offline"))
        }

        async fn health_check(&self) -> Result<(), FusionError> {
            Err(FusionError::ProviderUnavailable {
                provider: "broken".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_lifecycle() {
        let registry = ModelRegistry::new().with_generative(Arc::new(BrokenProvider {
            config: ProviderConfig::default(),
        }));
        assert!(!registry.is_loaded());
        assert_eq!(
            registry.status(ProviderTier::GenerativeModel),
            ProviderStatus::Unavailable
        );
        assert_eq!(
            registry.status(ProviderTier::KeywordHeuristic),
            ProviderStatus::Available
        );

        registry.load().await;
        assert!(registry.is_loaded());
        assert_eq!(
            registry.status(ProviderTier::GenerativeModel),
            ProviderStatus::Unavailable
        );
        assert_eq!(
            registry.status(ProviderTier::Classifier),
            ProviderStatus::Disabled
        );
        assert!(registry.provider(ProviderTier::GenerativeModel).is_none());
    }

    #[test]
    fn test_usage_tracking() {
        let registry = ModelRegistry::new();
        registry.record_call(ProviderTier::Classifier, 12, false);
        registry.record_call(ProviderTier::Classifier, 8, true);
        let usage = registry.usage(ProviderTier::Classifier);
        assert_eq!(usage.calls, 2);
        assert_eq!(usage.failures, 1);
        assert_eq!(usage.total_latency_ms, 20);
        assert_eq!(registry.usage(ProviderTier::GenerativeModel).calls, 0);
    }
}
