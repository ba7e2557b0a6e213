//! Sentiment provider trait and core provider types
//!
//! All sentiment model providers implement [`SentimentProvider`] so the fallback
//! chain can try them interchangeably.

use async_trait::async_trait;
use common::{FusionError, SentimentLabel};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Base configuration for any provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub provider_id: String,
    pub name: String,
    pub enabled: bool,
    pub max_batch_size: usize,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider_id: Uuid::new_v4().to_string(),
            name: "UnnamedProvider".to_string(),
            enabled: true,
            max_batch_size: 16,
        }
    }
}

/// Position of a provider in the fallback chain, highest quality first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderTier {
    GenerativeModel,
    Classifier,
    KeywordHeuristic,
}

/// Availability of a provider after the registry has loaded it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProviderStatus {
    Available,
    Unavailable,
    Disabled,
}

/// Raw judgment returned by one provider call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderJudgment {
    pub label: SentimentLabel,
    pub confidence: f64,    // 0.0 to 1.0
    pub score: Option<f64>, // -1.0 to 1.0
    pub reasoning: String,
}

impl ProviderJudgment {
    /// Signed strength: label sign x confidence
    pub fn signed_strength(&self) -> f64 {
        self.label.sign() * self.confidence
    }

    /// A judgment with zero confidence carries no information.
    pub fn is_empty(&self) -> bool {
        !self.confidence.is_finite() || self.confidence <= 0.0
    }
}

/// Trait every sentiment model provider implements
#[async_trait]
pub trait SentimentProvider: Send + Sync {
    /// Get the provider's configuration
    fn config(&self) -> &ProviderConfig;

    /// Chain tier this provider serves
    fn tier(&self) -> ProviderTier;

    /// Identifier of the underlying model, reported in verdicts
    fn model_id(&self) -> String;

    /// Whether the provider has everything it needs to be called
    fn is_configured(&self) -> bool {
        self.config().enabled
    }

    /// Judge one text
    async fn invoke(&self, text: &str) -> Result<ProviderJudgment, FusionError>;

    /// Judge several texts (one per article)
    ///
    /// Default implementation calls invoke for each text.
    async fn invoke_batch(&self, texts: &[String]) -> Result<Vec<ProviderJudgment>, FusionError> {
        let mut judgments = Vec::with_capacity(texts.len());
        for text in texts {
            judgments.push(self.invoke(text).await?);
        }
        Ok(judgments)
    }

    /// Called once by the registry when it loads
    async fn health_check(&self) -> Result<(), FusionError> {
        Ok(())
    }
}
