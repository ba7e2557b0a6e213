//! Lightweight per-article classifier provider
//!
//! Wraps a [`TextClassifier`] (FinBERT-style three-way model) and splits large
//! batches into chunks of `max_batch_size`, scoring the chunks concurrently.

use crate::provider::{ProviderConfig, ProviderJudgment, ProviderTier, SentimentProvider};
use async_trait::async_trait;
use common::{sanitize_confidence, FusionError, SentimentLabel};
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One classifier prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierOutput {
    pub label: String,
    pub probability: f64,
}

/// Batch text classification capability supplied by the caller
#[async_trait]
pub trait TextClassifier: Send + Sync {
    fn model_name(&self) -> &str;

    /// Returns exactly one output per input text, in input order.
    async fn classify(&self, texts: &[String]) -> anyhow::Result<Vec<ClassifierOutput>>;
}

pub struct ClassifierProvider {
    config: ProviderConfig,
    classifier: Arc<dyn TextClassifier>,
}

impl ClassifierProvider {
    pub fn new(config: ProviderConfig, classifier: Arc<dyn TextClassifier>) -> Self {
        Self { config, classifier }
    }

    pub fn with_classifier(classifier: Arc<dyn TextClassifier>) -> Self {
        Self::new(
            ProviderConfig {
                provider_id: "article-classifier".to_string(),
                name: "Article Classifier".to_string(),
                enabled: true,
                max_batch_size: 16,
            },
            classifier,
        )
    }

    fn to_judgment(output: &ClassifierOutput) -> ProviderJudgment {
        let label = SentimentLabel::parse(&output.label);
        let confidence = sanitize_confidence(output.probability);
        ProviderJudgment {
            label,
            confidence,
            score: Some(label.sign() * confidence),
            reasoning: format!("classifier: {} ({:.2})", output.label, confidence),
        }
    }

    async fn classify_chunk(&self, chunk: &[String]) -> Result<Vec<ProviderJudgment>, FusionError> {
        let outputs = self
            .classifier
            .classify(chunk)
            .await
            .map_err(|e| FusionError::provider_failed(&self.config.provider_id, e.to_string()))?;

        if outputs.len() != chunk.len() {
            return Err(FusionError::malformed(
                &self.config.provider_id,
                format!("expected {} predictions, got {}", chunk.len(), outputs.len()),
            ));
        }

        Ok(outputs.iter().map(Self::to_judgment).collect())
    }
}

#[async_trait]
impl SentimentProvider for ClassifierProvider {
    fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn tier(&self) -> ProviderTier {
        ProviderTier::Classifier
    }

    fn model_id(&self) -> String {
        self.classifier.model_name().to_string()
    }

    async fn invoke(&self, text: &str) -> Result<ProviderJudgment, FusionError> {
        let mut judgments = self.invoke_batch(&[text.to_string()]).await?;
        judgments.pop().ok_or_else(|| FusionError::EmptyResponse {
            provider: self.config.provider_id.clone(),
        })
    }

    async fn invoke_batch(&self, texts: &[String]) -> Result<Vec<ProviderJudgment>, FusionError> {
        if !self.is_configured() {
            return Err(FusionError::ProviderUnavailable {
                provider: self.config.provider_id.clone(),
            });
        }
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let chunk_size = self.config.max_batch_size.max(1);
        let chunks = try_join_all(texts.chunks(chunk_size).map(|c| self.classify_chunk(c))).await?;
        Ok(chunks.into_iter().flatten().collect())
    }
}
