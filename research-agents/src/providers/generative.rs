//! Large generative model provider
//!
//! Wraps any [`TextGenerator`] (hosted LLM, local model server, ...) and turns its
//! free-form answer into a [`ProviderJudgment`]. The model is asked for JSON, but
//! answers in plain prose are parsed too.

use crate::provider::{ProviderConfig, ProviderJudgment, ProviderTier, SentimentProvider};
use async_trait::async_trait;
use common::{sanitize_confidence, FusionError, SentimentLabel};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

/// Confidence assumed when the model names a label but no confidence
const DEFAULT_CONFIDENCE: f64 = 0.5;
const MAX_REASONING_CHARS: usize = 280;

lazy_static! {
    static ref JSON_OBJECT: Regex = Regex::new(r"(?s)\{.*\}").expect("valid json pattern");
    static ref LABEL_PATTERN: Regex =
        Regex::new(r"(?i)\b(bullish|bearish|neutral|positive|negative)\b").expect("valid label pattern");
    static ref CONFIDENCE_PATTERN: Regex =
        Regex::new(r"(?i)confidence\W{0,3}(\d{1,3}(?:\.\d+)?)\s*(%)?").expect("valid confidence pattern");
}

/// Raw text generation capability supplied by the caller
#[async_trait]
pub trait TextGenerator: Send + Sync {
    fn model_name(&self) -> &str;

    async fn generate(&self, prompt: &str) -> anyhow::Result<String>;
}

#[derive(Debug, Deserialize)]
struct StructuredAnswer {
    #[serde(alias = "label", alias = "direction")]
    sentiment: String,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    score: Option<f64>,
    #[serde(default, alias = "rationale", alias = "reason")]
    reasoning: String,
}

pub struct GenerativeModelProvider {
    config: ProviderConfig,
    generator: Arc<dyn TextGenerator>,
}

impl GenerativeModelProvider {
    pub fn new(config: ProviderConfig, generator: Arc<dyn TextGenerator>) -> Self {
        Self { config, generator }
    }

    pub fn with_generator(generator: Arc<dyn TextGenerator>) -> Self {
        Self::new(
            ProviderConfig {
                provider_id: "generative-model".to_string(),
                name: "Generative Model".to_string(),
                enabled: true,
                max_batch_size: 1,
            },
            generator,
        )
    }

    fn build_prompt(&self, text: &str) -> String {
        format!(
            "You are a financial news analyst. Judge the overall market sentiment of the \
             following news for the instrument named in it.\n\
             Answer with a JSON object: {{\"sentiment\": \"bullish|bearish|neutral\", \
             \"confidence\": 0.0-1.0, \"score\": -1.0-1.0, \"reasoning\": \"one sentence\"}}.\n\n\
             {}",
            text
        )
    }
}

/// Accept both fractions and percentages
fn normalize_confidence(value: f64) -> f64 {
    if value > 1.0 && value <= 100.0 {
        value / 100.0
    } else {
        sanitize_confidence(value)
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Parse a generative model answer into a judgment
pub fn parse_response(provider: &str, response: &str) -> Result<ProviderJudgment, FusionError> {
    let response = response.trim();
    if response.is_empty() {
        return Err(FusionError::EmptyResponse {
            provider: provider.to_string(),
        });
    }

    if let Some(object) = JSON_OBJECT.find(response) {
        if let Ok(answer) = serde_json::from_str::<StructuredAnswer>(object.as_str()) {
            return Ok(ProviderJudgment {
                label: SentimentLabel::parse(&answer.sentiment),
                confidence: answer
                    .confidence
                    .map(normalize_confidence)
                    .unwrap_or(DEFAULT_CONFIDENCE),
                score: answer.score.filter(|s| s.is_finite()).map(|s| s.clamp(-1.0, 1.0)),
                reasoning: truncate_chars(&answer.reasoning, MAX_REASONING_CHARS),
            });
        }
        debug!(provider, "Embedded JSON did not match the answer schema, parsing prose");
    }

    let label = LABEL_PATTERN
        .captures(response)
        .and_then(|c| c.get(1))
        .map(|m| SentimentLabel::parse(m.as_str()))
        .ok_or_else(|| FusionError::malformed(provider, "no sentiment label in answer"))?;

    let confidence = CONFIDENCE_PATTERN
        .captures(response)
        .and_then(|c| {
            let value: f64 = c.get(1)?.as_str().parse().ok()?;
            Some(if c.get(2).is_some() { value / 100.0 } else { value })
        })
        .map(normalize_confidence)
        .unwrap_or(DEFAULT_CONFIDENCE);

    Ok(ProviderJudgment {
        label,
        confidence,
        score: None,
        reasoning: truncate_chars(response, MAX_REASONING_CHARS),
    })
}

#[async_trait]
impl SentimentProvider for GenerativeModelProvider {
    fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn tier(&self) -> ProviderTier {
        ProviderTier::GenerativeModel
    }

    fn model_id(&self) -> String {
        self.generator.model_name().to_string()
    }

    async fn invoke(&self, text: &str) -> Result<ProviderJudgment, FusionError> {
        if !self.is_configured() {
            return Err(FusionError::ProviderUnavailable {
                provider: self.config.provider_id.clone(),
            });
        }

        let prompt = self.build_prompt(text);
        let response = self
            .generator
            .generate(&prompt)
            .await
            .map_err(|e| FusionError::provider_failed(&self.config.provider_id, e.to_string()))?;

        parse_response(&self.config.provider_id, &response)
    }

    async fn health_check(&self) -> Result<(), FusionError> {
        if self.generator.model_name().is_empty() {
            return Err(FusionError::ProviderUnavailable {
                provider: self.config.provider_id.clone(),
            });
        }
        Ok(())
    }
}
