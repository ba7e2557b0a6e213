//! Multi-layer analyzer configuration

use common::{FusionError, FusionResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Ranked items sent to the fallback chain by the primary layer
    #[serde(default = "default_primary_top_n")]
    pub primary_top_n: usize,

    /// Ranked items scored individually by the article layer
    #[serde(default = "default_article_top_m")]
    pub article_top_m: usize,

    /// Exponential decay rate per hour of article age
    #[serde(default = "default_decay_lambda")]
    pub decay_lambda: f64,

    /// Newer-vs-older half difference that counts as a trend
    #[serde(default = "default_trend_threshold")]
    pub trend_threshold: f64,

    /// Dead band around zero inside which a score is neutral
    #[serde(default = "default_label_threshold")]
    pub label_threshold: f64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            primary_top_n: default_primary_top_n(),
            article_top_m: default_article_top_m(),
            decay_lambda: default_decay_lambda(),
            trend_threshold: default_trend_threshold(),
            label_threshold: default_label_threshold(),
        }
    }
}

impl AnalyzerConfig {
    /// Both selections take at least one item and decay must be strictly positive
    pub fn validate(&self) -> FusionResult<()> {
        if self.primary_top_n == 0 || self.article_top_m == 0 {
            return Err(FusionError::Config(format!(
                "primary_top_n and article_top_m must be at least 1 (got {} and {})",
                self.primary_top_n, self.article_top_m
            )));
        }
        if !(self.decay_lambda.is_finite() && self.decay_lambda > 0.0) {
            return Err(FusionError::Config(format!(
                "decay_lambda must be positive, got {}",
                self.decay_lambda
            )));
        }
        Ok(())
    }
}

fn default_primary_top_n() -> usize {
    8
}

fn default_article_top_m() -> usize {
    12
}

fn default_decay_lambda() -> f64 {
    0.5
}

fn default_trend_threshold() -> f64 {
    0.15
}

fn default_label_threshold() -> f64 {
    0.1
}
