//! Fusion pipeline configuration

use crate::fusion::FusionWeights;
use common::FusionResult;
use research_agents::AnalyzerConfig;
use serde::{Deserialize, Serialize};

/// Overall fusion configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FusionConfig {
    /// Technical vs sentiment weighting
    #[serde(default)]
    pub weights: FusionWeights,

    /// Multi-layer analyzer settings
    #[serde(default)]
    pub analyzer: AnalyzerConfig,

    /// Batch execution settings
    #[serde(default)]
    pub pipeline: PipelineSettings,
}

impl FusionConfig {
    pub fn validate(&self) -> FusionResult<()> {
        self.weights.validate()?;
        self.analyzer.validate()?;
        if self.pipeline.max_concurrent_symbols == 0 {
            return Err(common::FusionError::Config(
                "max_concurrent_symbols must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSettings {
    /// Symbols analysed at once by a batch run
    #[serde(default = "default_max_concurrent_symbols")]
    pub max_concurrent_symbols: usize,

    /// Enable/disable signal generation
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            max_concurrent_symbols: default_max_concurrent_symbols(),
            enabled: default_enabled(),
        }
    }
}

fn default_max_concurrent_symbols() -> usize {
    2
}

fn default_enabled() -> bool {
    true
}

/// Load configuration from TOML file
pub fn load_config(path: &str) -> anyhow::Result<FusionConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: FusionConfig = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

/// Save configuration to TOML file
pub fn save_config(config: &FusionConfig, path: &str) -> anyhow::Result<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Create a default configuration file template
pub fn create_config_template(path: &str) -> anyhow::Result<()> {
    let template = "# Signal Fusion Configuration

[weights]
# Technical weight, 0.6 to 0.7
technical = 0.65
# Sentiment weight, 0.3 to 0.4; both must sum to 1
sentiment = 0.35

[analyzer]
# Ranked articles sent to the fallback chain
primary_top_n = 8
# Ranked articles scored one by one
article_top_m = 12
# Freshness decay per hour of age
decay_lambda = 0.5
# Newer-vs-older half difference that counts as a trend
trend_threshold = 0.15
# Dead band around zero for neutral labels
label_threshold = 0.1

[pipeline]
max_concurrent_symbols = 2
enabled = true
";

    std::fs::write(path, template)?;
    Ok(())
}
