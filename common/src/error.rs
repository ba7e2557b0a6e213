use thiserror::Error;

/// Errors raised inside the fusion core.
///
/// None of these escape the public operations: each stage converts them into
/// its floor value (neutral / zero confidence) at a single point.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FusionError {
    #[error("Provider unavailable: {provider}")]
    ProviderUnavailable { provider: String },

    #[error("Provider {provider} failed: {message}")]
    ProviderFailed { provider: String, message: String },

    #[error("Provider {provider} returned an empty judgment")]
    EmptyResponse { provider: String },

    #[error("Malformed response from {provider}: {message}")]
    MalformedResponse { provider: String, message: String },

    #[error("No data available for {symbol}")]
    NoData { symbol: String },

    #[error("Computation error: {0}")]
    Computation(String),

    #[error("Invalid fusion weights: technical={technical}, sentiment={sentiment}")]
    InvalidWeights { technical: f64, sentiment: f64 },

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for fusion operations
pub type FusionResult<T> = Result<T, FusionError>;

impl FusionError {
    /// Errors that should push the fallback chain to the next tier.
    ///
    /// Every provider-side error qualifies; only configuration mistakes do not.
    pub fn triggers_fallback(&self) -> bool {
        !matches!(self, FusionError::Config(_) | FusionError::InvalidWeights { .. })
    }

    pub fn provider_failed<P: Into<String>, M: Into<String>>(provider: P, message: M) -> Self {
        FusionError::ProviderFailed {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn malformed<P: Into<String>, M: Into<String>>(provider: P, message: M) -> Self {
        FusionError::MalformedResponse {
            provider: provider.into(),
            message: message.into(),
        }
    }
}
