//! Shared data model for the signal fusion workspace
//!
//! Every stage of the pipeline produces one of the typed records defined here:
//! NewsItem -> RankedNewsItem -> SentimentVerdict / SentimentLayer -> FusedSignal.
//! Records are built fresh per analysis run and never mutated afterwards.

pub mod direction;
pub mod error;
pub mod news;
pub mod technical;
pub mod verdict;

pub use direction::{Direction, SentimentLabel};
pub use error::{FusionError, FusionResult};
pub use news::{NewsItem, RankedNewsItem};
pub use technical::TechnicalPrediction;
pub use verdict::{ResolutionMethod, SentimentVerdict};

/// Hard ceiling for any confidence the core emits. Confidence never reaches certainty.
pub const CONFIDENCE_CEILING: f64 = 0.95;

/// Clamp a raw confidence into [0, 1], mapping NaN to zero.
pub fn sanitize_confidence(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Clamp a confidence into [0, CONFIDENCE_CEILING].
pub fn cap_confidence(value: f64) -> f64 {
    sanitize_confidence(value).min(CONFIDENCE_CEILING)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_confidence() {
        assert_eq!(sanitize_confidence(f64::NAN), 0.0);
        assert_eq!(sanitize_confidence(1.7), 1.0);
        assert_eq!(sanitize_confidence(-0.2), 0.0);
        assert_eq!(sanitize_confidence(0.42), 0.42);
    }

    #[test]
    fn test_cap_confidence_never_reaches_certainty() {
        assert_eq!(cap_confidence(1.0), CONFIDENCE_CEILING);
        assert_eq!(cap_confidence(f64::INFINITY), 0.0);
        assert_eq!(cap_confidence(0.5), 0.5);
    }
}
