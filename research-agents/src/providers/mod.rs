//! Sentiment provider implementations, one per fallback tier

pub mod classifier;
pub mod generative;
pub mod heuristic;

pub use classifier::{ClassifierOutput, ClassifierProvider, TextClassifier};
pub use generative::{parse_response, GenerativeModelProvider, TextGenerator};
pub use heuristic::KeywordHeuristicProvider;
