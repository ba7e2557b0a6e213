// Signal Fusion Framework (Layer 2)
// Combines layered sentiment evidence with technical estimates into trade signals

pub mod agreement;
pub mod confidence;
pub mod config;
pub mod fusion;
pub mod pipeline;
pub mod sink;

pub use agreement::{score_agreement, AgreementResult, AgreementStatus};
pub use confidence::{
    compose_confidence, evaluate_consistency, ConfidenceLevel, ConfidenceMetrics, ConsistencyLevel,
    EntryStrength, LayerConsistency,
};
pub use config::{create_config_template, load_config, save_config, FusionConfig, PipelineSettings};
pub use fusion::{classify_action, fuse, FusedSignal, FusionMethod, FusionWeights, SignalComponents, TradeAction};
pub use pipeline::{consolidate_verdict, FusionPipeline, NewsProvider, SymbolReport, TechnicalPredictor};
pub use sink::{InMemorySink, SignalSink, SinkStats};
