// Signal Sink Interface
// Hands fused signals to persistence or notification

use crate::fusion::{FusedSignal, TradeAction};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Trait for signal sink backends
#[async_trait::async_trait]
pub trait SignalSink: Send + Sync {
    /// Publish a fused signal
    async fn publish(&self, signal: &FusedSignal) -> Result<()>;

    /// Sink statistics
    async fn stats(&self) -> Result<SinkStats>;
}

/// Sink statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SinkStats {
    pub total_signals: usize,
    pub signals_by_action: HashMap<String, usize>,
    pub fallback_signals: usize,
}

/// In-memory signal sink (for testing and development)
pub struct InMemorySink {
    signals: tokio::sync::RwLock<Vec<FusedSignal>>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self {
            signals: tokio::sync::RwLock::new(Vec::new()),
        }
    }

    /// All published signals in publish order
    pub async fn signals(&self) -> Vec<FusedSignal> {
        self.signals.read().await.clone()
    }

    pub async fn get_by_symbol(&self, symbol: &str) -> Vec<FusedSignal> {
        let signals = self.signals.read().await;
        signals.iter().filter(|s| s.symbol == symbol).cloned().collect()
    }

    pub async fn get_by_action(&self, action: TradeAction) -> Vec<FusedSignal> {
        let signals = self.signals.read().await;
        signals.iter().filter(|s| s.action == action).cloned().collect()
    }

    pub async fn clear(&self) {
        self.signals.write().await.clear();
    }
}

impl Default for InMemorySink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl SignalSink for InMemorySink {
    async fn publish(&self, signal: &FusedSignal) -> Result<()> {
        let mut signals = self.signals.write().await;
        signals.push(signal.clone());
        Ok(())
    }

    async fn stats(&self) -> Result<SinkStats> {
        let signals = self.signals.read().await;

        let mut signals_by_action = HashMap::new();
        for signal in signals.iter() {
            *signals_by_action.entry(signal.action.to_string()).or_insert(0) += 1;
        }

        Ok(SinkStats {
            total_signals: signals.len(),
            signals_by_action,
            fallback_signals: signals.iter().filter(|s| s.fallback_mode).count(),
        })
    }
}
