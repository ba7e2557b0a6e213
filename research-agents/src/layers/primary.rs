//! Primary layer: one headline verdict over the top-ranked news

use super::{LayerDetail, LayerType, SentimentLayer};
use crate::fallback::FallbackChain;
use common::{FusionError, FusionResult, NewsItem, RankedNewsItem, ResolutionMethod, SentimentVerdict};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrimaryLayerDetail {
    pub reasoning: String,
    pub method: ResolutionMethod,
    pub model_id: String,
    pub articles_considered: usize,
}

pub async fn analyze(
    chain: &FallbackChain,
    symbol: &str,
    ranked: &[RankedNewsItem],
    top_n: usize,
) -> FusionResult<(SentimentLayer, SentimentVerdict)> {
    let selected: Vec<NewsItem> = ranked.iter().take(top_n).map(|r| r.item.clone()).collect();
    let verdict = chain.resolve_sentiment(symbol, &selected).await;

    if !verdict.confidence.is_finite() {
        return Err(FusionError::Computation(format!(
            "non-finite confidence from {}",
            verdict.model_id
        )));
    }

    let mut layer = SentimentLayer::new(LayerType::Primary, verdict.label, verdict.confidence);
    layer.detail = LayerDetail::Primary(PrimaryLayerDetail {
        reasoning: verdict.reasoning.clone(),
        method: verdict.method,
        model_id: verdict.model_id.clone(),
        articles_considered: selected.len(),
    });

    Ok((layer, verdict))
}
