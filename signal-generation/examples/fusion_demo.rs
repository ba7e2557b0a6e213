//! Example usage of the signal fusion pipeline
//!
//! This example demonstrates:
//! 1. Registering a generative model and a classifier with the model registry
//! 2. Wiring scripted news and technical collaborators into the pipeline
//! 3. Processing a batch of symbols with bounded concurrency
//! 4. Reading layer, confidence, agreement and signal output

use anyhow::Result;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use common::{Direction, NewsItem, TechnicalPrediction};
use research_agents::{
    ClassifierOutput, ClassifierProvider, GenerativeModelProvider, ModelRegistry, ProviderTier,
    TextClassifier, TextGenerator,
};
use rust_decimal::Decimal;
use signal_generation::{FusionConfig, FusionPipeline, InMemorySink, NewsProvider, SignalSink, TechnicalPredictor};
use std::sync::Arc;
use tracing::{info, Level};

/// Generator that goes offline for one symbol so the chain falls through
struct ScriptedGenerator;

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    fn model_name(&self) -> &str {
        "scripted-llm"
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        if prompt.contains("Instrument: INIT") {
            return Err(anyhow::anyhow!("upstream timeout"));
        }
        Ok("Sentiment: BULLISH. Confidence: 78%. Demand remains strong.".to_string())
    }
}

struct KeywordClassifier;

#[async_trait]
impl TextClassifier for KeywordClassifier {
    fn model_name(&self) -> &str {
        "keyword-classifier"
    }

    async fn classify(&self, texts: &[String]) -> Result<Vec<ClassifierOutput>> {
        Ok(texts
            .iter()
            .map(|text| {
                let lower = text.to_lowercase();
                let label = if lower.contains("cut") || lower.contains("lawsuit") {
                    "negative"
                } else {
                    "neutral"
                };
                ClassifierOutput {
                    label: label.to_string(),
                    probability: 0.7,
                }
            })
            .collect())
    }
}

struct DemoNews;

#[async_trait]
impl NewsProvider for DemoNews {
    async fn fetch_news(&self, symbol: &str) -> Result<Vec<NewsItem>> {
        let now = Utc::now();
        let headlines: &[(&str, i64)] = match symbol {
            "ACME" => &[
                ("ACME shares surge after earnings beat", 1),
                ("Analysts upgrade ACME on record high revenue", 5),
                ("ACME expands partnership in Europe", 20),
            ],
            "INIT" => &[
                ("INIT cuts guidance as demand slows", 2),
                ("INIT faces lawsuit over product recall", 6),
            ],
            _ => &[],
        };

        Ok(headlines
            .iter()
            .map(|(title, hours)| NewsItem {
                title: title.to_string(),
                summary: String::new(),
                source: "Reuters".to_string(),
                published_at: now - Duration::hours(*hours),
                url: format!("https://news.example.com/{}/{}", symbol.to_lowercase(), hours),
            })
            .collect())
    }
}

struct DemoTechnical;

#[async_trait]
impl TechnicalPredictor for DemoTechnical {
    async fn predict(&self, symbol: &str) -> Result<TechnicalPrediction> {
        match symbol {
            "ACME" => Ok(TechnicalPrediction {
                current_price: Decimal::new(15230, 2),
                predicted_price: Decimal::new(15810, 2),
                direction: Direction::Up,
                confidence: 0.72,
            }),
            "INIT" => Ok(TechnicalPrediction {
                current_price: Decimal::new(4210, 2),
                predicted_price: Decimal::new(4150, 2),
                direction: Direction::Down,
                confidence: 0.55,
            }),
            _ => Err(anyhow::anyhow!("no price history for {}", symbol)),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    info!("Signal Fusion Pipeline - Example");

    // Step 1: Register providers and load the registry
    let registry = ModelRegistry::new()
        .with_generative(Arc::new(GenerativeModelProvider::with_generator(Arc::new(ScriptedGenerator))))
        .with_classifier(Arc::new(ClassifierProvider::with_classifier(Arc::new(KeywordClassifier))));
    registry.load().await;
    let registry = Arc::new(registry);

    // Step 2: Build the pipeline
    let sink = Arc::new(InMemorySink::new());
    let pipeline = Arc::new(
        FusionPipeline::new(
            FusionConfig::default(),
            Arc::clone(&registry),
            Arc::new(DemoNews),
            Arc::new(DemoTechnical),
        )?
        .with_sink(sink.clone()),
    );

    // Step 3: Process a batch
    let symbols: Vec<String> = ["ACME", "INIT", "ZETA"].iter().map(|s| s.to_string()).collect();
    let reports = pipeline.process_batch(&symbols).await;

    // Step 4: Print results
    for report in &reports {
        println!("\n=== {} ===", report.symbol);
        for layer in &report.analysis.layers {
            println!(
                "  {:?} layer: {} ({:.2}){}",
                layer.layer_type,
                layer.sentiment,
                layer.confidence,
                layer.error.as_deref().map(|e| format!(" error: {}", e)).unwrap_or_default()
            );
        }
        println!(
            "  Verdict: {} via {} (confidence {:.2})",
            report.verdict.label,
            report.verdict.method.as_str(),
            report.verdict.confidence
        );
        println!(
            "  Agreement: {:?} ({}/{} comparisons)",
            report.agreement.status, report.agreement.agreements, report.agreement.comparisons
        );
        println!(
            "  Signal: {} {} confidence {:.2}{}",
            report.signal.action,
            report.signal.direction,
            report.signal.confidence,
            if report.signal.fallback_mode { " [fallback]" } else { "" }
        );
        println!("  Reasoning: {}", report.signal.reasoning);
    }

    let stats = sink.stats().await?;
    println!("\nPublished {} signals ({} in fallback mode)", stats.total_signals, stats.fallback_signals);

    for tier in [ProviderTier::GenerativeModel, ProviderTier::Classifier, ProviderTier::KeywordHeuristic] {
        let usage = registry.usage(tier);
        println!("{:?}: {} calls, {} failures", tier, usage.calls, usage.failures);
    }

    Ok(())
}
