//! Synthesis strategies for combining two related knowledge items.
//!
//! The cross-session analyzer never branches on collaborator presence itself:
//! it calls [`SynthesisStrategy::synthesize`] on whatever strategy the engine
//! was built with. [`FallbackSynthesis`] composes the collaborator-backed path
//! with the deterministic heuristic so a degraded external dependency never
//! aborts a run — it degrades to best-effort heuristic output with a warning.

mod collaborator;
mod heuristic;

pub use collaborator::{CollaboratorClient, CollaboratorConfig, CollaboratorSynthesis};
pub use heuristic::HeuristicSynthesis;

use async_trait::async_trait;
use std::collections::HashMap;
use tracing::warn;

use crate::error::Result;
use crate::knowledge::{ConceptEvolution, ContradictionAnalysis, IntegrationMethod, KnowledgeItem};

/// Structured output of one synthesis call.
#[derive(Debug, Clone)]
pub struct SynthesisOutput {
    pub content: String,
    pub key_insights: Vec<String>,
    /// Novelty score in [0,1]
    pub novelty_score: f64,
    pub related_concepts: Vec<String>,
    pub contradiction_analysis: ContradictionAnalysis,
    /// Trends the collaborator observed; the heuristic path never infers any.
    pub evolution_trends: Vec<ConceptEvolution>,
    pub quality_metrics: HashMap<String, f64>,
    pub application_domains: Vec<String>,
    pub actionable_insights: Vec<String>,
    pub future_research_directions: Vec<String>,
    /// Which path produced this output
    pub method: IntegrationMethod,
}

/// A strategy for synthesizing two knowledge items into one record body.
#[async_trait]
pub trait SynthesisStrategy: Send + Sync {
    /// Synthesize the two item payloads. An `Err` means this strategy could
    /// not produce usable output (timeout, malformed response); it is not a
    /// run-level failure.
    async fn synthesize(&self, a: &KnowledgeItem, b: &KnowledgeItem) -> Result<SynthesisOutput>;
}

/// Collaborator-backed synthesis with an infallible heuristic fallback.
pub struct FallbackSynthesis {
    primary: Option<Box<dyn SynthesisStrategy>>,
    heuristic: HeuristicSynthesis,
}

impl FallbackSynthesis {
    /// Heuristic-only synthesis, for deployments with no collaborator.
    pub fn heuristic_only() -> Self {
        Self {
            primary: None,
            heuristic: HeuristicSynthesis::new(),
        }
    }

    /// Collaborator-first synthesis that degrades to the heuristic path.
    pub fn with_collaborator(collaborator: CollaboratorSynthesis) -> Self {
        Self {
            primary: Some(Box::new(collaborator)),
            heuristic: HeuristicSynthesis::new(),
        }
    }

    /// Any primary strategy with the heuristic fallback behind it.
    pub fn with_primary(primary: Box<dyn SynthesisStrategy>) -> Self {
        Self {
            primary: Some(primary),
            heuristic: HeuristicSynthesis::new(),
        }
    }
}

#[async_trait]
impl SynthesisStrategy for FallbackSynthesis {
    async fn synthesize(&self, a: &KnowledgeItem, b: &KnowledgeItem) -> Result<SynthesisOutput> {
        if let Some(primary) = &self.primary {
            match primary.synthesize(a, b).await {
                Ok(output) => return Ok(output),
                Err(e) => {
                    warn!("synthesis collaborator degraded, using heuristic fallback: {e}");
                }
            }
        }
        self.heuristic.synthesize(a, b).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::knowledge::KnowledgeItem;

    struct AlwaysFails;

    #[async_trait]
    impl SynthesisStrategy for AlwaysFails {
        async fn synthesize(
            &self,
            _a: &KnowledgeItem,
            _b: &KnowledgeItem,
        ) -> Result<SynthesisOutput> {
            Err(Error::collaborator("simulated outage"))
        }
    }

    #[tokio::test]
    async fn test_fallback_survives_primary_failure() {
        let strategy = FallbackSynthesis::with_primary(Box::new(AlwaysFails));
        let a = KnowledgeItem::new("Transformers use attention").with_keywords(["transformer"]);
        let b = KnowledgeItem::new("Attention enables long context").with_keywords(["transformer"]);

        let output = strategy.synthesize(&a, &b).await.unwrap();

        assert_eq!(output.method, IntegrationMethod::Heuristic);
        assert!(!output.content.is_empty());
        assert!(!output.key_insights.is_empty());
    }

    #[tokio::test]
    async fn test_heuristic_only_never_calls_primary() {
        let strategy = FallbackSynthesis::heuristic_only();
        let a = KnowledgeItem::new("alpha");
        let b = KnowledgeItem::new("beta");

        let output = strategy.synthesize(&a, &b).await.unwrap();
        assert_eq!(output.method, IntegrationMethod::Heuristic);
    }
}
