//! The integration pipeline entry point.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::analyzers::{build_clusters, ConceptAnalyzer, CrossSessionAnalyzer, TemporalAnalyzer};
use crate::config::IntegrationConfig;
use crate::error::Result;
use crate::filter;
use crate::graph::KnowledgeGraph;
use crate::knowledge::{IntegratedKnowledge, KnowledgeCluster, LearningSession};
use crate::similarity::SimilarityEngine;
use crate::store::IntegrationStore;
use crate::synthesis::{FallbackSynthesis, SynthesisStrategy};

/// How wide one integration run casts its net.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrationScope {
    /// Cross-session analysis only
    Basic,
    /// All analyzers
    Comprehensive,
    /// All analyzers (reserved for future widening)
    Advanced,
}

/// Multi-session knowledge integration engine.
///
/// One instance owns its store, configuration, and synthesis strategy. The
/// knowledge graph and the similarity memoization cache are scoped to a
/// single run; concurrent runs must each use their own engine instance.
pub struct KnowledgeIntegrator {
    config: IntegrationConfig,
    store: IntegrationStore,
    synthesis: Box<dyn SynthesisStrategy>,
}

impl KnowledgeIntegrator {
    /// Engine with heuristic-only synthesis.
    pub fn new(config: IntegrationConfig, store: IntegrationStore) -> Self {
        Self {
            config,
            store,
            synthesis: Box::new(FallbackSynthesis::heuristic_only()),
        }
    }

    /// Engine with a caller-supplied synthesis strategy (typically
    /// [`FallbackSynthesis::with_collaborator`]).
    pub fn with_synthesis(
        config: IntegrationConfig,
        store: IntegrationStore,
        synthesis: Box<dyn SynthesisStrategy>,
    ) -> Self {
        Self {
            config,
            store,
            synthesis,
        }
    }

    pub fn config(&self) -> &IntegrationConfig {
        &self.config
    }

    pub fn store(&self) -> &IntegrationStore {
        &self.store
    }

    /// Run one integration over a fixed batch of sessions.
    ///
    /// Fewer sessions than the configured minimum is an expected steady-state
    /// case, not an error: the run returns an empty list. A persistence
    /// failure is the only hard failure.
    pub async fn integrate(
        &self,
        sessions: &[LearningSession],
        scope: IntegrationScope,
    ) -> Result<Vec<IntegratedKnowledge>> {
        if sessions.len() < self.config.min_sessions_for_integration {
            info!(
                "skipping integration: {} session(s) supplied, {} required",
                sessions.len(),
                self.config.min_sessions_for_integration
            );
            return Ok(Vec::new());
        }

        info!(
            "integration run over {} sessions (scope {:?})",
            sessions.len(),
            scope
        );

        // The graph flattens entity co-occurrence; the analyzers also need
        // per-occurrence category and keyword context, so they read the
        // session batch directly. The graph itself is surfaced to callers
        // through [`Self::graph`].
        let graph = KnowledgeGraph::build(sessions);
        debug!(
            "knowledge graph: {} nodes, {} edges",
            graph.node_count(),
            graph.edge_count()
        );

        let mut similarity = SimilarityEngine::new();
        let mut candidates = CrossSessionAnalyzer::new(&self.config)
            .analyze(sessions, &mut similarity, self.synthesis.as_ref())
            .await;

        if scope != IntegrationScope::Basic {
            candidates.extend(TemporalAnalyzer::new(&self.config).analyze(sessions));
            candidates.extend(ConceptAnalyzer::new(&self.config).analyze(sessions));
        }

        let results = filter::apply(&self.config, candidates);
        self.store.append(&results)?;

        info!("integration run produced {} record(s)", results.len());
        Ok(results)
    }

    /// Co-occurrence graph over a session batch.
    ///
    /// Same construction the integration run uses; callers get item and
    /// entity nodes plus per-session co-occurrence edges with strength
    /// counts for their own traversals.
    pub fn graph(&self, sessions: &[LearningSession]) -> KnowledgeGraph {
        KnowledgeGraph::build(sessions)
    }

    /// Read-side theme clusters over the batch's strong concept relationships.
    pub fn clusters(&self, sessions: &[LearningSession]) -> Vec<KnowledgeCluster> {
        let relationships = ConceptAnalyzer::new(&self.config).relationships(sessions);
        build_clusters(&relationships, self.config.cluster_strength_threshold)
    }
}
