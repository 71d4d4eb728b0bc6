//! # loom-core
//!
//! A multi-session knowledge integration engine: given knowledge items
//! harvested from independent learning sessions, it discovers relationships
//! between them (overlap, complementarity, temporal drift, conceptual
//! co-occurrence) and synthesizes higher-order knowledge records with
//! confidence/novelty scoring.
//!
//! ## Core Components
//!
//! - **Graph**: typed node/edge knowledge graph rebuilt per run
//! - **Similarity**: multi-factor item similarity with per-run memoization
//! - **Analyzers**: cross-session, temporal evolution, and concept synthesis
//! - **Synthesis**: collaborator-backed synthesis with heuristic fallback
//! - **Store**: append-only monthly batches with aggregate statistics
//!
//! ## Example
//!
//! ```rust,ignore
//! use loom_core::{IntegrationConfig, IntegrationScope, IntegrationStore, KnowledgeIntegrator};
//!
//! let store = IntegrationStore::open("integrations.db")?;
//! let engine = KnowledgeIntegrator::new(IntegrationConfig::default(), store);
//!
//! let records = engine.integrate(&sessions, IntegrationScope::Comprehensive).await?;
//! for record in &records {
//!     println!("{}: {}", record.kind, record.content);
//! }
//! ```

pub mod analyzers;
pub mod config;
pub mod engine;
pub mod error;
pub mod filter;
pub mod graph;
pub mod knowledge;
pub mod similarity;
pub mod store;
pub mod synthesis;

// Re-exports for convenience
pub use analyzers::{
    build_clusters, ConceptAnalyzer, ConceptRelationship, CrossSessionAnalyzer, TemporalAnalyzer,
};
pub use config::IntegrationConfig;
pub use engine::{IntegrationScope, KnowledgeIntegrator};
pub use error::{Error, Result};
pub use graph::{GraphEdge, GraphNode, KnowledgeGraph, NodeIx, RelationKind};
pub use knowledge::{
    ConceptEvolution, ContradictionAnalysis, EvolutionPoint, IntegratedKnowledge, IntegrationKind,
    IntegrationMethod, KnowledgeCluster, KnowledgeId, KnowledgeItem, LearningSession, SessionId,
    TrendDirection, TurningPoint, TurningPointKind,
};
pub use similarity::SimilarityEngine;
pub use store::{IntegrationStats, IntegrationStore};
pub use synthesis::{
    CollaboratorClient, CollaboratorConfig, CollaboratorSynthesis, FallbackSynthesis,
    HeuristicSynthesis, SynthesisOutput, SynthesisStrategy,
};
