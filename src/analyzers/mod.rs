//! Candidate analyzers for one integration run.
//!
//! The three analyzers run independently over the same session batch and
//! each emit candidate [`IntegratedKnowledge`](crate::knowledge::IntegratedKnowledge)
//! records; the quality filter merges and ranks their output.

mod concept;
mod cross_session;
mod temporal;

pub use concept::{build_clusters, ConceptAnalyzer, ConceptRelationship};
pub use cross_session::CrossSessionAnalyzer;
pub use temporal::TemporalAnalyzer;
