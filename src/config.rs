//! Configuration for the knowledge integration engine.

use serde::{Deserialize, Serialize};

/// Tunable policy for one integration engine instance.
///
/// The complementarity and concept-relation constants started life as ad hoc
/// thresholds; they are exposed here as configuration rather than hard-coded
/// so deployments can tune them against their own session corpora.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrationConfig {
    /// Minimum number of sessions required before integration runs at all.
    /// Below this the pipeline returns an empty result, not an error.
    pub min_sessions_for_integration: usize,
    /// Minimum item-pair similarity that counts as a cross-session overlap
    pub similarity_threshold: f64,
    /// Minimum confidence a candidate needs to survive the quality gate
    pub confidence_threshold: f64,
    /// Cap on the number of records returned per run
    pub max_integration_scope: usize,
    /// Whether the temporal evolution analyzer runs
    pub enable_temporal_analysis: bool,
    /// Whether contradiction fields from the collaborator are carried into records
    pub enable_contradiction_detection: bool,
    /// Whether trend direction classification is attached to temporal records
    pub enable_trend_prediction: bool,
    /// Two sessions are complementary when their category overlap is below
    /// this fraction of the smaller category set
    pub complementary_overlap_ratio: f64,
    /// ...and their category union exceeds this multiple of the smaller set
    pub complementary_union_ratio: f64,
    /// Minimum co-occurrence strength for a concept relationship record
    pub concept_relation_threshold: f64,
    /// Minimum relationship strength for cluster membership
    pub cluster_strength_threshold: f64,
    /// Fixed confidence assigned to temporal evolution records
    pub prediction_confidence: f64,
}

impl Default for IntegrationConfig {
    fn default() -> Self {
        Self {
            min_sessions_for_integration: 2,
            similarity_threshold: 0.6,
            confidence_threshold: 0.7,
            max_integration_scope: 10,
            enable_temporal_analysis: true,
            enable_contradiction_detection: true,
            enable_trend_prediction: true,
            complementary_overlap_ratio: 0.5,
            complementary_union_ratio: 1.2,
            concept_relation_threshold: 0.6,
            cluster_strength_threshold: 0.6,
            prediction_confidence: 0.7,
        }
    }
}

impl IntegrationConfig {
    /// Strict configuration: higher bars everywhere, fewer records out.
    pub fn strict() -> Self {
        Self {
            similarity_threshold: 0.75,
            confidence_threshold: 0.8,
            max_integration_scope: 5,
            concept_relation_threshold: 0.75,
            ..Self::default()
        }
    }

    /// Permissive configuration: surfaces weaker relationships for review.
    pub fn permissive() -> Self {
        Self {
            similarity_threshold: 0.4,
            confidence_threshold: 0.5,
            max_integration_scope: 25,
            concept_relation_threshold: 0.4,
            cluster_strength_threshold: 0.4,
            ..Self::default()
        }
    }

    pub fn with_similarity_threshold(mut self, threshold: f64) -> Self {
        self.similarity_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    pub fn with_confidence_threshold(mut self, threshold: f64) -> Self {
        self.confidence_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    pub fn with_max_integration_scope(mut self, cap: usize) -> Self {
        self.max_integration_scope = cap;
        self
    }

    pub fn with_min_sessions(mut self, min: usize) -> Self {
        self.min_sessions_for_integration = min;
        self
    }

    pub fn with_temporal_analysis(mut self, enabled: bool) -> Self {
        self.enable_temporal_analysis = enabled;
        self
    }

    pub fn with_contradiction_detection(mut self, enabled: bool) -> Self {
        self.enable_contradiction_detection = enabled;
        self
    }
}
