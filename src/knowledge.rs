//! Core data model for knowledge items, sessions, and integrated records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use uuid::Uuid;

/// Unique identifier for a learning session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Generate a new random session ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse from string.
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a knowledge item or an integrated record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct KnowledgeId(pub Uuid);

impl KnowledgeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for KnowledgeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for KnowledgeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One atomic fact or insight harvested from a learning session.
///
/// Immutable for the duration of an integration run. Category, keyword, and
/// entity sets use `BTreeSet` so graph construction and similarity scoring
/// iterate in a deterministic order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeItem {
    pub id: KnowledgeId,
    pub content: String,
    pub categories: BTreeSet<String>,
    pub keywords: BTreeSet<String>,
    pub entities: BTreeSet<String>,
    /// Importance score in [0,1]
    pub importance: f64,
    /// Reliability score in [0,1]
    pub reliability: f64,
}

impl KnowledgeItem {
    /// Create an item with the given content and neutral scores.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            id: KnowledgeId::new(),
            content: content.into(),
            categories: BTreeSet::new(),
            keywords: BTreeSet::new(),
            entities: BTreeSet::new(),
            importance: 0.5,
            reliability: 0.5,
        }
    }

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_entities<I, S>(mut self, entities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entities = entities.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_importance(mut self, importance: f64) -> Self {
        self.importance = importance.clamp(0.0, 1.0);
        self
    }

    pub fn with_reliability(mut self, reliability: f64) -> Self {
        self.reliability = reliability.clamp(0.0, 1.0);
        self
    }

    /// All concepts this item mentions: entities plus keywords.
    pub fn concepts(&self) -> impl Iterator<Item = &str> {
        self.entities
            .iter()
            .chain(self.keywords.iter())
            .map(String::as_str)
    }
}

/// One learning session's worth of knowledge items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningSession {
    pub id: SessionId,
    pub created_at: DateTime<Utc>,
    pub items: Vec<KnowledgeItem>,
}

impl LearningSession {
    pub fn new(created_at: DateTime<Utc>, items: Vec<KnowledgeItem>) -> Self {
        Self {
            id: SessionId::new(),
            created_at,
            items,
        }
    }

    /// Union of category tags across all items in this session.
    pub fn category_set(&self) -> BTreeSet<&str> {
        self.items
            .iter()
            .flat_map(|item| item.categories.iter().map(String::as_str))
            .collect()
    }
}

/// What kind of relationship an integrated record captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrationKind {
    /// Overlap or complementarity between items from different sessions
    CrossSession,
    /// A concept's importance trajectory across sessions over time
    TemporalEvolution,
    /// Co-occurrence relationship between two concepts
    ConceptSynthesis,
}

impl std::fmt::Display for IntegrationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CrossSession => write!(f, "cross_session"),
            Self::TemporalEvolution => write!(f, "temporal_evolution"),
            Self::ConceptSynthesis => write!(f, "concept_synthesis"),
        }
    }
}

/// How the synthesized content of a record was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrationMethod {
    /// Produced by the synthesis collaborator
    LlmSynthesis,
    /// Produced by the deterministic heuristic path
    Heuristic,
    /// Produced by the temporal evolution analyzer
    TemporalAnalysis,
    /// Produced by the concept co-occurrence analyzer
    NetworkAnalysis,
}

impl std::fmt::Display for IntegrationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LlmSynthesis => write!(f, "llm_synthesis"),
            Self::Heuristic => write!(f, "heuristic"),
            Self::TemporalAnalysis => write!(f, "temporal_analysis"),
            Self::NetworkAnalysis => write!(f, "network_analysis"),
        }
    }
}

/// Conflicts found between source items and how they were resolved.
///
/// Both lists may be empty; the structure is always present on a record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContradictionAnalysis {
    pub conflicts: Vec<String>,
    pub resolutions: Vec<String>,
}

impl ContradictionAnalysis {
    pub fn is_empty(&self) -> bool {
        self.conflicts.is_empty() && self.resolutions.is_empty()
    }
}

/// Direction of a concept's importance trend across sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
}

/// One observation of a concept within a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolutionPoint {
    pub session_id: SessionId,
    pub timestamp: DateTime<Utc>,
    /// Importance of the item the concept appeared in
    pub importance: f64,
    /// Snippet of the content surrounding the concept mention
    pub context: String,
}

/// Whether a turning point is a local importance peak or valley.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurningPointKind {
    Peak,
    Valley,
}

/// A strict local extremum in a concept's importance timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurningPoint {
    pub kind: TurningPointKind,
    pub session_id: SessionId,
    pub timestamp: DateTime<Utc>,
    pub importance: f64,
}

/// A concept's chronological trajectory across sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConceptEvolution {
    pub concept: String,
    /// Timeline in chronological session order
    pub timeline: Vec<EvolutionPoint>,
    pub trend: TrendDirection,
    pub turning_points: Vec<TurningPoint>,
}

/// A synthesized higher-order knowledge record — the engine's output unit.
///
/// Created once per run and never mutated afterward; persisted append-only
/// into a monthly batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegratedKnowledge {
    pub id: KnowledgeId,
    pub kind: IntegrationKind,
    pub source_sessions: Vec<SessionId>,
    pub source_items: Vec<KnowledgeId>,
    pub content: String,
    pub key_insights: Vec<String>,
    /// Confidence score in [0,1]
    pub confidence_score: f64,
    /// Novelty score in [0,1]
    pub novelty_score: f64,
    pub related_concepts: Vec<String>,
    pub contradiction_analysis: ContradictionAnalysis,
    pub evolution_trends: Vec<ConceptEvolution>,
    pub created_at: DateTime<Utc>,
    pub method: IntegrationMethod,
    pub quality_metrics: HashMap<String, f64>,
    pub application_domains: Vec<String>,
    pub actionable_insights: Vec<String>,
    pub future_research_directions: Vec<String>,
}

impl IntegratedKnowledge {
    /// Create a record with the mandatory fields; the rest default to empty.
    ///
    /// Confidence and novelty are clamped to [0,1] here so the invariant
    /// holds regardless of what an analyzer computed.
    pub fn new(
        kind: IntegrationKind,
        method: IntegrationMethod,
        content: impl Into<String>,
        confidence: f64,
        novelty: f64,
    ) -> Self {
        Self {
            id: KnowledgeId::new(),
            kind,
            source_sessions: Vec::new(),
            source_items: Vec::new(),
            content: content.into(),
            key_insights: Vec::new(),
            confidence_score: confidence.clamp(0.0, 1.0),
            novelty_score: novelty.clamp(0.0, 1.0),
            related_concepts: Vec::new(),
            contradiction_analysis: ContradictionAnalysis::default(),
            evolution_trends: Vec::new(),
            created_at: Utc::now(),
            method,
            quality_metrics: HashMap::new(),
            application_domains: Vec::new(),
            actionable_insights: Vec::new(),
            future_research_directions: Vec::new(),
        }
    }

    /// Ranking key used by the quality filter.
    pub fn ranking_score(&self) -> f64 {
        self.confidence_score * self.novelty_score
    }
}

/// A theme-level grouping of strongly related memories.
///
/// Derived read-side from qualifying concept relationships; never consulted
/// on the write path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeCluster {
    pub theme: String,
    pub memory_ids: BTreeSet<KnowledgeId>,
    pub relationship_count: usize,
    pub avg_strength: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_ids_roundtrip() {
        let id = SessionId::new();
        let parsed = SessionId::parse(&id.to_string()).unwrap();
        assert_eq!(id, parsed);

        let kid = KnowledgeId::new();
        let parsed = KnowledgeId::parse(&kid.to_string()).unwrap();
        assert_eq!(kid, parsed);
    }

    #[test]
    fn test_item_builder_clamps_scores() {
        let item = KnowledgeItem::new("Transformers use attention")
            .with_importance(1.7)
            .with_reliability(-0.3);
        assert_eq!(item.importance, 1.0);
        assert_eq!(item.reliability, 0.0);
    }

    #[test]
    fn test_item_concepts_union() {
        let item = KnowledgeItem::new("x")
            .with_keywords(["attention", "transformer"])
            .with_entities(["BERT"]);
        let concepts: Vec<&str> = item.concepts().collect();
        assert_eq!(concepts, vec!["BERT", "attention", "transformer"]);
    }

    #[test]
    fn test_record_clamps_scores() {
        let record = IntegratedKnowledge::new(
            IntegrationKind::CrossSession,
            IntegrationMethod::Heuristic,
            "combined insight",
            1.4,
            -0.1,
        );
        assert_eq!(record.confidence_score, 1.0);
        assert_eq!(record.novelty_score, 0.0);
    }

    #[test]
    fn test_kind_and_method_wire_names() {
        let kind = serde_json::to_string(&IntegrationKind::TemporalEvolution).unwrap();
        assert_eq!(kind, "\"temporal_evolution\"");
        let method = serde_json::to_string(&IntegrationMethod::LlmSynthesis).unwrap();
        assert_eq!(method, "\"llm_synthesis\"");
        assert_eq!(IntegrationKind::ConceptSynthesis.to_string(), "concept_synthesis");
    }

    #[test]
    fn test_session_category_set() {
        let session = LearningSession::new(
            Utc::now(),
            vec![
                KnowledgeItem::new("a").with_categories(["ai", "music"]),
                KnowledgeItem::new("b").with_categories(["music", "tools"]),
            ],
        );
        let categories = session.category_set();
        assert_eq!(categories.len(), 3);
        assert!(categories.contains("music"));
    }
}
