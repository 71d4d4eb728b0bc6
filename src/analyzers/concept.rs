//! Concept co-occurrence analysis and cluster summarization.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

use crate::config::IntegrationConfig;
use crate::knowledge::{
    IntegratedKnowledge, IntegrationKind, IntegrationMethod, KnowledgeCluster, KnowledgeId,
    LearningSession, SessionId,
};

/// Fixed novelty for concept synthesis records.
const CONCEPT_NOVELTY: f64 = 0.6;
/// Strength contribution for a context pair sharing a session.
const SHARED_SESSION_WEIGHT: f64 = 1.0;
/// Strength contribution for a context pair sharing a category.
const SHARED_CATEGORY_WEIGHT: f64 = 0.5;

/// One occurrence of a concept within a session.
#[derive(Debug, Clone)]
struct ConceptContext {
    session_id: SessionId,
    categories: BTreeSet<String>,
    item_id: KnowledgeId,
}

/// A co-occurrence relationship between two concepts, with its evidence.
#[derive(Debug, Clone)]
pub struct ConceptRelationship {
    pub concept_a: String,
    pub concept_b: String,
    /// Normalized co-occurrence strength in [0,1]
    pub strength: f64,
    pub sessions: Vec<SessionId>,
    pub supporting_items: Vec<KnowledgeId>,
}

/// Finds strongly co-occurring concept pairs across the whole batch,
/// independent of any single session pair.
pub struct ConceptAnalyzer<'a> {
    config: &'a IntegrationConfig,
}

impl<'a> ConceptAnalyzer<'a> {
    pub fn new(config: &'a IntegrationConfig) -> Self {
        Self { config }
    }

    /// Compute all relationships at or above the configured strength.
    pub fn relationships(&self, sessions: &[LearningSession]) -> Vec<ConceptRelationship> {
        let contexts = build_contexts(sessions);
        let concepts: Vec<&String> = contexts.keys().collect();

        let mut relationships = Vec::new();
        for (i, &a) in concepts.iter().enumerate() {
            for &b in &concepts[i + 1..] {
                let ctx_a = &contexts[a];
                let ctx_b = &contexts[b];
                let strength = relationship_strength(ctx_a, ctx_b);
                if strength < self.config.concept_relation_threshold {
                    continue;
                }

                let mut sessions: BTreeSet<SessionId> = BTreeSet::new();
                let mut items: BTreeSet<KnowledgeId> = BTreeSet::new();
                for ctx in ctx_a.iter().chain(ctx_b.iter()) {
                    sessions.insert(ctx.session_id.clone());
                    items.insert(ctx.item_id.clone());
                }

                relationships.push(ConceptRelationship {
                    concept_a: a.clone(),
                    concept_b: b.clone(),
                    strength,
                    sessions: sessions.into_iter().collect(),
                    supporting_items: items.into_iter().collect(),
                });
            }
        }

        debug!("concept analysis found {} relationships", relationships.len());
        relationships
    }

    /// One `concept_synthesis` record per qualifying relationship.
    pub fn analyze(&self, sessions: &[LearningSession]) -> Vec<IntegratedKnowledge> {
        self.relationships(sessions)
            .into_iter()
            .map(|rel| self.relationship_record(rel))
            .collect()
    }

    fn relationship_record(&self, rel: ConceptRelationship) -> IntegratedKnowledge {
        let content = format!(
            "Concepts '{}' and '{}' co-occur consistently across {} session(s) (strength {:.2}), suggesting they belong to one line of inquiry.",
            rel.concept_a,
            rel.concept_b,
            rel.sessions.len(),
            rel.strength,
        );

        let mut record = IntegratedKnowledge::new(
            IntegrationKind::ConceptSynthesis,
            IntegrationMethod::NetworkAnalysis,
            content,
            rel.strength,
            CONCEPT_NOVELTY,
        );
        record.key_insights = vec![format!(
            "'{}' and '{}' appear in the same contexts more often than chance",
            rel.concept_a, rel.concept_b
        )];
        record.related_concepts = vec![rel.concept_a, rel.concept_b];
        record.source_sessions = rel.sessions;
        record.source_items = rel.supporting_items;
        record
    }
}

/// Map every concept (entity or keyword) to its occurrence contexts.
fn build_contexts(sessions: &[LearningSession]) -> BTreeMap<String, Vec<ConceptContext>> {
    let mut contexts: BTreeMap<String, Vec<ConceptContext>> = BTreeMap::new();
    for session in sessions {
        for item in &session.items {
            for concept in item.concepts() {
                contexts
                    .entry(concept.to_string())
                    .or_default()
                    .push(ConceptContext {
                        session_id: session.id.clone(),
                        categories: item.categories.clone(),
                        item_id: item.id.clone(),
                    });
            }
        }
    }
    contexts
}

/// Co-occurrence strength between two concepts' context lists.
///
/// +1 for each cross pair sharing a session, +0.5 for each cross pair sharing
/// at least one category, normalized by the total context count of both sides
/// and clamped to [0,1].
fn relationship_strength(a: &[ConceptContext], b: &[ConceptContext]) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let mut raw = 0.0;
    for ctx_a in a {
        for ctx_b in b {
            if ctx_a.session_id == ctx_b.session_id {
                raw += SHARED_SESSION_WEIGHT;
            }
            if !ctx_a.categories.is_disjoint(&ctx_b.categories) {
                raw += SHARED_CATEGORY_WEIGHT;
            }
        }
    }

    (raw / (a.len() + b.len()) as f64).clamp(0.0, 1.0)
}

/// Group qualifying relationships into theme clusters.
///
/// Relationships at or above `min_strength` connect concepts; each connected
/// component becomes one cluster carrying the union of supporting memory ids.
/// Read-side summarization only — never consulted on the write path.
pub fn build_clusters(
    relationships: &[ConceptRelationship],
    min_strength: f64,
) -> Vec<KnowledgeCluster> {
    let strong: Vec<&ConceptRelationship> = relationships
        .iter()
        .filter(|rel| rel.strength >= min_strength)
        .collect();

    // Union-find over concept names
    let mut parent: HashMap<&str, &str> = HashMap::new();
    fn root<'x>(parent: &HashMap<&'x str, &'x str>, mut concept: &'x str) -> &'x str {
        while let Some(&next) = parent.get(concept) {
            if next == concept {
                break;
            }
            concept = next;
        }
        concept
    }
    for rel in &strong {
        parent.entry(rel.concept_a.as_str()).or_insert(rel.concept_a.as_str());
        parent.entry(rel.concept_b.as_str()).or_insert(rel.concept_b.as_str());
        let ra = root(&parent, rel.concept_a.as_str());
        let rb = root(&parent, rel.concept_b.as_str());
        if ra != rb {
            parent.insert(ra, rb);
        }
    }

    // Group relationships by component root
    let mut groups: BTreeMap<String, Vec<&ConceptRelationship>> = BTreeMap::new();
    for rel in &strong {
        let key = root(&parent, &rel.concept_a).to_string();
        groups.entry(key).or_default().push(rel);
    }

    groups
        .into_values()
        .map(|rels| {
            let mut concepts: BTreeSet<&str> = BTreeSet::new();
            let mut memory_ids: BTreeSet<KnowledgeId> = BTreeSet::new();
            let mut strength_sum = 0.0;
            for rel in &rels {
                concepts.insert(&rel.concept_a);
                concepts.insert(&rel.concept_b);
                memory_ids.extend(rel.supporting_items.iter().cloned());
                strength_sum += rel.strength;
            }
            KnowledgeCluster {
                theme: concepts.into_iter().collect::<Vec<_>>().join(" / "),
                memory_ids,
                relationship_count: rels.len(),
                avg_strength: strength_sum / rels.len() as f64,
            }
        })
        .collect()
}
