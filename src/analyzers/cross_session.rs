//! Cross-session analysis: overlapping and complementary knowledge.

use tracing::{debug, warn};

use crate::config::IntegrationConfig;
use crate::knowledge::{
    ContradictionAnalysis, IntegratedKnowledge, IntegrationKind, IntegrationMethod,
    LearningSession,
};
use crate::similarity::SimilarityEngine;
use crate::synthesis::SynthesisStrategy;

/// Fixed confidence for complementary-session records.
const COMPLEMENTARY_CONFIDENCE: f64 = 0.7;
/// Fixed novelty for complementary-session records.
const COMPLEMENTARY_NOVELTY: f64 = 0.6;

/// Finds overlapping item pairs across sessions and complementary session
/// pairs whose category coverage barely intersects.
pub struct CrossSessionAnalyzer<'a> {
    config: &'a IntegrationConfig,
}

impl<'a> CrossSessionAnalyzer<'a> {
    pub fn new(config: &'a IntegrationConfig) -> Self {
        Self { config }
    }

    /// Analyze every unordered pair of distinct sessions.
    pub async fn analyze(
        &self,
        sessions: &[LearningSession],
        similarity: &mut SimilarityEngine,
        synthesis: &dyn SynthesisStrategy,
    ) -> Vec<IntegratedKnowledge> {
        let mut candidates = Vec::new();

        for (i, left) in sessions.iter().enumerate() {
            for right in &sessions[i + 1..] {
                self.analyze_overlaps(left, right, similarity, synthesis, &mut candidates)
                    .await;

                if let Some(record) = self.complementary_record(left, right) {
                    candidates.push(record);
                }
            }
        }

        debug!("cross-session analysis produced {} candidates", candidates.len());
        candidates
    }

    async fn analyze_overlaps(
        &self,
        left: &LearningSession,
        right: &LearningSession,
        similarity: &mut SimilarityEngine,
        synthesis: &dyn SynthesisStrategy,
        candidates: &mut Vec<IntegratedKnowledge>,
    ) {
        for item_a in &left.items {
            for item_b in &right.items {
                let score = similarity.similarity(item_a, item_b);
                if score < self.config.similarity_threshold {
                    continue;
                }

                let output = match synthesis.synthesize(item_a, item_b).await {
                    Ok(output) => output,
                    Err(e) => {
                        // Unreachable with the fallback composition in place,
                        // but a raw strategy may still fail.
                        warn!("synthesis failed for overlap candidate: {e}");
                        continue;
                    }
                };

                let mut record = IntegratedKnowledge::new(
                    IntegrationKind::CrossSession,
                    output.method,
                    output.content,
                    score,
                    output.novelty_score,
                );
                record.source_sessions = vec![left.id.clone(), right.id.clone()];
                record.source_items = vec![item_a.id.clone(), item_b.id.clone()];
                record.key_insights = output.key_insights;
                record.related_concepts = output.related_concepts;
                record.quality_metrics = output.quality_metrics;
                record.application_domains = output.application_domains;
                record.actionable_insights = output.actionable_insights;
                record.future_research_directions = output.future_research_directions;
                record.evolution_trends = output.evolution_trends;
                record.contradiction_analysis = if self.config.enable_contradiction_detection {
                    output.contradiction_analysis
                } else {
                    ContradictionAnalysis::default()
                };

                candidates.push(record);
            }
        }
    }

    /// A complementary pair covers different but related ground: low mutual
    /// category overlap, but a union meaningfully larger than either side.
    fn complementary_record(
        &self,
        left: &LearningSession,
        right: &LearningSession,
    ) -> Option<IntegratedKnowledge> {
        let cats_left = left.category_set();
        let cats_right = right.category_set();
        let smaller = cats_left.len().min(cats_right.len());
        if smaller == 0 {
            return None;
        }

        let overlap = cats_left.intersection(&cats_right).count();
        let union = cats_left.union(&cats_right).count();

        let low_overlap = (overlap as f64) < self.config.complementary_overlap_ratio * smaller as f64;
        let wide_union = (union as f64) > self.config.complementary_union_ratio * smaller as f64;
        if !low_overlap || !wide_union {
            return None;
        }

        let only_left: Vec<&str> = cats_left.difference(&cats_right).copied().collect();
        let only_right: Vec<&str> = cats_right.difference(&cats_left).copied().collect();

        let content = format!(
            "Sessions {} and {} cover complementary ground: one contributes [{}], the other [{}].",
            left.id,
            right.id,
            only_left.join(", "),
            only_right.join(", "),
        );

        let mut record = IntegratedKnowledge::new(
            IntegrationKind::CrossSession,
            IntegrationMethod::Heuristic,
            content,
            COMPLEMENTARY_CONFIDENCE,
            COMPLEMENTARY_NOVELTY,
        );
        record.source_sessions = vec![left.id.clone(), right.id.clone()];
        record.source_items = left
            .items
            .iter()
            .chain(right.items.iter())
            .map(|item| item.id.clone())
            .collect();
        record.key_insights = vec![format!(
            "Combining both sessions widens category coverage from {} to {} tags",
            smaller, union
        )];
        record.related_concepts = cats_left.union(&cats_right).map(|s| s.to_string()).collect();
        record.quality_metrics = [
            ("relevance".to_string(), 0.7),
            ("coherence".to_string(), 0.8),
        ]
        .into();

        Some(record)
    }
}
