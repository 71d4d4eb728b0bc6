//! Quality gate: threshold, rank, truncate.

use tracing::debug;

use crate::config::IntegrationConfig;
use crate::knowledge::IntegratedKnowledge;

/// Apply the quality gate to candidate records.
///
/// Drops candidates below the confidence threshold, with no key insights, or
/// with empty synthesized content; sorts survivors descending by
/// confidence × novelty; truncates to the configured scope cap.
pub fn apply(
    config: &IntegrationConfig,
    candidates: Vec<IntegratedKnowledge>,
) -> Vec<IntegratedKnowledge> {
    let before = candidates.len();

    let mut survivors: Vec<IntegratedKnowledge> = candidates
        .into_iter()
        .filter(|c| {
            c.confidence_score >= config.confidence_threshold
                && !c.key_insights.is_empty()
                && !c.content.trim().is_empty()
        })
        .collect();

    survivors.sort_by(|a, b| {
        b.ranking_score()
            .partial_cmp(&a.ranking_score())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    survivors.truncate(config.max_integration_scope);

    debug!(
        "quality gate kept {}/{} candidates (threshold {})",
        survivors.len(),
        before,
        config.confidence_threshold
    );
    survivors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::{IntegrationKind, IntegrationMethod};
    use pretty_assertions::assert_eq;

    fn candidate(confidence: f64, novelty: f64) -> IntegratedKnowledge {
        let mut record = IntegratedKnowledge::new(
            IntegrationKind::CrossSession,
            IntegrationMethod::Heuristic,
            "synthesized content",
            confidence,
            novelty,
        );
        record.key_insights = vec!["an insight".to_string()];
        record
    }

    #[test]
    fn test_confidence_threshold_enforced() {
        let config = IntegrationConfig::default();
        let kept = apply(&config, vec![candidate(0.65, 0.9), candidate(0.7, 0.9)]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].confidence_score, 0.7);
    }

    #[test]
    fn test_empty_insights_rejected() {
        let config = IntegrationConfig::default();
        let mut record = candidate(0.9, 0.9);
        record.key_insights.clear();
        assert!(apply(&config, vec![record]).is_empty());
    }

    #[test]
    fn test_blank_content_rejected() {
        let config = IntegrationConfig::default();
        let mut record = candidate(0.9, 0.9);
        record.content = "   ".to_string();
        assert!(apply(&config, vec![record]).is_empty());
    }

    #[test]
    fn test_ranked_by_confidence_times_novelty() {
        let config = IntegrationConfig::default();
        // 0.8*0.9 = 0.72 outranks 0.95*0.7 = 0.665
        let kept = apply(&config, vec![candidate(0.95, 0.7), candidate(0.8, 0.9)]);
        assert_eq!(kept[0].confidence_score, 0.8);
        assert_eq!(kept[1].confidence_score, 0.95);
    }

    #[test]
    fn test_truncated_to_scope_cap() {
        let config = IntegrationConfig::default();
        let candidates: Vec<_> = (0..15)
            .map(|i| candidate(0.7 + (i as f64) * 0.02, 0.8))
            .collect();

        let kept = apply(&config, candidates);

        assert_eq!(kept.len(), config.max_integration_scope);
        // Top of the ranking survives, in descending order
        for window in kept.windows(2) {
            assert!(window[0].ranking_score() >= window[1].ranking_score());
        }
        assert!((kept[0].confidence_score - 0.98).abs() < 1e-9);
    }
}
