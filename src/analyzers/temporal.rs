//! Temporal evolution analysis: concept importance trajectories over time.

use regex::RegexBuilder;
use std::collections::BTreeMap;
use tracing::debug;

use crate::config::IntegrationConfig;
use crate::knowledge::{
    ConceptEvolution, EvolutionPoint, IntegratedKnowledge, IntegrationKind, IntegrationMethod,
    KnowledgeId, LearningSession, TrendDirection, TurningPoint, TurningPointKind,
};

/// Fixed novelty for temporal evolution records.
const TEMPORAL_NOVELTY: f64 = 0.7;
/// Slope band outside which a trend counts as increasing/decreasing.
const TREND_SLOPE_BAND: f64 = 0.1;
/// Characters of context kept on each side of a concept mention.
const SNIPPET_RADIUS: usize = 40;

/// Tracks every concept (entity or keyword) across chronologically ordered
/// sessions and reports those that evolve.
pub struct TemporalAnalyzer<'a> {
    config: &'a IntegrationConfig,
}

struct TimelineEntry {
    point: EvolutionPoint,
    item_id: KnowledgeId,
}

impl<'a> TemporalAnalyzer<'a> {
    pub fn new(config: &'a IntegrationConfig) -> Self {
        Self { config }
    }

    /// One `temporal_evolution` record per concept seen in at least two
    /// sessions. Returns nothing when temporal analysis is disabled.
    pub fn analyze(&self, sessions: &[LearningSession]) -> Vec<IntegratedKnowledge> {
        if !self.config.enable_temporal_analysis {
            return Vec::new();
        }

        let mut ordered: Vec<&LearningSession> = sessions.iter().collect();
        ordered.sort_by_key(|s| s.created_at);

        // BTreeMap keeps record output order deterministic per input batch
        let mut timelines: BTreeMap<String, Vec<TimelineEntry>> = BTreeMap::new();

        for session in &ordered {
            for item in &session.items {
                for concept in item.concepts() {
                    let timeline = timelines.entry(concept.to_string()).or_default();
                    // One entry per session per concept: first mention wins
                    if timeline
                        .iter()
                        .any(|entry| entry.point.session_id == session.id)
                    {
                        continue;
                    }
                    timeline.push(TimelineEntry {
                        point: EvolutionPoint {
                            session_id: session.id.clone(),
                            timestamp: session.created_at,
                            importance: item.importance,
                            context: context_snippet(&item.content, concept),
                        },
                        item_id: item.id.clone(),
                    });
                }
            }
        }

        let records: Vec<IntegratedKnowledge> = timelines
            .into_iter()
            .filter(|(_, timeline)| timeline.len() >= 2)
            .map(|(concept, timeline)| self.evolution_record(concept, timeline))
            .collect();

        debug!("temporal analysis produced {} candidates", records.len());
        records
    }

    fn evolution_record(&self, concept: String, timeline: Vec<TimelineEntry>) -> IntegratedKnowledge {
        let points: Vec<EvolutionPoint> = timeline.iter().map(|e| e.point.clone()).collect();
        let importances: Vec<f64> = points.iter().map(|p| p.importance).collect();

        let trend = if self.config.enable_trend_prediction {
            classify_trend(&importances)
        } else {
            TrendDirection::Stable
        };
        let turning_points = find_turning_points(&points);

        let content = format!(
            "Concept '{}' tracked across {} sessions: importance moved from {:.2} to {:.2} ({:?} trend, {} turning point(s)).",
            concept,
            points.len(),
            importances.first().copied().unwrap_or(0.0),
            importances.last().copied().unwrap_or(0.0),
            trend,
            turning_points.len(),
        );

        let mut key_insights = vec![match trend {
            TrendDirection::Increasing => format!("'{concept}' is gaining importance over time"),
            TrendDirection::Decreasing => format!("'{concept}' is losing importance over time"),
            TrendDirection::Stable => format!("'{concept}' holds steady importance across sessions"),
        }];
        for tp in &turning_points {
            let kind = match tp.kind {
                TurningPointKind::Peak => "peaked",
                TurningPointKind::Valley => "bottomed out",
            };
            key_insights.push(format!(
                "'{concept}' {kind} at importance {:.2} in session {}",
                tp.importance, tp.session_id
            ));
        }

        let mut record = IntegratedKnowledge::new(
            IntegrationKind::TemporalEvolution,
            IntegrationMethod::TemporalAnalysis,
            content,
            self.config.prediction_confidence,
            TEMPORAL_NOVELTY,
        );
        record.source_sessions = points.iter().map(|p| p.session_id.clone()).collect();
        record.source_items = timeline.iter().map(|e| e.item_id.clone()).collect();
        record.key_insights = key_insights;
        record.related_concepts = vec![concept.clone()];
        record.evolution_trends = vec![ConceptEvolution {
            concept,
            timeline: points,
            trend,
            turning_points,
        }];
        record
    }
}

/// Classify the importance trend.
///
/// Three or more points: least-squares slope with ±0.1 bands. Exactly two:
/// direct endpoint comparison. Fewer: stable.
fn classify_trend(importances: &[f64]) -> TrendDirection {
    match importances.len() {
        0 | 1 => TrendDirection::Stable,
        2 => {
            if importances[1] > importances[0] {
                TrendDirection::Increasing
            } else if importances[1] < importances[0] {
                TrendDirection::Decreasing
            } else {
                TrendDirection::Stable
            }
        }
        n => {
            let slope = linear_slope(importances, n);
            if slope > TREND_SLOPE_BAND {
                TrendDirection::Increasing
            } else if slope < -TREND_SLOPE_BAND {
                TrendDirection::Decreasing
            } else {
                TrendDirection::Stable
            }
        }
    }
}

fn linear_slope(values: &[f64], n: usize) -> f64 {
    let x_mean = (n as f64 - 1.0) / 2.0;
    let y_mean = values.iter().sum::<f64>() / n as f64;

    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for (i, &y) in values.iter().enumerate() {
        let dx = i as f64 - x_mean;
        numerator += dx * (y - y_mean);
        denominator += dx * dx;
    }
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// Interior points that are strict local importance extrema.
fn find_turning_points(points: &[EvolutionPoint]) -> Vec<TurningPoint> {
    let mut turning_points = Vec::new();
    for window in points.windows(3) {
        let (prev, mid, next) = (&window[0], &window[1], &window[2]);
        let kind = if mid.importance > prev.importance && mid.importance > next.importance {
            Some(TurningPointKind::Peak)
        } else if mid.importance < prev.importance && mid.importance < next.importance {
            Some(TurningPointKind::Valley)
        } else {
            None
        };
        if let Some(kind) = kind {
            turning_points.push(TurningPoint {
                kind,
                session_id: mid.session_id.clone(),
                timestamp: mid.timestamp,
                importance: mid.importance,
            });
        }
    }
    turning_points
}

/// Snippet of content around the first (case-insensitive) concept mention.
fn context_snippet(content: &str, concept: &str) -> String {
    let re = match RegexBuilder::new(&regex::escape(concept))
        .case_insensitive(true)
        .build()
    {
        Ok(re) => re,
        Err(_) => return head(content, 2 * SNIPPET_RADIUS),
    };

    match re.find(content) {
        Some(m) => {
            let before: String = content[..m.start()]
                .chars()
                .rev()
                .take(SNIPPET_RADIUS)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect();
            let after: String = content[m.end()..].chars().take(SNIPPET_RADIUS).collect();
            format!("{before}{}{after}", m.as_str())
        }
        None => head(content, 2 * SNIPPET_RADIUS),
    }
}

fn head(content: &str, chars: usize) -> String {
    content.chars().take(chars).collect()
}
