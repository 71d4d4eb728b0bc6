//! Multi-factor similarity scoring between knowledge items.
//!
//! Similarity is a weighted blend of four component scores: content
//! (character-sequence overlap), keywords, entities, and categories (Jaccard
//! over the respective sets). A dimension with no data on either side is
//! skipped rather than scored zero, and the weights of the remaining
//! dimensions are renormalized. Scores are memoized per unordered item-id
//! pair for the lifetime of one engine instance, since the same pair may be
//! queried by multiple analyzers in a run.

use std::collections::{BTreeSet, HashMap};

use crate::knowledge::{KnowledgeId, KnowledgeItem};

const CONTENT_WEIGHT: f64 = 0.4;
const KEYWORD_WEIGHT: f64 = 0.3;
const ENTITY_WEIGHT: f64 = 0.2;
const CATEGORY_WEIGHT: f64 = 0.1;

/// Similarity engine with per-run memoization.
///
/// Owned by one engine instance; not shared across concurrent runs.
#[derive(Debug, Default)]
pub struct SimilarityEngine {
    cache: HashMap<(KnowledgeId, KnowledgeId), f64>,
}

impl SimilarityEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Similarity between two items in [0,1]. Deterministic and symmetric.
    pub fn similarity(&mut self, a: &KnowledgeItem, b: &KnowledgeItem) -> f64 {
        let key = cache_key(&a.id, &b.id);
        if let Some(&score) = self.cache.get(&key) {
            return score;
        }

        let score = compute_similarity(a, b);
        self.cache.insert(key, score);
        score
    }

    /// Number of memoized pairs.
    pub fn cached_pairs(&self) -> usize {
        self.cache.len()
    }
}

fn cache_key(a: &KnowledgeId, b: &KnowledgeId) -> (KnowledgeId, KnowledgeId) {
    if a <= b {
        (a.clone(), b.clone())
    } else {
        (b.clone(), a.clone())
    }
}

fn compute_similarity(a: &KnowledgeItem, b: &KnowledgeItem) -> f64 {
    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;

    if !a.content.is_empty() && !b.content.is_empty() {
        weighted_sum += CONTENT_WEIGHT * sequence_ratio(&a.content, &b.content);
        weight_total += CONTENT_WEIGHT;
    }
    if !a.keywords.is_empty() && !b.keywords.is_empty() {
        weighted_sum += KEYWORD_WEIGHT * jaccard(&a.keywords, &b.keywords);
        weight_total += KEYWORD_WEIGHT;
    }
    if !a.entities.is_empty() && !b.entities.is_empty() {
        weighted_sum += ENTITY_WEIGHT * jaccard(&a.entities, &b.entities);
        weight_total += ENTITY_WEIGHT;
    }
    if !a.categories.is_empty() && !b.categories.is_empty() {
        weighted_sum += CATEGORY_WEIGHT * jaccard(&a.categories, &b.categories);
        weight_total += CATEGORY_WEIGHT;
    }

    if weight_total == 0.0 {
        return 0.0;
    }
    (weighted_sum / weight_total).clamp(0.0, 1.0)
}

/// Jaccard index over two string sets.
pub fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    intersection as f64 / union as f64
}

/// Character-sequence overlap ratio: `2·LCS(a,b) / (|a| + |b|)`.
///
/// Symmetric by construction. Inputs are compared on whole characters, not
/// bytes, so multi-byte text scores correctly.
pub fn sequence_ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let total = a_chars.len() + b_chars.len();
    if total == 0 {
        return 0.0;
    }

    let lcs = lcs_length(&a_chars, &b_chars);
    2.0 * lcs as f64 / total as f64
}

// Two-row dynamic programming; O(len_a * len_b) time, O(len_b) space.
fn lcs_length(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];

    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::KnowledgeItem;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_identical_items_score_one() {
        let item = KnowledgeItem::new("Transformers rely on attention heads")
            .with_keywords(["transformer", "attention"])
            .with_entities(["BERT"])
            .with_categories(["ai"]);
        let mut engine = SimilarityEngine::new();
        let score = engine.similarity(&item, &item.clone());
        assert!((score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_disjoint_items_score_low() {
        let a = KnowledgeItem::new("aaaa").with_keywords(["x"]);
        let b = KnowledgeItem::new("bbbb").with_keywords(["y"]);
        let mut engine = SimilarityEngine::new();
        assert_eq!(engine.similarity(&a, &b), 0.0);
    }

    #[test]
    fn test_missing_dimensions_are_skipped_not_zeroed() {
        // Identical keywords, no entities or categories, no shared content chars.
        // With renormalization the keyword match dominates instead of being
        // diluted by absent dimensions.
        let a = KnowledgeItem::new("abc").with_keywords(["transformer"]);
        let b = KnowledgeItem::new("xyz").with_keywords(["transformer"]);
        let mut engine = SimilarityEngine::new();
        let score = engine.similarity(&a, &b);
        // content 0.0 * (0.4/0.7) + keywords 1.0 * (0.3/0.7)
        assert!((score - 0.3 / 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_empty_items_score_zero() {
        let a = KnowledgeItem::new("");
        let b = KnowledgeItem::new("");
        let mut engine = SimilarityEngine::new();
        assert_eq!(engine.similarity(&a, &b), 0.0);
    }

    #[test]
    fn test_memoization_caches_unordered_pair() {
        let a = KnowledgeItem::new("alpha").with_keywords(["k"]);
        let b = KnowledgeItem::new("beta").with_keywords(["k"]);
        let mut engine = SimilarityEngine::new();

        let forward = engine.similarity(&a, &b);
        assert_eq!(engine.cached_pairs(), 1);
        let backward = engine.similarity(&b, &a);
        // Reverse order hits the same cache entry
        assert_eq!(engine.cached_pairs(), 1);
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_sequence_ratio_known_values() {
        assert!((sequence_ratio("abcd", "abcd") - 1.0).abs() < 1e-9);
        assert_eq!(sequence_ratio("abcd", "wxyz"), 0.0);
        // LCS("abcd", "abxd") = 3, ratio = 6/8
        assert!((sequence_ratio("abcd", "abxd") - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_sequence_ratio_multibyte() {
        // Must not panic or mis-count on non-ASCII content
        let score = sequence_ratio("音楽生成AI", "音楽生成モデル");
        assert!(score > 0.0 && score < 1.0);
    }

    #[test]
    fn test_jaccard_known_values() {
        let a: BTreeSet<String> = ["x", "y"].iter().map(|s| s.to_string()).collect();
        let b: BTreeSet<String> = ["y", "z"].iter().map(|s| s.to_string()).collect();
        assert!((jaccard(&a, &b) - 1.0 / 3.0).abs() < 1e-9);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn word() -> impl Strategy<Value = String> {
            "[a-z]{1,8}"
        }

        fn item() -> impl Strategy<Value = KnowledgeItem> {
            (
                "[ -~]{0,40}",
                proptest::collection::btree_set(word(), 0..5),
                proptest::collection::btree_set(word(), 0..5),
                proptest::collection::btree_set(word(), 0..4),
            )
                .prop_map(|(content, keywords, entities, categories)| {
                    let mut item = KnowledgeItem::new(content);
                    item.keywords = keywords;
                    item.entities = entities;
                    item.categories = categories;
                    item
                })
        }

        proptest! {
            /// similarity(a, b) == similarity(b, a)
            #[test]
            fn similarity_is_symmetric(a in item(), b in item()) {
                let mut engine_ab = SimilarityEngine::new();
                let mut engine_ba = SimilarityEngine::new();
                let ab = engine_ab.similarity(&a, &b);
                let ba = engine_ba.similarity(&b, &a);
                prop_assert!((ab - ba).abs() < 1e-12, "ab={} ba={}", ab, ba);
            }

            /// 0.0 <= similarity(a, b) <= 1.0
            #[test]
            fn similarity_is_bounded(a in item(), b in item()) {
                let mut engine = SimilarityEngine::new();
                let score = engine.similarity(&a, &b);
                prop_assert!((0.0..=1.0).contains(&score), "score={}", score);
            }

            /// sequence_ratio never exceeds 1.0 even on degenerate inputs
            #[test]
            fn sequence_ratio_is_bounded(a in "[ -~]{0,60}", b in "[ -~]{0,60}") {
                let score = sequence_ratio(&a, &b);
                prop_assert!((0.0..=1.0).contains(&score), "score={}", score);
            }
        }
    }
}
