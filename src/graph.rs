//! Knowledge graph construction from session batches.
//!
//! The graph is rebuilt fully on every integration run — it has no identity
//! across runs and no incremental update path. Nodes and edges live in arena
//! vectors indexed by small integer ids rather than pointer-heavy structures.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::knowledge::{KnowledgeId, KnowledgeItem, LearningSession, SessionId};

/// Arena index of a graph node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeIx(pub u32);

/// A node in the knowledge graph: either a knowledge item or a named entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GraphNode {
    /// A knowledge item, keyed by its id and carrying its attributes
    Item {
        id: KnowledgeId,
        session_id: SessionId,
        content: String,
        categories: BTreeSet<String>,
        keywords: BTreeSet<String>,
        entities: BTreeSet<String>,
        importance: f64,
        reliability: f64,
    },
    /// A named entity referenced by one or more items
    Entity { name: String },
}

/// Relationship type carried on an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    /// Two entities appear in the same knowledge item within one session
    CoOccursIn,
}

impl std::fmt::Display for RelationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CoOccursIn => write!(f, "co_occurs_in"),
        }
    }
}

/// A directed edge between two graph nodes, scoped to one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub from: NodeIx,
    pub to: NodeIx,
    pub relation: RelationKind,
    pub session_id: SessionId,
    /// Occurrence count: how many items produced this co-occurrence
    pub strength: u32,
    /// Items that contributed to this edge
    pub supporting_items: Vec<KnowledgeId>,
}

/// Key used to look up existing nodes during construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum NodeKey {
    Item(KnowledgeId),
    Entity(String),
}

/// Directed multigraph over knowledge items and entities.
#[derive(Debug, Default)]
pub struct KnowledgeGraph {
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
    node_ix: HashMap<NodeKey, NodeIx>,
    // One co-occurrence edge per (entity pair, session); strength counts repeats
    edge_ix: HashMap<(NodeIx, NodeIx, SessionId), usize>,
}

impl KnowledgeGraph {
    /// Build a graph from a batch of sessions.
    ///
    /// Every item becomes an item node; every entity named by any item becomes
    /// an entity node; every unordered pair of distinct entities appearing in
    /// the same item adds or strengthens a session-scoped co-occurrence edge.
    pub fn build(sessions: &[LearningSession]) -> Self {
        let mut graph = Self::default();

        for session in sessions {
            for item in &session.items {
                graph.add_item_node(session.id.clone(), item);

                let entity_ixs: Vec<NodeIx> = item
                    .entities
                    .iter()
                    .map(|name| graph.intern_entity(name))
                    .collect();

                for (i, &a) in entity_ixs.iter().enumerate() {
                    for &b in &entity_ixs[i + 1..] {
                        graph.record_co_occurrence(a, b, session.id.clone(), item.id.clone());
                    }
                }
            }
        }

        graph
    }

    fn add_item_node(&mut self, session_id: SessionId, item: &KnowledgeItem) {
        let ix = NodeIx(self.nodes.len() as u32);
        self.nodes.push(GraphNode::Item {
            id: item.id.clone(),
            session_id,
            content: item.content.clone(),
            categories: item.categories.clone(),
            keywords: item.keywords.clone(),
            entities: item.entities.clone(),
            importance: item.importance,
            reliability: item.reliability,
        });
        self.node_ix.insert(NodeKey::Item(item.id.clone()), ix);
    }

    fn intern_entity(&mut self, name: &str) -> NodeIx {
        let key = NodeKey::Entity(name.to_string());
        if let Some(&ix) = self.node_ix.get(&key) {
            return ix;
        }
        let ix = NodeIx(self.nodes.len() as u32);
        self.nodes.push(GraphNode::Entity {
            name: name.to_string(),
        });
        self.node_ix.insert(key, ix);
        ix
    }

    fn record_co_occurrence(
        &mut self,
        a: NodeIx,
        b: NodeIx,
        session_id: SessionId,
        item_id: KnowledgeId,
    ) {
        // Unordered pair: normalize so (a,b) and (b,a) hit the same edge
        let (from, to) = if a <= b { (a, b) } else { (b, a) };
        let key = (from, to, session_id.clone());

        if let Some(&edge_pos) = self.edge_ix.get(&key) {
            let edge = &mut self.edges[edge_pos];
            edge.strength += 1;
            edge.supporting_items.push(item_id);
        } else {
            self.edge_ix.insert(key, self.edges.len());
            self.edges.push(GraphEdge {
                from,
                to,
                relation: RelationKind::CoOccursIn,
                session_id,
                strength: 1,
                supporting_items: vec![item_id],
            });
        }
    }

    /// Look up an item node index by item id.
    pub fn item_node(&self, id: &KnowledgeId) -> Option<NodeIx> {
        self.node_ix.get(&NodeKey::Item(id.clone())).copied()
    }

    /// Look up an entity node index by name.
    pub fn entity_node(&self, name: &str) -> Option<NodeIx> {
        self.node_ix.get(&NodeKey::Entity(name.to_string())).copied()
    }

    pub fn node(&self, ix: NodeIx) -> Option<&GraphNode> {
        self.nodes.get(ix.0 as usize)
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// All edges touching the given node.
    pub fn edges_of(&self, ix: NodeIx) -> impl Iterator<Item = &GraphEdge> {
        self.edges.iter().filter(move |e| e.from == ix || e.to == ix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::KnowledgeItem;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    fn session_with(items: Vec<KnowledgeItem>) -> LearningSession {
        LearningSession::new(Utc::now(), items)
    }

    #[test]
    fn test_item_and_entity_nodes() {
        let item = KnowledgeItem::new("AIVA composes music").with_entities(["AIVA", "Amper Music"]);
        let item_id = item.id.clone();
        let session = session_with(vec![item]);

        let graph = KnowledgeGraph::build(std::slice::from_ref(&session));

        // one item node + two entity nodes
        assert_eq!(graph.node_count(), 3);
        assert!(graph.item_node(&item_id).is_some());
        assert!(graph.entity_node("AIVA").is_some());
        assert!(graph.entity_node("Amper Music").is_some());
    }

    #[test]
    fn test_co_occurrence_edge_strength() {
        let a = KnowledgeItem::new("first").with_entities(["AIVA", "Amper Music"]);
        let b = KnowledgeItem::new("second").with_entities(["AIVA", "Amper Music"]);
        let session = session_with(vec![a, b]);

        let graph = KnowledgeGraph::build(std::slice::from_ref(&session));

        // Same entity pair in the same session collapses into one edge
        assert_eq!(graph.edge_count(), 1);
        let edge = &graph.edges()[0];
        assert_eq!(edge.strength, 2);
        assert_eq!(edge.supporting_items.len(), 2);
        assert_eq!(edge.relation, RelationKind::CoOccursIn);
    }

    #[test]
    fn test_edges_scoped_per_session() {
        let make = || KnowledgeItem::new("x").with_entities(["A", "B"]);
        let s1 = session_with(vec![make()]);
        let s2 = session_with(vec![make()]);

        let graph = KnowledgeGraph::build(&[s1, s2]);

        // Same entity pair in two sessions stays two edges
        assert_eq!(graph.edge_count(), 2);
        assert!(graph.edges().iter().all(|e| e.strength == 1));
    }

    #[test]
    fn test_single_entity_item_has_no_edges() {
        let session = session_with(vec![KnowledgeItem::new("x").with_entities(["A"])]);
        let graph = KnowledgeGraph::build(std::slice::from_ref(&session));
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_build_is_idempotent() {
        let items = vec![
            KnowledgeItem::new("one").with_entities(["A", "B", "C"]),
            KnowledgeItem::new("two").with_entities(["B", "C"]),
        ];
        let session = session_with(items);
        let sessions = [session];

        let g1 = KnowledgeGraph::build(&sessions);
        let g2 = KnowledgeGraph::build(&sessions);

        assert_eq!(g1.nodes(), g2.nodes());
        assert_eq!(g1.edges(), g2.edges());
    }

    #[test]
    fn test_edges_of_entity() {
        let session = session_with(vec![KnowledgeItem::new("x").with_entities(["A", "B", "C"])]);
        let graph = KnowledgeGraph::build(std::slice::from_ref(&session));

        let a = graph.entity_node("A").unwrap();
        assert_eq!(graph.edges_of(a).count(), 2);
    }
}
