//! Storage for per-document edge sets.
//!
//! [`BacklinkGraph`] keeps every document's edges in one `StableDiGraph` so
//! that incoming edges of any entity can be walked directly. Node indices
//! stay valid across removals, which lets one document's edge set be swapped
//! out without renumbering anyone else's.

use std::collections::HashMap;

use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use tokio::sync::{RwLock, RwLockReadGuard};
use tracing::debug;

use super::builder::{GraphEdge, NodeId};
use crate::parser::ReferenceKind;

/// Node weight of the backlink graph.
#[derive(Debug, PartialEq, Eq, Clone, Hash)]
pub enum GraphNode {
    Entity(NodeId),
    /// Target of a broken reference. Page targets are stored lowercased.
    Missing { block: bool, target: String },
}

impl GraphNode {
    fn missing(kind: ReferenceKind, target: &str) -> GraphNode {
        match kind {
            ReferenceKind::Block => GraphNode::Missing {
                block: true,
                target: target.to_string(),
            },
            ReferenceKind::Page | ReferenceKind::Alias => GraphNode::Missing {
                block: false,
                target: target.trim().to_lowercase(),
            },
        }
    }

    fn target_of(edge: &GraphEdge) -> GraphNode {
        match &edge.to {
            Some(to) => GraphNode::Entity(to.clone()),
            None => GraphNode::missing(edge.kind, &edge.target),
        }
    }
}

#[derive(Debug, Default)]
pub struct BacklinkGraph {
    graph: StableDiGraph<GraphNode, GraphEdge>,
    nodes: HashMap<GraphNode, NodeIndex>,
    /// Edge indices of each document, in build order
    documents: HashMap<String, Vec<EdgeIndex>>,
}

impl BacklinkGraph {
    pub fn new() -> BacklinkGraph {
        BacklinkGraph::default()
    }

    pub fn build(edge_sets: impl IntoIterator<Item = (String, Vec<GraphEdge>)>) -> BacklinkGraph {
        let mut graph = BacklinkGraph::new();
        for (document_id, edges) in edge_sets {
            graph.replace_document(&document_id, edges);
        }
        graph
    }

    /// Swaps in a document's complete edge set.
    pub fn replace_document(&mut self, document_id: &str, edges: Vec<GraphEdge>) {
        let stale = self.detach(document_id);

        let from = self.node(GraphNode::Entity(NodeId::Page(document_id.to_string())));
        let indices = edges
            .into_iter()
            .map(|edge| {
                let to = self.node(GraphNode::target_of(&edge));
                self.graph.add_edge(from, to, edge)
            })
            .collect();
        self.documents.insert(document_id.to_string(), indices);

        self.prune(stale);
    }

    /// Drops a document's outgoing edges. Edges pointing at it from other
    /// documents are kept.
    pub fn remove_document(&mut self, document_id: &str) -> bool {
        if !self.documents.contains_key(document_id) {
            return false;
        }
        let stale = self.detach(document_id);
        self.documents.remove(document_id);
        let own = self
            .nodes
            .get(&GraphNode::Entity(NodeId::Page(document_id.to_string())))
            .copied();
        self.prune(stale.into_iter().chain(own).collect());
        true
    }

    pub fn outgoing(&self, document_id: &str) -> Vec<&GraphEdge> {
        self.documents
            .get(document_id)
            .map(|indices| {
                indices
                    .iter()
                    .filter_map(|index| self.graph.edge_weight(*index))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn broken_links(&self, document_id: &str) -> Vec<&GraphEdge> {
        self.outgoing(document_id)
            .into_iter()
            .filter(|edge| !edge.exists)
            .collect()
    }

    /// Edges that resolved to `target`, ordered by source document.
    pub fn backlinks(&self, target: &NodeId) -> Vec<&GraphEdge> {
        self.incoming(&GraphNode::Entity(target.clone()))
    }

    /// Edges whose target does not exist yet.
    pub fn missing_backlinks(&self, kind: ReferenceKind, target: &str) -> Vec<&GraphEdge> {
        self.incoming(&GraphNode::missing(kind, target))
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    fn incoming(&self, node: &GraphNode) -> Vec<&GraphEdge> {
        let Some(index) = self.nodes.get(node) else {
            return vec![];
        };
        let mut edges: Vec<&GraphEdge> = self
            .graph
            .edges_directed(*index, Direction::Incoming)
            .map(|edge| edge.weight())
            .collect();
        edges.sort_by(|a, b| (&a.from, a.kind).cmp(&(&b.from, b.kind)));
        edges
    }

    fn node(&mut self, key: GraphNode) -> NodeIndex {
        if let Some(index) = self.nodes.get(&key) {
            return *index;
        }
        let index = self.graph.add_node(key.clone());
        self.nodes.insert(key, index);
        index
    }

    /// Removes a document's edges and returns their target nodes.
    fn detach(&mut self, document_id: &str) -> Vec<NodeIndex> {
        let Some(indices) = self.documents.get_mut(document_id) else {
            return vec![];
        };
        let indices = std::mem::take(indices);

        indices
            .into_iter()
            .filter_map(|index| {
                let (_, target) = self.graph.edge_endpoints(index)?;
                self.graph.remove_edge(index);
                Some(target)
            })
            .collect()
    }

    /// Deletes nodes that no edge touches, unless they are live documents.
    fn prune(&mut self, candidates: Vec<NodeIndex>) {
        for index in candidates {
            let Some(weight) = self.graph.node_weight(index) else {
                continue;
            };
            let is_document = matches!(
                weight,
                GraphNode::Entity(NodeId::Page(id)) if self.documents.contains_key(id)
            );
            let connected = self.graph.neighbors_undirected(index).next().is_some();
            if is_document || connected {
                continue;
            }
            if let Some(weight) = self.graph.remove_node(index) {
                self.nodes.remove(&weight);
            }
        }
    }
}

#[derive(Debug, Default)]
struct IndexState {
    graph: BacklinkGraph,
    revisions: HashMap<String, u64>,
}

/// Shared [`BacklinkGraph`] with last-write-wins updates per document.
///
/// Callers tag each rebuild with a revision number that grows with every edit
/// of the document; a rebuild that finishes after a newer one has been
/// applied is discarded.
#[derive(Debug, Default)]
pub struct BacklinkIndex {
    state: RwLock<IndexState>,
}

impl BacklinkIndex {
    pub fn new(graph: BacklinkGraph) -> BacklinkIndex {
        BacklinkIndex {
            state: RwLock::new(IndexState {
                graph,
                revisions: HashMap::new(),
            }),
        }
    }

    /// Returns false when `revision` is older than the applied one.
    pub async fn apply(&self, document_id: &str, revision: u64, edges: Vec<GraphEdge>) -> bool {
        let mut state = self.state.write().await;
        if !Self::admit(&mut state, document_id, revision) {
            return false;
        }
        state.graph.replace_document(document_id, edges);
        true
    }

    pub async fn remove(&self, document_id: &str, revision: u64) -> bool {
        let mut state = self.state.write().await;
        if !Self::admit(&mut state, document_id, revision) {
            return false;
        }
        state.graph.remove_document(document_id);
        true
    }

    pub async fn revision(&self, document_id: &str) -> Option<u64> {
        self.state.read().await.revisions.get(document_id).copied()
    }

    pub async fn graph(&self) -> RwLockReadGuard<'_, BacklinkGraph> {
        RwLockReadGuard::map(self.state.read().await, |state| &state.graph)
    }

    fn admit(state: &mut IndexState, document_id: &str, revision: u64) -> bool {
        match state.revisions.get(document_id) {
            Some(current) if *current > revision => {
                debug!(document_id, revision, current, "dropping stale rebuild");
                false
            }
            _ => {
                state.revisions.insert(document_id.to_string(), revision);
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(from: &str, target: &str, to: Option<NodeId>) -> GraphEdge {
        GraphEdge {
            from: NodeId::Page(from.to_string()),
            exists: to.is_some(),
            to,
            kind: ReferenceKind::Page,
            target: target.to_string(),
        }
    }

    fn page(id: &str) -> NodeId {
        NodeId::Page(id.to_string())
    }

    // ========================================================================
    // BacklinkGraph
    // ========================================================================

    #[test]
    fn test_backlinks_across_documents() {
        let graph = BacklinkGraph::build(vec![
            ("b".to_string(), vec![edge("b", "Target", Some(page("target")))]),
            ("a".to_string(), vec![edge("a", "target", Some(page("target")))]),
        ]);

        let sources: Vec<_> = graph
            .backlinks(&page("target"))
            .iter()
            .map(|e| e.from.clone())
            .collect();
        assert_eq!(sources, vec![page("a"), page("b")]);
    }

    #[test]
    fn test_replace_only_touches_own_edges() {
        let mut graph = BacklinkGraph::build(vec![
            ("a".to_string(), vec![edge("a", "t", Some(page("t")))]),
            ("b".to_string(), vec![edge("b", "t", Some(page("t")))]),
        ]);

        graph.replace_document("a", vec![edge("a", "Nowhere", None)]);

        assert_eq!(graph.backlinks(&page("t")).len(), 1);
        assert_eq!(graph.outgoing("b").len(), 1);
        assert_eq!(graph.broken_links("a").len(), 1);
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn test_replace_with_same_edges_is_stable() {
        let edges = vec![edge("a", "t", Some(page("t"))), edge("a", "x", None)];
        let mut graph = BacklinkGraph::build(vec![("a".to_string(), edges.clone())]);
        graph.replace_document("a", edges.clone());

        let outgoing: Vec<GraphEdge> = graph.outgoing("a").into_iter().cloned().collect();
        assert_eq!(outgoing, edges);
    }

    #[test]
    fn test_missing_backlinks_are_case_insensitive() {
        let graph = BacklinkGraph::build(vec![
            ("a".to_string(), vec![edge("a", "Future Page", None)]),
            ("b".to_string(), vec![edge("b", "future page", None)]),
        ]);

        assert_eq!(
            graph
                .missing_backlinks(ReferenceKind::Page, "FUTURE PAGE")
                .len(),
            2
        );
    }

    #[test]
    fn test_remove_document_keeps_incoming_edges() {
        let mut graph = BacklinkGraph::build(vec![
            ("a".to_string(), vec![edge("a", "b", Some(page("b")))]),
            ("b".to_string(), vec![edge("b", "c", Some(page("c")))]),
        ]);

        assert!(graph.remove_document("b"));
        assert!(!graph.remove_document("b"));

        assert!(graph.outgoing("b").is_empty());
        assert_eq!(graph.backlinks(&page("b")).len(), 1);
        assert!(graph.backlinks(&page("c")).is_empty());
        assert_eq!(graph.document_count(), 1);
    }

    // ========================================================================
    // BacklinkIndex
    // ========================================================================

    #[tokio::test]
    async fn test_stale_revision_is_dropped() {
        let index = BacklinkIndex::default();

        assert!(index.apply("a", 2, vec![edge("a", "new", None)]).await);
        assert!(!index.apply("a", 1, vec![edge("a", "old", None)]).await);

        let graph = index.graph().await;
        let targets: Vec<_> = graph.outgoing("a").iter().map(|e| e.target.clone()).collect();
        assert_eq!(targets, vec!["new"]);
    }

    #[tokio::test]
    async fn test_remove_respects_revisions() {
        let index = BacklinkIndex::default();
        index.apply("a", 1, vec![edge("a", "t", None)]).await;

        assert!(!index.remove("a", 0).await);
        assert!(index.remove("a", 3).await);
        assert!(!index.apply("a", 2, vec![edge("a", "t", None)]).await);
        assert_eq!(index.revision("a").await, Some(3));
        assert!(index.graph().await.outgoing("a").is_empty());
    }

    #[tokio::test]
    async fn test_documents_update_independently() {
        let index = std::sync::Arc::new(BacklinkIndex::default());
        let tasks: Vec<_> = (0..16)
            .map(|i| {
                let index = index.clone();
                tokio::spawn(async move {
                    let id = format!("doc{i}");
                    index.apply(&id, 1, vec![edge(&id, "shared", None)]).await
                })
            })
            .collect();
        for task in tasks {
            assert!(task.await.unwrap());
        }

        let graph = index.graph().await;
        assert_eq!(graph.document_count(), 16);
        assert_eq!(graph.missing_backlinks(ReferenceKind::Page, "shared").len(), 16);
    }
}
