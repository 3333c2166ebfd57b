use std::collections::HashSet;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::parser::{ReferenceKind, ResolvedReference};

/// Identity of a page or block in the content registry.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "lowercase")]
pub enum NodeId {
    Page(String),
    Block(String),
}

impl NodeId {
    pub fn id(&self) -> &str {
        match self {
            NodeId::Page(id) | NodeId::Block(id) => id,
        }
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeId::Page(id) => write!(f, "page:{id}"),
            NodeId::Block(id) => write!(f, "block:{id}"),
        }
    }
}

/// A directed reference from a document to the entity it names.
///
/// Broken references are kept as edges with `to: None` and `exists: false`.
#[derive(Debug, PartialEq, Eq, Clone, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphEdge {
    pub from: NodeId,
    pub to: Option<NodeId>,
    pub kind: ReferenceKind,
    /// The identifier as written in the document
    pub target: String,
    pub exists: bool,
}

/// Looks up whether a reference target exists in the registry.
pub trait RegistryProbe {
    fn probe(&self, kind: ReferenceKind, identifier: &str) -> Option<NodeId>;
}

impl<F> RegistryProbe for F
where
    F: Fn(ReferenceKind, &str) -> Option<NodeId>,
{
    fn probe(&self, kind: ReferenceKind, identifier: &str) -> Option<NodeId> {
        self(kind, identifier)
    }
}

/// Computes the complete edge set of one document.
///
/// Each distinct `(kind, identifier)` pair yields one edge, in order of first
/// appearance, so the result depends only on the inputs.
pub fn rebuild_edges(
    document_id: &str,
    references: &[ResolvedReference],
    probe: &impl RegistryProbe,
) -> Vec<GraphEdge> {
    let from = NodeId::Page(document_id.to_string());
    let mut seen = HashSet::new();

    references
        .iter()
        .filter(|reference| seen.insert((reference.kind, reference.identifier.as_str())))
        .map(|reference| {
            let to = probe.probe(reference.kind, &reference.identifier);
            GraphEdge {
                from: from.clone(),
                exists: to.is_some(),
                to,
                kind: reference.kind,
                target: reference.identifier.clone(),
            }
        })
        .collect()
}

/// Rebuilds many documents in parallel. Output order follows `documents`.
pub fn rebuild_all<P>(
    documents: &[(String, Vec<ResolvedReference>)],
    probe: &P,
) -> Vec<(String, Vec<GraphEdge>)>
where
    P: RegistryProbe + Sync,
{
    documents
        .par_iter()
        .map(|(document_id, references)| {
            (
                document_id.clone(),
                rebuild_edges(document_id, references, probe),
            )
        })
        .collect()
}
