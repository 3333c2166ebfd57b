//! Backlink graph: documents and the entities they reference.
//!
//! Edges are derived data. [`rebuild_edges`] recomputes a document's whole
//! edge set from its resolved references, and [`BacklinkGraph`] swaps that set
//! in atomically. Nothing is ever patched in place.
//!
//! ```text
//! text ──resolve_references──▶ ResolvedReference[] ──rebuild_edges──▶ GraphEdge[]
//!                                                                        │
//!                                      BacklinkIndex::apply(doc, rev) ◀──┘
//! ```

mod builder;
mod index;

pub use builder::{rebuild_all, rebuild_edges, GraphEdge, NodeId, RegistryProbe};
pub use index::{BacklinkGraph, BacklinkIndex, GraphNode};
