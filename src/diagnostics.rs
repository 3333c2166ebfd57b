use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::graph::RegistryProbe;
use crate::parser::{resolve_references, ReferenceKind, ResolvedReference, Span};

const SOURCE: &str = "refgraph";

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    Error,
    Warning,
    Information,
    Hint,
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub span: Span,
    pub severity: DiagnosticSeverity,
    pub message: String,
    pub source: String,
}

/// One diagnostic per reference in `text` whose target does not exist.
pub fn document_diagnostics<P>(text: &str, probe: &P) -> Vec<Diagnostic>
where
    P: RegistryProbe + Sync,
{
    reference_diagnostics(&resolve_references(text), probe)
}

/// Like [`document_diagnostics`] for references that were already extracted.
pub fn reference_diagnostics<P>(references: &[ResolvedReference], probe: &P) -> Vec<Diagnostic>
where
    P: RegistryProbe + Sync,
{
    references
        .par_iter()
        .filter(|reference| probe.probe(reference.kind, &reference.identifier).is_none())
        .map(|reference| {
            // Count how many times this same target appears in the document
            let usage_count = references
                .iter()
                .filter(|other| same_target(other, reference))
                .count();

            Diagnostic {
                span: reference.span,
                severity: DiagnosticSeverity::Information,
                message: generate_diagnostic_message(reference, usage_count),
                source: SOURCE.to_string(),
            }
        })
        .collect()
}

fn same_target(a: &ResolvedReference, b: &ResolvedReference) -> bool {
    match (a.kind, b.kind) {
        (ReferenceKind::Block, ReferenceKind::Block) => a.identifier == b.identifier,
        (ReferenceKind::Block, _) | (_, ReferenceKind::Block) => false,
        _ => a.identifier.to_lowercase() == b.identifier.to_lowercase(),
    }
}

fn generate_diagnostic_message(reference: &ResolvedReference, usage_count: usize) -> String {
    let base_message = match reference.kind {
        ReferenceKind::Page | ReferenceKind::Alias => {
            format!("Unresolved page reference '{}'", reference.identifier)
        }
        ReferenceKind::Block => format!("Unresolved block reference '{}'", reference.identifier),
    };

    // Append usage count if the reference appears multiple times
    if usage_count > 1 {
        format!("{} (used {} times)", base_message, usage_count)
    } else {
        base_message
    }
}
