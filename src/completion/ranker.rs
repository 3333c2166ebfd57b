//! Tiered scoring of completion candidates against a partial token.

use std::cmp::Reverse;

use serde::{Deserialize, Serialize};

pub const DEFAULT_SUGGESTION_LIMIT: usize = 10;

const EXACT_SCORE: u32 = 100;
const PREFIX_SCORE: u32 = 80;
const CONTAINS_SCORE: u32 = 60;
const SECONDARY_SCORE: u32 = 40;
const TERTIARY_SCORE: u32 = 20;

/// A ranked candidate. The score only orders one result list.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub candidate_id: String,
    pub label: String,
    pub score: u32,
}

/// Something that can be offered as a completion.
pub trait Candidate {
    fn candidate_id(&self) -> &str;

    /// The text matched by the top three tiers
    fn key(&self) -> &str;

    fn label(&self) -> String {
        self.key().to_string()
    }

    fn secondary(&self) -> Option<&str> {
        None
    }

    fn tertiary(&self) -> Option<&str> {
        None
    }
}

impl Candidate for &str {
    fn candidate_id(&self) -> &str {
        self
    }

    fn key(&self) -> &str {
        self
    }
}

impl Candidate for String {
    fn candidate_id(&self) -> &str {
        self
    }

    fn key(&self) -> &str {
        self
    }
}

/// First matching tier wins; 0 means no match.
pub fn score_candidate(query: &str, candidate: &impl Candidate) -> u32 {
    let query = query.trim().to_lowercase();
    let contains = |field: Option<&str>| field.is_some_and(|f| f.to_lowercase().contains(&query));
    let key = candidate.key().to_lowercase();

    if key == query {
        EXACT_SCORE
    } else if key.starts_with(&query) {
        PREFIX_SCORE
    } else if key.contains(&query) {
        CONTAINS_SCORE
    } else if contains(candidate.secondary()) {
        SECONDARY_SCORE
    } else if contains(candidate.tertiary()) {
        TERTIARY_SCORE
    } else {
        0
    }
}

/// Ranks `candidates` against `query`, best first.
///
/// Equal scores keep the candidates' input order. A blank query skips scoring
/// and returns the first `limit` candidates as given.
pub fn suggest<C: Candidate>(query: &str, candidates: &[C], limit: usize) -> Vec<Suggestion> {
    let to_suggestion = |candidate: &C, score: u32| Suggestion {
        candidate_id: candidate.candidate_id().to_string(),
        label: candidate.label(),
        score,
    };

    if query.trim().is_empty() {
        return candidates
            .iter()
            .take(limit)
            .map(|candidate| to_suggestion(candidate, 0))
            .collect();
    }

    let mut scored: Vec<(&C, u32)> = candidates
        .iter()
        .map(|candidate| (candidate, score_candidate(query, candidate)))
        .filter(|(_, score)| *score > 0)
        .collect();
    // stable: ties stay in candidate order
    scored.sort_by_key(|(_, score)| Reverse(*score));

    scored
        .into_iter()
        .take(limit)
        .map(|(candidate, score)| to_suggestion(candidate, score))
        .collect()
}
