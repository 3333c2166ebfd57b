//! Supersession of in-flight queries.
//!
//! Each keystroke issues a new [`Generation`]; a result is delivered only if
//! no newer generation was issued while it was being computed.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash, Serialize, Deserialize)]
pub struct Generation(pub u64);

/// A value tagged with the generation of the query that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tagged<T> {
    pub generation: Generation,
    pub value: T,
}

#[derive(Debug, Default)]
pub struct Generations {
    latest: AtomicU64,
}

impl Generations {
    pub fn new() -> Generations {
        Generations::default()
    }

    /// Issues a token newer than every token issued before.
    pub fn issue(&self) -> Generation {
        Generation(self.latest.fetch_add(1, Ordering::AcqRel) + 1)
    }

    pub fn latest(&self) -> Generation {
        Generation(self.latest.load(Ordering::Acquire))
    }

    pub fn is_latest(&self, generation: Generation) -> bool {
        self.latest() == generation
    }

    /// `Some(value)` if `generation` is still the newest issued token.
    pub fn accept<T>(&self, tagged: Tagged<T>) -> Option<T> {
        if self.is_latest(tagged.generation) {
            Some(tagged.value)
        } else {
            tracing::debug!(
                stale = tagged.generation.0,
                latest = self.latest().0,
                "dropping superseded result"
            );
            None
        }
    }
}
