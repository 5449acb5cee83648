//! Stock eviction policy.

use parley_core::storage::{EvictionCandidate, EvictionPolicy};

/// Deletes the oldest `ceil(fraction × N)` keys by their `timestamp` field.
///
/// The sort is stable, so keys with equal timestamps go in enumeration order.
#[derive(Debug, Clone, PartialEq)]
pub struct OldestFraction {
    fraction: f64,
}

impl OldestFraction {
    pub fn new(fraction: f64) -> Self {
        Self {
            fraction: fraction.clamp(0.0, 1.0),
        }
    }
}

impl Default for OldestFraction {
    fn default() -> Self {
        Self::new(0.25)
    }
}

impl EvictionPolicy for OldestFraction {
    fn name(&self) -> &str {
        "oldest-fraction"
    }

    fn select(&self, candidates: &[EvictionCandidate]) -> Vec<String> {
        let count = (candidates.len() as f64 * self.fraction).ceil() as usize;

        let mut ordered: Vec<&EvictionCandidate> = candidates.iter().collect();
        ordered.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));

        ordered
            .into_iter()
            .take(count)
            .map(|candidate| candidate.key.clone())
            .collect()
    }
}
