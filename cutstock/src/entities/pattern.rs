use std::collections::HashMap;

use crate::entities::Instance;

/// Stable index of a pattern in the [`PatternPool`].
pub type PatternId = usize;

/// A cutting pattern: how many pieces of each item type one roll yields.
///
/// Two patterns with equal count vectors are the same pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pattern {
    pub counts: Vec<u64>,
}

impl Pattern {
    pub fn new(counts: Vec<u64>) -> Self {
        Self { counts }
    }

    /// Total width consumed by the pattern.
    pub fn total_width(&self, instance: &Instance) -> f64 {
        self.counts
            .iter()
            .zip(&instance.items)
            .map(|(&c, item)| c as f64 * item.width)
            .sum()
    }

    /// Whether the pattern fits within the roll capacity (within float tolerance).
    pub fn fits(&self, instance: &Instance) -> bool {
        self.total_width(instance) <= instance.capacity * (1.0 + 1e-9)
    }

    /// Whether the pattern yields at least one piece of item `i`.
    pub fn covers(&self, i: usize) -> bool {
        self.counts[i] > 0
    }
}

/// Deduplicated, monotonically growing arena of feasible patterns.
///
/// Patterns are addressed by stable [`PatternId`]; the pool never shrinks and
/// never holds two entries with the same count vector. Restricted solves are
/// expressed by index-subsetting, not by deletion.
#[derive(Debug, Clone, Default)]
pub struct PatternPool {
    patterns: Vec<Pattern>,
    by_counts: HashMap<Vec<u64>, PatternId>,
}

impl PatternPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pool seeded with one single-item pattern per item: `a_i = floor(W / w_i)`.
    pub fn seeded(instance: &Instance) -> Self {
        let mut pool = Self::new();
        let m = instance.n_items();
        for (i, item) in instance.items.iter().enumerate() {
            let mut counts = vec![0u64; m];
            counts[i] = (instance.capacity / item.width).floor() as u64;
            pool.insert(Pattern::new(counts));
        }
        pool
    }

    /// Inserts a pattern if absent. Returns its id and whether it was new.
    pub fn insert(&mut self, pattern: Pattern) -> (PatternId, bool) {
        if let Some(&id) = self.by_counts.get(&pattern.counts) {
            return (id, false);
        }
        let id = self.patterns.len();
        self.by_counts.insert(pattern.counts.clone(), id);
        self.patterns.push(pattern);
        (id, true)
    }

    pub fn pattern(&self, id: PatternId) -> &Pattern {
        &self.patterns[id]
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PatternId, &Pattern)> {
        self.patterns.iter().enumerate()
    }
}
