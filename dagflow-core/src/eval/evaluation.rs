//! Results of one evaluation pass.

use std::ops::Index;

use indexmap::IndexMap;

/// Per-node results of a completed pass, keyed by node identity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evaluation {
    results: IndexMap<String, i64>,
    order: Vec<String>,
    workers: usize,
}

impl Evaluation {
    pub(crate) fn new(
        results: IndexMap<String, i64>,
        order: Vec<String>,
        workers: usize,
    ) -> Self {
        Self {
            results,
            order,
            workers,
        }
    }

    /// Result of the node with this identity.
    pub fn get(&self, id: &str) -> Option<i64> {
        self.results.get(id).copied()
    }

    /// Number of evaluated nodes.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Whether the pass evaluated no nodes.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// `(identity, result)` pairs in graph discovery order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> + '_ {
        self.results.iter().map(|(id, &result)| (id.as_str(), result))
    }

    /// The order nodes were fed to the workers.
    pub fn order(&self) -> &[String] {
        &self.order
    }

    /// Worker count the pass ran with.
    pub fn workers(&self) -> usize {
        self.workers
    }
}

impl Index<&str> for Evaluation {
    type Output = i64;

    /// # Panics
    ///
    /// Panics if no node has this identity.
    fn index(&self, id: &str) -> &i64 {
        &self.results[id]
    }
}
