//! Graph Validation
//!
//! A graph is accepted only if it passes two independent checks:
//!
//! 1. **Acyclicity.** A three-state depth-first traversal over successor
//!    edges. Meeting a node that is still on the traversal path is a cycle.
//!
//! 2. **Connectivity.** Edges express evaluation order, so a graph made of
//!    several unrelated fragments must be rejected even though each fragment
//!    is a perfectly good DAG on its own. We build a pairwise reachability
//!    table: a forward pass records every ancestor to descendant pair, a
//!    second pass over the edge-reversed topology records every descendant
//!    to ancestor pair, and the merged relation is closed transitively. Every
//!    ordered pair of distinct nodes must end up connected.

use tracing::{debug, trace, warn};

use super::topology::{Graph, Topology};
use crate::error::{GraphError, Result};

/// Square bit table; row `i` holds the vertices connected to `i`.
#[derive(Debug, Clone)]
struct Reachability {
    len: usize,
    words: usize,
    bits: Vec<u64>,
}

impl Reachability {
    fn new(len: usize) -> Self {
        let words = len.div_ceil(64);
        Self {
            len,
            words,
            bits: vec![0; words * len],
        }
    }

    fn get(&self, from: usize, to: usize) -> bool {
        self.bits[from * self.words + to / 64] & (1 << (to % 64)) != 0
    }

    fn set(&mut self, from: usize, to: usize) {
        self.bits[from * self.words + to / 64] |= 1 << (to % 64);
    }

    fn row(&self, vertex: usize) -> &[u64] {
        &self.bits[vertex * self.words..(vertex + 1) * self.words]
    }

    /// `row(dst) |= row(src)`.
    fn merge_row(&mut self, dst: usize, src: usize) {
        if dst == src {
            return;
        }
        for word in 0..self.words {
            self.bits[dst * self.words + word] |= self.bits[src * self.words + word];
        }
    }

    /// Close the relation transitively, ignoring direction: afterwards
    /// `get(i, j)` holds whenever a chain of recorded pairs links `i` and
    /// `j`. Each linked group becomes a block of fully set rows.
    fn close(&mut self) {
        let mut assigned = vec![false; self.len];
        let mut stack = Vec::new();

        for start in 0..self.len {
            if assigned[start] {
                continue;
            }
            assigned[start] = true;
            stack.push(start);
            let mut members = Vec::new();

            while let Some(vertex) = stack.pop() {
                members.push(vertex);
                for other in 0..self.len {
                    if !assigned[other] && (self.get(vertex, other) || self.get(other, vertex)) {
                        assigned[other] = true;
                        stack.push(other);
                    }
                }
            }

            let mut group = vec![0u64; self.words];
            for &member in &members {
                group[member / 64] |= 1 << (member % 64);
            }
            for &member in &members {
                self.bits[member * self.words..(member + 1) * self.words]
                    .copy_from_slice(&group);
            }
        }
    }

    /// First ordered pair of distinct vertices that is not connected.
    fn first_gap(&self) -> Option<(usize, usize)> {
        (0..self.len).find_map(|from| {
            (0..self.len)
                .find(|&to| to != from && !self.get(from, to))
                .map(|to| (from, to))
        })
    }
}

/// Records `from -> descendant` for every descendant of every vertex.
///
/// `finished` must be a post-order of `topology`, so each vertex is handled
/// after all of its successors and can absorb their rows.
fn record_descendants(
    topology: &Topology,
    finished: &[usize],
    mut mark: impl FnMut(usize, usize),
) {
    let mut descendants = Reachability::new(topology.len());
    for &vertex in finished {
        for &child in topology.next(vertex) {
            descendants.set(vertex, child);
            descendants.merge_row(vertex, child);
        }
        let row = descendants.row(vertex);
        for to in 0..topology.len() {
            if row[to / 64] & (1 << (to % 64)) != 0 {
                mark(vertex, to);
            }
        }
    }
}

impl Graph {
    /// Check that the graph is acyclic and forms a single component when
    /// edge direction is ignored.
    ///
    /// Called by [`GraphBuilder::build`](super::GraphBuilder::build); a
    /// graph obtained from the builder has already passed.
    pub fn validate(&self) -> Result<()> {
        let finished = self.check_acyclic()?;
        self.check_connected(&finished)?;
        debug!(nodes = self.len(), "graph validated");
        Ok(())
    }

    /// Returns the post-order of the forward topology on success.
    fn check_acyclic(&self) -> Result<Vec<usize>> {
        self.topology().post_order().map_err(|edge| {
            warn!(
                from = self.name(edge.from),
                to = self.name(edge.to),
                "cycle: node is referenced by a descendant"
            );
            self.cycle_error(edge)
        })
    }

    fn check_connected(&self, finished: &[usize]) -> Result<()> {
        let mut connected = Reachability::new(self.len());

        record_descendants(self.topology(), finished, |ancestor, descendant| {
            connected.set(ancestor, descendant);
        });

        let reversed = self.topology().reversed();
        let reversed_finished = reversed
            .post_order()
            .map_err(|edge| self.cycle_error(edge))?;
        record_descendants(&reversed, &reversed_finished, |descendant, ancestor| {
            connected.set(descendant, ancestor);
        });
        trace!(nodes = self.len(), "forward and reversed passes recorded");

        connected.close();

        match connected.first_gap() {
            None => Ok(()),
            Some((from, to)) => {
                warn!(
                    node = self.name(to),
                    from = self.name(from),
                    "disconnect: node is not connected"
                );
                Err(GraphError::Disconnected {
                    node: self.name(to).to_owned(),
                    from: self.name(from).to_owned(),
                })
            }
        }
    }
}
