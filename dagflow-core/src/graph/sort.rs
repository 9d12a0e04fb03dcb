//! Topological Sort
//!
//! Depth-first post-order over successor edges. A node finishes only after
//! every node reachable from it has finished, so reading the finishing
//! sequence backwards (prepending each node as the traversal unwinds from
//! it) puts every node after all of its predecessors.
//!
//! The traversal keeps its own stack of `(vertex, next child)` frames instead
//! of recursing, so deep chains cannot exhaust the call stack.

use tracing::{error, trace};

use super::topology::{Graph, NodeRef, Topology};
use crate::error::{GraphError, Result};

/// Traversal state of a vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    /// On the current traversal path.
    Visiting,
    Visited,
}

/// An edge `from -> to` whose target was still on the traversal path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BackEdge {
    pub from: usize,
    pub to: usize,
}

impl Topology {
    /// Finishing order of a depth-first traversal started from every root,
    /// then from any vertex the roots did not reach.
    ///
    /// Returns the first back edge found if the topology has a cycle.
    pub(crate) fn post_order(&self) -> std::result::Result<Vec<usize>, BackEdge> {
        let mut marks = vec![Mark::Unvisited; self.len()];
        let mut finished = Vec::with_capacity(self.len());
        let mut stack: Vec<(usize, usize)> = Vec::new();

        let starts: Vec<usize> = self.roots().chain(0..self.len()).collect();
        for start in starts {
            if marks[start] != Mark::Unvisited {
                continue;
            }
            marks[start] = Mark::Visiting;
            stack.push((start, 0));

            while let Some(frame) = stack.last_mut() {
                let vertex = frame.0;
                match self.next(vertex).get(frame.1) {
                    Some(&child) => {
                        frame.1 += 1;
                        match marks[child] {
                            Mark::Unvisited => {
                                marks[child] = Mark::Visiting;
                                stack.push((child, 0));
                            }
                            Mark::Visiting => {
                                return Err(BackEdge {
                                    from: vertex,
                                    to: child,
                                })
                            }
                            Mark::Visited => {}
                        }
                    }
                    None => {
                        marks[vertex] = Mark::Visited;
                        finished.push(vertex);
                        stack.pop();
                    }
                }
            }
        }

        Ok(finished)
    }

    /// Vertex indices in dependency order.
    pub(crate) fn sorted(&self) -> std::result::Result<Vec<usize>, BackEdge> {
        let mut order = self.post_order()?;
        order.reverse();
        Ok(order)
    }
}

impl Graph {
    pub(crate) fn cycle_error(&self, edge: BackEdge) -> GraphError {
        GraphError::Cycle {
            from: self.name(edge.from).to_owned(),
            to: self.name(edge.to).to_owned(),
        }
    }

    pub(crate) fn sorted_vertices(&self) -> Result<Vec<usize>> {
        self.topology().sorted().map_err(|edge| {
            // Validation rejects cycles, so reaching this means the
            // validator and the sorter disagree.
            error!(
                from = self.name(edge.from),
                to = self.name(edge.to),
                "topological sort found a cycle in a validated graph"
            );
            self.cycle_error(edge)
        })
    }

    /// Every node exactly once, each placed after all the nodes it depends
    /// on.
    ///
    /// Traversal starts at the roots in discovery order, so the result is
    /// stable for a given builder declaration. Graphs that are equivalent
    /// but declared differently may sort differently.
    pub fn topological_sort(&self) -> Result<Vec<NodeRef<'_>>> {
        let order = self.sorted_vertices()?;
        trace!(order = ?order.iter().map(|&v| self.name(v)).collect::<Vec<_>>(), "sorted");
        Ok(order.into_iter().map(|vertex| self.vertex(vertex)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    #[test]
    fn children_finish_before_parents() {
        // 0 -> 1 -> 2
        let topology = Topology::new(vec![smallvec![1], smallvec![2], smallvec![]]);
        assert_eq!(topology.post_order(), Ok(vec![2, 1, 0]));
        assert_eq!(topology.sorted(), Ok(vec![0, 1, 2]));
    }

    #[test]
    fn shared_descendants_appear_once() {
        // 0 -> 2, 1 -> 2, 2 -> 3
        let topology =
            Topology::new(vec![smallvec![2], smallvec![2], smallvec![3], smallvec![]]);
        let order = topology.sorted().unwrap();
        assert_eq!(order.len(), 4);
        let position = |v| order.iter().position(|&x| x == v).unwrap();
        assert!(position(0) < position(2));
        assert!(position(1) < position(2));
        assert!(position(2) < position(3));
    }

    #[test]
    fn back_edge_is_reported() {
        // 0 -> 1 -> 2 -> 1
        let topology = Topology::new(vec![smallvec![1], smallvec![2], smallvec![1]]);
        assert_eq!(topology.post_order(), Err(BackEdge { from: 2, to: 1 }));
    }

    #[test]
    fn rootless_cycle_is_reported() {
        // 0 -> 1 -> 0
        let topology = Topology::new(vec![smallvec![1], smallvec![0]]);
        assert_eq!(topology.roots().count(), 0);
        assert_eq!(topology.post_order(), Err(BackEdge { from: 1, to: 0 }));
    }

    #[test]
    fn deep_chain_does_not_recurse() {
        let depth = 100_000;
        let next = (0..depth)
            .map(|v| if v + 1 < depth { smallvec![v + 1] } else { smallvec![] })
            .collect();
        let order = Topology::new(next).sorted().unwrap();
        assert_eq!(order.len(), depth);
        assert_eq!(order[0], 0);
        assert_eq!(order[depth - 1], depth - 1);
    }
}
