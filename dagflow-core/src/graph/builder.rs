//! Graph Builder
//!
//! Nodes are declared on a [`GraphBuilder`], which owns them in an arena and
//! hands out [`NodeId`] handles. Edges are fixed before [`GraphBuilder::build`]
//! consumes the builder: it discovers every node reachable from the entry
//! handles, keys them by identity and validates the result.

use std::sync::Arc;

use indexmap::map::Entry;
use indexmap::IndexMap;
use smallvec::SmallVec;
use tracing::{debug, trace};

use super::aggregate::Aggregate;
use super::node::{Node, NodeId};
use super::topology::{Edges, Graph, Topology};
use crate::error::{GraphError, Result};

/// Arena of declared nodes, turned into a validated [`Graph`] by
/// [`build`](Self::build).
#[derive(Debug, Default)]
pub struct GraphBuilder {
    nodes: Vec<Node>,
}

impl GraphBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a node feeding into `next`.
    ///
    /// Successors must already be declared. Listing the same successor twice
    /// adds a single edge. Handles not issued by this builder are reported by
    /// [`build`](Self::build) if they are reachable.
    pub fn node<A>(
        &mut self,
        id: impl Into<String>,
        aggregate: A,
        next: impl IntoIterator<Item = NodeId>,
    ) -> NodeId
    where
        A: Aggregate + 'static,
    {
        let handle = NodeId::new(self.nodes.len());
        let mut node = Node::new(id.into(), Arc::new(aggregate));
        for successor in next {
            node.add_next(successor);
        }
        self.nodes.push(node);
        handle
    }

    /// Add an edge `from -> to` between two declared nodes.
    ///
    /// This is the only way to point a node at one declared after it, and so
    /// the only way to declare a cycle.
    pub fn connect(&mut self, from: NodeId, to: NodeId) -> Result<()> {
        self.check(to)?;
        self.nodes
            .get_mut(from.raw())
            .ok_or(GraphError::UnknownNode { index: from.raw() })?
            .add_next(to);
        Ok(())
    }

    /// Get a declared node.
    pub fn get(&self, handle: NodeId) -> Option<&Node> {
        self.nodes.get(handle.raw())
    }

    /// Number of declared nodes, reachable or not.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether no nodes have been declared.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn check(&self, handle: NodeId) -> Result<()> {
        if handle.raw() < self.nodes.len() {
            Ok(())
        } else {
            Err(GraphError::UnknownNode {
                index: handle.raw(),
            })
        }
    }

    /// Build a graph from every node reachable from `entries`.
    ///
    /// Entries may overlap. Fails if two distinct reachable nodes share an
    /// identity, if the graph has a cycle, or if it splits into more than one
    /// component when edge direction is ignored. No graph is returned on
    /// failure.
    pub fn build(self, entries: impl IntoIterator<Item = NodeId>) -> Result<Graph> {
        let discovered = self.discover(entries)?;

        // Vertex index of each arena slot, for slots that were discovered.
        let mut vertex_of = vec![None; self.nodes.len()];
        for (vertex, handle) in discovered.values().enumerate() {
            vertex_of[handle.raw()] = Some(vertex);
        }

        let mut next = Vec::with_capacity(discovered.len());
        let mut nodes = IndexMap::with_capacity(discovered.len());
        for (id, handle) in &discovered {
            let node = &self.nodes[handle.raw()];
            let edges: Edges = node
                .next()
                .iter()
                .filter_map(|successor| vertex_of[successor.raw()])
                .collect();
            next.push(edges);
            nodes.insert(id.clone(), Arc::clone(node.aggregate()));
        }

        let graph = Graph::from_parts(nodes, Topology::new(next));
        graph.validate()?;

        debug!(
            nodes = graph.len(),
            declared = self.nodes.len(),
            "graph built"
        );
        Ok(graph)
    }

    /// Depth-first discovery from each entry in turn, recording every node
    /// under its identity in visiting order.
    fn discover(
        &self,
        entries: impl IntoIterator<Item = NodeId>,
    ) -> Result<IndexMap<String, NodeId>> {
        let mut discovered: IndexMap<String, NodeId> = IndexMap::new();
        let mut seen = vec![false; self.nodes.len()];
        let mut stack: SmallVec<[NodeId; 16]> = SmallVec::new();

        for entry in entries {
            stack.push(entry);
            while let Some(handle) = stack.pop() {
                self.check(handle)?;
                if std::mem::replace(&mut seen[handle.raw()], true) {
                    continue;
                }

                let node = &self.nodes[handle.raw()];
                match discovered.entry(node.id().to_owned()) {
                    Entry::Occupied(existing) if *existing.get() != handle => {
                        debug!(id = node.id(), "duplicate node ID");
                        return Err(GraphError::DuplicateIdentity {
                            id: node.id().to_owned(),
                        });
                    }
                    Entry::Occupied(_) => {}
                    Entry::Vacant(slot) => {
                        trace!(id = node.id(), "discovered");
                        slot.insert(handle);
                    }
                }

                // Reversed so the first successor is visited first.
                stack.extend(node.next().iter().rev().copied());
            }
        }

        Ok(discovered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::aggregate::{Constant, Max, Min, Sum};

    #[test]
    fn discovers_everything_reachable() {
        let mut builder = GraphBuilder::new();
        let sum = builder.node("sum", Sum, []);
        let max = builder.node("max", Max, [sum]);
        let one = builder.node("1", Constant(1), [max]);
        let two = builder.node("2", Constant(2), [max]);
        builder.node("unused", Min, []);

        let graph = builder.build([one, two]).unwrap();
        assert_eq!(graph.ids().collect::<Vec<_>>(), vec!["1", "max", "sum", "2"]);
        assert!(!graph.contains("unused"));
        assert_eq!(graph.node("max").unwrap().indegree(), 2);
    }

    #[test]
    fn overlapping_entries_are_fine() {
        let mut builder = GraphBuilder::new();
        let sum = builder.node("sum", Sum, []);
        let one = builder.node("1", Constant(1), [sum]);

        let graph = builder.build([one, sum, one]).unwrap();
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn duplicate_identity_is_rejected() {
        let mut builder = GraphBuilder::new();
        let first = builder.node("a", Constant(1), []);
        let second = builder.node("a", Constant(2), []);
        let top = builder.node("top", Sum, [first, second]);

        assert_eq!(
            builder.build([top]).unwrap_err(),
            GraphError::DuplicateIdentity { id: "a".into() }
        );
    }

    #[test]
    fn repeated_edge_counts_once() {
        let mut builder = GraphBuilder::new();
        let sum = builder.node("sum", Sum, []);
        let one = builder.node("1", Constant(1), [sum, sum]);
        builder.connect(one, sum).unwrap();

        let graph = builder.build([one]).unwrap();
        assert_eq!(graph.node("sum").unwrap().indegree(), 1);
    }

    #[test]
    fn unknown_handles_are_rejected() {
        let mut builder = GraphBuilder::new();
        let a = builder.node("a", Sum, []);
        let stray = NodeId::from(7);

        assert_eq!(
            builder.connect(a, stray),
            Err(GraphError::UnknownNode { index: 7 })
        );
        assert_eq!(
            builder.connect(stray, a),
            Err(GraphError::UnknownNode { index: 7 })
        );

        let b = builder.node("b", Sum, [stray]);
        assert_eq!(
            builder.build([b]).unwrap_err(),
            GraphError::UnknownNode { index: 7 }
        );
    }

    #[test]
    fn connect_declares_cycles() {
        let mut builder = GraphBuilder::new();
        let b = builder.node("B", Sum, []);
        let a = builder.node("A", Sum, [b]);
        builder.connect(b, a).unwrap();

        assert!(matches!(
            builder.build([a]),
            Err(GraphError::Cycle { .. })
        ));
    }

    #[test]
    fn declared_nodes_are_inspectable() {
        let mut builder = GraphBuilder::new();
        assert!(builder.is_empty());

        let sum = builder.node("sum", Sum, []);
        let one = builder.node("1", Constant(1), [sum, sum]);
        builder.node("unused", Min, []);
        assert_eq!(builder.len(), 3);
        assert!(!builder.is_empty());

        let node = builder.get(one).unwrap();
        assert_eq!(node.id(), "1");
        assert_eq!(node.next(), &[sum]);
        assert_eq!(node.aggregate().aggregate(&[]), 1);
        assert!(builder.get(NodeId::from(3)).is_none());
    }

    #[test]
    fn empty_builder_builds_empty_graph() {
        let graph = GraphBuilder::new().build([]).unwrap();
        assert!(graph.is_empty());
    }
}
