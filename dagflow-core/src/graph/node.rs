//! Graph Nodes
//!
//! This module defines the nodes declared on a [`GraphBuilder`] and the
//! handles used to refer to them.
//!
//! [`GraphBuilder`]: super::GraphBuilder

use std::fmt;
use std::sync::Arc;

use smallvec::SmallVec;

use super::aggregate::Aggregate;

/// Handle to a node declared on a [`GraphBuilder`](super::GraphBuilder).
///
/// Handles are plain indices into the builder's arena. They are cheap to
/// copy and carry no ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Get the raw arena index.
    pub fn raw(&self) -> usize {
        self.0
    }
}

impl From<usize> for NodeId {
    fn from(index: usize) -> Self {
        Self(index)
    }
}

/// Successor lists are short in practice; keep the common case inline.
pub(crate) type Successors = SmallVec<[NodeId; 4]>;

/// A computation step: an identity, an aggregation behavior and the edges to
/// the nodes that consume its output.
pub struct Node {
    /// Identity, unique within a graph.
    id: String,

    /// How arrived inputs become this node's result.
    aggregate: Arc<dyn Aggregate>,

    /// Nodes that depend on this node, in declaration order.
    next: Successors,
}

impl Node {
    pub(crate) fn new(id: String, aggregate: Arc<dyn Aggregate>) -> Self {
        Self {
            id,
            aggregate,
            next: Successors::new(),
        }
    }

    /// Get the node's identity.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the node's aggregation behavior.
    pub fn aggregate(&self) -> &Arc<dyn Aggregate> {
        &self.aggregate
    }

    /// Get the successors this node feeds into.
    pub fn next(&self) -> &[NodeId] {
        &self.next
    }

    /// Add a successor. Repeated edges to the same node collapse into one.
    pub(crate) fn add_next(&mut self, successor: NodeId) {
        if !self.next.contains(&successor) {
            self.next.push(successor);
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("next", &self.next)
            .finish_non_exhaustive()
    }
}
