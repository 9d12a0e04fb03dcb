//! Graph Topology
//!
//! A validated [`Graph`] is an arena: every node lives at a fixed vertex
//! index, identities map to indices through an insertion-ordered map, and
//! edges are stored as index lists. Nothing here changes after
//! construction, so a graph can be shared freely between evaluations.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use smallvec::SmallVec;

use super::aggregate::Aggregate;

pub(crate) type Edges = SmallVec<[usize; 4]>;

/// Edge structure of a graph, keyed by vertex index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Topology {
    next: Vec<Edges>,
    indegree: Vec<usize>,
}

impl Topology {
    /// Build a topology from per-vertex successor lists.
    ///
    /// Successor lists must already be free of repeated targets.
    pub(crate) fn new(next: Vec<Edges>) -> Self {
        let mut indegree = vec![0; next.len()];
        for targets in &next {
            for &target in targets {
                indegree[target] += 1;
            }
        }
        Self { next, indegree }
    }

    pub(crate) fn len(&self) -> usize {
        self.next.len()
    }

    pub(crate) fn next(&self, vertex: usize) -> &[usize] {
        &self.next[vertex]
    }

    pub(crate) fn indegree(&self, vertex: usize) -> usize {
        self.indegree[vertex]
    }

    /// Vertices with no incoming edges, in index order.
    pub(crate) fn roots(&self) -> impl Iterator<Item = usize> + '_ {
        self.indegree
            .iter()
            .enumerate()
            .filter(|(_, &degree)| degree == 0)
            .map(|(vertex, _)| vertex)
    }

    /// A new topology over the same vertices with every edge flipped.
    pub(crate) fn reversed(&self) -> Self {
        let mut next = vec![Edges::new(); self.len()];
        for (source, targets) in self.next.iter().enumerate() {
            for &target in targets {
                next[target].push(source);
            }
        }
        Self::new(next)
    }
}

/// A validated directed acyclic graph of nodes, keyed by identity.
///
/// Obtain one from [`GraphBuilder::build`](super::GraphBuilder::build).
#[derive(Clone)]
pub struct Graph {
    /// Identity to behavior; the position of an entry is its vertex index.
    nodes: IndexMap<String, Arc<dyn Aggregate>>,
    topology: Topology,
}

impl Graph {
    pub(crate) fn from_parts(
        nodes: IndexMap<String, Arc<dyn Aggregate>>,
        topology: Topology,
    ) -> Self {
        debug_assert_eq!(nodes.len(), topology.len());
        Self { nodes, topology }
    }

    pub(crate) fn topology(&self) -> &Topology {
        &self.topology
    }

    pub(crate) fn name(&self, vertex: usize) -> &str {
        self.nodes
            .get_index(vertex)
            .map(|(id, _)| id.as_str())
            .unwrap_or_default()
    }

    pub(crate) fn behavior(&self, vertex: usize) -> &dyn Aggregate {
        self.nodes[vertex].as_ref()
    }

    pub(crate) fn vertex(&self, vertex: usize) -> NodeRef<'_> {
        NodeRef { graph: self, vertex }
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether a node with this identity exists.
    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Look up a node by identity.
    pub fn node(&self, id: &str) -> Option<NodeRef<'_>> {
        self.nodes
            .get_index_of(id)
            .map(|vertex| self.vertex(vertex))
    }

    /// All node identities, in discovery order.
    pub fn ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.nodes.keys().map(String::as_str)
    }

    /// All nodes, in discovery order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeRef<'_>> + '_ {
        (0..self.len()).map(move |vertex| self.vertex(vertex))
    }

    /// Nodes for which `filter` returns true.
    pub fn filter<F>(&self, mut filter: F) -> Vec<NodeRef<'_>>
    where
        F: FnMut(&NodeRef<'_>) -> bool,
    {
        self.nodes().filter(|node| filter(node)).collect()
    }

    /// Nodes with no predecessors.
    pub fn roots(&self) -> Vec<NodeRef<'_>> {
        self.topology
            .roots()
            .map(|vertex| self.vertex(vertex))
            .collect()
    }

    /// The same nodes with every edge direction flipped.
    ///
    /// The reversed graph shares the aggregation behaviors but nothing else;
    /// it is a valid graph in its own right and can be evaluated.
    pub fn reversed(&self) -> Graph {
        Graph::from_parts(self.nodes.clone(), self.topology.reversed())
    }
}

impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                self.nodes()
                    .map(|node| (node.id(), node.successors().collect::<Vec<_>>())),
            )
            .finish()
    }
}

/// Borrowed view of one node in a [`Graph`].
#[derive(Clone, Copy)]
pub struct NodeRef<'g> {
    graph: &'g Graph,
    vertex: usize,
}

impl<'g> NodeRef<'g> {
    /// The node's identity.
    pub fn id(&self) -> &'g str {
        self.graph.name(self.vertex)
    }

    /// Number of distinct predecessors.
    pub fn indegree(&self) -> usize {
        self.graph.topology.indegree(self.vertex)
    }

    /// Identities of the nodes this node feeds into.
    pub fn successors(&self) -> impl Iterator<Item = &'g str> + 'g {
        let graph = self.graph;
        graph
            .topology
            .next(self.vertex)
            .iter()
            .map(move |&target| graph.name(target))
    }

    /// Identities of the nodes feeding into this node.
    pub fn predecessors(&self) -> impl Iterator<Item = &'g str> + 'g {
        let graph = self.graph;
        let vertex = self.vertex;
        (0..graph.len())
            .filter(move |&source| graph.topology.next(source).contains(&vertex))
            .map(move |source| graph.name(source))
    }

    /// The node's aggregation behavior.
    pub fn aggregate(&self) -> &'g dyn Aggregate {
        self.graph.behavior(self.vertex)
    }
}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id())
            .field("indegree", &self.indegree())
            .finish()
    }
}
