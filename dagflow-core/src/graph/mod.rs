//! Dependency Graph
//!
//! This module implements construction, validation and ordering of the
//! computation graph.
//!
//! # Overview
//!
//! The graph is a directed acyclic graph (DAG) where:
//!
//! - Nodes are computation steps, each with an aggregation behavior
//! - Edges point from a node to the nodes that consume its output
//!
//! Nodes are declared on a [`GraphBuilder`]. Building discovers everything
//! reachable from the entry handles, rejects duplicate identities, cycles
//! and disconnected fragments, and yields an immutable [`Graph`].
//!
//! # Design Decisions
//!
//! 1. Nodes live in an arena and refer to each other by index. Successor
//!    links never own anything, and reversing the graph is a matter of
//!    rebuilding index lists.
//!
//! 2. Identities map to vertex indices through an insertion-ordered map, so
//!    iteration and sorting are deterministic for a given declaration.
//!
//! 3. Every traversal uses an explicit stack; graph depth is bounded by
//!    memory, not by the call stack.

mod aggregate;
mod builder;
mod node;
mod sort;
mod topology;
mod validate;

pub use aggregate::{Aggregate, Constant, Max, Min, Sum};
pub use builder::GraphBuilder;
pub use node::{Node, NodeId};
pub use topology::{Graph, NodeRef};
