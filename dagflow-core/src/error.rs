//! Error Types
//!
//! Every failure in this crate is structural: it reflects how the graph was
//! declared or how evaluation was requested, never a transient condition.
//! None of these errors are worth retrying.

use thiserror::Error;

/// Errors returned by graph construction and evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// Two distinct nodes reachable from the entries share one identity.
    #[error("duplicate node ID: {id}")]
    DuplicateIdentity { id: String },

    /// The successor edge `from -> to` closes a cycle.
    #[error("cycle detected: node {to} is referenced by descendant node {from}")]
    Cycle { from: String, to: String },

    /// `node` cannot be reached from `from`, even ignoring edge direction.
    #[error("disconnected node: {node} is not connected to node {from}")]
    Disconnected { node: String, from: String },

    /// Evaluation was requested with fewer than one worker.
    #[error("concurrency must be at least 1, got {workers}")]
    InvalidWorkerCount { workers: usize },

    /// A node handle that was not issued by this builder.
    #[error("unknown node handle: {index}")]
    UnknownNode { index: usize },
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GraphError>;
