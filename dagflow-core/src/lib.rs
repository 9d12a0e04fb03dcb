//! Dagflow Core
//!
//! This crate builds, validates and evaluates directed acyclic graphs of
//! integer computations. It implements:
//!
//! - Graph construction from a set of entry nodes
//! - Validation (cycle detection, undirected connectivity)
//! - Deterministic topological ordering
//! - Parallel evaluation on a fixed pool of worker threads
//!
//! # Architecture
//!
//! The crate is organized into a few modules:
//!
//! - `graph`: node declaration, the validated graph, sorting
//! - `eval`: the evaluation engine and its per-pass runtime state
//! - `error`: the error type shared by both
//!
//! # Example
//!
//! ```rust
//! use dagflow_core::graph::{Constant, GraphBuilder, Max, Min, Sum};
//!
//! let mut builder = GraphBuilder::new();
//! let sum = builder.node("sum", Sum, []);
//! let max = builder.node("max", Max, [sum]);
//! let min = builder.node("min", Min, [sum]);
//! let one = builder.node("1", Constant(1), [max]);
//! let two = builder.node("2", Constant(2), [max]);
//! let three = builder.node("3", Constant(3), [min]);
//! let four = builder.node("4", Constant(4), [min]);
//!
//! let graph = builder.build([one, two, three, four])?;
//! let results = graph.evaluate(4)?;
//!
//! assert_eq!(results["max"], 2);
//! assert_eq!(results["min"], 3);
//! assert_eq!(results["sum"], 5);
//! # Ok::<(), dagflow_core::GraphError>(())
//! ```

pub mod error;
pub mod eval;
pub mod graph;

pub use error::{GraphError, Result};
pub use eval::{EvalOptions, Evaluation};
pub use graph::{Graph, GraphBuilder};
