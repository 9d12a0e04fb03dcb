//! Parallel Evaluation
//!
//! Evaluation turns a validated [`Graph`] into one result per node, using a
//! fixed pool of worker threads.
//!
//! # Algorithm
//!
//! 1. Sort the graph topologically.
//! 2. Feed the nodes, in that order, into one bounded FIFO queue shared by
//!    every worker.
//! 3. A worker takes the next node and runs it to completion:
//!    - wait until every predecessor has delivered its output
//!    - close the node's inbox and aggregate the arrived values
//!    - store the result and deliver it to every successor
//!
//! # Why this cannot deadlock
//!
//! The queue is filled in topological order and drained in FIFO order, so a
//! node is taken off the queue only after all of its predecessors were. A
//! worker blocked on a node is therefore waiting on nodes that are already
//! held by other workers (or finished), and those in turn wait only on nodes
//! taken even earlier. The chain always ends at a node with no pending
//! inputs, so some worker can always make progress. With one worker this
//! degenerates to sequential evaluation in topological order that never
//! actually waits.
//!
//! # Panics
//!
//! An aggregation behavior that panics aborts the pass. The panic is caught
//! on the worker, every inbox is released so no worker keeps waiting for the
//! failed node's output, the remaining queue is drained without evaluating
//! anything, and the behavior's panic is resumed on the calling thread once all
//! workers have stopped. No partial result is returned.
//!
//! # Determinism
//!
//! A node's result depends only on the values its predecessors deliver, not
//! on their arrival order, as long as its aggregation behavior is
//! commutative. Under that condition results do not depend on the worker
//! count or on scheduling.

mod evaluation;
mod inbox;
mod options;

pub use evaluation::Evaluation;
pub use options::EvalOptions;

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use crossbeam::channel;
use indexmap::IndexMap;
use parking_lot::Mutex;
use tracing::{debug, error, info_span, trace, trace_span};

use crate::error::{GraphError, Result};
use crate::graph::Graph;
use inbox::NodeInbox;

/// Set by the first node whose behavior panics; holds that panic's payload.
#[derive(Default)]
struct Failure {
    failed: AtomicBool,
    payload: Mutex<Option<Box<dyn Any + Send>>>,
}

impl Failure {
    fn is_set(&self) -> bool {
        self.failed.load(Ordering::Acquire)
    }

    /// Keeps the first payload only.
    fn record(&self, payload: Box<dyn Any + Send>) {
        let mut slot = self.payload.lock();
        if slot.is_none() {
            *slot = Some(payload);
        }
        self.failed.store(true, Ordering::Release);
    }

    fn take(&self) -> Option<Box<dyn Any + Send>> {
        self.payload.lock().take()
    }
}

impl Graph {
    /// Evaluate every node using `workers` threads.
    ///
    /// Fails with [`GraphError::InvalidWorkerCount`] before doing any work if
    /// `workers` is zero. Each call runs on fresh runtime state, so a graph
    /// can be evaluated any number of times, including concurrently.
    ///
    /// # Panics
    ///
    /// Resumes the panic of an aggregation behavior after every worker has
    /// stopped.
    pub fn evaluate(&self, workers: usize) -> Result<Evaluation> {
        self.evaluate_with(&EvalOptions::new(workers))
    }

    /// Evaluate every node with explicit [`EvalOptions`].
    pub fn evaluate_with(&self, options: &EvalOptions) -> Result<Evaluation> {
        let workers = options.workers();
        if workers < 1 {
            return Err(GraphError::InvalidWorkerCount { workers });
        }
        let order = self.sorted_vertices()?;

        let span = info_span!("evaluate", workers, nodes = self.len());
        let _enter = span.enter();
        debug!(
            order = ?order.iter().map(|&v| self.name(v)).collect::<Vec<_>>(),
            "evaluation started"
        );

        let inboxes: Vec<NodeInbox> = (0..self.len())
            .map(|vertex| NodeInbox::new(self.topology().indegree(vertex)))
            .collect();

        let failure = Failure::default();
        let (queue, jobs) = channel::bounded::<usize>(options.queue_capacity());

        thread::scope(|scope| {
            for worker in 0..workers {
                let jobs = jobs.clone();
                let inboxes = &inboxes;
                let failure = &failure;
                let parent = span.clone();
                scope.spawn(move || {
                    let _worker = trace_span!(parent: &parent, "worker", worker).entered();
                    for vertex in jobs.iter() {
                        if failure.is_set() {
                            break;
                        }
                        trace!(worker, node = self.name(vertex), "evaluating node");
                        self.run_node(vertex, inboxes, failure);
                    }
                });
            }
            drop(jobs);

            for &vertex in &order {
                // Sending fails once every worker has stopped.
                if failure.is_set() || queue.send(vertex).is_err() {
                    break;
                }
            }
            drop(queue);
        });

        if let Some(payload) = failure.take() {
            debug!("evaluation aborted");
            panic::resume_unwind(payload);
        }

        let results: IndexMap<String, i64> = inboxes
            .iter()
            .enumerate()
            .filter_map(|(vertex, inbox)| {
                inbox
                    .result()
                    .map(|result| (self.name(vertex).to_owned(), result))
            })
            .collect();
        debug_assert_eq!(results.len(), self.len());

        debug!("evaluation finished");
        Ok(Evaluation::new(
            results,
            order.iter().map(|&v| self.name(v).to_owned()).collect(),
            workers,
        ))
    }

    fn run_node(&self, vertex: usize, inboxes: &[NodeInbox], failure: &Failure) {
        let inbox = &inboxes[vertex];
        let Some(inputs) = inbox.wait_ready() else {
            return;
        };

        let behavior = self.behavior(vertex);
        let result = match panic::catch_unwind(AssertUnwindSafe(|| behavior.aggregate(&inputs))) {
            Ok(result) => result,
            Err(payload) => {
                error!(node = self.name(vertex), "aggregation panicked, aborting pass");
                failure.record(payload);
                inboxes.iter().for_each(NodeInbox::abort);
                return;
            }
        };
        if !inbox.publish(result) {
            error!(node = self.name(vertex), "node evaluated twice");
        }
        trace!(
            node = self.name(vertex),
            inputs = inputs.len(),
            result,
            "evaluated node"
        );

        for &next in self.topology().next(vertex) {
            if !inboxes[next].deliver(result) {
                error!(
                    from = self.name(vertex),
                    to = self.name(next),
                    "input delivered to a node that was not waiting for it"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Constant, GraphBuilder, Max, Min, Sum};

    fn assignment() -> Graph {
        let mut builder = GraphBuilder::new();
        let sum = builder.node("sum", Sum, []);
        let max = builder.node("max", Max, [sum]);
        let min = builder.node("min", Min, [sum]);
        let one = builder.node("1", Constant(1), [max]);
        let two = builder.node("2", Constant(2), [max]);
        let three = builder.node("3", Constant(3), [min]);
        let four = builder.node("4", Constant(4), [min]);
        builder.build([one, two, three, four]).unwrap()
    }

    #[test]
    fn zero_workers_is_rejected() {
        let graph = assignment();
        assert_eq!(
            graph.evaluate(0),
            Err(GraphError::InvalidWorkerCount { workers: 0 })
        );
    }

    #[test]
    fn single_worker_runs_in_sorted_order() {
        let graph = assignment();
        let evaluation = graph.evaluate(1).unwrap();

        let sorted: Vec<_> = graph
            .topological_sort()
            .unwrap()
            .iter()
            .map(|node| node.id().to_owned())
            .collect();
        assert_eq!(evaluation.order(), sorted.as_slice());
        assert_eq!(evaluation.workers(), 1);
        assert_eq!(evaluation["sum"], 5);
    }

    #[test]
    fn more_workers_than_nodes() {
        let evaluation = assignment().evaluate(32).unwrap();
        assert_eq!(evaluation.len(), 7);
        assert_eq!(evaluation.get("max"), Some(2));
        assert_eq!(evaluation.get("min"), Some(3));
    }

    #[test]
    fn tiny_queue_still_completes() {
        let options = EvalOptions::new(3).with_queue_capacity(1);
        let evaluation = assignment().evaluate_with(&options).unwrap();
        assert_eq!(evaluation.get("sum"), Some(5));
    }

    #[test]
    fn failure_keeps_first_payload() {
        let failure = Failure::default();
        assert!(!failure.is_set());

        failure.record(Box::new("first"));
        failure.record(Box::new("second"));
        assert!(failure.is_set());

        let payload = failure.take().unwrap();
        assert_eq!(payload.downcast_ref::<&str>(), Some(&"first"));
        assert!(failure.take().is_none());
    }

    #[test]
    fn panicking_node_releases_waiting_successor() {
        let mut builder = GraphBuilder::new();
        let sink = builder.node("sink", Sum, []);
        let root = builder.node(
            "root",
            |_: &[i64]| -> i64 {
                std::thread::sleep(std::time::Duration::from_millis(50));
                panic!("root failed")
            },
            [sink],
        );
        let graph = builder.build([root]).unwrap();

        let payload = panic::catch_unwind(AssertUnwindSafe(|| graph.evaluate(2))).unwrap_err();
        assert_eq!(payload.downcast_ref::<&str>(), Some(&"root failed"));
    }

    #[test]
    fn results_follow_discovery_order() {
        let evaluation = assignment().evaluate(2).unwrap();
        let ids: Vec<_> = evaluation.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["1", "max", "sum", "2", "3", "min", "4"]);
    }
}
