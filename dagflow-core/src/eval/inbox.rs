//! Per-node runtime state for one evaluation pass.
//!
//! Each node gets a fresh [`NodeInbox`] at the start of every pass: a
//! dependency counter, a buffer sized to the node's indegree for the values
//! its predecessors deliver, and a write-once result slot. The counter and
//! the buffer share one lock so a delivery is observed atomically.
//!
//! An inbox can also be aborted, which releases anyone waiting on it without
//! inputs. A pass aborts every inbox as soon as one node fails.

use std::sync::OnceLock;

use parking_lot::{Condvar, Mutex};
use smallvec::SmallVec;

pub(crate) type Inputs = SmallVec<[i64; 4]>;

#[derive(Debug)]
struct InboxState {
    /// Predecessors that have not delivered yet.
    pending: usize,
    /// Arrived values, in arrival order. Capacity is the indegree.
    inputs: Inputs,
    /// Set once the node has started evaluating; later deliveries are bugs.
    closed: bool,
    /// Set when the pass is abandoned.
    aborted: bool,
}

#[derive(Debug)]
pub(crate) struct NodeInbox {
    state: Mutex<InboxState>,
    ready: Condvar,
    result: OnceLock<i64>,
}

impl NodeInbox {
    pub(crate) fn new(indegree: usize) -> Self {
        Self {
            state: Mutex::new(InboxState {
                pending: indegree,
                inputs: Inputs::with_capacity(indegree),
                closed: false,
                aborted: false,
            }),
            ready: Condvar::new(),
            result: OnceLock::new(),
        }
    }

    /// Accept one predecessor's output.
    ///
    /// Returns false, dropping the value, if the inbox is closed or already
    /// holds one value per predecessor.
    pub(crate) fn deliver(&self, value: i64) -> bool {
        let mut state = self.state.lock();
        if state.closed || state.pending == 0 {
            return false;
        }
        state.inputs.push(value);
        state.pending -= 1;
        if state.pending == 0 {
            self.ready.notify_all();
        }
        true
    }

    /// Block until every predecessor has delivered, then close the inbox and
    /// take the arrived values.
    ///
    /// Returns `None` if the inbox was aborted before it became ready.
    pub(crate) fn wait_ready(&self) -> Option<Inputs> {
        let mut state = self.state.lock();
        while state.pending > 0 && !state.aborted {
            self.ready.wait(&mut state);
        }
        if state.aborted {
            return None;
        }
        state.closed = true;
        Some(std::mem::take(&mut state.inputs))
    }

    /// Release every waiter without inputs; later waits return at once.
    pub(crate) fn abort(&self) {
        let mut state = self.state.lock();
        state.aborted = true;
        self.ready.notify_all();
    }

    /// Store the node's result. Returns false if a result was already stored.
    pub(crate) fn publish(&self, value: i64) -> bool {
        self.result.set(value).is_ok()
    }

    pub(crate) fn result(&self) -> Option<i64> {
        self.result.get().copied()
    }
}
