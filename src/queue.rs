//! The shared action queue.
//!
//! An unbounded FIFO of [`Action`]s guarded by a mutex, with a condition
//! variable so idle workers sleep instead of spinning. Producers never block
//! beyond taking the lock; consumers wait at most one poll interval per call
//! to [`ActionQueue::pop_timeout`].
//!
//! Order is FIFO at the point of removal only. With several consumers, two
//! actions for the same key can finish in either order.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::Duration;

const TRACING_TARGET: &str = "photoshelf::queue";

/// One unit of background work.
///
/// Payloads are owned by the action from the moment it is enqueued; nothing
/// else can reach them until a worker picks the action up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Upload { path: String, content: Vec<u8> },
    GenerateThumbnail { path: String, content: Vec<u8> },
    Delete { path: String },
}

impl Action {
    pub fn path(&self) -> &str {
        match self {
            Action::Upload { path, .. }
            | Action::GenerateThumbnail { path, .. }
            | Action::Delete { path } => path,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Action::Upload { .. } => "upload",
            Action::GenerateThumbnail { .. } => "generate_thumbnail",
            Action::Delete { .. } => "delete",
        }
    }
}

/// Outcome of one [`ActionQueue::pop_timeout`] call.
#[derive(Debug, PartialEq, Eq)]
pub enum Pop {
    Action(Action),
    /// Nothing arrived within the poll interval.
    Idle,
    /// The queue is closed and fully drained.
    Closed,
}

#[derive(Debug, Default)]
struct State {
    items: VecDeque<Action>,
    closed: bool,
}

#[derive(Debug, Default)]
pub struct ActionQueue {
    state: Mutex<State>,
    available: Condvar,
}

impl ActionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| {
            // The guarded state is a plain deque and a flag; it cannot be
            // left half-updated, so a poisoned lock is safe to reuse.
            tracing::warn!(target: TRACING_TARGET, "recovering poisoned queue lock");
            poisoned.into_inner()
        })
    }

    /// Append an action. Once the queue is closed the action is handed back.
    pub fn push(&self, action: Action) -> Result<(), Action> {
        let mut state = self.lock();
        if state.closed {
            return Err(action);
        }
        state.items.push_back(action);
        drop(state);
        self.available.notify_one();
        Ok(())
    }

    /// Take the oldest action, waiting up to `timeout` for one to arrive.
    ///
    /// Actions queued before [`close`](Self::close) are still handed out;
    /// `Closed` is only returned once they are gone.
    pub fn pop_timeout(&self, timeout: Duration) -> Pop {
        let mut state = self.lock();
        if let Some(action) = state.items.pop_front() {
            return Pop::Action(action);
        }
        if state.closed {
            return Pop::Closed;
        }

        state = match self.available.wait_timeout(state, timeout) {
            Ok((guard, _)) => guard,
            Err(poisoned) => {
                tracing::warn!(target: TRACING_TARGET, "recovering poisoned queue lock");
                poisoned.into_inner().0
            }
        };
        match state.items.pop_front() {
            Some(action) => Pop::Action(action),
            None if state.closed => Pop::Closed,
            None => Pop::Idle,
        }
    }

    /// Stop accepting new actions and wake every waiting consumer.
    pub fn close(&self) {
        self.lock().closed = true;
        self.available.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Number of actions queued and not yet taken by a consumer.
    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
