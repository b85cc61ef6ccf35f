// vim: tw=80
//! The per-method FIFO of call handlers.

use std::{
    iter,
    sync::{Mutex, MutexGuard, PoisonError}
};
use thiserror::Error;
use tracing::trace;

use crate::invoke::{Handler, Mismatch, Value};

/// Why [`CallQueue::consume`] could not produce results.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ConsumeError {
    /// Every handler has already been claimed.  Nothing was invoked.
    #[error("all registered calls have already been made")]
    Exhausted,
    /// The claimed handler rejected its arguments.
    #[error(transparent)]
    Mismatch(#[from] Mismatch),
}

#[derive(Debug, Default)]
struct State {
    handlers: Vec<Handler>,
    /// How many handlers have been claimed.  Never exceeds `handlers.len()`
    /// and never decreases.
    consumed: usize
}

/// Ordered handlers for one method, plus a cursor over them.
///
/// The k-th call to [`consume`](Self::consume) always invokes the k-th
/// appended handler, no matter which thread makes it.  Claiming an index is
/// a single critical section; the handler itself runs after the lock is
/// released, so a handler may call back into the same queue.
#[derive(Debug, Default)]
pub struct CallQueue {
    state: Mutex<State>
}

impl CallQueue {
    pub fn new() -> Self {
        Self::default()
    }

    // Nothing user-supplied ever runs while this lock is held, so a poisoned
    // lock still guards consistent state.
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a handler to the end of the queue.
    pub fn append(&self, handler: Handler) {
        self.lock().handlers.push(handler);
    }

    /// Add `n` copies of the same handler to the end of the queue.
    ///
    /// The copies are appended in one critical section, so they stay adjacent
    /// even if other threads append concurrently.
    pub fn append_n(&self, n: usize, handler: Handler) {
        self.lock().handlers.extend(iter::repeat(handler).take(n));
    }

    /// Claim the next handler and invoke it with `args`.
    pub fn consume(&self, args: Vec<Value>) -> Result<Vec<Value>, ConsumeError>
    {
        let (index, handler) = self.claim()?;
        trace!(index, "invoking call handler");
        handler.invoke(args).map_err(ConsumeError::from)
    }

    fn claim(&self) -> Result<(usize, Handler), ConsumeError> {
        let mut state = self.lock();
        let index = state.consumed;
        let handler = state.handlers.get(index)
            .cloned()
            .ok_or(ConsumeError::Exhausted)?;
        state.consumed += 1;
        Ok((index, handler))
    }

    /// Return `(expected, consumed)`: how many handlers were appended and how
    /// many of them have been claimed.
    ///
    /// A call that is still running counts as consumed.
    pub fn snapshot(&self) -> (usize, usize) {
        let state = self.lock();
        (state.handlers.len(), state.consumed)
    }
}
