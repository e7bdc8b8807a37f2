//! The settlement cell: the single-assignment, thread-safe state holder
//! backing every promise instance.
//!
//! A cell transitions from pending to a terminal state exactly once; the
//! first writer wins and every later settlement attempt is a silent no-op.
//! Continuations registered while pending run after settlement in
//! registration order; continuations registered after settlement run
//! immediately on the registering thread, before the call returns.

use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::error::Error;
use crate::promise::PromiseState;

/// A settled outcome: the fulfillment value or the rejection reason.
pub type Outcome<T, E = Error> = std::result::Result<T, E>;

type Continuation<T, E> = Box<dyn FnOnce(Outcome<T, E>) + Send>;

struct Inner<T, E> {
    state: PromiseState<T, E>,
    continuations: Vec<Continuation<T, E>>,
}

/// Shared state between a promise and its write-side settler handles.
pub(crate) struct SettleCell<T, E = Error> {
    inner: Mutex<Inner<T, E>>,
    settled: Condvar,
}

impl<T, E> SettleCell<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: PromiseState::Pending,
                continuations: Vec::new(),
            }),
            settled: Condvar::new(),
        }
    }

    /// A continuation that panicked on another thread must not wedge the
    /// remaining observers of this cell.
    fn lock(&self) -> MutexGuard<'_, Inner<T, E>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Attempt the pending -> terminal transition.
    ///
    /// Returns `true` iff this call won the settlement. Continuations are
    /// drained under the lock but invoked after releasing it, in
    /// registration order, each with its own copy of the outcome.
    pub(crate) fn settle(&self, outcome: Outcome<T, E>) -> bool {
        let drained = {
            let mut inner = self.lock();
            if inner.state.is_settled() {
                tracing::trace!("settle attempt on an already settled cell; ignoring");
                return false;
            }
            inner.state = match outcome.clone() {
                Ok(value) => PromiseState::Fulfilled(value),
                Err(reason) => PromiseState::Rejected(reason),
            };
            std::mem::take(&mut inner.continuations)
        };
        self.settled.notify_all();
        for continuation in drained {
            continuation(outcome.clone());
        }
        true
    }

    /// Register a continuation for the settled outcome.
    ///
    /// Invoked immediately (synchronously, before this call returns) when
    /// the cell is already settled.
    pub(crate) fn on_settle<F>(&self, f: F)
    where
        F: FnOnce(Outcome<T, E>) + Send + 'static,
    {
        let immediate = {
            let mut inner = self.lock();
            match inner.state.clone().into_outcome() {
                None => {
                    inner.continuations.push(Box::new(f));
                    return;
                }
                Some(outcome) => outcome,
            }
        };
        f(immediate);
    }

    /// Non-blocking snapshot of the current state.
    pub(crate) fn state(&self) -> PromiseState<T, E> {
        self.lock().state.clone()
    }

    pub(crate) fn is_settled(&self) -> bool {
        self.lock().state.is_settled()
    }

    /// The fulfillment value, if fulfilled.
    pub(crate) fn peek_value(&self) -> Option<T> {
        match &self.lock().state {
            PromiseState::Fulfilled(value) => Some(value.clone()),
            _ => None,
        }
    }

    /// The rejection reason, if rejected.
    pub(crate) fn peek_error(&self) -> Option<E> {
        match &self.lock().state {
            PromiseState::Rejected(reason) => Some(reason.clone()),
            _ => None,
        }
    }

    /// Block the calling thread until the cell settles.
    pub(crate) fn wait(&self) -> Outcome<T, E> {
        let mut inner = self.lock();
        loop {
            if let Some(outcome) = inner.state.clone().into_outcome() {
                return outcome;
            }
            inner = self
                .settled
                .wait(inner)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
    }

    /// Block until the cell settles or `timeout` elapses.
    ///
    /// A timeout leaves the cell untouched; it may still settle later.
    pub(crate) fn wait_timeout(&self, timeout: Duration) -> crate::Result<Outcome<T, E>> {
        let deadline = Instant::now() + timeout;
        let mut inner = self.lock();
        loop {
            if let Some(outcome) = inner.state.clone().into_outcome() {
                return Ok(outcome);
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(Error::Timeout { waited: timeout });
            }
            let (guard, _timed_out) = self
                .settled
                .wait_timeout(inner, deadline - now)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            inner = guard;
        }
    }
}
