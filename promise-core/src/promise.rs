//! Promise construction and state inspection.
//!
//! A [`Promise`] is the read-and-compose side of a settlement cell; a
//! [`Settler`] is the write side, handed to executors and background
//! producers. Whichever settler call arrives first wins; everything after
//! that is a no-op.

use std::fmt;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::cell::{Outcome, SettleCell};
use crate::error::Error;

/// States that a promise can be in
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromiseState<T, E = Error> {
    /// Promise has not settled yet
    Pending,
    /// Promise settled with a value
    Fulfilled(T),
    /// Promise settled with a rejection reason
    Rejected(E),
}

impl<T, E> PromiseState<T, E> {
    /// Returns `true` if the promise is no longer pending.
    pub fn is_settled(&self) -> bool {
        !matches!(self, PromiseState::Pending)
    }

    /// Returns `true` if fulfilled.
    pub fn is_fulfilled(&self) -> bool {
        matches!(self, PromiseState::Fulfilled(_))
    }

    /// Returns `true` if rejected.
    pub fn is_rejected(&self) -> bool {
        matches!(self, PromiseState::Rejected(_))
    }

    /// The settled outcome, or `None` while pending.
    pub fn into_outcome(self) -> Option<Outcome<T, E>> {
        match self {
            PromiseState::Pending => None,
            PromiseState::Fulfilled(value) => Some(Ok(value)),
            PromiseState::Rejected(reason) => Some(Err(reason)),
        }
    }
}

impl<T, E> fmt::Display for PromiseState<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromiseState::Pending => f.write_str("pending"),
            PromiseState::Fulfilled(_) => f.write_str("fulfilled"),
            PromiseState::Rejected(_) => f.write_str("rejected"),
        }
    }
}

/// A single-settlement promise.
///
/// Cheap to clone; clones observe the same cell. Derived promises (from
/// chaining and combinators) own fresh, independent cells.
pub struct Promise<T, E = Error> {
    cell: Arc<SettleCell<T, E>>,
}

impl<T, E> Clone for Promise<T, E> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
        }
    }
}

/// The write side of a promise.
///
/// Clone it freely across threads; the underlying cell settles at most once
/// no matter how many settlers race.
pub struct Settler<T, E = Error> {
    cell: Arc<SettleCell<T, E>>,
}

impl<T, E> Clone for Settler<T, E> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
        }
    }
}

impl<T, E> Promise<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    /// Create a pending promise together with its write handle.
    pub fn pending() -> (Promise<T, E>, Settler<T, E>) {
        let cell = Arc::new(SettleCell::new());
        (
            Promise { cell: cell.clone() },
            Settler { cell },
        )
    }

    /// Create a promise from an executor, run synchronously on the calling
    /// thread.
    ///
    /// An `Err` returned by the executor rejects the promise with that
    /// reason, preserving the typed error value; construction itself never
    /// fails. If the executor already settled the promise, a trailing `Err`
    /// loses to the first writer and is dropped.
    pub fn new<X>(executor: X) -> Self
    where
        X: FnOnce(Settler<T, E>) -> std::result::Result<(), E>,
    {
        let (promise, settler) = Self::pending();
        if let Err(reason) = executor(settler.clone()) {
            settler.set_error(reason);
        }
        promise
    }

    /// An already-fulfilled promise wrapping `value`.
    pub fn resolved(value: T) -> Self {
        let (promise, settler) = Self::pending();
        settler.set_value(value);
        promise
    }

    /// An already-rejected promise wrapping `reason`.
    pub fn rejected(reason: E) -> Self {
        let (promise, settler) = Self::pending();
        settler.set_error(reason);
        promise
    }

    /// Run `f` on a background thread and settle the promise with its
    /// result once it completes.
    ///
    /// This is the producer boundary for wrapping blocking work; the
    /// promise stays pending if the producer panics before settling.
    pub fn spawn<F>(f: F) -> Self
    where
        F: FnOnce() -> std::result::Result<T, E> + Send + 'static,
    {
        let (promise, settler) = Self::pending();
        thread::spawn(move || {
            settler.settle(f());
        });
        promise
    }

    /// Non-blocking snapshot of the promise's state.
    pub fn state(&self) -> PromiseState<T, E> {
        self.cell.state()
    }

    /// Returns `true` once the promise has settled either way.
    pub fn is_settled(&self) -> bool {
        self.cell.is_settled()
    }

    /// The fulfillment value, or `None` unless fulfilled.
    pub fn peek_value(&self) -> Option<T> {
        self.cell.peek_value()
    }

    /// The rejection reason, or `None` unless rejected.
    pub fn peek_error(&self) -> Option<E> {
        self.cell.peek_error()
    }

    /// Register a continuation invoked with the settled outcome.
    ///
    /// Runs immediately, on the calling thread, if the promise has already
    /// settled; otherwise runs on whichever thread settles the promise, in
    /// registration order.
    pub fn on_settle<F>(&self, f: F)
    where
        F: FnOnce(Outcome<T, E>) + Send + 'static,
    {
        self.cell.on_settle(f);
    }

    /// Block the calling thread until the promise settles, returning the
    /// outcome.
    pub fn wait(&self) -> Outcome<T, E> {
        self.cell.wait()
    }

    /// Block until the promise settles or `timeout` elapses.
    ///
    /// Timing out never affects the promise's eventual outcome.
    pub fn wait_timeout(&self, timeout: Duration) -> crate::Result<Outcome<T, E>> {
        self.cell.wait_timeout(timeout)
    }

    pub(crate) fn cell(&self) -> &Arc<SettleCell<T, E>> {
        &self.cell
    }
}

impl<T, E> Settler<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    /// Fulfill the promise with `value`. Returns `true` iff this call won
    /// the settlement.
    pub fn set_value(&self, value: T) -> bool {
        self.cell.settle(Ok(value))
    }

    /// Reject the promise with `reason`. Returns `true` iff this call won
    /// the settlement.
    pub fn set_error(&self, reason: E) -> bool {
        self.cell.settle(Err(reason))
    }

    /// Settle with a ready outcome, preserving its fulfilled/rejected shape.
    pub fn settle(&self, outcome: Outcome<T, E>) -> bool {
        self.cell.settle(outcome)
    }

    /// Check if the promise has already settled.
    pub fn is_settled(&self) -> bool {
        self.cell.is_settled()
    }
}
