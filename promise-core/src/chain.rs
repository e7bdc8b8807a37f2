//! Chain composition: deriving new promises from a parent's settlement.
//!
//! Each operator subscribes to the parent cell, returns a fresh promise
//! immediately, and never blocks. Transform failures become rejections of
//! the derived promise with the original error value intact.

use std::fmt;

use crate::promise::Promise;

impl<T, E> Promise<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    /// Derive a promise from the fulfillment value.
    ///
    /// A rejected parent short-circuits: `on_fulfilled` never runs and the
    /// rejection passes through unchanged. An `Err` returned by
    /// `on_fulfilled` rejects the derived promise with that reason.
    pub fn then<U, F>(&self, on_fulfilled: F) -> Promise<U, E>
    where
        U: Clone + Send + 'static,
        F: FnOnce(T) -> std::result::Result<U, E> + Send + 'static,
    {
        let (derived, settler) = Promise::pending();
        self.cell().on_settle(move |outcome| match outcome {
            Ok(value) => {
                settler.settle(on_fulfilled(value));
            }
            Err(reason) => {
                settler.set_error(reason);
            }
        });
        derived
    }

    /// Infallible convenience over [`Promise::then`].
    pub fn map<U, F>(&self, f: F) -> Promise<U, E>
    where
        U: Clone + Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        self.then(move |value| Ok(f(value)))
    }

    /// Derive a promise that recovers from a rejection.
    ///
    /// A fulfilled parent passes its value through unchanged and
    /// `on_rejected` never runs. An `Err` returned by `on_rejected`
    /// rejects the derived promise with the new reason.
    pub fn catch_error<F>(&self, on_rejected: F) -> Promise<T, E>
    where
        F: FnOnce(E) -> std::result::Result<T, E> + Send + 'static,
    {
        let (derived, settler) = Promise::pending();
        self.cell().on_settle(move |outcome| match outcome {
            Ok(value) => {
                settler.set_value(value);
            }
            Err(reason) => {
                settler.settle(on_rejected(reason));
            }
        });
        derived
    }

    /// Run `action` exactly once after the parent settles, for both
    /// outcomes, and carry the parent's outcome through unchanged.
    ///
    /// A failing action cannot override the parent's outcome: its error is
    /// logged and discarded.
    pub fn finally_do<F>(&self, action: F) -> Promise<T, E>
    where
        E: fmt::Debug,
        F: FnOnce() -> std::result::Result<(), E> + Send + 'static,
    {
        let (derived, settler) = Promise::pending();
        self.cell().on_settle(move |outcome| {
            if let Err(ignored) = action() {
                tracing::warn!("finally action failed, keeping parent outcome: {:?}", ignored);
            }
            settler.settle(outcome);
        });
        derived
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn then_transforms_fulfillment() {
        let p: Promise<i32, &str> = Promise::resolved(21);
        let q = p.then(|v| Ok(v * 2));
        assert_eq!(q.wait(), Ok(42));
    }

    #[test]
    fn then_short_circuits_on_rejection() {
        let called = Arc::new(AtomicBool::new(false));
        let called_clone = called.clone();
        let p: Promise<i32, &str> = Promise::rejected("e");
        let q = p.then(move |v| {
            called_clone.store(true, Ordering::SeqCst);
            Ok(v)
        });
        assert_eq!(q.wait(), Err("e"));
        assert!(!called.load(Ordering::SeqCst));
    }

    #[test]
    fn then_failure_rejects_derived() {
        let p: Promise<i32, &str> = Promise::resolved(1);
        let q: Promise<i32, &str> = p.then(|_| Err("transform failed"));
        assert_eq!(q.wait(), Err("transform failed"));
        // The parent is untouched.
        assert_eq!(p.peek_value(), Some(1));
    }

    #[test]
    fn map_transforms_infallibly() {
        let p: Promise<i32, &str> = Promise::resolved(5);
        let q = p.map(|v| format!("value={v}"));
        assert_eq!(q.wait(), Ok("value=5".to_string()));
    }

    #[test]
    fn catch_recovers_from_rejection() {
        let p: Promise<i32, &str> = Promise::rejected("e");
        let q = p.catch_error(|reason| Ok(reason.len() as i32));
        assert_eq!(q.wait(), Ok(1));
    }

    #[test]
    fn catch_passes_fulfillment_through() {
        let called = Arc::new(AtomicBool::new(false));
        let called_clone = called.clone();
        let p: Promise<i32, &str> = Promise::resolved(7);
        let q = p.catch_error(move |reason| {
            called_clone.store(true, Ordering::SeqCst);
            Err(reason)
        });
        assert_eq!(q.wait(), Ok(7));
        assert!(!called.load(Ordering::SeqCst));
    }

    #[test]
    fn catch_failure_rejects_with_new_reason() {
        let p: Promise<i32, &str> = Promise::rejected("old");
        let q = p.catch_error(|_| Err("new"));
        assert_eq!(q.wait(), Err("new"));
    }

    #[test]
    fn finally_preserves_fulfilled_outcome() {
        let runs = Arc::new(AtomicUsize::new(0));
        let runs_clone = runs.clone();
        let p: Promise<i32, &str> = Promise::resolved(3);
        let q = p.finally_do(move || {
            runs_clone.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        assert_eq!(q.wait(), Ok(3));
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn finally_preserves_rejected_outcome() {
        let runs = Arc::new(AtomicUsize::new(0));
        let runs_clone = runs.clone();
        let p: Promise<i32, &str> = Promise::rejected("e");
        let q = p.finally_do(move || {
            runs_clone.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        assert_eq!(q.wait(), Err("e"));
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failing_finally_action_cannot_override_outcome() {
        let p: Promise<i32, &str> = Promise::resolved(11);
        let q = p.finally_do(|| Err("cleanup failed"));
        assert_eq!(q.wait(), Ok(11));
    }

    #[test]
    fn operators_register_before_parent_settles() {
        let (p, settler) = Promise::<i32, &str>::pending();
        let q = p.then(|v| Ok(v + 1)).map(|v| v * 10);
        assert!(!q.is_settled());

        settler.set_value(4);
        assert_eq!(q.wait(), Ok(50));
    }

    #[test]
    fn multiple_children_observe_one_parent() {
        let (p, settler) = Promise::<i32, &str>::pending();
        let doubled = p.map(|v| v * 2);
        let tripled = p.map(|v| v * 3);
        settler.set_value(10);
        assert_eq!(doubled.wait(), Ok(20));
        assert_eq!(tripled.wait(), Ok(30));
    }
}
