//! # Promise Core
//!
//! Thread-safe, single-settlement promises with JavaScript-style chaining
//! and aggregate combinators.
//!
//! The library is a passive shared-state coordinator, not a scheduler:
//! producers settle promises from whatever thread they happen to run on,
//! and a settlement cell guarantees exactly-once settlement no matter how
//! many producers race. Chaining (`then`, `map`, `catch_error`,
//! `finally_do`) and the aggregate combinators (`all`, `race`) derive
//! fresh promises by subscribing to parent cells.
//!
//! ```
//! use promise_core::prelude::*;
//!
//! let doubled = Promise::<i32>::resolved(21).map(|v| v * 2);
//! assert_eq!(doubled.wait(), Ok(42));
//! ```

mod cell;
mod chain;
mod combinators;
pub mod error;
pub mod promise;

pub use cell::Outcome;
pub use error::{Error, Result};
pub use promise::{Promise, PromiseState, Settler};

pub mod prelude {
    //! Common imports for promise-based code

    pub use crate::cell::Outcome;
    pub use crate::error::{Error, Result};
    pub use crate::promise::{Promise, PromiseState, Settler};
}
