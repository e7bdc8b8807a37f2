//! Integration tests for `promise-core`.
//!
//! The interesting coverage lives in `tests/`: cross-thread producers,
//! settlement races, and combinator behavior under real concurrency.
