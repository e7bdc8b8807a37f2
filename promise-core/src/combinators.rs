//! Aggregate combinators: deriving one promise from many inputs.
//!
//! Combinators hold read-only references to each input's cell and never
//! mutate an input. The derived cell's settle-once law does the tie
//! breaking when several inputs finish close together.

use std::sync::{Arc, Mutex};

use crate::cell::SettleCell;
use crate::promise::Promise;

struct Gather<T> {
    values: Vec<Option<T>>,
    remaining: usize,
}

fn first_rejection<T, E>(cells: &[Arc<SettleCell<T, E>>]) -> Option<E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    cells.iter().find_map(|cell| cell.peek_error())
}

impl<T, E> Promise<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    /// Settle once every input has fulfilled, with the values in input
    /// order regardless of completion timing.
    ///
    /// Rejects as soon as any input is observed rejected. When several
    /// inputs have already failed by that moment, the reported reason is
    /// the lowest-indexed rejection visible at evaluation time, which
    /// favors determinism over chronological order. An empty input set
    /// fulfills immediately with an empty vector.
    pub fn all<I>(inputs: I) -> Promise<Vec<T>, E>
    where
        I: IntoIterator<Item = Promise<T, E>>,
    {
        let inputs: Vec<Promise<T, E>> = inputs.into_iter().collect();
        if inputs.is_empty() {
            return Promise::resolved(Vec::new());
        }

        let (derived, settler) = Promise::pending();
        let total = inputs.len();
        let cells: Arc<Vec<Arc<SettleCell<T, E>>>> =
            Arc::new(inputs.iter().map(|input| input.cell().clone()).collect());
        let gathered = Arc::new(Mutex::new(Gather {
            values: vec![None; total],
            remaining: total,
        }));

        for (index, input) in inputs.iter().enumerate() {
            let settler = settler.clone();
            let cells = cells.clone();
            let gathered = gathered.clone();
            input.cell().on_settle(move |outcome| match outcome {
                Ok(value) => {
                    let ready = {
                        let mut gather = gathered
                            .lock()
                            .unwrap_or_else(|poisoned| poisoned.into_inner());
                        gather.values[index] = Some(value);
                        gather.remaining -= 1;
                        if gather.remaining == 0 {
                            Some(
                                gather
                                    .values
                                    .iter_mut()
                                    .map(|slot| slot.take().expect("every slot filled once remaining is zero"))
                                    .collect::<Vec<T>>(),
                            )
                        } else {
                            None
                        }
                    };
                    if let Some(values) = ready {
                        settler.set_value(values);
                    }
                }
                Err(reason) => {
                    // Scan the inputs in index order: the reported reason is
                    // the lowest-indexed rejection known right now, not
                    // necessarily the one that fired this continuation.
                    let reason = first_rejection(&cells).unwrap_or(reason);
                    settler.set_error(reason);
                }
            });
        }
        derived
    }

    /// Settle with the outcome of whichever input settles first, keeping
    /// its fulfilled/rejected shape and payload.
    ///
    /// Later settlements lose to the first writer and are ignored. An
    /// empty input set leaves the derived promise pending forever: no
    /// input can ever win.
    pub fn race<I>(inputs: I) -> Promise<T, E>
    where
        I: IntoIterator<Item = Promise<T, E>>,
    {
        let (derived, settler) = Promise::pending();
        for input in inputs {
            let settler = settler.clone();
            input.cell().on_settle(move |outcome| {
                settler.settle(outcome);
            });
        }
        derived
    }
}
