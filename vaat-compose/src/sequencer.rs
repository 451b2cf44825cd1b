//! Sequencer: a pipeline of steps sharing one state object.

use std::sync::{Arc, Mutex};

use vaat::{Abandoned, Future, Tag};

/// Chains a fixed sequence of steps over one shared state object.
///
/// Every step receives `&mut S` alongside the value flowing through the
/// chain, so an N-step pipeline needs a single allocation for its state:
/// the state lives in one reference-counted cell kept alive by the step
/// closures themselves, and dies with the last of them.
///
/// Steps run one at a time by construction (each is the continuation of the
/// previous step's future), so the internal mutex is never contended; it
/// exists to make the shared mutable access sound across whichever threads
/// end up running the steps.
///
/// ```rust
/// use vaat::Future;
/// use vaat_compose::Sequencer;
///
/// let result = Sequencer::begin(Vec::new(), Future::<u32>::ready(1))
///     .step(|log, v| {
///         log.push(v);
///         v + 1
///     })
///     .step(|log, v| {
///         log.push(v);
///         log.iter().sum::<u32>()
///     })
///     .finish();
/// assert_eq!(result.wait(), 3);
/// ```
pub struct Sequencer<S, T, G: Tag = vaat::DefaultTag>
where
    S: Send + 'static,
    T: Abandoned<G> + Send + 'static,
{
    state: Arc<Mutex<S>>,
    chain: Future<T, G>,
}

impl<S, T, G> Sequencer<S, T, G>
where
    S: Send + 'static,
    T: Abandoned<G> + Send + 'static,
    G: Tag,
{
    /// Starts a pipeline with `state` and the future feeding its first step.
    pub fn begin(state: S, first: Future<T, G>) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
            chain: first,
        }
    }

    /// Appends a synchronous step.
    pub fn step<R, F>(self, f: F) -> Sequencer<S, R, G>
    where
        R: Abandoned<G> + Send + 'static,
        F: FnOnce(&mut S, T) -> R + Send + 'static,
    {
        let state = self.state.clone();
        Sequencer {
            chain: self
                .chain
                .and_then(move |v| f(&mut *state.lock().unwrap(), v)),
            state: self.state,
        }
    }

    /// Appends a step that returns a future of its own; the pipeline
    /// continues when that inner future resolves.
    pub fn step_async<R, F>(self, f: F) -> Sequencer<S, R, G>
    where
        R: Abandoned<G> + Send + 'static,
        F: FnOnce(&mut S, T) -> Future<R, G> + Send + 'static,
    {
        let state = self.state.clone();
        Sequencer {
            chain: self
                .chain
                .and_then(move |v| f(&mut *state.lock().unwrap(), v))
                .flatten(),
            state: self.state,
        }
    }

    /// Ends the pipeline, yielding the future of its last step's result.
    ///
    /// The shared state object is released when the final step (and any
    /// continuation attached to the returned future) has run.
    pub fn finish(self) -> Future<T, G> {
        self.chain
    }
}
