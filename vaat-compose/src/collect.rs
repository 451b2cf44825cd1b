//! Fan-in: many futures of the same type into one future of all values.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use vaat::{pair, Abandoned, Future, Promise, Tag};

struct CollectState<T, G: Tag>
where
    T: Abandoned<G> + Send + 'static,
{
    slots: Mutex<Vec<Option<T>>>,
    remaining: AtomicUsize,
    output: Mutex<Option<Promise<Vec<T>, G>>>,
}

/// Awaits every input future and produces the values in *input order*.
///
/// Each input writes its value into the slot matching its original index;
/// the output fulfills when the last one lands, regardless of completion
/// order. An abandoned input contributes its type's synthesized
/// abandonment value rather than stalling the collection.
///
/// An empty input vector yields an immediately-ready empty vector.
pub fn collect<T, G>(futures: Vec<Future<T, G>>) -> Future<Vec<T>, G>
where
    T: Abandoned<G> + Send + 'static,
    G: Tag,
{
    if futures.is_empty() {
        return Future::ready(Vec::new());
    }

    let (promise, out) = pair::<Vec<T>, G>();
    let n = futures.len();
    let shared = Arc::new(CollectState {
        slots: Mutex::new((0..n).map(|_| None).collect()),
        remaining: AtomicUsize::new(n),
        output: Mutex::new(Some(promise)),
    });

    for (index, future) in futures.into_iter().enumerate() {
        let shared = shared.clone();
        future.finally(move |value| {
            shared.slots.lock().unwrap()[index] = Some(value);
            if shared.remaining.fetch_sub(1, Ordering::AcqRel) == 1 {
                // Last one in; drain the slots in index order and fulfill
                // outside the slot lock.
                let values: Vec<T> = std::mem::take(&mut *shared.slots.lock().unwrap())
                    .into_iter()
                    .flatten()
                    .collect();
                if let Some(promise) = shared.output.lock().unwrap().take() {
                    promise.fulfill(values);
                }
            }
        });
    }

    out
}

/// Awaits two futures of different types, yielding both values as a tuple.
pub fn join<A, B, G>(a: Future<A, G>, b: Future<B, G>) -> Future<(A, B), G>
where
    A: Abandoned<G> + Send + 'static,
    B: Abandoned<G> + Send + 'static,
    G: Tag,
{
    let (promise, out) = pair::<(A, B), G>();
    let pending = Arc::new(Mutex::new(JoinState {
        a: None,
        b: None,
        output: Some(promise),
    }));

    let left = pending.clone();
    a.finally(move |v| {
        let done = {
            let mut st = left.lock().unwrap();
            st.a = Some(v);
            st.take_if_complete()
        };
        if let Some((promise, values)) = done {
            promise.fulfill(values);
        }
    });

    let right = pending;
    b.finally(move |v| {
        let done = {
            let mut st = right.lock().unwrap();
            st.b = Some(v);
            st.take_if_complete()
        };
        if let Some((promise, values)) = done {
            promise.fulfill(values);
        }
    });

    out
}

/// Three-way [`join`].
pub fn join3<A, B, C, G>(
    a: Future<A, G>,
    b: Future<B, G>,
    c: Future<C, G>,
) -> Future<(A, B, C), G>
where
    A: Abandoned<G> + Send + 'static,
    B: Abandoned<G> + Send + 'static,
    C: Abandoned<G> + Send + 'static,
    G: Tag,
{
    join(a, join(b, c)).and_then(|(a, (b, c))| (a, b, c))
}

struct JoinState<A, B, G: Tag>
where
    A: Abandoned<G> + Send + 'static,
    B: Abandoned<G> + Send + 'static,
{
    a: Option<A>,
    b: Option<B>,
    output: Option<Promise<(A, B), G>>,
}

impl<A, B, G> JoinState<A, B, G>
where
    A: Abandoned<G> + Send + 'static,
    B: Abandoned<G> + Send + 'static,
    G: Tag,
{
    /// Removes the promise and both values once both sides have landed, so
    /// fulfillment can happen outside the lock.
    fn take_if_complete(&mut self) -> Option<(Promise<(A, B), G>, (A, B))> {
        if self.a.is_some() && self.b.is_some() {
            let promise = self.output.take()?;
            Some((promise, (self.a.take()?, self.b.take()?)))
        } else {
            None
        }
    }
}
