//! Consumer-side handle.

use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use crate::capture::{capture, Captured};
use crate::chain::Core;
use crate::promise::Promise;
use crate::tag::{Abandoned, DefaultTag, Tag};

/// The consumer half of a [`pair`](crate::pair): an eventual value of `T`.
///
/// A future is move-only and consumed by exactly one of
/// [`and_then`](Future::and_then), [`finally`](Future::finally),
/// [`wait`](Future::wait) or by being dropped (which abandons it).
/// Continuations run synchronously on whichever thread resolves the race
/// between attachment and fulfillment; no scheduler is involved.
///
/// Values already known at construction and no larger than the tag's
/// `SMALL_VALUE_SIZE` are stored inline with no heap node at all.
#[must_use = "a dropped future is abandoned; its value goes to the abandoned-future hook"]
pub struct Future<T, G: Tag = DefaultTag>
where
    T: Abandoned<G> + Send + 'static,
{
    inner: Inner<T, G>,
}

enum Inner<T, G: Tag> {
    /// Already consumed (moved out by a combinator); only the Drop impl
    /// ever observes this from outside.
    Consumed,
    /// Inline fast path: the value is right here, no node exists.
    Value(T),
    /// A chain node shared with the producer side.
    Chained(Arc<Core<T, G>>),
}

/// Creates a linked promise/future pair sharing one chain node.
pub fn pair<T, G>() -> (Promise<T, G>, Future<T, G>)
where
    T: Abandoned<G> + Send + 'static,
    G: Tag,
{
    let core = Arc::new(Core::new());
    (
        Promise::from_core(core.clone()),
        Future {
            inner: Inner::Chained(core),
        },
    )
}

impl<T, G> Future<T, G>
where
    T: Abandoned<G> + Send + 'static,
    G: Tag,
{
    /// A future whose value is already known.
    ///
    /// Small values (per `G::SMALL_VALUE_SIZE`) are stored inline without
    /// allocating; larger ones get an already-fulfilled chain node. The two
    /// storage forms are observationally identical.
    pub fn ready(value: T) -> Self {
        if std::mem::size_of::<T>() <= G::SMALL_VALUE_SIZE {
            Self {
                inner: Inner::Value(value),
            }
        } else {
            Self {
                inner: Inner::Chained(Arc::new(Core::fulfilled(value))),
            }
        }
    }

    /// A future whose producer already gave up.
    ///
    /// Consuming it yields `T`'s [`Abandoned::abandoned_promise`] value.
    pub fn abandoned() -> Self {
        Self {
            inner: Inner::Chained(Arc::new(Core::promise_abandoned())),
        }
    }

    fn take_inner(&mut self) -> Inner<T, G> {
        std::mem::replace(&mut self.inner, Inner::Consumed)
    }

    /// Chains a transform, producing the future of its result.
    ///
    /// If the value is already here (inline fast path), `f` runs immediately
    /// on this thread and the result comes back as another ready future.
    /// Otherwise a step is linked into the chain and `f` runs on whichever
    /// thread delivers the value.
    pub fn and_then<R, F>(mut self, f: F) -> Future<R, G>
    where
        R: Abandoned<G> + Send + 'static,
        F: FnOnce(T) -> R + Send + 'static,
    {
        match self.take_inner() {
            Inner::Value(v) => Future::ready(f(v)),
            Inner::Chained(core) => {
                let (next, out) = pair::<R, G>();
                // The step closure is both this node's continuation and the
                // next node's producer; dropping it un-invoked abandons the
                // rest of the chain.
                core.attach(Box::new(move |v| next.fulfill(f(v))));
                out
            }
            Inner::Consumed => {
                G::assert(false, "and_then on a consumed future");
                Future::abandoned()
            }
        }
    }

    /// Chains a transform that may panic, capturing the outcome as a value.
    ///
    /// A panic in `f` becomes `Err(CaptureError::Panicked)` flowing through
    /// the chain like any other value; see [`crate::capture`].
    pub fn and_capture<R, F>(self, f: F) -> Future<Captured<R>, G>
    where
        R: Send + 'static,
        F: FnOnce(T) -> R + Send + 'static,
    {
        self.and_then(move |v| capture(move || f(v)))
    }

    /// Terminates the chain with a side-effecting callback.
    pub fn finally<F>(mut self, f: F)
    where
        F: FnOnce(T) + Send + 'static,
    {
        match self.take_inner() {
            Inner::Value(v) => f(v),
            Inner::Chained(core) => core.attach(Box::new(f)),
            Inner::Consumed => G::assert(false, "finally on a consumed future"),
        }
    }

    /// Blocks the calling thread until the value arrives.
    ///
    /// This is the deliberate exception to the never-block design: it parks
    /// the thread on a condition variable and defeats the point of chaining.
    /// Reserve it for test code and the outermost glue layer; inside a
    /// continuation it can deadlock the very thread that would fulfill it.
    pub fn wait(self) -> T {
        let parked = Arc::new((Mutex::new(None::<T>), Condvar::new()));
        let handoff = parked.clone();
        self.finally(move |v| {
            let (lock, cvar) = &*handoff;
            *lock.lock().unwrap() = Some(v);
            cvar.notify_one();
        });
        let (lock, cvar) = &*parked;
        let mut slot = lock.lock().unwrap();
        loop {
            match slot.take() {
                Some(v) => return v,
                None => slot = cvar.wait(slot).unwrap(),
            }
        }
    }

    /// Blocks until the value arrives or `timeout` elapses.
    ///
    /// On timeout the waiter detaches: `None` is returned and the value, if
    /// it is ever produced, is routed to `T`'s
    /// [`Abandoned::abandoned_future`] hook as if the future had been
    /// dropped. Same blocking caveats as [`wait`](Future::wait).
    pub fn wait_for(self, timeout: Duration) -> Option<T> {
        let parked = Arc::new((Mutex::new(WaitSlot::Waiting), Condvar::new()));
        let handoff = parked.clone();
        self.finally(move |v| {
            let (lock, cvar) = &*handoff;
            let mut slot = lock.lock().unwrap();
            match *slot {
                WaitSlot::Waiting => {
                    *slot = WaitSlot::Delivered(v);
                    cvar.notify_one();
                }
                WaitSlot::TimedOut => {
                    drop(slot);
                    v.abandoned_future();
                }
                WaitSlot::Delivered(_) => {}
            }
        });
        let (lock, cvar) = &*parked;
        let slot = lock.lock().unwrap();
        let (mut slot, result) = cvar
            .wait_timeout_while(slot, timeout, |s| matches!(s, WaitSlot::Waiting))
            .unwrap();
        if result.timed_out() && matches!(*slot, WaitSlot::Waiting) {
            *slot = WaitSlot::TimedOut;
            return None;
        }
        match std::mem::replace(&mut *slot, WaitSlot::TimedOut) {
            WaitSlot::Delivered(v) => Some(v),
            _ => None,
        }
    }
}

enum WaitSlot<T> {
    Waiting,
    Delivered(T),
    TimedOut,
}

impl<R, G> Future<Future<R, G>, G>
where
    R: Abandoned<G> + Send + 'static,
    G: Tag,
{
    /// Collapses one level of nesting.
    ///
    /// An abandoned outer future yields an abandoned inner one, so the
    /// result surfaces `R`'s abandonment policy either way.
    pub fn flatten(self) -> Future<R, G> {
        let (next, out) = pair::<R, G>();
        self.finally(move |inner| inner.finally(move |v| next.fulfill(v)));
        out
    }
}

impl<R, G> Abandoned<G> for Future<R, G>
where
    R: Abandoned<G> + Send + 'static,
    G: Tag,
{
    fn abandoned_promise() -> Self {
        Future::abandoned()
    }
}

impl<T, G> Drop for Future<T, G>
where
    T: Abandoned<G> + Send + 'static,
    G: Tag,
{
    fn drop(&mut self) {
        match std::mem::replace(&mut self.inner, Inner::Consumed) {
            Inner::Consumed => {}
            Inner::Value(v) => v.abandoned_future(),
            Inner::Chained(core) => core.abandon_future(),
        }
    }
}

impl<T, G> std::fmt::Debug for Future<T, G>
where
    T: Abandoned<G> + Send + 'static,
    G: Tag,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match self.inner {
            Inner::Consumed => "consumed",
            Inner::Value(_) => "inline",
            Inner::Chained(_) => "chained",
        };
        f.debug_struct("Future").field("state", &state).finish()
    }
}
