//! A futures-aware mutex with FIFO handoff.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use vaat::{pair, Abandoned, Future, Promise, Tag};

/// An asynchronous mutex.
///
/// [`async_lock`](FutureMutex::async_lock) never blocks: it returns a future
/// that resolves, immediately when the mutex is free, to a scoped-unlock
/// [`LockGuard`]. Contending callers queue as pending promises and are
/// granted the lock in strict FIFO request order as each holder's guard
/// drops.
///
/// The mutex guards no data of its own; pair it with whatever state the
/// critical section protects. Continuations attached to the returned future
/// run on the unlocking thread (or inline, on the uncontended path), per the
/// crate-wide no-scheduler rule.
pub struct FutureMutex<G: Tag = vaat::DefaultTag> {
    inner: Arc<MutexInner<G>>,
}

struct MutexInner<G: Tag> {
    state: Mutex<MutexState<G>>,
}

struct MutexState<G: Tag> {
    locked: bool,
    waiters: VecDeque<Promise<LockGuard<G>, G>>,
}

/// Scoped-unlock guard: holding it holds the lock, dropping it passes the
/// lock to the next FIFO waiter.
///
/// A guard synthesized by promise abandonment (the mutex was dropped while
/// this caller waited) is inert: it holds nothing and unlocks nothing, which
/// [`LockGuard::holds_lock`] reports.
pub struct LockGuard<G: Tag = vaat::DefaultTag> {
    inner: Option<Arc<MutexInner<G>>>,
}

impl<G: Tag> FutureMutex<G> {
    /// Creates an unlocked mutex.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MutexInner {
                state: Mutex::new(MutexState {
                    locked: false,
                    waiters: VecDeque::new(),
                }),
            }),
        }
    }

    /// Requests the lock; the returned future resolves to the guard.
    ///
    /// Free mutex: resolves immediately (inline fast path, no allocation).
    /// Held mutex: the caller joins the FIFO wait queue.
    pub fn async_lock(&self) -> Future<LockGuard<G>, G> {
        let mut state = self.inner.state.lock().unwrap();
        if !state.locked {
            state.locked = true;
            drop(state);
            Future::ready(LockGuard {
                inner: Some(self.inner.clone()),
            })
        } else {
            let (promise, future) = pair::<LockGuard<G>, G>();
            state.waiters.push_back(promise);
            future
        }
    }

    /// Takes the lock only if it is free right now.
    pub fn try_lock(&self) -> Option<LockGuard<G>> {
        let mut state = self.inner.state.lock().unwrap();
        if state.locked {
            None
        } else {
            state.locked = true;
            Some(LockGuard {
                inner: Some(self.inner.clone()),
            })
        }
    }
}

impl<G: Tag> Default for FutureMutex<G> {
    fn default() -> Self {
        Self::new()
    }
}

impl<G: Tag> Clone for FutureMutex<G> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

fn unlock<G: Tag>(inner: &Arc<MutexInner<G>>) {
    // Pop the next waiter under the lock, fulfill it outside: fulfillment
    // runs the waiter's continuation synchronously, and that continuation
    // may itself unlock.
    let next = {
        let mut state = inner.state.lock().unwrap();
        match state.waiters.pop_front() {
            Some(promise) => Some(promise),
            None => {
                state.locked = false;
                None
            }
        }
    };
    if let Some(promise) = next {
        promise.fulfill(LockGuard {
            inner: Some(inner.clone()),
        });
    }
}

impl<G: Tag> LockGuard<G> {
    /// True for a live guard, false for one synthesized by abandonment.
    pub fn holds_lock(&self) -> bool {
        self.inner.is_some()
    }
}

impl<G: Tag> Drop for LockGuard<G> {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.take() {
            unlock(&inner);
        }
    }
}

impl<G: Tag> Abandoned<G> for LockGuard<G> {
    fn abandoned_promise() -> Self {
        LockGuard { inner: None }
    }

    // The default abandoned_future hook drops the guard, which unlocks: a
    // waiter that gave up must not wedge the queue when its turn comes.
}
