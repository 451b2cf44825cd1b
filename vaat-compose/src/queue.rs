//! Completion queue: futures from anywhere, values popped in one place.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use vaat::{Abandoned, Future, Tag};

/// Receives completed values from any number of registered futures, from
/// arbitrary threads, and hands them out one at a time.
///
/// Concurrency here is coarse producer/consumer queueing, so a plain mutex
/// and condition variable carry it; the fine-grained lock-free machinery
/// stays inside the chains feeding the queue. Values arrive in completion
/// order, not registration order.
///
/// Cloning the queue clones a handle to the same underlying queue.
pub struct CompletionQueue<T, G: Tag = vaat::DefaultTag>
where
    T: Abandoned<G> + Send + 'static,
{
    inner: Arc<QueueInner<T>>,
    _tag: std::marker::PhantomData<G>,
}

struct QueueInner<T> {
    items: Mutex<VecDeque<T>>,
    ready: Condvar,
}

impl<T, G> CompletionQueue<T, G>
where
    T: Abandoned<G> + Send + 'static,
    G: Tag,
{
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(QueueInner {
                items: Mutex::new(VecDeque::new()),
                ready: Condvar::new(),
            }),
            _tag: std::marker::PhantomData,
        }
    }

    /// Routes `future`'s eventual value into this queue.
    ///
    /// The push happens on whichever thread completes the future. An
    /// abandoned future contributes its synthesized abandonment value.
    pub fn register(&self, future: Future<T, G>) {
        let inner = self.inner.clone();
        future.finally(move |value| {
            inner.items.lock().unwrap().push_back(value);
            inner.ready.notify_one();
        });
    }

    /// Pops one completed value without blocking.
    pub fn try_pop(&self) -> Option<T> {
        self.inner.items.lock().unwrap().pop_front()
    }

    /// Pops one completed value, blocking until one is available.
    ///
    /// Blocks forever if nothing registered ever completes; this is the
    /// queue-shaped sibling of [`Future::wait`] and carries the same
    /// boundary-code-only caveat.
    pub fn wait(&self) -> T {
        let mut items = self.inner.items.lock().unwrap();
        loop {
            match items.pop_front() {
                Some(v) => return v,
                None => items = self.inner.ready.wait(items).unwrap(),
            }
        }
    }

    /// Pops one completed value, blocking at most `timeout`.
    pub fn wait_for(&self, timeout: Duration) -> Option<T> {
        let items = self.inner.items.lock().unwrap();
        let (mut items, _) = self
            .inner
            .ready
            .wait_timeout_while(items, timeout, |q| q.is_empty())
            .unwrap();
        items.pop_front()
    }

    /// Number of values currently parked in the queue.
    pub fn len(&self) -> usize {
        self.inner.items.lock().unwrap().len()
    }

    /// True when no completed value is waiting.
    pub fn is_empty(&self) -> bool {
        self.inner.items.lock().unwrap().is_empty()
    }
}

impl<T, G> Default for CompletionQueue<T, G>
where
    T: Abandoned<G> + Send + 'static,
    G: Tag,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, G> Clone for CompletionQueue<T, G>
where
    T: Abandoned<G> + Send + 'static,
    G: Tag,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            _tag: std::marker::PhantomData,
        }
    }
}
