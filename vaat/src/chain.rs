//! The lock-free fulfillment/abandonment state machine.
//!
//! Every chain node is a [`Core`]: one [`ValueSlot`] plus one atomic state
//! word. The word holds either a small sentinel or a pointer to an attached
//! continuation, and every transition is a single compare-exchange from
//! `EMPTY`. Exactly two actors ever touch a node: the producer side
//! (fulfill / abandon-promise) and the consumer side (attach /
//! abandon-future). Whichever of them loses the CAS race observes the
//! winner's publication and drives the value (or its absence) forward.
//!
//! State word values:
//!
//! | value            | meaning                                             |
//! |------------------|-----------------------------------------------------|
//! | `EMPTY`          | nothing has happened yet                            |
//! | `FULFILLED`      | value sits in the slot, no continuation attached    |
//! | `PROMISE_GAVE_UP`| producer abandoned before a continuation arrived    |
//! | `FUTURE_GAVE_UP` | consumer abandoned before the value arrived         |
//! | `DONE`           | the losing side consumed the slot and/or the cell   |
//! | anything else    | `Box<ContinuationCell<T>>` raw pointer              |
//!
//! Continuation cells are `#[repr(align(8))]`, so real pointers can never
//! collide with the sentinels.
//!
//! Ordering discipline: every CAS uses `AcqRel` on success and `Acquire` on
//! failure. Success publishes this side's write (the emplaced value, or the
//! fully built cell); failure acquires the other side's publication before
//! the loser dereferences it. The loser's final `DONE` store is `Release`
//! so a later drop of the node on a third thread observes the emptied slot.

use core::marker::PhantomData;
use core::sync::atomic::{AtomicUsize, Ordering};

use crate::slot::ValueSlot;
use crate::tag::{Abandoned, Tag};

/// No continuation attached, value not yet delivered.
const EMPTY: usize = 0;
/// Value delivered into the slot; no continuation attached.
const FULFILLED: usize = 1;
/// Producer gave up; a later continuation receives a synthesized value.
const PROMISE_GAVE_UP: usize = 2;
/// Consumer gave up; a later value is routed to the abandoned-future hook.
const FUTURE_GAVE_UP: usize = 3;
/// Terminal: slot emptied and continuation (if any) consumed.
const DONE: usize = 4;

/// A heap-allocated link in the callback chain.
///
/// Alignment keeps `Box<ContinuationCell<T>>` pointers disjoint from the
/// sentinel values above on every supported target.
#[repr(align(8))]
pub(crate) struct ContinuationCell<T> {
    f: Box<dyn FnOnce(T) + Send>,
}

impl<T> ContinuationCell<T> {
    fn boxed(f: Box<dyn FnOnce(T) + Send>) -> Box<Self> {
        Box::new(Self { f })
    }

    /// Invokes the stored continuation, consuming the cell.
    fn deliver(self: Box<Self>, value: T) {
        (self.f)(value)
    }
}

/// A chain node: the shared start node of one producer/consumer edge.
///
/// Jointly owned (via `Arc`) by a [`Promise`](crate::Promise) and a
/// [`Future`](crate::Future), or by a step closure standing in for either.
pub(crate) struct Core<T, G: Tag> {
    state: AtomicUsize,
    slot: ValueSlot<T>,
    _tag: PhantomData<G>,
}

// The slot is only ever touched by the single actor the state word says owns
// it, so sharing a Core between the producer and consumer threads is sound
// whenever the value itself can move between threads.
unsafe impl<T: Send, G: Tag> Send for Core<T, G> {}
unsafe impl<T: Send, G: Tag> Sync for Core<T, G> {}

impl<T, G: Tag> Core<T, G> {
    /// A node with nothing delivered and nothing attached.
    pub(crate) const fn new() -> Self {
        Self {
            state: AtomicUsize::new(EMPTY),
            slot: ValueSlot::empty(),
            _tag: PhantomData,
        }
    }

    /// A node born with its value already delivered.
    pub(crate) const fn fulfilled(value: T) -> Self {
        Self {
            state: AtomicUsize::new(FULFILLED),
            slot: ValueSlot::filled(value),
            _tag: PhantomData,
        }
    }

    /// A node whose producer side already gave up.
    pub(crate) const fn promise_abandoned() -> Self {
        Self {
            state: AtomicUsize::new(PROMISE_GAVE_UP),
            slot: ValueSlot::empty(),
            _tag: PhantomData,
        }
    }
}

impl<T, G> Core<T, G>
where
    T: Abandoned<G> + Send + 'static,
    G: Tag,
{
    /// Producer side: deliver `value` into this node.
    ///
    /// If the consumer has not acted yet the value parks in the slot and the
    /// transition ends at `FULFILLED`. If a continuation raced in first, it
    /// is invoked here, on the fulfilling thread. If the consumer already
    /// gave up, the value goes to its abandoned-future hook instead.
    pub(crate) fn fulfill(&self, value: T) {
        // Publish the value bytes first; the CAS release makes them visible
        // to whichever consumer observes FULFILLED.
        unsafe { self.slot.emplace(value) };
        match self
            .state
            .compare_exchange(EMPTY, FULFILLED, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => {}
            Err(FUTURE_GAVE_UP) => {
                let value = unsafe { self.slot.take() };
                self.state.store(DONE, Ordering::Release);
                value.abandoned_future();
            }
            Err(observed) if observed > DONE => {
                // A real continuation pointer raced in first.
                let cell = unsafe { Box::from_raw(observed as *mut ContinuationCell<T>) };
                let value = unsafe { self.slot.take() };
                self.state.store(DONE, Ordering::Release);
                cell.deliver(value);
            }
            Err(_) => {
                // FULFILLED / PROMISE_GAVE_UP / DONE: the producer acted
                // twice. Unreachable from safe code (handles are move-only).
                G::assert(false, "promise resolved more than once");
            }
        }
    }

    /// Producer side: give up without delivering.
    ///
    /// An already-attached continuation receives the tag policy's
    /// synthesized value; an already-abandoned consumer means there is
    /// nothing left to do.
    pub(crate) fn abandon_promise(&self) {
        match self.state.compare_exchange(
            EMPTY,
            PROMISE_GAVE_UP,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => {}
            Err(FUTURE_GAVE_UP) => {
                self.state.store(DONE, Ordering::Release);
            }
            Err(observed) if observed > DONE => {
                let cell = unsafe { Box::from_raw(observed as *mut ContinuationCell<T>) };
                self.state.store(DONE, Ordering::Release);
                cell.deliver(T::abandoned_promise());
            }
            Err(_) => {
                G::assert(false, "promise resolved more than once");
            }
        }
    }

    /// Consumer side: attach `f` as this node's continuation.
    ///
    /// On the short path (the producer already acted) `f` runs
    /// synchronously on the calling thread, either with the parked value or
    /// with the synthesized abandonment value. Otherwise the cell is linked
    /// in and the eventual producer invokes it.
    pub(crate) fn attach(&self, f: Box<dyn FnOnce(T) + Send>) {
        let cell = ContinuationCell::boxed(f);
        let raw = Box::into_raw(cell);
        match self
            .state
            .compare_exchange(EMPTY, raw as usize, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => {}
            Err(observed) => {
                // The producer already acted; reclaim our cell and run it
                // here, on the attaching thread.
                let cell = unsafe { Box::from_raw(raw) };
                match observed {
                    FULFILLED => {
                        let value = unsafe { self.slot.take() };
                        self.state.store(DONE, Ordering::Release);
                        cell.deliver(value);
                    }
                    PROMISE_GAVE_UP => {
                        self.state.store(DONE, Ordering::Release);
                        cell.deliver(T::abandoned_promise());
                    }
                    _ => {
                        // FUTURE_GAVE_UP / DONE / another cell: the consumer
                        // acted twice. Unreachable from safe code.
                        G::assert(false, "future consumed more than once");
                    }
                }
            }
        }
    }

    /// Consumer side: give up without attaching.
    pub(crate) fn abandon_future(&self) {
        match self.state.compare_exchange(
            EMPTY,
            FUTURE_GAVE_UP,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => {}
            Err(FULFILLED) => {
                let value = unsafe { self.slot.take() };
                self.state.store(DONE, Ordering::Release);
                value.abandoned_future();
            }
            Err(PROMISE_GAVE_UP) => {
                self.state.store(DONE, Ordering::Release);
            }
            Err(_) => {
                G::assert(false, "future consumed more than once");
            }
        }
    }
}

impl<T, G: Tag> Drop for Core<T, G> {
    fn drop(&mut self) {
        // Both handles are gone. Under normal use every race has resolved to
        // a terminal sentinel, but a leaked (mem::forget) handle can strand
        // a parked value or an un-invoked cell; release them here.
        match *self.state.get_mut() {
            EMPTY | PROMISE_GAVE_UP | FUTURE_GAVE_UP | DONE => {}
            FULFILLED => unsafe { self.slot.destroy() },
            cell => drop(unsafe { Box::from_raw(cell as *mut ContinuationCell<T>) }),
        }
    }
}
