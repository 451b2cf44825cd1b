#![doc(
    html_logo_url = "https://raw.githubusercontent.com/vertexclique/vaat/master/art/vaat-square.svg"
)]
//! Vaat: lock-free single-fulfillment futures with no runtime.
//!
//! A [`Promise`] eventually supplies a value; the linked [`Future`] attaches
//! a chain of callbacks that execute wherever fulfillment happens. There is
//! no thread pool, no event loop, and no lock on any resolution path: each
//! chain node carries a single atomic state word, and every transition is
//! one compare-exchange.
//!
//! # Key Features
//!
//! - **Lock-Free Resolution**: One atomic RMW per state transition; the
//!   loser of each attach/fulfill race drives the value forward.
//! - **No Scheduler**: Continuations run synchronously on the thread that
//!   resolves the race. Executor indirection, if wanted, is a closure away.
//! - **Move-Only Handles**: At-most-once fulfillment and consumption are
//!   ownership facts, not runtime checks.
//! - **Abandonment, Not Leaks**: Either side may give up; policy hooks on
//!   the value type decide what the other side observes.
//! - **Inline Fast Path**: Small already-known values live inside the
//!   future handle with no heap node at all.
//! - **Policy Tags**: Inline threshold and assertion behavior are selected
//!   by a zero-sized [`Tag`] parameter.
//!
//! # Example
//!
//! ```rust
//! use vaat::pair;
//! use std::thread;
//!
//! let (promise, future) = pair::<u32, vaat::DefaultTag>();
//!
//! let done = future.and_then(|v| v * 2).and_then(|v| v + 1);
//!
//! thread::spawn(move || {
//!     promise.fulfill(3);
//! });
//!
//! // Blocking escape hatch; fine at the edge of the world, not inside a
//! // continuation.
//! assert_eq!(done.wait(), 7);
//! ```
//!
//! # Safety
//!
//! The state machine uses raw continuation-cell pointers
//! and an uninitialized value slot internally, with the atomic state word as
//! the single source of truth for who owns what. The public API is entirely
//! safe: handles are move-only, and every emplace/take pair is sequenced by
//! an acquire/release edge on the state word.

#![warn(missing_docs)]

mod chain;
mod slot;

/// Capture-at-boundary for panicking transforms.
pub mod capture;
/// Consumer-side handle and pair construction.
pub mod future;
/// Producer-side handle.
pub mod promise;
/// Policy tags and abandonment hooks.
pub mod tag;

pub use capture::{capture, CaptureError, Captured};
pub use future::{pair, Future};
pub use promise::Promise;
pub use tag::{Abandoned, AbandonedError, DefaultTag, Tag};
