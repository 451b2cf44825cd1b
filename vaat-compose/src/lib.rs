#![doc(
    html_logo_url = "https://raw.githubusercontent.com/vertexclique/vaat/master/art/vaat-square.svg"
)]
//! Composition utilities for [`vaat`](https://docs.rs/vaat) futures.
//!
//! Everything here is built purely on `vaat`'s public surface; nothing
//! reaches into the lock-free chain machinery. Where these utilities need
//! their own synchronization it is coarse producer/consumer queueing, which
//! a plain mutex and condition variable carry fine.
//!
//! # Key Features
//!
//! - [`collect`] / [`join`]: fan-in of N futures into one, preserving input
//!   order regardless of completion order.
//! - [`CompletionQueue`]: completed values from arbitrary threads, popped
//!   one at a time, blocking or not.
//! - [`FutureMutex`]: an async mutex whose lock is a future; FIFO handoff.
//! - [`Sequencer`]: a step pipeline sharing one reference-counted state
//!   object across all steps.
//!
//! # Example
//!
//! ```rust
//! use vaat::{pair, DefaultTag};
//! use vaat_compose::collect;
//! use std::thread;
//!
//! let (p0, f0) = pair::<u32, DefaultTag>();
//! let (p1, f1) = pair::<u32, DefaultTag>();
//! let all = collect(vec![f0, f1]);
//!
//! // Completion order differs from input order; the result does not.
//! thread::spawn(move || p1.fulfill(11));
//! thread::spawn(move || p0.fulfill(10));
//!
//! assert_eq!(all.wait(), vec![10, 11]);
//! ```

#![warn(missing_docs)]

mod collect;
mod mutex;
mod queue;
mod sequencer;

pub use collect::{collect, join, join3};
pub use mutex::{FutureMutex, LockGuard};
pub use queue::CompletionQueue;
pub use sequencer::Sequencer;
