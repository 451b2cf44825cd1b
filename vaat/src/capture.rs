//! Capture-at-boundary for fallible transforms.
//!
//! The chain machinery requires non-panicking continuations: a panic inside
//! one would unwind through the fulfilling thread's stack, wherever that
//! happens to be. [`capture`] converts a possibly-panicking function into
//! one that returns a [`Captured`] value, so failures travel through the
//! chain as ordinary `Err`s. Producer abandonment folds into the same error
//! type via `From<AbandonedError>`.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use crate::tag::AbandonedError;

/// Outcome of a captured invocation: the value, or why there is none.
pub type Captured<T> = Result<T, CaptureError>;

/// Why a captured chain step produced no value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// The producer side of the chain was abandoned before this step.
    Abandoned,
    /// The step itself panicked; the payload's message, if it had one.
    Panicked(String),
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::Abandoned => write!(f, "promise abandoned before fulfillment"),
            CaptureError::Panicked(msg) => write!(f, "chain step panicked: {}", msg),
        }
    }
}

impl std::error::Error for CaptureError {}

impl From<AbandonedError> for CaptureError {
    fn from(_: AbandonedError) -> Self {
        CaptureError::Abandoned
    }
}

/// Runs `f`, converting a panic into `Err(CaptureError::Panicked)`.
///
/// The unwind boundary sits here, not inside the state machine; what flows
/// on through the chain is a plain value either way.
pub fn capture<T, F>(f: F) -> Captured<T>
where
    F: FnOnce() -> T,
{
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| {
        let msg = payload
            .downcast_ref::<&'static str>()
            .map(|s| (*s).to_owned())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_owned());
        CaptureError::Panicked(msg)
    })
}
