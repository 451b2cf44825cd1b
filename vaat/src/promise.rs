//! Producer-side handle.

use std::sync::Arc;

use crate::chain::Core;
use crate::tag::{Abandoned, DefaultTag, Tag};

/// The producer half of a [`pair`](crate::pair): supplies the eventual value
/// exactly once.
///
/// A promise is move-only and consumed by [`fulfill`](Promise::fulfill), so
/// "fulfilled at most once" is enforced by ownership rather than at runtime.
/// Dropping an unfulfilled promise abandons it: an attached (or later
/// attached) continuation receives the value synthesized by the type's
/// [`Abandoned`] policy instead of hanging forever.
pub struct Promise<T, G: Tag = DefaultTag>
where
    T: Abandoned<G> + Send + 'static,
{
    core: Option<Arc<Core<T, G>>>,
}

impl<T, G> Promise<T, G>
where
    T: Abandoned<G> + Send + 'static,
    G: Tag,
{
    pub(crate) fn from_core(core: Arc<Core<T, G>>) -> Self {
        Self { core: Some(core) }
    }

    /// Delivers `value` to the linked future, consuming the promise.
    ///
    /// If a continuation chain is already attached, it runs synchronously on
    /// this thread, all the way through any queued transforms. If the linked
    /// future was dropped, the value is routed to its
    /// [`Abandoned::abandoned_future`] hook.
    pub fn fulfill(mut self, value: T) {
        match self.core.take() {
            Some(core) => core.fulfill(value),
            None => G::assert(false, "fulfill on a consumed promise"),
        }
    }

    /// Gives up without producing a value.
    ///
    /// Equivalent to dropping the promise; spelled out for call sites where
    /// abandonment is the point rather than an accident.
    pub fn abandon(self) {}
}

impl<T, G> Drop for Promise<T, G>
where
    T: Abandoned<G> + Send + 'static,
    G: Tag,
{
    fn drop(&mut self) {
        if let Some(core) = self.core.take() {
            core.abandon_promise();
        }
    }
}

impl<T, G> std::fmt::Debug for Promise<T, G>
where
    T: Abandoned<G> + Send + 'static,
    G: Tag,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Promise")
            .field("consumed", &self.core.is_none())
            .finish()
    }
}
