//! Compile-time policy tags.
//!
//! Every type in this crate is parameterized by a [`Tag`]: a zero-sized
//! marker selecting the inline-storage threshold and the contract-violation
//! handler. Per-type abandonment behavior rides on the [`Abandoned`] trait,
//! keyed by the same tag so different embeddings can give the same value
//! type different policies.

use core::fmt;

/// Policy bundle parameterizing the whole library.
///
/// A tag is a zero-sized compile-time marker, never a runtime entity.
/// Embedders define their own tag when they need a different inline
/// threshold or a different response to contract violations; everyone else
/// uses [`DefaultTag`].
pub trait Tag: Copy + Default + Send + Sync + 'static {
    /// Byte threshold below which a known value is stored inline in the
    /// future handle instead of behind a heap-allocated chain node.
    const SMALL_VALUE_SIZE: usize;

    /// Contract-violation handler. Called with `false` when a programming
    /// error is detected (e.g. an operation on a consumed handle reached
    /// the state machine anyway). Must be fatal in debug builds; may be a
    /// no-op in release builds. Behavior after returning from a violated
    /// contract is unspecified.
    fn assert(cond: bool, msg: &'static str);
}

/// The stock policy: 64-byte inline threshold, fatal assertions in debug
/// builds only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DefaultTag;

impl Tag for DefaultTag {
    const SMALL_VALUE_SIZE: usize = 64;

    #[inline]
    fn assert(cond: bool, msg: &'static str) {
        if cfg!(debug_assertions) && !cond {
            panic!("vaat contract violation: {}", msg);
        }
    }
}

/// Marker error for a value that was never produced because its promise was
/// abandoned.
///
/// `Result<T, E>` is [`Abandoned`] whenever `E: From<AbandonedError>`, which
/// is how error-carrying chains encode producer abandonment as an ordinary
/// `Err` instead of a synthesized default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbandonedError;

impl fmt::Display for AbandonedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "promise abandoned before fulfillment")
    }
}

impl std::error::Error for AbandonedError {}

/// Per-type abandonment policy under tag `G`.
///
/// The state machine consults this trait on the two "one side gave up"
/// edges:
///
/// - [`abandoned_promise`](Abandoned::abandoned_promise) synthesizes the
///   value delivered to a continuation whose producer was dropped.
/// - [`abandoned_future`](Abandoned::abandoned_future) receives a value
///   whose consumer was dropped; the default drops it silently.
///
/// Implement this for your value types to participate in a chain. The crate
/// supplies impls for the common std types (primitives, `Option`, `Vec`,
/// `Box`, `Result` with a convertible error, small tuples).
pub trait Abandoned<G: Tag>: Sized {
    /// Value delivered in place of one the producer never supplied.
    fn abandoned_promise() -> Self;

    /// Called with a value the consumer will never observe.
    fn abandoned_future(self) {}
}

macro_rules! impl_abandoned_via_default {
    ($($t:ty),* $(,)?) => {
        $(
            impl<G: Tag> Abandoned<G> for $t {
                fn abandoned_promise() -> Self {
                    <$t>::default()
                }
            }
        )*
    };
}

impl_abandoned_via_default! {
    (), bool, char,
    u8, u16, u32, u64, u128, usize,
    i8, i16, i32, i64, i128, isize,
    f32, f64,
    String,
}

impl<G: Tag, T> Abandoned<G> for Option<T> {
    fn abandoned_promise() -> Self {
        None
    }
}

impl<G: Tag, T> Abandoned<G> for Vec<T> {
    fn abandoned_promise() -> Self {
        Vec::new()
    }
}

impl<G: Tag, T: Abandoned<G>> Abandoned<G> for Box<T> {
    fn abandoned_promise() -> Self {
        Box::new(T::abandoned_promise())
    }

    fn abandoned_future(self) {
        (*self).abandoned_future();
    }
}

impl<G: Tag, T, E: From<AbandonedError>> Abandoned<G> for Result<T, E> {
    fn abandoned_promise() -> Self {
        Err(AbandonedError.into())
    }
}

impl<G: Tag, A: Abandoned<G>, B: Abandoned<G>> Abandoned<G> for (A, B) {
    fn abandoned_promise() -> Self {
        (A::abandoned_promise(), B::abandoned_promise())
    }

    fn abandoned_future(self) {
        self.0.abandoned_future();
        self.1.abandoned_future();
    }
}

impl<G: Tag, A: Abandoned<G>, B: Abandoned<G>, C: Abandoned<G>> Abandoned<G> for (A, B, C) {
    fn abandoned_promise() -> Self {
        (
            A::abandoned_promise(),
            B::abandoned_promise(),
            C::abandoned_promise(),
        )
    }

    fn abandoned_future(self) {
        self.0.abandoned_future();
        self.1.abandoned_future();
        self.2.abandoned_future();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_encodes_abandonment_as_err() {
        let r: Result<u32, AbandonedError> =
            <Result<u32, AbandonedError> as Abandoned<DefaultTag>>::abandoned_promise();
        assert_eq!(r, Err(AbandonedError));
    }

    #[test]
    fn option_abandons_to_none() {
        let v: Option<String> = <Option<String> as Abandoned<DefaultTag>>::abandoned_promise();
        assert!(v.is_none());
    }

    #[test]
    fn tuple_abandons_elementwise() {
        let (a, b): (u32, Option<u8>) =
            <(u32, Option<u8>) as Abandoned<DefaultTag>>::abandoned_promise();
        assert_eq!(a, 0);
        assert!(b.is_none());
    }

    #[test]
    fn assert_is_silent_when_the_condition_holds() {
        DefaultTag::assert(true, "never shown");
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "vaat contract violation: boom")]
    fn assert_is_fatal_in_debug_builds() {
        DefaultTag::assert(false, "boom");
    }

    #[test]
    #[cfg(not(debug_assertions))]
    fn assert_is_a_noop_in_release_builds() {
        DefaultTag::assert(false, "ignored");
    }
}
