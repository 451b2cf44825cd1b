//! Uninitialized value storage with explicit lifetime.
//!
//! `ValueSlot<T>` is the raw memory cell at the heart of every chain node.
//! It never constructs or destructs its contents implicitly; the state
//! machine in [`crate::chain`] decides when a value exists and pairs every
//! `emplace` with exactly one `take` or one `destroy`.

use core::cell::UnsafeCell;
use core::mem::MaybeUninit;

/// A memory cell sized and aligned for `T` that holds zero or one value.
///
/// The slot itself carries no occupancy flag. Whether a value is present is
/// tracked externally (by the state word of the enclosing node), which is
/// what lets the fulfillment protocol publish "value present" and the value
/// bytes with a single atomic release.
pub(crate) struct ValueSlot<T> {
    cell: UnsafeCell<MaybeUninit<T>>,
}

impl<T> ValueSlot<T> {
    /// Creates an empty slot.
    pub(crate) const fn empty() -> Self {
        Self {
            cell: UnsafeCell::new(MaybeUninit::uninit()),
        }
    }

    /// Creates a slot already holding `value`.
    pub(crate) const fn filled(value: T) -> Self {
        Self {
            cell: UnsafeCell::new(MaybeUninit::new(value)),
        }
    }

    /// Constructs `value` in place.
    ///
    /// # Safety
    ///
    /// The slot must be logically empty and the caller must have exclusive
    /// access to it (no concurrent `emplace`/`take`/`destroy`). Publication
    /// to other threads must happen through a release operation on the
    /// owning node's state word.
    pub(crate) unsafe fn emplace(&self, value: T) {
        unsafe { (*self.cell.get()).write(value) };
    }

    /// Moves the value out, leaving the slot logically empty.
    ///
    /// # Safety
    ///
    /// A value must be present, the caller must have exclusive access, and
    /// the value must not be taken or destroyed again afterwards.
    pub(crate) unsafe fn take(&self) -> T {
        unsafe { (*self.cell.get()).assume_init_read() }
    }

    /// Drops the value in place without moving it out.
    ///
    /// # Safety
    ///
    /// Same contract as [`ValueSlot::take`]: value present, exclusive
    /// access, no later `take`/`destroy`.
    pub(crate) unsafe fn destroy(&mut self) {
        unsafe { (*self.cell.get()).assume_init_drop() };
    }
}
