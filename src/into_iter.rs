//! Owning iterator for `Monoque`.

use std::fmt;
use std::iter::FusedIterator;

use allocator_api2::alloc::{Allocator, Global};

use crate::Monoque;

/// An owning iterator over the elements of a `Monoque`.
///
/// Created by the `into_iter` method (via the [`IntoIterator`] trait).
pub struct IntoIter<T, A: Allocator = Global> {
    seq: Monoque<T, A>,
    /// Next position to yield from the front; positions below it have
    /// already been moved out.
    front: usize,
}

impl<T, A: Allocator> IntoIter<T, A> {
    #[inline]
    pub(crate) fn new(seq: Monoque<T, A>) -> Self {
        Self { seq, front: 0 }
    }
}

impl<T, A: Allocator> Iterator for IntoIter<T, A> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.front >= self.seq.len() {
            return None;
        }
        // The position is live and yielded exactly once.
        let value = unsafe { self.seq.read_at(self.front) };
        self.front += 1;
        Some(value)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.seq.len() - self.front;
        (remaining, Some(remaining))
    }

    #[inline]
    fn count(self) -> usize {
        self.seq.len() - self.front
    }
}

impl<T, A: Allocator> DoubleEndedIterator for IntoIter<T, A> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front >= self.seq.len() {
            return None;
        }
        let new_len = self.seq.len() - 1;
        let value = unsafe { self.seq.read_at(new_len) };
        // The slot is vacated; shrink so neither Drop nor next() touches it.
        self.seq.set_len_internal(new_len);
        Some(value)
    }
}

impl<T, A: Allocator> ExactSizeIterator for IntoIter<T, A> {}

impl<T, A: Allocator> FusedIterator for IntoIter<T, A> {}

impl<T, A: Allocator> Drop for IntoIter<T, A> {
    fn drop(&mut self) {
        // Zero the length before dropping anything: if an element's Drop
        // panics, Monoque's own Drop must not walk these slots again. The
        // elements after the panicking one are leaked in that case.
        let len = self.seq.len();
        self.seq.set_len_internal(0);
        if std::mem::needs_drop::<T>() {
            for position in self.front..len {
                unsafe {
                    std::ptr::drop_in_place(self.seq.slot_ptr(position));
                }
            }
        }
    }
}

impl<T: Clone, A: Allocator + Clone> Clone for IntoIter<T, A> {
    fn clone(&self) -> Self {
        let mut seq = Monoque::with_capacity_in(
            self.seq.len() - self.front,
            self.seq.allocator().clone(),
        );
        for position in self.front..self.seq.len() {
            seq.push(unsafe { self.seq.get_unchecked(position) }.clone());
        }
        IntoIter { seq, front: 0 }
    }
}

impl<T: fmt::Debug, A: Allocator> fmt::Debug for IntoIter<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntoIter")
            .field("remaining", &(self.seq.len() - self.front))
            .finish()
    }
}

// Safety: IntoIter owns its data.
unsafe impl<T: Send, A: Allocator + Send> Send for IntoIter<T, A> {}
unsafe impl<T: Sync, A: Allocator + Sync> Sync for IntoIter<T, A> {}
