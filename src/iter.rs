//! Borrowing iterators for `Monoque`.
//!
//! Both cursors are (container, position) pairs: advancing is position
//! arithmetic and dereferencing goes through the same O(1) position mapping
//! as indexing, so `nth`/`nth_back` skip in constant time.

use std::fmt;
use std::iter::FusedIterator;
use std::marker::PhantomData;
use std::ptr::NonNull;

use allocator_api2::alloc::{Allocator, Global};

use crate::Monoque;

/// An iterator over references to the elements of a `Monoque`.
pub struct Iter<'a, T, A: Allocator = Global> {
    seq: &'a Monoque<T, A>,
    /// Next position to yield from the front.
    front: usize,
    /// One past the last position to yield from the back.
    back: usize,
}

impl<'a, T, A: Allocator> Iter<'a, T, A> {
    #[inline]
    pub(crate) fn new(seq: &'a Monoque<T, A>) -> Self {
        Self {
            seq,
            front: 0,
            back: seq.len(),
        }
    }
}

impl<'a, T, A: Allocator> Iterator for Iter<'a, T, A> {
    type Item = &'a T;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }
        let item = unsafe { self.seq.get_unchecked(self.front) };
        self.front += 1;
        Some(item)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back - self.front;
        (remaining, Some(remaining))
    }

    #[inline]
    fn nth(&mut self, n: usize) -> Option<Self::Item> {
        let position = self.front.checked_add(n)?;
        if position >= self.back {
            self.front = self.back;
            return None;
        }
        self.front = position + 1;
        Some(unsafe { self.seq.get_unchecked(position) })
    }

    #[inline]
    fn count(self) -> usize {
        self.back - self.front
    }

    #[inline]
    fn last(mut self) -> Option<Self::Item> {
        self.next_back()
    }
}

impl<T, A: Allocator> DoubleEndedIterator for Iter<'_, T, A> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }
        self.back -= 1;
        Some(unsafe { self.seq.get_unchecked(self.back) })
    }

    #[inline]
    fn nth_back(&mut self, n: usize) -> Option<Self::Item> {
        if n >= self.back - self.front {
            self.front = self.back;
            return None;
        }
        self.back -= n + 1;
        Some(unsafe { self.seq.get_unchecked(self.back) })
    }
}

impl<T, A: Allocator> ExactSizeIterator for Iter<'_, T, A> {}

impl<T, A: Allocator> FusedIterator for Iter<'_, T, A> {}

impl<T, A: Allocator> Clone for Iter<'_, T, A> {
    fn clone(&self) -> Self {
        Self {
            seq: self.seq,
            front: self.front,
            back: self.back,
        }
    }
}

impl<T: fmt::Debug, A: Allocator> fmt::Debug for Iter<'_, T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

// Safety: Iter only hands out shared references.
unsafe impl<T: Sync, A: Allocator + Sync> Send for Iter<'_, T, A> {}
unsafe impl<T: Sync, A: Allocator + Sync> Sync for Iter<'_, T, A> {}

/// An iterator over mutable references to the elements of a `Monoque`.
pub struct IterMut<'a, T, A: Allocator = Global> {
    seq: NonNull<Monoque<T, A>>,
    front: usize,
    back: usize,
    _marker: PhantomData<&'a mut Monoque<T, A>>,
}

impl<'a, T, A: Allocator> IterMut<'a, T, A> {
    #[inline]
    pub(crate) fn new(seq: &'a mut Monoque<T, A>) -> Self {
        let back = seq.len();
        Self {
            seq: NonNull::from(seq),
            front: 0,
            back,
            _marker: PhantomData,
        }
    }

    /// Pointer to the slot at `position`.
    ///
    /// # Safety
    ///
    /// `position` must be a live position of the underlying container.
    #[inline]
    unsafe fn slot(&self, position: usize) -> *mut T {
        self.seq.as_ref().slot_ptr(position)
    }
}

impl<'a, T, A: Allocator> Iterator for IterMut<'a, T, A> {
    type Item = &'a mut T;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }
        // Each position is yielded at most once, so the references returned
        // over the iterator's lifetime never alias.
        let item = unsafe { &mut *self.slot(self.front) };
        self.front += 1;
        Some(item)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back - self.front;
        (remaining, Some(remaining))
    }

    #[inline]
    fn nth(&mut self, n: usize) -> Option<Self::Item> {
        let position = self.front.checked_add(n)?;
        if position >= self.back {
            self.front = self.back;
            return None;
        }
        self.front = position + 1;
        Some(unsafe { &mut *self.slot(position) })
    }

    #[inline]
    fn last(mut self) -> Option<Self::Item> {
        self.next_back()
    }
}

impl<T, A: Allocator> DoubleEndedIterator for IterMut<'_, T, A> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }
        self.back -= 1;
        Some(unsafe { &mut *self.slot(self.back) })
    }

    #[inline]
    fn nth_back(&mut self, n: usize) -> Option<Self::Item> {
        if n >= self.back - self.front {
            self.front = self.back;
            return None;
        }
        self.back -= n + 1;
        Some(unsafe { &mut *self.slot(self.back) })
    }
}

impl<T, A: Allocator> ExactSizeIterator for IterMut<'_, T, A> {}

impl<T, A: Allocator> FusedIterator for IterMut<'_, T, A> {}

// Safety: IterMut hands out exclusive references to distinct positions.
unsafe impl<T: Send, A: Allocator + Send> Send for IterMut<'_, T, A> {}
unsafe impl<T: Sync, A: Allocator + Sync> Sync for IterMut<'_, T, A> {}
