//! A segmented growable vector with stable element addresses.
//!
//! Unlike `Vec`, pushing new elements never relocates existing ones: elements
//! live in segments of exponentially growing sizes that are allocated once and
//! never moved or resized. Indexing stays worst-case O(1) because a logical
//! position maps to its segment with a single highest-set-bit computation.
//!
//! Segment 0 holds positions `{0, 1}`; segment `i >= 1` holds positions
//! `[2^i, 2^(i+1))` with capacity `2^i`. Total allocated capacity therefore
//! never exceeds twice the element count at steady state.
//!
//! # Example
//!
//! ```
//! use monoque::Monoque;
//!
//! let mut seq: Monoque<i32> = Monoque::new();
//! seq.push(1);
//! seq.push(2);
//!
//! // Take the address of the first element.
//! let ptr = &seq[0] as *const i32;
//!
//! // Push more elements - the address remains valid.
//! for i in 3..100 {
//!     seq.push(i);
//! }
//!
//! assert_eq!(unsafe { *ptr }, 1);
//! ```
//!
//! The container is generic over an allocator so it can be backed by a custom
//! memory pool:
//!
//! ```
//! use allocator_api2::alloc::Global;
//! use monoque::Monoque;
//!
//! let mut seq: Monoque<u8, Global> = Monoque::new_in(Global);
//! seq.push(7);
//! assert_eq!(seq.pop(), Some(7));
//! ```

mod into_iter;
mod iter;
mod raw;
mod sort;

pub use into_iter::IntoIter;
pub use iter::{Iter, IterMut};

use std::alloc::Layout;
use std::cmp::Ordering;
use std::ops::{Index, IndexMut};

use allocator_api2::alloc::{Allocator, Global};

use raw::RawMonoque;

/// The error type for `try_reserve` operations.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct TryReserveError {
    kind: TryReserveErrorKind,
}

#[derive(Clone, PartialEq, Eq, Debug)]
enum TryReserveErrorKind {
    /// The requested capacity does not fit the segment table.
    CapacityOverflow,
    /// The allocator refused a segment of the given layout.
    AllocError { layout: Layout },
}

impl std::fmt::Display for TryReserveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            TryReserveErrorKind::CapacityOverflow => {
                write!(f, "memory allocation failed due to capacity overflow")
            }
            TryReserveErrorKind::AllocError { layout } => {
                write!(f, "memory allocation of {} bytes failed", layout.size())
            }
        }
    }
}

impl std::error::Error for TryReserveError {}

impl TryReserveError {
    pub(crate) fn capacity_overflow() -> Self {
        Self {
            kind: TryReserveErrorKind::CapacityOverflow,
        }
    }

    pub(crate) fn alloc_error(layout: Layout) -> Self {
        Self {
            kind: TryReserveErrorKind::AllocError { layout },
        }
    }
}

/// A segmented vector with stable element addresses.
///
/// `Monoque` stores elements in a fixed table of up to `usize::BITS` segments
/// whose capacities follow the doubling curve `2, 2, 4, 8, ...`. A segment is
/// allocated lazily, exactly when the first position inside its range is
/// appended, and is released only by [`shrink_to_fit`](Monoque::shrink_to_fit)
/// or by dropping the container. Because segments never move, a reference to
/// an element stays valid until that element is popped or the container goes
/// away.
///
/// Appending is amortized O(1): an append that crosses a segment boundary
/// performs one allocation sized to the new segment, and segment sizes form a
/// geometric series, so total allocation work over `n` appends is O(n).
pub struct Monoque<T, A: Allocator = Global> {
    buf: RawMonoque<T, A>,
    len: usize,
}

impl<T> Monoque<T> {
    /// Creates a new empty `Monoque`.
    ///
    /// Does not allocate until elements are pushed.
    ///
    /// # Example
    ///
    /// ```
    /// use monoque::Monoque;
    /// let seq: Monoque<i32> = Monoque::new();
    /// assert!(seq.is_empty());
    /// ```
    #[inline]
    pub const fn new() -> Self {
        Self {
            buf: RawMonoque::new(),
            len: 0,
        }
    }

    /// Creates a new `Monoque` with at least the specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut seq = Self::new();
        seq.reserve(capacity);
        seq
    }

    /// Creates a `Monoque` holding `n` clones of `value`.
    ///
    /// # Example
    ///
    /// ```
    /// use monoque::Monoque;
    /// let seq = Monoque::from_elem(9, 5);
    /// assert_eq!(seq.len(), 5);
    /// assert_eq!(seq[4], 9);
    /// ```
    pub fn from_elem(value: T, n: usize) -> Self
    where
        T: Clone,
    {
        let mut seq = Self::with_capacity(n);
        seq.resize(n, value);
        seq
    }
}

impl<T, A: Allocator> Monoque<T, A> {
    /// Creates a new empty `Monoque` backed by the given allocator.
    #[inline]
    pub const fn new_in(alloc: A) -> Self {
        Self {
            buf: RawMonoque::new_in(alloc),
            len: 0,
        }
    }

    /// Creates a new `Monoque` with at least the specified capacity, backed
    /// by the given allocator.
    pub fn with_capacity_in(capacity: usize, alloc: A) -> Self {
        let mut seq = Self::new_in(alloc);
        seq.reserve(capacity);
        seq
    }

    /// Returns a reference to the underlying allocator.
    #[inline]
    pub fn allocator(&self) -> &A {
        self.buf.allocator()
    }

    /// Returns the number of elements.
    #[inline]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the container holds no elements.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the total capacity across all allocated segments.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    /// Appends an element to the back.
    ///
    /// The addresses of all previously pushed elements are unaffected. An
    /// append that opens a new segment performs exactly one allocation sized
    /// to that segment; all other appends perform none.
    ///
    /// # Panics
    ///
    /// Panics if allocation fails. The container is unchanged in that case.
    ///
    /// # Example
    ///
    /// ```
    /// use monoque::Monoque;
    /// let mut seq: Monoque<i32> = Monoque::new();
    /// seq.push(1);
    /// seq.push(2);
    /// assert_eq!(seq.len(), 2);
    /// ```
    #[inline]
    pub fn push(&mut self, value: T) {
        if self.len == self.buf.capacity() {
            // Position `len` is the first slot of the next, not yet
            // allocated segment.
            self.buf.grow_one();
        }
        unsafe {
            std::ptr::write(self.buf.ptr_at(self.len), value);
        }
        self.len += 1;
    }

    /// Removes the last element and returns it, or `None` if empty.
    ///
    /// The element's segment stays allocated even if it becomes empty;
    /// segments are reclaimed only by [`shrink_to_fit`](Monoque::shrink_to_fit).
    ///
    /// # Example
    ///
    /// ```
    /// use monoque::Monoque;
    /// let mut seq: Monoque<i32> = Monoque::new();
    /// seq.push(1);
    /// seq.push(2);
    /// assert_eq!(seq.pop(), Some(2));
    /// assert_eq!(seq.pop(), Some(1));
    /// assert_eq!(seq.pop(), None);
    /// ```
    #[inline]
    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        Some(unsafe { std::ptr::read(self.buf.ptr_at(self.len)) })
    }

    /// Returns a reference to the element at `position`, or `None` if out of
    /// bounds.
    #[inline]
    pub fn get(&self, position: usize) -> Option<&T> {
        if position < self.len {
            Some(unsafe { self.get_unchecked(position) })
        } else {
            None
        }
    }

    /// Returns a mutable reference to the element at `position`, or `None`
    /// if out of bounds.
    #[inline]
    pub fn get_mut(&mut self, position: usize) -> Option<&mut T> {
        if position < self.len {
            Some(unsafe { self.get_unchecked_mut(position) })
        } else {
            None
        }
    }

    /// Returns a reference to the element at `position` without bounds
    /// checking.
    ///
    /// # Safety
    ///
    /// `position` must be less than `self.len()`.
    #[inline]
    pub unsafe fn get_unchecked(&self, position: usize) -> &T {
        debug_assert!(position < self.len);
        &*self.buf.ptr_at(position)
    }

    /// Returns a mutable reference to the element at `position` without
    /// bounds checking.
    ///
    /// # Safety
    ///
    /// `position` must be less than `self.len()`.
    #[inline]
    pub unsafe fn get_unchecked_mut(&mut self, position: usize) -> &mut T {
        debug_assert!(position < self.len);
        &mut *self.buf.ptr_at(position)
    }

    /// Returns a reference to the first element, or `None` if empty.
    #[inline]
    pub fn first(&self) -> Option<&T> {
        self.get(0)
    }

    /// Returns a mutable reference to the first element, or `None` if empty.
    #[inline]
    pub fn first_mut(&mut self) -> Option<&mut T> {
        self.get_mut(0)
    }

    /// Returns a reference to the last element, or `None` if empty.
    #[inline]
    pub fn last(&self) -> Option<&T> {
        if self.len == 0 {
            None
        } else {
            Some(unsafe { self.get_unchecked(self.len - 1) })
        }
    }

    /// Returns a mutable reference to the last element, or `None` if empty.
    #[inline]
    pub fn last_mut(&mut self) -> Option<&mut T> {
        if self.len == 0 {
            None
        } else {
            Some(unsafe { self.get_unchecked_mut(self.len - 1) })
        }
    }

    /// Shortens the container to at most `len` elements, dropping the rest
    /// from the back.
    ///
    /// Keeps all allocated segments. Has no effect if `len >= self.len()`.
    pub fn truncate(&mut self, len: usize) {
        if !std::mem::needs_drop::<T>() {
            if len < self.len {
                self.len = len;
            }
            return;
        }
        // Drop back to front, decrementing first so a panicking Drop leaves
        // a consistent container behind.
        while self.len > len {
            self.len -= 1;
            unsafe {
                std::ptr::drop_in_place(self.buf.ptr_at(self.len));
            }
        }
    }

    /// Removes all elements.
    ///
    /// Allocated segments are kept for reuse; this is equivalent to a fresh
    /// container carrying the same allocator and capacity.
    #[inline]
    pub fn clear(&mut self) {
        self.truncate(0);
    }

    /// Reserves capacity for at least `additional` more elements.
    ///
    /// # Panics
    ///
    /// Panics if allocation fails or the capacity overflows.
    pub fn reserve(&mut self, additional: usize) {
        let required = match self.len.checked_add(additional) {
            Some(required) => required,
            None => panic!("capacity overflow"),
        };
        self.buf.reserve(required);
    }

    /// Tries to reserve capacity for at least `additional` more elements.
    ///
    /// On failure the container is left exactly as it was: segments acquired
    /// during the failed call are released again.
    pub fn try_reserve(&mut self, additional: usize) -> Result<(), TryReserveError> {
        let required = self
            .len
            .checked_add(additional)
            .ok_or_else(TryReserveError::capacity_overflow)?;
        self.buf.try_reserve(required)
    }

    /// Releases every segment strictly beyond the one holding the last live
    /// element.
    ///
    /// No element is moved or dropped; with the doubling curve this leaves
    /// capacity below `2 * len`.
    pub fn shrink_to_fit(&mut self) {
        self.buf.shrink_to(self.len);
    }

    /// Resizes the container to `new_len` elements, filling with clones of
    /// `value` when growing.
    pub fn resize(&mut self, new_len: usize, value: T)
    where
        T: Clone,
    {
        if new_len <= self.len {
            self.truncate(new_len);
            return;
        }
        self.reserve(new_len - self.len);
        while self.len + 1 < new_len {
            self.push(value.clone());
        }
        // The final slot takes the value itself, saving one clone.
        self.push(value);
    }

    /// Resizes the container to `new_len` elements, filling with values from
    /// the closure when growing.
    pub fn resize_with<F>(&mut self, new_len: usize, mut f: F)
    where
        F: FnMut() -> T,
    {
        if new_len <= self.len {
            self.truncate(new_len);
            return;
        }
        self.reserve(new_len - self.len);
        while self.len < new_len {
            self.push(f());
        }
    }

    /// Swaps the elements at positions `a` and `b`.
    ///
    /// # Panics
    ///
    /// Panics if either position is out of bounds.
    pub fn swap(&mut self, a: usize, b: usize) {
        assert!(a < self.len && b < self.len, "position out of bounds");
        if a == b {
            return;
        }
        unsafe {
            std::ptr::swap(self.buf.ptr_at(a), self.buf.ptr_at(b));
        }
    }

    /// Appends clones of all elements in `other`.
    pub fn extend_from_slice(&mut self, other: &[T])
    where
        T: Clone,
    {
        self.reserve(other.len());
        for item in other {
            self.push(item.clone());
        }
    }

    /// Returns an iterator over references to the elements.
    #[inline]
    pub fn iter(&self) -> Iter<'_, T, A> {
        Iter::new(self)
    }

    /// Returns an iterator over mutable references to the elements.
    #[inline]
    pub fn iter_mut(&mut self) -> IterMut<'_, T, A> {
        IterMut::new(self)
    }

    /// Copies the elements into a contiguous `Vec`.
    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.iter().cloned().collect()
    }

    /// Returns `true` if the elements are sorted.
    pub fn is_sorted(&self) -> bool
    where
        T: PartialOrd,
    {
        for i in 1..self.len {
            let prev = unsafe { self.get_unchecked(i - 1) };
            let next = unsafe { self.get_unchecked(i) };
            if prev.partial_cmp(next) == Some(Ordering::Greater) {
                return false;
            }
        }
        true
    }

    /// Sorts the container in place (stable).
    pub fn sort(&mut self)
    where
        T: Ord,
    {
        sort::merge_sort(self, &mut |a, b| a < b);
    }

    /// Sorts the container in place (stable) with a comparison function.
    pub fn sort_by<F>(&mut self, mut compare: F)
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        sort::merge_sort(self, &mut |a, b| compare(a, b) == Ordering::Less);
    }

    /// Sorts the container in place (stable) with a key extraction function.
    pub fn sort_by_key<K, F>(&mut self, mut f: F)
    where
        F: FnMut(&T) -> K,
        K: Ord,
    {
        self.sort_by(|a, b| f(a).cmp(&f(b)));
    }

    /// Sorts the container in place without allocating (heapsort, unstable).
    pub fn sort_unstable(&mut self)
    where
        T: Ord,
    {
        sort::heapsort(self, &mut |a, b| a < b);
    }

    /// Sorts the container in place without allocating, using a comparison
    /// function (heapsort, unstable).
    pub fn sort_unstable_by<F>(&mut self, mut compare: F)
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        sort::heapsort(self, &mut |a, b| compare(a, b) == Ordering::Less);
    }

    /// Reads the value at `position` out of the container.
    ///
    /// # Safety
    ///
    /// `position` must be less than `self.len()`, and the caller takes
    /// ownership of the value.
    #[inline]
    pub(crate) unsafe fn read_at(&self, position: usize) -> T {
        std::ptr::read(self.buf.ptr_at(position))
    }

    /// Raw slot pointer, used by the sorting routines.
    ///
    /// # Safety
    ///
    /// `position` must be within allocated capacity.
    #[inline]
    pub(crate) unsafe fn slot_ptr(&self, position: usize) -> *mut T {
        self.buf.ptr_at(position)
    }

    /// Sets `len` directly. Used by `IntoIter` after it has taken ownership
    /// of (or dropped) trailing elements.
    #[inline]
    pub(crate) fn set_len_internal(&mut self, new_len: usize) {
        self.len = new_len;
    }
}

impl<T, A: Allocator> Drop for Monoque<T, A> {
    fn drop(&mut self) {
        self.clear();
        // RawMonoque::drop releases the segments.
    }
}

impl<T: Clone, A: Allocator + Clone> Clone for Monoque<T, A> {
    fn clone(&self) -> Self {
        let mut seq = Self::with_capacity_in(self.len, self.allocator().clone());
        for i in 0..self.len {
            seq.push(unsafe { self.get_unchecked(i) }.clone());
        }
        seq
    }
}

impl<T: PartialEq, A: Allocator> PartialEq for Monoque<T, A> {
    fn eq(&self, other: &Self) -> bool {
        if self.len != other.len {
            return false;
        }
        for i in 0..self.len {
            if unsafe { self.get_unchecked(i) != other.get_unchecked(i) } {
                return false;
            }
        }
        true
    }
}

impl<T: Eq, A: Allocator> Eq for Monoque<T, A> {}

impl<T: PartialOrd, A: Allocator> PartialOrd for Monoque<T, A> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        for i in 0..self.len.min(other.len) {
            match unsafe { self.get_unchecked(i).partial_cmp(other.get_unchecked(i)) } {
                Some(Ordering::Equal) => continue,
                non_eq => return non_eq,
            }
        }
        Some(self.len.cmp(&other.len))
    }
}

impl<T: Ord, A: Allocator> Ord for Monoque<T, A> {
    fn cmp(&self, other: &Self) -> Ordering {
        for i in 0..self.len.min(other.len) {
            match unsafe { self.get_unchecked(i).cmp(other.get_unchecked(i)) } {
                Ordering::Equal => continue,
                non_eq => return non_eq,
            }
        }
        self.len.cmp(&other.len)
    }
}

impl<T: std::hash::Hash, A: Allocator> std::hash::Hash for Monoque<T, A> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.len.hash(state);
        for i in 0..self.len {
            unsafe { self.get_unchecked(i) }.hash(state);
        }
    }
}

impl<T: std::fmt::Debug, A: Allocator> std::fmt::Debug for Monoque<T, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T> Default for Monoque<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, A: Allocator> Index<usize> for Monoque<T, A> {
    type Output = T;

    #[inline]
    fn index(&self, position: usize) -> &Self::Output {
        match self.get(position) {
            Some(value) => value,
            None => panic!(
                "position out of bounds: the len is {} but the position is {}",
                self.len, position
            ),
        }
    }
}

impl<T, A: Allocator> IndexMut<usize> for Monoque<T, A> {
    #[inline]
    fn index_mut(&mut self, position: usize) -> &mut Self::Output {
        let len = self.len;
        match self.get_mut(position) {
            Some(value) => value,
            None => panic!(
                "position out of bounds: the len is {} but the position is {}",
                len, position
            ),
        }
    }
}

impl<T, A: Allocator> Extend<T> for Monoque<T, A> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        let (lower, _) = iter.size_hint();
        self.reserve(lower);
        for item in iter {
            self.push(item);
        }
    }
}

impl<'a, T: Clone + 'a, A: Allocator> Extend<&'a T> for Monoque<T, A> {
    fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        let (lower, _) = iter.size_hint();
        self.reserve(lower);
        for item in iter {
            self.push(item.clone());
        }
    }
}

impl<T> FromIterator<T> for Monoque<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut seq = Self::new();
        seq.extend(iter);
        seq
    }
}

impl<T, const N: usize> From<[T; N]> for Monoque<T> {
    fn from(array: [T; N]) -> Self {
        array.into_iter().collect()
    }
}

impl<T: Clone> From<&[T]> for Monoque<T> {
    fn from(slice: &[T]) -> Self {
        let mut seq = Self::with_capacity(slice.len());
        seq.extend_from_slice(slice);
        seq
    }
}

impl<T, A: Allocator> IntoIterator for Monoque<T, A> {
    type Item = T;
    type IntoIter = IntoIter<T, A>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter::new(self)
    }
}

impl<'a, T, A: Allocator> IntoIterator for &'a Monoque<T, A> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T, A>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T, A: Allocator> IntoIterator for &'a mut Monoque<T, A> {
    type Item = &'a mut T;
    type IntoIter = IterMut<'a, T, A>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

// Safety: Monoque exclusively owns its segments and elements; thread safety
// reduces to that of the element type and the allocator.
unsafe impl<T: Send, A: Allocator + Send> Send for Monoque<T, A> {}
unsafe impl<T: Sync, A: Allocator + Sync> Sync for Monoque<T, A> {}
