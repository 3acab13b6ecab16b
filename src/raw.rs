//! Raw segment table management for `Monoque`.
//!
//! This module owns the low-level storage: a fixed table of segment pointers,
//! the position-to-segment arithmetic, and block acquisition/release through
//! the allocator. It plays the same role `RawVec` plays for `Vec`: it manages
//! memory but never constructs or drops elements.

use std::alloc::Layout;
use std::marker::PhantomData;
use std::ptr::NonNull;

use allocator_api2::alloc::{handle_alloc_error, Allocator, Global};

use crate::TryReserveError;

/// Maximum number of segments: one per bit of a machine address.
///
/// Segment `i` holds positions `[2^i, 2^(i+1))` (segment 0 holds `{0, 1}`),
/// so `usize::BITS` segments cover every addressable position.
pub(crate) const MAX_SEGMENTS: usize = usize::BITS as usize;

/// Raw segmented buffer: segment pointers, frontier, and allocator.
///
/// Invariant: `segments[i]` is a live allocation of exactly
/// `segment_capacity(i)` slots for every `i < segment_count`, and null for
/// every `i >= segment_count`. Allocated segments are never resized or moved.
pub(crate) struct RawMonoque<T, A: Allocator = Global> {
    segments: [*mut T; MAX_SEGMENTS],
    segment_count: usize,
    alloc: A,
    _marker: PhantomData<T>,
}

impl<T> RawMonoque<T> {
    /// Creates an empty table using the global allocator. Does not allocate.
    #[inline]
    pub(crate) const fn new() -> Self {
        Self::new_in(Global)
    }
}

impl<T, A: Allocator> RawMonoque<T, A> {
    const IS_ZST: bool = std::mem::size_of::<T>() == 0;

    /// Creates an empty table using the given allocator. Does not allocate.
    #[inline]
    pub(crate) const fn new_in(alloc: A) -> Self {
        Self {
            segments: [std::ptr::null_mut(); MAX_SEGMENTS],
            segment_count: 0,
            alloc,
            _marker: PhantomData,
        }
    }

    /// Returns a reference to the underlying allocator.
    #[inline]
    pub(crate) fn allocator(&self) -> &A {
        &self.alloc
    }

    /// Capacity of segment `index`: 2 for segment 0, `2^i` for `i >= 1`.
    ///
    /// Segment 0 is a deliberate special case: it covers positions `{0, 1}`
    /// so that segment `i >= 1` covers exactly `[2^i, 2^(i+1))` and the
    /// position mapping stays branch-free arithmetic.
    #[inline]
    pub(crate) const fn segment_capacity(index: usize) -> usize {
        if Self::IS_ZST {
            usize::MAX
        } else if index == 0 {
            2
        } else {
            1 << index
        }
    }

    /// Total capacity given a segment count: `2 + 2 + 4 + ... + 2^(k-1) = 2^k`.
    #[inline]
    pub(crate) const fn compute_capacity(segment_count: usize) -> usize {
        if Self::IS_ZST {
            if segment_count == 0 {
                0
            } else {
                usize::MAX
            }
        } else if segment_count == 0 {
            0
        } else if segment_count >= MAX_SEGMENTS {
            usize::MAX
        } else {
            1 << segment_count
        }
    }

    /// Total capacity across all allocated segments.
    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        Self::compute_capacity(self.segment_count)
    }

    /// Number of segments needed to hold `element_count` elements.
    #[inline]
    pub(crate) fn segments_for_capacity(element_count: usize) -> usize {
        if element_count == 0 {
            return 0;
        }
        if Self::IS_ZST {
            return 1;
        }
        if element_count <= 2 {
            1
        } else {
            // Smallest k with 2^k >= element_count.
            (element_count - 1).ilog2() as usize + 1
        }
    }

    /// Maps a logical position to `(segment_index, offset_within_segment)`.
    ///
    /// Positions 0 and 1 live in segment 0; position `p >= 2` lives in
    /// segment `floor(log2 p)` at offset `p` with its highest set bit
    /// cleared. `ilog2` lowers to a single highest-set-bit instruction, so
    /// the mapping is O(1) with no loops over the magnitude of `p`.
    #[inline]
    pub(crate) fn location(position: usize) -> (usize, usize) {
        if Self::IS_ZST {
            return (0, 0);
        }
        if position < 2 {
            return (0, position);
        }
        let segment = position.ilog2() as usize;
        (segment, position ^ (1usize << segment))
    }

    /// Allocates the next segment at the frontier.
    ///
    /// # Panics
    ///
    /// Panics if allocation fails or `MAX_SEGMENTS` is exceeded. The table
    /// is unchanged on failure.
    pub(crate) fn grow_one(&mut self) {
        assert!(
            self.segment_count < MAX_SEGMENTS,
            "maximum segment count exceeded"
        );

        if Self::IS_ZST {
            self.segments[self.segment_count] = NonNull::dangling().as_ptr();
            self.segment_count += 1;
            return;
        }

        let layout = match Layout::array::<T>(Self::segment_capacity(self.segment_count)) {
            Ok(layout) => layout,
            Err(_) => capacity_overflow(),
        };
        let ptr = match self.alloc.allocate(layout) {
            Ok(ptr) => ptr.cast::<T>().as_ptr(),
            Err(_) => handle_alloc_error(layout),
        };

        self.segments[self.segment_count] = ptr;
        self.segment_count += 1;
    }

    /// Ensures capacity for at least `needed_capacity` elements.
    ///
    /// # Panics
    ///
    /// Panics if allocation fails. Segments allocated before the failing one
    /// are kept, so the no-gaps invariant holds either way.
    pub(crate) fn reserve(&mut self, needed_capacity: usize) {
        let needed_segments = Self::segments_for_capacity(needed_capacity);
        while self.segment_count < needed_segments {
            self.grow_one();
        }
    }

    /// Ensures capacity for at least `needed_capacity` elements, reporting
    /// failure instead of panicking.
    ///
    /// On error, any segments acquired during this call are released again,
    /// leaving the table exactly as it was.
    pub(crate) fn try_reserve(&mut self, needed_capacity: usize) -> Result<(), TryReserveError> {
        let needed_segments = Self::segments_for_capacity(needed_capacity);
        if needed_segments <= self.segment_count {
            return Ok(());
        }
        if needed_segments > MAX_SEGMENTS {
            return Err(TryReserveError::capacity_overflow());
        }

        if Self::IS_ZST {
            self.segments[0] = NonNull::dangling().as_ptr();
            self.segment_count = 1;
            return Ok(());
        }

        let old_segment_count = self.segment_count;
        for i in old_segment_count..needed_segments {
            let layout = Layout::array::<T>(Self::segment_capacity(i))
                .map_err(|_| TryReserveError::capacity_overflow())?;
            match self.alloc.allocate(layout) {
                Ok(ptr) => {
                    self.segments[i] = ptr.cast::<T>().as_ptr();
                    self.segment_count = i + 1;
                }
                Err(_) => {
                    self.free_segments(self.segment_count, old_segment_count);
                    self.segment_count = old_segment_count;
                    return Err(TryReserveError::alloc_error(layout));
                }
            }
        }
        Ok(())
    }

    /// Releases every segment beyond those needed for `new_capacity`
    /// elements. Does not touch elements; the caller must have dropped
    /// everything stored above the new capacity.
    pub(crate) fn shrink_to(&mut self, new_capacity: usize) {
        let new_segment_count = Self::segments_for_capacity(new_capacity);
        if new_segment_count < self.segment_count {
            self.free_segments(self.segment_count, new_segment_count);
            self.segment_count = new_segment_count;
        }
    }

    /// Frees segments `to_count..from_count`, highest first.
    fn free_segments(&mut self, from_count: usize, to_count: usize) {
        if Self::IS_ZST {
            for i in (to_count..from_count).rev() {
                self.segments[i] = std::ptr::null_mut();
            }
            return;
        }

        for i in (to_count..from_count).rev() {
            // Layout::array succeeded when this segment was allocated.
            let layout = match Layout::array::<T>(Self::segment_capacity(i)) {
                Ok(layout) => layout,
                Err(_) => capacity_overflow(),
            };
            unsafe {
                let ptr = NonNull::new_unchecked(self.segments[i] as *mut u8);
                self.alloc.deallocate(ptr, layout);
            }
            self.segments[i] = std::ptr::null_mut();
        }
    }

    /// Releases all segments.
    ///
    /// # Safety
    ///
    /// All elements must have been dropped first.
    pub(crate) unsafe fn deallocate(&mut self) {
        self.free_segments(self.segment_count, 0);
        self.segment_count = 0;
    }

    /// Returns a raw pointer to the slot at `position`.
    ///
    /// # Safety
    ///
    /// `position` must be within the allocated capacity.
    #[inline]
    pub(crate) unsafe fn ptr_at(&self, position: usize) -> *mut T {
        if Self::IS_ZST {
            return NonNull::dangling().as_ptr();
        }
        let (segment, offset) = Self::location(position);
        (*self.segments.get_unchecked(segment)).add(offset)
    }
}

impl<T, A: Allocator> Drop for RawMonoque<T, A> {
    fn drop(&mut self) {
        // Frees memory only; Monoque drops elements before this runs.
        unsafe {
            self.deallocate();
        }
    }
}

// Safety: RawMonoque uniquely owns its allocations; thread safety reduces to
// that of the element type and the allocator.
unsafe impl<T: Send, A: Allocator + Send> Send for RawMonoque<T, A> {}
unsafe impl<T: Sync, A: Allocator + Sync> Sync for RawMonoque<T, A> {}

#[cold]
fn capacity_overflow() -> ! {
    panic!("capacity overflow");
}
