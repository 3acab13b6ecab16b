//! In-place sorting over segmented storage.
//!
//! Standard library sorts require a contiguous slice, which a `Monoque`
//! cannot provide. These routines instead drive every move and comparison
//! through the O(1) position mapping: a stable merge sort backed by scratch
//! space for the left run, and an allocation-free heapsort.

use std::mem::MaybeUninit;
use std::ptr;

use allocator_api2::alloc::Allocator;

use crate::Monoque;

/// Runs at or below this length are insertion-sorted.
const SMALL_RUN: usize = 20;

/// Sorts positions `start..end` by repeated insertion.
fn insertion_sort<T, A, F>(seq: &mut Monoque<T, A>, start: usize, end: usize, is_less: &mut F)
where
    A: Allocator,
    F: FnMut(&T, &T) -> bool,
{
    for i in (start + 1)..end {
        let mut j = i;
        while j > start {
            let out_of_order = unsafe {
                is_less(seq.get_unchecked(j), seq.get_unchecked(j - 1))
            };
            if !out_of_order {
                break;
            }
            seq.swap(j, j - 1);
            j -= 1;
        }
    }
}

/// Sorts the whole container with heapsort: O(n log n) worst case, no
/// allocation, not stable.
pub(crate) fn heapsort<T, A, F>(seq: &mut Monoque<T, A>, is_less: &mut F)
where
    A: Allocator,
    F: FnMut(&T, &T) -> bool,
{
    let len = seq.len();
    if len < 2 {
        return;
    }

    for node in (0..len / 2).rev() {
        sift_down(seq, node, len, is_less);
    }
    for end in (1..len).rev() {
        seq.swap(0, end);
        sift_down(seq, 0, end, is_less);
    }
}

/// Restores the max-heap property for `node` within `heap_len` elements.
fn sift_down<T, A, F>(seq: &mut Monoque<T, A>, mut node: usize, heap_len: usize, is_less: &mut F)
where
    A: Allocator,
    F: FnMut(&T, &T) -> bool,
{
    loop {
        let mut child = 2 * node + 1;
        if child >= heap_len {
            break;
        }
        if child + 1 < heap_len {
            let right_greater = unsafe {
                is_less(seq.get_unchecked(child), seq.get_unchecked(child + 1))
            };
            if right_greater {
                child += 1;
            }
        }
        let heap_ok = unsafe { !is_less(seq.get_unchecked(node), seq.get_unchecked(child)) };
        if heap_ok {
            break;
        }
        seq.swap(node, child);
        node = child;
    }
}

/// Sorts the whole container with a stable merge sort.
///
/// Allocates scratch space for half the elements; small runs fall back to
/// insertion sort.
pub(crate) fn merge_sort<T, A, F>(seq: &mut Monoque<T, A>, is_less: &mut F)
where
    A: Allocator,
    F: FnMut(&T, &T) -> bool,
{
    let len = seq.len();
    if len < 2 {
        return;
    }
    if len <= SMALL_RUN {
        insertion_sort(seq, 0, len, is_less);
        return;
    }

    let mut scratch: Vec<MaybeUninit<T>> = Vec::with_capacity(len / 2 + 1);
    // Only ever used as uninitialized spill space for moved-out values.
    unsafe {
        scratch.set_len(len / 2 + 1);
    }
    sort_range(seq, 0, len, &mut scratch, is_less);
}

fn sort_range<T, A, F>(
    seq: &mut Monoque<T, A>,
    start: usize,
    end: usize,
    scratch: &mut [MaybeUninit<T>],
    is_less: &mut F,
) where
    A: Allocator,
    F: FnMut(&T, &T) -> bool,
{
    let len = end - start;
    if len <= SMALL_RUN {
        insertion_sort(seq, start, end, is_less);
        return;
    }

    let mid = start + len / 2;
    sort_range(seq, start, mid, scratch, is_less);
    sort_range(seq, mid, end, scratch, is_less);

    let already_ordered =
        unsafe { !is_less(seq.get_unchecked(mid), seq.get_unchecked(mid - 1)) };
    if already_ordered {
        return;
    }
    merge(seq, start, mid, end, scratch, is_less);
}

/// Merges the sorted runs `start..mid` and `mid..end`.
///
/// `sort_range` splits at the midpoint, so the left run is never longer than
/// the right one. It is spilled into `scratch` and merged forwards; the slots
/// it vacates form a hole tracked by [`MergeHole`], whose `Drop` writes the
/// unconsumed scratch tail back into the hole. That runs on the ordinary exit
/// path and when the comparator unwinds, so every value stays initialized in
/// exactly one place.
fn merge<T, A, F>(
    seq: &mut Monoque<T, A>,
    start: usize,
    mid: usize,
    end: usize,
    scratch: &mut [MaybeUninit<T>],
    is_less: &mut F,
) where
    A: Allocator,
    F: FnMut(&T, &T) -> bool,
{
    let left_len = mid - start;
    debug_assert!(left_len <= end - mid);

    let seq = &*seq;
    for i in 0..left_len {
        unsafe {
            scratch[i].write(ptr::read(seq.slot_ptr(start + i)));
        }
    }

    let mut hole = MergeHole {
        seq,
        scratch: scratch.as_mut_ptr().cast::<T>(),
        consumed: 0,
        spilled: left_len,
        dest: start,
    };

    let mut r = mid;
    while hole.consumed < hole.spilled && r < end {
        unsafe {
            let left = &*hole.scratch.add(hole.consumed);
            if is_less(seq.get_unchecked(r), left) {
                let value = ptr::read(seq.slot_ptr(r));
                ptr::write(seq.slot_ptr(hole.dest), value);
                r += 1;
            } else {
                ptr::write(seq.slot_ptr(hole.dest), ptr::read(left));
                hole.consumed += 1;
            }
        }
        hole.dest += 1;
    }
    // Dropping the hole copies the rest of the scratch into place; the tail
    // of the right run is already where it belongs.
}

/// Unconsumed scratch values and the hole they came out of.
///
/// Invariant: `scratch[consumed..spilled]` holds exactly the values missing
/// from the slots `dest..dest + (spilled - consumed)`, and each value is
/// initialized in exactly one of the two places. `Drop` moves the scratch
/// half back, so the container is fully initialized again whether the merge
/// finished or a comparison panicked.
struct MergeHole<'a, T, A: Allocator> {
    seq: &'a Monoque<T, A>,
    scratch: *mut T,
    consumed: usize,
    spilled: usize,
    dest: usize,
}

impl<T, A: Allocator> Drop for MergeHole<'_, T, A> {
    fn drop(&mut self) {
        for i in self.consumed..self.spilled {
            unsafe {
                let value = ptr::read(self.scratch.add(i));
                ptr::write(self.seq.slot_ptr(self.dest + (i - self.consumed)), value);
            }
        }
    }
}
