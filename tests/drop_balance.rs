//! Construction/destruction balance tests.
//!
//! A counter type tracks live instances through a shared cell; every test
//! asserts the count returns to zero, so leaks and double drops in the
//! removal paths and iterator teardown are both caught. The panic tests use
//! a drop log of unique ids instead, where a duplicate id is a double drop.

use std::cell::{Cell, RefCell};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;

use monoque::Monoque;

struct Counted {
    live: Rc<Cell<isize>>,
    value: u32,
}

impl Counted {
    fn new(live: &Rc<Cell<isize>>, value: u32) -> Self {
        live.set(live.get() + 1);
        Self {
            live: Rc::clone(live),
            value,
        }
    }
}

impl Clone for Counted {
    fn clone(&self) -> Self {
        Counted::new(&self.live, self.value)
    }
}

impl Drop for Counted {
    fn drop(&mut self) {
        self.live.set(self.live.get() - 1);
    }
}

#[test]
fn container_drop_releases_everything() {
    let live = Rc::new(Cell::new(0));
    {
        let mut seq = Monoque::new();
        for i in 0..100 {
            seq.push(Counted::new(&live, i));
        }
        assert_eq!(live.get(), 100);
    }
    assert_eq!(live.get(), 0);
}

#[test]
fn pop_truncate_and_clear_balance() {
    let live = Rc::new(Cell::new(0));
    let mut seq = Monoque::new();
    for i in 0..64 {
        seq.push(Counted::new(&live, i));
    }

    let popped = seq.pop().unwrap();
    assert_eq!(popped.value, 63);
    drop(popped);
    assert_eq!(live.get(), 63);

    seq.truncate(40);
    assert_eq!(live.get(), 40);
    // Truncating above the length is a no-op.
    seq.truncate(500);
    assert_eq!(live.get(), 40);

    seq.shrink_to_fit();
    assert_eq!(seq.len(), 40);
    assert_eq!(live.get(), 40);

    seq.clear();
    assert_eq!(live.get(), 0);
    assert!(seq.is_empty());
}

#[test]
fn vacated_slots_are_reusable() {
    let live = Rc::new(Cell::new(0));
    let mut seq = Monoque::new();
    for i in 0..10 {
        seq.push(Counted::new(&live, i));
    }
    for _ in 0..5 {
        drop(seq.pop());
    }
    for i in 100..105 {
        seq.push(Counted::new(&live, i));
    }
    assert_eq!(live.get(), 10);
    assert_eq!(seq.last().unwrap().value, 104);
    drop(seq);
    assert_eq!(live.get(), 0);
}

#[test]
fn clone_is_independently_owned() {
    let live = Rc::new(Cell::new(0));
    let mut seq = Monoque::new();
    for i in 0..17 {
        seq.push(Counted::new(&live, i));
    }

    let copy = seq.clone();
    assert_eq!(live.get(), 34);
    assert_eq!(copy.len(), 17);

    drop(seq);
    assert_eq!(live.get(), 17);
    assert_eq!(copy[16].value, 16);
    drop(copy);
    assert_eq!(live.get(), 0);
}

#[test]
fn partially_consumed_into_iter_drops_the_rest() {
    let live = Rc::new(Cell::new(0));
    let mut seq = Monoque::new();
    for i in 0..30 {
        seq.push(Counted::new(&live, i));
    }

    let mut iter = seq.into_iter();
    let front = iter.next().unwrap();
    let back = iter.next_back().unwrap();
    assert_eq!(front.value, 0);
    assert_eq!(back.value, 29);
    drop(front);
    drop(back);
    assert_eq!(live.get(), 28);

    drop(iter);
    assert_eq!(live.get(), 0);
}

#[test]
fn resize_down_drops_and_resize_up_clones() {
    let live = Rc::new(Cell::new(0));
    let mut seq = Monoque::new();
    seq.resize(12, Counted::new(&live, 7));
    assert_eq!(live.get(), 12);
    assert_eq!(seq.len(), 12);

    seq.resize(3, Counted::new(&live, 8));
    assert_eq!(live.get(), 3);
    assert_eq!(seq.len(), 3);
    assert!(seq.iter().all(|p| p.value == 7));

    drop(seq);
    assert_eq!(live.get(), 0);
}

struct Logged {
    id: u32,
    log: Rc<RefCell<Vec<u32>>>,
}

impl Drop for Logged {
    fn drop(&mut self) {
        self.log.borrow_mut().push(self.id);
    }
}

#[test]
fn sort_comparator_panic_keeps_drop_balance() {
    const LEN: u32 = 64;

    // Panic the comparator at every possible point of the sort, including
    // mid-merge, and check that each id is dropped exactly once. A duplicate
    // would mean a value existed in two slots when the stack unwound.
    for panic_at in 0..600usize {
        let log: Rc<RefCell<Vec<u32>>> = Rc::new(RefCell::new(Vec::new()));
        let comparisons = Rc::new(Cell::new(0usize));

        let result = catch_unwind(AssertUnwindSafe(|| {
            let mut seq: Monoque<Logged> = Monoque::new();
            for id in (0..LEN).rev() {
                seq.push(Logged {
                    id,
                    log: Rc::clone(&log),
                });
            }
            let comparisons = Rc::clone(&comparisons);
            seq.sort_by(|a, b| {
                let n = comparisons.get();
                comparisons.set(n + 1);
                if n == panic_at {
                    panic!("comparator failure");
                }
                a.id.cmp(&b.id)
            });
        }));
        assert_eq!(result.is_err(), comparisons.get() > panic_at);

        let mut ids = log.borrow().clone();
        ids.sort_unstable();
        assert_eq!(ids.len(), LEN as usize, "panic_at {panic_at}: leaked ids");
        ids.dedup();
        assert_eq!(ids.len(), LEN as usize, "panic_at {panic_at}: double drop");
    }
}

#[test]
fn into_iter_drop_panic_does_not_double_drop() {
    struct Fused {
        id: u32,
        log: Rc<RefCell<Vec<u32>>>,
        panic_on_drop: bool,
    }

    impl Drop for Fused {
        fn drop(&mut self) {
            self.log.borrow_mut().push(self.id);
            if self.panic_on_drop {
                panic!("drop failure");
            }
        }
    }

    let log: Rc<RefCell<Vec<u32>>> = Rc::new(RefCell::new(Vec::new()));
    let result = catch_unwind(AssertUnwindSafe(|| {
        let mut seq: Monoque<Fused> = Monoque::new();
        for id in 0..10 {
            seq.push(Fused {
                id,
                log: Rc::clone(&log),
                panic_on_drop: id == 5,
            });
        }
        let mut iter = seq.into_iter();
        drop(iter.next());
        drop(iter.next());
        drop(iter);
    }));
    assert!(result.is_err());

    // 0 and 1 were yielded, 2 through 5 dropped by the iterator's teardown.
    // The elements past the panicking one are leaked rather than dropped a
    // second time by the container.
    let ids = log.borrow().clone();
    assert_eq!(ids, vec![0, 1, 2, 3, 4, 5]);
}
