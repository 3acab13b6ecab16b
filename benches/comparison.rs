//! Benchmarks against the std sequential containers.
//!
//! Run with `cargo bench`. The interesting comparisons are append (no
//! reallocation copies versus `Vec`'s doubling memcpy) and random access
//! (one extra address computation versus contiguous storage).

use std::collections::VecDeque;

use divan::{black_box, Bencher};
use monoque::Monoque;

fn main() {
    divan::main();
}

const LENS: &[usize] = &[1_000, 100_000, 1_000_000];

/// Deterministic index stream, cheap enough to vanish next to the access.
fn index_stream(len: usize, count: usize) -> Vec<usize> {
    let mut state = 0x2545f4914f6cdd1du64;
    (0..count)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            (state % len as u64) as usize
        })
        .collect()
}

mod push {
    use super::*;

    #[divan::bench(args = LENS)]
    fn monoque(bencher: Bencher, len: usize) {
        bencher.iter(|| {
            let mut seq = Monoque::new();
            for i in 0..len {
                seq.push(black_box(i as u64));
            }
            seq
        });
    }

    #[divan::bench(args = LENS)]
    fn vec(bencher: Bencher, len: usize) {
        bencher.iter(|| {
            let mut seq = Vec::new();
            for i in 0..len {
                seq.push(black_box(i as u64));
            }
            seq
        });
    }

    #[divan::bench(args = LENS)]
    fn vec_deque(bencher: Bencher, len: usize) {
        bencher.iter(|| {
            let mut seq = VecDeque::new();
            for i in 0..len {
                seq.push_back(black_box(i as u64));
            }
            seq
        });
    }
}

mod random_access {
    use super::*;

    const ACCESSES: usize = 100_000;

    #[divan::bench(args = LENS)]
    fn monoque(bencher: Bencher, len: usize) {
        let seq: Monoque<u64> = (0..len as u64).collect();
        let indices = index_stream(len, ACCESSES);
        bencher.iter(|| {
            let mut sum = 0u64;
            for &i in &indices {
                sum = sum.wrapping_add(seq[i]);
            }
            sum
        });
    }

    #[divan::bench(args = LENS)]
    fn vec(bencher: Bencher, len: usize) {
        let seq: Vec<u64> = (0..len as u64).collect();
        let indices = index_stream(len, ACCESSES);
        bencher.iter(|| {
            let mut sum = 0u64;
            for &i in &indices {
                sum = sum.wrapping_add(seq[i]);
            }
            sum
        });
    }

    #[divan::bench(args = LENS)]
    fn vec_deque(bencher: Bencher, len: usize) {
        let seq: VecDeque<u64> = (0..len as u64).collect();
        let indices = index_stream(len, ACCESSES);
        bencher.iter(|| {
            let mut sum = 0u64;
            for &i in &indices {
                sum = sum.wrapping_add(seq[i]);
            }
            sum
        });
    }
}

mod iterate {
    use super::*;

    #[divan::bench(args = LENS)]
    fn monoque(bencher: Bencher, len: usize) {
        let seq: Monoque<u64> = (0..len as u64).collect();
        bencher.iter(|| seq.iter().copied().fold(0u64, u64::wrapping_add));
    }

    #[divan::bench(args = LENS)]
    fn vec(bencher: Bencher, len: usize) {
        let seq: Vec<u64> = (0..len as u64).collect();
        bencher.iter(|| seq.iter().copied().fold(0u64, u64::wrapping_add));
    }
}

mod sort {
    use super::*;

    #[divan::bench(args = LENS)]
    fn monoque_stable(bencher: Bencher, len: usize) {
        let base: Monoque<u64> = index_stream(len, len).iter().map(|&i| i as u64).collect();
        bencher
            .with_inputs(|| base.clone())
            .bench_values(|mut seq| {
                seq.sort();
                seq
            });
    }

    #[divan::bench(args = LENS)]
    fn vec_stable(bencher: Bencher, len: usize) {
        let base: Vec<u64> = index_stream(len, len).iter().map(|&i| i as u64).collect();
        bencher
            .with_inputs(|| base.clone())
            .bench_values(|mut seq| {
                seq.sort();
                seq
            });
    }
}
