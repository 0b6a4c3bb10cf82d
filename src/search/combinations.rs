//! Breadth-first subset and probe-assignment enumeration.
//!
//! Candidate stars are sorted brightest-first, so enumerating subsets of
//! positional indices in order of increasing index sum visits the brightest
//! star sets first. Subset sizes are visited smallest-first.
//!
//! Implementation: one min-heap per size keyed by index sum, with a HashSet for
//! dedup. Ties on the sum are broken lexicographically by the heap's tuple order,
//! which keeps the sequence deterministic.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};
use std::ops::RangeInclusive;

/// Iterator over subsets of `0..n` whose size lies in `sizes`, smallest size
/// first and, within a size, in order of increasing index sum.
pub struct BreadthFirstSubsets {
    n: usize,
    sizes: RangeInclusive<usize>,
    k: usize,
    heap: BinaryHeap<Reverse<(usize, Vec<usize>)>>,
    seen: HashSet<Vec<usize>>,
}

impl BreadthFirstSubsets {
    pub fn new(n: usize, sizes: RangeInclusive<usize>) -> Self {
        let k = (*sizes.start()).max(1);
        let mut it = Self {
            n,
            sizes,
            k,
            heap: BinaryHeap::new(),
            seen: HashSet::new(),
        };
        it.seed();
        it
    }

    /// Push the first subset of the current size: `[0, 1, ..., k-1]`.
    fn seed(&mut self) {
        self.seen.clear();
        if self.k <= self.n && self.sizes.contains(&self.k) {
            let initial: Vec<usize> = (0..self.k).collect();
            let sum = initial.iter().sum();
            self.seen.insert(initial.clone());
            self.heap.push(Reverse((sum, initial)));
        }
    }
}

impl Iterator for BreadthFirstSubsets {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        loop {
            if let Some(Reverse((_, combo))) = self.heap.pop() {
                // Successors: bump one position while staying strictly increasing.
                for i in 0..self.k {
                    let next_val = combo[i] + 1;
                    let upper = if i + 1 < self.k { combo[i + 1] } else { self.n };
                    if next_val < upper {
                        let mut succ = combo.clone();
                        succ[i] = next_val;
                        if self.seen.insert(succ.clone()) {
                            let sum = succ.iter().sum();
                            self.heap.push(Reverse((sum, succ)));
                        }
                    }
                }
                return Some(combo);
            }
            if self.k >= self.n || self.k >= *self.sizes.end() {
                return None;
            }
            self.k += 1;
            self.seed();
        }
    }
}

/// Every injective map from `k` stars onto `m` probes, as the probe position for
/// each star, in lexicographic order.
pub fn injective_assignments(k: usize, m: usize) -> Vec<Vec<usize>> {
    fn extend(
        k: usize,
        m: usize,
        current: &mut Vec<usize>,
        used: &mut [bool],
        out: &mut Vec<Vec<usize>>,
    ) {
        if current.len() == k {
            out.push(current.clone());
            return;
        }
        for j in 0..m {
            if !used[j] {
                used[j] = true;
                current.push(j);
                extend(k, m, current, used, out);
                current.pop();
                used[j] = false;
            }
        }
    }

    let mut out = Vec::new();
    if k <= m {
        extend(k, m, &mut Vec::with_capacity(k), &mut vec![false; m], &mut out);
    }
    out
}

/// Items produced by pairing every subset of [`BreadthFirstSubsets::new`]`(n, sizes)`
/// with every [`injective_assignments`] onto `m` probes.
pub fn assignment_count(n: usize, sizes: RangeInclusive<usize>, m: usize) -> usize {
    let start = (*sizes.start()).max(1);
    let end = (*sizes.end()).min(n).min(m);
    (start..=end)
        .map(|k| {
            let subsets = (0..k).fold(1usize, |acc, i| acc * (n - i) / (i + 1));
            let perms: usize = (0..k).map(|i| m - i).product();
            subsets * perms
        })
        .sum()
}
