// Copyright 2026 the Starlane Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::collections::BinaryHeap;
use alloc::vec::Vec;
use core::cmp::Ordering;

use crate::backend::SlotHit;

/// Candidate ordered by `(dist_sq, slot)`, so the heap top is the current worst.
#[derive(Copy, Clone, Debug)]
struct Candidate {
    dist_sq: f64,
    slot: usize,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.dist_sq
            .total_cmp(&other.dist_sq)
            .then(self.slot.cmp(&other.slot))
    }
}

/// Bounded max-heap keeping the `k` best `(dist_sq, slot)` pairs seen so far.
#[derive(Debug)]
pub(crate) struct KBest {
    k: usize,
    heap: BinaryHeap<Candidate>,
}

impl KBest {
    pub(crate) fn new(k: usize) -> Self {
        Self {
            k,
            heap: BinaryHeap::with_capacity(k.saturating_add(1).min(1024)),
        }
    }

    /// Offer a candidate; it is kept only if it beats the current worst.
    #[inline]
    pub(crate) fn offer(&mut self, slot: usize, dist_sq: f64) {
        if self.k == 0 {
            return;
        }
        let cand = Candidate { dist_sq, slot };
        if self.heap.len() < self.k {
            self.heap.push(cand);
        } else if let Some(mut top) = self.heap.peek_mut()
            && cand < *top
        {
            *top = cand;
        }
    }

    /// Squared distance a new candidate must not exceed to still matter.
    ///
    /// `None` while fewer than `k` candidates are held.
    #[inline]
    pub(crate) fn bound(&self) -> Option<f64> {
        if self.heap.len() < self.k {
            None
        } else {
            self.heap.peek().map(|c| c.dist_sq)
        }
    }

    /// Whether a region at squared distance `lower_sq` can still hold a candidate.
    #[inline]
    pub(crate) fn admits(&self, lower_sq: f64) -> bool {
        self.k > 0 && self.bound().is_none_or(|worst| lower_sq <= worst)
    }

    /// Append the kept candidates to `out`, ascending by `(dist_sq, slot)`.
    pub(crate) fn drain_sorted_into(self, out: &mut Vec<SlotHit>) {
        out.extend(
            self.heap
                .into_sorted_vec()
                .into_iter()
                .map(|c| SlotHit {
                    slot: c.slot,
                    dist_sq: c.dist_sq,
                }),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::KBest;
    use alloc::vec::Vec;

    #[test]
    fn keeps_k_smallest_with_slot_tiebreak() {
        let mut best = KBest::new(3);
        for (slot, d) in [(4, 9.0), (1, 4.0), (7, 1.0), (2, 4.0), (0, 16.0), (3, 4.0)] {
            best.offer(slot, d);
        }
        assert_eq!(best.bound(), Some(4.0));
        let mut out = Vec::new();
        best.drain_sorted_into(&mut out);
        let slots: Vec<usize> = out.iter().map(|h| h.slot).collect();
        assert_eq!(slots, [7, 1, 2], "ties on distance resolve to lower slots");
    }

    #[test]
    fn zero_k_admits_nothing() {
        let mut best = KBest::new(0);
        best.offer(0, 1.0);
        assert!(!best.admits(0.0));
        let mut out = Vec::new();
        best.drain_sorted_into(&mut out);
        assert!(out.is_empty());
    }
}
