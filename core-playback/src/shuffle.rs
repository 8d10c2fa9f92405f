//! Skip ordering over playlist positions.

use rand::seq::SliceRandom;
use rand::Rng;

/// Index after `current` in list order, wrapping to the first track.
pub fn next_index(len: usize, current: usize) -> usize {
    if len == 0 {
        return 0;
    }
    (current + 1) % len
}

/// Index before `current` in list order, wrapping to the last track.
pub fn previous_index(len: usize, current: usize) -> usize {
    if len == 0 {
        return 0;
    }
    (current + len - 1) % len
}

/// A random permutation of playlist positions, starting at the track that
/// was current when shuffle was switched on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShuffleOrder {
    order: Vec<usize>,
}

impl ShuffleOrder {
    pub fn new<R: Rng + ?Sized>(len: usize, first: usize, rng: &mut R) -> Self {
        let mut rest: Vec<usize> = (0..len).filter(|&i| i != first).collect();
        rest.shuffle(rng);

        let mut order = Vec::with_capacity(len);
        if first < len {
            order.push(first);
        }
        order.extend(rest);
        Self { order }
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.order
    }

    pub fn into_vec(self) -> Vec<usize> {
        self.order
    }

    fn position(&self, index: usize) -> Option<usize> {
        self.order.iter().position(|&i| i == index)
    }

    /// Track played after `current`; wraps around the permutation.
    pub fn next_after(&self, current: usize) -> usize {
        match self.position(current) {
            Some(pos) => self.order[next_index(self.order.len(), pos)],
            None => self.order.first().copied().unwrap_or(current),
        }
    }

    pub fn previous_before(&self, current: usize) -> usize {
        match self.position(current) {
            Some(pos) => self.order[previous_index(self.order.len(), pos)],
            None => self.order.last().copied().unwrap_or(current),
        }
    }
}
