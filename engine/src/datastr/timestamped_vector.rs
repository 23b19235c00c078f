//! A fast resettable vector based on timestamps.

use std::ops::{Index, IndexMut};

/// Resettable vector for per-node data of repeated local searches.
/// Resetting is amortized O(1), entries written before the last reset read as the default.
#[derive(Debug, Clone)]
pub struct TimestampedVector<T> {
    data: Vec<T>,
    current: u32,
    timestamps: Vec<u32>,
    default: T,
}

impl<T: Clone> TimestampedVector<T> {
    pub fn new(size: usize, default: T) -> TimestampedVector<T> {
        TimestampedVector {
            data: vec![default.clone(); size],
            current: 0,
            timestamps: vec![0; size],
            default,
        }
    }

    pub fn reset(&mut self) {
        let (new, overflow) = self.current.overflowing_add(1);
        self.current = new;

        // old timestamps may be valid again after an overflow
        if overflow {
            for element in &mut self.data {
                *element = self.default.clone();
            }
            for ts in &mut self.timestamps {
                *ts = new;
            }
        }
    }

    pub fn set(&mut self, index: usize, value: T) {
        self.data[index] = value;
        self.timestamps[index] = self.current;
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone> Index<usize> for TimestampedVector<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        if self.timestamps[index] == self.current {
            &self.data[index]
        } else {
            &self.default
        }
    }
}

impl<T: Clone> IndexMut<usize> for TimestampedVector<T> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        if self.timestamps[index] != self.current {
            self.set(index, self.default.clone());
        }
        &mut self.data[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_restores_defaults() {
        let mut dists = TimestampedVector::new(3, f64::INFINITY);
        dists.set(1, 4.0);
        dists[2] = 2.5;
        assert_eq!(dists[1], 4.0);
        assert_eq!(dists[0], f64::INFINITY);
        dists.reset();
        assert_eq!(dists[1], f64::INFINITY);
        assert_eq!(dists[2], f64::INFINITY);
        assert_eq!(dists.len(), 3);
    }
}
