//! Fixed-capacity ring buffer.

use std::collections::VecDeque;

/// Ring buffer that overwrites its oldest element once full.
///
/// Iteration is always oldest → newest. Iterators borrow the buffer, so an
/// in-progress iteration can never observe elements pushed after it started.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> RingBuffer<T> {
    /// Create a buffer holding at most `capacity` elements (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Append `item`, evicting the oldest element when full. O(1).
    pub fn push(&mut self, item: T) {
        if self.items.len() == self.capacity {
            self.items.pop_front();
        }
        self.items.push_back(item);
    }

    /// Most recently pushed element.
    pub fn newest(&self) -> Option<&T> {
        self.items.back()
    }

    /// The `k` most recent elements in chronological order (fewer if not yet filled).
    pub fn last_n(
        &self,
        k: usize,
    ) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator + Clone {
        let skip = self.items.len().saturating_sub(k);
        self.items.iter().skip(skip)
    }

    /// Lazy, restartable (clone the iterator) view over elements matching `predicate`.
    pub fn filter<'a, P>(&'a self, predicate: P) -> impl Iterator<Item = &'a T> + Clone
    where
        P: Fn(&T) -> bool + Clone,
    {
        self.items.iter().filter(move |item| predicate(*item))
    }

    /// Drop elements from the old end while `stale` holds; returns how many were dropped.
    pub fn evict_front_while<P>(&mut self, stale: P) -> usize
    where
        P: Fn(&T) -> bool,
    {
        let mut evicted = 0;
        while self.items.front().is_some_and(&stale) {
            self.items.pop_front();
            evicted += 1;
        }
        evicted
    }
}
