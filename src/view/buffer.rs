//! Fixed-capacity, newest-first ring used for the detection feeds.

use serde::{Serialize, Serializer};
use std::collections::VecDeque;

/// Bounded buffer that keeps the `capacity` most recently pushed items, newest first.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundedBuffer<T> {
    entries: VecDeque<T>,
    capacity: usize,
}

impl<T> BoundedBuffer<T> {
    /// Creates an empty buffer holding at most `capacity` items.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Prepends an item, evicting the oldest once the buffer is full.
    pub fn push(&mut self, item: T) {
        if self.capacity == 0 {
            return;
        }
        self.entries.push_front(item);
        self.entries.truncate(self.capacity);
    }

    /// Prepends `item` unless an entry with the same key is already held.
    /// Returns whether the item was added.
    pub fn push_unique_by<K, F>(&mut self, item: T, key: F) -> bool
    where
        K: PartialEq,
        F: Fn(&T) -> K,
    {
        let wanted = key(&item);
        if self.entries.iter().any(|held| key(held) == wanted) {
            return false;
        }
        self.push(item);
        true
    }

    /// Replaces the contents with the first `capacity` items of an already newest-first
    /// sequence.
    pub fn replace_with<I>(&mut self, items: I)
    where
        I: IntoIterator<Item = T>,
    {
        self.entries.clear();
        self.entries.extend(items.into_iter().take(self.capacity));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Iterates newest first.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }

    /// Most recently pushed item.
    pub fn latest(&self) -> Option<&T> {
        self.entries.front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.entries.iter().cloned().collect()
    }
}

impl<T: Serialize> Serialize for BoundedBuffer<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.entries.iter())
    }
}
