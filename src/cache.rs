//! Fixed-capacity operation cache.
//!
//! A direct-mapped cache from operation keys to results: each key hashes to
//! exactly one slot (`hash mod capacity`), and colliding entries silently
//! overwrite each other. The cache is semantically transparent: it may
//! answer "absent" for any key, and engine correctness never depends on a
//! hit. A capacity of zero disables caching entirely.
//!
//! Entries are stamped with a generation counter. Bumping the generation
//! (after garbage collection) invalidates every entry in O(1), so a result
//! whose node has been reclaimed can never be served as a ghost hit.

use std::cell::Cell;

use crate::utils::MyHash;

/// A single cache slot with its generation stamp.
#[derive(Debug, Clone)]
struct Slot<K, V> {
    key: K,
    value: V,
    generation: u64,
}

/// A direct-mapped operation cache with O(1) whole-cache invalidation.
#[derive(Debug)]
pub struct OpCache<K, V> {
    slots: Vec<Option<Slot<K, V>>>,
    generation: u64,
    hits: Cell<usize>,
    misses: Cell<usize>,
    faults: Cell<usize>,
}

impl<K, V> OpCache<K, V> {
    /// Creates a cache with the given number of slots. Zero disables caching.
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: (0..capacity).map(|_| None).collect(),
            generation: 1,
            hits: Cell::new(0),
            misses: Cell::new(0),
            faults: Cell::new(0),
        }
    }

    /// Returns the number of slots in the cache.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns the number of cache hits.
    pub fn hits(&self) -> usize {
        self.hits.get()
    }

    /// Returns the number of cache misses.
    pub fn misses(&self) -> usize {
        self.misses.get()
    }

    /// Returns the number of cache faults (collision misses).
    pub fn faults(&self) -> usize {
        self.faults.get()
    }

    /// Invalidates every entry in O(1) by bumping the generation counter.
    pub fn invalidate_all(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }
}

impl<K, V> OpCache<K, V>
where
    K: MyHash + Eq,
    V: Copy,
{
    #[inline]
    fn slot_index(&self, key: &K) -> usize {
        (key.hash() % self.slots.len() as u64) as usize
    }

    /// Looks up a key. Returns `None` on an empty, stale, or colliding slot.
    #[inline]
    pub fn get(&self, key: &K) -> Option<V> {
        if self.slots.is_empty() {
            return None;
        }
        let idx = self.slot_index(key);
        match &self.slots[idx] {
            Some(slot) if slot.generation == self.generation => {
                if slot.key == *key {
                    self.hits.set(self.hits.get() + 1);
                    Some(slot.value)
                } else {
                    self.faults.set(self.faults.get() + 1);
                    self.misses.set(self.misses.get() + 1);
                    None
                }
            }
            _ => {
                self.misses.set(self.misses.get() + 1);
                None
            }
        }
    }

    /// Inserts a key-value pair, overwriting whatever occupied the slot.
    #[inline]
    pub fn insert(&mut self, key: K, value: V) {
        if self.slots.is_empty() {
            return;
        }
        let idx = self.slot_index(&key);
        self.slots[idx] = Some(Slot {
            key,
            value,
            generation: self.generation,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_get() {
        let mut cache = OpCache::<(u64, u64), i32>::new(16);

        cache.insert((1, 2), 42);
        cache.insert((3, 4), 99);

        assert_eq!(cache.get(&(1, 2)), Some(42));
        assert_eq!(cache.get(&(3, 4)), Some(99));
        assert_eq!(cache.get(&(5, 6)), None);
    }

    #[test]
    fn test_overwrite() {
        let mut cache = OpCache::<(u64, u64), i32>::new(16);

        cache.insert((1, 2), 10);
        assert_eq!(cache.get(&(1, 2)), Some(10));

        cache.insert((1, 2), 20);
        assert_eq!(cache.get(&(1, 2)), Some(20));
    }

    #[test]
    fn test_zero_capacity_is_noop() {
        let mut cache = OpCache::<(u64, u64), i32>::new(0);
        cache.insert((1, 2), 42);
        assert_eq!(cache.get(&(1, 2)), None);
    }

    #[test]
    fn test_invalidate_all() {
        let mut cache = OpCache::<(u64, u64), i32>::new(16);

        cache.insert((1, 2), 42);
        assert_eq!(cache.get(&(1, 2)), Some(42));

        cache.invalidate_all();
        assert_eq!(cache.get(&(1, 2)), None);

        // The cache keeps working after invalidation.
        cache.insert((1, 2), 7);
        assert_eq!(cache.get(&(1, 2)), Some(7));
    }

    #[test]
    fn test_collisions_overwrite() {
        // Tiny cache to force collisions.
        let mut cache = OpCache::<(u64, u64), i32>::new(4);

        for i in 0..16 {
            cache.insert((i, 0), i as i32);
        }

        // At most one entry per slot survives.
        let mut found = 0;
        for i in 0..16 {
            if cache.get(&(i, 0)).is_some() {
                found += 1;
            }
        }
        assert!(found <= 4);
    }

    #[test]
    fn test_statistics() {
        let mut cache = OpCache::<(u64, u64), i32>::new(16);

        cache.get(&(1, 2)); // Miss
        assert_eq!(cache.misses(), 1);
        assert_eq!(cache.hits(), 0);

        cache.insert((1, 2), 42);
        cache.get(&(1, 2)); // Hit
        assert_eq!(cache.hits(), 1);
    }

    #[test]
    fn test_non_power_of_two_capacity() {
        let mut cache = OpCache::<(u64, u64), i32>::new(7);
        for i in 0..7 {
            cache.insert((i, i), i as i32);
        }
        // Whatever survived must be correct.
        for i in 0..7 {
            if let Some(v) = cache.get(&(i, i)) {
                assert_eq!(v, i as i32);
            }
        }
    }
}
