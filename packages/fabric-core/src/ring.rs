//! Consistent-hash ring: an ordered mapping from 64-bit hash to node,
//! resolved by walking forward from a query hash and wrapping to the
//! smallest key when the tail is empty.

use std::collections::BTreeMap;

use crate::hash::HashFunction;

/// An ordered map from `i64` hash to node `T`.
///
/// Built fresh per recomputation and never mutated during lookup -- callers
/// insert everything up front, then resolve against the finished ring.
#[derive(Debug, Clone)]
pub struct ConsistentHashCircle<T> {
    entries: BTreeMap<i64, T>,
}

impl<T> ConsistentHashCircle<T> {
    /// Creates an empty ring.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Returns true if no node has been placed on the ring.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries currently on the ring (includes virtual nodes).
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Places a node at hash `h`. If another node already occupies that
    /// exact hash, the earlier insertion wins and this call is a no-op.
    pub fn insert(&mut self, h: i64, node: T) {
        self.entries.entry(h).or_insert(node);
    }

    /// Returns the node at the first key >= `h`, wrapping to the smallest
    /// key if the tail is empty. `None` only for an empty ring.
    #[must_use]
    pub fn resolve(&self, h: i64) -> Option<&T> {
        self.entries
            .range(h..)
            .next()
            .or_else(|| self.entries.iter().next())
            .map(|(_, node)| node)
    }
}

impl<T: Clone> ConsistentHashCircle<T> {
    /// Computes `h = hash(put_int(partition_idx)).as_i64()` and resolves the
    /// owning node for that partition index, per [`Self::resolve`].
    #[must_use]
    pub fn resolve_by_partition_idx(&self, hash_function: HashFunction, partition_idx: u32) -> Option<T> {
        let h = hash_function
            .builder()
            .put_int(partition_idx as i32)
            .finish()
            .as_i64();
        self.resolve(h).cloned()
    }
}

impl<T> Default for ConsistentHashCircle<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_ring_resolves_to_none() {
        let ring: ConsistentHashCircle<&str> = ConsistentHashCircle::new();
        assert_eq!(ring.resolve(0), None);
    }

    #[test]
    fn resolves_first_key_greater_or_equal() {
        let mut ring = ConsistentHashCircle::new();
        ring.insert(10, "a");
        ring.insert(20, "b");
        ring.insert(30, "c");

        assert_eq!(ring.resolve(5), Some(&"a"));
        assert_eq!(ring.resolve(10), Some(&"a"));
        assert_eq!(ring.resolve(15), Some(&"b"));
        assert_eq!(ring.resolve(30), Some(&"c"));
    }

    #[test]
    fn wraps_to_smallest_key_past_the_tail() {
        let mut ring = ConsistentHashCircle::new();
        ring.insert(10, "a");
        ring.insert(20, "b");

        assert_eq!(ring.resolve(100), Some(&"a"));
        assert_eq!(ring.resolve(i64::MAX), Some(&"a"));
    }

    #[test]
    fn collision_earlier_insertion_wins() {
        let mut ring = ConsistentHashCircle::new();
        ring.insert(10, "first");
        ring.insert(10, "second");
        assert_eq!(ring.resolve(10), Some(&"first"));
    }

    #[test]
    fn resolve_by_partition_idx_is_deterministic() {
        let mut ring = ConsistentHashCircle::new();
        ring.insert(10, "a");
        ring.insert(20, "b");

        let once = ring.resolve_by_partition_idx(HashFunction::Murmur3_128, 7);
        let twice = ring.resolve_by_partition_idx(HashFunction::Murmur3_128, 7);
        assert_eq!(once, twice);
    }
}
