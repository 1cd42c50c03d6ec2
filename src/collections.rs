use std::collections::{HashMap, VecDeque};
use core::hash::Hash;

/// Insertion-ordered map that evicts its oldest entry once `capacity` is
/// reached.
pub struct QueueMap<K, V>
where
    K: Clone + Eq + Hash,
{
    queue: VecDeque<K>,
    map: HashMap<K, V>,
    capacity: usize,
}

impl<K, V> QueueMap<K, V>
where
    K: Clone + Eq + Hash,
{
    pub fn with_capacity(capacity: usize) -> Self {
        QueueMap {
            queue: VecDeque::with_capacity(capacity),
            map: HashMap::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.map.get(key)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Inserts an item, evicting the oldest entry when full. Returns `false`
    /// if the key was already present, leaving the existing value in place.
    pub fn push_back(&mut self, key: K, value: V) -> bool {
        if self.map.contains_key(&key) {
            return false;
        }
        if self.map.len() >= self.capacity {
            self.pop_front();
        }
        self.queue.push_back(key.clone());
        self.map.insert(key, value);
        true
    }

    /// Pops the oldest item.
    pub fn pop_front(&mut self) -> Option<(K, V)> {
        let oldest = self.queue.pop_front()?;
        self.map.remove_entry(&oldest)
    }
}
