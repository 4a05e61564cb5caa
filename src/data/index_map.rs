//! # Open-addressed index table
//!
//! Maps non-zero 32-bit hashes to `u32` record indices. The table is a pair
//! of flat arrays (hashes and values) sized to a power of two and probed
//! linearly; a stored hash of zero marks an empty slot. Distinct keys may
//! share a hash: lookups surface every colliding slot in probe order and the
//! caller verifies the full key against its own records.
//!
//! Deletion backshifts displaced entries into the gap so probe chains stay
//! unbroken, and the table rehashes into double the slots once the load
//! factor reaches one half.
use crate::data::AllocationError;

/// Probe state, advanced by [`IndexMap::find`] and [`IndexMap::find_next`].
///
/// `hash` is what the probe stopped on: the key's hash for a candidate
/// match, or zero for the empty slot where an insertion would go.
#[derive(Clone, Copy, Debug)]
pub struct Probe {
    pub slot: u32,
    pub hash: u32,
    steps: u32,
}

/// Open-addressed hash → index table with linear probing.
#[derive(Debug)]
pub struct IndexMap {
    hashes: Vec<u32>,
    values: Vec<u32>,
    len: u32,
}

impl IndexMap {
    /// Create a table with `page_size` bytes of initial slots.
    pub fn with_page_size(page_size: usize) -> Self {
        // one u32 hash + one u32 value per slot
        let slots = (page_size / 8).max(4);
        debug_assert!(slots.is_power_of_two());
        Self {
            hashes: vec![0; slots],
            values: vec![0; slots],
            len: 0,
        }
    }

    /// Number of live entries.
    pub fn len(&self) -> u32 {
        self.len
    }

    /// Number of slots.
    pub fn slots(&self) -> usize {
        self.hashes.len()
    }

    /// The value stored at `slot`.
    pub fn value(&self, slot: u32) -> u32 {
        self.values[slot as usize]
    }

    /// Probe for `key_hash`, stopping at the first slot that holds it or at
    /// the first empty slot.
    pub fn find(&self, key_hash: u32) -> Probe {
        debug_assert_ne!(key_hash, 0);

        let mask = self.mask();
        let mut slot = key_hash & mask;
        for steps in 0..self.hashes.len() as u32 {
            let hash = self.hashes[slot as usize];
            if hash == 0 || hash == key_hash {
                return Probe { slot, hash, steps };
            }
            slot = (slot + 1) & mask;
        }
        unreachable!("index table has no empty slot");
    }

    /// Continue a probe past a colliding slot, to the next slot holding the
    /// same hash or to the first empty slot.
    pub fn find_next(&self, previous: &Probe) -> Probe {
        debug_assert_ne!(previous.hash, 0);

        let mask = self.mask();
        let mut slot = (previous.slot + 1) & mask;
        for steps in previous.steps + 1..self.hashes.len() as u32 {
            let hash = self.hashes[slot as usize];
            if hash == 0 || hash == previous.hash {
                return Probe {
                    slot,
                    hash: if hash == 0 { 0 } else { previous.hash },
                    steps,
                };
            }
            slot = (slot + 1) & mask;
        }
        unreachable!("index table has no empty slot");
    }

    /// Fill the empty slot a probe stopped on.
    pub fn insert(&mut self, slot: u32, key_hash: u32, value: u32) {
        debug_assert_ne!(key_hash, 0);
        debug_assert_eq!(self.hashes[slot as usize], 0);

        self.hashes[slot as usize] = key_hash;
        self.values[slot as usize] = value;
        self.len += 1;
    }

    /// Whether the load factor has reached one half, the point at which the
    /// table must grow before the next insertion.
    pub fn overloaded(&self) -> bool {
        2 * self.len() as usize >= self.slots()
    }

    /// Remove the entry at `slot` and return its value.
    ///
    /// Walks forward from the gap; every occupant whose home slot lies
    /// outside the ring interval `(gap, occupant]` is shifted one step back
    /// into the gap, which keeps each remaining entry reachable from its
    /// home slot without crossing an empty slot.
    pub fn erase(&mut self, slot: u32) -> u32 {
        debug_assert_ne!(self.len, 0);
        debug_assert_ne!(self.hashes[slot as usize], 0);

        let value = self.values[slot as usize];
        let mask = self.mask();
        let mut gap = slot;
        let mut current = (slot + 1) & mask;
        while current != gap {
            let hash = self.hashes[current as usize];
            if hash == 0 {
                break;
            }
            let home = hash & mask;
            let displaced = if current > gap {
                home <= gap || home > current
            } else {
                home <= gap && home > current
            };
            if displaced {
                self.hashes[gap as usize] = hash;
                self.values[gap as usize] = self.values[current as usize];
                gap = current;
            }
            current = (current + 1) & mask;
        }
        self.hashes[gap as usize] = 0;
        self.len -= 1;

        value
    }

    /// Rehash every live entry into a table with twice the slots.
    pub fn grow(&mut self) -> Result<(), AllocationError> {
        let slots = self.hashes.len() * 2;
        let mut hashes = Vec::new();
        hashes.try_reserve_exact(slots)?;
        hashes.resize(slots, 0);
        let mut values = Vec::new();
        values.try_reserve_exact(slots)?;
        values.resize(slots, 0);

        let mut grown = Self {
            hashes,
            values,
            len: 0,
        };
        for slot in 0..self.hashes.len() {
            let hash = self.hashes[slot];
            if hash == 0 {
                continue;
            }
            // skip past colliding occupants to the chain's first empty slot
            let mut probe = grown.find(hash);
            while probe.hash == hash {
                probe = grown.find_next(&probe);
            }
            grown.insert(probe.slot, hash, self.values[slot]);
        }
        *self = grown;
        Ok(())
    }

    fn mask(&self) -> u32 {
        self.hashes.len() as u32 - 1
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashMap;

    use proptest::collection::vec;
    use proptest::prelude::*;

    use super::*;

    fn find_value(map: &IndexMap, key_hash: u32) -> Option<u32> {
        let probe = map.find(key_hash);
        if probe.hash == key_hash {
            Some(map.value(probe.slot))
        } else {
            None
        }
    }

    /// Every occupant must be reachable from its home slot without passing
    /// an empty slot.
    fn assert_chains_unbroken(map: &IndexMap) {
        let mask = map.slots() as u32 - 1;
        for slot in 0..map.slots() as u32 {
            let hash = map.hashes[slot as usize];
            if hash == 0 {
                continue;
            }
            let mut current = hash & mask;
            loop {
                assert_ne!(map.hashes[current as usize], 0, "broken probe chain");
                if current == slot {
                    break;
                }
                current = (current + 1) & mask;
            }
        }
    }

    #[test]
    fn insert_and_find() {
        let mut map = IndexMap::with_page_size(64);
        let probe = map.find(17);
        assert_eq!(probe.hash, 0);
        map.insert(probe.slot, 17, 700);

        assert_eq!(find_value(&map, 17), Some(700));
        assert_eq!(find_value(&map, 18), None);
    }

    #[test]
    fn colliding_hashes_walk_in_probe_order() {
        let mut map = IndexMap::with_page_size(64);
        let first = map.find(9);
        map.insert(first.slot, 9, 1);
        let second = map.find_next(&map.find(9));
        assert_eq!(second.hash, 0);
        map.insert(second.slot, 9, 2);

        let probe = map.find(9);
        assert_eq!(probe.hash, 9);
        assert_eq!(map.value(probe.slot), 1);
        let probe = map.find_next(&probe);
        assert_eq!(probe.hash, 9);
        assert_eq!(map.value(probe.slot), 2);
        let probe = map.find_next(&probe);
        assert_eq!(probe.hash, 0);
    }

    #[test]
    fn erase_backshifts_displaced_entries() {
        let mut map = IndexMap::with_page_size(64);
        let slots = map.slots() as u32;
        // three keys homing to the same slot, plus one neighbor
        let base = 3;
        for (offset, value) in [(0, 10), (slots, 11), (2 * slots, 12), (1, 20)] {
            let key = base + offset;
            let mut probe = map.find(key);
            while probe.hash != 0 {
                probe = map.find_next(&probe);
            }
            map.insert(probe.slot, key, value);
        }

        map.erase(map.find(base).slot);
        assert_chains_unbroken(&map);
        assert_eq!(find_value(&map, base + slots), Some(11));
        assert_eq!(find_value(&map, base + 2 * slots), Some(12));
        assert_eq!(find_value(&map, base + 1), Some(20));
    }

    #[test]
    fn grows_while_keeping_all_entries() {
        let mut map = IndexMap::with_page_size(32);
        let initial_slots = map.slots();
        for key in 1..=64u32 {
            let probe = map.find(key);
            map.insert(probe.slot, key, key * 2);
            if map.overloaded() {
                map.grow().unwrap();
            }
        }
        assert!(map.slots() > initial_slots);
        assert!(2 * (map.len() as usize) < map.slots());
        for key in 1..=64u32 {
            assert_eq!(find_value(&map, key), Some(key * 2));
        }
    }

    proptest! {
        /// Random insert/erase interleavings agree with a `HashMap` model
        /// and never break a probe chain.
        #[test]
        fn behaves_like_a_map(operations in vec((1u32..200, any::<bool>()), 1..300)) {
            let mut map = IndexMap::with_page_size(32);
            let mut model: HashMap<u32, u32> = HashMap::new();
            let mut next_value = 0;

            for (key, insert) in operations {
                if insert && !model.contains_key(&key) {
                    let mut probe = map.find(key);
                    while probe.hash != 0 {
                        probe = map.find_next(&probe);
                    }
                    map.insert(probe.slot, key, next_value);
                    model.insert(key, next_value);
                    next_value += 1;
                    if map.overloaded() {
                        map.grow().unwrap();
                    }
                } else if model.remove(&key).is_some() {
                    let slot = map.find(key).slot;
                    map.erase(slot);
                }

                prop_assert_eq!(map.len() as usize, model.len());
                assert_chains_unbroken(&map);
            }
            for (key, value) in model {
                prop_assert_eq!(find_value(&map, key), Some(value));
            }
        }
    }
}
