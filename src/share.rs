// Copyright 2020-2026 MathxH Chen.
//
// Code is licensed under MIT Apache Dual License

use num_bigint::BigUint;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Owner of sharings no single party dealt: public constants and jointly
/// sampled values.
pub const JOINT_OWNER: usize = 0;

/// Handle to a secret shared value.
///
/// `id` names the slot under which every party keeps its own evaluation; the
/// value itself never leaves the party stores. `party` is the owner: the
/// dealer of a fresh sharing, inherited from the first operand by everything
/// computed from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Share {
    pub party: usize,
    pub id: usize,
}

impl Share {
    pub fn new(party: usize, id: usize) -> Self {
        Share { party, id }
    }
}

/// Set/propagate/kill sharings for one bit position of a binary addition.
#[derive(Debug, Clone, Copy)]
pub struct Spk {
    pub s: Share,
    pub p: Share,
    pub k: Share,
}

/// Hands out share ids. Ids are dense and increase monotonically until
/// [`ShareIdAllocator::reset`] is called.
#[derive(Debug, Default)]
pub struct ShareIdAllocator {
    next: AtomicUsize,
}

impl ShareIdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self) -> usize {
        self.next.fetch_add(1, Ordering::SeqCst)
    }

    /// Number of ids issued since the last reset.
    pub fn issued(&self) -> usize {
        self.next.load(Ordering::SeqCst)
    }

    /// Starts over at id 0 and returns how many ids had been issued.
    pub fn reset(&self) -> usize {
        self.next.swap(0, Ordering::SeqCst)
    }
}

/// A party's private values, indexed by share id.
#[derive(Debug, Default)]
pub struct ShareStore {
    slots: Vec<Option<BigUint>>,
}

impl ShareStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: usize) -> Option<&BigUint> {
        self.slots.get(id).and_then(|slot| slot.as_ref())
    }

    pub fn insert(&mut self, id: usize, value: BigUint) {
        if id >= self.slots.len() {
            self.slots.resize(id + 1, None);
        }
        self.slots[id] = Some(value);
    }

    /// Adds `value` to whatever is already stored under `id` (zero if
    /// nothing is), reducing modulo `modulus`.
    pub fn accumulate(&mut self, id: usize, value: &BigUint, modulus: &BigUint) {
        if id >= self.slots.len() {
            self.slots.resize(id + 1, None);
        }
        let slot = &mut self.slots[id];
        let sum = match slot.take() {
            Some(current) => (current + value) % modulus,
            None => value % modulus,
        };
        *slot = Some(sum);
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocator_is_monotonic() {
        let ids = ShareIdAllocator::new();
        assert_eq!(ids.next(), 0);
        assert_eq!(ids.next(), 1);
        assert_eq!(ids.next(), 2);
        assert_eq!(ids.issued(), 3);
        assert_eq!(ids.reset(), 3);
        assert_eq!(ids.next(), 0);
    }

    #[test]
    fn test_store_accumulates() {
        let p = BigUint::from(11u32);
        let mut store = ShareStore::new();
        assert!(store.get(4).is_none());

        store.accumulate(4, &BigUint::from(7u32), &p);
        store.accumulate(4, &BigUint::from(9u32), &p);
        assert_eq!(store.get(4), Some(&BigUint::from(5u32)));
        assert!(store.get(3).is_none());
        assert_eq!(store.len(), 1);

        store.insert(1, BigUint::from(3u32));
        assert_eq!(store.len(), 2);
        store.clear();
        assert!(store.is_empty());
    }
}
