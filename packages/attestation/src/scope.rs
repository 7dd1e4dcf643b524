use std::collections::BTreeMap;
use std::ops::Bound;

use cosmwasm_std::{Order, Record, Storage};

/// Write buffer layered over a base store.
///
/// Reads see the buffered writes first. Nothing reaches the base store until
/// [`StorageScope::commit`]; dropping the scope discards every buffered write.
pub struct StorageScope<'a> {
    base: &'a mut dyn Storage,
    /// `None` marks a removal
    pending: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

impl<'a> StorageScope<'a> {
    pub fn new(base: &'a mut dyn Storage) -> Self {
        Self {
            base,
            pending: BTreeMap::new(),
        }
    }

    /// Flushes the buffered writes into the base store.
    pub fn commit(self) {
        for (key, value) in self.pending {
            match value {
                Some(value) => self.base.set(&key, &value),
                None => self.base.remove(&key),
            }
        }
    }
}

impl Storage for StorageScope<'_> {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        match self.pending.get(key) {
            Some(value) => value.clone(),
            None => self.base.get(key),
        }
    }

    fn range<'b>(
        &'b self,
        start: Option<&[u8]>,
        end: Option<&[u8]>,
        order: Order,
    ) -> Box<dyn Iterator<Item = Record> + 'b> {
        if let (Some(start), Some(end)) = (start, end) {
            if start >= end {
                return Box::new(std::iter::empty());
            }
        }

        let mut merged: BTreeMap<Vec<u8>, Vec<u8>> =
            self.base.range(start, end, Order::Ascending).collect();
        let lower = start.map_or(Bound::Unbounded, |s| Bound::Included(s.to_vec()));
        let upper = end.map_or(Bound::Unbounded, |e| Bound::Excluded(e.to_vec()));
        for (key, value) in self.pending.range((lower, upper)) {
            match value {
                Some(value) => {
                    merged.insert(key.clone(), value.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }

        match order {
            Order::Ascending => Box::new(merged.into_iter()),
            Order::Descending => Box::new(merged.into_iter().rev()),
        }
    }

    fn set(&mut self, key: &[u8], value: &[u8]) {
        self.pending.insert(key.to_vec(), Some(value.to_vec()));
    }

    fn remove(&mut self, key: &[u8]) {
        self.pending.insert(key.to_vec(), None);
    }
}
