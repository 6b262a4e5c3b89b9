//! Handles to rendered elements, keyed by a stable id
//!
//! Entries are mounted when an element is rendered and unmounted when it
//! goes away. A registry belongs to one viewer session.

use std::borrow::Borrow;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct Registry<K, H> {
    entries: BTreeMap<K, H>,
}

impl<K: Ord, H> Default for Registry<K, H> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<K: Ord, H> Registry<K, H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the handle for `key`.
    pub fn mount(&mut self, key: K, handle: H) {
        self.entries.insert(key, handle);
    }

    pub fn unmount<Q>(&mut self, key: &Q) -> Option<H>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.entries.remove(key)
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&H>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.entries.get(key)
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.entries.contains_key(key)
    }

    /// Entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&K, &H)> {
        self.entries.iter()
    }

    /// Drop every entry whose key fails `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(&K) -> bool) {
        self.entries.retain(|k, _| keep(k));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
