//! Secondary index from an owning party to the ids it owns.

use std::collections::{BTreeMap, BTreeSet};

use dealmatch_types::Address;

/// `Address -> {id}` with empty buckets pruned.
#[derive(Debug)]
pub struct OwnerIndex<K: Ord + Clone> {
    buckets: BTreeMap<Address, BTreeSet<K>>,
}

impl<K: Ord + Clone> OwnerIndex<K> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            buckets: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, owner: &Address, id: K) {
        self.buckets.entry(owner.clone()).or_default().insert(id);
    }

    pub fn remove(&mut self, owner: &Address, id: &K) {
        if let Some(bucket) = self.buckets.get_mut(owner) {
            bucket.remove(id);
            if bucket.is_empty() {
                self.buckets.remove(owner);
            }
        }
    }

    /// Ids owned by `owner`, in ascending order.
    pub fn ids(&self, owner: &Address) -> impl Iterator<Item = &K> {
        self.buckets.get(owner).into_iter().flatten()
    }

    /// Number of distinct owners.
    #[must_use]
    pub fn owners(&self) -> usize {
        self.buckets.len()
    }
}

impl<K: Ord + Clone> Default for OwnerIndex<K> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_list_sorted() {
        let mut idx = OwnerIndex::new();
        let alice = Address::new("alice");
        idx.insert(&alice, "b".to_string());
        idx.insert(&alice, "a".to_string());
        let ids: Vec<_> = idx.ids(&alice).cloned().collect();
        assert_eq!(ids, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn empty_buckets_are_pruned() {
        let mut idx = OwnerIndex::new();
        let alice = Address::new("alice");
        idx.insert(&alice, 1u32);
        assert_eq!(idx.owners(), 1);
        idx.remove(&alice, &1);
        assert_eq!(idx.owners(), 0);
        assert_eq!(idx.ids(&alice).count(), 0);
    }

    #[test]
    fn unknown_owner_yields_nothing() {
        let idx: OwnerIndex<u32> = OwnerIndex::new();
        assert_eq!(idx.ids(&Address::new("nobody")).count(), 0);
    }
}
