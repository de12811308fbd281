//! Generic keyed cache shared by every per-record entity family, plus the
//! single-value slot used by aggregate rollups.
use std::collections::BTreeMap;

/// A record that can live in a [`KeyedRepository`].
pub trait KeyedEntity: Clone + PartialEq {
    /// Partial update; every `Some` field overwrites, every `None` field is left alone.
    /// Nullable fields use `Option<Option<_>>` so an explicit null clears the value.
    type Patch;

    fn id(&self) -> &str;

    /// Merges `patch` into `self`, returning whether any field changed.
    fn apply_patch(&mut self, patch: &Self::Patch) -> bool;
}

/// Result of one reconciliation against a cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciled {
    Inserted,
    Replaced,
    Patched,
    Removed,
    /// The inbound data matched what was already cached.
    Unchanged,
    /// The id is not known to the client; nothing was touched.
    Missing,
}

impl Reconciled {
    pub fn changed(self) -> bool {
        matches!(
            self,
            Reconciled::Inserted | Reconciled::Replaced | Reconciled::Patched | Reconciled::Removed
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeyedRepository<T> {
    items: BTreeMap<String, T>,
}

impl<T> Default for KeyedRepository<T> {
    fn default() -> Self {
        Self {
            items: BTreeMap::new(),
        }
    }
}

impl<T: KeyedEntity> KeyedRepository<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole collection with a fresh snapshot. Later duplicates win.
    pub fn seed(&mut self, items: Vec<T>) -> usize {
        self.items = items
            .into_iter()
            .map(|item| (item.id().to_string(), item))
            .collect();
        self.items.len()
    }

    /// Created: insert, or overwrite when the id is already cached. Never duplicates.
    pub fn upsert(&mut self, entity: T) -> Reconciled {
        self.put(entity)
    }

    /// Replaced: full overwrite from a complete snapshot.
    pub fn replace(&mut self, entity: T) -> Reconciled {
        self.put(entity)
    }

    pub fn patch(&mut self, id: &str, patch: &T::Patch) -> Reconciled {
        match self.items.get_mut(id) {
            Some(existing) => {
                if existing.apply_patch(patch) {
                    Reconciled::Patched
                } else {
                    Reconciled::Unchanged
                }
            }
            None => Reconciled::Missing,
        }
    }

    pub fn remove(&mut self, id: &str) -> Reconciled {
        match self.items.remove(id) {
            Some(_) => Reconciled::Removed,
            None => Reconciled::Missing,
        }
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.items.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.items.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.values()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    fn put(&mut self, entity: T) -> Reconciled {
        match self.items.get_mut(entity.id()) {
            Some(existing) if *existing == entity => Reconciled::Unchanged,
            Some(existing) => {
                *existing = entity;
                Reconciled::Replaced
            }
            None => {
                self.items.insert(entity.id().to_string(), entity);
                Reconciled::Inserted
            }
        }
    }
}

/// Holds one point-in-time rollup; every update swaps the whole value.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotSlot<T> {
    value: Option<T>,
}

impl<T> Default for SnapshotSlot<T> {
    fn default() -> Self {
        Self { value: None }
    }
}

impl<T: Clone + PartialEq> SnapshotSlot<T> {
    pub fn replace(&mut self, snapshot: T) -> Reconciled {
        let outcome = match &self.value {
            None => Reconciled::Inserted,
            Some(current) if *current == snapshot => Reconciled::Unchanged,
            Some(_) => Reconciled::Replaced,
        };
        self.value = Some(snapshot);
        outcome
    }

    pub fn get(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn clear(&mut self) {
        self.value = None;
    }
}

pub(crate) fn merge_field<T: Clone + PartialEq>(slot: &mut T, incoming: &Option<T>) -> bool {
    match incoming {
        Some(value) if slot != value => {
            *slot = value.clone();
            true
        }
        _ => false,
    }
}

pub(crate) fn merge_optional<T: Clone + PartialEq>(slot: &mut Option<T>, incoming: &Option<T>) -> bool {
    match incoming {
        Some(value) if slot.as_ref() != Some(value) => {
            *slot = Some(value.clone());
            true
        }
        _ => false,
    }
}

/// Merges a nullable field: `None` is absent, `Some(None)` clears, `Some(Some(v))` sets.
pub(crate) fn merge_nullable<T: Clone + PartialEq>(
    slot: &mut Option<T>,
    incoming: &Option<Option<T>>,
) -> bool {
    match incoming {
        Some(value) if slot != value => {
            *slot = value.clone();
            true
        }
        _ => false,
    }
}
