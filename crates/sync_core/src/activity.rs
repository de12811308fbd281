use std::collections::{BTreeMap, BTreeSet};

use crate::EntityFamily;

/// "Recently updated" flags per family. Each mark bumps a generation so that only
/// the clear timer armed by the latest mark can switch the flag off.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ActivityMarkers {
    generations: BTreeMap<EntityFamily, u64>,
    active: BTreeSet<EntityFamily>,
}

impl ActivityMarkers {
    pub fn mark(&mut self, family: EntityFamily) -> u64 {
        let generation = self.generations.entry(family).or_insert(0);
        *generation += 1;
        self.active.insert(family);
        *generation
    }

    /// Returns true when the flag was switched off.
    pub fn expire(&mut self, family: EntityFamily, generation: u64) -> bool {
        if self.generations.get(&family) != Some(&generation) {
            return false;
        }
        self.active.remove(&family)
    }

    pub fn is_active(&self, family: EntityFamily) -> bool {
        self.active.contains(&family)
    }

    pub fn active(&self) -> impl Iterator<Item = EntityFamily> + '_ {
        self.active.iter().copied()
    }

    pub fn clear(&mut self, family: EntityFamily) {
        self.active.remove(&family);
    }

    pub fn clear_all(&mut self) {
        self.active.clear();
    }
}
