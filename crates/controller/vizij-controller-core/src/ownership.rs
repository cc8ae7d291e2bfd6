//! Which feature authored which layer.

use std::collections::BTreeSet;

use hashbrown::HashMap;

use crate::graph::Controller;
use crate::ids::StateMachineId;

/// Layer (by state machine identity) -> owning feature identifier.
#[derive(Clone, Debug, Default)]
pub struct OwnershipIndex {
    owners: HashMap<StateMachineId, String>,
}

impl OwnershipIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, layer: StateMachineId, owner: impl Into<String>) {
        self.owners.insert(layer, owner.into());
    }

    pub fn owner_of(&self, layer: StateMachineId) -> Option<&str> {
        self.owners.get(&layer).map(String::as_str)
    }

    /// A copied layer belongs to whoever owned the original.
    pub fn copy_owner(&mut self, from: StateMachineId, to: StateMachineId) {
        if let Some(owner) = self.owners.get(&from).cloned() {
            self.owners.insert(to, owner);
        }
    }

    /// Distinct owners among a controller's non-empty layers. Layers with no default
    /// state (masks, junk) and layers nobody recorded never contribute.
    pub fn unique_owners(&self, controller: &Controller) -> BTreeSet<String> {
        controller
            .layers()
            .iter()
            .filter(|l| l.has_default_state())
            .filter_map(|l| self.owner_of(l.id()))
            .map(str::to_string)
            .collect()
    }

    pub fn layers_owned_by(&self, controller: &Controller, owner: &str) -> Vec<StateMachineId> {
        controller
            .layers()
            .iter()
            .filter(|l| self.owner_of(l.id()) == Some(owner))
            .map(|l| l.id())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}
