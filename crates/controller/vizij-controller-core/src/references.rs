//! Identity-based references from layer-control behaviours to the layers they drive.
//!
//! The `(playable, layer)` pair stored on a behaviour goes stale whenever layers are
//! inserted, removed or copied. This table is the source of truth instead; the
//! reindexer projects it back onto the behaviours once the structure is final.

use indexmap::{IndexMap, IndexSet};

use crate::graph::ControllerGraph;
use crate::ids::{BehaviourId, StateMachineId};

#[derive(Clone, Debug, Default)]
pub struct ReferenceTracker {
    targets: IndexMap<BehaviourId, IndexSet<StateMachineId>>,
}

impl ReferenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an edge. Registering the same pair twice is a no-op.
    pub fn register(&mut self, behaviour: BehaviourId, target: StateMachineId) {
        self.targets.entry(behaviour).or_default().insert(target);
    }

    /// Make every behaviour that drives `from` also drive `to`. The original edge stays.
    pub fn redirect(&mut self, from: StateMachineId, to: StateMachineId) {
        for set in self.targets.values_mut() {
            if set.contains(&from) && !set.contains(&to) {
                set.insert(to);
            }
        }
    }

    /// A duplicated behaviour follows the same targets as its original.
    pub fn copy_entries(&mut self, from: BehaviourId, to: BehaviourId) {
        if let Some(set) = self.targets.get(&from).cloned() {
            let entry = self.targets.entry(to).or_default();
            for target in set {
                entry.insert(target);
            }
        }
    }

    /// Move the edge `behaviour -> target` onto `to`. Used when one behaviour is
    /// fanned out into several physical copies, one per target.
    pub fn split_off(&mut self, behaviour: BehaviourId, target: StateMachineId, to: BehaviourId) {
        if let Some(set) = self.targets.get_mut(&behaviour) {
            set.shift_remove(&target);
        }
        self.register(to, target);
    }

    /// Drop a target the reindexer found no longer resolves to a live layer.
    pub fn prune(&mut self, behaviour: BehaviourId, target: StateMachineId) {
        if let Some(set) = self.targets.get_mut(&behaviour) {
            set.shift_remove(&target);
        }
    }

    /// Current targets, in registration order.
    pub fn targets_of(&self, behaviour: BehaviourId) -> Vec<StateMachineId> {
        self.targets
            .get(&behaviour)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn is_tracked(&self, behaviour: BehaviourId) -> bool {
        self.targets.get(&behaviour).map(|s| !s.is_empty()).unwrap_or(false)
    }

    pub fn contains_target(&self, target: StateMachineId) -> bool {
        self.targets.values().any(|set| set.contains(&target))
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Register every layer control in `graph` against the layer its stored
    /// coordinates currently point at. Controls naming a controller that isn't in
    /// the graph, or an index out of range, are left untracked.
    pub fn record_controller_set(&mut self, graph: &ControllerGraph) -> usize {
        let mut recorded = 0;
        for controller in graph.controllers() {
            for layer in controller.layers() {
                for behaviour in layer.behaviours() {
                    let Some(control) = behaviour.as_layer_control() else {
                        continue;
                    };
                    let Some(target) = graph.controller(control.playable.controller_kind()) else {
                        continue;
                    };
                    if control.layer < 0 {
                        continue;
                    }
                    let Some(target_layer) = target.layer(control.layer as usize) else {
                        continue;
                    };
                    self.register(behaviour.id, target_layer.id());
                    recorded += 1;
                }
            }
        }
        log::debug!("recorded {recorded} layer control reference(s)");
        recorded
    }
}
