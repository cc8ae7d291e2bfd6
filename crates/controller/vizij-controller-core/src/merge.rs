//! Merge one controller into another, then split the result back apart so each
//! side only animates its own property domain.
//!
//! With the default kinds, Gesture is folded into FX and FX is then copied back
//! over Gesture. Every layer now exists twice, once per controller, at the same
//! index. Each pair is classified by the bindings of its FX-side layer and one
//! (or, for mixed layers, both) copies survive.

use hashbrown::HashSet;

use crate::binding::BindingDomain;
use crate::error::{BuildError, BuildResult};
use crate::graph::{Controller, ControllerGraph, Copied, Layer};
use crate::ids::{BehaviourId, IdAllocator, StateMachineId};
use crate::kinds::ControllerKind;
use crate::ownership::OwnershipIndex;
use crate::params::retain_parameter_drivers;
use crate::references::ReferenceTracker;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Layers moved from `from` ahead of the layers of `into`.
    pub moved: usize,
    /// Layers in the copy written back over `from`.
    pub copied: usize,
    pub kept_into: usize,
    pub kept_from: usize,
    pub removed: usize,
    /// Fixpoint passes for `into` and `from`.
    pub fixpoint_iterations: (usize, usize),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ControllerMerger {
    /// Controller A: receives the merge and keeps FX-domain layers.
    pub into: ControllerKind,
    /// Controller B: rebuilt from the copy and keeps Gesture-domain layers.
    pub from: ControllerKind,
}

impl Default for ControllerMerger {
    fn default() -> Self {
        Self {
            into: ControllerKind::Fx,
            from: ControllerKind::Gesture,
        }
    }
}

impl ControllerMerger {
    pub fn new(into: ControllerKind, from: ControllerKind) -> Self {
        Self { into, from }
    }

    fn check_distinct(&self) -> BuildResult<()> {
        if self.into == self.from {
            return Err(BuildError::SelfMerge { kind: self.into });
        }
        Ok(())
    }

    pub fn merge(
        &self,
        graph: &mut ControllerGraph,
        owners: &mut OwnershipIndex,
        tracker: &mut ReferenceTracker,
        ids: &mut IdAllocator,
    ) -> BuildResult<MergeReport> {
        self.check_distinct()?;
        let (moved_layers, moved_params) = {
            let from = graph.controller_or_insert(self.from);
            (from.take_layers(), std::mem::take(&mut from.parameters))
        };
        let moved = moved_layers.len();
        let into = graph.controller_or_insert(self.into);
        // `from` evaluates first, so its layers take the lowest indices.
        let existing = into.take_layers();
        for layer in moved_layers.into_iter().chain(existing) {
            into.push_layer(layer);
        }
        for param in moved_params {
            into.add_parameter(param);
        }

        let mut copied_behaviours: Vec<(BehaviourId, BehaviourId)> = Vec::new();
        let copy = into.deep_copy(self.from, ids, |event| match event {
            Copied::StateMachine { original, copy } => {
                tracker.redirect(original, copy);
                owners.copy_owner(original, copy);
            }
            Copied::Behaviour { original, copy } => copied_behaviours.push((original, copy)),
        });
        // Behaviour entries are copied once every redirect has landed, so copies
        // pick up the duplicated targets too.
        for (original, copy) in copied_behaviours {
            tracker.copy_entries(original, copy);
        }
        let copied = copy.len();
        graph.insert_controller(copy);

        let mut report = self.partition(graph)?;
        report.moved = moved;
        report.copied = copied;
        Ok(report)
    }

    /// Split a merged pair. Fails before touching anything if the two controllers
    /// don't line up layer for layer.
    pub fn partition(&self, graph: &mut ControllerGraph) -> BuildResult<MergeReport> {
        self.check_distinct()?;
        graph.controller_or_insert(self.into);
        graph.controller_or_insert(self.from);
        let (a, b) = graph
            .pair_mut(self.into, self.from)
            .ok_or(BuildError::SelfMerge { kind: self.into })?;
        if a.len() != b.len() {
            return Err(BuildError::LayerCountMismatch {
                into: self.into,
                from: self.from,
                into_len: a.len(),
                from_len: b.len(),
            });
        }

        let mut keep: HashSet<StateMachineId> = HashSet::new();
        let mut keep_behaviours: HashSet<StateMachineId> = HashSet::new();
        for (la, lb) in a.layers().iter().zip(b.layers()) {
            let domains = layer_domains(la);
            let gesture = domains.contains(&BindingDomain::Gesture);
            let fx = domains.contains(&BindingDomain::Fx);
            if gesture && fx {
                keep.insert(la.id());
                keep.insert(lb.id());
                keep_behaviours.insert(la.id());
            } else if gesture {
                keep.insert(lb.id());
                keep_behaviours.insert(lb.id());
            } else {
                keep.insert(la.id());
                keep_behaviours.insert(la.id());
            }
        }

        let iterations_a = retain_parameter_drivers(a, &mut keep);
        let iterations_b = retain_parameter_drivers(b, &mut keep);

        let before = a.len() + b.len();
        prune(a, &keep, &keep_behaviours);
        prune(b, &keep, &keep_behaviours);

        a.for_each_clip_mut(|clip| {
            clip.retain_bindings(|binding| BindingDomain::classify(binding) != BindingDomain::Gesture)
        });
        b.for_each_clip_mut(|clip| {
            clip.retain_bindings(|binding| BindingDomain::classify(binding) != BindingDomain::Fx)
        });

        let report = MergeReport {
            kept_into: a.len(),
            kept_from: b.len(),
            removed: before - a.len() - b.len(),
            fixpoint_iterations: (iterations_a, iterations_b),
            ..Default::default()
        };
        log::debug!(
            "partitioned {} / {}: kept {} + {}, removed {}",
            self.into,
            self.from,
            report.kept_into,
            report.kept_from,
            report.removed
        );
        Ok(report)
    }
}

fn layer_domains(layer: &Layer) -> HashSet<BindingDomain> {
    layer
        .state_machine
        .clips()
        .into_iter()
        .flat_map(|clip| clip.domains())
        .collect()
}

fn prune(
    controller: &mut Controller,
    keep: &HashSet<StateMachineId>,
    keep_behaviours: &HashSet<StateMachineId>,
) {
    controller.retain_layers(|l| keep.contains(&l.id()));
    for layer in controller.layers_mut() {
        if !keep_behaviours.contains(&layer.id()) {
            layer.strip_behaviours();
        }
    }
}
