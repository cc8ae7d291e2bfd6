//! Re-projects tracked layer-control references onto physical `(controller, index)`
//! coordinates once a phase has finished moving layers around.

use hashbrown::HashMap;

use crate::behaviour::{Behaviour, BehaviourKind, Visit};
use crate::graph::ControllerGraph;
use crate::ids::{IdAllocator, StateMachineId};
use crate::kinds::ControllerKind;
use crate::references::ReferenceTracker;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReindexReport {
    /// Controllers that received an empty placeholder at index 0.
    pub placeholders: Vec<ControllerKind>,
    /// Behaviours whose coordinates were rewritten in place.
    pub rewritten: usize,
    /// Extra copies appended for behaviours with more than one live target.
    pub appended: usize,
    /// Tracked behaviours removed because none of their targets survived.
    pub deleted: usize,
    /// Targets dropped because they vanished from the graph.
    pub dangling: usize,
    /// Targets dropped because their controller cannot be addressed by a layer control.
    pub unaddressable: usize,
}

/// After this runs, every tracked layer control points at one of its registered targets.
#[derive(Debug, Default)]
pub struct OffsetReindexer;

impl OffsetReindexer {
    pub fn run(
        graph: &mut ControllerGraph,
        tracker: &mut ReferenceTracker,
        ids: &mut IdAllocator,
    ) -> ReindexReport {
        let mut report = ReindexReport::default();

        // Index 0 always runs at full weight, so a driven layer there has to move up.
        for controller in graph.controllers_mut() {
            let Some(first) = controller.layer(0) else {
                continue;
            };
            if !tracker.contains_target(first.id()) {
                continue;
            }
            let before = controller.len();
            controller.ensure_empty_base_layer(ids);
            if controller.len() != before {
                report.placeholders.push(controller.kind);
            }
        }

        let mut coordinates: HashMap<StateMachineId, (ControllerKind, usize)> = HashMap::new();
        for controller in graph.controllers() {
            for (index, layer) in controller.layers().iter().enumerate() {
                coordinates.insert(layer.id(), (controller.kind, index));
            }
        }

        for controller in graph.controllers_mut() {
            for layer in controller.layers_mut() {
                layer.rewrite_behaviours(|behaviour| {
                    let Some(control) = behaviour.as_layer_control() else {
                        return Visit::Keep;
                    };
                    if !tracker.is_tracked(behaviour.id) {
                        return Visit::Keep;
                    }

                    let mut live = Vec::new();
                    for target in tracker.targets_of(behaviour.id) {
                        let Some(&(kind, index)) = coordinates.get(&target) else {
                            tracker.prune(behaviour.id, target);
                            report.dangling += 1;
                            continue;
                        };
                        let Some(playable) = kind.blendable() else {
                            log::warn!(
                                "{} drives a layer of {kind}, which layer controls cannot address; dropping that target",
                                behaviour.id
                            );
                            tracker.prune(behaviour.id, target);
                            report.unaddressable += 1;
                            continue;
                        };
                        live.push((target, playable, index));
                    }

                    if live.is_empty() {
                        report.deleted += 1;
                        return Visit::Delete;
                    }

                    let mut out = Vec::with_capacity(live.len());
                    for (i, (target, playable, index)) in live.into_iter().enumerate() {
                        let kind = BehaviourKind::LayerControl(control.retargeted(playable, index));
                        if i == 0 {
                            out.push(Behaviour::new(behaviour.id, kind));
                            report.rewritten += 1;
                        } else {
                            let id = ids.alloc_behaviour();
                            tracker.split_off(behaviour.id, target, id);
                            out.push(Behaviour::new(id, kind));
                            report.appended += 1;
                        }
                    }
                    if out.len() == 1 {
                        Visit::Rewrite(out.remove(0).kind)
                    } else {
                        Visit::Replace(out)
                    }
                });
            }
        }

        log::debug!(
            "reindexed layer controls: {} rewritten, {} appended, {} deleted, {} dangling",
            report.rewritten,
            report.appended,
            report.deleted,
            report.dangling
        );
        report
    }
}
