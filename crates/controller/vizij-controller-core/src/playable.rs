//! Lowers whole-controller blends into owner-scoped layer blends.
//!
//! When several features share a controller, a playable control from one of them
//! would also fade the layers of the others. Such controls are replaced with one
//! layer control per layer the same owner contributed to the target controller.

use std::collections::BTreeSet;

use hashbrown::HashMap;

use crate::behaviour::{Behaviour, BehaviourKind, LayerControl, PlayableControl, Visit};
use crate::graph::ControllerGraph;
use crate::ids::{IdAllocator, StateMachineId};
use crate::kinds::{BlendableLayer, ControllerKind};
use crate::ownership::OwnershipIndex;
use crate::references::ReferenceTracker;

pub const FORCE_ENABLE_LAYER_NAME: &str = "Force Enable";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PlayableRewriteReport {
    pub kept: usize,
    pub deleted: usize,
    /// Playable controls replaced by owner-scoped layer controls.
    pub lowered: usize,
    pub layer_controls_added: usize,
    pub unknown_target: usize,
    pub action_force_enabled: bool,
}

#[derive(Debug, Default)]
pub struct PlayableControlRewriter;

impl PlayableControlRewriter {
    pub fn run(
        graph: &mut ControllerGraph,
        owners: &OwnershipIndex,
        tracker: &mut ReferenceTracker,
        ids: &mut IdAllocator,
    ) -> PlayableRewriteReport {
        let mut report = PlayableRewriteReport::default();

        let owners_by_controller: HashMap<ControllerKind, BTreeSet<String>> = graph
            .controllers()
            .map(|c| (c.kind, owners.unique_owners(c)))
            .collect();
        let mut layers_by_owner: HashMap<(ControllerKind, String), Vec<StateMachineId>> =
            HashMap::new();
        for controller in graph.controllers() {
            for layer in controller.layers() {
                if let Some(owner) = owners.owner_of(layer.id()) {
                    layers_by_owner
                        .entry((controller.kind, owner.to_string()))
                        .or_default()
                        .push(layer.id());
                }
            }
        }

        for controller in graph.controllers_mut() {
            for layer in controller.layers_mut() {
                let layer_owner = owners.owner_of(layer.id()).map(str::to_string);
                layer.rewrite_behaviours(|behaviour| {
                    let BehaviourKind::PlayableControl(playable) = &behaviour.kind else {
                        return Visit::Keep;
                    };
                    let drives = playable.layer.controller_kind();
                    let Some(owners_on_target) = owners_by_controller.get(&drives) else {
                        log::warn!(
                            "playable control on {} drives {drives}, which this avatar doesn't have; leaving it alone",
                            behaviour.id
                        );
                        report.unknown_target += 1;
                        return Visit::Keep;
                    };
                    let Some(owner) = layer_owner.as_deref().filter(|o| owners_on_target.contains(*o)) else {
                        report.deleted += 1;
                        return Visit::Delete;
                    };
                    if owners_on_target.len() == 1 {
                        report.kept += 1;
                        return Visit::Keep;
                    }

                    let targets = layers_by_owner
                        .get(&(drives, owner.to_string()))
                        .cloned()
                        .unwrap_or_default();
                    let replacements: Vec<Behaviour> = targets
                        .into_iter()
                        .map(|target| {
                            let id = ids.alloc_behaviour();
                            tracker.register(id, target);
                            Behaviour::new(id, lowered_control(playable))
                        })
                        .collect();
                    report.lowered += 1;
                    report.layer_controls_added += replacements.len();
                    Visit::Replace(replacements)
                });
            }
        }

        let action_shared = owners_by_controller
            .get(&ControllerKind::Action)
            .map(|o| o.len() > 1)
            .unwrap_or(false);
        if action_shared {
            if let Some(action) = graph.controller_mut(ControllerKind::Action) {
                // Layer 0's weight can't be changed, so nothing may live there.
                action.ensure_empty_base_layer(ids);
                let enable = action.new_layer(FORCE_ENABLE_LAYER_NAME, ids);
                let id = ids.alloc_behaviour();
                enable.new_state("Enable").add_behaviour(
                    id,
                    BehaviourKind::PlayableControl(PlayableControl {
                        layer: BlendableLayer::Action,
                        goal_weight: 1.0,
                        debug_label: String::new(),
                    }),
                );
                for layer in action.layers_mut().iter_mut().skip(1) {
                    layer.weight = 0.0;
                }
                report.action_force_enabled = true;
            }
        }

        log::debug!(
            "playable controls: {} kept, {} deleted, {} lowered into {} layer controls",
            report.kept,
            report.deleted,
            report.lowered,
            report.layer_controls_added
        );
        report
    }
}

/// Layer index is a placeholder; the reindexer fills in the real coordinates.
fn lowered_control(playable: &PlayableControl) -> BehaviourKind {
    BehaviourKind::LayerControl(LayerControl {
        playable: playable.layer,
        layer: 0,
        goal_weight: playable.goal_weight,
        blend_duration: 0.0,
        debug_label: playable.debug_label.clone(),
    })
}
