//! Parameter data flow between layers.
//!
//! A layer *reads* a parameter through transition conditions and blend trees, and
//! *drives* one when a clip carries a float curve bound to the root animator under
//! the parameter's name.

use std::collections::BTreeSet;

use hashbrown::HashSet;

use crate::graph::{Controller, Layer};
use crate::ids::StateMachineId;

/// Parameters read by `layers`. Computed on demand, never stored.
pub fn parameters_read<'a>(layers: impl IntoIterator<Item = &'a Layer>) -> BTreeSet<String> {
    let mut out = Vec::new();
    for layer in layers {
        for state in &layer.state_machine.states {
            for transition in &state.transitions {
                out.extend(transition.conditions.iter().map(|c| c.parameter.clone()));
            }
            if let Some(motion) = &state.motion {
                motion.collect_parameters(&mut out);
            }
        }
    }
    out.into_iter().collect()
}

/// Parameters a layer drives from its clips.
pub fn parameters_driven(layer: &Layer) -> BTreeSet<String> {
    layer
        .state_machine
        .clips()
        .into_iter()
        .flat_map(|clip| clip.float_bindings())
        .filter_map(|binding| binding.driven_parameter())
        .map(str::to_string)
        .collect()
}

pub fn drives_any(layer: &Layer, params: &BTreeSet<String>) -> bool {
    layer
        .state_machine
        .clips()
        .into_iter()
        .flat_map(|clip| clip.float_bindings())
        .filter_map(|binding| binding.driven_parameter())
        .any(|p| params.contains(p))
}

/// Grow `keep` until it contains every layer of `controller` that drives a parameter
/// read by a kept layer.
///
/// Monotone: a pass either adds at least one layer or stops, so this terminates
/// within `controller.len()` passes. Returns the number of passes taken.
pub fn retain_parameter_drivers(controller: &Controller, keep: &mut HashSet<StateMachineId>) -> usize {
    let mut iterations = 0;
    loop {
        iterations += 1;
        let kept: Vec<&Layer> = controller
            .layers()
            .iter()
            .filter(|l| keep.contains(&l.id()))
            .collect();
        let used = parameters_read(kept.iter().copied());
        let drivers: Vec<StateMachineId> = controller
            .layers()
            .iter()
            .filter(|l| drives_any(l, &used))
            .map(Layer::id)
            .collect();
        let before = keep.len();
        keep.extend(drivers);
        if keep.len() == before {
            return iterations;
        }
    }
}
