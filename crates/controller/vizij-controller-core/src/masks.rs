//! Final mask cleanup once Gesture and FX have been split apart.

use crate::graph::{ControllerGraph, Mask};
use crate::ids::IdAllocator;
use crate::kinds::{BodyPart, ControllerKind};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MaskFixReport {
    /// FX masks dropped because they restricted nothing.
    pub cleared: usize,
}

/// Gesture base mask: fingers only, every transform allowed.
pub fn gesture_base_mask() -> Mask {
    let mut mask = Mask::empty();
    mask.set_body_part_active(BodyPart::LeftFingers, true);
    mask.set_body_part_active(BodyPart::RightFingers, true);
    mask.allow_all_transforms();
    mask
}

pub fn fix_masks(graph: &mut ControllerGraph, ids: &mut IdAllocator) -> MaskFixReport {
    let mut report = MaskFixReport::default();

    let fx = graph.controller_or_insert(ControllerKind::Fx);
    for layer in fx.layers_mut() {
        if layer.mask.as_ref().is_some_and(Mask::allows_all_transforms) {
            layer.mask = None;
            report.cleared += 1;
        }
    }
    fx.ensure_empty_base_layer(ids).mask = None;

    graph
        .controller_or_insert(ControllerKind::Gesture)
        .ensure_empty_base_layer(ids)
        .mask = Some(gesture_base_mask());

    log::debug!("fix masks: cleared {} redundant FX masks", report.cleared);
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::TransformToggle;

    #[test]
    fn clears_redundant_fx_masks_and_sets_finger_mask() {
        let mut ids = IdAllocator::new();
        let mut graph = ControllerGraph::new();
        let fx = graph.controller_or_insert(ControllerKind::Fx);
        fx.ensure_empty_base_layer(&mut ids);
        let open = fx.new_layer("open", &mut ids);
        open.new_state("On");
        open.mask = Some(Mask::empty());
        let closed = fx.new_layer("closed", &mut ids);
        closed.new_state("On");
        let mut restrictive = Mask::default();
        restrictive.transforms.push(TransformToggle {
            path: "Hat".into(),
            active: false,
        });
        closed.mask = Some(restrictive);

        let report = fix_masks(&mut graph, &mut ids);
        assert_eq!(report.cleared, 1);

        let fx = graph.controller(ControllerKind::Fx).unwrap();
        assert!(fx.layers()[0].mask.is_none());
        assert!(fx.layers()[1].mask.is_none());
        assert!(fx.layers()[2].mask.is_some());

        let gesture = graph.controller(ControllerKind::Gesture).unwrap();
        let mask = gesture.layers()[0].mask.as_ref().unwrap();
        assert!(mask.is_body_part_active(BodyPart::LeftFingers));
        assert!(mask.is_body_part_active(BodyPart::RightFingers));
        assert!(!mask.is_body_part_active(BodyPart::Head));
        assert!(mask.allows_all_transforms());
    }
}
