//! Passes every build runs. Each wraps one core component and files its report.

use anyhow::Result;

use vizij_controller_core::{
    apply_scale_compensation, collect_owners, fix_masks, ConflictDetector, ControllerKind,
    ControllerMerger, OffsetReindexer, PlayableControlRewriter, RestPhase,
};

use super::BuildPass;
use crate::context::BuildContext;
use crate::order::FeatureOrder;

pub fn builtin_passes() -> Vec<Box<dyn BuildPass>> {
    vec![
        Box::new(RecordControllerSet),
        Box::new(ApplyRestState(RestPhase::ForceObjectState)),
        Box::new(ApplyRestState(RestPhase::Toggles)),
        Box::new(ApplyRestState(RestPhase::RestPose)),
        Box::new(ScaleCompensation),
        Box::new(ControllerConflictCheck),
        Box::new(FixGestureFxConflict),
        Box::new(PlayableLayerControlRewrite),
        Box::new(BehaviourOwnerCollect),
        Box::new(FixMasks),
        Box::new(LayerControlFix),
    ]
}

/// Records every layer control against the layer it currently points at.
pub struct RecordControllerSet;

impl BuildPass for RecordControllerSet {
    fn feature(&self) -> &str {
        "Record Controller Set"
    }

    fn order(&self) -> FeatureOrder {
        FeatureOrder::RecordLayerControls
    }

    fn run(&mut self, cx: &mut BuildContext<'_>) -> Result<()> {
        cx.report.recorded_references = cx.tracker.record_controller_set(&cx.graph);
        Ok(())
    }
}

pub struct ApplyRestState(pub RestPhase);

impl BuildPass for ApplyRestState {
    fn feature(&self) -> &str {
        "Apply Rest State"
    }

    fn order(&self) -> FeatureOrder {
        match self.0 {
            RestPhase::ForceObjectState => FeatureOrder::ApplyRestState1,
            RestPhase::Toggles => FeatureOrder::ApplyRestState2,
            RestPhase::RestPose => FeatureOrder::ApplyRestState3,
        }
    }

    fn run(&mut self, cx: &mut BuildContext<'_>) -> Result<()> {
        let report = cx
            .resting
            .apply_phase(self.0, &mut *cx.scene, &mut *cx.materials)?;
        cx.report.resting.push((self.0, report));
        Ok(())
    }
}

pub struct ScaleCompensation;

impl BuildPass for ScaleCompensation {
    fn feature(&self) -> &str {
        "Scale Compensation"
    }

    fn order(&self) -> FeatureOrder {
        FeatureOrder::ScaleCompensation
    }

    fn run(&mut self, cx: &mut BuildContext<'_>) -> Result<()> {
        if !cx.config.scale_compensation {
            return Ok(());
        }
        let report = apply_scale_compensation(
            &mut cx.graph,
            &mut cx.ids,
            &mut *cx.scene,
            &mut *cx.materials,
        )?;
        if let Some(layer) = report.layer {
            cx.owners.record(layer, self.feature());
        }
        cx.report.scale = Some(report);
        Ok(())
    }
}

pub struct ControllerConflictCheck;

impl BuildPass for ControllerConflictCheck {
    fn feature(&self) -> &str {
        "Controller Conflict Check"
    }

    fn order(&self) -> FeatureOrder {
        FeatureOrder::ControllerConflictCheck
    }

    fn run(&mut self, cx: &mut BuildContext<'_>) -> Result<()> {
        ConflictDetector::new(&cx.config.single_owner_kinds).check(&cx.graph, &cx.owners)?;
        Ok(())
    }
}

pub struct FixGestureFxConflict;

impl BuildPass for FixGestureFxConflict {
    fn feature(&self) -> &str {
        "Fix Gesture FX Conflict"
    }

    fn order(&self) -> FeatureOrder {
        FeatureOrder::FixGestureFxConflict
    }

    fn run(&mut self, cx: &mut BuildContext<'_>) -> Result<()> {
        if !cx.config.merge_gesture_into_fx {
            return Ok(());
        }
        if cx
            .graph
            .controller(ControllerKind::Gesture)
            .map_or(true, |g| g.is_empty())
        {
            log::debug!("no gesture layers; skipping gesture/fx merge");
            return Ok(());
        }
        let report = ControllerMerger::default().merge(
            &mut cx.graph,
            &mut cx.owners,
            &mut cx.tracker,
            &mut cx.ids,
        )?;
        cx.report.merge = Some(report);
        Ok(())
    }
}

pub struct PlayableLayerControlRewrite;

impl BuildPass for PlayableLayerControlRewrite {
    fn feature(&self) -> &str {
        "Playable Layer Control Rewrite"
    }

    fn order(&self) -> FeatureOrder {
        FeatureOrder::PlayableLayerControlRewrite
    }

    fn run(&mut self, cx: &mut BuildContext<'_>) -> Result<()> {
        let report =
            PlayableControlRewriter::run(&mut cx.graph, &cx.owners, &mut cx.tracker, &mut cx.ids);
        cx.report.playable = Some(report);
        Ok(())
    }
}

pub struct BehaviourOwnerCollect;

impl BuildPass for BehaviourOwnerCollect {
    fn feature(&self) -> &str {
        "Behaviour Owner Collect"
    }

    fn order(&self) -> FeatureOrder {
        FeatureOrder::BehaviourOwnerCollect
    }

    fn run(&mut self, cx: &mut BuildContext<'_>) -> Result<()> {
        cx.report.owner_collection = Some(collect_owners(&cx.graph, &cx.owners));
        Ok(())
    }
}

pub struct FixMasks;

impl BuildPass for FixMasks {
    fn feature(&self) -> &str {
        "Fix Masks"
    }

    fn order(&self) -> FeatureOrder {
        FeatureOrder::FixMasks
    }

    fn run(&mut self, cx: &mut BuildContext<'_>) -> Result<()> {
        if cx.config.fix_masks {
            cx.report.masks = Some(fix_masks(&mut cx.graph, &mut cx.ids));
        }
        Ok(())
    }
}

/// Projects tracked references back onto indices once the structure is final.
pub struct LayerControlFix;

impl BuildPass for LayerControlFix {
    fn feature(&self) -> &str {
        "Layer Control Fix"
    }

    fn order(&self) -> FeatureOrder {
        FeatureOrder::LayerControlFix
    }

    fn run(&mut self, cx: &mut BuildContext<'_>) -> Result<()> {
        cx.report.reindex = Some(OffsetReindexer::run(
            &mut cx.graph,
            &mut cx.tracker,
            &mut cx.ids,
        ));
        Ok(())
    }
}
