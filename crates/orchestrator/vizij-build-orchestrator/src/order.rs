use std::fmt;

use serde::{Deserialize, Serialize};

/// Total order of build passes. Passes run in variant order; passes sharing a
/// slot run in registration order.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum FeatureOrder {
    RecordLayerControls,
    /// Features queue clips that force objects on or off.
    ForceObjectState,
    ApplyRestState1,
    /// Where ordinary features add their layers.
    Default,
    ApplyRestState2,
    TogglesRestPose,
    ApplyRestState3,
    ScaleCompensation,
    ControllerConflictCheck,
    FixGestureFxConflict,
    PlayableLayerControlRewrite,
    BehaviourOwnerCollect,
    FixMasks,
    LayerControlFix,
}

impl FeatureOrder {
    pub const ALL: [FeatureOrder; 14] = [
        FeatureOrder::RecordLayerControls,
        FeatureOrder::ForceObjectState,
        FeatureOrder::ApplyRestState1,
        FeatureOrder::Default,
        FeatureOrder::ApplyRestState2,
        FeatureOrder::TogglesRestPose,
        FeatureOrder::ApplyRestState3,
        FeatureOrder::ScaleCompensation,
        FeatureOrder::ControllerConflictCheck,
        FeatureOrder::FixGestureFxConflict,
        FeatureOrder::PlayableLayerControlRewrite,
        FeatureOrder::BehaviourOwnerCollect,
        FeatureOrder::FixMasks,
        FeatureOrder::LayerControlFix,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FeatureOrder::RecordLayerControls => "record_layer_controls",
            FeatureOrder::ForceObjectState => "force_object_state",
            FeatureOrder::ApplyRestState1 => "apply_rest_state_1",
            FeatureOrder::Default => "default",
            FeatureOrder::ApplyRestState2 => "apply_rest_state_2",
            FeatureOrder::TogglesRestPose => "toggles_rest_pose",
            FeatureOrder::ApplyRestState3 => "apply_rest_state_3",
            FeatureOrder::ScaleCompensation => "scale_compensation",
            FeatureOrder::ControllerConflictCheck => "controller_conflict_check",
            FeatureOrder::FixGestureFxConflict => "fix_gesture_fx_conflict",
            FeatureOrder::PlayableLayerControlRewrite => "playable_layer_control_rewrite",
            FeatureOrder::BehaviourOwnerCollect => "behaviour_owner_collect",
            FeatureOrder::FixMasks => "fix_masks",
            FeatureOrder::LayerControlFix => "layer_control_fix",
        }
    }
}

impl fmt::Display for FeatureOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
