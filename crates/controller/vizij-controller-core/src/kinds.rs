//! Closed tag sets used across the graph: controller kinds, the blendable-layer
//! tags behaviours use to name a controller, mask body parts and tracking channels.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Playable layer slot a controller occupies on the avatar.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum ControllerKind {
    Base,
    Additive,
    Gesture,
    Action,
    #[serde(rename = "FX")]
    Fx,
    Sitting,
    TPose,
    IKPose,
}

impl ControllerKind {
    pub const ALL: [ControllerKind; 8] = [
        ControllerKind::Base,
        ControllerKind::Additive,
        ControllerKind::Gesture,
        ControllerKind::Action,
        ControllerKind::Fx,
        ControllerKind::Sitting,
        ControllerKind::TPose,
        ControllerKind::IKPose,
    ];

    /// The tag a layer-control behaviour uses to address this controller, if it
    /// can be addressed at all.
    pub fn blendable(self) -> Option<BlendableLayer> {
        match self {
            ControllerKind::Action => Some(BlendableLayer::Action),
            ControllerKind::Fx => Some(BlendableLayer::Fx),
            ControllerKind::Gesture => Some(BlendableLayer::Gesture),
            ControllerKind::Additive => Some(BlendableLayer::Additive),
            ControllerKind::Base
            | ControllerKind::Sitting
            | ControllerKind::TPose
            | ControllerKind::IKPose => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ControllerKind::Base => "Base",
            ControllerKind::Additive => "Additive",
            ControllerKind::Gesture => "Gesture",
            ControllerKind::Action => "Action",
            ControllerKind::Fx => "FX",
            ControllerKind::Sitting => "Sitting",
            ControllerKind::TPose => "TPose",
            ControllerKind::IKPose => "IKPose",
        }
    }
}

impl fmt::Display for ControllerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Controllers a layer-control or playable-control behaviour may target.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum BlendableLayer {
    Action,
    #[serde(rename = "FX")]
    Fx,
    Gesture,
    Additive,
}

impl BlendableLayer {
    pub fn controller_kind(self) -> ControllerKind {
        match self {
            BlendableLayer::Action => ControllerKind::Action,
            BlendableLayer::Fx => ControllerKind::Fx,
            BlendableLayer::Gesture => ControllerKind::Gesture,
            BlendableLayer::Additive => ControllerKind::Additive,
        }
    }
}

impl fmt::Display for BlendableLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.controller_kind().name())
    }
}

/// Humanoid body parts an avatar mask can enable.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum BodyPart {
    Root,
    Body,
    Head,
    LeftLeg,
    RightLeg,
    LeftArm,
    RightArm,
    LeftFingers,
    RightFingers,
    LeftFootIk,
    RightFootIk,
    LeftHandIk,
    RightHandIk,
}

impl BodyPart {
    pub const ALL: [BodyPart; 13] = [
        BodyPart::Root,
        BodyPart::Body,
        BodyPart::Head,
        BodyPart::LeftLeg,
        BodyPart::RightLeg,
        BodyPart::LeftArm,
        BodyPart::RightArm,
        BodyPart::LeftFingers,
        BodyPart::RightFingers,
        BodyPart::LeftFootIk,
        BodyPart::RightFootIk,
        BodyPart::LeftHandIk,
        BodyPart::RightHandIk,
    ];
}

/// Channels a tracking-control behaviour can switch between animation and tracking.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum TrackingChannel {
    Head,
    LeftHand,
    RightHand,
    Hip,
    LeftFoot,
    RightFoot,
    LeftFingers,
    RightFingers,
    Eyes,
    Mouth,
}

impl TrackingChannel {
    pub const ALL: [TrackingChannel; 10] = [
        TrackingChannel::Head,
        TrackingChannel::LeftHand,
        TrackingChannel::RightHand,
        TrackingChannel::Hip,
        TrackingChannel::LeftFoot,
        TrackingChannel::RightFoot,
        TrackingChannel::LeftFingers,
        TrackingChannel::RightFingers,
        TrackingChannel::Eyes,
        TrackingChannel::Mouth,
    ];
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum TrackingMode {
    #[default]
    NoChange,
    Tracking,
    Animation,
}
