//! State-machine behaviours and the visitor result used to rewrite them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ids::BehaviourId;
use crate::kinds::{BlendableLayer, TrackingChannel, TrackingMode};

/// A behaviour instance attached to a state machine or one of its states.
///
/// `id` is the identity references are tracked by; editing `kind` in place keeps it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Behaviour {
    #[serde(skip)]
    pub id: BehaviourId,
    #[serde(flatten)]
    pub kind: BehaviourKind,
}

impl Behaviour {
    pub fn new(id: BehaviourId, kind: BehaviourKind) -> Self {
        Self { id, kind }
    }

    pub fn as_layer_control(&self) -> Option<&LayerControl> {
        match &self.kind {
            BehaviourKind::LayerControl(control) => Some(control),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BehaviourKind {
    LayerControl(LayerControl),
    PlayableControl(PlayableControl),
    TrackingControl(TrackingControl),
    LocomotionControl { enabled: bool },
    PoseSpaceControl { enabled: bool },
}

/// Blends the weight of one layer of one controller.
///
/// `(playable, layer)` is a projection of the tracked target and is recomputed by
/// the reindexer; it is only authoritative when the host first hands the graph over.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayerControl {
    pub playable: BlendableLayer,
    pub layer: i32,
    pub goal_weight: f32,
    #[serde(default)]
    pub blend_duration: f32,
    #[serde(default)]
    pub debug_label: String,
}

impl LayerControl {
    /// Same non-positional fields, new coordinates.
    pub fn retargeted(&self, playable: BlendableLayer, layer: usize) -> LayerControl {
        LayerControl {
            playable,
            layer: layer as i32,
            goal_weight: self.goal_weight,
            blend_duration: self.blend_duration,
            debug_label: self.debug_label.clone(),
        }
    }
}

/// Blends the weight of an entire controller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayableControl {
    pub layer: BlendableLayer,
    pub goal_weight: f32,
    #[serde(default)]
    pub debug_label: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackingControl {
    #[serde(default)]
    pub per_body_part: BTreeMap<TrackingChannel, TrackingMode>,
}

impl TrackingControl {
    pub fn mode(&self, channel: TrackingChannel) -> TrackingMode {
        self.per_body_part.get(&channel).copied().unwrap_or_default()
    }
}

/// What a behaviour visitor wants done with the behaviour it was shown.
#[derive(Clone, Debug, PartialEq)]
pub enum Visit {
    Keep,
    /// Replace the fields, keep the identity.
    Rewrite(BehaviourKind),
    /// Substitute these behaviours at the same position. A listed behaviour may
    /// reuse the visited id to stay the same instance while siblings are appended.
    Replace(Vec<Behaviour>),
    Delete,
}

/// Apply `visit` to every behaviour of `list`, in order.
pub(crate) fn rewrite_list(list: &mut Vec<Behaviour>, visit: &mut impl FnMut(&Behaviour) -> Visit) {
    let mut out = Vec::with_capacity(list.len());
    for behaviour in list.drain(..) {
        match visit(&behaviour) {
            Visit::Keep => out.push(behaviour),
            Visit::Rewrite(kind) => out.push(Behaviour {
                id: behaviour.id,
                kind,
            }),
            Visit::Replace(replacements) => out.extend(replacements),
            Visit::Delete => {}
        }
    }
    *list = out;
}
