//! Which features toggle avatar-wide switches (locomotion, pose space, tracking).
//!
//! Two features flipping the same switch can fight at runtime. Nothing here
//! resolves that; the collection is reported so a host can surface it.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::behaviour::BehaviourKind;
use crate::graph::ControllerGraph;
use crate::kinds::{TrackingChannel, TrackingMode};
use crate::ownership::OwnershipIndex;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum OnOffChannel {
    Locomotion,
    PoseSpace,
    Tracking(TrackingChannel),
}

impl fmt::Display for OnOffChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OnOffChannel::Locomotion => f.write_str("locomotion"),
            OnOffChannel::PoseSpace => f.write_str("pose space"),
            OnOffChannel::Tracking(channel) => write!(f, "tracking {channel:?}"),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OwnerCollection {
    pub channels: BTreeMap<OnOffChannel, BTreeSet<String>>,
}

impl OwnerCollection {
    pub fn owners(&self, channel: OnOffChannel) -> Option<&BTreeSet<String>> {
        self.channels.get(&channel)
    }

    /// Channels set by more than one owner.
    pub fn contested(&self) -> impl Iterator<Item = (OnOffChannel, &BTreeSet<String>)> + '_ {
        self.channels
            .iter()
            .filter(|(_, owners)| owners.len() > 1)
            .map(|(channel, owners)| (*channel, owners))
    }

    fn add(&mut self, channel: OnOffChannel, owner: &str) {
        self.channels.entry(channel).or_default().insert(owner.to_string());
    }
}

/// Behaviours on layers without a recorded owner are not attributed.
pub fn collect_owners(graph: &ControllerGraph, owners: &OwnershipIndex) -> OwnerCollection {
    let mut out = OwnerCollection::default();
    for controller in graph.controllers() {
        for layer in controller.layers() {
            let Some(owner) = owners.owner_of(layer.id()) else {
                continue;
            };
            for behaviour in layer.behaviours() {
                match &behaviour.kind {
                    BehaviourKind::TrackingControl(control) => {
                        for channel in TrackingChannel::ALL {
                            if control.mode(channel) != TrackingMode::NoChange {
                                out.add(OnOffChannel::Tracking(channel), owner);
                            }
                        }
                    }
                    BehaviourKind::LocomotionControl { .. } => out.add(OnOffChannel::Locomotion, owner),
                    BehaviourKind::PoseSpaceControl { .. } => out.add(OnOffChannel::PoseSpace, owner),
                    BehaviourKind::LayerControl(_) | BehaviourKind::PlayableControl(_) => {}
                }
            }
        }
    }
    for (channel, owners) in out.contested() {
        log::warn!(
            "{channel} is switched by more than one feature: {}",
            owners.iter().cloned().collect::<Vec<_>>().join(", ")
        );
    }
    out
}
