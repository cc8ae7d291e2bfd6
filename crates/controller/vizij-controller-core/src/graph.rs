//! In-memory controller graph: controllers, their ordered layers, and each layer's
//! state machine with its states, transitions, motions and behaviours.
//!
//! Layer order is significant (earlier layers are evaluated first). A layer is
//! identified by its state machine's [`StateMachineId`], never by its index.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::behaviour::{rewrite_list, Behaviour, BehaviourKind, Visit};
use crate::clip::Clip;
use crate::error::{BuildError, BuildResult};
use crate::ids::{BehaviourId, IdAllocator, StateMachineId};
use crate::kinds::{BodyPart, ControllerKind};

/// Name given to placeholder layers inserted at index 0.
pub const BASE_PLACEHOLDER_NAME: &str = "Base Mask";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ControllerGraph {
    #[serde(default)]
    controllers: Vec<Controller>,
}

impl ControllerGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a host graph from JSON and give every state machine and behaviour a fresh id.
    pub fn parse_json(s: &str, ids: &mut IdAllocator) -> BuildResult<Self> {
        let mut graph: ControllerGraph =
            serde_json::from_str(s).map_err(|e| BuildError::GraphJson(e.to_string()))?;
        let mut seen = Vec::new();
        for c in &graph.controllers {
            if seen.contains(&c.kind) {
                return Err(BuildError::GraphJson(format!("duplicate controller {}", c.kind)));
            }
            seen.push(c.kind);
        }
        graph.adopt_ids(ids);
        Ok(graph)
    }

    pub fn to_json(&self) -> BuildResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| BuildError::GraphJson(e.to_string()))
    }

    /// Assign ids to anything still carrying the unassigned default.
    pub fn adopt_ids(&mut self, ids: &mut IdAllocator) {
        for controller in &mut self.controllers {
            for layer in &mut controller.layers {
                layer.state_machine.adopt_ids(ids);
            }
        }
    }

    /// Advance `ids` past every id this graph already carries.
    pub fn reserve_ids(&self, ids: &mut IdAllocator) {
        for layer in self.controllers.iter().flat_map(|c| c.layers.iter()) {
            ids.observe_state_machine(layer.id());
            for behaviour in layer.behaviours() {
                ids.observe_behaviour(behaviour.id);
            }
        }
    }

    pub fn controllers(&self) -> impl Iterator<Item = &Controller> {
        self.controllers.iter()
    }

    pub fn controllers_mut(&mut self) -> impl Iterator<Item = &mut Controller> {
        self.controllers.iter_mut()
    }

    pub fn kinds(&self) -> Vec<ControllerKind> {
        self.controllers.iter().map(|c| c.kind).collect()
    }

    pub fn controller(&self, kind: ControllerKind) -> Option<&Controller> {
        self.controllers.iter().find(|c| c.kind == kind)
    }

    pub fn controller_mut(&mut self, kind: ControllerKind) -> Option<&mut Controller> {
        self.controllers.iter_mut().find(|c| c.kind == kind)
    }

    pub fn controller_or_insert(&mut self, kind: ControllerKind) -> &mut Controller {
        let index = match self.controllers.iter().position(|c| c.kind == kind) {
            Some(i) => i,
            None => {
                self.controllers.push(Controller::new(kind));
                self.controllers.len() - 1
            }
        };
        &mut self.controllers[index]
    }

    /// Add a whole controller, replacing any existing one of the same kind.
    pub fn insert_controller(&mut self, controller: Controller) -> Option<Controller> {
        match self.controllers.iter().position(|c| c.kind == controller.kind) {
            Some(i) => Some(std::mem::replace(&mut self.controllers[i], controller)),
            None => {
                self.controllers.push(controller);
                None
            }
        }
    }

    /// Mutable access to two distinct controllers at once.
    pub fn pair_mut(
        &mut self,
        a: ControllerKind,
        b: ControllerKind,
    ) -> Option<(&mut Controller, &mut Controller)> {
        if a == b {
            return None;
        }
        let ia = self.controllers.iter().position(|c| c.kind == a)?;
        let ib = self.controllers.iter().position(|c| c.kind == b)?;
        if ia < ib {
            let (left, right) = self.controllers.split_at_mut(ib);
            Some((&mut left[ia], &mut right[0]))
        } else {
            let (left, right) = self.controllers.split_at_mut(ia);
            Some((&mut right[0], &mut left[ib]))
        }
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum ParameterKind {
    #[default]
    Float,
    Int,
    Bool,
    Trigger,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(default)]
    pub kind: ParameterKind,
    #[serde(default)]
    pub default: f32,
}

/// Emitted for every identity duplicated by [`Controller::deep_copy`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Copied {
    StateMachine {
        original: StateMachineId,
        copy: StateMachineId,
    },
    Behaviour {
        original: BehaviourId,
        copy: BehaviourId,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Controller {
    pub kind: ControllerKind,
    #[serde(default)]
    layers: Vec<Layer>,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
}

impl Controller {
    pub fn new(kind: ControllerKind) -> Self {
        Self {
            kind,
            layers: Vec::new(),
            parameters: Vec::new(),
        }
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layers_mut(&mut self) -> &mut [Layer] {
        &mut self.layers
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn layer(&self, index: usize) -> Option<&Layer> {
        self.layers.get(index)
    }

    pub fn layer_by_id(&self, id: StateMachineId) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id() == id)
    }

    pub fn layer_by_id_mut(&mut self, id: StateMachineId) -> Option<&mut Layer> {
        self.layers.iter_mut().find(|l| l.id() == id)
    }

    pub fn layer_index(&self, id: StateMachineId) -> Option<usize> {
        self.layers.iter().position(|l| l.id() == id)
    }

    /// Append a fresh layer on top of the stack.
    pub fn new_layer(&mut self, name: impl Into<String>, ids: &mut IdAllocator) -> &mut Layer {
        self.layers.push(Layer::new(name, ids));
        let last = self.layers.len() - 1;
        &mut self.layers[last]
    }

    pub fn push_layer(&mut self, layer: Layer) {
        self.layers.push(layer);
    }

    pub fn insert_layer(&mut self, index: usize, layer: Layer) {
        let index = index.min(self.layers.len());
        self.layers.insert(index, layer);
    }

    pub fn remove_layer(&mut self, id: StateMachineId) -> Option<Layer> {
        let index = self.layer_index(id)?;
        Some(self.layers.remove(index))
    }

    pub fn retain_layers(&mut self, keep: impl FnMut(&Layer) -> bool) {
        self.layers.retain(keep);
    }

    pub fn take_layers(&mut self) -> Vec<Layer> {
        std::mem::take(&mut self.layers)
    }

    /// Return layer 0 if it is already an empty placeholder, otherwise insert one there.
    ///
    /// Index 0 of a controller always runs at full weight, so anything that needs to
    /// drive the weight of its "first" layer needs that layer moved off index 0.
    pub fn ensure_empty_base_layer(&mut self, ids: &mut IdAllocator) -> &mut Layer {
        let has_placeholder = self.layers.first().map(Layer::is_empty).unwrap_or(false);
        if !has_placeholder {
            self.layers.insert(0, Layer::new(BASE_PLACEHOLDER_NAME, ids));
        }
        &mut self.layers[0]
    }

    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Add a parameter unless one with the same name exists.
    pub fn add_parameter(&mut self, parameter: Parameter) {
        if self.parameter(&parameter.name).is_none() {
            self.parameters.push(parameter);
        }
    }

    /// Declare a float parameter and return its name.
    pub fn new_float(&mut self, name: impl Into<String>, default: f32) -> String {
        let name = name.into();
        self.add_parameter(Parameter {
            name: name.clone(),
            kind: ParameterKind::Float,
            default,
        });
        name
    }

    pub fn clips(&self) -> Vec<&Clip> {
        self.layers.iter().flat_map(|l| l.state_machine.clips()).collect()
    }

    pub fn for_each_clip_mut(&mut self, mut f: impl FnMut(&mut Clip)) {
        for layer in &mut self.layers {
            layer.state_machine.for_each_clip_mut(&mut f);
        }
    }

    /// Duplicate the controller, giving every state machine and behaviour a new id.
    /// `on_copy` observes each duplicated identity so trackers can follow the copy.
    pub fn deep_copy(
        &self,
        kind: ControllerKind,
        ids: &mut IdAllocator,
        mut on_copy: impl FnMut(Copied),
    ) -> Controller {
        let mut copy = self.clone();
        copy.kind = kind;
        for layer in &mut copy.layers {
            let original = layer.state_machine.id;
            layer.state_machine.id = ids.alloc_state_machine();
            on_copy(Copied::StateMachine {
                original,
                copy: layer.state_machine.id,
            });
            layer.state_machine.for_each_behaviour_mut(|b| {
                let original = b.id;
                b.id = ids.alloc_behaviour();
                on_copy(Copied::Behaviour {
                    original,
                    copy: b.id,
                });
            });
        }
        copy
    }
}

fn default_weight() -> f32 {
    1.0
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub name: String,
    #[serde(default = "default_weight")]
    pub weight: f32,
    #[serde(default)]
    pub mask: Option<Mask>,
    #[serde(default)]
    pub state_machine: StateMachine,
}

impl Layer {
    pub fn new(name: impl Into<String>, ids: &mut IdAllocator) -> Self {
        Self {
            name: name.into(),
            weight: 1.0,
            mask: None,
            state_machine: StateMachine::new(ids.alloc_state_machine()),
        }
    }

    #[inline]
    pub fn id(&self) -> StateMachineId {
        self.state_machine.id
    }

    /// Layers without a default state do nothing at runtime (masks, junk).
    pub fn has_default_state(&self) -> bool {
        self.state_machine.default_state.is_some()
    }

    /// No states and no behaviours: a pure placeholder.
    pub fn is_empty(&self) -> bool {
        self.state_machine.states.is_empty() && self.state_machine.behaviours.is_empty()
    }

    /// Add a state; the first state added becomes the default.
    pub fn new_state(&mut self, name: impl Into<String>) -> &mut State {
        self.state_machine.new_state(name)
    }

    pub fn behaviours(&self) -> impl Iterator<Item = &Behaviour> {
        self.state_machine.behaviours()
    }

    pub fn rewrite_behaviours(&mut self, visit: impl FnMut(&Behaviour) -> Visit) {
        self.state_machine.rewrite_behaviours(visit);
    }

    pub fn strip_behaviours(&mut self) {
        self.state_machine.rewrite_behaviours(|_| Visit::Delete);
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StateMachine {
    #[serde(skip)]
    pub id: StateMachineId,
    /// Name of the default state.
    #[serde(default)]
    pub default_state: Option<String>,
    #[serde(default)]
    pub states: Vec<State>,
    /// Behaviours attached to the machine itself rather than a state.
    #[serde(default)]
    pub behaviours: Vec<Behaviour>,
}

impl StateMachine {
    pub fn new(id: StateMachineId) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    fn adopt_ids(&mut self, ids: &mut IdAllocator) {
        if self.id == StateMachineId::default() {
            self.id = ids.alloc_state_machine();
        }
        self.for_each_behaviour_mut(|b| {
            if b.id == BehaviourId::default() {
                b.id = ids.alloc_behaviour();
            }
        });
    }

    pub fn new_state(&mut self, name: impl Into<String>) -> &mut State {
        let name = name.into();
        if self.default_state.is_none() {
            self.default_state = Some(name.clone());
        }
        self.states.push(State::new(name));
        let last = self.states.len() - 1;
        &mut self.states[last]
    }

    pub fn state(&self, name: &str) -> Option<&State> {
        self.states.iter().find(|s| s.name == name)
    }

    /// Machine-level behaviours first, then each state's in state order.
    pub fn behaviours(&self) -> impl Iterator<Item = &Behaviour> {
        self.behaviours
            .iter()
            .chain(self.states.iter().flat_map(|s| s.behaviours.iter()))
    }

    pub fn rewrite_behaviours(&mut self, mut visit: impl FnMut(&Behaviour) -> Visit) {
        rewrite_list(&mut self.behaviours, &mut visit);
        for state in &mut self.states {
            rewrite_list(&mut state.behaviours, &mut visit);
        }
    }

    fn for_each_behaviour_mut(&mut self, mut f: impl FnMut(&mut Behaviour)) {
        for b in &mut self.behaviours {
            f(b);
        }
        for state in &mut self.states {
            for b in &mut state.behaviours {
                f(b);
            }
        }
    }

    pub fn motions(&self) -> impl Iterator<Item = &Motion> {
        self.states.iter().filter_map(|s| s.motion.as_ref())
    }

    pub fn clips(&self) -> Vec<&Clip> {
        let mut out = Vec::new();
        for motion in self.motions() {
            motion.collect_clips(&mut out);
        }
        out
    }

    pub fn for_each_clip_mut(&mut self, f: &mut impl FnMut(&mut Clip)) {
        for state in &mut self.states {
            if let Some(motion) = &mut state.motion {
                motion.for_each_clip_mut(f);
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct State {
    pub name: String,
    #[serde(default)]
    pub motion: Option<Motion>,
    #[serde(default)]
    pub behaviours: Vec<Behaviour>,
    #[serde(default)]
    pub transitions: Vec<Transition>,
}

impl State {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            motion: None,
            behaviours: Vec::new(),
            transitions: Vec::new(),
        }
    }

    pub fn with_motion(&mut self, motion: Motion) -> &mut Self {
        self.motion = Some(motion);
        self
    }

    pub fn add_behaviour(&mut self, id: BehaviourId, kind: BehaviourKind) -> &mut Self {
        self.behaviours.push(Behaviour::new(id, kind));
        self
    }

    pub fn add_transition(&mut self, transition: Transition) -> &mut Self {
        self.transitions.push(transition);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    /// Destination state name; `None` exits the machine.
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum ConditionMode {
    If,
    IfNot,
    Greater,
    Less,
    Equals,
    NotEqual,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub parameter: String,
    pub mode: ConditionMode,
    #[serde(default)]
    pub threshold: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Motion {
    Clip(Clip),
    BlendTree(BlendTree),
}

impl Motion {
    fn collect_clips<'a>(&'a self, out: &mut Vec<&'a Clip>) {
        match self {
            Motion::Clip(clip) => out.push(clip),
            Motion::BlendTree(tree) => {
                for child in &tree.children {
                    child.motion.collect_clips(out);
                }
            }
        }
    }

    fn for_each_clip_mut(&mut self, f: &mut impl FnMut(&mut Clip)) {
        match self {
            Motion::Clip(clip) => f(clip),
            Motion::BlendTree(tree) => {
                for child in &mut tree.children {
                    child.motion.for_each_clip_mut(f);
                }
            }
        }
    }

    /// Parameters this motion reads (blend parameters and direct weights), recursively.
    pub fn collect_parameters(&self, out: &mut Vec<String>) {
        if let Motion::BlendTree(tree) = self {
            out.extend(tree.parameters.iter().cloned());
            for child in &tree.children {
                if let Some(p) = &child.direct_parameter {
                    out.push(p.clone());
                }
                child.motion.collect_parameters(out);
            }
        }
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum BlendTreeType {
    #[default]
    Simple1D,
    SimpleDirectional2D,
    FreeformDirectional2D,
    FreeformCartesian2D,
    Direct,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BlendTree {
    pub name: String,
    #[serde(default)]
    pub blend_type: BlendTreeType,
    /// Blend parameters (one for 1D, two for 2D, none for direct trees).
    #[serde(default)]
    pub parameters: Vec<String>,
    #[serde(default)]
    pub children: Vec<ChildMotion>,
}

impl BlendTree {
    pub fn direct(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            blend_type: BlendTreeType::Direct,
            ..Default::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChildMotion {
    pub motion: Motion,
    #[serde(default)]
    pub direct_parameter: Option<String>,
}

/// Avatar mask: which humanoid parts and which transforms a layer may animate.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Mask {
    #[serde(default)]
    pub body_parts: BTreeMap<BodyPart, bool>,
    /// Per-transform toggles. An empty list places no restriction on transforms.
    #[serde(default)]
    pub transforms: Vec<TransformToggle>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransformToggle {
    pub path: String,
    pub active: bool,
}

impl Mask {
    /// Every humanoid part disabled; transforms unrestricted.
    pub fn empty() -> Self {
        Self {
            body_parts: BodyPart::ALL.iter().map(|p| (*p, false)).collect(),
            transforms: Vec::new(),
        }
    }

    pub fn set_body_part_active(&mut self, part: BodyPart, active: bool) {
        self.body_parts.insert(part, active);
    }

    pub fn is_body_part_active(&self, part: BodyPart) -> bool {
        self.body_parts.get(&part).copied().unwrap_or(true)
    }

    pub fn allows_all_transforms(&self) -> bool {
        self.transforms.iter().all(|t| t.active)
    }

    pub fn allow_all_transforms(&mut self) {
        self.transforms.clear();
    }
}
