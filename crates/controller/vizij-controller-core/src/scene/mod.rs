//! Host seams: the avatar's object hierarchy and its material assets.
//!
//! The pipeline never owns the scene. Adapters implement [`SceneTree`] and
//! [`MaterialService`] and pass them into a build; [`memory`] holds plain
//! in-memory implementations used by fixtures and tests.

pub mod memory;

use serde::{Deserialize, Serialize};

use crate::binding::ComponentType;
use crate::clip::ObjectRef;

pub use memory::{MemoryMaterial, MemoryMaterials, MemoryScene, SceneComponent, SceneObject};

/// Object located in the hierarchy, addressed by its path from the avatar root.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ObjectHandle(pub String);

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ComponentHandle {
    pub path: String,
    pub component: ComponentType,
}

/// Opaque material asset key.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct MaterialHandle(pub String);

/// Serialized type of a component property.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum PropertyKind {
    Float,
    Integer,
    Boolean,
    ObjectReference,
    Vector,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyValue {
    Float(f32),
    Int(i32),
    Bool(bool),
    Object(Option<ObjectRef>),
    Vector([f32; 3]),
}

impl PropertyValue {
    pub fn kind(&self) -> PropertyKind {
        match self {
            PropertyValue::Float(_) => PropertyKind::Float,
            PropertyValue::Int(_) => PropertyKind::Integer,
            PropertyValue::Bool(_) => PropertyKind::Boolean,
            PropertyValue::Object(_) => PropertyKind::ObjectReference,
            PropertyValue::Vector(_) => PropertyKind::Vector,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum WriteOutcome {
    Written,
    /// The component has no such property.
    Missing,
}

/// A renderer as seen by scale compensation.
#[derive(Clone, Debug, PartialEq)]
pub struct RendererInfo {
    pub path: String,
    pub component: ComponentType,
    /// Skinned renderers may be driven by a bone elsewhere in the hierarchy.
    pub root_bone: Option<String>,
}

impl RendererInfo {
    pub fn handle(&self) -> ComponentHandle {
        ComponentHandle {
            path: self.path.clone(),
            component: self.component.clone(),
        }
    }

    /// Where scale is inherited from: the root bone if set, else the renderer itself.
    pub fn scale_root(&self) -> &str {
        self.root_bone.as_deref().unwrap_or(&self.path)
    }
}

pub trait SceneTree {
    fn find(&self, path: &str) -> Option<ObjectHandle>;
    fn component(&self, object: &ObjectHandle, component: &ComponentType) -> Option<ComponentHandle>;
    fn property_kind(&self, component: &ComponentHandle, name: &str) -> Option<PropertyKind>;
    fn write_property(
        &mut self,
        component: &ComponentHandle,
        name: &str,
        value: PropertyValue,
    ) -> WriteOutcome;
    /// Every renderer under the avatar, inactive ones included.
    fn renderers(&self) -> Vec<RendererInfo>;
    /// `path` itself first, then each ancestor up to and including the root (`""`).
    fn ancestor_paths(&self, path: &str) -> Vec<String>;
    fn local_scale_z(&self, path: &str) -> Option<f32>;
    fn materials(&self, renderer: &ComponentHandle) -> Vec<MaterialHandle>;
    fn set_materials(&mut self, renderer: &ComponentHandle, materials: Vec<MaterialHandle>);
}

pub trait MaterialService {
    fn has_property(&self, material: &MaterialHandle, name: &str) -> bool;
    /// Materials driven by the penetrator shader family need scale compensation.
    fn is_special(&self, material: &MaterialHandle) -> bool;
    fn is_locked(&self, material: &MaterialHandle) -> bool;
    /// Return a build-local copy that may be edited; idempotent for copies.
    fn make_mutable(&mut self, material: &MaterialHandle) -> MaterialHandle;
    fn set_float(&mut self, material: &MaterialHandle, name: &str, value: f32);
    fn get_float(&self, material: &MaterialHandle, name: &str) -> Option<f32>;
    fn get_vector_z(&self, material: &MaterialHandle, name: &str) -> Option<f32>;
    fn set_override_tag(&mut self, material: &MaterialHandle, tag: &str, value: &str);
}
