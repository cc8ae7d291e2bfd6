//! Serde-backed in-memory scene and material store.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{
    ComponentHandle, MaterialHandle, MaterialService, ObjectHandle, PropertyKind, PropertyValue,
    RendererInfo, SceneTree, WriteOutcome,
};
use crate::binding::ComponentType;

fn one() -> f32 {
    1.0
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    #[serde(default = "one")]
    pub local_scale_z: f32,
    #[serde(default)]
    pub components: Vec<SceneComponent>,
}

impl Default for SceneObject {
    fn default() -> Self {
        Self {
            local_scale_z: 1.0,
            components: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SceneComponent {
    pub component: ComponentType,
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyValue>,
    #[serde(default)]
    pub materials: Vec<MaterialHandle>,
    #[serde(default)]
    pub root_bone: Option<String>,
}

impl SceneComponent {
    pub fn new(component: ComponentType) -> Self {
        Self {
            component,
            properties: BTreeMap::new(),
            materials: Vec::new(),
            root_bone: None,
        }
    }

    pub fn with_property(mut self, name: impl Into<String>, value: PropertyValue) -> Self {
        self.properties.insert(name.into(), value);
        self
    }

    pub fn with_material(mut self, material: impl Into<String>) -> Self {
        self.materials.push(MaterialHandle(material.into()));
        self
    }
}

/// Objects keyed by path from the avatar root (`""` is the root).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryScene {
    #[serde(default)]
    pub objects: BTreeMap<String, SceneObject>,
}

impl MemoryScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }

    pub fn with_object(mut self, path: impl Into<String>, object: SceneObject) -> Self {
        self.objects.insert(path.into(), object);
        self
    }

    pub fn property(&self, path: &str, component: &ComponentType, name: &str) -> Option<&PropertyValue> {
        self.component_ref(path, component)?.properties.get(name)
    }

    fn component_ref(&self, path: &str, component: &ComponentType) -> Option<&SceneComponent> {
        self.objects
            .get(path)?
            .components
            .iter()
            .find(|c| &c.component == component)
    }

    fn component_mut(&mut self, handle: &ComponentHandle) -> Option<&mut SceneComponent> {
        self.objects
            .get_mut(&handle.path)?
            .components
            .iter_mut()
            .find(|c| c.component == handle.component)
    }
}

impl SceneTree for MemoryScene {
    fn find(&self, path: &str) -> Option<ObjectHandle> {
        self.objects
            .contains_key(path)
            .then(|| ObjectHandle(path.to_string()))
    }

    fn component(&self, object: &ObjectHandle, component: &ComponentType) -> Option<ComponentHandle> {
        self.component_ref(&object.0, component).map(|c| ComponentHandle {
            path: object.0.clone(),
            component: c.component.clone(),
        })
    }

    fn property_kind(&self, component: &ComponentHandle, name: &str) -> Option<PropertyKind> {
        self.component_ref(&component.path, &component.component)?
            .properties
            .get(name)
            .map(PropertyValue::kind)
    }

    fn write_property(
        &mut self,
        component: &ComponentHandle,
        name: &str,
        value: PropertyValue,
    ) -> WriteOutcome {
        match self
            .component_mut(component)
            .and_then(|c| c.properties.get_mut(name))
        {
            Some(slot) => {
                *slot = value;
                WriteOutcome::Written
            }
            None => WriteOutcome::Missing,
        }
    }

    fn renderers(&self) -> Vec<RendererInfo> {
        self.objects
            .iter()
            .flat_map(|(path, object)| {
                object
                    .components
                    .iter()
                    .filter(|c| c.component.is_renderer())
                    .map(move |c| RendererInfo {
                        path: path.clone(),
                        component: c.component.clone(),
                        root_bone: c.root_bone.clone(),
                    })
            })
            .collect()
    }

    fn ancestor_paths(&self, path: &str) -> Vec<String> {
        let mut out = Vec::new();
        let mut current = Some(path);
        while let Some(p) = current {
            if self.objects.contains_key(p) {
                out.push(p.to_string());
            }
            current = if p.is_empty() {
                None
            } else {
                Some(p.rsplit_once('/').map(|(parent, _)| parent).unwrap_or(""))
            };
        }
        out
    }

    fn local_scale_z(&self, path: &str) -> Option<f32> {
        self.objects.get(path).map(|o| o.local_scale_z)
    }

    fn materials(&self, renderer: &ComponentHandle) -> Vec<MaterialHandle> {
        self.component_ref(&renderer.path, &renderer.component)
            .map(|c| c.materials.clone())
            .unwrap_or_default()
    }

    fn set_materials(&mut self, renderer: &ComponentHandle, materials: Vec<MaterialHandle>) {
        if let Some(c) = self.component_mut(renderer) {
            c.materials = materials;
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryMaterial {
    #[serde(default)]
    pub special: bool,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub floats: BTreeMap<String, f32>,
    #[serde(default)]
    pub vectors: BTreeMap<String, [f32; 4]>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    /// Set on build-local copies.
    #[serde(default)]
    pub mutable: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryMaterials {
    #[serde(default)]
    pub materials: BTreeMap<MaterialHandle, MemoryMaterial>,
}

impl MemoryMaterials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_material(mut self, name: impl Into<String>, material: MemoryMaterial) -> Self {
        self.materials.insert(MaterialHandle(name.into()), material);
        self
    }

    pub fn get(&self, handle: &MaterialHandle) -> Option<&MemoryMaterial> {
        self.materials.get(handle)
    }
}

impl MaterialService for MemoryMaterials {
    fn has_property(&self, material: &MaterialHandle, name: &str) -> bool {
        self.materials
            .get(material)
            .map(|m| m.floats.contains_key(name) || m.vectors.contains_key(name))
            .unwrap_or(false)
    }

    fn is_special(&self, material: &MaterialHandle) -> bool {
        self.materials.get(material).map(|m| m.special).unwrap_or(false)
    }

    fn is_locked(&self, material: &MaterialHandle) -> bool {
        self.materials.get(material).map(|m| m.locked).unwrap_or(false)
    }

    fn make_mutable(&mut self, material: &MaterialHandle) -> MaterialHandle {
        let Some(original) = self.materials.get(material) else {
            return material.clone();
        };
        if original.mutable {
            return material.clone();
        }
        let mut copy = original.clone();
        copy.mutable = true;
        let handle = MaterialHandle(format!("{} (build copy)", material.0));
        self.materials.insert(handle.clone(), copy);
        handle
    }

    fn set_float(&mut self, material: &MaterialHandle, name: &str, value: f32) {
        if let Some(m) = self.materials.get_mut(material) {
            if let Some(v) = m.vectors.get_mut(name) {
                v[0] = value;
            } else {
                m.floats.insert(name.to_string(), value);
            }
        }
    }

    fn get_float(&self, material: &MaterialHandle, name: &str) -> Option<f32> {
        self.materials.get(material)?.floats.get(name).copied()
    }

    fn get_vector_z(&self, material: &MaterialHandle, name: &str) -> Option<f32> {
        self.materials.get(material)?.vectors.get(name).map(|v| v[2])
    }

    fn set_override_tag(&mut self, material: &MaterialHandle, tag: &str, value: &str) {
        if let Some(m) = self.materials.get_mut(material) {
            m.tags.insert(tag.to_string(), value.to_string());
        }
    }
}
