//! Scale compensation for penetrator-style materials.
//!
//! These shaders bake a length and scale into the material, which goes stale as
//! soon as an ancestor transform is scaled by an animation. For every affected
//! material we add one float parameter per animated ancestor, mirror the
//! ancestor's `localScale.z` curves onto it, and feed the parameters into a chain
//! of direct blend trees that multiply the material values back into shape.

use hashbrown::{HashMap, HashSet};

use crate::binding::{ComponentType, CurveBinding};
use crate::clip::{Clip, Curve};
use crate::error::{BuildError, BuildResult};
use crate::graph::{BlendTree, ChildMotion, Controller, ControllerGraph, Motion};
use crate::ids::{IdAllocator, StateMachineId};
use crate::kinds::ControllerKind;
use crate::scene::{MaterialService, RendererInfo, SceneTree};

pub const SCALE_LAYER_NAME: &str = "tpsScale";
pub const LENGTH_PROPERTY: &str = "_TPS_PenetratorLength";
pub const SCALE_PROPERTY: &str = "_TPS_PenetratorScale";

const SCALE_BINDING: &str = "localScale.z";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScaleFixReport {
    /// Curves from earlier compensation attempts that were removed.
    pub removed_curves: usize,
    /// Materials that received compensation.
    pub materials: usize,
    pub parameters: Vec<String>,
    pub mirrored_curves: usize,
    /// The direct blend tree layer, if one was needed.
    pub layer: Option<StateMachineId>,
}

pub fn apply_scale_compensation(
    graph: &mut ControllerGraph,
    ids: &mut IdAllocator,
    scene: &mut dyn SceneTree,
    materials: &mut dyn MaterialService,
) -> BuildResult<ScaleFixReport> {
    let mut report = ScaleFixReport::default();
    let fx = graph.controller_or_insert(ControllerKind::Fx);

    fx.for_each_clip_mut(|clip| {
        let before = clip.curves.len();
        clip.curves.retain(|(b, c)| {
            !(c.is_float() && (b.property.contains(LENGTH_PROPERTY) || b.property.contains(SCALE_PROPERTY)))
        });
        report.removed_curves += before - clip.curves.len();
    });

    let animated: HashSet<String> = fx
        .clips()
        .into_iter()
        .flat_map(|clip| clip.float_bindings())
        .filter(|b| is_scale_binding(b))
        .map(|b| b.path.clone())
        .collect();

    let mut tree: Option<(BlendTree, Clip)> = None;
    let mut object_number = 0usize;

    for renderer in scene.renderers() {
        let handle = renderer.handle();
        let current = scene.materials(&handle);
        if current.iter().filter(|m| materials.is_special(m)).count() > 1 {
            return Err(BuildError::MultipleSpecialMaterials {
                renderer: renderer.path.clone(),
            });
        }

        let mut changed = false;
        let mut updated = Vec::with_capacity(current.len());
        for material in current {
            if !materials.is_special(&material) {
                updated.push(material);
                continue;
            }
            if materials.is_locked(&material) {
                return Err(BuildError::LockedSpecialMaterial {
                    renderer: renderer.path.clone(),
                });
            }
            let animated_parents: Vec<String> = scene
                .ancestor_paths(renderer.scale_root())
                .into_iter()
                .filter(|p| animated.contains(p))
                .collect();
            if animated_parents.is_empty() {
                updated.push(material);
                continue;
            }

            object_number += 1;
            log::debug!("scale compensation for {} ({})", renderer.path, material.0);
            let material = materials.make_mutable(&material);
            materials.set_override_tag(&material, "_TPS_PenetratorLengthAnimated", "1");
            materials.set_override_tag(&material, "_TPS_PenetratorScaleAnimated", "1");

            let params: Vec<(String, String)> = animated_parents
                .iter()
                .enumerate()
                .map(|(i, path)| {
                    let name = fx.new_float(format!("tpsScale_{object_number}_{}", i + 1), 0.0);
                    (path.clone(), name)
                })
                .collect();
            report.parameters.extend(params.iter().map(|(_, p)| p.clone()));

            let handled: f32 = animated_parents
                .iter()
                .map(|p| scene.local_scale_z(p).unwrap_or(1.0))
                .product();
            let scale = materials.get_vector_z(&material, SCALE_PROPERTY).unwrap_or(0.0) / handled;
            let length = materials.get_float(&material, LENGTH_PROPERTY).unwrap_or(0.0) / handled;

            let mut scale_clip = Clip::new(format!("tpsScale_{object_number}"));
            set_material_curves(&mut scale_clip, &renderer, scale, length);

            let (root, zero) = tree.get_or_insert_with(|| {
                let one = fx.new_float("one", 1.0);
                let mut root = BlendTree::direct(SCALE_LAYER_NAME);
                root.children.push(ChildMotion {
                    motion: Motion::Clip(Clip::default()),
                    direct_parameter: Some(one),
                });
                (root, Clip::new("zeroScale"))
            });
            set_material_curves(zero, &renderer, 0.0, 0.0);
            root.children.push(nest(scale_clip, &params));

            let by_path: HashMap<&str, &str> =
                params.iter().map(|(path, p)| (path.as_str(), p.as_str())).collect();
            report.mirrored_curves += mirror_scale_curves(fx, &by_path);

            changed = true;
            updated.push(material);
        }
        if changed {
            scene.set_materials(&handle, updated);
        }
        report.materials = object_number;
    }

    if let Some((mut root, zero)) = tree {
        root.children[0].motion = Motion::Clip(zero);
        let layer = fx.new_layer(SCALE_LAYER_NAME, ids);
        layer.new_state("Scale").with_motion(Motion::BlendTree(root));
        report.layer = Some(layer.id());
    }

    Ok(report)
}

fn is_scale_binding(binding: &CurveBinding) -> bool {
    binding.component == ComponentType::Transform && binding.normalized().property == SCALE_BINDING
}

fn set_material_curves(clip: &mut Clip, renderer: &RendererInfo, scale: f32, length: f32) {
    for axis in ["x", "y", "z"] {
        clip.set_curve(
            CurveBinding::new(
                renderer.path.clone(),
                renderer.component.clone(),
                format!("material.{SCALE_PROPERTY}.{axis}"),
            ),
            Some(Curve::constant(scale)),
        );
    }
    clip.set_curve(
        CurveBinding::new(
            renderer.path.clone(),
            renderer.component.clone(),
            format!("material.{LENGTH_PROPERTY}"),
        ),
        Some(Curve::constant(length)),
    );
}

/// One nested direct tree per parameter, innermost holding the scale clip, so the
/// weights multiply.
fn nest(scale_clip: Clip, params: &[(String, String)]) -> ChildMotion {
    let mut iter = params.iter().rev().map(|(_, p)| p.clone());
    let mut child = ChildMotion {
        motion: Motion::Clip(scale_clip),
        direct_parameter: iter.next(),
    };
    for param in iter {
        let mut sub = BlendTree::direct("tpsScaleSub");
        sub.children.push(child);
        child = ChildMotion {
            motion: Motion::BlendTree(sub),
            direct_parameter: Some(param),
        };
    }
    child
}

fn mirror_scale_curves(fx: &mut Controller, by_path: &HashMap<&str, &str>) -> usize {
    let mut mirrored = 0;
    fx.for_each_clip_mut(|clip| {
        let additions: Vec<(CurveBinding, Curve)> = clip
            .curves
            .iter()
            .filter(|(b, c)| c.is_float() && is_scale_binding(b))
            .filter_map(|(b, c)| {
                by_path
                    .get(b.path.as_str())
                    .map(|param| (CurveBinding::parameter(*param), c.clone()))
            })
            .collect();
        for (binding, curve) in additions {
            clip.set_curve(binding, Some(curve));
            mirrored += 1;
        }
    });
    mirrored
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Layer;
    use crate::scene::{MaterialHandle, MemoryMaterial, MemoryMaterials, MemoryScene, SceneComponent, SceneObject};

    fn tps_material(locked: bool) -> MemoryMaterial {
        let mut m = MemoryMaterial {
            special: true,
            locked,
            ..Default::default()
        };
        m.floats.insert(LENGTH_PROPERTY.into(), 0.4);
        m.vectors.insert(SCALE_PROPERTY.into(), [1.0, 1.0, 2.0, 0.0]);
        m
    }

    fn scene_with(materials: &[&str]) -> MemoryScene {
        let mut renderer = SceneComponent::new(ComponentType::SkinnedMeshRenderer);
        renderer.root_bone = Some("Hips/Pelvis".into());
        for m in materials {
            renderer = renderer.with_material(*m);
        }
        MemoryScene::new()
            .with_object("", SceneObject::default())
            .with_object(
                "Hips",
                SceneObject {
                    local_scale_z: 2.0,
                    components: Vec::new(),
                },
            )
            .with_object("Hips/Pelvis", SceneObject::default())
            .with_object(
                "Body",
                SceneObject {
                    local_scale_z: 1.0,
                    components: vec![renderer],
                },
            )
    }

    fn graph_scaling_hips(ids: &mut IdAllocator) -> ControllerGraph {
        let mut graph = ControllerGraph::new();
        let fx = graph.controller_or_insert(ControllerKind::Fx);
        let clip = Clip::new("grow")
            .with_curve(
                CurveBinding::new("Hips", ComponentType::Transform, "m_LocalScale.z"),
                Curve::constant(3.0),
            )
            .with_curve(
                CurveBinding::new("Body", ComponentType::SkinnedMeshRenderer, "material._TPS_PenetratorLength"),
                Curve::constant(9.0),
            );
        fx.new_layer("grow", ids).new_state("Big").with_motion(Motion::Clip(clip));
        graph
    }

    #[test]
    fn compensates_animated_ancestor() {
        let mut ids = IdAllocator::new();
        let mut graph = graph_scaling_hips(&mut ids);
        let mut scene = scene_with(&["Tps"]);
        let mut materials = MemoryMaterials::new().with_material("Tps", tps_material(false));

        let report = apply_scale_compensation(&mut graph, &mut ids, &mut scene, &mut materials).expect("fix");
        assert_eq!(report.removed_curves, 1);
        assert_eq!(report.materials, 1);
        assert_eq!(report.parameters, vec!["tpsScale_1_1".to_string()]);
        assert_eq!(report.mirrored_curves, 1);

        let fx = graph.controller(ControllerKind::Fx).unwrap();
        let grow = fx.clips()[0];
        assert!(grow.curve(&CurveBinding::parameter("tpsScale_1_1")).is_some());
        assert!(fx.parameter("one").is_some());

        let layer: &Layer = fx.layers().last().unwrap();
        assert_eq!(layer.name, SCALE_LAYER_NAME);
        let clips = layer.state_machine.clips();
        assert_eq!(clips.len(), 2);
        let scale = clips[1]
            .curve(&CurveBinding::new(
                "Body",
                ComponentType::SkinnedMeshRenderer,
                "material._TPS_PenetratorScale.z",
            ))
            .and_then(Curve::first)
            .and_then(|v| v.as_float());
        assert_eq!(scale, Some(1.0));

        let body = scene
            .objects
            .get("Body")
            .map(|o| o.components[0].materials.clone())
            .unwrap();
        assert_ne!(body, vec![MaterialHandle("Tps".into())]);
        let copy = materials.get(&body[0]).unwrap();
        assert_eq!(copy.tags.get("_TPS_PenetratorScaleAnimated").map(String::as_str), Some("1"));
    }

    #[test]
    fn rejects_two_special_materials_and_locked_ones() {
        let mut ids = IdAllocator::new();
        let mut graph = graph_scaling_hips(&mut ids);
        let mut scene = scene_with(&["A", "B"]);
        let mut materials = MemoryMaterials::new()
            .with_material("A", tps_material(false))
            .with_material("B", tps_material(false));
        let err = apply_scale_compensation(&mut graph, &mut ids, &mut scene, &mut materials).unwrap_err();
        assert_eq!(err, BuildError::MultipleSpecialMaterials { renderer: "Body".into() });

        let mut scene = scene_with(&["A"]);
        let mut materials = MemoryMaterials::new().with_material("A", tps_material(true));
        let err = apply_scale_compensation(&mut graph, &mut ids, &mut scene, &mut materials).unwrap_err();
        assert_eq!(err, BuildError::LockedSpecialMaterial { renderer: "Body".into() });
    }
}
