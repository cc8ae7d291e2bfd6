//! Resting-state write-back.
//!
//! Features queue clips describing how the avatar should look when nothing is
//! playing. Each phase writes the first keyframe of every queued curve into the
//! live scene. Two features disagreeing about a property within one phase is a
//! fatal error; a later phase may overwrite an earlier one.

use std::fmt;

use hashbrown::HashMap;

use crate::binding::CurveBinding;
use crate::clip::{Clip, RestingValue};
use crate::error::{BuildError, BuildResult};
use crate::scene::{ComponentHandle, MaterialService, PropertyKind, PropertyValue, SceneTree, WriteOutcome};

const MATERIAL_PREFIX: &str = "material.";

/// The three points in a build where queued resting clips are applied.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum RestPhase {
    ForceObjectState,
    Toggles,
    RestPose,
}

impl fmt::Display for RestPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RestPhase::ForceObjectState => "force object state",
            RestPhase::Toggles => "toggles",
            RestPhase::RestPose => "rest pose",
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RestingReport {
    pub applied: usize,
    /// Object, component or property not present in the scene.
    pub skipped_missing: usize,
    /// Property present but of a type the value can't be written as.
    pub skipped_type: usize,
    pub materials_written: usize,
}

#[derive(Clone, Debug)]
struct Pending {
    owner: String,
    clip: Clip,
}

#[derive(Clone, Debug)]
struct Stored {
    owner: String,
    value: RestingValue,
}

#[derive(Debug, Default)]
pub struct RestingStateAccumulator {
    pending: Vec<Pending>,
    stored: HashMap<CurveBinding, Stored>,
}

impl RestingStateAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a copy of `clip` for the next phase, attributed to `owner`.
    pub fn queue(&mut self, owner: impl Into<String>, clip: &Clip) {
        self.pending.push(Pending {
            owner: owner.into(),
            clip: clip.clone(),
        });
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn apply_phase(
        &mut self,
        phase: RestPhase,
        scene: &mut dyn SceneTree,
        materials: &mut dyn MaterialService,
    ) -> BuildResult<RestingReport> {
        let mut report = RestingReport::default();
        let pending = std::mem::take(&mut self.pending);
        let applied = self.apply_pending(&pending, scene, materials, &mut report);
        // Conflicts are only checked within one phase.
        self.stored.clear();
        applied?;
        log::debug!(
            "resting state ({phase}): {} clips, {} written, {} missing, {} mismatched",
            pending.len(),
            report.applied,
            report.skipped_missing,
            report.skipped_type
        );
        Ok(report)
    }

    fn apply_pending(
        &mut self,
        pending: &[Pending],
        scene: &mut dyn SceneTree,
        materials: &mut dyn MaterialService,
        report: &mut RestingReport,
    ) -> BuildResult<()> {
        for Pending { owner, clip } in pending {
            for (binding, curve) in &clip.curves {
                let Some(value) = curve.first() else {
                    continue;
                };
                self.store(binding.normalized(), owner, &value)?;
                write_value(binding, &value, scene, materials, report);
            }
        }
        Ok(())
    }

    fn store(&mut self, binding: CurveBinding, owner: &str, value: &RestingValue) -> BuildResult<()> {
        if let Some(previous) = self.stored.get(&binding) {
            if !same_value(&previous.value, value) {
                return Err(BuildError::RestingConflict {
                    binding,
                    first_owner: previous.owner.clone(),
                    first_value: previous.value.clone(),
                    second_owner: owner.to_string(),
                    second_value: value.clone(),
                });
            }
        }
        self.stored.insert(
            binding,
            Stored {
                owner: owner.to_string(),
                value: value.clone(),
            },
        );
        Ok(())
    }
}

/// Like `==`, except two NaNs agree.
fn same_value(a: &RestingValue, b: &RestingValue) -> bool {
    match (a, b) {
        (RestingValue::Float(x), RestingValue::Float(y)) => x == y || (x.is_nan() && y.is_nan()),
        _ => a == b,
    }
}

fn write_value(
    binding: &CurveBinding,
    value: &RestingValue,
    scene: &mut dyn SceneTree,
    materials: &mut dyn MaterialService,
    report: &mut RestingReport,
) {
    let Some(object) = scene.find(&binding.path) else {
        report.skipped_missing += 1;
        return;
    };
    let Some(component) = scene.component(&object, &binding.component) else {
        report.skipped_missing += 1;
        return;
    };

    if binding.component.is_renderer() {
        if let Some(property) = binding.property.strip_prefix(MATERIAL_PREFIX) {
            write_material(&component, property, value, scene, materials, report);
            return;
        }
    }

    let Some(kind) = scene.property_kind(&component, &binding.property) else {
        report.skipped_missing += 1;
        return;
    };
    let converted = match (kind, value) {
        (PropertyKind::ObjectReference, RestingValue::Object(obj)) => PropertyValue::Object(obj.clone()),
        (PropertyKind::Float, RestingValue::Float(v)) => PropertyValue::Float(*v),
        (PropertyKind::Integer, RestingValue::Float(v)) => PropertyValue::Int(*v as i32),
        (PropertyKind::Boolean, RestingValue::Float(v)) => PropertyValue::Bool(*v != 0.0),
        _ => {
            log::warn!("failed to write resting value {value} to {binding} ({kind:?} property)");
            report.skipped_type += 1;
            return;
        }
    };
    match scene.write_property(&component, &binding.property, converted) {
        WriteOutcome::Written => report.applied += 1,
        WriteOutcome::Missing => report.skipped_missing += 1,
    }
}

fn write_material(
    renderer: &ComponentHandle,
    property: &str,
    value: &RestingValue,
    scene: &mut dyn SceneTree,
    materials: &mut dyn MaterialService,
    report: &mut RestingReport,
) {
    let Some(v) = value.as_float() else {
        log::warn!("material property {property} on {} can't take object value {value}", renderer.path);
        report.skipped_type += 1;
        return;
    };
    let mut changed = false;
    let mut updated = Vec::new();
    for material in scene.materials(renderer) {
        if !materials.has_property(&material, property) {
            updated.push(material);
            continue;
        }
        let material = materials.make_mutable(&material);
        materials.set_float(&material, property, v);
        report.materials_written += 1;
        changed = true;
        updated.push(material);
    }
    if changed {
        scene.set_materials(renderer, updated);
        report.applied += 1;
    }
}
