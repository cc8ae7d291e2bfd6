//! Curve bindings: which property of which component on which object a curve animates.
//!
//! A binding is `(path, component, property)`. The empty path names the avatar root;
//! a float curve bound to the root `Animator` with a non-muscle property drives an
//! animator parameter of that name.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum ComponentType {
    Transform,
    Animator,
    GameObject,
    SkinnedMeshRenderer,
    MeshRenderer,
    Other(String),
}

impl ComponentType {
    pub fn is_renderer(&self) -> bool {
        matches!(
            self,
            ComponentType::SkinnedMeshRenderer | ComponentType::MeshRenderer
        )
    }

    pub fn name(&self) -> &str {
        match self {
            ComponentType::Transform => "Transform",
            ComponentType::Animator => "Animator",
            ComponentType::GameObject => "GameObject",
            ComponentType::SkinnedMeshRenderer => "SkinnedMeshRenderer",
            ComponentType::MeshRenderer => "MeshRenderer",
            ComponentType::Other(name) => name,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct CurveBinding {
    /// Transform path relative to the avatar root ("" is the root itself).
    pub path: String,
    pub component: ComponentType,
    pub property: String,
}

impl CurveBinding {
    pub fn new(path: impl Into<String>, component: ComponentType, property: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            component,
            property: property.into(),
        }
    }

    /// Binding that drives the animator parameter `name`.
    pub fn parameter(name: impl Into<String>) -> Self {
        Self::new("", ComponentType::Animator, name)
    }

    /// Canonical form used as a key when two bindings must compare equal even if
    /// authored through different property aliases.
    pub fn normalized(&self) -> CurveBinding {
        let (head, tail) = match self.property.split_once('.') {
            Some((head, tail)) => (head, Some(tail)),
            None => (self.property.as_str(), None),
        };
        let head = match head {
            "m_LocalScale" => "localScale",
            "m_LocalPosition" => "localPosition",
            "m_LocalRotation" => "localRotation",
            "m_LocalEulerAngles" | "localEulerAnglesRaw" | "m_LocalEulerAnglesHint" => {
                "localEulerAngles"
            }
            "m_IsActive" => "isActive",
            "m_Enabled" => "enabled",
            other => other,
        };
        let property = match tail {
            Some(tail) => format!("{head}.{tail}"),
            None => head.to_string(),
        };
        CurveBinding {
            path: self.path.clone(),
            component: self.component.clone(),
            property,
        }
    }

    pub fn is_root_animator(&self) -> bool {
        self.path.is_empty() && self.component == ComponentType::Animator
    }

    /// Humanoid muscle curves live on the root animator under well-known names.
    pub fn is_muscle(&self) -> bool {
        self.is_root_animator()
            && MUSCLE_PREFIXES
                .iter()
                .any(|prefix| self.property.starts_with(prefix))
    }

    /// Proxy animations reference stand-in objects rather than real avatar bones.
    pub fn is_proxy(&self) -> bool {
        self.path.to_ascii_lowercase().contains("proxy_")
    }

    /// Animator parameter name this binding drives, if it drives one.
    pub fn driven_parameter(&self) -> Option<&str> {
        if self.is_root_animator() && !self.is_muscle() {
            Some(&self.property)
        } else {
            None
        }
    }
}

impl fmt::Display for CurveBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = if self.path.is_empty() { "<root>" } else { &self.path };
        write!(f, "{} ({}) {}", path, self.component.name(), self.property)
    }
}

const MUSCLE_PREFIXES: &[&str] = &[
    "RootT.", "RootQ.", "MotionT.", "MotionQ.",
    "LeftFootT.", "LeftFootQ.", "RightFootT.", "RightFootQ.",
    "LeftHandT.", "LeftHandQ.", "RightHandT.", "RightHandQ.",
    "Spine ", "Chest ", "UpperChest ", "Neck ", "Head ", "Jaw ",
    "Left Eye ", "Right Eye ",
    "Left Upper Leg ", "Left Lower Leg ", "Left Foot ", "Left Toes ",
    "Right Upper Leg ", "Right Lower Leg ", "Right Foot ", "Right Toes ",
    "Left Shoulder ", "Left Arm ", "Left Forearm ", "Left Hand ",
    "Right Shoulder ", "Right Arm ", "Right Forearm ", "Right Hand ",
    "LeftHand.", "RightHand.",
];

/// Which controller a binding naturally belongs to when Gesture and FX are split.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum BindingDomain {
    /// Skeletal motion: muscles, proxies, transforms.
    Gesture,
    /// Everything else an FX controller animates (renderers, toggles, materials...).
    Fx,
    /// Root animator parameter drives; belongs to the machine, not a property domain.
    Animator,
}

impl BindingDomain {
    pub fn classify(binding: &CurveBinding) -> BindingDomain {
        if binding.is_muscle() || binding.is_proxy() || binding.component == ComponentType::Transform {
            BindingDomain::Gesture
        } else if binding.is_root_animator() {
            BindingDomain::Animator
        } else {
            BindingDomain::Fx
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_serialized_aliases() {
        let b = CurveBinding::new("Hips/Chest", ComponentType::Transform, "m_LocalScale.z");
        assert_eq!(b.normalized().property, "localScale.z");
        let already = CurveBinding::new("Hips/Chest", ComponentType::Transform, "localScale.z");
        assert_eq!(b.normalized(), already.normalized());
        let toggle = CurveBinding::new("Hat", ComponentType::GameObject, "m_IsActive");
        assert_eq!(toggle.normalized().property, "isActive");
    }

    #[test]
    fn classify_domains() {
        let t = CurveBinding::new("Hips", ComponentType::Transform, "localScale.x");
        let m = CurveBinding::new("", ComponentType::Animator, "LeftHand.Index.1 Stretched");
        let p = CurveBinding::parameter("GestureLeft");
        let r = CurveBinding::new("Body", ComponentType::SkinnedMeshRenderer, "blendShape.Smile");
        let proxy = CurveBinding::new("proxy_hands_fist", ComponentType::GameObject, "isActive");
        assert_eq!(BindingDomain::classify(&t), BindingDomain::Gesture);
        assert_eq!(BindingDomain::classify(&m), BindingDomain::Gesture);
        assert_eq!(BindingDomain::classify(&proxy), BindingDomain::Gesture);
        assert_eq!(BindingDomain::classify(&p), BindingDomain::Animator);
        assert_eq!(BindingDomain::classify(&r), BindingDomain::Fx);
        assert_eq!(p.driven_parameter(), Some("GestureLeft"));
        assert_eq!(m.driven_parameter(), None);
    }
}
