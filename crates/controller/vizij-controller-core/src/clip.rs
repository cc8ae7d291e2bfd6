//! Animation clips as far as graph rewriting cares: a list of bound curves.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::binding::{BindingDomain, CurveBinding};

/// Opaque reference to a host asset (material, mesh, sprite...).
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ObjectRef(pub String);

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub time: f32,
    pub value: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectKeyframe {
    pub time: f32,
    pub value: Option<ObjectRef>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Curve {
    Float(Vec<Keyframe>),
    Object(Vec<ObjectKeyframe>),
}

impl Curve {
    /// Single-keyframe float curve.
    pub fn constant(value: f32) -> Self {
        Curve::Float(vec![Keyframe { time: 0.0, value }])
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Curve::Float(_))
    }

    /// Value of the first keyframe, which is what a resting pose takes.
    pub fn first(&self) -> Option<RestingValue> {
        match self {
            Curve::Float(keys) => keys.first().map(|k| RestingValue::Float(k.value)),
            Curve::Object(keys) => keys.first().map(|k| RestingValue::Object(k.value.clone())),
        }
    }
}

/// Either a float or an object reference, as carried by the first keyframe of a curve.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum RestingValue {
    Float(f32),
    Object(Option<ObjectRef>),
}

impl RestingValue {
    pub fn as_float(&self) -> Option<f32> {
        match self {
            RestingValue::Float(v) => Some(*v),
            RestingValue::Object(_) => None,
        }
    }
}

impl fmt::Display for RestingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RestingValue::Float(v) => write!(f, "{v}"),
            RestingValue::Object(Some(obj)) => write!(f, "{}", obj.0),
            RestingValue::Object(None) => f.write_str("None"),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    pub name: String,
    #[serde(default)]
    pub curves: Vec<(CurveBinding, Curve)>,
}

impl Clip {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            curves: Vec::new(),
        }
    }

    /// Set (or replace) the curve for `binding`; `None` removes it.
    pub fn set_curve(&mut self, binding: CurveBinding, curve: Option<Curve>) {
        let existing = self.curves.iter().position(|(b, _)| *b == binding);
        match (existing, curve) {
            (Some(i), Some(curve)) => self.curves[i].1 = curve,
            (Some(i), None) => {
                self.curves.remove(i);
            }
            (None, Some(curve)) => self.curves.push((binding, curve)),
            (None, None) => {}
        }
    }

    pub fn with_curve(mut self, binding: CurveBinding, curve: Curve) -> Self {
        self.set_curve(binding, Some(curve));
        self
    }

    pub fn curve(&self, binding: &CurveBinding) -> Option<&Curve> {
        self.curves.iter().find(|(b, _)| b == binding).map(|(_, c)| c)
    }

    pub fn bindings(&self) -> impl Iterator<Item = &CurveBinding> {
        self.curves.iter().map(|(b, _)| b)
    }

    pub fn float_bindings(&self) -> impl Iterator<Item = &CurveBinding> {
        self.curves
            .iter()
            .filter(|(_, c)| c.is_float())
            .map(|(b, _)| b)
    }

    pub fn domains(&self) -> impl Iterator<Item = BindingDomain> + '_ {
        self.bindings().map(BindingDomain::classify)
    }

    /// Keep only the curves whose binding `keep` accepts.
    pub fn retain_bindings(&mut self, mut keep: impl FnMut(&CurveBinding) -> bool) {
        self.curves.retain(|(b, _)| keep(b));
    }

    pub fn is_empty(&self) -> bool {
        self.curves.is_empty()
    }
}
