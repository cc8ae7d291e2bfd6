use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use vizij_controller_core::{ControllerKind, DEFAULT_SINGLE_OWNER_KINDS};

use crate::diagnostics::DiagnosticsCfg;

/// Owner recorded for layers the avatar already had before any feature ran.
pub const DEFAULT_HOST_OWNER: &str = "Base Avatar";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Controllers that only one owner may contribute non-empty layers to.
    pub single_owner_kinds: Vec<ControllerKind>,
    pub host_owner: String,
    /// Merge Gesture into FX and split it back by binding domain.
    pub merge_gesture_into_fx: bool,
    pub fix_masks: bool,
    /// Off unless the host opts in; needs a populated material service.
    pub scale_compensation: bool,
    pub diagnostics: DiagnosticsCfg,
}

impl Default for BuildConfig {
    fn default() -> Self {
        BuildConfig {
            single_owner_kinds: DEFAULT_SINGLE_OWNER_KINDS.to_vec(),
            host_owner: DEFAULT_HOST_OWNER.to_string(),
            merge_gesture_into_fx: true,
            fix_masks: true,
            scale_compensation: false,
            diagnostics: DiagnosticsCfg::default(),
        }
    }
}

impl BuildConfig {
    /// Parse a config; missing fields keep their defaults.
    pub fn from_json(s: &str) -> Result<Self> {
        serde_json::from_str(s).context("invalid build config")
    }
}
