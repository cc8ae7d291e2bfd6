use serde::{Deserialize, Serialize};

/// Diagnostics configuration for a build run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsCfg {
    /// Log per-pass progress at debug level.
    pub enabled: bool,
    /// Fill `BuildReport::timings_ms`.
    pub record_timings: bool,
}

impl Default for DiagnosticsCfg {
    fn default() -> Self {
        DiagnosticsCfg {
            enabled: true,
            record_timings: true,
        }
    }
}
