//! vizij-build-orchestrator
//!
//! Runs an avatar build: host features and the built-in passes are sorted by
//! [`FeatureOrder`] and applied one at a time to a working copy of the
//! controller graph. A failing pass aborts the run and the working copy is
//! dropped, so the host only ever sees a finished graph.

pub mod config;
pub mod context;
pub mod diagnostics;
pub mod order;
pub mod passes;
pub mod scheduler;

use std::collections::HashMap;

use anyhow::Result;

use vizij_controller_core::{
    ControllerGraph, IdAllocator, MaskFixReport, MaterialService, MergeReport, OwnerCollection,
    PlayableRewriteReport, ReindexReport, RestPhase, RestingReport, ScaleFixReport, SceneTree,
};

pub use crate::config::BuildConfig;
pub use crate::context::BuildContext;
pub use crate::diagnostics::DiagnosticsCfg;
pub use crate::order::FeatureOrder;
pub use crate::passes::{BuildPass, FnPass};

/// What each built-in pass did during a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildReport {
    pub timings_ms: HashMap<String, f32>,
    pub recorded_references: usize,
    pub resting: Vec<(RestPhase, RestingReport)>,
    pub scale: Option<ScaleFixReport>,
    pub merge: Option<MergeReport>,
    pub playable: Option<PlayableRewriteReport>,
    /// Who toggles locomotion, pose space and tracking. Reported only.
    pub owner_collection: Option<OwnerCollection>,
    pub masks: Option<MaskFixReport>,
    pub reindex: Option<ReindexReport>,
}

#[derive(Debug)]
pub struct BuildOutput {
    pub graph: ControllerGraph,
    pub report: BuildReport,
}

pub struct Pipeline {
    pub config: BuildConfig,
    passes: Vec<Box<dyn BuildPass>>,
}

impl Pipeline {
    pub fn new(config: BuildConfig) -> Self {
        Self {
            config,
            passes: Vec::new(),
        }
    }

    /// Register a pass. Registration order only matters between passes that
    /// share a [`FeatureOrder`] slot.
    pub fn with_pass(mut self, pass: impl BuildPass + 'static) -> Self {
        self.passes.push(Box::new(pass));
        self
    }

    pub fn with_builtin_passes(mut self) -> Self {
        self.passes.extend(passes::builtin_passes());
        self
    }

    pub fn len(&self) -> usize {
        self.passes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    /// Build `graph`. Ids already present in it are kept; anything unassigned
    /// gets a fresh one.
    pub fn run(
        &mut self,
        mut graph: ControllerGraph,
        scene: &mut dyn SceneTree,
        materials: &mut dyn MaterialService,
    ) -> Result<BuildOutput> {
        let mut ids = IdAllocator::new();
        graph.reserve_ids(&mut ids);
        graph.adopt_ids(&mut ids);

        log::info!(
            "build starting: {} controllers, {} passes",
            graph.kinds().len(),
            self.passes.len()
        );
        let mut cx = BuildContext::new(graph, ids, &self.config, scene, materials);
        // Whatever the avatar already carries belongs to the host.
        cx.set_feature(&self.config.host_owner);
        cx.claim_unowned_layers();
        scheduler::run_ordered(&mut self.passes, &mut cx)?;
        let (graph, report) = cx.into_parts();
        log::info!(
            "build finished: {} layers",
            graph.controllers().map(|c| c.len()).sum::<usize>()
        );

        Ok(BuildOutput { graph, report })
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(BuildConfig::default()).with_builtin_passes()
    }
}
