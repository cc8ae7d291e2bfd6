//! Per-run registry handed to every pass. Constructed once by the pipeline;
//! passes reach shared state only through it.

use vizij_controller_core::{
    Clip, ControllerGraph, ControllerKind, IdAllocator, Layer, MaterialService, OwnershipIndex,
    ReferenceTracker, RestingStateAccumulator, SceneTree,
};

use crate::config::BuildConfig;
use crate::BuildReport;

pub struct BuildContext<'a> {
    /// Working copy; dropped if any pass fails.
    pub graph: ControllerGraph,
    pub owners: OwnershipIndex,
    pub tracker: ReferenceTracker,
    pub ids: IdAllocator,
    pub resting: RestingStateAccumulator,
    pub config: &'a BuildConfig,
    pub scene: &'a mut dyn SceneTree,
    pub materials: &'a mut dyn MaterialService,
    pub report: BuildReport,
    feature: String,
}

impl<'a> BuildContext<'a> {
    pub fn new(
        graph: ControllerGraph,
        ids: IdAllocator,
        config: &'a BuildConfig,
        scene: &'a mut dyn SceneTree,
        materials: &'a mut dyn MaterialService,
    ) -> Self {
        Self {
            graph,
            owners: OwnershipIndex::new(),
            tracker: ReferenceTracker::new(),
            ids,
            resting: RestingStateAccumulator::new(),
            config,
            scene,
            materials,
            report: BuildReport::default(),
            feature: String::new(),
        }
    }

    /// Owner identifier of the pass currently running.
    pub fn feature(&self) -> &str {
        &self.feature
    }

    pub(crate) fn set_feature(&mut self, feature: &str) {
        self.feature.clear();
        self.feature.push_str(feature);
    }

    /// Append a layer on top of `kind`, owned by the running feature.
    pub fn new_layer(&mut self, kind: ControllerKind, name: impl Into<String>) -> &mut Layer {
        let layer = self
            .graph
            .controller_or_insert(kind)
            .new_layer(name, &mut self.ids);
        self.owners.record(layer.id(), self.feature.as_str());
        layer
    }

    /// Attribute every layer nobody owns yet to the running feature, assigning ids
    /// to any the feature built outside [`BuildContext::ids`]. Returns how many were claimed.
    pub(crate) fn claim_unowned_layers(&mut self) -> usize {
        self.graph.adopt_ids(&mut self.ids);
        let mut claimed = 0;
        for layer in self.graph.controllers().flat_map(|c| c.layers()) {
            if self.owners.owner_of(layer.id()).is_none() {
                self.owners.record(layer.id(), self.feature.as_str());
                claimed += 1;
            }
        }
        claimed
    }

    /// Queue `clip` for the next resting-state phase, attributed to the running feature.
    pub fn queue_resting_clip(&mut self, clip: &Clip) {
        self.resting.queue(self.feature.as_str(), clip);
    }

    pub fn into_parts(self) -> (ControllerGraph, BuildReport) {
        (self.graph, self.report)
    }
}
