//! Rejects builds where a single-source controller ends up with more than one author.

use crate::error::{BuildError, BuildResult};
use crate::graph::ControllerGraph;
use crate::kinds::ControllerKind;
use crate::ownership::OwnershipIndex;

/// Controllers that only one feature may contribute (non-empty) layers to.
pub const DEFAULT_SINGLE_OWNER_KINDS: [ControllerKind; 4] = [
    ControllerKind::Base,
    ControllerKind::TPose,
    ControllerKind::IKPose,
    ControllerKind::Sitting,
];

#[derive(Debug)]
pub struct ConflictDetector<'a> {
    single_owner: &'a [ControllerKind],
}

impl<'a> ConflictDetector<'a> {
    pub fn new(single_owner: &'a [ControllerKind]) -> Self {
        Self { single_owner }
    }

    pub fn check(&self, graph: &ControllerGraph, owners: &OwnershipIndex) -> BuildResult<()> {
        for controller in graph.controllers() {
            if !self.single_owner.contains(&controller.kind) {
                continue;
            }
            let unique = owners.unique_owners(controller);
            if unique.len() > 1 {
                return Err(BuildError::MultipleOwners {
                    kind: controller.kind,
                    owners: unique.into_iter().collect(),
                });
            }
        }
        Ok(())
    }
}

impl Default for ConflictDetector<'static> {
    fn default() -> Self {
        Self::new(&DEFAULT_SINGLE_OWNER_KINDS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::IdAllocator;

    fn graph_with_owners(a: &str, b: &str) -> (ControllerGraph, OwnershipIndex) {
        let mut ids = IdAllocator::new();
        let mut graph = ControllerGraph::new();
        let mut owners = OwnershipIndex::new();
        let base = graph.controller_or_insert(ControllerKind::Base);
        for (name, owner) in [("Locomotion", a), ("GoGo", b)] {
            let layer = base.new_layer(name, &mut ids);
            layer.new_state("Stand");
            owners.record(layer.id(), owner);
        }
        let junk = base.new_layer("junk", &mut ids).id();
        owners.record(junk, "Someone Else");
        (graph, owners)
    }

    #[test]
    fn two_owners_on_base_is_fatal() {
        let (graph, owners) = graph_with_owners("Zeta Feature", "Alpha Feature");
        let err = ConflictDetector::default().check(&graph, &owners).unwrap_err();
        assert_eq!(
            err,
            BuildError::MultipleOwners {
                kind: ControllerKind::Base,
                owners: vec!["Alpha Feature".into(), "Zeta Feature".into()],
            }
        );
        let msg = err.to_string();
        assert!(msg.contains("Layer type: Base"));
        assert!(!msg.contains("Someone Else"));
    }

    #[test]
    fn same_owner_passes() {
        let (graph, owners) = graph_with_owners("GogoLoco", "GogoLoco");
        assert!(ConflictDetector::default().check(&graph, &owners).is_ok());
    }

    #[test]
    fn multi_owner_fx_is_allowed() {
        let (mut graph, owners) = graph_with_owners("A", "B");
        let base = graph.controller_mut(ControllerKind::Base).unwrap().clone();
        let mut fx = base;
        fx.kind = ControllerKind::Fx;
        graph.insert_controller(fx);
        let only_fx = [ControllerKind::Fx];
        assert!(ConflictDetector::new(&[]).check(&graph, &owners).is_ok());
        assert!(ConflictDetector::new(&only_fx).check(&graph, &owners).is_err());
    }
}
