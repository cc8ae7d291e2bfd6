//! Vizij Controller Core (engine-agnostic)
//!
//! Data model and rewriting components for layered animator controllers: reference
//! tracking across layer moves, ownership conflict checks, playable-control
//! lowering, Gesture/FX merge and partition, resting-state write-back and a few
//! cleanup passes. Host objects and materials are reached only through the
//! traits in [`scene`].

pub mod behaviour;
pub mod binding;
pub mod clip;
pub mod conflict;
pub mod error;
pub mod graph;
pub mod ids;
pub mod kinds;
pub mod masks;
pub mod merge;
pub mod ownership;
pub mod params;
pub mod playable;
pub mod references;
pub mod reindex;
pub mod resting;
pub mod scale_fix;
pub mod scene;
pub mod tracking;

// Re-exports for consumers (pipeline, adapters)
pub use behaviour::{Behaviour, BehaviourKind, LayerControl, PlayableControl, TrackingControl, Visit};
pub use binding::{BindingDomain, ComponentType, CurveBinding};
pub use clip::{Clip, Curve, Keyframe, ObjectKeyframe, ObjectRef, RestingValue};
pub use conflict::{ConflictDetector, DEFAULT_SINGLE_OWNER_KINDS};
pub use error::{BuildError, BuildResult};
pub use graph::{
    BlendTree, BlendTreeType, ChildMotion, Condition, ConditionMode, Controller, ControllerGraph,
    Copied, Layer, Mask, Motion, Parameter, ParameterKind, State, StateMachine, Transition,
    BASE_PLACEHOLDER_NAME,
};
pub use ids::{BehaviourId, IdAllocator, StateMachineId};
pub use kinds::{BlendableLayer, BodyPart, ControllerKind, TrackingChannel, TrackingMode};
pub use masks::{fix_masks, MaskFixReport};
pub use merge::{ControllerMerger, MergeReport};
pub use ownership::OwnershipIndex;
pub use playable::{PlayableControlRewriter, PlayableRewriteReport, FORCE_ENABLE_LAYER_NAME};
pub use references::ReferenceTracker;
pub use reindex::{OffsetReindexer, ReindexReport};
pub use resting::{RestPhase, RestingReport, RestingStateAccumulator};
pub use scale_fix::{apply_scale_compensation, ScaleFixReport};
pub use scene::{MaterialService, SceneTree};
pub use tracking::{collect_owners, OnOffChannel, OwnerCollection};
