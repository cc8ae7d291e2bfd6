//! Fatal build errors. Each one aborts the whole build; the working copy of the
//! graph is discarded, so nothing partial reaches the host.

use thiserror::Error;

use crate::binding::CurveBinding;
use crate::clip::RestingValue;
use crate::kinds::ControllerKind;

#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum BuildError {
    #[error(
        "the avatar contains multiple implementations of the {kind} playable layer, which only \
         supports a single source; remove all but one of them.\n\nLayer type: {kind}\nSources:\n{}",
        .owners.join("\n")
    )]
    MultipleOwners {
        kind: ControllerKind,
        /// Sorted, deduplicated.
        owners: Vec<String>,
    },

    #[error("cannot merge {kind} into itself")]
    SelfMerge { kind: ControllerKind },

    #[error("{into} and its copy in {from} don't match in length ({into_len} vs {from_len} layers)")]
    LayerCountMismatch {
        into: ControllerKind,
        from: ControllerKind,
        into_len: usize,
        from_len: usize,
    },

    #[error(
        "the resting pose of a property was set to two different values.\n\n\
         Property: {binding}\n\n{first_owner} set it to {first_value}\n\n{second_owner} set it to {second_value}"
    )]
    RestingConflict {
        binding: CurveBinding,
        first_owner: String,
        first_value: RestingValue,
        second_owner: String,
        second_value: RestingValue,
    },

    #[error("scale compensation cannot work if multiple special materials are used on a single renderer: {renderer}")]
    MultipleSpecialMaterials { renderer: String },

    #[error("scale compensation requires every special material to be unlocked; unlock the material on {renderer}")]
    LockedSpecialMaterial { renderer: String },

    #[error("controller graph json: {0}")]
    GraphJson(String),
}

pub type BuildResult<T> = Result<T, BuildError>;
