use std::io;
use thiserror::Error;

use crate::parameters::ParameterKind;

/// Configuration and data errors raised while building or driving an animator.
///
/// None of these are fatal for a running [`Animator`](crate::Animator): the
/// animator logs them and keeps its previous valid state.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnimationError {
    /// A parameter name that the store does not know about
    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    /// A write with a value of the wrong kind (e.g. `set_float` on a bool)
    #[error("Parameter '{name}' is a {actual} parameter, not {expected}")]
    ParameterKindMismatch {
        name: String,
        expected: ParameterKind,
        actual: ParameterKind,
    },

    /// A state name that the loaded controller does not define
    #[error("Unknown state: {0}")]
    UnknownState(String),

    /// The controller's default state does not exist
    #[error("Default state '{default_state}' not found in controller '{controller}'")]
    MissingDefaultState {
        controller: String,
        default_state: String,
    },

    /// A state references a clip that is not in the animation library
    #[error("State '{state}' references missing clip '{clip}'")]
    MissingClip { state: String, clip: String },

    /// No controller has been loaded into the animator
    #[error("No controller loaded")]
    NoController,

    /// Bone id does not fit in the output palette
    #[error("Bone '{bone}' has id {id}, must be below {max}")]
    BoneIdOutOfRange { bone: String, id: usize, max: usize },

    /// Two bones share the same palette slot
    #[error("Bones '{first}' and '{second}' share id {id}")]
    DuplicateBoneId {
        id: usize,
        first: String,
        second: String,
    },
}

/// Errors returned by the data loaders
#[derive(Error, Debug)]
pub enum LoadError {
    /// I/O error while reading a definition file
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input is not valid JSON for the expected definition
    #[error("Parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The input parsed but describes invalid data
    #[error("Invalid data: {0}")]
    Invalid(String),

    /// The input parsed but violates a model invariant
    #[error(transparent)]
    Model(#[from] AnimationError),
}

/// Result type using AnimationError
pub type Result<T> = std::result::Result<T, AnimationError>;
