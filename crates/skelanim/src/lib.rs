//! Runtime skeletal animation
//!
//! Selects an animation state from a parameterized transition graph, samples
//! keyframe tracks, crossfades between states and composes a skeleton into a
//! flat palette of bone matrices for GPU skinning.
//!
//! ```no_run
//! use std::sync::Arc;
//! use skelanim::{Animator, loader};
//!
//! # fn main() -> Result<(), skelanim::LoadError> {
//! let skeleton = Arc::new(loader::skeleton_from_path("character.skeleton.json")?);
//! let library = loader::library_from_paths(["character.clips.json"])?;
//! let controller = Arc::new(loader::controller_from_path("character.controller.json")?);
//!
//! let mut animator = Animator::with_skeleton(skeleton);
//! animator.load_controller(controller, &library)?;
//!
//! animator.set_float("speed", 1.2);
//! animator.advance(1.0 / 60.0);
//! let palette = animator.bone_matrices();
//! # let _ = palette;
//! # Ok(())
//! # }
//! ```

pub mod animator;
pub mod blend;
pub mod clip;
pub mod controller;
pub mod error;
pub mod graph;
pub mod interpolation;
pub mod loader;
pub mod parameters;
pub mod pose;
pub mod skeleton;
pub mod state;

// Re-export common types
pub use animator::Animator;
pub use clip::{AnimationClip, AnimationLibrary, BoneTrack, Keyframe};
pub use controller::{
    AnimatorController, AnimatorState, Condition, ConditionMode, Transition, ValidationReport,
};
pub use error::{AnimationError, LoadError, Result};
pub use parameters::{AnimatorParameter, ParameterKind, ParameterStore, ParameterValue};
pub use pose::{BoneMatrices, PoseEvaluator};
pub use skeleton::{BoneInfo, Node, Skeleton};

/// Number of slots in the bone matrix palette
pub const MAX_BONES: usize = 256;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
