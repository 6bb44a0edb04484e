//! Hierarchical pose evaluation into a bone matrix palette
//!
//! The skeleton is walked depth-first from the root. Each node's local
//! transform comes from the clip's track when one exists, otherwise from the
//! node's bind pose, and is composed with the parent's global transform.
//! Bones write `offset * global * global_inverse` into their palette slot.

use glam::Mat4;

use crate::MAX_BONES;
use crate::clip::{AnimationClip, BoneTrack};
use crate::interpolation::{sample_position, sample_rotation, sample_scale};
use crate::skeleton::{Node, Skeleton};

/// Fixed-size palette consumed by the skinning shader
pub type BoneMatrices = [Mat4; MAX_BONES];

/// Heap-allocated palette with every slot set to identity
pub fn identity_palette() -> Box<BoneMatrices> {
    Box::new([Mat4::IDENTITY; MAX_BONES])
}

/// Local transform of a node at `time` (ticks)
///
/// Channels missing from the track fall back to the node's bind channels; a
/// node without a track keeps its bind transform unchanged.
pub fn local_transform(node: &Node, track: Option<&BoneTrack>, time: f32) -> Mat4 {
    let Some(track) = track.filter(|track| track.has_data()) else {
        return *node.local_bind_transform();
    };

    let bind = node.bind_pose();
    let translation = sample_position(&track.positions, time, bind.translation);
    let rotation = sample_rotation(&track.rotations, time, bind.rotation);
    let scale = sample_scale(&track.scales, time, bind.scale);

    Mat4::from_scale_rotation_translation(scale, rotation, translation)
}

/// Pose evaluator bound to one skeleton
#[derive(Debug, Clone, Copy)]
pub struct PoseEvaluator<'a> {
    skeleton: &'a Skeleton,
}

impl<'a> PoseEvaluator<'a> {
    pub fn new(skeleton: &'a Skeleton) -> Self {
        Self { skeleton }
    }

    /// Evaluate `clip` at `time` (ticks) into `out`
    ///
    /// Every slot is reset to identity first, so slots no bone maps to stay
    /// identity. With no clip the bind pose is produced.
    pub fn evaluate(&self, clip: Option<&AnimationClip>, time: f32, out: &mut BoneMatrices) {
        out.fill(Mat4::IDENTITY);
        self.visit(self.skeleton.root(), &Mat4::IDENTITY, clip, time, out);
    }

    /// Bind pose palette
    pub fn evaluate_bind_pose(&self, out: &mut BoneMatrices) {
        self.evaluate(None, 0.0, out);
    }

    fn visit(
        &self,
        node: &Node,
        parent: &Mat4,
        clip: Option<&AnimationClip>,
        time: f32,
        out: &mut BoneMatrices,
    ) {
        let track = clip.and_then(|clip| clip.track(node.name()));
        let global = *parent * local_transform(node, track, time);

        if let Some(info) = self.skeleton.bone_info(node.name()) {
            out[info.id] =
                info.offset_matrix * global * *self.skeleton.global_inverse_transform();
        }

        for child in node.children() {
            self.visit(child, &global, clip, time, out);
        }
    }
}

/// Evaluate a fresh palette for `clip` at `time`
pub fn evaluate_pose(clip: &AnimationClip, time: f32, skeleton: &Skeleton) -> Box<BoneMatrices> {
    let mut out = identity_palette();
    PoseEvaluator::new(skeleton).evaluate(Some(clip), time, &mut out);
    out
}
