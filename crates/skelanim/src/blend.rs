//! Pose blending
//!
//! Blends two palettes slot by slot with a linear interpolation of the full
//! matrices. This does not decompose and slerp rotations, so long blends
//! between very different orientations visibly shrink the mesh; keep
//! crossfades short.

use glam::Mat4;

use crate::pose::BoneMatrices;

/// Linear interpolation of two matrices, column by column
pub fn lerp_matrix(from: &Mat4, to: &Mat4, factor: f32) -> Mat4 {
    *from * (1.0 - factor) + *to * factor
}

/// Blend `from` towards `to` by `factor` into `out`
///
/// `factor` is clamped to `[0, 1]`; 0 copies `from`, 1 copies `to`.
pub fn blend(from: &BoneMatrices, to: &BoneMatrices, factor: f32, out: &mut BoneMatrices) {
    let factor = if factor.is_nan() {
        0.0
    } else {
        factor.clamp(0.0, 1.0)
    };

    if factor <= 0.0 {
        *out = *from;
        return;
    }
    if factor >= 1.0 {
        *out = *to;
        return;
    }

    for ((out, from), to) in out.iter_mut().zip(from.iter()).zip(to.iter()) {
        *out = lerp_matrix(from, to, factor);
    }
}
