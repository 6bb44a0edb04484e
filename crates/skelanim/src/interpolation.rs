//! Keyframe interpolation for bone tracks

use glam::{Quat, Vec3};

use crate::clip::Keyframe;

/// Trait for values that can be blended between two keyframes
pub trait Interpolate: Copy {
    /// Interpolate from self towards other by `t` in `[0, 1]`
    fn interpolate(&self, other: &Self, t: f32) -> Self;
}

impl Interpolate for Vec3 {
    fn interpolate(&self, other: &Self, t: f32) -> Self {
        self.lerp(*other, t)
    }
}

impl Interpolate for Quat {
    fn interpolate(&self, other: &Self, t: f32) -> Self {
        // Flip into the same hemisphere so slerp takes the short arc
        let other = if self.dot(*other) < 0.0 { -*other } else { *other };
        self.slerp(other, t).normalize()
    }
}

/// Find the index of the keyframe at or before the given time
///
/// Returns None if there are no keyframes. For a time before the first key
/// this returns 0; at or past the last key it returns the last index.
/// Otherwise the result is the earlier key of the bracketing pair
/// `[index]`, `[index + 1]`.
pub fn find_keyframe_index<T>(keys: &[Keyframe<T>], time: f32) -> Option<usize> {
    if keys.is_empty() {
        return None;
    }

    let last_index = keys.len() - 1;
    if keys.len() == 1 || time >= keys[last_index].time {
        return Some(last_index);
    }

    // Largest index where keys[index].time <= time
    let mut low = 0;
    let mut high = last_index;

    while low < high {
        let mid = (low + high).div_ceil(2);
        if keys[mid].time <= time {
            low = mid;
        } else {
            high = mid - 1;
        }
    }

    Some(low)
}

/// Interpolation factor between two key times, 0 for degenerate intervals
pub fn interpolation_factor(start: f32, end: f32, time: f32) -> f32 {
    let span = end - start;
    if span > 0.0 {
        ((time - start) / span).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Sample a keyframe channel at `time` (in ticks)
///
/// The caller wraps `time` into the clip duration; nothing is extrapolated.
pub fn sample_keys<T: Interpolate>(keys: &[Keyframe<T>], time: f32, fallback: T) -> T {
    let Some(index) = find_keyframe_index(keys, time) else {
        return fallback;
    };

    if index >= keys.len() - 1 {
        return keys[index].value;
    }

    let first = &keys[index];
    let second = &keys[index + 1];
    let t = interpolation_factor(first.time, second.time, time);
    first.value.interpolate(&second.value, t)
}

/// Sample a position channel, linear
pub fn sample_position(keys: &[Keyframe<Vec3>], time: f32, fallback: Vec3) -> Vec3 {
    sample_keys(keys, time, fallback)
}

/// Sample a rotation channel, shortest-arc slerp, normalized
pub fn sample_rotation(keys: &[Keyframe<Quat>], time: f32, fallback: Quat) -> Quat {
    sample_keys(keys, time, fallback)
}

/// Sample a scale channel, linear
pub fn sample_scale(keys: &[Keyframe<Vec3>], time: f32, fallback: Vec3) -> Vec3 {
    sample_keys(keys, time, fallback)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn keys(times: &[f32]) -> Vec<Keyframe<Vec3>> {
        times
            .iter()
            .map(|&t| Keyframe::new(t, Vec3::splat(t)))
            .collect()
    }

    #[test]
    fn test_find_keyframe_index_empty() {
        let keys: Vec<Keyframe<Vec3>> = vec![];
        assert_eq!(find_keyframe_index(&keys, 0.0), None);
    }

    #[test_case(-1.0 => Some(0); "before first")]
    #[test_case(0.0 => Some(0); "at first")]
    #[test_case(5.0 => Some(0); "between first and second")]
    #[test_case(10.0 => Some(1); "at second")]
    #[test_case(15.0 => Some(1); "between second and third")]
    #[test_case(25.0 => Some(2); "between third and last")]
    #[test_case(30.0 => Some(3); "at last")]
    #[test_case(99.0 => Some(3); "after last")]
    fn test_find_keyframe_index(time: f32) -> Option<usize> {
        find_keyframe_index(&keys(&[0.0, 10.0, 20.0, 30.0]), time)
    }

    #[test]
    fn test_single_key_is_constant() {
        let keys = vec![Keyframe::new(4.0, Vec3::new(1.0, 2.0, 3.0))];
        for time in [-10.0, 0.0, 4.0, 100.0] {
            assert_eq!(
                sample_position(&keys, time, Vec3::ZERO),
                Vec3::new(1.0, 2.0, 3.0)
            );
        }
    }

    #[test]
    fn test_no_keys_uses_fallback() {
        assert_eq!(sample_scale(&[], 1.0, Vec3::splat(2.0)), Vec3::splat(2.0));
        assert_eq!(
            sample_rotation(&[], 1.0, Quat::from_rotation_x(1.0)),
            Quat::from_rotation_x(1.0)
        );
    }

    #[test]
    fn test_linear_position() {
        let keys = vec![
            Keyframe::new(0.0, Vec3::ZERO),
            Keyframe::new(10.0, Vec3::new(10.0, 0.0, -10.0)),
        ];
        let v = sample_position(&keys, 2.5, Vec3::ZERO);
        assert!(v.abs_diff_eq(Vec3::new(2.5, 0.0, -2.5), 1e-5));

        // No extrapolation past the last key
        assert_eq!(
            sample_position(&keys, 20.0, Vec3::ZERO),
            Vec3::new(10.0, 0.0, -10.0)
        );
    }

    #[test]
    fn test_degenerate_interval() {
        assert_eq!(interpolation_factor(1.0, 1.0, 1.0), 0.0);
        let keys = vec![
            Keyframe::new(0.0, Vec3::ZERO),
            Keyframe::new(1.0, Vec3::X),
            Keyframe::new(1.0, Vec3::Y),
            Keyframe::new(2.0, Vec3::Z),
        ];
        // Binary search lands on the later duplicate and interpolates from it
        let v = sample_position(&keys, 1.5, Vec3::ZERO);
        assert!(v.abs_diff_eq(Vec3::new(0.0, 0.5, 0.5), 1e-5));
    }

    #[test]
    fn test_rotation_slerp_midpoint() {
        let keys = vec![
            Keyframe::new(0.0, Quat::IDENTITY),
            Keyframe::new(1.0, Quat::from_rotation_y(std::f32::consts::FRAC_PI_2)),
        ];
        let q = sample_rotation(&keys, 0.5, Quat::IDENTITY);
        assert!(q.abs_diff_eq(Quat::from_rotation_y(std::f32::consts::FRAC_PI_4), 1e-5));
        assert!((q.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_rotation_takes_shortest_arc() {
        let end = Quat::from_rotation_z(0.2);
        let keys = vec![
            Keyframe::new(0.0, Quat::IDENTITY),
            // Same rotation, opposite hemisphere
            Keyframe::new(1.0, -end),
        ];
        let q = sample_rotation(&keys, 0.5, Quat::IDENTITY);
        let expected = Quat::from_rotation_z(0.1);
        assert!(q.abs_diff_eq(expected, 1e-5) || q.abs_diff_eq(-expected, 1e-5));
    }
}
