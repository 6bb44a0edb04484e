//! Formatting utilities

use glam::{Quat, Vec3};

/// Format a vector with three decimals per component
pub fn format_vec3(v: Vec3) -> String {
    format!("({:.3}, {:.3}, {:.3})", v.x, v.y, v.z)
}

/// Format a rotation as Euler angles in degrees (XYZ order)
pub fn format_rotation(q: Quat) -> String {
    let (x, y, z) = q.to_euler(glam::EulerRot::XYZ);
    format!(
        "({:.1}°, {:.1}°, {:.1}°)",
        positive_zero(x.to_degrees()),
        positive_zero(y.to_degrees()),
        positive_zero(z.to_degrees())
    )
}

// Keeps "-0.0" out of the output
fn positive_zero(value: f32) -> f32 {
    if value == 0.0 { 0.0 } else { value }
}

/// Format a duration in seconds
pub fn format_seconds(seconds: f32) -> String {
    if seconds.is_finite() {
        format!("{seconds:.3}s")
    } else {
        "N/A".to_string()
    }
}

/// Format a ratio in `[0, 1]` as a percentage
pub fn format_percentage(value: f32) -> String {
    format!("{:.1}%", value * 100.0)
}
