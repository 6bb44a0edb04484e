//! Runtime playback state for an animator

use std::sync::Arc;

use crate::clip::AnimationClip;
use crate::graph::normalized_time;

/// Blend factors this close to 1 are treated as complete
const BLEND_EPSILON: f32 = 1e-5;

/// Playback position within one clip
#[derive(Debug, Clone)]
pub struct PlaybackCursor {
    /// Controller state driving this cursor, None for direct clip playback
    pub state: Option<String>,
    pub clip: Arc<AnimationClip>,
    /// Current time in clip ticks
    pub time: f32,
    pub playing: bool,
    pub looping: bool,
    /// Per-state speed multiplier
    pub speed: f32,
}

impl PlaybackCursor {
    /// Start a cursor at time 0
    pub fn new(state: Option<String>, clip: Arc<AnimationClip>, looping: bool, speed: f32) -> Self {
        Self {
            state,
            clip,
            time: 0.0,
            playing: true,
            looping,
            speed,
        }
    }

    /// Advance by `dt` seconds scaled by the animator's playback speed
    ///
    /// Does nothing once playback has stopped. Looping clips wrap into
    /// `[0, duration)`; others clamp to the end they ran past and stop.
    pub fn advance(&mut self, dt: f32, playback_speed: f32) {
        if !self.playing {
            return;
        }

        let duration = self.clip.duration();
        self.time += dt * self.clip.ticks_per_second() * self.speed * playback_speed;

        if !self.time.is_finite() {
            log::warn!(
                "Clip '{}': playback time became non-finite, rewinding",
                self.clip.name()
            );
            self.time = 0.0;
        }

        if self.looping {
            if duration <= 0.0 {
                self.time = 0.0;
            } else if self.time >= duration || self.time < 0.0 {
                self.time = self.time.rem_euclid(duration);
            }
        } else if self.time >= duration {
            self.time = duration.max(0.0);
            self.playing = false;
            log::debug!("Clip '{}' finished", self.clip.name());
        } else if self.time < 0.0 {
            self.time = 0.0;
            self.playing = false;
            log::debug!("Clip '{}' finished (reversed)", self.clip.name());
        }
    }

    /// Time as a fraction of the clip duration
    pub fn normalized_time(&self) -> f32 {
        normalized_time(self.time, self.clip.duration())
    }

    pub fn state_name(&self) -> Option<&str> {
        self.state.as_deref()
    }
}

/// An in-progress crossfade out of a previous cursor
#[derive(Debug, Clone)]
pub struct BlendState {
    /// Cursor being faded out
    pub from: PlaybackCursor,
    /// Seconds since the blend started
    pub elapsed: f32,
    /// Blend length in seconds, always positive
    pub duration: f32,
    /// Weight of the incoming cursor in `[0, 1]`
    pub factor: f32,
}

impl BlendState {
    pub fn new(from: PlaybackCursor, duration: f32) -> Self {
        Self {
            from,
            elapsed: 0.0,
            duration,
            factor: 0.0,
        }
    }

    /// Advance the outgoing cursor and the blend clock
    pub fn advance(&mut self, dt: f32, playback_speed: f32) {
        self.from.advance(dt, playback_speed);
        self.elapsed += dt;

        let factor = (self.elapsed / self.duration).clamp(0.0, 1.0);
        self.factor = if factor >= 1.0 - BLEND_EPSILON {
            1.0
        } else {
            factor
        };
    }

    pub fn is_complete(&self) -> bool {
        self.factor >= 1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn cursor(duration: f32, looping: bool, speed: f32) -> PlaybackCursor {
        let clip = Arc::new(AnimationClip::new("Clip", duration, 10.0));
        PlaybackCursor::new(Some("State".to_string()), clip, looping, speed)
    }

    #[test]
    fn test_cursor_new() {
        let cursor = cursor(10.0, true, 1.0);
        assert_eq!(cursor.time, 0.0);
        assert!(cursor.playing);
        assert_eq!(cursor.state_name(), Some("State"));
    }

    // Clip runs 10 ticks at 10 ticks/second, so one second is one full cycle
    #[test_case(0.25, 1.0 => 2.5; "within clip")]
    #[test_case(1.25, 1.0 => 2.5; "wraps once")]
    #[test_case(2.5, 1.0 => 5.0; "wraps twice")]
    #[test_case(0.25, 2.0 => 5.0; "state speed")]
    #[test_case(0.25, -1.0 => 7.5; "backwards wraps from end")]
    fn test_looping_advance(dt: f32, speed: f32) -> f32 {
        let mut cursor = cursor(10.0, true, speed);
        cursor.advance(dt, 1.0);
        assert!(cursor.playing);
        cursor.time
    }

    #[test]
    fn test_non_looping_clamps_and_stops() {
        let mut cursor = cursor(10.0, false, 1.0);
        cursor.advance(1.5, 1.0);
        assert_eq!(cursor.time, 10.0);
        assert!(!cursor.playing);
        assert_eq!(cursor.normalized_time(), 1.0);

        // Stays frozen at the end
        cursor.advance(0.5, 1.0);
        assert_eq!(cursor.time, 10.0);
        assert!(!cursor.playing);
    }

    #[test]
    fn test_non_looping_backwards_stops_at_start() {
        let mut cursor = cursor(10.0, false, -1.0);
        cursor.time = 5.0;
        cursor.advance(1.0, 1.0);
        assert_eq!(cursor.time, 0.0);
        assert!(!cursor.playing);
    }

    #[test]
    fn test_playback_speed_scales_time() {
        let mut cursor = cursor(10.0, true, 1.0);
        cursor.advance(0.25, 0.5);
        assert_eq!(cursor.time, 1.25);

        cursor.advance(0.25, 0.0);
        assert_eq!(cursor.time, 1.25);
    }

    #[test]
    fn test_zero_duration_looping() {
        let mut cursor = cursor(0.0, true, 1.0);
        cursor.advance(1.0, 1.0);
        assert_eq!(cursor.time, 0.0);
        assert_eq!(cursor.normalized_time(), 0.0);
    }

    #[test]
    fn test_blend_reaches_one() {
        let mut blend = BlendState::new(cursor(10.0, true, 1.0), 0.5);
        blend.advance(0.25, 1.0);
        assert_eq!(blend.factor, 0.5);
        assert!(!blend.is_complete());
        assert_eq!(blend.from.time, 2.5);

        blend.advance(0.25, 1.0);
        assert_eq!(blend.factor, 1.0);
        assert!(blend.is_complete());
    }

    #[test]
    fn test_blend_factor_snaps_to_one() {
        let mut blend = BlendState::new(cursor(10.0, true, 1.0), 0.3);
        for _ in 0..3 {
            blend.advance(0.1, 1.0);
        }
        // Three f32 steps of 0.1 do not sum to exactly 0.3
        assert_eq!(blend.factor, 1.0);
    }
}
