//! Animation clips and the shared clip library

use std::collections::HashMap;
use std::sync::Arc;

use glam::{Quat, Vec3};

/// Ticks per second used when a clip does not declare a rate
pub const DEFAULT_TICKS_PER_SECOND: f32 = 25.0;

/// A single keyed value on a track
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keyframe<T> {
    pub value: T,
    /// Time in clip ticks
    pub time: f32,
}

impl<T> Keyframe<T> {
    pub const fn new(time: f32, value: T) -> Self {
        Self { value, time }
    }
}

/// Keyframes for one bone, each channel independently sparse
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoneTrack {
    pub bone_name: String,
    pub positions: Vec<Keyframe<Vec3>>,
    pub rotations: Vec<Keyframe<Quat>>,
    pub scales: Vec<Keyframe<Vec3>>,
}

impl BoneTrack {
    pub fn new(bone_name: impl Into<String>) -> Self {
        Self {
            bone_name: bone_name.into(),
            ..Default::default()
        }
    }

    pub fn with_position(mut self, time: f32, value: Vec3) -> Self {
        self.positions.push(Keyframe::new(time, value));
        self
    }

    pub fn with_rotation(mut self, time: f32, value: Quat) -> Self {
        self.rotations.push(Keyframe::new(time, value));
        self
    }

    pub fn with_scale(mut self, time: f32, value: Vec3) -> Self {
        self.scales.push(Keyframe::new(time, value));
        self
    }

    /// Check if any channel has keys
    pub fn has_data(&self) -> bool {
        !self.positions.is_empty() || !self.rotations.is_empty() || !self.scales.is_empty()
    }

    /// Time of the latest key on any channel
    pub fn last_key_time(&self) -> Option<f32> {
        let positions = self.positions.last().map(|k| k.time);
        let rotations = self.rotations.last().map(|k| k.time);
        let scales = self.scales.last().map(|k| k.time);
        [positions, rotations, scales]
            .into_iter()
            .flatten()
            .reduce(f32::max)
    }

    /// Order every channel by time; sampling relies on it
    fn sort_keys(&mut self) {
        self.positions.sort_by(|a, b| a.time.total_cmp(&b.time));
        self.rotations.sort_by(|a, b| a.time.total_cmp(&b.time));
        self.scales.sort_by(|a, b| a.time.total_cmp(&b.time));
    }
}

/// Named, fixed-duration set of per-bone tracks
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationClip {
    name: String,
    duration_ticks: f32,
    ticks_per_second: f32,
    tracks: HashMap<String, BoneTrack>,
}

impl AnimationClip {
    pub fn new(name: impl Into<String>, duration_ticks: f32, ticks_per_second: f32) -> Self {
        Self {
            name: name.into(),
            duration_ticks,
            ticks_per_second,
            tracks: HashMap::new(),
        }
    }

    /// Add a track (builder style); keys are sorted by time
    pub fn with_track(mut self, track: BoneTrack) -> Self {
        self.add_track(track);
        self
    }

    /// Add or replace the track for `track.bone_name`
    pub fn add_track(&mut self, mut track: BoneTrack) {
        track.sort_keys();
        if self.tracks.insert(track.bone_name.clone(), track).is_some() {
            log::debug!("Clip '{}': replaced duplicate bone track", self.name);
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Duration in ticks
    pub fn duration(&self) -> f32 {
        self.duration_ticks
    }

    /// Declared rate, or [`DEFAULT_TICKS_PER_SECOND`] if the clip declares none
    pub fn ticks_per_second(&self) -> f32 {
        if self.ticks_per_second > 0.0 {
            self.ticks_per_second
        } else {
            DEFAULT_TICKS_PER_SECOND
        }
    }

    pub fn duration_seconds(&self) -> f32 {
        self.duration_ticks / self.ticks_per_second()
    }

    pub fn track(&self, bone_name: &str) -> Option<&BoneTrack> {
        self.tracks.get(bone_name)
    }

    pub fn tracks(&self) -> impl Iterator<Item = &BoneTrack> {
        self.tracks.values()
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// Zero duration or no tracks: evaluates as a constant/bind pose
    pub fn is_degenerate(&self) -> bool {
        self.duration_ticks <= 0.0 || self.tracks.values().all(|t| !t.has_data())
    }
}

/// Clips addressable by name, shared read-only across animators
#[derive(Debug, Clone, Default)]
pub struct AnimationLibrary {
    clips: HashMap<String, Arc<AnimationClip>>,
}

impl AnimationLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a clip under its own name, returning the shared handle
    pub fn insert(&mut self, clip: AnimationClip) -> Arc<AnimationClip> {
        let clip = Arc::new(clip);
        if self
            .clips
            .insert(clip.name().to_string(), Arc::clone(&clip))
            .is_some()
        {
            log::warn!("Animation library: replaced clip '{}'", clip.name());
        }
        clip
    }

    pub fn get(&self, name: &str) -> Option<Arc<AnimationClip>> {
        self.clips.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.clips.contains_key(name)
    }

    /// Clip names in sorted order
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.clips.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }
}

impl FromIterator<AnimationClip> for AnimationLibrary {
    fn from_iter<I: IntoIterator<Item = AnimationClip>>(iter: I) -> Self {
        let mut library = Self::new();
        for clip in iter {
            library.insert(clip);
        }
        library
    }
}
