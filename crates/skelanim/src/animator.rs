//! Per-entity animator
//!
//! The [`Animator`] owns the runtime playback cursor, an optional crossfade
//! and the parameter values of one animated entity. Skeleton, clips and the
//! controller are shared read-only handles. Each call to
//! [`Animator::advance`] moves playback forward, runs the transition graph
//! and refreshes the bone matrix palette.

use std::collections::HashMap;
use std::sync::Arc;

use crate::blend::blend;
use crate::clip::{AnimationClip, AnimationLibrary};
use crate::controller::AnimatorController;
use crate::error::{AnimationError, Result};
use crate::graph::{TransitionGraph, consume_triggers};
use crate::parameters::ParameterStore;
use crate::pose::{BoneMatrices, PoseEvaluator, identity_palette};
use crate::skeleton::Skeleton;
use crate::state::{BlendState, PlaybackCursor};

/// Drives one skeleton from a controller
///
/// Configuration problems (unknown states or parameters, missing clips) are
/// logged and leave the animator in its previous valid state. `advance`
/// never fails and always leaves a usable palette.
#[derive(Debug, Clone)]
pub struct Animator {
    skeleton: Option<Arc<Skeleton>>,
    controller: Option<Arc<AnimatorController>>,
    /// Clip resolved for each controller state at load time
    state_clips: HashMap<String, Arc<AnimationClip>>,
    parameters: ParameterStore,
    current: Option<PlaybackCursor>,
    blend: Option<BlendState>,
    /// Global multiplier on top of per-state speed
    playback_speed: f32,
    paused: bool,
    bone_matrices: Box<BoneMatrices>,
    scratch_from: Box<BoneMatrices>,
    scratch_to: Box<BoneMatrices>,
}

impl Default for Animator {
    fn default() -> Self {
        Self::new()
    }
}

impl Animator {
    /// Create an idle animator with an identity palette
    pub fn new() -> Self {
        Self {
            skeleton: None,
            controller: None,
            state_clips: HashMap::new(),
            parameters: ParameterStore::new(),
            current: None,
            blend: None,
            playback_speed: 1.0,
            paused: false,
            bone_matrices: identity_palette(),
            scratch_from: identity_palette(),
            scratch_to: identity_palette(),
        }
    }

    /// Create an animator bound to a skeleton, starting in bind pose
    pub fn with_skeleton(skeleton: Arc<Skeleton>) -> Self {
        let mut animator = Self::new();
        animator.set_skeleton(skeleton);
        animator
    }

    /// Bind the skeleton whose bones this animator drives
    pub fn set_skeleton(&mut self, skeleton: Arc<Skeleton>) {
        log::debug!(
            "Animator bound to skeleton with {} bones ({} nodes)",
            skeleton.bone_count(),
            skeleton.node_count()
        );
        self.skeleton = Some(skeleton);
        self.update_pose();
    }

    /// Load a controller and enter its default state
    ///
    /// Any previous playback, blend and parameter values are discarded
    /// first. If the default state or any state's clip is missing, the
    /// controller is not kept: the animator stays idle in bind pose with the
    /// controller's parameters declared, and the first problem is returned.
    pub fn load_controller(
        &mut self,
        controller: Arc<AnimatorController>,
        library: &AnimationLibrary,
    ) -> Result<()> {
        self.current = None;
        self.blend = None;
        self.state_clips.clear();
        self.parameters = ParameterStore::from_parameters(controller.parameters());
        self.controller = Some(Arc::clone(&controller));

        let mut first_error = None;

        if !controller.has_state(controller.default_state()) {
            let err = AnimationError::MissingDefaultState {
                controller: controller.name().to_string(),
                default_state: controller.default_state().to_string(),
            };
            log::warn!("{err}");
            first_error = Some(err);
        }

        for state in controller.states() {
            match library.get(&state.clip) {
                Some(clip) => {
                    self.state_clips.insert(state.name.clone(), clip);
                }
                None => {
                    let err = AnimationError::MissingClip {
                        state: state.name.clone(),
                        clip: state.clip.clone(),
                    };
                    log::warn!("Controller '{}': {err}", controller.name());
                    first_error.get_or_insert(err);
                }
            }
        }

        if let Some(err) = first_error {
            self.controller = None;
            self.state_clips.clear();
            self.update_pose();
            return Err(err);
        }

        log::debug!(
            "Loaded controller '{}' ({} states, {} parameters)",
            controller.name(),
            controller.states().len(),
            controller.parameters().len()
        );

        self.enter_state(controller.default_state(), 0.0)?;
        self.update_pose();
        Ok(())
    }

    /// Switch to a state immediately, restarting it from time 0
    pub fn play(&mut self, state: &str) -> Result<()> {
        self.cross_fade(state, 0.0)
    }

    /// Crossfade into a state over `duration` seconds
    ///
    /// Without a current clip, or with a non-positive duration, this is a
    /// hard cut like [`play`](Self::play). A blend already in progress is
    /// dropped; the current cursor becomes the new blend source.
    pub fn cross_fade(&mut self, state: &str, duration: f32) -> Result<()> {
        self.enter_state(state, duration)
            .inspect_err(|err| log::warn!("Cannot enter state: {err}"))?;
        self.update_pose();
        Ok(())
    }

    /// Play a clip directly, bypassing the controller
    ///
    /// The transition graph is not evaluated while a clip plays this way.
    pub fn play_clip(&mut self, clip: Arc<AnimationClip>, looping: bool) {
        self.cross_fade_clip(clip, looping, 0.0);
    }

    /// Crossfade into a clip directly, bypassing the controller
    pub fn cross_fade_clip(&mut self, clip: Arc<AnimationClip>, looping: bool, duration: f32) {
        log::debug!("Playing clip '{}' directly", clip.name());
        self.start_cursor(PlaybackCursor::new(None, clip, looping, 1.0), duration);
        self.update_pose();
    }

    fn enter_state(&mut self, name: &str, duration: f32) -> Result<()> {
        let controller = self.controller.as_ref().ok_or(AnimationError::NoController)?;
        let state = controller
            .state(name)
            .ok_or_else(|| AnimationError::UnknownState(name.to_string()))?;
        let clip = self
            .state_clips
            .get(name)
            .cloned()
            .ok_or_else(|| AnimationError::MissingClip {
                state: name.to_string(),
                clip: state.clip.clone(),
            })?;

        let cursor = PlaybackCursor::new(Some(name.to_string()), clip, state.looping, state.speed);
        log::debug!("Entering state '{name}' (blend {duration}s)");
        self.start_cursor(cursor, duration);
        Ok(())
    }

    fn start_cursor(&mut self, cursor: PlaybackCursor, duration: f32) {
        let previous = self.current.take();
        self.blend = match previous {
            Some(previous) if duration > 0.0 => Some(BlendState::new(previous, duration)),
            _ => None,
        };
        self.current = Some(cursor);
    }

    /// Set the global playback speed multiplier
    pub fn set_playback_speed(&mut self, speed: f32) {
        self.playback_speed = speed;
    }

    pub fn playback_speed(&self) -> f32 {
        self.playback_speed
    }

    /// Freeze playback; `advance` does nothing until resumed
    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn set_float(&mut self, name: &str, value: f32) {
        if let Err(err) = self.parameters.set_float(name, value) {
            log::warn!("{err}");
        }
    }

    pub fn set_int(&mut self, name: &str, value: i32) {
        if let Err(err) = self.parameters.set_int(name, value) {
            log::warn!("{err}");
        }
    }

    pub fn set_bool(&mut self, name: &str, value: bool) {
        if let Err(err) = self.parameters.set_bool(name, value) {
            log::warn!("{err}");
        }
    }

    pub fn set_trigger(&mut self, name: &str) {
        if let Err(err) = self.parameters.set_trigger(name) {
            log::warn!("{err}");
        }
    }

    pub fn reset_trigger(&mut self, name: &str) {
        if let Err(err) = self.parameters.reset_trigger(name) {
            log::warn!("{err}");
        }
    }

    pub fn get_float(&self, name: &str) -> f32 {
        self.parameters.get_float(name)
    }

    pub fn get_int(&self, name: &str) -> i32 {
        self.parameters.get_int(name)
    }

    pub fn get_bool(&self, name: &str) -> bool {
        self.parameters.get_bool(name)
    }

    pub fn parameters(&self) -> &ParameterStore {
        &self.parameters
    }

    /// Advance playback by `dt` seconds
    ///
    /// Does nothing while paused or when nothing is playing. Otherwise the
    /// current cursor and any crossfade source move forward, the transition
    /// graph is evaluated once, and the palette is rebuilt.
    pub fn advance(&mut self, dt: f32) {
        if !self.is_playing() {
            return;
        }

        let speed = self.playback_speed;
        if let Some(current) = self.current.as_mut() {
            current.advance(dt, speed);
        }

        if let Some(blend) = self.blend.as_mut() {
            blend.advance(dt, speed);
            if blend.is_complete() {
                log::trace!("Crossfade complete after {:.3}s", blend.elapsed);
                self.blend = None;
            }
        }

        self.evaluate_transitions();
        self.update_pose();
    }

    fn evaluate_transitions(&mut self) {
        let Some(controller) = self.controller.clone() else {
            return;
        };
        let Some(current) = self.current.as_ref() else {
            return;
        };
        let Some(state) = current.state.clone() else {
            return;
        };

        let normalized = current.normalized_time();
        let Some(transition) =
            TransitionGraph::new(&controller).select(&state, normalized, &self.parameters)
        else {
            return;
        };

        // Triggers stay armed unless the target state is actually entered
        if let Err(err) = self.enter_state(&transition.to_state, transition.blend_duration) {
            log::warn!("Transition from '{state}' failed: {err}");
            return;
        }
        consume_triggers(transition, &mut self.parameters);
        log::debug!(
            "Transition {} -> {} at normalized time {:.3}",
            state,
            transition.to_state,
            normalized
        );
    }

    fn update_pose(&mut self) {
        let Some(skeleton) = self.skeleton.as_deref() else {
            return;
        };
        let evaluator = PoseEvaluator::new(skeleton);

        match (&self.current, &self.blend) {
            (None, _) => evaluator.evaluate_bind_pose(&mut self.bone_matrices),
            (Some(current), None) => {
                evaluator.evaluate(Some(&*current.clip), current.time, &mut self.bone_matrices)
            }
            (Some(current), Some(fade)) => {
                evaluator.evaluate(Some(&*fade.from.clip), fade.from.time, &mut self.scratch_from);
                evaluator.evaluate(Some(&*current.clip), current.time, &mut self.scratch_to);
                blend(
                    &self.scratch_from,
                    &self.scratch_to,
                    fade.factor,
                    &mut self.bone_matrices,
                );
            }
        }
    }

    /// Palette produced by the last update, for the skinning pass
    pub fn bone_matrices(&self) -> &BoneMatrices {
        &self.bone_matrices
    }

    pub fn skeleton(&self) -> Option<&Arc<Skeleton>> {
        self.skeleton.as_ref()
    }

    pub fn controller(&self) -> Option<&Arc<AnimatorController>> {
        self.controller.as_ref()
    }

    /// Name of the active controller state, None when idle or playing a
    /// clip directly
    pub fn current_state_name(&self) -> Option<&str> {
        self.current.as_ref().and_then(PlaybackCursor::state_name)
    }

    pub fn current_clip(&self) -> Option<&Arc<AnimationClip>> {
        self.current.as_ref().map(|cursor| &cursor.clip)
    }

    /// Current time in clip ticks
    pub fn current_time(&self) -> f32 {
        self.current.as_ref().map_or(0.0, |cursor| cursor.time)
    }

    pub fn normalized_time(&self) -> f32 {
        self.current
            .as_ref()
            .map_or(0.0, PlaybackCursor::normalized_time)
    }

    /// Whether `advance` will move anything
    ///
    /// A finished non-looping clip still counts as playing while a crossfade
    /// out of it is running.
    pub fn is_playing(&self) -> bool {
        !self.paused
            && (self.current.as_ref().is_some_and(|cursor| cursor.playing)
                || self.blend.is_some())
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_blending(&self) -> bool {
        self.blend.is_some()
    }

    /// Weight of the current cursor; 1 when no crossfade is running
    pub fn blend_factor(&self) -> f32 {
        self.blend.as_ref().map_or(1.0, |fade| fade.factor)
    }
}
