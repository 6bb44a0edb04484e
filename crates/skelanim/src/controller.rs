//! Declarative animator controller: states, parameters and guarded transitions
//!
//! Controllers are immutable configuration, loaded once and shared by every
//! animator that uses them. Runtime state lives in the
//! [`Animator`](crate::Animator).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::clip::AnimationLibrary;
use crate::error::AnimationError;
use crate::parameters::{AnimatorParameter, ParameterKind};

/// How a condition compares its parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConditionMode {
    #[serde(alias = "true")]
    True,
    #[serde(alias = "false")]
    False,
    #[serde(alias = "greater")]
    Greater,
    #[serde(alias = "less")]
    Less,
    #[serde(alias = "equals")]
    Equals,
    #[serde(alias = "trigger")]
    Trigger,
}

/// A single guard on a transition
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub parameter: String,
    pub mode: ConditionMode,
    pub threshold: f32,
}

impl Condition {
    pub fn new(parameter: impl Into<String>, mode: ConditionMode, threshold: f32) -> Self {
        Self {
            parameter: parameter.into(),
            mode,
            threshold,
        }
    }

    pub fn is_true(parameter: impl Into<String>) -> Self {
        Self::new(parameter, ConditionMode::True, 0.0)
    }

    pub fn is_false(parameter: impl Into<String>) -> Self {
        Self::new(parameter, ConditionMode::False, 0.0)
    }

    pub fn greater(parameter: impl Into<String>, threshold: f32) -> Self {
        Self::new(parameter, ConditionMode::Greater, threshold)
    }

    pub fn less(parameter: impl Into<String>, threshold: f32) -> Self {
        Self::new(parameter, ConditionMode::Less, threshold)
    }

    pub fn equals(parameter: impl Into<String>, threshold: f32) -> Self {
        Self::new(parameter, ConditionMode::Equals, threshold)
    }

    pub fn trigger(parameter: impl Into<String>) -> Self {
        Self::new(parameter, ConditionMode::Trigger, 0.0)
    }
}

/// Directed, guarded edge to another state
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub to_state: String,
    /// Crossfade length in seconds; 0 switches instantly
    pub blend_duration: f32,
    pub can_interrupt_before_exit_time: bool,
    pub has_exit_time: bool,
    /// Normalized time in `[0, 1]` before which the transition cannot fire
    pub exit_time: f32,
    /// All must hold
    pub conditions: Vec<Condition>,
}

impl Transition {
    /// Instant, interruptible transition with no conditions
    pub fn to(state: impl Into<String>) -> Self {
        Self {
            to_state: state.into(),
            blend_duration: 0.0,
            can_interrupt_before_exit_time: true,
            has_exit_time: false,
            exit_time: 0.0,
            conditions: Vec::new(),
        }
    }

    pub fn with_duration(mut self, seconds: f32) -> Self {
        self.blend_duration = seconds;
        self
    }

    pub fn with_exit_time(mut self, normalized: f32) -> Self {
        self.has_exit_time = true;
        self.exit_time = normalized;
        self
    }

    pub fn interruptible(mut self, can_interrupt: bool) -> Self {
        self.can_interrupt_before_exit_time = can_interrupt;
        self
    }

    pub fn when(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }
}

/// A named state bound to a clip
#[derive(Debug, Clone, PartialEq)]
pub struct AnimatorState {
    pub name: String,
    /// Name of the clip in the animation library
    pub clip: String,
    pub looping: bool,
    pub speed: f32,
    /// Evaluated in order, first match wins
    pub transitions: Vec<Transition>,
}

impl AnimatorState {
    /// Looping state at normal speed
    pub fn new(name: impl Into<String>, clip: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            clip: clip.into(),
            looping: true,
            speed: 1.0,
            transitions: Vec::new(),
        }
    }

    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_transition(mut self, transition: Transition) -> Self {
        self.transitions.push(transition);
        self
    }
}

/// Controller definition
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnimatorController {
    name: String,
    default_state: String,
    parameters: Vec<AnimatorParameter>,
    states: Vec<AnimatorState>,
    state_index: HashMap<String, usize>,
}

impl AnimatorController {
    pub fn new(name: impl Into<String>, default_state: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default_state: default_state.into(),
            ..Default::default()
        }
    }

    pub fn with_parameter(mut self, parameter: AnimatorParameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn with_state(mut self, state: AnimatorState) -> Self {
        self.add_state(state);
        self
    }

    /// Add a state, replacing any previous state with the same name
    pub fn add_state(&mut self, state: AnimatorState) {
        if let Some(&i) = self.state_index.get(&state.name) {
            log::warn!(
                "Controller '{}': state '{}' defined twice, keeping the last",
                self.name,
                state.name
            );
            self.states[i] = state;
        } else {
            self.state_index
                .insert(state.name.clone(), self.states.len());
            self.states.push(state);
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn default_state(&self) -> &str {
        &self.default_state
    }

    pub fn parameters(&self) -> &[AnimatorParameter] {
        &self.parameters
    }

    pub fn state(&self, name: &str) -> Option<&AnimatorState> {
        self.state_index.get(name).map(|&i| &self.states[i])
    }

    pub fn has_state(&self, name: &str) -> bool {
        self.state_index.contains_key(name)
    }

    /// States in declaration order
    pub fn states(&self) -> &[AnimatorState] {
        &self.states
    }

    fn parameter_kind(&self, name: &str) -> Option<ParameterKind> {
        self.parameters
            .iter()
            .rev()
            .find(|p| p.name == name)
            .map(AnimatorParameter::kind)
    }

    /// Check the controller against a clip library
    ///
    /// Errors prevent the controller from being entered; warnings describe
    /// transitions or conditions that can never behave as written.
    pub fn validate(&self, library: &AnimationLibrary) -> ValidationReport {
        let mut report = ValidationReport::default();

        if !self.has_state(&self.default_state) {
            report.errors.push(AnimationError::MissingDefaultState {
                controller: self.name.clone(),
                default_state: self.default_state.clone(),
            });
        }

        for state in &self.states {
            if !library.contains(&state.clip) {
                report.errors.push(AnimationError::MissingClip {
                    state: state.name.clone(),
                    clip: state.clip.clone(),
                });
            }

            for (i, transition) in state.transitions.iter().enumerate() {
                let edge = format!("{} -> {} (#{})", state.name, transition.to_state, i);

                if !self.has_state(&transition.to_state) {
                    report
                        .warnings
                        .push(format!("{edge}: target state does not exist"));
                }
                if transition.has_exit_time && !(0.0..=1.0).contains(&transition.exit_time) {
                    report.warnings.push(format!(
                        "{edge}: exit time {} outside [0, 1]",
                        transition.exit_time
                    ));
                }
                if transition.blend_duration < 0.0 {
                    report.warnings.push(format!(
                        "{edge}: negative blend duration {}",
                        transition.blend_duration
                    ));
                }
                if !transition.can_interrupt_before_exit_time && state.looping {
                    report.warnings.push(format!(
                        "{edge}: never fires, looping time wraps before normalized time reaches 1"
                    ));
                }

                for condition in &transition.conditions {
                    match self.parameter_kind(&condition.parameter) {
                        None => report.warnings.push(format!(
                            "{edge}: condition on unknown parameter '{}'",
                            condition.parameter
                        )),
                        Some(kind) if !mode_fits(condition.mode, kind) => {
                            report.warnings.push(format!(
                                "{edge}: {:?} condition on {} parameter '{}'",
                                condition.mode, kind, condition.parameter
                            ));
                        }
                        Some(_) => {}
                    }
                }
            }
        }

        report
    }
}

fn mode_fits(mode: ConditionMode, kind: ParameterKind) -> bool {
    match mode {
        ConditionMode::Trigger => kind == ParameterKind::Trigger,
        ConditionMode::True | ConditionMode::False => kind != ParameterKind::Trigger,
        ConditionMode::Greater | ConditionMode::Less | ConditionMode::Equals => {
            matches!(kind, ParameterKind::Float | ParameterKind::Int)
        }
    }
}

/// Outcome of [`AnimatorController::validate`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    pub errors: Vec<AnimationError>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}
