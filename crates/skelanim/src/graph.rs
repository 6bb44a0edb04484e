//! Transition graph evaluation
//!
//! Runs once per animator update, after playback time has advanced. The
//! current state's transitions are checked in declaration order and the
//! first one whose exit-time gate and conditions pass is selected. Trigger
//! parameters are only consumed by the transition that fires.

use crate::controller::{AnimatorController, Condition, ConditionMode, Transition};
use crate::parameters::{ParameterStore, ParameterValue};

/// Playback time divided by clip duration, 0 for a degenerate clip
pub fn normalized_time(time: f32, duration: f32) -> f32 {
    if duration > 0.0 && time.is_finite() {
        time / duration
    } else {
        0.0
    }
}

/// Check a single condition against the current parameter values
///
/// A condition on a trigger parameter holds exactly while the trigger is
/// armed, whatever its mode. Unknown parameters never satisfy a condition.
pub fn condition_holds(condition: &Condition, parameters: &ParameterStore) -> bool {
    let Some(parameter) = parameters.get(&condition.parameter) else {
        log::trace!("Condition on unknown parameter '{}'", condition.parameter);
        return false;
    };

    match parameter.value {
        ParameterValue::Trigger(armed) => armed,
        value => match condition.mode {
            ConditionMode::True | ConditionMode::Trigger => value.is_truthy(),
            ConditionMode::False => !value.is_truthy(),
            ConditionMode::Greater => value.as_f32() > condition.threshold,
            ConditionMode::Less => value.as_f32() < condition.threshold,
            ConditionMode::Equals => match value {
                ParameterValue::Int(v) => v == condition.threshold.round() as i32,
                _ => (value.as_f32() - condition.threshold).abs() <= f32::EPSILON,
            },
        },
    }
}

/// Check the exit-time and interrupt gates of a transition
pub fn exit_time_allows(transition: &Transition, normalized_time: f32) -> bool {
    if transition.has_exit_time && normalized_time < transition.exit_time {
        return false;
    }
    transition.can_interrupt_before_exit_time || normalized_time >= 1.0
}

/// Disarm every trigger parameter `transition`'s conditions reference
///
/// Conditions on non-trigger parameters are left alone.
pub fn consume_triggers(transition: &Transition, parameters: &mut ParameterStore) {
    for condition in &transition.conditions {
        parameters.disarm(&condition.parameter);
    }
}

/// Evaluator over an immutable controller
#[derive(Debug, Clone, Copy)]
pub struct TransitionGraph<'a> {
    controller: &'a AnimatorController,
}

impl<'a> TransitionGraph<'a> {
    pub fn new(controller: &'a AnimatorController) -> Self {
        Self { controller }
    }

    /// Find the first transition out of `state` that may fire now
    ///
    /// Does not touch the parameters. Transitions to states the controller
    /// does not define are skipped.
    pub fn select(
        &self,
        state: &str,
        normalized_time: f32,
        parameters: &ParameterStore,
    ) -> Option<&'a Transition> {
        let state = self.controller.state(state)?;

        state.transitions.iter().find(|transition| {
            exit_time_allows(transition, normalized_time)
                && self.controller.has_state(&transition.to_state)
                && transition
                    .conditions
                    .iter()
                    .all(|condition| condition_holds(condition, parameters))
        })
    }

    /// Select a transition and consume the triggers it references
    pub fn evaluate(
        &self,
        state: &str,
        normalized_time: f32,
        parameters: &mut ParameterStore,
    ) -> Option<&'a Transition> {
        let transition = self.select(state, normalized_time, parameters)?;
        consume_triggers(transition, parameters);

        log::debug!(
            "Transition {} -> {} at normalized time {:.3}",
            state,
            transition.to_state,
            normalized_time
        );
        Some(transition)
    }
}
