//! Typed parameter bag that drives transition conditions

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AnimationError, Result};

/// Kind of an animator parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParameterKind {
    #[serde(alias = "float")]
    Float,
    #[serde(alias = "int")]
    Int,
    #[serde(alias = "bool")]
    Bool,
    /// One-shot bool, cleared when a transition consumes it
    #[serde(alias = "trigger")]
    Trigger,
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Float => "float",
            Self::Int => "int",
            Self::Bool => "bool",
            Self::Trigger => "trigger",
        };
        f.write_str(name)
    }
}

/// Current value of a parameter; the variant fixes its kind
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParameterValue {
    Float(f32),
    Int(i32),
    Bool(bool),
    /// Armed flag
    Trigger(bool),
}

impl ParameterValue {
    /// Zero value of a kind
    pub fn default_for(kind: ParameterKind) -> Self {
        match kind {
            ParameterKind::Float => Self::Float(0.0),
            ParameterKind::Int => Self::Int(0),
            ParameterKind::Bool => Self::Bool(false),
            ParameterKind::Trigger => Self::Trigger(false),
        }
    }

    pub fn kind(&self) -> ParameterKind {
        match self {
            Self::Float(_) => ParameterKind::Float,
            Self::Int(_) => ParameterKind::Int,
            Self::Bool(_) => ParameterKind::Bool,
            Self::Trigger(_) => ParameterKind::Trigger,
        }
    }

    /// Numeric view used by comparison conditions
    pub fn as_f32(&self) -> f32 {
        match *self {
            Self::Float(v) => v,
            Self::Int(v) => v as f32,
            Self::Bool(v) | Self::Trigger(v) => {
                if v {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    /// Truth view used by True/False conditions
    pub fn is_truthy(&self) -> bool {
        match *self {
            Self::Float(v) => v != 0.0,
            Self::Int(v) => v != 0,
            Self::Bool(v) | Self::Trigger(v) => v,
        }
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Float(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Trigger(true) => f.write_str("armed"),
            Self::Trigger(false) => f.write_str("idle"),
        }
    }
}

/// A named parameter with its current (or default) value
#[derive(Debug, Clone, PartialEq)]
pub struct AnimatorParameter {
    pub name: String,
    pub value: ParameterValue,
}

impl AnimatorParameter {
    pub fn new(name: impl Into<String>, value: ParameterValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    pub fn float(name: impl Into<String>, value: f32) -> Self {
        Self::new(name, ParameterValue::Float(value))
    }

    pub fn int(name: impl Into<String>, value: i32) -> Self {
        Self::new(name, ParameterValue::Int(value))
    }

    pub fn bool(name: impl Into<String>, value: bool) -> Self {
        Self::new(name, ParameterValue::Bool(value))
    }

    pub fn trigger(name: impl Into<String>) -> Self {
        Self::new(name, ParameterValue::Trigger(false))
    }

    pub fn kind(&self) -> ParameterKind {
        self.value.kind()
    }
}

/// Per-animator parameter values
///
/// Writes to unknown names or with the wrong kind leave the store untouched
/// and return an error describing the configuration problem.
#[derive(Debug, Clone, Default)]
pub struct ParameterStore {
    parameters: Vec<AnimatorParameter>,
    index: HashMap<String, usize>,
}

impl ParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store from declared parameters, keeping declaration order
    pub fn from_parameters<'a>(parameters: impl IntoIterator<Item = &'a AnimatorParameter>) -> Self {
        let mut store = Self::new();
        for parameter in parameters {
            store.declare(parameter.clone());
        }
        store
    }

    /// Declare a parameter, replacing any previous one with the same name
    pub fn declare(&mut self, parameter: AnimatorParameter) {
        if let Some(&i) = self.index.get(&parameter.name) {
            log::warn!("Parameter '{}' declared twice, keeping the last", parameter.name);
            self.parameters[i] = parameter;
        } else {
            self.index
                .insert(parameter.name.clone(), self.parameters.len());
            self.parameters.push(parameter);
        }
    }

    pub fn get(&self, name: &str) -> Option<&AnimatorParameter> {
        self.index.get(name).map(|&i| &self.parameters[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn kind(&self, name: &str) -> Option<ParameterKind> {
        self.get(name).map(AnimatorParameter::kind)
    }

    /// Parameters in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &AnimatorParameter> {
        self.parameters.iter()
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    fn slot_mut(&mut self, name: &str, expected: ParameterKind) -> Result<&mut ParameterValue> {
        let &i = self
            .index
            .get(name)
            .ok_or_else(|| AnimationError::UnknownParameter(name.to_string()))?;
        let value = &mut self.parameters[i].value;
        if value.kind() != expected {
            return Err(AnimationError::ParameterKindMismatch {
                name: name.to_string(),
                expected,
                actual: value.kind(),
            });
        }
        Ok(value)
    }

    pub fn set_float(&mut self, name: &str, value: f32) -> Result<()> {
        *self.slot_mut(name, ParameterKind::Float)? = ParameterValue::Float(value);
        Ok(())
    }

    pub fn set_int(&mut self, name: &str, value: i32) -> Result<()> {
        *self.slot_mut(name, ParameterKind::Int)? = ParameterValue::Int(value);
        Ok(())
    }

    pub fn set_bool(&mut self, name: &str, value: bool) -> Result<()> {
        *self.slot_mut(name, ParameterKind::Bool)? = ParameterValue::Bool(value);
        Ok(())
    }

    /// Arm a trigger
    pub fn set_trigger(&mut self, name: &str) -> Result<()> {
        *self.slot_mut(name, ParameterKind::Trigger)? = ParameterValue::Trigger(true);
        Ok(())
    }

    /// Disarm a trigger without consuming it through a transition
    pub fn reset_trigger(&mut self, name: &str) -> Result<()> {
        *self.slot_mut(name, ParameterKind::Trigger)? = ParameterValue::Trigger(false);
        Ok(())
    }

    /// Clear a trigger, returning whether it was armed
    pub fn consume_trigger(&mut self, name: &str) -> Result<bool> {
        let slot = self.slot_mut(name, ParameterKind::Trigger)?;
        let was_armed = matches!(slot, ParameterValue::Trigger(true));
        *slot = ParameterValue::Trigger(false);
        Ok(was_armed)
    }

    /// Clear `name` if it is an armed trigger; other names are left alone
    pub fn disarm(&mut self, name: &str) -> bool {
        let Some(&i) = self.index.get(name) else {
            return false;
        };
        let slot = &mut self.parameters[i].value;
        if matches!(slot, ParameterValue::Trigger(true)) {
            *slot = ParameterValue::Trigger(false);
            true
        } else {
            false
        }
    }

    /// Float value; ints are widened, anything else or unknown reads 0.0
    pub fn get_float(&self, name: &str) -> f32 {
        match self.get(name).map(|p| p.value) {
            Some(ParameterValue::Float(v)) => v,
            Some(ParameterValue::Int(v)) => v as f32,
            _ => 0.0,
        }
    }

    /// Int value; floats are truncated, anything else or unknown reads 0
    pub fn get_int(&self, name: &str) -> i32 {
        match self.get(name).map(|p| p.value) {
            Some(ParameterValue::Int(v)) => v,
            Some(ParameterValue::Float(v)) => v as i32,
            _ => 0,
        }
    }

    /// Bool value or armed state of a trigger; unknown reads false
    pub fn get_bool(&self, name: &str) -> bool {
        match self.get(name).map(|p| p.value) {
            Some(ParameterValue::Bool(v) | ParameterValue::Trigger(v)) => v,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    #[fixture]
    fn store() -> ParameterStore {
        ParameterStore::from_parameters(&[
            AnimatorParameter::float("speed", 0.0),
            AnimatorParameter::int("combo", 2),
            AnimatorParameter::bool("grounded", true),
            AnimatorParameter::trigger("jump"),
        ])
    }

    #[rstest]
    fn test_defaults(store: ParameterStore) {
        assert_eq!(store.len(), 4);
        assert_eq!(store.get_float("speed"), 0.0);
        assert_eq!(store.get_int("combo"), 2);
        assert!(store.get_bool("grounded"));
        assert!(!store.get_bool("jump"));
    }

    #[rstest]
    fn test_overwrite(mut store: ParameterStore) {
        store.set_float("speed", 3.5).unwrap();
        store.set_int("combo", -1).unwrap();
        store.set_bool("grounded", false).unwrap();

        assert_eq!(store.get_float("speed"), 3.5);
        assert_eq!(store.get_int("combo"), -1);
        assert!(!store.get_bool("grounded"));
    }

    #[rstest]
    fn test_unknown_is_noop(mut store: ParameterStore) {
        let before: Vec<AnimatorParameter> = store.iter().cloned().collect();

        assert_eq!(
            store.set_float("missing", 1.0),
            Err(AnimationError::UnknownParameter("missing".to_string()))
        );
        assert!(store.set_trigger("missing").is_err());

        let after: Vec<AnimatorParameter> = store.iter().cloned().collect();
        assert_eq!(before, after);
        assert_eq!(store.get_float("missing"), 0.0);
        assert_eq!(store.get_int("missing"), 0);
        assert!(!store.get_bool("missing"));
    }

    #[rstest]
    fn test_kind_mismatch_is_noop(mut store: ParameterStore) {
        let err = store.set_float("grounded", 1.0).unwrap_err();
        assert_eq!(
            err,
            AnimationError::ParameterKindMismatch {
                name: "grounded".to_string(),
                expected: ParameterKind::Float,
                actual: ParameterKind::Bool,
            }
        );
        assert!(store.get_bool("grounded"));
    }

    #[rstest]
    fn test_trigger_lifecycle(mut store: ParameterStore) {
        assert_eq!(store.consume_trigger("jump"), Ok(false));

        store.set_trigger("jump").unwrap();
        assert!(store.get_bool("jump"));
        assert_eq!(store.consume_trigger("jump"), Ok(true));
        assert!(!store.get_bool("jump"));

        store.set_trigger("jump").unwrap();
        store.reset_trigger("jump").unwrap();
        assert_eq!(store.consume_trigger("jump"), Ok(false));
    }

    #[rstest]
    fn test_disarm_only_touches_armed_triggers(mut store: ParameterStore) {
        store.set_trigger("jump").unwrap();
        store.set_bool("grounded", true).unwrap();

        assert!(store.disarm("jump"));
        assert!(!store.get_bool("jump"));
        assert!(!store.disarm("jump"));

        assert!(!store.disarm("grounded"));
        assert!(store.get_bool("grounded"));
        assert!(!store.disarm("missing"));
        assert_eq!(store.len(), 4);
    }

    #[rstest]
    fn test_declaration_order(store: ParameterStore) {
        let names: Vec<&str> = store.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["speed", "combo", "grounded", "jump"]);
    }

    #[test]
    fn test_value_views() {
        assert_eq!(ParameterValue::Int(3).as_f32(), 3.0);
        assert_eq!(ParameterValue::Bool(true).as_f32(), 1.0);
        assert!(ParameterValue::Float(0.1).is_truthy());
        assert!(!ParameterValue::Trigger(false).is_truthy());
        assert_eq!(ParameterValue::Trigger(true).to_string(), "armed");
    }
}
