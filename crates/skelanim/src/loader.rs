//! Typed JSON definitions for controllers, clips and skeletons
//!
//! Definitions are deserialized into plain `*Def` structs with `serde` and
//! then converted into the runtime model, where semantic checks happen.
//! Parsing and validation failures are reported as [`LoadError`] so callers
//! can tell a file that failed to load from one that loaded but is empty.
//!
//! Field names are camelCase. Matrices are 16 floats in column-major order,
//! rotations are `[x, y, z, w]` quaternions.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::clip::{AnimationClip, AnimationLibrary, BoneTrack, Keyframe};
use crate::controller::{AnimatorController, AnimatorState, Condition, ConditionMode, Transition};
use crate::error::LoadError;
use crate::parameters::{AnimatorParameter, ParameterKind, ParameterValue};
use crate::skeleton::{BoneInfo, Node, Skeleton};

type LoadResult<T> = std::result::Result<T, LoadError>;

fn default_true() -> bool {
    true
}

fn default_speed() -> f32 {
    1.0
}

/// Parameter default as written in JSON: a number or a bool
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DefaultValueDef {
    Bool(bool),
    Number(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterDef {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ParameterKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<DefaultValueDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionDef {
    pub parameter: String,
    pub mode: ConditionMode,
    #[serde(default)]
    pub threshold: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionDef {
    pub to_state: String,
    /// Blend duration in seconds
    #[serde(default)]
    pub duration: f32,
    #[serde(default = "default_true")]
    pub can_interrupt: bool,
    #[serde(default)]
    pub exit_time: f32,
    #[serde(default)]
    pub has_exit_time: bool,
    #[serde(default)]
    pub conditions: Vec<ConditionDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateDef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clip_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clip_name: Option<String>,
    #[serde(rename = "loop", default = "default_true")]
    pub looping: bool,
    #[serde(default = "default_speed")]
    pub speed: f32,
    #[serde(default)]
    pub transitions: Vec<TransitionDef>,
}

impl StateDef {
    /// Clip this state plays: `clipRef`, then `clipName`, then the state name
    pub fn clip(&self) -> &str {
        self.clip_ref
            .as_deref()
            .or(self.clip_name.as_deref())
            .unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControllerDef {
    pub name: String,
    pub default_state: String,
    #[serde(default)]
    pub parameters: Vec<ParameterDef>,
    #[serde(default)]
    pub states: Vec<StateDef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeyDef<T> {
    pub time: f32,
    pub value: T,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackDef {
    pub bone: String,
    #[serde(default)]
    pub positions: Vec<KeyDef<[f32; 3]>>,
    #[serde(default)]
    pub rotations: Vec<KeyDef<[f32; 4]>>,
    #[serde(default)]
    pub scales: Vec<KeyDef<[f32; 3]>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipDef {
    pub name: String,
    /// Duration in ticks
    pub duration: f32,
    /// 0 or missing selects the default rate
    #[serde(default)]
    pub ticks_per_second: f32,
    #[serde(default)]
    pub tracks: Vec<TrackDef>,
}

/// A clip file holds one clip or a list of them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClipFileDef {
    One(ClipDef),
    Many(Vec<ClipDef>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDef {
    pub name: String,
    /// Local bind transform, identity when missing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<[f32; 16]>,
    #[serde(default)]
    pub children: Vec<NodeDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoneDef {
    pub name: String,
    pub id: usize,
    pub offset: [f32; 16],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkeletonDef {
    pub root: NodeDef,
    #[serde(default)]
    pub bones: Vec<BoneDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_inverse_transform: Option<[f32; 16]>,
}

fn invalid(message: impl Into<String>) -> LoadError {
    LoadError::Invalid(message.into())
}

fn matrix(values: &[f32; 16], what: &str) -> LoadResult<Mat4> {
    if values.iter().any(|v| !v.is_finite()) {
        return Err(invalid(format!("{what}: matrix has non-finite values")));
    }
    Ok(Mat4::from_cols_array(values))
}

impl ParameterDef {
    fn into_parameter(self) -> LoadResult<AnimatorParameter> {
        if self.name.is_empty() {
            return Err(invalid("parameter with empty name"));
        }

        let value = match (self.kind, self.default_value) {
            (kind, None) => ParameterValue::default_for(kind),
            (ParameterKind::Float, Some(DefaultValueDef::Number(v))) => {
                ParameterValue::Float(v as f32)
            }
            (ParameterKind::Int, Some(DefaultValueDef::Number(v))) => {
                if v.fract() != 0.0 {
                    log::warn!("Int parameter '{}': default {v} truncated", self.name);
                }
                ParameterValue::Int(v as i32)
            }
            (ParameterKind::Bool, Some(DefaultValueDef::Bool(v))) => ParameterValue::Bool(v),
            (ParameterKind::Bool, Some(DefaultValueDef::Number(v))) => {
                ParameterValue::Bool(v != 0.0)
            }
            // Triggers always start disarmed
            (ParameterKind::Trigger, Some(_)) => ParameterValue::Trigger(false),
            (kind, Some(DefaultValueDef::Bool(v))) => {
                return Err(invalid(format!(
                    "{kind} parameter '{}' has bool default {v}",
                    self.name
                )));
            }
        };

        Ok(AnimatorParameter::new(self.name, value))
    }
}

impl TransitionDef {
    fn into_transition(self) -> Transition {
        Transition {
            to_state: self.to_state,
            blend_duration: self.duration.max(0.0),
            can_interrupt_before_exit_time: self.can_interrupt,
            has_exit_time: self.has_exit_time,
            exit_time: self.exit_time,
            conditions: self
                .conditions
                .into_iter()
                .map(|c| Condition::new(c.parameter, c.mode, c.threshold))
                .collect(),
        }
    }
}

impl ControllerDef {
    /// Convert into a controller, rejecting structurally broken definitions
    ///
    /// Dangling references (missing default state, unknown transition
    /// targets or clips) are not errors here; they are reported by
    /// [`AnimatorController::validate`] against a clip library.
    pub fn into_controller(self) -> LoadResult<AnimatorController> {
        if self.states.is_empty() {
            log::warn!("Controller '{}' defines no states", self.name);
        }

        let mut controller = AnimatorController::new(self.name, self.default_state);

        let mut seen = HashSet::new();
        for parameter in self.parameters {
            if !seen.insert(parameter.name.clone()) {
                return Err(invalid(format!("duplicate parameter '{}'", parameter.name)));
            }
            controller = controller.with_parameter(parameter.into_parameter()?);
        }

        let mut seen = HashSet::new();
        for state in self.states {
            if state.name.is_empty() {
                return Err(invalid("state with empty name"));
            }
            if !seen.insert(state.name.clone()) {
                return Err(invalid(format!("duplicate state '{}'", state.name)));
            }

            let mut runtime = AnimatorState::new(state.name.clone(), state.clip())
                .looping(state.looping)
                .with_speed(state.speed);
            runtime.transitions = state
                .transitions
                .into_iter()
                .map(TransitionDef::into_transition)
                .collect();
            controller.add_state(runtime);
        }

        Ok(controller)
    }
}

fn keys<T, const N: usize>(
    keys: Vec<KeyDef<[f32; N]>>,
    bone: &str,
    convert: impl Fn([f32; N]) -> Option<T>,
) -> LoadResult<Vec<Keyframe<T>>> {
    keys.into_iter()
        .map(|key| {
            if !key.time.is_finite() || key.value.iter().any(|v| !v.is_finite()) {
                return Err(invalid(format!("bone '{bone}': non-finite keyframe")));
            }
            let value = convert(key.value)
                .ok_or_else(|| invalid(format!("bone '{bone}': degenerate rotation key")))?;
            Ok(Keyframe::new(key.time, value))
        })
        .collect()
}

impl ClipDef {
    pub fn into_clip(self) -> LoadResult<AnimationClip> {
        if !self.duration.is_finite() || self.duration < 0.0 {
            return Err(invalid(format!(
                "clip '{}': invalid duration {}",
                self.name, self.duration
            )));
        }
        if !self.ticks_per_second.is_finite() || self.ticks_per_second < 0.0 {
            return Err(invalid(format!(
                "clip '{}': invalid ticksPerSecond {}",
                self.name, self.ticks_per_second
            )));
        }

        let mut clip = AnimationClip::new(self.name, self.duration, self.ticks_per_second);
        for track in self.tracks {
            let bone = track.bone;
            let mut runtime = BoneTrack::new(bone.clone());
            runtime.positions = keys(track.positions, &bone, |v| Some(Vec3::from_array(v)))?;
            runtime.rotations = keys(track.rotations, &bone, |v| {
                let rotation = Quat::from_array(v);
                (rotation.length_squared() > f32::EPSILON).then(|| rotation.normalize())
            })?;
            runtime.scales = keys(track.scales, &bone, |v| Some(Vec3::from_array(v)))?;
            clip.add_track(runtime);
        }

        if clip.is_degenerate() {
            log::debug!("Clip '{}' is degenerate, it evaluates to a static pose", clip.name());
        }
        Ok(clip)
    }
}

impl ClipFileDef {
    pub fn into_clips(self) -> LoadResult<Vec<AnimationClip>> {
        match self {
            Self::One(clip) => Ok(vec![clip.into_clip()?]),
            Self::Many(clips) => clips.into_iter().map(ClipDef::into_clip).collect(),
        }
    }
}

impl NodeDef {
    fn into_node(self) -> LoadResult<Node> {
        let transform = match &self.transform {
            Some(values) => matrix(values, &self.name)?,
            None => Mat4::IDENTITY,
        };
        let mut node = Node::new(self.name, transform);
        for child in self.children {
            node.add_child(child.into_node()?);
        }
        Ok(node)
    }
}

impl SkeletonDef {
    pub fn into_skeleton(self) -> LoadResult<Skeleton> {
        let global_inverse = match &self.global_inverse_transform {
            Some(values) => matrix(values, "globalInverseTransform")?,
            None => Mat4::IDENTITY,
        };

        let mut bones = HashMap::with_capacity(self.bones.len());
        for bone in self.bones {
            let offset = matrix(&bone.offset, &bone.name)?;
            if bones
                .insert(bone.name.clone(), BoneInfo::new(bone.id, offset))
                .is_some()
            {
                return Err(invalid(format!("duplicate bone '{}'", bone.name)));
            }
        }

        Ok(Skeleton::new(self.root.into_node()?, bones, global_inverse)?)
    }
}

pub fn controller_from_str(json: &str) -> LoadResult<AnimatorController> {
    serde_json::from_str::<ControllerDef>(json)?.into_controller()
}

pub fn controller_from_reader<R: Read>(reader: R) -> LoadResult<AnimatorController> {
    serde_json::from_reader::<_, ControllerDef>(reader)?.into_controller()
}

/// Load a controller definition file
pub fn controller_from_path(path: impl AsRef<Path>) -> LoadResult<AnimatorController> {
    let path = path.as_ref();
    log::debug!("Loading controller from {}", path.display());
    controller_from_reader(BufReader::new(File::open(path)?))
}

pub fn clips_from_str(json: &str) -> LoadResult<Vec<AnimationClip>> {
    serde_json::from_str::<ClipFileDef>(json)?.into_clips()
}

pub fn clips_from_reader<R: Read>(reader: R) -> LoadResult<Vec<AnimationClip>> {
    serde_json::from_reader::<_, ClipFileDef>(reader)?.into_clips()
}

/// Load every clip in a clip file
pub fn clips_from_path(path: impl AsRef<Path>) -> LoadResult<Vec<AnimationClip>> {
    let path = path.as_ref();
    log::debug!("Loading clips from {}", path.display());
    clips_from_reader(BufReader::new(File::open(path)?))
}

/// Build a library from several clip files; later files replace earlier
/// clips with the same name
pub fn library_from_paths<P: AsRef<Path>>(
    paths: impl IntoIterator<Item = P>,
) -> LoadResult<AnimationLibrary> {
    let mut library = AnimationLibrary::new();
    for path in paths {
        for clip in clips_from_path(path)? {
            library.insert(clip);
        }
    }
    Ok(library)
}

pub fn skeleton_from_str(json: &str) -> LoadResult<Skeleton> {
    serde_json::from_str::<SkeletonDef>(json)?.into_skeleton()
}

pub fn skeleton_from_reader<R: Read>(reader: R) -> LoadResult<Skeleton> {
    serde_json::from_reader::<_, SkeletonDef>(reader)?.into_skeleton()
}

/// Load a skeleton definition file
pub fn skeleton_from_path(path: impl AsRef<Path>) -> LoadResult<Skeleton> {
    let path = path.as_ref();
    log::debug!("Loading skeleton from {}", path.display());
    skeleton_from_reader(BufReader::new(File::open(path)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnimationError;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    const CONTROLLER: &str = r#"{
        "name": "Locomotion",
        "defaultState": "Idle",
        "parameters": [
            {"name": "speed", "type": "Float", "defaultValue": 0.5},
            {"name": "combo", "type": "int", "defaultValue": 2},
            {"name": "grounded", "type": "Bool", "defaultValue": true},
            {"name": "jump", "type": "Trigger"}
        ],
        "states": [
            {
                "name": "Idle",
                "clipRef": "idle_clip",
                "transitions": [
                    {
                        "toState": "Run",
                        "duration": 0.25,
                        "conditions": [{"parameter": "speed", "mode": "Greater", "threshold": 1.0}]
                    },
                    {
                        "toState": "Jump",
                        "conditions": [{"parameter": "jump", "mode": "trigger"}]
                    }
                ]
            },
            {"name": "Run", "clipName": "run_clip", "speed": 1.5},
            {
                "name": "Jump",
                "loop": false,
                "transitions": [
                    {"toState": "Idle", "hasExitTime": true, "exitTime": 0.9, "canInterrupt": false}
                ]
            }
        ]
    }"#;

    #[test]
    fn test_controller_from_str() {
        let controller = controller_from_str(CONTROLLER).unwrap();
        assert_eq!(controller.name(), "Locomotion");
        assert_eq!(controller.default_state(), "Idle");
        assert_eq!(controller.parameters().len(), 4);
        assert_eq!(
            controller.parameters()[0].value,
            ParameterValue::Float(0.5)
        );
        assert_eq!(controller.parameters()[1].value, ParameterValue::Int(2));
        assert_eq!(controller.parameters()[3].value, ParameterValue::Trigger(false));

        let idle = controller.state("Idle").unwrap();
        assert_eq!(idle.clip, "idle_clip");
        assert!(idle.looping);
        assert_eq!(idle.transitions.len(), 2);
        assert_eq!(idle.transitions[0].blend_duration, 0.25);
        assert!(idle.transitions[0].can_interrupt_before_exit_time);
        assert_eq!(
            idle.transitions[0].conditions[0],
            Condition::greater("speed", 1.0)
        );
        assert_eq!(idle.transitions[1].conditions[0].mode, ConditionMode::Trigger);

        let run = controller.state("Run").unwrap();
        assert_eq!(run.clip, "run_clip");
        assert_eq!(run.speed, 1.5);

        let jump = controller.state("Jump").unwrap();
        assert_eq!(jump.clip, "Jump");
        assert!(!jump.looping);
        let exit = &jump.transitions[0];
        assert!(exit.has_exit_time);
        assert_eq!(exit.exit_time, 0.9);
        assert!(!exit.can_interrupt_before_exit_time);
    }

    #[test]
    fn test_controller_rejects_duplicates() {
        let json = r#"{"name": "C", "defaultState": "A", "states": [{"name": "A"}, {"name": "A"}]}"#;
        assert!(matches!(
            controller_from_str(json),
            Err(LoadError::Invalid(msg)) if msg.contains("duplicate state 'A'")
        ));
    }

    #[test]
    fn test_controller_parse_error() {
        assert!(matches!(
            controller_from_str(r#"{"name": "C"}"#),
            Err(LoadError::Json(_))
        ));
        let bad_mode = r#"{"name": "C", "defaultState": "A", "states": [{"name": "A",
            "transitions": [{"toState": "A", "conditions": [{"parameter": "p", "mode": "Sometimes"}]}]}]}"#;
        assert!(matches!(controller_from_str(bad_mode), Err(LoadError::Json(_))));
    }

    #[test]
    fn test_bool_default_on_float_rejected() {
        let json = r#"{"name": "C", "defaultState": "A",
            "parameters": [{"name": "speed", "type": "Float", "defaultValue": true}]}"#;
        assert!(matches!(controller_from_str(json), Err(LoadError::Invalid(_))));
    }

    #[test]
    fn test_clips_single_and_many() {
        let single = r#"{"name": "Idle", "duration": 10, "ticksPerSecond": 5,
            "tracks": [{"bone": "Hips", "positions": [{"time": 5, "value": [0, 1, 0]},
                                                      {"time": 0, "value": [0, 0, 0]}]}]}"#;
        let clips = clips_from_str(single).unwrap();
        assert_eq!(clips.len(), 1);
        let track = clips[0].track("Hips").unwrap();
        assert_eq!(track.positions[0].time, 0.0);
        assert_eq!(track.positions[1].value, Vec3::Y);
        assert_eq!(clips[0].duration_seconds(), 2.0);

        let many = r#"[{"name": "A", "duration": 1}, {"name": "B", "duration": 2}]"#;
        let clips = clips_from_str(many).unwrap();
        assert_eq!(clips.len(), 2);
        assert_eq!(clips[1].name(), "B");
        assert_eq!(clips[1].ticks_per_second(), crate::clip::DEFAULT_TICKS_PER_SECOND);
    }

    #[test]
    fn test_rotation_keys_normalized() {
        let json = r#"{"name": "Turn", "duration": 1,
            "tracks": [{"bone": "Hips", "rotations": [{"time": 0, "value": [0, 0, 0, 2]}]}]}"#;
        let clips = clips_from_str(json).unwrap();
        assert_eq!(clips[0].track("Hips").unwrap().rotations[0].value, Quat::IDENTITY);

        let zero = r#"{"name": "Bad", "duration": 1,
            "tracks": [{"bone": "Hips", "rotations": [{"time": 0, "value": [0, 0, 0, 0]}]}]}"#;
        assert!(matches!(clips_from_str(zero), Err(LoadError::Invalid(_))));
    }

    #[test]
    fn test_negative_duration_rejected() {
        let json = r#"{"name": "Bad", "duration": -1}"#;
        assert!(matches!(clips_from_str(json), Err(LoadError::Invalid(_))));
    }

    const SKELETON: &str = r#"{
        "root": {
            "name": "Root",
            "children": [{
                "name": "Hips",
                "transform": [1,0,0,0, 0,1,0,0, 0,0,1,0, 0,1,0,1],
                "children": [{"name": "Spine"}]
            }]
        },
        "bones": [
            {"name": "Hips", "id": 0, "offset": [1,0,0,0, 0,1,0,0, 0,0,1,0, 0,-1,0,1]},
            {"name": "Spine", "id": 1, "offset": [1,0,0,0, 0,1,0,0, 0,0,1,0, 0,0,0,1]}
        ]
    }"#;

    #[test]
    fn test_skeleton_from_str() {
        let skeleton = skeleton_from_str(SKELETON).unwrap();
        assert_eq!(skeleton.node_count(), 3);
        assert_eq!(skeleton.bone_count(), 2);
        assert_eq!(*skeleton.global_inverse_transform(), Mat4::IDENTITY);

        // Column-major: the last column is the translation
        let hips = skeleton.find_node("Hips").unwrap();
        assert_eq!(hips.bind_pose().translation, Vec3::Y);
        assert_eq!(
            skeleton.bone_info("Hips").unwrap().offset_matrix,
            Mat4::from_translation(Vec3::NEG_Y)
        );
    }

    #[test]
    fn test_skeleton_model_error() {
        let json = r#"{"root": {"name": "Root"},
            "bones": [{"name": "Root", "id": 999, "offset": [1,0,0,0, 0,1,0,0, 0,0,1,0, 0,0,0,1]}]}"#;
        assert!(matches!(
            skeleton_from_str(json),
            Err(LoadError::Model(AnimationError::BoneIdOutOfRange { id: 999, .. }))
        ));
    }

    #[test]
    fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();

        let controller_path = dir.path().join("controller.json");
        File::create(&controller_path)
            .unwrap()
            .write_all(CONTROLLER.as_bytes())
            .unwrap();
        let controller = controller_from_path(&controller_path).unwrap();
        assert_eq!(controller.states().len(), 3);

        let clips_path = dir.path().join("clips.json");
        std::fs::write(
            &clips_path,
            r#"[{"name": "idle_clip", "duration": 1}, {"name": "run_clip", "duration": 1},
                {"name": "Jump", "duration": 1}]"#,
        )
        .unwrap();
        let library = library_from_paths([&clips_path]).unwrap();
        assert_eq!(library.names(), vec!["Jump", "idle_clip", "run_clip"]);
        assert!(controller.validate(&library).is_ok());

        assert!(matches!(
            skeleton_from_path(dir.path().join("missing.json")),
            Err(LoadError::Io(_))
        ));
    }
}
