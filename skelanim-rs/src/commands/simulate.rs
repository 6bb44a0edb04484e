//! Frame-by-frame animator simulation

use anyhow::{Context, Result, bail};
use clap::{Args, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

use skelanim::{Animator, ParameterKind, ParameterStore, ParameterValue};

use crate::commands::controller::{load_controller, load_library};
use crate::commands::skeleton::load_skeleton;
use crate::utils::{add_table_row, create_table, format_percentage, format_vec3};

#[derive(Args)]
pub struct SimulateArgs {
    /// Skeleton JSON file
    #[arg(short, long)]
    pub skeleton: PathBuf,

    /// Controller JSON file
    #[arg(short, long)]
    pub controller: PathBuf,

    /// Clip JSON files
    #[arg(long = "clips", required = true)]
    pub clips: Vec<PathBuf>,

    /// Number of frames to simulate
    #[arg(short = 'n', long, default_value_t = 60)]
    pub frames: usize,

    /// Seconds per frame
    #[arg(long, default_value_t = 1.0 / 60.0)]
    pub dt: f32,

    /// Global playback speed multiplier
    #[arg(long, default_value_t = 1.0)]
    pub speed: f32,

    /// Set a parameter before a frame, as NAME=VALUE or NAME=VALUE@FRAME
    #[arg(long = "set", value_name = "NAME=VALUE[@FRAME]", value_parser = parse_set)]
    pub set: Vec<ParameterEvent>,

    /// Fire a trigger before a frame, as NAME or NAME@FRAME
    #[arg(long = "trigger", value_name = "NAME[@FRAME]", value_parser = parse_trigger)]
    pub trigger: Vec<ParameterEvent>,

    /// Report the model-space translation of this bone's matrix
    #[arg(short, long)]
    pub bone: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

/// A parameter change scheduled for a frame
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterEvent {
    pub frame: usize,
    pub name: String,
    /// Raw value text; `None` fires a trigger
    pub value: Option<String>,
}

fn split_frame(text: &str) -> std::result::Result<(&str, usize), String> {
    match text.rsplit_once('@') {
        Some((head, frame)) => {
            let frame = frame
                .trim()
                .parse()
                .map_err(|_| format!("invalid frame number '{frame}'"))?;
            Ok((head, frame))
        }
        None => Ok((text, 0)),
    }
}

fn parse_set(text: &str) -> std::result::Result<ParameterEvent, String> {
    let (head, frame) = split_frame(text)?;
    let Some((name, value)) = head.split_once('=') else {
        return Err(format!("expected NAME=VALUE, got '{text}'"));
    };
    let name = name.trim();
    if name.is_empty() {
        return Err("parameter name is empty".to_string());
    }
    Ok(ParameterEvent {
        frame,
        name: name.to_string(),
        value: Some(value.trim().to_string()),
    })
}

fn parse_trigger(text: &str) -> std::result::Result<ParameterEvent, String> {
    let (name, frame) = split_frame(text)?;
    let name = name.trim();
    if name.is_empty() {
        return Err("trigger name is empty".to_string());
    }
    Ok(ParameterEvent {
        frame,
        name: name.to_string(),
        value: None,
    })
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Type an event's value against the declared parameter
fn resolve_event(event: &ParameterEvent, parameters: &ParameterStore) -> Result<ParameterValue> {
    let Some(kind) = parameters.kind(&event.name) else {
        bail!("Unknown parameter '{}'", event.name);
    };

    let Some(raw) = event.value.as_deref() else {
        if kind != ParameterKind::Trigger {
            bail!("Parameter '{}' is a {kind}, not a trigger", event.name);
        }
        return Ok(ParameterValue::Trigger(true));
    };

    let value = match kind {
        ParameterKind::Float => ParameterValue::Float(
            raw.parse::<f32>()
                .with_context(|| format!("Invalid float for '{}': {raw}", event.name))?,
        ),
        ParameterKind::Int => ParameterValue::Int(
            raw.parse::<i32>()
                .with_context(|| format!("Invalid int for '{}': {raw}", event.name))?,
        ),
        ParameterKind::Bool => match parse_bool(raw) {
            Some(v) => ParameterValue::Bool(v),
            None => bail!("Invalid bool for '{}': {raw}", event.name),
        },
        ParameterKind::Trigger => match parse_bool(raw) {
            Some(v) => ParameterValue::Trigger(v),
            None => bail!("Invalid trigger value for '{}': {raw}", event.name),
        },
    };
    Ok(value)
}

fn apply(animator: &mut Animator, name: &str, value: ParameterValue) {
    match value {
        ParameterValue::Float(v) => animator.set_float(name, v),
        ParameterValue::Int(v) => animator.set_int(name, v),
        ParameterValue::Bool(v) => animator.set_bool(name, v),
        ParameterValue::Trigger(true) => animator.set_trigger(name),
        ParameterValue::Trigger(false) => animator.reset_trigger(name),
    }
}

/// Animator state after one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameReport {
    pub frame: usize,
    pub elapsed: f32,
    pub state: Option<String>,
    pub clip: Option<String>,
    pub clip_time: f32,
    pub normalized_time: f32,
    pub playing: bool,
    pub blending: bool,
    pub blend_factor: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bone_translation: Option<[f32; 3]>,
}

/// Drive `animator` for `frames` frames, applying events before each frame
pub(crate) fn run_frames(
    animator: &mut Animator,
    events: &[(usize, String, ParameterValue)],
    frames: usize,
    dt: f32,
    bone_id: Option<usize>,
) -> Vec<FrameReport> {
    let mut reports = Vec::with_capacity(frames);
    let mut elapsed = 0.0;

    for frame in 0..frames {
        for (_, name, value) in events.iter().filter(|(f, _, _)| *f == frame) {
            log::debug!("Frame {frame}: {name} = {value}");
            apply(animator, name, *value);
        }

        animator.advance(dt);
        elapsed += dt;

        reports.push(FrameReport {
            frame,
            elapsed,
            state: animator.current_state_name().map(str::to_string),
            clip: animator.current_clip().map(|c| c.name().to_string()),
            clip_time: animator.current_time(),
            normalized_time: animator.normalized_time(),
            playing: animator.is_playing(),
            blending: animator.is_blending(),
            blend_factor: animator.blend_factor(),
            bone_translation: bone_id
                .map(|id| animator.bone_matrices()[id].w_axis.truncate().to_array()),
        });
    }

    reports
}

pub fn execute(args: SimulateArgs) -> Result<()> {
    if !args.dt.is_finite() || args.dt < 0.0 {
        bail!("Frame time must be a non-negative number, got {}", args.dt);
    }

    let skeleton = Arc::new(load_skeleton(&args.skeleton)?);
    let controller = Arc::new(load_controller(&args.controller)?);
    let library = load_library(&args.clips)?;

    let bone_id = match args.bone.as_deref() {
        Some(name) => match skeleton.bone_info(name) {
            Some(info) => Some(info.id),
            None => bail!("Unknown bone '{name}'"),
        },
        None => None,
    };

    let mut animator = Animator::with_skeleton(skeleton);
    animator
        .load_controller(controller, &library)
        .context("Failed to start controller")?;
    animator.set_playback_speed(args.speed);

    let mut events = Vec::with_capacity(args.set.len() + args.trigger.len());
    for event in args.set.iter().chain(args.trigger.iter()) {
        if event.frame >= args.frames {
            log::warn!(
                "Event for '{}' at frame {} is past the last frame",
                event.name,
                event.frame
            );
        }
        let value = resolve_event(event, animator.parameters())?;
        events.push((event.frame, event.name.clone(), value));
    }

    let reports = run_frames(&mut animator, &events, args.frames, args.dt, bone_id);

    match args.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&reports)?);
        }
        OutputFormat::Table => print_table(&reports, &animator, bone_id.is_some()),
    }

    Ok(())
}

fn print_table(reports: &[FrameReport], animator: &Animator, show_bone: bool) {
    let mut headers = vec!["Frame", "Elapsed", "State", "Clip Time", "Normalized", "Blend"];
    if show_bone {
        headers.push("Bone Translation");
    }

    let mut table = create_table(&headers);
    for report in reports {
        let mut row = vec![
            report.frame.to_string(),
            format!("{:.3}", report.elapsed),
            report.state.clone().unwrap_or_else(|| "-".to_string()),
            format!("{:.3}", report.clip_time),
            format_percentage(report.normalized_time),
            if report.blending {
                format_percentage(report.blend_factor)
            } else {
                "-".to_string()
            },
        ];
        if let Some([x, y, z]) = report.bone_translation {
            row.push(format_vec3(glam::Vec3::new(x, y, z)));
        }
        add_table_row(&mut table, row);
    }
    table.printstd();

    if !animator.is_playing() {
        println!("Playback stopped at clip time {:.3}", animator.current_time());
    }
}
