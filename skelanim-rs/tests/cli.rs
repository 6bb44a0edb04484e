//! Integration tests for the skelanim-rs binary

use assert_cmd::Command;
use predicates::prelude::*;
use pretty_assertions::assert_eq;
use std::io::Write;
use std::path::PathBuf;

fn data(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../crates/skelanim/tests/data")
        .join(name)
}

fn skelanim() -> Command {
    Command::cargo_bin("skelanim-rs").unwrap()
}

#[test]
fn test_controller_info() {
    skelanim()
        .args(["controller", "info", "--detailed"])
        .arg(data("humanoid.controller.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Humanoid"))
        .stdout(predicate::str::contains("grounded"))
        .stdout(predicate::str::contains("Jump"));
}

#[test]
fn test_controller_tree_with_clips() {
    skelanim()
        .args(["controller", "tree", "--no-color"])
        .arg(data("humanoid.controller.json"))
        .arg("--clips")
        .arg(data("humanoid.clips.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Idle (default)"))
        .stdout(predicate::str::contains("speed > 0.5"))
        .stdout(predicate::str::contains("jump triggered"))
        .stdout(predicate::str::contains("(missing)").not());
}

#[test]
fn test_controller_validate_passes() {
    skelanim()
        .args(["controller", "validate"])
        .arg(data("humanoid.controller.json"))
        .arg("--clips")
        .arg(data("humanoid.clips.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Controller is valid!"));
}

#[test]
fn test_controller_validate_reports_missing_clips() {
    let mut clips = tempfile::NamedTempFile::new().unwrap();
    write!(
        clips,
        r#"{{ "name": "Idle", "duration": 10, "ticksPerSecond": 10, "tracks": [] }}"#
    )
    .unwrap();

    skelanim()
        .args(["controller", "validate"])
        .arg(data("humanoid.controller.json"))
        .arg("--clips")
        .arg(clips.path())
        .assert()
        .failure()
        .stdout(predicate::str::contains("2 error(s) found"))
        .stdout(predicate::str::contains("missing clip 'Run'"))
        .stderr(predicate::str::contains("failed validation"));
}

#[test]
fn test_missing_file_reports_context() {
    skelanim()
        .args(["controller", "info", "does-not-exist.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load controller"));
}

#[test]
fn test_skeleton_bones() {
    skelanim()
        .args(["skeleton", "bones"])
        .arg(data("humanoid.skeleton.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("LeftLeg"))
        .stdout(predicate::str::contains("(0.250, -0.500, 0.000)"));
}

#[test]
fn test_skeleton_tree() {
    skelanim()
        .args(["skeleton", "tree", "--no-color"])
        .arg(data("humanoid.skeleton.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Armature"))
        .stdout(predicate::str::contains("Head [id:2]"));
}

#[test]
fn test_clip_info() {
    skelanim()
        .args(["clip", "info"])
        .arg(data("humanoid.clips.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Idle"))
        .stdout(predicate::str::contains("Run"))
        .stdout(predicate::str::contains("1.000s"));
}

fn simulate_json(extra: &[&str]) -> Vec<serde_json::Value> {
    let output = skelanim()
        .arg("simulate")
        .arg("--skeleton")
        .arg(data("humanoid.skeleton.json"))
        .arg("--controller")
        .arg(data("humanoid.controller.json"))
        .arg("--clips")
        .arg(data("humanoid.clips.json"))
        .args(["--dt", "0.0625", "--format", "json"])
        .args(extra)
        .output()
        .unwrap();
    assert!(output.status.success(), "{output:?}");
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn test_simulate_crossfade_to_run() {
    let frames = simulate_json(&["--frames", "12", "--set", "speed=1@4", "--bone", "Hips"]);

    assert_eq!(frames.len(), 12);
    assert_eq!(frames[3]["state"], "Idle");
    assert_eq!(frames[4]["state"], "Run");
    assert_eq!(frames[4]["blending"], true);
    assert_eq!(frames[8]["blending"], false);
    assert_eq!(frames[8]["blendFactor"], 1.0);
    assert!(frames[0]["boneTranslation"].is_array());
}

#[test]
fn test_simulate_trigger_jump() {
    let frames = simulate_json(&["--frames", "4", "--trigger", "jump@2"]);

    assert_eq!(frames[1]["state"], "Idle");
    assert_eq!(frames[2]["state"], "Jump");
    assert_eq!(frames[2]["clip"], "Jump");
}

#[test]
fn test_simulate_rejects_unknown_parameter() {
    skelanim()
        .arg("simulate")
        .arg("--skeleton")
        .arg(data("humanoid.skeleton.json"))
        .arg("--controller")
        .arg(data("humanoid.controller.json"))
        .arg("--clips")
        .arg(data("humanoid.clips.json"))
        .args(["--set", "altitude=3"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown parameter 'altitude'"));
}

#[test]
fn test_completions() {
    skelanim()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("skelanim-rs"));
}
