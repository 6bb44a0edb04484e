use criterion::{Criterion, criterion_group, criterion_main};
use glam::{Mat4, Quat, Vec3};
use std::collections::HashMap;
use std::hint::black_box;
use std::sync::Arc;

use skelanim::blend::blend;
use skelanim::pose::identity_palette;
use skelanim::{
    AnimationClip, AnimationLibrary, Animator, AnimatorController, AnimatorParameter,
    AnimatorState, BoneInfo, BoneTrack, Condition, Node, PoseEvaluator, Skeleton, Transition,
};

const CHAIN_LENGTH: usize = 64;

fn bone_name(i: usize) -> String {
    format!("Bone{i:02}")
}

/// A single chain of bones, one unit apart along +Y
fn create_test_skeleton() -> Skeleton {
    let step = Mat4::from_translation(Vec3::Y);
    let mut node = Node::new(bone_name(CHAIN_LENGTH - 1), step);
    for i in (0..CHAIN_LENGTH - 1).rev() {
        node = Node::new(bone_name(i), step).with_child(node);
    }

    let mut bones = HashMap::new();
    let mut global = Mat4::IDENTITY;
    for i in 0..CHAIN_LENGTH {
        global *= step;
        bones.insert(bone_name(i), BoneInfo::new(i, global.inverse()));
    }

    Skeleton::new(node, bones, Mat4::IDENTITY).unwrap()
}

fn create_test_clip(name: &str, angle: f32) -> AnimationClip {
    let mut clip = AnimationClip::new(name, 30.0, 30.0);
    for i in 0..CHAIN_LENGTH {
        clip.add_track(
            BoneTrack::new(bone_name(i))
                .with_rotation(0.0, Quat::IDENTITY)
                .with_rotation(15.0, Quat::from_rotation_z(angle))
                .with_rotation(30.0, Quat::IDENTITY)
                .with_position(0.0, Vec3::Y)
                .with_position(30.0, Vec3::Y * 1.1),
        );
    }
    clip
}

fn bench_pose_evaluate(c: &mut Criterion) {
    let skeleton = create_test_skeleton();
    let clip = create_test_clip("Wave", 0.2);
    let evaluator = PoseEvaluator::new(&skeleton);
    let mut out = identity_palette();

    c.bench_function("evaluate_pose_64_bones", |b| {
        b.iter(|| evaluator.evaluate(Some(black_box(&clip)), black_box(12.5), &mut out))
    });
}

fn bench_blend(c: &mut Criterion) {
    let skeleton = create_test_skeleton();
    let evaluator = PoseEvaluator::new(&skeleton);
    let mut from = identity_palette();
    let mut to = identity_palette();
    evaluator.evaluate(Some(&create_test_clip("A", 0.2)), 5.0, &mut from);
    evaluator.evaluate(Some(&create_test_clip("B", -0.4)), 20.0, &mut to);
    let mut out = identity_palette();

    c.bench_function("blend_palette", |b| {
        b.iter(|| blend(&from, &to, black_box(0.35), &mut out))
    });
}

fn bench_animator_advance(c: &mut Criterion) {
    let skeleton = Arc::new(create_test_skeleton());
    let library: AnimationLibrary = [create_test_clip("Idle", 0.1), create_test_clip("Run", 0.5)]
        .into_iter()
        .collect();
    let controller = Arc::new(
        AnimatorController::new("Bench", "Idle")
            .with_parameter(AnimatorParameter::float("speed", 0.0))
            .with_state(
                AnimatorState::new("Idle", "Idle").with_transition(
                    Transition::to("Run")
                        .with_duration(0.2)
                        .when(Condition::greater("speed", 0.5)),
                ),
            )
            .with_state(
                AnimatorState::new("Run", "Run").with_transition(
                    Transition::to("Idle")
                        .with_duration(0.2)
                        .when(Condition::less("speed", 0.5)),
                ),
            ),
    );

    let mut animator = Animator::with_skeleton(skeleton);
    animator.load_controller(controller, &library).unwrap();

    let mut frame = 0u32;
    c.bench_function("animator_advance_with_crossfades", |b| {
        b.iter(|| {
            frame = frame.wrapping_add(1);
            // Flip state every half second of simulated time
            let speed = if (frame / 30) % 2 == 0 { 1.0 } else { 0.0 };
            animator.set_float("speed", speed);
            animator.advance(black_box(1.0 / 60.0));
        })
    });
}

criterion_group!(
    benches,
    bench_pose_evaluate,
    bench_blend,
    bench_animator_advance
);
criterion_main!(benches);
