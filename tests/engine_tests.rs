//! Engine Tests
//!
//! Tests for:
//! - Frame order: animation writes are visible in the same frame's world transforms
//! - Skinning matrices follow the animated pose within one update
//! - Time scaling and fixed stepping
//! - Settings parsing from partial JSON

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use glam::{Mat4, Vec3};
use ziggurat::{
    Animation, AnimationTimeline, Bone, Engine, EngineSettings, ImportedModelComponent, PlaybackTarget, Skeleton,
    TransformAnimation, TransformNode,
};

const EPSILON: f32 = 1e-4;

fn slide_x(target: usize, duration: f32, distance: f32) -> Result<Animation> {
    Ok(Animation::new().with_channel(
        target,
        TransformAnimation::new().with_position(AnimationTimeline::new(
            vec![0.0, duration],
            vec![Vec3::ZERO, Vec3::new(distance, 0.0, 0.0)],
        )?),
    ))
}

#[test]
fn animated_node_moves_its_children_in_the_same_frame() -> Result<()> {
    let mut engine = Engine::default();
    let world = &mut engine.world;
    let root = world.create_node("model", None)?;
    let animated = world.create_node("arm", Some(root))?;
    let hand = world.create_node_with_transform("hand", TransformNode::from_translation(Vec3::Y), Some(animated))?;
    world.add_imported_model(root, ImportedModelComponent::new().with_node(0, animated))?;

    engine.animation.add_animation(None, "reach", slide_x(0, 2.0, 4.0)?)?;
    assert_eq!(engine.play_animation(root, "reach"), Some(PlaybackTarget::Node));

    let stats = engine.update(0.5);

    assert_eq!(stats.animation.nodes_sampled, 1);
    let position = engine.world.local_to_world(hand).unwrap().transform_point3(Vec3::ZERO);
    assert!((position - Vec3::new(1.0, 1.0, 0.0)).length() < EPSILON);
    Ok(())
}

#[test]
fn skinning_matrices_follow_the_pose_each_frame() -> Result<()> {
    let mut engine = Engine::default();
    let skeleton = Skeleton::new(
        "arm",
        vec![
            Bone::new(Mat4::IDENTITY).with_children([1]),
            Bone::new(Mat4::from_translation(Vec3::Y)),
        ],
        Vec::new(),
    )?;
    let key = engine.animation.add_skeleton(skeleton);
    engine.animation.add_animation(Some(key), "swing", slide_x(0, 1.0, 2.0)?)?;

    let character = engine.world.create_node("character", None)?;
    let mesh = engine.animation.create_skinned_mesh(key)?;
    engine.world.add_skinned_mesh(character, mesh)?;
    engine.play_animation(character, "swing");

    let stats = engine.update(0.25);

    assert_eq!(stats.skinned_meshes, 1);
    let tip = engine.world.skinned_mesh(character).unwrap().worldspace_bone_matrices()[1];
    // Root bone at x = 0.5, child one unit up.
    assert!((tip.transform_point3(Vec3::ZERO) - Vec3::new(0.5, 1.0, 0.0)).length() < EPSILON);
    Ok(())
}

#[test]
fn time_scale_and_fixed_steps() {
    let mut engine = Engine::new(EngineSettings {
        time_scale: 2.0,
        ..EngineSettings::default()
    });

    engine.update(0.25);
    engine.update(0.25);
    assert!((engine.now() - 1.0).abs() < 1e-6);
    assert_eq!(engine.frame_count(), 2);

    engine.update(-1.0);
    engine.update(f32::NAN);
    assert!((engine.now() - 1.0).abs() < 1e-6);
}

#[test]
fn events_fire_from_engine_updates() -> Result<()> {
    let mut engine = Engine::default();
    let root = engine.world.create_node("cutscene", None)?;
    engine.world.add_imported_model(root, ImportedModelComponent::new())?;

    let fired = Arc::new(AtomicUsize::new(0));
    engine.animation.add_animation(None, "intro", slide_x(0, 10.0, 1.0)?)?;
    let counter = Arc::clone(&fired);
    engine.animation.add_event(None, "intro", 4.0, move || {
        counter.fetch_add(1, Ordering::SeqCst);
    })?;

    engine.play_animation(root, "intro");
    for _ in 0..3 {
        engine.update(1.0);
    }
    assert_eq!(fired.load(Ordering::SeqCst), 0);

    engine.update(1.5);
    assert_eq!(fired.load(Ordering::SeqCst), 1);
    Ok(())
}

#[test]
fn settings_parse_from_partial_json() -> Result<()> {
    let settings = EngineSettings::from_json(r#"{ "time_scale": 0.5, "animation": { "loop_node": true } }"#)?;

    assert_eq!(settings.time_scale, 0.5);
    assert!(settings.animation.loop_node);
    assert!(settings.animation.loop_skeletal);
    assert!(settings.animation.replay_skipped_events);

    let value: serde_json::Value = serde_json::from_str(&settings.to_json()?)?;
    assert_eq!(value["animation"]["loop_node"], serde_json::Value::Bool(true));
    Ok(())
}

#[test]
fn malformed_settings_are_an_error() {
    assert!(EngineSettings::from_json("{ \"time_scale\": \"fast\" }").is_err());
}

#[test]
fn logging_can_be_initialized_twice() {
    ziggurat::init_logging();
    ziggurat::init_logging();
}
