//! # Ziggurat
//!
//! Scene graph transform propagation and keyframe animation for a real-time
//! 3D engine.
//!
//! The workspace is split into:
//!
//! - [`ziggurat_core`]: handles, errors, settings, timing
//! - [`ziggurat_animation`]: timelines, samplers, animators, skeletons
//! - [`ziggurat_scene`]: the entity world, propagation, animation playback
//!
//! This crate re-exports all three and adds the [`Engine`] frame driver.

pub mod engine;

pub use engine::{Engine, FrameStats, init_logging};

pub use ziggurat_core::{AnimationSettings, EngineSettings, Entity, Result, SkeletonKey, Timer, ZigguratError};

pub use ziggurat_animation::{
    Animation, AnimationEventSampler, AnimationSampler, AnimationTimeline, Bone, InterpolationMode, LoopMode,
    NodeAnimationComponent, NodeAnimator, SkeletalAnimatorComponent, Skeleton, SkeletonAnimator, TransformAnimation,
};

pub use ziggurat_scene::{
    AnimationSystem, AnimationTickStats, ImportedModelComponent, PlaybackTarget, PropagationStats,
    SkinnedMeshComponent, TransformNode, World,
};

/// Full animation crate.
pub mod animation {
    pub use ziggurat_animation::*;
}

/// Full scene crate.
pub mod scene {
    pub use ziggurat_scene::*;
}

/// Re-exported math library.
pub mod math {
    pub use glam::*;
}
