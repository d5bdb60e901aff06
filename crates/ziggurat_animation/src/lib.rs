//! Keyframe animation for the Ziggurat engine.
//!
//! Data flows bottom-up:
//!
//! - [`AnimationTimeline`]: parallel timestamp/value arrays, with validation
//! - [`AnimationSampler`]: a timeline plus a forward-moving cursor
//! - [`AnimationEventSampler`]: fires callbacks stored on an event timeline
//! - [`NodeAnimator`] / [`SkeletonAnimator`]: compose samplers into node
//!   transforms or bone poses
//! - [`Animation`] / [`Skeleton`]: the immutable assets animators read from
//!
//! Attaching animators to entities and deciding which kind to use is the
//! scene crate's job.

pub mod animator;
pub mod clip;
pub mod components;
pub mod sampler;
pub mod skeleton;
pub mod timeline;
pub mod values;

pub use animator::{JointAnimator, LoopMode, NodeAnimator, SkeletonAnimator};
pub use clip::{Animation, AnimationEvent, EventTimeline, TransformAnimation};
pub use components::{NodeAnimationComponent, SkeletalAnimatorComponent};
pub use sampler::{
    AnimationEventSampler, AnimationSampler, PositionAnimationSampler, RotationAnimationSampler,
    ScaleAnimationSampler,
};
pub use skeleton::{Bone, Skeleton};
pub use timeline::{AnimationTimeline, InterpolationMode};
pub use values::Interpolatable;
