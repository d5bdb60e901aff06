use std::sync::Arc;

use glam::{Mat4, Quat, Vec3};

use crate::clip::{Animation, TransformAnimation};
use crate::sampler::{PositionAnimationSampler, RotationAnimationSampler, ScaleAnimationSampler};
use crate::skeleton::Bone;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopMode {
    /// Play to the end, then stop.
    #[default]
    Once,
    /// Wrap local time around the animation's duration. Never ends.
    Loop,
}

impl LoopMode {
    #[must_use]
    pub fn from_looping(looping: bool) -> Self {
        if looping { Self::Loop } else { Self::Once }
    }

    /// Maps time since playback started onto the animation's own timeline.
    #[inline]
    #[must_use]
    pub fn local_time(self, elapsed: f32, duration: f32) -> f32 {
        match self {
            Self::Loop if duration > 0.0 => elapsed.rem_euclid(duration),
            _ => elapsed,
        }
    }
}

/// Plays one channel of an animation onto a single node.
///
/// Channels without data contribute identity for their part of the
/// transform and count as ended.
#[derive(Debug, Clone, Default)]
pub struct NodeAnimator {
    pub position_sampler: Option<PositionAnimationSampler>,
    pub rotation_sampler: Option<RotationAnimationSampler>,
    pub scale_sampler: Option<ScaleAnimationSampler>,

    pub start_time: f32,
    pub loop_mode: LoopMode,
}

impl NodeAnimator {
    #[must_use]
    pub fn new(channel: &TransformAnimation, start_time: f32) -> Self {
        Self {
            position_sampler: channel.position.as_ref().map(|t| PositionAnimationSampler::new(Arc::clone(t))),
            rotation_sampler: channel.rotation.as_ref().map(|t| RotationAnimationSampler::new(Arc::clone(t))),
            scale_sampler: channel.scale.as_ref().map(|t| ScaleAnimationSampler::new(Arc::clone(t))),
            start_time,
            loop_mode: LoopMode::Once,
        }
    }

    #[must_use]
    pub fn with_loop_mode(mut self, loop_mode: LoopMode) -> Self {
        self.loop_mode = loop_mode;
        self
    }

    /// Latest keyframe time across the present samplers.
    #[must_use]
    pub fn duration(&self) -> f32 {
        [
            self.position_sampler.as_ref().map(PositionAnimationSampler::duration),
            self.rotation_sampler.as_ref().map(RotationAnimationSampler::duration),
            self.scale_sampler.as_ref().map(ScaleAnimationSampler::duration),
        ]
        .into_iter()
        .flatten()
        .fold(0.0, f32::max)
    }

    /// Checks whether every present sampler has run out at absolute `time`.
    #[must_use]
    pub fn has_animation_ended(&self, time: f32) -> bool {
        if self.loop_mode == LoopMode::Loop {
            return false;
        }
        let local_time = time - self.start_time;

        self.position_sampler.as_ref().is_none_or(|s| s.is_ended(local_time))
            && self.rotation_sampler.as_ref().is_none_or(|s| s.is_ended(local_time))
            && self.scale_sampler.as_ref().is_none_or(|s| s.is_ended(local_time))
    }

    /// Samples the local transform at absolute `time`.
    pub fn sample(&mut self, time: f32) -> Mat4 {
        let local_time = self.loop_mode.local_time(time - self.start_time, self.duration());
        self.sample_local(local_time)
    }

    /// Samples at a time already relative to the start of the animation.
    pub fn sample_local(&mut self, local_time: f32) -> Mat4 {
        let translation = self
            .position_sampler
            .as_mut()
            .map_or(Vec3::ZERO, |s| s.sample(local_time));
        let rotation = self
            .rotation_sampler
            .as_mut()
            .map_or(Quat::IDENTITY, |s| s.sample(local_time));
        let scale = self.scale_sampler.as_mut().map_or(Vec3::ONE, |s| s.sample(local_time));

        Mat4::from_scale_rotation_translation(scale, rotation, translation)
    }
}

/// A [`NodeAnimator`] bound to a bone index.
#[derive(Debug, Clone)]
pub struct JointAnimator {
    pub bone: usize,
    pub animator: NodeAnimator,
}

/// Plays a skeletal animation onto a skinned mesh's bones.
#[derive(Debug, Clone, Default)]
pub struct SkeletonAnimator {
    /// Sorted by bone index
    pub joint_animators: Vec<JointAnimator>,

    pub start_time: f32,

    /// Longest joint duration
    pub duration: f32,

    pub loop_mode: LoopMode,
}

impl SkeletonAnimator {
    /// Builds joint animators for every channel that targets one of the
    /// skeleton's `bone_count` bones. Other channels are skipped with a warning.
    #[must_use]
    pub fn new(animation: &Animation, bone_count: usize, start_time: f32, loop_mode: LoopMode) -> Self {
        let mut joint_animators: Vec<JointAnimator> = animation
            .channels
            .iter()
            .filter_map(|(&bone, channel)| {
                if bone < bone_count {
                    Some(JointAnimator {
                        bone,
                        animator: NodeAnimator::new(channel, 0.0),
                    })
                } else {
                    log::warn!("Animation channel targets bone {bone}, but the skeleton only has {bone_count} bones");
                    None
                }
            })
            .collect();
        joint_animators.sort_unstable_by_key(|joint| joint.bone);

        let duration = joint_animators
            .iter()
            .map(|joint| joint.animator.duration())
            .fold(0.0, f32::max);

        Self {
            joint_animators,
            start_time,
            duration,
            loop_mode,
        }
    }

    #[must_use]
    pub fn has_animation_ended(&self, time: f32) -> bool {
        match self.loop_mode {
            LoopMode::Loop => false,
            LoopMode::Once => time - self.start_time >= self.duration,
        }
    }

    /// Writes each animated joint's local transform into `bones`.
    pub fn update_bones(&mut self, bones: &mut [Bone], time: f32) {
        let local_time = self.loop_mode.local_time(time - self.start_time, self.duration);

        for joint in &mut self.joint_animators {
            if let Some(bone) = bones.get_mut(joint.bone) {
                bone.local_transform = joint.animator.sample_local(local_time);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::AnimationTimeline;

    fn slide(duration: f32) -> TransformAnimation {
        TransformAnimation::new().with_position(
            AnimationTimeline::new(vec![0.0, duration], vec![Vec3::ZERO, Vec3::new(duration, 0.0, 0.0)]).unwrap(),
        )
    }

    #[test]
    fn loop_mode_wraps_local_time() {
        assert!((LoopMode::Loop.local_time(5.5, 2.0) - 1.5).abs() < 1e-6);
        assert_eq!(LoopMode::Once.local_time(5.5, 2.0), 5.5);
        assert_eq!(LoopMode::Loop.local_time(5.5, 0.0), 5.5);
    }

    #[test]
    fn looping_node_animator_never_ends() {
        let animator = NodeAnimator::new(&slide(1.0), 0.0).with_loop_mode(LoopMode::Loop);
        assert!(!animator.has_animation_ended(100.0));
    }

    #[test]
    fn looping_node_animator_wraps() {
        let mut animator = NodeAnimator::new(&slide(2.0), 1.0).with_loop_mode(LoopMode::Loop);
        let first = animator.sample(2.5).w_axis.x;
        let wrapped = animator.sample(4.5).w_axis.x;
        assert!((first - 1.5).abs() < 1e-5);
        assert!((wrapped - 1.5).abs() < 1e-5);
    }

    #[test]
    fn skeleton_animator_skips_out_of_range_bones() {
        let animation = Animation::new().with_channel(0, slide(1.0)).with_channel(7, slide(3.0));
        let animator = SkeletonAnimator::new(&animation, 2, 0.0, LoopMode::Once);
        assert_eq!(animator.joint_animators.len(), 1);
        assert_eq!(animator.duration, 1.0);
    }
}
