//! Per-entity playback state attached by the animation system.

use ziggurat_core::SkeletonKey;

use crate::animator::{NodeAnimator, SkeletonAnimator};

/// Node animation in progress on a scene-graph node.
#[derive(Debug, Clone)]
pub struct NodeAnimationComponent {
    pub animator: NodeAnimator,
    /// Name of the animation being played
    pub animation: String,
}

/// Skeletal animation in progress on a skinned mesh.
#[derive(Debug, Clone)]
pub struct SkeletalAnimatorComponent {
    pub animator: SkeletonAnimator,
    pub skeleton: SkeletonKey,
    /// Name of the animation being played
    pub animation: String,
}

impl SkeletalAnimatorComponent {
    #[inline]
    #[must_use]
    pub fn is_looping(&self) -> bool {
        self.animator.loop_mode == crate::LoopMode::Loop
    }
}
