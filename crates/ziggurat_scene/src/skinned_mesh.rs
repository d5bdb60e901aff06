use glam::Mat4;
use ziggurat_animation::{Bone, Skeleton};
use ziggurat_core::SkeletonKey;

/// Marks an entity as a skinned mesh and holds its per-instance pose.
///
/// The [`Skeleton`] stays shared in the animation system; each mesh keeps its
/// own copy of the bones so several instances can play different animations
/// on the same skeleton.
#[derive(Debug, Clone)]
pub struct SkinnedMeshComponent {
    pub skeleton: SkeletonKey,

    /// Current pose, written by the skeletal animator
    pub bones: Vec<Bone>,

    // Final skinning matrices (bone world * inverse bind)
    // Data flow: pose -> here -> renderer
    pub(crate) worldspace_bone_matrices: Vec<Mat4>,

    // Last frame's matrices, kept for motion vectors
    pub(crate) previous_worldspace_bone_matrices: Vec<Mat4>,
}

impl SkinnedMeshComponent {
    /// Starts in the skeleton's rest pose.
    #[must_use]
    pub fn new(skeleton_key: SkeletonKey, skeleton: &Skeleton) -> Self {
        let count = skeleton.bone_count();
        Self {
            skeleton: skeleton_key,
            bones: skeleton.bones().to_vec(),
            worldspace_bone_matrices: vec![Mat4::IDENTITY; count],
            previous_worldspace_bone_matrices: vec![Mat4::IDENTITY; count],
        }
    }

    /// Recomputes the skinning matrices from the current pose.
    ///
    /// The previous result is kept in
    /// [`previous_worldspace_bone_matrices`](Self::previous_worldspace_bone_matrices).
    pub fn propagate_bone_transforms(&mut self, skeleton: &Skeleton) {
        std::mem::swap(
            &mut self.worldspace_bone_matrices,
            &mut self.previous_worldspace_bone_matrices,
        );
        skeleton.compute_skinning_matrices(&self.bones, &mut self.worldspace_bone_matrices);
    }

    /// Drops any animated pose and returns to the skeleton's rest pose.
    pub fn reset_to_bind_pose(&mut self, skeleton: &Skeleton) {
        self.bones.clear();
        self.bones.extend_from_slice(skeleton.bones());
    }

    #[inline]
    #[must_use]
    pub fn worldspace_bone_matrices(&self) -> &[Mat4] {
        &self.worldspace_bone_matrices
    }

    #[inline]
    #[must_use]
    pub fn previous_worldspace_bone_matrices(&self) -> &[Mat4] {
        &self.previous_worldspace_bone_matrices
    }
}
