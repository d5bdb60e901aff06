use glam::{EulerRot, Mat3, Mat4, Quat, Vec3};
use smallvec::SmallVec;
use ziggurat_core::Entity;

/// Transform component: local TRS, a cached parent-to-world matrix, and
/// hierarchy links.
///
/// The node's world matrix is always `cached_parent_to_world * local`. The
/// cache is refreshed by transform propagation; between a mutation and the
/// next pass it may be stale.
///
/// `parent` is a back-reference only. `children` is used for traversal; the
/// world registry, not the parent, owns the children's lifetime, so a child
/// may be destroyed while still listed here until the next propagation pass
/// prunes it.
#[derive(Debug, Clone)]
pub struct TransformNode {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,

    pub(crate) cached_parent_to_world: Mat4,
    pub(crate) parent: Option<Entity>,
    pub(crate) children: SmallVec<[Entity; 16]>,
}

impl TransformNode {
    #[must_use]
    pub fn new() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            cached_parent_to_world: Mat4::IDENTITY,
            parent: None,
            children: SmallVec::new(),
        }
    }

    #[must_use]
    pub fn from_translation(position: Vec3) -> Self {
        Self {
            position,
            ..Self::new()
        }
    }

    #[must_use]
    pub fn from_trs(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale,
            ..Self::new()
        }
    }

    /// Local-to-parent matrix, translate * rotate * scale.
    #[inline]
    #[must_use]
    pub fn local_to_parent(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    #[inline]
    #[must_use]
    pub fn local_to_world(&self) -> Mat4 {
        self.cached_parent_to_world * self.local_to_parent()
    }

    #[inline]
    #[must_use]
    pub fn cached_parent_to_world(&self) -> &Mat4 {
        &self.cached_parent_to_world
    }

    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<Entity> {
        self.parent
    }

    /// Child entities. May contain destroyed entities until the next
    /// propagation pass.
    #[inline]
    #[must_use]
    pub fn children(&self) -> &[Entity] {
        &self.children
    }

    /// Replaces the local TRS by decomposing `transform`.
    ///
    /// Shear and perspective cannot be represented and are dropped.
    pub fn set_local_transform(&mut self, transform: Mat4) {
        let (scale, rotation, translation) = transform.to_scale_rotation_translation();
        self.scale = scale;
        self.rotation = rotation;
        self.position = translation;
    }

    pub fn set_rotation_euler(&mut self, x: f32, y: f32, z: f32) {
        self.rotation = Quat::from_euler(EulerRot::XYZ, x, y, z);
    }

    /// Rotates so that -Z points at `target`. `target` and `up` are in the
    /// parent's space.
    pub fn look_at(&mut self, target: Vec3, up: Vec3) {
        let forward = (target - self.position).normalize_or_zero();
        let right = forward.cross(up);
        if right.length_squared() < 1e-8 {
            return;
        }
        let right = right.normalize();
        let new_up = right.cross(forward);
        self.rotation = Quat::from_mat3(&Mat3::from_cols(right, new_up, -forward));
    }
}

impl Default for TransformNode {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_local_transform_round_trips_trs() {
        let mut node = TransformNode::new();
        let rotation = Quat::from_rotation_y(0.7);
        node.set_local_transform(Mat4::from_scale_rotation_translation(
            Vec3::splat(2.0),
            rotation,
            Vec3::new(1.0, 2.0, 3.0),
        ));
        assert!((node.position - Vec3::new(1.0, 2.0, 3.0)).length() < 1e-5);
        assert!((node.scale - Vec3::splat(2.0)).length() < 1e-5);
        assert!(node.rotation.angle_between(rotation) < 1e-4);
    }

    #[test]
    fn look_at_points_negative_z_at_target() {
        let mut node = TransformNode::new();
        node.look_at(Vec3::new(10.0, 0.0, 0.0), Vec3::Y);
        let forward = node.rotation * Vec3::NEG_Z;
        assert!((forward - Vec3::X).length() < 1e-5);
    }
}
