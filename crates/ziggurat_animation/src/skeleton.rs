use glam::Mat4;
use smallvec::SmallVec;
use ziggurat_core::{Result, ZigguratError};

/// One joint of a skeleton's internal hierarchy.
///
/// Bones are addressed by index. The hierarchy lives in `children`, which
/// indexes into the same bone array.
#[derive(Debug, Clone, PartialEq)]
pub struct Bone {
    pub local_transform: Mat4,
    pub children: SmallVec<[usize; 4]>,
}

impl Bone {
    #[must_use]
    pub fn new(local_transform: Mat4) -> Self {
        Self {
            local_transform,
            children: SmallVec::new(),
        }
    }

    #[must_use]
    pub fn with_children(mut self, children: impl IntoIterator<Item = usize>) -> Self {
        self.children.extend(children);
        self
    }
}

/// Imported skin data: the rest pose and the inverse bind matrices.
///
/// Bone order matches the joint order the skinned mesh was authored with,
/// so `bones[i]` drives joint `i` in the vertex data. Skeletal animation
/// channels are keyed by this same index.
#[derive(Debug, Clone)]
pub struct Skeleton {
    pub name: String,

    bones: Vec<Bone>,

    inverse_bind_matrices: Vec<Mat4>,

    /// Bones that are nobody's child
    root_bones: Vec<usize>,
}

impl Skeleton {
    /// Validates the bone hierarchy and computes the root bones.
    ///
    /// An empty `inverse_bind_matrices` means every joint is bound at identity.
    pub fn new(name: &str, bones: Vec<Bone>, inverse_bind_matrices: Vec<Mat4>) -> Result<Self> {
        let inverse_bind_matrices = if inverse_bind_matrices.is_empty() {
            vec![Mat4::IDENTITY; bones.len()]
        } else {
            inverse_bind_matrices
        };

        if inverse_bind_matrices.len() != bones.len() {
            return Err(ZigguratError::InvalidSkeleton(format!(
                "'{name}' has {} bones but {} inverse bind matrices",
                bones.len(),
                inverse_bind_matrices.len()
            )));
        }

        let mut parent_of: Vec<Option<usize>> = vec![None; bones.len()];
        for (index, bone) in bones.iter().enumerate() {
            for &child in &bone.children {
                if child >= bones.len() || child == index {
                    return Err(ZigguratError::InvalidSkeleton(format!(
                        "'{name}': bone {index} lists invalid child {child}"
                    )));
                }
                if let Some(previous) = parent_of[child].replace(index) {
                    return Err(ZigguratError::InvalidSkeleton(format!(
                        "'{name}': bone {child} is a child of both {previous} and {index}"
                    )));
                }
            }
        }

        let root_bones: Vec<usize> = parent_of
            .iter()
            .enumerate()
            .filter_map(|(index, parent)| parent.is_none().then_some(index))
            .collect();

        if root_bones.is_empty() && !bones.is_empty() {
            return Err(ZigguratError::InvalidSkeleton(format!("'{name}' has no root bone")));
        }

        Ok(Self {
            name: name.to_string(),
            bones,
            inverse_bind_matrices,
            root_bones,
        })
    }

    /// Rest pose.
    #[inline]
    #[must_use]
    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    #[inline]
    #[must_use]
    pub fn inverse_bind_matrices(&self) -> &[Mat4] {
        &self.inverse_bind_matrices
    }

    #[inline]
    #[must_use]
    pub fn root_bones(&self) -> &[usize] {
        &self.root_bones
    }

    #[inline]
    #[must_use]
    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    /// Computes skinning matrices for a posed copy of this skeleton's bones.
    ///
    /// Each bone's local transform is composed with its ancestors' from the
    /// roots down, then multiplied by the bone's inverse bind matrix.
    /// `pose` must have the same hierarchy as [`Skeleton::bones`].
    pub fn compute_skinning_matrices(&self, pose: &[Bone], output: &mut Vec<Mat4>) {
        output.clear();
        output.resize(pose.len(), Mat4::IDENTITY);

        let mut stack: Vec<(usize, Mat4)> = self
            .root_bones
            .iter()
            .rev()
            .map(|&root| (root, Mat4::IDENTITY))
            .collect();

        while let Some((index, parent_matrix)) = stack.pop() {
            let Some(bone) = pose.get(index) else {
                continue;
            };
            let world = parent_matrix * bone.local_transform;
            output[index] = world;
            stack.extend(bone.children.iter().rev().map(|&child| (child, world)));
        }

        for (matrix, inverse_bind) in output.iter_mut().zip(&self.inverse_bind_matrices) {
            *matrix *= *inverse_bind;
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;

    fn chain() -> Vec<Bone> {
        vec![
            Bone::new(Mat4::from_translation(Vec3::X)).with_children([1]),
            Bone::new(Mat4::from_translation(Vec3::Y)).with_children([2]),
            Bone::new(Mat4::from_translation(Vec3::Z)),
        ]
    }

    #[test]
    fn root_bones_are_unreferenced() {
        let mut bones = chain();
        bones.push(Bone::new(Mat4::IDENTITY));
        let skeleton = Skeleton::new("chain", bones, Vec::new()).unwrap();
        assert_eq!(skeleton.root_bones(), &[0, 3]);
    }

    #[test]
    fn rejects_out_of_range_child() {
        let bones = vec![Bone::new(Mat4::IDENTITY).with_children([5])];
        assert!(Skeleton::new("bad", bones, Vec::new()).is_err());
    }

    #[test]
    fn rejects_shared_child() {
        let bones = vec![
            Bone::new(Mat4::IDENTITY).with_children([2]),
            Bone::new(Mat4::IDENTITY).with_children([2]),
            Bone::new(Mat4::IDENTITY),
        ];
        assert!(Skeleton::new("bad", bones, Vec::new()).is_err());
    }

    #[test]
    fn rejects_inverse_bind_count_mismatch() {
        assert!(Skeleton::new("bad", chain(), vec![Mat4::IDENTITY]).is_err());
    }

    #[test]
    fn skinning_composes_down_the_chain() {
        let skeleton = Skeleton::new("chain", chain(), Vec::new()).unwrap();
        let mut matrices = Vec::new();
        skeleton.compute_skinning_matrices(skeleton.bones(), &mut matrices);
        let tip = matrices[2].transform_point3(Vec3::ZERO);
        assert!((tip - Vec3::ONE).length() < 1e-6);
    }

    #[test]
    fn inverse_bind_cancels_rest_pose() {
        let bones = chain();
        let mut rest = Vec::new();
        Skeleton::new("chain", bones.clone(), Vec::new())
            .unwrap()
            .compute_skinning_matrices(&bones, &mut rest);
        let inverse: Vec<Mat4> = rest.iter().map(Mat4::inverse).collect();

        let skeleton = Skeleton::new("chain", bones, inverse).unwrap();
        let mut matrices = Vec::new();
        skeleton.compute_skinning_matrices(skeleton.bones(), &mut matrices);
        for matrix in matrices {
            assert!(matrix.abs_diff_eq(Mat4::IDENTITY, 1e-5));
        }
    }
}
