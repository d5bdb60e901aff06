//! Transform System
//!
//! Recomputes cached world transforms from the top-level roots down. Like the
//! rest of the scene crate it only borrows the storage it needs (the entity
//! registry, the transform map, and the root list) rather than the whole
//! [`World`](crate::World).
//!
//! # Algorithm
//!
//! Depth-first, pre-order, using an explicit stack. Every reachable node is
//! visited on every pass; there is no dirty tracking. At each node:
//!
//! 1. The incoming parent-to-world matrix is written into the node's cache
//!    only if it differs from the cached value.
//! 2. The node's world matrix becomes the parent-to-world of its children.
//! 3. Children that are no longer alive are collected while the child list
//!    is read, then removed in one edit once the node's iteration is done.
//!
//! Roots that are no longer alive are dropped the same way before the walk.
//!
//! # Cycles
//!
//! The walk assumes the hierarchy is a forest. [`World`](crate::World)
//! refuses to create cycles, but a hierarchy edited by hand that contains
//! one makes the walk loop forever.

use glam::Mat4;
use slotmap::{SecondaryMap, SlotMap};
use smallvec::SmallVec;
use ziggurat_core::Entity;

use crate::transform::TransformNode;
use crate::world::EntityInfo;

/// What one propagation pass did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PropagationStats {
    /// Nodes whose world transform was recomputed
    pub visited: usize,
    /// Nodes whose cached parent-to-world matrix actually changed
    pub updated: usize,
    /// Stale child or root references removed
    pub pruned: usize,
}

impl std::ops::AddAssign for PropagationStats {
    fn add_assign(&mut self, rhs: Self) {
        self.visited += rhs.visited;
        self.updated += rhs.updated;
        self.pruned += rhs.pruned;
    }
}

#[inline]
fn is_live_node(
    entities: &SlotMap<Entity, EntityInfo>,
    transforms: &SecondaryMap<Entity, TransformNode>,
    entity: Entity,
) -> bool {
    entities.contains_key(entity) && transforms.contains_key(entity)
}

/// Propagates transforms through the whole hierarchy.
pub fn update_hierarchy(
    entities: &SlotMap<Entity, EntityInfo>,
    transforms: &mut SecondaryMap<Entity, TransformNode>,
    roots: &mut Vec<Entity>,
) -> PropagationStats {
    let mut stats = PropagationStats::default();

    let before = roots.len();
    roots.retain(|&root| is_live_node(entities, transforms, root));
    stats.pruned += before - roots.len();

    let starts: Vec<(Entity, Mat4)> = roots.iter().map(|&root| (root, Mat4::IDENTITY)).collect();
    stats += propagate_from(entities, transforms, &starts);

    if stats.pruned > 0 {
        log::trace!("Transform propagation pruned {} stale reference(s)", stats.pruned);
    }
    stats
}

/// Re-derives the cached transforms of `entity` and its descendants from
/// its parent's current world matrix.
pub fn update_subtree(
    entities: &SlotMap<Entity, EntityInfo>,
    transforms: &mut SecondaryMap<Entity, TransformNode>,
    entity: Entity,
) -> PropagationStats {
    let Some(node) = transforms.get(entity) else {
        return PropagationStats::default();
    };

    let parent_to_world = node
        .parent
        .filter(|&parent| entities.contains_key(parent))
        .and_then(|parent| transforms.get(parent))
        .map_or(Mat4::IDENTITY, TransformNode::local_to_world);

    propagate_from(entities, transforms, &[(entity, parent_to_world)])
}

fn propagate_from(
    entities: &SlotMap<Entity, EntityInfo>,
    transforms: &mut SecondaryMap<Entity, TransformNode>,
    starts: &[(Entity, Mat4)],
) -> PropagationStats {
    let mut stats = PropagationStats::default();

    // (node, parent-to-world)
    let mut stack: Vec<(Entity, Mat4)> = Vec::with_capacity(64);
    stack.extend(starts.iter().rev().copied());

    let mut children: SmallVec<[Entity; 16]> = SmallVec::new();
    let mut stale: SmallVec<[Entity; 4]> = SmallVec::new();

    while let Some((entity, parent_to_world)) = stack.pop() {
        let Some(node) = transforms.get_mut(entity) else {
            continue;
        };
        stats.visited += 1;

        if node.cached_parent_to_world != parent_to_world {
            node.cached_parent_to_world = parent_to_world;
            stats.updated += 1;
        }
        let local_to_world = parent_to_world * node.local_to_parent();

        children.clear();
        children.extend_from_slice(&node.children);

        stale.clear();
        let first_child = stack.len();
        for &child in &children {
            if is_live_node(entities, transforms, child) {
                stack.push((child, local_to_world));
            } else {
                stale.push(child);
            }
        }
        // Children were pushed in order; reverse so the first child pops first.
        stack[first_child..].reverse();

        if !stale.is_empty()
            && let Some(node) = transforms.get_mut(entity)
        {
            node.children.retain(|child| !stale.contains(child));
            stats.pruned += stale.len();
        }
    }

    stats
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;

    #[test]
    fn test_hierarchy_update() {
        let mut entities: SlotMap<Entity, EntityInfo> = SlotMap::with_key();
        let mut transforms: SecondaryMap<Entity, TransformNode> = SecondaryMap::new();

        let parent = entities.insert(EntityInfo::default());
        let child = entities.insert(EntityInfo::default());

        let mut parent_node = TransformNode::from_translation(Vec3::new(1.0, 0.0, 0.0));
        parent_node.children.push(child);
        let mut child_node = TransformNode::from_translation(Vec3::new(0.0, 1.0, 0.0));
        child_node.parent = Some(parent);
        transforms.insert(parent, parent_node);
        transforms.insert(child, child_node);

        let mut roots = vec![parent];
        let stats = update_hierarchy(&entities, &mut transforms, &mut roots);

        let world = transforms[child].local_to_world().transform_point3(Vec3::ZERO);
        assert!((world - Vec3::new(1.0, 1.0, 0.0)).length() < 1e-5);
        assert_eq!(stats.visited, 2);
        assert_eq!(stats.updated, 1);

        // Nothing moved: the second pass writes nothing.
        let stats = update_hierarchy(&entities, &mut transforms, &mut roots);
        assert_eq!(stats.updated, 0);
    }

    #[test]
    fn dead_roots_are_pruned() {
        let mut entities: SlotMap<Entity, EntityInfo> = SlotMap::with_key();
        let mut transforms: SecondaryMap<Entity, TransformNode> = SecondaryMap::new();
        let root = entities.insert(EntityInfo::default());
        transforms.insert(root, TransformNode::new());
        entities.remove(root);

        let mut roots = vec![root];
        let stats = update_hierarchy(&entities, &mut transforms, &mut roots);
        assert!(roots.is_empty());
        assert_eq!(stats.pruned, 1);
        assert_eq!(stats.visited, 0);
    }
}
