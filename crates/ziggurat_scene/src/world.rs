use std::collections::VecDeque;

use glam::Mat4;
use slotmap::{SecondaryMap, SlotMap, SparseSecondaryMap};
use ziggurat_animation::{NodeAnimationComponent, SkeletalAnimatorComponent};
use ziggurat_core::{Entity, Result, ZigguratError};

use crate::model::ImportedModelComponent;
use crate::skinned_mesh::SkinnedMeshComponent;
use crate::transform::TransformNode;
use crate::transform_system::{self, PropagationStats};

/// Per-entity bookkeeping kept by the registry itself.
#[derive(Debug, Clone, Default)]
pub struct EntityInfo {
    pub name: String,
}

/// The entity registry and its component storage.
///
/// Entities are generational handles; destroying one invalidates every copy
/// of its handle. Components live in per-type maps keyed by entity.
///
/// # Hierarchy
///
/// Every entity with a [`TransformNode`] sits either in exactly one parent's
/// child list or in the top-level root list. Propagation starts from the
/// roots, so a transform that is in neither is never updated.
pub struct World {
    pub(crate) entities: SlotMap<Entity, EntityInfo>,
    pub(crate) transforms: SecondaryMap<Entity, TransformNode>,

    pub(crate) skinned_meshes: SparseSecondaryMap<Entity, SkinnedMeshComponent>,
    pub(crate) imported_models: SparseSecondaryMap<Entity, ImportedModelComponent>,
    pub(crate) node_animators: SparseSecondaryMap<Entity, NodeAnimationComponent>,
    pub(crate) skeletal_animators: SparseSecondaryMap<Entity, SkeletalAnimatorComponent>,

    /// Starting points of transform propagation
    top_level_entities: Vec<Entity>,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entities: SlotMap::with_key(),
            transforms: SecondaryMap::new(),
            skinned_meshes: SparseSecondaryMap::new(),
            imported_models: SparseSecondaryMap::new(),
            node_animators: SparseSecondaryMap::new(),
            skeletal_animators: SparseSecondaryMap::new(),
            top_level_entities: Vec::new(),
        }
    }

    // ========================================================================
    // Entity lifecycle
    // ========================================================================

    /// Creates a bare entity with no components.
    pub fn create_entity(&mut self) -> Entity {
        self.entities.insert(EntityInfo::default())
    }

    /// Creates a named entity with a default transform, parented to `parent`
    /// or registered as a top-level root.
    pub fn create_node(&mut self, name: &str, parent: Option<Entity>) -> Result<Entity> {
        self.create_node_with_transform(name, TransformNode::new(), parent)
    }

    pub fn create_node_with_transform(
        &mut self,
        name: &str,
        transform: TransformNode,
        parent: Option<Entity>,
    ) -> Result<Entity> {
        if let Some(parent) = parent {
            self.expect_transform(parent)?;
        }

        let entity = self.entities.insert(EntityInfo { name: name.to_string() });
        self.add_transform(entity, transform)?;

        match parent {
            Some(parent) => self.parent_entity_to_entity(entity, parent)?,
            None => self.add_top_level_entities(&[entity]),
        }
        Ok(entity)
    }

    #[inline]
    #[must_use]
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.contains_key(entity)
    }

    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Destroys `entity` and, recursively, every child listed in its transform.
    ///
    /// The entity is *not* removed from its parent's child list; the next
    /// propagation pass prunes it.
    pub fn destroy_entity(&mut self, entity: Entity) {
        if !self.is_alive(entity) {
            return;
        }

        let children = self
            .transforms
            .get(entity)
            .map(|t| t.children.clone())
            .unwrap_or_default();
        for child in children {
            self.destroy_entity(child);
        }

        self.top_level_entities.retain(|&e| e != entity);
        self.transforms.remove(entity);
        self.skinned_meshes.remove(entity);
        self.imported_models.remove(entity);
        self.node_animators.remove(entity);
        self.skeletal_animators.remove(entity);
        self.entities.remove(entity);
    }

    #[must_use]
    pub fn name(&self, entity: Entity) -> Option<&str> {
        self.entities.get(entity).map(|info| info.name.as_str())
    }

    pub fn set_name(&mut self, entity: Entity, name: &str) {
        if let Some(info) = self.entities.get_mut(entity) {
            info.name = name.to_string();
        }
    }

    // ========================================================================
    // Transforms & hierarchy
    // ========================================================================

    /// Attaches a transform to `entity`.
    ///
    /// A fresh transform is not registered as a root or parented; use
    /// [`World::add_top_level_entities`] or [`World::parent_entity_to_entity`].
    /// If `entity` already has a transform only its local TRS is replaced, and
    /// its place in the hierarchy and cached parent matrix are kept.
    pub fn add_transform(&mut self, entity: Entity, mut transform: TransformNode) -> Result<()> {
        if !self.is_alive(entity) {
            return Err(ZigguratError::InvalidEntity(entity));
        }
        if let Some(existing) = self.transforms.get_mut(entity) {
            existing.position = transform.position;
            existing.rotation = transform.rotation;
            existing.scale = transform.scale;
            return Ok(());
        }
        transform.parent = None;
        transform.children.clear();
        transform.cached_parent_to_world = Mat4::IDENTITY;
        self.transforms.insert(entity, transform);
        Ok(())
    }

    #[must_use]
    pub fn transform(&self, entity: Entity) -> Option<&TransformNode> {
        self.transforms.get(entity)
    }

    /// Mutable access to the local TRS. The world matrix catches up on the
    /// next propagation pass.
    pub fn transform_mut(&mut self, entity: Entity) -> Option<&mut TransformNode> {
        self.transforms.get_mut(entity)
    }

    /// `cached_parent_to_world * local` as of the last propagation.
    #[must_use]
    pub fn local_to_world(&self, entity: Entity) -> Option<Mat4> {
        self.transforms.get(entity).map(TransformNode::local_to_world)
    }

    pub fn set_local_transform(&mut self, entity: Entity, transform: Mat4) -> Result<()> {
        self.transforms
            .get_mut(entity)
            .ok_or(ZigguratError::MissingTransform(entity))?
            .set_local_transform(transform);
        Ok(())
    }

    fn expect_transform(&self, entity: Entity) -> Result<&TransformNode> {
        if !self.is_alive(entity) {
            return Err(ZigguratError::InvalidEntity(entity));
        }
        self.transforms
            .get(entity)
            .ok_or(ZigguratError::MissingTransform(entity))
    }

    /// Makes `child` a child of `parent`.
    ///
    /// Both entities need a transform and `child` must not already have a
    /// parent. The child leaves the top-level roots and its subtree's cached
    /// transforms are re-derived immediately, so reads are consistent before
    /// the next full propagation.
    pub fn parent_entity_to_entity(&mut self, child: Entity, parent: Entity) -> Result<()> {
        self.expect_transform(child)?;
        if let Some(current) = self.live_parent(child) {
            return Err(ZigguratError::AlreadyParented { child, parent: current });
        }
        self.expect_transform(parent)?;
        if self.is_ancestor_or_self(child, parent) {
            return Err(ZigguratError::HierarchyCycle { child, parent });
        }

        if let Some(node) = self.transforms.get_mut(parent) {
            node.children.push(child);
        }
        if let Some(node) = self.transforms.get_mut(child) {
            node.parent = Some(parent);
        }
        self.top_level_entities.retain(|&e| e != child);

        transform_system::update_subtree(&self.entities, &mut self.transforms, child);
        log::trace!("Parented {child:?} to {parent:?}");
        Ok(())
    }

    /// Removes `child` from its parent and makes it a top-level root again,
    /// keeping its current world pose.
    pub fn detach_entity(&mut self, child: Entity) -> Result<()> {
        let world = self.expect_transform(child)?.local_to_world();
        let Some(parent) = self.transforms.get(child).and_then(|t| t.parent) else {
            return Ok(());
        };

        if let Some(node) = self.transforms.get_mut(parent) {
            node.children.retain(|c| *c != child);
        }
        if let Some(node) = self.transforms.get_mut(child) {
            node.parent = None;
            node.set_local_transform(world);
        }
        self.add_top_level_entities(&[child]);

        transform_system::update_subtree(&self.entities, &mut self.transforms, child);
        Ok(())
    }

    fn live_parent(&self, entity: Entity) -> Option<Entity> {
        self.transforms
            .get(entity)
            .and_then(|t| t.parent)
            .filter(|&p| self.is_alive(p))
    }

    /// Whether `ancestor` is `entity` or one of its ancestors.
    fn is_ancestor_or_self(&self, ancestor: Entity, entity: Entity) -> bool {
        let mut current = Some(entity);
        while let Some(e) = current {
            if e == ancestor {
                return true;
            }
            current = self.transforms.get(e).and_then(|t| t.parent);
        }
        false
    }

    /// Registers entities as propagation roots.
    ///
    /// Entities already listed are skipped, as are entities that still have a
    /// live parent; detach those first with [`World::detach_entity`].
    pub fn add_top_level_entities(&mut self, entities: &[Entity]) {
        for &entity in entities {
            if let Some(parent) = self.live_parent(entity) {
                log::warn!("{entity:?} is a child of {parent:?}; not adding it as a top-level entity");
                continue;
            }
            if !self.top_level_entities.contains(&entity) {
                self.top_level_entities.push(entity);
            }
        }
    }

    /// May contain destroyed entities until the next propagation pass.
    #[must_use]
    pub fn top_level_entities(&self) -> &[Entity] {
        &self.top_level_entities
    }

    /// Recomputes every cached world transform from the top-level roots.
    pub fn propagate_transforms(&mut self) -> PropagationStats {
        transform_system::update_hierarchy(&self.entities, &mut self.transforms, &mut self.top_level_entities)
    }

    /// Recomputes the cached world transforms of one subtree.
    pub fn update_subtree(&mut self, entity: Entity) -> PropagationStats {
        transform_system::update_subtree(&self.entities, &mut self.transforms, entity)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Finds a descendant of `entity` named `name`, checking each level of
    /// children before descending. `entity` itself is not checked.
    #[must_use]
    pub fn find_child(&self, entity: Entity, name: &str) -> Option<Entity> {
        self.find_in_subtree(entity, |world, e| e != entity && world.name(e) == Some(name))
    }

    /// Finds any entity named `name`, searching the top-level roots first.
    #[must_use]
    pub fn find_entity(&self, name: &str) -> Option<Entity> {
        self.top_level_entities
            .iter()
            .copied()
            .find(|&e| self.name(e) == Some(name))
            .or_else(|| {
                self.top_level_entities
                    .iter()
                    .find_map(|&root| self.find_child(root, name))
            })
    }

    /// Breadth-first search of `root`'s subtree, `root` included.
    pub fn find_in_subtree(&self, root: Entity, predicate: impl Fn(&Self, Entity) -> bool) -> Option<Entity> {
        let mut queue = VecDeque::from([root]);
        while let Some(entity) = queue.pop_front() {
            if !self.is_alive(entity) {
                continue;
            }
            if predicate(self, entity) {
                return Some(entity);
            }
            if let Some(node) = self.transforms.get(entity) {
                queue.extend(node.children.iter().copied());
            }
        }
        None
    }

    /// Every live entity in `root`'s subtree, `root` first.
    #[must_use]
    pub fn subtree(&self, root: Entity) -> Vec<Entity> {
        let mut result = Vec::new();
        let mut stack = vec![root];
        while let Some(entity) = stack.pop() {
            if !self.is_alive(entity) {
                continue;
            }
            result.push(entity);
            if let Some(node) = self.transforms.get(entity) {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        result
    }

    // ========================================================================
    // Components
    // ========================================================================

    pub fn add_skinned_mesh(&mut self, entity: Entity, mesh: SkinnedMeshComponent) -> Result<()> {
        if !self.is_alive(entity) {
            return Err(ZigguratError::InvalidEntity(entity));
        }
        self.skinned_meshes.insert(entity, mesh);
        Ok(())
    }

    #[must_use]
    pub fn skinned_mesh(&self, entity: Entity) -> Option<&SkinnedMeshComponent> {
        self.skinned_meshes.get(entity)
    }

    pub fn skinned_mesh_mut(&mut self, entity: Entity) -> Option<&mut SkinnedMeshComponent> {
        self.skinned_meshes.get_mut(entity)
    }

    pub fn add_imported_model(&mut self, entity: Entity, model: ImportedModelComponent) -> Result<()> {
        if !self.is_alive(entity) {
            return Err(ZigguratError::InvalidEntity(entity));
        }
        self.imported_models.insert(entity, model);
        Ok(())
    }

    #[must_use]
    pub fn imported_model(&self, entity: Entity) -> Option<&ImportedModelComponent> {
        self.imported_models.get(entity)
    }

    #[must_use]
    pub fn node_animator(&self, entity: Entity) -> Option<&NodeAnimationComponent> {
        self.node_animators.get(entity)
    }

    #[must_use]
    pub fn skeletal_animator(&self, entity: Entity) -> Option<&SkeletalAnimatorComponent> {
        self.skeletal_animators.get(entity)
    }

    /// Number of node and skeletal animators currently attached.
    #[must_use]
    pub fn active_animator_count(&self) -> usize {
        self.node_animators.len() + self.skeletal_animators.len()
    }
}
