//! Animation System
//!
//! Owns skeletons and registered animations, and drives every animator
//! attached to the [`World`].
//!
//! # Directory
//!
//! Animations are keyed by `(Option<SkeletonKey>, name)`. `None` holds node
//! animations, whose channels target imported node ids. `Some(key)` holds
//! skeletal animations, whose channels target bone indices of that skeleton.
//!
//! # Playback
//!
//! [`AnimationSystem::play_animation_on_entity`] picks the animator kind from
//! the entity's shape: a [`SkinnedMeshComponent`] anywhere in its subtree
//! selects skeletal playback, otherwise the entity's
//! [`ImportedModelComponent`] maps channels to node entities.
//!
//! Unknown animation names are content errors. They are logged and the call
//! does nothing.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use slotmap::SlotMap;
use smallvec::SmallVec;
use ziggurat_animation::{
    Animation, AnimationEventSampler, LoopMode, NodeAnimationComponent, NodeAnimator, SkeletalAnimatorComponent,
    Skeleton, SkeletonAnimator,
};
use ziggurat_core::{AnimationSettings, Entity, Result, SkeletonKey, ZigguratError};

use crate::skinned_mesh::SkinnedMeshComponent;
use crate::world::World;

/// Which animator kind a playback request was dispatched to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackTarget {
    /// Node animators were attached to the model's node entities.
    Node,
    /// A skeletal animator was attached to `mesh`.
    Skeletal { mesh: Entity, skeleton: SkeletonKey },
}

/// What one [`AnimationSystem::tick`] did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AnimationTickStats {
    /// Node transforms written
    pub nodes_sampled: usize,
    /// Skinned meshes whose pose was written
    pub skeletons_sampled: usize,
    /// Animator components removed because playback ended
    pub finished: usize,
    /// Event callbacks invoked
    pub events_fired: usize,
}

/// Event playback tied to the entity the animation was started on.
struct ActiveEventTimeline {
    owner: Entity,
    sampler: AnimationEventSampler,
}

type AnimationMap = FxHashMap<String, Arc<Animation>>;

pub struct AnimationSystem {
    skeletons: SlotMap<SkeletonKey, Skeleton>,
    animations: FxHashMap<Option<SkeletonKey>, AnimationMap>,
    active_event_timelines: Vec<ActiveEventTimeline>,
    settings: AnimationSettings,
}

impl Default for AnimationSystem {
    fn default() -> Self {
        Self::new(AnimationSettings::default())
    }
}

impl AnimationSystem {
    #[must_use]
    pub fn new(settings: AnimationSettings) -> Self {
        Self {
            skeletons: SlotMap::with_key(),
            animations: FxHashMap::default(),
            active_event_timelines: Vec::new(),
            settings,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &AnimationSettings {
        &self.settings
    }

    /// Applies to playback started after this call.
    pub fn set_settings(&mut self, settings: AnimationSettings) {
        self.settings = settings;
    }

    // ========================================================================
    // Skeletons
    // ========================================================================

    pub fn add_skeleton(&mut self, skeleton: Skeleton) -> SkeletonKey {
        log::debug!("Registered skeleton '{}' ({} bones)", skeleton.name, skeleton.bone_count());
        self.skeletons.insert(skeleton)
    }

    #[must_use]
    pub fn skeleton(&self, key: SkeletonKey) -> Option<&Skeleton> {
        self.skeletons.get(key)
    }

    /// Removes the skeleton and every animation registered under it.
    ///
    /// Meshes still referencing the key keep their last pose.
    pub fn destroy_skeleton(&mut self, key: SkeletonKey) -> bool {
        let evicted = self.animations.remove(&Some(key)).map_or(0, |map| map.len());
        let removed = self.skeletons.remove(key);
        if let Some(skeleton) = &removed {
            log::debug!("Destroyed skeleton '{}', evicting {evicted} animation(s)", skeleton.name);
        }
        removed.is_some()
    }

    /// Builds a mesh component in the skeleton's rest pose.
    pub fn create_skinned_mesh(&self, key: SkeletonKey) -> Result<SkinnedMeshComponent> {
        let skeleton = self.skeletons.get(key).ok_or(ZigguratError::UnknownSkeleton(key))?;
        Ok(SkinnedMeshComponent::new(key, skeleton))
    }

    // ========================================================================
    // Directory
    // ========================================================================

    /// Registers an animation.
    ///
    /// Fails if `skeleton` is not registered or if the name is already taken
    /// under that key. A failed call leaves the existing registration intact.
    pub fn add_animation(&mut self, skeleton: Option<SkeletonKey>, name: &str, animation: Animation) -> Result<()> {
        if let Some(key) = skeleton
            && !self.skeletons.contains_key(key)
        {
            return Err(ZigguratError::UnknownSkeleton(key));
        }

        let map = self.animations.entry(skeleton).or_default();
        if map.contains_key(name) {
            return Err(ZigguratError::DuplicateAnimation {
                skeleton,
                name: name.to_string(),
            });
        }
        map.insert(name.to_string(), Arc::new(animation));
        log::debug!("Registered animation '{name}' for {skeleton:?}");
        Ok(())
    }

    pub fn get_animation(&self, skeleton: Option<SkeletonKey>, name: &str) -> Result<&Arc<Animation>> {
        if let Some(key) = skeleton
            && !self.skeletons.contains_key(key)
        {
            return Err(ZigguratError::UnknownSkeleton(key));
        }
        self.animations
            .get(&skeleton)
            .and_then(|map| map.get(name))
            .ok_or_else(|| ZigguratError::AnimationNotFound {
                skeleton,
                name: name.to_string(),
            })
    }

    #[must_use]
    pub fn has_animation(&self, skeleton: Option<SkeletonKey>, name: &str) -> bool {
        self.animations.get(&skeleton).is_some_and(|map| map.contains_key(name))
    }

    /// Names registered under `skeleton`, in no particular order.
    pub fn animation_names(&self, skeleton: Option<SkeletonKey>) -> impl Iterator<Item = &str> {
        self.animations
            .get(&skeleton)
            .into_iter()
            .flat_map(|map| map.keys().map(String::as_str))
    }

    /// Adds an event callback to a registered animation.
    ///
    /// Playback already in progress keeps the events it started with; the
    /// callback applies from the next `play_animation_on_entity`. Callbacks
    /// must own what they capture.
    pub fn add_event<F>(&mut self, skeleton: Option<SkeletonKey>, name: &str, time: f32, func: F) -> Result<()>
    where
        F: Fn() + Send + Sync + 'static,
    {
        let animation = self
            .animations
            .get_mut(&skeleton)
            .and_then(|map| map.get_mut(name))
            .ok_or_else(|| ZigguratError::AnimationNotFound {
                skeleton,
                name: name.to_string(),
            })?;
        Arc::make_mut(animation).add_event(time, func);
        Ok(())
    }

    /// Returns `true` if the animation existed.
    pub fn remove_animation(&mut self, skeleton: Option<SkeletonKey>, name: &str) -> bool {
        self.animations
            .get_mut(&skeleton)
            .is_some_and(|map| map.remove(name).is_some())
    }

    // ========================================================================
    // Playback
    // ========================================================================

    /// Starts `name` on `entity` at absolute time `now`.
    ///
    /// Returns the animator kind that was attached, or `None` if nothing was
    /// played. Playback already running on the same targets is replaced.
    pub fn play_animation_on_entity(
        &mut self,
        world: &mut World,
        entity: Entity,
        name: &str,
        now: f32,
    ) -> Option<PlaybackTarget> {
        if !world.is_alive(entity) {
            log::error!("Cannot play '{name}': entity {entity:?} is not alive");
            return None;
        }

        let mesh = world.find_in_subtree(entity, |world, e| world.skinned_meshes.contains_key(e));
        let skeleton = mesh.and_then(|mesh| world.skinned_meshes.get(mesh)).map(|m| m.skeleton);

        let Some(animation) = self.animations.get(&skeleton).and_then(|map| map.get(name)).cloned() else {
            log::error!("Could not find an animation named '{name}' for {skeleton:?}, unable to play");
            return None;
        };

        let target = match (mesh, skeleton) {
            (Some(mesh), Some(skeleton)) => self.attach_skeletal(world, mesh, skeleton, name, &animation, now)?,
            _ => self.attach_nodes(world, entity, name, &animation, now)?,
        };

        if !animation.events().is_empty() {
            let sampler = AnimationEventSampler::new(Arc::clone(animation.events()), now)
                .with_replay_skipped(self.settings.replay_skipped_events);
            self.active_event_timelines.push(ActiveEventTimeline { owner: entity, sampler });
        }

        log::debug!("Playing '{name}' on {entity:?} as {target:?}");
        Some(target)
    }

    fn attach_skeletal(
        &self,
        world: &mut World,
        mesh: Entity,
        skeleton: SkeletonKey,
        name: &str,
        animation: &Animation,
        now: f32,
    ) -> Option<PlaybackTarget> {
        let Some(bone_count) = self.skeletons.get(skeleton).map(Skeleton::bone_count) else {
            log::error!("Skinned mesh {mesh:?} references missing skeleton {skeleton:?}");
            return None;
        };

        let loop_mode = LoopMode::from_looping(self.settings.loop_skeletal);
        world.skeletal_animators.insert(
            mesh,
            SkeletalAnimatorComponent {
                animator: SkeletonAnimator::new(animation, bone_count, now, loop_mode),
                skeleton,
                animation: name.to_string(),
            },
        );
        Some(PlaybackTarget::Skeletal { mesh, skeleton })
    }

    fn attach_nodes(
        &self,
        world: &mut World,
        entity: Entity,
        name: &str,
        animation: &Animation,
        now: f32,
    ) -> Option<PlaybackTarget> {
        let Some(model) = world.imported_models.get(entity) else {
            log::error!("Entity {entity:?} has no imported model, unable to play node animation '{name}'");
            return None;
        };

        let loop_mode = LoopMode::from_looping(self.settings.loop_node);
        let mut targets: SmallVec<[(Entity, NodeAnimator); 16]> = SmallVec::new();
        for (&node, channel) in &animation.channels {
            match model.entity_for_node(node) {
                Some(target) if world.transforms.contains_key(target) && world.is_alive(target) => {
                    targets.push((target, NodeAnimator::new(channel, now).with_loop_mode(loop_mode)));
                }
                _ => log::warn!("Animation '{name}' targets node {node}, which has no live entity"),
            }
        }

        for (target, animator) in targets {
            world.node_animators.insert(
                target,
                NodeAnimationComponent {
                    animator,
                    animation: name.to_string(),
                },
            );
        }
        Some(PlaybackTarget::Node)
    }

    /// Stops playback under `entity`: removes animators in its subtree and on
    /// its model's node entities, and drops event timelines owned by any of
    /// those entities.
    ///
    /// Event timelines belong to the entity playback was started on. Stopping
    /// a descendant of that entity leaves its events running; stop the owner
    /// to silence them.
    ///
    /// Poses are left where the last tick put them. Returns the number of
    /// animator components removed.
    pub fn stop_animation(&mut self, world: &mut World, entity: Entity) -> usize {
        let mut targets = world.subtree(entity);
        if let Some(model) = world.imported_models.get(entity) {
            targets.extend(model.node_to_entity.values().copied());
        }

        let mut removed = 0;
        for &target in &targets {
            removed += usize::from(world.node_animators.remove(target).is_some());
            removed += usize::from(world.skeletal_animators.remove(target).is_some());
        }
        self.active_event_timelines
            .retain(|active| !targets.contains(&active.owner));

        log::debug!("Stopped {removed} animator(s) under {entity:?}");
        removed
    }

    #[must_use]
    pub fn active_event_timeline_count(&self) -> usize {
        self.active_event_timelines.len()
    }

    /// Samples every animator at absolute time `now` and fires due events.
    ///
    /// Node animators write their node's local transform; skeletal animators
    /// write their mesh's bone pose. Animators that have ended are removed
    /// after their final sample, leaving the last pose in place.
    pub fn tick(&mut self, world: &mut World, now: f32) -> AnimationTickStats {
        let mut stats = AnimationTickStats::default();
        let mut finished: SmallVec<[Entity; 16]> = SmallVec::new();

        for (entity, component) in &mut world.node_animators {
            let Some(transform) = world.transforms.get_mut(entity) else {
                finished.push(entity);
                continue;
            };
            transform.set_local_transform(component.animator.sample(now));
            stats.nodes_sampled += 1;

            if component.animator.has_animation_ended(now) {
                finished.push(entity);
            }
        }
        for entity in finished.drain(..) {
            world.node_animators.remove(entity);
            stats.finished += 1;
        }

        for (entity, component) in &mut world.skeletal_animators {
            let Some(mesh) = world.skinned_meshes.get_mut(entity) else {
                finished.push(entity);
                continue;
            };
            component.animator.update_bones(&mut mesh.bones, now);
            stats.skeletons_sampled += 1;

            if component.animator.has_animation_ended(now) {
                finished.push(entity);
            }
        }
        for entity in finished.drain(..) {
            world.skeletal_animators.remove(entity);
            stats.finished += 1;
        }

        self.active_event_timelines.retain_mut(|active| {
            if !world.is_alive(active.owner) {
                return false;
            }
            stats.events_fired += active.sampler.tick(now);
            !active.sampler.is_ended(now)
        });

        if stats.finished > 0 {
            log::debug!("{} animator(s) finished at t={now}", stats.finished);
        }
        stats
    }

    /// Recomputes skinning matrices for every skinned mesh from its current
    /// pose. Returns the number of meshes updated.
    pub fn propagate_bone_transforms(&self, world: &mut World) -> usize {
        let mut updated = 0;
        for (entity, mesh) in &mut world.skinned_meshes {
            match self.skeletons.get(mesh.skeleton) {
                Some(skeleton) => {
                    mesh.propagate_bone_transforms(skeleton);
                    updated += 1;
                }
                None => log::trace!("Skinned mesh {entity:?} references a destroyed skeleton"),
            }
        }
        updated
    }
}
