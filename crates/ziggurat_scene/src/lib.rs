//! Entity world and animation playback for the Ziggurat engine.
//!
//! - [`World`]: entity registry, components, parent/child hierarchy
//! - [`transform_system`]: cached world transform propagation
//! - [`AnimationSystem`]: skeleton pool, animation directory, playback
//!
//! A frame runs, in order: [`AnimationSystem::tick`],
//! [`World::propagate_transforms`], then
//! [`AnimationSystem::propagate_bone_transforms`]. World transforms read
//! between a mutation and the next propagation may be stale.

pub mod animation_system;
pub mod model;
pub mod skinned_mesh;
pub mod transform;
pub mod transform_system;
pub mod world;

pub use animation_system::{AnimationSystem, AnimationTickStats, PlaybackTarget};
pub use model::ImportedModelComponent;
pub use skinned_mesh::SkinnedMeshComponent;
pub use transform::TransformNode;
pub use transform_system::PropagationStats;
pub use world::{EntityInfo, World};
