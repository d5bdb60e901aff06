//! Error Types
//!
//! This module defines the error type shared by every Ziggurat crate.
//!
//! # Overview
//!
//! [`ZigguratError`] only covers conditions that indicate a bug in calling
//! code or malformed data handed over by an importer:
//! - Entity hierarchy misuse (missing transforms, cycles, double parenting)
//! - Animation directory misuse (duplicate names, unknown skeletons)
//! - Invalid keyframe or skeleton data
//!
//! Content problems discovered at play time (an animation name that does not
//! exist, a channel targeting a node that was never spawned) are logged and
//! ignored instead of being reported through this type.
//!
//! # Usage
//!
//! ```rust,ignore
//! use ziggurat_core::errors::{Result, ZigguratError};
//!
//! fn parent(world: &mut World, child: Entity, parent: Entity) -> Result<()> {
//!     world.parent_entity_to_entity(child, parent)?;
//!     Ok(())
//! }
//! ```

use thiserror::Error;

use crate::ids::{Entity, SkeletonKey};

/// The main error type for the Ziggurat engine.
#[derive(Error, Debug)]
pub enum ZigguratError {
    // ========================================================================
    // Entity & Hierarchy Errors
    // ========================================================================
    /// The entity was destroyed or never existed.
    #[error("Entity {0:?} is not alive")]
    InvalidEntity(Entity),

    /// An operation that needs a transform was given an entity without one.
    #[error("Entity {0:?} does not have a transform")]
    MissingTransform(Entity),

    /// The child already has a parent and must be detached first.
    #[error("Entity {child:?} is already parented to {parent:?}")]
    AlreadyParented {
        /// Entity that was being parented
        child: Entity,
        /// Its current parent
        parent: Entity,
    },

    /// Parenting would make an entity its own ancestor.
    #[error("Parenting {child:?} to {parent:?} would create a cycle")]
    HierarchyCycle {
        /// Entity that was being parented
        child: Entity,
        /// Requested parent
        parent: Entity,
    },

    // ========================================================================
    // Animation Directory Errors
    // ========================================================================
    /// Two animations with the same name were registered under one skeleton.
    #[error("Duplicate animation name '{name}' for skeleton {skeleton:?}")]
    DuplicateAnimation {
        /// Skeleton key, `None` for node animations
        skeleton: Option<SkeletonKey>,
        /// The offending name
        name: String,
    },

    /// The skeleton key is not (or no longer) registered.
    #[error("Unknown skeleton {0:?}")]
    UnknownSkeleton(SkeletonKey),

    /// No animation with this name exists under the skeleton key.
    #[error("Animation '{name}' not found for skeleton {skeleton:?}")]
    AnimationNotFound {
        /// Skeleton key, `None` for node animations
        skeleton: Option<SkeletonKey>,
        /// The requested name
        name: String,
    },

    // ========================================================================
    // Data Validation Errors
    // ========================================================================
    /// Keyframe data violates the timeline invariants.
    #[error("Invalid animation timeline: {0}")]
    InvalidTimeline(String),

    /// Bone data violates the skeleton invariants.
    #[error("Invalid skeleton: {0}")]
    InvalidSkeleton(String),

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// JSON parsing error.
    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Alias for `Result<T, ZigguratError>`.
pub type Result<T> = std::result::Result<T, ZigguratError>;
