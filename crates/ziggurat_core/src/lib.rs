//! Core types shared by every Ziggurat crate.
//!
//! - [`Entity`] / [`SkeletonKey`]: generational handles
//! - [`ZigguratError`]: the engine-wide error type
//! - [`EngineSettings`]: configuration
//! - [`Timer`]: frame timing

pub mod errors;
pub mod ids;
pub mod settings;
pub mod time;

pub use errors::{Result, ZigguratError};
pub use ids::{Entity, SkeletonKey};
pub use settings::{AnimationSettings, EngineSettings};
pub use time::Timer;
