//! Engine Core Module
//!
//! [`Engine`] owns the world, the animation system and the simulation clock,
//! and runs the per-frame steps in a fixed order:
//!
//! 1. Animation sampling and event callbacks ([`AnimationSystem::tick`])
//! 2. Transform propagation ([`World::propagate_transforms`])
//! 3. Skinning matrices ([`AnimationSystem::propagate_bone_transforms`])
//!
//! Anything that reads world transforms or bone matrices (physics, rendering)
//! runs after [`Engine::update`] returns.
//!
//! # Example
//!
//! ```rust,ignore
//! use ziggurat::{Engine, EngineSettings};
//!
//! let mut engine = Engine::new(EngineSettings::default());
//! let root = engine.world.create_node("root", None)?;
//!
//! loop {
//!     engine.update(1.0 / 60.0);
//!     let world_matrix = engine.world.local_to_world(root);
//! }
//! ```

use std::time::Duration;

use ziggurat_core::{EngineSettings, Entity, Timer};
use ziggurat_scene::{AnimationSystem, AnimationTickStats, PlaybackTarget, PropagationStats, World};

/// What one [`Engine::update`] did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FrameStats {
    pub animation: AnimationTickStats,
    pub propagation: PropagationStats,
    /// Skinned meshes whose skinning matrices were recomputed
    pub skinned_meshes: usize,
}

/// The simulation core.
///
/// # Lifecycle
///
/// 1. Create with [`Engine::new`] or [`Engine::default`]
/// 2. Build the scene through [`Engine::world`] and register assets with
///    [`Engine::animation`]
/// 3. Call [`Engine::update`] (fixed steps) or [`Engine::update_realtime`]
///    once per frame
pub struct Engine {
    pub world: World,
    pub animation: AnimationSystem,

    timer: Timer,
    settings: EngineSettings,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineSettings::default())
    }
}

impl Engine {
    #[must_use]
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            world: World::new(),
            animation: AnimationSystem::new(settings.animation.clone()),
            timer: Timer::new(),
            settings,
        }
    }

    #[inline]
    #[must_use]
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Current simulated time in seconds.
    #[inline]
    #[must_use]
    pub fn now(&self) -> f32 {
        self.timer.now()
    }

    #[inline]
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.timer.frame_count
    }

    /// Advances simulated time by `dt` seconds (scaled by
    /// [`EngineSettings::time_scale`]) and runs one frame.
    ///
    /// Negative or non-finite `dt` is treated as zero.
    pub fn update(&mut self, dt: f32) -> FrameStats {
        let scaled = dt * self.settings.time_scale;
        let step = if scaled.is_finite() && scaled > 0.0 {
            Duration::from_secs_f32(scaled)
        } else {
            Duration::ZERO
        };
        self.timer.advance(step);
        self.run_frame()
    }

    /// Advances by the wall-clock time since the previous frame and runs one frame.
    pub fn update_realtime(&mut self) -> FrameStats {
        self.timer.tick(self.settings.time_scale);
        self.run_frame()
    }

    fn run_frame(&mut self) -> FrameStats {
        let now = self.timer.now();

        let animation = self.animation.tick(&mut self.world, now);
        let propagation = self.world.propagate_transforms();
        let skinned_meshes = self.animation.propagate_bone_transforms(&mut self.world);

        log::trace!(
            "Frame {} at t={now}: {} node(s) visited, {} event(s) fired",
            self.timer.frame_count,
            propagation.visited,
            animation.events_fired
        );

        FrameStats {
            animation,
            propagation,
            skinned_meshes,
        }
    }

    /// Plays `name` on `entity`, starting now. See
    /// [`AnimationSystem::play_animation_on_entity`].
    pub fn play_animation(&mut self, entity: Entity, name: &str) -> Option<PlaybackTarget> {
        let now = self.timer.now();
        self.animation.play_animation_on_entity(&mut self.world, entity, name, now)
    }

    /// See [`AnimationSystem::stop_animation`].
    pub fn stop_animation(&mut self, entity: Entity) -> usize {
        self.animation.stop_animation(&mut self.world, entity)
    }
}

/// Installs an `env_logger` logger honoring `RUST_LOG` (default `info`).
///
/// Safe to call more than once; only the first call has an effect.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).try_init();
}
