use std::fmt;
use std::sync::Arc;

use glam::{Quat, Vec3};
use rustc_hash::FxHashMap;

use crate::timeline::AnimationTimeline;

/// Callback fired when playback crosses an event keyframe.
///
/// Events are shared by every playing instance of an animation and may run
/// long after the code that registered them has returned, hence the
/// `'static` bound: capture owned or reference-counted data (an `Arc`, a
/// channel sender, an entity handle), never borrowed locals.
pub type AnimationEvent = Arc<dyn Fn() + Send + Sync>;

pub type EventTimeline = AnimationTimeline<AnimationEvent>;

impl Default for EventTimeline {
    fn default() -> Self {
        Self::empty()
    }
}

/// Time-varying transform of one node or bone.
///
/// Timelines are reference counted so that samplers can hold on to them
/// without borrowing the owning [`Animation`].
#[derive(Debug, Clone, Default)]
pub struct TransformAnimation {
    pub position: Option<Arc<AnimationTimeline<Vec3>>>,
    pub rotation: Option<Arc<AnimationTimeline<Quat>>>,
    pub scale: Option<Arc<AnimationTimeline<Vec3>>>,
}

impl TransformAnimation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_position(mut self, timeline: AnimationTimeline<Vec3>) -> Self {
        self.position = Some(Arc::new(timeline));
        self
    }

    #[must_use]
    pub fn with_rotation(mut self, timeline: AnimationTimeline<Quat>) -> Self {
        self.rotation = Some(Arc::new(timeline));
        self
    }

    #[must_use]
    pub fn with_scale(mut self, timeline: AnimationTimeline<Vec3>) -> Self {
        self.scale = Some(Arc::new(timeline));
        self
    }

    /// Latest keyframe time across the channels that are present.
    #[must_use]
    pub fn duration(&self) -> f32 {
        [
            self.position.as_ref().map(|t| t.duration()),
            self.rotation.as_ref().map(|t| t.duration()),
            self.scale.as_ref().map(|t| t.duration()),
        ]
        .into_iter()
        .flatten()
        .fold(0.0, f32::max)
    }
}

/// An animation asset.
///
/// `channels` is keyed by imported node id for node animations and by bone
/// index for skeletal animations. Once registered with the animation system
/// an `Animation` is shared read-only by every instance playing it.
#[derive(Clone, Default)]
pub struct Animation {
    pub channels: FxHashMap<usize, TransformAnimation>,

    events: Arc<EventTimeline>,
}

impl Animation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style channel insertion.
    #[must_use]
    pub fn with_channel(mut self, target: usize, channel: TransformAnimation) -> Self {
        self.channels.insert(target, channel);
        self
    }

    /// Adds an event, keeping the event timeline sorted.
    ///
    /// Instances that are already playing keep the events they started with.
    pub fn add_event<F>(&mut self, time: f32, func: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        Arc::make_mut(&mut self.events).insert(time, Arc::new(func));
    }

    #[inline]
    #[must_use]
    pub fn events(&self) -> &Arc<EventTimeline> {
        &self.events
    }

    /// Latest keyframe time across all channels.
    #[must_use]
    pub fn duration(&self) -> f32 {
        self.channels
            .values()
            .map(TransformAnimation::duration)
            .fold(0.0, f32::max)
    }
}

impl fmt::Debug for Animation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Animation")
            .field("channels", &self.channels.len())
            .field("events", &self.events.timestamps())
            .field("duration", &self.duration())
            .finish()
    }
}
