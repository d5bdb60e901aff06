use std::sync::Arc;

use glam::{Quat, Vec3};

use crate::clip::EventTimeline;
use crate::timeline::AnimationTimeline;
use crate::values::Interpolatable;

/// Stateful reader over one timeline.
///
/// `current_index` remembers where the previous sample landed, so forward
/// playback never searches. Times are relative to the start of the timeline.
#[derive(Debug, Clone)]
pub struct AnimationSampler<T> {
    timeline: Arc<AnimationTimeline<T>>,
    current_index: usize,
}

pub type PositionAnimationSampler = AnimationSampler<Vec3>;
pub type RotationAnimationSampler = AnimationSampler<Quat>;
pub type ScaleAnimationSampler = AnimationSampler<Vec3>;

impl<T: Interpolatable> AnimationSampler<T> {
    #[must_use]
    pub fn new(timeline: Arc<AnimationTimeline<T>>) -> Self {
        Self {
            timeline,
            current_index: 0,
        }
    }

    /// Samples the timeline at `time`.
    pub fn sample(&mut self, time: f32) -> T {
        self.timeline.sample_with_cursor(time, &mut self.current_index)
    }

    /// `true` once `time` has reached the final keyframe.
    #[inline]
    #[must_use]
    pub fn is_ended(&self, time: f32) -> bool {
        time >= self.timeline.duration()
    }

    #[inline]
    #[must_use]
    pub fn duration(&self) -> f32 {
        self.timeline.duration()
    }

    #[inline]
    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    #[inline]
    #[must_use]
    pub fn timeline(&self) -> &Arc<AnimationTimeline<T>> {
        &self.timeline
    }
}

/// Fires the callbacks of an event timeline as playback crosses them.
///
/// Each event fires at most once per playback. Time is absolute; the
/// sampler subtracts `start_time` itself.
#[derive(Clone)]
pub struct AnimationEventSampler {
    timeline: Arc<EventTimeline>,
    /// Index of the next event that has not fired yet
    next_index: usize,
    pub start_time: f32,
    /// Fire every crossed event rather than only the latest one
    pub replay_skipped: bool,
}

impl AnimationEventSampler {
    #[must_use]
    pub fn new(timeline: Arc<EventTimeline>, start_time: f32) -> Self {
        Self {
            timeline,
            next_index: 0,
            start_time,
            replay_skipped: true,
        }
    }

    #[must_use]
    pub fn with_replay_skipped(mut self, replay_skipped: bool) -> Self {
        self.replay_skipped = replay_skipped;
        self
    }

    /// Advances to `time` and fires the events crossed since the last tick.
    ///
    /// Returns the number of callbacks invoked.
    pub fn tick(&mut self, time: f32) -> usize {
        let local_time = time - self.start_time;
        let timestamps = self.timeline.timestamps();

        let mut crossed = self.next_index;
        while crossed < timestamps.len() && timestamps[crossed] <= local_time {
            crossed += 1;
        }
        if crossed == self.next_index {
            return 0;
        }

        let to_fire = if self.replay_skipped {
            self.next_index..crossed
        } else {
            crossed - 1..crossed
        };
        self.next_index = crossed;

        let callbacks = &self.timeline.values()[to_fire];
        for callback in callbacks {
            callback();
        }
        log::trace!("Fired {} animation event(s) at t={local_time}", callbacks.len());
        callbacks.len()
    }

    /// `true` once `time` is past the final event.
    #[must_use]
    pub fn is_ended(&self, time: f32) -> bool {
        self.next_index >= self.timeline.len() && time - self.start_time > self.timeline.duration()
    }

    #[must_use]
    pub fn timeline(&self) -> &Arc<EventTimeline> {
        &self.timeline
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::clip::Animation;

    fn counting_animation(times: &[f32]) -> (Animation, Arc<AtomicUsize>) {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut animation = Animation::new();
        for &time in times {
            let counter = Arc::clone(&counter);
            animation.add_event(time, move || {
                counter.fetch_add(1, Ordering::Relaxed);
            });
        }
        (animation, counter)
    }

    #[test]
    fn skipped_events_replay_in_order() {
        let (animation, counter) = counting_animation(&[0.2, 0.4, 0.6]);
        let mut sampler = AnimationEventSampler::new(Arc::clone(animation.events()), 0.0);
        assert_eq!(sampler.tick(1.0), 3);
        assert_eq!(counter.load(Ordering::Relaxed), 3);
        assert_eq!(sampler.tick(2.0), 0);
    }

    #[test]
    fn latest_only_when_replay_disabled() {
        let (animation, counter) = counting_animation(&[0.2, 0.4, 0.6]);
        let mut sampler =
            AnimationEventSampler::new(Arc::clone(animation.events()), 0.0).with_replay_skipped(false);
        assert_eq!(sampler.tick(1.0), 1);
        assert_eq!(counter.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn start_time_offsets_events() {
        let (animation, counter) = counting_animation(&[1.0]);
        let mut sampler = AnimationEventSampler::new(Arc::clone(animation.events()), 10.0);
        sampler.tick(10.5);
        assert_eq!(counter.load(Ordering::Relaxed), 0);
        sampler.tick(11.0);
        assert_eq!(counter.load(Ordering::Relaxed), 1);
        assert!(!sampler.is_ended(11.0));
        assert!(sampler.is_ended(11.1));
    }
}
