use ziggurat_core::{Result, ZigguratError};

use crate::values::Interpolatable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterpolationMode {
    #[default]
    Linear,
    Step,
    /// glTF cubic spline. Values are stored as `[in_tangent, value, out_tangent]`
    /// triples, so `values.len() == timestamps.len() * 3`.
    CubicSpline,
}

/// A piecewise curve: parallel `timestamps` / `values` sequences.
///
/// Keyframe timelines built with [`AnimationTimeline::new`] are non-empty
/// and strictly ascending. Event timelines start empty and grow through
/// [`AnimationTimeline::insert`], which keeps them sorted but allows several
/// events on the same timestamp.
#[derive(Debug, Clone)]
pub struct AnimationTimeline<T> {
    timestamps: Vec<f32>,
    values: Vec<T>,
    interpolation: InterpolationMode,
}

impl<T> AnimationTimeline<T> {
    /// Builds a linearly interpolated timeline.
    pub fn new(timestamps: Vec<f32>, values: Vec<T>) -> Result<Self> {
        Self::with_interpolation(timestamps, values, InterpolationMode::Linear)
    }

    pub fn with_interpolation(
        timestamps: Vec<f32>,
        values: Vec<T>,
        interpolation: InterpolationMode,
    ) -> Result<Self> {
        if timestamps.is_empty() {
            return Err(ZigguratError::InvalidTimeline("timeline has no keyframes".into()));
        }
        if let Some(bad) = timestamps.iter().find(|t| !t.is_finite()) {
            return Err(ZigguratError::InvalidTimeline(format!("non-finite timestamp {bad}")));
        }
        if let Some(pair) = timestamps.windows(2).find(|w| w[0] >= w[1]) {
            return Err(ZigguratError::InvalidTimeline(format!(
                "timestamps must be strictly ascending, found {} followed by {}",
                pair[0], pair[1]
            )));
        }

        let expected = match interpolation {
            InterpolationMode::CubicSpline => timestamps.len() * 3,
            InterpolationMode::Linear | InterpolationMode::Step => timestamps.len(),
        };
        if values.len() != expected {
            return Err(ZigguratError::InvalidTimeline(format!(
                "{} timestamps need {expected} values for {interpolation:?}, got {}",
                timestamps.len(),
                values.len()
            )));
        }

        Ok(Self {
            timestamps,
            values,
            interpolation,
        })
    }

    /// An empty step timeline, the starting point for event timelines.
    pub(crate) fn empty() -> Self {
        Self {
            timestamps: Vec::new(),
            values: Vec::new(),
            interpolation: InterpolationMode::Step,
        }
    }

    #[inline]
    #[must_use]
    pub fn timestamps(&self) -> &[f32] {
        &self.timestamps
    }

    #[inline]
    #[must_use]
    pub fn values(&self) -> &[T] {
        &self.values
    }

    #[inline]
    #[must_use]
    pub fn interpolation(&self) -> InterpolationMode {
        self.interpolation
    }

    /// Number of keyframes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Timestamp of the final keyframe, `0.0` for an empty timeline.
    #[inline]
    #[must_use]
    pub fn duration(&self) -> f32 {
        self.timestamps.last().copied().unwrap_or(0.0)
    }

    /// Inserts a keyframe after any existing keyframes at the same time.
    ///
    /// Only meaningful for step-like timelines such as events.
    pub fn insert(&mut self, time: f32, value: T) {
        let index = self.timestamps.partition_point(|&t| t <= time);
        self.timestamps.insert(index, time);
        self.values.insert(index, value);
    }

    /// Keyframe value at `index`, skipping cubic-spline tangents.
    #[inline]
    fn value_at(&self, index: usize) -> &T {
        match self.interpolation {
            InterpolationMode::CubicSpline => &self.values[index * 3 + 1],
            InterpolationMode::Linear | InterpolationMode::Step => &self.values[index],
        }
    }
}

impl<T: Interpolatable> AnimationTimeline<T> {
    /// Samples without a cursor (binary search).
    #[must_use]
    pub fn sample(&self, time: f32) -> T {
        let mut index = 0;
        self.sample_with_cursor(time, &mut index)
    }

    /// Samples using `cursor` as the starting keyframe.
    ///
    /// While time moves forward the cursor only ever advances, so a playback
    /// costs O(1) amortized per sample. When time moves backwards (loop wrap,
    /// restart) the cursor is re-seated with a binary search. Times outside
    /// the timeline clamp to the first or last keyframe.
    pub fn sample_with_cursor(&self, time: f32, cursor: &mut usize) -> T {
        let last = self.timestamps.len() - 1;

        if last == 0 || time <= self.timestamps[0] {
            *cursor = 0;
            return *self.value_at(0);
        }
        if time >= self.timestamps[last] {
            *cursor = last;
            return *self.value_at(last);
        }

        // From here on timestamps[0] < time < timestamps[last].
        if *cursor >= last || self.timestamps[*cursor] > time {
            *cursor = self.timestamps.partition_point(|&t| t <= time) - 1;
        } else {
            while self.timestamps[*cursor + 1] <= time {
                *cursor += 1;
            }
        }

        self.interpolate(*cursor, time)
    }

    fn interpolate(&self, index: usize, time: f32) -> T {
        let next = index + 1;
        let t0 = self.timestamps[index];
        let dt = self.timestamps[next] - t0;
        let t = ((time - t0) / dt).clamp(0.0, 1.0);

        match self.interpolation {
            InterpolationMode::Step => *self.value_at(index),
            InterpolationMode::Linear => {
                T::interpolate_linear(*self.value_at(index), *self.value_at(next), t)
            }
            InterpolationMode::CubicSpline => {
                let v0 = self.values[index * 3 + 1];
                let out_tangent0 = self.values[index * 3 + 2];
                let in_tangent1 = self.values[next * 3];
                let v1 = self.values[next * 3 + 1];
                T::interpolate_cubic(v0, out_tangent0, in_tangent1, v1, t, dt)
            }
        }
    }
}
