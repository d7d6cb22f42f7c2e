use crate::animation::timing::TimingCurve;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Layer properties an animation can drive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AnimatedProperty {
    /// Uniform scale of the layer transform
    Scale,
    Opacity,
    LineWidth,
}

impl fmt::Display for AnimatedProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnimatedProperty::Scale => write!(f, "scale"),
            AnimatedProperty::Opacity => write!(f, "opacity"),
            AnimatedProperty::LineWidth => write!(f, "lineWidth"),
        }
    }
}

/// Value at a normalized time (0 = start, 1 = end)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub value: f32,
    pub time: f32,
}

impl Keyframe {
    pub fn new(value: f32, time: f32) -> Self {
        Self { value, time }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyTrack {
    pub property: AnimatedProperty,
    pub keyframes: Vec<Keyframe>,
}

impl PropertyTrack {
    pub fn new(property: AnimatedProperty, keyframes: Vec<Keyframe>) -> Self {
        Self { property, keyframes }
    }

    /// Build a track from values and key times of equal length
    pub fn from_pairs(property: AnimatedProperty, values: &[f32], times: &[f32]) -> Self {
        Self {
            property,
            keyframes: values
                .iter()
                .zip(times)
                .map(|(&value, &time)| Keyframe { value, time })
                .collect(),
        }
    }

    /// Piecewise-linear value at eased progress `t`
    pub fn value_at(&self, t: f32) -> Option<f32> {
        let first = self.keyframes.first()?;
        let last = self.keyframes.last()?;

        if t <= first.time {
            return Some(first.value);
        }
        if t >= last.time {
            return Some(last.value);
        }

        self.keyframes.windows(2).find_map(|pair| {
            let (a, b) = (pair[0], pair[1]);
            if t < a.time || t > b.time {
                return None;
            }
            let span = b.time - a.time;
            if span <= f32::EPSILON {
                return Some(b.value);
            }
            let local = (t - a.time) / span;
            Some(a.value + (b.value - a.value) * local)
        })
    }

    pub fn final_value(&self) -> Option<f32> {
        self.keyframes.last().map(|k| k.value)
    }

    fn validate(&self) -> Result<(), String> {
        if self.keyframes.is_empty() {
            return Err(format!("{} track has no keyframes", self.property));
        }

        let mut previous = 0.0f32;
        for keyframe in &self.keyframes {
            if !keyframe.value.is_finite() || !keyframe.time.is_finite() {
                return Err(format!("{} track has a non-finite keyframe", self.property));
            }
            if !(0.0..=1.0).contains(&keyframe.time) {
                return Err(format!(
                    "{} key time {} outside 0..=1",
                    self.property, keyframe.time
                ));
            }
            if keyframe.time < previous {
                return Err(format!("{} key times are not ascending", self.property));
            }
            previous = keyframe.time;
        }
        Ok(())
    }
}

/// What the layer shows once the animation has run its course
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum FillMode {
    /// Hold the final keyframe values
    #[default]
    Forwards,
    /// Revert to the layer's model values
    Removed,
}

/// Keyframe animation group applied to one layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationSpec {
    pub tracks: Vec<PropertyTrack>,
    pub duration_secs: f32,
    #[serde(default)]
    pub timing: TimingCurve,
    #[serde(default)]
    pub fill: FillMode,
}

impl AnimationSpec {
    pub fn new(duration_secs: f32, tracks: Vec<PropertyTrack>) -> Self {
        Self {
            tracks,
            duration_secs,
            timing: TimingCurve::EaseInEaseOut,
            fill: FillMode::Forwards,
        }
    }

    pub fn with_timing(mut self, timing: TimingCurve) -> Self {
        self.timing = timing;
        self
    }

    pub fn with_fill(mut self, fill: FillMode) -> Self {
        self.fill = fill;
        self
    }

    /// Duration, or `None` when `duration_secs` is not a positive finite number
    pub fn duration(&self) -> Option<Duration> {
        if self.duration_secs > 0.0 {
            Duration::try_from_secs_f32(self.duration_secs).ok()
        } else {
            None
        }
    }

    /// Check that the animation can be played; the message describes the first problem found
    pub fn validate(&self) -> Result<(), String> {
        if self.duration().is_none() {
            return Err(format!("invalid duration {}s", self.duration_secs));
        }
        if self.tracks.is_empty() {
            return Err("animation has no tracks".to_string());
        }
        if !self.timing.is_valid() {
            return Err("timing curve control points out of range".to_string());
        }
        self.tracks.iter().try_for_each(PropertyTrack::validate)
    }

    pub fn track(&self, property: AnimatedProperty) -> Option<&PropertyTrack> {
        self.tracks.iter().find(|t| t.property == property)
    }

    /// Value of `property` after `elapsed`, or `None` if this animation does not drive it
    pub fn sample(&self, property: AnimatedProperty, elapsed: Duration) -> Option<f32> {
        let track = self.track(property)?;
        let progress = match self.duration() {
            Some(duration) => elapsed.as_secs_f32() / duration.as_secs_f32(),
            None => 1.0,
        };
        track.value_at(self.timing.apply(progress))
    }

    pub fn final_value(&self, property: AnimatedProperty) -> Option<f32> {
        self.track(property).and_then(PropertyTrack::final_value)
    }
}
