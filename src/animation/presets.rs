//! Built-in indicator animations
//!
//! The appear animation overshoots from an enlarged, transparent state down past rest size and
//! settles at a partial opacity. The disappear animation grows the indicator while fading it out
//! and drawing in the stroke.

use crate::animation::keyframe::{AnimatedProperty, AnimationSpec, FillMode, PropertyTrack};
use crate::animation::timing::TimingCurve;

pub const APPEAR_DURATION_SECS: f32 = 0.25;
pub const DISAPPEAR_DURATION_SECS: f32 = 0.5;

/// Scale a freshly inserted indicator starts from
pub const APPEAR_START_SCALE: f32 = 2.0;
/// Opacity an indicator rests at while its contact is held
pub const REST_OPACITY: f32 = 0.25;

pub fn appear() -> AnimationSpec {
    AnimationSpec::new(
        APPEAR_DURATION_SECS,
        vec![
            PropertyTrack::from_pairs(
                AnimatedProperty::Scale,
                &[APPEAR_START_SCALE, 0.75, 1.0],
                &[0.0, 0.5, 1.0],
            ),
            PropertyTrack::from_pairs(
                AnimatedProperty::Opacity,
                &[0.0, 0.35, REST_OPACITY],
                &[0.0, 0.5, 1.0],
            ),
        ],
    )
    .with_timing(TimingCurve::EaseInEaseOut)
    .with_fill(FillMode::Forwards)
}

pub fn disappear() -> AnimationSpec {
    AnimationSpec::new(
        DISAPPEAR_DURATION_SECS,
        vec![
            PropertyTrack::from_pairs(AnimatedProperty::Scale, &[1.0, 1.75], &[0.0, 1.0]),
            PropertyTrack::from_pairs(AnimatedProperty::Opacity, &[REST_OPACITY, 0.0], &[0.0, 1.0]),
            PropertyTrack::from_pairs(AnimatedProperty::LineWidth, &[0.0, 1.0], &[0.0, 1.0]),
        ],
    )
    .with_timing(TimingCurve::EaseInEaseOut)
    .with_fill(FillMode::Forwards)
}
