//! Keyframe animations for indicator layers
//!
//! Specs are plain data: per-property keyframe tracks, a duration, a timing curve and a fill
//! mode. Compositors sample them against their own clock.

pub mod keyframe;
pub mod presets;
pub mod timing;

pub use keyframe::{AnimatedProperty, AnimationSpec, FillMode, Keyframe, PropertyTrack};
pub use timing::TimingCurve;
