//! Timing curves for keyframe animations
//!
//! Named curves map onto the usual cubic Bezier control points. Evaluation solves the curve's
//! x(t) for the requested progress with Newton iterations and falls back to bisection when the
//! slope is too flat.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", tag = "curve")]
pub enum TimingCurve {
    Linear,
    EaseIn,
    EaseOut,
    #[default]
    EaseInEaseOut,
    CubicBezier { x1: f32, y1: f32, x2: f32, y2: f32 },
}

const NEWTON_ITERATIONS: usize = 8;
const BISECTION_ITERATIONS: usize = 32;
const EPSILON: f32 = 1e-6;

impl TimingCurve {
    fn control_points(self) -> Option<(f32, f32, f32, f32)> {
        match self {
            TimingCurve::Linear => None,
            TimingCurve::EaseIn => Some((0.42, 0.0, 1.0, 1.0)),
            TimingCurve::EaseOut => Some((0.0, 0.0, 0.58, 1.0)),
            TimingCurve::EaseInEaseOut => Some((0.42, 0.0, 0.58, 1.0)),
            TimingCurve::CubicBezier { x1, y1, x2, y2 } => Some((x1, y1, x2, y2)),
        }
    }

    /// Custom curves must keep x control points inside 0..=1 so x(t) stays monotonic
    pub fn is_valid(self) -> bool {
        match self.control_points() {
            None => true,
            Some((x1, y1, x2, y2)) => {
                [x1, y1, x2, y2].iter().all(|v| v.is_finite())
                    && (0.0..=1.0).contains(&x1)
                    && (0.0..=1.0).contains(&x2)
            }
        }
    }

    /// Map linear progress (clamped to 0..=1) to eased progress
    pub fn apply(self, progress: f32) -> f32 {
        let p = progress.clamp(0.0, 1.0);
        match self.control_points() {
            None => p,
            Some((x1, y1, x2, y2)) => {
                if p <= 0.0 || p >= 1.0 {
                    return p;
                }
                let t = solve_for_x(p, x1, x2);
                bezier(t, y1, y2)
            }
        }
    }
}

/// One axis of a cubic Bezier with endpoints fixed at 0 and 1
fn bezier(t: f32, p1: f32, p2: f32) -> f32 {
    let u = 1.0 - t;
    3.0 * u * u * t * p1 + 3.0 * u * t * t * p2 + t * t * t
}

fn bezier_slope(t: f32, p1: f32, p2: f32) -> f32 {
    let u = 1.0 - t;
    3.0 * u * u * p1 + 6.0 * u * t * (p2 - p1) + 3.0 * t * t * (1.0 - p2)
}

fn solve_for_x(x: f32, x1: f32, x2: f32) -> f32 {
    let mut t = x;
    for _ in 0..NEWTON_ITERATIONS {
        let error = bezier(t, x1, x2) - x;
        if error.abs() < EPSILON {
            return t;
        }
        let slope = bezier_slope(t, x1, x2);
        if slope.abs() < EPSILON {
            break;
        }
        t -= error / slope;
    }

    let (mut lo, mut hi) = (0.0f32, 1.0f32);
    t = x;
    for _ in 0..BISECTION_ITERATIONS {
        let value = bezier(t, x1, x2);
        if (value - x).abs() < EPSILON {
            break;
        }
        if value < x {
            lo = t;
        } else {
            hi = t;
        }
        t = (lo + hi) * 0.5;
    }
    t
}
