//! Compositing primitive contract
//!
//! The lifecycle manager drives indicator layers exclusively through [`Compositor`]. A platform
//! backend wraps its native layer tree behind this trait; [`Scene`] is the software
//! implementation used for rendering, replay and tests.

pub mod scene;

use crate::animation::AnimationSpec;
use crate::capture::touch::types::Point;
use crate::config::{IndicatorStyle, Rgba};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

pub use scene::{Presentation, Scene, SceneLayer};

/// Errors reported by a compositor
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompositorError {
    #[error("Unknown layer {0}")]
    UnknownLayer(LayerId),

    #[error("Invalid layer recipe: {0}")]
    InvalidLayer(String),

    #[error("Invalid animation: {0}")]
    InvalidAnimation(String),
}

pub type CompositorResult<T> = Result<T, CompositorError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(pub u64);

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "layer-{}", self.0)
    }
}

/// Handle reported back once an attached animation has finished
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnimationToken(pub u64);

/// Slot an animation occupies on its layer; attaching under an occupied key replaces it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnimationKey {
    TouchBegan,
    TouchEnded,
}

/// Model values of a layer (what it shows with no animation attached)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Appearance {
    /// Uniform scale around the layer center
    pub scale: f32,
    /// 0.0 is fully transparent
    pub opacity: f32,
    /// Stroke width in points
    pub line_width: f32,
}

/// How a position change is applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionUpdate {
    /// Jump straight to the new position
    Snap,
    /// Let the compositor's default implicit animation carry the layer over
    Implicit,
}

/// Circle layer construction recipe
#[derive(Debug, Clone, PartialEq)]
pub struct LayerSpec {
    /// Circle radius in points
    pub radius: f32,
    pub fill: Rgba,
    pub stroke: Rgba,
    /// Center of the circle in overlay coordinates
    pub position: Point,
    /// Starting model values
    pub appearance: Appearance,
}

impl LayerSpec {
    pub fn from_style(style: &IndicatorStyle, position: Point) -> Self {
        Self {
            radius: style.radius,
            fill: style.fill,
            stroke: style.stroke,
            position,
            appearance: Appearance {
                scale: style.initial_scale,
                opacity: style.initial_opacity,
                line_width: style.initial_line_width,
            },
        }
    }
}

pub trait Compositor {
    /// Construct a layer from `spec` and add it on top of the tree
    fn insert_layer(&mut self, spec: &LayerSpec) -> CompositorResult<LayerId>;

    fn set_position(
        &mut self,
        layer: LayerId,
        position: Point,
        update: PositionUpdate,
    ) -> CompositorResult<()>;

    fn set_appearance(&mut self, layer: LayerId, appearance: Appearance) -> CompositorResult<()>;

    /// Attach `spec` under `key`, starting now. The returned token is reported by
    /// [`Compositor::take_finished`] once the animation completes.
    fn attach_animation(
        &mut self,
        layer: LayerId,
        key: AnimationKey,
        spec: &AnimationSpec,
    ) -> CompositorResult<AnimationToken>;

    /// Detach the layer from the tree along with its animations. Animations dropped this way
    /// never report completion.
    fn remove_layer(&mut self, layer: LayerId) -> CompositorResult<()>;

    fn contains_layer(&self, layer: LayerId) -> bool;

    fn layer_count(&self) -> usize;

    /// Tokens of animations that completed since the last call
    fn take_finished(&mut self) -> Vec<AnimationToken>;

    /// Move the animation clock to `now` (time since the compositor started). Backends that
    /// run on their own display clock can ignore it.
    fn advance(&mut self, _now: Duration) {}
}
