//! Software compositing tree
//!
//! Layers are kept in insertion (z) order. Each layer has model values and a list of attached
//! animations; the presented values are the model values overridden by every attached
//! animation in attachment order, sampled at the scene clock. The clock only moves when
//! [`Compositor::advance`] is called, which keeps the scene deterministic for replay and tests.

use crate::animation::{AnimatedProperty, AnimationSpec, FillMode};
use crate::capture::touch::types::Point;
use crate::compositor::{
    AnimationKey, AnimationToken, Appearance, Compositor, CompositorError, CompositorResult,
    LayerId, LayerSpec, PositionUpdate,
};
use crate::config::Rgba;
use std::time::Duration;

/// Length of the implicit animation applied to non-snapped position changes
pub const IMPLICIT_ANIMATION_DURATION: Duration = Duration::from_millis(250);

/// Values a layer shows at the current scene time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Presentation {
    pub position: Point,
    pub scale: f32,
    pub opacity: f32,
    pub line_width: f32,
}

#[derive(Debug, Clone)]
struct PositionTransition {
    from: Point,
    started_at: Duration,
}

#[derive(Debug, Clone)]
struct AttachedAnimation {
    token: AnimationToken,
    key: AnimationKey,
    spec: AnimationSpec,
    started_at: Duration,
    duration: Duration,
    finished: bool,
}

#[derive(Debug, Clone)]
pub struct SceneLayer {
    id: LayerId,
    radius: f32,
    fill: Rgba,
    stroke: Rgba,
    /// Model position, already at the target of any transition
    position: Point,
    /// Model values shown once every animation has finished
    appearance: Appearance,
    /// Implicit move still in flight, if any
    transition: Option<PositionTransition>,
    /// At most one entry per animation key
    animations: Vec<AttachedAnimation>,
}

impl SceneLayer {
    pub fn id(&self) -> LayerId {
        self.id
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn fill(&self) -> Rgba {
        self.fill
    }

    pub fn stroke(&self) -> Rgba {
        self.stroke
    }

    /// Position the layer is heading to, ignoring any implicit transition
    pub fn model_position(&self) -> Point {
        self.position
    }

    pub fn appearance(&self) -> Appearance {
        self.appearance
    }

    pub fn animation_keys(&self) -> Vec<AnimationKey> {
        self.animations.iter().map(|a| a.key).collect()
    }

    pub fn has_animation(&self, key: AnimationKey) -> bool {
        self.animations.iter().any(|a| a.key == key)
    }

    pub fn is_transitioning(&self) -> bool {
        self.transition.is_some()
    }

    pub fn presentation(&self, now: Duration) -> Presentation {
        let position = match &self.transition {
            Some(transition) => {
                let elapsed = now.saturating_sub(transition.started_at);
                let t = (elapsed.as_secs_f32() / IMPLICIT_ANIMATION_DURATION.as_secs_f32())
                    .clamp(0.0, 1.0);
                transition.from.lerp(self.position, t)
            }
            None => self.position,
        };

        let mut presentation = Presentation {
            position,
            scale: self.appearance.scale,
            opacity: self.appearance.opacity,
            line_width: self.appearance.line_width,
        };

        for animation in &self.animations {
            let elapsed = now.saturating_sub(animation.started_at);
            for track in &animation.spec.tracks {
                let Some(value) = animation.spec.sample(track.property, elapsed) else {
                    continue;
                };
                match track.property {
                    AnimatedProperty::Scale => presentation.scale = value,
                    AnimatedProperty::Opacity => presentation.opacity = value,
                    AnimatedProperty::LineWidth => presentation.line_width = value,
                }
            }
        }

        presentation
    }

    fn has_running_animation(&self) -> bool {
        self.transition.is_some() || self.animations.iter().any(|a| !a.finished)
    }
}

#[derive(Debug, Default)]
pub struct Scene {
    layers: Vec<SceneLayer>,
    now: Duration,
    next_layer: u64,
    next_token: u64,
    finished: Vec<AnimationToken>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current scene clock
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Layers bottom to top
    pub fn layers(&self) -> &[SceneLayer] {
        &self.layers
    }

    pub fn layer(&self, id: LayerId) -> Option<&SceneLayer> {
        self.layers.iter().find(|l| l.id == id)
    }

    pub fn presentation(&self, id: LayerId) -> Option<Presentation> {
        self.layer(id).map(|l| l.presentation(self.now))
    }

    /// Whether any layer still has an animation or implicit transition in flight
    pub fn is_animating(&self) -> bool {
        self.layers.iter().any(SceneLayer::has_running_animation)
    }

    fn layer_mut(&mut self, id: LayerId) -> CompositorResult<&mut SceneLayer> {
        self.layers
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or(CompositorError::UnknownLayer(id))
    }
}

impl Compositor for Scene {
    fn insert_layer(&mut self, spec: &LayerSpec) -> CompositorResult<LayerId> {
        if !(spec.radius.is_finite() && spec.radius > 0.0) {
            return Err(CompositorError::InvalidLayer(format!(
                "radius {} is not drawable",
                spec.radius
            )));
        }

        self.next_layer += 1;
        let id = LayerId(self.next_layer);
        self.layers.push(SceneLayer {
            id,
            radius: spec.radius,
            fill: spec.fill,
            stroke: spec.stroke,
            position: spec.position,
            appearance: spec.appearance,
            transition: None,
            animations: Vec::new(),
        });
        Ok(id)
    }

    fn set_position(
        &mut self,
        layer: LayerId,
        position: Point,
        update: PositionUpdate,
    ) -> CompositorResult<()> {
        let now = self.now;
        let layer = self.layer_mut(layer)?;
        match update {
            PositionUpdate::Snap => {
                layer.transition = None;
            }
            PositionUpdate::Implicit => {
                let from = layer.presentation(now).position;
                layer.transition = Some(PositionTransition {
                    from,
                    started_at: now,
                });
            }
        }
        layer.position = position;
        Ok(())
    }

    fn set_appearance(&mut self, layer: LayerId, appearance: Appearance) -> CompositorResult<()> {
        self.layer_mut(layer)?.appearance = appearance;
        Ok(())
    }

    fn attach_animation(
        &mut self,
        layer: LayerId,
        key: AnimationKey,
        spec: &AnimationSpec,
    ) -> CompositorResult<AnimationToken> {
        spec.validate().map_err(CompositorError::InvalidAnimation)?;
        let duration = spec
            .duration()
            .ok_or_else(|| CompositorError::InvalidAnimation("missing duration".to_string()))?;

        let token = AnimationToken(self.next_token + 1);
        let now = self.now;
        let layer = self.layer_mut(layer)?;
        layer.animations.retain(|a| a.key != key);
        layer.animations.push(AttachedAnimation {
            token,
            key,
            spec: spec.clone(),
            started_at: now,
            duration,
            finished: false,
        });
        self.next_token += 1;
        Ok(token)
    }

    fn remove_layer(&mut self, layer: LayerId) -> CompositorResult<()> {
        let index = self
            .layers
            .iter()
            .position(|l| l.id == layer)
            .ok_or(CompositorError::UnknownLayer(layer))?;
        self.layers.remove(index);
        Ok(())
    }

    fn contains_layer(&self, layer: LayerId) -> bool {
        self.layer(layer).is_some()
    }

    fn layer_count(&self) -> usize {
        self.layers.len()
    }

    fn take_finished(&mut self) -> Vec<AnimationToken> {
        std::mem::take(&mut self.finished)
    }

    fn advance(&mut self, now: Duration) {
        // The clock never runs backwards
        if now < self.now {
            return;
        }
        self.now = now;

        for layer in &mut self.layers {
            if let Some(transition) = &layer.transition {
                if now.saturating_sub(transition.started_at) >= IMPLICIT_ANIMATION_DURATION {
                    layer.transition = None;
                }
            }

            for animation in &mut layer.animations {
                // An end time past the representable range is never reached
                let ends_by_now = animation
                    .started_at
                    .checked_add(animation.duration)
                    .map_or(false, |end| now >= end);
                if !animation.finished && ends_by_now {
                    animation.finished = true;
                    self.finished.push(animation.token);
                }
            }
            layer
                .animations
                .retain(|a| !(a.finished && a.spec.fill == FillMode::Removed));
        }
    }
}
