//! Overlay configuration
//!
//! Styling, animations and the duplicate-Began policy. Every field has a default, so a JSON
//! file only needs the keys it wants to override.

use crate::animation::{presets, AnimationSpec};
use crate::error::{OverlayError, OverlayResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Straight (non-premultiplied) RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const WHITE: Rgba = Rgba::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

/// Construction recipe shared by every indicator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IndicatorStyle {
    pub radius: f32,
    pub fill: Rgba,
    pub stroke: Rgba,
    /// Model values the layer is created with, before the appear animation takes over
    pub initial_opacity: f32,
    pub initial_line_width: f32,
    pub initial_scale: f32,
}

impl Default for IndicatorStyle {
    fn default() -> Self {
        Self {
            radius: 24.0,
            fill: Rgba::rgb(0, 144, 239),
            stroke: Rgba::WHITE,
            initial_opacity: 0.0,
            initial_line_width: 0.0,
            initial_scale: presets::APPEAR_START_SCALE,
        }
    }
}

/// What to do with a Began for an identity that already has an indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum DuplicateBeginPolicy {
    /// Drop the stale indicator without animation, then start a fresh one
    #[default]
    Replace,
    /// Keep the existing indicator and ignore the new Began
    Reject,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OverlayConfig {
    pub style: IndicatorStyle,
    pub appear: AnimationSpec,
    pub disappear: AnimationSpec,
    pub duplicate_begin: DuplicateBeginPolicy,
    /// Number of lifecycle faults kept for inspection
    pub diagnostics_capacity: usize,
    /// Visibility a new overlay starts with, before any gateway signal
    pub initially_visible: bool,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            style: IndicatorStyle::default(),
            appear: presets::appear(),
            disappear: presets::disappear(),
            duplicate_begin: DuplicateBeginPolicy::default(),
            diagnostics_capacity: 64,
            initially_visible: false,
        }
    }
}

impl OverlayConfig {
    pub fn from_json_str(json: &str) -> OverlayResult<Self> {
        let config: OverlayConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> OverlayResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&content)?;
        tracing::info!("Loaded overlay configuration from {:?}", path);
        Ok(config)
    }

    /// Style values must describe a drawable indicator.
    ///
    /// Animation specs are checked by the compositor when they are attached, which falls back
    /// to non-animated updates for specs it refuses.
    pub fn validate(&self) -> OverlayResult<()> {
        let style = &self.style;
        if !(style.radius.is_finite() && style.radius > 0.0) {
            return Err(OverlayError::ConfigurationError(format!(
                "radius must be positive, got {}",
                style.radius
            )));
        }
        if !(0.0..=1.0).contains(&style.initial_opacity) {
            return Err(OverlayError::ConfigurationError(format!(
                "initial opacity must be within 0..=1, got {}",
                style.initial_opacity
            )));
        }
        if !(style.initial_line_width.is_finite() && style.initial_line_width >= 0.0) {
            return Err(OverlayError::ConfigurationError(format!(
                "initial line width must be non-negative, got {}",
                style.initial_line_width
            )));
        }
        if !(style.initial_scale.is_finite() && style.initial_scale >= 0.0) {
            return Err(OverlayError::ConfigurationError(format!(
                "initial scale must be non-negative, got {}",
                style.initial_scale
            )));
        }
        Ok(())
    }
}
