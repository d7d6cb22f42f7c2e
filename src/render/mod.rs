//! Frame rendering for the software scene
//!
//! Rasterizes the presented state of every [`Scene`] layer with tiny-skia. Layers are drawn
//! bottom to top as filled circles with an optional outline; scale grows both the radius and
//! the outline width, opacity multiplies both colors' alpha.

use crate::compositor::{Presentation, Scene, SceneLayer};
use crate::config::Rgba;
use std::path::Path;
use tiny_skia::{Color, FillRule, Paint, PathBuilder, Pixmap, Stroke, Transform};

/// Rendering errors
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Failed to create pixmap for rendering")]
    PixmapCreationFailed,

    #[error("Invalid frame dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("PNG encoding failed: {0}")]
    Encoding(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct FrameRenderer {
    width: u32,
    height: u32,
    background: Option<Rgba>,
}

impl FrameRenderer {
    /// Renderer for frames of `width` x `height` on a transparent background
    pub fn new(width: u32, height: u32) -> Result<Self, RenderError> {
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidDimensions { width, height });
        }
        Ok(Self {
            width,
            height,
            background: None,
        })
    }

    pub fn with_background(mut self, background: Rgba) -> Self {
        self.background = Some(background);
        self
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn render(&self, scene: &Scene) -> Result<Pixmap, RenderError> {
        let mut pixmap =
            Pixmap::new(self.width, self.height).ok_or(RenderError::PixmapCreationFailed)?;
        self.render_into(&mut pixmap, scene);
        Ok(pixmap)
    }

    /// Redraw `pixmap` in place, reusing its allocation between frames
    pub fn render_into(&self, pixmap: &mut Pixmap, scene: &Scene) {
        match self.background {
            Some(bg) => pixmap.fill(Color::from_rgba8(bg.r, bg.g, bg.b, bg.a)),
            None => pixmap.fill(Color::TRANSPARENT),
        }

        for layer in scene.layers() {
            draw_indicator(pixmap, layer, &layer.presentation(scene.now()));
        }
    }
}

fn draw_indicator(pixmap: &mut Pixmap, layer: &SceneLayer, presented: &Presentation) {
    let opacity = presented.opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || presented.scale <= 0.0 {
        return;
    }

    let radius = layer.radius() * presented.scale;
    let Some(circle) =
        PathBuilder::from_circle(presented.position.x, presented.position.y, radius)
    else {
        return;
    };

    let mut paint = Paint::default();
    paint.anti_alias = true;
    paint.set_color(faded(layer.fill(), opacity));
    pixmap.fill_path(&circle, &paint, FillRule::Winding, Transform::identity(), None);

    let line_width = presented.line_width * presented.scale;
    if line_width > 0.0 {
        paint.set_color(faded(layer.stroke(), opacity));
        let stroke = Stroke {
            width: line_width,
            ..Stroke::default()
        };
        pixmap.stroke_path(&circle, &paint, &stroke, Transform::identity(), None);
    }
}

fn faded(color: Rgba, opacity: f32) -> Color {
    let alpha = (color.a as f32 * opacity).round().clamp(0.0, 255.0) as u8;
    Color::from_rgba8(color.r, color.g, color.b, alpha)
}

pub fn encode_png(pixmap: &Pixmap) -> Result<Vec<u8>, RenderError> {
    pixmap
        .encode_png()
        .map_err(|e| RenderError::Encoding(e.to_string()))
}

pub fn save_png(pixmap: &Pixmap, path: &Path) -> Result<(), RenderError> {
    let data = encode_png(pixmap)?;
    std::fs::write(path, data)?;
    Ok(())
}
