//! Frame sinks
//!
//! A sink receives the compositor once per driver tick, after animations have advanced and
//! finished removals have run.

use crate::compositor::{Compositor, Scene};
use crate::error::OverlayResult;
use crate::render::{encode_png, FrameRenderer};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

#[async_trait]
pub trait FrameSink<C: Compositor>: Send {
    /// Present frame number `frame`
    async fn present(&mut self, frame: u64, compositor: &C) -> OverlayResult<()>;

    /// Called once when the driver stops
    async fn finish(&mut self) -> OverlayResult<()> {
        Ok(())
    }
}

/// Writes every frame as `frame-NNNNNN.png` into a directory
pub struct PngSequenceSink {
    dir: PathBuf,
    renderer: FrameRenderer,
    /// Frames written so far
    written: u64,
}

impl PngSequenceSink {
    pub fn new(dir: impl Into<PathBuf>, renderer: FrameRenderer) -> Self {
        Self {
            dir: dir.into(),
            renderer,
            written: 0,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn frames_written(&self) -> u64 {
        self.written
    }

    pub fn frame_path(dir: &Path, frame: u64) -> PathBuf {
        dir.join(format!("frame-{:06}.png", frame))
    }
}

#[async_trait]
impl FrameSink<Scene> for PngSequenceSink {
    async fn present(&mut self, frame: u64, scene: &Scene) -> OverlayResult<()> {
        if self.written == 0 {
            tokio::fs::create_dir_all(&self.dir).await?;
        }

        let data = {
            let pixmap = self.renderer.render(scene)?;
            encode_png(&pixmap)?
        };

        let path = Self::frame_path(&self.dir, frame);
        tokio::fs::write(&path, data).await?;
        self.written += 1;
        Ok(())
    }

    async fn finish(&mut self) -> OverlayResult<()> {
        tracing::info!("Wrote {} frame(s) to {:?}", self.written, self.dir);
        Ok(())
    }
}
