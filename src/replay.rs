//! Scripted touch replay
//!
//! Plays a recorded or hand-written touch session through the same path a live overlay uses:
//! a visibility gateway, an intercepting dispatcher in front of a counting downstream sink, and
//! a shared overlay over a software [`Scene`]. Frames are stepped on a fixed clock and rendered
//! with [`FrameRenderer`].

use crate::capture::touch::dispatch::{CountingSink, InterceptingDispatcher};
use crate::capture::touch::types::{ContactSample, EventBatch, InputEvent};
use crate::compositor::{Compositor, Scene};
use crate::config::{OverlayConfig, Rgba};
use crate::driver::PngSequenceSink;
use crate::error::{LifecycleFault, OverlayError, OverlayResult};
use crate::overlay::{SharedOverlay, TouchLayerManager};
use crate::render::{save_png, FrameRenderer, RenderError};
use crate::signal::VisibilityGateway;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tiny_skia::Pixmap;

/// How long replay keeps running after the last event while indicators are still on screen
pub const REPLAY_TAIL_LIMIT_MS: f64 = 5000.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ScriptAction {
    Touches { samples: Vec<ContactSample> },
    Enable,
    Disable,
    Clear,
    Other { kind: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptedEvent {
    /// Milliseconds from the start of the session
    pub at_ms: f64,
    #[serde(flatten)]
    pub action: ScriptAction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TouchScript {
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub background: Option<Rgba>,
    pub events: Vec<ScriptedEvent>,
}

impl TouchScript {
    pub fn from_json_str(json: &str) -> OverlayResult<Self> {
        let script: TouchScript = serde_json::from_str(json)?;
        script.validate()?;
        Ok(script)
    }

    pub fn load(path: &Path) -> OverlayResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let script = Self::from_json_str(&content)?;
        tracing::info!(
            "Loaded touch script {:?} ({} events, {}x{})",
            path,
            script.events.len(),
            script.width,
            script.height
        );
        Ok(script)
    }

    pub fn validate(&self) -> OverlayResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(OverlayError::ScriptError(format!(
                "frame size {}x{} is empty",
                self.width, self.height
            )));
        }
        if let Some(event) = self
            .events
            .iter()
            .find(|e| !(e.at_ms.is_finite() && e.at_ms >= 0.0))
        {
            return Err(OverlayError::ScriptError(format!(
                "event time {} is not a non-negative number",
                event.at_ms
            )));
        }
        Ok(())
    }

    /// Time of the last event, 0 for an empty script
    pub fn duration_ms(&self) -> f64 {
        self.events.iter().map(|e| e.at_ms).fold(0.0, f64::max)
    }

    /// Events ordered by time; events sharing a time keep their script order
    fn timeline(&self) -> Vec<&ScriptedEvent> {
        let mut events: Vec<&ScriptedEvent> = self.events.iter().collect();
        events.sort_by(|a, b| a.at_ms.total_cmp(&b.at_ms));
        events
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplayReport {
    /// Frames rendered and handed to the frame callback
    pub frames: u64,
    /// Most indicator layers on screen in a single frame
    pub peak_indicators: usize,
    /// Events the downstream sink received, touch and otherwise
    pub downstream_events: u64,
    /// Most recent lifecycle faults, oldest first
    pub faults: Vec<LifecycleFault>,
    /// Every fault recorded, including ones no longer in `faults`
    pub fault_total: u64,
    /// Scene time of the last rendered frame
    pub duration_ms: f64,
}

/// Replay `script` at `fps`, handing every rendered frame to `on_frame`.
///
/// Stops once every event has been delivered and nothing is left on screen, or
/// [`REPLAY_TAIL_LIMIT_MS`] after the last event. An error from `on_frame` aborts the replay.
pub fn replay<F>(
    script: &TouchScript,
    config: OverlayConfig,
    fps: f64,
    mut on_frame: F,
) -> OverlayResult<ReplayReport>
where
    F: FnMut(u64, &Pixmap) -> OverlayResult<()>,
{
    if !(fps.is_finite() && fps > 0.0) {
        return Err(OverlayError::ConfigurationError(format!(
            "fps must be positive, got {}",
            fps
        )));
    }
    script.validate()?;
    config.validate()?;

    let mut renderer = FrameRenderer::new(script.width, script.height)?;
    if let Some(background) = script.background {
        renderer = renderer.with_background(background);
    }
    let mut pixmap =
        Pixmap::new(script.width, script.height).ok_or(RenderError::PixmapCreationFailed)?;

    let gateway = VisibilityGateway::new();
    let overlay = SharedOverlay::attach(TouchLayerManager::new(Scene::new(), config), &gateway);
    let mut dispatcher = InterceptingDispatcher::new(CountingSink::default());
    dispatcher.add_observer(overlay.observer());

    let timeline = script.timeline();
    let last_event_ms = script.duration_ms();
    let frame_ms = 1000.0 / fps;

    tracing::info!(
        "Replaying {} event(s) at {}fps into {}x{} frames",
        timeline.len(),
        fps,
        script.width,
        script.height
    );

    let mut next = 0;
    let mut report = ReplayReport::default();
    loop {
        let now_ms = report.frames as f64 * frame_ms;

        overlay.with(|m| m.advance(Duration::from_secs_f64(now_ms / 1000.0)));

        while next < timeline.len() && timeline[next].at_ms <= now_ms {
            apply(&timeline[next].action, &gateway, &overlay, &mut dispatcher);
            next += 1;
        }

        let idle = overlay.with(|m| {
            let scene = m.compositor();
            report.peak_indicators = report.peak_indicators.max(scene.layer_count());
            renderer.render_into(&mut pixmap, scene);
            scene.layer_count() == 0 && !scene.is_animating()
        });

        on_frame(report.frames, &pixmap)?;
        report.frames += 1;
        report.duration_ms = now_ms;

        if next == timeline.len() && (idle || now_ms >= last_event_ms + REPLAY_TAIL_LIMIT_MS) {
            break;
        }
    }

    report.downstream_events = dispatcher.downstream().total();
    overlay.with(|m| {
        report.faults = m.diagnostics().recent().cloned().collect();
        report.fault_total = m.diagnostics().total();
    });

    tracing::info!(
        "Replay finished: {} frame(s), peak {} indicator(s), {} fault(s)",
        report.frames,
        report.peak_indicators,
        report.fault_total
    );
    Ok(report)
}

/// Replay `script` and write every frame as a PNG into `out_dir`
pub fn replay_to_dir(
    script: &TouchScript,
    config: OverlayConfig,
    fps: f64,
    out_dir: &Path,
) -> OverlayResult<ReplayReport> {
    std::fs::create_dir_all(out_dir)?;
    replay(script, config, fps, |frame, pixmap| {
        save_png(pixmap, &PngSequenceSink::frame_path(out_dir, frame))?;
        Ok(())
    })
}

fn apply(
    action: &ScriptAction,
    gateway: &VisibilityGateway,
    overlay: &SharedOverlay<Scene>,
    dispatcher: &mut InterceptingDispatcher<CountingSink>,
) {
    match action {
        ScriptAction::Touches { samples } => {
            dispatcher.send_event(InputEvent::Touches(EventBatch::new(samples.clone())));
        }
        ScriptAction::Enable => gateway.enable(),
        ScriptAction::Disable => gateway.disable(),
        ScriptAction::Clear => {
            overlay.with(|m| m.clear_indicators());
        }
        ScriptAction::Other { kind } => {
            dispatcher.send_event(InputEvent::Other { kind: kind.clone() });
        }
    }
}
