//! Overlay driver
//!
//! Runs one [`TouchLayerManager`] on a tokio task. Input events, visibility signals and
//! animation ticks all arrive on that task, so the manager is only ever touched from one place
//! and events and signals keep the order they were sent in.

pub mod sink;

use crate::capture::touch::dispatch::EventObserver;
use crate::capture::touch::types::{ContactId, InputEvent};
use crate::compositor::Compositor;
use crate::error::{OverlayError, OverlayResult};
use crate::overlay::TouchLayerManager;
use crate::signal::{VisibilityListener, VisibilitySignal};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

pub use sink::{FrameSink, PngSequenceSink};

/// Messages processed by the driver task, in arrival order
#[derive(Debug, Clone)]
pub enum OverlayCommand {
    Event(InputEvent),
    Visibility(VisibilitySignal),
    ClearIndicators,
    Shutdown,
}

#[derive(Debug, Clone)]
pub struct DriverOptions {
    /// Time between animation ticks (and frames, when a sink is attached)
    pub frame_interval: Duration,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            frame_interval: Duration::from_micros(16_667),
        }
    }
}

impl DriverOptions {
    pub fn with_fps(fps: u32) -> Self {
        Self {
            frame_interval: Duration::from_secs_f64(1.0 / fps.max(1) as f64),
        }
    }
}

/// Summary returned when the driver task ends
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DriverReport {
    /// Touch batches received, whether or not indicators were visible
    pub batches: u64,
    /// Visibility signals applied
    pub signals: u64,
    /// Animation ticks run
    pub ticks: u64,
    /// Frames the sink accepted
    pub frames: u64,
    /// Layers removed after their disappear animation finished
    pub animated_out: u64,
    /// Lifecycle faults recorded by the manager
    pub faults: u64,
    /// Contacts still showing an indicator at shutdown
    pub active_contacts: Vec<ContactId>,
    /// Layers left in the compositing tree at shutdown
    pub layers: usize,
}

/// Sending side of a running driver
#[derive(Debug, Clone)]
pub struct DriverHandle {
    tx: mpsc::UnboundedSender<OverlayCommand>,
}

impl DriverHandle {
    pub fn send(&self, command: OverlayCommand) -> OverlayResult<()> {
        self.tx.send(command).map_err(|_| OverlayError::DriverClosed)
    }

    pub fn send_event(&self, event: InputEvent) -> OverlayResult<()> {
        self.send(OverlayCommand::Event(event))
    }

    pub fn set_visibility(&self, signal: VisibilitySignal) -> OverlayResult<()> {
        self.send(OverlayCommand::Visibility(signal))
    }

    pub fn clear_indicators(&self) -> OverlayResult<()> {
        self.send(OverlayCommand::ClearIndicators)
    }

    /// Ask the driver to stop after the commands already queued
    pub fn shutdown(&self) -> OverlayResult<()> {
        self.send(OverlayCommand::Shutdown)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl EventObserver for DriverHandle {
    fn observe(&self, event: &InputEvent) {
        if self.send_event(event.clone()).is_err() {
            tracing::debug!("Overlay driver stopped, dropping observed event");
        }
    }
}

impl VisibilityListener for DriverHandle {
    fn on_visibility(&self, signal: VisibilitySignal) {
        if self.set_visibility(signal).is_err() {
            tracing::debug!("Overlay driver stopped, dropping {:?}", signal);
        }
    }
}

pub struct OverlayDriver<C: Compositor> {
    manager: TouchLayerManager<C>,
    options: DriverOptions,
    sink: Option<Box<dyn FrameSink<C>>>,
    rx: mpsc::UnboundedReceiver<OverlayCommand>,
    report: DriverReport,
}

impl<C> OverlayDriver<C>
where
    C: Compositor + Send + Sync + 'static,
{
    /// Start driving `manager` on the current tokio runtime
    pub fn spawn(
        manager: TouchLayerManager<C>,
        options: DriverOptions,
        sink: Option<Box<dyn FrameSink<C>>>,
    ) -> (DriverHandle, JoinHandle<DriverReport>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let driver = Self {
            manager,
            options,
            sink,
            rx,
            report: DriverReport::default(),
        };

        let handle = tokio::spawn(driver.run());
        (DriverHandle { tx }, handle)
    }

    async fn run(mut self) -> DriverReport {
        tracing::info!(
            "Overlay driver started (frame_interval={:?})",
            self.options.frame_interval
        );

        let started = Instant::now();
        let mut ticker = tokio::time::interval(self.options.frame_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            // Ticks go first: they are ready at most once per interval, so a busy command
            // stream cannot hold back completions and frames.
            tokio::select! {
                biased;

                _ = ticker.tick() => {
                    self.tick(started.elapsed()).await;
                }
                command = self.rx.recv() => {
                    match command {
                        Some(OverlayCommand::Shutdown) | None => break,
                        Some(command) => self.apply(command),
                    }
                }
            }
        }

        if let Some(sink) = self.sink.as_mut() {
            if let Err(e) = sink.finish().await {
                tracing::error!("Frame sink failed to finish: {}", e);
            }
        }

        let stats = self.manager.stats();
        self.report.animated_out = stats.animated_out;
        self.report.faults = self.manager.diagnostics().total();
        self.report.active_contacts = self.manager.active_contacts();
        self.report.layers = self.manager.compositor().layer_count();

        tracing::info!(
            "Overlay driver stopped after {} tick(s), {} frame(s)",
            self.report.ticks,
            self.report.frames
        );
        self.report
    }

    fn apply(&mut self, command: OverlayCommand) {
        match command {
            OverlayCommand::Event(event) => {
                if event.touches().is_some() {
                    self.report.batches += 1;
                }
                self.manager.handle_event(&event);
            }
            OverlayCommand::Visibility(signal) => {
                self.report.signals += 1;
                self.manager.handle_signal(signal);
            }
            OverlayCommand::ClearIndicators => {
                self.manager.clear_indicators();
            }
            OverlayCommand::Shutdown => {}
        }
    }

    async fn tick(&mut self, now: Duration) {
        self.report.ticks += 1;
        self.manager.advance(now);

        let Some(sink) = self.sink.as_mut() else {
            return;
        };
        match sink.present(self.report.frames, self.manager.compositor()).await {
            Ok(()) => self.report.frames += 1,
            Err(e) => tracing::warn!("Frame {} not presented: {}", self.report.frames, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::touch::types::{ContactSample, EventBatch};
    use crate::compositor::Scene;
    use crate::config::OverlayConfig;
    use crate::render::FrameRenderer;
    use crate::signal::VisibilityGateway;
    use std::sync::Arc;

    fn touches(samples: Vec<ContactSample>) -> InputEvent {
        InputEvent::Touches(EventBatch::new(samples))
    }

    fn manager() -> TouchLayerManager<Scene> {
        TouchLayerManager::new(Scene::new(), OverlayConfig::default())
    }

    fn fast() -> DriverOptions {
        DriverOptions {
            frame_interval: Duration::from_millis(5),
        }
    }

    #[test]
    fn test_fps_to_interval() {
        assert_eq!(
            DriverOptions::with_fps(50).frame_interval,
            Duration::from_millis(20)
        );
        assert_eq!(DriverOptions::with_fps(0).frame_interval, Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_commands_are_applied_in_order() {
        let (handle, task) = OverlayDriver::spawn(manager(), fast(), None);

        handle.set_visibility(VisibilitySignal::Enable).unwrap();
        handle
            .send_event(touches(vec![
                ContactSample::began(1, 0.0, 0.0),
                ContactSample::began(2, 5.0, 5.0),
            ]))
            .unwrap();
        handle
            .send_event(InputEvent::Other {
                kind: "scroll".to_string(),
            })
            .unwrap();
        handle.shutdown().unwrap();

        let report = task.await.unwrap();
        assert_eq!(report.signals, 1);
        assert_eq!(report.batches, 1);
        assert_eq!(report.active_contacts, vec![ContactId(1), ContactId(2)]);
        assert_eq!(report.layers, 2);
        assert!(handle.is_closed());
        assert!(matches!(handle.shutdown(), Err(OverlayError::DriverClosed)));
    }

    #[tokio::test]
    async fn test_ticks_complete_disappear_animation() {
        let (handle, task) = OverlayDriver::spawn(manager(), fast(), None);

        handle.set_visibility(VisibilitySignal::Enable).unwrap();
        handle
            .send_event(touches(vec![ContactSample::began(1, 0.0, 0.0)]))
            .unwrap();
        handle
            .send_event(touches(vec![ContactSample::ended(1, 0.0, 0.0)]))
            .unwrap();

        tokio::time::sleep(Duration::from_millis(900)).await;
        handle.shutdown().unwrap();

        let report = task.await.unwrap();
        assert_eq!(report.animated_out, 1);
        assert_eq!(report.layers, 0);
        assert!(report.ticks > 1);
    }

    #[tokio::test]
    async fn test_gateway_disable_reaches_driver() {
        let gateway = VisibilityGateway::new();
        let (handle, task) = OverlayDriver::spawn(manager(), fast(), None);
        let listener = Arc::new(handle.clone());
        let _subscription = gateway.subscribe(listener.clone());

        gateway.enable();
        listener.observe(&touches(vec![ContactSample::began(7, 1.0, 1.0)]));
        gateway.disable();
        listener.observe(&touches(vec![ContactSample::began(8, 1.0, 1.0)]));
        handle.shutdown().unwrap();

        let report = task.await.unwrap();
        assert_eq!(report.signals, 2);
        assert!(report.active_contacts.is_empty());
        assert_eq!(report.layers, 0);
    }

    #[tokio::test]
    async fn test_png_sink_receives_frames() {
        let dir = tempfile::tempdir().unwrap();
        let sink = PngSequenceSink::new(dir.path(), FrameRenderer::new(32, 32).unwrap());
        let options = DriverOptions {
            frame_interval: Duration::from_millis(10),
        };
        let (handle, task) = OverlayDriver::spawn(manager(), options, Some(Box::new(sink)));

        tokio::time::sleep(Duration::from_millis(60)).await;
        handle.shutdown().unwrap();

        let report = task.await.unwrap();
        assert!(report.frames > 0);
        assert!(dir.path().join("frame-000000.png").exists());
    }

    #[tokio::test]
    async fn test_busy_command_stream_still_ticks() {
        let mut config = OverlayConfig::default();
        config.disappear.duration_secs = 0.01;
        let options = DriverOptions {
            frame_interval: Duration::from_millis(1),
        };
        let (handle, task) =
            OverlayDriver::spawn(TouchLayerManager::new(Scene::new(), config), options, None);

        handle.set_visibility(VisibilitySignal::Enable).unwrap();
        handle
            .send_event(touches(vec![
                ContactSample::began(1, 0.0, 0.0),
                ContactSample::ended(1, 0.0, 0.0),
            ]))
            .unwrap();

        let producer = {
            let handle = handle.clone();
            std::thread::spawn(move || {
                let until = std::time::Instant::now() + Duration::from_millis(100);
                while std::time::Instant::now() < until {
                    let event = InputEvent::Other {
                        kind: "pointerHover".to_string(),
                    };
                    if handle.send_event(event).is_err() {
                        break;
                    }
                }
                let _ = handle.shutdown();
            })
        };

        let report = task.await.unwrap();
        producer.join().unwrap();
        assert_eq!(report.animated_out, 1);
        assert_eq!(report.layers, 0);
    }
}
