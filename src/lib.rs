//! Touch Indicators - animated circles that follow every finger on screen.
//!
//! An overlay observes touch batches on their way to the application and keeps one indicator
//! layer per active contact: it scales in on Began, follows Moved, and fades out on
//! Ended/Cancelled. A process-wide visibility gateway turns every overlay on or off at once.

pub mod animation;
pub mod capture;
pub mod compositor;
pub mod config;
pub mod driver;
pub mod error;
pub mod overlay;
pub mod render;
pub mod replay;
pub mod signal;

pub use capture::{ContactId, ContactPhase, ContactSample, EventBatch, InputEvent, Point};
pub use compositor::{Compositor, Scene};
pub use config::OverlayConfig;
pub use error::{LifecycleFault, OverlayError, OverlayResult};
pub use overlay::{SharedOverlay, TouchLayerManager};
pub use signal::{disable, enable, VisibilityGateway};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `default_filter`. Does nothing if a subscriber is
/// already installed.
pub fn init_tracing(default_filter: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();

    if installed.is_ok() {
        tracing::info!("Starting touch indicators v{}", env!("CARGO_PKG_VERSION"));
    }
}
