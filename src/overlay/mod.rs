//! Touch indicator overlay
//!
//! [`TouchLayerManager`] owns the per-contact layer lifecycle; [`SharedOverlay`] puts it behind
//! a lock so a [`VisibilityGateway`](crate::signal::VisibilityGateway) and an
//! [`InterceptingDispatcher`](crate::capture::InterceptingDispatcher) can drive it together.

pub mod manager;
pub mod shared;

pub use manager::{Diagnostics, LifecycleStats, TouchLayer, TouchLayerManager};
pub use shared::SharedOverlay;
