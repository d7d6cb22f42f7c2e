//! Input capture
//!
//! This module provides the touch event model and the passthrough dispatcher overlays tap into.

pub mod touch;

pub use touch::{
    ContactId, ContactPhase, ContactSample, CountingSink, EventBatch, EventObserver, EventSink,
    InputEvent, InterceptingDispatcher, Point,
};
