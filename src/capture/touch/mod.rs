//! Touch input as seen on the dispatch path
//!
//! Contact samples arrive in batches from the platform's input system. The dispatcher
//! forwards them to the application unchanged and lets overlays observe them.

pub mod dispatch;
pub mod types;

pub use dispatch::{CountingSink, EventObserver, EventSink, InterceptingDispatcher};
pub use types::{ContactId, ContactPhase, ContactSample, EventBatch, InputEvent, Point};
