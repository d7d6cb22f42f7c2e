//! Visibility gateway
//!
//! Broadcasts enable/disable to every registered overlay. The gateway is an ordinary value
//! that can be injected wherever overlays are built; [`global`] provides the process-wide
//! instance behind the free [`enable`] and [`disable`] functions.
//!
//! # Example
//!
//! ```ignore
//! let gateway = VisibilityGateway::new();
//! let overlay = SharedOverlay::attach(manager, &gateway);
//!
//! gateway.enable();   // every attached overlay starts drawing indicators
//! gateway.disable();  // every attached overlay drops its indicators at once
//! ```

use parking_lot::{Mutex, ReentrantMutex};
use std::sync::{Arc, OnceLock, Weak};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilitySignal {
    Enable,
    Disable,
}

impl VisibilitySignal {
    pub fn is_enable(self) -> bool {
        matches!(self, VisibilitySignal::Enable)
    }
}

/// Receiver of gateway broadcasts.
///
/// Called synchronously from [`VisibilityGateway::enable`] / [`VisibilityGateway::disable`]
/// on the caller's thread. Broadcasts never overlap, so every listener sees signals in the
/// order the gateway recorded them.
pub trait VisibilityListener: Send + Sync {
    fn on_visibility(&self, signal: VisibilitySignal);
}

struct Registration {
    id: u64,
    listener: Weak<dyn VisibilityListener>,
}

#[derive(Default)]
struct GatewayState {
    enabled: bool,
    next_id: u64,
    listeners: Vec<Registration>,
}

#[derive(Clone, Default)]
pub struct VisibilityGateway {
    state: Arc<Mutex<GatewayState>>,
    /// Held for a whole broadcast or subscription; reentrant so callbacks may subscribe
    delivery: Arc<ReentrantMutex<()>>,
}

impl VisibilityGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enable(&self) {
        self.broadcast(VisibilitySignal::Enable);
    }

    pub fn disable(&self) {
        self.broadcast(VisibilitySignal::Disable);
    }

    /// State of the last broadcast
    pub fn is_enabled(&self) -> bool {
        self.state.lock().enabled
    }

    /// Number of registered listeners that are still alive
    pub fn listener_count(&self) -> usize {
        self.state
            .lock()
            .listeners
            .iter()
            .filter(|r| r.listener.strong_count() > 0)
            .count()
    }

    /// Register `listener` for future broadcasts.
    ///
    /// The gateway only holds a weak reference. If the gateway is currently enabled the
    /// listener receives `Enable` before this returns.
    pub fn subscribe(&self, listener: Arc<dyn VisibilityListener>) -> Subscription {
        let _delivery = self.delivery.lock();
        let (id, enabled) = {
            let mut state = self.state.lock();
            state.next_id += 1;
            let id = state.next_id;
            state.listeners.push(Registration {
                id,
                listener: Arc::downgrade(&listener),
            });
            (id, state.enabled)
        };

        if enabled {
            listener.on_visibility(VisibilitySignal::Enable);
        }

        Subscription {
            id,
            state: Arc::downgrade(&self.state),
        }
    }

    fn broadcast(&self, signal: VisibilitySignal) {
        let _delivery = self.delivery.lock();
        let listeners: Vec<Arc<dyn VisibilityListener>> = {
            let mut state = self.state.lock();
            state.enabled = signal.is_enable();
            state.listeners.retain(|r| r.listener.strong_count() > 0);
            state
                .listeners
                .iter()
                .filter_map(|r| r.listener.upgrade())
                .collect()
        };

        tracing::debug!("Broadcasting {:?} to {} overlay(s)", signal, listeners.len());

        for listener in listeners {
            listener.on_visibility(signal);
        }
    }
}

/// Keeps a listener registered; dropping it unregisters
pub struct Subscription {
    id: u64,
    state: Weak<Mutex<GatewayState>>,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(state) = self.state.upgrade() {
            state.lock().listeners.retain(|r| r.id != self.id);
        }
    }
}

/// Process-wide gateway
pub fn global() -> &'static VisibilityGateway {
    static GLOBAL: OnceLock<VisibilityGateway> = OnceLock::new();
    GLOBAL.get_or_init(VisibilityGateway::new)
}

/// Turn indicators on for every overlay attached to the process-wide gateway
pub fn enable() {
    global().enable();
}

/// Turn indicators off for every overlay attached to the process-wide gateway
pub fn disable() {
    global().disable();
}
