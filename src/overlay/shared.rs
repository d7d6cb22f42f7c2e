//! Thread-shared overlay
//!
//! Wraps a [`TouchLayerManager`] so the gateway and the dispatch path can both reach it.
//! Each callback takes the lock for the whole batch or signal, so a batch is applied
//! completely before a disable can run and vice versa.

use crate::capture::touch::dispatch::EventObserver;
use crate::capture::touch::types::InputEvent;
use crate::compositor::Compositor;
use crate::overlay::manager::TouchLayerManager;
use crate::signal::{Subscription, VisibilityGateway, VisibilityListener, VisibilitySignal};
use parking_lot::{Mutex as ParkingMutex, MutexGuard};
use std::sync::Arc;

impl<C> VisibilityListener for ParkingMutex<TouchLayerManager<C>>
where
    C: Compositor + Send + 'static,
{
    fn on_visibility(&self, signal: VisibilitySignal) {
        self.lock().handle_signal(signal);
    }
}

impl<C> EventObserver for ParkingMutex<TouchLayerManager<C>>
where
    C: Compositor + Send + 'static,
{
    fn observe(&self, event: &InputEvent) {
        self.lock().handle_event(event);
    }
}

pub struct SharedOverlay<C: Compositor> {
    inner: Arc<ParkingMutex<TouchLayerManager<C>>>,
    subscription: Option<Arc<Subscription>>,
}

impl<C> Clone for SharedOverlay<C>
where
    C: Compositor,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            subscription: self.subscription.clone(),
        }
    }
}

impl<C> SharedOverlay<C>
where
    C: Compositor + Send + 'static,
{
    /// Wrap `manager` without registering it anywhere
    pub fn new(manager: TouchLayerManager<C>) -> Self {
        Self {
            inner: Arc::new(ParkingMutex::new(manager)),
            subscription: None,
        }
    }

    /// Wrap `manager` and register it with `gateway`.
    ///
    /// The registration lasts as long as any clone of the returned overlay.
    pub fn attach(manager: TouchLayerManager<C>, gateway: &VisibilityGateway) -> Self {
        let mut overlay = Self::new(manager);
        overlay.subscribe(gateway);
        overlay
    }

    /// Register with `gateway`, replacing any previous registration
    pub fn subscribe(&mut self, gateway: &VisibilityGateway) {
        let listener: Arc<dyn VisibilityListener> = self.inner.clone();
        self.subscription = Some(Arc::new(gateway.subscribe(listener)));
    }

    /// Stop receiving gateway signals. Clones share the registration, so it ends only once
    /// every clone has detached or been dropped.
    pub fn detach(&mut self) {
        self.subscription = None;
    }

    pub fn is_attached(&self) -> bool {
        self.subscription.is_some()
    }

    /// Observer to install on an [`InterceptingDispatcher`](crate::capture::InterceptingDispatcher)
    pub fn observer(&self) -> Arc<dyn EventObserver> {
        self.inner.clone()
    }

    pub fn lock(&self) -> MutexGuard<'_, TouchLayerManager<C>> {
        self.inner.lock()
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut TouchLayerManager<C>) -> R) -> R {
        f(&mut self.inner.lock())
    }
}
