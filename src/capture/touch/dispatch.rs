//! Event dispatch passthrough
//!
//! The dispatcher sits in front of the application's own event handling. Every event is
//! delivered downstream first and only then shown to observers, which receive a shared
//! reference and therefore cannot alter or drop what the application sees.

use crate::capture::touch::types::InputEvent;
use std::sync::Arc;

/// Normal application dispatch
pub trait EventSink {
    fn dispatch(&mut self, event: &InputEvent);
}

impl<F> EventSink for F
where
    F: FnMut(&InputEvent),
{
    fn dispatch(&mut self, event: &InputEvent) {
        self(event)
    }
}

/// Read-only tap on the dispatch path (overlays, drivers)
pub trait EventObserver: Send + Sync {
    fn observe(&self, event: &InputEvent);
}

/// Downstream sink that only counts what it receives
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CountingSink {
    pub touch_batches: u64,
    pub other_events: u64,
}

impl CountingSink {
    pub fn total(&self) -> u64 {
        self.touch_batches + self.other_events
    }
}

impl EventSink for CountingSink {
    fn dispatch(&mut self, event: &InputEvent) {
        match event {
            InputEvent::Touches(_) => self.touch_batches += 1,
            InputEvent::Other { .. } => self.other_events += 1,
        }
    }
}

pub struct InterceptingDispatcher<S: EventSink> {
    downstream: S,
    observers: Vec<Arc<dyn EventObserver>>,
}

impl<S: EventSink> InterceptingDispatcher<S> {
    pub fn new(downstream: S) -> Self {
        Self {
            downstream,
            observers: Vec::new(),
        }
    }

    pub fn add_observer(&mut self, observer: Arc<dyn EventObserver>) {
        self.observers.push(observer);
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Deliver downstream, then let every observer look at the same event
    pub fn send_event(&mut self, event: InputEvent) {
        self.downstream.dispatch(&event);

        for observer in &self.observers {
            observer.observe(&event);
        }
    }

    pub fn downstream(&self) -> &S {
        &self.downstream
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::touch::types::{ContactSample, EventBatch};
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<InputEvent>>,
    }

    impl EventObserver for Recorder {
        fn observe(&self, event: &InputEvent) {
            self.seen.lock().push(event.clone());
        }
    }

    #[test]
    fn test_downstream_sees_every_event_before_observers() {
        let order = Arc::new(Mutex::new(Vec::<&'static str>::new()));

        struct Tap(Arc<Mutex<Vec<&'static str>>>);
        impl EventObserver for Tap {
            fn observe(&self, _event: &InputEvent) {
                self.0.lock().push("observer");
            }
        }

        let downstream_order = order.clone();
        let mut dispatcher = InterceptingDispatcher::new(move |_: &InputEvent| {
            downstream_order.lock().push("downstream");
        });
        dispatcher.add_observer(Arc::new(Tap(order.clone())));

        dispatcher.send_event(EventBatch::single(ContactSample::began(1, 0.0, 0.0)).into());

        assert_eq!(*order.lock(), vec!["downstream", "observer"]);
    }

    #[test]
    fn test_events_reach_downstream_unchanged() {
        let recorder = Arc::new(Recorder::default());
        let mut dispatcher = InterceptingDispatcher::new(CountingSink::default());
        dispatcher.add_observer(recorder.clone());

        let batch = EventBatch::new(vec![
            ContactSample::began(1, 1.0, 2.0),
            ContactSample::moved(2, 3.0, 4.0),
        ]);
        dispatcher.send_event(InputEvent::Touches(batch.clone()));
        dispatcher.send_event(InputEvent::Other {
            kind: "key".to_string(),
        });

        assert_eq!(dispatcher.downstream().touch_batches, 1);
        assert_eq!(dispatcher.downstream().other_events, 1);

        let seen = recorder.seen.lock();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], InputEvent::Touches(batch));
    }
}
