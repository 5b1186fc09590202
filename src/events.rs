//! Pub/sub event bus plus the application event types.
//!
//! Components subscribe to event types with callbacks (invoked immediately on
//! emit); every emit is also queued so the main loop can drain events once
//! per frame with `poll()`. The overlay and the playback engine communicate
//! with the session exclusively through these events.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use crate::stage::Stage;

/// Marker trait for events. Events must be Send + Sync + 'static.
pub trait Event: Any + Send + Sync + 'static {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any + Send + Sync + 'static> Event for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

type Callback = Arc<dyn Fn(&dyn Any) + Send + Sync>;

/// Boxed event for queue storage.
pub type BoxedEvent = Box<dyn Event>;

// ---------------------------------------------------------------------------
// Application events
// ---------------------------------------------------------------------------

/// A completed gesture (or the auto-advance timer) asked for the next stage.
/// Coalesced by the app: at most one advance is applied per drained queue.
#[derive(Debug, Clone, Copy)]
pub struct AdvanceRequested;

/// The session committed a stage transition.
#[derive(Debug, Clone, Copy)]
pub struct StageChanged {
    pub from: Stage,
    pub to: Stage,
}

/// Side-effect signal on a successful advance. Purely cosmetic.
#[derive(Debug, Clone, Copy)]
pub struct HapticPulse;

/// A non-looping sequence reached its last frame.
#[derive(Debug, Clone, Copy)]
pub struct PlaybackFinished {
    pub stage: Stage,
}

// ---------------------------------------------------------------------------
// Bus
// ---------------------------------------------------------------------------

/// Event bus with immediate callbacks and a deferred queue.
#[derive(Clone, Default)]
pub struct EventBus {
    subscribers: Arc<RwLock<HashMap<TypeId, Vec<Callback>>>>,
    queue: Arc<Mutex<Vec<BoxedEvent>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to events of type E. The callback fires synchronously inside
    /// every `emit` of that type.
    pub fn subscribe<E, F>(&self, callback: F)
    where
        E: Event,
        F: Fn(&E) + Send + Sync + 'static,
    {
        let wrapped: Callback = Arc::new(move |any: &dyn Any| {
            if let Some(event) = any.downcast_ref::<E>() {
                callback(event);
            }
        });
        self.subscribers
            .write()
            .expect("lock")
            .entry(TypeId::of::<E>())
            .or_default()
            .push(wrapped);
    }

    /// Invoke subscribers immediately and queue the event for `poll()`.
    pub fn emit<E: Event + Clone>(&self, event: E) {
        if let Some(cbs) = self.subscribers.read().expect("lock").get(&TypeId::of::<E>()) {
            for cb in cbs {
                cb(&event);
            }
        }
        self.queue.lock().expect("lock").push(Box::new(event));
    }

    /// Drain all queued events. Called once per frame by the main loop.
    pub fn poll(&self) -> Vec<BoxedEvent> {
        std::mem::take(&mut *self.queue.lock().expect("lock"))
    }

    /// Cloneable emit-only handle for components that must not poll.
    pub fn emitter(&self) -> EventEmitter {
        EventEmitter {
            subscribers: Arc::clone(&self.subscribers),
            queue: Arc::clone(&self.queue),
        }
    }

    pub fn queue_len(&self) -> usize {
        self.queue.lock().expect("lock").len()
    }
}

/// Lightweight emitter handle for widgets and the session.
#[derive(Clone)]
pub struct EventEmitter {
    subscribers: Arc<RwLock<HashMap<TypeId, Vec<Callback>>>>,
    queue: Arc<Mutex<Vec<BoxedEvent>>>,
}

impl EventEmitter {
    pub fn emit<E: Event + Clone>(&self, event: E) {
        if let Some(cbs) = self.subscribers.read().expect("lock").get(&TypeId::of::<E>()) {
            for cb in cbs {
                cb(&event);
            }
        }
        self.queue.lock().expect("lock").push(Box::new(event));
    }
}

impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter")
            .field("queue_len", &self.queue.lock().map(|q| q.len()).unwrap_or(0))
            .finish()
    }
}

/// Downcast a polled event to a concrete type.
#[inline]
pub fn downcast_event<E: Event>(event: &BoxedEvent) -> Option<&E> {
    event.as_any().downcast_ref::<E>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI32, Ordering};

    #[derive(Clone, Debug)]
    struct TestEvent {
        value: i32,
    }

    #[test]
    fn subscribe_fires_immediately() {
        let bus = EventBus::new();
        let counter = Arc::new(AtomicI32::new(0));
        let c = Arc::clone(&counter);

        bus.subscribe::<TestEvent, _>(move |e| {
            c.fetch_add(e.value, Ordering::SeqCst);
        });

        bus.emit(TestEvent { value: 10 });
        assert_eq!(counter.load(Ordering::SeqCst), 10);

        bus.emit(TestEvent { value: 5 });
        assert_eq!(counter.load(Ordering::SeqCst), 15);
    }

    #[test]
    fn emit_queues_for_poll() {
        let bus = EventBus::new();
        bus.emit(TestEvent { value: 1 });
        bus.emit(AdvanceRequested);

        let events = bus.poll();
        assert_eq!(events.len(), 2);
        assert_eq!(bus.poll().len(), 0);
    }

    #[test]
    fn emitter_handle_reaches_subscribers_and_queue() {
        let bus = EventBus::new();
        let counter = Arc::new(AtomicI32::new(0));
        let c = Arc::clone(&counter);

        bus.subscribe::<TestEvent, _>(move |e| {
            c.fetch_add(e.value, Ordering::SeqCst);
        });

        let emitter = bus.emitter();
        emitter.emit(TestEvent { value: 42 });

        assert_eq!(counter.load(Ordering::SeqCst), 42);
        assert_eq!(bus.poll().len(), 1);
    }

    #[test]
    fn downcast_recovers_concrete_events() {
        let bus = EventBus::new();
        bus.emit(StageChanged { from: Stage::Begin, to: Stage::Vision });

        let events = bus.poll();
        let changed = events
            .iter()
            .filter_map(downcast_event::<StageChanged>)
            .next()
            .expect("typed event");
        assert_eq!(changed.to, Stage::Vision);
        assert!(events.iter().all(|e| downcast_event::<AdvanceRequested>(e).is_none()));
    }
}
