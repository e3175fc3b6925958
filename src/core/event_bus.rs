//! Cross-thread event queue that marshals worker completions onto the UI thread.
//!
//! Architecture:
//! - Worker jobs hold an `EventEmitter` and `emit()` from any thread
//! - emit() queues the event and pokes the wake hook (if any)
//! - The foreground calls poll() once per frame and handles events in order
//!
//! Nothing that touches paint state runs on a worker: the worker only queues,
//! the UI thread decides what to repaint.

use std::any::Any;
use std::sync::{Arc, Mutex, RwLock};
use log::warn;

/// Maximum events in queue before oldest are evicted
const MAX_QUEUE_SIZE: usize = 1000;

/// Marker trait for events. Events must be Send + Sync + 'static.
pub trait Event: Any + Send + Sync + 'static {
    fn as_any(&self) -> &dyn Any;
    fn type_name(&self) -> &'static str;
}

// Blanket impl for all qualifying types
impl<T: Any + Send + Sync + 'static> Event for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// Boxed event for queue storage
pub type BoxedEvent = Box<dyn Event>;

/// Hook invoked after every emit, from the emitting thread.
/// Typically `egui::Context::request_repaint`, which is thread-safe.
pub type WakeHook = Arc<dyn Fn() + Send + Sync>;

/// Foreground-owned event queue.
#[derive(Clone)]
pub struct EventBus {
    queue: Arc<Mutex<Vec<BoxedEvent>>>,
    wake: Arc<RwLock<Option<WakeHook>>>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            queue: Arc::new(Mutex::new(Vec::new())),
            wake: Arc::new(RwLock::new(None)),
        }
    }

    /// Install the hook that wakes the UI loop when a worker posts an event.
    pub fn set_wake_hook(&self, hook: Option<WakeHook>) {
        *self.wake.write().unwrap_or_else(|e| e.into_inner()) = hook;
    }

    /// Queue an event from the foreground.
    pub fn emit<E: Event>(&self, event: E) {
        push_and_wake(&self.queue, &self.wake, Box::new(event));
    }

    /// Drain all queued events, oldest first.
    pub fn poll(&self) -> Vec<BoxedEvent> {
        std::mem::take(&mut *self.queue.lock().unwrap_or_else(|e| e.into_inner()))
    }

    /// Get an emitter handle for worker jobs.
    pub fn emitter(&self) -> EventEmitter {
        EventEmitter {
            queue: Arc::clone(&self.queue),
            wake: Arc::clone(&self.wake),
        }
    }

    pub fn queue_len(&self) -> usize {
        self.queue.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

/// Lightweight, cloneable emitter captured by worker closures.
#[derive(Clone)]
pub struct EventEmitter {
    queue: Arc<Mutex<Vec<BoxedEvent>>>,
    wake: Arc<RwLock<Option<WakeHook>>>,
}

impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter")
            .field("queue_len", &self.queue.lock().map(|q| q.len()).unwrap_or(0))
            .finish()
    }
}

impl EventEmitter {
    pub fn emit<E: Event>(&self, event: E) {
        push_and_wake(&self.queue, &self.wake, Box::new(event));
    }
}

fn push_and_wake(
    queue: &Mutex<Vec<BoxedEvent>>,
    wake: &RwLock<Option<WakeHook>>,
    event: BoxedEvent,
) {
    {
        let mut queue = queue.lock().unwrap_or_else(|e| e.into_inner());
        if queue.len() >= MAX_QUEUE_SIZE {
            let evict_count = queue.len() / 2;
            warn!("EventBus queue full ({} events), evicting oldest {}", queue.len(), evict_count);
            queue.drain(0..evict_count);
        }
        queue.push(event);
    }
    // Hook runs outside the queue lock so it may re-enter poll()
    let hook = wake.read().unwrap_or_else(|e| e.into_inner()).clone();
    if let Some(hook) = hook {
        hook();
    }
}

/// Helper: downcast BoxedEvent to concrete type
///
/// Must deref to `dyn Event` before calling `as_any()`, otherwise the blanket
/// impl on `Box<dyn Event>` answers and the downcast always fails.
#[inline]
pub fn downcast_event<E: Event>(event: &BoxedEvent) -> Option<&E> {
    (**event).as_any().downcast_ref::<E>()
}
