//! Core runtime pieces - worker pool and the cross-thread event queue
//!
//! Independent of trim semantics and of the UI toolkit.

pub mod event_bus;
pub mod workers;

pub use event_bus::{downcast_event, BoxedEvent, EventBus, EventEmitter, WakeHook};
pub use workers::{WorkerPool, Workers};
