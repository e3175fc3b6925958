//! TRIMVIEW - trim-mode match-frame monitor library
//!
//! Re-exports all modules for use by the demo binary and host editors.

// Core runtime (events, workers)
pub mod core;

pub mod cli;
pub mod config;
pub mod engine;
pub mod entities;
pub mod error;
pub mod trim;
pub mod widgets;

// Re-export commonly used types
pub use core::event_bus::{downcast_event, BoxedEvent, EventBus, EventEmitter};
pub use core::workers::{WorkerPool, Workers};
pub use engine::{DecodeEngine, DecodeHandle, ImageSeqEngine, Producer};
pub use entities::{MatchClip, MatchFrameSurface, PanelId, PanelMask, PanelSize, TrimViewMode, ViewState};
pub use error::{TrimError, TrimResult};
pub use trim::{PlayerLink, ProjectProfile, TrimMonitor};
