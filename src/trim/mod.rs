//! Trim-mode match-frame monitor.
//!
//! - `monitor`: view-state machine, the public entry point
//! - `extractor`: background frame extraction to the scratch PNG
//! - `playback_cache`: decode handle kept for drag refreshes
//! - `surface_cache`: ticket-ordered slot for the displayed frame
//! - `layout`: panel geometry
//! - `render`: paint ops for the four panels

pub mod extractor;
pub mod layout;
pub mod monitor;
pub mod playback_cache;
pub mod render;
pub mod surface_cache;
pub mod trim_events;

pub use extractor::{ExtractionJob, FrameExtractor};
pub use layout::{compute_edge_panel_size, compute_match_frame_panel_size, PanelLayout};
pub use monitor::{PlayerLink, ProjectProfile, TrimMonitor};
pub use playback_cache::PlaybackCache;
pub use render::{paint_panel, PaintOp, RenderView};
pub use surface_cache::SurfaceCache;
pub use trim_events::{MatchFrameFailedEvent, MatchFrameReadyEvent};
