//! Data model for the trim monitor.
//!
//! Plain data plus pure helpers; nothing here spawns threads or paints.

pub mod clip;
pub mod panel;
pub mod surface;
pub mod timecode;
pub mod view_state;

pub use clip::MatchClip;
pub use panel::{PanelId, PanelMask, PanelSize};
pub use surface::MatchFrameSurface;
pub use timecode::frames_to_timecode;
pub use view_state::{Boundary, ModeFamily, Side, TrimViewMode, ViewState};
