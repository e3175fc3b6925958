//! UI widgets
//!
//! Widgets only paint and forward input; state lives in `trim::TrimMonitor`.

pub mod trim_view;

pub use trim_view::{panel_rects, PanelRects, TrimView};
