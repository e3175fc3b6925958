//! Panel geometry for the trim monitor.
//!
//! The widget is a 3-row stack:
//! ```text
//! +--------------------- top edge ---------------------+
//! | left half |        live monitor        | right half |
//! +------------------- bottom edge --------------------+
//! ```
//! In a trim mode the match half is sized to half the container width at the
//! project aspect, the opposite half collapses and the live monitor takes the
//! remaining middle row. In `Default` every panel collapses.

use crate::entities::{PanelId, PanelSize, Side, TrimViewMode};

/// Height of the picture area: half the container width at project aspect.
fn screen_height(container: PanelSize, profile: PanelSize) -> u32 {
    if profile.width == 0 {
        return 0;
    }
    let inv_ratio = profile.height as f64 / profile.width as f64;
    (inv_ratio * (container.width / 2) as f64) as u32
}

/// Size of the top and bottom edge rows.
pub fn compute_edge_panel_size(container: PanelSize, profile: PanelSize) -> PanelSize {
    let screen_h = screen_height(container, profile);
    PanelSize::new(container.width, container.height.saturating_sub(screen_h) / 2)
}

/// Size of the half that shows the match frame.
pub fn compute_match_frame_panel_size(container: PanelSize, profile: PanelSize) -> PanelSize {
    PanelSize::new(container.width / 2, screen_height(container, profile))
}

/// Preferred sizes of the four sub-panels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelLayout {
    pub top: PanelSize,
    pub bottom: PanelSize,
    pub left: PanelSize,
    pub right: PanelSize,
}

impl Default for PanelLayout {
    fn default() -> Self {
        Self::collapsed()
    }
}

impl PanelLayout {
    pub const fn collapsed() -> Self {
        Self {
            top: PanelSize::MINIMAL,
            bottom: PanelSize::MINIMAL,
            left: PanelSize::MINIMAL,
            right: PanelSize::MINIMAL,
        }
    }

    /// Layout for `mode` inside `container`.
    pub fn for_mode(mode: TrimViewMode, container: PanelSize, profile: PanelSize) -> Self {
        let Some(match_side) = mode.match_side() else {
            return Self::collapsed();
        };
        let edge = compute_edge_panel_size(container, profile);
        let half = compute_match_frame_panel_size(container, profile);
        let (left, right) = match match_side {
            Side::Left => (half, PanelSize::MINIMAL),
            Side::Right => (PanelSize::MINIMAL, half),
        };
        Self {
            top: edge,
            bottom: edge,
            left,
            right,
        }
    }

    pub fn size(&self, panel: PanelId) -> PanelSize {
        match panel {
            PanelId::TopEdge => self.top,
            PanelId::BottomEdge => self.bottom,
            PanelId::LeftHalf => self.left,
            PanelId::RightHalf => self.right,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        *self == Self::collapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HD: PanelSize = PanelSize::new(1920, 1080);

    #[test]
    fn test_match_panel_is_half_width_at_project_aspect() {
        let size = compute_match_frame_panel_size(PanelSize::new(1000, 700), HD);
        assert_eq!(size, PanelSize::new(500, 281));
    }

    #[test]
    fn test_edge_rows_split_leftover_height() {
        let size = compute_edge_panel_size(PanelSize::new(1000, 700), HD);
        // 700 - 281 = 419, halved with truncation
        assert_eq!(size, PanelSize::new(1000, 209));
    }

    #[test]
    fn test_edge_rows_saturate_when_container_too_short() {
        let size = compute_edge_panel_size(PanelSize::new(1000, 100), HD);
        assert_eq!(size.height, 0);
    }

    #[test]
    fn test_zero_width_profile() {
        let size = compute_match_frame_panel_size(PanelSize::new(800, 600), PanelSize::new(0, 0));
        assert_eq!(size, PanelSize::new(400, 0));
    }

    #[test]
    fn test_layout_per_mode() {
        let container = PanelSize::new(1000, 700);
        let start = PanelLayout::for_mode(TrimViewMode::StartTrim, container, HD);
        assert_eq!(start.left, PanelSize::new(500, 281));
        assert_eq!(start.right, PanelSize::MINIMAL);
        assert_eq!(start.top, PanelSize::new(1000, 209));
        assert_eq!(start.bottom, start.top);

        let end = PanelLayout::for_mode(TrimViewMode::EndTrim, container, HD);
        assert_eq!(end.left, PanelSize::MINIMAL);
        assert_eq!(end.right, PanelSize::new(500, 281));

        assert!(PanelLayout::for_mode(TrimViewMode::Default, container, HD).is_collapsed());
    }
}
