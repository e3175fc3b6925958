//! Trim view modes and the mutable view state they drive.
//!
//! **Used by**: `TrimMonitor` (mutates), renderer (reads)
//!
//! # Mode table
//!
//! | Mode | Match frame shown on | Boundary frame |
//! |---|---|---|
//! | StartTrim | left | clip out |
//! | EndTrim | right | clip in |
//! | RollRightActive | left | clip out |
//! | RollLeftActive | right | clip in |
//! | SlipRightActive | left | clip in |
//! | SlipLeftActive | right | clip out |
//!
//! The other half of the split shows the live monitor.

use serde::{Deserialize, Serialize};

use super::clip::MatchClip;

/// Which trim view is active. Exactly one at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TrimViewMode {
    #[default]
    Default,
    StartTrim,
    EndTrim,
    RollRightActive,
    RollLeftActive,
    SlipRightActive,
    SlipLeftActive,
}

/// Half of the split preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

/// Bottom-panel sub-renderer family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeFamily {
    SingleTrim,
    Roll,
    Slip,
}

/// Which end of the match clip supplies the match frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    In,
    Out,
}

impl TrimViewMode {
    pub const TRIM_MODES: [TrimViewMode; 6] = [
        TrimViewMode::StartTrim,
        TrimViewMode::EndTrim,
        TrimViewMode::RollRightActive,
        TrimViewMode::RollLeftActive,
        TrimViewMode::SlipRightActive,
        TrimViewMode::SlipLeftActive,
    ];

    pub fn is_default(self) -> bool {
        self == TrimViewMode::Default
    }

    /// Half that displays the match frame. `None` for `Default`.
    pub fn match_side(self) -> Option<Side> {
        match self {
            TrimViewMode::Default => None,
            TrimViewMode::StartTrim
            | TrimViewMode::RollRightActive
            | TrimViewMode::SlipRightActive => Some(Side::Left),
            TrimViewMode::EndTrim
            | TrimViewMode::RollLeftActive
            | TrimViewMode::SlipLeftActive => Some(Side::Right),
        }
    }

    /// Half that shows the live monitor, i.e. the edit side.
    pub fn edit_side(self) -> Option<Side> {
        self.match_side().map(Side::opposite)
    }

    pub fn family(self) -> Option<ModeFamily> {
        match self {
            TrimViewMode::Default => None,
            TrimViewMode::StartTrim | TrimViewMode::EndTrim => Some(ModeFamily::SingleTrim),
            TrimViewMode::RollRightActive | TrimViewMode::RollLeftActive => Some(ModeFamily::Roll),
            TrimViewMode::SlipRightActive | TrimViewMode::SlipLeftActive => Some(ModeFamily::Slip),
        }
    }

    pub fn boundary(self) -> Option<Boundary> {
        match self {
            TrimViewMode::Default => None,
            TrimViewMode::StartTrim
            | TrimViewMode::RollRightActive
            | TrimViewMode::SlipLeftActive => Some(Boundary::Out),
            TrimViewMode::EndTrim
            | TrimViewMode::RollLeftActive
            | TrimViewMode::SlipRightActive => Some(Boundary::In),
        }
    }

    /// Modes where the user drags continuously and the decode handle is kept.
    pub fn is_continuous(self) -> bool {
        matches!(self.family(), Some(ModeFamily::Roll | ModeFamily::Slip))
    }

    pub fn is_slip(self) -> bool {
        self.family() == Some(ModeFamily::Slip)
    }

    pub fn label(self) -> &'static str {
        match self {
            TrimViewMode::Default => "Default",
            TrimViewMode::StartTrim => "Start Trim",
            TrimViewMode::EndTrim => "End Trim",
            TrimViewMode::RollRightActive => "Roll (right active)",
            TrimViewMode::RollLeftActive => "Roll (left active)",
            TrimViewMode::SlipRightActive => "Slip (right active)",
            TrimViewMode::SlipLeftActive => "Slip (left active)",
        }
    }
}

/// Numeric state shown by the trim overlays.
///
/// All frame values are optional: absent means "not known yet" and the
/// corresponding overlay is not drawn.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    pub mode: TrimViewMode,
    /// Frame on the match clip's source media
    pub match_frame: Option<i64>,
    /// Edit point position on the timeline
    pub edit_timeline_frame: Option<i64>,
    /// Signed drag offset
    pub edit_delta: Option<i64>,
    pub edit_clip_start_on_timeline: Option<i64>,
    /// Total media length of the slipped clip
    pub slip_clip_length: Option<i64>,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply an accepted transition into a trim mode.
    ///
    /// Returns the match frame to extract, if any.
    pub fn enter(
        &mut self,
        mode: TrimViewMode,
        match_clip: Option<&MatchClip>,
        edit_clip_start: i64,
        slip_clip_length: Option<i64>,
    ) -> Option<i64> {
        self.mode = mode;
        self.edit_clip_start_on_timeline = Some(edit_clip_start);
        self.edit_timeline_frame = None;
        self.slip_clip_length = if mode.is_slip() { slip_clip_length } else { None };

        let match_frame = match (match_clip, mode.boundary()) {
            (Some(clip), Some(boundary)) => Some(clip.boundary_frame(boundary)),
            _ => None,
        };
        self.match_frame = match_frame;
        self.edit_delta = if mode.is_continuous() && match_frame.is_some() {
            Some(0)
        } else {
            None
        };
        match_frame
    }

    /// Record a drag offset. Roll and slip modes keep it paired with the
    /// match frame, so with no match frame there it stays absent.
    pub fn set_edit_delta(&mut self, delta: i64) {
        if self.mode.is_continuous() && self.match_frame.is_none() {
            return;
        }
        self.edit_delta = Some(delta);
    }

    /// Reset to `Default`, dropping every trim value.
    pub fn reset(&mut self) {
        *self = ViewState::default();
    }

    /// Frame the continuous refresh should decode: match frame shifted by the
    /// drag delta, kept inside the media.
    pub fn refresh_target(&self) -> Option<i64> {
        let frame = self.match_frame? + self.edit_delta.unwrap_or(0);
        let frame = match (self.mode.is_slip(), self.slip_clip_length) {
            (true, Some(len)) if len > 0 => frame.min(len - 1),
            _ => frame,
        };
        Some(frame.max(0))
    }

    /// Source frame printed as the match-side timecode.
    ///
    /// Single trims show the boundary as-is, rolls add the delta and slips
    /// additionally clamp into `[0, slip_clip_length)`.
    pub fn display_match_frame(&self) -> Option<i64> {
        let match_frame = self.match_frame?;
        match self.mode.family()? {
            ModeFamily::SingleTrim => Some(match_frame),
            ModeFamily::Roll => Some(match_frame + self.edit_delta.unwrap_or(0)),
            ModeFamily::Slip => {
                let mut frame = match_frame + self.edit_delta.unwrap_or(0);
                if frame < 0 {
                    frame = 0;
                }
                if let Some(len) = self.slip_clip_length
                    && frame >= len
                {
                    frame = len - 1;
                }
                Some(frame.max(0))
            }
        }
    }

    /// Clip-relative frame printed as the edit-side timecode.
    /// Needs both the timeline frame and the clip start; negatives clamp to 0.
    pub fn display_edit_frame(&self) -> Option<i64> {
        let tline = self.edit_timeline_frame?;
        let start = self.edit_clip_start_on_timeline?;
        Some((tline - start).max(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn clip(clip_in: i64, clip_out: i64) -> MatchClip {
        MatchClip::new(PathBuf::from("/media/a.mov"), clip_in, clip_out)
    }

    #[test]
    fn test_exactly_one_half_per_trim_mode() {
        for mode in TrimViewMode::TRIM_MODES {
            let side = mode.match_side().unwrap();
            assert_eq!(mode.edit_side(), Some(side.opposite()));
        }
        assert_eq!(TrimViewMode::Default.match_side(), None);
    }

    #[test]
    fn test_boundary_table() {
        use Boundary::*;
        assert_eq!(TrimViewMode::StartTrim.boundary(), Some(Out));
        assert_eq!(TrimViewMode::EndTrim.boundary(), Some(In));
        assert_eq!(TrimViewMode::RollRightActive.boundary(), Some(Out));
        assert_eq!(TrimViewMode::RollLeftActive.boundary(), Some(In));
        assert_eq!(TrimViewMode::SlipRightActive.boundary(), Some(In));
        assert_eq!(TrimViewMode::SlipLeftActive.boundary(), Some(Out));
    }

    #[test]
    fn test_continuous_modes() {
        assert!(!TrimViewMode::StartTrim.is_continuous());
        assert!(!TrimViewMode::EndTrim.is_continuous());
        assert!(TrimViewMode::RollLeftActive.is_continuous());
        assert!(TrimViewMode::SlipRightActive.is_continuous());
    }

    #[test]
    fn test_enter_roll_pairs_delta_with_match_frame() {
        let mut state = ViewState::new();
        let frame = state.enter(TrimViewMode::RollRightActive, Some(&clip(10, 80)), 5, None);
        assert_eq!(frame, Some(80));
        assert_eq!(state.edit_delta, Some(0));

        let frame = state.enter(TrimViewMode::RollLeftActive, None, 5, None);
        assert_eq!(frame, None);
        assert_eq!(state.match_frame, None);
        assert_eq!(state.edit_delta, None);
    }

    #[test]
    fn test_drag_delta_needs_match_frame_in_continuous_modes() {
        let mut state = ViewState::new();
        state.enter(TrimViewMode::RollLeftActive, None, 0, None);
        state.set_edit_delta(4);
        assert_eq!(state.edit_delta, None);

        state.enter(TrimViewMode::SlipLeftActive, Some(&clip(10, 50)), 0, Some(100));
        state.set_edit_delta(4);
        assert_eq!(state.edit_delta, Some(4));

        // Single trims carry the delta for the edit overlay alone
        state.enter(TrimViewMode::StartTrim, None, 0, None);
        state.set_edit_delta(-2);
        assert_eq!(state.edit_delta, Some(-2));
    }

    #[test]
    fn test_slip_right_clamps_low() {
        let mut state = ViewState::new();
        state.enter(TrimViewMode::SlipRightActive, Some(&clip(30, 200)), 0, Some(300));
        state.edit_delta = Some(-40);
        assert_eq!(state.display_match_frame(), Some(0));
    }

    #[test]
    fn test_slip_left_clamps_high() {
        let mut state = ViewState::new();
        state.enter(TrimViewMode::SlipLeftActive, Some(&clip(10, 290)), 0, Some(300));
        state.edit_delta = Some(50);
        assert_eq!(state.display_match_frame(), Some(299));
    }

    #[test]
    fn test_roll_adds_delta_without_clamp_to_length() {
        let mut state = ViewState::new();
        state.enter(TrimViewMode::RollLeftActive, Some(&clip(100, 400)), 0, None);
        state.edit_delta = Some(-7);
        assert_eq!(state.display_match_frame(), Some(93));
    }

    #[test]
    fn test_edit_frame_needs_both_values() {
        let mut state = ViewState::new();
        state.enter(TrimViewMode::StartTrim, None, 50, None);
        assert_eq!(state.display_edit_frame(), None);
        state.edit_timeline_frame = Some(75);
        assert_eq!(state.display_edit_frame(), Some(25));
        state.edit_timeline_frame = Some(40);
        assert_eq!(state.display_edit_frame(), Some(0));
    }

    #[test]
    fn test_refresh_target_clamped_for_slip() {
        let mut state = ViewState::new();
        state.enter(TrimViewMode::SlipLeftActive, Some(&clip(0, 290)), 0, Some(300));
        state.edit_delta = Some(25);
        assert_eq!(state.refresh_target(), Some(299));
        state.edit_delta = Some(-400);
        assert_eq!(state.refresh_target(), Some(0));
    }
}
