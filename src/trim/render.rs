//! Trim overlay renderer.
//!
//! Pure: view state + surface presence + panel size in, paint ops out. Ops are
//! in panel-local coordinates (origin at the panel's top-left); the egui
//! adapter translates and executes them.

use eframe::egui::{Color32, Pos2, Rect, Vec2};

use crate::entities::{frames_to_timecode, PanelId, PanelSize, Side, TrimViewMode, ViewState};

pub const BACKGROUND: Color32 = Color32::BLACK;
/// Bar marking the half the user is editing
pub const INDICATOR_COLOR: Color32 = Color32::from_rgb(71, 131, 169);
pub const TEXT_COLOR: Color32 = Color32::from_gray(230);
pub const RANGE_MARK_COLOR: Color32 = Color32::from_rgb(166, 166, 179);

pub const INDICATOR_HEIGHT: f32 = 4.0;
pub const FONT_SIZE: f32 = 21.0;
pub const RANGE_MARK_WIDTH: f32 = 4.0;

const TC_BASELINE: f32 = 27.0;
const DELTA_BASELINE: f32 = TC_BASELINE + 30.0;
const TC_LEFT_SIDE_PAD: f32 = 172.0;
const TC_RIGHT_SIDE_PAD: f32 = 28.0;
/// Monospace advance at `FONT_SIZE`, used to right-align the delta
const CHAR_WIDTH: f32 = 12.0;
const RANGE_MARK_Y: f32 = 14.0;

#[derive(Debug, Clone, PartialEq)]
pub enum PaintOp {
    Fill { rect: Rect, color: Color32 },
    /// Current match-frame surface stretched over `rect`
    Surface { rect: Rect },
    /// Monospace text; `pos` is the left end of the baseline
    Text {
        pos: Pos2,
        text: String,
        size: f32,
        color: Color32,
    },
    Polyline {
        points: Vec<Pos2>,
        width: f32,
        color: Color32,
    },
}

/// What the renderer reads.
#[derive(Debug, Clone, Copy)]
pub struct RenderView<'a> {
    pub state: &'a ViewState,
    pub has_surface: bool,
    /// Project frame rate for timecodes
    pub fps: f64,
}

/// Paint ops for one panel.
pub fn paint_panel(panel: PanelId, size: PanelSize, view: RenderView<'_>) -> Vec<PaintOp> {
    let mut ops = Vec::new();
    match panel {
        PanelId::LeftHalf => paint_half(&mut ops, Side::Left, size, view),
        PanelId::RightHalf => paint_half(&mut ops, Side::Right, size, view),
        PanelId::TopEdge => paint_top(&mut ops, size, view),
        PanelId::BottomEdge => paint_bottom(&mut ops, size, view),
    }
    ops
}

fn full_rect(size: PanelSize) -> Rect {
    Rect::from_min_size(Pos2::ZERO, Vec2::new(size.width as f32, size.height as f32))
}

fn rect(x: f32, y: f32, w: f32, h: f32) -> Rect {
    Rect::from_min_size(Pos2::new(x, y), Vec2::new(w, h))
}

fn paint_half(ops: &mut Vec<PaintOp>, side: Side, size: PanelSize, view: RenderView<'_>) {
    // The other half is the live monitor
    if view.state.mode.match_side() != Some(side) {
        return;
    }
    if view.has_surface {
        ops.push(PaintOp::Surface { rect: full_rect(size) });
    } else {
        ops.push(PaintOp::Fill {
            rect: full_rect(size),
            color: BACKGROUND,
        });
    }
}

fn paint_top(ops: &mut Vec<PaintOp>, size: PanelSize, view: RenderView<'_>) {
    ops.push(PaintOp::Fill {
        rect: full_rect(size),
        color: BACKGROUND,
    });

    let half = (size.width / 2) as f32;
    let bar_y = size.height as f32 - INDICATOR_HEIGHT;
    let bar = match view.state.mode {
        TrimViewMode::StartTrim => rect(half, bar_y, half, INDICATOR_HEIGHT),
        TrimViewMode::EndTrim => rect(0.0, bar_y, half, INDICATOR_HEIGHT),
        _ => return,
    };
    ops.push(PaintOp::Fill {
        rect: bar,
        color: INDICATOR_COLOR,
    });
}

fn paint_bottom(ops: &mut Vec<PaintOp>, size: PanelSize, view: RenderView<'_>) {
    ops.push(PaintOp::Fill {
        rect: full_rect(size),
        color: BACKGROUND,
    });

    // Collapsed
    if size.is_minimal() {
        return;
    }
    let state = view.state;
    let Some(edit_side) = state.mode.edit_side() else {
        return;
    };

    let half = (size.width / 2) as f32;
    let delta_text = state.edit_delta.map(|d| d.to_string());

    let (bar, match_tc_x, edit_tc_x, delta_x) = match edit_side {
        Side::Right => (
            rect(half, 0.0, half, INDICATOR_HEIGHT),
            half - TC_LEFT_SIDE_PAD,
            half + TC_RIGHT_SIDE_PAD,
            half + 8.0,
        ),
        Side::Left => {
            let extra_digits = delta_text.as_ref().map_or(0, |t| t.len().saturating_sub(1));
            (
                rect(0.0, 0.0, half, INDICATOR_HEIGHT),
                half + TC_RIGHT_SIDE_PAD,
                half - TC_LEFT_SIDE_PAD,
                half - 20.0 - extra_digits as f32 * CHAR_WIDTH,
            )
        }
    };
    ops.push(PaintOp::Fill {
        rect: bar,
        color: INDICATOR_COLOR,
    });

    if let Some(frame) = state.display_match_frame() {
        ops.push(text(match_tc_x, TC_BASELINE, frames_to_timecode(frame, view.fps)));
    }
    if let Some(frame) = state.display_edit_frame() {
        ops.push(text(edit_tc_x, TC_BASELINE, frames_to_timecode(frame, view.fps)));
    }
    if let Some(delta) = delta_text {
        ops.push(text(delta_x, DELTA_BASELINE, delta));
    }

    ops.push(range_mark(half - 10.0, RANGE_MARK_Y, -1.0));
    ops.push(range_mark(half + 10.0, RANGE_MARK_Y, 1.0));
}

fn text(x: f32, y: f32, text: String) -> PaintOp {
    PaintOp::Text {
        pos: Pos2::new(x, y),
        text,
        size: FONT_SIZE,
        color: TEXT_COLOR,
    }
}

/// Bracket glyph opening towards `dir` (-1 left, +1 right).
fn range_mark(x: f32, y: f32, dir: f32) -> PaintOp {
    PaintOp::Polyline {
        points: vec![
            Pos2::new(x + 8.0 * dir, y),
            Pos2::new(x, y),
            Pos2::new(x, y + 10.0),
            Pos2::new(x + 8.0 * dir, y + 10.0),
        ],
        width: RANGE_MARK_WIDTH,
        color: RANGE_MARK_COLOR,
    }
}
