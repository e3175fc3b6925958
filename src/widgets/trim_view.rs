//! egui adapter for `TrimMonitor`.
//!
//! Lays the four panels out around the live monitor area, executes the
//! renderer's paint ops and keeps the match frame uploaded as a texture
//! (re-uploaded only when the surface ticket changes).

use eframe::egui::{self, Align2, Color32, FontId, Pos2, Rect, Stroke, Vec2};
use log::trace;
use std::sync::Arc;

use crate::entities::{PanelId, PanelSize};
use crate::trim::{PaintOp, PanelLayout, TrimMonitor};

/// Screen rects of the panels and the live monitor area between the halves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelRects {
    pub top: Rect,
    pub bottom: Rect,
    pub left: Rect,
    pub right: Rect,
    pub live: Rect,
}

impl PanelRects {
    pub fn get(&self, panel: PanelId) -> Rect {
        match panel {
            PanelId::TopEdge => self.top,
            PanelId::BottomEdge => self.bottom,
            PanelId::LeftHalf => self.left,
            PanelId::RightHalf => self.right,
        }
    }
}

fn size_vec(size: PanelSize) -> Vec2 {
    Vec2::new(size.width as f32, size.height as f32)
}

/// Stack the rows inside `rect`: top edge, [left | live | right], bottom edge.
pub fn panel_rects(rect: Rect, layout: &PanelLayout) -> PanelRects {
    let top = Rect::from_min_size(rect.min, size_vec(layout.top));
    let bottom_h = layout.bottom.height as f32;
    let bottom = Rect::from_min_size(
        Pos2::new(rect.min.x, rect.max.y - bottom_h),
        size_vec(layout.bottom),
    );

    let mid_top = top.max.y;
    let left = Rect::from_min_size(Pos2::new(rect.min.x, mid_top), size_vec(layout.left));
    let right = Rect::from_min_size(
        Pos2::new(rect.max.x - layout.right.width as f32, mid_top),
        size_vec(layout.right),
    );
    let live = Rect::from_min_max(
        Pos2::new(left.max.x, mid_top),
        Pos2::new(right.min.x, bottom.min.y.max(mid_top)),
    );

    PanelRects {
        top,
        bottom,
        left,
        right,
        live,
    }
}

/// Widget state kept by the host between frames.
#[derive(Default)]
pub struct TrimView {
    texture: Option<(u64, egui::TextureHandle)>,
}

impl TrimView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wake the egui loop whenever a worker finishes a match frame.
    pub fn attach(ctx: &egui::Context, monitor: &TrimMonitor) {
        let ctx = ctx.clone();
        monitor
            .event_bus()
            .set_wake_hook(Some(Arc::new(move || ctx.request_repaint())));
    }

    /// Paint the trim monitor into the remaining space of `ui`.
    ///
    /// `live` paints the player's own picture into the area between halves.
    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        monitor: &mut TrimMonitor,
        live: impl FnOnce(&mut egui::Ui, Rect),
    ) -> egui::Response {
        let rect = ui.available_rect_before_wrap();
        let response = ui.allocate_rect(rect, egui::Sense::hover());

        monitor.on_container_resized(PanelSize::new(rect.width().max(1.0) as u32, rect.height().max(1.0) as u32));
        monitor.poll();
        let dirty = monitor.take_redraw();
        if !dirty.is_empty() {
            trace!("Trim view repaint {:?}", dirty);
        }
        self.sync_texture(ui.ctx(), monitor);

        let rects = panel_rects(rect, monitor.layout());
        let mut child = ui.new_child(egui::UiBuilder::new().max_rect(rects.live));
        live(&mut child, rects.live);

        let painter = ui.painter_at(rect);
        for panel in PanelId::ALL {
            let panel_rect = rects.get(panel);
            for op in monitor.paint_ops(panel) {
                self.execute(&painter, panel_rect.min, op);
            }
        }
        response
    }

    fn sync_texture(&mut self, ctx: &egui::Context, monitor: &TrimMonitor) {
        let Some(surface) = monitor.surface() else {
            self.texture = None;
            return;
        };
        if matches!(&self.texture, Some((ticket, _)) if *ticket == surface.ticket()) {
            return;
        }
        let size = [surface.width() as usize, surface.height() as usize];
        let image = egui::ColorImage::from_rgba_unmultiplied(size, surface.pixels());
        let handle = ctx.load_texture("trim_match_frame", image, egui::TextureOptions::LINEAR);
        trace!("Uploaded match frame texture ticket={}", surface.ticket());
        self.texture = Some((surface.ticket(), handle));
    }

    fn execute(&self, painter: &egui::Painter, origin: Pos2, op: PaintOp) {
        let offset = origin.to_vec2();
        match op {
            PaintOp::Fill { rect, color } => {
                painter.rect_filled(rect.translate(offset), 0.0, color);
            }
            PaintOp::Surface { rect } => {
                if let Some((_, texture)) = &self.texture {
                    let uv = Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0));
                    painter.image(texture.id(), rect.translate(offset), uv, Color32::WHITE);
                }
            }
            PaintOp::Text { pos, text, size, color } => {
                painter.text(pos + offset, Align2::LEFT_BOTTOM, text, FontId::monospace(size), color);
            }
            PaintOp::Polyline { points, width, color } => {
                let points = points.into_iter().map(|p| p + offset).collect();
                painter.add(egui::Shape::line(points, Stroke::new(width, color)));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::TrimViewMode;

    #[test]
    fn test_rows_stack_around_live_area() {
        let container = PanelSize::new(1000, 700);
        let layout = PanelLayout::for_mode(TrimViewMode::EndTrim, container, PanelSize::new(1920, 1080));
        let rect = Rect::from_min_size(Pos2::new(10.0, 20.0), Vec2::new(1000.0, 700.0));
        let rects = panel_rects(rect, &layout);

        assert_eq!(rects.top, Rect::from_min_size(Pos2::new(10.0, 20.0), Vec2::new(1000.0, 209.0)));
        assert_eq!(rects.bottom.min, Pos2::new(10.0, 511.0));
        assert_eq!(rects.right, Rect::from_min_size(Pos2::new(510.0, 229.0), Vec2::new(500.0, 281.0)));
        assert_eq!(rects.left.width(), 1.0);
        assert_eq!(rects.live.min, Pos2::new(11.0, 229.0));
        assert_eq!(rects.live.max, Pos2::new(510.0, 511.0));
    }

    #[test]
    fn test_collapsed_layout_gives_live_area_everything_but_edges() {
        let rect = Rect::from_min_size(Pos2::ZERO, Vec2::new(640.0, 360.0));
        let rects = panel_rects(rect, &PanelLayout::collapsed());
        assert_eq!(rects.live.min, Pos2::new(1.0, 1.0));
        assert_eq!(rects.live.max, Pos2::new(639.0, 359.0));
    }
}
