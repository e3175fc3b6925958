//! Trim monitor: the view-state machine that drives layout, extraction and
//! repaint requests.
//!
//! **Thread model**: every method here runs on the foreground thread. Worker
//! jobs only touch the shared surface/playback caches and post events;
//! `poll()` turns those events into repaint requests.
//!
//! # Usage
//!
//! ```ignore
//! let mut monitor = TrimMonitor::new(engine, pool, player, profile, settings, scratch_dir);
//! monitor.on_container_resized(PanelSize::new(1280, 720));
//! monitor.set_start_trim_view(Some(&clip), edit_clip_start);
//! // each frame:
//! monitor.poll();
//! let dirty = monitor.take_redraw();
//! ```

use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::extractor::{remove_scratch, ExtractionJob, FrameExtractor};
use super::layout::{compute_match_frame_panel_size, PanelLayout};
use super::playback_cache::PlaybackCache;
use super::render::{paint_panel, PaintOp, RenderView};
use super::surface_cache::SurfaceCache;
use super::trim_events::{MatchFrameFailedEvent, MatchFrameReadyEvent};
use crate::config::{TrimViewSettings, MATCH_FRAME};
use crate::core::{downcast_event, EventBus, WorkerPool};
use crate::engine::DecodeEngine;
use crate::entities::{MatchClip, MatchFrameSurface, PanelId, PanelMask, PanelSize, TrimViewMode, ViewState};

/// Player/monitor the trim view sits on top of.
pub trait PlayerLink: Send + Sync {
    /// True while an export/render owns the decode pipeline
    fn is_rendering(&self) -> bool;
    /// Re-show the player's current frame
    fn refresh(&self);
}

/// Project settings the trim view reads.
pub trait ProjectProfile: Send + Sync {
    fn frame_width(&self) -> u32;
    fn frame_height(&self) -> u32;
    fn fps(&self) -> f64;
    /// Full length of a media file in frames, if known
    fn media_length(&self, path: &Path) -> Option<i64>;

    fn frame_size(&self) -> PanelSize {
        PanelSize::new(self.frame_width(), self.frame_height())
    }
}

pub struct TrimMonitor {
    state: ViewState,
    layout: PanelLayout,
    container: PanelSize,
    settings: TrimViewSettings,
    scratch: PathBuf,
    surfaces: Arc<SurfaceCache>,
    playback: Arc<PlaybackCache>,
    extractor: FrameExtractor,
    pool: Arc<dyn WorkerPool>,
    bus: EventBus,
    player: Arc<dyn PlayerLink>,
    profile: Arc<dyn ProjectProfile>,
    redraw: PanelMask,
}

impl TrimMonitor {
    pub fn new(
        engine: Arc<dyn DecodeEngine>,
        pool: Arc<dyn WorkerPool>,
        player: Arc<dyn PlayerLink>,
        profile: Arc<dyn ProjectProfile>,
        settings: TrimViewSettings,
        scratch_dir: PathBuf,
    ) -> Self {
        let bus = EventBus::new();
        let surfaces = Arc::new(SurfaceCache::new());
        let playback = Arc::new(PlaybackCache::new());
        let extractor = FrameExtractor::new(engine, Arc::clone(&surfaces), Arc::clone(&playback), bus.emitter())
            .with_polling(settings.poll_interval(), settings.poll_timeout());

        Self {
            state: ViewState::new(),
            layout: PanelLayout::collapsed(),
            container: PanelSize::MINIMAL,
            settings,
            scratch: scratch_dir.join(MATCH_FRAME),
            surfaces,
            playback,
            extractor,
            pool,
            bus,
            player,
            profile,
            redraw: PanelMask::NONE,
        }
    }

    // ------------------------------------------------------------ view type

    /// Leave trim mode: drop the match frame and collapse every panel.
    pub fn set_default_view(&mut self) {
        if self.state.mode.is_default() {
            return;
        }
        // Refreshing mid-render would overwrite the render's output
        if self.player.is_rendering() {
            debug!("Default view refused: render in progress");
            return;
        }

        if let Err(e) = remove_scratch(&self.scratch) {
            warn!("Failed to remove {}: {}", self.scratch.display(), e);
        }
        self.surfaces.invalidate();
        self.state.reset();
        self.apply_layout();
        self.redraw.insert(PanelMask::ALL);
        self.player.refresh();
        self.playback.clear();
        info!("Trim view: Default");
    }

    pub fn set_start_trim_view(&mut self, match_clip: Option<&MatchClip>, edit_clip_start: i64) {
        self.enter_trim(TrimViewMode::StartTrim, match_clip, edit_clip_start);
    }

    pub fn set_end_trim_view(&mut self, match_clip: Option<&MatchClip>, edit_clip_start: i64) {
        self.enter_trim(TrimViewMode::EndTrim, match_clip, edit_clip_start);
    }

    pub fn set_roll_trim_right_active_view(&mut self, match_clip: Option<&MatchClip>, edit_clip_start: i64) {
        self.enter_trim(TrimViewMode::RollRightActive, match_clip, edit_clip_start);
    }

    pub fn set_roll_trim_left_active_view(&mut self, match_clip: Option<&MatchClip>, edit_clip_start: i64) {
        self.enter_trim(TrimViewMode::RollLeftActive, match_clip, edit_clip_start);
    }

    pub fn set_slip_trim_right_active_view(&mut self, match_clip: Option<&MatchClip>, edit_clip_start: i64) {
        self.enter_trim(TrimViewMode::SlipRightActive, match_clip, edit_clip_start);
    }

    pub fn set_slip_trim_left_active_view(&mut self, match_clip: Option<&MatchClip>, edit_clip_start: i64) {
        self.enter_trim(TrimViewMode::SlipLeftActive, match_clip, edit_clip_start);
    }

    /// Dispatch to the transition for `mode`.
    pub fn set_view(&mut self, mode: TrimViewMode, match_clip: Option<&MatchClip>, edit_clip_start: i64) {
        match mode {
            TrimViewMode::Default => self.set_default_view(),
            _ => self.enter_trim(mode, match_clip, edit_clip_start),
        }
    }

    fn enter_trim(&mut self, mode: TrimViewMode, match_clip: Option<&MatchClip>, edit_clip_start: i64) {
        if !self.settings.show_trim_view {
            return;
        }
        if self.player.is_rendering() {
            debug!("{} refused: render in progress", mode.label());
            return;
        }

        let slip_len = if mode.is_slip() {
            match_clip.and_then(|clip| self.profile.media_length(clip.path()))
        } else {
            None
        };

        self.surfaces.invalidate();
        self.playback.clear();
        let match_frame = self.state.enter(mode, match_clip, edit_clip_start, slip_len);
        self.apply_layout();
        self.redraw.insert(PanelMask::ALL);
        self.player.refresh();

        let (Some(clip), Some(frame)) = (match_clip, match_frame) else {
            info!("Trim view: {} (no match clip)", mode.label());
            return;
        };
        info!("Trim view: {} match frame {} of {}", mode.label(), frame, clip.path().display());

        let job = ExtractionJob {
            source: clip.path.clone(),
            frame,
            target: self.scratch.clone(),
            mode,
            render_size: self.profile.frame_size(),
            ticket: self.surfaces.issue_ticket(),
        };
        self.extractor.schedule(self.pool.as_ref(), job);
    }

    // ------------------------------------------------------------ drag updates

    pub fn set_edit_tline_frame(&mut self, edit_tline_frame: i64, edit_delta: i64) {
        if !self.settings.show_trim_view {
            return;
        }
        self.state.edit_timeline_frame = Some(edit_tline_frame);
        self.state.set_edit_delta(edit_delta);
        self.redraw.insert(PanelMask::BOTTOM);
    }

    pub fn set_slip_edit_tline_frame(&mut self, clip: &MatchClip, edit_delta: i64) {
        if !self.settings.show_trim_view {
            return;
        }
        let base = if self.state.mode == TrimViewMode::SlipRightActive {
            clip.clip_out
        } else {
            clip.clip_in
        };
        self.state.edit_timeline_frame = Some(base + edit_delta);
        self.state.set_edit_delta(edit_delta);
        self.redraw.insert(PanelMask::BOTTOM);
    }

    /// Commit a one-sided trim drag.
    pub fn one_roll_mouse_release(&mut self, edit_tline_frame: i64, edit_delta: i64) {
        if !self.settings.show_trim_view {
            return;
        }
        self.state.edit_timeline_frame = Some(edit_tline_frame);
        // Start trims move the clip start, so the edit timecode base shifts
        if self.state.mode == TrimViewMode::StartTrim {
            self.state.edit_clip_start_on_timeline = self.state.edit_clip_start_on_timeline.map(|s| s - edit_delta);
        }
        self.state.edit_delta = None;
        self.redraw.insert(PanelMask::BOTTOM);
    }

    /// Re-decode the match frame at `match_frame + delta` from the bound handle.
    pub fn update_roll_match_frame(&mut self) {
        if !self.settings.show_trim_view {
            return;
        }
        let Some(frame) = self.state.refresh_target() else {
            return;
        };
        if !self.playback.is_bound() {
            debug!("Continuous refresh of frame {} skipped: no decode handle", frame);
            return;
        }
        let ticket = self.surfaces.issue_ticket();
        self.extractor.schedule_refresh(self.pool.as_ref(), frame, ticket);
    }

    // ------------------------------------------------------------ layout

    pub fn on_container_resized(&mut self, size: PanelSize) {
        if size == self.container {
            return;
        }
        self.container = size;
        let before = self.layout;
        self.apply_layout();
        if self.layout != before {
            self.redraw.insert(PanelMask::ALL);
        }
    }

    fn apply_layout(&mut self) {
        let profile = self.profile.frame_size();
        self.layout = PanelLayout::for_mode(self.state.mode, self.container, profile);
        self.surfaces.set_target(compute_match_frame_panel_size(self.container, profile));
    }

    // ------------------------------------------------------------ foreground loop

    /// Drain job events. Returns true if anything arrived.
    pub fn poll(&mut self) -> bool {
        let events = self.bus.poll();
        let any = !events.is_empty();
        for event in events {
            if let Some(e) = downcast_event::<MatchFrameReadyEvent>(&event) {
                debug!("Match frame ticket {} ready", e.ticket);
                self.redraw.insert(PanelMask::HALVES);
            } else if let Some(e) = downcast_event::<MatchFrameFailedEvent>(&event) {
                debug!("Match frame ticket {} failed: {}", e.ticket, e.error);
            }
        }
        any
    }

    /// Panels marked dirty since the last call.
    pub fn take_redraw(&mut self) -> PanelMask {
        std::mem::take(&mut self.redraw)
    }

    pub fn paint_ops(&self, panel: PanelId) -> Vec<PaintOp> {
        let view = RenderView {
            state: &self.state,
            has_surface: self.surfaces.has_surface(),
            fps: self.profile.fps(),
        };
        paint_panel(panel, self.layout.size(panel), view)
    }

    // ------------------------------------------------------------ accessors

    pub fn set_show_trim_view(&mut self, show: bool) {
        self.settings.show_trim_view = show;
    }

    pub fn show_trim_view(&self) -> bool {
        self.settings.show_trim_view
    }

    pub fn mode(&self) -> TrimViewMode {
        self.state.mode
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn layout(&self) -> &PanelLayout {
        &self.layout
    }

    pub fn container(&self) -> PanelSize {
        self.container
    }

    pub fn surface(&self) -> Option<Arc<MatchFrameSurface>> {
        self.surfaces.current()
    }

    pub fn scratch_path(&self) -> &Path {
        &self.scratch
    }

    /// Bus that job completions arrive on; hosts attach their wake hook here.
    pub fn event_bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn has_decode_handle(&self) -> bool {
        self.playback.is_bound()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Producer, RawFrame, ScratchFormat};
    use crate::entities::surface::{from_engine_pixels, to_engine_pixels};
    use crate::error::TrimResult;
    use image::{Rgba, RgbaImage};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    type Job = Box<dyn FnOnce() + Send + 'static>;

    /// Holds jobs until the test runs them.
    #[derive(Default)]
    struct QueuePool {
        jobs: Mutex<Vec<Job>>,
    }

    impl QueuePool {
        fn len(&self) -> usize {
            self.jobs.lock().unwrap().len()
        }

        fn run_all(&self) {
            let jobs = std::mem::take(&mut *self.jobs.lock().unwrap());
            for job in jobs {
                job();
            }
        }

        fn run_last_first(&self) {
            let jobs = std::mem::take(&mut *self.jobs.lock().unwrap());
            for job in jobs.into_iter().rev() {
                job();
            }
        }
    }

    impl WorkerPool for QueuePool {
        fn execute_boxed(&self, job: Job) {
            self.jobs.lock().unwrap().push(job);
        }
    }

    #[derive(Default)]
    struct FakePlayer {
        rendering: AtomicBool,
        refreshes: AtomicUsize,
    }

    impl PlayerLink for FakePlayer {
        fn is_rendering(&self) -> bool {
            self.rendering.load(Ordering::SeqCst)
        }
        fn refresh(&self) {
            self.refreshes.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct FakeProfile {
        lengths: HashMap<PathBuf, i64>,
    }

    impl ProjectProfile for FakeProfile {
        fn frame_width(&self) -> u32 {
            1920
        }
        fn frame_height(&self) -> u32 {
            1080
        }
        fn fps(&self) -> f64 {
            25.0
        }
        fn media_length(&self, path: &Path) -> Option<i64> {
            self.lengths.get(path).copied()
        }
    }

    /// Records opens and cuts; frame `n` decodes to gray level `n % 256`.
    #[derive(Default)]
    struct FakeEngine {
        opened: Mutex<Vec<PathBuf>>,
        cuts: Arc<Mutex<Vec<i64>>>,
    }

    struct FakeProducer {
        path: PathBuf,
        offset: i64,
        cuts: Arc<Mutex<Vec<i64>>>,
    }

    impl Producer for FakeProducer {
        fn path(&self) -> &Path {
            &self.path
        }
        fn length(&self) -> i64 {
            10_000
        }
        fn cut(&self, in_frame: i64, _out_frame: i64) -> TrimResult<Arc<dyn Producer>> {
            self.cuts.lock().unwrap().push(self.offset + in_frame);
            Ok(Arc::new(FakeProducer {
                path: self.path.clone(),
                offset: self.offset + in_frame,
                cuts: Arc::clone(&self.cuts),
            }))
        }
        fn get_frame(&self, width: u32, height: u32) -> TrimResult<RawFrame> {
            let level = (self.offset % 256) as u8;
            let img = RgbaImage::from_pixel(width, height, Rgba([level, level, level, 255]));
            Ok(RawFrame {
                data: to_engine_pixels(&img),
                width,
                height,
            })
        }
    }

    impl DecodeEngine for FakeEngine {
        fn open_producer(&self, path: &Path) -> TrimResult<Arc<dyn Producer>> {
            self.opened.lock().unwrap().push(path.to_path_buf());
            Ok(Arc::new(FakeProducer {
                path: path.to_path_buf(),
                offset: 0,
                cuts: Arc::clone(&self.cuts),
            }))
        }

        fn render(&self, producer: &dyn Producer, output: &Path, _format: ScratchFormat, size: PanelSize) -> TrimResult<()> {
            // Small render keeps tests quick; the cache rescales anyway
            let small = PanelSize::new(size.width / 40, size.height / 40);
            let frame = producer.get_frame(small.width, small.height)?;
            from_engine_pixels(&frame.data, frame.width, frame.height)?.save(output)?;
            Ok(())
        }
    }

    struct Harness {
        monitor: TrimMonitor,
        pool: Arc<QueuePool>,
        player: Arc<FakePlayer>,
        engine: Arc<FakeEngine>,
        dir: PathBuf,
    }

    impl Drop for Harness {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.dir);
        }
    }

    const P: &str = "/media/p.mov";

    fn harness(tag: &str) -> Harness {
        let dir = std::env::temp_dir().join(format!("trimview-monitor-{}-{}", tag, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);

        let pool = Arc::new(QueuePool::default());
        let player = Arc::new(FakePlayer::default());
        let engine = Arc::new(FakeEngine::default());
        let profile = Arc::new(FakeProfile {
            lengths: HashMap::from([(PathBuf::from(P), 300)]),
        });
        let settings = TrimViewSettings {
            poll_interval_ms: 1,
            poll_timeout_ms: Some(2000),
            ..Default::default()
        };
        let mut monitor = TrimMonitor::new(
            engine.clone(),
            pool.clone(),
            player.clone(),
            profile,
            settings,
            dir.join("trim_view"),
        );
        monitor.on_container_resized(PanelSize::new(1000, 700));
        monitor.take_redraw();
        Harness {
            monitor,
            pool,
            player,
            engine,
            dir,
        }
    }

    fn clip(clip_in: i64, clip_out: i64) -> MatchClip {
        MatchClip::new(P, clip_in, clip_out)
    }

    fn refreshes(h: &Harness) -> usize {
        h.player.refreshes.load(Ordering::SeqCst)
    }

    #[test]
    fn test_start_trim_extracts_clip_out() {
        let mut h = harness("start");
        h.monitor.set_start_trim_view(Some(&clip(10, 120)), 50);

        assert_eq!(h.monitor.mode(), TrimViewMode::StartTrim);
        assert_eq!(h.monitor.state().match_frame, Some(120));
        assert_eq!(h.monitor.state().edit_clip_start_on_timeline, Some(50));
        assert_eq!(h.monitor.layout().left, PanelSize::new(500, 281));
        assert_eq!(h.monitor.layout().right, PanelSize::MINIMAL);
        assert_eq!(h.monitor.take_redraw(), PanelMask::ALL);
        assert_eq!(refreshes(&h), 1);
        assert_eq!(h.pool.len(), 1);

        h.pool.run_all();
        assert_eq!(*h.engine.opened.lock().unwrap(), vec![PathBuf::from(P)]);
        assert_eq!(*h.engine.cuts.lock().unwrap(), vec![120]);
        // Single trims don't keep the handle
        assert!(!h.monitor.has_decode_handle());

        assert!(h.monitor.poll());
        assert_eq!(h.monitor.take_redraw(), PanelMask::HALVES);
        let surface = h.monitor.surface().unwrap();
        assert_eq!(surface.size(), PanelSize::new(500, 281));
        assert_eq!(surface.image().get_pixel(0, 0).0, [120, 120, 120, 255]);
    }

    #[test]
    fn test_transitions_without_clip_schedule_nothing() {
        let mut h = harness("noclip");
        for mode in TrimViewMode::TRIM_MODES {
            h.monitor.set_view(mode, None, 0);
            assert_eq!(h.monitor.mode(), mode);
            assert_eq!(h.monitor.state().match_frame, None);
            assert_eq!(h.monitor.state().edit_delta, None);
        }
        assert_eq!(h.pool.len(), 0);
        assert_eq!(h.monitor.layout().right, PanelSize::new(500, 281));
    }

    #[test]
    fn test_transitions_refused_while_rendering() {
        let mut h = harness("rendering");
        h.player.rendering.store(true, Ordering::SeqCst);
        for mode in TrimViewMode::TRIM_MODES {
            h.monitor.set_view(mode, Some(&clip(0, 10)), 0);
        }
        assert_eq!(h.monitor.state(), &ViewState::new());
        assert!(h.monitor.layout().is_collapsed());
        assert_eq!(h.pool.len(), 0);
        assert_eq!(refreshes(&h), 0);
        assert!(h.monitor.take_redraw().is_empty());
    }

    #[test]
    fn test_disabled_trim_view_ignores_everything() {
        let mut h = harness("disabled");
        h.monitor.set_show_trim_view(false);
        h.monitor.set_end_trim_view(Some(&clip(0, 10)), 0);
        h.monitor.set_edit_tline_frame(5, 1);
        h.monitor.one_roll_mouse_release(5, 1);
        h.monitor.update_roll_match_frame();
        assert_eq!(h.monitor.state(), &ViewState::new());
        assert_eq!(h.pool.len(), 0);
        assert!(h.monitor.take_redraw().is_empty());
    }

    #[test]
    fn test_default_refused_while_rendering_keeps_scratch() {
        let mut h = harness("default-render");
        h.monitor.set_end_trim_view(Some(&clip(40, 90)), 0);
        h.pool.run_all();
        assert!(h.monitor.scratch_path().is_file());

        h.player.rendering.store(true, Ordering::SeqCst);
        h.monitor.set_default_view();
        assert_eq!(h.monitor.mode(), TrimViewMode::EndTrim);
        assert!(h.monitor.scratch_path().is_file());
    }

    #[test]
    fn test_default_view_tears_down() {
        let mut h = harness("default");
        h.monitor.set_roll_trim_left_active_view(Some(&clip(40, 90)), 0);
        h.pool.run_all();
        h.monitor.poll();
        assert!(h.monitor.surface().is_some());
        assert!(h.monitor.has_decode_handle());
        h.monitor.take_redraw();

        h.monitor.set_default_view();
        assert_eq!(h.monitor.mode(), TrimViewMode::Default);
        assert!(!h.monitor.scratch_path().exists());
        assert!(h.monitor.surface().is_none());
        assert!(!h.monitor.has_decode_handle());
        assert!(h.monitor.layout().is_collapsed());
        assert_eq!(h.monitor.take_redraw(), PanelMask::ALL);
        assert_eq!(refreshes(&h), 2);

        // Already default: nothing happens
        h.monitor.set_default_view();
        assert_eq!(refreshes(&h), 2);
        assert!(h.monitor.take_redraw().is_empty());
    }

    #[test]
    fn test_drag_updates_repaint_bottom_only() {
        let mut h = harness("drag");
        h.monitor.set_start_trim_view(Some(&clip(0, 100)), 20);
        h.pool.run_all();
        h.monitor.poll();
        h.monitor.take_redraw();

        h.monitor.set_edit_tline_frame(30, 2);
        h.monitor.set_edit_tline_frame(31, 3);
        assert_eq!(h.monitor.take_redraw(), PanelMask::BOTTOM);
        assert_eq!(h.pool.len(), 0);
        assert_eq!(h.monitor.state().edit_timeline_frame, Some(31));
        assert_eq!(h.monitor.state().edit_delta, Some(3));
    }

    #[test]
    fn test_roll_drag_without_clip_keeps_delta_absent() {
        let mut h = harness("drag-no-clip");
        h.monitor.set_roll_trim_right_active_view(None, 10);
        h.monitor.set_edit_tline_frame(14, 4);
        assert_eq!(h.monitor.state().edit_timeline_frame, Some(14));
        assert_eq!(h.monitor.state().match_frame, None);
        assert_eq!(h.monitor.state().edit_delta, None);
        assert_eq!(h.monitor.take_redraw(), PanelMask::ALL);
    }

    #[test]
    fn test_mouse_release_shifts_start_in_start_trim() {
        let mut h = harness("release");
        h.monitor.set_start_trim_view(Some(&clip(0, 100)), 20);
        h.monitor.set_edit_tline_frame(25, 5);
        h.monitor.take_redraw();

        h.monitor.one_roll_mouse_release(25, 5);
        assert_eq!(h.monitor.state().edit_clip_start_on_timeline, Some(15));
        assert_eq!(h.monitor.state().edit_delta, None);
        assert_eq!(h.monitor.state().display_edit_frame(), Some(10));
        assert_eq!(h.monitor.take_redraw(), PanelMask::BOTTOM);

        h.monitor.set_end_trim_view(Some(&clip(0, 100)), 20);
        h.monitor.one_roll_mouse_release(25, 5);
        assert_eq!(h.monitor.state().edit_clip_start_on_timeline, Some(20));
    }

    #[test]
    fn test_slip_edit_position() {
        let mut h = harness("slip-edit");
        let c = clip(30, 200);
        h.monitor.set_slip_trim_right_active_view(Some(&c), 0);
        assert_eq!(h.monitor.state().slip_clip_length, Some(300));
        h.monitor.set_slip_edit_tline_frame(&c, -40);
        assert_eq!(h.monitor.state().edit_timeline_frame, Some(160));
        assert_eq!(h.monitor.state().display_match_frame(), Some(0));

        h.monitor.set_slip_trim_left_active_view(Some(&c), 0);
        h.monitor.set_slip_edit_tline_frame(&c, 7);
        assert_eq!(h.monitor.state().edit_timeline_frame, Some(37));
    }

    #[test]
    fn test_roll_refresh_uses_bound_handle() {
        let mut h = harness("roll");
        h.monitor.set_roll_trim_right_active_view(Some(&clip(10, 80)), 0);

        // Not bound until the extraction has run
        h.monitor.update_roll_match_frame();
        assert_eq!(h.pool.len(), 1);

        h.pool.run_all();
        h.monitor.poll();
        assert!(h.monitor.has_decode_handle());

        h.monitor.set_edit_tline_frame(100, 5);
        h.monitor.update_roll_match_frame();
        assert_eq!(h.pool.len(), 1);
        h.pool.run_all();
        assert_eq!(*h.engine.opened.lock().unwrap(), vec![PathBuf::from(P)]);
        assert_eq!(*h.engine.cuts.lock().unwrap(), vec![80, 85]);

        assert!(h.monitor.poll());
        let surface = h.monitor.surface().unwrap();
        assert_eq!(surface.size(), PanelSize::new(500, 281));
        assert_eq!(surface.image().get_pixel(0, 0).0, [85, 85, 85, 255]);
    }

    #[test]
    fn test_later_refresh_wins_out_of_order() {
        let mut h = harness("order");
        h.monitor.set_roll_trim_left_active_view(Some(&clip(100, 300)), 0);
        h.pool.run_all();

        h.monitor.set_edit_tline_frame(0, 1);
        h.monitor.update_roll_match_frame();
        h.monitor.set_edit_tline_frame(0, 2);
        h.monitor.update_roll_match_frame();
        h.pool.run_last_first();

        let surface = h.monitor.surface().unwrap();
        assert_eq!(surface.image().get_pixel(0, 0).0, [102, 102, 102, 255]);
    }

    #[test]
    fn test_stale_job_after_transition_not_installed() {
        let mut h = harness("stale");
        h.monitor.set_start_trim_view(Some(&clip(0, 11)), 0);
        h.monitor.set_end_trim_view(Some(&clip(22, 50)), 0);
        h.pool.run_all();
        assert_eq!(h.monitor.surface().unwrap().image().get_pixel(0, 0).0, [22, 22, 22, 255]);

        h.monitor.set_end_trim_view(Some(&clip(33, 50)), 0);
        h.monitor.set_default_view();
        h.pool.run_all();
        assert!(h.monitor.surface().is_none());
    }

    #[test]
    fn test_resize_before_completion_scales_to_new_size() {
        let mut h = harness("resize");
        h.monitor.set_end_trim_view(Some(&clip(7, 50)), 0);
        h.monitor.take_redraw();
        h.monitor.on_container_resized(PanelSize::new(800, 600));
        assert_eq!(h.monitor.take_redraw(), PanelMask::ALL);
        assert_eq!(h.monitor.layout().right, PanelSize::new(400, 225));
        assert_eq!(h.monitor.layout().top, PanelSize::new(800, 187));

        h.pool.run_all();
        assert_eq!(h.monitor.surface().unwrap().size(), PanelSize::new(400, 225));
    }

    #[test]
    fn test_paint_ops_follow_layout() {
        let mut h = harness("paint");
        h.monitor.set_end_trim_view(Some(&clip(7, 50)), 0);
        let ops = h.monitor.paint_ops(PanelId::RightHalf);
        assert!(matches!(ops.as_slice(), [PaintOp::Fill { .. }]));
        h.pool.run_all();
        let ops = h.monitor.paint_ops(PanelId::RightHalf);
        assert!(matches!(ops.as_slice(), [PaintOp::Surface { .. }]));
        assert!(h.monitor.paint_ops(PanelId::LeftHalf).is_empty());
    }
}
