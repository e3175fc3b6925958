use trimview::cli::Args;
use trimview::config::{self, PathConfig, TrimViewSettings, SETTINGS_FILE};
use trimview::core::workers::Workers;
use trimview::engine::{self, DecodeEngine};
use trimview::entities::{MatchClip, ModeFamily, TrimViewMode};
use trimview::trim::{PlayerLink, ProjectProfile, TrimMonitor};
use trimview::widgets::TrimView;

use anyhow::Context;
use clap::Parser;
use eframe::egui;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Stand-in for the editor's player: tracks the render flag and counts refreshes.
#[derive(Default)]
struct DemoPlayer {
    rendering: AtomicBool,
    refreshes: AtomicUsize,
}

impl PlayerLink for DemoPlayer {
    fn is_rendering(&self) -> bool {
        self.rendering.load(Ordering::Relaxed)
    }

    fn refresh(&self) {
        let n = self.refreshes.fetch_add(1, Ordering::Relaxed) + 1;
        debug!("Player refresh #{}", n);
    }
}

struct DemoProfile {
    width: u32,
    height: u32,
    fps: f64,
    engine: Arc<dyn DecodeEngine>,
}

impl ProjectProfile for DemoProfile {
    fn frame_width(&self) -> u32 {
        self.width
    }

    fn frame_height(&self) -> u32 {
        self.height
    }

    fn fps(&self) -> f64 {
        self.fps
    }

    fn media_length(&self, path: &Path) -> Option<i64> {
        match self.engine.media_length(path) {
            Ok(len) => Some(len),
            Err(e) => {
                warn!("No media length for {}: {}", path.display(), e);
                None
            }
        }
    }
}

/// Demo application state
struct TrimViewApp {
    monitor: TrimMonitor,
    view: TrimView,
    player: Arc<DemoPlayer>,
    clip: Option<MatchClip>,
    edit_start: i64,
    delta: i64,
    settings: TrimViewSettings,
    settings_path: PathBuf,
}

impl TrimViewApp {
    fn enter(&mut self, mode: TrimViewMode) {
        self.delta = 0;
        self.monitor.set_view(mode, self.clip.as_ref(), self.edit_start);
    }

    /// Arrow keys stand in for dragging the edit point on a timeline.
    fn drag(&mut self, step: i64) {
        self.delta += step;
        match self.monitor.mode().family() {
            Some(ModeFamily::Slip) => {
                if let Some(clip) = self.clip.clone() {
                    self.monitor.set_slip_edit_tline_frame(&clip, self.delta);
                }
            }
            Some(_) => self.monitor.set_edit_tline_frame(self.edit_start + self.delta, self.delta),
            None => return,
        }
        if self.monitor.mode().is_continuous() {
            self.monitor.update_roll_match_frame();
        }
    }

    fn release(&mut self) {
        self.monitor
            .one_roll_mouse_release(self.edit_start + self.delta, self.delta);
        if self.monitor.mode() == TrimViewMode::StartTrim {
            self.edit_start -= self.delta;
        }
        self.delta = 0;
    }

    fn handle_keys(&mut self, ctx: &egui::Context) {
        use egui::Key;
        let pressed = |key: Key| ctx.input(|i| i.key_pressed(key));

        let modes = [
            (Key::Num1, TrimViewMode::StartTrim),
            (Key::Num2, TrimViewMode::EndTrim),
            (Key::Num3, TrimViewMode::RollRightActive),
            (Key::Num4, TrimViewMode::RollLeftActive),
            (Key::Num5, TrimViewMode::SlipRightActive),
            (Key::Num6, TrimViewMode::SlipLeftActive),
        ];
        for (key, mode) in modes {
            if pressed(key) {
                self.enter(mode);
            }
        }
        if pressed(Key::Num0) || pressed(Key::Escape) {
            self.monitor.set_default_view();
        }

        let step = if ctx.input(|i| i.modifiers.shift) { 10 } else { 1 };
        if pressed(Key::ArrowLeft) {
            self.drag(-step);
        }
        if pressed(Key::ArrowRight) {
            self.drag(step);
        }
        if pressed(Key::Enter) {
            self.release();
        }

        if pressed(Key::R) {
            let rendering = !self.player.rendering.load(Ordering::Relaxed);
            self.player.rendering.store(rendering, Ordering::Relaxed);
            info!("Render in progress: {}", rendering);
        }
        if pressed(Key::T) {
            self.settings.show_trim_view = !self.settings.show_trim_view;
            self.monitor.set_show_trim_view(self.settings.show_trim_view);
            if let Err(e) = self.settings.save(&self.settings_path) {
                warn!("{:#}", e);
            }
        }
    }
}

impl eframe::App for TrimViewApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_keys(ctx);

        egui::TopBottomPanel::bottom("trim_status").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(self.monitor.mode().label());
                ui.separator();
                ui.label(format!("delta {}", self.delta));
                ui.separator();
                ui.label(if self.player.is_rendering() { "RENDERING" } else { "idle" });
                ui.separator();
                ui.label("1-6 trim modes · 0/Esc default · ←/→ drag · Enter release · R render · T toggle");
            });
        });

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE.fill(egui::Color32::BLACK))
            .show(ctx, |ui| {
                self.view.show(ui, &mut self.monitor, |ui, rect| {
                    ui.painter().rect_filled(rect, 0.0, egui::Color32::from_gray(18));
                    ui.painter().text(
                        rect.center(),
                        egui::Align2::CENTER_CENTER,
                        "live monitor",
                        egui::FontId::proportional(14.0),
                        egui::Color32::from_gray(110),
                    );
                });
            });
    }
}

fn init_logging(args: &Args, path_config: &PathConfig) -> anyhow::Result<()> {
    // 0 (default) = warn, 1 (-v) = info, 2 (-vv) = debug, 3+ (-vvv) = trace
    let log_level = match args.verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    if let Some(log_path_opt) = &args.log_file {
        let log_path = log_path_opt
            .clone()
            .unwrap_or_else(|| config::data_file("trimview.log", path_config));
        if let Some(parent) = log_path.parent() {
            config::ensure_dir(parent)?;
        }
        let file = std::fs::File::create(&log_path)
            .with_context(|| format!("Failed to create log file: {}", log_path.display()))?;

        env_logger::Builder::new()
            .filter_level(log_level)
            .filter_module("egui", log::LevelFilter::Info) // Suppress egui DEBUG spam
            .format_timestamp_millis()
            .target(env_logger::Target::Pipe(Box::new(file)))
            .init();

        info!("Logging to file: {} (level: {:?})", log_path.display(), log_level);
    } else {
        // Console logging (respects RUST_LOG if set)
        let default_level = match args.verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
            .filter_module("egui", log::LevelFilter::Info)
            .format_timestamp_millis()
            .init();
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let path_config = PathConfig::from_env_and_cli(args.data_dir.clone());
    init_logging(&args, &path_config)?;

    info!("TrimView starting...");
    debug!("Command-line args: {:?}", args);

    let settings_path = config::config_file(SETTINGS_FILE, &path_config);
    let settings = TrimViewSettings::load_or_default(&settings_path);
    info!("Config path: {}", settings_path.display());

    let scratch_dir = config::scratch_dir(&path_config, &settings);
    config::ensure_dir(&scratch_dir)?;
    info!("Scratch dir: {}", scratch_dir.display());

    let engine: Arc<dyn DecodeEngine> = match &args.media {
        Some(path) => engine::engine_for_path(path),
        None => Arc::new(engine::ImageSeqEngine::new()),
    };

    let clip = match &args.media {
        Some(path) => {
            let clip_out = match args.clip_out {
                Some(out) => out,
                None => engine
                    .media_length(path)
                    .with_context(|| format!("Failed to open {}", path.display()))?
                    .saturating_sub(1),
            };
            info!("Match clip: {} [{}..{}]", path.display(), args.clip_in, clip_out);
            Some(MatchClip::new(path.clone(), args.clip_in, clip_out))
        }
        None => {
            info!("No media given, trim modes will show black match frames");
            None
        }
    };

    let num_workers = Workers::auto_size(args.workers.unwrap_or(settings.workers));
    let workers = Arc::new(Workers::new(num_workers));
    info!("Worker pool: {} threads", workers.num_threads());

    let (width, height) = args.frame_size();
    let profile = Arc::new(DemoProfile {
        width,
        height,
        fps: args.fps,
        engine: Arc::clone(&engine),
    });
    let player = Arc::new(DemoPlayer::default());

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(format!("TrimView v{}", env!("CARGO_PKG_VERSION")))
            .with_inner_size([1280.0, 800.0])
            .with_resizable(true),
        persist_window: true,
        persistence_path: Some(config::config_file("trimview_window.ron", &path_config)),
        ..Default::default()
    };

    let edit_start = args.edit_start;
    eframe::run_native(
        "TrimView",
        native_options,
        Box::new(move |cc| {
            let monitor = TrimMonitor::new(
                engine,
                workers,
                player.clone(),
                profile,
                settings.clone(),
                scratch_dir,
            );
            TrimView::attach(&cc.egui_ctx, &monitor);
            Ok(Box::new(TrimViewApp {
                monitor,
                view: TrimView::new(),
                player,
                clip,
                edit_start,
                delta: 0,
                settings,
                settings_path,
            }))
        }),
    )
    .map_err(|e| anyhow::anyhow!("eframe failed: {}", e))
}
