//! Decode engine interface.
//!
//! The trim pipeline treats decoding as a black box that maps
//! (media path, frame index) to pixels. Two operations matter:
//! - `render`: write one frame to the scratch asset on disk
//! - `Producer::get_frame`: hand back raw pixels directly (continuous refresh)
//!
//! # Raw frame layout
//!
//! `RawFrame::data` uses the engine layout: BGRA rows, top to bottom, plus one
//! trailing padding row. `entities::surface::from_engine_pixels` is the only
//! consumer that interprets it.
//!
//! # Engines
//!
//! - [`ImageSeqEngine`]: numbered image sequences and stills (default)
//! - `FfmpegEngine`: video containers, behind the `ffmpeg` feature

pub mod image_seq;
#[cfg(feature = "ffmpeg")]
pub mod ffmpeg;

use std::path::Path;
use std::sync::Arc;

use crate::entities::PanelSize;
use crate::error::TrimResult;

pub use image_seq::ImageSeqEngine;
#[cfg(feature = "ffmpeg")]
pub use self::ffmpeg::FfmpegEngine;

/// Raw decoded frame in engine layout (see module docs).
#[derive(Debug, Clone)]
pub struct RawFrame {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// File format of the scratch asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScratchFormat {
    Png,
}

impl ScratchFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ScratchFormat::Png => "png",
        }
    }
}

/// Open media source, or a cut of one.
pub trait Producer: Send + Sync {
    /// Media this producer reads
    fn path(&self) -> &Path;

    /// Number of frames available through this producer
    fn length(&self) -> i64;

    /// Inclusive sub-range `[in_frame, out_frame]`, re-based so frame 0 of
    /// the cut is `in_frame` of `self`. Reuses the open source.
    fn cut(&self, in_frame: i64, out_frame: i64) -> TrimResult<Arc<dyn Producer>>;

    /// Decode the first frame of this producer scaled to `width` x `height`.
    fn get_frame(&self, width: u32, height: u32) -> TrimResult<RawFrame>;
}

/// Decode engine entry points.
pub trait DecodeEngine: Send + Sync {
    fn open_producer(&self, path: &Path) -> TrimResult<Arc<dyn Producer>>;

    /// Render the first frame of `producer` at `size` into `output`.
    ///
    /// May return before the file is visible on disk; callers poll for it.
    fn render(
        &self,
        producer: &dyn Producer,
        output: &Path,
        format: ScratchFormat,
        size: PanelSize,
    ) -> TrimResult<()>;

    /// Total media length in frames.
    fn media_length(&self, path: &Path) -> TrimResult<i64> {
        Ok(self.open_producer(path)?.length())
    }
}

/// Supported video file extensions
pub const VIDEO_EXTS: &[&str] = &["mp4", "mov", "avi", "mkv"];

/// Check if file is a video container
pub fn is_video(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|s| VIDEO_EXTS.contains(&s.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Pick the engine that can decode `path`.
///
/// Video containers need the `ffmpeg` feature; without it they fall through
/// to the image engine, which reports them as missing frames.
pub fn engine_for_path(path: &Path) -> Arc<dyn DecodeEngine> {
    #[cfg(feature = "ffmpeg")]
    if is_video(path) {
        return Arc::new(FfmpegEngine::new());
    }
    if is_video(path) {
        log::warn!("{} is a video file; build with --features ffmpeg to decode it", path.display());
    }
    Arc::new(ImageSeqEngine::new())
}

/// Open producer kept by the continuous playback cache so drags cut from
/// the already opened source. Refreshes hand pixels straight to the surface
/// cache, so the handle carries no scratch target.
#[derive(Clone)]
pub struct DecodeHandle {
    pub producer: Arc<dyn Producer>,
}

impl DecodeHandle {
    pub fn new(producer: Arc<dyn Producer>) -> Self {
        Self { producer }
    }

    /// Media the handle decodes from
    pub fn source(&self) -> &Path {
        self.producer.path()
    }
}

impl std::fmt::Debug for DecodeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodeHandle")
            .field("source", &self.source())
            .field("length", &self.producer.length())
            .finish()
    }
}
