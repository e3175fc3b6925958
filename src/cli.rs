use clap::Parser;
use std::path::PathBuf;

#[cfg(feature = "ffmpeg")]
const VIDEO_BACKEND: &str = "playa-ffmpeg 8.0 (static)";
#[cfg(not(feature = "ffmpeg"))]
const VIDEO_BACKEND: &str = "disabled (image sequences only)";

// Build version with backend info
const VERSION_INFO: &str = const_format::concatcp!(
    env!("CARGO_PKG_VERSION"), "\n",
    "Video:  ", VIDEO_BACKEND, "\n",
    "Target: ", std::env::consts::ARCH, "-", std::env::consts::OS
);

/// Trim-mode match-frame monitor demo
#[derive(Parser, Debug)]
#[command(author, version = VERSION_INFO, about, long_about = None)]
pub struct Args {
    /// Match clip media: image sequence (`shot.####.exr`, or any frame of it), still, or video
    #[arg(value_name = "MEDIA")]
    pub media: Option<PathBuf>,

    /// Match clip in frame on the source media
    #[arg(long = "in", value_name = "N", default_value_t = 0)]
    pub clip_in: i64,

    /// Match clip out frame on the source media (default: last frame)
    #[arg(long = "out", value_name = "N")]
    pub clip_out: Option<i64>,

    /// Timeline frame where the edit clip starts
    #[arg(long = "edit-start", value_name = "N", default_value_t = 0)]
    pub edit_start: i64,

    /// Project frame rate
    #[arg(long = "fps", value_name = "FPS", default_value_t = 25.0)]
    pub fps: f64,

    /// Project frame size
    #[arg(long = "size", value_names = ["WIDTH", "HEIGHT"], num_args = 2)]
    pub size: Option<Vec<u32>>,

    /// Enable debug logging to file (default: trimview.log)
    #[arg(short = 'l', long = "log", value_name = "LOG_FILE")]
    pub log_file: Option<Option<PathBuf>>,

    /// Increase logging verbosity (default: warn, -v: info, -vv: debug, -vvv+: trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbosity: u8,

    /// Custom data directory (overrides default platform paths)
    #[arg(short = 'c', long = "data-dir", value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Worker threads for frame extraction (default: from settings)
    #[arg(long = "workers", value_name = "N")]
    pub workers: Option<usize>,
}

impl Args {
    /// Project frame size, 1920x1080 unless given.
    pub fn frame_size(&self) -> (u32, u32) {
        match self.size.as_deref() {
            Some([w, h]) => (*w, *h),
            _ => (1920, 1080),
        }
    }
}
