//! Errors raised by the match-frame pipeline.
//!
//! Worker jobs return these; the job wrapper logs them and posts a failure
//! event. Foreground operations never fail: refusals are silent by policy.

use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug)]
pub enum TrimError {
    /// Decode engine could not open, cut, decode or render
    Engine(String),
    Io(std::io::Error),
    Image(String),
    /// Raw frame buffer does not hold `width * height` pixels
    PixelBuffer { expected: usize, actual: usize },
    /// Scratch asset never appeared within the configured timeout
    ScratchTimeout { path: PathBuf, waited: Duration },
    /// Continuous refresh requested with no bound decode handle
    NoDecodeHandle,
}

impl std::fmt::Display for TrimError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrimError::Engine(e) => write!(f, "Decode engine error: {}", e),
            TrimError::Io(e) => write!(f, "I/O error: {}", e),
            TrimError::Image(e) => write!(f, "Image error: {}", e),
            TrimError::PixelBuffer { expected, actual } => write!(
                f,
                "Pixel buffer too short: expected at least {} bytes, got {}",
                expected, actual
            ),
            TrimError::ScratchTimeout { path, waited } => write!(
                f,
                "Scratch asset {} did not appear after {}ms",
                path.display(),
                waited.as_millis()
            ),
            TrimError::NoDecodeHandle => write!(f, "No decode handle bound for continuous refresh"),
        }
    }
}

impl std::error::Error for TrimError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TrimError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for TrimError {
    fn from(e: std::io::Error) -> Self {
        TrimError::Io(e)
    }
}

impl From<image::ImageError> for TrimError {
    fn from(e: image::ImageError) -> Self {
        TrimError::Image(e.to_string())
    }
}

pub type TrimResult<T> = Result<T, TrimError>;
