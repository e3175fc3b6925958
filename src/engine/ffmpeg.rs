//! FFmpeg-backed decode engine for video containers (feature `ffmpeg`).
//!
//! `open_producer` opens the container, decoder and scaler once; every cut of
//! that producer decodes through the same opened state. A decode seeks to the
//! nearest keyframe before the target and decodes forward until the frame's
//! PTS reaches it, then scales straight to BGRA at the requested size and
//! appends the padding row of the engine layout.

use log::{trace, warn};
use playa_ffmpeg as ffmpeg;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, Once};

use super::{DecodeEngine, Producer, RawFrame, ScratchFormat};
use crate::entities::surface::from_engine_pixels;
use crate::entities::PanelSize;
use crate::error::{TrimError, TrimResult};

type VideoFrame = ffmpeg::util::frame::video::Video;

static FFMPEG_INIT: Once = Once::new();

fn init_ffmpeg() {
    FFMPEG_INIT.call_once(|| {
        if let Err(e) = ffmpeg::init() {
            warn!("FFmpeg init failed: {}", e);
        }
        unsafe {
            ffmpeg::ffi::av_log_set_level(ffmpeg::ffi::AV_LOG_QUIET);
        }
    });
}

fn engine_err(what: &str, e: impl std::fmt::Display) -> TrimError {
    TrimError::Engine(format!("{}: {}", what, e))
}

#[derive(Debug, Default, Clone)]
pub struct FfmpegEngine;

impl FfmpegEngine {
    pub fn new() -> Self {
        init_ffmpeg();
        Self
    }
}

/// Source and destination of the cached scaler; rebuilt when any changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ScalerKey {
    format: ffmpeg::format::Pixel,
    src_width: u32,
    src_height: u32,
    width: u32,
    height: u32,
}

struct Scaler {
    key: ScalerKey,
    ctx: ffmpeg::software::scaling::Context,
}

/// Opened container, decoder and scaler of one video.
struct VideoSource {
    input: ffmpeg::format::context::Input,
    decoder: ffmpeg::decoder::Video,
    stream_idx: usize,
    fps: ffmpeg::Rational,
    time_base: ffmpeg::Rational,
    scaler: Option<Scaler>,
}

// SAFETY: the FFmpeg contexts are only reached through the producer's Mutex,
// so one thread at a time.
unsafe impl Send for VideoSource {}

impl VideoSource {
    /// Open `path` and return the source with its length in frames.
    fn open(path: &Path) -> TrimResult<(Self, i64)> {
        init_ffmpeg();
        let input = ffmpeg::format::input(path).map_err(|e| engine_err("Failed to open video", e))?;
        let stream = input
            .streams()
            .best(ffmpeg::media::Type::Video)
            .ok_or_else(|| TrimError::Engine("No video stream found".to_string()))?;
        let stream_idx = stream.index();
        let fps = stream.avg_frame_rate();
        let time_base = stream.time_base();

        let duration_secs = stream.duration() as f64 * time_base.numerator() as f64
            / time_base.denominator().max(1) as f64;
        let fps_f64 = fps.numerator() as f64 / fps.denominator().max(1) as f64;
        let length = (duration_secs * fps_f64).max(1.0) as i64;

        let decoder_ctx = ffmpeg::codec::context::Context::from_parameters(stream.parameters())
            .map_err(|e| engine_err("Failed to create decoder context", e))?;
        let decoder = decoder_ctx
            .decoder()
            .video()
            .map_err(|e| engine_err("Failed to create video decoder", e))?;

        let source = Self {
            input,
            decoder,
            stream_idx,
            fps,
            time_base,
            scaler: None,
        };
        Ok((source, length))
    }

    /// Frame index to stream timestamp, when the stream has a frame rate.
    fn target_ts(&self, frame_num: usize) -> Option<i64> {
        if self.fps.numerator() <= 0 || self.fps.denominator() <= 0 {
            return None;
        }
        let frame_tb = ffmpeg::ffi::AVRational {
            num: self.fps.denominator(),
            den: self.fps.numerator(),
        };
        let stream_tb = ffmpeg::ffi::AVRational {
            num: self.time_base.numerator(),
            den: self.time_base.denominator(),
        };
        Some(unsafe { ffmpeg::ffi::av_rescale_q(frame_num as i64, frame_tb, stream_tb) })
    }

    fn seek(&mut self, ts: i64) -> i32 {
        unsafe {
            ffmpeg::ffi::av_seek_frame(
                self.input.as_mut_ptr(),
                self.stream_idx as i32,
                ts,
                ffmpeg::ffi::AVSEEK_FLAG_BACKWARD,
            )
        }
    }

    fn decode_bgra(&mut self, frame_num: usize, width: u32, height: u32) -> TrimResult<Vec<u8>> {
        let target_ts = self.target_ts(frame_num);

        // The input is shared across decodes, so always reposition: on the
        // target when possible, otherwise on the start of the stream
        let seek_ret = self.seek(target_ts.unwrap_or(0));
        if seek_ret < 0 {
            warn!("Video seek failed (ret={}), decoding from start", seek_ret);
            self.seek(0);
        }
        self.decoder.flush();

        let VideoSource {
            input,
            decoder,
            stream_idx,
            scaler,
            ..
        } = self;

        let mut current_frame = 0;
        let mut decoded = VideoFrame::empty();
        for (stream, packet) in input.packets() {
            if stream.index() != *stream_idx {
                continue;
            }
            decoder
                .send_packet(&packet)
                .map_err(|e| engine_err("Failed to send packet", e))?;

            while decoder.receive_frame(&mut decoded).is_ok() {
                if reached(&decoded, target_ts, current_frame, frame_num) {
                    return scale_to_engine_layout(scaler, &decoded, width, height);
                }
                current_frame += 1;
            }
        }

        // Frames still buffered in the decoder at end of stream
        let _ = decoder.send_eof();
        while decoder.receive_frame(&mut decoded).is_ok() {
            if reached(&decoded, target_ts, current_frame, frame_num) {
                return scale_to_engine_layout(scaler, &decoded, width, height);
            }
            current_frame += 1;
        }

        Err(TrimError::Engine(format!("Frame {} not found", frame_num)))
    }
}

fn reached(decoded: &VideoFrame, target_ts: Option<i64>, current_frame: usize, frame_num: usize) -> bool {
    match target_ts {
        Some(target_ts) => decoded
            .pts()
            .map(|pts| pts >= target_ts)
            .unwrap_or(current_frame >= frame_num),
        None => current_frame >= frame_num,
    }
}

/// Scale `decoded` to BGRA, reusing the cached scaler when the geometry matches.
fn scale_to_engine_layout(
    scaler: &mut Option<Scaler>,
    decoded: &VideoFrame,
    width: u32,
    height: u32,
) -> TrimResult<Vec<u8>> {
    let key = ScalerKey {
        format: decoded.format(),
        src_width: decoded.width(),
        src_height: decoded.height(),
        width,
        height,
    };
    if scaler.as_ref().map(|s| s.key) != Some(key) {
        trace!(
            "Creating scaler {}x{} -> {}x{}",
            key.src_width, key.src_height, key.width, key.height
        );
        let ctx = ffmpeg::software::scaling::Context::get(
            key.format,
            key.src_width,
            key.src_height,
            ffmpeg::format::Pixel::BGRA,
            width,
            height,
            ffmpeg::software::scaling::Flags::BILINEAR,
        )
        .map_err(|e| engine_err("Failed to create scaler", e))?;
        *scaler = Some(Scaler { key, ctx });
    }
    let ctx = scaler
        .as_mut()
        .map(|s| &mut s.ctx)
        .ok_or_else(|| TrimError::Engine("Scaler unavailable".to_string()))?;

    let mut bgra = VideoFrame::empty();
    ctx.run(decoded, &mut bgra)
        .map_err(|e| engine_err("Failed to scale frame", e))?;

    let data = bgra.data(0);
    let stride = bgra.stride(0);
    let row_bytes = width as usize * 4;
    // One extra zeroed row: engine layout
    let mut output = vec![0u8; row_bytes * (height as usize + 1)];
    for y in 0..height as usize {
        let src = y * stride;
        let dst = y * row_bytes;
        output[dst..dst + row_bytes].copy_from_slice(&data[src..src + row_bytes]);
    }
    Ok(output)
}

/// Cut window over a shared opened source.
struct FfmpegProducer {
    path: PathBuf,
    source: Arc<Mutex<VideoSource>>,
    offset: i64,
    length: i64,
}

impl FfmpegProducer {
    fn open(path: &Path) -> TrimResult<Self> {
        let (source, length) = VideoSource::open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            source: Arc::new(Mutex::new(source)),
            offset: 0,
            length,
        })
    }

    fn sub(&self, in_frame: i64, out_frame: i64) -> TrimResult<Self> {
        if out_frame < in_frame {
            return Err(TrimError::Engine(format!(
                "Invalid cut {}..{} on {}",
                in_frame,
                out_frame,
                self.path.display()
            )));
        }
        Ok(Self {
            path: self.path.clone(),
            source: Arc::clone(&self.source),
            offset: self.offset + in_frame,
            length: out_frame - in_frame + 1,
        })
    }
}

impl Producer for FfmpegProducer {
    fn path(&self) -> &Path {
        &self.path
    }

    fn length(&self) -> i64 {
        self.length
    }

    fn cut(&self, in_frame: i64, out_frame: i64) -> TrimResult<Arc<dyn Producer>> {
        Ok(Arc::new(self.sub(in_frame, out_frame)?))
    }

    fn get_frame(&self, width: u32, height: u32) -> TrimResult<RawFrame> {
        if self.offset < 0 {
            return Err(TrimError::Engine(format!("Negative frame {}", self.offset)));
        }
        let (width, height) = (width.max(1), height.max(1));
        let mut source = self.source.lock().unwrap_or_else(|e| e.into_inner());
        let data = source
            .decode_bgra(self.offset as usize, width, height)
            .map_err(|e| engine_err(&self.path.display().to_string(), e))?;
        trace!("Decoded {} frame {} at {}x{}", self.path.display(), self.offset, width, height);
        Ok(RawFrame { data, width, height })
    }
}

impl DecodeEngine for FfmpegEngine {
    fn open_producer(&self, path: &Path) -> TrimResult<Arc<dyn Producer>> {
        Ok(Arc::new(FfmpegProducer::open(path)?))
    }

    fn render(
        &self,
        producer: &dyn Producer,
        output: &Path,
        format: ScratchFormat,
        size: PanelSize,
    ) -> TrimResult<()> {
        let frame = producer.get_frame(size.width, size.height)?;
        let img = from_engine_pixels(&frame.data, frame.width, frame.height)?;
        let tmp = output.with_extension(format!("{}.part", format.extension()));
        img.save_with_format(&tmp, image::ImageFormat::Png)?;
        std::fs::rename(&tmp, output)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Sample clip for decode tests (set TRIMVIEW_TEST_VIDEO to run them)
    fn test_video() -> Option<PathBuf> {
        let path = PathBuf::from(std::env::var("TRIMVIEW_TEST_VIDEO").ok()?);
        path.exists().then_some(path)
    }

    #[test]
    fn test_cuts_share_opened_source() {
        let Some(path) = test_video() else {
            println!("Skipping test - TRIMVIEW_TEST_VIDEO not set");
            return;
        };
        let producer = FfmpegProducer::open(&path).unwrap();
        let a = producer.sub(0, 0).unwrap();
        let b = producer.sub(1, 1).unwrap();
        assert!(Arc::ptr_eq(&producer.source, &a.source));
        assert!(Arc::ptr_eq(&producer.source, &b.source));
        assert_eq!(Arc::strong_count(&producer.source), 3);

        // Back-to-back decodes on one source, including a backwards step
        let first = b.get_frame(16, 8).unwrap();
        let second = a.get_frame(16, 8).unwrap();
        assert_eq!(first.data.len(), 16 * 9 * 4);
        assert_eq!(second.data.len(), 16 * 9 * 4);
        let again = b.get_frame(16, 8).unwrap();
        assert_eq!(again.data, first.data);
    }

    #[test]
    fn test_cut_rejects_reversed_range() {
        let Some(path) = test_video() else {
            println!("Skipping test - TRIMVIEW_TEST_VIDEO not set");
            return;
        };
        let producer = FfmpegProducer::open(&path).unwrap();
        assert!(matches!(producer.sub(5, 4), Err(TrimError::Engine(_))));
    }
}
