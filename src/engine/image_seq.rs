//! Image sequence decode engine.
//!
//! Media paths may be:
//! - A hash pattern: `/shots/a/plate.####.png` (any run of `#`)
//! - Any member of a numbered sequence: `/shots/a/plate.0101.png`
//! - A single still, which yields the same image for every frame
//!
//! Frame `i` of a sequence is the `i`-th file in numeric order, so gaps in
//! numbering don't create missing frames.

use image::imageops::{self, FilterType};
use log::{debug, trace};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{DecodeEngine, Producer, RawFrame, ScratchFormat};
use crate::entities::surface::to_engine_pixels;
use crate::entities::PanelSize;
use crate::error::{TrimError, TrimResult};

/// Engine for numbered image sequences and stills.
#[derive(Debug, Default, Clone)]
pub struct ImageSeqEngine;

impl ImageSeqEngine {
    pub fn new() -> Self {
        Self
    }
}

/// Resolved frame files shared by a producer and all of its cuts.
#[derive(Debug)]
struct SequenceFiles {
    path: PathBuf,
    files: Vec<PathBuf>,
    still: bool,
}

#[derive(Debug, Clone)]
struct SeqProducer {
    seq: Arc<SequenceFiles>,
    offset: i64,
    length: i64,
}

impl SeqProducer {
    fn file_for(&self, frame: i64) -> TrimResult<&Path> {
        if self.seq.still {
            return Ok(&self.seq.files[0]);
        }
        let index = self.offset + frame;
        if frame < 0 || frame >= self.length || index < 0 || index as usize >= self.seq.files.len() {
            return Err(TrimError::Engine(format!(
                "Frame {} out of range for {} ({} frames)",
                index,
                self.seq.path.display(),
                self.seq.files.len()
            )));
        }
        Ok(&self.seq.files[index as usize])
    }

    fn decode_scaled(&self, width: u32, height: u32) -> TrimResult<image::RgbaImage> {
        let file = self.file_for(0)?;
        trace!("Decoding {} at {}x{}", file.display(), width, height);
        let img = image::open(file)?.to_rgba8();
        let (width, height) = (width.max(1), height.max(1));
        if img.dimensions() == (width, height) {
            Ok(img)
        } else {
            Ok(imageops::resize(&img, width, height, FilterType::Triangle))
        }
    }
}

impl Producer for SeqProducer {
    fn path(&self) -> &Path {
        &self.seq.path
    }

    fn length(&self) -> i64 {
        self.length
    }

    fn cut(&self, in_frame: i64, out_frame: i64) -> TrimResult<Arc<dyn Producer>> {
        if out_frame < in_frame {
            return Err(TrimError::Engine(format!(
                "Invalid cut {}..{} on {}",
                in_frame,
                out_frame,
                self.seq.path.display()
            )));
        }
        Ok(Arc::new(SeqProducer {
            seq: Arc::clone(&self.seq),
            offset: self.offset + in_frame,
            length: out_frame - in_frame + 1,
        }))
    }

    fn get_frame(&self, width: u32, height: u32) -> TrimResult<RawFrame> {
        let img = self.decode_scaled(width, height)?;
        Ok(RawFrame {
            width: img.width(),
            height: img.height(),
            data: to_engine_pixels(&img),
        })
    }
}

impl DecodeEngine for ImageSeqEngine {
    fn open_producer(&self, path: &Path) -> TrimResult<Arc<dyn Producer>> {
        let seq = resolve_sequence(path)?;
        debug!(
            "Opened {} ({} file(s){})",
            path.display(),
            seq.files.len(),
            if seq.still { ", still" } else { "" }
        );
        let length = if seq.still { i64::MAX } else { seq.files.len() as i64 };
        Ok(Arc::new(SeqProducer {
            seq: Arc::new(seq),
            offset: 0,
            length,
        }))
    }

    fn render(
        &self,
        producer: &dyn Producer,
        output: &Path,
        format: ScratchFormat,
        size: PanelSize,
    ) -> TrimResult<()> {
        let frame = producer.get_frame(size.width, size.height)?;
        let img = crate::entities::surface::from_engine_pixels(&frame.data, frame.width, frame.height)?;

        // Write beside the target then rename, so pollers never see a partial file
        let tmp = output.with_extension(format!("{}.part", format.extension()));
        let image_format = match format {
            ScratchFormat::Png => image::ImageFormat::Png,
        };
        img.save_with_format(&tmp, image_format)?;
        std::fs::rename(&tmp, output)?;
        trace!("Rendered {} -> {}", producer.path().display(), output.display());
        Ok(())
    }
}

/// Split `name.0042.png` into ("name.", 42, "png", 4). `None` if the stem
/// doesn't end in digits.
pub fn split_sequence_path(path: &Path) -> Option<(String, usize, String, usize)> {
    let ext = path.extension()?.to_str()?.to_string();
    let stem = path.file_stem()?.to_str()?;
    let digits = stem.chars().rev().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }
    let (prefix, number) = stem.split_at(stem.len() - digits);
    let number = number.parse().ok()?;
    let dir = path.parent().map(|p| p.to_path_buf()).unwrap_or_default();
    let prefix = dir.join(prefix).to_string_lossy().into_owned();
    Some((prefix, number, ext, digits))
}

fn resolve_sequence(path: &Path) -> TrimResult<SequenceFiles> {
    let text = path.to_string_lossy();

    let pattern = if text.contains('#') {
        Some(hash_to_glob(&text))
    } else if let Some((prefix, _, ext, _)) = split_sequence_path(path) {
        Some(format!("{}*.{}", glob::Pattern::escape(&prefix), ext))
    } else {
        None
    };

    if let Some(pattern) = pattern {
        let mut numbered: Vec<(usize, PathBuf)> = glob::glob(&pattern)
            .map_err(|e| TrimError::Engine(format!("Bad sequence pattern {}: {}", pattern, e)))?
            .filter_map(Result::ok)
            .filter_map(|p| split_sequence_path(&p).map(|(_, n, _, _)| (n, p)))
            .collect();
        numbered.sort_by_key(|(n, _)| *n);

        if !numbered.is_empty() {
            return Ok(SequenceFiles {
                path: path.to_path_buf(),
                files: numbered.into_iter().map(|(_, p)| p).collect(),
                still: false,
            });
        }
    }

    if path.is_file() {
        return Ok(SequenceFiles {
            path: path.to_path_buf(),
            files: vec![path.to_path_buf()],
            still: true,
        });
    }

    Err(TrimError::Engine(format!("No frames found for {}", path.display())))
}

/// `plate.####.png` -> `plate.????.png` (escaped outside the hash run)
fn hash_to_glob(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut literal = String::new();
    for c in text.chars() {
        if c == '#' {
            if !literal.is_empty() {
                out.push_str(&glob::Pattern::escape(&literal));
                literal.clear();
            }
            out.push('?');
        } else {
            literal.push(c);
        }
    }
    out.push_str(&glob::Pattern::escape(&literal));
    out
}
