//! Match clip supplied by the timeline when a trim starts.

use std::path::{Path, PathBuf};

use super::view_state::Boundary;

/// The clip adjacent to the edit point, whose boundary frame is previewed.
///
/// `clip_in`/`clip_out` are inclusive frame indices on the source media.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchClip {
    pub path: PathBuf,
    pub clip_in: i64,
    pub clip_out: i64,
}

impl MatchClip {
    pub fn new(path: impl Into<PathBuf>, clip_in: i64, clip_out: i64) -> Self {
        Self {
            path: path.into(),
            clip_in,
            clip_out,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn boundary_frame(&self, boundary: Boundary) -> i64 {
        match boundary {
            Boundary::In => self.clip_in,
            Boundary::Out => self.clip_out,
        }
    }
}
