//! Decode handle kept open while the user drags a roll or slip edge.
//!
//! The extractor binds the handle it opened for a continuous mode; drag
//! refreshes then cut new frames straight from it and skip the disk.

use log::{debug, trace};
use std::sync::Mutex;

use super::surface_cache::SurfaceCache;
use crate::engine::DecodeHandle;
use crate::error::{TrimError, TrimResult};

#[derive(Debug, Default)]
pub struct PlaybackCache {
    handle: Mutex<Option<DecodeHandle>>,
}

impl PlaybackCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last assignment wins.
    pub fn bind(&self, handle: DecodeHandle) {
        debug!("Binding continuous decode handle {:?}", handle);
        *self.handle.lock().unwrap_or_else(|e| e.into_inner()) = Some(handle);
    }

    pub fn clear(&self) {
        if self.handle.lock().unwrap_or_else(|e| e.into_inner()).take().is_some() {
            debug!("Continuous decode handle released");
        }
    }

    pub fn handle(&self) -> Option<DecodeHandle> {
        self.handle.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn is_bound(&self) -> bool {
        self.handle.lock().unwrap_or_else(|e| e.into_inner()).is_some()
    }

    /// Decode `frame` from the bound handle at the current match panel size
    /// and install it under `ticket`.
    pub fn refresh(&self, frame: i64, ticket: u64, surfaces: &SurfaceCache) -> TrimResult<bool> {
        let handle = self.handle().ok_or(TrimError::NoDecodeHandle)?;
        let size = surfaces.target();
        trace!(
            "Continuous refresh {} frame {} at {}x{}",
            handle.source().display(),
            frame,
            size.width,
            size.height
        );
        let cut = handle.producer.cut(frame, frame)?;
        let raw = cut.get_frame(size.width.max(1), size.height.max(1))?;
        surfaces.complete_from_pixels(&raw.data, raw.width, raw.height, ticket)
    }
}
