//! Single-slot cache for the displayed match frame.
//!
//! Shared between the foreground (reads, invalidates) and worker jobs
//! (installs). Every job gets a ticket from `issue_ticket()`; an install only
//! lands when the ticket is newer than whatever is showing and not older than
//! the floor set by the last mode transition. Late or superseded jobs still
//! finish, they just lose the race.

use log::{debug, trace};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::entities::surface::{from_engine_pixels, load_scaled};
use crate::entities::{MatchFrameSurface, PanelSize};
use crate::error::TrimResult;

#[derive(Debug, Default)]
struct Slot {
    surface: Option<Arc<MatchFrameSurface>>,
    installed: u64,
    floor: u64,
    /// Match panel size; completions scale to whatever this is when they land
    target: PanelSize,
}

#[derive(Debug)]
pub struct SurfaceCache {
    slot: Mutex<Slot>,
    next_ticket: AtomicU64,
}

impl Default for SurfaceCache {
    fn default() -> Self {
        Self::new()
    }
}

impl SurfaceCache {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(Slot::default()),
            next_ticket: AtomicU64::new(1),
        }
    }

    pub fn issue_ticket(&self) -> u64 {
        self.next_ticket.fetch_add(1, Ordering::SeqCst)
    }

    /// Drop the current surface and reject every ticket issued so far.
    pub fn invalidate(&self) {
        let mut slot = self.lock();
        slot.surface = None;
        slot.floor = self.next_ticket.load(Ordering::SeqCst);
        trace!("Surface cache invalidated, floor={}", slot.floor);
    }

    pub fn set_target(&self, size: PanelSize) {
        self.lock().target = size;
    }

    pub fn target(&self) -> PanelSize {
        self.lock().target
    }

    pub fn current(&self) -> Option<Arc<MatchFrameSurface>> {
        self.lock().surface.clone()
    }

    pub fn has_surface(&self) -> bool {
        self.lock().surface.is_some()
    }

    /// Whether a completion carrying `ticket` would still be installed.
    pub fn accepts(&self, ticket: u64) -> bool {
        let slot = self.lock();
        ticket > slot.installed && ticket >= slot.floor
    }

    /// Swap in `surface` if its ticket wins. Returns whether it was installed.
    pub fn install(&self, surface: MatchFrameSurface) -> bool {
        let ticket = surface.ticket();
        let mut slot = self.lock();
        if ticket <= slot.installed || ticket < slot.floor {
            debug!(
                "Dropping stale match frame ticket={} (installed={}, floor={})",
                ticket, slot.installed, slot.floor
            );
            return false;
        }
        trace!("Installing match frame ticket={} {}x{}", ticket, surface.width(), surface.height());
        slot.installed = ticket;
        slot.surface = Some(Arc::new(surface));
        true
    }

    /// Disk completion: load the scratch PNG, scale to the match panel, install.
    pub fn complete_from_file(&self, path: &Path, ticket: u64) -> TrimResult<bool> {
        let image = load_scaled(path, self.target())?;
        Ok(self.install(MatchFrameSurface::new(image, ticket)))
    }

    /// Direct completion from engine pixels. No re-scaling.
    pub fn complete_from_pixels(
        &self,
        buffer: &[u8],
        width: u32,
        height: u32,
        ticket: u64,
    ) -> TrimResult<bool> {
        let image = from_engine_pixels(buffer, width, height)?;
        Ok(self.install(MatchFrameSurface::new(image, ticket)))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }
}
