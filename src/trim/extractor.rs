//! Background match-frame extraction.
//!
//! One job = one frame of one media file rendered to the scratch PNG, then
//! loaded into the surface cache. Jobs run on the worker pool and report back
//! through the event bus; they are never cancelled.
//!
//! Continuous-mode jobs also leave their open producer in the playback cache
//! so drag refreshes can cut from it without reopening the media.
//!
//! The scratch PNG is shared by every job, so one job at a time owns it from
//! delete through load. Jobs already superseded when they get it skip the
//! render.

use log::{debug, error, trace};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use super::playback_cache::PlaybackCache;
use super::surface_cache::SurfaceCache;
use super::trim_events::{MatchFrameFailedEvent, MatchFrameReadyEvent};
use crate::core::{EventEmitter, WorkerPool};
use crate::engine::{DecodeEngine, DecodeHandle, ScratchFormat};
use crate::entities::{PanelSize, TrimViewMode};
use crate::error::{TrimError, TrimResult};

/// One scheduled extraction.
#[derive(Debug, Clone)]
pub struct ExtractionJob {
    pub source: PathBuf,
    pub frame: i64,
    /// Scratch asset the engine renders into
    pub target: PathBuf,
    /// Mode active when the job was scheduled
    pub mode: TrimViewMode,
    /// Project frame size; the engine renders at this size
    pub render_size: PanelSize,
    pub ticket: u64,
}

#[derive(Clone)]
pub struct FrameExtractor {
    engine: Arc<dyn DecodeEngine>,
    surfaces: Arc<SurfaceCache>,
    playback: Arc<PlaybackCache>,
    events: EventEmitter,
    poll_interval: Duration,
    poll_timeout: Option<Duration>,
    /// Held from scratch delete to surface load; shared by clones
    scratch_lock: Arc<Mutex<()>>,
}

impl FrameExtractor {
    pub fn new(
        engine: Arc<dyn DecodeEngine>,
        surfaces: Arc<SurfaceCache>,
        playback: Arc<PlaybackCache>,
        events: EventEmitter,
    ) -> Self {
        Self {
            engine,
            surfaces,
            playback,
            events,
            poll_interval: Duration::from_millis(100),
            poll_timeout: None,
            scratch_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn with_polling(mut self, interval: Duration, timeout: Option<Duration>) -> Self {
        self.poll_interval = interval;
        self.poll_timeout = timeout;
        self
    }

    /// Queue `job` on `pool`.
    pub fn schedule(&self, pool: &dyn WorkerPool, job: ExtractionJob) {
        debug!(
            "Scheduling match frame {} @ {} (ticket {})",
            job.source.display(),
            job.frame,
            job.ticket
        );
        let this = self.clone();
        pool.execute_boxed(Box::new(move || {
            let result = this.run(&job);
            this.report(job.ticket, result);
        }));
    }

    /// Queue a continuous refresh of `frame` from the bound decode handle.
    pub fn schedule_refresh(&self, pool: &dyn WorkerPool, frame: i64, ticket: u64) {
        trace!("Scheduling continuous refresh frame {} (ticket {})", frame, ticket);
        let this = self.clone();
        pool.execute_boxed(Box::new(move || {
            let result = this.playback.refresh(frame, ticket, &this.surfaces);
            this.report(ticket, result);
        }));
    }

    /// Run one extraction on the calling thread.
    ///
    /// Returns `Ok(false)` when a newer frame is already showing, either
    /// before the render (skipped) or after it (not installed).
    pub fn run(&self, job: &ExtractionJob) -> TrimResult<bool> {
        let _scratch = self.scratch_lock.lock().unwrap_or_else(|e| e.into_inner());
        if !self.surfaces.accepts(job.ticket) {
            debug!("Match frame ticket {} stale before render, skipped", job.ticket);
            return Ok(false);
        }

        if let Some(dir) = job.target.parent() {
            std::fs::create_dir_all(dir)?;
        }
        remove_scratch(&job.target)?;

        let producer = self.engine.open_producer(&job.source)?;
        let cut = producer.cut(job.frame, job.frame)?;

        // A job from before the last transition must not rebind its clip
        if job.mode.is_continuous() && self.surfaces.accepts(job.ticket) {
            self.playback.bind(DecodeHandle::new(Arc::clone(&producer)));
        }

        self.engine
            .render(cut.as_ref(), &job.target, ScratchFormat::Png, job.render_size)?;
        wait_for_file(&job.target, self.poll_interval, self.poll_timeout)?;

        self.surfaces.complete_from_file(&job.target, job.ticket)
    }

    fn report(&self, ticket: u64, result: TrimResult<bool>) {
        match result {
            Ok(true) => self.events.emit(MatchFrameReadyEvent { ticket }),
            Ok(false) => debug!("Match frame ticket {} superseded", ticket),
            Err(e) => {
                error!("Match frame ticket {} failed: {}", ticket, e);
                self.events.emit(MatchFrameFailedEvent {
                    ticket,
                    error: e.to_string(),
                });
            }
        }
    }
}

/// Delete the scratch asset. A missing file is fine.
pub fn remove_scratch(path: &Path) -> TrimResult<()> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            trace!("Removed scratch {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Sleep in `interval` steps until `path` exists.
fn wait_for_file(path: &Path, interval: Duration, timeout: Option<Duration>) -> TrimResult<()> {
    let started = Instant::now();
    while !path.is_file() {
        let waited = started.elapsed();
        if let Some(limit) = timeout
            && waited >= limit
        {
            return Err(TrimError::ScratchTimeout {
                path: path.to_path_buf(),
                waited,
            });
        }
        std::thread::sleep(interval);
    }
    Ok(())
}
