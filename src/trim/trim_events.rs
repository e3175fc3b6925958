//! Events posted by match-frame jobs, drained by `TrimMonitor::poll`.

/// A job installed a new surface. Both halves need a repaint.
#[derive(Clone, Debug)]
pub struct MatchFrameReadyEvent {
    pub ticket: u64,
}

/// A job failed; the previous surface stays in place.
#[derive(Clone, Debug)]
pub struct MatchFrameFailedEvent {
    pub ticket: u64,
    pub error: String,
}
