//! Frame count to `HH:MM:SS:FF` timecode (non-drop frame).

/// Format `frame` at `fps`. Fractional rates round to the nearest whole
/// frame base (29.97 counts as 30), negatives clamp to zero.
pub fn frames_to_timecode(frame: i64, fps: f64) -> String {
    let base = if fps.is_finite() { fps.round().max(1.0) as i64 } else { 25 };
    let frame = frame.max(0);

    let frames = frame % base;
    let total_secs = frame / base;
    let secs = total_secs % 60;
    let mins = (total_secs / 60) % 60;
    let hours = total_secs / 3600;

    format!("{:02}:{:02}:{:02}:{:02}", hours, mins, secs, frames)
}
