//! Progress bookkeeping driven by media sink events

use std::time::Duration;

use super::types::ProgressState;

impl ProgressState {
    /// `loadedmetadata`: the duration becomes the progress maximum.
    pub fn on_loaded_metadata(&mut self, duration: Option<Duration>) {
        if let Some(duration) = duration {
            self.max = Some(duration);
        }
    }

    /// `timeupdate`: track the position, filling the maximum if metadata
    /// arrived before anyone was listening.
    pub fn on_time_update(&mut self, current_time: Duration, duration: Option<Duration>) {
        if self.max.is_none() {
            self.max = duration;
        }
        self.value = current_time;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Position for a fraction of `duration`, with the fraction clamped to [0, 1].
pub fn position_at_fraction(fraction: f64, duration: Duration) -> Duration {
    let fraction = if fraction.is_finite() {
        fraction.clamp(0.0, 1.0)
    } else {
        0.0
    };
    duration.mul_f64(fraction)
}

/// Render a position as `m:ss`.
pub fn format_position(position: Duration) -> String {
    let total_seconds = position.as_secs();
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;
    format!("{}:{:02}", minutes, seconds)
}
