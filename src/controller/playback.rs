//! Transport controls forwarded from user input

use std::time::Duration;

use crate::model::position_at_fraction;

use super::PlaybackController;

impl PlaybackController {
    /// Play when paused or finished, pause otherwise.
    pub fn toggle_playback(&mut self) {
        let resume = self.sink.is_paused() || self.sink.is_ended();
        tracing::debug!(resume, "Toggling playback");

        if resume {
            self.sink.play();
        } else {
            self.sink.pause();
        }
        let paused = self.sink.is_paused();
        self.update_ui(|ui| ui.paused = paused);
    }

    pub fn toggle_mute(&mut self) {
        let muted = !self.sink.is_muted();
        self.sink.set_muted(muted);
        tracing::debug!(muted, "Mute toggled");
        self.update_ui(|ui| ui.muted = muted);
    }

    /// Seek to a fraction of the media duration.
    ///
    /// Returns the new position, or `None` while the duration is unknown.
    pub fn seek_to_fraction(&mut self, fraction: f64) -> Option<Duration> {
        let duration = self.sink.duration()?;
        let position = position_at_fraction(fraction, duration);

        tracing::debug!(fraction, position_ms = position.as_millis() as u64, "Seeking");
        self.sink.set_current_time(position);
        self.update_ui(|ui| ui.progress.value = position);
        Some(position)
    }
}
