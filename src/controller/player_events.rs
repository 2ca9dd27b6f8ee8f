//! Engine and sink event handling

use crate::engine::{EngineEvent, ErrorKind, PlayerEvent, SinkEvent};
use crate::model::{SessionId, SessionState, StreamItem};

use super::{MEDIA_RECOVERY_MESSAGE, NETWORK_RECOVERY_MESSAGE, PlaybackController};

/// What to do about a fatal error on the live session
enum Recovery {
    RetryLoad,
    RecoverMedia,
    GiveUp,
}

impl PlaybackController {
    pub fn handle_event(&mut self, event: PlayerEvent) {
        match event {
            PlayerEvent::Engine { session, event } => self.handle_engine_event(session, event),
            PlayerEvent::Sink(event) => self.handle_sink_event(event),
        }
    }

    pub fn handle_engine_event(&mut self, session: SessionId, event: EngineEvent) {
        match self.session_id() {
            Some(live) if live == session => {}
            live => {
                tracing::trace!(session = %session, ?live, ?event, "Dropping event from stale session");
                return;
            }
        }

        match (self.state, event) {
            (_, EngineEvent::Error { fatal: false, kind, details }) => {
                tracing::trace!(session = %session, %kind, details = %details, "Non-fatal engine error ignored");
            }
            (_, EngineEvent::Error { fatal: true, kind, details }) => {
                self.on_fatal_error(kind, &details);
            }
            (SessionState::Attaching, EngineEvent::MediaAttached) => {
                let Some(src) = self.current.as_ref().map(|item| item.src.clone()) else {
                    return;
                };
                tracing::debug!(session = %session, src = %src, "Media attached, loading source");
                if let Some(active) = self.session.as_mut() {
                    active.engine.load_source(&src);
                }
                self.set_state(SessionState::ManifestLoading);
                self.show_loader();
            }
            (SessionState::ManifestLoading, EngineEvent::ManifestLoading) => {
                self.show_loader();
            }
            (SessionState::ManifestLoading, EngineEvent::ManifestParsed) => {
                tracing::debug!(session = %session, "Manifest parsed, starting playback");
                self.sink.play();
                self.update_ui(|ui| ui.paused = false);
                self.set_state(SessionState::Ready);
            }
            (
                SessionState::ManifestLoading
                | SessionState::Ready
                | SessionState::Playing
                | SessionState::Buffering,
                EngineEvent::FragLoaded,
            ) => {
                self.on_frag_loaded();
            }
            (
                state @ (SessionState::Idle
                | SessionState::Attaching
                | SessionState::ManifestLoading
                | SessionState::Ready
                | SessionState::Playing
                | SessionState::Buffering
                | SessionState::Ended
                | SessionState::Error),
                event,
            ) => {
                tracing::trace!(session = %session, ?state, ?event, "Engine event ignored in current state");
            }
        }
    }

    pub fn handle_sink_event(&mut self, event: SinkEvent) {
        match event {
            SinkEvent::LoadedMetadata => {
                let duration = self.sink.duration();
                self.update_ui(|ui| ui.progress.on_loaded_metadata(duration));
            }
            SinkEvent::TimeUpdate => {
                let position = self.sink.current_time();
                let duration = self.sink.duration();
                self.update_ui(|ui| ui.progress.on_time_update(position, duration));
            }
            SinkEvent::Waiting => {
                if self.state == SessionState::Playing {
                    self.set_state(SessionState::Buffering);
                }
            }
            SinkEvent::Playing => {
                if self.state == SessionState::Buffering {
                    self.set_state(SessionState::Playing);
                }
                self.update_ui(|ui| ui.paused = false);
            }
            SinkEvent::Ended => {
                self.on_ended();
            }
        }
    }

    fn on_frag_loaded(&mut self) {
        if let Some(active) = self.session.as_mut() {
            active.network_retries = 0;
            active.media_recoveries = 0;
        }

        if !self.ui.borrow().ready {
            tracing::info!(session = ?self.session_id(), "First fragment loaded, player ready");
        }
        self.update_ui(|ui| {
            ui.ready = true;
            ui.clear_error();
        });
        self.hide_loader();

        if self.state != SessionState::Playing {
            self.set_state(SessionState::Playing);
        }
    }

    fn on_fatal_error(&mut self, kind: ErrorKind, details: &str) {
        let retry = self.retry;
        let Some(active) = self.session.as_mut() else {
            return;
        };

        let recovery = match kind {
            ErrorKind::Network if retry.allows_network_retry(active.network_retries) => {
                active.network_retries += 1;
                Recovery::RetryLoad
            }
            ErrorKind::Media if retry.allows_media_recovery(active.media_recoveries) => {
                active.media_recoveries += 1;
                Recovery::RecoverMedia
            }
            ErrorKind::Network | ErrorKind::Media | ErrorKind::Other => Recovery::GiveUp,
        };

        match recovery {
            Recovery::RetryLoad => {
                tracing::warn!(
                    session = %active.id,
                    attempt = active.network_retries,
                    details,
                    "Fatal network error encountered, trying to recover"
                );
                active.engine.start_load();
                self.update_ui(|ui| ui.set_error(NETWORK_RECOVERY_MESSAGE));
            }
            Recovery::RecoverMedia => {
                tracing::warn!(
                    session = %active.id,
                    attempt = active.media_recoveries,
                    details,
                    "Fatal media error encountered, trying to recover"
                );
                active.engine.recover_media_error();
                self.update_ui(|ui| ui.set_error(MEDIA_RECOVERY_MESSAGE));
            }
            Recovery::GiveUp => {
                tracing::error!(session = %active.id, %kind, details, "Unrecoverable playback error");
                self.fail_terminal();
            }
        }
    }

    /// End of stream: move on to the next playlist item if there is one.
    ///
    /// Returns the item playback advanced to.
    fn on_ended(&mut self) -> Option<StreamItem> {
        if !self.state.is_streaming() {
            tracing::trace!(state = ?self.state, "Ended event ignored, no media streaming");
            return None;
        }
        let current = self.current.clone()?;

        self.set_state(SessionState::Ended);
        self.update_ui(|ui| ui.paused = true);

        match self.playlist.advance(Some(&current)) {
            Some(next) => {
                tracing::info!(from = %current.src, to = %next.src, "Stream ended, advancing playlist");
                Some(next)
            }
            None => {
                tracing::info!(src = %current.src, "Stream ended, no next stream in playlist");
                None
            }
        }
    }
}
