//! Controller module - Playback session control
//!
//! The session controller owns the one live decoding session, binds it to the
//! media sink, and turns engine and sink events into state transitions. It is
//! the only writer of [`PlaybackUiState`]. It is organized into submodules by
//! responsibility:
//!
//! - `player_events`: Engine/sink event handling and the recovery policy
//! - `playback`: User transport controls (play/pause, mute, seek)

mod playback;
mod player_events;

use std::sync::Arc;

use tokio::sync::watch;

use crate::config::RetryPolicy;
use crate::engine::{DecodingEngine, EngineFactory, EventSender, LoaderNotifier, MediaSink};
use crate::model::{PlaybackUiState, PlaylistStore, SessionId, SessionState, StreamItem};

pub const NETWORK_RECOVERY_MESSAGE: &str = "fatal network error encountered, trying to recover";
pub const MEDIA_RECOVERY_MESSAGE: &str = "fatal media error encountered, trying to recover";
pub const FATAL_ERROR_MESSAGE: &str = "Error fatal. Please try again.";
pub const UNSUPPORTED_MESSAGE: &str = "HLS playback is not supported by this engine.";

/// The live decoding session and its recovery counters
struct ActiveSession {
    id: SessionId,
    engine: Box<dyn DecodingEngine>,
    network_retries: u32,
    media_recoveries: u32,
}

pub struct PlaybackController {
    factory: Box<dyn EngineFactory>,
    sink: Box<dyn MediaSink>,
    loader: Arc<dyn LoaderNotifier>,
    events: EventSender,
    playlist: PlaylistStore,
    retry: RetryPolicy,
    session: Option<ActiveSession>,
    next_session: u64,
    current: Option<StreamItem>,
    state: SessionState,
    loader_visible: bool,
    ui: watch::Sender<PlaybackUiState>,
}

impl PlaybackController {
    pub fn new(
        factory: Box<dyn EngineFactory>,
        sink: Box<dyn MediaSink>,
        loader: Arc<dyn LoaderNotifier>,
        events: EventSender,
        playlist: PlaylistStore,
        retry: RetryPolicy,
    ) -> Self {
        let initial = PlaybackUiState {
            paused: sink.is_paused(),
            muted: sink.is_muted(),
            ..Default::default()
        };
        let (ui, _) = watch::channel(initial);

        Self {
            factory,
            sink,
            loader,
            events,
            playlist,
            retry,
            session: None,
            next_session: 1,
            current: None,
            state: SessionState::Idle,
            loader_visible: false,
            ui,
        }
    }

    pub fn subscribe_ui(&self) -> watch::Receiver<PlaybackUiState> {
        self.ui.subscribe()
    }

    pub fn ui_state(&self) -> PlaybackUiState {
        self.ui.borrow().clone()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Id of the live session, if one exists.
    pub fn session_id(&self) -> Option<SessionId> {
        self.session.as_ref().map(|s| s.id)
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    pub fn engine_supported(&self) -> bool {
        self.factory.is_supported()
    }

    pub fn report_unsupported(&mut self) {
        tracing::error!("Decoding engine does not support HLS playback");
        self.update_ui(|ui| ui.set_error(UNSUPPORTED_MESSAGE));
    }

    pub fn clear_error(&mut self) {
        self.update_ui(|ui| ui.clear_error());
    }

    /// Start a new session for `item`.
    ///
    /// Any previous session is destroyed before the new engine is created, so
    /// the old session is fully gone before the new one starts attaching.
    pub fn setup_player(&mut self, item: StreamItem) {
        self.destroy_session("replaced by new stream");

        let id = SessionId(self.next_session);
        self.next_session += 1;

        tracing::info!(session = %id, src = %item.src, "Setting up player");

        self.current = Some(item.clone());
        self.update_ui(|ui| {
            ui.current = Some(item.clone());
            ui.ready = false;
            ui.progress.reset();
        });

        let mut engine = match self.factory.create(self.events.for_session(id)) {
            Ok(engine) => engine,
            Err(e) => {
                tracing::error!(session = %id, error = %e, "Failed to create decoding engine");
                self.fail_terminal();
                return;
            }
        };

        self.set_state(SessionState::Attaching);
        engine.attach_media(self.sink.as_mut());
        self.session = Some(ActiveSession {
            id,
            engine,
            network_retries: 0,
            media_recoveries: 0,
        });
    }

    /// Destroy the live session (if any) and stop showing the loader.
    pub fn shutdown(&mut self) {
        self.destroy_session("player shutting down");
        self.hide_loader();
        self.set_state(SessionState::Idle);
    }

    fn destroy_session(&mut self, reason: &str) -> bool {
        match self.session.take() {
            Some(session) => {
                tracing::debug!(session = %session.id, reason, "Destroying session");
                session.engine.destroy();
                true
            }
            None => false,
        }
    }

    /// Unrecoverable path: terminal message, session destroyed, no advancing.
    fn fail_terminal(&mut self) {
        self.update_ui(|ui| ui.set_error(FATAL_ERROR_MESSAGE));
        self.destroy_session("unrecoverable error");
        self.hide_loader();
        self.set_state(SessionState::Error);
    }

    fn set_state(&mut self, state: SessionState) {
        if self.state != state {
            tracing::debug!(from = ?self.state, to = ?state, "Session state changed");
        }
        self.state = state;
        self.update_ui(|ui| ui.state = state);
    }

    fn show_loader(&mut self) {
        if !self.loader_visible {
            self.loader_visible = true;
            self.loader.show_loader();
        }
    }

    fn hide_loader(&mut self) {
        if self.loader_visible {
            self.loader_visible = false;
            self.loader.hide_loader();
        }
    }

    fn update_ui(&self, f: impl FnOnce(&mut PlaybackUiState)) {
        self.ui.send_modify(f);
    }
}

#[cfg(test)]
mod tests {
    use unimock::{MockFn, Unimock, matching};

    use super::*;
    use crate::engine::{EngineEvent, ErrorKind, LoaderNotifierMock, MediaSinkMock, SinkEvent};
    use crate::testing::{Call, Harness, idle_sink, quiet_loader};

    #[test]
    fn setup_destroys_previous_session_before_attaching() {
        let mut h = Harness::new();
        h.controller.setup_player(StreamItem::new("a"));
        let first = h.controller.session_id().unwrap();
        h.controller.setup_player(StreamItem::new("b"));
        let second = h.controller.session_id().unwrap();

        assert_ne!(first, second);
        let destroy = h.journal.position(&Call::Destroy(first)).unwrap();
        let create = h.journal.position(&Call::Create(second)).unwrap();
        let attach = h.journal.position(&Call::Attach(second)).unwrap();
        assert!(destroy < create);
        assert!(create < attach);
        assert_eq!(h.journal.live_sessions(), 1);
    }

    #[test]
    fn setup_enters_attaching_and_resets_ready() {
        let mut h = Harness::new();
        h.start("a");
        h.engine(EngineEvent::MediaAttached);
        h.engine(EngineEvent::FragLoaded);
        assert!(h.controller.ui_state().ready);

        h.controller.setup_player(StreamItem::new("b"));
        let ui = h.controller.ui_state();
        assert_eq!(ui.state, SessionState::Attaching);
        assert!(!ui.ready);
        assert_eq!(ui.current, Some(StreamItem::new("b")));
    }

    #[test]
    fn engine_creation_failure_is_terminal() {
        let mut h = Harness::new();
        h.factory_state.fail_create();
        h.controller.setup_player(StreamItem::new("a"));

        assert!(!h.controller.has_session());
        assert_eq!(h.controller.state(), SessionState::Error);
        assert_eq!(
            h.controller.ui_state().error_message.as_deref(),
            Some(FATAL_ERROR_MESSAGE)
        );
    }

    #[test]
    fn shutdown_destroys_and_hides_loader() {
        let loader = Unimock::new((
            LoaderNotifierMock::show_loader
                .next_call(matching!())
                .returns(()),
            LoaderNotifierMock::hide_loader
                .next_call(matching!())
                .returns(()),
        ));
        let mut h = Harness::with_mocks(idle_sink(), loader);
        h.start("a");
        let id = h.controller.session_id().unwrap();
        h.engine(EngineEvent::MediaAttached);

        h.controller.shutdown();
        h.controller.shutdown();
        assert!(h.journal.contains(&Call::Destroy(id)));
        assert_eq!(h.journal.count(&Call::Destroy(id)), 1);
        assert_eq!(h.controller.state(), SessionState::Idle);
    }

    #[test]
    fn ui_subscribers_see_updates() {
        let mut h = Harness::new();
        let mut rx = h.controller.subscribe_ui();
        h.start("a");
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().state, SessionState::Attaching);
    }

    #[test]
    fn unsupported_engine_reports_message() {
        let mut h = Harness::new();
        h.factory_state.set_supported(false);
        assert!(!h.controller.engine_supported());

        h.controller.report_unsupported();
        assert_eq!(
            h.controller.ui_state().error_message.as_deref(),
            Some(UNSUPPORTED_MESSAGE)
        );
        assert!(!h.controller.has_session());
    }

    #[test]
    fn full_lifecycle_reaches_playing() {
        let sink = Unimock::new((
            MediaSinkMock::is_paused.each_call(matching!()).returns(true),
            MediaSinkMock::is_muted.each_call(matching!()).returns(false),
            MediaSinkMock::play
                .each_call(matching!())
                .returns(())
                .n_times(1),
        ));
        let mut h = Harness::with_mocks(sink, quiet_loader());
        h.start("a");
        h.engine(EngineEvent::MediaAttached);
        h.engine(EngineEvent::ManifestLoading);
        h.engine(EngineEvent::ManifestParsed);
        assert_eq!(h.controller.state(), SessionState::Ready);
        h.engine(EngineEvent::FragLoaded);
        h.sink(SinkEvent::Playing);

        let ui = h.controller.ui_state();
        assert_eq!(ui.state, SessionState::Playing);
        assert!(ui.ready);
        assert!(!ui.paused);

        // Non-fatal noise does not disturb anything.
        h.engine(EngineEvent::non_fatal(ErrorKind::Network, "frag retry"));
        assert_eq!(h.controller.state(), SessionState::Playing);
    }
}
