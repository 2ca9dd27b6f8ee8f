//! Collaborator surfaces the player drives: the segmented-stream decoding
//! engine, the media sink it renders into, and the loader indicator.
//!
//! Everything the collaborators report back flows through one ordered
//! [`PlayerEvent`] channel. Engine events are tagged with the [`SessionId`]
//! of the session that emitted them so that late events from a destroyed
//! session can be told apart from the live one.

use std::fmt;
use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::model::SessionId;

/// Category of an engine error; selects the recovery policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    Media,
    Other,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Network => write!(f, "network"),
            ErrorKind::Media => write!(f, "media"),
            ErrorKind::Other => write!(f, "other"),
        }
    }
}

/// Lifecycle events emitted by a decoding engine
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineEvent {
    MediaAttached,
    ManifestLoading,
    ManifestParsed,
    FragLoaded,
    Error {
        fatal: bool,
        kind: ErrorKind,
        details: String,
    },
}

impl EngineEvent {
    pub fn fatal(kind: ErrorKind, details: impl Into<String>) -> Self {
        EngineEvent::Error {
            fatal: true,
            kind,
            details: details.into(),
        }
    }

    pub fn non_fatal(kind: ErrorKind, details: impl Into<String>) -> Self {
        EngineEvent::Error {
            fatal: false,
            kind,
            details: details.into(),
        }
    }
}

/// Events emitted by the media sink
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SinkEvent {
    LoadedMetadata,
    TimeUpdate,
    Waiting,
    Playing,
    Ended,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlayerEvent {
    Engine { session: SessionId, event: EngineEvent },
    Sink(SinkEvent),
}

/// Create the single ordered channel all collaborator events travel on.
pub fn event_channel() -> (EventSender, EventReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSender { tx }, EventReceiver { rx })
}

#[derive(Clone)]
pub struct EventSender {
    tx: UnboundedSender<PlayerEvent>,
}

impl EventSender {
    /// Emitter to hand to a media sink implementation.
    pub fn sink_emitter(&self) -> SinkEmitter {
        SinkEmitter { tx: self.tx.clone() }
    }

    pub(crate) fn for_session(&self, session: SessionId) -> EngineEmitter {
        EngineEmitter {
            session,
            tx: self.tx.clone(),
        }
    }
}

pub struct EventReceiver {
    rx: UnboundedReceiver<PlayerEvent>,
}

impl EventReceiver {
    pub async fn recv(&mut self) -> Option<PlayerEvent> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<PlayerEvent> {
        self.rx.try_recv().ok()
    }
}

/// Sending half given to one engine instance; stamps its session id.
#[derive(Clone)]
pub struct EngineEmitter {
    session: SessionId,
    tx: UnboundedSender<PlayerEvent>,
}

impl EngineEmitter {
    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Returns `false` once the player has stopped listening.
    pub fn emit(&self, event: EngineEvent) -> bool {
        self.tx
            .send(PlayerEvent::Engine {
                session: self.session,
                event,
            })
            .is_ok()
    }
}

#[derive(Clone)]
pub struct SinkEmitter {
    tx: UnboundedSender<PlayerEvent>,
}

impl SinkEmitter {
    pub fn emit(&self, event: SinkEvent) -> bool {
        self.tx.send(PlayerEvent::Sink(event)).is_ok()
    }
}

/// One decoding session of a segmented-stream engine.
pub trait DecodingEngine: Send {
    /// Bind to the sink. The engine answers with [`EngineEvent::MediaAttached`].
    fn attach_media(&mut self, sink: &mut dyn MediaSink);

    fn load_source(&mut self, locator: &str);

    /// Resume loading after a network failure.
    fn start_load(&mut self);

    /// Engine-specific soft reset after a decode failure.
    fn recover_media_error(&mut self);

    /// Tear the session down. Must be complete when this returns; the engine
    /// may not emit anything afterwards that it expects to be acted on.
    fn destroy(self: Box<Self>);
}

/// Builds one [`DecodingEngine`] per session.
pub trait EngineFactory: Send {
    fn is_supported(&self) -> bool {
        true
    }

    fn create(&self, events: EngineEmitter) -> anyhow::Result<Box<dyn DecodingEngine>>;
}

/// Element the decoded media is rendered into.
#[cfg_attr(test, unimock::unimock(api = MediaSinkMock))]
pub trait MediaSink: Send {
    fn play(&mut self);
    fn pause(&mut self);
    fn is_paused(&self) -> bool;
    fn is_ended(&self) -> bool;
    fn is_muted(&self) -> bool;
    fn set_muted(&mut self, muted: bool);
    fn current_time(&self) -> Duration;
    fn set_current_time(&mut self, position: Duration);
    /// `None` until the media duration is known.
    fn duration(&self) -> Option<Duration>;
}

/// Loading indicator shown while a manifest is being fetched.
#[cfg_attr(test, unimock::unimock(api = LoaderNotifierMock))]
pub trait LoaderNotifier: Send + Sync {
    fn show_loader(&self);
    fn hide_loader(&self);
}
