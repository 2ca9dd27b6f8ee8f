//! Collaborator doubles for unit tests.
//!
//! Engines are recorded by hand: every factory and engine call lands in a
//! shared [`Journal`] tagged with its session, so tests can assert on the
//! order sessions are created, attached and destroyed. The sink and loader
//! are `unimock` mocks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use unimock::{MockFn, Unimock, matching};

use crate::config::RetryPolicy;
use crate::controller::PlaybackController;
use crate::engine::{
    DecodingEngine, EngineEmitter, EngineEvent, EngineFactory, EventReceiver,
    LoaderNotifierMock, MediaSink, MediaSinkMock, SinkEvent, event_channel,
};
use crate::model::{PlaylistStore, SessionId, StreamItem};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    Create(SessionId),
    Attach(SessionId),
    LoadSource(SessionId, String),
    StartLoad(SessionId),
    RecoverMedia(SessionId),
    Destroy(SessionId),
}

#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<Call>>>);

impl Journal {
    pub fn push(&self, call: Call) {
        self.0.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, call: &Call) -> usize {
        self.calls().iter().filter(|c| *c == call).count()
    }

    pub fn contains(&self, call: &Call) -> bool {
        self.count(call) > 0
    }

    pub fn position(&self, call: &Call) -> Option<usize> {
        self.calls().iter().position(|c| c == call)
    }

    /// Sessions created and not yet destroyed.
    pub fn live_sessions(&self) -> usize {
        let calls = self.calls();
        let created = calls.iter().filter(|c| matches!(c, Call::Create(_))).count();
        let destroyed = calls.iter().filter(|c| matches!(c, Call::Destroy(_))).count();
        created - destroyed
    }
}

/// Switches shared with a [`RecordingFactory`] after it was handed over
#[derive(Clone, Default)]
pub struct FactoryControl {
    unsupported: Arc<AtomicBool>,
    fail_create: Arc<AtomicBool>,
    auto_events: Arc<AtomicBool>,
}

impl FactoryControl {
    pub fn set_supported(&self, supported: bool) {
        self.unsupported.store(!supported, Ordering::SeqCst);
    }

    pub fn fail_create(&self) {
        self.fail_create.store(true, Ordering::SeqCst);
    }

    /// Make engines emit the happy-path lifecycle on their own.
    pub fn auto_events(&self) {
        self.auto_events.store(true, Ordering::SeqCst);
    }
}

pub struct RecordingFactory {
    journal: Journal,
    control: FactoryControl,
}

impl RecordingFactory {
    pub fn new(journal: Journal, control: FactoryControl) -> Self {
        Self { journal, control }
    }
}

impl EngineFactory for RecordingFactory {
    fn is_supported(&self) -> bool {
        !self.control.unsupported.load(Ordering::SeqCst)
    }

    fn create(&self, events: EngineEmitter) -> anyhow::Result<Box<dyn DecodingEngine>> {
        if self.control.fail_create.load(Ordering::SeqCst) {
            anyhow::bail!("engine construction refused");
        }
        self.journal.push(Call::Create(events.session()));
        Ok(Box::new(RecordingEngine {
            journal: self.journal.clone(),
            auto: self.control.auto_events.load(Ordering::SeqCst),
            events,
        }))
    }
}

pub struct RecordingEngine {
    journal: Journal,
    auto: bool,
    events: EngineEmitter,
}

impl DecodingEngine for RecordingEngine {
    fn attach_media(&mut self, _sink: &mut dyn MediaSink) {
        self.journal.push(Call::Attach(self.events.session()));
        if self.auto {
            self.events.emit(EngineEvent::MediaAttached);
        }
    }

    fn load_source(&mut self, locator: &str) {
        self.journal
            .push(Call::LoadSource(self.events.session(), locator.to_string()));
        if self.auto {
            self.events.emit(EngineEvent::ManifestLoading);
            self.events.emit(EngineEvent::ManifestParsed);
            self.events.emit(EngineEvent::FragLoaded);
        }
    }

    fn start_load(&mut self) {
        self.journal.push(Call::StartLoad(self.events.session()));
    }

    fn recover_media_error(&mut self) {
        self.journal.push(Call::RecoverMedia(self.events.session()));
    }

    fn destroy(self: Box<Self>) {
        self.journal.push(Call::Destroy(self.events.session()));
    }
}

/// Sink stub that starts paused and accepts every command.
pub fn idle_sink() -> Unimock {
    Unimock::new((
        (
            MediaSinkMock::is_paused
                .each_call(matching!())
                .returns(true)
                .at_least_times(0),
            MediaSinkMock::is_ended
                .each_call(matching!())
                .returns(false)
                .at_least_times(0),
            MediaSinkMock::is_muted
                .each_call(matching!())
                .returns(false)
                .at_least_times(0),
        ),
        (
            MediaSinkMock::play
                .each_call(matching!())
                .returns(())
                .at_least_times(0),
            MediaSinkMock::pause
                .each_call(matching!())
                .returns(())
                .at_least_times(0),
            MediaSinkMock::set_muted
                .each_call(matching!(_))
                .returns(())
                .at_least_times(0),
        ),
        (
            MediaSinkMock::current_time
                .each_call(matching!())
                .returns(Duration::ZERO)
                .at_least_times(0),
            MediaSinkMock::set_current_time
                .each_call(matching!(_))
                .returns(())
                .at_least_times(0),
            MediaSinkMock::duration
                .each_call(matching!())
                .returns(None::<Duration>)
                .at_least_times(0),
        ),
    ))
    .no_verify_in_drop()
}

/// Loader stub that accepts any number of show/hide calls.
pub fn quiet_loader() -> Unimock {
    Unimock::new((
        LoaderNotifierMock::show_loader
            .each_call(matching!())
            .returns(())
            .at_least_times(0),
        LoaderNotifierMock::hide_loader
            .each_call(matching!())
            .returns(())
            .at_least_times(0),
    ))
    .no_verify_in_drop()
}

/// A controller wired to a recording engine factory plus sink and loader
/// mocks.
pub struct Harness {
    pub controller: PlaybackController,
    pub journal: Journal,
    pub playlist: PlaylistStore,
    pub factory_state: FactoryControl,
    _events: EventReceiver,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_policy(RetryPolicy::default())
    }

    pub fn with_policy(retry: RetryPolicy) -> Self {
        Self::build(retry, idle_sink(), quiet_loader())
    }

    /// Use scripted sink and loader mocks; their expectations are checked
    /// when the harness is dropped.
    pub fn with_mocks(sink: Unimock, loader: Unimock) -> Self {
        Self::build(RetryPolicy::default(), sink, loader)
    }

    fn build(retry: RetryPolicy, sink: Unimock, loader: Unimock) -> Self {
        let journal = Journal::default();
        let factory_state = FactoryControl::default();
        let (sender, events) = event_channel();
        let playlist = PlaylistStore::new();

        let controller = PlaybackController::new(
            Box::new(RecordingFactory::new(journal.clone(), factory_state.clone())),
            Box::new(sink),
            Arc::new(loader),
            sender,
            playlist.clone(),
            retry,
        );

        Self {
            controller,
            journal,
            playlist,
            factory_state,
            _events: events,
        }
    }

    pub fn start(&mut self, src: &str) {
        self.controller.setup_player(StreamItem::new(src));
    }

    /// Deliver an engine event as coming from the live session.
    pub fn engine(&mut self, event: EngineEvent) {
        let session = self
            .controller
            .session_id()
            .expect("no live session to deliver to");
        self.controller.handle_engine_event(session, event);
    }

    pub fn sink(&mut self, event: SinkEvent) {
        self.controller.handle_sink_event(event);
    }
}
