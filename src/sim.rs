//! Scripted collaborators for running the player without a real decoder.
//!
//! The simulated engine walks every source through the normal lifecycle
//! (attached, manifest loading, manifest parsed, fragment loaded). A source
//! locator can ask for a failure through its fragment:
//!
//! - `#fail=network`: one fatal network error, recovered by `start_load`
//! - `#fail=media`: one fatal media error, recovered by `recover_media_error`
//! - `#fail=fatal`: an unrecoverable error
//!
//! The simulated sink "plays" a clip of fixed length on a tokio timer and
//! reports progress and end of stream like a media element would.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::config::SimulationConfig;
use crate::engine::{
    DecodingEngine, EngineEmitter, EngineEvent, EngineFactory, ErrorKind, LoaderNotifier,
    MediaSink, SinkEmitter, SinkEvent,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ScriptedFailure {
    Network,
    Media,
    Fatal,
}

impl ScriptedFailure {
    fn from_locator(locator: &str) -> Option<Self> {
        let (_, fragment) = locator.split_once('#')?;
        fragment
            .split('&')
            .filter_map(|pair| pair.strip_prefix("fail="))
            .find_map(|value| match value {
                "network" => Some(ScriptedFailure::Network),
                "media" => Some(ScriptedFailure::Media),
                "fatal" => Some(ScriptedFailure::Fatal),
                _ => None,
            })
    }
}

#[derive(Default)]
pub struct SimulatedEngineFactory;

impl EngineFactory for SimulatedEngineFactory {
    fn create(&self, events: EngineEmitter) -> anyhow::Result<Box<dyn DecodingEngine>> {
        tracing::debug!(session = %events.session(), "Creating simulated engine");
        Ok(Box::new(SimulatedEngine {
            events,
            pending: None,
        }))
    }
}

pub struct SimulatedEngine {
    events: EngineEmitter,
    /// Failure raised and waiting for its recovery call.
    pending: Option<ScriptedFailure>,
}

impl DecodingEngine for SimulatedEngine {
    fn attach_media(&mut self, sink: &mut dyn MediaSink) {
        sink.pause();
        sink.set_current_time(Duration::ZERO);
        self.events.emit(EngineEvent::MediaAttached);
    }

    fn load_source(&mut self, locator: &str) {
        self.events.emit(EngineEvent::ManifestLoading);
        self.events.emit(EngineEvent::ManifestParsed);

        match ScriptedFailure::from_locator(locator) {
            Some(ScriptedFailure::Network) => {
                self.pending = Some(ScriptedFailure::Network);
                self.events
                    .emit(EngineEvent::fatal(ErrorKind::Network, "scripted fragment load error"));
            }
            Some(ScriptedFailure::Media) => {
                self.pending = Some(ScriptedFailure::Media);
                self.events
                    .emit(EngineEvent::fatal(ErrorKind::Media, "scripted buffer append error"));
            }
            Some(ScriptedFailure::Fatal) => {
                self.events
                    .emit(EngineEvent::fatal(ErrorKind::Other, "scripted unrecoverable error"));
            }
            None => {
                self.events.emit(EngineEvent::FragLoaded);
            }
        }
    }

    fn start_load(&mut self) {
        if self.pending.take_if(|f| *f == ScriptedFailure::Network).is_some() {
            self.events.emit(EngineEvent::FragLoaded);
        }
    }

    fn recover_media_error(&mut self) {
        if self.pending.take_if(|f| *f == ScriptedFailure::Media).is_some() {
            self.events.emit(EngineEvent::FragLoaded);
        }
    }

    fn destroy(self: Box<Self>) {
        tracing::debug!(session = %self.events.session(), "Simulated engine destroyed");
    }
}

#[derive(Debug, Default)]
struct Clock {
    position: Duration,
    paused: bool,
    ended: bool,
    muted: bool,
}

pub struct SimulatedSink {
    events: SinkEmitter,
    clock: Arc<Mutex<Clock>>,
    clip_length: Duration,
    tick: Duration,
    ticker: Option<JoinHandle<()>>,
}

impl SimulatedSink {
    pub fn new(events: SinkEmitter, config: &SimulationConfig) -> Self {
        Self {
            events,
            clock: Arc::new(Mutex::new(Clock {
                paused: true,
                ..Default::default()
            })),
            clip_length: config.clip_length(),
            tick: config.tick(),
            ticker: None,
        }
    }

    fn clock(&self) -> MutexGuard<'_, Clock> {
        lock_clock(&self.clock)
    }

    fn stop_ticker(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }

    fn start_ticker(&mut self) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("Simulated sink played outside a tokio runtime, clock not started");
            return;
        };

        let clock = self.clock.clone();
        let events = self.events.clone();
        let clip_length = self.clip_length;
        let tick = self.tick;

        self.ticker = Some(runtime.spawn(async move {
            let mut interval = tokio::time::interval(tick);
            interval.tick().await;
            loop {
                interval.tick().await;
                let finished = {
                    let mut clock = lock_clock(&clock);
                    if clock.paused {
                        return;
                    }
                    clock.position = (clock.position + tick).min(clip_length);
                    if clock.position >= clip_length {
                        clock.paused = true;
                        clock.ended = true;
                    }
                    clock.ended
                };

                events.emit(SinkEvent::TimeUpdate);
                if finished {
                    events.emit(SinkEvent::Ended);
                    return;
                }
            }
        }));
    }
}

fn lock_clock(clock: &Mutex<Clock>) -> MutexGuard<'_, Clock> {
    clock.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MediaSink for SimulatedSink {
    fn play(&mut self) {
        self.stop_ticker();
        let from_start = {
            let mut clock = self.clock();
            if clock.ended {
                clock.position = Duration::ZERO;
                clock.ended = false;
            }
            clock.paused = false;
            clock.position.is_zero()
        };

        if from_start {
            self.events.emit(SinkEvent::LoadedMetadata);
        }
        self.events.emit(SinkEvent::Playing);
        self.start_ticker();
    }

    fn pause(&mut self) {
        self.clock().paused = true;
        self.stop_ticker();
    }

    fn is_paused(&self) -> bool {
        self.clock().paused
    }

    fn is_ended(&self) -> bool {
        self.clock().ended
    }

    fn is_muted(&self) -> bool {
        self.clock().muted
    }

    fn set_muted(&mut self, muted: bool) {
        self.clock().muted = muted;
    }

    fn current_time(&self) -> Duration {
        self.clock().position
    }

    fn set_current_time(&mut self, position: Duration) {
        let mut clock = self.clock();
        clock.position = position.min(self.clip_length);
        clock.ended = false;
    }

    fn duration(&self) -> Option<Duration> {
        Some(self.clip_length)
    }
}

impl Drop for SimulatedSink {
    fn drop(&mut self) {
        self.stop_ticker();
    }
}

/// Loader indicator that only logs.
#[derive(Default)]
pub struct TracingLoader;

impl LoaderNotifier for TracingLoader {
    fn show_loader(&self) {
        tracing::info!("Loader shown");
    }

    fn hide_loader(&self) {
        tracing::info!("Loader hidden");
    }
}
