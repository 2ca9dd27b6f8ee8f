//! Playback controller for segmented (HLS-style) streaming media.
//!
//! A [`PlaybackCoordinator`] watches the [`PlaylistStore`]'s current item and
//! starts a decoding session for each new one through the
//! [`PlaybackController`]. The controller reacts to engine and sink events,
//! recovers from transient failures, and advances the playlist when a stream
//! ends.

pub mod config;
pub mod controller;
pub mod coordinator;
pub mod engine;
pub mod error;
pub mod logging;
pub mod model;
pub mod sim;

#[cfg(test)]
mod testing;

pub use config::{PlayerConfig, RetryPolicy};
pub use controller::PlaybackController;
pub use coordinator::{Collaborators, PlaybackCoordinator, PlayerCommand, PlayerHandle};
pub use engine::{
    DecodingEngine, EngineEmitter, EngineEvent, EngineFactory, ErrorKind, EventReceiver,
    EventSender, LoaderNotifier, MediaSink, PlayerEvent, SinkEmitter, SinkEvent, event_channel,
};
pub use error::{InputRejected, PlayerError, PlayerResult};
pub use model::{PlaybackUiState, PlaylistStore, SessionState, StreamItem};
