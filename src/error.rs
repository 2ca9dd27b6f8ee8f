//! Error types shared across the crate

use std::io;

/// Input that a playlist setter refused to apply.
///
/// The store is left untouched whenever one of these is returned, so callers
/// can tell an ignored call apart from one that changed state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InputRejected {
    #[error("playlist is empty")]
    EmptyPlaylist,

    #[error("no stream given")]
    NoStream,
}

/// Failures surfaced by the player outside of the playback state machine.
///
/// Transient and fatal engine errors never show up here: they are handled by
/// the session controller and reported through the UI state instead.
#[derive(Debug, thiserror::Error)]
pub enum PlayerError {
    #[error("HLS playback is not supported by this engine")]
    EngineUnsupported,

    #[error("playback coordinator has stopped")]
    CoordinatorStopped,

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type PlayerResult<T> = Result<T, PlayerError>;
