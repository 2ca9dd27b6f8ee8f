//! Core type definitions for the player

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A playable entry: a source locator plus optional display metadata.
///
/// Playlist lookups compare the locator only, never the metadata.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamItem {
    pub src: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl StreamItem {
    pub fn new(src: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            title: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn same_source(&self, other: &StreamItem) -> bool {
        self.src == other.src
    }

    pub fn display_name(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.src)
    }
}

/// Identifies one decoding session; engine events carry the id of the
/// session that produced them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub(crate) u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle state of the active decoding session
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Attaching,
    ManifestLoading,
    Ready,
    Playing,
    Buffering,
    Ended,
    Error,
}

impl SessionState {
    /// States in which the session's media has reached the sink, so an
    /// end-of-stream from the sink belongs to this session.
    pub fn is_streaming(self) -> bool {
        matches!(
            self,
            SessionState::Ready | SessionState::Playing | SessionState::Buffering
        )
    }
}

/// Progress bar model: `max` stays unset until the media duration is known.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct ProgressState {
    pub max: Option<Duration>,
    pub value: Duration,
}

impl ProgressState {
    pub fn ratio(&self) -> f64 {
        match self.max {
            Some(max) if !max.is_zero() => {
                (self.value.as_secs_f64() / max.as_secs_f64()).clamp(0.0, 1.0)
            }
            _ => 0.0,
        }
    }
}

/// UI-facing playback state; written only by the session controller
#[derive(Clone, Debug, Default)]
pub struct PlaybackUiState {
    pub ready: bool,
    pub error_message: Option<String>,
    pub error_raised_at: Option<DateTime<Utc>>,
    pub state: SessionState,
    pub current: Option<StreamItem>,
    pub progress: ProgressState,
    pub paused: bool,
    pub muted: bool,
}

impl PlaybackUiState {
    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error_message = Some(message.into());
        self.error_raised_at = Some(Utc::now());
    }

    pub fn clear_error(&mut self) {
        self.error_message = None;
        self.error_raised_at = None;
    }

    pub fn has_error(&self) -> bool {
        self.error_message.is_some()
    }
}
