//! Model module - Player state and data types
//!
//! - `types`: Core type definitions (stream items, session state, UI state)
//! - `playlist`: Playlist store and current-stream subscription
//! - `playback`: Progress bookkeeping and time formatting

mod types;
mod playback;
pub mod playlist;

pub use types::{
    PlaybackUiState, ProgressState, SessionId, SessionState, StreamItem,
};

pub use playback::{format_position, position_at_fraction};

pub use playlist::{CurrentStream, PlaylistStore};
