//! Playback coordinator: ties playlist changes to session (re)creation.
//!
//! The coordinator runs as one task that owns the session controller. It
//! waits on three sources at once: commands from [`PlayerHandle`]s, the
//! playlist's current-item subscription, and the engine/sink event channel.
//! Every state transition therefore happens on that single task.

use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::watch;

use crate::config::PlayerConfig;
use crate::controller::PlaybackController;
use crate::engine::{EngineFactory, EventReceiver, EventSender, LoaderNotifier, MediaSink};
use crate::error::{InputRejected, PlayerError, PlayerResult};
use crate::model::{PlaybackUiState, PlaylistStore, StreamItem};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PlayerCommand {
    TogglePlayback,
    ToggleMute,
    /// Seek to a fraction of the duration, in [0, 1].
    Seek(f64),
    Shutdown,
}

/// The external pieces a player is assembled from
pub struct Collaborators {
    pub factory: Box<dyn EngineFactory>,
    pub sink: Box<dyn MediaSink>,
    pub loader: Arc<dyn LoaderNotifier>,
}

pub struct PlaybackCoordinator {
    controller: PlaybackController,
    playlist: PlaylistStore,
    events: EventReceiver,
    commands: UnboundedReceiver<PlayerCommand>,
}

impl PlaybackCoordinator {
    /// Assemble a player. `events` must be the channel the sink was built
    /// with; engines get their emitters from it as sessions are created.
    pub fn new(
        config: &PlayerConfig,
        playlist: PlaylistStore,
        collaborators: Collaborators,
        events: (EventSender, EventReceiver),
    ) -> (Self, PlayerHandle) {
        let (sender, receiver) = events;
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();

        let controller = PlaybackController::new(
            collaborators.factory,
            collaborators.sink,
            collaborators.loader,
            sender,
            playlist.clone(),
            config.retry,
        );

        let handle = PlayerHandle {
            playlist: playlist.clone(),
            commands: commands_tx,
            ui: controller.subscribe_ui(),
        };

        let coordinator = Self {
            controller,
            playlist,
            events: receiver,
            commands: commands_rx,
        };

        (coordinator, handle)
    }

    /// Drive playback until shut down or every handle is dropped.
    pub async fn run(mut self) -> PlayerResult<()> {
        if !self.controller.engine_supported() {
            self.controller.report_unsupported();
            return Err(PlayerError::EngineUnsupported);
        }

        let mut current = self.playlist.current_stream();
        tracing::info!("Playback coordinator started");

        loop {
            tokio::select! {
                biased;

                command = self.commands.recv() => match command {
                    Some(PlayerCommand::Shutdown) | None => break,
                    Some(command) => self.apply(command),
                },
                Some(event) = self.events.recv() => {
                    self.controller.handle_event(event);
                }
                item = current.next() => match item {
                    Some(item) => self.on_current_item(item),
                    None => break,
                },
            }
        }

        self.controller.shutdown();
        tracing::info!("Playback coordinator stopped");
        Ok(())
    }

    fn on_current_item(&mut self, item: StreamItem) {
        if item.src.is_empty() {
            tracing::debug!("Current stream has no source locator, not playing it");
            return;
        }
        self.controller.clear_error();
        self.controller.setup_player(item);
    }

    fn apply(&mut self, command: PlayerCommand) {
        tracing::trace!(?command, "Applying player command");
        match command {
            PlayerCommand::TogglePlayback => self.controller.toggle_playback(),
            PlayerCommand::ToggleMute => self.controller.toggle_mute(),
            PlayerCommand::Seek(fraction) => {
                if self.controller.seek_to_fraction(fraction).is_none() {
                    tracing::debug!(fraction, "Seek ignored, duration unknown");
                }
            }
            PlayerCommand::Shutdown => self.controller.shutdown(),
        }
    }
}

/// Cloneable front end to a running coordinator
#[derive(Clone)]
pub struct PlayerHandle {
    playlist: PlaylistStore,
    commands: UnboundedSender<PlayerCommand>,
    ui: watch::Receiver<PlaybackUiState>,
}

impl PlayerHandle {
    pub fn set_stream_list(&self, items: Vec<StreamItem>) -> Result<usize, InputRejected> {
        self.playlist.set_list(items)
    }

    pub fn set_stream(&self, item: Option<StreamItem>) -> Result<(), InputRejected> {
        self.playlist.set_current(item)
    }

    pub fn playlist(&self) -> &PlaylistStore {
        &self.playlist
    }

    pub fn toggle_playback(&self) -> PlayerResult<()> {
        self.send(PlayerCommand::TogglePlayback)
    }

    pub fn toggle_mute(&self) -> PlayerResult<()> {
        self.send(PlayerCommand::ToggleMute)
    }

    pub fn seek(&self, fraction: f64) -> PlayerResult<()> {
        self.send(PlayerCommand::Seek(fraction))
    }

    pub fn shutdown(&self) -> PlayerResult<()> {
        self.send(PlayerCommand::Shutdown)
    }

    pub fn ui_state(&self) -> watch::Receiver<PlaybackUiState> {
        self.ui.clone()
    }

    pub fn snapshot(&self) -> PlaybackUiState {
        self.ui.borrow().clone()
    }

    fn send(&self, command: PlayerCommand) -> PlayerResult<()> {
        self.commands
            .send(command)
            .map_err(|_| PlayerError::CoordinatorStopped)
    }
}
