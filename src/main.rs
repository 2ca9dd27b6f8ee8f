use std::sync::Arc;

use anyhow::{Context, Result};

use hlsplay::model::{format_position, playlist::load_playlist};
use hlsplay::sim::{SimulatedEngineFactory, SimulatedSink, TracingLoader};
use hlsplay::{
    Collaborators, PlaybackCoordinator, PlaybackUiState, PlayerConfig, PlaylistStore,
    SessionState, event_channel, logging,
};

#[tokio::main]
async fn main() -> Result<()> {
    let config = PlayerConfig::from_env().context("loading configuration")?;

    if let Err(e) = logging::init_logging(config.log_filter.as_deref()) {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }

    tracing::info!("=== hlsplay starting ===");

    let playlist_path = std::env::args()
        .nth(1)
        .context("usage: hlsplay <playlist.json>")?;
    let items = load_playlist(&playlist_path)
        .with_context(|| format!("reading playlist {}", playlist_path))?;

    let events = event_channel();
    let sink = SimulatedSink::new(events.0.sink_emitter(), &config.simulation);
    let playlist = PlaylistStore::new();

    let (coordinator, handle) = PlaybackCoordinator::new(
        &config,
        playlist.clone(),
        Collaborators {
            factory: Box::new(SimulatedEngineFactory),
            sink: Box::new(sink),
            loader: Arc::new(TracingLoader),
        },
        events,
    );
    let coordinator = tokio::spawn(coordinator.run());

    let first = items.first().cloned();
    match handle.set_stream_list(items) {
        Ok(len) => println!("Loaded {} streams", len),
        Err(e) => println!("Playlist not loaded: {}", e),
    }
    if let Err(e) = handle.set_stream(first) {
        println!("Nothing to play: {}", e);
    }

    let mut ui = handle.ui_state();
    let mut last_line = String::new();
    loop {
        tokio::select! {
            changed = ui.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted");
                break;
            }
        }

        let state = ui.borrow_and_update().clone();
        let line = status_line(&state);
        if line != last_line {
            println!("{}", line);
            last_line = line;
        }

        let finished = match state.state {
            SessionState::Error => true,
            SessionState::Ended => playlist.has_next(state.current.as_ref()).is_none(),
            _ => false,
        };
        if finished {
            break;
        }
    }

    let _ = handle.shutdown();
    match coordinator.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::error!(error = %e, "Player stopped with an error"),
        Err(e) => tracing::error!(error = %e, "Player task failed"),
    }

    tracing::info!("hlsplay shutting down");
    Ok(())
}

fn status_line(state: &PlaybackUiState) -> String {
    let name = state
        .current
        .as_ref()
        .map(|item| item.display_name().to_string())
        .unwrap_or_else(|| "-".to_string());
    let mut line = format!(
        "[{:?}] {} {:>3.0}% {} / {}",
        state.state,
        name,
        state.progress.ratio() * 100.0,
        format_position(state.progress.value),
        state
            .progress
            .max
            .map(format_position)
            .unwrap_or_else(|| "?".to_string()),
    );
    if let Some(message) = &state.error_message {
        line.push_str(&format!(" ({})", message));
    }
    line
}
