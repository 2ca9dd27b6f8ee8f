//! Playlist store: the ordered stream list and the current item.
//!
//! The store is a cheap cloneable handle. Every clone sees the same list,
//! the same current item and the same subscribers. Subscribers receive every
//! `set_current` in order, and a new subscriber is immediately handed the
//! current item (if any) so late subscribers never miss what is playing.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::error::{InputRejected, PlayerResult};
use super::types::StreamItem;

#[derive(Default)]
struct PlaylistInner {
    items: Vec<StreamItem>,
    current: Option<StreamItem>,
    subscribers: Vec<UnboundedSender<StreamItem>>,
}

#[derive(Clone, Default)]
pub struct PlaylistStore {
    inner: Arc<Mutex<PlaylistInner>>,
}

impl PlaylistStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, PlaylistInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the whole list. Returns the new length.
    ///
    /// An empty list is rejected and leaves the previous list in place. The
    /// current item is never touched.
    pub fn set_list(&self, items: Vec<StreamItem>) -> Result<usize, InputRejected> {
        if items.is_empty() {
            tracing::debug!("Ignoring empty stream list");
            return Err(InputRejected::EmptyPlaylist);
        }

        let len = items.len();
        self.lock().items = items;
        tracing::info!(len, "Stream list replaced");
        Ok(len)
    }

    /// Publish `item` as the current stream to every subscriber.
    pub fn set_current(&self, item: Option<StreamItem>) -> Result<(), InputRejected> {
        let Some(item) = item else {
            tracing::debug!("Ignoring empty current stream");
            return Err(InputRejected::NoStream);
        };

        let mut inner = self.lock();
        tracing::info!(src = %item.src, subscribers = inner.subscribers.len(), "Current stream changed");
        inner.current = Some(item.clone());
        inner.subscribers.retain(|tx| tx.send(item.clone()).is_ok());
        Ok(())
    }

    /// Subscribe to current-item changes, starting with the current item.
    pub fn current_stream(&self) -> CurrentStream {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.lock();
        if let Some(current) = &inner.current {
            // The receiver is alive in this scope, so this cannot fail.
            let _ = tx.send(current.clone());
        }
        inner.subscribers.push(tx);
        CurrentStream { rx }
    }

    pub fn current(&self) -> Option<StreamItem> {
        self.lock().current.clone()
    }

    pub fn items(&self) -> Vec<StreamItem> {
        self.lock().items.clone()
    }

    /// Item following the first entry whose locator matches `item`.
    ///
    /// `None` when there is no item, no list, no match, or the match is last.
    pub fn has_next(&self, item: Option<&StreamItem>) -> Option<StreamItem> {
        let item = item?;
        let inner = self.lock();
        let index = inner.items.iter().position(|e| e.same_source(item))?;
        inner
            .items
            .get(index + 1)
            .filter(|next| !next.src.is_empty())
            .cloned()
    }

    /// Make the item after `item` current. Returns the new current item, or
    /// `None` when there was nothing to advance to (and nothing changed).
    pub fn advance(&self, item: Option<&StreamItem>) -> Option<StreamItem> {
        let next = self.has_next(item)?;
        // set_current only rejects a missing item.
        self.set_current(Some(next.clone())).ok()?;
        Some(next)
    }
}

/// Receiving side of [`PlaylistStore::current_stream`].
pub struct CurrentStream {
    rx: UnboundedReceiver<StreamItem>,
}

impl CurrentStream {
    /// Wait for the next current-item notification.
    pub async fn next(&mut self) -> Option<StreamItem> {
        self.rx.recv().await
    }

    /// Take an already delivered notification without waiting.
    pub fn try_next(&mut self) -> Option<StreamItem> {
        self.rx.try_recv().ok()
    }
}

/// Read a playlist file: a JSON array of `{ "src": ..., "title": ... }`.
pub fn load_playlist(path: impl AsRef<Path>) -> PlayerResult<Vec<StreamItem>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    let items: Vec<StreamItem> = serde_json::from_str(&content)?;
    tracing::debug!(path = %path.display(), len = items.len(), "Playlist file loaded");
    Ok(items)
}
