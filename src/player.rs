//! Player capabilities
//!
//! The external player is owned by someone else (the user's active Spotify
//! device). We only read its current entry and status and send it commands.
//! Change notifications carry no payload: observers are told *that* the
//! queue moved and pull `current_entry` themselves.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;

use crate::model::{PlaybackStatus, PlayableItem};

#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
    #[error("Playback queue is empty.")]
    MissingQueue,
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Starts playback of a queue on the external player
#[async_trait]
pub trait PlaybackControl: Send + Sync {
    async fn start_playback(
        &self,
        queue: &[PlayableItem],
        starting_at: &PlayableItem,
    ) -> Result<(), PlaybackError>;
}

/// Read/command access to the externally owned player
#[async_trait]
pub trait ExternalPlayer: Send + Sync {
    async fn current_entry(&self) -> Result<Option<PlayableItem>>;

    async fn playback_status(&self) -> Result<PlaybackStatus>;

    async fn play(&self) -> Result<()>;

    async fn pause(&self) -> Result<()>;

    /// Subscribe to queue change notifications. The value is a change
    /// counter; only its movement matters.
    fn queue_changes(&self) -> watch::Receiver<u64>;
}

/// Playback control that accepts everything and does nothing
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopPlaybackControl;

#[async_trait]
impl PlaybackControl for NoopPlaybackControl {
    async fn start_playback(
        &self,
        queue: &[PlayableItem],
        starting_at: &PlayableItem,
    ) -> Result<(), PlaybackError> {
        tracing::debug!(
            queue_len = queue.len(),
            track_id = %starting_at.id,
            "No-op playback start"
        );
        Ok(())
    }
}

struct FixtureState {
    current: Option<PlayableItem>,
    status: PlaybackStatus,
}

/// In-memory player for headless runs and tests
#[derive(Clone)]
pub struct FixturePlayer {
    state: Arc<Mutex<FixtureState>>,
    changes: Arc<watch::Sender<u64>>,
}

impl FixturePlayer {
    pub fn new() -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            state: Arc::new(Mutex::new(FixtureState {
                current: None,
                status: PlaybackStatus::Paused,
            })),
            changes: Arc::new(changes),
        }
    }

    /// Replace the current entry as if another device changed it.
    #[cfg(test)]
    pub fn set_current_entry(&self, item: Option<PlayableItem>) {
        self.lock().current = item;
        self.changes.send_modify(|counter| *counter += 1);
    }

    #[cfg(test)]
    pub fn set_status(&self, status: PlaybackStatus) {
        self.lock().status = status;
    }

    #[cfg(test)]
    pub fn status(&self) -> PlaybackStatus {
        self.lock().status
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FixtureState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for FixturePlayer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlaybackControl for FixturePlayer {
    async fn start_playback(
        &self,
        queue: &[PlayableItem],
        starting_at: &PlayableItem,
    ) -> Result<(), PlaybackError> {
        if queue.is_empty() {
            return Err(PlaybackError::MissingQueue);
        }
        {
            let mut state = self.lock();
            state.current = Some(starting_at.clone());
            state.status = PlaybackStatus::Playing;
        }
        self.changes.send_modify(|counter| *counter += 1);
        Ok(())
    }
}

#[async_trait]
impl ExternalPlayer for FixturePlayer {
    async fn current_entry(&self) -> Result<Option<PlayableItem>> {
        Ok(self.lock().current.clone())
    }

    async fn playback_status(&self) -> Result<PlaybackStatus> {
        Ok(self.lock().status)
    }

    async fn play(&self) -> Result<()> {
        self.lock().status = PlaybackStatus::Playing;
        Ok(())
    }

    async fn pause(&self) -> Result<()> {
        self.lock().status = PlaybackStatus::Paused;
        Ok(())
    }

    fn queue_changes(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str) -> PlayableItem {
        PlayableItem {
            id: id.to_string(),
            uri: format!("spotify:track:{}", id),
            title: id.to_string(),
            artist: "Artist".to_string(),
            album: "Album".to_string(),
            duration_ms: 0,
            artwork: None,
        }
    }

    #[tokio::test]
    async fn fixture_player_rejects_empty_queue() {
        let player = FixturePlayer::new();
        let result = player.start_playback(&[], &item("1")).await;
        assert!(matches!(result, Err(PlaybackError::MissingQueue)));
        assert!(player.current_entry().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn entry_changes_notify_subscribers() {
        let player = FixturePlayer::new();
        let mut changes = player.queue_changes();

        player.set_current_entry(Some(item("1")));

        assert!(changes.has_changed().unwrap());
        changes.borrow_and_update();
        assert_eq!(player.current_entry().await.unwrap().unwrap().id, "1");
        assert!(!changes.has_changed().unwrap());
    }

    #[tokio::test]
    async fn start_playback_moves_current_entry() {
        let player = FixturePlayer::new();
        let queue = vec![item("1"), item("2")];
        player.start_playback(&queue, &queue[1]).await.unwrap();
        assert_eq!(player.current_entry().await.unwrap().unwrap().id, "2");
        assert_eq!(player.playback_status().await.unwrap(), PlaybackStatus::Playing);
    }

    #[test]
    fn missing_queue_message_is_readable() {
        assert_eq!(PlaybackError::MissingQueue.to_string(), "Playback queue is empty.");
    }
}
