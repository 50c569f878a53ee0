//! Reflecting the external player's current entry as now playing

use anyhow::Result;
use tokio_util::sync::CancellationToken;

use crate::model::TrackSummary;
use super::PlaybackCoordinator;

impl PlaybackCoordinator {
    /// Pull the external player's current entry and turn it into a summary.
    ///
    /// Library metadata wins over what the player reports when the entry is
    /// a track we loaded.
    pub async fn resolve_now_playing(&self) -> Result<Option<TrackSummary>> {
        let Some(entry) = self.player.current_entry().await? else {
            return Ok(None);
        };

        let summary = match self.library.song_for(&entry.id).await {
            Some(library_item) => TrackSummary::from_item(&library_item),
            None => TrackSummary::from_item(&entry),
        };
        Ok(Some(summary))
    }

    /// Replace now playing only when the id or the artwork URL changed.
    /// Returns whether anything was applied.
    pub fn apply_now_playing(&self, summary: TrackSummary) -> bool {
        let mut state = self.lock_state();
        let changed = match &state.track {
            None => true,
            Some(current) => {
                current.id != summary.id || current.artwork_url != summary.artwork_url
            }
        };

        if changed {
            tracing::debug!(track_id = %summary.id, title = %summary.title, "Now playing updated");
            state.replace_track(summary);
        }
        changed
    }

    pub async fn sync_now_playing(&self) -> bool {
        match self.resolve_now_playing().await {
            Ok(Some(summary)) => self.apply_now_playing(summary),
            Ok(None) => false,
            Err(e) => {
                tracing::warn!(error = %e, "Could not read the player's current entry");
                false
            }
        }
    }

    /// Sync following a start of `started_id`. Until the player reports that
    /// entry, now playing is left alone and the observer catches up later.
    pub(super) async fn sync_after_start(&self, started_id: &str) -> bool {
        match self.resolve_now_playing().await {
            Ok(Some(summary)) if summary.id == started_id => self.apply_now_playing(summary),
            Ok(Some(summary)) => {
                tracing::debug!(
                    started = %started_id,
                    reported = %summary.id,
                    "Player still reports the previous entry"
                );
                false
            }
            Ok(None) => false,
            Err(e) => {
                tracing::warn!(error = %e, "Could not read the player's current entry");
                false
            }
        }
    }

    /// Same as `sync_now_playing`, except a resolution racing `token` is
    /// dropped and never applied.
    async fn sync_until_cancelled(&self, token: &CancellationToken) -> bool {
        let resolved = tokio::select! {
            _ = token.cancelled() => {
                tracing::debug!("Now playing resolution abandoned");
                return false;
            }
            resolved = self.resolve_now_playing() => resolved,
        };

        if token.is_cancelled() {
            return false;
        }

        match resolved {
            Ok(Some(summary)) => self.apply_now_playing(summary),
            Ok(None) => false,
            Err(e) => {
                tracing::warn!(error = %e, "Could not read the player's current entry");
                false
            }
        }
    }

    /// Follow the external player's queue until `stop_observing` is called.
    /// Syncs once right away. Does nothing if already observing.
    pub fn start_observing(&self) {
        let token = {
            let mut observation = self.lock_observation();
            if observation.is_some() {
                return;
            }
            let token = CancellationToken::new();
            *observation = Some(token.clone());
            token
        };

        let mut changes = self.player.queue_changes();
        let coordinator = self.clone();
        tracing::info!("Observing external player queue");

        tokio::spawn(async move {
            coordinator.sync_until_cancelled(&token).await;

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    changed = changes.changed() => {
                        if changed.is_err() {
                            tracing::debug!("External player stopped publishing changes");
                            break;
                        }
                    }
                }
                coordinator.sync_until_cancelled(&token).await;
            }

            tracing::debug!("Queue observation finished");
        });
    }

    pub fn stop_observing(&self) {
        if let Some(token) = self.lock_observation().take() {
            token.cancel();
            tracing::info!("Stopped observing external player queue");
        }
    }

    #[cfg(test)]
    pub fn is_observing(&self) -> bool {
        self.lock_observation().is_some()
    }

    fn lock_observation(&self) -> std::sync::MutexGuard<'_, Option<CancellationToken>> {
        self.observation
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::testing::{item, loaded_library, CountingFeedback};
    use crate::coordinator::PlaybackCoordinator;
    use crate::model::{Artwork, LibraryPayload, PlayableItem, PlaybackStatus};
    use crate::player::{ExternalPlayer, FixturePlayer, NoopPlaybackControl};
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::{watch, Notify};

    fn coordinator(
        library: crate::model::LibraryModel,
        player: Arc<dyn ExternalPlayer>,
    ) -> PlaybackCoordinator {
        PlaybackCoordinator::new(
            library,
            Arc::new(NoopPlaybackControl),
            player,
            Arc::new(CountingFeedback::default()),
        )
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn identical_summary_applies_once() {
        let library = loaded_library(LibraryPayload::default()).await;
        let coordinator = coordinator(library, Arc::new(FixturePlayer::new()));
        let summary = TrackSummary::from_item(&item("1"));

        assert!(coordinator.apply_now_playing(summary.clone()));
        assert!(!coordinator.apply_now_playing(summary));
        assert_eq!(coordinator.now_playing().revision, 1);
    }

    #[tokio::test]
    async fn new_artwork_for_same_track_applies() {
        let library = loaded_library(LibraryPayload::default()).await;
        let coordinator = coordinator(library, Arc::new(FixturePlayer::new()));
        let low = item("1");
        let high = PlayableItem {
            artwork: Some(Artwork::new("https://img/1-hires")),
            ..low.clone()
        };

        coordinator.apply_now_playing(TrackSummary::from_item(&low));
        assert!(coordinator.apply_now_playing(TrackSummary::from_item(&high)));
        assert_eq!(coordinator.now_playing().revision, 2);
        assert_eq!(
            coordinator.now_playing().track.unwrap().artwork_url.as_deref(),
            Some("https://img/1-hires")
        );
    }

    #[tokio::test]
    async fn other_field_changes_with_same_artwork_are_ignored() {
        let library = loaded_library(LibraryPayload::default()).await;
        let coordinator = coordinator(library, Arc::new(FixturePlayer::new()));
        let original = item("1");
        let retitled = PlayableItem {
            title: "Remastered".to_string(),
            ..original.clone()
        };

        coordinator.apply_now_playing(TrackSummary::from_item(&original));
        assert!(!coordinator.apply_now_playing(TrackSummary::from_item(&retitled)));
        assert_eq!(coordinator.now_playing().track.unwrap().title, "Title 1");
    }

    #[tokio::test]
    async fn different_track_always_applies() {
        let library = loaded_library(LibraryPayload::default()).await;
        let coordinator = coordinator(library, Arc::new(FixturePlayer::new()));

        assert!(coordinator.apply_now_playing(TrackSummary::from_item(&item("1"))));
        assert!(coordinator.apply_now_playing(TrackSummary::from_item(&item("2"))));
        assert!(coordinator.apply_now_playing(TrackSummary::from_item(&item("1"))));
        assert_eq!(coordinator.now_playing().revision, 3);
    }

    #[tokio::test]
    async fn library_metadata_wins_over_player_metadata() {
        let library = loaded_library(LibraryPayload::from_items(vec![item("1")])).await;
        let player = FixturePlayer::new();
        player.set_current_entry(Some(PlayableItem {
            title: "Reported by player".to_string(),
            artwork: None,
            ..item("1")
        }));
        let coordinator = coordinator(library, Arc::new(player));

        let summary = coordinator.resolve_now_playing().await.unwrap().unwrap();

        assert_eq!(summary.title, "Title 1");
        assert_eq!(summary.artwork_url.as_deref(), Some("https://img/1"));
    }

    #[tokio::test]
    async fn tracks_outside_the_library_can_be_now_playing() {
        let library = loaded_library(LibraryPayload::from_items(vec![item("1")])).await;
        let player = FixturePlayer::new();
        player.set_current_entry(Some(item("radio")));
        let coordinator = coordinator(library, Arc::new(player));

        assert!(coordinator.sync_now_playing().await);
        assert_eq!(coordinator.now_playing().track.unwrap().id, "radio");
    }

    #[tokio::test]
    async fn empty_player_leaves_now_playing_alone() {
        let library = loaded_library(LibraryPayload::default()).await;
        let coordinator = coordinator(library, Arc::new(FixturePlayer::new()));

        assert!(!coordinator.sync_now_playing().await);
        assert!(coordinator.now_playing().track.is_none());
    }

    #[tokio::test]
    async fn observation_follows_external_changes() {
        let library = loaded_library(LibraryPayload::from_items(vec![item("1"), item("2")])).await;
        let player = FixturePlayer::new();
        player.set_current_entry(Some(item("1")));
        let coordinator = coordinator(library, Arc::new(player.clone()));

        coordinator.start_observing();
        settle().await;
        assert_eq!(coordinator.now_playing().track.unwrap().id, "1");

        player.set_current_entry(Some(item("2")));
        settle().await;
        assert_eq!(coordinator.now_playing().track.unwrap().id, "2");

        coordinator.stop_observing();
        assert!(!coordinator.is_observing());
        player.set_current_entry(Some(item("1")));
        settle().await;
        assert_eq!(coordinator.now_playing().track.unwrap().id, "2");
    }

    #[tokio::test]
    async fn start_observing_twice_keeps_one_observer() {
        let library = loaded_library(LibraryPayload::default()).await;
        let player = FixturePlayer::new();
        let coordinator = coordinator(library, Arc::new(player.clone()));

        coordinator.start_observing();
        coordinator.start_observing();
        assert!(coordinator.is_observing());

        player.set_current_entry(Some(item("1")));
        settle().await;
        assert_eq!(coordinator.now_playing().revision, 1);
        coordinator.stop_observing();
    }

    /// Player whose entry lookup hangs until released
    struct StalledPlayer {
        release: Notify,
        changes: watch::Sender<u64>,
    }

    #[async_trait]
    impl ExternalPlayer for StalledPlayer {
        async fn current_entry(&self) -> anyhow::Result<Option<PlayableItem>> {
            self.release.notified().await;
            Ok(Some(item("late")))
        }

        async fn playback_status(&self) -> anyhow::Result<PlaybackStatus> {
            Ok(PlaybackStatus::Other)
        }

        async fn play(&self) -> anyhow::Result<()> {
            Ok(())
        }

        async fn pause(&self) -> anyhow::Result<()> {
            Ok(())
        }

        fn queue_changes(&self) -> watch::Receiver<u64> {
            self.changes.subscribe()
        }
    }

    #[tokio::test]
    async fn cancelled_resolution_is_never_applied() {
        let library = loaded_library(LibraryPayload::default()).await;
        let (changes, _) = watch::channel(0);
        let player = Arc::new(StalledPlayer {
            release: Notify::new(),
            changes,
        });
        let coordinator = coordinator(library, player.clone());

        coordinator.start_observing();
        settle().await;
        coordinator.stop_observing();
        player.release.notify_waiters();
        player.release.notify_one();
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert!(coordinator.now_playing().track.is_none());
        assert_eq!(coordinator.now_playing().revision, 0);
    }
}
