//! Track selection: start playback, then reflect it as now playing

use std::sync::{Arc, Mutex, PoisonError};

use crate::model::TrackSummary;
use super::{NowPlaying, PlaybackCoordinator};

/// How a selection concluded
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SelectionOutcome {
    /// Another selection was in flight, or the track is not in the library
    Rejected,
    /// Nothing playable backs the track; it was only presented
    Presented,
    /// Playback started and the track is now playing
    Started,
    /// Playback failed to start; now playing is unchanged
    Failed(String),
}

/// Clears the busy flag when the selection ends, however it ends.
struct BusyGuard {
    state: Arc<Mutex<NowPlaying>>,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.starting_track = None;
    }
}

impl PlaybackCoordinator {
    pub async fn handle_selection(&self, track: &TrackSummary) -> SelectionOutcome {
        if self.lock_state().is_starting_playback() {
            tracing::debug!(track_id = %track.id, "Selection ignored, another start is in flight");
            return SelectionOutcome::Rejected;
        }

        if !self.library.contains_track(&track.id).await {
            tracing::warn!(track_id = %track.id, "Selection ignored, track is not in the library");
            return SelectionOutcome::Rejected;
        }

        let _busy = {
            let mut state = self.lock_state();
            if state.is_starting_playback() {
                return SelectionOutcome::Rejected;
            }
            state.starting_track = Some(track.id.clone());
            BusyGuard {
                state: self.state.clone(),
            }
        };
        self.feedback.selection();

        let queue = self.library.playback_queue().await;
        let item = match self.library.song_for(&track.id).await {
            Some(item) if !queue.is_empty() => item,
            _ => {
                tracing::debug!(track_id = %track.id, "No playable item, presenting track only");
                self.present(track.clone());
                return SelectionOutcome::Presented;
            }
        };

        tracing::info!(
            track_id = %track.id,
            album = %item.album,
            duration_ms = item.duration_ms,
            queue_len = queue.len(),
            "Starting playback"
        );
        match self.playback.start_playback(&queue, &item).await {
            Ok(()) => {
                self.present(track.clone());
                self.sync_after_start(&track.id).await;
                SelectionOutcome::Started
            }
            Err(e) => {
                self.feedback.error();
                tracing::error!(track_id = %track.id, error = %e, "Failed to start playback");
                SelectionOutcome::Failed(e.to_string())
            }
        }
    }

    /// Show `track` as now playing in the expanded player.
    pub fn present(&self, track: TrackSummary) {
        let mut state = self.lock_state();
        state.replace_track(track);
        state.is_expanded = true;
        state.drag_offset = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::testing::{item, loaded_library, CountingFeedback};
    use crate::model::{LibraryPayload, PlayableItem};
    use crate::player::{
        ExternalPlayer, FixturePlayer, NoopPlaybackControl, PlaybackControl, PlaybackError,
    };
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    /// Playback control that waits for a go-ahead before answering
    struct GatedControl {
        calls: AtomicUsize,
        gate: Notify,
    }

    impl GatedControl {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                gate: Notify::new(),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PlaybackControl for GatedControl {
        async fn start_playback(
            &self,
            _queue: &[PlayableItem],
            _starting_at: &PlayableItem,
        ) -> Result<(), PlaybackError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.gate.notified().await;
            Ok(())
        }
    }

    struct FailingControl(fn() -> PlaybackError);

    #[async_trait]
    impl PlaybackControl for FailingControl {
        async fn start_playback(
            &self,
            _queue: &[PlayableItem],
            _starting_at: &PlayableItem,
        ) -> Result<(), PlaybackError> {
            Err((self.0)())
        }
    }

    fn coordinator_with(
        library: crate::model::LibraryModel,
        playback: Arc<dyn PlaybackControl>,
        player: FixturePlayer,
        feedback: Arc<CountingFeedback>,
    ) -> PlaybackCoordinator {
        PlaybackCoordinator::new(library, playback, Arc::new(player), feedback)
    }

    #[tokio::test]
    async fn selection_starts_playback_and_presents() {
        let library = loaded_library(LibraryPayload::from_items(vec![item("1"), item("2")])).await;
        let tracks = library.tracks().await;
        let player = FixturePlayer::new();
        let feedback = Arc::new(CountingFeedback::default());
        let coordinator = coordinator_with(
            library,
            Arc::new(player.clone()),
            player.clone(),
            feedback.clone(),
        );

        let outcome = coordinator.handle_selection(&tracks[1]).await;

        assert_eq!(outcome, SelectionOutcome::Started);
        let now_playing = coordinator.now_playing();
        assert_eq!(now_playing.track.as_ref().unwrap().id, "2");
        assert!(now_playing.is_expanded);
        assert!(!now_playing.is_starting_playback());
        // The follow-up sync resolves to the same track and is absorbed.
        assert_eq!(now_playing.revision, 1);
        assert_eq!(feedback.selections(), 1);
        let entry = player.current_entry().await.unwrap();
        assert_eq!(entry.map(|i| i.id).as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn lagging_player_does_not_override_the_started_track() {
        let library = loaded_library(LibraryPayload::from_items(vec![item("1"), item("2")])).await;
        let tracks = library.tracks().await;
        let player = FixturePlayer::new();
        player.set_current_entry(Some(item("1")));
        let coordinator = coordinator_with(
            library,
            Arc::new(NoopPlaybackControl),
            player.clone(),
            Arc::new(CountingFeedback::default()),
        );

        let outcome = coordinator.handle_selection(&tracks[1]).await;

        assert_eq!(outcome, SelectionOutcome::Started);
        let now_playing = coordinator.now_playing();
        assert_eq!(now_playing.track.as_ref().unwrap().id, "2");
        assert_eq!(now_playing.revision, 1);

        // Once the player catches up the sync is absorbed.
        player.set_current_entry(Some(item("2")));
        assert!(!coordinator.sync_now_playing().await);
    }

    #[tokio::test]
    async fn selection_without_playable_items_only_presents() {
        let library = loaded_library(LibraryPayload {
            tracks: vec![TrackSummary::new("fixture-1", "Song", "Artist", None)],
            items: Vec::new(),
        })
        .await;
        let tracks = library.tracks().await;
        let control = Arc::new(GatedControl::new());
        let coordinator = coordinator_with(
            library,
            control.clone(),
            FixturePlayer::new(),
            Arc::new(CountingFeedback::default()),
        );

        let outcome = coordinator.handle_selection(&tracks[0]).await;

        assert_eq!(outcome, SelectionOutcome::Presented);
        assert_eq!(control.calls(), 0);
        assert_eq!(coordinator.now_playing().track.unwrap().id, "fixture-1");
        assert!(!coordinator.now_playing().is_starting_playback());
    }

    #[tokio::test]
    async fn track_without_its_own_item_only_presents() {
        let (a, b) = (item("a"), item("b"));
        let library = loaded_library(LibraryPayload {
            tracks: vec![TrackSummary::from_item(&a), TrackSummary::from_item(&b)],
            items: vec![a],
        })
        .await;
        let tracks = library.tracks().await;
        let control = Arc::new(GatedControl::new());
        let coordinator = coordinator_with(
            library,
            control.clone(),
            FixturePlayer::new(),
            Arc::new(CountingFeedback::default()),
        );

        let outcome = coordinator.handle_selection(&tracks[1]).await;

        assert_eq!(outcome, SelectionOutcome::Presented);
        assert_eq!(control.calls(), 0);
        assert_eq!(coordinator.now_playing().track.unwrap().id, "b");
        assert!(!coordinator.now_playing().is_starting_playback());
    }

    #[tokio::test]
    async fn second_selection_is_rejected_while_first_is_starting() {
        let library = loaded_library(LibraryPayload::from_items(vec![item("1"), item("2")])).await;
        let tracks = library.tracks().await;
        let control = Arc::new(GatedControl::new());
        let coordinator = coordinator_with(
            library,
            control.clone(),
            FixturePlayer::new(),
            Arc::new(CountingFeedback::default()),
        );

        let first = {
            let coordinator = coordinator.clone();
            let track = tracks[0].clone();
            tokio::spawn(async move { coordinator.handle_selection(&track).await })
        };
        while control.calls() == 0 {
            tokio::task::yield_now().await;
        }
        assert!(coordinator.now_playing().is_starting("1"));

        let second = coordinator.handle_selection(&tracks[1]).await;
        assert_eq!(second, SelectionOutcome::Rejected);
        assert_eq!(control.calls(), 1);
        assert!(coordinator.now_playing().track.is_none());

        control.gate.notify_one();
        assert_eq!(first.await.unwrap(), SelectionOutcome::Started);
        assert!(!coordinator.now_playing().is_starting_playback());

        // Once the first completes, a new selection goes through again.
        let control_calls = control.calls();
        let third = {
            let coordinator = coordinator.clone();
            let track = tracks[1].clone();
            tokio::spawn(async move { coordinator.handle_selection(&track).await })
        };
        while control.calls() == control_calls {
            tokio::task::yield_now().await;
        }
        control.gate.notify_one();
        assert_eq!(third.await.unwrap(), SelectionOutcome::Started);
    }

    #[tokio::test]
    async fn failed_start_leaves_now_playing_untouched() {
        let library = loaded_library(LibraryPayload::from_items(vec![item("1"), item("2")])).await;
        let tracks = library.tracks().await;
        let feedback = Arc::new(CountingFeedback::default());
        let coordinator = coordinator_with(
            library,
            Arc::new(FailingControl(|| PlaybackError::Backend(anyhow::anyhow!("device offline")))),
            FixturePlayer::new(),
            feedback.clone(),
        );
        coordinator.present(tracks[0].clone());
        let before = coordinator.now_playing();

        let outcome = coordinator.handle_selection(&tracks[1]).await;

        assert!(matches!(outcome, SelectionOutcome::Failed(ref m) if m.contains("device offline")));
        let after = coordinator.now_playing();
        assert_eq!(after.track, before.track);
        assert_eq!(after.revision, before.revision);
        assert!(!after.is_starting_playback());
        assert_eq!(feedback.errors(), 1);
    }

    #[tokio::test]
    async fn missing_queue_is_reported_as_side_effect() {
        let library = loaded_library(LibraryPayload::from_items(vec![item("1")])).await;
        let tracks = library.tracks().await;
        let feedback = Arc::new(CountingFeedback::default());
        let coordinator = coordinator_with(
            library,
            Arc::new(FailingControl(|| PlaybackError::MissingQueue)),
            FixturePlayer::new(),
            feedback.clone(),
        );

        let outcome = coordinator.handle_selection(&tracks[0]).await;

        assert_eq!(outcome, SelectionOutcome::Failed("Playback queue is empty.".to_string()));
        assert!(coordinator.now_playing().track.is_none());
        assert_eq!(feedback.errors(), 1);
    }

    #[tokio::test]
    async fn unknown_track_is_rejected_without_busy_flag() {
        let library = loaded_library(LibraryPayload::from_items(vec![item("1")])).await;
        let control = Arc::new(GatedControl::new());
        let feedback = Arc::new(CountingFeedback::default());
        let coordinator = coordinator_with(
            library,
            control.clone(),
            FixturePlayer::new(),
            feedback.clone(),
        );
        let stranger = TrackSummary::from_item(&item("elsewhere"));

        assert_eq!(coordinator.handle_selection(&stranger).await, SelectionOutcome::Rejected);
        assert_eq!(control.calls(), 0);
        assert_eq!(feedback.selections(), 0);
        assert!(!coordinator.now_playing().is_starting_playback());
    }
}
