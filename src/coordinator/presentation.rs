//! Player presentation state and the play/pause toggle

use super::PlaybackCoordinator;

/// Drag distance past which releasing the player collapses it
pub const DISMISS_TRANSLATION: f32 = 140.0;

const SCRIM_FADE_DISTANCE: f32 = 300.0;
const SCRIM_MAX_OPACITY: f32 = 0.35;

impl PlaybackCoordinator {
    pub fn expand(&self) {
        let mut state = self.lock_state();
        state.is_expanded = true;
        state.drag_offset = 0.0;
    }

    pub fn collapse(&self) {
        let mut state = self.lock_state();
        state.is_expanded = false;
        state.drag_offset = 0.0;
    }

    /// Track an in-progress downward drag. Upward movement is ignored.
    pub fn drag(&self, translation: f32) {
        if translation >= 0.0 {
            self.lock_state().drag_offset = translation;
        }
    }

    pub fn end_drag(&self, translation: f32) {
        if translation > DISMISS_TRANSLATION {
            self.collapse();
        } else {
            self.lock_state().drag_offset = 0.0;
        }
    }

    pub fn scrim_opacity(&self) -> f32 {
        let state = self.lock_state();
        if !state.is_expanded {
            return 0.0;
        }
        let normalized = (state.drag_offset / SCRIM_FADE_DISTANCE).clamp(0.0, 1.0);
        (1.0 - normalized) * SCRIM_MAX_OPACITY
    }

    pub async fn is_playing(&self) -> bool {
        match self.player.playback_status().await {
            Ok(status) => status.is_active(),
            Err(e) => {
                tracing::trace!(error = %e, "Playback status unavailable");
                false
            }
        }
    }

    /// Pause when playing or seeking, play otherwise. Failures are only
    /// logged; the player reports its real status on the next change.
    pub async fn toggle_playback(&self) {
        let status = match self.player.playback_status().await {
            Ok(status) => status,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read playback status");
                return;
            }
        };
        tracing::debug!(status = ?status, "Toggling playback");

        let result = if status.is_active() {
            self.player.pause().await
        } else {
            self.player.play().await
        };

        match result {
            Ok(()) => {
                let action = if status.is_active() { "paused" } else { "resumed" };
                tracing::info!(action, "Playback toggled");
            }
            Err(e) => tracing::error!(error = %e, "Failed to toggle playback"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::testing::{item, loaded_library, CountingFeedback};
    use crate::model::{LibraryPayload, PlaybackStatus, TrackSummary};
    use crate::player::{FixturePlayer, NoopPlaybackControl};
    use std::sync::Arc;

    async fn coordinator(player: FixturePlayer) -> PlaybackCoordinator {
        let library = loaded_library(LibraryPayload::default()).await;
        PlaybackCoordinator::new(
            library,
            Arc::new(NoopPlaybackControl),
            Arc::new(player),
            Arc::new(CountingFeedback::default()),
        )
    }

    #[tokio::test]
    async fn collapse_resets_drag_offset() {
        let coordinator = coordinator(FixturePlayer::new()).await;
        coordinator.present(TrackSummary::from_item(&item("1")));
        coordinator.drag(80.0);
        assert_eq!(coordinator.now_playing().drag_offset, 80.0);

        coordinator.collapse();

        let state = coordinator.now_playing();
        assert!(!state.is_expanded);
        assert_eq!(state.drag_offset, 0.0);
        assert_eq!(coordinator.scrim_opacity(), 0.0);
    }

    #[tokio::test]
    async fn short_drag_snaps_back_long_drag_dismisses() {
        let coordinator = coordinator(FixturePlayer::new()).await;
        coordinator.expand();

        coordinator.drag(-20.0);
        assert_eq!(coordinator.now_playing().drag_offset, 0.0);

        coordinator.drag(100.0);
        coordinator.end_drag(100.0);
        assert!(coordinator.now_playing().is_expanded);
        assert_eq!(coordinator.now_playing().drag_offset, 0.0);

        coordinator.drag(200.0);
        coordinator.end_drag(200.0);
        assert!(!coordinator.now_playing().is_expanded);
    }

    #[tokio::test]
    async fn scrim_fades_with_drag() {
        let coordinator = coordinator(FixturePlayer::new()).await;
        coordinator.expand();
        assert!((coordinator.scrim_opacity() - 0.35).abs() < 1e-6);

        coordinator.drag(150.0);
        assert!((coordinator.scrim_opacity() - 0.175).abs() < 1e-6);

        coordinator.drag(600.0);
        assert_eq!(coordinator.scrim_opacity(), 0.0);
    }

    #[tokio::test]
    async fn toggle_pauses_when_playing_or_seeking() {
        for status in [
            PlaybackStatus::Playing,
            PlaybackStatus::SeekingForward,
            PlaybackStatus::SeekingBackward,
        ] {
            let player = FixturePlayer::new();
            player.set_status(status);
            let coordinator = coordinator(player.clone()).await;

            coordinator.toggle_playback().await;

            assert_eq!(player.status(), PlaybackStatus::Paused);
        }
    }

    #[tokio::test]
    async fn toggle_plays_otherwise() {
        for status in [PlaybackStatus::Paused, PlaybackStatus::Other] {
            let player = FixturePlayer::new();
            player.set_status(status);
            let coordinator = coordinator(player.clone()).await;

            coordinator.toggle_playback().await;

            assert_eq!(player.status(), PlaybackStatus::Playing);
            assert!(coordinator.is_playing().await);
        }
    }
}
