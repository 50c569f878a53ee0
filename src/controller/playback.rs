//! Selection and play/pause

use crate::coordinator::SelectionOutcome;
use super::AppController;

impl AppController {
    /// Hand the highlighted track to the coordinator.
    pub async fn play_selected(&self) -> Option<SelectionOutcome> {
        let selected = self.ui_state().await.selected;
        let track = self.library.tracks().await.into_iter().nth(selected)?;
        tracing::debug!(track_id = %track.id, "Playing selected track");

        let outcome = self.coordinator.handle_selection(&track).await;
        match &outcome {
            SelectionOutcome::Failed(message) => {
                self.set_error(Self::format_error(message)).await;
            }
            SelectionOutcome::Rejected => {
                tracing::debug!(track_id = %track.id, "Selection ignored");
            }
            SelectionOutcome::Presented | SelectionOutcome::Started => {}
        }
        Some(outcome)
    }

    pub async fn toggle_playback(&self) {
        self.coordinator.toggle_playback().await;
    }
}
