//! List movement, reload and access requests

use crate::model::LibraryState;
use super::AppController;

impl AppController {
    pub async fn move_selection_up(&self) {
        let mut state = self.ui_state.lock().await;
        state.selected = state.selected.saturating_sub(1);
    }

    pub async fn move_selection_down(&self) {
        let count = self.library.tracks().await.len();
        let mut state = self.ui_state.lock().await;
        if state.selected + 1 < count {
            state.selected += 1;
        }
    }

    /// Keep the cursor inside the list after the library changes size.
    pub async fn clamp_selection(&self) {
        let count = self.library.tracks().await.len();
        let mut state = self.ui_state.lock().await;
        state.selected = state.selected.min(count.saturating_sub(1));
    }

    /// A failed load retries from the access check and a loaded library
    /// refetches. Without access there is nothing to reload.
    pub async fn reload_library(&self) {
        match self.library.state().await {
            LibraryState::Failed(_) => self.library.start().await,
            LibraryState::Loaded => self.library.reload().await,
            state => {
                tracing::debug!(state = %state, "Reload ignored");
                return;
            }
        }
        self.clamp_selection().await;
        self.coordinator.sync_now_playing().await;
    }

    pub async fn grant_access(&self) {
        let state = self.library.state().await;
        if state.is_busy() {
            return;
        }
        self.library.request_authorization().await;
        self.clamp_selection().await;
        self.coordinator.sync_now_playing().await;
    }
}
