//! Controller module - Application logic and event handling
//!
//! This module contains the application controller that handles user input
//! and routes it to the library model and the playback coordinator.
//! It is organized into submodules by responsibility:
//!
//! - `input`: Key event handling
//! - `playback`: Selection and play/pause
//! - `navigation`: List movement, reload and access requests

mod input;
mod playback;
mod navigation;

use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

use crate::coordinator::PlaybackCoordinator;
use crate::model::{LibraryModel, UiState};

/// Errors stay on screen for this many seconds
const ERROR_DISPLAY_SECS: u64 = 5;

#[derive(Clone)]
pub struct AppController {
    pub(crate) library: LibraryModel,
    pub(crate) coordinator: PlaybackCoordinator,
    ui_state: Arc<Mutex<UiState>>,
}

impl AppController {
    pub fn new(library: LibraryModel, coordinator: PlaybackCoordinator) -> Self {
        Self {
            library,
            coordinator,
            ui_state: Arc::new(Mutex::new(UiState::default())),
        }
    }

    pub async fn ui_state(&self) -> UiState {
        self.ui_state.lock().await.clone()
    }

    pub async fn should_quit(&self) -> bool {
        self.ui_state.lock().await.should_quit
    }

    pub(crate) async fn set_should_quit(&self, value: bool) {
        self.ui_state.lock().await.should_quit = value;
    }

    pub(crate) async fn set_error(&self, message: String) {
        let mut state = self.ui_state.lock().await;
        state.error_message = Some(message);
        state.error_timestamp = Some(Instant::now());
    }

    pub(crate) async fn clear_error(&self) {
        let mut state = self.ui_state.lock().await;
        state.error_message = None;
        state.error_timestamp = None;
    }

    pub(crate) async fn has_error(&self) -> bool {
        self.ui_state.lock().await.error_message.is_some()
    }

    pub async fn auto_clear_old_errors(&self) {
        let mut state = self.ui_state.lock().await;
        if let Some(timestamp) = state.error_timestamp {
            if timestamp.elapsed().as_secs() > ERROR_DISPLAY_SECS {
                state.error_message = None;
                state.error_timestamp = None;
            }
        }
    }

    pub(crate) async fn toggle_help_popup(&self) {
        let mut state = self.ui_state.lock().await;
        state.show_help_popup = !state.show_help_popup;
    }

    pub(crate) async fn hide_help_popup(&self) {
        self.ui_state.lock().await.show_help_popup = false;
    }

    pub(crate) async fn is_help_popup_open(&self) -> bool {
        self.ui_state.lock().await.show_help_popup
    }

    pub(crate) fn format_error(error: &str) -> String {
        // Handle common Spotify API errors
        if error.contains("404") {
            "No active device found. Start playing on Spotify and try again.".to_string()
        } else if error.contains("403") {
            "Action forbidden. Check your Spotify Premium status.".to_string()
        } else if error.contains("401") {
            "Authentication expired. Press A to sign in again.".to_string()
        } else if error.contains("429") {
            "Rate limited. Please wait a moment.".to_string()
        } else {
            format!("Error: {}", error)
        }
    }
}
