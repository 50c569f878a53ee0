//! Key and mouse event handling

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind};

use crate::view::POINTS_PER_ROW;
use super::AppController;

fn translation(origin: u16, row: u16) -> f32 {
    (row as f32 - origin as f32) * POINTS_PER_ROW
}

impl AppController {
    /// Apply a key press. Anything that talks to the network runs on its own
    /// task so the draw loop keeps going.
    pub async fn handle_key_event(&self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        // Handle error message first (blocks all other interactions)
        if self.has_error().await {
            if matches!(key.code, KeyCode::Esc | KeyCode::Enter) {
                self.clear_error().await;
            }
            return;
        }

        if self.is_help_popup_open().await {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('h') | KeyCode::Char('H')) {
                self.hide_help_popup().await;
            }
            return;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => {
                self.set_should_quit(true).await;
            }
            KeyCode::Up => self.move_selection_up().await,
            KeyCode::Down => self.move_selection_down().await,
            KeyCode::Enter => {
                let controller = self.clone();
                tokio::spawn(async move {
                    controller.play_selected().await;
                });
            }
            KeyCode::Char(' ') => {
                let controller = self.clone();
                tokio::spawn(async move {
                    controller.toggle_playback().await;
                });
            }
            KeyCode::Char('r') | KeyCode::Char('R') => {
                let controller = self.clone();
                tokio::spawn(async move {
                    controller.reload_library().await;
                });
            }
            KeyCode::Char('a') | KeyCode::Char('A') => {
                let controller = self.clone();
                tokio::spawn(async move {
                    controller.grant_access().await;
                });
            }
            KeyCode::Char('e') | KeyCode::Char('E') => {
                if self.coordinator.now_playing().is_expanded {
                    self.coordinator.collapse();
                } else if self.coordinator.now_playing().track.is_some() {
                    self.coordinator.expand();
                }
            }
            KeyCode::Esc => self.coordinator.collapse(),
            KeyCode::Char('h') | KeyCode::Char('H') => self.toggle_help_popup().await,
            _ => {}
        }
    }

    /// Dragging the expanded player down and releasing past the dismiss
    /// distance collapses it.
    pub async fn handle_mouse_event(&self, mouse: MouseEvent) {
        if !self.coordinator.now_playing().is_expanded {
            self.ui_state.lock().await.drag_origin = None;
            return;
        }

        let mut state = self.ui_state.lock().await;
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                state.drag_origin = Some(mouse.row);
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                if let Some(origin) = state.drag_origin {
                    self.coordinator.drag(translation(origin, mouse.row));
                }
            }
            MouseEventKind::Up(MouseButton::Left) => {
                if let Some(origin) = state.drag_origin.take() {
                    self.coordinator.end_drag(translation(origin, mouse.row));
                }
            }
            _ => {}
        }
    }
}
