//! View module - UI rendering
//!
//! This module handles all UI rendering for the application using ratatui.
//! It is organized into submodules by component type:
//!
//! - `utils`: Shared helpers (scrollable lists, palette to terminal colors)
//! - `library`: Library status screens and the track list
//! - `player`: Now-playing bar and expanded player
//! - `overlays`: Modal overlays (error, help)

mod utils;
mod library;
mod player;
mod overlays;

use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Modifier, Style},
    Frame,
};

use crate::coordinator::NowPlaying;
use crate::model::{LibrarySnapshot, UiState};

/// Drag distance covered by one terminal row
pub const POINTS_PER_ROW: f32 = 20.0;

pub struct AppView;

impl AppView {
    pub fn render(
        frame: &mut Frame,
        library: &LibrarySnapshot,
        now_playing: &NowPlaying,
        is_playing: bool,
        scrim_opacity: f32,
        ui_state: &UiState,
    ) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(0),    // Library
                Constraint::Length(3), // Mini player
            ])
            .split(frame.area());

        library::render_library(frame, chunks[0], library, now_playing, ui_state.selected);

        if now_playing.is_expanded {
            player::render_mini_player(frame, chunks[1], None, is_playing);
            if scrim_opacity > 0.0 {
                frame
                    .buffer_mut()
                    .set_style(chunks[0], Style::default().add_modifier(Modifier::DIM));
            }
            if let Some(track) = now_playing.track.as_ref() {
                let drag_rows = (now_playing.drag_offset / POINTS_PER_ROW) as u16;
                player::render_full_player(frame, track, is_playing, drag_rows);
            }
        } else {
            player::render_mini_player(frame, chunks[1], now_playing.track.as_ref(), is_playing);
        }

        if ui_state.error_message.is_some() {
            overlays::render_error_notification(frame, ui_state);
        }

        if ui_state.show_help_popup {
            overlays::render_help_popup(frame);
        }
    }
}
