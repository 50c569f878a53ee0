//! Utility functions for rendering UI components

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    widgets::{Block, List, ListItem, ListState},
    Frame,
};

use crate::model::{ArtworkColor, TrackSummary};

pub fn render_scrollable_list(
    frame: &mut Frame,
    area: Rect,
    items: Vec<ListItem>,
    selected_index: usize,
    block: Block,
) {
    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default()); // Highlight handled by item styles

    let mut list_state = ListState::default();
    list_state.select(Some(selected_index));

    frame.render_stateful_widget(list, area, &mut list_state);
}

pub fn truncate_string(s: &str, max_width: usize) -> String {
    if s.chars().count() > max_width {
        let truncated: String = s.chars().take(max_width.saturating_sub(3)).collect();
        format!("{:<width$}", format!("{}...", truncated), width = max_width)
    } else {
        format!("{:<width$}", s, width = max_width)
    }
}

pub fn to_color(color: ArtworkColor) -> Color {
    let (r, g, b) = color.to_rgb8();
    Color::Rgb(r, g, b)
}

/// Colors for a player surface, falling back to the terminal defaults
/// wherever the artwork supplied nothing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlayerColors {
    pub background: Color,
    pub highlight: Color,
    pub gradient_top: Color,
    pub gradient_bottom: Color,
    pub primary_text: Color,
    pub secondary_text: Color,
}

impl PlayerColors {
    pub fn for_track(track: &TrackSummary) -> Self {
        let bright_artwork = track.artwork_palette.is_some() && !track.prefers_light_content();
        let (fallback_primary, fallback_secondary) = if bright_artwork {
            (Color::Black, Color::DarkGray)
        } else {
            (Color::White, Color::Gray)
        };

        let background = track
            .artwork_background_color()
            .map(to_color)
            .unwrap_or(Color::Black);
        let [gradient_top, gradient_bottom] = track
            .artwork_gradient_colors()
            .map(|stops| stops.map(to_color))
            .unwrap_or([background, background]);

        Self {
            background,
            highlight: track
                .artwork_highlight_color()
                .map(to_color)
                .unwrap_or(Color::DarkGray),
            gradient_top,
            gradient_bottom,
            primary_text: track
                .artwork_primary_text_color()
                .map(to_color)
                .unwrap_or(fallback_primary),
            secondary_text: track
                .artwork_secondary_text_color()
                .map(to_color)
                .unwrap_or(fallback_secondary),
        }
    }
}
