//! Library area: status screens and the track list

use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, ListItem, Padding, Paragraph, Wrap},
    Frame,
};

use crate::coordinator::NowPlaying;
use crate::model::{LibrarySnapshot, LibraryState};
use super::utils::{render_scrollable_list, truncate_string};

pub fn render_library(
    frame: &mut Frame,
    area: Rect,
    library: &LibrarySnapshot,
    now_playing: &NowPlaying,
    selected: usize,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" My Songs ")
        .padding(Padding::horizontal(1));

    match &library.state {
        LibraryState::Idle | LibraryState::Authorizing | LibraryState::Loading => {
            render_message(frame, area, block, "Loading your library…", None, Color::Gray);
        }
        LibraryState::Unauthorized => {
            render_message(
                frame,
                area,
                block,
                "We need access to your Spotify library",
                Some("Press A to grant access."),
                Color::Cyan,
            );
        }
        LibraryState::Failed(message) => {
            render_message(
                frame,
                area,
                block,
                "Failed to load songs",
                Some(&format!("{}\n\nPress R to try again.", message)),
                Color::Yellow,
            );
        }
        LibraryState::Loaded if library.tracks.is_empty() => {
            render_message(
                frame,
                area,
                block,
                "No Songs",
                Some("Your library appears to be empty."),
                Color::Gray,
            );
        }
        LibraryState::Loaded => {
            render_track_list(frame, area, block, library, now_playing, selected);
        }
    }
}

fn render_message(
    frame: &mut Frame,
    area: Rect,
    block: Block,
    headline: &str,
    detail: Option<&str>,
    color: Color,
) {
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            headline.to_string(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )),
    ];
    if let Some(detail) = detail {
        lines.push(Line::from(""));
        lines.extend(
            detail
                .lines()
                .map(|l| Line::from(Span::styled(l.to_string(), Style::default().fg(Color::Gray)))),
        );
    }

    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: false })
        .block(block);
    frame.render_widget(paragraph, area);
}

fn render_track_list(
    frame: &mut Frame,
    area: Rect,
    block: Block,
    library: &LibrarySnapshot,
    now_playing: &NowPlaying,
    selected: usize,
) {
    let content_width = area.width.saturating_sub(4) as usize;
    let num_width = library.tracks.len().to_string().len() + 1;
    let remaining = content_width.saturating_sub(num_width + 6);
    let title_width = remaining * 55 / 100;
    let artist_width = remaining.saturating_sub(title_width);
    let playing_id = now_playing.track.as_ref().map(|t| t.id.as_str());

    let items: Vec<ListItem> = library
        .tracks
        .iter()
        .enumerate()
        .map(|(i, track)| {
            let marker = if now_playing.is_starting(&track.id) {
                "…"
            } else if playing_id == Some(track.id.as_str()) {
                "♪"
            } else {
                " "
            };

            let text = format!(
                "{:>num_width$} {}  {}  {}",
                i + 1,
                marker,
                truncate_string(&track.title, title_width),
                truncate_string(&track.artist, artist_width),
                num_width = num_width,
            );

            let style = if i == selected {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Green)
                    .add_modifier(Modifier::BOLD)
            } else if playing_id == Some(track.id.as_str()) {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(Color::White)
            };

            ListItem::new(text).style(style)
        })
        .collect();

    render_scrollable_list(frame, area, items, selected, block);
}
