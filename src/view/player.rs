//! Now-playing bar and the expanded player panel

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::model::TrackSummary;
use super::utils::PlayerColors;

fn play_symbol(is_playing: bool) -> &'static str {
    if is_playing { "⏸" } else { "▶" }
}

pub fn render_mini_player(
    frame: &mut Frame,
    area: Rect,
    track: Option<&TrackSummary>,
    is_playing: bool,
) {
    let Some(track) = track else {
        let idle = Paragraph::new(" Nothing playing")
            .block(Block::default().borders(Borders::ALL).title(" Now Playing "));
        frame.render_widget(idle, area);
        return;
    };

    let colors = PlayerColors::for_track(track);
    let line = Line::from(vec![
        Span::styled(
            format!(" {}  ", play_symbol(is_playing)),
            Style::default().fg(colors.primary_text),
        ),
        Span::styled(
            track.title.clone(),
            Style::default()
                .fg(colors.primary_text)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("  {}", track.artist),
            Style::default().fg(colors.secondary_text),
        ),
    ]);

    let bar = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Now Playing (E to expand) ")
            .border_style(Style::default().fg(colors.highlight))
            .style(Style::default().bg(colors.background)),
    );
    frame.render_widget(bar, area);
}

/// Draw the expanded player, pushed down by `drag_rows` while being dragged.
pub fn render_full_player(
    frame: &mut Frame,
    track: &TrackSummary,
    is_playing: bool,
    drag_rows: u16,
) {
    let area = frame.area();
    let y = (area.height / 8).saturating_add(drag_rows);
    if y >= area.height {
        return;
    }
    let popup_area = Rect {
        x: area.width / 8,
        y,
        width: area.width - area.width / 4,
        height: (area.height - area.height / 4).min(area.height - y),
    };
    frame.render_widget(Clear, popup_area);

    let colors = PlayerColors::for_track(track);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Now Playing (Esc to close) ")
        .border_style(Style::default().fg(colors.highlight))
        .style(Style::default().bg(colors.background));
    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let halves = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(inner);

    let top = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            track.title.clone(),
            Style::default()
                .fg(colors.primary_text)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            track.artist.clone(),
            Style::default().fg(colors.secondary_text),
        )),
    ])
    .alignment(Alignment::Center)
    .style(Style::default().bg(colors.gradient_top));
    frame.render_widget(top, halves[0]);

    let action = if is_playing { "pause" } else { "play" };
    let bottom = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("{}  Space to {}", play_symbol(is_playing), action),
            Style::default().fg(colors.primary_text),
        )),
    ])
    .alignment(Alignment::Center)
    .style(Style::default().bg(colors.gradient_bottom));
    frame.render_widget(bottom, halves[1]);
}
