//! UI rendering

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use faxmachine_core::Preview;

use super::app::{ActivePane, App, InputMode, PendingInject};
use crate::output::{format_size, truncate};

/// Main UI rendering function
pub fn draw(frame: &mut Frame, app: &App) {
    // Create vertical layout for status bar at the bottom
    let outer_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(frame.area());

    // Split the main area into three panes
    let pane_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(20),
            Constraint::Percentage(30),
            Constraint::Percentage(50),
        ])
        .split(outer_chunks[0]);

    draw_filters_pane(frame, app, pane_chunks[0]);
    draw_items_pane(frame, app, pane_chunks[1]);
    match &app.pending_inject {
        Some(pending) => draw_inject_preview(frame, app, pending, pane_chunks[2]),
        None => draw_detail_pane(frame, app, pane_chunks[2]),
    }

    // Draw status bar or command input
    match app.input_mode {
        InputMode::Normal => draw_status_bar(frame, app, outer_chunks[1]),
        InputMode::Command => draw_input_line(frame, app, ":", Color::Yellow, None, outer_chunks[1]),
        InputMode::Filter => {
            let matches = format!("  ({} matches)", app.entries.len());
            draw_input_line(frame, app, "/", Color::Cyan, Some(matches), outer_chunks[1])
        }
    }

    if app.show_help {
        draw_help_overlay(frame);
    }

    if let Some(error) = &app.error_message {
        draw_error_modal(frame, error);
    }
}

fn pane_block(title: String, is_active: bool) -> Block<'static> {
    let border_style = if is_active {
        Style::default().add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };

    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style)
}

fn highlight_style(is_active: bool) -> Style {
    if is_active {
        Style::default()
            .add_modifier(Modifier::BOLD)
            .add_modifier(Modifier::REVERSED)
    } else {
        Style::default().add_modifier(Modifier::REVERSED)
    }
}

/// Draw the filters pane (left)
fn draw_filters_pane(frame: &mut Frame, app: &App, area: Rect) {
    let is_active = app.active_pane == ActivePane::Filters;

    let items: Vec<ListItem> = app
        .filters
        .iter()
        .map(|filter| ListItem::new(filter.label()))
        .collect();

    let list = List::new(items)
        .block(pane_block(" Categories ".to_string(), is_active))
        .highlight_style(highlight_style(is_active));

    let mut state = ListState::default();
    state.select(Some(app.filter_index));

    frame.render_stateful_widget(list, area, &mut state);
}

/// Draw the items pane (middle)
fn draw_items_pane(frame: &mut Frame, app: &App, area: Rect) {
    let is_active = app.active_pane == ActivePane::Items;
    let max_len = area.width.saturating_sub(4) as usize;

    let items: Vec<ListItem> = app
        .entries
        .iter()
        .map(|entry| {
            let name = Line::from(Span::raw(truncate(&entry.key.name, max_len)));
            let location = Line::from(Span::styled(
                truncate(&entry.key.location(), max_len.saturating_sub(2)),
                Style::default().add_modifier(Modifier::DIM),
            ));
            ListItem::new(vec![name, location])
        })
        .collect();

    let title = format!(" Files ({}) ", app.entries.len());
    let list = List::new(items)
        .block(pane_block(title, is_active))
        .highlight_style(highlight_style(is_active));

    let mut state = ListState::default();
    if !app.entries.is_empty() {
        state.select(Some(app.entry_index));
    }

    frame.render_stateful_widget(list, area, &mut state);
}

fn field<'a>(label: &'a str, value: String) -> Line<'a> {
    Line::from(vec![
        Span::styled(label, Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(value),
    ])
}

/// Draw the detail pane (right)
fn draw_detail_pane(frame: &mut Frame, app: &App, area: Rect) {
    let is_active = app.active_pane == ActivePane::Detail;

    let content = if let Some(entry) = app.current_entry() {
        let meta = &entry.metadata;

        let mut lines = vec![
            field("Key: ", entry.key.to_string()),
            Line::from(""),
            field("Description: ", or_dash(&meta.description)),
            field("Tags: ", or_dash(&meta.tags.join(", "))),
            field("Added: ", or_dash(meta.added_day())),
            field("Source: ", or_dash(&meta.source_path)),
            field("Size: ", format_size(entry.size)),
        ];
        if let Some(modified) = entry.modified {
            lines.push(field(
                "Modified: ",
                modified.format("%Y-%m-%d %H:%M").to_string(),
            ));
        }

        lines.push(Line::from(""));
        let header = "── Content ";
        let remaining = area.width.saturating_sub(header.chars().count() as u16 + 2) as usize;
        lines.push(Line::from(Span::styled(
            format!("{}{}", header, "─".repeat(remaining)),
            Style::default().add_modifier(Modifier::DIM),
        )));

        match app.detail.as_ref().filter(|d| d.key == entry.key) {
            Some(detail) => match &detail.text {
                Some(text) => lines.extend(text.lines().map(|l| Line::from(l.to_string()))),
                None => lines.push(Line::from(Span::styled(
                    "(binary file)",
                    Style::default().add_modifier(Modifier::DIM),
                ))),
            },
            None => lines.push(Line::from("")),
        }

        lines
    } else {
        vec![
            Line::from(""),
            Line::from(Span::styled(
                "Select a file to view details",
                Style::default().add_modifier(Modifier::DIM),
            )),
        ]
    };

    let scroll = clamp_scroll(app.detail_scroll, content.len());
    let paragraph = Paragraph::new(content)
        .block(pane_block(" Detail ".to_string(), is_active))
        .scroll((scroll, 0));

    frame.render_widget(paragraph, area);
}

/// Draw the diff shown while an overwrite waits for confirmation
fn draw_inject_preview(frame: &mut Frame, app: &App, pending: &PendingInject, area: Rect) {
    let lines: Vec<Line> = match &pending.preview {
        Preview::Diff { diff, .. } => diff.lines().map(diff_line).collect(),
        other => other.text().lines().map(|l| Line::from(l.to_string())).collect(),
    };

    let title = format!(
        " Overwrite {}? (y/n) ",
        pending.options.dest_path(&pending.key).display()
    );
    let scroll = clamp_scroll(app.detail_scroll, lines.len());
    let paragraph = Paragraph::new(lines)
        .block(pane_block(title, true))
        .scroll((scroll, 0));

    frame.render_widget(paragraph, area);
}

fn diff_line(line: &str) -> Line<'static> {
    let style = if line.starts_with("+++") || line.starts_with("---") {
        Style::default().add_modifier(Modifier::BOLD)
    } else if line.starts_with('+') {
        Style::default().fg(Color::Green)
    } else if line.starts_with('-') {
        Style::default().fg(Color::Red)
    } else if line.starts_with("@@") {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    Line::from(Span::styled(line.to_string(), style))
}

fn or_dash(s: &str) -> String {
    if s.is_empty() {
        "-".to_string()
    } else {
        s.to_string()
    }
}

fn clamp_scroll(scroll: u16, lines: usize) -> u16 {
    scroll.min(lines.saturating_sub(1).min(u16::MAX as usize) as u16)
}

/// Draw the status bar at the bottom
fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let content = if let Some(msg) = &app.status_message {
        msg.clone()
    } else if app.pending_inject.is_some() {
        "y:overwrite  any other key:cancel".to_string()
    } else {
        "i:inject  e:edit  o:open  d:del  u:undo  /:filter  ::cmd  ?:help  q:quit".to_string()
    };

    let paragraph = Paragraph::new(content).style(Style::default().add_modifier(Modifier::DIM));

    frame.render_widget(paragraph, area);
}

/// Draw a command or filter input line at the bottom
fn draw_input_line(
    frame: &mut Frame,
    app: &App,
    prefix: &str,
    color: Color,
    suffix: Option<String>,
    area: Rect,
) {
    let mut spans = vec![
        Span::styled(prefix.to_string(), Style::default().fg(color)),
        Span::raw(app.command_input.clone()),
    ];
    if let Some(suffix) = suffix {
        spans.push(Span::styled(
            suffix,
            Style::default().add_modifier(Modifier::DIM),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);

    // Position cursor
    let cursor_x = area.x + prefix.len() as u16 + app.command_cursor as u16;
    frame.set_cursor_position((cursor_x, area.y));
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(4));
    Rect::new(
        area.width.saturating_sub(width) / 2,
        area.height.saturating_sub(height) / 2,
        width,
        height,
    )
}

/// Draw help overlay
fn draw_help_overlay(frame: &mut Frame) {
    let popup_area = centered(frame.area(), 56, 28);
    frame.render_widget(Clear, popup_area);

    let help_text = vec![
        Line::from(Span::styled(
            "Keyboard Shortcuts",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("Navigation:"),
        Line::from("  j/k, ↑/↓    Move up/down"),
        Line::from("  gg          Jump to first item"),
        Line::from("  G           Jump to last item"),
        Line::from("  h/l, ←/→    Switch panes"),
        Line::from("  Tab         Cycle panes"),
        Line::from("  Enter       Apply filter / Inject file"),
        Line::from("  v           View file in detail pane"),
        Line::from(""),
        Line::from("Commands:"),
        Line::from("  i           Inject into current directory"),
        Line::from("  I           Inject under another name"),
        Line::from("  a           Add file"),
        Line::from("  t           Edit tags"),
        Line::from("  e           Edit metadata in editor"),
        Line::from("  o           Open with default application"),
        Line::from("  d           Delete file"),
        Line::from("  u           Undo delete"),
        Line::from(""),
        Line::from("  /           Filter view"),
        Line::from("  :           Command mode (search, add, tag, inject)"),
        Line::from("  q           Quit"),
        Line::from(""),
        Line::from(Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(Style::default().add_modifier(Modifier::BOLD));

    frame.render_widget(Paragraph::new(help_text).block(block), popup_area);
}

/// Draw an error modal
fn draw_error_modal(frame: &mut Frame, message: &str) {
    let popup_area = centered(frame.area(), 60, 8);
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .title(" Error ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red));

    let text = vec![
        Line::from(message.to_string()),
        Line::from(""),
        Line::from(Span::styled(
            "Press any key to dismiss",
            Style::default().add_modifier(Modifier::DIM),
        )),
    ];

    let paragraph = Paragraph::new(text).block(block).wrap(Wrap { trim: true });
    frame.render_widget(paragraph, popup_area);
}
