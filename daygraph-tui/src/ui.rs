//! UI rendering module.
//!
//! Lays out the header, the day strip with its status line, the date picker
//! with a selection summary, and the log area. `timeline_viewport` exposes
//! the strip's geometry so `App::layout` places it before the frame is drawn.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph},
    Frame,
};

use crate::app::{App, Focus, LogLevel};
use crate::picker::{DatePickerWidget, PICKER_WIDTH};
use crate::theme::{colors, styles};
use crate::timeline::{TimelineStatusWidget, TimelineWidget};

/// Picker block height: header, weekday row, six weeks, hint, borders
const PICKER_HEIGHT: u16 = 11;

/// Screen regions of one frame
struct Regions {
    header: Rect,
    timeline: Rect,
    status: Rect,
    picker: Rect,
    details: Rect,
    logs: Rect,
}

fn regions(area: Rect) -> Regions {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(12),   // Main content
            Constraint::Length(6), // Log area
        ])
        .split(area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(20), Constraint::Length(PICKER_WIDTH)])
        .split(rows[1]);

    let graph = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(4), Constraint::Length(1)])
        .split(columns[0]);

    let sidebar = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(PICKER_HEIGHT), Constraint::Min(0)])
        .split(columns[1]);

    Regions {
        header: rows[0],
        timeline: graph[0],
        status: graph[1],
        picker: sidebar[0],
        details: sidebar[1],
        logs: rows[2],
    }
}

/// Inner area of the day strip for a terminal of size `area`
pub fn timeline_viewport(area: Rect) -> Rect {
    TimelineWidget::block(false).inner(regions(area).timeline)
}

/// Render the entire UI
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    // Fill background with theme color
    let bg_block = Block::default().style(Style::default().bg(colors::BG_DARK));
    frame.render_widget(bg_block, area);

    let regions = regions(area);

    render_header(frame, app, regions.header);
    render_timeline(frame, app, regions.timeline, regions.status);
    render_picker(frame, app, regions.picker);
    render_details(frame, app, regions.details);
    render_logs(frame, app, regions.logs);

    if app.show_help {
        render_help_overlay(frame, area);
    }
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let header = Paragraph::new(Line::from(Span::styled(
        format!(" {}", app.status_text()),
        styles::text(),
    )))
    .block(
        Block::default()
            .title(" Day Graph ")
            .title_style(styles::title())
            .borders(Borders::ALL)
            .border_style(styles::border())
            .style(Style::default().bg(colors::BG_MEDIUM)),
    );

    frame.render_widget(header, area);
}

fn render_timeline(frame: &mut Frame, app: &App, area: Rect, status_area: Rect) {
    let title = if app.is_loading {
        " Timeline · loading "
    } else {
        " Timeline "
    };
    let centered = app.controller.centered_day();

    let timeline = TimelineWidget::new(&app.days, &app.timeline_state)
        .centered(centered)
        .selected(app.controller.selected().day())
        .focused(app.focus == Focus::Graph)
        .title(title);
    frame.render_widget(timeline, area);

    let status = TimelineStatusWidget::new(&app.timeline_state, &app.days)
        .center(app.controller.viewport_center_x(), centered);
    frame.render_widget(status, status_area);
}

fn render_picker(frame: &mut Frame, app: &App, area: Rect) {
    let picker = DatePickerWidget::new(&app.picker)
        .days(&app.days)
        .focused(app.focus == Focus::Picker);
    frame.render_widget(picker, area);
}

/// Selection summary under the picker
fn render_details(frame: &mut Frame, app: &App, area: Rect) {
    if area.height < 3 {
        return;
    }

    let selected = app.controller.selected();
    let label = |text: &'static str| Span::styled(text, styles::label());

    let mut lines = vec![
        Line::from(vec![
            label("Selected "),
            Span::styled(
                selected.instant.format("%Y-%m-%d").to_string(),
                Style::default()
                    .fg(colors::YELLOW)
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            label("Source   "),
            Span::styled(selected.source.name(), styles::text()),
        ]),
    ];

    if let Some(target) = app.controller.pending_target() {
        lines.push(Line::from(vec![
            label("Scrolling"),
            Span::styled(format!(" {}", target.format("%m-%d")), styles::info()),
        ]));
    }

    match app.days.find(selected.day()) {
        Some(day) => {
            let values = day.values.iter().map(|s| s.value);
            let min = values.clone().fold(f64::INFINITY, f64::min);
            let max = values.clone().fold(f64::NEG_INFINITY, f64::max);
            let mean = values.sum::<f64>() / day.values.len().max(1) as f64;
            lines.push(Line::from(vec![
                label("Samples  "),
                Span::styled(day.values.len().to_string(), styles::text()),
            ]));
            lines.push(Line::from(vec![
                label("Range    "),
                Span::styled(format!("{:.2}–{:.2}", min, max), styles::text()),
            ]));
            lines.push(Line::from(vec![
                label("Mean     "),
                Span::styled(format!("{:.3}", mean), styles::text()),
            ]));
        }
        None => lines.push(Line::from(Span::styled("No samples", styles::text_hint()))),
    }

    let details = Paragraph::new(lines).block(
        Block::default()
            .title(" Day ")
            .title_style(styles::title())
            .borders(Borders::ALL)
            .border_style(styles::border_dim())
            .style(Style::default().bg(colors::BG_DARK)),
    );

    frame.render_widget(details, area);
}

/// Render the log area
fn render_logs(frame: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .logs
        .iter()
        .rev()
        .take(area.height.saturating_sub(2) as usize)
        .map(|entry| {
            let (prefix, color) = match entry.level {
                LogLevel::Info => ("i", colors::BLUE),
                LogLevel::Success => ("+", colors::GREEN),
                LogLevel::Warning => ("!", colors::YELLOW),
                LogLevel::Error => ("x", colors::RED),
            };

            ListItem::new(Line::from(vec![
                Span::styled(format!("[{}] ", prefix), Style::default().fg(color)),
                Span::styled(entry.message.as_str(), styles::text_dim()),
            ]))
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .title(" Log ")
            .title_style(Style::default().fg(colors::FG_DIM))
            .borders(Borders::ALL)
            .border_style(styles::border_dim())
            .style(Style::default().bg(colors::BG_DARK)),
    );

    frame.render_widget(list, area);
}

fn help_line(keys: &'static str, action: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<14}", keys), Style::default().fg(colors::BLUE)),
        Span::raw(action),
    ])
}

fn help_section(title: &'static str) -> Line<'static> {
    Line::from(Span::styled(
        title,
        Style::default()
            .fg(colors::PURPLE)
            .add_modifier(Modifier::BOLD),
    ))
}

/// Render help overlay
fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(52, 24, area);

    frame.render_widget(Clear, popup_area);

    let help_text = vec![
        Line::from(Span::styled(
            "Keyboard Shortcuts",
            Style::default()
                .fg(colors::BLUE)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        help_section("Timeline"),
        help_line("h/l", "Scroll"),
        help_line("H/L", "Scroll one day"),
        help_line("Home/End", "First / last day"),
        help_line("+/-", "Zoom in / out"),
        Line::from(""),
        help_section("Date picker"),
        help_line("Left/Right", "+/-1 day"),
        help_line("Up/Down", "+/-7 days"),
        help_line("PgUp/PgDn", "+/-1 month"),
        help_line("t", "Today"),
        Line::from(""),
        help_section("General"),
        help_line("Tab", "Switch focus"),
        help_line("r", "Regenerate data"),
        help_line("a", "Append a day of samples"),
        help_line("?", "Toggle help"),
        help_line("q/Ctrl+C", "Quit"),
    ];

    let paragraph = Paragraph::new(help_text)
        .block(
            Block::default()
                .title(" Help ")
                .title_style(styles::title())
                .borders(Borders::ALL)
                .border_style(styles::border())
                .style(Style::default().bg(colors::BG_MEDIUM)),
        )
        .style(styles::text());

    frame.render_widget(paragraph, popup_area);
}

/// Helper to create a centered rectangle
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}
