//! Application state and event handling.
//!
//! Elm-style: `App` owns every piece of UI state, key presses and worker
//! messages mutate it, and `ui::render` draws it. Once per frame `layout`
//! places the day strip and reports its geometry to the sync controller,
//! which is how scrolling moves the selected date.

use std::time::Instant;

use chrono::{NaiveDate, NaiveTime, Utc};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use daygraph::config::GraphConfig;
use daygraph::error::GraphError;
use daygraph::sync::{DateUpdate, LayoutReport, ScrollCommand, ScrollSyncController};
use daygraph::DayList;
use ratatui::layout::Rect;
use tracing::{debug, info, warn};

use crate::loader::{DataCommand, DataMessage};
use crate::picker::DatePickerState;
use crate::timeline::TimelineState;
use crate::ui;

/// Which widget receives navigation keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    /// The day strip
    #[default]
    Graph,
    /// The date picker
    Picker,
}

impl Focus {
    pub fn next(&self) -> Self {
        match self {
            Focus::Graph => Focus::Picker,
            Focus::Picker => Focus::Graph,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Focus::Graph => "Graph",
            Focus::Picker => "Date",
        }
    }
}

/// Log entry for the message area
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: Instant,
    pub message: String,
    pub level: LogLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl LogEntry {
    fn with_level(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            timestamp: Instant::now(),
            message: message.into(),
            level,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::with_level(LogLevel::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::with_level(LogLevel::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::with_level(LogLevel::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::with_level(LogLevel::Error, message)
    }
}

/// Main application state
#[derive(Debug)]
pub struct App {
    /// Whether the application should quit
    pub should_quit: bool,

    /// Widget receiving navigation keys
    pub focus: Focus,

    /// Bucketed data
    pub days: DayList,

    /// Scroll/date synchronization
    pub controller: ScrollSyncController,

    /// Day strip scroll state
    pub timeline_state: TimelineState,

    /// Date picker state
    pub picker: DatePickerState,

    /// Log messages
    pub logs: Vec<LogEntry>,
    /// Maximum number of log entries to keep
    max_logs: usize,

    /// Whether data is currently loading
    pub is_loading: bool,

    /// Frame counter for animations
    pub frame_count: u64,

    /// Show help overlay
    pub show_help: bool,

    /// Columns per h/l press
    scroll_step: u16,

    /// Scroll command issued before the strip had a width
    queued_scroll: Option<ScrollCommand>,

    /// Geometry last sent to the controller; unchanged geometry is not resent
    last_report: Option<LayoutReport>,
}

impl Default for App {
    fn default() -> Self {
        Self::new(&GraphConfig::default())
    }
}

impl App {
    /// Create a new application instance
    pub fn new(config: &GraphConfig) -> Self {
        let now = Utc::now();
        let mut app = Self {
            should_quit: false,
            focus: Focus::Graph,
            days: DayList::new(),
            controller: ScrollSyncController::new(now)
                .with_missing_day_policy(config.view.missing_day),
            timeline_state: TimelineState::new(&config.view),
            picker: DatePickerState::new(now.date_naive()),
            logs: Vec::new(),
            max_logs: 100,
            is_loading: true,
            frame_count: 0,
            show_help: false,
            scroll_step: config.view.scroll_step,
            queued_scroll: None,
            last_report: None,
        };

        app.log(LogEntry::info("Day graph initialized"));
        app.log(LogEntry::info(format!(
            "Generating {} samples...",
            config.data.sample_count
        )));
        app
    }

    /// Add a log entry
    pub fn log(&mut self, entry: LogEntry) {
        self.logs.push(entry);
        if self.logs.len() > self.max_logs {
            self.logs.remove(0);
        }
    }

    /// Handle a message from the data worker
    pub fn handle_data_message(&mut self, message: DataMessage) {
        match message {
            DataMessage::Loaded(days, stats) => {
                self.is_loading = false;
                self.days = days;
                self.timeline_state.set_day_count(self.days.len());
                self.controller.reset();
                self.queued_scroll = None;
                self.last_report = None;

                if self.days.is_empty() {
                    self.log(LogEntry::warning("Data set is empty"));
                } else {
                    self.log(LogEntry::success(format!(
                        "Loaded {} samples in {} days ({} ms)",
                        stats.samples,
                        stats.days,
                        stats.elapsed.as_millis()
                    )));
                }

                if let Some(command) = self.controller.mount(&self.days) {
                    self.execute_scroll(command);
                }
            }
            DataMessage::Appended(samples) => {
                let before = self.days.len();
                match self.days.extend(samples) {
                    Ok(added) => {
                        self.timeline_state.set_day_count(self.days.len());
                        self.log(LogEntry::success(format!(
                            "Appended {} samples ({} new days)",
                            added,
                            self.days.len() - before
                        )));
                    }
                    Err(e) => {
                        warn!(error = %e, "append rejected");
                        self.log(LogEntry::error(format!("Append failed: {}", e)));
                    }
                }
            }
            DataMessage::Error(e) => {
                self.is_loading = false;
                warn!(error = %e, "data worker error");
                self.log(LogEntry::error(e));
            }
        }
    }

    /// Place the day strip for this frame and report its geometry
    pub fn layout(&mut self, area: Rect) {
        self.timeline_state.set_viewport(ui::timeline_viewport(area));

        if let Some(command) = self.queued_scroll.take() {
            debug!("running scroll queued before first layout");
            self.execute_scroll(command);
        }

        let report = self.timeline_state.layout_report(&self.days);
        if self.last_report.as_ref() == Some(&report) {
            return;
        }
        self.last_report = Some(report.clone());
        if let Some(update) = self.controller.report_layout(report) {
            self.apply_date_update(update);
        }
    }

    fn apply_date_update(&mut self, update: DateUpdate) {
        self.picker.set_displayed(update.current.instant.date_naive());
    }

    /// Hand a scroll command to the strip
    fn execute_scroll(&mut self, command: ScrollCommand) {
        match self.timeline_state.scroll_to(&command, &self.days) {
            Ok(()) => {}
            Err(GraphError::LayoutNotReady) => {
                self.queued_scroll = Some(command);
            }
            Err(e) => {
                warn!(error = %e, "scroll command failed");
                self.log(LogEntry::warning(format!("Cannot scroll: {}", e)));
            }
        }
    }

    /// Handle key events and return an optional data command
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<DataCommand> {
        if self.show_help {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Enter) {
                self.show_help = false;
            }
            return None;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => {
                self.should_quit = true;
                return Some(DataCommand::Shutdown);
            }
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
                return Some(DataCommand::Shutdown);
            }
            KeyCode::Char('?') => {
                self.show_help = true;
                return None;
            }
            KeyCode::Char('r') => {
                self.is_loading = true;
                self.log(LogEntry::info("Regenerating data..."));
                return Some(DataCommand::Generate);
            }
            KeyCode::Char('a') => {
                if self.is_loading {
                    return None;
                }
                self.log(LogEntry::info("Appending a day of samples..."));
                return Some(DataCommand::AppendDay);
            }
            KeyCode::Tab | KeyCode::BackTab => {
                self.focus = self.focus.next();
                return None;
            }
            _ => {}
        }

        match self.focus {
            Focus::Graph => self.handle_graph_key(key),
            Focus::Picker => self.handle_picker_key(key),
        }

        None
    }

    /// Keys that move the strip by hand
    fn handle_graph_key(&mut self, key: KeyEvent) {
        let step = self.scroll_step as f64;
        match key.code {
            KeyCode::Char('h') | KeyCode::Left => self.timeline_state.scroll_by(-step),
            KeyCode::Char('l') | KeyCode::Right => self.timeline_state.scroll_by(step),
            KeyCode::Char('H') => self.timeline_state.scroll_days(-1),
            KeyCode::Char('L') => self.timeline_state.scroll_days(1),
            KeyCode::Home => self.timeline_state.scroll_to_start(),
            KeyCode::End => self.timeline_state.scroll_to_end(),
            KeyCode::Char('+') | KeyCode::Char('=') => self.timeline_state.zoom_in(),
            KeyCode::Char('-') => self.timeline_state.zoom_out(),
            _ => return,
        }
        self.controller.user_scrolled();
    }

    fn handle_picker_key(&mut self, key: KeyEvent) {
        if let Some(date) = self.picker.handle_key(key) {
            self.pick_date(date);
        }
    }

    /// The user chose `date` in the picker
    pub fn pick_date(&mut self, date: NaiveDate) {
        info!(%date, "date picked");
        let instant = date.and_time(NaiveTime::MIN).and_utc();
        if let Some(command) = self.controller.select_date(instant, &self.days) {
            self.execute_scroll(command);
        } else if !self.days.is_empty() && self.days.index_of(instant).is_none() {
            self.log(LogEntry::warning(format!("No data on {}", date)));
        }
    }

    /// Update animations (called every frame)
    pub fn tick(&mut self) {
        self.frame_count = self.frame_count.wrapping_add(1);
        if self.timeline_state.tick() {
            self.controller.scroll_finished();
            // The settled strip is reported even if its geometry is unchanged
            self.last_report = None;
        }
    }

    /// Get the status bar text
    pub fn status_text(&self) -> String {
        let loading = if self.is_loading { " [Loading...]" } else { "" };
        let selected = self.controller.selected();

        format!(
            "{}{} | {} ({}) | ?: Help | Tab: Focus | r: Regenerate | a: Append | q: Quit",
            self.focus.name(),
            loading,
            selected.instant.format("%Y-%m-%d"),
            selected.source.name(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::LoadStats;
    use chrono::{DateTime, TimeZone};
    use daygraph::sync::DateSource;
    use daygraph::Sample;
    use std::time::Duration;

    const AREA: Rect = Rect {
        x: 0,
        y: 0,
        width: 140,
        height: 40,
    };

    fn at(d: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, d, hour, 0, 0).unwrap()
    }

    /// Thirty days of data, one missing day (April 10)
    fn days() -> DayList {
        let samples = (1..=30u32)
            .filter(|d| *d != 10)
            .flat_map(|d| [Sample::new(at(d, 3), 0.2), Sample::new(at(d, 15), 0.8)]);
        DayList::from_samples(samples)
    }

    fn loaded_app() -> App {
        let mut app = App::default();
        let days = days();
        let stats = LoadStats {
            samples: days.sample_count(),
            days: days.len(),
            elapsed: Duration::from_millis(1),
        };
        app.handle_data_message(DataMessage::Loaded(days, stats));
        app
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn run_frames(app: &mut App, frames: usize) {
        for _ in 0..frames {
            app.tick();
            app.layout(AREA);
        }
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, d).unwrap()
    }

    #[test]
    fn test_mount_centers_last_day() {
        let mut app = loaded_app();
        app.layout(AREA);

        assert_eq!(app.controller.centered_day(), Some(at(30, 0)));
        assert_eq!(app.controller.selected().day(), at(30, 0));
        assert_eq!(app.controller.selected().source, DateSource::Scroll);
        assert_eq!(app.picker.date(), date(30));
    }

    #[test]
    fn test_picker_scrolls_and_keeps_selection() {
        let mut app = loaded_app();
        app.layout(AREA);
        app.focus = Focus::Picker;

        app.handle_key(key(KeyCode::Up)); // April 23
        assert!(app.timeline_state.is_animating());
        assert_eq!(app.controller.selected().source, DateSource::Picker);

        run_frames(&mut app, 20);
        assert_eq!(app.controller.centered_day(), Some(at(23, 0)));
        assert_eq!(app.controller.selected().day(), at(23, 0));
        assert_eq!(app.controller.selected().source, DateSource::Picker);
        assert_eq!(app.picker.date(), date(23));
        assert_eq!(app.controller.pending_target(), None);
    }

    #[test]
    fn test_manual_scroll_moves_date() {
        let mut app = loaded_app();
        app.layout(AREA);

        app.handle_key(key(KeyCode::Char('H')));
        app.layout(AREA);
        assert_eq!(app.controller.selected().day(), at(29, 0));
        assert_eq!(app.picker.date(), date(29));
        assert!(!app.timeline_state.is_animating());
    }

    #[test]
    fn test_missing_day_does_not_scroll() {
        let mut app = loaded_app();
        app.layout(AREA);
        let offset = app.timeline_state.scroll_offset;

        app.pick_date(date(10));
        assert!(!app.timeline_state.is_animating());
        assert_eq!(app.timeline_state.scroll_offset, offset);
        assert_eq!(app.logs.last().map(|l| l.level), Some(LogLevel::Warning));

        // The strip did not move, so the picked date stands
        run_frames(&mut app, 3);
        assert_eq!(app.controller.selected().day(), at(10, 0));
        assert_eq!(app.picker.date(), date(10));
    }

    #[test]
    fn test_scroll_before_first_layout_is_queued() {
        let mut app = App::default();
        let days = days();
        let stats = LoadStats {
            samples: days.sample_count(),
            days: days.len(),
            elapsed: Duration::ZERO,
        };
        // No layout has happened, so the strip has no width yet
        app.handle_data_message(DataMessage::Loaded(days, stats));
        assert!(app.queued_scroll.is_some());

        app.layout(AREA);
        assert!(app.queued_scroll.is_none());
        assert_eq!(app.controller.centered_day(), Some(at(30, 0)));
    }

    #[test]
    fn test_empty_data_set() {
        let mut app = App::default();
        let stats = LoadStats {
            samples: 0,
            days: 0,
            elapsed: Duration::ZERO,
        };
        app.handle_data_message(DataMessage::Loaded(DayList::new(), stats));
        app.layout(AREA);

        assert_eq!(app.controller.centered_day(), None);
        app.pick_date(date(3));
        assert_eq!(app.controller.selected().source, DateSource::Picker);
    }

    #[test]
    fn test_append_keeps_position() {
        let mut app = loaded_app();
        app.layout(AREA);
        let may_first = Utc.with_ymd_and_hms(2024, 5, 1, 6, 0, 0).unwrap();

        app.handle_data_message(DataMessage::Appended(vec![Sample::new(may_first, 0.4)]));
        app.layout(AREA);
        assert_eq!(app.days.len(), 30);
        assert_eq!(app.days.sample_count(), 59);
        assert_eq!(app.controller.selected().day(), at(30, 0));
        assert_eq!(app.logs.last().map(|l| l.level), Some(LogLevel::Success));
    }

    #[test]
    fn test_append_rejects_older_samples() {
        let mut app = loaded_app();
        app.layout(AREA);

        app.handle_data_message(DataMessage::Appended(vec![Sample::new(at(2, 0), 0.4)]));
        assert_eq!(app.days.sample_count(), 58);
        assert_eq!(app.logs.last().map(|l| l.level), Some(LogLevel::Error));
    }

    #[test]
    fn test_resize_during_picker_scroll_lands_on_date() {
        let mut app = loaded_app();
        app.layout(AREA);

        app.pick_date(date(23));
        app.tick();
        let wide = Rect { width: 240, ..AREA };
        for _ in 0..40 {
            app.tick();
            app.layout(wide);
        }

        assert!(!app.timeline_state.is_animating());
        assert_eq!(app.controller.centered_day(), Some(at(23, 0)));
        assert_eq!(app.controller.selected().day(), at(23, 0));
        assert_eq!(app.controller.pending_target(), None);
        assert_eq!(app.picker.date(), date(23));
    }

    #[test]
    fn test_quit_and_help() {
        let mut app = App::default();
        app.handle_key(key(KeyCode::Char('?')));
        assert!(app.show_help);
        // Keys are swallowed by the help overlay
        assert_eq!(app.handle_key(key(KeyCode::Char('q'))), None);
        app.handle_key(key(KeyCode::Esc));
        assert!(!app.show_help);

        assert_eq!(app.handle_key(key(KeyCode::Char('q'))), Some(DataCommand::Shutdown));
        assert!(app.should_quit);
    }

    #[test]
    fn test_tab_switches_focus() {
        let mut app = App::default();
        assert_eq!(app.focus, Focus::Graph);
        app.handle_key(key(KeyCode::Tab));
        assert_eq!(app.focus, Focus::Picker);
        assert!(app.status_text().starts_with("Date"));
    }
}
