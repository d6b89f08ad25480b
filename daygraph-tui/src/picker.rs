//! Month calendar date picker.
//!
//! The picker keeps its own displayed date. User edits come back from
//! `handle_key` as the newly chosen date; updates pushed from the timeline go
//! through `set_displayed` and produce nothing, so they never echo back as a
//! scroll request.

use chrono::{Datelike, Months, NaiveDate, TimeDelta, Utc};
use crossterm::event::{KeyCode, KeyEvent};
use daygraph::DayList;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::theme::{colors, styles};

const MONTH_NAMES: [&str; 12] = [
    "January", "February", "March", "April", "May", "June",
    "July", "August", "September", "October", "November", "December",
];

/// Picker width including borders
pub const PICKER_WIDTH: u16 = 24;

/// Date picker state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatePickerState {
    date: NaiveDate,
}

impl DatePickerState {
    pub fn new(date: NaiveDate) -> Self {
        Self { date }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Show `date` without reporting a change
    pub fn set_displayed(&mut self, date: NaiveDate) {
        self.date = date;
    }

    fn step_days(&mut self, days: i64) -> Option<NaiveDate> {
        let next = self.date.checked_add_signed(TimeDelta::days(days))?;
        self.commit(next)
    }

    fn step_months(&mut self, months: i32) -> Option<NaiveDate> {
        let next = if months >= 0 {
            self.date.checked_add_months(Months::new(months.unsigned_abs()))
        } else {
            self.date.checked_sub_months(Months::new(months.unsigned_abs()))
        }?;
        self.commit(next)
    }

    fn commit(&mut self, date: NaiveDate) -> Option<NaiveDate> {
        if date == self.date {
            return None;
        }
        self.date = date;
        Some(date)
    }

    /// Apply a key press; returns the newly chosen date on a user edit
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<NaiveDate> {
        match key.code {
            KeyCode::Left | KeyCode::Char('h') => self.step_days(-1),
            KeyCode::Right | KeyCode::Char('l') => self.step_days(1),
            KeyCode::Up | KeyCode::Char('k') => self.step_days(-7),
            KeyCode::Down | KeyCode::Char('j') => self.step_days(7),
            KeyCode::PageUp => self.step_months(-1),
            KeyCode::PageDown => self.step_months(1),
            KeyCode::Char('t') => self.commit(Utc::now().date_naive()),
            _ => None,
        }
    }
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    next.and_then(|d| d.pred_opt()).map(|d| d.day()).unwrap_or(28)
}

/// Calendar widget for [`DatePickerState`]
pub struct DatePickerWidget<'a> {
    state: &'a DatePickerState,
    days: Option<&'a DayList>,
    focused: bool,
}

impl<'a> DatePickerWidget<'a> {
    pub fn new(state: &'a DatePickerState) -> Self {
        Self {
            state,
            days: None,
            focused: false,
        }
    }

    /// Dim the days that have no samples
    pub fn days(mut self, days: &'a DayList) -> Self {
        self.days = Some(days);
        self
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    fn has_data(&self, date: NaiveDate) -> bool {
        match self.days {
            Some(days) => date
                .and_hms_opt(0, 0, 0)
                .map(|d| days.index_of(d.and_utc()).is_some())
                .unwrap_or(false),
            None => true,
        }
    }

    fn lines(&self) -> Vec<Line<'static>> {
        let date = self.state.date();
        let year = date.year();
        let month = date.month();

        let mut lines = Vec::new();
        let header = format!("{} {}", MONTH_NAMES[date.month0() as usize], year);
        lines.push(Line::from(Span::styled(
            format!("{:^22}", header),
            Style::default().fg(colors::BLUE).add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(vec![
            Span::styled(" Mo Tu We Th Fr ", styles::text_dim()),
            Span::styled("Sa ", Style::default().fg(colors::BLUE)),
            Span::styled("Su", Style::default().fg(colors::RED)),
        ]));

        let Some(first_of_month) = NaiveDate::from_ymd_opt(year, month, 1) else {
            return lines;
        };
        let first_weekday = first_of_month.weekday().num_days_from_monday() as usize;
        let last_day = days_in_month(year, month);
        let today = Utc::now().date_naive();

        let mut day = 1u32;
        for week in 0..6 {
            if day > last_day {
                break;
            }
            let mut spans = vec![Span::raw(" ")];
            for weekday in 0..7 {
                if (week == 0 && weekday < first_weekday) || day > last_day {
                    spans.push(Span::raw("   "));
                    continue;
                }
                let current = first_of_month.with_day(day).unwrap_or(first_of_month);

                let style = if day == date.day() {
                    styles::selected()
                } else if current == today {
                    Style::default().fg(colors::YELLOW).add_modifier(Modifier::BOLD)
                } else if !self.has_data(current) {
                    styles::text_hint()
                } else if weekday == 5 {
                    Style::default().fg(colors::BLUE)
                } else if weekday == 6 {
                    Style::default().fg(colors::RED)
                } else {
                    styles::text()
                };

                spans.push(Span::styled(format!("{:2} ", day), style));
                day += 1;
            }
            lines.push(Line::from(spans));
        }

        lines.push(Line::from(Span::styled(
            "◀▶±1d ▲▼±7d PgUp/Dn",
            styles::text_hint(),
        )));
        lines
    }
}

impl Widget for DatePickerWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(" Date ")
            .title_style(styles::title())
            .borders(Borders::ALL)
            .border_style(if self.focused {
                styles::border_focused()
            } else {
                styles::border()
            })
            .style(Style::default().bg(colors::BG_MEDIUM));

        Paragraph::new(self.lines()).block(block).render(area, buf);
    }
}
