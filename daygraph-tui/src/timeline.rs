//! Timeline widget: a horizontally scrolling strip of day panels.
//!
//! `TimelineState` is the scroll container. It knows the width of one day
//! panel and the current scroll offset, lays out only the panels that are
//! visible, reports their geometry, and executes scroll commands (animated
//! over a few frames when asked to).
//!
//! `TimelineWidget` draws each visible day as a line graph: segments between
//! consecutive samples, the segment into the next day's first sample, dot
//! markers, a separator on the left edge and the date underneath.

use std::ops::Range;

use daygraph::config::ViewSettings;
use daygraph::error::{GraphError, GraphResult};
use daygraph::mapper::{self, Edge};
use daygraph::sync::{Anchor, LayoutReport, ScrollCommand};
use daygraph::{Day, DayId, DayList, Sample};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    symbols::Marker,
    widgets::{
        canvas::{Canvas, Line as CanvasLine, Points},
        Block, Borders, Widget,
    },
};

use crate::theme::{colors, styles};

/// In-flight programmatic scroll
#[derive(Debug, Clone, Copy, PartialEq)]
struct ScrollAnimation {
    /// Day being scrolled to
    index: usize,
    from: f64,
    to: f64,
    frame: u16,
    frames: u16,
}

impl ScrollAnimation {
    /// Ease-out position after the current frame
    fn position(&self) -> f64 {
        let t = (self.frame as f64 / self.frames.max(1) as f64).clamp(0.0, 1.0);
        let eased = 1.0 - (1.0 - t).powi(3);
        self.from + (self.to - self.from) * eased
    }

    fn is_done(&self) -> bool {
        self.frame >= self.frames
    }
}

/// A day panel placed on screen
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DayPanel {
    /// Index into the day list
    pub index: usize,
    /// Screen column of the panel's left edge (may be fractional mid-animation)
    pub left: f64,
    pub width: u16,
}

impl DayPanel {
    pub fn mid_x(&self) -> f64 {
        self.left + self.width as f64 / 2.0
    }
}

/// Timeline scroll container state
#[derive(Debug, Clone)]
pub struct TimelineState {
    /// Content column at the viewport's left edge
    pub scroll_offset: f64,
    /// Columns per day panel
    pub day_width: u16,
    min_day_width: u16,
    max_day_width: u16,
    animation_frames: u16,
    day_count: usize,
    /// Inner area of the last layout pass
    viewport: Option<Rect>,
    animation: Option<ScrollAnimation>,
    /// Animation frame counter
    pub animation_frame: u64,
}

impl Default for TimelineState {
    fn default() -> Self {
        Self::new(&ViewSettings::default())
    }
}

impl TimelineState {
    pub fn new(settings: &ViewSettings) -> Self {
        Self {
            scroll_offset: 0.0,
            day_width: settings.day_width,
            min_day_width: settings.min_day_width,
            max_day_width: settings.max_day_width,
            animation_frames: settings.animation_frames,
            day_count: 0,
            viewport: None,
            animation: None,
            animation_frame: 0,
        }
    }

    /// Number of days in the strip
    pub fn set_day_count(&mut self, count: usize) {
        self.day_count = count;
        self.clamp_offset();
    }

    /// Record the area the strip occupies this frame
    pub fn set_viewport(&mut self, area: Rect) {
        let resized = self.viewport.map(|v| v.width) != Some(area.width);
        let center = self.viewport.map(|_| self.content_center());
        let previous_offset = self.scroll_offset;
        self.viewport = Some(area);
        if resized {
            // Keep whatever was centered before the resize centered after it
            if let Some(center) = center {
                self.scroll_offset = center - area.width as f64 / 2.0;
            }
            self.clamp_offset();

            // A running scroll still ends with its day centered
            if let Some(mut animation) = self.animation {
                animation.from += self.scroll_offset - previous_offset;
                animation.to = self.center_offset_for(animation.index);
                self.animation = Some(animation);
            }
        }
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    /// Screen column of the viewport center
    pub fn center_x(&self) -> Option<f64> {
        self.viewport
            .map(|v| v.x as f64 + v.width as f64 / 2.0)
    }

    fn viewport_width(&self) -> f64 {
        self.viewport.map(|v| v.width as f64).unwrap_or(0.0)
    }

    /// Content column under the viewport center
    fn content_center(&self) -> f64 {
        self.scroll_offset + self.viewport_width() / 2.0
    }

    /// Offset that puts day `index` in the middle of the viewport
    fn center_offset_for(&self, index: usize) -> f64 {
        let width = self.day_width as f64;
        index as f64 * width + width / 2.0 - self.viewport_width() / 2.0
    }

    /// The viewport center may travel from the first day's midpoint to the
    /// last day's midpoint, so every day can be centered
    fn offset_bounds(&self) -> (f64, f64) {
        let first = self.center_offset_for(0);
        let last = self.center_offset_for(self.day_count.saturating_sub(1));
        (first, last)
    }

    fn clamp_offset(&mut self) {
        let (min, max) = self.offset_bounds();
        self.scroll_offset = self.scroll_offset.clamp(min, max);
    }

    /// Scroll by `delta` columns (negative is earlier in time).
    ///
    /// Interrupts a running animation.
    pub fn scroll_by(&mut self, delta: f64) {
        self.animation = None;
        self.scroll_offset += delta;
        self.clamp_offset();
    }

    /// Scroll left by whole days
    pub fn scroll_days(&mut self, days: i64) {
        self.scroll_by(days as f64 * self.day_width as f64);
    }

    pub fn scroll_to_start(&mut self) {
        self.animation = None;
        self.scroll_offset = self.offset_bounds().0;
    }

    pub fn scroll_to_end(&mut self) {
        self.animation = None;
        self.scroll_offset = self.offset_bounds().1;
    }

    /// Execute a scroll command from the sync controller
    pub fn scroll_to(&mut self, command: &ScrollCommand, days: &DayList) -> GraphResult<()> {
        if self.viewport.is_none() {
            return Err(GraphError::LayoutNotReady);
        }
        let index = days
            .index_of(command.target)
            .ok_or(GraphError::DateOutOfRange(command.target.date_naive()))?;

        let target = match command.anchor {
            Anchor::Center => self.center_offset_for(index),
        };

        if command.animated && self.animation_frames > 0 {
            self.animation = Some(ScrollAnimation {
                index,
                from: self.scroll_offset,
                to: target,
                frame: 0,
                frames: self.animation_frames,
            });
        } else {
            self.animation = None;
            self.scroll_offset = target;
            self.clamp_offset();
        }
        Ok(())
    }

    /// Zoom in (wider day panels)
    pub fn zoom_in(&mut self) {
        let width = (self.day_width as f32 * 1.5).round() as u16;
        self.set_day_width(width.min(self.max_day_width));
    }

    /// Zoom out (narrower day panels)
    pub fn zoom_out(&mut self) {
        let width = (self.day_width as f32 / 1.5).round() as u16;
        self.set_day_width(width.max(self.min_day_width));
    }

    fn set_day_width(&mut self, width: u16) {
        if width == self.day_width || width == 0 {
            return;
        }
        let fraction = self.content_center() / self.day_width as f64;
        self.day_width = width;
        self.animation = None;
        self.scroll_offset = fraction * width as f64 - self.viewport_width() / 2.0;
        self.clamp_offset();
    }

    /// Advance animations (called every frame).
    ///
    /// Returns `true` on the frame a programmatic scroll completes.
    pub fn tick(&mut self) -> bool {
        self.animation_frame = self.animation_frame.wrapping_add(1);

        let Some(mut animation) = self.animation else {
            return false;
        };
        animation.frame += 1;
        self.scroll_offset = animation.position();
        if animation.is_done() {
            self.animation = None;
            self.clamp_offset();
            return true;
        }
        self.animation = Some(animation);
        false
    }

    /// Indices of days intersecting the viewport
    pub fn visible_range(&self) -> Range<usize> {
        let Some(viewport) = self.viewport else {
            return 0..0;
        };
        if self.day_count == 0 || self.day_width == 0 {
            return 0..0;
        }
        let width = self.day_width as f64;
        let first = (self.scroll_offset / width).floor().max(0.0) as usize;
        let end = ((self.scroll_offset + viewport.width as f64) / width).ceil().max(0.0) as usize;
        first.min(self.day_count)..end.min(self.day_count)
    }

    /// Visible panels in screen coordinates
    pub fn panels(&self) -> Vec<DayPanel> {
        let Some(viewport) = self.viewport else {
            return Vec::new();
        };
        self.visible_range()
            .map(|index| DayPanel {
                index,
                left: viewport.x as f64 + index as f64 * self.day_width as f64 - self.scroll_offset,
                width: self.day_width,
            })
            .collect()
    }

    /// Geometry of this layout pass, for the sync controller
    pub fn layout_report(&self, days: &DayList) -> LayoutReport {
        LayoutReport {
            center_x: self.center_x(),
            midpoints: self
                .panels()
                .into_iter()
                .filter_map(|panel| days.get(panel.index).map(|day| (day.id(), panel.mid_x())))
                .collect(),
        }
    }
}

/// Timeline widget rendering the visible day panels
pub struct TimelineWidget<'a> {
    days: &'a DayList,
    state: &'a TimelineState,
    centered: Option<DayId>,
    selected: Option<DayId>,
    focused: bool,
    title: &'a str,
}

impl<'a> TimelineWidget<'a> {
    pub fn new(days: &'a DayList, state: &'a TimelineState) -> Self {
        Self {
            days,
            state,
            centered: None,
            selected: None,
            focused: false,
            title: " Timeline ",
        }
    }

    pub fn centered(mut self, day: Option<DayId>) -> Self {
        self.centered = day;
        self
    }

    pub fn selected(mut self, day: DayId) -> Self {
        self.selected = Some(day);
        self
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    pub fn title(mut self, title: &'a str) -> Self {
        self.title = title;
        self
    }

    /// Block framing the strip; its inner area is the scroll viewport
    pub fn block<'b>(focused: bool) -> Block<'b> {
        Block::default()
            .borders(Borders::ALL)
            .border_style(if focused {
                styles::border_focused()
            } else {
                styles::border()
            })
            .style(Style::default().bg(colors::BG_DARK))
    }

    fn render_panel(&self, panel: &DayPanel, inner: Rect, buf: &mut Buffer) {
        let Some(day) = self.days.get(panel.index) else {
            return;
        };
        let next_first = self.days.first_point_of_next_day(panel.index);

        let left = panel.left.round() as i32;
        let right = left + panel.width as i32;
        let clip_left = left.max(inner.x as i32);
        let clip_right = right.min((inner.x + inner.width) as i32);
        if clip_right <= clip_left || inner.height < 2 {
            return;
        }

        let is_centered = self.centered == Some(day.id());
        let background = if is_centered {
            colors::BG_HIGHLIGHT
        } else {
            colors::BG_DARK
        };

        let graph_area = Rect::new(
            clip_left as u16,
            inner.y,
            (clip_right - clip_left) as u16,
            inner.height - 1,
        );

        // Only the visible slice of the day's [0, 1] frame is painted
        let width = panel.width as f64;
        let x_bounds = [
            (clip_left - left) as f64 / width,
            (clip_right - left) as f64 / width,
        ];
        draw_day(day, next_first, x_bounds, background, is_centered, graph_area, buf);

        // Separator on the panel's left edge
        if left >= inner.x as i32 {
            for row in graph_area.y..graph_area.y + graph_area.height {
                let cell = &mut buf[(left as u16, row)];
                cell.set_char('│');
                cell.set_style(Style::default().fg(colors::BORDER_DIM).bg(background));
            }
        }

        self.render_label(day, left, clip_left, clip_right, inner, background, buf);
    }

    #[allow(clippy::too_many_arguments)]
    fn render_label(
        &self,
        day: &Day,
        left: i32,
        clip_left: i32,
        clip_right: i32,
        inner: Rect,
        background: ratatui::style::Color,
        buf: &mut Buffer,
    ) {
        let row = inner.y + inner.height - 1;
        for x in clip_left..clip_right {
            buf[(x as u16, row)].set_style(Style::default().bg(background));
        }

        let label = day.date().format("%b %e, %Y").to_string();
        let label_left = left + 1;
        let skip = (clip_left - label_left).max(0) as usize;
        let start = label_left.max(clip_left);
        if start >= clip_right {
            return;
        }
        let visible: String = label.chars().skip(skip).collect();

        let style = if self.selected == Some(day.id()) {
            Style::default()
                .fg(colors::YELLOW)
                .bg(background)
                .add_modifier(Modifier::BOLD)
        } else {
            styles::text_dim().bg(background)
        };
        buf.set_stringn(
            start as u16,
            row,
            visible,
            (clip_right - start) as usize,
            style,
        );
    }

    fn render_empty(&self, inner: Rect, buf: &mut Buffer) {
        let message = "No data";
        let x = inner.x + inner.width.saturating_sub(message.len() as u16) / 2;
        let y = inner.y + inner.height / 2;
        buf.set_stringn(x, y, message, inner.width as usize, styles::text_dim());
    }
}

/// Paint one day's line graph with a braille canvas
fn draw_day(
    day: &Day,
    next_first: Option<&Sample>,
    x_bounds: [f64; 2],
    background: ratatui::style::Color,
    highlighted: bool,
    area: Rect,
    buf: &mut Buffer,
) {
    let edges: Vec<Edge> = mapper::edges(day, next_first).map(Edge::clipped).collect();
    // Canvas y grows upward while unit y grows downward
    let points: Vec<(f64, f64)> = mapper::points(day).map(|p| (p.x, 1.0 - p.y)).collect();
    let line_color = if highlighted {
        colors::BLUE_LIGHT
    } else {
        colors::BLUE
    };

    Canvas::default()
        .background_color(background)
        .marker(Marker::Braille)
        .x_bounds(x_bounds)
        .y_bounds([0.0, 1.0])
        .paint(|ctx| {
            for edge in &edges {
                ctx.draw(&CanvasLine {
                    x1: edge.from.x,
                    y1: 1.0 - edge.from.y,
                    x2: edge.to.x,
                    y2: 1.0 - edge.to.y,
                    color: if edge.crosses_day {
                        colors::FG_DIM
                    } else {
                        line_color
                    },
                });
            }
            ctx.layer();
            ctx.draw(&Points {
                coords: &points,
                color: colors::YELLOW,
            });
        })
        .render(area, buf);
}

impl Widget for TimelineWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Self::block(self.focused)
            .title(self.title)
            .title_style(styles::title_accent());

        let inner = block.inner(area);
        block.render(area, buf);

        if inner.width < 4 || inner.height < 3 {
            return; // Too small to render
        }

        if self.days.is_empty() {
            self.render_empty(inner, buf);
            return;
        }

        for panel in self.state.panels() {
            self.render_panel(&panel, inner, buf);
        }

        // Navigation hints in the bottom border
        let range = self.state.visible_range();
        let hint_row = area.y + area.height - 1;
        if range.start > 0 {
            buf.set_string(area.x + 1, hint_row, "◀ h", styles::text_hint());
        }
        if range.end < self.days.len() && area.width > 5 {
            buf.set_string(area.x + area.width - 4, hint_row, "l ▶", styles::text_hint());
        }
    }
}

/// Status line for the timeline
pub struct TimelineStatusWidget<'a> {
    state: &'a TimelineState,
    days: &'a DayList,
    center_x: Option<f64>,
    centered: Option<DayId>,
}

impl<'a> TimelineStatusWidget<'a> {
    pub fn new(state: &'a TimelineState, days: &'a DayList) -> Self {
        Self {
            state,
            days,
            center_x: None,
            centered: None,
        }
    }

    pub fn center(mut self, center_x: Option<f64>, centered: Option<DayId>) -> Self {
        self.center_x = center_x;
        self.centered = centered;
        self
    }
}

impl Widget for TimelineStatusWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let center = self
            .center_x
            .map(|x| format!("{:.1}", x))
            .unwrap_or_else(|| "—".to_string());
        let centered = self
            .centered
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "none".to_string());

        let moving = if self.state.is_animating() { " »" } else { "" };
        let status = format!(
            "mid-x {}  ▸ {}{}  {} days  {} samples  ⚲ {} col/day",
            center,
            centered,
            moving,
            self.days.len(),
            self.days.sample_count(),
            self.state.day_width,
        );

        buf.set_stringn(
            area.x,
            area.y,
            &status,
            area.width as usize,
            Style::default().fg(colors::FG_DIM),
        );
    }
}
