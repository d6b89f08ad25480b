//! Scroll/date synchronization.
//!
//! Keeps the selected date, the scroll position of the day strip and the
//! centered-day highlight consistent. Two one-way channels feed it:
//!
//! - **Scroll → Date**: the view reports day midpoints after each layout
//!   pass; the day closest to the viewport center becomes the selected date.
//!   This channel never asks the view to scroll.
//! - **Date → Scroll**: the user edits the date picker; unless that day is
//!   already centered, the controller returns a [`ScrollCommand`].
//!
//! The guard on the second channel is what keeps the loop closed: scrolling
//! to the picked day produces midpoints that center the picked day, and the
//! first channel then finds nothing to change.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::bucket::start_of_day;
use crate::error::{GraphError, GraphResult};
use crate::models::{DayId, DayList};

/// Where the selected date last came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSource {
    /// Set at startup
    Initial,
    /// Edited by the user in the date picker
    Picker,
    /// Derived from the scroll position
    Scroll,
}

impl DateSource {
    pub fn name(&self) -> &'static str {
        match self {
            DateSource::Initial => "initial",
            DateSource::Picker => "picker",
            DateSource::Scroll => "scroll",
        }
    }
}

/// The user's logical selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectedDate {
    pub instant: DateTime<Utc>,
    pub source: DateSource,
}

impl SelectedDate {
    /// Day the selection falls in
    pub fn day(&self) -> DayId {
        start_of_day(self.instant)
    }
}

/// What to do when the picked date has no loaded day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingDayPolicy {
    /// Do not scroll
    #[default]
    Skip,
    /// Scroll to the closest loaded day
    Nearest,
}

/// Where the target ends up inside the viewport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Center,
}

/// Request for the view to scroll a day into position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollCommand {
    pub target: DayId,
    pub anchor: Anchor,
    pub animated: bool,
}

/// The selected date moved because of scrolling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateUpdate {
    pub previous: SelectedDate,
    pub current: SelectedDate,
}

/// Geometry of one layout pass: viewport center and midpoints of the
/// visible days, all in the same horizontal coordinate space
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutReport {
    pub center_x: Option<f64>,
    pub midpoints: Vec<(DayId, f64)>,
}

/// State machine reconciling scroll geometry with the selected date
#[derive(Debug, Clone)]
pub struct ScrollSyncController {
    viewport_center_x: Option<f64>,
    day_midpoints: BTreeMap<DayId, f64>,
    selected: SelectedDate,
    /// Day a programmatic scroll is heading to
    pending_target: Option<DayId>,
    missing_day: MissingDayPolicy,
}

impl ScrollSyncController {
    pub fn new(initial: DateTime<Utc>) -> Self {
        Self {
            viewport_center_x: None,
            day_midpoints: BTreeMap::new(),
            selected: SelectedDate {
                instant: initial,
                source: DateSource::Initial,
            },
            pending_target: None,
            missing_day: MissingDayPolicy::default(),
        }
    }

    pub fn with_missing_day_policy(mut self, policy: MissingDayPolicy) -> Self {
        self.missing_day = policy;
        self
    }

    pub fn selected(&self) -> SelectedDate {
        self.selected
    }

    pub fn viewport_center_x(&self) -> Option<f64> {
        self.viewport_center_x
    }

    pub fn day_midpoints(&self) -> &BTreeMap<DayId, f64> {
        &self.day_midpoints
    }

    pub fn pending_target(&self) -> Option<DayId> {
        self.pending_target
    }

    /// Day whose midpoint is closest to the viewport center.
    ///
    /// `None` until the viewport center is known. Ties go to the earliest day.
    pub fn centered_day(&self) -> Option<DayId> {
        let center = self.viewport_center_x?;
        let mut best: Option<(DayId, f64)> = None;
        for (&day, &mid) in &self.day_midpoints {
            if !mid.is_finite() {
                continue;
            }
            let distance = (mid - center).abs();
            match best {
                Some((_, d)) if distance >= d => {}
                _ => best = Some((day, distance)),
            }
        }
        best.map(|(day, _)| day)
    }

    // ============================================
    // Scroll -> Date
    // ============================================

    /// Record the viewport center. Does not touch the selected date.
    pub fn report_viewport_center(&mut self, x: f64) {
        self.viewport_center_x = Some(x);
    }

    /// Merge one day's midpoint and re-derive the selected date.
    ///
    /// Entries for days that scrolled away are kept until the next
    /// [`report_layout`](Self::report_layout) replaces the map.
    pub fn report_day_midpoint(&mut self, day: DayId, x: f64) -> Option<DateUpdate> {
        self.day_midpoints.insert(day, x);
        self.sync_date_from_scroll()
    }

    /// Replace the geometry with one full layout pass and re-derive the
    /// selected date. Days missing from the report are pruned.
    pub fn report_layout(&mut self, report: LayoutReport) -> Option<DateUpdate> {
        if let Some(x) = report.center_x {
            self.viewport_center_x = Some(x);
        }
        self.day_midpoints.clear();
        self.day_midpoints.extend(report.midpoints);
        self.sync_date_from_scroll()
    }

    /// The user moved the strip by hand; any programmatic target is void
    pub fn user_scrolled(&mut self) {
        if let Some(target) = self.pending_target.take() {
            debug!(day = %target.date_naive(), "manual scroll cancelled pending target");
        }
    }

    /// The view finished executing a programmatic scroll. The target stops
    /// being pending even if the strip settled on another day.
    pub fn scroll_finished(&mut self) {
        if let Some(target) = self.pending_target.take() {
            debug!(day = %target.date_naive(), "programmatic scroll finished");
        }
    }

    fn sync_date_from_scroll(&mut self) -> Option<DateUpdate> {
        let centered = self.centered_day()?;

        if let Some(target) = self.pending_target {
            if centered != target {
                trace!(
                    centered = %centered.date_naive(),
                    pending = %target.date_naive(),
                    "programmatic scroll in flight"
                );
                return None;
            }
            self.pending_target = None;
        }

        if self.selected.day() == centered {
            return None;
        }

        let previous = self.selected;
        self.selected = SelectedDate {
            instant: centered,
            source: DateSource::Scroll,
        };
        debug!(day = %centered.date_naive(), "selected date follows scroll");
        Some(DateUpdate {
            previous,
            current: self.selected,
        })
    }

    // ============================================
    // Date -> Scroll
    // ============================================

    /// Apply a date edited in the picker.
    ///
    /// Returns a scroll command unless the day is already centered or no
    /// loaded day can serve as a target.
    pub fn select_date(&mut self, date: DateTime<Utc>, days: &DayList) -> Option<ScrollCommand> {
        self.selected = SelectedDate {
            instant: date,
            source: DateSource::Picker,
        };

        let day = start_of_day(date);
        if self.centered_day() == Some(day) {
            debug!(day = %day.date_naive(), "picked day already centered");
            self.pending_target = None;
            return None;
        }

        match self.resolve_scroll_target(date, days) {
            Ok(target) => {
                debug!(day = %target.date_naive(), "scrolling to picked day");
                self.pending_target = Some(target);
                Some(ScrollCommand {
                    target,
                    anchor: Anchor::Center,
                    animated: true,
                })
            }
            Err(err) => {
                warn!(%err, "not scrolling");
                None
            }
        }
    }

    /// Loaded day to scroll to for `date`, following the missing-day policy
    pub fn resolve_scroll_target(&self, date: DateTime<Utc>, days: &DayList) -> GraphResult<DayId> {
        if days.is_empty() {
            return Err(GraphError::EmptyDayList);
        }

        let day = start_of_day(date);
        if days.index_of(day).is_some() {
            return Ok(day);
        }

        match self.missing_day {
            MissingDayPolicy::Skip => Err(GraphError::DateOutOfRange(day.date_naive())),
            MissingDayPolicy::Nearest => days
                .nearest_index(day)
                .and_then(|i| days.get(i))
                .map(|d| d.id())
                .ok_or(GraphError::DateOutOfRange(day.date_naive())),
        }
    }

    // ============================================
    // Lifecycle
    // ============================================

    /// First appearance: center the most recent day.
    ///
    /// Midpoints are unknown at this point, so `centered_day` is not consulted.
    pub fn mount(&mut self, days: &DayList) -> Option<ScrollCommand> {
        let Some(last) = days.last() else {
            debug!("no days to mount");
            return None;
        };
        self.pending_target = Some(last.id());
        Some(ScrollCommand {
            target: last.id(),
            anchor: Anchor::Center,
            animated: false,
        })
    }

    /// Forget geometry, e.g. when a new day list replaces the old one
    pub fn reset(&mut self) {
        self.viewport_center_x = None;
        self.day_midpoints.clear();
        self.pending_target = None;
    }
}
