//! Read-only projections of the registry and the navigator between them.
//!
//! Every view is a pure function of the registry and "today"; nothing here
//! mutates state. The [`Navigator`] tracks which view is active and the
//! search that may be overriding it.

pub mod attendance;
pub mod dashboard;
pub mod report;
pub mod roster;

use chrono::NaiveDate;
use serde::Serialize;

use crate::config::ViewsConfig;
use crate::registry::Registry;
use crate::search::{search, SearchResults};

pub use attendance::{attendance_for, AttendanceRow, AttendanceSheet};
pub use dashboard::{dashboard, Dashboard, RecentEntry};
pub use report::{report, DateRange, Report, ReportPeriod, StudentSummary};
pub use roster::{roster, RosterView, StudentCard};

/// `part / whole` as a percentage rounded half-up; 0 when `whole` is 0.
pub(crate) fn percent(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    let value = (part * 200 + whole) / (2 * whole);
    u32::try_from(value).unwrap_or(u32::MAX)
}

/// Human-facing date, e.g. `Mar 14, 2024`.
#[must_use]
pub fn display_date(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}

/// A screen the user can look at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    /// Counts for today and recent activity.
    Dashboard,
    /// Student cards, optionally filtered.
    Roster {
        /// Free-text card filter.
        filter: Option<String>,
    },
    /// One day of attendance.
    Attendance {
        /// The selected day.
        date: NaiveDate,
    },
    /// A period report.
    Reports {
        /// The selected period.
        period: ReportPeriod,
    },
    /// Results for a global search.
    SearchResults {
        /// The raw query.
        query: String,
    },
}

impl View {
    /// Short name used in logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::Roster { .. } => "roster",
            Self::Attendance { .. } => "attendance",
            Self::Reports { .. } => "reports",
            Self::SearchResults { .. } => "search",
        }
    }
}

/// The rendered content of a [`View`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum ViewModel {
    /// See [`Dashboard`].
    Dashboard(Dashboard),
    /// See [`RosterView`].
    Roster(RosterView),
    /// See [`AttendanceSheet`].
    Attendance(AttendanceSheet),
    /// See [`Report`].
    Reports(Report),
    /// See [`SearchResults`].
    SearchResults(SearchResults),
}

/// Render `view` as of `today`.
///
/// A search view whose query is blank renders the dashboard instead.
#[must_use]
pub fn render(view: &View, registry: &Registry, today: NaiveDate, config: &ViewsConfig) -> ViewModel {
    match view {
        View::Dashboard => ViewModel::Dashboard(dashboard(registry, today, config.recent_limit)),
        View::Roster { filter } => ViewModel::Roster(roster(registry, filter.as_deref())),
        View::Attendance { date } => ViewModel::Attendance(attendance_for(registry, *date)),
        View::Reports { period } => ViewModel::Reports(report(registry, *period, today)),
        View::SearchResults { query } => match search(registry, query) {
            Some(results) => ViewModel::SearchResults(results),
            None => ViewModel::Dashboard(dashboard(registry, today, config.recent_limit)),
        },
    }
}

/// Tracks the active view and any search overriding it.
///
/// A non-empty search replaces the active view with its results. Clearing
/// the search, or showing another view, returns to the dashboard or the
/// chosen view and drops any highlighting.
#[derive(Debug, Clone)]
pub struct Navigator {
    active: View,
    search_query: Option<String>,
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new()
    }
}

impl Navigator {
    /// Start on the dashboard.
    #[must_use]
    pub fn new() -> Self {
        Self {
            active: View::Dashboard,
            search_query: None,
        }
    }

    /// The view that would render now.
    #[must_use]
    pub fn active(&self) -> View {
        match &self.search_query {
            Some(query) => View::SearchResults {
                query: query.clone(),
            },
            None => self.active.clone(),
        }
    }

    /// The current search, if one is active.
    #[must_use]
    pub fn search_query(&self) -> Option<&str> {
        self.search_query.as_deref()
    }

    /// Switch to `view`, ending any search.
    pub fn show(&mut self, view: View) {
        tracing::debug!(view = view.name(), "Switching view");
        self.search_query = None;
        self.active = view;
    }

    /// Apply a search query. A blank query ends the search and returns to
    /// the dashboard. Returns whether a search is now active.
    pub fn search(&mut self, query: &str) -> bool {
        if query.trim().is_empty() {
            self.clear_search();
            return false;
        }
        self.search_query = Some(query.to_string());
        true
    }

    /// End the search and return to the dashboard.
    pub fn clear_search(&mut self) {
        if self.search_query.take().is_some() {
            self.active = View::Dashboard;
        }
    }

    /// Render the active view.
    #[must_use]
    pub fn render(&self, registry: &Registry, today: NaiveDate, config: &ViewsConfig) -> ViewModel {
        render(&self.active(), registry, today, config)
    }
}
