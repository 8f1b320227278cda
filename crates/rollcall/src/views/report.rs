//! Period reports over the attendance log.
//!
//! A report selects a window of days, filters the log to it (inclusive on
//! both ends) and summarises per student. Dates compare as calendar days,
//! which orders the same as their `YYYY-MM-DD` text.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::model::AttendanceStatus;
use crate::registry::Registry;

use super::attendance::{join, AttendanceRow};
use super::percent;

/// The window a report covers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportPeriod {
    /// Today only.
    #[default]
    Today,
    /// From the most recent Sunday through today.
    Week,
    /// From the first of the month through today.
    Month,
    /// Every record.
    All,
}

impl ReportPeriod {
    /// Short key used in file names.
    #[must_use]
    pub fn key(&self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::Week => "week",
            Self::Month => "month",
            Self::All => "all",
        }
    }

    /// The days covered relative to `today`.
    ///
    /// `All` is unbounded; its displayed range is the span of the log, or
    /// `today` when the log is empty.
    #[must_use]
    pub fn range(&self, today: NaiveDate, registry: &Registry) -> DateRange {
        match self {
            Self::Today => DateRange::new(today, today),
            Self::Week => {
                let back = u64::from(today.weekday().num_days_from_sunday());
                let start = today
                    .checked_sub_days(chrono::Days::new(back))
                    .unwrap_or(today);
                DateRange::new(start, today)
            }
            Self::Month => DateRange::new(today.with_day(1).unwrap_or(today), today),
            Self::All => {
                let dates = registry.attendance().iter().map(|a| a.date);
                let start = dates.clone().min().unwrap_or(today);
                let end = dates.max().unwrap_or(today);
                DateRange::new(start, end)
            }
        }
    }
}

impl std::fmt::Display for ReportPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// An inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    /// First day.
    pub start: NaiveDate,
    /// Last day.
    pub end: NaiveDate,
}

impl DateRange {
    /// Create a range.
    #[must_use]
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Whether `date` falls within the range.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Whole days from `start` to `end`; zero for a single-day range.
    #[must_use]
    pub fn elapsed_days(&self) -> u64 {
        u64::try_from((self.end - self.start).num_days()).unwrap_or(0)
    }
}

/// Per-student line of a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentSummary {
    /// Student ID.
    pub student_id: String,
    /// Student name.
    pub name: String,
    /// Student class.
    pub class: String,
    /// Present marks in the window.
    pub present_days: usize,
    /// All marks in the window.
    pub total_days: usize,
    /// `present_days / total_days` as a rounded percentage, 0 with no marks.
    pub rate: u32,
}

/// A period report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    /// The selected period.
    pub period: ReportPeriod,
    /// The days covered.
    pub range: DateRange,
    /// Records in the window, orphans included.
    pub total_records: usize,
    /// Present records in the window.
    pub present_count: usize,
    /// Distinct student IDs in the window.
    pub students_tracked: usize,
    /// Present records over `roster size x elapsed days`, as a percentage.
    ///
    /// Kept for parity with earlier reports; it can exceed 100 and is `None`
    /// when the window spans zero elapsed days or the roster is empty.
    pub overall_rate: Option<u32>,
    /// One summary per roster student, in roster order.
    pub students: Vec<StudentSummary>,
    /// Window records joined to the roster, in log order.
    pub rows: Vec<AttendanceRow>,
}

/// Build the report for `period` as of `today`.
#[must_use]
pub fn report(registry: &Registry, period: ReportPeriod, today: NaiveDate) -> Report {
    let range = period.range(today, registry);
    let in_window: Vec<_> = registry
        .attendance()
        .iter()
        .filter(|a| period == ReportPeriod::All || range.contains(a.date))
        .collect();

    let present_count = in_window
        .iter()
        .filter(|a| a.status == AttendanceStatus::Present)
        .count();

    let mut tracked: Vec<&str> = in_window.iter().map(|a| a.student_id.as_str()).collect();
    tracked.sort_unstable();
    tracked.dedup();

    let days = usize::try_from(range.elapsed_days()).unwrap_or(0);
    let denominator = registry.students().len() * days;
    let overall_rate = (denominator > 0).then(|| percent(present_count, denominator));

    let students = registry
        .students()
        .iter()
        .map(|student| {
            let marks = in_window.iter().filter(|a| a.student_id == student.id);
            let total_days = marks.clone().count();
            let present_days = marks
                .filter(|a| a.status == AttendanceStatus::Present)
                .count();
            StudentSummary {
                student_id: student.id.clone(),
                name: student.name.clone(),
                class: student.class.clone(),
                present_days,
                total_days,
                rate: percent(present_days, total_days),
            }
        })
        .collect();

    Report {
        period,
        range,
        total_records: in_window.len(),
        present_count,
        students_tracked: tracked.len(),
        overall_rate,
        students,
        rows: join(registry, in_window.into_iter()),
    }
}
